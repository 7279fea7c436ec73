//! Country records as served by the REST Countries v2 API.
//!
//! Field names follow the upstream JSON. Absent and `null` values collapse to
//! empty defaults so a sparse record still decodes; fields the cache does not
//! model are retained in `extra`. Records decoded with
//! [`CountryRecord::from_upstream`] also keep the document they came from so
//! search output can echo it untouched.

use countries_core::{CountryProfile, Currency, Language};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder code upstream uses for territories without a currency.
pub const NO_CURRENCY_CODE: &str = "(none)";

/// One country as returned by the upstream API.
///
/// # Examples
/// ```
/// use countries_data::CountryRecord;
///
/// let record: CountryRecord = serde_json::from_str(
///     r#"{"name": "Chad", "callingCodes": ["235"], "numericCode": null}"#,
/// )
/// .expect("decode record");
/// let profile = record.profile();
/// assert_eq!(profile.calling_code, "235");
/// assert_eq!(profile.numeric_code, "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRecord {
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Capital city.
    #[serde(default, deserialize_with = "null_as_default")]
    pub capital: String,
    /// ISO 3166-1 alpha-2 code.
    #[serde(default, rename = "alpha2Code", deserialize_with = "null_as_default")]
    pub alpha2_code: String,
    /// ISO 3166-1 alpha-3 code.
    #[serde(default, rename = "alpha3Code", deserialize_with = "null_as_default")]
    pub alpha3_code: String,
    /// ISO 3166-1 numeric code when upstream knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_code: Option<String>,
    /// Calling codes, most significant first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub calling_codes: Vec<String>,
    /// Flag image URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub flag: String,
    /// Continental region.
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    /// Currencies in use.
    #[serde(default, deserialize_with = "null_as_default")]
    pub currencies: Vec<CurrencyRecord>,
    /// Official languages.
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<LanguageRecord>,
    /// UTC offset labels such as `UTC+01:00`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timezones: Vec<String>,
    /// Upstream fields the cache does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Document this record was decoded from, if it came from upstream.
    #[serde(skip)]
    pub upstream: Option<Value>,
}

impl CountryRecord {
    /// Decode an upstream document, keeping it alongside the typed fields.
    ///
    /// # Errors
    ///
    /// Returns the decode failure when `document` is not a country object.
    pub fn from_upstream(document: Value) -> Result<Self, serde_json::Error> {
        let mut record = Self::deserialize(&document)?;
        record.upstream = Some(document);
        Ok(record)
    }

    /// Scalar country attributes. Only the first calling code is kept and a
    /// missing numeric code becomes an empty string; the record is untouched.
    #[must_use]
    pub fn profile(&self) -> CountryProfile {
        CountryProfile {
            name: self.name.clone(),
            capital: self.capital.clone(),
            alpha2: self.alpha2_code.clone(),
            alpha3: self.alpha3_code.clone(),
            numeric_code: self.numeric_code.clone().unwrap_or_default(),
            calling_code: self.calling_codes.first().cloned().unwrap_or_default(),
            flag_url: self.flag.clone(),
            region: self.region.clone(),
        }
    }
}

/// A currency entry within a [`CountryRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    /// ISO 4217 code; may be absent or [`NO_CURRENCY_CODE`].
    #[serde(default)]
    pub code: Option<String>,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Currency symbol.
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
}

impl CurrencyRecord {
    /// The code if it identifies a real currency.
    ///
    /// Surrounding whitespace is removed and the trimmed code is what the
    /// cache stores and deduplicates on. A missing, blank or [`NO_CURRENCY_CODE`]
    /// code is unusable.
    ///
    /// # Examples
    /// ```
    /// use countries_data::CurrencyRecord;
    ///
    /// let record = CurrencyRecord {
    ///     code: Some(" NGN ".into()),
    ///     ..CurrencyRecord::default()
    /// };
    /// assert_eq!(record.usable_code(), Some("NGN"));
    /// ```
    #[must_use]
    pub fn usable_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty() && *code != NO_CURRENCY_CODE)
    }

    /// Build a transient [`Currency`], or `None` when the code is unusable.
    #[must_use]
    pub fn to_currency(&self) -> Option<Currency> {
        self.usable_code()
            .map(|code| Currency::new(code, self.name.as_str(), self.symbol.as_str()))
    }
}

/// A language entry within a [`CountryRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRecord {
    /// ISO 639-1 code.
    #[serde(default, rename = "iso639_1", deserialize_with = "null_as_default")]
    pub iso639_1: String,
    /// ISO 639-2 code.
    #[serde(default, rename = "iso639_2", deserialize_with = "null_as_default")]
    pub iso639_2: String,
    /// English name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Native name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub native_name: String,
}

impl LanguageRecord {
    /// Build a transient [`Language`].
    #[must_use]
    pub fn to_language(&self) -> Language {
        Language::new(
            self.iso639_1.as_str(),
            self.iso639_2.as_str(),
            self.name.as_str(),
            self.native_name.as_str(),
        )
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use countries_core::Entity;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn calling_code_takes_first_without_mutating_record() {
        let record = CountryRecord {
            name: "Nigeria".into(),
            calling_codes: vec!["234".into(), "235".into()],
            ..CountryRecord::default()
        };
        assert_eq!(record.profile().calling_code, "234");
        assert_eq!(record.calling_codes, vec!["234".to_owned(), "235".to_owned()]);
    }

    #[rstest]
    fn empty_calling_codes_yield_empty_string() {
        assert_eq!(CountryRecord::default().profile().calling_code, "");
    }

    #[rstest]
    #[case::absent(json!({"name": "Chad"}))]
    #[case::null(json!({"name": "Chad", "numericCode": null}))]
    fn missing_numeric_code_defaults_to_empty(#[case] raw: serde_json::Value) {
        let record: CountryRecord = serde_json::from_value(raw).expect("decode record");
        assert_eq!(record.profile().numeric_code, "");
    }

    #[rstest]
    #[case::absent(None)]
    #[case::placeholder(Some("(none)"))]
    #[case::blank(Some("  "))]
    #[case::padded_placeholder(Some(" (none) "))]
    fn unusable_currency_codes_are_rejected(#[case] code: Option<&str>) {
        let record = CurrencyRecord {
            code: code.map(str::to_owned),
            name: "Unknown".into(),
            symbol: String::new(),
        };
        assert!(record.to_currency().is_none());
    }

    #[rstest]
    #[case("NGN", "NGN")]
    #[case(" NGN ", "NGN")]
    #[case("\tXOF\n", "XOF")]
    fn currency_codes_are_trimmed(#[case] raw: &str, #[case] expected: &str) {
        let record = CurrencyRecord {
            code: Some(raw.to_owned()),
            name: "Some currency".into(),
            symbol: String::new(),
        };
        assert_eq!(record.usable_code(), Some(expected));
        let currency = record.to_currency().expect("usable code");
        assert_eq!(currency.natural_key(), expected);
    }

    #[rstest]
    fn currency_record_builds_transient_currency() {
        let record: CurrencyRecord =
            serde_json::from_value(json!({"code": "NGN", "name": "Nigerian naira", "symbol": "₦"}))
                .expect("decode currency");
        let currency = record.to_currency().expect("usable code");
        assert_eq!(currency.natural_key(), "NGN");
        assert!(!currency.is_persisted());
    }

    #[rstest]
    fn language_nulls_become_empty_strings() {
        let record: LanguageRecord = serde_json::from_value(json!({
            "iso639_1": null,
            "iso639_2": "nic",
            "name": "Hausa",
        }))
        .expect("decode language");
        let language = record.to_language();
        assert_eq!(language.iso639_1(), "");
        assert_eq!(language.iso639_2(), "nic");
        assert_eq!(language.native_name(), "");
    }

    #[rstest]
    fn upstream_document_is_kept_verbatim() {
        let raw = json!({
            "name": "Chad",
            "capital": null,
            "currencies": [{"code": null, "name": "CFA franc"}],
        });
        let record = CountryRecord::from_upstream(raw.clone()).expect("decode record");
        assert_eq!(record.capital, "");
        assert_eq!(record.upstream, Some(raw));
    }

    #[rstest]
    fn from_upstream_rejects_non_objects() {
        assert!(CountryRecord::from_upstream(json!(["Chad"])).is_err());
    }

    #[rstest]
    fn unmodelled_fields_survive_a_round_trip() {
        let raw = json!({
            "name": "Nigeria",
            "population": 186_988_000,
            "topLevelDomain": [".ng"],
        });
        let record: CountryRecord = serde_json::from_value(raw).expect("decode record");
        let encoded = serde_json::to_value(&record).expect("encode record");
        assert_eq!(encoded["population"], json!(186_988_000));
        assert_eq!(encoded["topLevelDomain"], json!([".ng"]));
        assert_eq!(encoded["alpha2Code"], json!(""));
    }
}
