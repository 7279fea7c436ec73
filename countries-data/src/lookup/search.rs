//! Fan one search term out across every lookup dimension.

use log::{debug, warn};
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use super::{CountryLookup, LookupError, SearchDimension};
use crate::record::CountryRecord;

/// Errors that prevent a batch search from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The term was empty once whitespace was removed.
    #[error("search term is empty")]
    EmptyTerm,
}

/// A dimension whose lookup failed during a batch search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionFailure {
    /// Dimension that failed.
    pub dimension: SearchDimension,
    /// Failure reported by the lookup.
    pub error: LookupError,
}

/// Records collected by [`batch_search`].
///
/// Serialises as the list of records. A record decoded from an upstream
/// document is written back as that document; failures are not serialised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Records in dimension order, not deduplicated.
    pub records: Vec<CountryRecord>,
    /// Dimensions that failed and contributed nothing.
    pub failures: Vec<DimensionFailure>,
}

impl Serialize for SearchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter().map(Echo::from))
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Echo<'a> {
    Upstream(&'a Value),
    Decoded(&'a CountryRecord),
}

impl<'a> From<&'a CountryRecord> for Echo<'a> {
    fn from(record: &'a CountryRecord) -> Self {
        record
            .upstream
            .as_ref()
            .map_or(Self::Decoded(record), Self::Upstream)
    }
}

/// Remove all whitespace from `raw`.
///
/// # Errors
///
/// Returns [`SearchError::EmptyTerm`] when nothing remains.
///
/// # Examples
/// ```
/// use countries_data::lookup::normalise_term;
///
/// assert_eq!(normalise_term(" United Kingdom ").as_deref(), Ok("UnitedKingdom"));
/// assert!(normalise_term(" \t ").is_err());
/// ```
pub fn normalise_term(raw: &str) -> Result<String, SearchError> {
    let term: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if term.is_empty() {
        Err(SearchError::EmptyTerm)
    } else {
        Ok(term)
    }
}

/// Look `raw_term` up along name, code, capital, currency and language, in
/// that order, and concatenate the results.
///
/// A failing dimension is logged and recorded in
/// [`SearchOutcome::failures`]; the remaining dimensions still run.
///
/// # Errors
///
/// Returns [`SearchError::EmptyTerm`] before any lookup when the term is
/// blank.
pub fn batch_search<L: CountryLookup + ?Sized>(
    lookup: &L,
    raw_term: &str,
) -> Result<SearchOutcome, SearchError> {
    let term = normalise_term(raw_term)?;
    let mut outcome = SearchOutcome::default();
    for dimension in SearchDimension::ALL {
        match lookup.lookup(dimension, &term) {
            Ok(records) => {
                debug!("{dimension} lookup for {term:?} found {} records", records.len());
                outcome.records.extend(records);
            }
            Err(error) => {
                warn!("{dimension} lookup for {term:?} failed: {error}");
                outcome.failures.push(DimensionFailure { dimension, error });
            }
        }
    }
    Ok(outcome)
}
