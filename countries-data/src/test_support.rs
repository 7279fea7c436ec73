//! Test doubles for lookups and storage.
//!
//! [`StubCountryLookup`] answers from canned responses without touching the
//! network, and [`CountingGateway`] wraps a real gateway to count writes.

use std::{cell::RefCell, collections::HashMap};

use countries_core::EntityId;

use crate::gateway::{GatewayError, Row, Statement, StorageGateway};
use crate::lookup::{CountryLookup, LookupError, SearchDimension};
use crate::record::{CountryRecord, CurrencyRecord, LanguageRecord};

/// Deterministic [`CountryLookup`] for tests.
///
/// Dimensions without a configured response return no records.
///
/// # Example
///
/// ```
/// use countries_data::lookup::{CountryLookup, SearchDimension};
/// use countries_data::test_support::{StubCountryLookup, nigeria};
///
/// let lookup = StubCountryLookup::new().with_records(SearchDimension::Capital, vec![nigeria()]);
/// assert_eq!(lookup.by_capital("Abuja").map(|found| found.len()), Ok(1));
/// assert_eq!(lookup.by_name("Abuja").map(|found| found.len()), Ok(0));
/// ```
#[derive(Debug, Default)]
pub struct StubCountryLookup {
    responses: HashMap<SearchDimension, Result<Vec<CountryRecord>, LookupError>>,
    calls: RefCell<Vec<(SearchDimension, String)>>,
}

impl StubCountryLookup {
    /// Stub with no configured responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `dimension` with `records`.
    #[must_use]
    pub fn with_records(mut self, dimension: SearchDimension, records: Vec<CountryRecord>) -> Self {
        self.responses.insert(dimension, Ok(records));
        self
    }

    /// Fail `dimension` with `error`.
    #[must_use]
    pub fn with_failure(mut self, dimension: SearchDimension, error: LookupError) -> Self {
        self.responses.insert(dimension, Err(error));
        self
    }

    /// Lookups received so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(SearchDimension, String)> {
        self.calls.borrow().clone()
    }
}

impl CountryLookup for StubCountryLookup {
    fn lookup(
        &self,
        dimension: SearchDimension,
        term: &str,
    ) -> Result<Vec<CountryRecord>, LookupError> {
        self.calls.borrow_mut().push((dimension, term.to_owned()));
        self.responses
            .get(&dimension)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// [`StorageGateway`] wrapper counting `execute` calls.
#[derive(Debug)]
pub struct CountingGateway<G> {
    inner: G,
    writes: usize,
}

impl<G> CountingGateway<G> {
    /// Wrap `inner` with a zeroed counter.
    pub const fn new(inner: G) -> Self {
        Self { inner, writes: 0 }
    }

    /// Number of `execute` calls so far, successful or not.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Borrow the wrapped gateway.
    #[must_use]
    pub const fn inner(&self) -> &G {
        &self.inner
    }

    /// Unwrap the gateway.
    #[must_use]
    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: StorageGateway> StorageGateway for CountingGateway<G> {
    fn execute(&mut self, statement: &Statement) -> Result<usize, GatewayError> {
        self.writes += 1;
        self.inner.execute(statement)
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>, GatewayError> {
        self.inner.query(statement)
    }

    fn last_insert_id(&self) -> EntityId {
        self.inner.last_insert_id()
    }
}

/// Nigeria as REST Countries v2 describes it.
#[must_use]
pub fn nigeria() -> CountryRecord {
    CountryRecord {
        name: "Nigeria".into(),
        capital: "Abuja".into(),
        alpha2_code: "NG".into(),
        alpha3_code: "NGA".into(),
        numeric_code: Some("566".into()),
        calling_codes: vec!["234".into()],
        flag: "https://restcountries.eu/data/nga.svg".into(),
        region: "Africa".into(),
        currencies: vec![CurrencyRecord {
            code: Some("NGN".into()),
            name: "Nigerian naira".into(),
            symbol: "₦".into(),
        }],
        languages: vec![LanguageRecord {
            iso639_1: "en".into(),
            iso639_2: "eng".into(),
            name: "English".into(),
            native_name: "English".into(),
        }],
        timezones: vec!["UTC+01:00".into()],
        ..CountryRecord::default()
    }
}
