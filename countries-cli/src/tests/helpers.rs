//! Test doubles for building lookups without the network.

use std::cell::RefCell;

use countries_data::CountryRecord;
use countries_data::lookup::{CountryLookup, LookupError, SearchDimension};
use countries_data::test_support::StubCountryLookup;

use crate::CliError;
use crate::remote::{ApiSettings, LookupBuilder};

/// Builds a fresh [`StubCountryLookup`] per invocation and remembers the
/// settings it was asked to honour.
#[derive(Debug, Default)]
pub(super) struct StubLookupBuilder {
    responses: Vec<(SearchDimension, Result<Vec<CountryRecord>, LookupError>)>,
    settings: RefCell<Option<ApiSettings>>,
}

impl StubLookupBuilder {
    pub(super) fn with_records(mut self, dimension: SearchDimension, records: Vec<CountryRecord>) -> Self {
        self.responses.push((dimension, Ok(records)));
        self
    }

    pub(super) fn with_failure(mut self, dimension: SearchDimension, error: LookupError) -> Self {
        self.responses.push((dimension, Err(error)));
        self
    }

    pub(super) fn settings(&self) -> Option<ApiSettings> {
        self.settings.borrow().clone()
    }
}

impl LookupBuilder for StubLookupBuilder {
    fn build(&self, settings: &ApiSettings) -> Result<Box<dyn CountryLookup>, CliError> {
        self.settings.replace(Some(settings.clone()));
        let lookup = self
            .responses
            .iter()
            .cloned()
            .fold(StubCountryLookup::new(), |stub, (dimension, response)| {
                match response {
                    Ok(records) => stub.with_records(dimension, records),
                    Err(error) => stub.with_failure(dimension, error),
                }
            });
        Ok(Box::new(lookup))
    }
}
