//! Upstream country lookups.
//!
//! [`CountryLookup`] is the seam between the cache and the country
//! information service: one synchronous call per [`SearchDimension`].
//! [`HttpCountryApi`] implements it against the REST Countries v2 API, and
//! [`batch_search`] fans a single term out across every dimension.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use countries_data::lookup::{CountryLookup, HttpCountryApi, HttpCountryApiConfig};
//!
//! let config = HttpCountryApiConfig::new("https://restcountries.com/v2")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let api = HttpCountryApi::with_config(config)?;
//!
//! let records = api.by_capital("Abuja")?;
//! println!("found {} countries", records.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use thiserror::Error;

use crate::record::CountryRecord;

mod http;
mod search;

pub use http::{
    ApiBuildError, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpCountryApi,
    HttpCountryApiConfig,
};
pub use search::{DimensionFailure, SearchError, SearchOutcome, batch_search, normalise_term};

/// The attribute a lookup term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchDimension {
    /// Full or partial country name.
    Name,
    /// ISO 3166-1 alpha-2 or alpha-3 code(s), `;`-separated.
    Code,
    /// Capital city.
    Capital,
    /// ISO 4217 currency code.
    Currency,
    /// ISO 639-1 language code.
    Language,
}

impl SearchDimension {
    /// Every dimension in batch search order.
    pub const ALL: [Self; 5] = [
        Self::Name,
        Self::Code,
        Self::Capital,
        Self::Currency,
        Self::Language,
    ];

    /// Lower-case label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Code => "code",
            Self::Capital => "capital",
            Self::Currency => "currency",
            Self::Language => "language",
        }
    }
}

impl fmt::Display for SearchDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a single upstream lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The request URL could not be built from the term.
    #[error("cannot build request URL from {base:?}")]
    InvalidUrl {
        /// Configured base URL.
        base: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status other than 404.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request could not be sent or the response not received.
    #[error("network error requesting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The response body was not a list of country records.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Error detail.
        message: String,
    },
}

/// Synchronous access to an upstream country-information service.
///
/// Lookups that match nothing return an empty vector, not an error.
pub trait CountryLookup {
    /// Records matching `term` along `dimension`.
    fn lookup(
        &self,
        dimension: SearchDimension,
        term: &str,
    ) -> Result<Vec<CountryRecord>, LookupError>;

    /// Records whose name matches `term`.
    fn by_name(&self, term: &str) -> Result<Vec<CountryRecord>, LookupError> {
        self.lookup(SearchDimension::Name, term)
    }

    /// Records whose alpha-2 or alpha-3 code matches `term`.
    fn by_code(&self, term: &str) -> Result<Vec<CountryRecord>, LookupError> {
        self.lookup(SearchDimension::Code, term)
    }

    /// Records whose capital matches `term`.
    fn by_capital(&self, term: &str) -> Result<Vec<CountryRecord>, LookupError> {
        self.lookup(SearchDimension::Capital, term)
    }

    /// Records using the currency `term`.
    fn by_currency(&self, term: &str) -> Result<Vec<CountryRecord>, LookupError> {
        self.lookup(SearchDimension::Currency, term)
    }

    /// Records speaking the language `term`.
    fn by_language(&self, term: &str) -> Result<Vec<CountryRecord>, LookupError> {
        self.lookup(SearchDimension::Language, term)
    }
}

impl<L: CountryLookup + ?Sized> CountryLookup for &L {
    fn lookup(
        &self,
        dimension: SearchDimension,
        term: &str,
    ) -> Result<Vec<CountryRecord>, LookupError> {
        (**self).lookup(dimension, term)
    }
}
