//! HTTP-based [`CountryLookup`] using the REST Countries v2 API.
//!
//! # Architecture
//!
//! [`CountryLookup`] is synchronous so the reconciler and the CLI stay free of
//! async plumbing. This client bridges the async `reqwest` calls to that
//! interface by blocking on a Tokio runtime it owns.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::{CountryLookup, LookupError, SearchDimension};
use crate::record::CountryRecord;

/// Default REST Countries endpoint.
pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v2";

/// Default user agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "countries-cache/0.1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while constructing an [`HttpCountryApi`].
#[derive(Debug, Error)]
pub enum ApiBuildError {
    /// The base URL does not parse or cannot carry path segments.
    #[error("invalid base URL {url:?}")]
    BaseUrl {
        /// Rejected URL.
        url: String,
        /// Parse failure, absent when the URL parsed but cannot be a base.
        #[source]
        source: Option<url::ParseError>,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`HttpCountryApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCountryApiConfig {
    /// Base URL of the API, e.g. `"https://restcountries.com/v2"`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpCountryApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpCountryApiConfig {
    /// Configuration for `base_url` with default timeout and user agent.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// REST Countries client.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the client blocks on its own current-thread
/// runtime. Inside a multi-threaded runtime it uses that runtime's handle
/// with [`tokio::task::block_in_place`]. Inside any other runtime, such as a
/// `current_thread` one, the request is driven by the client's own runtime on
/// a scoped helper thread, blocking the caller's executor until it returns.
pub struct HttpCountryApi {
    client: Client,
    base: Url,
    timeout: Duration,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpCountryApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCountryApi")
            .field("base", &self.base.as_str())
            .field("timeout", &self.timeout)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpCountryApi {
    /// Client for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiBuildError> {
        Self::with_config(HttpCountryApiConfig::new(base_url))
    }

    /// Client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn with_config(config: HttpCountryApiConfig) -> Result<Self, ApiBuildError> {
        let base = parse_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ApiBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ApiBuildError::Runtime)?;
        Ok(Self {
            client,
            base,
            timeout: config.timeout,
            runtime,
        })
    }

    /// Endpoint URL for `term` along `dimension`.
    ///
    /// Terms are encoded as a single path segment, or as the `codes` query
    /// parameter for code lookups.
    fn request_url(&self, dimension: SearchDimension, term: &str) -> Result<Url, LookupError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| LookupError::InvalidUrl {
                    base: self.base.to_string(),
                })?;
            segments.pop_if_empty();
            match dimension {
                SearchDimension::Name => segments.extend(["name", term]),
                SearchDimension::Code => segments.push("alpha"),
                SearchDimension::Capital => segments.extend(["capital", term]),
                SearchDimension::Currency => segments.extend(["currency", term]),
                SearchDimension::Language => segments.extend(["lang", term]),
            };
        }
        if dimension == SearchDimension::Code {
            url.query_pairs_mut().append_pair("codes", term);
        }
        Ok(url)
    }

    async fn fetch_async(&self, url: Url) -> Result<Vec<CountryRecord>, LookupError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("no countries at {url}");
            return Ok(Vec::new());
        }

        let body = response
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        decode_records(&body).map_err(|err| LookupError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> LookupError {
        if error.is_timeout() {
            return LookupError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return LookupError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        LookupError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

impl CountryLookup for HttpCountryApi {
    fn lookup(
        &self,
        dimension: SearchDimension,
        term: &str,
    ) -> Result<Vec<CountryRecord>, LookupError> {
        let url = self.request_url(dimension, term)?;
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.fetch_async(url)))
            }
            // Blocking on a runtime from a thread already driving one panics.
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| self.runtime.block_on(self.fetch_async(url)))
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            }),
            Err(_) => self.runtime.block_on(self.fetch_async(url)),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiBuildError> {
    let url = Url::parse(raw).map_err(|source| ApiBuildError::BaseUrl {
        url: raw.to_owned(),
        source: Some(source),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiBuildError::BaseUrl {
            url: raw.to_owned(),
            source: None,
        });
    }
    Ok(url)
}

/// Decode a response body, keeping each upstream document. Code lookups
/// answer with `null` for unknown codes; those entries are dropped.
fn decode_records(body: &[u8]) -> Result<Vec<CountryRecord>, serde_json::Error> {
    let documents: Vec<Option<Value>> = serde_json::from_slice(body)?;
    documents
        .into_iter()
        .flatten()
        .map(CountryRecord::from_upstream)
        .collect()
}
