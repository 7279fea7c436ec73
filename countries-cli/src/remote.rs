//! Upstream service settings shared by `search` and `import`.

use std::time::Duration;

use countries_data::lookup::{CountryLookup, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use countries_data::{HttpCountryApi, HttpCountryApiConfig};

use crate::{ARG_TIMEOUT_SECS, CliError};

/// Resolved connection settings for the country information service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiSettings {
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) user_agent: String,
}

impl ApiSettings {
    /// Apply defaults to the merged optional values.
    pub(crate) fn resolve(
        base_url: Option<String>,
        timeout_secs: Option<u64>,
        user_agent: Option<String>,
    ) -> Result<Self, CliError> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::ZeroTimeout {
                field: ARG_TIMEOUT_SECS,
            });
        }
        Ok(Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
        })
    }
}

/// Builds the lookup used by a command invocation.
pub(crate) trait LookupBuilder {
    fn build(&self, settings: &ApiSettings) -> Result<Box<dyn CountryLookup>, CliError>;
}

pub(crate) struct HttpLookupBuilder;

impl LookupBuilder for HttpLookupBuilder {
    fn build(&self, settings: &ApiSettings) -> Result<Box<dyn CountryLookup>, CliError> {
        let config = HttpCountryApiConfig::new(settings.base_url.clone())
            .with_timeout(settings.timeout)
            .with_user_agent(settings.user_agent.clone());
        let api = HttpCountryApi::with_config(config).map_err(|source| CliError::BuildLookup {
            base_url: settings.base_url.clone(),
            source,
        })?;
        Ok(Box::new(api))
    }
}
