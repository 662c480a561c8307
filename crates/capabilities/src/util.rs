//! Shared utility functions for provider adapters.

use agentrt_domain::config::{AuthConfig, AuthMode};
use agentrt_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to a
/// retriable [`Error::Provider`] so the router's fallback chain kicks in.
pub(crate) fn from_reqwest(provider: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Provider {
            provider: provider.to_string(),
            message: e.to_string(),
            retriable: true,
        }
    }
}

/// Resolve the API key for a provider from its [`AuthConfig`].
///
/// `AuthMode::None` never resolves a key (returns an empty string); callers
/// that need no auth (local model servers) configure their provider this
/// way. `AuthMode::ApiKey`/`AwsSigv4` read the named environment variable.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    match auth.mode {
        AuthMode::None => Ok(String::new()),
        AuthMode::ApiKey | AuthMode::AwsSigv4 => {
            let env_var = auth
                .env
                .as_deref()
                .ok_or_else(|| Error::Config("auth.env not set for api_key mode".into()))?;
            std::env::var(env_var).map_err(|_| {
                Error::Config(format!(
                    "environment variable '{env_var}' not set or not valid UTF-8"
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_from_env() {
        let var = "AGENTRT_TEST_KEY_1";
        std::env::set_var(var, "secret-value");
        let auth = AuthConfig {
            mode: AuthMode::ApiKey,
            env: Some(var.into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "secret-value");
        std::env::remove_var(var);
    }

    #[test]
    fn resolve_api_key_none_mode_is_empty() {
        let auth = AuthConfig {
            mode: AuthMode::None,
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "");
    }

    #[test]
    fn resolve_api_key_missing_env_errors() {
        let auth = AuthConfig {
            mode: AuthMode::ApiKey,
            env: Some("AGENTRT_TEST_KEY_MISSING_XYZ".into()),
            ..Default::default()
        };
        assert!(resolve_api_key(&auth).is_err());
    }
}
