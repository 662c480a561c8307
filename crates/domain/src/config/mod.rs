//! Composed runtime configuration.
//!
//! Mirrors the shape recognised options table: one sub-config struct per
//! concern, each with `#[serde(default)]` fields backed by named `d_*()`
//! helper functions so a partially-specified TOML document still produces
//! a fully-populated `Config`.

mod llm;
mod memory;
mod search;
mod server;
mod sessions;

pub use llm::{AuthConfig, AuthMode, FallbackConfig, LlmConfig, LlmStartupPolicy, ProviderConfig, ProviderKind};
pub use memory::MemoryConfig;
pub use search::SearchConfig;
pub use server::ServerConfig;
pub use sessions::SessionsConfig;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            llm: LlmConfig::default(),
            sessions: SessionsConfig::default(),
            search: SearchConfig::default(),
            memory: MemoryConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults for any field (or the
    /// whole file) that is absent.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| crate::error::Error::Config(e.to_string()))
    }
}

/// Tenant namespace and provider region selection. `project_id` and the two
/// location fields are handed to whichever capability adapters need a
/// GCP-style project/region pair; other backends may ignore them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "d_region")]
    pub search_index_location: String,
    #[serde(default = "d_region")]
    pub memory_location: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            search_index_location: d_region(),
            memory_location: d_region(),
        }
    }
}

fn d_region() -> String {
    "us-west1".to_string()
}

// ── Config validation ──────────────────────────────────────────────────

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues. An empty
    /// vec means everything looks good.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.server.bind_addr.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "server.bind_addr".into(),
                message: "bind_addr must not be empty".into(),
            });
        }

        if self.llm.providers.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "llm.providers".into(),
                message: "no LLM providers configured, gateway will run with mock capabilities only".into(),
            });
        }

        let mut seen_ids = std::collections::HashSet::new();
        for (i, provider) in self.llm.providers.iter().enumerate() {
            if provider.id.is_empty() {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: format!("llm.providers[{i}].id"),
                    message: "provider id must not be empty".into(),
                });
            }
            if provider.base_url.is_empty() {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: format!("llm.providers[{i}].base_url"),
                    message: "base_url must not be empty".into(),
                });
            } else if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://") {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Error,
                    field: format!("llm.providers[{i}].base_url"),
                    message: format!("base_url must start with http:// or https:// (got \"{}\")", provider.base_url),
                });
            }
            if !provider.id.is_empty() && !seen_ids.insert(provider.id.as_str()) {
                issues.push(ConfigIssue {
                    severity: ConfigSeverity::Warning,
                    field: format!("llm.providers[{i}].id"),
                    message: format!("duplicate provider id \"{}\", later provider will shadow earlier one", provider.id),
                });
            }
        }

        if self.sessions.session_token_budget == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "sessions.session_token_budget".into(),
                message: "session_token_budget must be greater than 0".into(),
            });
        }

        if self.search.fuzzy_threshold < 0.0 || self.search.fuzzy_threshold > 1.0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "search.fuzzy_threshold".into(),
                message: "fuzzy_threshold must be between 0 and 1".into(),
            });
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_only_the_no_providers_warning() {
        let issues = Config::default().validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert_eq!(issues[0].field, "llm.providers");
    }

    #[test]
    fn empty_provider_base_url_is_an_error() {
        let mut config = Config::default();
        config.llm.providers.push(ProviderConfig {
            id: "p1".into(),
            kind: ProviderKind::OpenaiCompat,
            base_url: String::new(),
            auth: AuthConfig::default(),
            default_model: None,
        });
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.severity == ConfigSeverity::Error && i.field.contains("base_url")));
    }

    #[test]
    fn duplicate_provider_ids_warn() {
        let mut config = Config::default();
        for _ in 0..2 {
            config.llm.providers.push(ProviderConfig {
                id: "dup".into(),
                kind: ProviderKind::Anthropic,
                base_url: "https://example.com".into(),
                auth: AuthConfig::default(),
                default_model: None,
            });
        }
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.field.contains("dup") || i.message.contains("duplicate")));
    }
}
