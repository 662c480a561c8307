use serde::{Deserialize, Serialize};

/// LLM and capability-adjacent generator configuration: default model
/// identifiers, the registered provider table, and fallback policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_text_model")]
    pub default_text_model: String,
    #[serde(default = "d_image_model")]
    pub default_image_model: String,
    #[serde(default = "d_video_model")]
    pub default_video_model: String,
    #[serde(default = "d_music_model")]
    pub default_music_model: String,
    #[serde(default = "d_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub startup_policy: LlmStartupPolicy,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub fallbacks: Vec<FallbackConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_text_model: d_text_model(),
            default_image_model: d_image_model(),
            default_video_model: d_video_model(),
            default_music_model: d_music_model(),
            default_timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
            startup_policy: LlmStartupPolicy::default(),
            providers: Vec::new(),
            fallbacks: Vec::new(),
        }
    }
}

/// Controls how the gateway handles capability provider initialization at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmStartupPolicy {
    /// Boot even if no providers initialize; capability endpoints report
    /// degraded readiness until credentials are configured.
    #[default]
    AllowNone,
    /// Abort startup if no provider successfully initializes.
    RequireOne,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenaiCompat,
    Anthropic,
    Google,
    AwsBedrock,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the API key.
    #[serde(default)]
    pub env: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    ApiKey,
    AwsSigv4,
    None,
}

/// A fallback candidate the router tries, in order, when the primary model
/// fails with a retriable error or doesn't satisfy required capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// `"provider_id/model_name"`.
    pub model: String,
    #[serde(default)]
    pub require_tools: bool,
    #[serde(default)]
    pub require_json: bool,
}

fn d_text_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn d_image_model() -> String {
    "imagen-3.0".to_string()
}
fn d_video_model() -> String {
    "veo-3.1".to_string()
}
fn d_music_model() -> String {
    "lyria-2".to_string()
}
fn d_timeout_ms() -> u64 {
    20_000
}
fn d_max_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_populate_model_identifiers() {
        let cfg = LlmConfig::default();
        assert_eq!(cfg.default_text_model, "gemini-2.0-flash");
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.startup_policy, LlmStartupPolicy::AllowNone);
    }

    #[test]
    fn partial_json_fills_remaining_defaults() {
        let json = r#"{"default_text_model": "custom-model"}"#;
        let cfg: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.default_text_model, "custom-model");
        assert_eq!(cfg.default_image_model, "imagen-3.0");
    }
}
