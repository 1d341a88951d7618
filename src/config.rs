use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Generation backend: "gemini" or "null"
    pub provider: String,
    pub model: String,
    /// Supports ${ENV_VAR} substitution
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Override the API base URL (e.g. a proxy); defaults per provider
    #[serde(default)]
    pub host: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    /// IANA timezone the household lives in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Language the assistant replies in
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    #[serde(default = "default_summary_interval")]
    pub interval_mins: u64,
    /// Label for whoever receives the summary message
    #[serde(default = "default_summary_recipient")]
    pub recipient: String,
    /// Context scope the summary draws from
    #[serde(default = "default_summary_scope")]
    pub scope: String,
    /// Search terms used to pull recent household activity
    #[serde(default = "default_summary_query")]
    pub context_query: String,
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.2
}

fn default_assistant_name() -> String {
    "Hearth".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_summary_interval() -> u64 {
    1440
}

fn default_summary_recipient() -> String {
    "family".to_string()
}

fn default_summary_scope() -> String {
    "global".to_string()
}

fn default_summary_query() -> String {
    "today tomorrow appointment dinner school practice reminder".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            timezone: default_timezone(),
            locale: default_locale(),
            language: default_language(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            interval_mins: default_summary_interval(),
            recipient: default_summary_recipient(),
            scope: default_summary_scope(),
            context_query: default_summary_query(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${GEMINI_API_KEY}
        let expanded = shellexpand::env(&content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }
}
