use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides `backend.api_key`.
pub const API_KEY_ENV: &str = "VECTARA_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub customer_id: u64,
    pub corpus_id: u64,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.vectara.io/v1/query".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl BackendConfig {
    /// Resolves the API key, preferring `VECTARA_API_KEY` over the file value.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }
}

/// Fixed per-request parameters sent with every query.
#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_num_results")]
    pub num_results: u32,
    #[serde(default)]
    pub chars_before: u32,
    #[serde(default)]
    pub chars_after: u32,
    #[serde(default = "default_sentences")]
    pub sentences_before: u32,
    #[serde(default = "default_sentences")]
    pub sentences_after: u32,
    #[serde(default = "default_reranker_id")]
    pub reranker_id: u64,
    #[serde(default)]
    pub diversity_bias: f64,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default = "default_max_summarized_results")]
    pub max_summarized_results: u32,
    #[serde(default = "default_response_lang")]
    pub response_lang: String,
    #[serde(default = "default_summarizer_prompt_name")]
    pub summarizer_prompt_name: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
            chars_before: 0,
            chars_after: 0,
            sentences_before: default_sentences(),
            sentences_after: default_sentences(),
            reranker_id: default_reranker_id(),
            diversity_bias: 0.0,
            lambda: default_lambda(),
            max_summarized_results: default_max_summarized_results(),
            response_lang: default_response_lang(),
            summarizer_prompt_name: default_summarizer_prompt_name(),
        }
    }
}

fn default_num_results() -> u32 {
    3
}
fn default_sentences() -> u32 {
    2
}
fn default_reranker_id() -> u64 {
    272725718
}
fn default_lambda() -> f64 {
    0.025
}
fn default_max_summarized_results() -> u32 {
    5
}
fn default_response_lang() -> String {
    "auto".to_string()
}
fn default_summarizer_prompt_name() -> String {
    "vectara-summary-ext-v1.2.0".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Upper bound on tracked query keys. `None` keeps every key forever.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.backend.endpoint.trim().is_empty() {
        anyhow::bail!("backend.endpoint must not be empty");
    }
    if !config.backend.endpoint.starts_with("http://")
        && !config.backend.endpoint.starts_with("https://")
    {
        anyhow::bail!(
            "backend.endpoint must be an http(s) URL, got '{}'",
            config.backend.endpoint
        );
    }
    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be > 0");
    }

    if config.query.num_results == 0 {
        anyhow::bail!("query.num_results must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.query.lambda) {
        anyhow::bail!("query.lambda must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&config.query.diversity_bias) {
        anyhow::bail!("query.diversity_bias must be in [0.0, 1.0]");
    }

    if config.store.max_entries == Some(0) {
        anyhow::bail!("store.max_entries must be >= 1 when set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let file = write_config(
            r#"
[backend]
customer_id = 2523211369
corpus_id = 14
"#,
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.backend.endpoint, "https://api.vectara.io/v1/query");
        assert_eq!(cfg.backend.timeout_secs, 30);
        assert_eq!(cfg.query.num_results, 3);
        assert_eq!(cfg.query.sentences_before, 2);
        assert_eq!(cfg.query.reranker_id, 272725718);
        assert_eq!(cfg.query.summarizer_prompt_name, "vectara-summary-ext-v1.2.0");
        assert_eq!(cfg.server.bind, "127.0.0.1:7340");
        assert!(cfg.store.max_entries.is_none());
    }

    #[test]
    fn rejects_zero_timeout() {
        let file = write_config(
            r#"
[backend]
customer_id = 1
corpus_id = 1
timeout_secs = 0
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let file = write_config(
            r#"
[backend]
endpoint = "ftp://example.com"
customer_id = 1
corpus_id = 1
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_store_bound() {
        let file = write_config(
            r#"
[backend]
customer_id = 1
corpus_id = 1

[store]
max_entries = 0
"#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/vsearch.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vsearch.toml"));
    }
}
