//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::qa::QueryStyle;
use crate::storage::LogFormat;

/// Environment variables consulted for the graph password, in order
pub const GRAPH_PASSWORD_VARS: &[&str] = &["KGQA_GRAPH_PASSWORD", "NEO4J_PASSWORD"];

/// kgqa configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub graph: GraphConfig,
    pub llm: LlmConfig,
    pub enrichment: EnrichmentConfig,
    pub log: LogConfig,
}

/// Neo4j connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// HTTP endpoint of the Neo4j server
    pub uri: String,
    pub user: String,
    #[serde(skip)]
    pub password: Option<String>,
    /// Database name; `None` uses the server default
    pub database: Option<String>,
    pub timeout_secs: u64,
    pub query_style: QueryStyle,
}

/// Generative collaborator (Ollama chat) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Enrichment cascade settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Attempts per follow-up question, including the first
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts
    pub backoff_base_ms: u64,
    /// Skip follow-up questions already asked earlier in the same cascade
    pub dedup: bool,
}

/// Answer log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
    pub format: LogFormat,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:7474".to_string(),
            user: "neo4j".to_string(),
            password: None,
            database: Some("neo4j".to_string()),
            timeout_secs: 30,
            query_style: QueryStyle::Parameterized,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.0,
            timeout_secs: 600,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
            dedup: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("answers.txt"),
            format: LogFormat::Text,
        }
    }
}

impl GraphConfig {
    pub fn resolved_password(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(GRAPH_PASSWORD_VARS
            .iter()
            .find_map(|var| env::var(var).ok()))
    }

    pub fn redacted_password(&self) -> anyhow::Result<Option<String>> {
        self.resolved_password()
            .map(|opt| opt.map(|_| "********".to_string()))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.password.is_some() {
            return Err(anyhow!(
                "Graph passwords must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("KGQA_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("kgqa")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.graph.enforce_env_only()?;
        if self.enrichment.max_attempts == 0 {
            return Err(anyhow!("enrichment.max_attempts must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "graph.uri" => Ok(self.graph.uri.clone()),
            "graph.user" => Ok(self.graph.user.clone()),
            "graph.database" => Ok(self.graph.database.clone().unwrap_or_default()),
            "graph.timeout_secs" => Ok(self.graph.timeout_secs.to_string()),
            "graph.query_style" => Ok(self.graph.query_style.to_string()),
            "graph.password" => match self.graph.redacted_password()? {
                Some(redacted) => Ok(redacted),
                None => Ok("(not set - use KGQA_GRAPH_PASSWORD or NEO4J_PASSWORD env var)".to_string()),
            },

            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.model" => Ok(self.llm.model.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),

            "enrichment.max_attempts" => Ok(self.enrichment.max_attempts.to_string()),
            "enrichment.backoff_base_ms" => Ok(self.enrichment.backoff_base_ms.to_string()),
            "enrichment.dedup" => Ok(self.enrichment.dedup.to_string()),

            "log.path" => Ok(self.log.path.display().to_string()),
            "log.format" => Ok(self.log.format.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `kgqa config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "graph.uri" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    return Err(anyhow!("graph.uri must be an http(s) URL, got: {}", value));
                }
                self.graph.uri = value.trim_end_matches('/').to_string();
            }
            "graph.user" => {
                self.graph.user = value.to_string();
            }
            "graph.database" => {
                self.graph.database = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "graph.timeout_secs" => {
                self.graph.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }
            "graph.query_style" => {
                self.graph.query_style = value.parse().map_err(|e: String| anyhow!(e))?;
            }
            "graph.password" => {
                return Err(anyhow!(
                    "Passwords cannot be stored in configuration. \
                     Set the KGQA_GRAPH_PASSWORD or NEO4J_PASSWORD environment variable instead."
                ));
            }

            "llm.base_url" => {
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            "llm.model" => {
                self.llm.model = value.to_string();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            "enrichment.max_attempts" => {
                let attempts: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_attempts value: {}", value))?;
                if attempts == 0 {
                    return Err(anyhow!("max_attempts must be at least 1"));
                }
                self.enrichment.max_attempts = attempts;
            }
            "enrichment.backoff_base_ms" => {
                self.enrichment.backoff_base_ms = value
                    .parse()
                    .with_context(|| format!("Invalid backoff_base_ms value: {}", value))?;
            }
            "enrichment.dedup" => {
                self.enrichment.dedup = value
                    .parse()
                    .with_context(|| format!("Invalid dedup value (expected true/false): {}", value))?;
            }

            "log.path" => {
                self.log.path = PathBuf::from(value);
            }
            "log.format" => {
                self.log.format = value.parse().map_err(|e: String| anyhow!(e))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `kgqa config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "graph.uri",
            "graph.user",
            "graph.password",
            "graph.database",
            "graph.timeout_secs",
            "graph.query_style",
            "llm.base_url",
            "llm.model",
            "llm.temperature",
            "llm.timeout_secs",
            "enrichment.max_attempts",
            "enrichment.backoff_base_ms",
            "enrichment.dedup",
            "log.path",
            "log.format",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
