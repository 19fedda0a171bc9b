//! User settings and their on-disk store.
//!
//! Settings live in YAML at `~/.config/quarry/settings.yaml` (platform config
//! dir). Every field has a default, so a partial or missing file is fine.

use crate::federated::SourceSelection;
use crate::llm::BackendKind;
use crate::prompts::DEFAULT_PROMPT_TEMPLATE;
use crate::utils::{non_blank, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_SEMANTIC_SCHOLAR_API_KEY: &str = "SEMANTIC_SCHOLAR_API_KEY";
pub const ENV_PUBMED_EMAIL: &str = "PUBMED_EMAIL";

/// Keys accepted by [`Settings::set`].
pub const SETTABLE_KEYS: &[&str] = &[
    "max_results",
    "default_source",
    "semantic_scholar_api_key",
    "pubmed_email",
    "prompt_template",
    "search_timeout_secs",
    "llm.backend",
    "llm.cli_path",
    "llm.api_key",
    "llm.model",
    "llm.timeout_secs",
    "endpoints.arxiv",
    "endpoints.pubmed",
    "endpoints.semantic_scholar",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Page size requested from each source per query; 0 means the default.
    pub max_results: u32,

    pub default_source: SourceSelection,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubmed_email: Option<String>,

    pub llm: LlmSettings,

    /// Must contain `{NOTE_CONTENT}` to receive the note.
    pub prompt_template: String,

    /// Budget for one source call during a federated search.
    pub search_timeout_secs: u64,

    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_LIMIT,
            default_source: SourceSelection::default(),
            semantic_scholar_api_key: None,
            pubmed_email: None,
            llm: LlmSettings::default(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub backend: BackendKind,

    /// Command used by the `cli` backend.
    pub cli_path: String,

    /// Key for the `api` backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model override for the `api` backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Cli,
            cli_path: crate::llm::cli::DEFAULT_CLI_PATH.to_string(),
            api_key: None,
            model: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl LlmSettings {
    /// Budget for one model call; never shorter than a second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Base URL overrides for mirrors and local test servers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arxiv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubmed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_scholar: Option<String>,
}

impl Settings {
    pub fn semantic_scholar_api_key(&self) -> Option<String> {
        non_blank(self.semantic_scholar_api_key.as_deref())
    }

    pub fn pubmed_email(&self) -> Option<String> {
        non_blank(self.pubmed_email.as_deref())
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }

    /// Fill empty credentials from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Fill empty credentials from `lookup`. Values already set win.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if non_blank(slot.as_deref()).is_none() {
                if let Some(v) = non_blank(value.as_deref()) {
                    *slot = Some(v);
                }
            }
        }
        fill(&mut self.llm.api_key, lookup(ENV_ANTHROPIC_API_KEY));
        fill(
            &mut self.semantic_scholar_api_key,
            lookup(ENV_SEMANTIC_SCHOLAR_API_KEY),
        );
        fill(&mut self.pubmed_email, lookup(ENV_PUBMED_EMAIL));
        self
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        fn mask(value: &Option<String>) -> Option<String> {
            non_blank(value.as_deref()).map(|_| "********".to_string())
        }
        let mut copy = self.clone();
        copy.semantic_scholar_api_key = mask(&self.semantic_scholar_api_key);
        copy.llm.api_key = mask(&self.llm.api_key);
        copy
    }

    /// Set one dotted key from its string form. A blank value clears optional
    /// fields.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = |message: String| SettingsError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let optional = |v: &str| non_blank(Some(v));

        match key {
            "max_results" => {
                self.max_results = value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
            }
            "default_source" => self.default_source = value.parse().map_err(invalid)?,
            "semantic_scholar_api_key" => self.semantic_scholar_api_key = optional(value),
            "pubmed_email" => self.pubmed_email = optional(value),
            "prompt_template" => self.prompt_template = value.to_string(),
            "search_timeout_secs" => {
                self.search_timeout_secs = value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
            }
            "llm.backend" => self.llm.backend = value.parse().map_err(invalid)?,
            "llm.cli_path" => self.llm.cli_path = value.trim().to_string(),
            "llm.api_key" => self.llm.api_key = optional(value),
            "llm.model" => self.llm.model = optional(value),
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
            }
            "endpoints.arxiv" => self.endpoints.arxiv = endpoint(value).map_err(invalid)?,
            "endpoints.pubmed" => self.endpoints.pubmed = endpoint(value).map_err(invalid)?,
            "endpoints.semantic_scholar" => {
                self.endpoints.semantic_scholar = endpoint(value).map_err(invalid)?
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Blank clears the override; anything else must be an absolute http(s) URL.
fn endpoint(value: &str) -> Result<Option<String>, String> {
    let Some(value) = non_blank(Some(value)) else {
        return Ok(None);
    };
    let parsed = url::Url::parse(&value).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => Ok(Some(value.trim_end_matches('/').to_string())),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

/// Storage for user settings.
///
/// Settings are stored in YAML format at `~/.config/quarry/settings.yaml`.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a settings store at the default location.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        let path = base.join("quarry").join("settings.yaml");
        Self { path }
    }

    /// Create a settings store at a custom path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(SettingsError::Io(e.to_string())),
        };
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content = serde_yaml::to_string(settings)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;

        std::fs::write(&self.path, content).map_err(|e| SettingsError::Io(e.to_string()))?;

        Ok(())
    }

    /// Write the defaults unless a file already exists. Returns whether a
    /// file was written.
    pub fn init(&self) -> Result<bool, SettingsError> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&Settings::default())?;
        Ok(true)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Errors from settings storage and editing.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
