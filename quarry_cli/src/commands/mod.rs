pub mod collect;
pub mod config;
pub mod interpret;
pub mod search;
pub mod sources;

use crate::cli::Cli;
use quarry_core::settings::{Settings, SettingsError, SettingsStore};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not read '{path}': {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source error: {0}")]
    Core(#[from] quarry_core::error::ConnectorError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] quarry_core::AnalysisError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CommandError {
    /// Error object printed on stdout when the output format is machine-readable.
    pub fn to_json(&self) -> serde_json::Value {
        let code = match self {
            CommandError::Core(e) => return e.to_json(),
            CommandError::Analysis(e) => e.code_str(),
            CommandError::InvalidInput(_) => "invalid_input",
            CommandError::ReadInput { .. } => "read_error",
            CommandError::Settings(_) => "settings_error",
            CommandError::Serialization(_) | CommandError::Yaml(_) | CommandError::Io(_) => {
                "internal_error"
            }
        };
        serde_json::json!({
            "code": code,
            "message": self.to_string(),
        })
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// The settings store selected by `--config`, or the default location.
pub fn settings_store(cli: &Cli) -> SettingsStore {
    match &cli.config {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::new_default(),
    }
}

/// Stored settings with environment fallbacks applied.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = settings_store(cli).load()?;
    Ok(settings.with_env_overrides())
}

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|source| CommandError::ReadInput {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Path::new("/nonexistent/quarry-note.md")).unwrap_err();
        assert!(matches!(err, CommandError::ReadInput { .. }));
        assert!(err.to_string().contains("quarry-note.md"));
    }

    #[test]
    fn test_error_json_codes() {
        let err = CommandError::from(quarry_core::AnalysisError::EmptyNote);
        assert_eq!(err.to_json()["code"], "invalid_input");

        let err = CommandError::from(quarry_core::error::ConnectorError::Timeout("slow".into()));
        assert_eq!(err.to_json()["code"], "timeout");
        assert_eq!(err.to_json()["message"], "Timeout: slow");
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        std::fs::write(&path, "Sleep and memory").unwrap();
        assert_eq!(read_input(&path).unwrap(), "Sleep and memory");
    }
}
