//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::Project;

/// Evidence download timeout when none is configured
pub const DEFAULT_EVIDENCE_TIMEOUT_SECS: u64 = 10;

/// QAG configuration with layered hierarchy
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor command for `qag crit edit` / `qag case edit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Per-image timeout while fetching evidence for a report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_timeout_secs: Option<u64>,

    /// Object store directory (relative paths resolve against the project root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_store: Option<PathBuf>,

    /// Default output format for list commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
}

/// Errors raised while loading configuration
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    #[diagnostic(code(qag::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {message}")]
    #[diagnostic(code(qag::config::parse), help("check the YAML syntax and key names"))]
    Parse { path: PathBuf, message: String },

    #[error("invalid value '{value}' for environment variable {var}")]
    #[diagnostic(code(qag::config::env))]
    InvalidEnv { var: &'static str, value: String },
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// 1. Built-in defaults
    /// 2. Global user config (`<config dir>/qag/config.yaml`)
    /// 3. Project config (`.qag/config.yaml`)
    /// 4. Environment variables (`QAG_EDITOR`, `QAG_EVIDENCE_TIMEOUT`, `QAG_OBJECT_STORE`)
    pub fn load(project: Option<&Project>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path)? {
                config.merge(global);
            }
        }

        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path())? {
                config.merge(project_config);
            }
        }

        config.apply_env(|var| std::env::var(var).ok())?;

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parse a config file, `None` if it does not exist
    fn read_file(path: &Path) -> Result<Option<Config>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Some(Config::default()));
        }
        // A file holding only comments parses as null
        serde_yml::from_str::<Option<Config>>(&contents)
            .map(|c| Some(c.unwrap_or_default()))
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "qag")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.evidence_timeout_secs.is_some() {
            self.evidence_timeout_secs = other.evidence_timeout_secs;
        }
        if other.object_store.is_some() {
            self.object_store = other.object_store;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(editor) = lookup("QAG_EDITOR") {
            self.editor = Some(editor);
        }
        if let Some(timeout) = lookup("QAG_EVIDENCE_TIMEOUT") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: "QAG_EVIDENCE_TIMEOUT",
                value: timeout.clone(),
            })?;
            self.evidence_timeout_secs = Some(secs);
        }
        if let Some(dir) = lookup("QAG_OBJECT_STORE") {
            self.object_store = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Timeout applied to each evidence download
    pub fn evidence_timeout(&self) -> Duration {
        Duration::from_secs(
            self.evidence_timeout_secs
                .unwrap_or(DEFAULT_EVIDENCE_TIMEOUT_SECS)
                .max(1),
        )
    }

    /// Resolve the object store directory for a project
    pub fn object_store_dir(&self, project: &Project) -> PathBuf {
        match &self.object_store {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project.root().join(dir),
            None => project.objects_dir(),
        }
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, properly handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let mut parts = editor.split_whitespace();

        let Some(cmd) = parts.next() else {
            return std::process::Command::new("vi").arg(file_path).status();
        };

        std::process::Command::new(cmd)
            .args(parts)
            .arg(file_path)
            .status()
    }
}
