//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project metadata directory
pub const PROJECT_DIR: &str = ".qag";

/// Represents a QAG project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .qag/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_structure(root)
    }

    /// Force initialization even if .qag/ exists
    ///
    /// The config file is rewritten; the database and uploaded objects are kept.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(root)
    }

    fn create_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let project = Self { root };

        std::fs::create_dir_all(project.objects_dir())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.config_path(), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(project.qag_dir().join(".gitignore"), "qa.db*\nobjects/\nsession.yaml\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(project)
    }

    fn default_config() -> &'static str {
        r#"# QAG Project Configuration

# Editor used by `qag crit edit` and `qag case edit` (default: $EDITOR)
# editor: ""

# Seconds to wait for each evidence image while building a report
# evidence_timeout_secs: 10

# Directory holding uploaded evidence (default: .qag/objects)
# object_store: ""

# Default output format for list commands (auto, tsv, json, csv, md, yaml, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .qag metadata directory
    pub fn qag_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Project-level config file
    pub fn config_path(&self) -> PathBuf {
        self.qag_dir().join("config.yaml")
    }

    /// SQLite database holding all QA records
    pub fn db_path(&self) -> PathBuf {
        self.qag_dir().join("qa.db")
    }

    /// Default object store directory for uploaded evidence
    pub fn objects_dir(&self) -> PathBuf {
        self.qag_dir().join("objects")
    }

    /// Persisted login session
    pub fn session_path(&self) -> PathBuf {
        self.qag_dir().join("session.yaml")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ProjectError {
    #[error("not a QAG project (searched from {searched_from:?})")]
    #[diagnostic(code(qag::project::not_found), help("run 'qag init' to create one"))]
    NotFound { searched_from: PathBuf },

    #[error("QAG project already exists at {0:?}")]
    #[diagnostic(code(qag::project::exists))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(qag::project::io))]
    IoError(String),
}
