//! Login session and per-invocation context
//!
//! `qag login` writes `.qag/session.yaml`, `qag logout` removes it. Commands
//! that act on behalf of a user load it through [`Session::require`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::entity::{CycleId, UserId};
use crate::core::objects::LocalObjectStore;
use crate::core::project::Project;
use crate::core::store::{Store, StoreError};
use crate::entities::User;

/// The acting user and the cycle commands apply to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_cycle: Option<CycleId>,

    pub started: DateTime<Utc>,
}

/// Errors raised by session handling
#[derive(Debug, Error, miette::Diagnostic)]
pub enum SessionError {
    #[error("no user registered with e-mail '{email}'")]
    #[diagnostic(
        code(qag::session::unknown_user),
        help("register the user first with 'qag user add'")
    )]
    UnknownUser { email: String },

    #[error("not logged in")]
    #[diagnostic(code(qag::session::logged_out), help("run 'qag login <email>'"))]
    NotLoggedIn,

    #[error("no active cycle")]
    #[diagnostic(
        code(qag::session::no_cycle),
        help("select one with 'qag cycle use <id>' or pass --cycle")
    )]
    NoActiveCycle,

    #[error("failed to access session file {path:?}")]
    #[diagnostic(code(qag::session::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session file {path:?}: {message}")]
    #[diagnostic(code(qag::session::parse), help("run 'qag logout' and log in again"))]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl Session {
    /// Start a session for the user registered with `email`
    ///
    /// Nothing is written when the e-mail is unknown.
    pub fn login(project: &Project, store: &Store, email: &str) -> Result<Self, SessionError> {
        let email = email.trim();
        let user = store
            .find_user_by_email(email)?
            .ok_or_else(|| SessionError::UnknownUser {
                email: email.to_string(),
            })?;

        let session = Self::for_user(&user);
        session.save(project)?;
        tracing::info!(user = %user.email, "logged in");
        Ok(session)
    }

    fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            active_cycle: None,
            started: Utc::now(),
        }
    }

    /// End the current session; returns whether one existed
    pub fn logout(project: &Project) -> Result<bool, SessionError> {
        let path = project.session_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }

    /// Load the persisted session, `None` when logged out
    pub fn load(project: &Project) -> Result<Option<Self>, SessionError> {
        Self::load_path(&project.session_path())
    }

    fn load_path(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yml::from_str(&contents)
            .map(Some)
            .map_err(|e| SessionError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Load the persisted session or fail with [`SessionError::NotLoggedIn`]
    pub fn require(project: &Project) -> Result<Self, SessionError> {
        Self::load(project)?.ok_or(SessionError::NotLoggedIn)
    }

    /// Persist the session to the project
    pub fn save(&self, project: &Project) -> Result<(), SessionError> {
        let path = project.session_path();
        let yaml = serde_yml::to_string(self).map_err(|e| SessionError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, yaml).map_err(|source| SessionError::Io { path, source })
    }

    /// Select the cycle subsequent commands apply to
    pub fn set_active_cycle(&mut self, project: &Project, cycle: CycleId) -> Result<(), SessionError> {
        self.active_cycle = Some(cycle);
        self.save(project)
    }

    /// The cycle to act on: an explicit override wins over the session's choice
    pub fn cycle(&self, explicit: Option<CycleId>) -> Result<CycleId, SessionError> {
        explicit
            .or(self.active_cycle)
            .ok_or(SessionError::NoActiveCycle)
    }
}

/// Everything a command handler needs, opened once per invocation
pub struct Context {
    pub project: Project,
    pub config: Config,
    pub store: Store,
}

impl Context {
    /// Discover the project (or use `root`) and open its config and database
    pub fn open(root: Option<&Path>) -> miette::Result<Self> {
        let project = match root {
            Some(root) => Project::discover_from(root)?,
            None => Project::discover()?,
        };
        let config = Config::load(Some(&project))?;
        let store = Store::open(&project)?;
        Ok(Self {
            project,
            config,
            store,
        })
    }

    /// Object store configured for this project
    pub fn objects(&self) -> LocalObjectStore {
        LocalObjectStore::new(self.config.object_store_dir(&self.project))
    }

    pub fn session(&self) -> Result<Session, SessionError> {
        Session::require(&self.project)
    }
}
