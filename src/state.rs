use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;
use crate::git::RepoId;
use crate::models::CodeUnit;
use crate::search::IndexSet;

/// Everything needed to answer queries against one repository.
///
/// Never mutated once published; a rebuild publishes a new one.
pub struct Session {
    pub repository: Option<RepoId>,
    /// Position `i` holds the unit with `id == i`.
    pub units: Vec<CodeUnit>,
    pub index: Option<IndexSet>,
    /// Relative paths that were walked, for the file tree.
    pub files: Vec<String>,
    pub indexed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn empty() -> Self {
        Self {
            repository: None,
            units: Vec::new(),
            index: None,
            files: Vec::new(),
            indexed_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }
}

/// Holds the live session. Readers clone the `Arc` and never see a partial
/// rebuild.
pub struct SessionStore {
    live: RwLock<Arc<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            live: RwLock::new(Arc::new(Session::empty())),
        }
    }

    pub fn snapshot(&self) -> Arc<Session> {
        self.live.read().clone()
    }

    pub fn commit(&self, session: Session) {
        *self.live.write() = Arc::new(session);
    }

    pub fn clear(&self) {
        self.commit(Session::empty());
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Ensure data directories exist
        std::fs::create_dir_all(config.repos_dir())?;

        let engine = Engine::new(config.clone())?;
        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        })
    }
}
