use anyhow::{Context, Result};
use std::path::Path;

use super::RepoId;

/// Obtains a local working copy of a repository.
pub trait SourceControl: Send + Sync {
    /// Materialize `repo` at `target`. `target` does not exist on entry.
    fn clone_repo(&self, repo: &RepoId, target: &Path) -> Result<()>;
}

/// Shallow clones over git2.
pub struct GitCloner {
    base_url: String,
    token: Option<String>,
}

impl GitCloner {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
        }
    }
}

impl SourceControl for GitCloner {
    fn clone_repo(&self, repo: &RepoId, target: &Path) -> Result<()> {
        let url = repo.clone_url(&self.base_url);
        tracing::info!("Cloning {} into {}", url, target.display());

        let mut callbacks = git2::RemoteCallbacks::new();
        if let Some(token) = self.token.clone() {
            callbacks.credentials(move |_url, _username, _allowed| {
                git2::Cred::userpass_plaintext("x-access-token", &token)
            });
        }

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(callbacks);
        fetch.depth(1);

        git2::build::RepoBuilder::new()
            .fetch_options(fetch)
            .clone(&url, target)
            .with_context(|| format!("Failed to clone {url}"))?;

        tracing::info!("Clone complete: {}", target.display());
        Ok(())
    }
}
