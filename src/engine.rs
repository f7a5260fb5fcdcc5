use chrono::Utc;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::chunking;
use crate::config::{ChunkingConfig, Config};
use crate::error::{EngineError, EngineResult};
use crate::git::checkout::remove_dir_best_effort;
use crate::git::tree::{build_file_tree, TreeNode};
use crate::git::{walk_repo_files, Checkout, FileSet, GitCloner, RepoId, SourceControl};
use crate::llm::embeddings::create_embedder;
use crate::models::{IngestOutcome, IngestStatus, SearchResponse};
use crate::search::query::{self, normalize_query};
use crate::search::{build_index_set, Modality, VectorModality};
use crate::state::{Session, SessionStore};

/// Owns the live session and the local checkout behind it.
///
/// Ingest and reindex are serialized; searches run against whichever session
/// was live when they started.
pub struct Engine {
    config: Config,
    modalities: Vec<VectorModality>,
    source: Arc<dyn SourceControl>,
    session: SessionStore,
    checkout: Mutex<Option<Checkout>>,
    /// Held until every blocking step of a rebuild has returned, including
    /// clones whose caller gave up waiting.
    rebuild_permit: Arc<Semaphore>,
    /// Suffix for checkout directories; each clone attempt gets its own.
    clone_attempts: AtomicU64,
}

impl Engine {
    /// Engine with a git2 cloner and the configured embedding providers.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let modalities = config
            .modalities
            .iter()
            .map(|m| {
                Ok(VectorModality {
                    name: m.name.clone(),
                    label: m.label.clone(),
                    view: m.view,
                    embedder: create_embedder(&http_client, &m.embedding)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        for m in &modalities {
            tracing::info!(
                "Vector modality {} uses {} ({} dims)",
                m.name,
                m.embedder.model_name(),
                m.embedder.dims()
            );
        }

        let source = Arc::new(GitCloner::new(
            config.git_base_url.clone(),
            config.git_token.clone(),
        ));
        Ok(Self::with_collaborators(config, source, modalities))
    }

    pub fn with_collaborators(
        config: Config,
        source: Arc<dyn SourceControl>,
        modalities: Vec<VectorModality>,
    ) -> Self {
        Self {
            config,
            modalities,
            source,
            session: SessionStore::new(),
            checkout: Mutex::new(None),
            rebuild_permit: Arc::new(Semaphore::new(1)),
            clone_attempts: AtomicU64::new(0),
        }
    }

    pub fn modalities(&self) -> &[VectorModality] {
        &self.modalities
    }

    pub fn snapshot(&self) -> Arc<Session> {
        self.session.snapshot()
    }

    /// Directory of the checkout behind the live session, if any.
    pub fn checkout_path(&self) -> Option<PathBuf> {
        self.checkout.lock().as_ref().map(|c| c.path().to_path_buf())
    }

    async fn acquire_rebuild(&self) -> EngineResult<OwnedSemaphorePermit> {
        self.rebuild_permit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Internal(anyhow::anyhow!("Rebuild semaphore closed")))
    }

    /// Make `raw` the indexed repository, cloning and rebuilding unless it
    /// already is.
    pub async fn ingest(&self, raw: &str) -> EngineResult<IngestOutcome> {
        let repo = RepoId::parse(raw, &self.config.git_base_url)?;
        let permit = self.acquire_rebuild().await?;

        let current = self.session.snapshot();
        if current.repository.as_ref() == Some(&repo) {
            tracing::info!("{repo} already indexed, serving cached session");
            return Ok(outcome(IngestStatus::Cached, &current));
        }

        // Nothing from the previous repository may be served from here on.
        self.session.clear();
        let previous = self.checkout.lock().take();

        let (checkout, files, _permit) = self.fetch(&repo, previous, permit).await?;
        let session = build_session(repo.clone(), files, &self.config, &self.modalities).await?;

        let result = outcome(IngestStatus::Success, &session);
        tracing::info!("Indexed {repo}: {} units", result.count);
        *self.checkout.lock() = Some(checkout);
        self.session.commit(session);
        Ok(result)
    }

    /// Rebuild the current repository from its existing checkout. The live
    /// session is only replaced once the rebuild succeeds.
    pub async fn reindex(&self) -> EngineResult<IngestOutcome> {
        let _permit = self.acquire_rebuild().await?;

        let current = self.session.snapshot();
        let repo = current.repository.clone().ok_or(EngineError::NothingIndexed)?;
        let root = self.checkout_path().ok_or(EngineError::NothingIndexed)?;

        let chunking = self.config.chunking.clone();
        let files = tokio::task::spawn_blocking(move || walk_repo_files(&root, &chunking))
            .await
            .map_err(|e| EngineError::Internal(anyhow::anyhow!("Walk task failed: {e}")))?;

        match build_session(repo.clone(), files, &self.config, &self.modalities).await {
            Ok(session) => {
                let result = outcome(IngestStatus::Success, &session);
                tracing::info!("Reindexed {repo}: {} units", result.count);
                self.session.commit(session);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Reindex of {repo} failed, keeping previous index: {e}");
                Err(e)
            }
        }
    }

    /// Rank units of the live session against `raw_query`.
    pub async fn search(
        &self,
        raw_query: &str,
        model: &str,
        k: Option<usize>,
    ) -> EngineResult<SearchResponse> {
        if raw_query.trim().is_empty() {
            return Err(EngineError::InvalidQuery("query is required".to_string()));
        }

        let k = k.unwrap_or(self.config.default_k);
        if k == 0 || k > self.config.max_k {
            return Err(EngineError::InvalidQuery(format!(
                "k must be between 1 and {}",
                self.config.max_k
            )));
        }

        let modality = Modality::resolve(model, &self.modalities)?;
        let label = query::label(modality, &self.modalities).to_string();
        let normalized = normalize_query(raw_query);
        let session = self.session.snapshot();

        let results = match &session.index {
            Some(index) if !normalized.is_empty() => {
                query::run(
                    &session.units,
                    index,
                    &self.modalities,
                    modality,
                    &normalized,
                    k,
                )
                .await?
            }
            _ => Vec::new(),
        };

        tracing::debug!(
            "Query {:?} via {label}: {} results",
            normalized,
            results.len()
        );

        Ok(SearchResponse {
            query: raw_query.to_string(),
            model: label,
            results,
        })
    }

    /// Nested view of the files walked for the live session.
    pub fn file_tree(&self) -> Vec<TreeNode> {
        build_file_tree(&self.session.snapshot().files)
    }

    /// Replace `previous` with a fresh checkout of `repo` and walk it.
    ///
    /// The rebuild permit travels with the blocking task. If the clone times
    /// out, the permit is only released once that task has finished and its
    /// checkout has been removed.
    async fn fetch(
        &self,
        repo: &RepoId,
        previous: Option<Checkout>,
        permit: OwnedSemaphorePermit,
    ) -> EngineResult<(Checkout, FileSet, OwnedSemaphorePermit)> {
        let attempt = self.clone_attempts.fetch_add(1, Ordering::Relaxed);
        let target = self
            .config
            .repos_dir()
            .join(format!("{}-{attempt}", repo.dir_name()));
        let source = self.source.clone();
        let chunking = self.config.chunking.clone();
        let repo_owned = repo.clone();
        let timeout = Duration::from_secs(self.config.clone_timeout_secs);

        let task = tokio::task::spawn_blocking(move || {
            drop(previous);
            let result = clone_and_walk(source.as_ref(), &repo_owned, &target, &chunking);
            // Dropped in order: a stray checkout goes before the permit.
            (result, permit)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok((result, permit))) => result.map(|(checkout, files)| (checkout, files, permit)),
            Ok(Err(e)) => Err(EngineError::Internal(anyhow::anyhow!(
                "Clone task failed: {e}"
            ))),
            Err(_) => Err(EngineError::SourceUnavailable(format!(
                "{repo}: clone timed out after {}s",
                self.config.clone_timeout_secs
            ))),
        }
    }
}

fn clone_and_walk(
    source: &dyn SourceControl,
    repo: &RepoId,
    target: &Path,
    chunking: &ChunkingConfig,
) -> EngineResult<(Checkout, FileSet)> {
    if !remove_dir_best_effort(target) {
        return Err(EngineError::Internal(anyhow::anyhow!(
            "Stale checkout at {} could not be removed",
            target.display()
        )));
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
    }

    // Removes whatever the clone left behind if it fails.
    let checkout = Checkout::new(target.to_path_buf());
    source
        .clone_repo(repo, target)
        .map_err(|e| EngineError::SourceUnavailable(format!("{repo}: {e:#}")))?;

    let files = walk_repo_files(checkout.path(), chunking);
    tracing::info!("Found {} indexable files in {repo}", files.files.len());
    Ok((checkout, files))
}

/// Extract and index `files` into a new, unpublished session.
async fn build_session(
    repo: RepoId,
    files: FileSet,
    config: &Config,
    modalities: &[VectorModality],
) -> EngineResult<Session> {
    let chunking = config.chunking.clone();
    let (units, files) = tokio::task::spawn_blocking(move || {
        let units = chunking::extract(&files, &chunking);
        (units, files.files)
    })
    .await
    .map_err(|e| EngineError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))?;

    tracing::info!("Extracted {} units from {repo}", units.len());
    let index = build_index_set(&units, modalities).await?;

    Ok(Session {
        repository: Some(repo),
        units,
        index: Some(index),
        files,
        indexed_at: Some(Utc::now()),
    })
}

fn outcome(status: IngestStatus, session: &Session) -> IngestOutcome {
    IngestOutcome {
        status,
        repository: session
            .repository
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_default(),
        count: session.units.len(),
        indexed_at: session.indexed_at,
    }
}
