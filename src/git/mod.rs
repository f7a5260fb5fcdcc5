//! Repository identifiers, checkouts and file walking.

pub mod checkout;
pub mod clone;
pub mod tree;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ChunkingConfig;
use crate::error::EngineError;

pub use checkout::Checkout;
pub use clone::{GitCloner, SourceControl};

/// A repository identifier: host, owner and name.
#[derive(Debug, Clone)]
pub struct RepoId {
    /// Lowercased host, taken from the identifier or the default base URL.
    pub host: String,
    pub owner: String,
    pub name: String,
    /// Explicit clone URL when the identifier was given as one.
    url: Option<String>,
}

impl RepoId {
    /// Parse `owner/name`, `https://host/owner/name(.git)` or
    /// `git@host:owner/name.git`. A bare `owner/name` lives on the host of
    /// `base_url`.
    pub fn parse(raw: &str, base_url: &str) -> Result<Self, EngineError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidRepository(
                "repository identifier is required".to_string(),
            ));
        }

        let url = (trimmed.contains("://") || trimmed.starts_with("git@"))
            .then(|| trimmed.to_string());

        let (host, path) = match split_remote(trimmed) {
            Some((host, path)) => (host, path),
            None => (
                split_remote(base_url)
                    .map(|(host, _)| host)
                    .unwrap_or_else(|| base_url.trim_end_matches('/')),
                trimmed,
            ),
        };

        let parts: Vec<&str> = path
            .trim_end_matches('/')
            .split('/')
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            return Err(EngineError::InvalidRepository(format!(
                "expected owner/name, got '{trimmed}'"
            )));
        }

        let owner = parts[parts.len() - 2].to_string();
        let name = parts[parts.len() - 1].trim_end_matches(".git").to_string();
        if name.is_empty() {
            return Err(EngineError::InvalidRepository(format!(
                "missing repository name in '{trimmed}'"
            )));
        }

        Ok(Self {
            host: host.to_lowercase(),
            owner,
            name,
            url,
        })
    }

    /// Case-insensitive identity used for cache hits.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.host, self.owner, self.name).to_lowercase()
    }

    pub fn clone_url(&self, base_url: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}/{}.git",
                base_url.trim_end_matches('/'),
                self.owner,
                self.name
            ),
        }
    }

    /// Directory name for the local checkout.
    pub fn dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.name)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// `(host, path)` of a scheme URL or scp-style `git@host:path` remote.
fn split_remote(raw: &str) -> Option<(&str, &str)> {
    let (authority, path) = match raw.split_once("://") {
        Some((_, rest)) => rest.split_once('/').unwrap_or((rest, "")),
        None => raw.strip_prefix("git@")?.split_once(':')?,
    };
    let host = authority.rsplit('@').next().unwrap_or(authority);
    Some((host, path))
}

impl PartialEq for RepoId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RepoId {}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The files of a local checkout eligible for extraction, in walk order.
#[derive(Debug, Clone)]
pub struct FileSet {
    pub root: PathBuf,
    /// Relative paths with forward slashes.
    pub files: Vec<String>,
}

/// Walk a checkout in sorted order, skipping excluded directories,
/// non-indexable extensions and oversized files.
pub fn walk_repo_files(repo_dir: &Path, config: &ChunkingConfig) -> FileSet {
    let mut files = Vec::new();

    for entry in WalkDir::new(repo_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e, config))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable path during walk: {err}");
                None
            }
        })
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_indexable_file(path) {
            continue;
        }

        if let Ok(meta) = entry.metadata() {
            if meta.len() > config.max_file_bytes {
                tracing::debug!("Skipping oversized file {}", path.display());
                continue;
            }
        }

        let relative = path
            .strip_prefix(repo_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        files.push(relative);
    }

    FileSet {
        root: repo_dir.to_path_buf(),
        files,
    }
}

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec"];

fn is_excluded(entry: &walkdir::DirEntry, config: &ChunkingConfig) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    if entry.file_type().is_dir() && config.exclude_tests && TEST_DIRS.contains(&name.as_ref()) {
        return true;
    }
    matches!(
        name.as_ref(),
        "node_modules"
            | "target"
            | "dist"
            | "build"
            | "out"
            | "__pycache__"
            | "vendor"
            | "venv"
            | "env"
            | "site-packages"
    )
}

fn is_indexable_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if matches!(
        filename.as_ref(),
        "makefile" | "dockerfile" | "rakefile" | "gemfile" | "readme" | "license"
    ) {
        return true;
    }

    matches!(
        ext.as_str(),
        "py" | "rs"
            | "js"
            | "mjs"
            | "cjs"
            | "ts"
            | "tsx"
            | "jsx"
            | "go"
            | "java"
            | "c"
            | "cpp"
            | "cc"
            | "cxx"
            | "h"
            | "hh"
            | "hpp"
            | "cs"
            | "rb"
            | "php"
            | "swift"
            | "kt"
            | "kts"
            | "scala"
            | "lua"
            | "sh"
            | "bash"
            | "zsh"
            | "sql"
            | "md"
            | "rst"
            | "txt"
            | "yaml"
            | "yml"
            | "toml"
            | "proto"
            | "graphql"
            | "ex"
            | "exs"
            | "hs"
            | "ml"
            | "clj"
            | "dart"
            | "zig"
            | "nim"
            | "jl"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB: &str = "https://github.com";

    #[test]
    fn test_parse_identifier_forms() {
        let short = RepoId::parse("octo/widgets", GITHUB).unwrap();
        assert_eq!((short.owner.as_str(), short.name.as_str()), ("octo", "widgets"));
        assert_eq!(
            short.clone_url("https://github.com/"),
            "https://github.com/octo/widgets.git"
        );

        let url = RepoId::parse("https://github.com/octo/widgets.git/", GITHUB).unwrap();
        assert_eq!(url.name, "widgets");
        assert_eq!(url.clone_url("ignored"), "https://github.com/octo/widgets.git/");

        let ssh = RepoId::parse("git@github.com:octo/widgets.git", GITHUB).unwrap();
        assert_eq!(ssh.owner, "octo");
        assert_eq!(ssh, short);
    }

    #[test]
    fn test_parse_rejects_incomplete() {
        assert!(RepoId::parse("", GITHUB).is_err());
        assert!(RepoId::parse("   ", GITHUB).is_err());
        assert!(RepoId::parse("widgets", GITHUB).is_err());
        assert!(RepoId::parse("https://github.com/octo", GITHUB).is_err());
    }

    #[test]
    fn test_identity_is_case_insensitive() {
        let a = RepoId::parse("Octo/Widgets", GITHUB).unwrap();
        let b = RepoId::parse("https://github.com/octo/widgets", GITHUB).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dir_name(), "Octo__Widgets");
    }

    #[test]
    fn test_identity_includes_host() {
        let github = RepoId::parse("https://github.com/octo/shop", GITHUB).unwrap();
        let gitlab = RepoId::parse("https://gitlab.com/octo/shop", GITHUB).unwrap();
        assert_eq!(gitlab.host, "gitlab.com");
        assert_ne!(github, gitlab);

        let token = RepoId::parse("https://x-access-token@GitHub.com/octo/shop", GITHUB).unwrap();
        assert_eq!(token, github);

        let self_hosted = RepoId::parse("octo/shop", "https://git.example.org/").unwrap();
        assert_eq!(self_hosted.host, "git.example.org");
        assert_ne!(self_hosted, github);
    }

    #[test]
    fn test_walk_of_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = walk_repo_files(&dir.path().join("gone"), &ChunkingConfig::default());
        assert!(files.files.is_empty());
    }

    #[test]
    fn test_walk_skips_excluded_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("tests")).unwrap();
        std::fs::write(root.join("src/b.py"), "x").unwrap();
        std::fs::write(root.join("src/a.py"), "x").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        std::fs::write(root.join(".git/config"), "x").unwrap();
        std::fs::write(root.join("tests/test_a.py"), "x").unwrap();
        std::fs::write(root.join("logo.png"), "x").unwrap();

        let all = walk_repo_files(root, &ChunkingConfig::default());
        assert_eq!(all.files, vec!["src/a.py", "src/b.py", "tests/test_a.py"]);

        let config = ChunkingConfig {
            exclude_tests: true,
            ..ChunkingConfig::default()
        };
        let no_tests = walk_repo_files(root, &config);
        assert_eq!(no_tests.files, vec!["src/a.py", "src/b.py"]);
    }
}
