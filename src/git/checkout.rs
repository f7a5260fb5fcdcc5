//! Scoped ownership of a local checkout directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Owns a checkout directory; dropping the guard deletes it.
#[derive(Debug)]
pub struct Checkout {
    path: PathBuf,
}

impl Checkout {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        remove_dir_best_effort(&self.path);
    }
}

/// Recursively delete `path`. Read-only entries left by a checkout are made
/// writable and the delete retried once. Returns whether the path is gone.
pub fn remove_dir_best_effort(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }

    match std::fs::remove_dir_all(path) {
        Ok(()) => return true,
        Err(e) => {
            tracing::debug!("First delete of {} failed ({e}), clearing read-only flags", path.display());
        }
    }

    make_writable(path);
    match std::fs::remove_dir_all(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to delete checkout {}: {e}", path.display());
            false
        }
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) {
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        let mut perms = meta.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            let _ = std::fs::set_permissions(entry.path(), perms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("owner__repo");
        std::fs::create_dir_all(target.join("src")).unwrap();
        std::fs::write(target.join("src/main.py"), "print(1)").unwrap();

        {
            let checkout = Checkout::new(target.clone());
            assert_eq!(checkout.path(), target.as_path());
        }
        assert!(!target.exists());
    }

    #[test]
    fn test_removes_read_only_entries() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("locked");
        std::fs::create_dir_all(target.join("objects")).unwrap();
        let file = target.join("objects/pack");
        std::fs::write(&file, "data").unwrap();

        let mut perms = std::fs::metadata(&file).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&file, perms).unwrap();
        let mut dir_perms = std::fs::metadata(target.join("objects")).unwrap().permissions();
        dir_perms.set_readonly(true);
        std::fs::set_permissions(target.join("objects"), dir_perms).unwrap();

        assert!(remove_dir_best_effort(&target));
        assert!(!target.exists());
    }

    #[test]
    fn test_missing_path_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_dir_best_effort(&dir.path().join("never-created")));
    }
}
