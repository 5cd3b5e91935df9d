use crate::paths::CulpritPaths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};

/// Exclusive per-repository lease, held through `.culprit/LOCK`.
///
/// One guard covers everything a second culprit process could corrupt:
/// the JSON stores under `.culprit/` and any operation that moves HEAD
/// (bisection, single-commit checks, branch create and cleanup).
/// Dropping the guard releases the lease.
#[derive(Debug)]
pub struct RepoLock {
    _guard: File,
}

impl RepoLock {
    /// Non-blocking acquire. Contention is an immediate error, not a wait.
    pub fn acquire(paths: &CulpritPaths) -> anyhow::Result<Self> {
        let guard = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| {
                anyhow::anyhow!("lock file {} is unusable: {e}", paths.lock_file.display())
            })?;

        if guard.try_lock_exclusive().is_err() {
            anyhow::bail!(
                "another culprit process is active in this repository (lease at {})",
                paths.lock_file.display()
            );
        }
        Ok(Self { _guard: guard })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> (tempfile::TempDir, CulpritPaths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = CulpritPaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        (tmp, paths)
    }

    #[test]
    fn contention_names_the_lease() {
        let (_tmp, paths) = layout();
        let held = RepoLock::acquire(&paths).unwrap();
        let err = RepoLock::acquire(&paths).unwrap_err();
        assert!(err.to_string().contains("another culprit process"));
        drop(held);
    }

    #[test]
    fn lease_is_reusable_after_release() {
        let (_tmp, paths) = layout();
        for _ in 0..3 {
            let _lease = RepoLock::acquire(&paths).unwrap();
        }
    }
}
