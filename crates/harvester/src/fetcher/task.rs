//! Per-repository processing.
//!
//! Each task walks one state machine: restore from the archive when there
//! is one, clone or fast-forward the working tree, re-archive, release
//! the backend. The work is blocking (libgit2, tar, filesystem) and runs
//! on the blocking thread pool; recoverable errors are collected in the
//! report and fed to the throttle by the calling worker.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::repo::{self, RepoError, WorkingCopy};
use crate::store::RepoTask;

/// Fetch-time options derived from the daemon configuration.
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Package working trees into `<path>.tar` after each successful
    /// fetch.
    pub tar_repos: bool,
    /// Scratch directory for extraction and re-archival; `None` means the
    /// system default.
    pub tmp_dir: Option<PathBuf>,
    /// Archive size, in gigabytes, above which the scratch directory is
    /// bypassed.
    pub tmp_dir_file_size_limit: f64,
}

/// Errors a fetch task can encounter.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("cannot create scratch directory: {0}")]
    Scratch(std::io::Error),

    #[error("cannot remove working tree {path}: {source}")]
    RemoveTree {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("working tree path has no basename: {0}")]
    BadPath(PathBuf),
}

impl FetchError {
    /// Whether the update-failure policy forbids deleting the working
    /// tree: transport failures and storage exhaustion are skipped
    /// without destructive action.
    pub fn forbids_reclone(&self) -> bool {
        matches!(
            self,
            FetchError::Repo(RepoError::Network) | FetchError::Repo(RepoError::NoSpace)
        )
    }
}

/// What happened while processing one task.
#[derive(Debug, Default)]
pub struct TaskReport {
    /// True only when every step, archival and cleanup included,
    /// completed without error. Gates the progress-id emission.
    pub succeeded: bool,
    /// Every recoverable error encountered, in order, for the throttle.
    pub recorded: Vec<FetchError>,
}

/// Process one repository task. Blocking.
pub fn process(task: &RepoTask, opts: &TaskOptions) -> TaskReport {
    let mut report = TaskReport::default();
    let mut copy = repo::new_working_copy(task.vcs, task.abs_path.clone(), task.clone_url.clone());

    let ran = run(task, opts, copy.as_mut(), &mut report.recorded);

    // The backend handle is released once per task, success or not.
    let mut succeeded = ran.is_some();
    if let Err(err) = copy.cleanup() {
        tracing::warn!(path = %task.abs_path.display(), error = %err, "backend cleanup failed");
        report.recorded.push(err.into());
        succeeded = false;
    }

    report.succeeded = succeeded;
    report
}

/// The task body. Returns `None` on failure; every failure has already
/// been recorded or logged by the time it returns.
fn run(
    task: &RepoTask,
    opts: &TaskOptions,
    copy: &mut dyn WorkingCopy,
    recorded: &mut Vec<FetchError>,
) -> Option<()> {
    let archive_file = archive::archive_path(&task.abs_path);

    let scratch = if opts.tar_repos {
        let created = match &opts.tmp_dir {
            Some(dir) => tempfile::Builder::new().prefix("repo-").tempdir_in(dir),
            None => tempfile::Builder::new().prefix("repo-").tempdir(),
        };
        match created {
            Ok(dir) => Some(dir),
            Err(err) => {
                tracing::error!(error = %err, "cannot create scratch directory");
                recorded.push(FetchError::Scratch(err));
                return None;
            }
        }
    } else {
        None
    };

    let scratch_dest = match (&scratch, task.abs_path.file_name()) {
        (Some(scratch), Some(base)) => Some(scratch.path().join(base)),
        (Some(_), None) => {
            recorded.push(FetchError::BadPath(task.abs_path.clone()));
            return None;
        }
        (None, _) => None,
    };

    // Restore the working tree from its archive. A broken archive is not
    // fatal: remove the debris and fall through to a fresh clone.
    if opts.tar_repos {
        if let Ok(meta) = fs::metadata(&archive_file) {
            let fits_scratch = scratch_dest.is_some()
                && bytes_to_gigabytes(meta.len()) < opts.tmp_dir_file_size_limit;

            if fits_scratch {
                let scratch_root = scratch.as_ref().expect("scratch exists with dest").path();
                if let Err(err) = archive::extract(scratch_root, &archive_file) {
                    tracing::warn!(
                        archive = %archive_file.display(),
                        error = %err,
                        "cannot extract archive, working tree will be re-cloned"
                    );
                    let _ = fs::remove_file(&archive_file);
                    if let Some(dest) = &scratch_dest {
                        let _ = fs::remove_dir_all(dest);
                    }
                }
            } else if let Err(err) = archive::extract_in_place(&archive_file) {
                tracing::warn!(
                    archive = %archive_file.display(),
                    error = %err,
                    "cannot extract archive, working tree will be re-cloned"
                );
                let _ = fs::remove_file(&archive_file);
                let _ = fs::remove_dir_all(&task.abs_path);
            }
        }
    }

    // Work on the scratch copy when the extraction produced one, on the
    // canonical path otherwise.
    let use_scratch = scratch_dest
        .as_deref()
        .is_some_and(dir_present_and_nonempty);
    let effective: PathBuf = if use_scratch {
        scratch_dest.clone().expect("checked above")
    } else {
        task.abs_path.clone()
    };
    copy.set_abs_path(effective.clone());

    if !dir_present_and_nonempty(&effective) {
        clone_into(task, copy, recorded)?;
    } else {
        update_or_reclone(task, copy, &effective, recorded)?;
    }

    // Restore the canonical path before archival bookkeeping.
    copy.set_abs_path(task.abs_path.clone());

    if opts.tar_repos {
        let archived = if use_scratch {
            let parents = match task.abs_path.parent() {
                Some(parent) => fs::create_dir_all(parent).map_err(ArchiveError::from),
                None => Ok(()),
            };
            parents.and_then(|()| archive::create(&archive_file, &effective))
        } else {
            archive::create_in_place(&task.abs_path)
        };

        if let Err(err) = archived {
            tracing::error!(
                archive = %archive_file.display(),
                error = %err,
                "cannot create archive"
            );
            recorded.push(err.into());
            return None;
        }
    }

    if let Some(scratch) = scratch {
        let path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            tracing::warn!(path = %path.display(), error = %err, "cannot remove scratch directory");
            recorded.push(FetchError::Scratch(err));
            return None;
        }
    }

    Some(())
}

fn clone_into(
    task: &RepoTask,
    copy: &mut dyn WorkingCopy,
    recorded: &mut Vec<FetchError>,
) -> Option<()> {
    tracing::info!(
        url = %task.clone_url,
        path = %copy.abs_path().display(),
        "cloning repository"
    );

    if let Err(err) = copy.clone_repo() {
        tracing::error!(
            url = %task.clone_url,
            path = %copy.abs_path().display(),
            error = %err,
            "cannot clone repository, skipping"
        );
        recorded.push(err.into());
        return None;
    }

    Some(())
}

/// Update the working tree; on failure, delete it and re-clone unless the
/// error class forbids destructive action.
fn update_or_reclone(
    task: &RepoTask,
    copy: &mut dyn WorkingCopy,
    effective: &Path,
    recorded: &mut Vec<FetchError>,
) -> Option<()> {
    tracing::info!(path = %effective.display(), "updating repository");

    let err = match copy.update() {
        Ok(()) => return Some(()),
        Err(err) => FetchError::from(err),
    };

    tracing::warn!(path = %effective.display(), error = %err, "cannot update repository");
    let forbids_reclone = err.forbids_reclone();
    recorded.push(err);

    if forbids_reclone {
        return None;
    }

    tracing::info!(path = %effective.display(), "attempting to re-clone");
    if let Err(source) = fs::remove_dir_all(effective) {
        tracing::error!(path = %effective.display(), error = %source, "cannot remove working tree");
        recorded.push(FetchError::RemoveTree {
            path: effective.to_path_buf(),
            source,
        });
        return None;
    }

    clone_into(task, copy, recorded)
}

fn bytes_to_gigabytes(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000_000.0
}

fn dir_present_and_nonempty(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::repo::VcsKind;

    use super::*;

    fn task_for(dir: &Path, url: &str) -> RepoTask {
        RepoTask {
            id: 1,
            vcs: VcsKind::Git,
            abs_path: dir.to_path_buf(),
            clone_url: url.to_string(),
        }
    }

    fn options(tar_repos: bool, tmp_dir: Option<PathBuf>) -> TaskOptions {
        TaskOptions {
            tar_repos,
            tmp_dir,
            tmp_dir_file_size_limit: 0.1,
        }
    }

    fn source_repo(dir: &Path) -> git2::Repository {
        let repo = git2::Repository::init(dir).expect("init");
        let workdir = repo.workdir().expect("workdir");
        std::fs::write(workdir.join("README.md"), "hello").expect("write");

        let mut index = repo.index().expect("index");
        index.add_path(Path::new("README.md")).expect("add");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");

        let sig = git2::Signature::now("harvest", "harvest@example.com").expect("sig");
        {
            let tree = repo.find_tree(tree_id).expect("tree");
            repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
                .expect("commit");
        }
        repo
    }

    #[test]
    fn fresh_task_clones_the_working_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        source_repo(&src);

        let dst = tmp.path().join("clones/rust/octocat/hello");
        let task = task_for(&dst, &src.display().to_string());

        let report = process(&task, &options(false, None));
        assert!(report.succeeded, "recorded: {:?}", report.recorded);
        assert!(report.recorded.is_empty());
        assert!(dst.join("README.md").exists());
    }

    #[test]
    fn tarred_task_leaves_archive_instead_of_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        source_repo(&src);

        let dst = tmp.path().join("clones/rust/octocat/hello");
        let task = task_for(&dst, &src.display().to_string());
        let opts = options(true, Some(tmp.path().to_path_buf()));

        let report = process(&task, &opts);
        assert!(report.succeeded, "recorded: {:?}", report.recorded);
        assert!(archive::archive_path(&dst).exists());
        assert!(!dst.exists());

        // Second cycle: restore from the archive, update, re-archive.
        let report = process(&task, &opts);
        assert!(report.succeeded, "recorded: {:?}", report.recorded);
        assert!(archive::archive_path(&dst).exists());
        assert!(!dst.exists());
    }

    #[test]
    fn failed_clone_is_recorded_and_fails_the_task() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dst = tmp.path().join("clones/rust/octocat/missing");
        let task = task_for(&dst, "/nonexistent/source/repo");

        let report = process(&task, &options(false, None));
        assert!(!report.succeeded);
        assert_eq!(report.recorded.len(), 1);
    }

    #[test]
    fn broken_tree_is_recloned_on_update_failure() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        source_repo(&src);

        // A non-empty directory that is not a git repository: update
        // fails, the tree is deleted and re-cloned.
        let dst = tmp.path().join("clones/rust/octocat/hello");
        std::fs::create_dir_all(&dst).expect("mkdir");
        std::fs::write(dst.join("debris.txt"), "junk").expect("write");

        let task = task_for(&dst, &src.display().to_string());
        let report = process(&task, &options(false, None));

        assert!(report.succeeded, "recorded: {:?}", report.recorded);
        // The update failure was still recorded for the throttle.
        assert!(!report.recorded.is_empty());
        assert!(dst.join("README.md").exists());
        assert!(!dst.join("debris.txt").exists());
    }
}
