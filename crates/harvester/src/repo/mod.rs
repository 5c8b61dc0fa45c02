//! Version control backends.
//!
//! The fetcher consumes repositories through the narrow [`WorkingCopy`]
//! capability; the git implementation lives in [`git`]. Operations are
//! blocking and are expected to run on the blocking thread pool.

mod error;
pub mod git;

use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use error::RepoError;

/// Result type for VCS operations.
pub type Result<T> = std::result::Result<T, RepoError>;

/// Supported version control systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
}

impl VcsKind {
    /// The identifier stored in the `vcs` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsKind::Git => "git",
        }
    }
}

impl FromStr for VcsKind {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "git" => Ok(VcsKind::Git),
            other => Err(RepoError::UnsupportedVcs(other.to_string())),
        }
    }
}

/// A version-controlled working tree on disk.
///
/// `clone_repo` and `update` must map connectivity problems to
/// [`RepoError::Network`] and storage exhaustion to [`RepoError::NoSpace`]
/// so the fetcher can apply its non-destructive skip policy.
pub trait WorkingCopy: Send {
    /// Clone the repository into a new directory. The destination must
    /// not exist or must be empty.
    fn clone_repo(&mut self) -> Result<()>;

    /// Fetch the latest changes and fast-forward the default branch.
    fn update(&mut self) -> Result<()>;

    /// Absolute path of the working tree on disk.
    fn abs_path(&self) -> &Path;

    /// Repoint the working tree, e.g. at a scratch copy.
    fn set_abs_path(&mut self, path: PathBuf);

    /// Clone URL of the repository.
    fn url(&self) -> &str;

    /// Release any native resources held open. Called once per task,
    /// whether or not the task succeeded.
    fn cleanup(&mut self) -> Result<()>;
}

/// Create a working copy handle for the given VCS kind.
pub fn new_working_copy(vcs: VcsKind, abs_path: PathBuf, url: String) -> Box<dyn WorkingCopy> {
    match vcs {
        VcsKind::Git => Box::new(git::GitWorkingCopy::new(abs_path, url)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcs_kind_round_trips() {
        assert_eq!("git".parse::<VcsKind>().unwrap(), VcsKind::Git);
        assert_eq!(VcsKind::Git.as_str(), "git");
    }

    #[test]
    fn unknown_vcs_is_rejected() {
        assert!(matches!(
            "darcs".parse::<VcsKind>(),
            Err(RepoError::UnsupportedVcs(_))
        ));
    }
}
