//! VCS error classification.

use thiserror::Error;

/// Errors produced by [`super::WorkingCopy`] operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Any kind of connectivity problem. The fetcher skips the task
    /// without touching the working tree.
    #[error("network unreachable")]
    Network,

    /// Storage exhaustion. Treated like [`RepoError::Network`] on the
    /// update path.
    #[error("no space left on device")]
    NoSpace,

    /// HEAD does not point at a branch, so there is nothing to
    /// fast-forward.
    #[error("repository reference is not a branch (likely a detached HEAD)")]
    DetachedHead,

    #[error("unsupported vcs repository type: {0}")]
    UnsupportedVcs(String),

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Map a libgit2 error to the fetcher-relevant classes.
///
/// libgit2 has no dedicated ENOSPC class, so storage exhaustion is
/// detected from the message.
pub(crate) fn classify_git_error(err: git2::Error) -> RepoError {
    if err.class() == git2::ErrorClass::Net {
        return RepoError::Network;
    }

    if err.message().to_ascii_lowercase().contains("no space left") {
        return RepoError::NoSpace;
    }

    RepoError::Git(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_class_maps_to_network() {
        let err = git2::Error::new(
            git2::ErrorCode::GenericError,
            git2::ErrorClass::Net,
            "could not resolve host",
        );
        assert!(matches!(classify_git_error(err), RepoError::Network));
    }

    #[test]
    fn enospc_message_maps_to_no_space() {
        let err = git2::Error::new(
            git2::ErrorCode::GenericError,
            git2::ErrorClass::Os,
            "write failed: No space left on device",
        );
        assert!(matches!(classify_git_error(err), RepoError::NoSpace));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = git2::Error::new(
            git2::ErrorCode::NotFound,
            git2::ErrorClass::Repository,
            "not found",
        );
        assert!(matches!(classify_git_error(err), RepoError::Git(_)));
    }
}
