//! Git working copies backed by libgit2.

use std::path::{Path, PathBuf};

use git2::Repository;
use git2::build::CheckoutBuilder;

use super::error::classify_git_error;
use super::{RepoError, Result, WorkingCopy};

/// A git working tree.
pub struct GitWorkingCopy {
    abs_path: PathBuf,
    url: String,
    repo: Option<Repository>,
}

impl GitWorkingCopy {
    /// Create a handle for the working tree at `abs_path`.
    ///
    /// Opening an existing repository is attempted eagerly but failure is
    /// ignored; the repository may simply not have been cloned yet.
    pub fn new(abs_path: PathBuf, url: String) -> Self {
        let repo = Repository::open(&abs_path).ok();
        Self {
            abs_path,
            url,
            repo,
        }
    }
}

impl WorkingCopy for GitWorkingCopy {
    fn clone_repo(&mut self) -> Result<()> {
        let repo = Repository::clone(&self.url, &self.abs_path).map_err(classify_git_error)?;
        self.repo = Some(repo);
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        // The tree may have moved (scratch copies), so always reopen at
        // the current path.
        let repo = Repository::open(&self.abs_path).map_err(classify_git_error)?;

        {
            let mut origin = repo.find_remote("origin").map_err(classify_git_error)?;
            origin
                .fetch(&[] as &[&str], None, None)
                .map_err(classify_git_error)?;
        }

        {
            let head = repo.head().map_err(classify_git_error)?;
            if !head.is_branch() {
                return Err(RepoError::DetachedHead);
            }

            let branch = git2::Branch::wrap(head);
            let upstream = branch.upstream().map_err(classify_git_error)?;
            let target = upstream.get().target().ok_or_else(|| {
                RepoError::Git(git2::Error::from_str("upstream reference has no target"))
            })?;

            let mut local = branch.into_reference();
            local
                .set_target(target, "pull: Fast-forward")
                .map_err(classify_git_error)?;
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        repo.checkout_head(Some(&mut checkout))
            .map_err(|_| RepoError::Git(git2::Error::from_str("failed to checkout new HEAD")))?;

        self.repo = Some(repo);
        Ok(())
    }

    fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    fn set_abs_path(&mut self, path: PathBuf) {
        self.abs_path = path;
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn cleanup(&mut self) -> Result<()> {
        // Dropping the libgit2 handle releases mmapped packfiles and
        // descriptors.
        self.repo = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use git2::Signature;

    use super::*;

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
        let workdir = repo.workdir().expect("workdir");
        std::fs::write(workdir.join(name), content).expect("write file");

        let mut index = repo.index().expect("index");
        index.add_path(Path::new(name)).expect("add path");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = repo.find_tree(tree_id).expect("find tree");

        let sig = Signature::now("harvest", "harvest@example.com").expect("signature");
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("commit");
    }

    fn source_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).expect("init");
        commit_file(&repo, "README.md", "hello", "initial commit");
        repo
    }

    #[test]
    fn clone_then_update_fast_forwards() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        let src = source_repo(&src_dir);

        let mut copy = GitWorkingCopy::new(dst_dir.clone(), src_dir.display().to_string());
        copy.clone_repo().expect("clone");
        assert!(dst_dir.join("README.md").exists());

        // Advance the origin and fast-forward the clone onto it.
        commit_file(&src, "CHANGES.md", "v2", "second commit");
        copy.update().expect("update");
        assert!(dst_dir.join("CHANGES.md").exists());

        copy.cleanup().expect("cleanup");
    }

    #[test]
    fn update_rejects_detached_head() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        source_repo(&src_dir);

        let mut copy = GitWorkingCopy::new(dst_dir.clone(), src_dir.display().to_string());
        copy.clone_repo().expect("clone");

        // Detach HEAD at the current commit.
        let cloned = Repository::open(&dst_dir).expect("open clone");
        let oid = cloned
            .head()
            .expect("head")
            .target()
            .expect("head target");
        cloned.set_head_detached(oid).expect("detach");

        assert!(matches!(copy.update(), Err(RepoError::DetachedHead)));
    }

    #[test]
    fn clone_into_occupied_directory_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        source_repo(&src_dir);

        std::fs::create_dir_all(&dst_dir).expect("mkdir");
        std::fs::write(dst_dir.join("occupied"), "x").expect("write");

        let mut copy = GitWorkingCopy::new(dst_dir, src_dir.display().to_string());
        assert!(copy.clone_repo().is_err());
    }
}
