//! Tar archiving of working trees.
//!
//! Archives are plain POSIX tar files named after the tree they contain
//! (`<path>.tar`), with every entry prefixed by the tree's basename so an
//! archive extracts to a single directory. Symlinks whose resolved target
//! stays inside the tree are stored as relative links; targets outside the
//! tree are stored verbatim. Pipes, sockets and device files are skipped.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Errors produced by archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("given path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("given path is a directory: {0}")]
    IsADirectory(PathBuf),

    #[error("path has no basename: {0}")]
    NoBasename(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// The archive path that corresponds to a working tree: `<path>.tar`.
pub fn archive_path(dir: &Path) -> PathBuf {
    let mut name = dir.as_os_str().to_owned();
    name.push(".tar");
    PathBuf::from(name)
}

/// Create a tar archive of `dir` at `dest`.
pub fn create(dest: &Path, dir: &Path) -> Result<()> {
    let meta = fs::metadata(dir)?;
    if !meta.is_dir() {
        return Err(ArchiveError::NotADirectory(dir.to_path_buf()));
    }

    let base = dir
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| ArchiveError::NoBasename(dir.to_path_buf()))?;
    let root = fs::canonicalize(dir)?;

    let file = File::create(dest)?;
    let mut builder = tar::Builder::new(file);
    builder.follow_symlinks(false);

    builder.append_dir(&base, dir)?;
    append_tree(&mut builder, &root, dir, &base)?;

    builder.into_inner()?.sync_all()?;
    Ok(())
}

/// Create `<dir>.tar` next to `dir`, then remove the original tree.
pub fn create_in_place(dir: &Path) -> Result<()> {
    create(&archive_path(dir), dir)?;
    fs::remove_dir_all(dir)?;
    Ok(())
}

/// Extract a tar archive into `dest`, creating it if needed.
pub fn extract(dest: &Path, archive: &Path) -> Result<()> {
    let meta = fs::metadata(archive)?;
    if meta.is_dir() {
        return Err(ArchiveError::IsADirectory(archive.to_path_buf()));
    }

    fs::create_dir_all(dest)?;

    let file = File::open(archive)?;
    let mut reader = tar::Archive::new(file);
    reader.unpack(dest)?;
    Ok(())
}

/// Extract an archive next to itself, then remove the archive. Only the
/// extracted content remains.
pub fn extract_in_place(archive: &Path) -> Result<()> {
    let dest = archive
        .parent()
        .ok_or_else(|| ArchiveError::NoBasename(archive.to_path_buf()))?;
    extract(dest, archive)?;
    fs::remove_file(archive)?;
    Ok(())
}

/// Recursively append the contents of `dir` under the entry prefix
/// `prefix`. `root` is the canonicalized top of the tree, used to decide
/// whether symlink targets stay inside it.
fn append_tree(
    builder: &mut tar::Builder<File>,
    root: &Path,
    dir: &Path,
    prefix: &Path,
) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = prefix.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            builder.append_dir(&name, &path)?;
            append_tree(builder, root, &path, &name)?;
        } else if file_type.is_symlink() {
            append_symlink(builder, root, &path, &name)?;
        } else if is_special_file(&file_type) {
            continue;
        } else {
            let mut file = File::open(&path)?;
            builder.append_file(&name, &mut file)?;
        }
    }

    Ok(())
}

fn append_symlink(
    builder: &mut tar::Builder<File>,
    root: &Path,
    path: &Path,
    name: &Path,
) -> Result<()> {
    let raw_target = fs::read_link(path)?;

    // When the link resolves inside the tree, store it relative to the
    // link's own directory so the extracted tree is self-contained.
    let stored = match fs::canonicalize(path) {
        Ok(resolved) if resolved.starts_with(root) => {
            let link_dir = path.parent().map(fs::canonicalize).transpose()?;
            match link_dir {
                Some(link_dir) => relative_path(&link_dir, &resolved),
                None => raw_target,
            }
        }
        _ => raw_target,
    };

    let metadata = fs::symlink_metadata(path)?;
    let mut header = tar::Header::new_gnu();
    header.set_metadata(&metadata);
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    builder.append_link(&mut header, name, &stored)?;
    Ok(())
}

#[cfg(unix)]
fn is_special_file(file_type: &fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_fifo()
        || file_type.is_socket()
        || file_type.is_block_device()
        || file_type.is_char_device()
}

#[cfg(not(unix))]
fn is_special_file(_file_type: &fs::FileType) -> bool {
    false
}

/// Compute the relative path from directory `from` to `to`. Both paths
/// must be absolute and normalized.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};

    use super::*;

    fn checksum(path: &Path) -> Vec<u8> {
        let bytes = fs::read(path).expect("read file");
        Sha256::digest(&bytes).to_vec()
    }

    /// Build a tree with a regular file, a nested directory and an
    /// inside-tree symlink.
    fn sample_tree(parent: &Path) -> PathBuf {
        let tree = parent.join("project");
        fs::create_dir_all(tree.join("docs")).expect("mkdir");
        fs::write(tree.join("main.rs"), "fn main() {}\n").expect("write");
        fs::write(tree.join("docs/guide.md"), "# guide\n").expect("write");
        #[cfg(unix)]
        std::os::unix::fs::symlink("../main.rs", tree.join("docs/entry.rs")).expect("symlink");
        tree
    }

    #[test]
    fn archive_path_appends_tar() {
        assert_eq!(
            archive_path(Path::new("/data/go/octo/repo")),
            PathBuf::from("/data/go/octo/repo.tar")
        );
    }

    #[test]
    fn round_trip_preserves_content_and_links() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tree = sample_tree(tmp.path());

        let main_sum = checksum(&tree.join("main.rs"));
        let guide_sum = checksum(&tree.join("docs/guide.md"));

        let tarball = tmp.path().join("project.tar");
        create(&tarball, &tree).expect("create");

        let restored_root = tmp.path().join("restored");
        extract(&restored_root, &tarball).expect("extract");
        let restored = restored_root.join("project");

        assert_eq!(checksum(&restored.join("main.rs")), main_sum);
        assert_eq!(checksum(&restored.join("docs/guide.md")), guide_sum);

        #[cfg(unix)]
        {
            let link = restored.join("docs/entry.rs");
            let target = fs::read_link(&link).expect("read link");
            assert_eq!(target, PathBuf::from("../main.rs"));
            assert_eq!(checksum(&link), main_sum);
        }
    }

    #[cfg(unix)]
    #[test]
    fn outside_tree_symlink_is_stored_verbatim() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let outside = tmp.path().join("outside.txt");
        fs::write(&outside, "external").expect("write");

        let tree = tmp.path().join("project");
        fs::create_dir_all(&tree).expect("mkdir");
        std::os::unix::fs::symlink(&outside, tree.join("external")).expect("symlink");

        let tarball = tmp.path().join("project.tar");
        create(&tarball, &tree).expect("create");

        let restored_root = tmp.path().join("restored");
        extract(&restored_root, &tarball).expect("extract");

        let target = fs::read_link(restored_root.join("project/external")).expect("read link");
        assert_eq!(target, outside);
    }

    #[test]
    fn in_place_variants_remove_their_source() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let tree = sample_tree(tmp.path());
        let tarball = archive_path(&tree);

        create_in_place(&tree).expect("create in place");
        assert!(tarball.exists());
        assert!(!tree.exists());

        extract_in_place(&tarball).expect("extract in place");
        assert!(!tarball.exists());
        assert!(tree.join("main.rs").exists());
    }

    #[test]
    fn create_rejects_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let file = tmp.path().join("plain.txt");
        fs::write(&file, "not a dir").expect("write");

        let dest = tmp.path().join("out.tar");
        assert!(matches!(
            create(&dest, &file),
            Err(ArchiveError::NotADirectory(_))
        ));
    }

    #[test]
    fn extract_rejects_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("dir");
        fs::create_dir_all(&dir).expect("mkdir");

        assert!(matches!(
            extract(tmp.path(), &dir),
            Err(ArchiveError::IsADirectory(_))
        ));
    }
}
