//! File system utilities for bundling and configuration persistence.
//!
//! Provides file operations with automatic directory creation and atomic
//! replacement of files.

use crate::bail;
use crate::bundler::error::{ErrorExt, Result};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .await
            .fs_context("removing directory", path)
    } else {
        Ok(())
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{from:?} does not exist");
    }
    if !from.is_file() {
        bail!("{from:?} is not a file");
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file to", to)?;
    Ok(())
}

/// Marks a file as executable (`0o755`).
#[cfg(unix)]
pub async fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .fs_context("setting executable permissions on", path)
}

/// Marks a file as executable (no-op off unix).
#[cfg(not(unix))]
pub async fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Appends `suffix` to the file name of `path` (`Bundle.toml` -> `Bundle.toml.bak`).
pub fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Replaces the contents of `path` atomically.
///
/// Writes to `<path>.tmp`, syncs it, then renames it over `path`. If any
/// step fails the existing file at `path` is left untouched and the
/// temporary file is removed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp_path = path_with_suffix(path, ".tmp");

    let written = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, path).await
    }
    .await;

    if written.is_err() && temp_path.is_file() {
        let _ = fs::remove_file(&temp_path).await;
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with_suffix() {
        assert_eq!(
            path_with_suffix(Path::new("/pkg/Bundle.toml"), ".bak"),
            PathBuf::from("/pkg/Bundle.toml.bak")
        );
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        tokio::fs::write(&path, "old").await.unwrap();

        write_atomic(&path, b"new").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "new");
        assert!(!dir.path().join("file.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_atomic_failure_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        tokio::fs::write(&path, "old").await.unwrap();
        // A directory where the temp file should go makes the write fail
        tokio::fs::create_dir(dir.path().join("file.txt.tmp")).await.unwrap();

        assert!(write_atomic(&path, b"new").await.is_err());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "old");
    }
}
