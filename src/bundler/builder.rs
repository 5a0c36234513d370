//! Bundle orchestration.
//!
//! [`Bundler`] delegates layout, plist generation and signing to the
//! platform module, then checksums the finished bundle.

use crate::bundler::{BundledApp, Result, Settings, error::ErrorExt, platform::darwin};
use std::path::Path;

/// Creates `.app` bundles from [`Settings`].
#[derive(Debug, Clone)]
pub struct Bundler {
    settings: Settings,
}

impl Bundler {
    /// Creates a new bundler with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Assembles the bundle.
    ///
    /// Any existing bundle at [`Settings::bundle_path`] is replaced.
    pub async fn bundle(&self) -> Result<BundledApp> {
        let path = darwin::app::bundle_project(&self.settings).await?;
        let checksum = calculate_directory_sha256(&path).await?;
        log::debug!("Bundle checksum {checksum}");
        Ok(BundledApp { path, checksum })
    }
}

/// Calculates SHA256 checksum of a directory tree.
///
/// Hashes each file's relative path and content in sorted path order, so the
/// result only depends on the tree's contents.
pub(crate) async fn calculate_directory_sha256(dir_path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use tokio::io::AsyncReadExt;

    let mut entries = walkdir::WalkDir::new(dir_path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    entries.retain(|e| e.file_type().is_file());

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    for entry in entries {
        let rel_path = entry.path().strip_prefix(dir_path)?;
        hasher.update(rel_path.to_string_lossy().as_bytes());

        let mut file = tokio::fs::File::open(entry.path())
            .await
            .fs_context("opening file for hashing", entry.path())?;

        loop {
            let n = file
                .read(&mut buffer)
                .await
                .fs_context("reading file for hash calculation", entry.path())?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}
