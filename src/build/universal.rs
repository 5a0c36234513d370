//! Universal (fat) binary creation with Apple's `lipo` tool.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Merges per-architecture builds of one executable into `output`.
///
/// # Errors
/// - If any input binary is missing
/// - If lipo is not installed or rejects the inputs
/// - If the output directory cannot be created
pub async fn create_universal_binary(inputs: &[PathBuf], output: &Path) -> Result<()> {
    for input in inputs {
        if !input.is_file() {
            bail!("Binary not found for universal merge: {}", input.display());
        }
    }

    if let Some(output_dir) = output.parent() {
        tokio::fs::create_dir_all(output_dir).await.with_context(|| {
            format!(
                "Failed to create universal binary output directory: {}",
                output_dir.display()
            )
        })?;
    }

    log::info!(
        "Creating universal binary {} from {} architectures",
        output.display(),
        inputs.len()
    );

    // lipo -create <inputs...> -output <universal>
    let result = Command::new("lipo")
        .arg("-create")
        .args(inputs)
        .arg("-output")
        .arg(output)
        .kill_on_drop(true)
        .output()
        .await
        .context("Failed to run lipo command. Ensure Xcode Command Line Tools are installed.")?;

    if !result.status.success() {
        bail!(
            "lipo failed for {}:\n{}",
            output.display(),
            String::from_utf8_lossy(&result.stderr)
        );
    }

    let verify = Command::new("lipo")
        .arg("-info")
        .arg(output)
        .kill_on_drop(true)
        .output()
        .await?;
    log::info!("✓ {}", String::from_utf8_lossy(&verify.stdout).trim());

    Ok(())
}
