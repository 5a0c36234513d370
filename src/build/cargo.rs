//! Cargo-driven build backend.

use super::{BuildBackend, BuildRequest, create_universal_binary};
use anyhow::{Context, Result, bail};
use tokio::process::Command;

/// Builds the product with `cargo build`, one invocation per architecture.
#[derive(Debug, Clone, Default)]
pub struct CargoBackend {
    /// Print cargo's output instead of capturing it.
    pub verbose: bool,
}

impl CargoBackend {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    async fn build_for_target(&self, request: &BuildRequest, target: &str) -> Result<()> {
        let mut cmd = Command::new("cargo");
        cmd.current_dir(&request.package_directory)
            .arg("build")
            .arg("--bin")
            .arg(&request.product)
            .arg("--target")
            .arg(target)
            .kill_on_drop(true);

        if request.configuration == super::BuildConfiguration::Release {
            cmd.arg("--release");
        }

        log::info!(
            "Building {} for {} ({})",
            request.product,
            target,
            request.configuration
        );

        if self.verbose {
            let status = cmd
                .status()
                .await
                .with_context(|| format!("Failed to run cargo build for {target}"))?;
            if !status.success() {
                bail!("cargo build for {target} exited with {status}");
            }
        } else {
            let output = cmd
                .output()
                .await
                .with_context(|| format!("Failed to run cargo build for {target}"))?;
            if !output.status.success() {
                bail!(
                    "Failed to build {} for {}:\n{}",
                    request.product,
                    target,
                    String::from_utf8_lossy(&output.stderr)
                );
            }
        }

        Ok(())
    }
}

impl BuildBackend for CargoBackend {
    async fn build(&self, request: &BuildRequest) -> Result<()> {
        if !request.has_manifest() {
            bail!(
                "No Cargo.toml found in {}",
                request.package_directory.display()
            );
        }

        for arch in &request.architectures {
            self.build_for_target(request, arch.target_triple(&request.platform))
                .await?;
        }

        if request.architectures.len() > 1 {
            let inputs: Vec<_> = request
                .architectures
                .iter()
                .map(|arch| request.architecture_directory(*arch).join(&request.product))
                .collect();
            create_universal_binary(&inputs, &request.executable_path()).await?;
        }

        let executable = request.executable_path();
        if !executable.is_file() {
            bail!(
                "Required binary not found after build: {}",
                executable.display()
            );
        }

        log::info!("✓ Built {}", executable.display());
        Ok(())
    }
}
