//! Apple platform bundling: `.app` bundles for macOS, iOS and the iOS simulator.
//!
//! # Supported Formats
//!
//! - **Application Bundle (.app)**: via [`app`] module
//! - **Code signing and provisioning**: via [`sign`] module
//!
//! # Build Requirements
//!
//! | Step | Required Tools | Notes |
//! |------|----------------|-------|
//! | .app layout | none | Works on any host |
//! | Code Signing | `codesign`, signing identity | Required on iOS devices |
//! | Provisioning | `security` | iOS devices only |
//!
//! # Bundle Layout
//!
//! macOS bundles use the `Contents/` hierarchy:
//! - `Demo.app/Contents/Info.plist`
//! - `Demo.app/Contents/MacOS/demo`
//! - `Demo.app/Contents/Resources/`
//!
//! iOS bundles are flat:
//! - `Demo.app/Info.plist`
//! - `Demo.app/demo`
//! - `Demo.app/embedded.mobileprovision`

pub mod app;
pub mod sign;

use crate::bundler::error::{Error, Result};
use std::ffi::OsStr;
use std::process::Output;
use tokio::process::Command;

/// Runs an external tool to completion and returns its captured output.
///
/// The child is killed if the returned future is dropped.
pub(crate) async fn run_tool<I, S>(tool: &'static str, hint: &'static str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let path = which::which(tool).map_err(|_| Error::ToolNotFound { tool, hint })?;

    let mut command = Command::new(&path);
    command.args(args).kill_on_drop(true);
    log::debug!("Running {:?}", command.as_std());

    let output = command.output().await.map_err(|error| Error::CommandFailed {
        command: tool.to_string(),
        error,
    })?;

    if !output.status.success() {
        return Err(Error::CommandUnsuccessful {
            command: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
