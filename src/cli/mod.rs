//! Command line interface for kodegen_bundler_app.
//!
//! Parses arguments, runs the selected command and reports the outcome with
//! colored output.

mod args;
pub mod commands;
mod output;
pub mod validation;

pub use args::{Args, BundleArgs, Command, PackageArgs, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;
pub use validation::{ValidationError, validate};

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}

/// Validate `bundle` arguments without executing (for testing)
pub fn validate_args(
    args: &BundleArgs,
    platform: &crate::bundler::Platform,
) -> std::result::Result<(), ValidationError> {
    validate(args, platform, args.skip_build, args.built_with_xcode)
}
