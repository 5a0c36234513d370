//! Error types for kodegen_bundler_app commands.
//!
//! Every command failure ends up as a [`CommandError`], which knows how to
//! suggest a next step to the user.

use thiserror::Error;

use crate::cli::ValidationError;
use crate::config::{ConfigError, DecodeFailure};
use crate::pipeline::{StageFailure, StageKind};

/// Result type alias for command execution
pub type Result<T> = std::result::Result<T, CommandError>;

/// Main error type for all commands
#[derive(Error, Debug)]
pub enum CommandError {
    /// Configuration loading, resolution or migration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rejected argument combinations
    #[error("Invalid arguments: {0}")]
    Validation(#[from] ValidationError),

    /// Build or bundle stage failures
    #[error(transparent)]
    Pipeline(#[from] StageFailure),

    /// Bundler errors outside the pipeline
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The user pressed Ctrl-C
    #[error("Interrupted")]
    Interrupted,
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl CommandError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Interrupted => 130,
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            CommandError::Config(ConfigError::NoSuchApp { .. })
            | CommandError::Config(ConfigError::MultipleAppsAndNoneSpecified) => vec![
                "Pass --app-name with one of the apps configured in Bundle.toml".to_string(),
            ],
            CommandError::Config(ConfigError::FailedToReadConfigurationFile { .. }) => vec![
                "Create a Bundle.toml in the package directory".to_string(),
                "Point at another file with --configuration-file-override".to_string(),
            ],
            CommandError::Config(ConfigError::MigratedConfigurationFileExists { old, path }) => vec![
                format!("Remove {} if {} should replace it", path.display(), old.display()),
                format!("Otherwise delete {} and keep using {}", old.display(), path.display()),
            ],
            CommandError::Config(error) => match error.decode_failure() {
                Some(DecodeFailure::MissingBundleIdentifier { app }) => vec![format!(
                    "Add a bundle identifier for '{app}', e.g. bundle_identifier = \"com.example.{}\"",
                    app.to_lowercase()
                )],
                Some(DecodeFailure::MissingField { path }) => {
                    vec![format!("Add the missing '{path}' entry to the configuration file")]
                }
                _ if matches!(
                    error,
                    ConfigError::FailedToWriteToMigratedConfigurationFile { .. }
                ) =>
                {
                    vec!["Restore the original configuration from its .bak copy".to_string()]
                }
                _ => vec!["Check the configuration file against the documented format".to_string()],
            },
            CommandError::Validation(
                ValidationError::CodesignWithoutIdentity | ValidationError::IosRequiresCodesign,
            ) => vec![
                "List the available identities: kodegen_bundler_app list-identities".to_string(),
            ],
            CommandError::Pipeline(failure) if failure.stage == StageKind::Build => vec![
                "Run cargo build in the package directory to see the full compiler output"
                    .to_string(),
                "Bundle existing products with --skip-build --products-directory <DIR>".to_string(),
            ],
            CommandError::Pipeline(_) => vec![
                "Re-run with RUST_LOG=debug for details of each bundling step".to_string(),
            ],
            CommandError::Interrupted => vec![
                "A partially written bundle may remain; it is replaced on the next run".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
