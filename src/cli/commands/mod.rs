//! Command execution.
//!
//! Each command returns its exit code; errors are reported here together
//! with recovery suggestions.

mod bundle;
mod list_identities;
mod migrate;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

use bundle::execute_bundle;
use list_identities::execute_list_identities;
use migrate::execute_migrate;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Bundle(bundle_args) => execute_bundle(bundle_args, &config).await,
        Command::Migrate(package_args) => execute_migrate(package_args, &config).await,
        Command::ListIdentities => execute_list_identities(&config).await,
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            config.error_println(&format!(
                "Command '{}' failed: {}",
                args.command.name(),
                e
            ));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                config.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    config.println(&format!("  • {}", suggestion));
                }
            }

            Ok(e.exit_code())
        }
    }
}
