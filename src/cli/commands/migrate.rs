//! `migrate` command: upgrade an old configuration file in place.

use std::path::PathBuf;

use crate::cli::RuntimeConfig;
use crate::cli::args::PackageArgs;
use crate::config::{
    CURRENT_FORMAT_VERSION, FormatVersion, OLD_CONFIGURATION_FILE_NAME, configuration_file_path,
    file_format, migrate,
};
use crate::error::{CliError, Result};

/// Execute the migrate command
pub(super) async fn execute_migrate(args: &PackageArgs, config: &RuntimeConfig) -> Result<i32> {
    let path = configuration_file(args).await?;

    if file_format(&path).await? == FormatVersion::Current {
        config.success_println(&format!(
            "{} is already at format version {}",
            path.display(),
            CURRENT_FORMAT_VERSION
        ));
        return Ok(0);
    }

    config.progress_println(&format!("Migrating {}...", path.display()));
    let migration = migrate(&path).await?;

    config.success_println(&format!(
        "Migrated {} to format version {}",
        migration.path.display(),
        CURRENT_FORMAT_VERSION
    ));
    config.indent(&format!("Backup: {}", migration.backup.display()));
    config.verbose_println(&format!(
        "Apps: {}",
        migration
            .configuration
            .apps
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    ));

    Ok(0)
}

/// The override if given, else `Bundle.toml`, else `Bundle.json`.
async fn configuration_file(args: &PackageArgs) -> Result<PathBuf> {
    if let Some(path) = &args.configuration_file_override {
        return Ok(path.clone());
    }

    let current = configuration_file_path(&args.package_directory);
    if tokio::fs::try_exists(&current).await.unwrap_or(false) {
        return Ok(current);
    }

    let old = args.package_directory.join(OLD_CONFIGURATION_FILE_NAME);
    if tokio::fs::try_exists(&old).await.unwrap_or(false) {
        return Ok(old);
    }

    Err(CliError::InvalidArguments {
        reason: format!(
            "no configuration file found in {}",
            args.package_directory.display()
        ),
    }
    .into())
}
