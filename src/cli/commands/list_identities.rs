//! `list-identities` command.

use crate::bundler::list_identities;
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Execute the list-identities command
pub(super) async fn execute_list_identities(config: &RuntimeConfig) -> Result<i32> {
    let identities = list_identities().await?;

    if identities.is_empty() {
        config.warning_println("No valid code signing identities found");
        config.indent("Create one in Xcode under Settings > Accounts > Manage Certificates");
        return Ok(0);
    }

    for identity in &identities {
        config.println(&format!("{}  \"{}\"", identity.hash, identity.name));
    }
    config.verbose_println(&format!("{} identities found", identities.len()));

    Ok(0)
}
