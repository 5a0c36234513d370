//! One-way migration of older configuration files to the current format.
//!
//! Every step either succeeds or leaves the package no worse off than before:
//!
//! 1. read and decode the old file, and make sure the destination is free
//!    (nothing touched on failure)
//! 2. transform and serialize the new schema (nothing touched on failure)
//! 3. copy the old file to `<file>.bak` (original intact on failure)
//! 4. atomically write the new file (original and backup intact on failure)
//!
//! A v1 `Bundle.json` is replaced by a `Bundle.toml` beside it, unless a
//! `Bundle.toml` is already there; a v2 `Bundle.toml` is rewritten in place.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::app::{AppConfiguration, CURRENT_FORMAT_VERSION, PackageConfiguration};
use super::error::{ConfigError, DecodeFailure, Result};
use super::store::{self, CONFIGURATION_FILE_NAME, FormatVersion};
use crate::bundler::utils::fs::{path_with_suffix, write_atomic};

/// Outcome of a successful migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Generation the file was migrated from
    pub from: FormatVersion,
    /// Path of the migrated (current format) file
    pub path: PathBuf,
    /// Path of the backup of the original file
    pub backup: PathBuf,
    /// The migrated configuration
    pub configuration: PackageConfiguration,
}

/// `Bundle.json` (v1). Describes a single app named after its target.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OldConfiguration {
    target: String,
    bundle_identifier: String,
    version_string: String,
    build_number: Option<u64>,
    category: Option<String>,
    #[serde(rename = "minOSVersion")]
    min_os_version: Option<String>,
    #[serde(default)]
    extra_info: BTreeMap<String, serde_json::Value>,
}

/// An app in a `Bundle.toml` without `format_version` (v2).
#[derive(Debug, Deserialize)]
struct AppConfigurationV2 {
    product: String,
    version: String,
    bundle_identifier: String,
    category: Option<String>,
    icon: Option<String>,
    minimum_macos_version: Option<String>,
    #[serde(default)]
    extra_plist_entries: BTreeMap<String, toml::Value>,
}

impl From<AppConfigurationV2> for AppConfiguration {
    fn from(app: AppConfigurationV2) -> Self {
        Self {
            product: app.product,
            version: app.version,
            identifier: app.bundle_identifier,
            category: app.category,
            icon: app.icon,
            minimum_macos_version: app.minimum_macos_version,
            minimum_ios_version: None,
            plist: app.extra_plist_entries,
        }
    }
}

/// Migrates the configuration file at `old_file` to the current format.
pub async fn migrate(old_file: &Path) -> Result<Migration> {
    let (from, configuration, destination) = if store::is_v1_path(old_file) {
        let configuration = read_v1(old_file).await?;
        let destination = old_file.with_file_name(CONFIGURATION_FILE_NAME);
        // An unknown answer counts as occupied
        if !matches!(tokio::fs::try_exists(&destination).await, Ok(false)) {
            return Err(ConfigError::MigratedConfigurationFileExists {
                old: old_file.to_path_buf(),
                path: destination,
            });
        }
        (FormatVersion::V1, configuration, destination)
    } else {
        let configuration = read_v2(old_file).await?;
        (FormatVersion::V2, configuration, old_file.to_path_buf())
    };

    let contents =
        store::serialize(&configuration).map_err(ConfigError::FailedToSerializeMigratedConfiguration)?;

    let backup = path_with_suffix(old_file, ".bak");
    tokio::fs::copy(old_file, &backup)
        .await
        .map_err(|source| ConfigError::FailedToCreateConfigurationBackup {
            path: backup.clone(),
            source,
        })?;
    log::info!("Backed up {} to {}", old_file.display(), backup.display());

    write_atomic(&destination, contents.as_bytes())
        .await
        .map_err(|source| ConfigError::FailedToWriteToMigratedConfigurationFile {
            path: destination.clone(),
            source,
        })?;

    if from == FormatVersion::V1
        && let Err(e) = tokio::fs::remove_file(old_file).await
    {
        log::warn!(
            "Migrated configuration written, but failed to remove {}: {}",
            old_file.display(),
            e
        );
    }

    log::info!(
        "Migrated {} to format version {} at {}",
        old_file.display(),
        CURRENT_FORMAT_VERSION,
        destination.display()
    );

    Ok(Migration {
        from,
        path: destination,
        backup,
        configuration,
    })
}

async fn read_old_contents(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::FailedToReadContentsOfOldConfigurationFile {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_v1(path: &Path) -> Result<PackageConfiguration> {
    let contents = read_old_contents(path).await?;
    decode_v1(&contents).map_err(ConfigError::FailedToDeserializeOldConfiguration)
}

async fn read_v2(path: &Path) -> Result<PackageConfiguration> {
    let contents = read_old_contents(path).await?;
    decode_v2(&contents).map_err(ConfigError::FailedToDeserializeV2Configuration)
}

fn decode_v1(contents: &str) -> std::result::Result<PackageConfiguration, DecodeFailure> {
    let value: serde_json::Value =
        serde_json::from_str(contents).map_err(|e| DecodeFailure::from_json(&[], &e))?;
    let app_name = value
        .get("target")
        .and_then(|target| target.as_str())
        .unwrap_or("app")
        .to_string();

    let old: OldConfiguration = serde_json::from_value(value).map_err(|e| {
        DecodeFailure::from_json(&[], &e).with_identifier_field("bundleIdentifier", &app_name)
    })?;

    let mut plist: BTreeMap<String, toml::Value> = old
        .extra_info
        .into_iter()
        .filter_map(|(key, value)| json_to_toml(value).map(|value| (key, value)))
        .collect();
    if let Some(build_number) = old.build_number {
        plist
            .entry("CFBundleVersion".to_string())
            .or_insert_with(|| toml::Value::String(build_number.to_string()));
    }

    let app = AppConfiguration {
        product: old.target,
        version: old.version_string,
        identifier: old.bundle_identifier,
        category: old.category,
        icon: None,
        minimum_macos_version: old.min_os_version,
        minimum_ios_version: None,
        plist,
    };

    let mut configuration = PackageConfiguration::new();
    configuration.apps.insert(app_name, app);
    Ok(configuration)
}

fn decode_v2(contents: &str) -> std::result::Result<PackageConfiguration, DecodeFailure> {
    let document = store::parse_document(contents)?;
    match store::detect_format(&document)? {
        FormatVersion::V2 => {}
        FormatVersion::V1 | FormatVersion::Current => {
            return Err(DecodeFailure::Invalid {
                path: Some("format_version".into()),
                message: format!("already at format version {CURRENT_FORMAT_VERSION}"),
            });
        }
    }

    let apps = store::decode_apps::<AppConfigurationV2>(&document, Some("bundle_identifier"))?;
    Ok(PackageConfiguration {
        format_version: CURRENT_FORMAT_VERSION,
        apps: apps.into_iter().map(|(name, app)| (name, app.into())).collect(),
    })
}

/// TOML has no null; null values (and null array items) are dropped.
fn json_to_toml(value: serde_json::Value) -> Option<toml::Value> {
    use serde_json::Value as Json;

    match value {
        Json::Null => None,
        Json::Bool(b) => Some(toml::Value::Boolean(b)),
        Json::Number(n) => n
            .as_i64()
            .map(toml::Value::Integer)
            .or_else(|| n.as_f64().map(toml::Value::Float)),
        Json::String(s) => Some(toml::Value::String(s)),
        Json::Array(items) => Some(toml::Value::Array(
            items.into_iter().filter_map(json_to_toml).collect(),
        )),
        Json::Object(map) => Some(toml::Value::Table(
            map.into_iter()
                .filter_map(|(key, value)| json_to_toml(value).map(|value| (key, value)))
                .collect(),
        )),
    }
}
