//! Loading, resolving and saving `Bundle.toml`.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::app::{CURRENT_FORMAT_VERSION, PackageConfiguration, ResolvedApp};
use super::error::{ConfigError, DecodeFailure, Result};
use super::migration;
use crate::bundler::utils::fs::write_atomic;

/// Conventional configuration file name inside a package directory.
pub const CONFIGURATION_FILE_NAME: &str = "Bundle.toml";

/// File name of the original (v1) JSON configuration format.
pub const OLD_CONFIGURATION_FILE_NAME: &str = "Bundle.json";

/// Generation of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// `Bundle.json`
    V1,
    /// `Bundle.toml` without a `format_version` key
    V2,
    /// `Bundle.toml` with `format_version = 3`
    Current,
}

/// Path of the configuration file for a package directory.
pub fn configuration_file_path(package_directory: &Path) -> PathBuf {
    package_directory.join(CONFIGURATION_FILE_NAME)
}

/// Loads the package configuration.
///
/// Reads `custom_file` if given, else `Bundle.toml` in `from_directory`.
/// Older generations (`Bundle.json`, or a `Bundle.toml` without
/// `format_version`) are migrated on disk first.
pub async fn load(from_directory: &Path, custom_file: Option<&Path>) -> Result<PackageConfiguration> {
    let mut path = match custom_file {
        Some(path) => path.to_path_buf(),
        None => {
            let path = configuration_file_path(from_directory);
            let old_path = from_directory.join(OLD_CONFIGURATION_FILE_NAME);
            if !exists(&path).await && exists(&old_path).await {
                old_path
            } else {
                path
            }
        }
    };

    if is_v1_path(&path) {
        log::warn!(
            "{} uses the old configuration format, migrating it to {}",
            path.display(),
            CONFIGURATION_FILE_NAME
        );
        let migrated = migration::migrate(&path).await?;
        path = migrated.path;
    }

    log::debug!("Loading configuration from {}", path.display());

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::FailedToReadConfigurationFile {
            path: path.clone(),
            source,
        })?;

    let document = parse_document(&contents).map_err(ConfigError::FailedToDeserializeConfiguration)?;

    match detect_format(&document).map_err(ConfigError::FailedToDeserializeConfiguration)? {
        FormatVersion::Current => {
            decode_current(&document).map_err(ConfigError::FailedToDeserializeConfiguration)
        }
        FormatVersion::V1 | FormatVersion::V2 => {
            log::warn!(
                "{} has no format_version, migrating it to format version {}",
                path.display(),
                CURRENT_FORMAT_VERSION
            );
            Ok(migration::migrate(&path).await?.configuration)
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Chooses the app to work on.
///
/// With a name, that app must exist. Without one, the configuration must
/// contain exactly one app.
pub fn resolve_app(name: Option<&str>, configuration: &PackageConfiguration) -> Result<ResolvedApp> {
    match name {
        Some(name) => configuration
            .apps
            .get(name)
            .map(|app| ResolvedApp {
                name: name.to_string(),
                configuration: app.clone(),
            })
            .ok_or_else(|| ConfigError::NoSuchApp {
                name: name.to_string(),
            }),
        None => {
            let mut apps = configuration.apps.iter();
            match (apps.next(), apps.next()) {
                (Some((name, app)), None) => Ok(ResolvedApp {
                    name: name.clone(),
                    configuration: app.clone(),
                }),
                _ => Err(ConfigError::MultipleAppsAndNoneSpecified),
            }
        }
    }
}

/// Serializes `configuration` and atomically writes it to `path`.
pub async fn save(configuration: &PackageConfiguration, path: &Path) -> Result<()> {
    let contents = serialize(configuration).map_err(ConfigError::FailedToSerializeConfiguration)?;
    write_atomic(path, contents.as_bytes())
        .await
        .map_err(|source| ConfigError::FailedToWriteToConfigurationFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Decodes a current-format configuration from TOML text.
pub fn from_toml_str(contents: &str) -> std::result::Result<PackageConfiguration, DecodeFailure> {
    let document = parse_document(contents)?;
    decode_current(&document)
}

/// Determines the generation of the file at `path`.
pub async fn file_format(path: &Path) -> Result<FormatVersion> {
    if is_v1_path(path) {
        return Ok(FormatVersion::V1);
    }
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::FailedToReadConfigurationFile {
            path: path.to_path_buf(),
            source,
        })?;
    let document = parse_document(&contents).map_err(ConfigError::FailedToDeserializeConfiguration)?;
    detect_format(&document).map_err(ConfigError::FailedToDeserializeConfiguration)
}

pub(super) fn is_v1_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub(super) fn serialize(configuration: &PackageConfiguration) -> std::result::Result<String, toml::ser::Error> {
    toml::to_string_pretty(configuration)
}

pub(super) fn parse_document(contents: &str) -> std::result::Result<toml::Table, DecodeFailure> {
    toml::from_str::<toml::Table>(contents).map_err(|e| DecodeFailure::from_toml(&[], &e))
}

pub(super) fn detect_format(document: &toml::Table) -> std::result::Result<FormatVersion, DecodeFailure> {
    match document.get("format_version") {
        None => Ok(FormatVersion::V2),
        Some(toml::Value::Integer(version)) if *version == i64::from(CURRENT_FORMAT_VERSION) => {
            Ok(FormatVersion::Current)
        }
        Some(toml::Value::Integer(version)) => Err(DecodeFailure::Invalid {
            path: Some("format_version".into()),
            message: format!(
                "unsupported format version {version} (this bundler understands version {CURRENT_FORMAT_VERSION})"
            ),
        }),
        Some(other) => Err(DecodeFailure::Invalid {
            path: Some("format_version".into()),
            message: format!("expected an integer, found {}", other.type_str()),
        }),
    }
}

fn decode_current(document: &toml::Table) -> std::result::Result<PackageConfiguration, DecodeFailure> {
    Ok(PackageConfiguration {
        format_version: CURRENT_FORMAT_VERSION,
        apps: decode_apps(document, None)?,
    })
}

/// Decodes the `apps` table one app at a time so failures carry the app's path.
///
/// When `identifier_field` is given, a missing value for it is reported as
/// [`DecodeFailure::MissingBundleIdentifier`].
pub(super) fn decode_apps<T: DeserializeOwned>(
    document: &toml::Table,
    identifier_field: Option<&str>,
) -> std::result::Result<BTreeMap<String, T>, DecodeFailure> {
    let apps = match document.get("apps") {
        None => return Ok(BTreeMap::new()),
        Some(toml::Value::Table(apps)) => apps,
        Some(other) => {
            return Err(DecodeFailure::Invalid {
                path: Some("apps".into()),
                message: format!("expected a table, found {}", other.type_str()),
            });
        }
    };

    apps.iter()
        .map(|(name, value)| {
            let app = value.clone().try_into::<T>().map_err(|e| {
                let failure = DecodeFailure::from_toml(&["apps", name], &e);
                match identifier_field {
                    Some(field) => failure.with_identifier_field(field, name),
                    None => failure,
                }
            })?;
            Ok((name.clone(), app))
        })
        .collect()
}
