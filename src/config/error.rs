//! Configuration errors and decode failure classification.
//!
//! Decoding failures are first classified into a [`DecodeFailure`] (what went
//! wrong and where), and only rendered into a message by its `Display`
//! implementation. [`ConfigError`] then adds the operation that failed.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::expressions::EvaluationError;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors produced while loading, resolving or migrating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A requested app does not exist in the configuration
    #[error("There is no app called '{name}' in the package configuration")]
    NoSuchApp {
        /// Requested app name
        name: String,
    },

    /// No app name was given and the package does not contain exactly one app
    #[error(
        "This package does not contain exactly one app. \
         Pass --app-name to choose which app to bundle"
    )]
    MultipleAppsAndNoneSpecified,

    /// Expanding `$(...)` expressions in an app's configuration failed
    #[error("Failed to evaluate expressions in the configuration of app '{app}': {source}")]
    FailedToEvaluateExpressions {
        /// App whose configuration contains the expression
        app: String,
        /// What went wrong
        #[source]
        source: EvaluationError,
    },

    /// The configuration file could not be read
    #[error("Failed to read configuration file at {path}: {source}")]
    FailedToReadConfigurationFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration file is not a valid configuration
    #[error("Failed to deserialize configuration: {0}")]
    FailedToDeserializeConfiguration(DecodeFailure),

    /// The configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    FailedToSerializeConfiguration(#[source] toml::ser::Error),

    /// The configuration file could not be written
    #[error("Failed to write configuration file at {path}: {source}")]
    FailedToWriteToConfigurationFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An old-format (v1) configuration file could not be read
    #[error("Failed to read contents of old configuration file at {path}: {source}")]
    FailedToReadContentsOfOldConfigurationFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An old-format (v1) configuration file is invalid
    #[error("Failed to deserialize old configuration: {0}")]
    FailedToDeserializeOldConfiguration(DecodeFailure),

    /// The migrated configuration could not be serialized
    #[error("Failed to serialize migrated configuration: {0}")]
    FailedToSerializeMigratedConfiguration(#[source] toml::ser::Error),

    /// The migrated configuration could not be written
    #[error(
        "Failed to write migrated configuration to {path}: {source}. \
         A backup of the original configuration is available"
    )]
    FailedToWriteToMigratedConfigurationFile {
        /// Path of the migrated file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The backup of the pre-migration file could not be created
    #[error("Failed to create configuration backup at {path}: {source}")]
    FailedToCreateConfigurationBackup {
        /// Path of the backup file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Migrating `old` would replace an existing configuration file
    #[error("Cannot migrate {old}: {path} already exists")]
    MigratedConfigurationFileExists {
        /// Pre-migration file
        old: PathBuf,
        /// Existing file the migration would write to
        path: PathBuf,
    },

    /// A v2 configuration file is invalid
    #[error("Failed to deserialize v2 configuration: {0}")]
    FailedToDeserializeV2Configuration(DecodeFailure),
}

impl ConfigError {
    /// The decode failure behind this error, if it is a deserialization error.
    pub fn decode_failure(&self) -> Option<&DecodeFailure> {
        match self {
            ConfigError::FailedToDeserializeConfiguration(failure)
            | ConfigError::FailedToDeserializeOldConfiguration(failure)
            | ConfigError::FailedToDeserializeV2Configuration(failure) => Some(failure),
            ConfigError::NoSuchApp { .. }
            | ConfigError::MultipleAppsAndNoneSpecified
            | ConfigError::FailedToEvaluateExpressions { .. }
            | ConfigError::FailedToReadConfigurationFile { .. }
            | ConfigError::FailedToSerializeConfiguration(_)
            | ConfigError::FailedToWriteToConfigurationFile { .. }
            | ConfigError::FailedToReadContentsOfOldConfigurationFile { .. }
            | ConfigError::FailedToSerializeMigratedConfiguration(_)
            | ConfigError::FailedToWriteToMigratedConfigurationFile { .. }
            | ConfigError::FailedToCreateConfigurationBackup { .. }
            | ConfigError::MigratedConfigurationFileExists { .. } => None,
        }
    }
}

/// Structured reason for a failed decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// A required key is absent. `path` is dotted, e.g. `apps.Demo.version`.
    MissingField {
        /// Coding path of the missing key
        path: String,
    },

    /// An app has no bundle identifier, so it cannot be migrated.
    MissingBundleIdentifier {
        /// App lacking the identifier
        app: String,
    },

    /// Anything else: syntax errors, wrong types, unsupported versions.
    Invalid {
        /// Coding path where the problem was found, if known
        path: Option<String>,
        /// Decoder message
        message: String,
    },
}

impl DecodeFailure {
    /// Classifies a decoder message raised while decoding the value at `path`.
    pub fn classify(path: &[&str], message: &str) -> Self {
        match missing_field_name(message) {
            Some(field) => {
                let mut segments = path.to_vec();
                segments.push(field);
                DecodeFailure::MissingField {
                    path: segments.join("."),
                }
            }
            None => DecodeFailure::Invalid {
                path: (!path.is_empty()).then(|| path.join(".")),
                message: message.trim().to_string(),
            },
        }
    }

    /// Classifies a TOML decode error.
    pub fn from_toml(path: &[&str], error: &toml::de::Error) -> Self {
        Self::classify(path, error.message())
    }

    /// Classifies a JSON decode error.
    pub fn from_json(path: &[&str], error: &serde_json::Error) -> Self {
        Self::classify(path, &error.to_string())
    }

    /// Reports a missing `field` as a missing bundle identifier of `app`.
    pub fn with_identifier_field(self, field: &str, app: &str) -> Self {
        match self {
            DecodeFailure::MissingField { ref path }
                if path.rsplit('.').next() == Some(field) =>
            {
                DecodeFailure::MissingBundleIdentifier {
                    app: app.to_string(),
                }
            }
            other => other,
        }
    }

    /// The coding path of the missing key, when the failure is a missing key.
    pub fn missing_field_path(&self) -> Option<&str> {
        match self {
            DecodeFailure::MissingField { path } => Some(path),
            DecodeFailure::MissingBundleIdentifier { .. } | DecodeFailure::Invalid { .. } => None,
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::MissingField { path } => {
                write!(f, "missing required field '{path}'")
            }
            DecodeFailure::MissingBundleIdentifier { app } => write!(
                f,
                "app '{app}' has no bundle identifier. Add one (e.g. \"com.example.{app}\") \
                 and run the migration again"
            ),
            DecodeFailure::Invalid {
                path: Some(path),
                message,
            } => write!(f, "invalid value at '{path}': {message}"),
            DecodeFailure::Invalid {
                path: None,
                message,
            } => f.write_str(message),
        }
    }
}

/// Extracts `name` from serde's "missing field `name`" message.
fn missing_field_name(message: &str) -> Option<&str> {
    const MARKER: &str = "missing field `";
    let start = message.find(MARKER)? + MARKER.len();
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}
