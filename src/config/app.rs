//! Package and app configuration types (current `Bundle.toml` schema).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bundler::platform::{
    DEFAULT_IOS_VERSION, DEFAULT_MACOS_VERSION, Platform, PlatformKind,
};

/// Current configuration format version, written as `format_version`.
pub const CURRENT_FORMAT_VERSION: u32 = 3;

/// Packaging metadata of a single app.
///
/// ```toml
/// [apps.Demo]
/// product = "demo"
/// version = "1.2.0"
/// identifier = "com.example.demo"
/// category = "public.app-category.developer-tools"
///
/// [apps.Demo.plist]
/// NSHumanReadableCopyright = "Copyright © Example"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfiguration {
    /// Name of the binary target the app runs.
    pub product: String,

    /// Version string (`CFBundleShortVersionString`). May contain expressions.
    pub version: String,

    /// Bundle identifier (`CFBundleIdentifier`), e.g. `com.example.demo`.
    pub identifier: String,

    /// Application category (`LSApplicationCategoryType`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Path to an `.icns` icon, relative to the package directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Minimum supported macOS version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_macos_version: Option<String>,

    /// Minimum supported iOS version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_ios_version: Option<String>,

    /// Extra Info.plist entries. These override generated keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plist: BTreeMap<String, toml::Value>,
}

impl AppConfiguration {
    /// Builds the target platform for `kind`, versioned by this app's minimum OS version.
    pub fn platform(&self, kind: PlatformKind) -> Platform {
        let version = match kind {
            PlatformKind::MacOs => self
                .minimum_macos_version
                .as_deref()
                .unwrap_or(DEFAULT_MACOS_VERSION),
            PlatformKind::Ios | PlatformKind::IosSimulator => self
                .minimum_ios_version
                .as_deref()
                .unwrap_or(DEFAULT_IOS_VERSION),
        };
        Platform::new(kind, version)
    }
}

/// All apps of a package, as stored in `Bundle.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfiguration {
    /// Schema version of the file.
    pub format_version: u32,

    /// Apps keyed by name.
    #[serde(default)]
    pub apps: BTreeMap<String, AppConfiguration>,
}

impl PackageConfiguration {
    /// Creates an empty configuration in the current format.
    pub fn new() -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            apps: BTreeMap::new(),
        }
    }
}

impl Default for PackageConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// The app chosen for this command, with its name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedApp {
    /// App name (key in the `apps` table)
    pub name: String,
    /// App configuration
    pub configuration: AppConfiguration,
}
