//! Target platforms for app bundles.
//!
//! This module contains the platform value type used throughout the bundler
//! and the Apple-specific bundling implementations.
//!
//! # Supported Platforms
//!
//! | Platform | Bundle Layout | Signing |
//! |----------|---------------|---------|
//! | macOS | `Name.app/Contents/...` | Optional |
//! | iOS | flat `Name.app/` | Required, with provisioning profile |
//! | iOS Simulator | flat `Name.app/` | Optional |

pub mod darwin;

use std::fmt;
use std::str::FromStr;

/// Default minimum macOS version when an app does not configure one.
pub const DEFAULT_MACOS_VERSION: &str = "10.13";

/// Default minimum iOS version when an app does not configure one.
pub const DEFAULT_IOS_VERSION: &str = "15.0";

/// A target platform together with its (minimum) OS version.
///
/// Equality and hashing are structural: two platforms are equal only when
/// both the variant and the version match.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_app::bundler::Platform;
///
/// let platform = Platform::IosSimulator("17.0".into());
/// assert_eq!(platform.name(), "iOS Simulator");
/// assert!(platform.is_simulator());
/// assert_eq!(platform.version(), "17.0");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Platform {
    /// macOS desktop.
    MacOs(String),
    /// iOS physical device.
    Ios(String),
    /// iOS simulator running on the host machine.
    IosSimulator(String),
}

impl Platform {
    /// Builds a platform of the given kind with an explicit version.
    pub fn new(kind: PlatformKind, version: impl Into<String>) -> Self {
        let version = version.into();
        match kind {
            PlatformKind::MacOs => Platform::MacOs(version),
            PlatformKind::Ios => Platform::Ios(version),
            PlatformKind::IosSimulator => Platform::IosSimulator(version),
        }
    }

    /// The OS version carried by this platform.
    pub fn version(&self) -> &str {
        match self {
            Platform::MacOs(version)
            | Platform::Ios(version)
            | Platform::IosSimulator(version) => version,
        }
    }

    /// Human readable platform name.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Whether this is the simulator variant.
    pub fn is_simulator(&self) -> bool {
        matches!(self, Platform::IosSimulator(_))
    }

    /// The platform tag without its version.
    pub fn kind(&self) -> PlatformKind {
        match self {
            Platform::MacOs(_) => PlatformKind::MacOs,
            Platform::Ios(_) => PlatformKind::Ios,
            Platform::IosSimulator(_) => PlatformKind::IosSimulator,
        }
    }

    /// SDK name as used in `CFBundleSupportedPlatforms`.
    pub fn sdk_name(&self) -> &'static str {
        match self {
            Platform::MacOs(_) => "macosx",
            Platform::Ios(_) => "iphoneos",
            Platform::IosSimulator(_) => "iphonesimulator",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.version())
    }
}

/// Platform tag as selected on the command line, before a version is known.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PlatformKind {
    /// macOS desktop.
    #[default]
    MacOs,
    /// iOS physical device.
    Ios,
    /// iOS simulator.
    IosSimulator,
}

impl PlatformKind {
    /// Human readable platform name.
    pub fn name(&self) -> &'static str {
        match self {
            PlatformKind::MacOs => "macOS",
            PlatformKind::Ios => "iOS",
            PlatformKind::IosSimulator => "iOS Simulator",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "macos" => Ok(PlatformKind::MacOs),
            "ios" => Ok(PlatformKind::Ios),
            "ios simulator" | "ios-simulator" | "iossimulator" => Ok(PlatformKind::IosSimulator),
            other => Err(format!(
                "unknown platform '{other}' (expected one of: macOS, iOS, iOS Simulator)"
            )),
        }
    }
}
