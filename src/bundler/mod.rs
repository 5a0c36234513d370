//! App bundler for Apple platforms.
//!
//! Assembles a built executable into a `.app` bundle for macOS, iOS devices
//! or the iOS simulator, then optionally embeds a provisioning profile and
//! code-signs the result.
//!
//! # Supported Targets
//!
//! | Platform | Layout | Notes |
//! |----------|--------|-------|
//! | macOS | `Contents/{MacOS,Resources}` | Standalone mode embeds dylibs |
//! | iOS | flat | Signing and provisioning profile required |
//! | iOS Simulator | flat | Signing optional |
//!
//! # Integration
//!
//! ```no_run
//! use kodegen_bundler_app::bundler::{AppSettings, Bundler, Platform, SettingsBuilder};
//!
//! # async fn example() -> kodegen_bundler_app::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .app(AppSettings {
//!         name: "Demo".into(),
//!         product: "demo".into(),
//!         identifier: "com.example.demo".into(),
//!         version: "1.0.0".into(),
//!         ..Default::default()
//!     })
//!     .platform(Platform::MacOs("11.0".into()))
//!     .products_directory("target/aarch64-apple-darwin/debug")
//!     .output_directory("target/bundle")
//!     .build()?;
//!
//! let app = Bundler::new(settings).bundle().await?;
//! println!("{} ({})", app.path.display(), app.checksum);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod arch;
mod builder;
pub(crate) mod error;
pub(crate) mod platform;
mod settings;
pub(crate) mod utils;

// Public re-exports
pub use arch::{BuildArchitecture, is_universal, resolve_architectures};
pub use builder::Bundler;
pub use error::{Error, Result};
pub use platform::darwin::sign::{SigningIdentity, list_identities};
pub use platform::{DEFAULT_IOS_VERSION, DEFAULT_MACOS_VERSION, Platform, PlatformKind};
pub use settings::{AppSettings, Settings, SettingsBuilder, SigningSettings};

/// A bundled app.
///
/// Returned by [`Bundler::bundle`] after the bundle has been assembled (and
/// signed, if requested).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledApp {
    /// Path of the `.app` directory.
    pub path: std::path::PathBuf,

    /// SHA-256 over the bundle tree (relative paths and file contents).
    pub checksum: String,
}
