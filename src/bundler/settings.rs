//! Configuration structures for bundling operations.
//!
//! [`Settings`] holds everything the bundle stage needs to assemble an app:
//! app metadata from `Bundle.toml`, the target platform and architectures,
//! where the built products live and where the bundle goes, and the signing
//! inputs from the command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::bundler::arch::BuildArchitecture;
use crate::bundler::platform::Platform;
use crate::config::ResolvedApp;

/// App metadata used to generate the bundle.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    /// Bundle name (the `.app` directory is named after it).
    pub name: String,

    /// Name of the executable in the products directory.
    pub product: String,

    /// Bundle identifier, e.g. `com.example.demo`.
    pub identifier: String,

    /// Version string.
    pub version: String,

    /// Application category (`LSApplicationCategoryType`).
    ///
    /// Default: None
    pub category: Option<String>,

    /// Absolute path of an `.icns` icon.
    ///
    /// Default: None
    pub icon: Option<PathBuf>,

    /// Extra Info.plist entries, applied after the generated keys.
    ///
    /// Default: Empty
    pub plist: BTreeMap<String, toml::Value>,
}

impl AppSettings {
    /// Builds app settings from a resolved app. Relative icon paths are
    /// resolved against `package_directory`.
    pub fn from_resolved(app: &ResolvedApp, package_directory: &Path) -> Self {
        let configuration = &app.configuration;
        Self {
            name: app.name.clone(),
            product: configuration.product.clone(),
            identifier: configuration.identifier.clone(),
            version: configuration.version.clone(),
            category: configuration.category.clone(),
            icon: configuration
                .icon
                .as_ref()
                .map(|icon| package_directory.join(icon)),
            plist: configuration.plist.clone(),
        }
    }
}

/// Code signing inputs.
#[derive(Debug, Clone)]
pub struct SigningSettings {
    /// Signing identity, as listed by `list-identities`.
    pub identity: String,

    /// Entitlements file to sign with.
    ///
    /// Default: None (iOS derives entitlements from the provisioning profile)
    pub entitlements: Option<PathBuf>,
}

/// Complete bundler configuration. Built with [`SettingsBuilder`].
#[derive(Clone, Debug)]
pub struct Settings {
    app: AppSettings,
    platform: Platform,
    architectures: Vec<BuildArchitecture>,
    products_directory: PathBuf,
    output_directory: PathBuf,
    signing: Option<SigningSettings>,
    provisioning_profile: Option<PathBuf>,
    standalone: bool,
    built_with_xcode: bool,
}

impl Settings {
    /// Returns the app metadata.
    pub fn app(&self) -> &AppSettings {
        &self.app
    }

    /// Returns the target platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Returns the architectures the product was built for.
    pub fn architectures(&self) -> &[BuildArchitecture] {
        &self.architectures
    }

    /// Returns the directory containing the built products.
    pub fn products_directory(&self) -> &Path {
        &self.products_directory
    }

    /// Returns the directory the bundle is written to.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Returns the signing settings, if code signing was requested.
    pub fn signing(&self) -> Option<&SigningSettings> {
        self.signing.as_ref()
    }

    /// Returns the provisioning profile to embed.
    pub fn provisioning_profile(&self) -> Option<&Path> {
        self.provisioning_profile.as_deref()
    }

    /// Whether dynamic libraries are copied into the bundle.
    pub fn standalone(&self) -> bool {
        self.standalone
    }

    /// Whether the products were built by Xcode.
    pub fn built_with_xcode(&self) -> bool {
        self.built_with_xcode
    }

    /// Path of the `.app` bundle that will be created.
    pub fn bundle_path(&self) -> PathBuf {
        self.output_directory.join(format!("{}.app", self.app.name))
    }

    /// Path of the built executable.
    pub fn executable_path(&self) -> PathBuf {
        self.products_directory.join(&self.app.product)
    }

    /// Directory searched for dynamic libraries in standalone mode.
    ///
    /// Xcode places package dylibs in `PackageFrameworks`.
    pub fn dynamic_library_directory(&self) -> PathBuf {
        if self.built_with_xcode {
            self.products_directory.join("PackageFrameworks")
        } else {
            self.products_directory.clone()
        }
    }
}

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_app::bundler::{AppSettings, Platform, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_app::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app(AppSettings {
///         name: "Demo".into(),
///         product: "demo".into(),
///         identifier: "com.example.demo".into(),
///         version: "1.0.0".into(),
///         ..Default::default()
///     })
///     .platform(Platform::MacOs("11.0".into()))
///     .products_directory("target/aarch64-apple-darwin/release")
///     .output_directory("target/bundle")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    app: Option<AppSettings>,
    platform: Option<Platform>,
    architectures: Vec<BuildArchitecture>,
    products_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    signing: Option<SigningSettings>,
    provisioning_profile: Option<PathBuf>,
    standalone: bool,
    built_with_xcode: bool,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets app metadata. Required.
    pub fn app(mut self, app: AppSettings) -> Self {
        self.app = Some(app);
        self
    }

    /// Sets the target platform. Required.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets the architectures the product was built for.
    ///
    /// Default: Empty
    pub fn architectures(mut self, architectures: Vec<BuildArchitecture>) -> Self {
        self.architectures = architectures;
        self
    }

    /// Sets the directory containing the built executable. Required.
    pub fn products_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.products_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the directory the bundle is written to. Required.
    pub fn output_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables code signing.
    ///
    /// Default: None (unsigned)
    pub fn signing(mut self, signing: Option<SigningSettings>) -> Self {
        self.signing = signing;
        self
    }

    /// Sets the provisioning profile to embed.
    ///
    /// Default: None
    pub fn provisioning_profile(mut self, path: Option<PathBuf>) -> Self {
        self.provisioning_profile = path;
        self
    }

    /// Copies dynamic libraries into the bundle.
    ///
    /// Default: false
    pub fn standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Marks the products as built by Xcode.
    ///
    /// Default: false
    pub fn built_with_xcode(mut self, built_with_xcode: bool) -> Self {
        self.built_with_xcode = built_with_xcode;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `app`, `platform`, `products_directory` or
    /// `output_directory` is missing.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        Ok(Settings {
            app: self.app.context("app settings are required")?,
            platform: self.platform.context("platform is required")?,
            architectures: self.architectures,
            products_directory: self
                .products_directory
                .context("products_directory is required")?,
            output_directory: self
                .output_directory
                .context("output_directory is required")?,
            signing: self.signing,
            provisioning_profile: self.provisioning_profile,
            standalone: self.standalone,
            built_with_xcode: self.built_with_xcode,
        })
    }
}
