//! Command line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::build::BuildConfiguration;
use crate::bundler::{BuildArchitecture, PlatformKind};

/// Bundle Rust executables as macOS and iOS apps
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_app",
    version,
    about = "Bundle Rust executables as macOS and iOS apps",
    long_about = "Build a Rust executable and package it as an .app bundle.

Apps are configured in Bundle.toml in the package directory:

  format_version = 3

  [apps.Demo]
  product = \"demo\"
  version = \"1.0.0\"
  identifier = \"com.example.demo\"

Usage:
  kodegen_bundler_app bundle
  kodegen_bundler_app bundle --platform iOS --codesign --identity <ID> --provisioning-profile demo.mobileprovision
  kodegen_bundler_app migrate
  kodegen_bundler_app list-identities"
)]
pub struct Args {
    /// Command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Show build tool output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the product and bundle it as an app
    Bundle(BundleArgs),

    /// Migrate Bundle.json or an unversioned Bundle.toml to the current format
    Migrate(PackageArgs),

    /// List the code signing identities in the keychain
    ListIdentities,
}

impl Command {
    /// Get command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Bundle(_) => "bundle",
            Command::Migrate(_) => "migrate",
            Command::ListIdentities => "list-identities",
        }
    }
}

/// Where to find the package and its configuration.
#[derive(clap::Args, Debug, Clone)]
pub struct PackageArgs {
    /// Package directory containing Bundle.toml
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub package_directory: PathBuf,

    /// Configuration file to use instead of Bundle.toml
    #[arg(long, value_name = "FILE")]
    pub configuration_file_override: Option<PathBuf>,
}

impl Default for PackageArgs {
    fn default() -> Self {
        Self {
            package_directory: PathBuf::from("."),
            configuration_file_override: None,
        }
    }
}

/// Arguments of the `bundle` command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BundleArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// App to bundle (required when Bundle.toml configures several)
    #[arg(long, value_name = "NAME")]
    pub app_name: Option<String>,

    /// Target platform: macOS, iOS or "iOS Simulator"
    #[arg(long, value_name = "PLATFORM", default_value_t = PlatformKind::MacOs)]
    pub platform: PlatformKind,

    /// Build profile
    #[arg(short = 'c', long, value_enum, default_value_t = BuildConfiguration::Debug)]
    pub configuration: BuildConfiguration,

    /// Bundle existing products instead of building
    #[arg(long)]
    pub skip_build: bool,

    /// The products were built with Xcode (requires --skip-build)
    #[arg(long)]
    pub built_with_xcode: bool,

    /// Build a universal macOS binary (arm64 + x86_64)
    #[arg(long)]
    pub universal: bool,

    /// Architecture to build for (repeatable, macOS only)
    #[arg(long = "arch", value_enum, value_name = "ARCH")]
    pub architectures: Vec<BuildArchitecture>,

    /// Directory to write the bundle to [default: <package>/target/bundle]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_directory: Option<PathBuf>,

    /// Directory containing the built products (requires --skip-build)
    #[arg(long, value_name = "DIR")]
    pub products_directory: Option<PathBuf>,

    /// Code sign the bundle (requires --identity)
    #[arg(long)]
    pub codesign: bool,

    /// Code signing identity (see list-identities)
    #[arg(long, value_name = "IDENTITY")]
    pub identity: Option<String>,

    /// Entitlements file to sign with
    #[arg(long, value_name = "FILE")]
    pub entitlements: Option<PathBuf>,

    /// Provisioning profile to embed (iOS only)
    #[arg(long, value_name = "FILE")]
    pub provisioning_profile: Option<PathBuf>,

    /// Copy dynamic libraries into the bundle (macOS only)
    #[arg(long = "experimental-stand-alone")]
    pub standalone: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print message only with --verbose
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print progress message
    pub fn progress_println(&self, message: &str) {
        let _ = self.output.progress(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(false)
    }
}
