//! Build backend for the build stage.
//!
//! The pipeline only needs two things from a backend: run the build, and know
//! up front where the products will land. [`BuildRequest`] captures both so
//! the bundle stage can be configured before the build runs.

mod cargo;
mod universal;

pub use cargo::CargoBackend;
pub use universal::create_universal_binary;

use crate::bundler::{BuildArchitecture, Platform};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;

/// Compilation profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BuildConfiguration {
    #[default]
    Debug,
    Release,
}

impl BuildConfiguration {
    /// Directory name cargo uses for this profile.
    pub fn directory_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory_name())
    }
}

/// What to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub package_directory: PathBuf,
    pub product: String,
    pub platform: Platform,
    pub architectures: Vec<BuildArchitecture>,
    pub configuration: BuildConfiguration,
}

impl BuildRequest {
    /// Cargo's target directory for the package.
    pub fn target_directory(&self) -> PathBuf {
        self.package_directory.join("target")
    }

    /// Products directory for a single architecture.
    pub fn architecture_directory(&self, arch: BuildArchitecture) -> PathBuf {
        self.target_directory()
            .join(arch.target_triple(&self.platform))
            .join(self.configuration.directory_name())
    }

    /// Directory the finished product ends up in.
    ///
    /// Single-architecture builds use cargo's per-target directory; universal
    /// builds are merged into `target/universal/<configuration>`.
    pub fn products_directory(&self) -> PathBuf {
        match self.architectures.as_slice() {
            [arch] => self.architecture_directory(*arch),
            _ => self
                .target_directory()
                .join("universal")
                .join(self.configuration.directory_name()),
        }
    }

    /// Path of the finished executable.
    pub fn executable_path(&self) -> PathBuf {
        self.products_directory().join(&self.product)
    }

    /// Whether the package directory looks like a cargo package.
    pub fn has_manifest(&self) -> bool {
        self.package_directory.join("Cargo.toml").is_file()
    }
}

/// Produces the executable described by a [`BuildRequest`].
pub trait BuildBackend: Send + Sync {
    /// Builds the product. The executable must exist at
    /// [`BuildRequest::executable_path`] when this returns `Ok`.
    fn build(&self, request: &BuildRequest) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(architectures: Vec<BuildArchitecture>) -> BuildRequest {
        BuildRequest {
            package_directory: PathBuf::from("/pkg"),
            product: "demo".into(),
            platform: Platform::MacOs("11.0".into()),
            architectures,
            configuration: BuildConfiguration::Release,
        }
    }

    #[test]
    fn test_single_architecture_products_directory() {
        let request = request(vec![BuildArchitecture::Arm64]);
        assert_eq!(
            request.products_directory(),
            PathBuf::from("/pkg/target/aarch64-apple-darwin/release")
        );
        assert_eq!(
            request.executable_path(),
            PathBuf::from("/pkg/target/aarch64-apple-darwin/release/demo")
        );
    }

    #[test]
    fn test_universal_products_directory() {
        let request = request(vec![BuildArchitecture::Arm64, BuildArchitecture::X86_64]);
        assert_eq!(
            request.products_directory(),
            PathBuf::from("/pkg/target/universal/release")
        );
    }

    #[test]
    fn test_default_configuration_is_debug() {
        assert_eq!(BuildConfiguration::default().to_string(), "debug");
    }
}
