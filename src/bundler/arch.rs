//! CPU architecture types and build architecture selection.

use crate::bundler::platform::Platform;
use std::fmt;

/// CPU architecture a product can be built for.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_app::bundler::{BuildArchitecture, Platform};
///
/// let triple = BuildArchitecture::Arm64.target_triple(&Platform::MacOs("13.0".into()));
/// assert_eq!(triple, "aarch64-apple-darwin");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum BuildArchitecture {
    /// AArch64 / ARM64 (64-bit) - Apple Silicon and every iOS device
    #[value(name = "arm64")]
    Arm64,
    /// x86_64 / AMD64 (64-bit) - Intel Macs
    #[value(name = "x86_64")]
    X86_64,
}

impl BuildArchitecture {
    /// The architecture of the machine running the bundler.
    pub fn current() -> Self {
        if cfg!(target_arch = "aarch64") {
            BuildArchitecture::Arm64
        } else {
            BuildArchitecture::X86_64
        }
    }

    /// Apple's name for the architecture (as used by `lipo` and `codesign`).
    pub fn name(&self) -> &'static str {
        match self {
            BuildArchitecture::Arm64 => "arm64",
            BuildArchitecture::X86_64 => "x86_64",
        }
    }

    /// Rust target triple for this architecture on the given platform.
    pub fn target_triple(&self, platform: &Platform) -> &'static str {
        match (platform, self) {
            (Platform::MacOs(_), BuildArchitecture::Arm64) => "aarch64-apple-darwin",
            (Platform::MacOs(_), BuildArchitecture::X86_64) => "x86_64-apple-darwin",
            (Platform::Ios(_), BuildArchitecture::Arm64) => "aarch64-apple-ios",
            // No Intel iOS devices exist; the validator keeps this combination out.
            (Platform::Ios(_), BuildArchitecture::X86_64) => "x86_64-apple-ios",
            (Platform::IosSimulator(_), BuildArchitecture::Arm64) => "aarch64-apple-ios-sim",
            (Platform::IosSimulator(_), BuildArchitecture::X86_64) => "x86_64-apple-ios",
        }
    }
}

impl fmt::Display for BuildArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether the requested flags describe a universal build.
pub fn is_universal(requested: &[BuildArchitecture], universal: bool) -> bool {
    requested.len() > 1 || universal
}

/// Computes the concrete set of architectures to build for.
///
/// - macOS: `--universal` gives `[arm64, x86_64]`, explicit `--arch` values are
///   used as given (duplicates dropped), otherwise the host architecture.
/// - iOS devices are always `[arm64]`.
/// - The simulator always runs the host architecture.
pub fn resolve_architectures(
    platform: &Platform,
    requested: &[BuildArchitecture],
    universal: bool,
) -> Vec<BuildArchitecture> {
    match platform {
        Platform::MacOs(_) => {
            if universal {
                vec![BuildArchitecture::Arm64, BuildArchitecture::X86_64]
            } else if !requested.is_empty() {
                let mut architectures = Vec::with_capacity(requested.len());
                for arch in requested {
                    if !architectures.contains(arch) {
                        architectures.push(*arch);
                    }
                }
                architectures
            } else {
                vec![BuildArchitecture::current()]
            }
        }
        Platform::Ios(_) => vec![BuildArchitecture::Arm64],
        Platform::IosSimulator(_) => vec![BuildArchitecture::current()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macos() -> Platform {
        Platform::MacOs("13.0".into())
    }

    #[test]
    fn test_macos_universal() {
        assert_eq!(
            resolve_architectures(&macos(), &[], true),
            vec![BuildArchitecture::Arm64, BuildArchitecture::X86_64]
        );
        // Universal wins over explicit architectures
        assert_eq!(
            resolve_architectures(&macos(), &[BuildArchitecture::X86_64], true),
            vec![BuildArchitecture::Arm64, BuildArchitecture::X86_64]
        );
    }

    #[test]
    fn test_macos_explicit_architectures() {
        assert_eq!(
            resolve_architectures(&macos(), &[BuildArchitecture::X86_64], false),
            vec![BuildArchitecture::X86_64]
        );
        assert_eq!(
            resolve_architectures(
                &macos(),
                &[
                    BuildArchitecture::X86_64,
                    BuildArchitecture::Arm64,
                    BuildArchitecture::X86_64
                ],
                false
            ),
            vec![BuildArchitecture::X86_64, BuildArchitecture::Arm64]
        );
    }

    #[test]
    fn test_macos_defaults_to_host() {
        assert_eq!(
            resolve_architectures(&macos(), &[], false),
            vec![BuildArchitecture::current()]
        );
    }

    #[test]
    fn test_ios_device_is_always_arm64() {
        let ios = Platform::Ios("16.0".into());
        assert_eq!(resolve_architectures(&ios, &[], false), vec![BuildArchitecture::Arm64]);
        assert_eq!(
            resolve_architectures(&ios, &[BuildArchitecture::X86_64], true),
            vec![BuildArchitecture::Arm64]
        );
    }

    #[test]
    fn test_simulator_uses_host() {
        let sim = Platform::IosSimulator("16.0".into());
        assert_eq!(
            resolve_architectures(&sim, &[BuildArchitecture::X86_64], true),
            vec![BuildArchitecture::current()]
        );
    }

    #[test]
    fn test_is_universal() {
        assert!(is_universal(&[], true));
        assert!(is_universal(
            &[BuildArchitecture::Arm64, BuildArchitecture::X86_64],
            false
        ));
        assert!(!is_universal(&[BuildArchitecture::Arm64], false));
        assert!(!is_universal(&[], false));
    }

    #[test]
    fn test_target_triples() {
        let sim = Platform::IosSimulator("16.0".into());
        assert_eq!(BuildArchitecture::Arm64.target_triple(&sim), "aarch64-apple-ios-sim");
        assert_eq!(BuildArchitecture::X86_64.target_triple(&sim), "x86_64-apple-ios");
        assert_eq!(
            BuildArchitecture::Arm64.target_triple(&Platform::Ios("16.0".into())),
            "aarch64-apple-ios"
        );
    }
}
