//! Legality rules for `bundle` arguments.
//!
//! Rules are checked in a fixed order and the first violation is reported.
//! Nothing is built or written when validation fails.

use thiserror::Error;

use super::args::BundleArgs;
use crate::bundler::Platform;

/// A rejected combination of `bundle` arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("--products-directory can only be used together with --skip-build")]
    ProductsDirectoryWithoutSkipBuild,

    #[error("--built-with-xcode can only be used together with --skip-build")]
    BuiltWithXcodeWithoutSkipBuild,

    #[error("--built-with-xcode is not supported when bundling for iOS devices")]
    XcodeBuildOnIos,

    #[error("--universal is not supported for iOS devices, which are always arm64")]
    UniversalOnIos,

    #[error("--arch is not supported for iOS devices, which are always arm64")]
    ArchitecturesOnIos,

    #[error(
        "--codesign requires --identity. Run `kodegen_bundler_app list-identities` to see the available identities"
    )]
    CodesignWithoutIdentity,

    #[error("--identity has no effect without --codesign")]
    IdentityWithoutCodesign,

    #[error(
        "iOS apps must be signed: pass --codesign and --identity. Run `kodegen_bundler_app list-identities` to see the available identities"
    )]
    IosRequiresCodesign,

    #[error("iOS apps require a provisioning profile: pass --provisioning-profile")]
    IosRequiresProvisioningProfile,

    #[error("--experimental-stand-alone is only supported on macOS")]
    StandaloneOutsideMacOs,

    #[error("--provisioning-profile is only used when bundling for iOS devices")]
    ProvisioningProfileOutsideIos,
}

/// Checks `args` against the target platform.
///
/// `skip_build` and `built_with_xcode` are passed separately from `args`
/// because callers may derive them from more than the raw flags.
pub fn validate(
    args: &BundleArgs,
    platform: &Platform,
    skip_build: bool,
    built_with_xcode: bool,
) -> Result<(), ValidationError> {
    let is_ios_device = matches!(platform, Platform::Ios(_));

    // Flags that only describe pre-built products
    if !skip_build {
        if args.products_directory.is_some() {
            return Err(ValidationError::ProductsDirectoryWithoutSkipBuild);
        }
        if built_with_xcode {
            return Err(ValidationError::BuiltWithXcodeWithoutSkipBuild);
        }
    }

    if is_ios_device {
        if built_with_xcode {
            return Err(ValidationError::XcodeBuildOnIos);
        }
        if args.universal {
            return Err(ValidationError::UniversalOnIos);
        }
        if !args.architectures.is_empty() {
            return Err(ValidationError::ArchitecturesOnIos);
        }
    }

    if args.codesign && args.identity.is_none() {
        return Err(ValidationError::CodesignWithoutIdentity);
    }

    if args.identity.is_some() && !args.codesign {
        return Err(ValidationError::IdentityWithoutCodesign);
    }

    if is_ios_device {
        if !args.codesign || args.identity.is_none() {
            return Err(ValidationError::IosRequiresCodesign);
        }
        if args.provisioning_profile.is_none() {
            return Err(ValidationError::IosRequiresProvisioningProfile);
        }
    }

    if args.standalone && !matches!(platform, Platform::MacOs(_)) {
        return Err(ValidationError::StandaloneOutsideMacOs);
    }

    if args.provisioning_profile.is_some() && !is_ios_device {
        return Err(ValidationError::ProvisioningProfileOutsideIos);
    }

    Ok(())
}
