//! Code signing and provisioning for Apple bundles.
//!
//! Drives `codesign` to sign a bundle and `security` to decode provisioning
//! profiles and enumerate the signing identities in the keychain.

use super::run_tool;
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    platform::Platform,
    settings::Settings,
};
use std::ffi::{OsStr, OsString};
use std::path::Path;

const CODESIGN_HINT: &str = "Install the Xcode command line tools: xcode-select --install";
const SECURITY_HINT: &str = "The security tool ships with macOS; signing requires a macOS host";

/// A code signing identity available in the keychain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    /// SHA-1 fingerprint of the certificate
    pub hash: String,
    /// Common name, e.g. `Apple Development: Jane Doe (TEAMID1234)`
    pub name: String,
}

/// Signs the bundle at `app_bundle` with the identity from `settings`.
///
/// Entitlements come from the configured file or, for iOS devices, from the
/// provisioning profile. Skips signing when no identity is configured.
pub async fn sign_app(app_bundle: &Path, settings: &Settings) -> Result<()> {
    let Some(signing) = settings.signing() else {
        log::info!("No signing identity configured, skipping signing");
        return Ok(());
    };

    log::info!(
        "Signing {} with identity '{}'",
        app_bundle.display(),
        signing.identity
    );

    let entitlements = match (&signing.entitlements, settings.provisioning_profile()) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(profile)) if matches!(settings.platform(), Platform::Ios(_)) => {
            let path = settings
                .output_directory()
                .join(format!("{}.entitlements", settings.app().name));
            write_profile_entitlements(profile, &path).await?;
            Some(path)
        }
        _ => None,
    };

    let mut args: Vec<OsString> = vec![
        "--force".into(),
        "--deep".into(),
        "--sign".into(),
        signing.identity.clone().into(),
    ];
    if let Some(entitlements) = &entitlements {
        args.push("--entitlements".into());
        args.push(entitlements.clone().into_os_string());
    }
    args.push(app_bundle.as_os_str().to_os_string());

    run_tool("codesign", CODESIGN_HINT, &args)
        .await
        .map_err(|e| Error::Sign(e.to_string()))?;

    log::info!("✓ Successfully signed {}", app_bundle.display());
    Ok(())
}

/// Extracts the `Entitlements` dictionary from a provisioning profile.
pub async fn entitlements_from_profile(profile: &Path) -> Result<plist::Dictionary> {
    let output = run_tool(
        "security",
        SECURITY_HINT,
        [
            OsStr::new("cms"),
            OsStr::new("-D"),
            OsStr::new("-i"),
            profile.as_os_str(),
        ],
    )
    .await?;

    entitlements_from_decoded_profile(&output.stdout)
}

/// Reads the `Entitlements` dictionary from a decoded profile plist.
pub fn entitlements_from_decoded_profile(decoded: &[u8]) -> Result<plist::Dictionary> {
    let profile = plist::Value::from_reader_xml(decoded)?;
    profile
        .as_dictionary()
        .and_then(|dict| dict.get("Entitlements"))
        .and_then(|value| value.as_dictionary())
        .cloned()
        .ok_or_else(|| Error::Sign("provisioning profile has no Entitlements dictionary".into()))
}

async fn write_profile_entitlements(profile: &Path, destination: &Path) -> Result<()> {
    let entitlements = entitlements_from_profile(profile).await?;
    let mut buffer = Vec::new();
    plist::Value::Dictionary(entitlements).to_writer_xml(&mut buffer)?;
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }
    tokio::fs::write(destination, buffer)
        .await
        .fs_context("writing entitlements", destination)
}

/// Lists the valid code signing identities in the keychain.
pub async fn list_identities() -> Result<Vec<SigningIdentity>> {
    let output = run_tool(
        "security",
        SECURITY_HINT,
        ["find-identity", "-pv", "codesigning"],
    )
    .await?;
    Ok(parse_identities(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `security find-identity` output.
///
/// Identity lines look like `  1) 0123ABCD... "Apple Development: Jane (TEAM)"`;
/// everything else is ignored.
pub fn parse_identities(output: &str) -> Vec<SigningIdentity> {
    output
        .lines()
        .filter_map(|line| {
            let (index, rest) = line.trim().split_once(") ")?;
            if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let (hash, name) = rest.trim().split_once(' ')?;
            let name = name.trim().strip_prefix('"')?.strip_suffix('"')?;
            Some(SigningIdentity {
                hash: hash.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIND_IDENTITY_OUTPUT: &str = r#"
  1) 0123456789ABCDEF0123456789ABCDEF01234567 "Apple Development: Jane Doe (ABCDE12345)"
  2) 89ABCDEF0123456789ABCDEF0123456789ABCDEF "Developer ID Application: Example Ltd (ABCDE12345)"
     2 valid identities found
"#;

    #[test]
    fn test_parse_identities() {
        let identities = parse_identities(FIND_IDENTITY_OUTPUT);
        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0].hash, "0123456789ABCDEF0123456789ABCDEF01234567");
        assert_eq!(identities[0].name, "Apple Development: Jane Doe (ABCDE12345)");
        assert_eq!(
            identities[1].name,
            "Developer ID Application: Example Ltd (ABCDE12345)"
        );
    }

    #[test]
    fn test_parse_identities_none_found() {
        assert!(parse_identities("     0 valid identities found\n").is_empty());
    }

    #[test]
    fn test_entitlements_from_decoded_profile() {
        let profile = br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Name</key>
    <string>Demo Profile</string>
    <key>Entitlements</key>
    <dict>
        <key>application-identifier</key>
        <string>ABCDE12345.com.example.demo</string>
        <key>get-task-allow</key>
        <true/>
    </dict>
</dict>
</plist>"#;

        let entitlements = entitlements_from_decoded_profile(profile).unwrap();
        assert_eq!(
            entitlements
                .get("application-identifier")
                .and_then(|v| v.as_string()),
            Some("ABCDE12345.com.example.demo")
        );
        assert_eq!(
            entitlements.get("get-task-allow").and_then(|v| v.as_boolean()),
            Some(true)
        );
    }

    #[test]
    fn test_profile_without_entitlements_is_rejected() {
        let profile = br#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict><key>Name</key><string>x</string></dict></plist>"#;
        assert!(matches!(
            entitlements_from_decoded_profile(profile),
            Err(Error::Sign(_))
        ));
    }
}
