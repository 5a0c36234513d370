//! Application bundle (.app) creation for macOS and iOS.

use crate::bundler::{
    error::{Context, Error, ErrorExt, Result},
    platform::Platform,
    settings::Settings,
    utils::fs,
};
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;

/// Directory layout of a bundle for a given platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    /// Directory holding `Info.plist`
    pub contents: PathBuf,
    /// Directory holding the executable
    pub executable: PathBuf,
    /// Directory holding resources such as the icon
    pub resources: PathBuf,
    /// Directory holding embedded dynamic libraries
    pub frameworks: PathBuf,
}

impl BundleLayout {
    /// Layout of the bundle at `bundle_path` for `platform`.
    pub fn new(platform: &Platform, bundle_path: &Path) -> Self {
        match platform {
            Platform::MacOs(_) => {
                let contents = bundle_path.join("Contents");
                Self {
                    executable: contents.join("MacOS"),
                    resources: contents.join("Resources"),
                    frameworks: contents.join("Frameworks"),
                    contents,
                }
            }
            Platform::Ios(_) | Platform::IosSimulator(_) => Self {
                contents: bundle_path.to_path_buf(),
                executable: bundle_path.to_path_buf(),
                resources: bundle_path.to_path_buf(),
                frameworks: bundle_path.join("Frameworks"),
            },
        }
    }
}

/// Bundles the built product as a `.app` bundle.
///
/// Creates the bundle structure with Info.plist, the executable, the icon,
/// optional dynamic libraries and provisioning profile, then signs it if
/// configured. Returns the path to the created bundle.
pub async fn bundle_project(settings: &Settings) -> Result<PathBuf> {
    let bundle_path = settings.bundle_path();
    let layout = BundleLayout::new(settings.platform(), &bundle_path);

    log::info!(
        "Bundling {}.app for {} at {}",
        settings.app().name,
        settings.platform(),
        bundle_path.display()
    );

    // Remove old bundle if it exists
    fs::remove_dir_all(&bundle_path).await?;

    for dir in [&layout.executable, &layout.resources] {
        tokio_fs::create_dir_all(dir)
            .await
            .fs_context("creating bundle directory", dir)?;
    }

    copy_executable(&layout, settings).await?;

    let icon_file = copy_icon(&layout, settings).await?;

    write_info_plist(&layout, icon_file.as_deref(), settings).await?;

    if let Platform::MacOs(_) = settings.platform() {
        let pkg_info = layout.contents.join("PkgInfo");
        tokio_fs::write(&pkg_info, b"APPL????")
            .await
            .fs_context("writing PkgInfo", &pkg_info)?;
    }

    if settings.standalone() {
        copy_dynamic_libraries(&layout, settings).await?;
    }

    if let Some(profile) = settings.provisioning_profile() {
        let embedded = match settings.platform() {
            Platform::MacOs(_) => layout.contents.join("embedded.provisionprofile"),
            _ => bundle_path.join("embedded.mobileprovision"),
        };
        fs::copy_file(profile, &embedded)
            .await
            .context("failed to embed provisioning profile")?;
        log::info!("Embedded provisioning profile {}", profile.display());
    }

    if settings.signing().is_some() {
        super::sign::sign_app(&bundle_path, settings).await?;
    }

    Ok(bundle_path)
}

/// Copies the executable into the bundle and marks it executable.
async fn copy_executable(layout: &BundleLayout, settings: &Settings) -> Result<()> {
    let src = settings.executable_path();
    if !src.is_file() {
        return Err(Error::ExecutableNotFound {
            product: settings.app().product.clone(),
            path: src,
        });
    }

    let dst = layout.executable.join(&settings.app().product);
    fs::copy_file(&src, &dst)
        .await
        .with_context(|| format!("failed to copy {} to .app bundle", settings.app().product))?;
    fs::set_executable(&dst).await
}

/// Copies the configured `.icns` icon, returning its file name in the bundle.
async fn copy_icon(layout: &BundleLayout, settings: &Settings) -> Result<Option<String>> {
    let Some(icon) = settings.app().icon.as_ref() else {
        return Ok(None);
    };

    if !icon.extension().is_some_and(|ext| ext == "icns") {
        log::warn!(
            "Skipping icon {}: only .icns icons are supported",
            icon.display()
        );
        return Ok(None);
    }

    let icon_file = format!("{}.icns", settings.app().name);
    fs::copy_file(icon, &layout.resources.join(&icon_file))
        .await
        .context("failed to copy app icon")?;
    Ok(Some(icon_file))
}

/// Copies `*.dylib` files next to the products into the bundle's Frameworks directory.
async fn copy_dynamic_libraries(layout: &BundleLayout, settings: &Settings) -> Result<()> {
    let source_dir = settings.dynamic_library_directory();
    if !source_dir.is_dir() {
        log::info!(
            "No dynamic library directory at {}, nothing to embed",
            source_dir.display()
        );
        return Ok(());
    }

    let mut entries = tokio_fs::read_dir(&source_dir)
        .await
        .fs_context("reading products directory", &source_dir)?;

    let mut copied = 0usize;
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading products directory", &source_dir)?
    {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "dylib") {
            fs::copy_file(&path, &layout.frameworks.join(entry.file_name())).await?;
            copied += 1;
        }
    }

    log::info!("Embedded {copied} dynamic librar{}", if copied == 1 { "y" } else { "ies" });
    Ok(())
}

async fn write_info_plist(
    layout: &BundleLayout,
    icon_file: Option<&str>,
    settings: &Settings,
) -> Result<()> {
    let plist_path = layout.contents.join("Info.plist");
    let mut buffer = Vec::new();
    plist::Value::Dictionary(info_plist(settings, icon_file)).to_writer_xml(&mut buffer)?;
    tokio_fs::write(&plist_path, buffer)
        .await
        .fs_context("writing Info.plist", &plist_path)
}

/// Generates the Info.plist dictionary for the bundle.
///
/// Extra entries from the app configuration are applied last and override
/// generated keys.
pub fn info_plist(settings: &Settings, icon_file: Option<&str>) -> plist::Dictionary {
    use plist::Value;

    let app = settings.app();
    let platform = settings.platform();
    let mut dict = plist::Dictionary::new();

    // Required bundle metadata
    dict.insert("CFBundleDevelopmentRegion".into(), "en".into());
    dict.insert("CFBundleDisplayName".into(), app.name.clone().into());
    dict.insert("CFBundleExecutable".into(), app.product.clone().into());
    dict.insert("CFBundleIdentifier".into(), app.identifier.clone().into());
    dict.insert("CFBundleInfoDictionaryVersion".into(), "6.0".into());
    dict.insert("CFBundleName".into(), app.name.clone().into());
    dict.insert("CFBundlePackageType".into(), "APPL".into());
    dict.insert("CFBundleShortVersionString".into(), app.version.clone().into());
    dict.insert("CFBundleVersion".into(), app.version.clone().into());
    dict.insert(
        "CFBundleSupportedPlatforms".into(),
        Value::Array(vec![platform.sdk_name().into()]),
    );

    if let Some(icon_file) = icon_file {
        dict.insert("CFBundleIconFile".into(), icon_file.into());
    }

    if let Some(category) = app.category.as_ref() {
        dict.insert("LSApplicationCategoryType".into(), category.clone().into());
    }

    match platform {
        Platform::MacOs(version) => {
            dict.insert("LSMinimumSystemVersion".into(), version.clone().into());
            dict.insert("NSHighResolutionCapable".into(), true.into());
        }
        Platform::Ios(version) | Platform::IosSimulator(version) => {
            dict.insert("MinimumOSVersion".into(), version.clone().into());
            dict.insert(
                "UIDeviceFamily".into(),
                Value::Array(vec![1i64.into(), 2i64.into()]),
            );
            dict.insert(
                "UILaunchScreen".into(),
                Value::Dictionary(plist::Dictionary::new()),
            );
            if !platform.is_simulator() {
                dict.insert(
                    "UIRequiredDeviceCapabilities".into(),
                    Value::Array(vec!["arm64".into()]),
                );
            }
        }
    }

    for (key, value) in &app.plist {
        dict.insert(key.clone(), toml_to_plist(value));
    }

    dict
}

/// Converts a TOML value from `Bundle.toml` into a plist value.
pub fn toml_to_plist(value: &toml::Value) -> plist::Value {
    match value {
        toml::Value::String(s) => plist::Value::String(s.clone()),
        toml::Value::Integer(i) => plist::Value::Integer((*i).into()),
        toml::Value::Float(f) => plist::Value::Real(*f),
        toml::Value::Boolean(b) => plist::Value::Boolean(*b),
        toml::Value::Datetime(dt) => plist::Value::String(dt.to_string()),
        toml::Value::Array(items) => plist::Value::Array(items.iter().map(toml_to_plist).collect()),
        toml::Value::Table(table) => plist::Value::Dictionary(
            table
                .iter()
                .map(|(key, value)| (key.clone(), toml_to_plist(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{AppSettings, SettingsBuilder};

    fn settings(platform: Platform) -> Settings {
        let mut app = AppSettings {
            name: "Demo".into(),
            product: "demo".into(),
            identifier: "com.example.demo".into(),
            version: "1.2.3".into(),
            ..Default::default()
        };
        app.plist
            .insert("CFBundleVersion".into(), toml::Value::String("42".into()));
        SettingsBuilder::new()
            .app(app)
            .platform(platform)
            .products_directory("/products")
            .output_directory("/out")
            .build()
            .unwrap()
    }

    #[test]
    fn test_macos_layout() {
        let layout = BundleLayout::new(&Platform::MacOs("11.0".into()), Path::new("/out/Demo.app"));
        assert_eq!(layout.executable, PathBuf::from("/out/Demo.app/Contents/MacOS"));
        assert_eq!(layout.contents, PathBuf::from("/out/Demo.app/Contents"));
    }

    #[test]
    fn test_ios_layout_is_flat() {
        let layout = BundleLayout::new(&Platform::Ios("16.0".into()), Path::new("/out/Demo.app"));
        assert_eq!(layout.executable, PathBuf::from("/out/Demo.app"));
        assert_eq!(layout.contents, PathBuf::from("/out/Demo.app"));
    }

    #[test]
    fn test_macos_info_plist() {
        let dict = info_plist(&settings(Platform::MacOs("11.0".into())), Some("Demo.icns"));
        assert_eq!(dict.get("CFBundleExecutable").and_then(|v| v.as_string()), Some("demo"));
        assert_eq!(
            dict.get("LSMinimumSystemVersion").and_then(|v| v.as_string()),
            Some("11.0")
        );
        assert_eq!(dict.get("CFBundleIconFile").and_then(|v| v.as_string()), Some("Demo.icns"));
        assert!(dict.get("MinimumOSVersion").is_none());
    }

    #[test]
    fn test_ios_info_plist() {
        let dict = info_plist(&settings(Platform::Ios("16.0".into())), None);
        assert_eq!(dict.get("MinimumOSVersion").and_then(|v| v.as_string()), Some("16.0"));
        assert!(dict.get("UIRequiredDeviceCapabilities").is_some());

        let sim = info_plist(&settings(Platform::IosSimulator("16.0".into())), None);
        assert!(sim.get("UIRequiredDeviceCapabilities").is_none());
    }

    #[test]
    fn test_extra_entries_override_generated_keys() {
        let dict = info_plist(&settings(Platform::MacOs("11.0".into())), None);
        assert_eq!(dict.get("CFBundleVersion").and_then(|v| v.as_string()), Some("42"));
    }
}
