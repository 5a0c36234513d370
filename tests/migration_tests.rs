#[cfg(test)]
mod tests {
    use std::path::Path;

    use kodegen_bundler_app::config::{
        ConfigError, DecodeFailure, FormatVersion, file_format, from_toml_str, load, migrate,
    };

    const CURRENT: &str = r#"
format_version = 3

[apps.Keep]
product = "keep"
version = "3.0.0"
identifier = "com.example.keep"
"#;

    const V1: &str = r#"{
    "target": "Demo",
    "bundleIdentifier": "com.example.demo",
    "versionString": "2.1.0",
    "buildNumber": 12,
    "category": "public.app-category.utilities"
}"#;

    const V2: &str = r#"
[apps.Demo]
product = "demo"
version = "0.4.0"
bundle_identifier = "com.example.demo"
minimum_macos_version = "12.0"
"#;

    async fn write(path: &Path, contents: &str) {
        tokio::fs::write(path, contents).await.unwrap();
    }

    async fn read(path: &Path) -> String {
        tokio::fs::read_to_string(path).await.unwrap()
    }

    #[tokio::test]
    async fn test_migrate_v1() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Bundle.json");
        write(&old, V1).await;

        let migration = migrate(&old).await.unwrap();

        assert_eq!(migration.from, FormatVersion::V1);
        assert_eq!(migration.path, dir.path().join("Bundle.toml"));
        assert_eq!(read(&migration.backup).await, V1);
        assert!(!old.exists());

        let migrated = from_toml_str(&read(&migration.path).await).unwrap();
        assert_eq!(migrated, migration.configuration);
        let app = &migrated.apps["Demo"];
        assert_eq!(app.version, "2.1.0");
        assert_eq!(app.category.as_deref(), Some("public.app-category.utilities"));
        assert_eq!(app.plist["CFBundleVersion"], toml::Value::String("12".into()));
    }

    #[tokio::test]
    async fn test_migrate_v2_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bundle.toml");
        write(&path, V2).await;

        let migration = migrate(&path).await.unwrap();

        assert_eq!(migration.from, FormatVersion::V2);
        assert_eq!(migration.path, path);
        assert_eq!(read(&dir.path().join("Bundle.toml.bak")).await, V2);

        let contents = read(&path).await;
        assert!(contents.contains("format_version = 3"));
        let app = &from_toml_str(&contents).unwrap().apps["Demo"];
        assert_eq!(app.identifier, "com.example.demo");
        assert_eq!(app.minimum_macos_version.as_deref(), Some("12.0"));
    }

    #[tokio::test]
    async fn test_missing_v2_identifier_is_reported_specifically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bundle.toml");
        let contents = "[apps.Demo]\nproduct = \"demo\"\nversion = \"1.0\"\n";
        write(&path, contents).await;

        let err = migrate(&path).await.unwrap_err();
        match &err {
            ConfigError::FailedToDeserializeV2Configuration(failure) => assert_eq!(
                failure,
                &DecodeFailure::MissingBundleIdentifier { app: "Demo".into() }
            ),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("no bundle identifier"));

        // Nothing was touched
        assert_eq!(read(&path).await, contents);
        assert!(!dir.path().join("Bundle.toml.bak").exists());
    }

    #[tokio::test]
    async fn test_missing_v2_field_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bundle.toml");
        write(
            &path,
            "[apps.Demo]\nproduct = \"demo\"\nbundle_identifier = \"com.example.demo\"\n",
        )
        .await;

        let err = migrate(&path).await.unwrap_err();
        assert_eq!(
            err.decode_failure().and_then(|f| f.missing_field_path()),
            Some("apps.Demo.version")
        );
    }

    #[tokio::test]
    async fn test_invalid_v1_json() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Bundle.json");
        write(&old, "{ not json").await;

        let err = migrate(&old).await.unwrap_err();
        assert!(matches!(err, ConfigError::FailedToDeserializeOldConfiguration(_)));
        assert!(old.exists());
        assert!(!dir.path().join("Bundle.toml").exists());
    }

    #[tokio::test]
    async fn test_unreadable_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = migrate(&dir.path().join("Bundle.json")).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FailedToReadContentsOfOldConfigurationFile { .. }
        ));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_original_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bundle.toml");
        write(&path, V2).await;
        // The migrated file is staged at Bundle.toml.tmp; a directory there makes the write fail
        tokio::fs::create_dir(dir.path().join("Bundle.toml.tmp"))
            .await
            .unwrap();

        let err = migrate(&path).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FailedToWriteToMigratedConfigurationFile { .. }
        ));

        // The original is untouched and the backup holds the same contents
        assert_eq!(read(&path).await, V2);
        assert_eq!(file_format(&path).await.unwrap(), FormatVersion::V2);
        assert_eq!(read(&dir.path().join("Bundle.toml.bak")).await, V2);
        assert!(!dir.path().join("Bundle.toml.tmp").is_file());
    }

    #[tokio::test]
    async fn test_v1_write_failure_keeps_original_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Bundle.json");
        write(&old, V1).await;
        // A directory at the temporary path makes the migrated write fail
        tokio::fs::create_dir(dir.path().join("Bundle.toml.tmp"))
            .await
            .unwrap();

        let err = migrate(&old).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FailedToWriteToMigratedConfigurationFile { .. }
        ));
        assert_eq!(read(&old).await, V1);
        assert_eq!(read(&dir.path().join("Bundle.json.bak")).await, V1);
        assert!(!dir.path().join("Bundle.toml").exists());
    }

    #[tokio::test]
    async fn test_backup_failure_leaves_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Bundle.json");
        write(&old, V1).await;
        // A directory where the backup should go makes the copy fail
        tokio::fs::create_dir(dir.path().join("Bundle.json.bak"))
            .await
            .unwrap();

        let err = migrate(&old).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FailedToCreateConfigurationBackup { .. }
        ));
        assert_eq!(read(&old).await, V1);
        assert!(!dir.path().join("Bundle.toml").exists());
    }

    #[tokio::test]
    async fn test_v1_migration_refuses_to_replace_existing_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Bundle.json");
        let current = dir.path().join("Bundle.toml");
        write(&old, V1).await;
        write(&current, CURRENT).await;

        let err = migrate(&old).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MigratedConfigurationFileExists { ref path, .. } if *path == current
        ));

        assert_eq!(read(&current).await, CURRENT);
        assert_eq!(read(&old).await, V1);
        assert!(!dir.path().join("Bundle.json.bak").exists());
        assert!(!dir.path().join("Bundle.toml.bak").exists());
    }

    #[tokio::test]
    async fn test_load_with_v1_override_keeps_existing_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("Legacy.json");
        let current = dir.path().join("Bundle.toml");
        write(&legacy, V1).await;
        write(&current, CURRENT).await;

        let err = load(dir.path(), Some(&legacy)).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MigratedConfigurationFileExists { .. }
        ));

        assert_eq!(read(&current).await, CURRENT);
        assert_eq!(read(&legacy).await, V1);
        let kept = load(dir.path(), None).await.unwrap();
        assert_eq!(kept.apps.keys().collect::<Vec<_>>(), vec!["Keep"]);
    }
}
