#[cfg(test)]
mod tests {
    use std::path::Path;

    use assert_cmd::Command;
    use predicates::prelude::*;

    const BUNDLE_TOML: &str = r#"
format_version = 3

[apps.Demo]
product = "demo"
version = "1.0.0"
identifier = "com.example.demo"
"#;

    const V2: &str = r#"
[apps.Demo]
product = "demo"
version = "0.4.0"
bundle_identifier = "com.example.demo"
"#;

    fn bundler() -> Command {
        Command::cargo_bin("kodegen_bundler_app").unwrap()
    }

    fn package(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Bundle.toml"), contents).unwrap();
        dir
    }

    fn write_executable(products: &Path) {
        std::fs::create_dir_all(products).unwrap();
        std::fs::write(products.join("demo"), b"#!/bin/sh\necho demo\n").unwrap();
    }

    #[test]
    fn test_help_lists_commands() {
        bundler()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("bundle"))
            .stdout(predicate::str::contains("migrate"))
            .stdout(predicate::str::contains("list-identities"));
    }

    #[test]
    fn test_codesign_without_identity_fails_validation() {
        let dir = package(BUNDLE_TOML);

        bundler()
            .arg("bundle")
            .arg("--package-directory")
            .arg(dir.path())
            .arg("--codesign")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--identity"));

        assert!(!dir.path().join("target").exists());
    }

    #[test]
    fn test_missing_configuration_fails() {
        let dir = tempfile::tempdir().unwrap();

        bundler()
            .arg("bundle")
            .arg("--package-directory")
            .arg(dir.path())
            .arg("--skip-build")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Bundle.toml"));
    }

    #[test]
    fn test_missing_package_directory_fails() {
        let dir = tempfile::tempdir().unwrap();

        bundler()
            .arg("bundle")
            .arg("--package-directory")
            .arg(dir.path().join("nope"))
            .assert()
            .code(1);
    }

    #[test]
    fn test_bundle_prebuilt_product() {
        let dir = package(BUNDLE_TOML);
        let products = dir.path().join("products");
        let output = dir.path().join("out");
        write_executable(&products);

        bundler()
            .arg("bundle")
            .arg("--package-directory")
            .arg(dir.path())
            .arg("--skip-build")
            .arg("--products-directory")
            .arg(&products)
            .arg("--output-directory")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("Demo.app"));

        assert!(output.join("Demo.app/Contents/MacOS/demo").is_file());
        assert!(output.join("Demo.app/Contents/Info.plist").is_file());
    }

    #[test]
    fn test_bundle_without_executable_fails_in_bundle_stage() {
        let dir = package(BUNDLE_TOML);
        let products = dir.path().join("products");
        std::fs::create_dir_all(&products).unwrap();

        bundler()
            .arg("bundle")
            .arg("--package-directory")
            .arg(dir.path())
            .arg("--skip-build")
            .arg("--products-directory")
            .arg(&products)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("bundle stage failed"));
    }

    #[test]
    fn test_migrate_v2_configuration() {
        let dir = package(V2);

        bundler()
            .arg("migrate")
            .arg("--package-directory")
            .arg(dir.path())
            .assert()
            .success();

        let backup = std::fs::read_to_string(dir.path().join("Bundle.toml.bak")).unwrap();
        assert_eq!(backup, V2);
        let migrated = std::fs::read_to_string(dir.path().join("Bundle.toml")).unwrap();
        assert!(migrated.contains("format_version = 3"));
    }

    #[test]
    fn test_migrate_current_configuration_is_noop() {
        let dir = package(BUNDLE_TOML);

        bundler()
            .arg("migrate")
            .arg("--package-directory")
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("already"));

        assert!(!dir.path().join("Bundle.toml.bak").exists());
    }

    #[test]
    fn test_migrate_without_configuration_fails() {
        let dir = tempfile::tempdir().unwrap();

        bundler()
            .arg("migrate")
            .arg("--package-directory")
            .arg(dir.path())
            .assert()
            .code(1);
    }

    #[test]
    fn test_migrate_override_does_not_replace_existing_configuration() {
        let dir = package(BUNDLE_TOML);
        let legacy = dir.path().join("Bundle.json");
        std::fs::write(
            &legacy,
            r#"{"target": "Old", "bundleIdentifier": "com.example.old", "versionString": "0.1"}"#,
        )
        .unwrap();

        bundler()
            .arg("migrate")
            .arg("--package-directory")
            .arg(dir.path())
            .arg("--configuration-file-override")
            .arg(&legacy)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("already exists"));

        let kept = std::fs::read_to_string(dir.path().join("Bundle.toml")).unwrap();
        assert_eq!(kept, BUNDLE_TOML);
        assert!(legacy.is_file());
    }
}
