//! `$(VARIABLE)` expansion in configuration values.
//!
//! Supported variables:
//!
//! | Variable | Value |
//! |----------|-------|
//! | `$(VERSION)` | the app's `version` (not available inside `version` itself) |
//! | `$(PRODUCT)` | the app's `product` |
//! | `$(IDENTIFIER)` | the app's `identifier` |
//! | `$(COMMIT_HASH)` | `git rev-parse --short HEAD` in the package directory |

use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

use super::app::AppConfiguration;

/// Errors raised while expanding expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// `$(NAME)` with a name that is not a known variable
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// `$(` without a closing parenthesis
    #[error("unterminated expression in '{0}'")]
    UnterminatedExpression(String),

    /// `$(COMMIT_HASH)` was used but git could not provide one
    #[error("commit hash unavailable: {0}")]
    CommitHashUnavailable(String),
}

/// Source of variable values.
pub trait Variables {
    /// Returns the value of `name`, or an error if it is unknown or unavailable.
    fn value(&mut self, name: &str) -> Result<String, EvaluationError>;
}

/// Replaces every `$(NAME)` in `template` with its value.
pub fn evaluate(template: &str, variables: &mut impl Variables) -> Result<String, EvaluationError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("$(") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find(')')
            .ok_or_else(|| EvaluationError::UnterminatedExpression(template.to_string()))?;
        output.push_str(&variables.value(after[..end].trim())?);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Variables derived from an app configuration.
///
/// The commit hash is looked up before evaluation starts, and only when an
/// expression refers to it.
pub struct AppVariables {
    version: Option<String>,
    product: String,
    identifier: String,
    commit_hash: Option<String>,
}

impl AppVariables {
    /// Variables for evaluating `app`. `version` is `None` while the version
    /// itself is being evaluated.
    pub fn new(app: &AppConfiguration, version: Option<String>, commit_hash: Option<String>) -> Self {
        Self {
            version,
            product: app.product.clone(),
            identifier: app.identifier.clone(),
            commit_hash,
        }
    }
}

impl Variables for AppVariables {
    fn value(&mut self, name: &str) -> Result<String, EvaluationError> {
        match name {
            "VERSION" => self
                .version
                .clone()
                .ok_or_else(|| EvaluationError::UnknownVariable(name.to_string())),
            "PRODUCT" => Ok(self.product.clone()),
            "IDENTIFIER" => Ok(self.identifier.clone()),
            "COMMIT_HASH" => self.commit_hash.clone().ok_or_else(|| {
                EvaluationError::CommitHashUnavailable("not looked up".to_string())
            }),
            other => Err(EvaluationError::UnknownVariable(other.to_string())),
        }
    }
}

/// Records the names an expression refers to.
#[derive(Default)]
struct ReferencedNames(Vec<String>);

impl Variables for ReferencedNames {
    fn value(&mut self, name: &str) -> Result<String, EvaluationError> {
        self.0.push(name.to_string());
        Ok(String::new())
    }
}

/// Whether any expression in `app` refers to `name`.
fn references(app: &AppConfiguration, name: &str) -> bool {
    let mut names = ReferencedNames::default();
    let _ = evaluate(&app.version, &mut names);
    for value in app.plist.values() {
        let _ = evaluate_value(&mut value.clone(), &mut names);
    }
    names.0.iter().any(|used| used == name)
}

/// Runs `git rev-parse --short HEAD` in `package_directory`.
pub async fn commit_hash(package_directory: &Path) -> Result<String, EvaluationError> {
    let output = Command::new("git")
        .current_dir(package_directory)
        .args(["rev-parse", "--short", "HEAD"])
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| EvaluationError::CommitHashUnavailable(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        return Err(EvaluationError::CommitHashUnavailable(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    log::debug!("Resolved $(COMMIT_HASH) to {hash}");
    Ok(hash)
}

/// Expands expressions in the version and every string plist value of `app`.
pub async fn evaluate_app(
    app: &AppConfiguration,
    package_directory: &Path,
) -> Result<AppConfiguration, EvaluationError> {
    let commit_hash = if references(app, "COMMIT_HASH") {
        Some(commit_hash(package_directory).await?)
    } else {
        None
    };

    let mut evaluated = app.clone();

    let mut variables = AppVariables::new(app, None, commit_hash);
    evaluated.version = evaluate(&app.version, &mut variables)?;

    variables.version = Some(evaluated.version.clone());
    for value in evaluated.plist.values_mut() {
        evaluate_value(value, &mut variables)?;
    }

    Ok(evaluated)
}

fn evaluate_value(value: &mut toml::Value, variables: &mut impl Variables) -> Result<(), EvaluationError> {
    match value {
        toml::Value::String(s) => *s = evaluate(s, variables)?,
        toml::Value::Array(items) => {
            for item in items {
                evaluate_value(item, variables)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                evaluate_value(item, variables)?;
            }
        }
        toml::Value::Integer(_)
        | toml::Value::Float(_)
        | toml::Value::Boolean(_)
        | toml::Value::Datetime(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<&'static str, &'static str>);

    impl Variables for Fixed {
        fn value(&mut self, name: &str) -> Result<String, EvaluationError> {
            self.0
                .get(name)
                .map(|v| v.to_string())
                .ok_or_else(|| EvaluationError::UnknownVariable(name.to_string()))
        }
    }

    fn vars() -> Fixed {
        Fixed(HashMap::from([("VERSION", "1.2.0"), ("PRODUCT", "demo")]))
    }

    #[test]
    fn test_plain_string_is_unchanged() {
        assert_eq!(evaluate("1.0.0", &mut vars()).unwrap(), "1.0.0");
    }

    #[test]
    fn test_substitutes_variables() {
        assert_eq!(
            evaluate("$(PRODUCT) v$(VERSION) ($( VERSION ))", &mut vars()).unwrap(),
            "demo v1.2.0 (1.2.0)"
        );
    }

    #[test]
    fn test_unknown_variable() {
        assert_eq!(
            evaluate("$(NOPE)", &mut vars()),
            Err(EvaluationError::UnknownVariable("NOPE".into()))
        );
    }

    #[test]
    fn test_unterminated_expression() {
        assert!(matches!(
            evaluate("1.0-$(VERSION", &mut vars()),
            Err(EvaluationError::UnterminatedExpression(_))
        ));
    }

    fn app(version: &str) -> AppConfiguration {
        AppConfiguration {
            product: "demo".into(),
            version: version.into(),
            identifier: "com.example.demo".into(),
            category: None,
            icon: None,
            minimum_macos_version: None,
            minimum_ios_version: None,
            plist: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_version_cannot_reference_itself() {
        let app = app("$(VERSION)");
        assert_eq!(
            evaluate_app(&app, Path::new(".")).await,
            Err(EvaluationError::UnknownVariable("VERSION".into()))
        );
    }

    #[tokio::test]
    async fn test_evaluates_nested_plist_values() {
        let mut app = app("2.0");
        app.plist.insert(
            "Nested".into(),
            toml::Value::Array(vec![toml::Value::String("$(IDENTIFIER)@$(VERSION)".into())]),
        );
        let mut table = toml::Table::new();
        table.insert("Owner".into(), toml::Value::String("$(PRODUCT)".into()));
        app.plist.insert("Table".into(), toml::Value::Table(table));

        let evaluated = evaluate_app(&app, Path::new(".")).await.unwrap();
        assert_eq!(
            evaluated.plist["Nested"],
            toml::Value::Array(vec![toml::Value::String("com.example.demo@2.0".into())])
        );
        assert_eq!(
            evaluated.plist["Table"].get("Owner").and_then(|v| v.as_str()),
            Some("demo")
        );
    }

    #[test]
    fn test_references_finds_commit_hash() {
        assert!(references(&app("1.0-$( COMMIT_HASH )"), "COMMIT_HASH"));
        assert!(!references(&app("1.0-$(PRODUCT)"), "COMMIT_HASH"));

        let mut nested = app("1.0");
        nested.plist.insert(
            "Build".into(),
            toml::Value::Array(vec![toml::Value::String("$(COMMIT_HASH)".into())]),
        );
        assert!(references(&nested, "COMMIT_HASH"));
    }

    #[tokio::test]
    async fn test_commit_hash_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            evaluate_app(&app("1.0-$(COMMIT_HASH)"), dir.path()).await,
            Err(EvaluationError::CommitHashUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_git_not_needed_without_commit_hash() {
        let dir = tempfile::tempdir().unwrap();
        let evaluated = evaluate_app(&app("1.0-$(PRODUCT)"), dir.path()).await.unwrap();
        assert_eq!(evaluated.version, "1.0-demo");
    }
}
