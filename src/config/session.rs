//! Per-command configuration context.

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use super::app::ResolvedApp;
use super::error::{ConfigError, Result};
use super::expressions::evaluate_app;
use super::store;

/// Configuration inputs of one command execution.
///
/// The resolved app is loaded at most once per session; later calls reuse
/// it. Sessions are not shared between commands.
#[derive(Debug)]
pub struct Session {
    package_directory: PathBuf,
    configuration_file: Option<PathBuf>,
    app_name: Option<String>,
    resolved: OnceCell<ResolvedApp>,
}

impl Session {
    /// Creates a session for the package in `package_directory`.
    pub fn new(package_directory: impl Into<PathBuf>) -> Self {
        Self {
            package_directory: package_directory.into(),
            configuration_file: None,
            app_name: None,
            resolved: OnceCell::new(),
        }
    }

    /// Reads configuration from `path` instead of `Bundle.toml`.
    pub fn with_configuration_file(mut self, path: Option<PathBuf>) -> Self {
        self.configuration_file = path;
        self
    }

    /// Selects the app to resolve. `None` means "the only app".
    pub fn with_app_name(mut self, name: Option<String>) -> Self {
        self.app_name = name;
        self
    }

    /// Package directory of this session.
    pub fn package_directory(&self) -> &Path {
        &self.package_directory
    }

    /// Loads, resolves and evaluates the app configuration on first use.
    pub async fn resolved_app(&self) -> Result<&ResolvedApp> {
        self.resolved
            .get_or_try_init(|| async {
                let configuration =
                    store::load(&self.package_directory, self.configuration_file.as_deref()).await?;
                let app = store::resolve_app(self.app_name.as_deref(), &configuration)?;
                let configuration = evaluate_app(&app.configuration, &self.package_directory)
                    .await
                    .map_err(|source| ConfigError::FailedToEvaluateExpressions {
                        app: app.name.clone(),
                        source,
                    })?;

                log::debug!("Resolved app '{}' ({})", app.name, configuration.identifier);
                Ok::<_, ConfigError>(ResolvedApp {
                    name: app.name,
                    configuration,
                })
            })
            .await
    }
}
