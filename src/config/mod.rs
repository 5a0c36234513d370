//! Package configuration (`Bundle.toml`).
//!
//! # Format
//!
//! ```toml
//! format_version = 3
//!
//! [apps.Demo]
//! product = "demo"
//! version = "1.0.0-$(COMMIT_HASH)"
//! identifier = "com.example.demo"
//! minimum_macos_version = "11.0"
//! ```
//!
//! Older files (`Bundle.json`, or `Bundle.toml` without `format_version`)
//! are migrated to this format by [`migrate`], which keeps a `.bak` copy of
//! the original.

mod app;
mod error;
pub mod expressions;
mod migration;
mod session;
mod store;

pub use app::{AppConfiguration, CURRENT_FORMAT_VERSION, PackageConfiguration, ResolvedApp};
pub use error::{ConfigError, DecodeFailure, Result};
pub use expressions::EvaluationError;
pub use migration::{Migration, migrate};
pub use session::Session;
pub use store::{
    CONFIGURATION_FILE_NAME, FormatVersion, OLD_CONFIGURATION_FILE_NAME, configuration_file_path,
    file_format, from_toml_str, load, resolve_app, save,
};
