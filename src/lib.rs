//! # kodegen_bundler_app
//!
//! Builds Rust executables and packages them as `.app` bundles for macOS,
//! iOS devices and the iOS simulator.
//!
//! ## Features
//!
//! - **Versioned configuration**: `Bundle.toml` with automatic, backed-up
//!   migration of older `Bundle.json` and unversioned files
//! - **Argument validation**: platform, architecture and signing flags are
//!   checked before any work starts
//! - **Universal builds**: per-architecture `cargo build` merged with `lipo`
//! - **Code signing**: `codesign` with entitlements from provisioning profiles
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_app bundle                       # host architecture, macOS
//! kodegen_bundler_app bundle --universal -c release
//! kodegen_bundler_app bundle --platform "iOS Simulator"
//! kodegen_bundler_app migrate                      # upgrade Bundle.json
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod build;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;

// Re-export main types for public API
pub use bundler::{BuildArchitecture, BundledApp, Bundler, Platform, PlatformKind};
pub use cli::Args;
pub use config::{ConfigError, PackageConfiguration, ResolvedApp, Session};
pub use error::{CliError, CommandError, Result};
pub use pipeline::{Pipeline, PipelineState, StageFailure, StageKind};
