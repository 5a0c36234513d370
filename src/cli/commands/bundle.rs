//! `bundle` command: resolve, validate, build and bundle.

use std::path::PathBuf;

use crate::build::{BuildBackend, BuildRequest, CargoBackend};
use crate::bundler::{
    AppSettings, BundledApp, Bundler, SettingsBuilder, SigningSettings, is_universal,
    resolve_architectures,
};
use crate::cli::args::BundleArgs;
use crate::cli::validation::validate;
use crate::cli::RuntimeConfig;
use crate::config::Session;
use crate::error::{CliError, CommandError, Result};
use crate::pipeline::{Pipeline, PipelineState, format_elapsed};

/// Execute the bundle command
pub(super) async fn execute_bundle(args: &BundleArgs, config: &RuntimeConfig) -> Result<i32> {
    let package_directory = &args.package.package_directory;
    if !package_directory.is_dir() {
        return Err(CliError::InvalidArguments {
            reason: format!(
                "package directory {} does not exist",
                package_directory.display()
            ),
        }
        .into());
    }

    let session = Session::new(package_directory)
        .with_configuration_file(args.package.configuration_file_override.clone())
        .with_app_name(args.app_name.clone());

    let app = session.resolved_app().await?;
    let platform = app.configuration.platform(args.platform);

    validate(args, &platform, args.skip_build, args.built_with_xcode)?;

    let architectures = resolve_architectures(&platform, &args.architectures, args.universal);
    config.verbose_println(&format!(
        "Bundling '{}' for {} ({}{})",
        app.name,
        platform,
        architectures
            .iter()
            .map(|arch| arch.name())
            .collect::<Vec<_>>()
            .join(", "),
        if is_universal(&args.architectures, args.universal) {
            ", universal"
        } else {
            ""
        }
    ));

    let request = BuildRequest {
        package_directory: package_directory.clone(),
        product: app.configuration.product.clone(),
        platform: platform.clone(),
        architectures: architectures.clone(),
        configuration: args.configuration,
    };

    let products_directory = args
        .products_directory
        .clone()
        .unwrap_or_else(|| request.products_directory());
    let output_directory = args
        .output_directory
        .clone()
        .unwrap_or_else(|| default_output_directory(&request));

    let signing = match (args.codesign, &args.identity) {
        (true, Some(identity)) => Some(SigningSettings {
            identity: identity.clone(),
            entitlements: args.entitlements.clone(),
        }),
        _ => None,
    };

    let settings = SettingsBuilder::new()
        .app(AppSettings::from_resolved(app, session.package_directory()))
        .platform(platform)
        .architectures(architectures)
        .products_directory(products_directory)
        .output_directory(output_directory)
        .signing(signing)
        .provisioning_profile(args.provisioning_profile.clone())
        .standalone(args.standalone)
        .built_with_xcode(args.built_with_xcode)
        .build()?;

    let backend = CargoBackend::new(config.is_verbose());
    let bundler = Bundler::new(settings);
    let mut bundled: Option<BundledApp> = None;

    let pipeline = Pipeline::compose(
        args.skip_build,
        backend.build(&request),
        async {
            bundled = Some(bundler.bundle().await?);
            Ok::<(), anyhow::Error>(())
        },
    )
    .on_transition(|state| match state {
        PipelineState::Building => config.progress_println("Building..."),
        PipelineState::Bundling => config.progress_println("Bundling..."),
        _ => {}
    });

    let report = tokio::select! {
        result = pipeline.run() => result?,
        Ok(()) = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, stopping the pipeline");
            return Err(CommandError::Interrupted);
        }
    };

    let bundled = bundled.ok_or_else(|| {
        crate::bundler::Error::GenericError("bundle stage finished without a bundle".to_string())
    })?;

    config.success_println(&format!(
        "Done in {}! Bundle at {}",
        format_elapsed(report.elapsed),
        bundled.path.display()
    ));
    config.verbose_println(&format!("SHA256: {}", bundled.checksum));

    Ok(0)
}

fn default_output_directory(request: &BuildRequest) -> PathBuf {
    request
        .target_directory()
        .join("bundle")
        .join(request.configuration.directory_name())
}
