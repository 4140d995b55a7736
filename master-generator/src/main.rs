mod api;
mod args;
mod error;
mod manifest;
mod meta;

use clap::Parser as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use crate::args::{GeneratorArgs, GeneratorConfig};
use crate::error::GeneratorError;
use crate::meta::CatalogProcessor;

fn main() {
    let indicatif_layer = tracing_indicatif::IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_env(
            "PLUGIN_MASTER_LOG",
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let config = GeneratorConfig::from(GeneratorArgs::parse());

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build() {
        Ok(v) => v.block_on(async_main(config)),
        Err(err) => {
            tracing::error!("Failed to create tokio runtime: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        tracing::error!("Error: {}", err);

        let mut src = std::error::Error::source(&err);
        while let Some(err) = src {
            tracing::error!("-> Caused by: {}", err);
            src = err.source();
        }

        std::process::exit(1);
    }
}

async fn async_main(config: GeneratorConfig) -> Result<(), GeneratorError> {
    tracing::trace!("config = {:#?}", config);

    let processor = CatalogProcessor::new(&config)?;

    tracing::info!("Generating plugin catalog...");
    let summary = processor.generate_catalog().await?;

    tracing::info!("Done.");
    tracing::info!("Stable manifests: {}", summary.stable_manifests);
    tracing::info!("Testing manifests: {}", summary.testing_manifests);
    tracing::info!("Plugins in catalog: {}", summary.plugins);
    tracing::info!("Testing exclusive: {}", summary.testing_exclusive);

    Ok(())
}
