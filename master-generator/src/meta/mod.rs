mod derive;
mod merge;
mod output;

pub use merge::ManifestMerger;
pub use output::write_catalog;

use crate::api::DownloadStatisticsApi;
use crate::args::GeneratorConfig;
use crate::error::GeneratorError;
use crate::manifest::{Channel, PluginManifest, extract_manifests};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub stable_manifests: usize,
    pub testing_manifests: usize,
    pub plugins: usize,
    pub testing_exclusive: usize,
}

/// Runs one full catalog generation: extract both channels, merge, write.
pub struct CatalogProcessor {
    plugins_root: PathBuf,
    output: PathBuf,
    merger: ManifestMerger,
}

impl CatalogProcessor {
    /// Prepare the processor.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let statistics = if config.enable_download_counter {
            Some(DownloadStatisticsApi::new(&config.hosting_domain)?)
        } else {
            tracing::debug!("Download counter disabled");
            None
        };

        let merger = ManifestMerger::new(
            config.plugins_directory.clone(),
            config.hosting_domain.clone(),
            statistics,
        );

        Ok(Self {
            plugins_root: config.plugins_directory.clone(),
            output: config.output.clone(),
            merger,
        })
    }

    pub async fn generate_catalog(&self) -> Result<CatalogSummary, GeneratorError> {
        let stable = Self::extract(&self.plugins_root, Channel::Stable).await?;
        let testing = Self::extract(&self.plugins_root, Channel::Testing).await?;

        tracing::info!(
            "Found {} stable and {} testing manifests",
            stable.len(),
            testing.len()
        );

        let mut summary = CatalogSummary {
            stable_manifests: stable.len(),
            testing_manifests: testing.len(),
            plugins: 0,
            testing_exclusive: 0,
        };

        let manifests = self.merger.merge(stable, testing).await?;
        summary.plugins = manifests.len();
        summary.testing_exclusive = manifests.iter().filter(|m| m.is_testing_exclusive).count();

        tracing::info!("Writing catalog to {}", self.output.display());
        write_catalog(&self.output, manifests).await?;

        Ok(summary)
    }

    async fn extract(
        plugins_root: &Path,
        channel: Channel,
    ) -> Result<Vec<PluginManifest>, GeneratorError> {
        let plugins_root = plugins_root.to_path_buf();

        tokio::task::spawn_blocking(move || extract_manifests(&plugins_root, channel)).await?
    }
}
