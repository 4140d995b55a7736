use crate::api::{DownloadCounts, DownloadStatisticsApi};
use crate::error::GeneratorError;
use crate::manifest::{Channel, PluginManifest};
use crate::meta::derive::{
    detect_last_update, detect_repository_url, first_non_empty, generate_changelog,
};
use indicatif::ProgressStyle;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use tracing::Instrument as _;
use tracing_indicatif::span_ext::IndicatifSpanExt as _;

/// Manifests of one channel keyed by internal name, remembering first-seen order.
#[derive(Debug, Default)]
struct ChannelIndex {
    order: Vec<String>,
    manifests: HashMap<String, PluginManifest>,
}

impl ChannelIndex {
    /// Index manifests, keeping only the first one seen for each internal name.
    fn build(channel: Channel, manifests: Vec<PluginManifest>) -> Self {
        let mut index = Self::default();

        for manifest in manifests {
            match index.manifests.entry(manifest.internal_name.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(
                        "Dropping duplicate {} manifest for {}",
                        channel,
                        manifest.internal_name
                    );
                }
                Entry::Vacant(entry) => {
                    index.order.push(manifest.internal_name.clone());
                    entry.insert(manifest);
                }
            }
        }

        index
    }

    fn get(&self, internal_name: &str) -> Option<&PluginManifest> {
        self.manifests.get(internal_name)
    }

    fn contains(&self, internal_name: &str) -> bool {
        self.manifests.contains_key(internal_name)
    }

    /// Manifests in first-seen order.
    fn iter(&self) -> impl Iterator<Item = (&str, &PluginManifest)> {
        self.order
            .iter()
            .filter_map(|name| self.manifests.get(name).map(|manifest| (name.as_str(), manifest)))
    }
}

/// Channels publishing a plugin, at least one of them.
#[derive(Debug, Clone, Copy)]
enum PluginSources<'a> {
    StableOnly(&'a PluginManifest),
    TestingOnly(&'a PluginManifest),
    Both {
        stable: &'a PluginManifest,
        testing: &'a PluginManifest,
    },
}

impl<'a> PluginSources<'a> {
    fn stable(self) -> Option<&'a PluginManifest> {
        match self {
            Self::StableOnly(stable) | Self::Both { stable, .. } => Some(stable),
            Self::TestingOnly(_) => None,
        }
    }

    fn testing(self) -> Option<&'a PluginManifest> {
        match self {
            Self::TestingOnly(testing) | Self::Both { testing, .. } => Some(testing),
            Self::StableOnly(_) => None,
        }
    }

    /// The testing manifest when there is one, the stable manifest otherwise.
    fn base(self) -> &'a PluginManifest {
        match self {
            Self::StableOnly(stable) => stable,
            Self::TestingOnly(testing) | Self::Both { testing, .. } => testing,
        }
    }
}

/// Every plugin once: stable ones in first-seen order followed by the testing-only ones.
fn plugin_sources<'a>(
    stable: &'a ChannelIndex,
    testing: &'a ChannelIndex,
) -> Vec<(&'a str, PluginSources<'a>)> {
    let mut sources = Vec::with_capacity(stable.order.len() + testing.order.len());

    for (name, manifest) in stable.iter() {
        let source = match testing.get(name) {
            Some(testing) => PluginSources::Both {
                stable: manifest,
                testing,
            },
            None => PluginSources::StableOnly(manifest),
        };
        sources.push((name, source));
    }

    for (name, manifest) in testing.iter() {
        if !stable.contains(name) {
            sources.push((name, PluginSources::TestingOnly(manifest)));
        }
    }

    sources
}

/// Reconciles the stable and testing channel into one manifest per plugin.
#[derive(Debug, Clone)]
pub struct ManifestMerger {
    plugins_root: PathBuf,
    hosting_domain: String,
    statistics: Option<DownloadStatisticsApi>,
}

impl ManifestMerger {
    /// Download counting is enabled exactly when a statistics client is given.
    pub fn new(
        plugins_root: impl Into<PathBuf>,
        hosting_domain: impl Into<String>,
        statistics: Option<DownloadStatisticsApi>,
    ) -> Self {
        Self {
            plugins_root: plugins_root.into(),
            hosting_domain: hosting_domain.into(),
            statistics,
        }
    }

    fn download_counter_enabled(&self) -> bool {
        self.statistics.is_some()
    }

    /// Name of the file download links point at.
    fn download_file_name(&self) -> &'static str {
        if self.download_counter_enabled() {
            "download"
        } else {
            "latest.zip"
        }
    }

    fn download_link(&self, channel: Channel, internal_name: &str) -> String {
        format!(
            "https://{}/plugins/{}/{}/{}",
            self.hosting_domain,
            channel,
            internal_name,
            self.download_file_name()
        )
    }

    /// Merge both channels. The result follows stable order first, then testing-only plugins.
    pub async fn merge(
        &self,
        stable: Vec<PluginManifest>,
        testing: Vec<PluginManifest>,
    ) -> Result<Vec<PluginManifest>, GeneratorError> {
        let stable = ChannelIndex::build(Channel::Stable, stable);
        let testing = ChannelIndex::build(Channel::Testing, testing);
        let sources = plugin_sources(&stable, &testing);

        let counts = match &self.statistics {
            Some(api) => {
                tracing::info!("Fetching download counts from {}", api.downloads_url());
                Some(api.fetch_download_counts().await?)
            }
            None => None,
        };

        let span = tracing::info_span!("merge_plugins", plugins = sources.len());
        span.pb_set_length(sources.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{wide_bar} {pos}/{len} {msg}") {
            span.pb_set_style(&style);
        }

        async {
            let mut merged = Vec::with_capacity(sources.len());

            for &(name, plugin) in &sources {
                tracing::Span::current().pb_set_message(name);

                let manifest = self.merge_plugin(name, plugin, counts.as_ref()).await?;
                merged.push(manifest);

                tracing::Span::current().pb_inc(1);
            }

            Ok::<_, GeneratorError>(merged)
        }
        .instrument(span)
        .await
    }

    #[tracing::instrument(skip(self, plugin, counts))]
    async fn merge_plugin(
        &self,
        name: &str,
        plugin: PluginSources<'_>,
        counts: Option<&DownloadCounts>,
    ) -> Result<PluginManifest, GeneratorError> {
        let mut manifest = plugin.base().clone();
        let stable = plugin.stable();
        let testing = plugin.testing();

        let stable_directory = Channel::Stable.plugin_directory(&self.plugins_root, name);
        let testing_directory = Channel::Testing.plugin_directory(&self.plugins_root, name);

        manifest.changelog = first_non_empty(
            generate_changelog(&testing_directory).await?,
            generate_changelog(&stable_directory),
        )
        .await?;

        manifest.repo_url = first_non_empty(
            detect_repository_url(&testing_directory).await?,
            detect_repository_url(&stable_directory),
        )
        .await?;

        manifest.is_testing_exclusive = stable.is_none();
        manifest.last_update = detect_last_update(&stable_directory)
            .await
            .max(detect_last_update(&testing_directory).await);

        if let Some(stable) = stable {
            manifest.assembly_version = stable.assembly_version.clone();
            manifest.download_link_install = self.download_link(Channel::Stable, name);
        }

        if let Some(testing) = testing {
            manifest.testing_assembly_version = testing.assembly_version.clone();
            manifest.download_link_testing = self.download_link(Channel::Testing, name);
        }

        if let Some(counts) = counts {
            manifest.download_count = counts.count_for(name);
        }

        tracing::trace!(
            "Merged {} (stable: {}, testing: {})",
            name,
            manifest.assembly_version,
            manifest.testing_assembly_version
        );

        Ok(manifest)
    }
}
