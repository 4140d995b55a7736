mod models;
pub use models::*;

use crate::error::GeneratorError;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Auxiliary snapshots stored next to manifests that must not be read as manifests.
const AUXILIARY_FILES: [&str; 2] = ["commits.json", "event.json"];

/// Publishing track of a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stable,
    Testing,
}

impl Channel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Testing => "testing",
        }
    }

    /// Root of this channel below the plugins directory.
    pub fn directory(self, plugins_root: &Path) -> PathBuf {
        plugins_root.join(self.as_str())
    }

    /// Directory holding the auxiliary files of a single plugin.
    pub fn plugin_directory(self, plugins_root: &Path, internal_name: &str) -> PathBuf {
        self.directory(plugins_root).join(internal_name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a file name denotes a plugin manifest.
pub fn is_manifest_file_name(file_name: &str) -> bool {
    file_name.ends_with(".json") && !AUXILIARY_FILES.contains(&file_name)
}

/// Load every manifest below the channel directory, in file name order.
///
/// A missing channel directory yields no manifests. Any unreadable or malformed
/// manifest fails the whole extraction.
#[tracing::instrument(skip(plugins_root))]
pub fn extract_manifests(
    plugins_root: &Path,
    channel: Channel,
) -> Result<Vec<PluginManifest>, GeneratorError> {
    let directory = channel.directory(plugins_root);
    if !directory.try_exists()? {
        tracing::debug!("No {} directory at {}", channel, directory.display());
        return Ok(Vec::new());
    }

    let mut manifests = Vec::new();

    for entry in WalkDir::new(&directory).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };

        if !is_manifest_file_name(file_name) {
            continue;
        }

        tracing::trace!("Reading manifest {}", entry.path().display());

        let content = std::fs::read(entry.path())?;
        let manifest = PluginManifest::from_slice(&content).map_err(|source| {
            GeneratorError::InvalidFile {
                path: entry.path().to_path_buf(),
                source,
            }
        })?;

        manifests.push(manifest);
    }

    tracing::debug!("Found {} {} manifests", manifests.len(), channel);

    Ok(manifests)
}
