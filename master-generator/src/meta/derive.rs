use crate::error::GeneratorError;
use crate::manifest::{Commit, Event};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use std::time::UNIX_EPOCH;

const COMMITS_FILE: &str = "commits.json";
const EVENT_FILE: &str = "event.json";
const ARCHIVE_FILE: &str = "latest.zip";

/// Author name of commits pushed by the release automation.
const AUTOMATION_AUTHOR: &str = "github-actions";

const SHORT_SHA_LENGTH: usize = 7;

/// Render the commit snapshot of a plugin directory as changelog text.
///
/// Yields an empty string if the plugin has no `commits.json`.
pub async fn generate_changelog(plugin_directory: &Path) -> Result<String, GeneratorError> {
    let path = plugin_directory.join(COMMITS_FILE);

    let Some(commits) = read_optional_json::<Vec<Commit>>(&path).await? else {
        return Ok(String::new());
    };

    Ok(render_changelog(&commits))
}

fn render_changelog(commits: &[Commit]) -> String {
    commits
        .iter()
        .filter(|commit| commit.commit.author.name != AUTOMATION_AUTHOR)
        .map(|commit| {
            let short_sha = match commit.sha.char_indices().nth(SHORT_SHA_LENGTH) {
                Some((end, _)) => &commit.sha[..end],
                None => commit.sha.as_str(),
            };
            let summary = commit.commit.message.lines().next().unwrap_or_default();

            format!("{short_sha}: {summary}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Repository URL recorded in the webhook event of a plugin directory.
///
/// Yields an empty string if the plugin has no `event.json`.
pub async fn detect_repository_url(plugin_directory: &Path) -> Result<String, GeneratorError> {
    let path = plugin_directory.join(EVENT_FILE);

    let event = read_optional_json::<Event>(&path).await?.unwrap_or_default();
    Ok(event.repository.html_url)
}

/// Modification time of the release archive in Unix epoch seconds, 0 without an archive.
pub async fn detect_last_update(plugin_directory: &Path) -> i64 {
    let path = plugin_directory.join(ARCHIVE_FILE);

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(v) => v,
        Err(err) if err.kind() == ErrorKind::NotFound => return 0,
        Err(err) => {
            tracing::warn!("Failed to inspect {}: {}", path.display(), err);
            return 0;
        }
    };

    let modified = match metadata.modified() {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!("No modification time for {}: {}", path.display(), err);
            return 0;
        }
    };

    match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// Use `preferred` unless it is empty, in which case `fallback` is awaited instead.
pub async fn first_non_empty(
    preferred: String,
    fallback: impl Future<Output = Result<String, GeneratorError>>,
) -> Result<String, GeneratorError> {
    if !preferred.is_empty() {
        return Ok(preferred);
    }

    fallback.await
}

async fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, GeneratorError> {
    let content = match tokio::fs::read(path).await {
        Ok(v) => v,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|source| GeneratorError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })
}
