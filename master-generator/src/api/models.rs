use serde::Deserialize;
use std::collections::HashMap;

/// Cumulative download counts keyed by plugin internal name.
///
/// A `null` body decodes as no counts at all, a `null` count as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<HashMap<String, Option<i64>>>")]
pub struct DownloadCounts(pub HashMap<String, i64>);

impl From<Option<HashMap<String, Option<i64>>>> for DownloadCounts {
    fn from(raw: Option<HashMap<String, Option<i64>>>) -> Self {
        Self(
            raw.unwrap_or_default()
                .into_iter()
                .map(|(name, count)| (name, count.unwrap_or(0)))
                .collect(),
        )
    }
}

impl DownloadCounts {
    /// Count for a plugin, 0 when the service does not know it.
    pub fn count_for(&self, internal_name: &str) -> i64 {
        self.0.get(internal_name).copied().unwrap_or(0)
    }
}
