use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Dalamud plugin manifest as published per channel and as emitted in the catalog.
///
/// Missing input fields take their zero value. On output, optional fields holding
/// their zero value are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PluginManifest {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub author: String,

    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub punchline: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub changelog: String,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub category_tags: Vec<String>,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub is_hide: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub internal_name: String,

    #[serde(deserialize_with = "null_as_default")]
    pub assembly_version: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub testing_assembly_version: String,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub is_testing_exclusive: bool,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub repo_url: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub applicable_version: String,

    #[serde(deserialize_with = "null_as_default")]
    pub dalamud_api_level: i64,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub download_count: i64,

    /// Unix epoch seconds.
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub last_update: i64,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub download_link_install: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub download_link_update: String,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub download_link_testing: String,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub load_required_state: i64,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub load_sync: bool,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub load_priority: i64,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub can_unload_async: bool,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub supports_profiles: bool,

    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub image_urls: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub icon_url: String,

    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_as_default")]
    pub accepts_feedback: bool,

    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub feedback_message: String,
}

/// Keys of a manifest as written in the catalog.
const FIELD_NAMES: [&str; 29] = [
    "Author",
    "Name",
    "Punchline",
    "Description",
    "Changelog",
    "Tags",
    "CategoryTags",
    "IsHide",
    "InternalName",
    "AssemblyVersion",
    "TestingAssemblyVersion",
    "IsTestingExclusive",
    "RepoUrl",
    "ApplicableVersion",
    "DalamudApiLevel",
    "DownloadCount",
    "LastUpdate",
    "DownloadLinkInstall",
    "DownloadLinkUpdate",
    "DownloadLinkTesting",
    "LoadRequiredState",
    "LoadSync",
    "LoadPriority",
    "CanUnloadAsync",
    "SupportsProfiles",
    "ImageUrls",
    "IconUrl",
    "AcceptsFeedback",
    "FeedbackMessage",
];

impl PluginManifest {
    /// Decode a published manifest.
    ///
    /// Keys match case-insensitively, an exact match taking precedence over a
    /// differently cased one.
    pub fn from_slice(content: &[u8]) -> serde_json::Result<Self> {
        match serde_json::from_slice::<Value>(content)? {
            Value::Object(object) => serde_json::from_value(Value::Object(canonicalize_keys(object))),
            other => serde_json::from_value(other),
        }
    }
}

fn canonicalize_keys(object: Map<String, Value>) -> Map<String, Value> {
    let mut canonical = Map::new();
    let mut folded = Vec::new();

    for (key, value) in object {
        match FIELD_NAMES.iter().find(|name| name.eq_ignore_ascii_case(&key)) {
            Some(name) if *name != key => folded.push((*name, value)),
            _ => {
                canonical.insert(key, value);
            }
        }
    }

    for (name, value) in folded {
        if !canonical.contains_key(name) {
            canonical.insert(name.to_owned(), value);
        }
    }

    canonical
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Read an explicit `null` as the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Entry of a `commits.json` snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Commit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sha: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub commit: CommitDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: CommitAuthor,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitAuthor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Webhook event snapshot stored as `event.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_default")]
    pub repository: EventRepository,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRepository {
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_and_unknown_fields_are_ignored() {
        let manifest: PluginManifest = serde_json::from_str(
            r#"{"InternalName": "Foo", "Name": "Foo Plugin", "SomethingNew": [1, 2]}"#,
        )
        .unwrap();

        assert_eq!(manifest.internal_name, "Foo");
        assert_eq!(manifest.name, "Foo Plugin");
        assert!(manifest.assembly_version.is_empty());
        assert_eq!(manifest.dalamud_api_level, 0);
    }

    #[test]
    fn zero_values_are_omitted_except_required_fields() {
        let manifest = PluginManifest {
            internal_name: "Foo".to_owned(),
            ..Default::default()
        };

        let value = serde_json::to_value(&manifest).unwrap();
        let object = value.as_object().unwrap();

        let mut keys = object.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["AssemblyVersion", "DalamudApiLevel", "InternalName", "Name"]
        );
    }

    #[test]
    fn url_fields_use_catalog_casing() {
        let manifest = PluginManifest {
            repo_url: "https://github.com/a/b".to_owned(),
            icon_url: "https://example.com/icon.png".to_owned(),
            image_urls: vec!["https://example.com/1.png".to_owned()],
            is_testing_exclusive: true,
            last_update: 1_700_000_000,
            ..Default::default()
        };

        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["RepoUrl"], "https://github.com/a/b");
        assert_eq!(value["IconUrl"], "https://example.com/icon.png");
        assert_eq!(value["ImageUrls"][0], "https://example.com/1.png");
        assert_eq!(value["IsTestingExclusive"], true);
        assert_eq!(value["LastUpdate"], 1_700_000_000);
    }

    #[test]
    fn null_fields_take_their_zero_value() {
        let manifest: PluginManifest = serde_json::from_str(
            r#"{
                "InternalName": "Foo",
                "AssemblyVersion": "1.0.0.0",
                "Punchline": null,
                "Tags": null,
                "IsHide": null,
                "DalamudApiLevel": null,
                "ImageUrls": null
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.internal_name, "Foo");
        assert!(manifest.punchline.is_empty());
        assert!(manifest.tags.is_empty());
        assert!(!manifest.is_hide);
        assert_eq!(manifest.dalamud_api_level, 0);
        assert!(manifest.image_urls.is_empty());
    }

    #[test]
    fn keys_match_case_insensitively() {
        let manifest = PluginManifest::from_slice(
            br#"{"internalName": "Foo", "assemblyversion": "1.2.3.4", "REPOURL": "https://github.com/a/b", "dalamudApiLevel": 9}"#,
        )
        .unwrap();

        assert_eq!(manifest.internal_name, "Foo");
        assert_eq!(manifest.assembly_version, "1.2.3.4");
        assert_eq!(manifest.repo_url, "https://github.com/a/b");
        assert_eq!(manifest.dalamud_api_level, 9);
    }

    #[test]
    fn exact_key_wins_over_folded_key() {
        let manifest =
            PluginManifest::from_slice(br#"{"internalname": "lower", "InternalName": "Exact"}"#)
                .unwrap();
        assert_eq!(manifest.internal_name, "Exact");

        let manifest =
            PluginManifest::from_slice(br#"{"InternalName": "Exact", "internalname": "lower"}"#)
                .unwrap();
        assert_eq!(manifest.internal_name, "Exact");
    }

    #[test]
    fn field_names_cover_every_catalog_key() {
        let manifest = PluginManifest {
            author: "a".to_owned(),
            name: "n".to_owned(),
            punchline: "p".to_owned(),
            description: "d".to_owned(),
            changelog: "c".to_owned(),
            tags: vec!["t".to_owned()],
            category_tags: vec!["c".to_owned()],
            is_hide: true,
            internal_name: "i".to_owned(),
            assembly_version: "1".to_owned(),
            testing_assembly_version: "2".to_owned(),
            is_testing_exclusive: true,
            repo_url: "r".to_owned(),
            applicable_version: "any".to_owned(),
            dalamud_api_level: 9,
            download_count: 1,
            last_update: 1,
            download_link_install: "i".to_owned(),
            download_link_update: "u".to_owned(),
            download_link_testing: "t".to_owned(),
            load_required_state: 1,
            load_sync: true,
            load_priority: 1,
            can_unload_async: true,
            supports_profiles: true,
            image_urls: vec!["i".to_owned()],
            icon_url: "i".to_owned(),
            accepts_feedback: true,
            feedback_message: "f".to_owned(),
        };

        let value = serde_json::to_value(&manifest).unwrap();
        let mut keys = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>();
        keys.sort_unstable();

        let mut expected = FIELD_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn null_commit_fields_are_empty() {
        let commits: Vec<Commit> = serde_json::from_str(
            r#"[{"sha": "abc", "commit": {"author": null, "message": null}}]"#,
        )
        .unwrap();
        assert!(commits[0].commit.author.name.is_empty());
        assert!(commits[0].commit.message.is_empty());

        let event: Event = serde_json::from_str(r#"{"repository": {"html_url": null}}"#).unwrap();
        assert!(event.repository.html_url.is_empty());
    }

    #[test]
    fn event_without_repository_yields_empty_url() {
        let event: Event = serde_json::from_str(r#"{"action": "published"}"#).unwrap();
        assert!(event.repository.html_url.is_empty());
    }
}
