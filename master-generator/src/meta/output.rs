use crate::error::GeneratorError;
use crate::manifest::PluginManifest;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Sort the reconciled manifests and write them as the catalog at `path`.
///
/// The previous catalog stays untouched unless the new one has been written completely.
pub async fn write_catalog(
    path: impl Into<PathBuf>,
    mut manifests: Vec<PluginManifest>,
) -> Result<(), GeneratorError> {
    let path = path.into();

    sort_catalog(&mut manifests);
    let content = escape_html(serde_json::to_string_pretty(&manifests)?);

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&directory).await?;

    tracing::debug!(
        "Writing {} manifests ({} bytes) to {}",
        manifests.len(),
        content.len(),
        path.display()
    );

    tokio::task::spawn_blocking(move || persist_atomically(&directory, &path, content.as_bytes()))
        .await??;

    Ok(())
}

/// Order manifests by internal name, comparing bytes.
pub fn sort_catalog(manifests: &mut [PluginManifest]) {
    manifests.sort_by(|a, b| a.internal_name.cmp(&b.internal_name));
}

/// Escape HTML-significant characters and line separators inside JSON strings as
/// `\uXXXX`, matching what the catalog consumers have always received.
///
/// None of these characters can appear in JSON outside of a string.
fn escape_html(json: String) -> String {
    const ESCAPED: [char; 5] = ['<', '>', '&', '\u{2028}', '\u{2029}'];

    if !json.contains(ESCAPED) {
        return json;
    }

    let mut escaped = String::with_capacity(json.len() + 16);
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }

    escaped
}

fn persist_atomically(directory: &Path, path: &Path, content: &[u8]) -> Result<(), GeneratorError> {
    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn manifest(internal_name: &str) -> PluginManifest {
        PluginManifest {
            internal_name: internal_name.to_owned(),
            name: internal_name.to_owned(),
            assembly_version: "1.0.0.0".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn sorts_case_sensitively() {
        let mut manifests = vec![manifest("foo"), manifest("Foo"), manifest("Bar"), manifest("_x")];
        sort_catalog(&mut manifests);

        let names = manifests
            .iter()
            .map(|m| m.internal_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Bar", "Foo", "_x", "foo"]);
    }

    #[tokio::test]
    async fn writes_sorted_indented_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("master.json");
        fs::write(&path, "stale content").unwrap();

        write_catalog(&path, vec![manifest("Foo"), manifest("Bar")])
            .await
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n  {\n    \"Name\": \"Bar\""));

        let written: Vec<PluginManifest> = serde_json::from_str(&content).unwrap();
        assert_eq!(written, vec![manifest("Bar"), manifest("Foo")]);
    }

    #[test]
    fn html_characters_are_unicode_escaped() {
        let escaped = escape_html("{\"Changelog\": \"a <b> & c\u{2028}\"}".to_owned());
        assert_eq!(
            escaped,
            r#"{"Changelog": "a \u003cb\u003e \u0026 c\u2028"}"#
        );

        let plain = r#"{"Name": "Foo"}"#.to_owned();
        assert_eq!(escape_html(plain.clone()), plain);
    }

    #[tokio::test]
    async fn written_catalog_escapes_html_but_decodes_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("master.json");

        let mut foo = manifest("Foo");
        foo.changelog = "abc1234: Fix <Tab> & hotkey".to_owned();

        write_catalog(&path, vec![foo.clone()]).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""abc1234: Fix \u003cTab\u003e \u0026 hotkey""#));

        let written: Vec<PluginManifest> = serde_json::from_str(&content).unwrap();
        assert_eq!(written, vec![foo]);
    }

    #[tokio::test]
    async fn empty_catalog_is_an_empty_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("master.json");

        write_catalog(&path, Vec::new()).await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
