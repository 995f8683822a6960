//! Redirect manifest: the `name → url` map handed to the storefront router.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

/// Write `urls` as a pretty JSON object with sorted keys.
pub fn write(path: &Path, urls: &BTreeMap<String, String>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut body = serde_json::to_string_pretty(urls)?;
    body.push('\n');
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_sorted_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/redirects.json");
        let urls = BTreeMap::from([
            ("zeta".to_string(), "https://gw/z".to_string()),
            ("alpha".to_string(), "https://gw/a".to_string()),
        ]);

        write(&path, &urls).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            body,
            "{\n  \"alpha\": \"https://gw/a\",\n  \"zeta\": \"https://gw/z\"\n}\n"
        );
    }

    #[test]
    fn empty_map_is_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redirects.json");
        write(&path, &BTreeMap::new()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
