//! Import/export file format: a JSON array of `{name, url, icon?}` objects.

use chrono::Local;
use serde_json::Value;
use thiserror::Error;

use crate::items::{Item, PortableItem, DEFAULT_ICON};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Import file must contain a JSON array of items")]
    NotAnArray,
}

/// Serialized snapshot ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub count: usize,
    pub json: String,
}

/// Parse an import payload into candidate items with fresh ids.
///
/// Entries without a non-empty `name` and `url` string are dropped here;
/// de-duplication against the collection happens when the items are applied.
pub fn parse_import(raw: &str) -> Result<Vec<Item>, ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(entries) = value else {
        return Err(ImportError::NotAnArray);
    };
    Ok(entries.iter().filter_map(candidate).collect())
}

fn candidate(entry: &Value) -> Option<Item> {
    let name = entry.get("name")?.as_str()?.trim();
    let url = entry.get("url")?.as_str()?.trim();
    if name.is_empty() || url.is_empty() {
        return None;
    }
    let icon = entry
        .get("icon")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|icon| !icon.is_empty())
        .unwrap_or(DEFAULT_ICON);
    Some(Item::new(name, url, icon))
}

pub fn export(items: &[Item]) -> serde_json::Result<Export> {
    let portable: Vec<PortableItem> = items.iter().map(Item::to_portable).collect();
    Ok(Export {
        count: portable.len(),
        json: serde_json::to_string_pretty(&portable)?,
    })
}

pub fn default_export_filename(key: &str) -> String {
    format!("startpage-{}-{}.json", key, Local::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_entries_missing_fields() {
        let items = parse_import(
            r#"[
                {"name": "X", "url": "https://x.com"},
                {"name": "", "url": "https://y.com"},
                {"url": "https://z.com"},
                {"name": "N", "url": 42},
                "not an object"
            ]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "X");
        assert_eq!(items[0].icon, DEFAULT_ICON);
    }

    #[test]
    fn test_rejects_bad_payload_shape() {
        assert!(matches!(
            parse_import(r#"{"name": "X"}"#),
            Err(ImportError::NotAnArray)
        ));
        assert!(matches!(
            parse_import("not json"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_export_strips_ids() {
        let items = vec![Item::new("A", "https://a.com", "⭐")];
        let export = export(&items).unwrap();
        assert_eq!(export.count, 1);

        let value: Value = serde_json::from_str(&export.json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"name": "A", "url": "https://a.com", "icon": "⭐"}])
        );
    }

    #[test]
    fn test_export_of_empty_collection() {
        let export = export(&[]).unwrap();
        assert_eq!(export.count, 0);
        assert_eq!(export.json, "[]");
    }

    #[test]
    fn test_default_filename_uses_key() {
        let name = default_export_filename("engines");
        assert!(name.starts_with("startpage-engines-"));
        assert!(name.ends_with(".json"));
    }
}
