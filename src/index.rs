//! Read-only search index over the collections, kept fresh by change
//! notifications.

use url::form_urlencoded;

use crate::collection::CollectionType;
use crate::items::Item;
use crate::validator::QUERY_TOKEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub source: CollectionType,
    pub name: String,
    pub url: String,
    pub icon: String,
}

#[derive(Debug, Default)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot held for `source`.
    pub fn refresh(&mut self, source: CollectionType, items: &[Item]) {
        self.entries.retain(|entry| entry.source != source);
        self.entries.extend(items.iter().map(|item| IndexEntry {
            source,
            name: item.name.clone(),
            url: item.url.clone(),
            icon: item.icon.clone(),
        }));
    }

    /// Case-insensitive substring match on name or url.
    pub fn lookup(&self, query: &str) -> Vec<&IndexEntry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| {
                entry.name.to_lowercase().contains(&query)
                    || entry.url.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn engines(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.source == CollectionType::Engines)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Substitute the form-encoded query into an engine template.
pub fn expand_query(template: &str, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    template.replace(QUERY_TOKEN, &encoded)
}
