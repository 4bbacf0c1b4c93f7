//! Per-collection behaviour. Sites and engines share one manager and differ
//! only by the values in [`CollectionConfig`].

use crate::items::{Item, ItemTemplate, DEFAULT_ICON};
use crate::validator::{validate_engine_url, validate_site_url, UrlValidator};

/// Which element a card is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    /// Clickable card that navigates to the item url.
    Link,
    /// Static card; the url is a template, not a destination.
    Panel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    Sites,
    Engines,
}

impl CollectionType {
    pub fn name(&self) -> &'static str {
        match self {
            CollectionType::Sites => "Sites",
            CollectionType::Engines => "Search Engines",
        }
    }

    pub fn config(&self) -> CollectionConfig {
        match self {
            CollectionType::Sites => CollectionConfig::sites(),
            CollectionType::Engines => CollectionConfig::engines(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollectionConfig {
    /// Storage namespace key.
    pub key: &'static str,
    pub validate_url: UrlValidator,
    pub default_items: &'static [ItemTemplate],
    pub placeholder: ItemTemplate,
    pub card_kind: CardKind,
}

const DEFAULT_ENGINES: &[ItemTemplate] = &[
    ItemTemplate {
        name: "Google",
        url: "https://www.google.com/search?q={query}",
        icon: "🔍",
    },
    ItemTemplate {
        name: "DuckDuckGo",
        url: "https://duckduckgo.com/?q={query}",
        icon: "🦆",
    },
    ItemTemplate {
        name: "Wikipedia",
        url: "https://en.wikipedia.org/wiki/Special:Search?search={query}",
        icon: "📚",
    },
];

impl CollectionConfig {
    pub fn sites() -> Self {
        Self {
            key: "sites",
            validate_url: validate_site_url,
            default_items: &[],
            placeholder: ItemTemplate {
                name: "New Site",
                url: "https://example.com",
                icon: DEFAULT_ICON,
            },
            card_kind: CardKind::Link,
        }
    }

    pub fn engines() -> Self {
        Self {
            key: "engines",
            validate_url: validate_engine_url,
            default_items: DEFAULT_ENGINES,
            placeholder: ItemTemplate {
                name: "New Engine",
                url: "https://example.com/search?q={query}",
                icon: "🔍",
            },
            card_kind: CardKind::Panel,
        }
    }

    /// Fresh default set with newly generated ids.
    pub fn defaults(&self) -> Vec<Item> {
        self.default_items
            .iter()
            .map(|t| Item::new(t.name, t.url, t.icon))
            .collect()
    }
}
