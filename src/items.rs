use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Glyph used when an item carries no icon of its own.
pub const DEFAULT_ICON: &str = "🌐";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

impl Item {
    pub fn new(name: &str, url: &str, icon: &str) -> Self {
        Self {
            id: new_item_id(),
            name: name.to_string(),
            url: url.to_string(),
            icon: icon.to_string(),
        }
    }

    pub fn with_id(id: String, template: &ItemTemplate) -> Self {
        Self {
            id,
            name: template.name.to_string(),
            url: template.url.to_string(),
            icon: template.icon.to_string(),
        }
    }

    pub fn to_portable(&self) -> PortableItem {
        PortableItem {
            name: self.name.clone(),
            url: self.url.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Static seed for default and placeholder items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTemplate {
    pub name: &'static str,
    pub url: &'static str,
    pub icon: &'static str,
}

/// Shape written to and read from export files. Carries no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableItem {
    pub name: String,
    pub url: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}
