//! Projection of collection state into card views, and the surfaces those
//! views are mounted on.

use std::io::Write;

use tracing::warn;
use url::Url;

use crate::collection::{CardKind, CollectionConfig};
use crate::state::{CardMode, CollectionState, DeleteState};
use crate::validator::QUERY_TOKEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconView {
    Glyph(String),
    Image(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Commit,
}

impl CardAction {
    pub fn glyph(&self) -> &'static str {
        match self {
            CardAction::Edit => "✏️",
            CardAction::Commit => "✔️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: String,
    pub kind: CardKind,
    pub name: String,
    /// Raw value while editing, formatted otherwise.
    pub url_field: String,
    /// Navigation target; only link cards in view mode have one.
    pub href: Option<String>,
    pub icon: IconView,
    pub editing: bool,
    pub action: CardAction,
    pub delete_armed: bool,
    pub dragging: bool,
    pub drop_target: bool,
}

/// One view per item, in collection order.
pub fn project(state: &CollectionState, config: &CollectionConfig) -> Vec<CardView> {
    state
        .items
        .iter()
        .map(|item| {
            let card = state.card(&item.id).cloned().unwrap_or_default();
            let (name, url_field, editing) = match card.mode {
                CardMode::Editing { name, url } => (name, url, true),
                CardMode::Viewing => (
                    item.name.clone(),
                    display_url(&item.url, config.card_kind),
                    false,
                ),
            };
            let href = match config.card_kind {
                CardKind::Link if !editing => Some(item.url.clone()),
                _ => None,
            };

            CardView {
                id: item.id.clone(),
                kind: config.card_kind,
                name,
                url_field,
                href,
                icon: icon_view(&item.icon),
                editing,
                action: if editing {
                    CardAction::Commit
                } else {
                    CardAction::Edit
                },
                delete_armed: card.delete == DeleteState::Armed,
                dragging: state.drag.source.as_deref() == Some(item.id.as_str()),
                drop_target: state.drag.over.as_deref() == Some(item.id.as_str()),
            }
        })
        .collect()
}

/// Hostname for link cards; the template with the token elided for panels.
pub fn display_url(url: &str, kind: CardKind) -> String {
    match kind {
        CardKind::Link => Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string()),
        CardKind::Panel => url.replace(QUERY_TOKEN, "…"),
    }
}

pub fn icon_view(icon: &str) -> IconView {
    match Url::parse(icon) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https" | "data") => {
            IconView::Image(icon.to_string())
        }
        _ => IconView::Glyph(icon.to_string()),
    }
}

/// Surface a collection renders into. The manager owns it exclusively.
pub trait Mount {
    /// Drop every mounted card and mount `cards` in their place.
    fn replace_children(&mut self, cards: &[CardView]);
    fn focus_name(&mut self, id: &str, select_all: bool);
    fn show_error(&mut self, message: &str);
}

/// Headless mount that records what it was asked to show.
#[derive(Debug, Default)]
pub struct MemoryMount {
    pub cards: Vec<CardView>,
    pub focused: Option<(String, bool)>,
    pub errors: Vec<String>,
    pub renders: usize,
}

impl MemoryMount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card(&self, id: &str) -> Option<&CardView> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.cards.iter().map(|card| card.id.as_str()).collect()
    }
}

impl Mount for MemoryMount {
    fn replace_children(&mut self, cards: &[CardView]) {
        self.cards = cards.to_vec();
        self.renders += 1;
    }

    fn focus_name(&mut self, id: &str, select_all: bool) {
        self.focused = Some((id.to_string(), select_all));
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

/// Numbered card list written to a terminal (or any writer).
pub struct TextMount<W: Write> {
    out: W,
    title: &'static str,
    cards: Vec<CardView>,
}

impl<W: Write> TextMount<W> {
    pub fn new(out: W, title: &'static str) -> Self {
        Self {
            out,
            title,
            cards: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Mount for TextMount<W> {
    fn replace_children(&mut self, cards: &[CardView]) {
        self.cards = cards.to_vec();
        if let Err(e) = write_cards(&mut self.out, self.title, cards) {
            warn!("⚠️  Failed to render {}: {}", self.title, e);
        }
    }

    fn focus_name(&mut self, id: &str, select_all: bool) {
        let Some(pos) = self.cards.iter().position(|card| card.id == id) else {
            return;
        };
        let hint = if select_all { " (name selected)" } else { "" };
        let _ = writeln!(
            self.out,
            "✎ Editing {} #{}{}",
            self.title,
            pos + 1,
            hint
        );
    }

    fn show_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "❌ {}", message);
    }
}

pub fn write_cards<W: Write>(
    out: &mut W,
    title: &str,
    cards: &[CardView],
) -> std::io::Result<()> {
    writeln!(out, "\n📌 {} ({})", title, cards.len())?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    if cards.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for (index, card) in cards.iter().enumerate() {
        let marker = if card.dragging {
            "⇕"
        } else if card.drop_target {
            "→"
        } else {
            " "
        };
        let icon = match &card.icon {
            IconView::Glyph(glyph) => glyph.as_str(),
            IconView::Image(_) => "🖼",
        };
        let delete = if card.delete_armed { "Confirm?" } else { "🗑" };
        writeln!(
            out,
            "{}{:>3}. {} {:<24} {}  [{}] [{}]",
            marker,
            index + 1,
            icon,
            card.name,
            card.url_field,
            card.action.glyph(),
            delete
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Item;
    use crate::state::{reduce, Command};

    fn sites_state() -> CollectionState {
        CollectionState::new(vec![
            Item {
                id: "1".to_string(),
                name: "GitHub".to_string(),
                url: "https://github.com/rust-lang".to_string(),
                icon: "https://github.com/favicon.ico".to_string(),
            },
            Item {
                id: "2".to_string(),
                name: "Docs".to_string(),
                url: "https://docs.rs".to_string(),
                icon: "📦".to_string(),
            },
        ])
    }

    #[test]
    fn test_view_mode_shows_hostname_and_href() {
        let views = project(&sites_state(), &CollectionConfig::sites());
        assert_eq!(views[0].url_field, "github.com");
        assert_eq!(views[0].href.as_deref(), Some("https://github.com/rust-lang"));
        assert_eq!(
            views[0].icon,
            IconView::Image("https://github.com/favicon.ico".to_string())
        );
        assert_eq!(views[1].icon, IconView::Glyph("📦".to_string()));
        assert_eq!(views[0].action, CardAction::Edit);
    }

    #[test]
    fn test_edit_mode_shows_raw_url_without_href() {
        let config = CollectionConfig::sites();
        let (state, _) = reduce(
            sites_state(),
            Command::StartEdit {
                id: "1".to_string(),
            },
            &config,
        );
        let views = project(&state, &config);
        assert!(views[0].editing);
        assert_eq!(views[0].url_field, "https://github.com/rust-lang");
        assert_eq!(views[0].href, None);
        assert_eq!(views[0].action.glyph(), "✔️");
    }

    #[test]
    fn test_engine_display_elides_placeholder() {
        assert_eq!(
            display_url("https://duckduckgo.com/?q={query}", CardKind::Panel),
            "https://duckduckgo.com/?q=…"
        );
        assert_eq!(display_url("not a url", CardKind::Link), "not a url");
    }

    #[test]
    fn test_text_mount_numbers_cards() {
        let views = project(&sites_state(), &CollectionConfig::sites());
        let mut mount = TextMount::new(Vec::new(), "Sites");
        mount.replace_children(&views);
        mount.focus_name("2", true);
        mount.show_error("Name cannot be empty");

        let text = String::from_utf8(mount.into_inner()).unwrap();
        assert!(text.contains("Sites (2)"));
        assert!(text.contains("  1. 🖼 GitHub"));
        assert!(text.contains("  2. 📦 Docs"));
        assert!(text.contains("✎ Editing Sites #2 (name selected)"));
        assert!(text.contains("❌ Name cannot be empty"));
    }
}
