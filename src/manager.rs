//! The card collection manager: owns one collection, its storage key, its
//! mount and its change-notification channel.

use std::collections::HashSet;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::collection::CollectionConfig;
use crate::items::{new_item_id, Item};
use crate::render::{project, Mount};
use crate::state::{reduce, Command, CollectionState, Effect, Field};
use crate::storage::{Storage, StorageError};
use crate::transfer::{self, Export, ImportError};
use crate::validator::ValidationError;

/// Emitted after every successful persist. Subscribers re-read the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionUpdated;

/// Timer work the manager cannot do itself; drained by whoever owns the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerRequest {
    ScheduleDisarm { id: String },
    CancelDisarm { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Armed,
    Removed,
    Ignored,
}

pub struct CardCollection<S: Storage, M: Mount> {
    config: CollectionConfig,
    state: CollectionState,
    storage: S,
    mount: M,
    notifier: broadcast::Sender<CollectionUpdated>,
    timer_requests: Vec<TimerRequest>,
}

impl<S: Storage, M: Mount> CardCollection<S, M> {
    pub fn new(config: CollectionConfig, storage: S, mount: M) -> Self {
        let (notifier, _) = broadcast::channel(16);
        let mut collection = Self {
            config,
            state: CollectionState::default(),
            storage,
            mount,
            notifier,
            timer_requests: Vec::new(),
        };
        collection.load();
        collection
    }

    /// Replace the in-memory collection with the persisted one (or the
    /// defaults) and re-render. Never fails.
    pub fn load(&mut self) {
        let items = read_persisted(&self.storage, &self.config);
        info!("📖 Loaded {} {} item(s)", items.len(), self.config.key);
        self.state = CollectionState::new(items);
        self.render();
    }

    /// Write the whole collection back. A failed write is logged and the
    /// in-memory state stays as it is.
    pub fn persist(&mut self) -> bool {
        let key = self.config.key;
        let written = serde_json::to_string(&self.state.items)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(key, &json));

        match written {
            Ok(()) => {
                debug!("💾 Persisted {} {} item(s)", self.state.items.len(), key);
                // No subscribers is fine.
                let _ = self.notifier.send(CollectionUpdated);
                true
            }
            Err(e) => {
                warn!("⚠️  Failed to persist {}: {}", key, e);
                false
            }
        }
    }

    pub fn render(&mut self) {
        let cards = project(&self.state, &self.config);
        self.mount.replace_children(&cards);
    }

    /// Run one command through the reducer and carry out its effects.
    pub fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        debug!("{} <- {:?}", self.config.key, command);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = reduce(state, command, &self.config);
        self.state = state;

        if effects.contains(&Effect::Persist) {
            self.persist();
        }
        self.render();

        for effect in &effects {
            match effect {
                Effect::Focus { id } => self.mount.focus_name(id, true),
                Effect::Invalid { error, .. } => self.mount.show_error(&error.to_string()),
                Effect::ScheduleDisarm { id } => self
                    .timer_requests
                    .push(TimerRequest::ScheduleDisarm { id: id.clone() }),
                Effect::CancelDisarm { id } => self
                    .timer_requests
                    .push(TimerRequest::CancelDisarm { id: id.clone() }),
                Effect::Persist | Effect::Imported { .. } => {}
            }
        }
        effects
    }

    pub fn add_item(&mut self) -> String {
        let id = new_item_id();
        self.dispatch(Command::Add { id: id.clone() });
        id
    }

    pub fn start_edit(&mut self, id: &str) {
        self.dispatch(Command::StartEdit { id: id.to_string() });
    }

    pub fn update_field(&mut self, id: &str, field: Field, value: &str) {
        self.dispatch(Command::UpdateField {
            id: id.to_string(),
            field,
            value: value.to_string(),
        });
    }

    pub fn commit_edit(&mut self, id: &str) -> Result<(), ValidationError> {
        let effects = self.dispatch(Command::CommitEdit { id: id.to_string() });
        match effects.into_iter().find_map(|effect| match effect {
            Effect::Invalid { error, .. } => Some(error),
            _ => None,
        }) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn cancel_edit(&mut self, id: &str) {
        self.dispatch(Command::CancelEdit { id: id.to_string() });
    }

    pub fn edit_icon(&mut self, id: &str, icon: &str) -> bool {
        let effects = self.dispatch(Command::EditIcon {
            id: id.to_string(),
            icon: icon.to_string(),
        });
        effects.contains(&Effect::Persist)
    }

    pub fn request_delete(&mut self, id: &str) -> DeleteOutcome {
        if self.state.position(id).is_none() {
            return DeleteOutcome::Ignored;
        }
        self.dispatch(Command::RequestDelete { id: id.to_string() });
        if self.state.position(id).is_none() {
            info!("🗑️  Removed {} item {}", self.config.key, id);
            DeleteOutcome::Removed
        } else {
            DeleteOutcome::Armed
        }
    }

    /// Confirm window elapsed.
    pub fn disarm(&mut self, id: &str) {
        self.dispatch(Command::Disarm { id: id.to_string() });
    }

    pub fn key_press(&mut self, id: &str) {
        self.dispatch(Command::KeyPress { id: id.to_string() });
    }

    pub fn reorder(&mut self, dragged: &str, target: &str) -> bool {
        let effects = self.dispatch(Command::Reorder {
            dragged: dragged.to_string(),
            target: target.to_string(),
        });
        effects.contains(&Effect::Persist)
    }

    pub fn drag_start(&mut self, id: &str) {
        self.dispatch(Command::DragStart { id: id.to_string() });
    }

    pub fn drag_enter(&mut self, id: &str) {
        self.dispatch(Command::DragEnter { id: id.to_string() });
    }

    pub fn drag_leave(&mut self, id: &str) {
        self.dispatch(Command::DragLeave { id: id.to_string() });
    }

    pub fn drop_on(&mut self, target: &str) -> bool {
        let effects = self.dispatch(Command::DropOn {
            target: target.to_string(),
        });
        effects.contains(&Effect::Persist)
    }

    pub fn drag_end(&mut self) {
        self.dispatch(Command::DragEnd);
    }

    /// Append every new entry of an import payload; returns how many landed.
    pub fn import_many(&mut self, raw: &str) -> Result<usize, ImportError> {
        let candidates = transfer::parse_import(raw)?;
        let offered = candidates.len();
        let effects = self.dispatch(Command::Import { items: candidates });
        let count = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Imported { count } => Some(*count),
                _ => None,
            })
            .unwrap_or(0);
        info!(
            "📥 Imported {} of {} {} candidate(s)",
            count, offered, self.config.key
        );
        Ok(count)
    }

    pub fn export_all(&self) -> serde_json::Result<Export> {
        transfer::export(&self.state.items)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionUpdated> {
        self.notifier.subscribe()
    }

    pub fn take_timer_requests(&mut self) -> Vec<TimerRequest> {
        std::mem::take(&mut self.timer_requests)
    }

    pub fn items(&self) -> &[Item] {
        &self.state.items
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Id of the card at a 1-based position.
    pub fn id_at(&self, position: usize) -> Option<String> {
        position
            .checked_sub(1)
            .and_then(|index| self.state.items.get(index))
            .map(|item| item.id.clone())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn mount(&self) -> &M {
        &self.mount
    }
}

fn read_persisted<S: Storage>(storage: &S, config: &CollectionConfig) -> Vec<Item> {
    let raw = match storage.get(config.key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No persisted {} yet, using defaults", config.key);
            return config.defaults();
        }
        Err(e) => {
            warn!("⚠️  Failed to read {}: {}, using defaults", config.key, e);
            return config.defaults();
        }
    };

    match serde_json::from_str::<Vec<Item>>(&raw) {
        Ok(items) if is_well_formed(&items) => items,
        Ok(_) => {
            warn!(
                "⚠️  Persisted {} has blank fields or duplicate ids, using defaults",
                config.key
            );
            config.defaults()
        }
        Err(e) => {
            warn!("⚠️  Persisted {} is corrupt ({}), using defaults", config.key, e);
            config.defaults()
        }
    }
}

fn is_well_formed(items: &[Item]) -> bool {
    let mut ids = HashSet::with_capacity(items.len());
    items.iter().all(|item| {
        !item.id.is_empty()
            && !item.name.trim().is_empty()
            && !item.url.trim().is_empty()
            && ids.insert(item.id.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemoryMount;
    use crate::storage::MemoryStorage;

    type Sites = CardCollection<MemoryStorage, MemoryMount>;

    fn sites_with(raw: &str) -> Sites {
        CardCollection::new(
            CollectionConfig::sites(),
            MemoryStorage::new().with_entry("sites", raw),
            MemoryMount::new(),
        )
    }

    const ABC: &str = r#"[
        {"id":"1","name":"A","url":"https://a.com","icon":"🌐"},
        {"id":"2","name":"B","url":"https://b.com","icon":"🌐"},
        {"id":"3","name":"C","url":"https://c.com","icon":"🌐"}
    ]"#;

    #[test]
    fn test_load_renders_persisted_items() {
        let mut sites = sites_with(ABC);
        assert_eq!(sites.mount().ids(), vec!["1", "2", "3"]);
        assert_eq!(sites.mount().renders, 1);

        // Every dispatch re-renders the full list, even a no-op.
        sites.cancel_edit("1");
        sites.reorder("3", "1");
        assert_eq!(sites.mount().renders, 3);
        assert_eq!(sites.mount().ids(), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_corrupt_data_falls_back_to_defaults() {
        let engines = CardCollection::new(
            CollectionConfig::engines(),
            MemoryStorage::new().with_entry("engines", "{not json"),
            MemoryMount::new(),
        );
        assert_eq!(engines.items().len(), CollectionConfig::engines().default_items.len());

        let dupes = sites_with(
            r#"[{"id":"1","name":"A","url":"https://a.com"},{"id":"1","name":"B","url":"https://b.com"}]"#,
        );
        assert!(dupes.items().is_empty());
    }

    #[test]
    fn test_persist_failure_keeps_memory_and_skips_notification() {
        let mut sites = sites_with(ABC);
        let mut rx = sites.subscribe();
        sites.storage_mut().set_fail_writes(true);

        assert!(sites.reorder("3", "1"));
        assert_eq!(sites.mount().ids(), vec!["3", "1", "2"]);
        assert!(rx.try_recv().is_err());
        assert_eq!(sites.storage().raw("sites"), Some(ABC));
    }

    #[test]
    fn test_persist_notifies_subscribers() {
        let mut sites = sites_with(ABC);
        let mut rx = sites.subscribe();
        sites.reorder("2", "1");
        assert_eq!(rx.try_recv().unwrap(), CollectionUpdated);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_add_focuses_new_card() {
        let mut sites = sites_with("[]");
        let id = sites.add_item();
        assert_eq!(sites.mount().focused, Some((id.clone(), true)));
        let card = sites.mount().card(&id).unwrap();
        assert!(card.editing);
        assert_eq!(card.name, "New Site");
    }

    #[test]
    fn test_delete_emits_timer_requests() {
        let mut sites = sites_with(ABC);
        assert_eq!(sites.request_delete("2"), DeleteOutcome::Armed);
        assert_eq!(
            sites.take_timer_requests(),
            vec![TimerRequest::ScheduleDisarm { id: "2".to_string() }]
        );
        assert_eq!(sites.request_delete("2"), DeleteOutcome::Removed);
        assert_eq!(
            sites.take_timer_requests(),
            vec![TimerRequest::CancelDisarm { id: "2".to_string() }]
        );
        assert_eq!(sites.request_delete("2"), DeleteOutcome::Ignored);
        assert_eq!(sites.mount().ids(), vec!["1", "3"]);
    }

    #[test]
    fn test_id_at_is_one_based() {
        let sites = sites_with(ABC);
        assert_eq!(sites.id_at(1).as_deref(), Some("1"));
        assert_eq!(sites.id_at(0), None);
        assert_eq!(sites.id_at(4), None);
    }
}
