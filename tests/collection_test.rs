// Behavioural tests for the card collection manager
// Run with: cargo test --test collection_test

use proptest::prelude::*;
use startpage::collection::CollectionConfig;
use startpage::manager::{CardCollection, DeleteOutcome};
use startpage::render::MemoryMount;
use startpage::state::Field;
use startpage::storage::MemoryStorage;
use startpage::validator::ValidationError;

type Manager = CardCollection<MemoryStorage, MemoryMount>;

fn sites(raw: Option<&str>) -> Manager {
    let storage = match raw {
        Some(raw) => MemoryStorage::new().with_entry("sites", raw),
        None => MemoryStorage::new(),
    };
    CardCollection::new(CollectionConfig::sites(), storage, MemoryMount::new())
}

fn names(manager: &Manager) -> Vec<String> {
    manager.items().iter().map(|i| i.name.clone()).collect()
}

fn rendered_ids(manager: &Manager) -> Vec<String> {
    manager.mount().cards.iter().map(|c| c.id.clone()).collect()
}

fn item_ids(manager: &Manager) -> Vec<String> {
    manager.items().iter().map(|i| i.id.clone()).collect()
}

const ABC: &str = r#"[
    {"id":"1","name":"A","url":"https://a.com","icon":"🌐"},
    {"id":"2","name":"B","url":"https://b.com","icon":"🌐"},
    {"id":"3","name":"C","url":"https://c.com","icon":"🌐"}
]"#;

#[test]
fn test_add_on_empty_collection() {
    let mut manager = sites(None);
    assert!(manager.items().is_empty());

    let id = manager.add_item();
    assert_eq!(manager.items().len(), 1);
    let item = &manager.items()[0];
    assert!(!item.name.is_empty());
    assert!(!item.url.is_empty());
    assert!(manager.state().is_editing(&id));
    assert_eq!(manager.mount().focused, Some((id, true)));
    assert!(manager.storage().raw("sites").is_some());
}

#[test]
fn test_commit_with_empty_name_is_rejected() {
    let mut manager = sites(Some(r#"[{"id":"1","name":"A","url":"https://a.com"}]"#));
    manager.start_edit("1");
    manager.update_field("1", Field::Name, "");

    assert_eq!(manager.commit_edit("1"), Err(ValidationError::EmptyName));
    assert_eq!(names(&manager), vec!["A"]);
    assert!(manager.state().is_editing("1"));
    assert_eq!(manager.mount().errors, vec!["Name cannot be empty".to_string()]);
    assert!(manager.mount().card("1").unwrap().editing);
}

#[test]
fn test_commit_success_returns_to_view_mode() {
    let mut manager = sites(Some(ABC));
    let mut rx = manager.subscribe();
    manager.start_edit("2");
    manager.update_field("2", Field::Url, "https://www.rust-lang.org/learn");
    manager.commit_edit("2").unwrap();

    let card = manager.mount().card("2").unwrap();
    assert!(!card.editing);
    assert_eq!(card.url_field, "www.rust-lang.org");
    assert!(rx.try_recv().is_ok());
}

#[test]
fn test_cancel_edit_is_noop_when_viewing() {
    let mut manager = sites(Some(ABC));
    let before = manager.mount().cards.clone();
    let mut rx = manager.subscribe();

    manager.cancel_edit("1");
    assert_eq!(manager.mount().cards, before);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_two_step_delete() {
    let mut manager = sites(Some(ABC));

    assert_eq!(manager.request_delete("2"), DeleteOutcome::Armed);
    assert_eq!(manager.items().len(), 3);
    assert!(manager.mount().card("2").unwrap().delete_armed);

    assert_eq!(manager.request_delete("2"), DeleteOutcome::Removed);
    assert_eq!(names(&manager), vec!["A", "C"]);
    assert_eq!(rendered_ids(&manager), item_ids(&manager));
}

#[test]
fn test_reorder_last_before_first() {
    let mut manager = sites(Some(ABC));
    assert!(manager.reorder("3", "1"));
    assert_eq!(names(&manager), vec!["C", "A", "B"]);
    assert_eq!(rendered_ids(&manager), vec!["3", "1", "2"]);

    let saved: Vec<serde_json::Value> =
        serde_json::from_str(manager.storage().raw("sites").unwrap()).unwrap();
    assert_eq!(saved[0]["name"], "C");
}

#[test]
fn test_drag_drop_flow_clears_visual_state() {
    let mut manager = sites(Some(ABC));
    manager.drag_start("1");
    manager.drag_enter("3");
    assert!(manager.mount().card("1").unwrap().dragging);
    assert!(manager.mount().card("3").unwrap().drop_target);

    assert!(manager.drop_on("3"));
    manager.drag_end();
    assert_eq!(names(&manager), vec!["B", "A", "C"]);
    assert!(manager.mount().cards.iter().all(|c| !c.dragging && !c.drop_target));
}

#[test]
fn test_import_skips_invalid_entries() {
    let mut manager = sites(None);
    let count = manager
        .import_many(r#"[{"name":"X","url":"https://x.com"},{"name":"","url":"https://y.com"}]"#)
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(names(&manager), vec!["X"]);
    assert_eq!(manager.items()[0].icon, "🌐");
}

#[test]
fn test_import_bad_shape_changes_nothing() {
    let mut manager = sites(Some(ABC));
    assert!(manager.import_many(r#"{"items": []}"#).is_err());
    assert!(manager.import_many("[{").is_err());
    assert_eq!(names(&manager), vec!["A", "B", "C"]);
}

#[test]
fn test_engine_validation() {
    let mut engines = CardCollection::new(
        CollectionConfig::engines(),
        MemoryStorage::new(),
        MemoryMount::new(),
    );
    let id = engines.add_item();
    engines.update_field(&id, Field::Url, "https://example.com/search?q=test");
    assert_eq!(engines.commit_edit(&id), Err(ValidationError::MissingPlaceholder));

    engines.update_field(&id, Field::Url, "https://example.com/search?q={query}");
    assert_eq!(engines.commit_edit(&id), Ok(()));
    assert_eq!(
        engines.mount().card(&id).unwrap().url_field,
        "https://example.com/search?q=…"
    );
}

#[test]
fn test_icon_edit_persists_without_commit() {
    let mut manager = sites(Some(ABC));
    manager.start_edit("1");
    manager.update_field("1", Field::Name, "Draft");
    assert!(manager.edit_icon("1", "https://a.com/favicon.png"));

    let saved = manager.storage().raw("sites").unwrap();
    assert!(saved.contains("favicon.png"));
    assert!(!saved.contains("Draft"));
    assert!(manager.state().is_editing("1"));
}

#[test]
fn test_blank_icon_edit_is_ignored() {
    let mut manager = sites(Some(ABC));
    manager.start_edit("1");
    let mut rx = manager.subscribe();

    assert!(!manager.edit_icon("1", "   "));
    assert!(rx.try_recv().is_err());
    assert_eq!(manager.items()[0].icon, "🌐");
    assert_eq!(manager.storage().raw("sites"), Some(ABC));
}

proptest! {
    /// Exporting and importing into an empty collection keeps every tuple.
    #[test]
    fn prop_export_import_round_trip(
        entries in prop::collection::vec(
            ("[A-Za-z0-9]{1,12}", "[a-z0-9]{0,8}", "[a-z]{1,3}"),
            1..12,
        )
    ) {
        let mut source = sites(None);
        let payload: Vec<serde_json::Value> = entries
            .iter()
            .enumerate()
            .map(|(i, (name, path, icon))| serde_json::json!({
                "name": name,
                "url": format!("https://site{}.example/{}", i, path),
                "icon": icon,
            }))
            .collect();
        source.import_many(&serde_json::to_string(&payload).unwrap()).unwrap();

        let export = source.export_all().unwrap();
        prop_assert_eq!(export.count, entries.len());

        let mut target = sites(None);
        let count = target.import_many(&export.json).unwrap();
        prop_assert_eq!(count, entries.len());

        let tuples = |m: &Manager| -> Vec<(String, String, String)> {
            m.items().iter().map(|i| (i.name.clone(), i.url.clone(), i.icon.clone())).collect()
        };
        prop_assert_eq!(tuples(&source), tuples(&target));
    }
}
