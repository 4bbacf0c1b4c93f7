//! Pure card-collection state machine.
//!
//! Every interaction is a [`Command`]; [`reduce`] turns the current state and
//! one command into the next state plus a list of [`Effect`]s for the caller
//! to carry out (storage writes, focus, error display, timers). Nothing in
//! here touches storage, the mount or the clock.

use std::collections::HashMap;

use crate::collection::CollectionConfig;
use crate::items::Item;
use crate::validator::{validate_fields, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CardMode {
    #[default]
    Viewing,
    /// Drafts hold the raw, untrimmed field contents.
    Editing { name: String, url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteState {
    #[default]
    Idle,
    Armed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardState {
    pub mode: CardMode,
    pub delete: DeleteState,
}

impl CardState {
    fn editing(item: &Item) -> Self {
        Self {
            mode: CardMode::Editing {
                name: item.name.clone(),
                url: item.url.clone(),
            },
            delete: DeleteState::Idle,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, CardMode::Editing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DragState {
    pub source: Option<String>,
    pub over: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    pub items: Vec<Item>,
    pub cards: HashMap<String, CardState>,
    pub drag: DragState,
}

impl CollectionState {
    pub fn new(items: Vec<Item>) -> Self {
        let cards = items
            .iter()
            .map(|item| (item.id.clone(), CardState::default()))
            .collect();
        Self {
            items,
            cards,
            drag: DragState::default(),
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn card(&self, id: &str) -> Option<&CardState> {
        self.cards.get(id)
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.card(id).map(CardState::is_editing).unwrap_or(false)
    }

    pub fn is_armed(&self, id: &str) -> bool {
        self.card(id)
            .map(|card| card.delete == DeleteState::Armed)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a placeholder item under a freshly generated id.
    Add { id: String },
    StartEdit { id: String },
    UpdateField { id: String, field: Field, value: String },
    CommitEdit { id: String },
    CancelEdit { id: String },
    EditIcon { id: String, icon: String },
    RequestDelete { id: String },
    /// Delete-confirm timeout elapsed.
    Disarm { id: String },
    KeyPress { id: String },
    Reorder { dragged: String, target: String },
    DragStart { id: String },
    DragEnter { id: String },
    DragLeave { id: String },
    DropOn { target: String },
    DragEnd,
    /// Candidates already carry fresh ids and non-empty name/url.
    Import { items: Vec<Item> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Persist,
    Focus { id: String },
    Invalid { id: String, error: ValidationError },
    Imported { count: usize },
    ScheduleDisarm { id: String },
    CancelDisarm { id: String },
}

pub fn reduce(
    mut state: CollectionState,
    command: Command,
    config: &CollectionConfig,
) -> (CollectionState, Vec<Effect>) {
    let mut effects = Vec::new();
    apply(&mut state, command, config, &mut effects);
    (state, effects)
}

fn apply(
    state: &mut CollectionState,
    command: Command,
    config: &CollectionConfig,
    effects: &mut Vec<Effect>,
) {
    match command {
        Command::Add { id } => {
            if state.position(&id).is_some() {
                return;
            }
            let item = Item::with_id(id.clone(), &config.placeholder);
            state.cards.insert(id.clone(), CardState::editing(&item));
            state.items.push(item);
            effects.push(Effect::Persist);
            effects.push(Effect::Focus { id });
        }

        Command::StartEdit { id } => {
            let Some(pos) = state.position(&id) else {
                return;
            };
            interrupt_delete(state, &id, effects);
            let item = &state.items[pos];
            let card = state.cards.entry(id).or_default();
            if !card.is_editing() {
                card.mode = CardMode::Editing {
                    name: item.name.clone(),
                    url: item.url.clone(),
                };
            }
        }

        Command::UpdateField { id, field, value } => {
            interrupt_delete(state, &id, effects);
            if let Some(CardState {
                mode: CardMode::Editing { name, url },
                ..
            }) = state.cards.get_mut(&id)
            {
                match field {
                    Field::Name => *name = value,
                    Field::Url => *url = value,
                }
            }
        }

        Command::CommitEdit { id } => {
            let Some(pos) = state.position(&id) else {
                return;
            };
            interrupt_delete(state, &id, effects);
            let result = match state.cards.get(&id).map(|card| &card.mode) {
                Some(CardMode::Editing { name, url }) => {
                    validate_fields(name, url, config.validate_url)
                }
                _ => return,
            };
            match result {
                Ok((name, url)) => {
                    let item = &mut state.items[pos];
                    item.name = name;
                    item.url = url;
                    if let Some(card) = state.cards.get_mut(&id) {
                        card.mode = CardMode::Viewing;
                    }
                    effects.push(Effect::Persist);
                }
                Err(error) => effects.push(Effect::Invalid { id, error }),
            }
        }

        Command::CancelEdit { id } => {
            interrupt_delete(state, &id, effects);
            if let Some(card) = state.cards.get_mut(&id) {
                card.mode = CardMode::Viewing;
            }
        }

        Command::EditIcon { id, icon } => {
            let Some(pos) = state.position(&id) else {
                return;
            };
            interrupt_delete(state, &id, effects);
            let icon = icon.trim();
            if !state.is_editing(&id) || icon.is_empty() {
                return;
            }
            state.items[pos].icon = icon.to_string();
            effects.push(Effect::Persist);
        }

        Command::RequestDelete { id } => {
            let Some(pos) = state.position(&id) else {
                return;
            };
            let card = state.cards.entry(id.clone()).or_default();
            if card.delete == DeleteState::Idle {
                card.delete = DeleteState::Armed;
                effects.push(Effect::ScheduleDisarm { id });
                return;
            }
            state.items.remove(pos);
            state.cards.remove(&id);
            if state.drag.source.as_deref() == Some(id.as_str()) {
                state.drag.source = None;
            }
            if state.drag.over.as_deref() == Some(id.as_str()) {
                state.drag.over = None;
            }
            effects.push(Effect::CancelDisarm { id });
            effects.push(Effect::Persist);
        }

        Command::Disarm { id } => {
            if let Some(card) = state.cards.get_mut(&id) {
                card.delete = DeleteState::Idle;
            }
        }

        Command::KeyPress { id } => interrupt_delete(state, &id, effects),

        Command::Reorder { dragged, target } => {
            interrupt_delete(state, &dragged, effects);
            if move_before(&mut state.items, &dragged, &target) {
                effects.push(Effect::Persist);
            }
        }

        Command::DragStart { id } => {
            if state.position(&id).is_none() {
                return;
            }
            interrupt_delete(state, &id, effects);
            state.drag = DragState {
                source: Some(id),
                over: None,
            };
        }

        Command::DragEnter { id } => {
            let is_candidate = match &state.drag.source {
                Some(source) => *source != id && state.position(&id).is_some(),
                None => false,
            };
            if is_candidate {
                state.drag.over = Some(id);
            }
        }

        Command::DragLeave { id } => {
            if state.drag.over.as_deref() == Some(id.as_str()) {
                state.drag.over = None;
            }
        }

        Command::DropOn { target } => {
            let drag = std::mem::take(&mut state.drag);
            if let Some(source) = drag.source {
                interrupt_delete(state, &source, effects);
                if move_before(&mut state.items, &source, &target) {
                    effects.push(Effect::Persist);
                }
            }
        }

        Command::DragEnd => state.drag = DragState::default(),

        Command::Import { items } => {
            let mut count = 0;
            for item in items {
                let duplicate = state
                    .items
                    .iter()
                    .any(|existing| existing.url == item.url || existing.id == item.id);
                if duplicate {
                    continue;
                }
                state.cards.insert(item.id.clone(), CardState::default());
                state.items.push(item);
                count += 1;
            }
            if count > 0 {
                effects.push(Effect::Persist);
            }
            effects.push(Effect::Imported { count });
        }
    }
}

/// Any interaction with a card other than delete clears its armed state.
fn interrupt_delete(state: &mut CollectionState, id: &str, effects: &mut Vec<Effect>) {
    if let Some(card) = state.cards.get_mut(id) {
        if card.delete == DeleteState::Armed {
            card.delete = DeleteState::Idle;
            effects.push(Effect::CancelDisarm { id: id.to_string() });
        }
    }
}

/// Move `dragged` so it sits immediately before `target`.
/// Returns whether the order changed.
pub fn move_before(items: &mut Vec<Item>, dragged: &str, target: &str) -> bool {
    if dragged == target {
        return false;
    }
    let Some(from) = items.iter().position(|item| item.id == dragged) else {
        return false;
    };
    if !items.iter().any(|item| item.id == target) {
        return false;
    }

    let item = items.remove(from);
    let Some(to) = items.iter().position(|i| i.id == target) else {
        items.insert(from, item);
        return false;
    };
    items.insert(to, item);
    to != from
}
