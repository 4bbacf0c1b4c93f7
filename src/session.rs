//! Interactive session: one event loop driving both collections.
//!
//! Everything arrives as a [`SessionEvent`] on a single channel (stdin lines,
//! expired delete timers, debounced searches) and is handled to completion
//! before the next one is looked at.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::collection::CollectionType;
use crate::config::Settings;
use crate::index::{expand_query, SearchIndex};
use crate::manager::{CardCollection, CollectionUpdated, DeleteOutcome, TimerRequest};
use crate::render::Mount;
use crate::shell::{self, CardCommand, ShellCommand, HELP};
use crate::storage::Storage;
use crate::timers::{Debouncer, DelayedEvents};
use crate::transfer::default_export_filename;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Line(String),
    Disarm {
        collection: CollectionType,
        id: String,
        generation: u64,
    },
    Search(String),
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<S: Storage, M: Mount> {
    sites: CardCollection<S, M>,
    engines: CardCollection<S, M>,
    sites_rx: broadcast::Receiver<CollectionUpdated>,
    engines_rx: broadcast::Receiver<CollectionUpdated>,
    index: SearchIndex,
    disarm_timers: DelayedEvents<(CollectionType, String), SessionEvent>,
    search: Debouncer<SessionEvent>,
    last_results: Vec<String>,
}

impl<S: Storage, M: Mount> Session<S, M> {
    pub fn new(
        sites: CardCollection<S, M>,
        engines: CardCollection<S, M>,
        settings: &Settings,
        tx: UnboundedSender<SessionEvent>,
    ) -> Self {
        let mut index = SearchIndex::new();
        index.refresh(CollectionType::Sites, sites.items());
        index.refresh(CollectionType::Engines, engines.items());

        Self {
            sites_rx: sites.subscribe(),
            engines_rx: engines.subscribe(),
            sites,
            engines,
            index,
            disarm_timers: DelayedEvents::new(settings.delete_confirm_delay(), tx.clone()),
            search: Debouncer::new(settings.debounce_delay(), tx),
            last_results: Vec::new(),
        }
    }

    /// Read stdin until EOF or `quit`.
    pub async fn run(
        mut self,
        tx: UnboundedSender<SessionEvent>,
        mut rx: UnboundedReceiver<SessionEvent>,
    ) -> Result<()> {
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(SessionEvent::Line(line)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(SessionEvent::InputClosed);
                        break;
                    }
                    Err(e) => {
                        warn!("⚠️  Failed to read input: {}", e);
                        let _ = tx.send(SessionEvent::InputClosed);
                        break;
                    }
                }
            }
        });

        println!("{}", HELP);
        while let Some(event) = rx.recv().await {
            if self.handle(event) == Flow::Quit {
                break;
            }
        }
        info!("👋 Session closed");
        Ok(())
    }

    pub fn handle(&mut self, event: SessionEvent) -> Flow {
        let flow = match event {
            SessionEvent::Line(line) => {
                if line.trim().is_empty() {
                    Flow::Continue
                } else {
                    match shell::parse(&line) {
                        Ok(command) => self.execute(command),
                        Err(e) => {
                            println!("❌ {}", e);
                            Flow::Continue
                        }
                    }
                }
            }
            SessionEvent::Disarm {
                collection,
                id,
                generation,
            } => {
                if self.disarm_timers.complete(&(collection, id.clone()), generation) {
                    self.collection_mut(collection).disarm(&id);
                }
                Flow::Continue
            }
            SessionEvent::Search(query) => {
                self.run_search(&query);
                Flow::Continue
            }
            SessionEvent::InputClosed => Flow::Quit,
        };

        self.sync_timers();
        self.refresh_index();
        flow
    }

    fn execute(&mut self, command: ShellCommand) -> Flow {
        match command {
            ShellCommand::List => {
                self.sites.render();
                self.engines.render();
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Flow::Quit,
            ShellCommand::Find(query) => self.search.trigger(SessionEvent::Search(query)),
            ShellCommand::Card { collection, action } => {
                if let Err(e) = self.apply_card(collection, action) {
                    println!("❌ {:#}", e);
                }
            }
        }
        Flow::Continue
    }

    fn apply_card(&mut self, collection: CollectionType, action: CardCommand) -> Result<()> {
        let manager = self.collection_mut(collection);
        let id_at = |manager: &CardCollection<S, M>, n: usize| {
            manager
                .id_at(n)
                .with_context(|| format!("No card at position {}", n))
        };

        match action {
            CardCommand::Add => {
                manager.add_item();
            }
            CardCommand::Edit(n) => {
                let id = id_at(manager, n)?;
                manager.start_edit(&id);
            }
            CardCommand::Type(n, field, text) => {
                let id = id_at(manager, n)?;
                manager.update_field(&id, field, &text);
            }
            CardCommand::Save(n) => {
                let id = id_at(manager, n)?;
                // The error was already shown on the mount.
                let _ = manager.commit_edit(&id);
            }
            CardCommand::Cancel(n) => {
                let id = id_at(manager, n)?;
                manager.cancel_edit(&id);
            }
            CardCommand::Icon(n, icon) => {
                let id = id_at(manager, n)?;
                if !manager.edit_icon(&id, &icon) {
                    println!("⚠️  Start editing card {} before changing its icon", n);
                }
            }
            CardCommand::Delete(n) => {
                let id = id_at(manager, n)?;
                if manager.request_delete(&id) == DeleteOutcome::Armed {
                    println!("⚠️  Repeat the delete to confirm");
                }
            }
            CardCommand::Key(n) => {
                let id = id_at(manager, n)?;
                manager.key_press(&id);
            }
            CardCommand::Drag(n) => {
                let id = id_at(manager, n)?;
                manager.drag_start(&id);
            }
            CardCommand::Over(n) => {
                let id = id_at(manager, n)?;
                manager.drag_enter(&id);
            }
            CardCommand::Leave(n) => {
                let id = id_at(manager, n)?;
                manager.drag_leave(&id);
            }
            CardCommand::Drop(n) => {
                let target = id_at(manager, n)?;
                manager.drop_on(&target);
                manager.drag_end();
            }
            CardCommand::DragEnd => manager.drag_end(),
            CardCommand::Move(from, to) => {
                let dragged = id_at(manager, from)?;
                let target = id_at(manager, to)?;
                manager.reorder(&dragged, &target);
            }
            CardCommand::Import(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {:?}", path))?;
                let count = manager.import_many(&raw).context("Import failed")?;
                println!("📥 Imported {} item(s)", count);
            }
            CardCommand::Export(path) => {
                let key = manager.config().key;
                let path = path.unwrap_or_else(|| default_export_filename(key).into());
                let count = export_to(manager, &path)?;
                if count == 0 {
                    println!("⚠️  Nothing to export");
                } else {
                    println!("📤 Exported {} item(s) to {:?}", count, path);
                }
            }
        }
        Ok(())
    }

    fn run_search(&mut self, query: &str) {
        let matches = self.index.lookup(query);
        self.last_results = matches.iter().map(|entry| entry.name.clone()).collect();

        if matches.is_empty() {
            println!("🔍 No matches for '{}'", query.trim());
        }
        for entry in &matches {
            println!("  {} {}  {}", entry.icon, entry.name, entry.url);
        }
        if let Some(engine) = self.index.engines().next() {
            if !query.trim().is_empty() {
                println!("  ↪ {}: {}", engine.name, expand_query(&engine.url, query));
            }
        }
    }

    fn sync_timers(&mut self) {
        for collection in [CollectionType::Sites, CollectionType::Engines] {
            let requests = self.collection_mut(collection).take_timer_requests();
            for request in requests {
                match request {
                    TimerRequest::ScheduleDisarm { id } => {
                        let key = (collection, id.clone());
                        self.disarm_timers.schedule(key, |generation| SessionEvent::Disarm {
                            collection,
                            id,
                            generation,
                        });
                    }
                    TimerRequest::CancelDisarm { id } => {
                        self.disarm_timers.cancel(&(collection, id));
                    }
                }
            }
        }
    }

    fn refresh_index(&mut self) {
        if drain(&mut self.sites_rx) {
            self.index.refresh(CollectionType::Sites, self.sites.items());
            debug!("Search index refreshed from sites");
        }
        if drain(&mut self.engines_rx) {
            self.index.refresh(CollectionType::Engines, self.engines.items());
            debug!("Search index refreshed from engines");
        }
    }

    pub fn collection(&self, collection: CollectionType) -> &CardCollection<S, M> {
        match collection {
            CollectionType::Sites => &self.sites,
            CollectionType::Engines => &self.engines,
        }
    }

    fn collection_mut(&mut self, collection: CollectionType) -> &mut CardCollection<S, M> {
        match collection {
            CollectionType::Sites => &mut self.sites,
            CollectionType::Engines => &mut self.engines,
        }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn last_results(&self) -> &[String] {
        &self.last_results
    }

    pub fn delete_timer_pending(&self, collection: CollectionType, id: &str) -> bool {
        self.disarm_timers.is_pending(&(collection, id.to_string()))
    }
}

/// Whether any notification arrived since the last drain.
fn drain(rx: &mut broadcast::Receiver<CollectionUpdated>) -> bool {
    let mut updated = false;
    loop {
        match rx.try_recv() {
            Ok(CollectionUpdated) | Err(TryRecvError::Lagged(_)) => updated = true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return updated,
        }
    }
}

/// Write an export file unless the collection is empty. Returns the count.
pub fn export_to<S: Storage, M: Mount>(
    manager: &CardCollection<S, M>,
    path: &Path,
) -> Result<usize> {
    let export = manager.export_all().context("Failed to serialize export")?;
    if export.count > 0 {
        std::fs::write(path, &export.json)
            .with_context(|| format!("Failed to write {:?}", path))?;
    }
    Ok(export.count)
}

pub fn channel() -> (UnboundedSender<SessionEvent>, UnboundedReceiver<SessionEvent>) {
    mpsc::unbounded_channel()
}
