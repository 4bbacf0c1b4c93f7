//! Cancellable one-shot timers that post events back onto the session
//! channel instead of touching state themselves. Must be used from inside a
//! tokio runtime.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

fn spawn_delayed<E>(delay: Duration, tx: UnboundedSender<E>, event: E) -> JoinHandle<()>
where
    E: Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // The loop may already be gone on shutdown.
        let _ = tx.send(event);
    })
}

/// Keyed timers, at most one pending per key. Used for delete-confirm
/// auto-revert.
///
/// Every scheduled timer gets a generation number that is baked into its
/// event. An event that was already queued when its timer was cancelled or
/// replaced carries an old generation and is rejected by [`complete`].
///
/// [`complete`]: DelayedEvents::complete
pub struct DelayedEvents<K, E> {
    delay: Duration,
    tx: UnboundedSender<E>,
    pending: HashMap<K, (u64, JoinHandle<()>)>,
    next_generation: u64,
}

impl<K, E> DelayedEvents<K, E>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    E: Send + 'static,
{
    pub fn new(delay: Duration, tx: UnboundedSender<E>) -> Self {
        Self {
            delay,
            tx,
            pending: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Start (or restart) the timer for `key`. `event` builds the event to
    /// deliver from the timer's generation. Returns that generation.
    pub fn schedule(&mut self, key: K, event: impl FnOnce(u64) -> E) -> u64 {
        self.cancel(&key);
        let generation = self.next_generation;
        self.next_generation += 1;
        debug!(
            "⏱️  Timer #{} scheduled for {:?} in {:?}",
            generation, key, self.delay
        );
        let handle = spawn_delayed(self.delay, self.tx.clone(), event(generation));
        self.pending.insert(key, (generation, handle));
        generation
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                debug!("⏱️  Timer cancelled for {:?}", key);
                true
            }
            None => false,
        }
    }

    /// Accept a delivered event. Returns false, leaving the live timer
    /// untouched, when `generation` is not the one pending for `key`.
    pub fn complete(&mut self, key: &K, generation: u64) -> bool {
        match self.pending.get(key) {
            Some((current, _)) if *current == generation => {
                self.pending.remove(key);
                true
            }
            _ => {
                debug!("⏱️  Stale timer #{} for {:?} ignored", generation, key);
                false
            }
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }
}

/// Coalesces bursts of input: only the last event of a burst is delivered,
/// `delay` after it was triggered.
pub struct Debouncer<E> {
    delay: Duration,
    tx: UnboundedSender<E>,
    pending: Option<JoinHandle<()>>,
}

impl<E: Send + 'static> Debouncer<E> {
    pub fn new(delay: Duration, tx: UnboundedSender<E>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    pub fn trigger(&mut self, event: E) {
        self.cancel();
        self.pending = Some(spawn_delayed(self.delay, self.tx.clone(), event));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
