//! Applies delivered items to the game and the flag store.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::flags::{keys, FlagStore};
use crate::host::{GameHost, HostError, HostResult, Notification, Unlock};
use crate::items::{Effect, ItemTable, Resolved};
use crate::pending::PendingQueue;
use crate::protocol::ReceivedItem;

/// A delivery from the service. `starting_index` is the stream position of
/// the first item; 0 means the whole stream is being resent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBatch {
    pub starting_index: u64,
    pub items: Vec<ReceivedItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Already granted earlier; nothing was announced.
    Duplicate,
    Unknown,
    Victory,
    Queued,
    Failed(HostError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Processed(Vec<Outcome>),
    /// A batch started past the next expected position; the caller should
    /// ask the service for a fresh sync.
    OutOfSync { expected: u64, received: u64 },
}

/// Progress that survives restarts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchProgress {
    /// Stream positions below this have already had their cumulative host
    /// grants applied.
    pub items_applied: u64,
}

#[derive(Debug)]
pub struct ItemDispatcher {
    table: ItemTable,
    next_index: u64,
    progress: DispatchProgress,
    touched: BTreeSet<&'static str>,
    pending: PendingQueue<(Option<u64>, ReceivedItem)>,
}

impl ItemDispatcher {
    pub fn new(table: ItemTable) -> Self {
        Self {
            table,
            next_index: 0,
            progress: DispatchProgress::default(),
            touched: BTreeSet::new(),
            pending: PendingQueue::new(),
        }
    }

    pub fn with_progress(table: ItemTable, progress: DispatchProgress) -> Self {
        let mut dispatcher = Self::new(table);
        dispatcher.progress = progress;
        dispatcher
    }

    pub fn table(&self) -> &ItemTable {
        &self.table
    }

    pub fn progress(&self) -> DispatchProgress {
        self.progress
    }

    pub fn items_applied(&self) -> u64 {
        self.progress.items_applied
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Applies a single item outside of any stream position. Cumulative
    /// grants always apply.
    pub fn apply<H: GameHost + ?Sized>(
        &mut self,
        item: ReceivedItem,
        host: &mut H,
        flags: &mut FlagStore,
    ) -> Outcome {
        self.apply_at(None, item, host, flags)
    }

    pub fn apply_batch<H: GameHost + ?Sized>(
        &mut self,
        batch: ItemBatch,
        host: &mut H,
        flags: &mut FlagStore,
    ) -> BatchOutcome {
        if batch.starting_index == 0 {
            self.resync(flags);
        } else if batch.starting_index > self.next_index {
            warn!(
                "item batch starts at {} but {} was expected",
                batch.starting_index, self.next_index
            );
            return BatchOutcome::OutOfSync {
                expected: self.next_index,
                received: batch.starting_index,
            };
        }

        let mut outcomes = Vec::with_capacity(batch.items.len());
        for (offset, item) in batch.items.into_iter().enumerate() {
            let position = batch.starting_index + offset as u64;
            if position < self.next_index {
                continue;
            }
            self.next_index = position + 1;
            outcomes.push(self.apply_at(Some(position), item, host, flags));
        }
        BatchOutcome::Processed(outcomes)
    }

    /// Replays items that were waiting on the game once it reports ready.
    pub fn poll_ready<H: GameHost + ?Sized>(
        &mut self,
        host: &mut H,
        flags: &mut FlagStore,
    ) -> Vec<Outcome> {
        let waiting = self.pending.observe(host.is_ready());
        if !waiting.is_empty() {
            info!("game ready, applying {} queued items", waiting.len());
        }
        waiting
            .into_iter()
            .map(|(position, item)| self.apply_at(position, item, host, flags))
            .collect()
    }

    /// Zeroes every flag and counter this dispatcher has set so the resent
    /// stream rebuilds them from scratch. Stream items still queued are
    /// dropped; the resent stream carries them again.
    fn resync(&mut self, flags: &mut FlagStore) {
        debug!("full item resync, resetting {} flags", self.touched.len());
        for key in &self.touched {
            flags.reset_to_zero(key);
        }
        self.touched.clear();
        self.pending.retain(|(position, _)| position.is_none());
        self.next_index = 0;
    }

    fn apply_at<H: GameHost + ?Sized>(
        &mut self,
        position: Option<u64>,
        item: ReceivedItem,
        host: &mut H,
        flags: &mut FlagStore,
    ) -> Outcome {
        if !host.is_ready() || !self.pending.is_empty() {
            return self.defer(position, item);
        }

        let (name, effect) = match self.table.resolve(item.id) {
            Resolved::Victory => {
                info!("goal item received from {}", sender_name(&item));
                flags.set(keys::GOAL_REACHED, true);
                return Outcome::Victory;
            }
            Resolved::Unknown { category } => {
                warn!("ignoring unknown {} item id {}", category, item.id);
                return Outcome::Unknown;
            }
            Resolved::Effect { name, effect, .. } => (name, effect),
        };

        // Flag-store state is rebuilt quietly for deliveries already announced.
        let rebuild = effect.is_flag() && self.already_granted(position);
        let result = match effect {
            Effect::Flag(key) => {
                if flags.get_bool(key) {
                    Ok(false)
                } else {
                    flags.set(key, true);
                    self.touched.insert(key);
                    Ok(true)
                }
            }
            Effect::Counter(key) => {
                let count = flags.increment(key);
                self.touched.insert(key);
                debug!("{key} is now {count}");
                Ok(true)
            }
            Effect::KeyItem(n) => grant_once(host, Unlock::KeyItem(n)),
            Effect::OakItem(n) => grant_once(host, Unlock::OakItem(n)),
            Effect::Badge(n) => grant_once(host, Unlock::Badge(n)),
            Effect::Event(n) => grant_once(host, Unlock::Event(n)),
            Effect::Location(n) => grant_once(host, Unlock::Location(n)),
            Effect::Pokemon(pokemon) => match host.has_received(pokemon) {
                Ok(true) => Ok(false),
                Ok(false) => host.receive_pokemon(pokemon).map(|_| true),
                Err(e) => Err(e),
            },
            Effect::GainItem { item: key, amount } => {
                if self.already_granted(position) {
                    Ok(false)
                } else {
                    host.gain_item(key, amount).map(|_| true)
                }
            }
            Effect::Currency { currency, amount } => {
                if self.already_granted(position) {
                    Ok(false)
                } else {
                    host.add_currency(currency, amount).map(|_| true)
                }
            }
        };

        match result {
            Ok(true) if rebuild => {
                debug!("rebuilt {} (id {}) from an earlier delivery", name, item.id);
                Outcome::Duplicate
            }
            Ok(true) => {
                if let Some(position) = position {
                    let applied = &mut self.progress.items_applied;
                    *applied = (*applied).max(position + 1);
                }
                let display = if item.name.is_empty() { name } else { item.name.as_str() };
                debug!("applied {} (id {}) from {}", display, item.id, sender_name(&item));
                host.notify(Notification::item_received(display, sender_name(&item)));
                Outcome::Applied
            }
            Ok(false) => {
                debug!("item {} (id {}) already applied", name, item.id);
                Outcome::Duplicate
            }
            Err(HostError::NotReady) => self.defer(position, item),
            Err(err) => {
                warn!("failed to apply {} (id {}): {}", name, item.id, err);
                Outcome::Failed(err)
            }
        }
    }

    fn already_granted(&self, position: Option<u64>) -> bool {
        matches!(position, Some(p) if p < self.progress.items_applied)
    }

    fn defer(&mut self, position: Option<u64>, item: ReceivedItem) -> Outcome {
        debug!("game not ready, queueing item {}", item.id);
        self.pending.observe(false);
        self.pending.push((position, item));
        Outcome::Queued
    }
}

fn grant_once<H: GameHost + ?Sized>(host: &mut H, unlock: Unlock<'_>) -> HostResult<bool> {
    if host.has_unlock(unlock)? {
        return Ok(false);
    }
    host.grant_unlock(unlock)?;
    Ok(true)
}

fn sender_name(item: &ReceivedItem) -> &str {
    if item.sender.name.is_empty() {
        "Archipelago"
    } else {
        &item.sender.name
    }
}
