//! Runtime flag table shared by the dispatcher, the session and the
//! automations. Every write goes through [`FlagStore::set`] so subscribers are
//! always notified.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::mpsc;

pub mod keys {
    pub const ENHANCED_AUTO_MINE: &str = "enhancedAutoMine";
    pub const SIMPLE_AUTO_FARMER: &str = "simpleAutoFarmer";
    pub const AUTO_BATTLE_ITEMS: &str = "autoBattleItems";
    pub const SIMPLE_WEATHER_CHANGER: &str = "simpleWeatherChanger";
    pub const OAK_ITEMS_UNLIMITED: &str = "oakItemsUnlimited";
    pub const AUTO_SAFARI_ZONE: &str = "autoSafariZone";
    pub const AUTO_SAFARI_ZONE_SPEED: &str = "autoSafariZoneSpeed";
    pub const INFINITE_SEASONAL_EVENTS: &str = "infiniteSeasonalEvents";
    pub const TUTORIAL_COMPLETE: &str = "tutorialComplete";
    pub const DEXSANITY: &str = "dexsanity";
    pub const EXP_MULTIPLIER: &str = "expMultiplier";
    pub const DEATH_LINK: &str = "deathLink";
    pub const GOAL_REACHED: &str = "goalReached";
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
}

impl FlagValue {
    pub fn as_bool(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Number(n) => *n != 0.0,
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            FlagValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            FlagValue::Number(n) => *n,
        }
    }

    /// The value a flag of the same kind is reset to.
    pub fn zero(&self) -> FlagValue {
        match self {
            FlagValue::Bool(_) => FlagValue::Bool(false),
            FlagValue::Number(_) => FlagValue::Number(0.0),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Number(value)
    }
}

impl From<u32> for FlagValue {
    fn from(value: u32) -> Self {
        FlagValue::Number(value as f64)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlagChange {
    pub key: String,
    pub value: FlagValue,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&FlagChange)>;

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

#[derive(Default)]
pub struct FlagStore {
    values: BTreeMap<String, FlagValue>,
    by_key: HashMap<String, Vec<Subscriber>>,
    wildcard: Vec<Subscriber>,
    next_id: u64,
}

impl fmt::Debug for FlagStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyed: usize = self.by_key.values().map(Vec::len).sum();
        f.debug_struct("FlagStore")
            .field("values", &self.values)
            .field("subscribers", &(self.wildcard.len() + keyed))
            .finish()
    }
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<FlagValue> {
        self.values.get(key).copied()
    }

    /// Absent flags read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).map(|v| v.as_bool()).unwrap_or(false)
    }

    /// Absent flags read as `0`.
    pub fn get_number(&self, key: &str) -> f64 {
        self.get(key).map(|v| v.as_number()).unwrap_or(0.0)
    }

    /// Writes a flag and notifies subscribers. Returns `false` when the value
    /// was already current, in which case nobody is notified.
    pub fn set(&mut self, key: &str, value: impl Into<FlagValue>) -> bool {
        let value = value.into();
        if self.values.get(key) == Some(&value) {
            return false;
        }
        self.values.insert(key.to_string(), value);
        let change = FlagChange {
            key: key.to_string(),
            value,
        };
        if let Some(subscribers) = self.by_key.get_mut(key) {
            for sub in subscribers.iter_mut() {
                (sub.callback)(&change);
            }
        }
        for sub in self.wildcard.iter_mut() {
            (sub.callback)(&change);
        }
        true
    }

    /// Adds one to a numeric flag and returns the new value.
    pub fn increment(&mut self, key: &str) -> f64 {
        let next = self.get_number(key) + 1.0;
        self.set(key, next);
        next
    }

    pub fn reset_to_zero(&mut self, key: &str) {
        if let Some(current) = self.get(key) {
            self.set(key, current.zero());
        }
    }

    pub fn subscribe(
        &mut self,
        key: &str,
        callback: impl FnMut(&FlagChange) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription();
        self.by_key.entry(key.to_string()).or_default().push(Subscriber {
            id,
            callback: Box::new(callback),
        });
        id
    }

    pub fn subscribe_all(&mut self, callback: impl FnMut(&FlagChange) + 'static) -> SubscriptionId {
        let id = self.next_subscription();
        self.wildcard.push(Subscriber {
            id,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriber_count();
        self.wildcard.retain(|s| s.id != id);
        for subscribers in self.by_key.values_mut() {
            subscribers.retain(|s| s.id != id);
        }
        self.subscriber_count() != before
    }

    /// Forwards changes of the given keys (all keys when empty) into a channel.
    pub fn channel(&mut self, keys: &[&str]) -> mpsc::Receiver<FlagChange> {
        let (tx, rx) = mpsc::channel();
        if keys.is_empty() {
            self.subscribe_all(move |change| {
                let _ = tx.send(change.clone());
            });
        } else {
            for key in keys {
                let tx = tx.clone();
                self.subscribe(key, move |change| {
                    let _ = tx.send(change.clone());
                });
            }
        }
        rx
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FlagValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn subscriber_count(&self) -> usize {
        self.wildcard.len() + self.by_key.values().map(Vec::len).sum::<usize>()
    }

    fn next_subscription(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }
}
