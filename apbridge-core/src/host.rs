//! Adapter traits over the host game. The game simulation itself lives
//! outside this crate; everything the bridge needs from it goes through
//! [`GameHost`] (item delivery) and [`AutomationHost`] (scripted helpers).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::items::{Currency, PokemonId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("game is not ready")]
    NotReady,
    #[error("game rejected the call: {0}")]
    Rejected(String),
}

pub type HostResult<T> = std::result::Result<T, HostError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: Option<String>,
    pub message: String,
}

impl Notification {
    pub fn item_received(item: &str, sender: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: Some("Archipelago".to_string()),
            message: format!("Received {item} from {sender}"),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            title: Some("Archipelago".to_string()),
            message: message.into(),
        }
    }
}

/// One-time unlocks the game tracks by name.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Unlock<'a> {
    KeyItem(&'a str),
    OakItem(&'a str),
    Badge(&'a str),
    Event(&'a str),
    Location(&'a str),
}

impl fmt::Display for Unlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unlock::KeyItem(name) => write!(f, "key item {name}"),
            Unlock::OakItem(name) => write!(f, "oak item {name}"),
            Unlock::Badge(name) => write!(f, "badge {name}"),
            Unlock::Event(name) => write!(f, "event {name}"),
            Unlock::Location(name) => write!(f, "location {name}"),
        }
    }
}

pub trait GameHost {
    /// False until the save is loaded and the game loop is running.
    fn is_ready(&self) -> bool;

    fn has_unlock(&self, unlock: Unlock<'_>) -> HostResult<bool>;
    fn grant_unlock(&mut self, unlock: Unlock<'_>) -> HostResult<()>;

    /// Whether the Pokémon was already delivered to the party.
    fn has_received(&self, pokemon: PokemonId) -> HostResult<bool>;
    fn receive_pokemon(&mut self, pokemon: PokemonId) -> HostResult<()>;

    /// Records a catch made in game. `received` is false when delivery is
    /// gated behind the randomizer. Returns true for a first catch.
    fn record_catch(&mut self, pokemon: PokemonId, received: bool) -> HostResult<bool>;

    /// Unique Pokémon caught so far, received or not.
    fn caught_count(&self) -> HostResult<usize>;

    fn gain_item(&mut self, item: &str, amount: u32) -> HostResult<()>;
    fn add_currency(&mut self, currency: Currency, amount: u64) -> HostResult<()>;

    fn notify(&mut self, notification: Notification);
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub durability: f64,
    pub per_use: f64,
}

impl ToolStatus {
    pub fn usable(&self) -> bool {
        self.durability >= self.per_use
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineTile {
    pub reward: bool,
    pub layer_depth: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineSnapshot {
    pub level: u32,
    pub loading_new_layer: bool,
    pub battery_charges: u32,
    pub battery_max_charges: u32,
    pub hammer: ToolStatus,
    pub chisel: ToolStatus,
    pub tiles: Vec<MineTile>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MineTool {
    Hammer,
    Chisel,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FarmAction {
    PlantAll { berry: u32 },
    HarvestAll,
    Replant,
    MulchAll,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleItemStatus {
    pub name: String,
    pub amount: u32,
    /// Seconds left on the active effect.
    pub effect_remaining: u32,
    pub town_unlocked: bool,
    pub price: u64,
    pub base_price: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WeatherType {
    Clear,
    Overcast,
    Rain,
    Thunderstorm,
    Snow,
    Hail,
    Blizzard,
    Sunny,
    Sandstorm,
    Fog,
    Windy,
}

impl WeatherType {
    pub const ALL: [WeatherType; 11] = [
        WeatherType::Clear,
        WeatherType::Overcast,
        WeatherType::Rain,
        WeatherType::Thunderstorm,
        WeatherType::Snow,
        WeatherType::Hail,
        WeatherType::Blizzard,
        WeatherType::Sunny,
        WeatherType::Sandstorm,
        WeatherType::Fog,
        WeatherType::Windy,
    ];

    /// Negative or unknown indices mean "default weather".
    pub fn from_index(index: i64) -> Option<WeatherType> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> i64 {
        Self::ALL.iter().position(|w| *w == self).unwrap_or(0) as i64
    }
}

pub trait AutomationHost {
    /// `None` when the underground is not accessible yet.
    fn underground(&self) -> Option<MineSnapshot>;
    fn discharge_battery(&mut self);
    fn mine_tile(&mut self, index: usize, tool: MineTool);

    fn farm(&mut self, action: FarmAction);

    fn battle_items(&self) -> Vec<BattleItemStatus>;
    fn money(&self) -> u64;
    fn buy_battle_item(&mut self, index: usize);
    fn use_battle_item(&mut self, index: usize);

    /// `None` restores the game's own weather generation.
    fn set_weather_override(&mut self, weather: Option<WeatherType>);

    fn set_oak_items_unlimited(&mut self, unlimited: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_index_round_trips_known_values() {
        assert_eq!(WeatherType::from_index(-1), None);
        assert_eq!(WeatherType::from_index(2), Some(WeatherType::Rain));
        assert_eq!(WeatherType::from_index(99), None);
        assert_eq!(WeatherType::Windy.index(), 10);
    }

    #[test]
    fn tool_needs_full_use_of_durability() {
        let tool = ToolStatus { durability: 1.0, per_use: 1.5 };
        assert!(!tool.usable());
    }
}
