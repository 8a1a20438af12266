//! In-memory stand-ins for the game and the service client. The CLI and GUI
//! replay transcripts against these, and the tests use them as doubles.

use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::host::{
    AutomationHost, BattleItemStatus, FarmAction, GameHost, HostError, HostResult, MineSnapshot,
    MineTool, Notification, Unlock, WeatherType,
};
use crate::items::{Currency, PokemonId};
use crate::protocol::{ClientPacket, LoginRequest, ServerEvent};
use crate::session::{ClientError, ServiceClient};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatedGame {
    pub ready: bool,
    pub key_items: BTreeSet<String>,
    pub oak_items: BTreeSet<String>,
    pub badges: BTreeSet<String>,
    pub events: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub received: BTreeSet<PokemonId>,
    pub caught: BTreeSet<PokemonId>,
    pub inventory: BTreeMap<String, u32>,
    pub wallet: BTreeMap<String, u64>,
    pub notifications: Vec<Notification>,
    /// Makes the next grant fail with this message.
    #[serde(skip)]
    pub reject_next: Option<String>,

    pub underground: Option<MineSnapshot>,
    pub mined: Vec<(usize, MineTool)>,
    pub battery_discharges: u32,
    pub farm_actions: Vec<FarmAction>,
    pub battle_items: Vec<BattleItemStatus>,
    pub weather_override: Option<WeatherType>,
    pub oak_items_unlimited: bool,
}

impl SimulatedGame {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn currency(&self, currency: Currency) -> u64 {
        self.wallet.get(&format!("{currency:?}")).copied().unwrap_or(0)
    }

    pub fn set_currency(&mut self, currency: Currency, amount: u64) {
        self.wallet.insert(format!("{currency:?}"), amount);
    }

    fn writable(&mut self) -> HostResult<()> {
        if !self.ready {
            return Err(HostError::NotReady);
        }
        match self.reject_next.take() {
            Some(reason) => Err(HostError::Rejected(reason)),
            None => Ok(()),
        }
    }

    fn readable(&self) -> HostResult<()> {
        if self.ready {
            Ok(())
        } else {
            Err(HostError::NotReady)
        }
    }

    fn unlock_set<'n>(&self, unlock: Unlock<'n>) -> (&BTreeSet<String>, &'n str) {
        match unlock {
            Unlock::KeyItem(name) => (&self.key_items, name),
            Unlock::OakItem(name) => (&self.oak_items, name),
            Unlock::Badge(name) => (&self.badges, name),
            Unlock::Event(name) => (&self.events, name),
            Unlock::Location(name) => (&self.locations, name),
        }
    }
}

impl GameHost for SimulatedGame {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn has_unlock(&self, unlock: Unlock<'_>) -> HostResult<bool> {
        self.readable()?;
        let (set, name) = self.unlock_set(unlock);
        Ok(set.contains(name))
    }

    fn grant_unlock(&mut self, unlock: Unlock<'_>) -> HostResult<()> {
        self.writable()?;
        debug!("granting {unlock}");
        let (set, name) = match unlock {
            Unlock::KeyItem(name) => (&mut self.key_items, name),
            Unlock::OakItem(name) => (&mut self.oak_items, name),
            Unlock::Badge(name) => (&mut self.badges, name),
            Unlock::Event(name) => (&mut self.events, name),
            Unlock::Location(name) => (&mut self.locations, name),
        };
        set.insert(name.to_string());
        Ok(())
    }

    fn has_received(&self, pokemon: PokemonId) -> HostResult<bool> {
        self.readable()?;
        Ok(self.received.contains(&pokemon))
    }

    fn receive_pokemon(&mut self, pokemon: PokemonId) -> HostResult<()> {
        self.writable()?;
        self.received.insert(pokemon);
        Ok(())
    }

    fn record_catch(&mut self, pokemon: PokemonId, received: bool) -> HostResult<bool> {
        self.writable()?;
        let first = self.caught.insert(pokemon);
        if received {
            self.received.insert(pokemon);
        }
        Ok(first)
    }

    fn caught_count(&self) -> HostResult<usize> {
        self.readable()?;
        Ok(self.caught.len())
    }

    fn gain_item(&mut self, item: &str, amount: u32) -> HostResult<()> {
        self.writable()?;
        *self.inventory.entry(item.to_string()).or_default() += amount;
        Ok(())
    }

    fn add_currency(&mut self, currency: Currency, amount: u64) -> HostResult<()> {
        self.writable()?;
        *self.wallet.entry(format!("{currency:?}")).or_default() += amount;
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

impl AutomationHost for SimulatedGame {
    fn underground(&self) -> Option<MineSnapshot> {
        self.underground.clone()
    }

    fn discharge_battery(&mut self) {
        if let Some(mine) = self.underground.as_mut() {
            mine.battery_charges = 0;
        }
        self.battery_discharges += 1;
    }

    fn mine_tile(&mut self, index: usize, tool: MineTool) {
        if let Some(mine) = self.underground.as_mut() {
            let status = match tool {
                MineTool::Hammer => &mut mine.hammer,
                MineTool::Chisel => &mut mine.chisel,
            };
            status.durability -= status.per_use;
            if let Some(tile) = mine.tiles.get_mut(index) {
                tile.layer_depth = tile.layer_depth.saturating_sub(1);
            }
        }
        self.mined.push((index, tool));
    }

    fn farm(&mut self, action: FarmAction) {
        self.farm_actions.push(action);
    }

    fn battle_items(&self) -> Vec<BattleItemStatus> {
        self.battle_items.clone()
    }

    fn money(&self) -> u64 {
        self.currency(Currency::Money)
    }

    fn buy_battle_item(&mut self, index: usize) {
        let money = self.money();
        if let Some(item) = self.battle_items.get_mut(index) {
            if money >= item.price {
                item.amount += 1;
                let price = item.price;
                self.set_currency(Currency::Money, money - price);
            }
        }
    }

    fn use_battle_item(&mut self, index: usize) {
        if let Some(item) = self.battle_items.get_mut(index) {
            if item.amount > 0 {
                item.amount -= 1;
                item.effect_remaining += 30;
            }
        }
    }

    fn set_weather_override(&mut self, weather: Option<WeatherType>) {
        self.weather_override = weather;
    }

    fn set_oak_items_unlimited(&mut self, unlimited: bool) {
        self.oak_items_unlimited = unlimited;
    }
}

/// A service client that plays back queued events and records what it sent.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    pub connected: bool,
    pub connect_on_login: bool,
    pub reject_login: Option<String>,
    pub fail_sends: bool,
    pub inbound: VecDeque<ServerEvent>,
    pub sent: Vec<ClientPacket>,
    pub logins: Vec<LoginRequest>,
    pub disconnects: u32,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            connect_on_login: true,
            ..Self::default()
        }
    }

    pub fn push_event(&mut self, event: ServerEvent) {
        self.inbound.push_back(event);
    }
}

impl ServiceClient for ScriptedClient {
    fn login(&mut self, request: &LoginRequest) -> Result<(), ClientError> {
        if let Some(reason) = &self.reject_login {
            return Err(ClientError::Rejected(reason.clone()));
        }
        self.logins.push(request.clone());
        self.connected = self.connect_on_login;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, packet: ClientPacket) -> Result<(), ClientError> {
        if !self.connected {
            return Err(ClientError::NotConnected);
        }
        if self.fail_sends {
            return Err(ClientError::Transport("socket closed".to_string()));
        }
        self.sent.push(packet);
        Ok(())
    }

    fn poll(&mut self) -> Vec<ServerEvent> {
        self.inbound.drain(..).collect()
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_wait_for_ready() {
        let mut game = SimulatedGame::default();
        assert_eq!(game.gain_item("Pokeball", 1), Err(HostError::NotReady));
        game.set_ready(true);
        game.gain_item("Pokeball", 2).unwrap();
        game.gain_item("Pokeball", 3).unwrap();
        assert_eq!(game.inventory["Pokeball"], 5);
    }

    #[test]
    fn rejection_applies_once() {
        let mut game = SimulatedGame::ready();
        game.reject_next = Some("nope".to_string());
        assert!(game.grant_unlock(Unlock::Badge("Boulder Badge")).is_err());
        assert!(game.grant_unlock(Unlock::Badge("Boulder Badge")).is_ok());
        assert_eq!(game.has_unlock(Unlock::Badge("Boulder Badge")), Ok(true));
    }

    #[test]
    fn buying_needs_money() {
        let mut game = SimulatedGame::ready();
        game.battle_items.push(BattleItemStatus {
            name: "xAttack".to_string(),
            amount: 0,
            effect_remaining: 0,
            town_unlocked: true,
            price: 600,
            base_price: 600,
        });
        game.buy_battle_item(0);
        assert_eq!(game.battle_items[0].amount, 0);
        game.set_currency(Currency::Money, 1_000);
        game.buy_battle_item(0);
        assert_eq!(game.battle_items[0].amount, 1);
        assert_eq!(game.money(), 400);
    }

    #[test]
    fn client_drains_events_in_order() {
        let mut client = ScriptedClient::new();
        client.push_event(ServerEvent::Print { text: "a".to_string() });
        client.push_event(ServerEvent::Disconnected);
        assert_eq!(client.poll().len(), 2);
        assert!(client.poll().is_empty());
    }
}
