//! Connection to the randomizer service: login, location checks, status
//! updates and the inbound event stream.

use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::config::BridgeConfig;
use crate::dispatch::ItemBatch;
use crate::flags::{keys, FlagStore};
use crate::items::ALT_FORM_LOCATION_OFFSET;
use crate::pending::PendingQueue;
use crate::protocol::{
    ClientPacket, ClientStatus, LoginRequest, NetworkPlayer, ServerEvent, SlotOptions,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("not connected to the server")]
    NotConnected,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server refused the request: {0}")]
    Rejected(String),
}

/// The single seam over whatever client library talks to the service.
pub trait ServiceClient {
    fn login(&mut self, request: &LoginRequest) -> Result<(), ClientError>;
    fn is_connected(&self) -> bool;
    fn send(&mut self, packet: ClientPacket) -> Result<(), ClientError>;
    /// Drains events received since the last call, oldest first.
    fn poll(&mut self) -> Vec<ServerEvent>;
    fn disconnect(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Logged in, waiting for the server to confirm the slot.
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Queued,
    AlreadyChecked,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    pub packet: ClientPacket,
    pub error: ClientError,
}

#[derive(Debug)]
pub struct Session<C> {
    client: C,
    state: ConnectionState,
    slot: Option<u32>,
    players: Vec<NetworkPlayer>,
    checked: BTreeSet<i64>,
    outbound: PendingQueue<ClientPacket>,
    failures: Vec<SendFailure>,
}

impl<C: ServiceClient> Session<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: ConnectionState::Disconnected,
            slot: None,
            players: Vec::new(),
            checked: BTreeSet::new(),
            outbound: PendingQueue::new(),
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn slot(&self) -> Option<u32> {
        self.slot
    }

    pub fn players(&self) -> &[NetworkPlayer] {
        &self.players
    }

    pub fn player_name(&self, slot: u32) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.slot == slot)
            .map(|p| if p.alias.is_empty() { p.name.as_str() } else { p.alias.as_str() })
    }

    pub fn checked_locations(&self) -> &BTreeSet<i64> {
        &self.checked
    }

    pub fn queued(&self) -> usize {
        self.outbound.len()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Logs in, then waits a bounded time for the transport to come up. A
    /// slow server is not an error; the session finishes connecting when the
    /// `Connected` event arrives.
    pub fn connect(&mut self, config: &BridgeConfig) -> Result<(), ClientError> {
        let request = config.login_request();
        info!("connecting to {} as {}", request.server_url, request.player_name);
        self.state = ConnectionState::Connecting;
        self.outbound.observe(false);
        if let Err(err) = self.client.login(&request) {
            warn!("login failed: {err}");
            self.state = ConnectionState::Disconnected;
            return Err(err);
        }

        let interval = Duration::from_millis(config.connect_poll_interval_ms);
        for attempt in 0..config.connect_poll_attempts {
            if self.client.is_connected() {
                debug!("transport up after {} polls", attempt + 1);
                return Ok(());
            }
            thread::sleep(interval);
        }
        warn!(
            "no connection after {} polls, continuing anyway",
            config.connect_poll_attempts
        );
        Ok(())
    }

    /// Replaces the client, dropping the old connection first. Queued
    /// packets and checked locations carry over to the new connection.
    pub fn reconnect(&mut self, client: C, config: &BridgeConfig) -> Result<(), ClientError> {
        info!("replacing service connection");
        self.client.disconnect();
        self.client = client;
        self.connect(config)
    }

    pub fn disconnect(&mut self) {
        self.client.disconnect();
        self.set_disconnected();
    }

    pub fn poll(&mut self) -> Vec<ServerEvent> {
        self.client.poll()
    }

    /// Reports a location once. `is_alternate_form` moves the id into the
    /// alternate-form location block.
    pub fn send_location_check(&mut self, id: i64, is_alternate_form: bool) -> Delivery {
        let location = if is_alternate_form {
            ALT_FORM_LOCATION_OFFSET + id
        } else {
            id
        };
        if !self.checked.insert(location) {
            debug!("location {location} already checked");
            return Delivery::AlreadyChecked;
        }
        self.deliver(ClientPacket::LocationChecks {
            locations: vec![location],
        })
    }

    pub fn send_status(&mut self, status: ClientStatus) -> Delivery {
        self.deliver(ClientPacket::StatusUpdate { status })
    }

    pub fn request_sync(&mut self) -> Delivery {
        self.deliver(ClientPacket::Sync)
    }

    pub fn take_failures(&mut self) -> Vec<SendFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Updates session state from one inbound event. Item deliveries are
    /// handed back for the dispatcher.
    pub fn handle_event(
        &mut self,
        event: ServerEvent,
        flags: &mut FlagStore,
    ) -> Option<ItemBatch> {
        match event {
            ServerEvent::Connected {
                slot,
                players,
                slot_data,
            } => {
                info!("connected to slot {slot} with {} players", players.len());
                self.slot = Some(slot);
                self.players = players;
                self.state = ConnectionState::Connected;
                apply_slot_options(&slot_data, flags);
                self.deliver(ClientPacket::Sync);
                let queued = self.outbound.observe(true);
                if !queued.is_empty() {
                    info!("sending {} queued packets", queued.len());
                }
                for packet in queued {
                    self.deliver(packet);
                }
                None
            }
            ServerEvent::ReceivedItems { index, items } => {
                debug!("received {} items starting at {}", items.len(), index);
                Some(ItemBatch {
                    starting_index: index,
                    items,
                })
            }
            ServerEvent::Print { text } => {
                info!("server: {text}");
                None
            }
            ServerEvent::Disconnected => {
                warn!("disconnected from server");
                self.set_disconnected();
                None
            }
        }
    }

    fn set_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.outbound.observe(false);
    }

    fn deliver(&mut self, packet: ClientPacket) -> Delivery {
        if self.state != ConnectionState::Connected {
            debug!("not connected, queueing {packet:?}");
            self.outbound.push(packet);
            return Delivery::Queued;
        }
        match self.client.send(packet.clone()) {
            Ok(()) => Delivery::Sent,
            Err(error) => {
                warn!("failed to send {packet:?}: {error}");
                if let ClientPacket::LocationChecks { locations } = &packet {
                    for location in locations {
                        self.checked.remove(location);
                    }
                }
                self.failures.push(SendFailure { packet, error });
                Delivery::Failed
            }
        }
    }
}

fn apply_slot_options(options: &SlotOptions, flags: &mut FlagStore) {
    flags.set(keys::DEXSANITY, options.dexsanity);
    flags.set(keys::DEATH_LINK, options.death_link != 0);
    if let Some(multiplier) = options.exp_multiplier {
        flags.set(keys::EXP_MULTIPLIER, multiplier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptedClient;

    fn config() -> BridgeConfig {
        BridgeConfig {
            connect_poll_attempts: 3,
            connect_poll_interval_ms: 0,
            ..BridgeConfig::default()
        }
    }

    fn connected_event() -> ServerEvent {
        ServerEvent::Connected {
            slot: 1,
            players: vec![NetworkPlayer {
                slot: 1,
                name: "Red".to_string(),
                game: "Pokeclicker".to_string(),
                alias: String::new(),
            }],
            slot_data: SlotOptions {
                dexsanity: true,
                death_link: 1,
                exp_multiplier: Some(3.0),
                ..SlotOptions::default()
            },
        }
    }

    fn checks(locations: &[i64]) -> Vec<ClientPacket> {
        locations
            .iter()
            .map(|l| ClientPacket::LocationChecks { locations: vec![*l] })
            .collect()
    }

    #[test]
    fn queued_checks_flush_once_in_order_after_connect() {
        let mut session = Session::new(ScriptedClient::new());
        let mut flags = FlagStore::new();
        session.connect(&config()).unwrap();

        assert_eq!(session.send_location_check(40, false), Delivery::Queued);
        assert_eq!(session.send_location_check(12, false), Delivery::Queued);
        assert_eq!(session.send_location_check(40, false), Delivery::AlreadyChecked);
        assert!(session.client().sent.is_empty());

        session.handle_event(connected_event(), &mut flags);
        let mut expected = vec![ClientPacket::Sync];
        expected.extend(checks(&[40, 12]));
        assert_eq!(session.client().sent, expected);

        session.handle_event(connected_event(), &mut flags);
        let checks_sent = session.client().sent.iter().filter(|p| **p != ClientPacket::Sync);
        assert_eq!(checks_sent.count(), 2);
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn connecting_again_holds_checks_until_the_next_connected() {
        let mut session = Session::new(ScriptedClient::new());
        let mut flags = FlagStore::new();
        session.connect(&config()).unwrap();
        session.handle_event(connected_event(), &mut flags);

        session.connect(&config()).unwrap();
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert_eq!(session.send_location_check(77, false), Delivery::Queued);

        session.handle_event(connected_event(), &mut flags);
        let mut expected = vec![ClientPacket::Sync, ClientPacket::Sync];
        expected.extend(checks(&[77]));
        assert_eq!(session.client().sent, expected);
        assert_eq!(session.queued(), 0);
    }

    #[test]
    fn alternate_forms_use_their_own_block() {
        let mut session = Session::new(ScriptedClient::new());
        let mut flags = FlagStore::new();
        session.connect(&config()).unwrap();
        session.handle_event(connected_event(), &mut flags);

        assert_eq!(session.send_location_check(2, true), Delivery::Sent);
        assert!(session.checked_locations().contains(&(ALT_FORM_LOCATION_OFFSET + 2)));
        assert_eq!(session.send_location_check(2, false), Delivery::Sent);
    }

    #[test]
    fn failed_check_can_be_sent_again() {
        let mut session = Session::new(ScriptedClient::new());
        let mut flags = FlagStore::new();
        session.connect(&config()).unwrap();
        session.handle_event(connected_event(), &mut flags);

        session.client_mut().fail_sends = true;
        assert_eq!(session.send_location_check(7, false), Delivery::Failed);
        assert!(!session.checked_locations().contains(&7));
        assert_eq!(session.take_failures().len(), 1);

        session.client_mut().fail_sends = false;
        assert_eq!(session.send_location_check(7, false), Delivery::Sent);
        assert!(session.take_failures().is_empty());
    }

    #[test]
    fn connected_event_applies_slot_options() {
        let mut session = Session::new(ScriptedClient::new());
        let mut flags = FlagStore::new();
        session.handle_event(connected_event(), &mut flags);
        assert_eq!(session.state(), ConnectionState::Connected);
        assert_eq!(session.slot(), Some(1));
        assert_eq!(session.player_name(1), Some("Red"));
        assert!(flags.get_bool(keys::DEXSANITY));
        assert!(flags.get_bool(keys::DEATH_LINK));
        assert_eq!(flags.get_number(keys::EXP_MULTIPLIER), 3.0);
    }

    #[test]
    fn rejected_login_stays_disconnected() {
        let mut client = ScriptedClient::new();
        client.reject_login = Some("unknown game".to_string());
        let mut session = Session::new(client);
        let err = session.connect(&config()).unwrap_err();
        assert_eq!(err, ClientError::Rejected("unknown game".to_string()));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn slow_server_does_not_fail_connect() {
        let mut client = ScriptedClient::new();
        client.connect_on_login = false;
        let mut session = Session::new(client);
        assert!(session.connect(&config()).is_ok());
        assert_eq!(session.state(), ConnectionState::Connecting);
    }

    #[test]
    fn reconnect_drops_the_old_client() {
        let mut session = Session::new(ScriptedClient::new());
        let mut flags = FlagStore::new();
        session.connect(&config()).unwrap();
        session.handle_event(connected_event(), &mut flags);
        session.handle_event(ServerEvent::Disconnected, &mut flags);
        assert_eq!(session.send_location_check(9, false), Delivery::Queued);

        session.reconnect(ScriptedClient::new(), &config()).unwrap();
        assert_eq!(session.client().logins.len(), 1);
        assert!(session.client().sent.is_empty());

        session.handle_event(connected_event(), &mut flags);
        let mut expected = vec![ClientPacket::Sync];
        expected.extend(checks(&[9]));
        assert_eq!(session.client().sent, expected);
    }
}
