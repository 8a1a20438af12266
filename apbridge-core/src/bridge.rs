//! Owns every piece of bridge state and drives it from explicit ticks.

use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

use crate::automation::{ButtonState, Scheduler};
use crate::checks::{OakItemLocations, Purchase};
use crate::config::BridgeConfig;
use crate::dispatch::{BatchOutcome, DispatchProgress, ItemDispatcher, Outcome};
use crate::flags::{keys, FlagStore};
use crate::host::{AutomationHost, GameHost, HostResult, Notification};
use crate::items::{ItemTable, PokemonId};
use crate::prefs::PreferenceStore;
use crate::protocol::{ClientPacket, ClientStatus, ServerEvent};
use crate::session::{Delivery, ServiceClient, Session};
use crate::Result;

pub struct Bridge<C, H> {
    config: BridgeConfig,
    session: Session<C>,
    host: H,
    flags: FlagStore,
    dispatcher: ItemDispatcher,
    scheduler: Scheduler,
    prefs: PreferenceStore,
}

impl<C, H> Bridge<C, H>
where
    C: ServiceClient,
    H: GameHost + AutomationHost,
{
    pub fn new(
        client: C,
        mut host: H,
        config: BridgeConfig,
        prefs: PreferenceStore,
        seed: u64,
    ) -> Self {
        let mut flags = FlagStore::new();
        let mut scheduler = Scheduler::standard(seed, &prefs);
        scheduler.attach(&mut flags, &mut host);
        Self {
            config,
            session: Session::new(client),
            host,
            flags,
            dispatcher: ItemDispatcher::new(ItemTable::standard()),
            scheduler,
            prefs,
        }
    }

    /// Resumes from progress saved by an earlier run.
    pub fn with_progress(mut self, progress: DispatchProgress) -> Self {
        let table = self.dispatcher.table().clone();
        self.dispatcher = ItemDispatcher::with_progress(table, progress);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    /// Direct flag access. Automations pick changes up on the next tick.
    pub fn flags_mut(&mut self) -> &mut FlagStore {
        &mut self.flags
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn dispatcher(&self) -> &ItemDispatcher {
        &self.dispatcher
    }

    pub fn prefs(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn progress(&self) -> DispatchProgress {
        self.dispatcher.progress()
    }

    /// Polls the game until it reports ready, up to the configured limit.
    /// Returns false when it gave up waiting.
    pub fn wait_for_game(&mut self) -> bool {
        let interval = Duration::from_millis(self.config.ready_poll_interval_ms);
        for _ in 0..self.config.ready_poll_attempts {
            if self.host.is_ready() {
                return true;
            }
            thread::sleep(interval);
        }
        warn!("game not ready after {} polls, continuing", self.config.ready_poll_attempts);
        self.host.is_ready()
    }

    pub fn connect(&mut self) -> Result<()> {
        self.session.connect(&self.config)?;
        Ok(())
    }

    pub fn reconnect(&mut self, client: C) -> Result<()> {
        self.session.reconnect(client, &self.config)?;
        Ok(())
    }

    /// One pass of the bridge loop: replay items that were waiting on the
    /// game, handle new service events in order, then run due automations.
    pub fn tick(&mut self, now: Duration) -> Vec<Outcome> {
        let mut outcomes = self.dispatcher.poll_ready(&mut self.host, &mut self.flags);
        self.after_dispatch(&outcomes);
        for event in self.session.poll() {
            outcomes.extend(self.handle_event(event));
        }
        self.scheduler.tick(now, &mut self.host);
        outcomes
    }

    /// Feeds one event straight in without polling the client.
    pub fn handle_event(&mut self, event: ServerEvent) -> Vec<Outcome> {
        let Some(batch) = self.session.handle_event(event, &mut self.flags) else {
            self.report_send_failures();
            return Vec::new();
        };
        let outcomes = match self.dispatcher.apply_batch(batch, &mut self.host, &mut self.flags) {
            BatchOutcome::Processed(outcomes) => outcomes,
            BatchOutcome::OutOfSync { .. } => {
                self.session.request_sync();
                Vec::new()
            }
        };
        self.after_dispatch(&outcomes);
        self.scheduler.sync(&mut self.host);
        outcomes
    }

    /// Reports a first catch as a Dexsanity location. Without Dexsanity the
    /// catch is delivered to the party straight away.
    pub fn pokemon_caught(&mut self, pokemon: PokemonId) -> HostResult<Option<Delivery>> {
        let dexsanity = self.flags.get_bool(keys::DEXSANITY);
        let first = self.host.record_catch(pokemon, !dexsanity)?;
        if !dexsanity || !first {
            return Ok(None);
        }
        let Some(location) = pokemon.catch_location() else {
            warn!("no location for alternate form {pokemon}");
            return Ok(None);
        };
        Ok(Some(self.check_location(location, false)))
    }

    pub fn check_location(&mut self, id: i64, is_alternate_form: bool) -> Delivery {
        let delivery = self.session.send_location_check(id, is_alternate_form);
        self.report_send_failures();
        delivery
    }

    /// Buys one shop entry. Entries tied to a location report it and grant
    /// nothing; the rest unlock the item straight away.
    pub fn buy(&mut self, purchase: &Purchase) -> HostResult<Option<Delivery>> {
        if let Some(location) = purchase.location {
            return Ok(Some(self.check_location(location, false)));
        }
        let unlock = purchase.unlock();
        if !self.host.has_unlock(unlock)? {
            info!("bought {unlock}");
            self.host.grant_unlock(unlock)?;
        }
        Ok(None)
    }

    pub fn is_sold_out(&self, purchase: &Purchase) -> HostResult<bool> {
        match purchase.location {
            Some(location) => Ok(self.session.checked_locations().contains(&location)),
            None => self.host.has_unlock(purchase.unlock()),
        }
    }

    /// Reports an Oak item's unlock location the first time the catch count
    /// reaches its requirement. Returns `None` when there is nothing to send.
    pub fn oak_item_unlock_check(
        &mut self,
        item: &OakItemLocations,
    ) -> HostResult<Option<Delivery>> {
        let caught = self.host.caught_count()?;
        let Some(location) = item.unlock_location(caught) else {
            return Ok(None);
        };
        if self.session.checked_locations().contains(&location) {
            return Ok(None);
        }
        Ok(Some(self.check_location(location, false)))
    }

    /// Reports the location for an Oak item reaching `level`.
    pub fn oak_item_leveled(&mut self, item: &OakItemLocations, level: u32) -> Option<Delivery> {
        let Some(location) = item.level_location(level) else {
            debug!("{} level {level} has no location", item.name);
            return None;
        };
        Some(self.check_location(location, false))
    }

    /// Slot multiplier for battle experience. Unset or non-positive means 1.
    pub fn exp_multiplier(&self) -> f64 {
        let multiplier = self.flags.get_number(keys::EXP_MULTIPLIER);
        if multiplier > 0.0 {
            multiplier
        } else {
            1.0
        }
    }

    /// Experience a party member gets from `base`. Under Dexsanity, Pokémon
    /// that were caught but not yet received gain nothing.
    pub fn exp_gain(&self, pokemon: PokemonId, base: u64) -> HostResult<u64> {
        if self.flags.get_bool(keys::DEXSANITY) && !self.host.has_received(pokemon)? {
            return Ok(0);
        }
        Ok((base as f64 * self.exp_multiplier()).floor() as u64)
    }

    pub fn death_link_enabled(&self) -> bool {
        self.flags.get_bool(keys::DEATH_LINK)
    }

    pub fn buttons(&self) -> Vec<(&'static str, Vec<ButtonState>)> {
        self.scheduler.buttons()
    }

    /// Presses an automation button and saves the resulting preferences.
    pub fn press(&mut self, button: &str) -> bool {
        let handled = self.scheduler.press(button, &mut self.prefs, &mut self.host);
        if handled {
            if let Err(err) = self.prefs.save() {
                warn!("could not save preferences: {err}");
            }
        }
        handled
    }

    fn after_dispatch(&mut self, outcomes: &[Outcome]) {
        if outcomes.contains(&Outcome::Victory) {
            info!("goal reached, reporting to server");
            self.session.send_status(ClientStatus::Goal);
        }
        self.report_send_failures();
    }

    fn report_send_failures(&mut self) {
        for failure in self.session.take_failures() {
            let message = match &failure.packet {
                ClientPacket::LocationChecks { locations } => {
                    format!("Could not send location check {locations:?}: {}", failure.error)
                }
                other => format!("Could not send {other:?}: {}", failure.error),
            };
            self.host.notify(Notification::warning(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FarmAction, NotificationKind, Unlock, WeatherType};
    use crate::items::{ALT_FORM_LOCATION_OFFSET, DEXSANITY_LOCATION_OFFSET, VICTORY_ITEM_ID};
    use crate::prefs;
    use crate::protocol::{ReceivedItem, SlotOptions};
    use crate::session::ConnectionState;
    use crate::sim::{ScriptedClient, SimulatedGame};

    fn bridge_with(prefs: PreferenceStore) -> Bridge<ScriptedClient, SimulatedGame> {
        let config = BridgeConfig {
            connect_poll_interval_ms: 0,
            ready_poll_interval_ms: 0,
            ..BridgeConfig::default()
        };
        Bridge::new(ScriptedClient::new(), SimulatedGame::ready(), config, prefs, 0)
    }

    fn bridge() -> Bridge<ScriptedClient, SimulatedGame> {
        bridge_with(PreferenceStore::in_memory())
    }

    fn oak_item() -> OakItemLocations {
        OakItemLocations {
            name: "Magic Ball".to_string(),
            unlock_req: 2,
            unlock: Some(6_000),
            levels: vec![6_001, 6_002],
        }
    }

    fn connected(dexsanity: bool) -> ServerEvent {
        ServerEvent::Connected {
            slot: 1,
            players: Vec::new(),
            slot_data: SlotOptions {
                dexsanity,
                ..SlotOptions::default()
            },
        }
    }

    fn items(index: u64, ids: &[i64]) -> ServerEvent {
        ServerEvent::ReceivedItems {
            index,
            items: ids.iter().map(|id| ReceivedItem::new(*id).from_player(2, "Blue")).collect(),
        }
    }

    #[test]
    fn victory_reports_goal() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));
        let outcomes = bridge.handle_event(items(0, &[VICTORY_ITEM_ID]));
        assert_eq!(outcomes, vec![Outcome::Victory]);
        assert_eq!(
            bridge.session().client().sent.last(),
            Some(&ClientPacket::StatusUpdate { status: ClientStatus::Goal })
        );
        assert!(bridge.host().notifications.is_empty());
    }

    #[test]
    fn out_of_sync_batch_asks_for_sync() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));
        bridge.handle_event(items(3, &[1]));
        assert_eq!(bridge.session().client().sent, vec![ClientPacket::Sync, ClientPacket::Sync]);
    }

    #[test]
    fn tick_polls_client_and_runs_items() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.session.client_mut().push_event(connected(false));
        bridge.session.client_mut().push_event(items(0, &[5, 201]));
        let outcomes = bridge.tick(Duration::ZERO);
        assert_eq!(outcomes, vec![Outcome::Applied, Outcome::Applied]);
        assert_eq!(bridge.session().state(), ConnectionState::Connected);
        assert_eq!(bridge.host().notifications[0].message, "Received Holo Caster from Blue");
        let buttons = bridge.buttons();
        assert!(buttons.iter().any(|(name, b)| *name == "Simple Auto Farmer" && b[0].visible));
    }

    #[test]
    fn dexsanity_catches_become_checks() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(true));

        let pikachu = PokemonId::new(25);
        assert_eq!(bridge.pokemon_caught(pikachu), Ok(Some(Delivery::Sent)));
        assert_eq!(bridge.pokemon_caught(pikachu), Ok(None));
        assert!(!bridge.host().received.contains(&pikachu));

        let alolan_raichu = PokemonId::alternate(26, 1);
        assert_eq!(bridge.pokemon_caught(alolan_raichu), Ok(Some(Delivery::Sent)));
        let checked = bridge.session().checked_locations();
        assert!(checked.contains(&(DEXSANITY_LOCATION_OFFSET + 25)));
        assert!(checked.contains(&(ALT_FORM_LOCATION_OFFSET + 2)));
    }

    #[test]
    fn catches_without_dexsanity_are_received() {
        let mut bridge = bridge();
        let pikachu = PokemonId::new(25);
        assert_eq!(bridge.pokemon_caught(pikachu), Ok(None));
        assert!(bridge.host().received.contains(&pikachu));
        assert!(bridge.session().checked_locations().is_empty());
    }

    #[test]
    fn send_failures_warn_the_player() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));
        bridge.session.client_mut().fail_sends = true;
        assert_eq!(bridge.check_location(12, false), Delivery::Failed);
        let last = bridge.host().notifications.last().cloned();
        assert_eq!(last.map(|n| n.kind), Some(NotificationKind::Warning));
    }

    #[test]
    fn progress_carries_over() {
        let mut first = bridge();
        first.handle_event(items(0, &[5000]));
        let progress = first.progress();
        assert_eq!(progress.items_applied, 1);

        let mut second = bridge().with_progress(progress);
        second.handle_event(items(0, &[5000, 5000]));
        assert_eq!(second.host().money(), 1_000);
    }

    #[test]
    fn reconnect_resync_announces_nothing_twice() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));
        let first = bridge.handle_event(items(0, &[200, 206, 5]));
        assert_eq!(first, vec![Outcome::Applied; 3]);

        bridge.handle_event(ServerEvent::Disconnected);
        bridge.handle_event(connected(false));
        let second = bridge.handle_event(items(0, &[200, 206, 5]));
        assert_eq!(second, vec![Outcome::Duplicate; 3]);
        assert_eq!(bridge.host().notifications.len(), 3);
        assert_eq!(bridge.flags().get_number(keys::AUTO_SAFARI_ZONE_SPEED), 1.0);
    }

    #[test]
    fn reconnect_resync_keeps_automations_running() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set_bool(prefs::keys::AUTO_HARVEST_STATE, true);
        prefs.set_number(prefs::keys::WEATHER_CHANGER_WEATHER, 2.0);
        let mut bridge = bridge_with(prefs);
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));
        bridge.handle_event(items(0, &[201, 203]));
        bridge.tick(Duration::ZERO);
        assert_eq!(bridge.host().farm_actions, vec![FarmAction::HarvestAll]);

        bridge.host_mut().weather_override = Some(WeatherType::Sunny);
        bridge.handle_event(ServerEvent::Disconnected);
        bridge.handle_event(connected(false));
        bridge.handle_event(items(0, &[201, 203]));
        bridge.tick(Duration::from_millis(500));

        assert_eq!(bridge.host().farm_actions, vec![FarmAction::HarvestAll]);
        assert_eq!(bridge.host().weather_override, Some(WeatherType::Sunny));
    }

    #[test]
    fn purchases_with_a_location_send_a_check() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));

        let dowsing = Purchase::key_item("Dowsing Machine", Some(600));
        assert!(!bridge.is_sold_out(&dowsing).unwrap());
        assert_eq!(bridge.buy(&dowsing), Ok(Some(Delivery::Sent)));
        assert!(!bridge.host().key_items.contains("Dowsing Machine"));
        assert!(bridge.is_sold_out(&dowsing).unwrap());
        assert_eq!(bridge.buy(&dowsing), Ok(Some(Delivery::AlreadyChecked)));

        let magic_ball = Purchase::oak_item("Magic Ball", None);
        assert_eq!(bridge.buy(&magic_ball), Ok(None));
        assert!(bridge.host().oak_items.contains("Magic Ball"));
        assert!(bridge.is_sold_out(&magic_ball).unwrap());
        assert_eq!(
            bridge.host().has_unlock(Unlock::OakItem("Magic Ball")),
            Ok(true)
        );
    }

    #[test]
    fn oak_item_unlock_is_checked_once() {
        let mut bridge = bridge();
        bridge.connect().unwrap();
        bridge.handle_event(connected(false));
        let item = oak_item();

        bridge.pokemon_caught(PokemonId::new(1)).unwrap();
        assert_eq!(bridge.oak_item_unlock_check(&item), Ok(None));
        bridge.pokemon_caught(PokemonId::new(4)).unwrap();
        assert_eq!(bridge.oak_item_unlock_check(&item), Ok(Some(Delivery::Sent)));
        assert_eq!(bridge.oak_item_unlock_check(&item), Ok(None));

        assert_eq!(bridge.oak_item_leveled(&item, 2), Some(Delivery::Sent));
        assert_eq!(bridge.oak_item_leveled(&item, 3), None);
        let checked: Vec<i64> = bridge.session().checked_locations().iter().copied().collect();
        assert_eq!(checked, vec![6_000, 6_002]);
    }

    #[test]
    fn exp_follows_slot_options() {
        let mut bridge = bridge();
        let pikachu = PokemonId::new(25);
        assert_eq!(bridge.exp_gain(pikachu, 90), Ok(90));
        assert!(!bridge.death_link_enabled());

        bridge.handle_event(ServerEvent::Connected {
            slot: 1,
            players: Vec::new(),
            slot_data: SlotOptions {
                dexsanity: true,
                death_link: 1,
                exp_multiplier: Some(1.5),
                ..SlotOptions::default()
            },
        });
        assert!(bridge.death_link_enabled());
        bridge.pokemon_caught(pikachu).unwrap();
        assert_eq!(bridge.exp_gain(pikachu, 90), Ok(0));

        bridge.handle_event(items(0, &[1024]));
        assert_eq!(bridge.exp_gain(pikachu, 90), Ok(135));
    }

    #[test]
    fn waiting_for_game_gives_up() {
        let mut bridge = bridge();
        bridge.host_mut().set_ready(false);
        assert!(!bridge.wait_for_game());
        bridge.host_mut().set_ready(true);
        assert!(bridge.wait_for_game());
    }
}
