//! Timed helpers that are only available once the matching flag has been
//! received. Each automation is gated by one flag; the [`Scheduler`] starts
//! and stops it as that flag changes.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::mpsc;
use std::time::Duration;

use crate::flags::{FlagChange, FlagStore};
use crate::host::AutomationHost;
use crate::prefs::PreferenceStore;

mod battle_items;
mod farm;
mod mine;
mod oak_items;
mod weather;

pub use battle_items::{AutoBattleItems, BATTLE_ITEM_COUNT};
pub use farm::AutoFarm;
pub use mine::AutoMine;
pub use oak_items::OakItemsUnlimited;
pub use weather::WeatherOverride;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonStyle {
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonState {
    pub id: &'static str,
    pub label: String,
    pub style: ButtonStyle,
    pub visible: bool,
}

impl ButtonState {
    /// An on/off toggle rendered as `"{title} [ON]"` / `"{title} [OFF]"`.
    pub fn toggle(id: &'static str, title: &str, on: bool, visible: bool) -> Self {
        Self {
            id,
            label: format!("{title} [{}]", if on { "ON" } else { "OFF" }),
            style: if on { ButtonStyle::Success } else { ButtonStyle::Danger },
            visible,
        }
    }
}

pub trait Automation {
    fn name(&self) -> &'static str;

    /// The flag that unlocks this automation.
    fn flag(&self) -> &'static str;

    /// Time between ticks, or `None` for automations that only react to
    /// being enabled and disabled.
    fn interval(&self, host: &dyn AutomationHost) -> Option<Duration>;

    fn tick(&mut self, _host: &mut dyn AutomationHost, _rng: &mut StdRng) {}

    fn on_enabled(&mut self, _host: &mut dyn AutomationHost) {}

    /// Undo anything the automation changed on the host.
    fn on_disabled(&mut self, _host: &mut dyn AutomationHost) {}

    fn buttons(&self, enabled: bool) -> Vec<ButtonState>;

    /// Handles a press of one of this automation's buttons. Returns false for
    /// ids it does not own.
    fn press(
        &mut self,
        button: &str,
        prefs: &mut PreferenceStore,
        host: &mut dyn AutomationHost,
    ) -> bool;
}

struct Slot {
    automation: Box<dyn Automation>,
    enabled: bool,
    next_due: Option<Duration>,
}

pub struct Scheduler {
    slots: Vec<Slot>,
    changes: Option<mpsc::Receiver<FlagChange>>,
    rng: StdRng,
}

impl Scheduler {
    pub fn new(seed: u64) -> Self {
        Self {
            slots: Vec::new(),
            changes: None,
            rng: StdRng::seed_from_u64(seed ^ 0x5EED_A070_u64),
        }
    }

    /// The five stock automations, configured from saved preferences.
    pub fn standard(seed: u64, prefs: &PreferenceStore) -> Self {
        let mut scheduler = Self::new(seed);
        scheduler.register(Box::new(AutoMine::from_prefs(prefs)));
        scheduler.register(Box::new(AutoFarm::from_prefs(prefs)));
        scheduler.register(Box::new(AutoBattleItems::from_prefs(prefs)));
        scheduler.register(Box::new(WeatherOverride::from_prefs(prefs)));
        scheduler.register(Box::new(OakItemsUnlimited));
        scheduler
    }

    pub fn register(&mut self, automation: Box<dyn Automation>) {
        self.slots.push(Slot {
            automation,
            enabled: false,
            next_due: None,
        });
    }

    /// Starts listening to the flag store and picks up flags that are
    /// already set.
    pub fn attach(&mut self, flags: &mut FlagStore, host: &mut dyn AutomationHost) {
        let keys: Vec<&str> = self.slots.iter().map(|s| s.automation.flag()).collect();
        self.changes = Some(flags.channel(&keys));
        for slot in self.slots.iter_mut() {
            let enabled = flags.get_bool(slot.automation.flag());
            set_enabled(slot, enabled, host);
        }
    }

    /// Applies flag changes received since the last call. Only the latest
    /// value of each flag counts, so a flag that was reset and set again in
    /// between leaves its automation running untouched.
    pub fn sync(&mut self, host: &mut dyn AutomationHost) {
        let Some(changes) = &self.changes else {
            return;
        };
        let latest: BTreeMap<String, bool> = changes
            .try_iter()
            .map(|change: FlagChange| (change.key, change.value.as_bool()))
            .collect();
        for (key, enabled) in latest {
            for slot in self.slots.iter_mut().filter(|s| s.automation.flag() == key) {
                set_enabled(slot, enabled, host);
            }
        }
    }

    /// Runs every enabled automation whose interval has elapsed.
    pub fn tick(&mut self, now: Duration, host: &mut dyn AutomationHost) {
        self.sync(host);
        for slot in self.slots.iter_mut().filter(|s| s.enabled) {
            if slot.next_due.is_some_and(|due| now < due) {
                continue;
            }
            let Some(interval) = slot.automation.interval(host) else {
                continue;
            };
            slot.automation.tick(host, &mut self.rng);
            slot.next_due = Some(now + interval);
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.slots
            .iter()
            .any(|s| s.enabled && s.automation.name() == name)
    }

    /// Buttons for every automation, grouped by automation name.
    pub fn buttons(&self) -> Vec<(&'static str, Vec<ButtonState>)> {
        self.slots
            .iter()
            .map(|s| (s.automation.name(), s.automation.buttons(s.enabled)))
            .collect()
    }

    /// Routes a button press. Presses on disabled automations are ignored.
    pub fn press(
        &mut self,
        button: &str,
        prefs: &mut PreferenceStore,
        host: &mut dyn AutomationHost,
    ) -> bool {
        for slot in self.slots.iter_mut().filter(|s| s.enabled) {
            if slot.automation.press(button, prefs, host) {
                debug!("{} handled {button}", slot.automation.name());
                slot.next_due = None;
                return true;
            }
        }
        false
    }
}

fn set_enabled(slot: &mut Slot, enabled: bool, host: &mut dyn AutomationHost) {
    if slot.enabled == enabled {
        return;
    }
    slot.enabled = enabled;
    slot.next_due = None;
    if enabled {
        info!("{} unlocked", slot.automation.name());
        slot.automation.on_enabled(host);
    } else {
        info!("{} locked", slot.automation.name());
        slot.automation.on_disabled(host);
    }
}
