use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;

use super::{Automation, ButtonState};
use crate::flags::keys;
use crate::host::{AutomationHost, MineTool};
use crate::prefs::{self, PreferenceStore};

const BUTTON: &str = "auto-mine";

/// Digs up reward tiles in the underground, hammer first.
#[derive(Debug, Default)]
pub struct AutoMine {
    active: bool,
}

impl AutoMine {
    pub fn from_prefs(prefs: &PreferenceStore) -> Self {
        Self {
            active: prefs.bool(prefs::keys::AUTO_MINE_STATE, false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Automation for AutoMine {
    fn name(&self) -> &'static str {
        "Enhanced Auto Mine"
    }

    fn flag(&self) -> &'static str {
        keys::ENHANCED_AUTO_MINE
    }

    /// Faster at higher underground levels, never below 100 ms.
    fn interval(&self, host: &dyn AutomationHost) -> Option<Duration> {
        let level = host.underground().map(|m| m.level).unwrap_or(0) as i64;
        let ms = ((20 - level) * 50).max(100);
        Some(Duration::from_millis(ms as u64))
    }

    fn tick(&mut self, host: &mut dyn AutomationHost, rng: &mut StdRng) {
        if !self.active {
            return;
        }
        let Some(mine) = host.underground() else {
            return;
        };
        if mine.loading_new_layer {
            return;
        }
        if mine.battery_max_charges > 0 && mine.battery_charges == mine.battery_max_charges {
            host.discharge_battery();
        }

        let targets: Vec<usize> = mine
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.reward && tile.layer_depth > 0)
            .map(|(index, _)| index)
            .collect();
        let Some(&target) = targets.choose(rng) else {
            return;
        };

        let tool = if mine.hammer.usable() {
            MineTool::Hammer
        } else if mine.chisel.usable() {
            MineTool::Chisel
        } else {
            return;
        };
        debug!("mining tile {target} with {tool:?}");
        host.mine_tile(target, tool);
    }

    fn buttons(&self, enabled: bool) -> Vec<ButtonState> {
        vec![ButtonState::toggle(BUTTON, "Auto Mine", self.active, enabled)]
    }

    fn press(
        &mut self,
        button: &str,
        prefs: &mut PreferenceStore,
        _host: &mut dyn AutomationHost,
    ) -> bool {
        if button != BUTTON {
            return false;
        }
        self.active = !self.active;
        prefs.set_bool(prefs::keys::AUTO_MINE_STATE, self.active);
        true
    }
}
