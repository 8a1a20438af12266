use log::debug;
use rand::rngs::StdRng;
use std::time::Duration;

use super::{Automation, ButtonState};
use crate::flags::keys;
use crate::host::AutomationHost;
use crate::prefs::{self, PreferenceStore};

pub const BATTLE_ITEM_COUNT: usize = 6;

const BUTTON: &str = "auto-battle-items";
const ITEM_BUTTONS: [&str; BATTLE_ITEM_COUNT] = [
    "ab-item-0",
    "ab-item-1",
    "ab-item-2",
    "ab-item-3",
    "ab-item-4",
    "ab-item-5",
];
const ITEM_NAMES: [&str; BATTLE_ITEM_COUNT] = [
    "xAttack",
    "xClick",
    "Lucky Egg",
    "Token Collector",
    "Item Magnet",
    "Lucky Incense",
];

/// Keeps the selected battle items running, buying one at base price when
/// the stock runs out.
#[derive(Debug, Default)]
pub struct AutoBattleItems {
    active: bool,
    selected: Vec<bool>,
}

impl AutoBattleItems {
    pub fn from_prefs(prefs: &PreferenceStore) -> Self {
        Self {
            active: prefs.bool(prefs::keys::AUTO_BATTLE_ITEMS, false),
            selected: prefs.bool_list(prefs::keys::TOGGLE_AB_ITEMS, BATTLE_ITEM_COUNT, false),
        }
    }
}

impl Automation for AutoBattleItems {
    fn name(&self) -> &'static str {
        "Auto Battle Items"
    }

    fn flag(&self) -> &'static str {
        keys::AUTO_BATTLE_ITEMS
    }

    fn interval(&self, _host: &dyn AutomationHost) -> Option<Duration> {
        Some(Duration::from_millis(500))
    }

    fn tick(&mut self, host: &mut dyn AutomationHost, _rng: &mut StdRng) {
        if !self.active {
            return;
        }
        let items = host.battle_items();
        for (index, item) in items.iter().enumerate().take(BATTLE_ITEM_COUNT) {
            if !self.selected.get(index).copied().unwrap_or(false) {
                continue;
            }
            if item.town_unlocked
                && item.amount == 0
                && item.price == item.base_price
                && item.price <= host.money()
            {
                debug!("buying {}", item.name);
                host.buy_battle_item(index);
            }
            // Stock as of the start of the tick; a fresh purchase is used next time.
            if item.amount != 0 && item.effect_remaining <= 1 {
                debug!("using {}", item.name);
                host.use_battle_item(index);
            }
        }
    }

    fn buttons(&self, enabled: bool) -> Vec<ButtonState> {
        let mut buttons = vec![ButtonState::toggle(BUTTON, "Auto Use", self.active, enabled)];
        for (index, id) in ITEM_BUTTONS.into_iter().enumerate() {
            let on = self.selected.get(index).copied().unwrap_or(false);
            buttons.push(ButtonState::toggle(id, ITEM_NAMES[index], on, enabled));
        }
        buttons
    }

    fn press(
        &mut self,
        button: &str,
        prefs: &mut PreferenceStore,
        _host: &mut dyn AutomationHost,
    ) -> bool {
        if button == BUTTON {
            self.active = !self.active;
            prefs.set_bool(prefs::keys::AUTO_BATTLE_ITEMS, self.active);
            return true;
        }
        let Some(index) = ITEM_BUTTONS.iter().position(|id| *id == button) else {
            return false;
        };
        if let Some(selected) = self.selected.get_mut(index) {
            *selected = !*selected;
        }
        prefs.set_bool_list(prefs::keys::TOGGLE_AB_ITEMS, &self.selected);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BattleItemStatus;
    use crate::items::Currency;
    use crate::sim::SimulatedGame;
    use rand::SeedableRng;

    fn item(amount: u32, effect_remaining: u32, price: u64) -> BattleItemStatus {
        BattleItemStatus {
            name: "xAttack".to_string(),
            amount,
            effect_remaining,
            town_unlocked: true,
            price,
            base_price: 600,
        }
    }

    fn all_selected() -> AutoBattleItems {
        AutoBattleItems {
            active: true,
            selected: vec![true; BATTLE_ITEM_COUNT],
        }
    }

    #[test]
    fn buys_only_at_base_price() {
        let mut game = SimulatedGame::ready();
        game.set_currency(Currency::Money, 5_000);
        game.battle_items = vec![item(0, 0, 600), item(0, 0, 900)];
        let mut rng = StdRng::seed_from_u64(0);
        all_selected().tick(&mut game, &mut rng);
        assert_eq!(game.battle_items[0].amount, 1);
        assert_eq!(game.battle_items[1].amount, 0);
        assert_eq!(game.money(), 4_400);
    }

    #[test]
    fn uses_items_when_effect_runs_out() {
        let mut game = SimulatedGame::ready();
        game.battle_items = vec![item(2, 1, 600), item(2, 20, 600)];
        let mut rng = StdRng::seed_from_u64(0);
        all_selected().tick(&mut game, &mut rng);
        assert_eq!(game.battle_items[0].amount, 1);
        assert_eq!(game.battle_items[1].amount, 2);
    }

    #[test]
    fn unselected_items_are_left_alone() {
        let mut game = SimulatedGame::ready();
        game.battle_items = vec![item(2, 0, 600)];
        let mut prefs = PreferenceStore::in_memory();
        prefs.set_bool(prefs::keys::AUTO_BATTLE_ITEMS, true);
        let mut automation = AutoBattleItems::from_prefs(&prefs);
        let mut rng = StdRng::seed_from_u64(0);
        automation.tick(&mut game, &mut rng);
        assert_eq!(game.battle_items[0].amount, 2);

        assert!(automation.press("ab-item-0", &mut prefs, &mut game));
        automation.tick(&mut game, &mut rng);
        assert_eq!(game.battle_items[0].amount, 1);
        assert!(prefs.bool_list(prefs::keys::TOGGLE_AB_ITEMS, BATTLE_ITEM_COUNT, false)[0]);
    }
}
