use rand::rngs::StdRng;
use std::time::Duration;

use super::{Automation, ButtonState};
use crate::flags::keys;
use crate::host::{AutomationHost, FarmAction};
use crate::prefs::{self, PreferenceStore};

const PLANT: &str = "auto-plant";
const HARVEST: &str = "auto-harvest";
const REPLANT: &str = "auto-replant";
const MULCH: &str = "auto-mulch";

#[derive(Debug, Default)]
pub struct AutoFarm {
    plant: bool,
    harvest: bool,
    replant: bool,
    mulch: bool,
    berry: u32,
}

impl AutoFarm {
    pub fn from_prefs(prefs: &PreferenceStore) -> Self {
        let berry = prefs.number(prefs::keys::AUTO_PLANT_SELECTED, 0.0);
        Self {
            plant: prefs.bool(prefs::keys::AUTO_PLANT_STATE, false),
            harvest: prefs.bool(prefs::keys::AUTO_HARVEST_STATE, false),
            replant: prefs.bool(prefs::keys::AUTO_REPLANT_STATE, false),
            mulch: prefs.bool(prefs::keys::AUTO_MULCH_STATE, false),
            berry: if berry >= 0.0 { berry as u32 } else { 0 },
        }
    }

    /// Berry planted by auto plant.
    pub fn select_berry(&mut self, berry: u32, prefs: &mut PreferenceStore) {
        self.berry = berry;
        prefs.set_number(prefs::keys::AUTO_PLANT_SELECTED, berry as f64);
    }

    fn save(&self, prefs: &mut PreferenceStore) {
        prefs.set_bool(prefs::keys::AUTO_PLANT_STATE, self.plant);
        prefs.set_bool(prefs::keys::AUTO_HARVEST_STATE, self.harvest);
        prefs.set_bool(prefs::keys::AUTO_REPLANT_STATE, self.replant);
        prefs.set_bool(prefs::keys::AUTO_MULCH_STATE, self.mulch);
    }
}

impl Automation for AutoFarm {
    fn name(&self) -> &'static str {
        "Simple Auto Farmer"
    }

    fn flag(&self) -> &'static str {
        keys::SIMPLE_AUTO_FARMER
    }

    fn interval(&self, _host: &dyn AutomationHost) -> Option<Duration> {
        Some(Duration::from_millis(1000))
    }

    fn tick(&mut self, host: &mut dyn AutomationHost, _rng: &mut StdRng) {
        // Replanting harvests and plants per plot, so it replaces both.
        if self.replant {
            host.farm(FarmAction::Replant);
        } else {
            if self.harvest {
                host.farm(FarmAction::HarvestAll);
            }
            if self.plant {
                host.farm(FarmAction::PlantAll { berry: self.berry });
            }
        }
        if self.mulch {
            host.farm(FarmAction::MulchAll);
        }
    }

    fn buttons(&self, enabled: bool) -> Vec<ButtonState> {
        vec![
            ButtonState::toggle(PLANT, "Auto Plant", self.plant, enabled),
            ButtonState::toggle(HARVEST, "Auto Harvest", self.harvest, enabled),
            ButtonState::toggle(REPLANT, "Auto Replant", self.replant, enabled),
            ButtonState::toggle(MULCH, "Auto Mulch", self.mulch, enabled),
        ]
    }

    fn press(
        &mut self,
        button: &str,
        prefs: &mut PreferenceStore,
        _host: &mut dyn AutomationHost,
    ) -> bool {
        match button {
            PLANT => {
                self.plant = !self.plant;
                self.replant = false;
            }
            HARVEST => {
                self.harvest = !self.harvest;
                self.replant = false;
            }
            REPLANT => {
                self.replant = !self.replant;
                self.plant = false;
                self.harvest = false;
            }
            MULCH => self.mulch = !self.mulch,
            _ => return false,
        }
        self.save(prefs);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedGame;
    use rand::SeedableRng;

    #[test]
    fn replant_replaces_harvest_and_plant() {
        let mut game = SimulatedGame::ready();
        let mut rng = StdRng::seed_from_u64(0);
        let mut farm = AutoFarm {
            plant: true,
            harvest: true,
            replant: true,
            mulch: true,
            berry: 3,
        };
        farm.tick(&mut game, &mut rng);
        assert_eq!(game.farm_actions, vec![FarmAction::Replant, FarmAction::MulchAll]);

        farm.replant = false;
        game.farm_actions.clear();
        farm.tick(&mut game, &mut rng);
        assert_eq!(
            game.farm_actions,
            vec![FarmAction::HarvestAll, FarmAction::PlantAll { berry: 3 }, FarmAction::MulchAll]
        );
    }

    #[test]
    fn toggles_are_exclusive_with_replant() {
        let mut prefs = PreferenceStore::in_memory();
        let mut game = SimulatedGame::ready();
        let mut farm = AutoFarm::from_prefs(&prefs);

        farm.press(PLANT, &mut prefs, &mut game);
        farm.press(HARVEST, &mut prefs, &mut game);
        farm.press(REPLANT, &mut prefs, &mut game);
        assert!(farm.replant && !farm.plant && !farm.harvest);

        farm.press(PLANT, &mut prefs, &mut game);
        assert!(farm.plant && !farm.replant);
        assert!(prefs.bool(prefs::keys::AUTO_PLANT_STATE, false));
        assert!(!prefs.bool(prefs::keys::AUTO_REPLANT_STATE, true));
        assert!(!farm.press("auto-mine", &mut prefs, &mut game));
    }

    #[test]
    fn selected_berry_comes_from_prefs() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set_number(prefs::keys::AUTO_PLANT_SELECTED, 5.0);
        prefs.set_bool(prefs::keys::AUTO_PLANT_STATE, true);
        let mut farm = AutoFarm::from_prefs(&prefs);
        let mut game = SimulatedGame::ready();
        farm.tick(&mut game, &mut StdRng::seed_from_u64(0));
        assert_eq!(game.farm_actions, vec![FarmAction::PlantAll { berry: 5 }]);

        farm.select_berry(2, &mut prefs);
        assert_eq!(prefs.number(prefs::keys::AUTO_PLANT_SELECTED, 0.0), 2.0);
    }
}
