use log::info;
use std::time::Duration;

use super::{Automation, ButtonState, ButtonStyle};
use crate::flags::keys;
use crate::host::{AutomationHost, WeatherType};
use crate::prefs::{self, PreferenceStore};

const BUTTON: &str = "weather-changer";

/// Forces one weather type everywhere. `None` keeps the game's own weather.
#[derive(Debug, Default)]
pub struct WeatherOverride {
    weather: Option<WeatherType>,
}

impl WeatherOverride {
    pub fn from_prefs(prefs: &PreferenceStore) -> Self {
        let index = prefs.number(prefs::keys::WEATHER_CHANGER_WEATHER, -1.0);
        Self {
            weather: WeatherType::from_index(index as i64),
        }
    }

    pub fn weather(&self) -> Option<WeatherType> {
        self.weather
    }

    /// Default weather, then each weather type in order, then back to default.
    fn next(&self) -> Option<WeatherType> {
        match self.weather {
            None => WeatherType::ALL.first().copied(),
            Some(current) => WeatherType::from_index(current.index() + 1),
        }
    }
}

impl Automation for WeatherOverride {
    fn name(&self) -> &'static str {
        "Simple Weather Changer"
    }

    fn flag(&self) -> &'static str {
        keys::SIMPLE_WEATHER_CHANGER
    }

    fn interval(&self, _host: &dyn AutomationHost) -> Option<Duration> {
        None
    }

    fn on_enabled(&mut self, host: &mut dyn AutomationHost) {
        host.set_weather_override(self.weather);
    }

    fn on_disabled(&mut self, host: &mut dyn AutomationHost) {
        host.set_weather_override(None);
    }

    fn buttons(&self, enabled: bool) -> Vec<ButtonState> {
        let label = match self.weather {
            Some(weather) => format!("Weather: {weather:?}"),
            None => "Weather: Default".to_string(),
        };
        vec![ButtonState {
            id: BUTTON,
            label,
            style: if self.weather.is_some() { ButtonStyle::Success } else { ButtonStyle::Danger },
            visible: enabled,
        }]
    }

    fn press(
        &mut self,
        button: &str,
        prefs: &mut PreferenceStore,
        host: &mut dyn AutomationHost,
    ) -> bool {
        if button != BUTTON {
            return false;
        }
        self.weather = self.next();
        let index = self.weather.map(WeatherType::index).unwrap_or(-1);
        prefs.set_number(prefs::keys::WEATHER_CHANGER_WEATHER, index as f64);
        info!("weather override set to {:?}", self.weather);
        host.set_weather_override(self.weather);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedGame;

    #[test]
    fn unknown_saved_weather_means_default() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set_number(prefs::keys::WEATHER_CHANGER_WEATHER, 42.0);
        assert_eq!(WeatherOverride::from_prefs(&prefs).weather(), None);
    }

    #[test]
    fn pressing_cycles_through_weather() {
        let mut prefs = PreferenceStore::in_memory();
        let mut game = SimulatedGame::ready();
        let mut changer = WeatherOverride::from_prefs(&prefs);

        changer.press(BUTTON, &mut prefs, &mut game);
        assert_eq!(game.weather_override, Some(WeatherType::Clear));
        assert_eq!(prefs.number(prefs::keys::WEATHER_CHANGER_WEATHER, -1.0), 0.0);

        changer.weather = Some(WeatherType::Windy);
        changer.press(BUTTON, &mut prefs, &mut game);
        assert_eq!(game.weather_override, None);
        assert_eq!(prefs.number(prefs::keys::WEATHER_CHANGER_WEATHER, 0.0), -1.0);
        assert_eq!(changer.buttons(true)[0].label, "Weather: Default");
    }
}
