//! Per-user automation preferences, one JSON file of independent keys.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

pub mod keys {
    pub const AUTO_MINE_STATE: &str = "autoMineState";
    pub const AUTO_PLANT_STATE: &str = "autoPlantState";
    pub const AUTO_HARVEST_STATE: &str = "autoHarvestState";
    pub const AUTO_REPLANT_STATE: &str = "autoReplantState";
    pub const AUTO_MULCH_STATE: &str = "autoMulchState";
    pub const AUTO_PLANT_SELECTED: &str = "autoPlantSelected";
    pub const AUTO_BATTLE_ITEMS: &str = "autoBattleItems";
    pub const TOGGLE_AB_ITEMS: &str = "toggleABItems";
    pub const WEATHER_CHANGER_WEATHER: &str = "weatherChangerWeather";
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl PreferenceStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn default_path() -> Option<PathBuf> {
        let mut base = dirs::config_dir().or_else(dirs::data_dir)?;
        base.push("APBridge");
        base.push("preferences.json");
        Some(base)
    }

    /// Opens the file at `path`. A missing or unreadable file starts empty so
    /// every key falls back to its default.
    pub fn open(path: &Path) -> Self {
        let values = fs::read_to_string(path)
            .ok()
            .and_then(|data| serde_json::from_str::<Map<String, Value>>(&data).ok())
            .unwrap_or_default();
        Self {
            path: Some(path.to_path_buf()),
            values,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.values.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    /// A list of exactly `len` booleans; anything else yields the default list.
    pub fn bool_list(&self, key: &str, len: usize, default: bool) -> Vec<bool> {
        let parsed = self.values.get(key).and_then(Value::as_array).and_then(|list| {
            list.iter().map(Value::as_bool).collect::<Option<Vec<bool>>>()
        });
        match parsed {
            Some(list) if list.len() == len => list,
            _ => vec![default; len],
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.values.insert(key.to_string(), value);
    }

    pub fn set_bool_list(&mut self, key: &str, values: &[bool]) {
        let list = values.iter().copied().map(Value::Bool).collect();
        self.values.insert(key.to_string(), Value::Array(list));
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_types_fall_back_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(
            &path,
            r#"{"autoMineState": "yes", "autoPlantState": true, "toggleABItems": [true, 1]}"#,
        )
        .unwrap();
        let prefs = PreferenceStore::open(&path);
        assert!(!prefs.bool(keys::AUTO_MINE_STATE, false));
        assert!(prefs.bool(keys::AUTO_PLANT_STATE, false));
        assert_eq!(prefs.bool_list(keys::TOGGLE_AB_ITEMS, 2, true), vec![true, true]);
        assert_eq!(prefs.number(keys::WEATHER_CHANGER_WEATHER, -1.0), -1.0);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();
        let prefs = PreferenceStore::open(&path);
        assert!(prefs.bool(keys::AUTO_HARVEST_STATE, true));
    }

    #[test]
    fn saved_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("preferences.json");
        let mut prefs = PreferenceStore::open(&path);
        prefs.set_bool(keys::AUTO_MULCH_STATE, true);
        prefs.set_number(keys::AUTO_PLANT_SELECTED, 4.0);
        prefs.set_bool_list(keys::TOGGLE_AB_ITEMS, &[false, true, false]);
        prefs.save().unwrap();

        let reopened = PreferenceStore::open(&path);
        assert!(reopened.bool(keys::AUTO_MULCH_STATE, false));
        assert_eq!(reopened.number(keys::AUTO_PLANT_SELECTED, 0.0), 4.0);
        assert_eq!(reopened.bool_list(keys::TOGGLE_AB_ITEMS, 3, true), vec![false, true, false]);
    }

    #[test]
    fn wrong_length_list_uses_default() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set_bool_list(keys::TOGGLE_AB_ITEMS, &[false; 4]);
        assert_eq!(prefs.bool_list(keys::TOGGLE_AB_ITEMS, 6, true), vec![true; 6]);
        assert!(prefs.save().is_ok());
    }
}
