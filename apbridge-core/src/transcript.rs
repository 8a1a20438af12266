//! Recorded sessions: a list of service events and game happenings that can
//! be replayed against the simulated game.

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::bridge::Bridge;
use crate::checks::{OakItemLocations, Purchase};
use crate::config::BridgeConfig;
use crate::dispatch::Outcome;
use crate::flags::FlagValue;
use crate::host::{BattleItemStatus, MineSnapshot, Notification};
use crate::items::{Currency, PokemonId, ALT_FORM_LOCATION_OFFSET};
use crate::prefs::PreferenceStore;
use crate::protocol::{ClientPacket, ServerEvent};
use crate::session::Delivery;
use crate::sim::{ScriptedClient, SimulatedGame};
use crate::{BridgeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// An event arriving from the service.
    Event(ServerEvent),
    Catch(PokemonId),
    Ready(bool),
    Check {
        location: i64,
        #[serde(default)]
        alternate: bool,
    },
    Press(String),
    AdvanceMs(u64),
    Buy(Purchase),
    /// Re-evaluates an Oak item's unlock against the catch count.
    OakItemUnlock(OakItemLocations),
    OakItemLevel {
        item: OakItemLocations,
        level: u32,
    },
}

fn default_ready() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSetup {
    #[serde(default = "default_ready")]
    pub ready: bool,
    #[serde(default)]
    pub money: u64,
    #[serde(default)]
    pub underground: Option<MineSnapshot>,
    #[serde(default)]
    pub battle_items: Vec<BattleItemStatus>,
}

impl Default for GameSetup {
    fn default() -> Self {
        Self {
            ready: true,
            money: 0,
            underground: None,
            battle_items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub game: GameSetup,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub name: String,
    pub applied: usize,
    pub duplicates: usize,
    pub unknown: usize,
    /// Items still waiting on the game when the report was taken.
    pub queued: usize,
    pub failed: usize,
    pub victory: bool,
    pub checks: Vec<(i64, String)>,
    pub sent: Vec<ClientPacket>,
    pub notifications: Vec<Notification>,
    pub flags: BTreeMap<String, FlagValue>,
    pub game: SimulatedGame,
}

impl ReplayReport {
    fn count(&mut self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            match outcome {
                Outcome::Applied => self.applied += 1,
                Outcome::Duplicate => self.duplicates += 1,
                Outcome::Unknown => self.unknown += 1,
                Outcome::Victory => self.victory = true,
                Outcome::Queued => {}
                Outcome::Failed(_) => self.failed += 1,
            }
        }
    }
}

fn is_transcript(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".json") || name.ends_with(".json.gz")
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

fn transcript_error(path: &Path, message: impl ToString) -> BridgeError {
    BridgeError::Transcript {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Reads a `.json` or gzip-compressed `.json.gz` transcript.
pub fn load(path: &Path) -> Result<Transcript> {
    let bytes = fs::read(path)?;
    let text = if is_gzip(path) {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut out = String::new();
        decoder
            .read_to_string(&mut out)
            .map_err(|e| transcript_error(path, e))?;
        out
    } else {
        String::from_utf8(bytes).map_err(|e| transcript_error(path, e))?
    };
    let mut transcript: Transcript =
        serde_json::from_str(&text).map_err(|e| transcript_error(path, e))?;
    if transcript.name.is_empty() {
        transcript.name = path.display().to_string();
    }
    Ok(transcript)
}

pub fn save(path: &Path, transcript: &Transcript) -> Result<()> {
    let json = serde_json::to_vec_pretty(transcript)?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        fs::write(path, encoder.finish()?)?;
    } else {
        fs::write(path, json)?;
    }
    Ok(())
}

/// Every transcript file under `dir`, sorted by path.
pub fn collect(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| transcript_error(dir, e))?;
        if entry.file_type().is_file() && is_transcript(entry.path()) {
            paths.push(entry.path().to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Steps a transcript through a bridge over a simulated game and scripted
/// client, collecting a report as it goes.
pub struct Replayer {
    bridge: Bridge<ScriptedClient, SimulatedGame>,
    now: Duration,
    report: ReplayReport,
}

impl Replayer {
    pub fn new(transcript: &Transcript, config: &BridgeConfig) -> Self {
        let mut game = SimulatedGame {
            ready: transcript.game.ready,
            underground: transcript.game.underground.clone(),
            battle_items: transcript.game.battle_items.clone(),
            ..SimulatedGame::default()
        };
        game.set_currency(Currency::Money, transcript.game.money);

        let config = BridgeConfig {
            connect_poll_interval_ms: 0,
            ..config.clone()
        };
        let mut bridge = Bridge::new(
            ScriptedClient::new(),
            game,
            config,
            PreferenceStore::in_memory(),
            transcript.seed,
        );
        if let Err(err) = bridge.connect() {
            warn!("replay {}: {err}", transcript.name);
        }

        Self {
            bridge,
            now: Duration::ZERO,
            report: ReplayReport {
                name: transcript.name.clone(),
                ..ReplayReport::default()
            },
        }
    }

    pub fn bridge(&self) -> &Bridge<ScriptedClient, SimulatedGame> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<ScriptedClient, SimulatedGame> {
        &mut self.bridge
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn step(&mut self, step: &Step) {
        match step {
            Step::Event(event) => {
                let outcomes = self.bridge.handle_event(event.clone());
                self.report.count(&outcomes);
            }
            Step::Catch(pokemon) => match self.bridge.pokemon_caught(*pokemon) {
                Ok(Some(delivery)) => {
                    if let Some(location) = pokemon.catch_location() {
                        self.record_check(location, delivery);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("catch of {pokemon} failed: {err}"),
            },
            Step::Ready(ready) => {
                self.bridge.host_mut().set_ready(*ready);
                self.tick();
            }
            Step::Check { location, alternate } => {
                let delivery = self.bridge.check_location(*location, *alternate);
                let sent_as = if *alternate {
                    ALT_FORM_LOCATION_OFFSET + location
                } else {
                    *location
                };
                self.record_check(sent_as, delivery);
            }
            Step::Press(button) => {
                if !self.bridge.press(button) {
                    warn!("no enabled automation has a {button} button");
                }
            }
            Step::AdvanceMs(ms) => self.advance(Duration::from_millis(*ms)),
            Step::Buy(purchase) => match self.bridge.buy(purchase) {
                Ok(Some(delivery)) => {
                    if let Some(location) = purchase.location {
                        self.record_check(location, delivery);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("buying {} failed: {err}", purchase.name),
            },
            Step::OakItemUnlock(item) => match self.bridge.oak_item_unlock_check(item) {
                Ok(Some(delivery)) => {
                    if let Some(location) = item.unlock {
                        self.record_check(location, delivery);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!("{} unlock check failed: {err}", item.name),
            },
            Step::OakItemLevel { item, level } => {
                if let Some(delivery) = self.bridge.oak_item_leveled(item, *level) {
                    if let Some(location) = item.level_location(*level) {
                        self.record_check(location, delivery);
                    }
                }
            }
        }
    }

    fn record_check(&mut self, location: i64, delivery: Delivery) {
        self.report.checks.push((location, delivery_label(delivery)));
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        self.tick();
    }

    fn tick(&mut self) {
        let outcomes = self.bridge.tick(self.now);
        self.report.count(&outcomes);
    }

    /// Snapshot of the report so far.
    pub fn report(&self) -> ReplayReport {
        let mut report = self.report.clone();
        report.queued = self.bridge.dispatcher().pending_len();
        report.sent = self.bridge.session().client().sent.clone();
        report.notifications = self.bridge.host().notifications.clone();
        report.flags = self
            .bridge
            .flags()
            .iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        report.game = self.bridge.host().clone();
        report
    }
}

/// Runs a whole transcript against a fresh simulated game.
pub fn replay(transcript: &Transcript, config: &BridgeConfig) -> Result<ReplayReport> {
    let mut replayer = Replayer::new(transcript, config);
    for step in &transcript.steps {
        replayer.step(step);
    }
    let report = replayer.report();
    info!(
        "replayed {}: {} applied, {} duplicate, {} unknown",
        report.name, report.applied, report.duplicates, report.unknown
    );
    Ok(report)
}

fn delivery_label(delivery: Delivery) -> String {
    format!("{delivery:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_use_snake_case_keys() {
        let json = r#"{
            "steps": [
                {"event": {"cmd": "Print", "text": "hi"}},
                {"catch": {"dex": 25}},
                {"check": {"location": 12}},
                {"advance_ms": 500},
                {"press": "auto-mine"},
                {"ready": false}
            ]
        }"#;
        let transcript: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(transcript.steps.len(), 6);
        assert_eq!(transcript.steps[2], Step::Check { location: 12, alternate: false });
        assert!(transcript.game.ready);
    }

    #[test]
    fn gzip_transcripts_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json.gz");
        let transcript = Transcript {
            name: "gz".to_string(),
            seed: 3,
            game: GameSetup::default(),
            steps: vec![Step::AdvanceMs(10)],
        };
        save(&path, &transcript).unwrap();
        assert_eq!(load(&path).unwrap(), transcript);
    }

    #[test]
    fn collect_finds_nested_transcripts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/one.json"), "{}").unwrap();
        fs::write(dir.path().join("two.json.gz"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let found = collect(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn replayer_reports_as_it_goes() {
        let transcript: Transcript = serde_json::from_str(
            r#"{"name": "steps", "steps": [
                {"event": {"cmd": "Connected", "slot": 1}},
                {"event": {"cmd": "ReceivedItems", "index": 0, "items": [{"id": 1}]}}
            ]}"#,
        )
        .unwrap();
        let mut replayer = Replayer::new(&transcript, &BridgeConfig::default());
        replayer.step(&transcript.steps[0]);
        assert_eq!(replayer.report().applied, 0);
        replayer.step(&transcript.steps[1]);
        replayer.advance(Duration::from_millis(250));

        let report = replayer.report();
        assert_eq!(report.applied, 1);
        assert_eq!(report.sent, vec![ClientPacket::Sync]);
        assert_eq!(replayer.now(), Duration::from_millis(250));
    }

    #[test]
    fn checks_are_reported_by_location() {
        let transcript: Transcript = serde_json::from_str(
            r#"{"steps": [
                {"event": {"cmd": "Connected", "slot": 1, "slot_data": {"dexsanity": true}}},
                {"catch": {"dex": 25}},
                {"catch": {"dex": 26, "form": 1}},
                {"check": {"location": 2, "alternate": true}},
                {"buy": {"kind": "key_item", "name": "Dowsing Machine", "location": 600}},
                {"oak_item_unlock": {"name": "Magic Ball", "unlock_req": 2, "unlock": 610}},
                {"oak_item_level": {
                    "item": {"name": "Magic Ball", "unlock_req": 2, "levels": [611]},
                    "level": 1
                }}
            ]}"#,
        )
        .unwrap();
        let mut replayer = Replayer::new(&transcript, &BridgeConfig::default());
        for step in &transcript.steps {
            replayer.step(step);
        }
        let report = replayer.report();
        let sent = |l: i64| (l, "Sent".to_string());
        assert_eq!(
            report.checks,
            vec![
                sent(1025),
                sent(3002),
                (3002, "AlreadyChecked".to_string()),
                sent(600),
                sent(610),
                sent(611),
            ]
        );
    }

    #[test]
    fn items_applied_after_waiting_are_not_left_queued() {
        let transcript: Transcript = serde_json::from_str(
            r#"{"game": {"ready": false}, "steps": [
                {"event": {"cmd": "ReceivedItems", "index": 0, "items": [{"id": 1}, {"id": 2}]}}
            ]}"#,
        )
        .unwrap();
        let mut replayer = Replayer::new(&transcript, &BridgeConfig::default());
        replayer.step(&transcript.steps[0]);
        assert_eq!(replayer.report().queued, 2);

        replayer.step(&Step::Ready(true));
        let report = replayer.report();
        assert_eq!(report.queued, 0);
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn bad_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"steps\": [").unwrap();
        match load(&path) {
            Err(BridgeError::Transcript { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
    }
}
