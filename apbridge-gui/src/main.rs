use eframe::egui;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use apbridge_core::automation::ButtonStyle;
use apbridge_core::protocol::{ReceivedItem, ServerEvent};
use apbridge_core::transcript::{self, GameSetup, ReplayReport, Replayer, Step, Transcript};
use apbridge_core::BridgeConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GuiConfig {
    transcript_path: String,
    server_url: String,
    player_name: String,
}

fn config_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir().or_else(dirs::data_dir)?;
    base.push("APBridge");
    base.push("gui_config.json");
    Some(base)
}

fn load_config() -> GuiConfig {
    if let Some(path) = config_path() {
        if let Ok(data) = fs::read_to_string(&path) {
            if let Ok(cfg) = serde_json::from_str::<GuiConfig>(&data) {
                return cfg;
            }
        }
    }
    GuiConfig::default()
}

fn save_config(cfg: &GuiConfig) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(cfg) {
            let _ = fs::write(path, data);
        }
    }
}

/// Routes log records into the window's log panel.
fn init_logging(tx: mpsc::Sender<String>) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(tx)
        .apply()
}

/// The per-user bridge config with the window's overrides applied.
fn bridge_config(server_url: &str, player_name: &str) -> BridgeConfig {
    let mut config = BridgeConfig::load_or_default();
    if !server_url.trim().is_empty() {
        config.server_url = server_url.trim().to_string();
    }
    if !player_name.trim().is_empty() {
        config.player_name = player_name.trim().to_string();
    }
    config
}

fn summary(report: &ReplayReport) -> String {
    let mut text = format!(
        "{}: {} applied, {} duplicate, {} unknown, {} still queued, {} failed, {} packets sent",
        report.name,
        report.applied,
        report.duplicates,
        report.unknown,
        report.queued,
        report.failed,
        report.sent.len()
    );
    if report.victory {
        text.push_str(", goal reached");
    }
    text
}

fn sandbox(seed: u64) -> Transcript {
    Transcript {
        name: "sandbox".to_string(),
        seed,
        game: GameSetup::default(),
        steps: Vec::new(),
    }
}

struct Stepper {
    transcript: Transcript,
    replayer: Replayer,
    next_step: usize,
}

impl Stepper {
    fn new(transcript: Transcript, config: &BridgeConfig) -> Self {
        let replayer = Replayer::new(&transcript, config);
        Self {
            transcript,
            replayer,
            next_step: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.transcript.steps.len().saturating_sub(self.next_step)
    }

    fn step(&mut self) -> bool {
        let Some(step) = self.transcript.steps.get(self.next_step) else {
            return false;
        };
        self.replayer.step(step);
        self.next_step += 1;
        true
    }
}

struct BridgeApp {
    transcript_path: String,
    server_url: String,
    player_name: String,
    seed_text: String,
    item_text: String,

    stepper: Stepper,
    realtime: bool,
    last_frame: Instant,

    is_running: bool,
    log: String,
    log_rx: Option<mpsc::Receiver<String>>,
    result_rx: Option<mpsc::Receiver<String>>,
}

impl BridgeApp {
    fn new(log_rx: Option<mpsc::Receiver<String>>) -> Self {
        let seed = rand::thread_rng().gen::<u64>();
        let cfg = load_config();
        let config = bridge_config(&cfg.server_url, &cfg.player_name);
        Self {
            transcript_path: cfg.transcript_path,
            server_url: cfg.server_url,
            player_name: cfg.player_name,
            seed_text: seed.to_string(),
            item_text: String::new(),
            stepper: Stepper::new(sandbox(seed), &config),
            realtime: false,
            last_frame: Instant::now(),
            is_running: false,
            log: String::new(),
            log_rx,
            result_rx: None,
        }
    }

    fn gui_config(&self) -> GuiConfig {
        GuiConfig {
            transcript_path: self.transcript_path.clone(),
            server_url: self.server_url.clone(),
            player_name: self.player_name.clone(),
        }
    }

    fn bridge_config(&self) -> BridgeConfig {
        bridge_config(&self.server_url, &self.player_name)
    }

    fn seed(&self) -> Option<u64> {
        self.seed_text.trim().parse::<u64>().ok()
    }

    fn push_log(&mut self, line: &str) {
        self.log.push_str(line);
        if !line.ends_with('\n') {
            self.log.push('\n');
        }
    }

    fn load_transcript(&mut self) {
        let path = PathBuf::from(self.transcript_path.trim());
        match transcript::load(&path) {
            Ok(mut loaded) => {
                if let Some(seed) = self.seed() {
                    loaded.seed = seed;
                }
                self.push_log(&format!("Loaded {} ({} steps)", loaded.name, loaded.steps.len()));
                self.stepper = Stepper::new(loaded, &self.bridge_config());
                save_config(&self.gui_config());
            }
            Err(err) => self.push_log(&format!("ERROR: {err}")),
        }
    }

    fn reset_sandbox(&mut self) {
        let Some(seed) = self.seed() else {
            self.push_log("ERROR: Seed must be a valid unsigned integer.");
            return;
        };
        self.stepper = Stepper::new(sandbox(seed), &self.bridge_config());
        self.push_log("Started an empty sandbox");
    }

    /// Replays every transcript under the chosen path on a worker thread.
    fn replay_all(&mut self) {
        let path = PathBuf::from(self.transcript_path.trim());
        let config = self.bridge_config();
        save_config(&self.gui_config());

        let (tx, rx) = mpsc::channel();
        self.result_rx = Some(rx);
        self.is_running = true;
        self.push_log(&format!("Replaying {} ...", path.display()));

        thread::spawn(move || {
            let files = if path.is_dir() {
                match transcript::collect(&path) {
                    Ok(files) => files,
                    Err(err) => {
                        let _ = tx.send(format!("ERROR: {err}"));
                        return;
                    }
                }
            } else {
                vec![path]
            };
            if files.is_empty() {
                let _ = tx.send("No transcripts found.".to_string());
            }
            for file in files {
                let line = transcript::load(&file)
                    .and_then(|t| transcript::replay(&t, &config))
                    .map(|report| summary(&report))
                    .unwrap_or_else(|err| format!("ERROR: {err}"));
                let _ = tx.send(line);
            }
        });
    }

    fn drain_channels(&mut self) {
        if let Some(rx) = &self.log_rx {
            let lines: Vec<String> = rx.try_iter().collect();
            for line in lines {
                self.push_log(&line);
            }
        }

        let mut finished = false;
        if let Some(rx) = &self.result_rx {
            let mut lines = Vec::new();
            loop {
                match rx.try_recv() {
                    Ok(line) => lines.push(line),
                    Err(mpsc::TryRecvError::Empty) => break,
                    Err(mpsc::TryRecvError::Disconnected) => {
                        finished = true;
                        break;
                    }
                }
            }
            for line in lines {
                self.push_log(&line);
            }
        }
        if finished {
            self.push_log("Replay finished.");
            self.is_running = false;
            self.result_rx = None;
        }
    }

    fn transcript_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Transcript:");
            ui.text_edit_singleline(&mut self.transcript_path);
            if ui.button("File...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Transcript", &["json", "gz"])
                    .pick_file()
                {
                    self.transcript_path = path.display().to_string();
                    save_config(&self.gui_config());
                }
            }
            if ui.button("Folder...").clicked() {
                if let Some(path) = rfd::FileDialog::new().pick_folder() {
                    self.transcript_path = path.display().to_string();
                    save_config(&self.gui_config());
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Server:");
            ui.text_edit_singleline(&mut self.server_url);
            ui.label("Player:");
            ui.text_edit_singleline(&mut self.player_name);
        });

        ui.horizontal(|ui| {
            ui.label("Seed:");
            ui.text_edit_singleline(&mut self.seed_text);
            if ui.button("Random").clicked() {
                self.seed_text = rand::thread_rng().gen::<u64>().to_string();
            }
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let has_path = !self.transcript_path.trim().is_empty();
        ui.horizontal(|ui| {
            if ui.add_enabled(has_path, egui::Button::new("Load")).clicked() {
                self.load_transcript();
            }
            if ui.button("Sandbox").clicked() {
                self.reset_sandbox();
            }
            let remaining = self.stepper.remaining();
            if ui.add_enabled(remaining > 0, egui::Button::new("Step")).clicked() {
                self.stepper.step();
            }
            if ui.add_enabled(remaining > 0, egui::Button::new("Run to end")).clicked() {
                while self.stepper.step() {}
                let report = self.stepper.replayer.report();
                self.push_log(&summary(&report));
            }
            if ui.button("+1 s").clicked() {
                self.stepper.replayer.advance(Duration::from_secs(1));
            }
            ui.checkbox(&mut self.realtime, "Real time");

            ui.separator();
            ui.label("Item id:");
            ui.add(egui::TextEdit::singleline(&mut self.item_text).desired_width(60.0));
            if ui.button("Give").clicked() {
                self.give_item();
            }

            let can_replay = has_path && !self.is_running;
            if ui.add_enabled(can_replay, egui::Button::new("Replay all")).clicked() {
                self.replay_all();
            }
        });
    }

    /// Delivers one item as the next entry of the item stream.
    fn give_item(&mut self) {
        let Ok(id) = self.item_text.trim().parse::<i64>() else {
            self.push_log("ERROR: Item id must be an integer.");
            return;
        };
        let index = self.stepper.replayer.bridge().dispatcher().next_index();
        self.stepper.replayer.step(&Step::Event(ServerEvent::ReceivedItems {
            index,
            items: vec![ReceivedItem::new(id)],
        }));
    }

    fn automation_buttons(&mut self, ui: &mut egui::Ui) {
        let groups = self.stepper.replayer.bridge().buttons();
        let mut pressed = None;
        for (name, buttons) in groups {
            let visible: Vec<_> = buttons.into_iter().filter(|b| b.visible).collect();
            if visible.is_empty() {
                continue;
            }
            ui.horizontal_wrapped(|ui| {
                ui.label(name);
                for button in visible {
                    let fill = match button.style {
                        ButtonStyle::Success => egui::Color32::from_rgb(40, 120, 60),
                        ButtonStyle::Danger => egui::Color32::from_rgb(150, 45, 45),
                    };
                    if ui.add(egui::Button::new(button.label.as_str()).fill(fill)).clicked() {
                        pressed = Some(button.id);
                    }
                }
            });
        }
        if let Some(id) = pressed {
            self.stepper.replayer.bridge_mut().press(id);
        }
    }

    fn flags(&self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .id_source("flag_scroll")
            .max_height(160.0)
            .show(ui, |ui| {
                egui::Grid::new("flag_grid").striped(true).show(ui, |ui| {
                    for (key, value) in self.stepper.replayer.bridge().flags().iter() {
                        ui.monospace(key);
                        ui.monospace(value.to_string());
                        ui.end_row();
                    }
                });
            });
    }
}

impl eframe::App for BridgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_channels();

        let elapsed = self.last_frame.elapsed();
        self.last_frame = Instant::now();
        if self.realtime {
            self.stepper.replayer.advance(elapsed);
        }

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let bridge = self.stepper.replayer.bridge();
                ui.label(format!("{:?}", bridge.session().state()));
                ui.separator();
                ui.label(format!("items applied: {}", bridge.progress().items_applied));
                ui.separator();
                ui.label(format!("queued packets: {}", bridge.session().queued()));
                ui.separator();
                ui.label(format!(
                    "exp x{}, death link {}",
                    bridge.exp_multiplier(),
                    if bridge.death_link_enabled() { "on" } else { "off" }
                ));
                ui.separator();
                ui.label(format!(
                    "{}: step {}/{}",
                    self.stepper.transcript.name,
                    self.stepper.next_step,
                    self.stepper.transcript.steps.len()
                ));
                if self.is_running {
                    ui.separator();
                    ui.spinner();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Pokeclicker Archipelago Bridge");
            ui.add_space(6.0);

            self.transcript_row(ui);
            ui.add_space(4.0);
            self.controls(ui);
            ui.separator();

            self.automation_buttons(ui);
            ui.separator();

            ui.label("Flags:");
            self.flags(ui);
            ui.separator();

            ui.label("Log:");
            egui::ScrollArea::vertical()
                .id_source("log_scroll")
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.log)
                            .font(egui::TextStyle::Monospace)
                            .desired_rows(12)
                            .desired_width(f32::INFINITY)
                            .interactive(false),
                    );
                });
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        save_config(&self.gui_config());
    }
}

fn main() -> eframe::Result<()> {
    let (tx, rx) = mpsc::channel();
    let log_rx = match init_logging(tx) {
        Ok(()) => Some(rx),
        Err(err) => {
            eprintln!("logging disabled: {err}");
            None
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 640.0])
            .with_title("APBridge"),
        ..Default::default()
    };

    eframe::run_native(
        "APBridge",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(BridgeApp::new(log_rx))
        }),
    )
}
