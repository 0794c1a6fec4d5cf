//! # String Tuner GUI
//!
//! Desktop front end for the tuner core. It feeds the core the selected
//! instrument and renders what comes back: the stabilized frequency, the
//! tuning verdict with its colour cue, and a deviation meter.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Analysis Thread**: `TunerWorker` owning the microphone and the pipeline
//! - **Communication**: Crossbeam channels for selection changes and reports
//! - **Updates**: 60 FPS polling of worker events via the subscription system

mod ui;

use iced::{Element, Subscription, Theme};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tuner_core::scheduler::{TunerEvent, TunerWorker};
use tuner_core::{InstrumentProfile, InstrumentTable, TunerSettings, TuningVerdict, audio, config};
use ui::main_display::create_main_view;

/// Settings file read at start-up, relative to the working directory.
const SETTINGS_FILE: &str = "tuner_settings.json";

/// Main entry point for the tuner application.
pub fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("starting tuner application");
    let result = iced::application("String Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    info!(?result, "application finished");
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    /// User picked an instrument
    InstrumentSelected(InstrumentChoice),
    /// Tear down and reacquire the microphone and pipeline
    RestartCapture,
    /// Timer tick for polling worker events
    Tick,
}

/// Entry in the instrument picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentChoice {
    pub id: String,
    pub label: String,
}

impl From<&InstrumentProfile> for InstrumentChoice {
    fn from(profile: &InstrumentProfile) -> Self {
        Self {
            id: profile.id.clone(),
            label: profile.display_name().to_string(),
        }
    }
}

impl fmt::Display for InstrumentChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// State of the microphone as far as the user is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    Starting,
    Running { sample_rate: u32 },
    /// Acquisition failed; nothing will be detected until a restart.
    Unavailable(String),
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub capture: CaptureStatus,
    pub frequency: Option<f32>,
    pub verdict: Option<TuningVerdict>,
    /// Half-width of the tuning band, used to scale the deviation meter.
    pub band_epsilon: f32,
}

/// Main application state.
#[derive(Debug)]
struct TunerApp {
    settings: TunerSettings,
    table: InstrumentTable,
    choices: Vec<InstrumentChoice>,
    selected: InstrumentChoice,
    worker: Option<TunerWorker>,
    display_data: AppDisplayData,
}

impl Default for TunerApp {
    /// Loads settings, builds the instrument table and starts capture.
    fn default() -> Self {
        let settings = load_settings();
        let table = match settings.instrument_table() {
            Ok(table) => table,
            Err(e) => {
                error!(error = %e, "custom instruments rejected, using built-in table");
                InstrumentTable::builtin()
            }
        };
        let choices: Vec<InstrumentChoice> = table.profiles().iter().map(InstrumentChoice::from).collect();
        let selected = choices
            .iter()
            .find(|c| c.id == settings.default_instrument)
            .or_else(|| choices.first())
            .cloned()
            .unwrap_or_else(|| InstrumentChoice {
                id: settings.default_instrument.clone(),
                label: settings.default_instrument.clone(),
            });

        let mut app = Self {
            display_data: AppDisplayData {
                capture: CaptureStatus::Starting,
                frequency: None,
                verdict: None,
                band_epsilon: settings.band_epsilon,
            },
            settings,
            table,
            choices,
            selected,
            worker: None,
        };
        app.start_capture();
        app
    }
}

impl TunerApp {
    fn selected_profile(&self) -> InstrumentProfile {
        match self.table.lookup(&self.selected.id) {
            Ok(profile) => profile.clone(),
            // The picker only offers table entries.
            Err(e) => panic!("instrument selection outside the table: {e}"),
        }
    }

    /// Spawns the analysis worker, which opens the microphone on its own thread.
    fn start_capture(&mut self) {
        let frame_size = self.settings.frame_size;
        let worker = TunerWorker::spawn(
            move || audio::open_microphone(frame_size),
            self.settings.clone(),
            self.selected_profile(),
        );
        self.worker = Some(worker);
        self.display_data.capture = CaptureStatus::Starting;
    }

    /// Stops the current worker, clears the display and starts from scratch.
    fn restart_capture(&mut self) {
        info!("restarting capture pipeline");
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
        self.display_data.frequency = None;
        self.display_data.verdict = None;
        self.start_capture();
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::InstrumentSelected(choice) => {
                if choice != self.selected {
                    self.selected = choice;
                    let profile = self.selected_profile();
                    if let Some(worker) = &self.worker {
                        worker.select(profile);
                    }
                }
            }
            Message::RestartCapture => self.restart_capture(),
            Message::Tick => {
                let events = self
                    .worker
                    .as_ref()
                    .map(TunerWorker::drain_events)
                    .unwrap_or_default();
                for event in events {
                    self.apply_event(event);
                }
            }
        }
    }

    fn apply_event(&mut self, event: TunerEvent) {
        match event {
            TunerEvent::CaptureStarted { sample_rate } => {
                info!(sample_rate, "microphone capture running");
                self.display_data.capture = CaptureStatus::Running { sample_rate };
            }
            TunerEvent::CaptureFailed(e) => {
                warn!(error = %e, "pitch detection disabled until restart");
                self.display_data.capture = CaptureStatus::Unavailable(e.to_string());
            }
            TunerEvent::Report(report) => {
                self.display_data.frequency = report.frequency;
                self.display_data.verdict = report.verdict;
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data, &self.choices, &self.selected)
    }

    /// Fires every 16ms, matching the display refresh cadence.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Reads settings from `$TUNER_SETTINGS` or `tuner_settings.json`, falling back to defaults.
fn load_settings() -> TunerSettings {
    let path = std::env::var_os("TUNER_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    match config::load_settings(&path) {
        Ok(settings) => settings,
        Err(e) => {
            error!(path = %path.display(), error = %format!("{e:#}"), "failed to load settings, using defaults");
            TunerSettings::default()
        }
    }
}
