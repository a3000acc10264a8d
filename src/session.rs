//! The session is the root context object: it owns the trial engine,
//! the experiment phase machine, the data sets, and the task
//! parameters, and it is the single writer for all of them. Input
//! handlers and UI controls call into it; it answers with events the
//! rendering and export collaborators consume.

use std::fs::OpenOptions;
use std::io::{self, Write};

use chrono::prelude::*;
use directories::ProjectDirs;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::inverted_fitts;
use crate::calibration::calibrated_cursor_diameter;
use crate::config::Config;
use crate::dataset::{DataSetError, DataSets};
use crate::experiment::{Device, Experiment, Instruction, Mode, PhaseTransition};
use crate::export::ExportTables;
use crate::geometry::Point;
use crate::layout::{IsoLimits, IsoParams};
use crate::trial::{HitOutcome, TrialEngine, TrialSample};

/// Gamepad stick step per poll, in pixels. Halved near the target so
/// the final correction is controllable.
pub const GAMEPAD_SENSIBILITY_FAR: f64 = 20.0;
pub const GAMEPAD_SENSIBILITY_NEAR: f64 = 10.0;

/// Notifications for the rendering/export collaborators, emitted by the
/// handlers below.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Targets moved or resized; re-draw the ring.
    LayoutChanged,
    /// A trial went into the current data set.
    TrialRecorded { dataset_id: u32 },
    /// Press outside the target.
    Missed,
    /// Entering the enlarged-cursor phase set a new cursor diameter.
    CalibrationApplied { cursor_diameter: f64 },
    /// Countdown before the next device phase; input is ignored until
    /// `until`.
    PhasePaused {
        device: Device,
        instruction: Instruction,
        until: f64,
    },
    /// All three phases done; the canonical tables are ready.
    ExperimentComplete { tables: ExportTables },
}

#[derive(Debug)]
pub struct Session {
    pub params: IsoParams,
    pub limits: IsoLimits,
    pub engine: TrialEngine,
    pub experiment: Experiment,
    pub datasets: DataSets,
    center: (f64, f64),
    /// Difficulty class realized by the current block's width.
    current_block_id: f64,
    /// Training-mode device toggle; during an experiment the phase
    /// decides instead.
    pub gamepad_mode: bool,
    pub gamepad_sensibility: f64,
    rng: StdRng,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic construction for tests and the simulator.
    pub fn seeded(config: &Config, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, rng: StdRng) -> Self {
        let center = config.center();
        let mut session = Self {
            params: config.params(),
            limits: config.limits,
            engine: TrialEngine::new(),
            experiment: Experiment::new(),
            datasets: DataSets::new(),
            center,
            current_block_id: 0.0,
            gamepad_mode: false,
            gamepad_sensibility: GAMEPAD_SENSIBILITY_FAR,
            rng,
        };
        let classes: &[f64] = if config.id_classes.is_empty() {
            &crate::experiment::ID_CLASSES
        } else {
            &config.id_classes
        };
        session.experiment.ids = crate::experiment::IdSequence::new(classes);
        session.experiment.ids.shuffle(&mut session.rng);
        session.engine.seed_cursor(center.0, center.1);
        session.randomize_params();
        session
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn current_block_id(&self) -> f64 {
        self.current_block_id
    }

    /// Whether the gamepad is the pointing device right now.
    pub fn gamepad_active(&self) -> bool {
        match self.experiment.mode {
            Mode::Experiment => self.experiment.current_device() != Device::Mouse,
            Mode::Training => self.gamepad_mode,
        }
    }

    /// Draw the next difficulty class, realize it as a target width at
    /// the fixed ring distance, and rebuild the layout. Entering the
    /// enlarged-cursor phase first derives the calibrated diameter from
    /// the mouse and gamepad buckets.
    fn randomize_params(&mut self) -> Option<SessionEvent> {
        let mut calibration = None;
        if self.experiment.mode == Mode::Experiment
            && self.experiment.current_device() == Device::GamepadCursor
        {
            // calibrate against the ID the upcoming block will use
            let upcoming = self.experiment.ids.peek();
            let diameter = calibrated_cursor_diameter(
                &self.experiment.buckets.mouse,
                &self.experiment.buckets.gamepad,
                upcoming,
                self.params.distance,
            );
            self.params.cursor_diameter = diameter;
            calibration = Some(SessionEvent::CalibrationApplied {
                cursor_diameter: diameter,
            });
        }

        self.current_block_id = self.experiment.ids.advance();
        self.params.width = inverted_fitts(self.params.distance, self.current_block_id);
        self.engine.rebuild(&self.params, self.center);
        calibration
    }

    // ---- UI control surface -------------------------------------------------

    /// Manual parameter edits pin the task: randomization turns off and
    /// the layout regenerates immediately.
    pub fn set_distance(&mut self, distance: f64) -> SessionEvent {
        self.params.distance = distance.clamp(self.limits.min_distance, self.limits.max_distance);
        self.params.randomize = false;
        self.engine.rebuild(&self.params, self.center);
        SessionEvent::LayoutChanged
    }

    pub fn set_width(&mut self, width: f64) -> SessionEvent {
        self.params.width = width.clamp(self.limits.min_width, self.limits.max_width);
        self.params.randomize = false;
        self.engine.rebuild(&self.params, self.center);
        SessionEvent::LayoutChanged
    }

    pub fn set_cursor_diameter(&mut self, diameter: f64) -> SessionEvent {
        self.params.cursor_diameter = diameter.clamp(self.limits.min_cursor, self.limits.max_cursor);
        self.params.randomize = false;
        self.engine.rebuild(&self.params, self.center);
        SessionEvent::LayoutChanged
    }

    pub fn set_randomize(&mut self, on: bool) {
        self.params.randomize = on;
    }

    /// The "randomize" button: re-enable randomization and draw a new
    /// block immediately.
    pub fn randomize_now(&mut self) -> Vec<SessionEvent> {
        self.params.randomize = true;
        let mut events = Vec::new();
        events.extend(self.randomize_params());
        events.push(SessionEvent::LayoutChanged);
        events
    }

    pub fn add_data_set(&mut self) -> u32 {
        self.datasets.add()
    }

    pub fn delete_data_set(&mut self, id: u32) -> Result<(), DataSetError> {
        self.datasets.delete(id)
    }

    pub fn select_data_set(&mut self, id: u32) -> Result<(), DataSetError> {
        self.datasets.select(id)
    }

    // ---- mode transitions ---------------------------------------------------

    /// Begin a device-comparison run. Buckets clear, the ID cycle is
    /// reshuffled, and the first phase sits behind the instructional
    /// countdown.
    pub fn start_experiment(&mut self, start_with_gamepad: bool, now: f64) -> Vec<SessionEvent> {
        self.params.cursor_diameter = 0.0;
        self.params.randomize = true;
        self.experiment.start(start_with_gamepad, now, &mut self.rng);
        self.engine.miss_count = 0;
        self.gamepad_sensibility = GAMEPAD_SENSIBILITY_FAR;

        let mut events = Vec::new();
        if let Some(gate) = self.experiment.gate() {
            events.push(SessionEvent::PhasePaused {
                device: self.experiment.current_device(),
                instruction: gate.instruction,
                until: gate.deadline,
            });
        }
        events.extend(self.randomize_params());
        events.push(SessionEvent::LayoutChanged);
        events
    }

    pub fn switch_to_training(&mut self) {
        self.experiment.switch_to_training();
        self.params.cursor_diameter = 0.0;
        self.engine.cursor_diameter = 0.0;
        self.gamepad_mode = false;
    }

    // ---- input handlers -----------------------------------------------------

    /// Pointer motion. Stray motion during an instructional pause is
    /// dropped before it reaches the engine.
    pub fn on_move(&mut self, x: f64, y: f64, t: f64) {
        if self.experiment.pause_active(t) {
            return;
        }
        self.engine.on_move(Point::new(x, y, t));

        if self.gamepad_active() && self.experiment.current_device() != Device::GamepadCursor {
            self.gamepad_sensibility = match self.engine.target() {
                // precedence kept from the apparatus: w + 100/2
                Some(target)
                    if target.center_distance_to(x, y) - self.params.cursor_diameter / 2.0
                        < target.w + 100.0 / 2.0 =>
                {
                    GAMEPAD_SENSIBILITY_NEAR
                }
                _ => GAMEPAD_SENSIBILITY_FAR,
            };
        }
    }

    /// Press event: hit/miss classification, data capture, and all
    /// block/phase sequencing that may follow.
    pub fn on_press(&mut self, x: f64, y: f64, t: f64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.experiment.pause_active(t) {
            return events;
        }

        match self.engine.on_press(Point::new(x, y, t)) {
            HitOutcome::Miss => {
                events.push(SessionEvent::Missed);
            }
            HitOutcome::Hit {
                record,
                block_complete,
            } => {
                if let Some(record) = record {
                    if self.experiment.mode == Mode::Experiment {
                        let device = self.experiment.current_device();
                        let target_center =
                            Point::new(record.target.x, record.target.y, 0.0);
                        self.experiment.record(TrialSample {
                            id: self.current_block_id,
                            time: record.time,
                            distance: crate::geometry::point_distance(
                                &record.start,
                                &target_center,
                            ),
                            width: record.target.w,
                            cursor_diameter: (device == Device::GamepadCursor)
                                .then_some(self.params.cursor_diameter),
                        });
                    }
                    self.datasets.record(record);
                    events.push(SessionEvent::TrialRecorded {
                        dataset_id: self.datasets.current_id(),
                    });
                }

                if block_complete {
                    self.finish_block(t, &mut events);
                }
            }
        }
        events
    }

    /// Block rollover: re-randomize (or just reset) and, in experiment
    /// mode with the ID cycle exhausted, advance the device phase.
    fn finish_block(&mut self, now: f64, events: &mut Vec<SessionEvent>) {
        if !self.params.randomize {
            self.engine.reset_block();
            return;
        }

        if self.experiment.mode == Mode::Experiment && self.experiment.ids.wrapped() {
            match self.experiment.complete_block_set(now) {
                PhaseTransition::NextDevice {
                    device,
                    instruction,
                } => {
                    if device != Device::GamepadCursor {
                        self.params.cursor_diameter = 0.0;
                    }
                    if let Some(gate) = self.experiment.gate() {
                        events.push(SessionEvent::PhasePaused {
                            device,
                            instruction,
                            until: gate.deadline,
                        });
                    }
                }
                PhaseTransition::Complete => {
                    self.finish_experiment(events);
                }
            }
        }

        self.engine.miss_count = 0;
        self.gamepad_sensibility = GAMEPAD_SENSIBILITY_FAR;
        events.extend(self.randomize_params());
        events.push(SessionEvent::LayoutChanged);
    }

    fn finish_experiment(&mut self, events: &mut Vec<SessionEvent>) {
        let _ = self.append_results_log();
        if let Ok(tables) = ExportTables::from_buckets(&self.experiment.buckets) {
            events.push(SessionEvent::ExperimentComplete { tables });
        }
        self.switch_to_training();
    }

    /// Append one summary row per completed experiment to the results
    /// log under the project config dir.
    fn append_results_log(&self) -> io::Result<()> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "isofitts") {
            let config_dir = proj_dirs.config_dir();
            let log_path = config_dir.join("log.csv");

            std::fs::create_dir_all(config_dir)?;

            let needs_header = !log_path.exists();

            let mut log_file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(log_path)?;

            if needs_header {
                writeln!(
                    log_file,
                    "date,mouse_trials,gamepad_trials,gamepad_cursor_trials,mean_throughput"
                )?;
            }

            let throughput = self
                .datasets
                .current()
                .analyze()
                .mean_throughput
                .map_or(String::new(), |v| format!("{:.3}", v));

            writeln!(
                log_file,
                "{},{},{},{},{}",
                Local::now().format("%c"),
                self.experiment.buckets.mouse.len(),
                self.experiment.buckets.gamepad.len(),
                self.experiment.buckets.gamepad_cursor.len(),
                throughput,
            )?;
        }

        Ok(())
    }
}
