//! Three-phase device-comparison experiment: per-device trial buckets,
//! the shuffled cyclic sequence of difficulty classes, phase advancement
//! with instructional pauses, and outlier stripping at phase boundaries.

use rand::Rng;

use crate::trial::{filter_outliers, TrialSample};

/// Index-of-difficulty classes every device runs through, one block per
/// class, in shuffled order.
pub const ID_CLASSES: [f64; 7] = [1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5];

/// Length of the instructional countdown between phases, ms.
pub const PAUSE_MS: f64 = 10_000.0;

/// Pointing device under test. The display form is the device tag used
/// in the export tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Device {
    #[strum(serialize = "mouse")]
    Mouse,
    #[strum(serialize = "gamepad")]
    GamepadPointer,
    #[strum(serialize = "gamepad_cursor")]
    GamepadCursor,
}

impl Device {
    /// Text shown during the pause before this device's phase.
    pub fn instruction(&self) -> Instruction {
        match self {
            Device::Mouse => Instruction::TakeMouse,
            Device::GamepadPointer | Device::GamepadCursor => Instruction::TakeGamepad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Instruction {
    #[strum(serialize = "Take your mouse!")]
    TakeMouse,
    #[strum(serialize = "Take your gamepad!")]
    TakeGamepad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Training,
    Experiment,
}

/// Shuffled difficulty classes, consumed cyclically: one class per
/// block, a full cycle per device phase.
#[derive(Debug, Clone)]
pub struct IdSequence {
    ids: Vec<f64>,
    index: usize,
}

impl IdSequence {
    pub fn new(classes: &[f64]) -> Self {
        Self {
            ids: classes.to_vec(),
            index: 0,
        }
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        use rand::seq::SliceRandom;
        self.ids.shuffle(rng);
        self.index = 0;
    }

    /// Class the next block will use, without consuming it.
    pub fn peek(&self) -> f64 {
        self.ids[self.index]
    }

    /// Class for the next block; advances the cursor.
    pub fn advance(&mut self) -> f64 {
        let id = self.ids[self.index];
        self.index = (self.index + 1) % self.ids.len();
        id
    }

    /// True right after the last class of a cycle was consumed.
    pub fn wrapped(&self) -> bool {
        self.index == 0
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 1-based position within the cycle, for the trial counter label.
    pub fn position(&self) -> usize {
        self.index + 1
    }
}

/// One ordered list of samples per device, reset at block-set
/// boundaries. Mutations happen only between trials, never mid-capture,
/// so a reset can't corrupt an in-flight recording.
#[derive(Debug, Clone, Default)]
pub struct DeviceBuckets {
    pub mouse: Vec<TrialSample>,
    pub gamepad: Vec<TrialSample>,
    pub gamepad_cursor: Vec<TrialSample>,
}

impl DeviceBuckets {
    pub fn get(&self, device: Device) -> &[TrialSample] {
        match device {
            Device::Mouse => &self.mouse,
            Device::GamepadPointer => &self.gamepad,
            Device::GamepadCursor => &self.gamepad_cursor,
        }
    }

    pub fn push(&mut self, device: Device, sample: TrialSample) {
        match device {
            Device::Mouse => self.mouse.push(sample),
            Device::GamepadPointer => self.gamepad.push(sample),
            Device::GamepadCursor => self.gamepad_cursor.push(sample),
        }
    }

    /// Strip duration outliers from one device's bucket, per ID class.
    pub fn filter(&mut self, device: Device) {
        let bucket = match device {
            Device::Mouse => &mut self.mouse,
            Device::GamepadPointer => &mut self.gamepad,
            Device::GamepadCursor => &mut self.gamepad_cursor,
        };
        *bucket = filter_outliers(bucket);
    }

    pub fn clear(&mut self) {
        self.mouse.clear();
        self.gamepad.clear();
        self.gamepad_cursor.clear();
    }
}

/// Fixed-duration countdown between phases. Blocks phase advancement
/// but not input capture; the state machine ignores stray events while
/// it runs, and only expiry (never user action) opens it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountdownGate {
    pub deadline: f64,
    pub instruction: Instruction,
}

impl CountdownGate {
    pub fn new(now: f64, instruction: Instruction) -> Self {
        Self {
            deadline: now + PAUSE_MS,
            instruction,
        }
    }

    pub fn expired(&self, now: f64) -> bool {
        now >= self.deadline
    }

    pub fn seconds_remaining(&self, now: f64) -> f64 {
        ((self.deadline - now) / 1000.0).max(0.0)
    }
}

/// What follows a completed block set (all ID classes once on the
/// current device).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseTransition {
    /// Pause, then continue on the next device. Entering the
    /// enlarged-cursor phase is the caller's cue to calibrate.
    NextDevice {
        device: Device,
        instruction: Instruction,
    },
    /// All three phases done: export the buckets and fall back to
    /// training.
    Complete,
}

/// Phase state of a device-comparison run. The device order depends on
/// which device the run started with; the enlarged-cursor phase always
/// comes last.
#[derive(Debug)]
pub struct Experiment {
    pub mode: Mode,
    pub buckets: DeviceBuckets,
    pub ids: IdSequence,
    plan: [Device; 3],
    step: usize,
    gate: Option<CountdownGate>,
}

impl Experiment {
    pub fn new() -> Self {
        Self {
            mode: Mode::Training,
            buckets: DeviceBuckets::default(),
            ids: IdSequence::new(&ID_CLASSES),
            plan: [Device::Mouse, Device::GamepadPointer, Device::GamepadCursor],
            step: 0,
            gate: None,
        }
    }

    pub fn current_device(&self) -> Device {
        self.plan[self.step.min(2)]
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Begin an experiment run: shuffle the ID cycle, clear buckets,
    /// fix the device order, and gate the first phase behind the
    /// instructional countdown.
    pub fn start<R: Rng>(&mut self, start_with_gamepad: bool, now: f64, rng: &mut R) {
        self.mode = Mode::Experiment;
        self.buckets.clear();
        self.ids.shuffle(rng);
        self.plan = if start_with_gamepad {
            [Device::GamepadPointer, Device::Mouse, Device::GamepadCursor]
        } else {
            [Device::Mouse, Device::GamepadPointer, Device::GamepadCursor]
        };
        self.step = 0;
        self.gate = Some(CountdownGate::new(now, self.current_device().instruction()));
    }

    /// Abort/finish: back to training, buckets dropped.
    pub fn switch_to_training(&mut self) {
        self.mode = Mode::Training;
        self.buckets.clear();
        self.step = 0;
        self.gate = None;
    }

    /// Record a completed trial into the current device's bucket.
    pub fn record(&mut self, sample: TrialSample) {
        self.buckets.push(self.current_device(), sample);
    }

    /// Handle the ID cycle wrapping on the current device: strip that
    /// bucket's outliers and advance the phase. On `NextDevice` the
    /// instructional gate is armed; on `Complete` the caller exports
    /// and the run ends.
    pub fn complete_block_set(&mut self, now: f64) -> PhaseTransition {
        let finished = self.current_device();
        self.buckets.filter(finished);

        self.step += 1;
        if self.step >= self.plan.len() {
            PhaseTransition::Complete
        } else {
            let device = self.current_device();
            let instruction = device.instruction();
            self.gate = Some(CountdownGate::new(now, instruction));
            PhaseTransition::NextDevice {
                device,
                instruction,
            }
        }
    }

    pub fn gate(&self) -> Option<&CountdownGate> {
        self.gate.as_ref()
    }

    /// True while the countdown is still running at `now`; an expired
    /// gate is dropped on the way out.
    pub fn pause_active(&mut self, now: f64) -> bool {
        match self.gate {
            Some(gate) if gate.expired(now) => {
                self.gate = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

impl Default for Experiment {
    fn default() -> Self {
        Self::new()
    }
}
