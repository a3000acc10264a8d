use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use isofitts::config::{ConfigStore, FileConfigStore};
use isofitts::export::ExportTables;
use isofitts::runtime::{ChannelEventSource, FixedTicker, PointerEvent, Runner};
use isofitts::session::{Session, SessionEvent};

/// Pointer poll cadence used by the simulated participant.
const POLL_INTERVAL_MS: f64 = 16.0;
/// Simulated mouse travel per poll, in pixels. The gamepad uses the
/// session's own sensibility instead.
const MOUSE_SPEED: f64 = 25.0;

/// fitts' law pointing experiment engine with a headless participant simulator
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs an ISO 9241-9 ring-of-targets pointing task headlessly: a simulated participant steers the pointer through training blocks or a full three-device experiment, and the collected trials are reported as effective-throughput analytics and canonical CSV tables."
)]
pub struct Cli {
    /// task mode to run
    #[clap(short, long, value_enum, default_value_t = RunMode::Training)]
    mode: RunMode,

    /// training blocks to simulate before reporting
    #[clap(short, long, default_value_t = 7)]
    blocks: usize,

    /// number of targets on the ring
    #[clap(short, long)]
    targets: Option<usize>,

    /// ring diameter in pixels
    #[clap(short, long)]
    distance: Option<f64>,

    /// fixed target width in pixels (turns per-block randomization off)
    #[clap(short, long)]
    width: Option<f64>,

    /// seed for a reproducible run
    #[clap(short, long)]
    seed: Option<u64>,

    /// write the canonical csv tables to this directory after an experiment
    #[clap(short, long)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum, strum_macros::Display)]
pub enum RunMode {
    /// free practice, one data set, no device sequencing
    Training,
    /// mouse, then gamepad pointer, then enlarged gamepad cursor
    Experiment1,
    /// gamepad pointer first, mouse second, enlarged cursor last
    Experiment2,
}

/// Simulated participant: steers the pointer towards the active target
/// with a wobbly heading and presses somewhere inside it, one poll at a
/// time through the event channel.
struct Simulator {
    rng: StdRng,
    clock: f64,
}

impl Simulator {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock: 0.0,
        }
    }

    fn run_trial(&mut self, session: &mut Session) -> Vec<SessionEvent> {
        let Some(target) = session.engine.target().copied() else {
            return Vec::new();
        };

        let (tx, source) = ChannelEventSource::new();
        let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(1)));
        let mut events = Vec::new();

        let cursor = session.engine.last_cursor();
        let (mut x, mut y) = (cursor.x, cursor.y);

        // land inside the target, not dead centre
        let aim_r = self.rng.gen_range(0.0..target.w * 0.35);
        let aim_a = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let (ax, ay) = (
            target.x + aim_r * aim_a.cos(),
            target.y + aim_r * aim_a.sin(),
        );

        loop {
            // the gamepad slows down near the target; read the step
            // after every applied move so the simulator sees it
            let step = if session.gamepad_active() {
                session.gamepad_sensibility
            } else {
                MOUSE_SPEED
            };
            let (dx, dy) = (ax - x, ay - y);
            self.clock += POLL_INTERVAL_MS;
            if (dx * dx + dy * dy).sqrt() <= step {
                let _ = tx.send(PointerEvent::Move {
                    x: ax,
                    y: ay,
                    t: self.clock,
                });
                events.extend(runner.dispatch(session));
                break;
            }
            let heading = dy.atan2(dx) + self.rng.gen_range(-0.2..0.2);
            x += step * heading.cos();
            y += step * heading.sin();
            let _ = tx.send(PointerEvent::Move {
                x,
                y,
                t: self.clock,
            });
            events.extend(runner.dispatch(session));
        }

        self.clock += POLL_INTERVAL_MS;
        let _ = tx.send(PointerEvent::Press {
            x: ax,
            y: ay,
            t: self.clock,
        });
        events.extend(runner.dispatch(session));
        events
    }
}

fn run_training(session: &mut Session, sim: &mut Simulator, blocks: usize) {
    let per_block = session.params.count;
    for _ in 0..blocks {
        for _ in 0..per_block {
            for ev in sim.run_trial(session) {
                if ev == SessionEvent::Missed {
                    println!("miss");
                }
            }
        }
    }
}

fn run_experiment(
    session: &mut Session,
    sim: &mut Simulator,
    start_with_gamepad: bool,
) -> Option<ExportTables> {
    let mut pending = session.start_experiment(start_with_gamepad, sim.clock);
    loop {
        for ev in pending.drain(..) {
            match ev {
                SessionEvent::PhasePaused {
                    device,
                    instruction,
                    until,
                } => {
                    println!("{} ({} phase)", instruction, device);
                    // the simulated participant just waits the countdown out
                    sim.clock = sim.clock.max(until) + POLL_INTERVAL_MS;
                }
                SessionEvent::CalibrationApplied { cursor_diameter } => {
                    println!("calibrated cursor diameter: {cursor_diameter:.1}px");
                }
                SessionEvent::ExperimentComplete { tables } => return Some(tables),
                _ => {}
            }
        }
        pending = sim.run_trial(session);
    }
}

fn print_report(session: &Session) {
    let analysis = session.datasets.current().analyze();
    println!("trials recorded: {}", analysis.trials.len());
    for g in &analysis.groups {
        println!(
            "  A={:>3.0} W={:>5.1}  n={:>2}  We={:>5.1}  De={:>5.1}",
            g.distance, g.width, g.n, g.effective_width, g.effective_distance,
        );
    }
    if let Some(fit) = &analysis.fit {
        println!(
            "fitts fit: MT = {:.0} + {:.0} * IDe  (IDe {:.2}..{:.2})",
            fit.intercept, fit.slope, fit.ide_min, fit.ide_max,
        );
    }
    if let Some(tp) = analysis.mean_throughput {
        println!("mean throughput: {tp:.2} bits/s");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = FileConfigStore::new().load();
    if let Some(t) = cli.targets {
        config.target_count = t.max(2);
    }
    if let Some(d) = cli.distance {
        config.ring_distance = d.clamp(config.limits.min_distance, config.limits.max_distance);
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut session = Session::seeded(&config, seed);
    let mut sim = Simulator::new(seed ^ 0x5eed);

    if let Some(w) = cli.width {
        session.set_width(w);
    }

    let tables = match cli.mode {
        RunMode::Training => {
            run_training(&mut session, &mut sim, cli.blocks);
            None
        }
        RunMode::Experiment1 => run_experiment(&mut session, &mut sim, false),
        RunMode::Experiment2 => run_experiment(&mut session, &mut sim, true),
    };

    print_report(&session);

    if let Some(tables) = tables {
        if let Some(dir) = &cli.out_dir {
            for path in tables.write_to_dir(dir)? {
                println!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}
