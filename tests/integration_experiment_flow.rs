use isofitts::config::Config;
use isofitts::experiment::{Device, Instruction, Mode};
use isofitts::export::ExportTables;
use isofitts::session::{Session, SessionEvent};

fn hit_active(session: &mut Session, clock: &mut f64, delta: f64) -> Vec<SessionEvent> {
    let target = *session.engine.target().expect("armed target");
    session.on_move(target.x + 0.5, target.y, *clock + delta - 1.0);
    *clock += delta;
    session.on_press(target.x, target.y, *clock)
}

/// Plays a whole three-phase experiment: per-device trial times grow
/// linearly with the difficulty class (the gamepad slower than the
/// mouse) so the calibration regressions are well-conditioned.
fn drive_to_completion(
    session: &mut Session,
    start_with_gamepad: bool,
) -> (ExportTables, Vec<f64>) {
    let mut clock = 0.0;
    let mut pending = session.start_experiment(start_with_gamepad, clock);
    let mut calibrations = Vec::new();

    for _ in 0..1000 {
        for ev in pending.drain(..) {
            match ev {
                SessionEvent::PhasePaused { until, .. } => clock = until + 1.0,
                SessionEvent::CalibrationApplied { cursor_diameter } => {
                    calibrations.push(cursor_diameter)
                }
                SessionEvent::ExperimentComplete { tables } => return (tables, calibrations),
                _ => {}
            }
        }
        let id = session.current_block_id();
        let delta = match session.experiment.current_device() {
            Device::Mouse => 150.0 + 120.0 * id,
            Device::GamepadPointer => 250.0 + 180.0 * id,
            Device::GamepadCursor => 300.0 + 150.0 * id,
        };
        pending = hit_active(session, &mut clock, delta);
    }
    panic!("experiment did not complete");
}

#[test]
fn full_run_exports_all_three_device_tables() {
    let mut session = Session::seeded(&Config::default(), 3);
    let (tables, _) = drive_to_completion(&mut session, false);

    // 7 difficulty classes x 9 targets per device, minus the first
    // trial of each phase: its elapsed time spans the countdown and
    // exceeds the capture ceiling. The perfectly regular trial times
    // survive the outlier pass untouched.
    for table in [&tables.mouse, &tables.gamepad, &tables.gamepad_cursor] {
        assert_eq!(table.lines().count(), 1 + 7 * 9 - 1);
    }
    assert!(tables.mouse.starts_with("id,time,device\n"));
    assert!(tables.mouse.lines().nth(1).unwrap().ends_with(",mouse"));
    assert!(tables.gamepad.lines().nth(1).unwrap().ends_with(",gamepad"));
    assert!(tables
        .gamepad_cursor
        .lines()
        .nth(1)
        .unwrap()
        .ends_with(",gamepad_cursor"));

    // one diameter row per difficulty class
    assert!(tables.cursor_diameter.starts_with("id,cursor_diameter\n"));
    assert_eq!(tables.cursor_diameter.lines().count(), 1 + 7);
}

#[test]
fn cursor_phase_recalibrates_every_block() {
    let mut session = Session::seeded(&Config::default(), 3);
    let (_, calibrations) = drive_to_completion(&mut session, false);

    // once on entering the enlarged-cursor phase, then per rollover
    assert_eq!(calibrations.len(), 7);
    for d in calibrations {
        // the gamepad times run above the mouse's, so every class gets
        // an actual enlargement, capped at the ring distance
        assert!(d > 0.0);
        assert!(d <= session.params.distance);
    }
}

#[test]
fn completion_falls_back_to_training() {
    let mut session = Session::seeded(&Config::default(), 5);
    drive_to_completion(&mut session, false);

    assert_eq!(session.experiment.mode, Mode::Training);
    assert!(session.experiment.buckets.mouse.is_empty());
    assert_eq!(session.params.cursor_diameter, 0.0);
    assert!(!session.gamepad_active());
}

#[test]
fn gamepad_start_swaps_the_first_two_phases() {
    let mut session = Session::seeded(&Config::default(), 5);
    let events = session.start_experiment(true, 0.0);

    assert_eq!(session.experiment.current_device(), Device::GamepadPointer);
    assert!(matches!(
        events[0],
        SessionEvent::PhasePaused {
            device: Device::GamepadPointer,
            instruction: Instruction::TakeGamepad,
            ..
        }
    ));

    // a full run still ends with the enlarged-cursor phase exported
    let (tables, calibrations) = drive_to_completion(&mut session, true);
    assert_eq!(tables.gamepad_cursor.lines().count(), 1 + 7 * 9 - 1);
    assert_eq!(calibrations.len(), 7);
}

#[test]
fn countdown_gate_swallows_early_input() {
    let mut session = Session::seeded(&Config::default(), 9);
    let events = session.start_experiment(false, 0.0);
    let until = match events[0] {
        SessionEvent::PhasePaused { until, .. } => until,
        _ => panic!("expected the countdown first"),
    };

    let target = *session.engine.target().expect("armed target");
    assert!(session.on_press(target.x, target.y, until - 1.0).is_empty());
    assert!(session.experiment.buckets.mouse.is_empty());

    // once the countdown expires the press counts as a hit, but its
    // elapsed time spans the whole countdown and exceeds the capture
    // ceiling, so no sample lands
    let mut clock = until + 1.0;
    hit_active(&mut session, &mut clock, 400.0);
    assert_eq!(session.engine.trials_this_block(), 1);
    assert!(session.experiment.buckets.mouse.is_empty());

    // the next trial is timed from the previous hit and is captured
    let events = hit_active(&mut session, &mut clock, 400.0);
    assert!(events
        .iter()
        .any(|ev| matches!(ev, SessionEvent::TrialRecorded { .. })));
    assert_eq!(session.experiment.buckets.mouse.len(), 1);
}
