//! Trial lifecycle: one armed target at a time, a path accumulating
//! between hits, hit/miss classification, and block completion after a
//! full traversal of the ring.

use crate::geometry::{point_distance, Point};
use crate::layout::{generate_layout, next_position, IsoParams, Target};
use crate::util::tukey_fence;

/// Trials slower than this are obvious outliers (distraction, device
/// drop) and are discarded at capture time, never stored.
pub const MAX_TRIAL_MS: f64 = 6000.0;

/// A completed pointing trial, immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub start: Point,
    pub target: Target,
    pub path: Vec<Point>,
    pub hit: Point,
    /// `hit.t - start.t`, milliseconds.
    pub time: f64,
}

impl TrialRecord {
    pub fn width(&self) -> f64 {
        self.target.w
    }

    /// Nominal amplitude class the trial was presented at.
    pub fn nominal_distance(&self) -> f64 {
        self.target.distance
    }

    /// Actual start→hit distance, used as the effective amplitude.
    pub fn real_distance(&self) -> f64 {
        point_distance(&self.start, &self.hit)
    }
}

/// Flat per-trial row stored in a device bucket and exported as-is.
/// `id` is the assigned difficulty class of the block the trial ran in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSample {
    pub id: f64,
    pub time: f64,
    pub distance: f64,
    pub width: f64,
    pub cursor_diameter: Option<f64>,
}

/// Drops duration outliers per assigned ID class using the Tukey fence
/// of that class alone. Classes with fewer than four samples are kept
/// unfiltered; each class's fence is computed from the unfiltered
/// input, so filtering one class never shifts another's quartiles.
pub fn filter_outliers(samples: &[TrialSample]) -> Vec<TrialSample> {
    let mut classes: Vec<f64> = Vec::new();
    for s in samples {
        if !classes.contains(&s.id) {
            classes.push(s.id);
        }
    }

    let mut kept: Vec<TrialSample> = samples.to_vec();
    for id in classes {
        let mut times: Vec<f64> = samples
            .iter()
            .filter(|s| s.id == id)
            .map(|s| s.time)
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));

        if let Some((lo, hi)) = tukey_fence(&times) {
            kept.retain(|s| s.id != id || (s.time >= lo && s.time <= hi));
        }
    }
    kept
}

/// Lifecycle of the currently presented target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    /// No layout yet.
    Idle,
    /// A target is shown, no motion recorded toward it.
    Armed,
    /// The path is accumulating.
    Active,
    /// The ring has been fully traversed; awaiting re-randomization or
    /// a counter reset.
    BlockComplete,
}

/// What a press event amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum HitOutcome {
    /// Outside the active target; only the miss counter moves.
    Miss,
    Hit {
        /// `None` when the trial exceeded [`MAX_TRIAL_MS`] and was
        /// discarded at capture.
        record: Option<TrialRecord>,
        /// The hit finished the block of N targets.
        block_complete: bool,
    },
}

/// The trial-sequencing state machine. Owns the ring positions, the
/// active target, and the in-flight path; knows nothing about devices,
/// phases, or data sets.
#[derive(Debug)]
pub struct TrialEngine {
    positions: Vec<Target>,
    current_position: usize,
    current_count: usize,
    pub miss_count: u32,
    pub cursor_diameter: f64,
    target: Option<Target>,
    path: Vec<Point>,
    start: Point,
    last: Point,
    state: TrialState,
}

impl TrialEngine {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            current_position: 0,
            current_count: 0,
            miss_count: 0,
            cursor_diameter: 0.0,
            target: None,
            path: Vec::new(),
            start: Point::new(0.0, 0.0, 0.0),
            last: Point::new(0.0, 0.0, 0.0),
            state: TrialState::Idle,
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn positions(&self) -> &[Target] {
        &self.positions
    }

    pub fn trials_this_block(&self) -> usize {
        self.current_count
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn last_cursor(&self) -> Point {
        self.last
    }

    /// The first trial of a run has no prior hit; anchor it at the
    /// initial cursor position at zero time.
    pub fn seed_cursor(&mut self, x: f64, y: f64) {
        let p = Point::new(x, y, 0.0);
        self.start = p;
        self.last = p;
    }

    /// Regenerate the ring for the given parameters and arm the next
    /// target. The position pointer survives rebuilds, as the apparatus
    /// keeps stepping the same alternating order across blocks.
    pub fn rebuild(&mut self, params: &IsoParams, center: (f64, f64)) {
        self.positions = generate_layout(params.count, params.distance, params.width, center);
        self.cursor_diameter = params.cursor_diameter;
        self.current_count = 0;
        if self.current_position >= self.positions.len() {
            self.current_position = 0;
        }
        self.arm_next();
    }

    /// Keep the current layout but start a fresh block (randomize off).
    pub fn reset_block(&mut self) {
        self.current_count = 0;
        self.miss_count = 0;
        self.arm_next();
    }

    fn arm_next(&mut self) {
        if self.positions.is_empty() {
            self.target = None;
            self.state = TrialState::Idle;
            return;
        }
        self.target = Some(self.positions[self.current_position]);
        self.current_position = next_position(self.current_position, self.positions.len());
        self.state = TrialState::Armed;
    }

    /// True when a press at the cursor position would land inside the
    /// target, the (possibly enlarged) cursor disc included. The UI
    /// colours the target with this on every move.
    pub fn would_hit(&self, x: f64, y: f64) -> bool {
        match &self.target {
            Some(target) => {
                target.center_distance_to(x, y) - self.cursor_diameter / 2.0 < target.w / 2.0
            }
            None => false,
        }
    }

    /// Pointer motion: appends to the path and activates an armed
    /// trial. Duplicate positions are dropped.
    pub fn on_move(&mut self, p: Point) {
        if p.same_position(&self.last) {
            return;
        }
        self.path.push(p);
        self.last = p;
        if self.state == TrialState::Armed {
            self.state = TrialState::Active;
        }
    }

    /// Press event. A hit captures the trial, re-anchors the path at
    /// the hit point, and either arms the next target or completes the
    /// block after the ring's worth of hits.
    pub fn on_press(&mut self, p: Point) -> HitOutcome {
        if !matches!(self.state, TrialState::Armed | TrialState::Active) {
            return HitOutcome::Miss;
        }
        if !self.would_hit(p.x, p.y) {
            self.miss_count += 1;
            return HitOutcome::Miss;
        }

        // target presence is guaranteed by would_hit
        let target = self.target.take().unwrap_or_else(|| unreachable!());
        let time = p.t - self.start.t;
        let record = if time < MAX_TRIAL_MS {
            Some(TrialRecord {
                start: self.start,
                target,
                path: std::mem::take(&mut self.path),
                hit: p,
                time,
            })
        } else {
            self.path.clear();
            None
        };

        // the hit point anchors the next trial
        self.start = p;
        self.last = p;
        self.path.push(p);

        self.current_count += 1;
        let block_complete = self.current_count >= self.positions.len();
        if block_complete {
            self.state = TrialState::BlockComplete;
        } else {
            self.arm_next();
        }

        HitOutcome::Hit {
            record,
            block_complete,
        }
    }
}

impl Default for TrialEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const CENTER: (f64, f64) = (450.0, 325.0);

    fn engine(count: usize) -> TrialEngine {
        let params = IsoParams {
            count,
            distance: 200.0,
            width: 20.0,
            ..IsoParams::default()
        };
        let mut e = TrialEngine::new();
        e.seed_cursor(CENTER.0, CENTER.1);
        e.rebuild(&params, CENTER);
        e
    }

    fn hit_current(e: &mut TrialEngine, t: f64) -> HitOutcome {
        let target = *e.target().unwrap();
        e.on_move(Point::new(target.x + 1.0, target.y, t - 1.0));
        e.on_press(Point::new(target.x, target.y, t))
    }

    #[test]
    fn test_new_engine_is_idle() {
        let e = TrialEngine::new();
        assert_eq!(e.state(), TrialState::Idle);
        assert!(e.target().is_none());
    }

    #[test]
    fn test_rebuild_arms_target() {
        let e = engine(4);
        assert_eq!(e.state(), TrialState::Armed);
        assert!(e.target().is_some());
        assert_eq!(e.positions().len(), 4);
    }

    #[test]
    fn test_motion_activates() {
        let mut e = engine(4);
        e.on_move(Point::new(10.0, 10.0, 5.0));
        assert_eq!(e.state(), TrialState::Active);
        assert_eq!(e.path().len(), 1);
    }

    #[test]
    fn test_duplicate_motion_ignored() {
        let mut e = engine(4);
        e.on_move(Point::new(10.0, 10.0, 5.0));
        e.on_move(Point::new(10.0, 10.0, 8.0));
        assert_eq!(e.path().len(), 1);
    }

    #[test]
    fn test_miss_increments_counter_only() {
        let mut e = engine(4);
        let far = Point::new(0.0, 0.0, 10.0);
        assert_matches!(e.on_press(far), HitOutcome::Miss);
        assert_eq!(e.miss_count, 1);
        assert_eq!(e.trials_this_block(), 0);
    }

    #[test]
    fn test_hit_records_and_advances() {
        let mut e = engine(4);
        let before = *e.target().unwrap();

        match hit_current(&mut e, 500.0) {
            HitOutcome::Hit {
                record: Some(record),
                block_complete: false,
            } => {
                assert_eq!(record.target, before);
                assert_eq!(record.time, 500.0);
                assert_eq!(record.start.t, 0.0);
                assert!(!record.path.is_empty());
            }
            other => panic!("expected recorded hit, got {:?}", other),
        }
        assert_ne!(e.target().unwrap(), &before);
        assert_eq!(e.state(), TrialState::Armed);
    }

    #[test]
    fn test_enlarged_cursor_widens_hit_area() {
        let mut e = engine(4);
        let target = *e.target().unwrap();
        // 20 past the rim misses with a point cursor
        assert!(!e.would_hit(target.x + target.w / 2.0 + 20.0, target.y));
        e.cursor_diameter = 60.0;
        assert!(e.would_hit(target.x + target.w / 2.0 + 20.0, target.y));
    }

    #[test]
    fn test_capture_ceiling_discards_record() {
        let mut e = engine(4);
        match hit_current(&mut e, MAX_TRIAL_MS + 1.0) {
            HitOutcome::Hit {
                record,
                block_complete,
            } => {
                assert_eq!(record, None);
                assert!(!block_complete);
            }
            other => panic!("expected hit, got {:?}", other),
        }
        // sequencing still advanced
        assert_eq!(e.trials_this_block(), 1);
    }

    #[test]
    fn test_block_completes_after_ring() {
        let mut e = engine(4);
        for i in 0..3 {
            assert_matches!(
                hit_current(&mut e, (i + 1) as f64 * 400.0),
                HitOutcome::Hit {
                    block_complete: false,
                    ..
                }
            );
        }
        assert_matches!(
            hit_current(&mut e, 1600.0),
            HitOutcome::Hit {
                block_complete: true,
                ..
            }
        );
        assert_eq!(e.state(), TrialState::BlockComplete);

        // presses while complete are stray input
        assert_matches!(
            e.on_press(Point::new(CENTER.0, CENTER.1, 1700.0)),
            HitOutcome::Miss
        );

        e.reset_block();
        assert_eq!(e.state(), TrialState::Armed);
        assert_eq!(e.trials_this_block(), 0);
    }

    #[test]
    fn test_next_trial_starts_at_hit() {
        let mut e = engine(4);
        let target = *e.target().unwrap();
        hit_current(&mut e, 300.0);

        match hit_current(&mut e, 700.0) {
            HitOutcome::Hit {
                record: Some(record),
                ..
            } => {
                assert_eq!(record.start.x, target.x);
                assert_eq!(record.start.t, 300.0);
                assert_eq!(record.time, 400.0);
            }
            other => panic!("expected recorded hit, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_outliers_per_class() {
        let s = |id: f64, time: f64| TrialSample {
            id,
            time,
            distance: 200.0,
            width: 20.0,
            cursor_diameter: None,
        };
        let samples = vec![
            s(2.0, 400.0),
            s(2.0, 410.0),
            s(2.0, 390.0),
            s(2.0, 5000.0), // far outside the class-2 fence
            s(3.0, 100.0),
            s(3.0, 5000.0), // class 3 has < 4 samples, kept
        ];

        let kept = filter_outliers(&samples);
        assert_eq!(kept.len(), 5);
        assert!(kept.iter().all(|x| x.id != 2.0 || x.time < 1000.0));
        assert_eq!(kept.iter().filter(|x| x.id == 3.0).count(), 2);
    }

    #[test]
    fn test_filter_outliers_keeps_order() {
        let s = |id: f64, time: f64| TrialSample {
            id,
            time,
            distance: 200.0,
            width: 20.0,
            cursor_diameter: None,
        };
        let samples = vec![s(2.0, 430.0), s(2.0, 400.0), s(2.0, 420.0), s(2.0, 410.0)];
        let kept = filter_outliers(&samples);
        let times: Vec<f64> = kept.iter().map(|x| x.time).collect();
        assert_eq!(times, vec![430.0, 400.0, 420.0, 410.0]);
    }
}
