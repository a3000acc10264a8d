//! Effective-metrics analysis: the MacKenzie/Buxton "smaller-of" model.
//! Completed trials are grouped by nominal (distance, width), hit
//! scatter is projected onto the ideal movement line, and the spread
//! becomes an effective width from which IDe and throughput follow.

use itertools::Itertools;

use crate::geometry::{distance, is_left, point_distance, project, sign, Point};
use crate::trial::TrialRecord;
use crate::util::{covariance, mean, variance};

/// 2 * 1.96 * 1.0826: maps the hit-scatter standard deviation to the
/// width of a target a 96%-accurate normal aimer would fill.
pub const EFFECTIVE_WIDTH_FACTOR: f64 = 4.133;

/// Velocity ceiling the renderer uses for colour scaling, pixel/ms.
pub const MAX_SPEED: f64 = 6.0;

/// Shannon formulation of the index of difficulty.
pub fn fitts(amplitude: f64, width: f64) -> f64 {
    (amplitude / width + 1.0).log2()
}

/// Width that yields the requested difficulty at a fixed amplitude;
/// inverse of [`fitts`]. Used by the randomizer to realize an ID class.
pub fn inverted_fitts(amplitude: f64, id: f64) -> f64 {
    amplitude / (2f64.powf(id) - 1.0)
}

/// One trial with its derived effective measures.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveTrial {
    pub time: f64,
    /// Axial hit offset: distance from the projected hit to the target
    /// centre, signed by overshoot (+) vs undershoot (-).
    pub offset_x: f64,
    /// Lateral hit offset, signed by side of the movement line.
    pub offset_y: f64,
    pub real_distance: f64,
    pub nominal_id: f64,
    pub ide: f64,
    pub throughput: f64,
}

/// Per-(distance, width) group summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMetrics {
    pub distance: f64,
    pub width: f64,
    pub n: usize,
    pub x_effective: f64,
    pub y_effective: f64,
    pub effective_width: f64,
    pub effective_distance: f64,
}

/// The pooled time~IDe fit line, reported over the IDe domain actually
/// observed in the data set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittsFit {
    pub slope: f64,
    pub intercept: f64,
    pub ide_min: f64,
    pub ide_max: f64,
}

impl FittsFit {
    pub fn at(&self, ide: f64) -> f64 {
        self.intercept + self.slope * ide
    }
}

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub trials: Vec<EffectiveTrial>,
    pub groups: Vec<GroupMetrics>,
    pub fit: Option<FittsFit>,
    pub mean_throughput: Option<f64>,
}

/// Signed (axial, lateral) hit offset of a trial relative to its ideal
/// start→target line. A degenerate line (start on the target centre)
/// yields no measurable offset.
pub fn hit_offsets(record: &TrialRecord) -> (f64, f64) {
    let target_center = Point::new(record.target.x, record.target.y, 0.0);
    match project(&record.start, &target_center, &record.hit) {
        Some(q) => {
            let qp = Point::new(q.x, q.y, 0.0);
            let x = point_distance(&qp, &target_center) * sign(q.t - 1.0);
            let y = point_distance(&qp, &record.hit)
                * is_left(&record.start, &target_center, &record.hit);
            (x, y)
        }
        None => (0.0, 0.0),
    }
}

/// Runs the smaller-of model over a data set's completed trials.
///
/// Groups with fewer than three members carry too little variance
/// information and are skipped; so are groups whose effective width
/// degenerates to zero, where IDe is undefined. The analysis is total:
/// any trial history yields a (possibly empty) result, never an error.
pub fn analyze(records: &[TrialRecord]) -> Analysis {
    let groups = records
        .iter()
        .map(|r| {
            (
                (r.nominal_distance().to_bits(), r.width().to_bits()),
                r,
            )
        })
        .into_group_map();

    let mut analysis = Analysis::default();

    // deterministic group order regardless of map iteration
    for (_, group) in groups.into_iter().sorted_by_key(|(key, _)| *key) {
        if group.len() < 3 {
            continue;
        }

        let offsets: Vec<(f64, f64)> = group.iter().map(|r| hit_offsets(r)).collect();
        let xs: Vec<f64> = offsets.iter().map(|o| o.0).collect();
        let ys: Vec<f64> = offsets.iter().map(|o| o.1).collect();
        let reals: Vec<f64> = group.iter().map(|r| r.real_distance()).collect();

        let x_effective = EFFECTIVE_WIDTH_FACTOR * variance(&xs).unwrap_or(0.0).sqrt();
        let y_effective = EFFECTIVE_WIDTH_FACTOR * variance(&ys).unwrap_or(0.0).sqrt();
        let effective_width = x_effective.min(y_effective);
        let effective_distance = match mean(&reals) {
            Some(d) => d,
            None => continue,
        };

        // IDe would be a log of a division by zero
        if effective_width <= 0.0 {
            continue;
        }

        analysis.groups.push(GroupMetrics {
            distance: group[0].nominal_distance(),
            width: group[0].width(),
            n: group.len(),
            x_effective,
            y_effective,
            effective_width,
            effective_distance,
        });

        let ide = fitts(effective_distance, effective_width);
        for (record, (offset_x, offset_y)) in group.iter().zip(offsets) {
            let throughput = if record.time > 0.0 {
                1000.0 * ide / record.time
            } else {
                0.0
            };
            analysis.trials.push(EffectiveTrial {
                time: record.time,
                offset_x,
                offset_y,
                real_distance: record.real_distance(),
                nominal_id: fitts(record.real_distance(), record.width()),
                ide,
                throughput,
            });
        }
    }

    let times: Vec<f64> = analysis.trials.iter().map(|t| t.time).collect();
    let ides: Vec<f64> = analysis.trials.iter().map(|t| t.ide).collect();
    let throughputs: Vec<f64> = analysis.trials.iter().map(|t| t.throughput).collect();

    analysis.mean_throughput = mean(&throughputs);
    analysis.fit = fitts_law_fit(&times, &ides);
    analysis
}

/// Least-squares line of movement time on IDe: slope from cov/var (zero
/// when IDe carries no spread), intercept from the means.
fn fitts_law_fit(times: &[f64], ides: &[f64]) -> Option<FittsFit> {
    let mean_time = mean(times)?;
    let mean_ide = mean(ides)?;

    let var_ide = variance(ides).unwrap_or(0.0);
    let slope = if var_ide > 0.0 {
        covariance(times, ides).unwrap_or(0.0) / var_ide
    } else {
        0.0
    };
    let intercept = mean_time - slope * mean_ide;
    if !intercept.is_finite() {
        return None;
    }

    let ide_min = ides.iter().cloned().fold(f64::INFINITY, f64::min);
    let ide_max = ides.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Some(FittsFit {
        slope,
        intercept,
        ide_min,
        ide_max,
    })
}

/// A path sample in movement-line coordinates: `x` along the line from
/// the start, `y` lateral, with instantaneous speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub v: f64,
}

/// Projects a trial's raw path into movement-line coordinates and
/// derives instantaneous speed, for the position/velocity plots.
pub fn path_kinematics(record: &TrialRecord) -> Vec<PathSample> {
    let a = record.start;
    let b = Point::new(record.target.x, record.target.y, 0.0);

    let mut samples = Vec::with_capacity(record.path.len());
    let mut last = PathSample {
        x: 0.0,
        y: 0.0,
        t: record.start.t,
        v: 0.0,
    };

    for p in &record.path {
        let (x, y) = match project(&a, &b, p) {
            Some(q) => {
                let qp = Point::new(q.x, q.y, 0.0);
                (
                    point_distance(&qp, &a) * sign(q.t),
                    point_distance(&qp, p) * is_left(&a, &b, p),
                )
            }
            None => (0.0, 0.0),
        };

        let dt = p.t - last.t;
        let v = if dt > 0.0 {
            distance(last.x, last.y, x, y) / dt
        } else {
            0.0
        };

        let sample = PathSample { x, y, t: p.t, v };
        samples.push(sample);
        last = sample;
    }
    samples
}
