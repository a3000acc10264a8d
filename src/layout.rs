//! ISO 9241-9 ring layout: circular targets evenly spaced on a ring
//! centred in the test area, visited in an alternating order that keeps
//! per-trial movement amplitude close to the ring distance.

use serde::{Deserialize, Serialize};

use crate::geometry::distance;

/// One circular target on the ring. `w` is the diameter, `distance` the
/// nominal centre-to-centre amplitude from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub distance: f64,
}

impl Target {
    pub fn center_distance_to(&self, x: f64, y: f64) -> f64 {
        distance(self.x, self.y, x, y)
    }
}

/// Adjustable task parameters, driven by the UI control surface or the
/// per-block randomizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoParams {
    pub count: usize,
    pub distance: f64,
    pub width: f64,
    pub cursor_diameter: f64,
    pub randomize: bool,
}

impl Default for IsoParams {
    fn default() -> Self {
        Self {
            count: 9,
            distance: 500.0,
            width: 50.0,
            cursor_diameter: 0.0,
            randomize: true,
        }
    }
}

/// Slider bounds published to the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoLimits {
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub min_cursor: f64,
    pub max_cursor: f64,
}

impl Default for IsoLimits {
    fn default() -> Self {
        Self {
            min_distance: 120.0,
            max_distance: 300.0,
            min_width: 10.0,
            max_width: 100.0,
            min_cursor: 0.0,
            max_cursor: 100.0,
        }
    }
}

/// Evenly spaces `count` targets of diameter `width` on a ring of
/// diameter `ring_distance` around `center`. Deterministic; angle 0 is
/// on the +x axis and angles grow toward +y.
pub fn generate_layout(
    count: usize,
    ring_distance: f64,
    width: f64,
    center: (f64, f64),
) -> Vec<Target> {
    let (cx, cy) = center;
    (0..count)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / count as f64;
            Target {
                x: cx + (ring_distance / 2.0) * angle.cos(),
                y: cy + (ring_distance / 2.0) * angle.sin(),
                w: width,
                distance: ring_distance,
            }
        })
        .collect()
}

/// Index of the target to visit after position `i`, stepping roughly
/// halfway around the ring so consecutive trials cross the centre.
///
/// The stride is `ceil(count / 2)`, taken verbatim from the original
/// apparatus. For even counts it shares a factor with `count` and only a
/// subset of positions is ever visited (count 4 alternates between
/// indices 0 and 2); kept as-is pending clarification of intended
/// coverage.
pub fn next_position(i: usize, count: usize) -> usize {
    (i + count.div_ceil(2)) % count
}
