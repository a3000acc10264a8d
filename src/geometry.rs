//! Plane geometry for the pointing task: cursor samples, the ideal
//! start→target line, and the projections the effective-width analysis
//! is built on.

/// A cursor sample inside the test area. `t` is monotonic milliseconds
/// supplied by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }

    /// Same coordinates, ignoring the timestamp.
    pub fn same_position(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Result of projecting a point onto the line A→B. `t` is the scalar
/// line parameter: 0 at A, 1 at B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

pub fn point_distance(a: &Point, b: &Point) -> f64 {
    distance(a.x, a.y, b.x, b.y)
}

/// Orthogonal projection of `p` onto the line through `a` and `b`.
/// Returns `None` when the segment is degenerate (a == b); callers treat
/// that as "no offset" rather than dividing by a zero-length direction.
pub fn project(a: &Point, b: &Point, p: &Point) -> Option<Projection> {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let ab_squared = abx * abx + aby * aby;
    if ab_squared == 0.0 {
        return None;
    }
    let apx = p.x - a.x;
    let apy = p.y - a.y;
    let t = (apx * abx + apy * aby) / ab_squared;
    Some(Projection {
        x: a.x + t * abx,
        y: a.y + t * aby,
        t,
    })
}

/// Which side of the directed line A→B the point lies on: +1.0 for left
/// (or exactly on the line), -1.0 for right. Cross-product sign with
/// ties broken toward +1.
pub fn is_left(a: &Point, b: &Point, p: &Point) -> f64 {
    if (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x) >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Sign with ties broken toward +1, matching `is_left`.
pub fn sign(a: f64) -> f64 {
    if a >= 0.0 {
        1.0
    } else {
        -1.0
    }
}
