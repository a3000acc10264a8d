//! Cross-device cursor calibration: derive the enlarged-cursor diameter
//! that lets the gamepad match mouse pointing time at the current
//! difficulty.
//!
//! Mouse trials predict a target time at the current ID; inverting the
//! gamepad's own time~ID regression gives the difficulty the gamepad
//! can handle in that time, and the gap between the two nominal target
//! sizes becomes extra cursor diameter.

use crate::analysis::inverted_fitts;
use crate::trial::TrialSample;
use crate::util::linear_regression;

/// Computes the compensating cursor diameter from the mouse and plain
/// gamepad buckets, clamped to `[0, ring_distance]`.
///
/// Falls back to 0 whenever the procedure is undefined: either
/// regression with fewer than two distinct (ID, time) pairs, a flat
/// gamepad fit that cannot be inverted, or a non-finite correction.
pub fn calibrated_cursor_diameter(
    mouse: &[TrialSample],
    gamepad: &[TrialSample],
    current_id: f64,
    ring_distance: f64,
) -> f64 {
    let times = |samples: &[TrialSample]| samples.iter().map(|s| s.time).collect::<Vec<f64>>();
    let ids = |samples: &[TrialSample]| samples.iter().map(|s| s.id).collect::<Vec<f64>>();

    let mouse_fit = match linear_regression(&times(mouse), &ids(mouse)) {
        Some(fit) => fit,
        None => return 0.0,
    };
    let gamepad_fit = match linear_regression(&times(gamepad), &ids(gamepad)) {
        Some(fit) => fit,
        None => return 0.0,
    };

    let target_time = mouse_fit.at(current_id);
    let gamepad_id = match gamepad_fit.invert(target_time) {
        Some(id) => id,
        None => return 0.0,
    };

    let target_size = inverted_fitts(ring_distance, current_id);
    let diameter = inverted_fitts(ring_distance, gamepad_id) - target_size;

    if diameter.is_nan() {
        return 0.0;
    }
    diameter.clamp(0.0, ring_distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bucket whose times lie exactly on `time = intercept + slope * id`.
    fn linear_bucket(intercept: f64, slope: f64) -> Vec<TrialSample> {
        [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&id| TrialSample {
                id,
                time: intercept + slope * id,
                distance: 300.0,
                width: 40.0,
                cursor_diameter: None,
            })
            .collect()
    }

    #[test]
    fn test_reference_scenario() {
        // mouse 200 + 50*ID, gamepad 150 + 80*ID, ID 3, ring 300:
        // target time 350, gamepad ID 2.5,
        // size(2.5) - size(3) = 300/(2^2.5-1) - 300/7 ~ 21.56
        let d = calibrated_cursor_diameter(
            &linear_bucket(200.0, 50.0),
            &linear_bucket(150.0, 80.0),
            3.0,
            300.0,
        );
        let expected = inverted_fitts(300.0, 2.5) - inverted_fitts(300.0, 3.0);
        assert!((d - expected).abs() < 1e-9);
        assert!((d - 21.56).abs() < 0.01);
    }

    #[test]
    fn test_faster_gamepad_floors_at_zero() {
        // gamepad already beats the mouse time: no enlargement
        let d = calibrated_cursor_diameter(
            &linear_bucket(200.0, 50.0),
            &linear_bucket(0.0, 50.0),
            3.0,
            300.0,
        );
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_caps_at_ring_distance() {
        // near-flat gamepad fit pushes the solved ID toward zero and
        // the nominal size toward infinity
        let d = calibrated_cursor_diameter(
            &linear_bucket(200.0, 50.0),
            &linear_bucket(340.0, 100.0),
            3.0,
            300.0,
        );
        assert_eq!(d, 300.0);
    }

    #[test]
    fn test_insufficient_data_skips_calibration() {
        let one = vec![TrialSample {
            id: 3.0,
            time: 350.0,
            distance: 300.0,
            width: 40.0,
            cursor_diameter: None,
        }];
        assert_eq!(
            calibrated_cursor_diameter(&one, &linear_bucket(150.0, 80.0), 3.0, 300.0),
            0.0
        );
        assert_eq!(
            calibrated_cursor_diameter(&linear_bucket(200.0, 50.0), &[], 3.0, 300.0),
            0.0
        );
    }

    #[test]
    fn test_flat_gamepad_fit_is_guarded() {
        // all gamepad trials at one ID: regression undefined, no panic
        let same_id: Vec<TrialSample> = (0..4)
            .map(|i| TrialSample {
                id: 2.0,
                time: 300.0 + i as f64,
                distance: 300.0,
                width: 40.0,
                cursor_diameter: None,
            })
            .collect();
        assert_eq!(
            calibrated_cursor_diameter(&linear_bucket(200.0, 50.0), &same_id, 3.0, 300.0),
            0.0
        );
    }
}
