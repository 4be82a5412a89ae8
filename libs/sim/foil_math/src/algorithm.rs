// This file is part of USV Sailing.
//
// USV Sailing is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// USV Sailing is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with USV Sailing.  If not, see <http://www.gnu.org/licenses/>.
use nalgebra::{clamp, Isometry3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

/// Vectors shorter than this have no usable direction.
pub const DIRECTION_EPSILON: f64 = 1e-12;

/// Fold `angle` into `[-half_range, half_range]` by whole steps of `2 * half_range`.
///
/// The result is exactly what repeatedly stepping the angle towards zero would
/// produce: positive inputs land in `(-half_range, half_range]`, negative inputs in
/// `[-half_range, half_range)`. Unlike the stepping loop this runs in constant time,
/// so arbitrarily large inputs terminate. Non-finite inputs are returned unchanged.
pub fn fold_angle(angle: f64, half_range: f64) -> f64 {
    debug_assert!(half_range > 0., "fold range must be positive");
    if !angle.is_finite() || angle.abs() <= half_range {
        return angle;
    }
    let period = 2. * half_range;
    let mut folded = (angle + half_range).rem_euclid(period) - half_range;
    // Stepping down from above stops on the top edge, not the bottom one.
    if angle > 0. && folded <= -half_range {
        folded = half_range;
    }
    clamp(folded, -half_range, half_range)
}

/// Fold into +/-90 degrees in 180 degree steps.
pub fn fold_to_90(angle: f64) -> f64 {
    fold_angle(angle, FRAC_PI_2)
}

/// Fold into +/-180 degrees in 360 degree steps.
pub fn fold_to_180(angle: f64) -> f64 {
    fold_angle(angle, PI)
}

pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(DIRECTION_EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// `numerator / denominator`, or zero when the denominator vanishes.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() <= DIRECTION_EPSILON {
        0.
    } else {
        numerator / denominator
    }
}

/// Rotate a body-frame direction into the world frame. Translation is ignored.
pub fn rotate_into_world(pose: &Isometry3<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    pose.rotation * v
}
