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
use crate::algorithm::{normalize_or_zero, ratio_or_zero, rotate_into_world};
use nalgebra::{clamp, Isometry3, Vector3};

/// The plane spanned by an appendage's forward and upward axes. Lift and drag
/// act inside this plane; the normal is the span axis of the foil.
#[derive(Clone, Copy, Debug)]
pub struct LiftDragPlane {
    forward: Vector3<f64>,
    upward: Vector3<f64>,
    normal: Vector3<f64>,
}

impl LiftDragPlane {
    pub fn new(forward: Vector3<f64>, upward: Vector3<f64>) -> Self {
        Self {
            forward,
            upward,
            normal: normalize_or_zero(&forward.cross(&upward)),
        }
    }

    /// Build the plane from body-frame axes and the body's world pose.
    pub fn from_body_axes(
        pose: &Isometry3<f64>,
        forward: &Vector3<f64>,
        upward: &Vector3<f64>,
    ) -> Self {
        Self::new(
            rotate_into_world(pose, forward),
            rotate_into_world(pose, upward),
        )
    }

    pub fn forward(&self) -> &Vector3<f64> {
        &self.forward
    }

    pub fn upward(&self) -> &Vector3<f64> {
        &self.upward
    }

    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Sine of the angle between `v` and the plane.
    pub fn sin_sweep(&self, v: &Vector3<f64>) -> f64 {
        clamp(ratio_or_zero(self.normal.dot(v), v.norm()), -1., 1.)
    }

    /// The component of `v` lying in the plane: n x (v x n).
    pub fn project(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.normal.cross(&v.cross(&self.normal))
    }

    /// Cosine of the angle between `v` and the forward axis. A vector with no
    /// length is treated as perpendicular to forward.
    pub fn cos_to_forward(&self, v: &Vector3<f64>) -> f64 {
        clamp(
            ratio_or_zero(self.forward.dot(v), self.forward.norm() * v.norm()),
            -1.,
            1.,
        )
    }

    /// Positive when `v` runs against the upward axis. Only the sign is meaningful.
    pub fn alpha_sign(&self, v: &Vector3<f64>) -> f64 {
        ratio_or_zero(-self.upward.dot(v), self.upward.norm() + v.norm())
    }
}
