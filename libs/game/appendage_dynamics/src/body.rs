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
use nalgebra::{Isometry3, Vector3};

/// The host simulator's handle on one rigid body. Offsets are in the body frame;
/// everything returned is in the world frame unless noted.
pub trait RigidBody {
    fn world_pose(&self) -> Isometry3<f64>;

    /// Linear velocity of the material point at `offset`.
    fn world_linear_velocity_at(&self, offset: &Vector3<f64>) -> Vector3<f64>;

    /// Center of mass, body frame.
    fn center_of_mass(&self) -> Vector3<f64>;

    /// Apply a world-frame `force` at the body-frame `offset`.
    fn add_force_at_relative_position(&mut self, force: &Vector3<f64>, offset: &Vector3<f64>);
}

/// A single-axis rotational joint with adjustable stops, radians.
pub trait HingeJoint {
    fn set_limits(&mut self, low: f64, high: f64);
}

/// Name lookup into the host's vehicle model.
pub trait VehicleModel {
    type Link: RigidBody;
    type Joint: HingeJoint;

    fn name(&self) -> &str;
    fn link(&self, name: &str) -> Option<Self::Link>;
    fn joint(&self, name: &str) -> Option<Self::Joint>;
}
