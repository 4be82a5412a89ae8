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
use crate::provider::Medium;
use log::trace;
use nalgebra::{Point2, Point3, Vector2, Vector3};
use parking_lot::RwLock;
use std::sync::Arc;

/// A cloneable view of one appendage's fluid velocity estimate.
///
/// Writers are the background refresh thread and push subscriptions; the reader
/// is the per-tick force computation. Every access takes the lock for the whole
/// vector, so a reader never sees half of an update. Last writer wins.
#[derive(Clone, Debug)]
pub struct FluidVelocityHandle {
    medium: Medium,
    velocity: Arc<RwLock<Vector3<f64>>>,

    // Where the appendage was last seen, in world x/y; read by local refresh.
    position: Arc<RwLock<Point2<f64>>>,
}

impl FluidVelocityHandle {
    pub(crate) fn new(medium: Medium, initial: Vector3<f64>) -> Self {
        Self {
            medium,
            velocity: Arc::new(RwLock::new(initial)),
            position: Arc::new(RwLock::new(Point2::origin())),
        }
    }

    pub fn medium(&self) -> Medium {
        self.medium
    }

    /// The most recently written estimate, in the world frame.
    pub fn velocity(&self) -> Vector3<f64> {
        *self.velocity.read()
    }

    pub(crate) fn set_velocity(&self, velocity: Vector3<f64>) {
        *self.velocity.write() = velocity;
    }

    /// Replace the horizontal components, keeping whatever vertical component a
    /// push update may have set.
    pub(crate) fn set_horizontal(&self, horizontal: Vector2<f64>) {
        let mut velocity = self.velocity.write();
        velocity.x = horizontal.x;
        velocity.y = horizontal.y;
    }

    /// Entry point for the pushed water-current stream.
    ///
    /// Sails track wind rather than current, so the update is dropped for them.
    pub fn push_current(&self, current: Vector3<f64>) {
        match self.medium {
            Medium::Water => self.set_velocity(current),
            Medium::Air => trace!("ignoring current update {current:?} for a wind estimate"),
        }
    }

    /// Record the appendage's world position for the next local query.
    pub fn report_position(&self, position: &Point3<f64>) {
        *self.position.write() = Point2::new(position.x, position.y);
    }

    pub fn position(&self) -> Point2<f64> {
        *self.position.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    #[test]
    fn test_push_current_only_moves_water() {
        let water = FluidVelocityHandle::new(Medium::Water, Vector3::zeros());
        water.push_current(Vector3::new(0.5, -0.25, 0.1));
        assert_relative_eq!(water.velocity(), Vector3::new(0.5, -0.25, 0.1));

        let air = FluidVelocityHandle::new(Medium::Air, Vector3::new(3., 0., 0.));
        air.push_current(Vector3::new(0.5, -0.25, 0.1));
        assert_relative_eq!(air.velocity(), Vector3::new(3., 0., 0.));
    }

    #[test]
    fn test_horizontal_update_keeps_vertical() {
        let water = FluidVelocityHandle::new(Medium::Water, Vector3::new(0., 0., 0.2));
        water.set_horizontal(Vector2::new(1., 2.));
        assert_relative_eq!(water.velocity(), Vector3::new(1., 2., 0.2));
    }

    #[test]
    fn test_report_position_drops_altitude() {
        let handle = FluidVelocityHandle::new(Medium::Air, Vector3::zeros());
        handle.report_position(&Point3::new(4., 5., 6.));
        assert_relative_eq!(handle.position(), Point2::new(4., 5.));
    }

    #[test]
    fn test_reads_are_never_torn() {
        let handle = FluidVelocityHandle::new(Medium::Water, Vector3::zeros());
        let writer = {
            let handle = handle.clone();
            thread::spawn(move || {
                for i in 0..10_000 {
                    let f = f64::from(i);
                    handle.push_current(Vector3::new(f, f, f));
                }
            })
        };
        for _ in 0..10_000 {
            let v = handle.velocity();
            assert_eq!(v.x, v.y);
            assert_eq!(v.y, v.z);
        }
        writer.join().expect("writer thread");
    }
}
