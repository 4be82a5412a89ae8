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
use crate::model::{signed_alpha, AeroForces, ForceFrame, ForceInputs};
use foil_math::{normalize_or_zero, LiftDragPlane};
use nalgebra::Vector3;

/// Lift and drag of a soft sail. Sails have no sweep correction.
pub fn sail_coefficients(alpha: f64) -> (f64, f64) {
    let two_alpha = 2. * alpha;
    (1.5 * two_alpha.sin(), 0.5 * (1. - two_alpha.cos()))
}

/// Forces from the apparent wind `apparent`, that is, the wind minus the body's
/// velocity at the center of pressure. The wind is used as is, without
/// projecting it into the lift-drag plane.
pub fn sail_forces(
    plane: &LiftDragPlane,
    apparent: &Vector3<f64>,
    area: f64,
    rho: f64,
) -> AeroForces {
    let alpha = signed_alpha(plane, apparent, 0.);
    let (cl, cd) = sail_coefficients(alpha);
    let frame = ForceFrame {
        lift: normalize_or_zero(&-plane.normal().cross(apparent)),
        drag: normalize_or_zero(apparent),
        moment: *plane.normal(),
    };
    frame.resolve(
        ForceInputs {
            alpha,
            sweep: 0.,
            speed: apparent.norm(),
            cl,
            cd,
            cm_estimate: 0.,
        },
        area,
        rho,
    )
}
