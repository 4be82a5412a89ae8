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
use crate::model::{stall_moment_coefficient, AeroForces, Coefficients, ForceInputs, ProjectedFlow};
use foil_math::{fold_to_180, LiftDragPlane};
use nalgebra::Vector3;

/// Lift and drag of a deep keel section as a function of the angle of attack.
/// These hold at every angle, so stall settings play no part.
pub fn keel_coefficients(alpha: f64) -> (f64, f64) {
    let two_alpha = 2. * alpha;
    (8. * two_alpha.sin(), 2. * (1. - two_alpha.cos()))
}

pub fn keel_forces(
    plane: &LiftDragPlane,
    velocity: &Vector3<f64>,
    coef: &Coefficients,
    area: f64,
    rho: f64,
) -> AeroForces {
    let flow = ProjectedFlow::new(plane, velocity, coef.alpha0);
    let alpha = fold_to_180(flow.alpha);
    let (cl, cd) = keel_coefficients(alpha);
    flow.frame.resolve(
        ForceInputs {
            alpha,
            sweep: flow.sweep,
            speed: flow.speed,
            cl,
            cd,
            cm_estimate: stall_moment_coefficient(coef, alpha, flow.cos_sweep2),
        },
        area,
        rho,
    )
}
