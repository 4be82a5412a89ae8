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
//! Lift, drag and moment on a single appendage.
//!
//! Every function here is pure: given the lift-drag plane in world space and the
//! relevant fluid velocity, produce the forces. Which variant runs is decided by
//! [`appendage_forces`] from the appendage kind.
mod foil;
mod keel;
mod sail;

pub use crate::model::{
    foil::{foil_drag_coefficient, foil_forces, foil_lift_coefficient},
    keel::{keel_coefficients, keel_forces},
    sail::{sail_coefficients, sail_forces},
};

use crate::config::AppendageKind;
use foil_math::{fold_to_90, normalize_or_zero, LiftDragPlane};
use nalgebra::Vector3;

/// Slopes and stall behavior of an appendage section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub alpha0: f64,
    pub cla: f64,
    pub cda: f64,
    pub cma: f64,
    pub alpha_stall: f64,
    pub cla_stall: f64,
    pub cda_stall: f64,
    pub cma_stall: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            alpha0: 0.,
            cla: 1.,
            cda: 0.01,
            cma: 0.01,
            alpha_stall: std::f64::consts::FRAC_PI_2,
            cla_stall: 0.,
            cda_stall: 1.,
            cma_stall: 0.,
        }
    }
}

/// Result of one force evaluation, world frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AeroForces {
    pub alpha: f64,
    pub sweep: f64,
    pub dynamic_pressure: f64,
    pub cl: f64,
    pub cd: f64,

    // The moment coefficient that is applied. Held at zero: the moment model
    // has not been validated, so it contributes nothing.
    pub cm: f64,

    // What the stall model would give for cm, kept for inspection.
    pub cm_estimate: f64,

    pub lift: Vector3<f64>,
    pub drag: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl AeroForces {
    /// Resultant force at the center of pressure.
    pub fn force(&self) -> Vector3<f64> {
        self.lift + self.drag
    }
}

/// Unit directions along which the coefficients act.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ForceFrame {
    pub lift: Vector3<f64>,
    pub drag: Vector3<f64>,
    pub moment: Vector3<f64>,
}

pub(crate) struct ForceInputs {
    pub alpha: f64,
    pub sweep: f64,
    pub speed: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm_estimate: f64,
}

impl ForceFrame {
    pub(crate) fn resolve(&self, inputs: ForceInputs, area: f64, rho: f64) -> AeroForces {
        let q = dynamic_pressure(rho, inputs.speed);
        let cm = 0.;
        AeroForces {
            alpha: inputs.alpha,
            sweep: inputs.sweep,
            dynamic_pressure: q,
            cl: inputs.cl,
            cd: inputs.cd,
            cm,
            cm_estimate: inputs.cm_estimate,
            lift: inputs.cl * q * area * self.lift,
            drag: inputs.cd * q * area * self.drag,
            moment: cm * q * area * self.moment,
        }
    }
}

/// The flow as seen by a foil or keel: its sweep and the component inside the
/// lift-drag plane, which is what the section actually works on.
pub(crate) struct ProjectedFlow {
    pub sweep: f64,
    pub cos_sweep2: f64,
    pub speed: f64,

    // Angle of attack before folding.
    pub alpha: f64,

    pub frame: ForceFrame,
}

impl ProjectedFlow {
    pub(crate) fn new(plane: &LiftDragPlane, velocity: &Vector3<f64>, alpha0: f64) -> Self {
        let sin_sweep = plane.sin_sweep(velocity);
        let in_plane = plane.project(velocity);
        Self {
            sweep: fold_to_90(sin_sweep.asin()),
            cos_sweep2: 1. - sin_sweep * sin_sweep,
            speed: in_plane.norm(),
            alpha: signed_alpha(plane, &in_plane, alpha0),
            frame: ForceFrame {
                lift: normalize_or_zero(&plane.normal().cross(&in_plane)),
                drag: normalize_or_zero(&-in_plane),
                moment: *plane.normal(),
            },
        }
    }
}

/// q = 1/2 rho v^2
pub fn dynamic_pressure(rho: f64, speed: f64) -> f64 {
    0.5 * rho * speed * speed
}

/// Angle between `flow` and the forward axis, offset by `alpha0`. Flow with a
/// component against the upward axis gives a positive angle.
pub fn signed_alpha(plane: &LiftDragPlane, flow: &Vector3<f64>, alpha0: f64) -> f64 {
    let angle = plane.cos_to_forward(flow).acos();
    if plane.alpha_sign(flow) > 0. {
        alpha0 + angle
    } else {
        alpha0 - angle
    }
}

/// Linear in `alpha` up to the stall angle, then continued with `stall_slope`
/// from the value at stall. Scaled by the sweep correction.
pub fn stall_extrapolated(
    slope: f64,
    stall_slope: f64,
    alpha: f64,
    alpha_stall: f64,
    cos_sweep2: f64,
) -> f64 {
    if alpha > alpha_stall {
        (slope * alpha_stall + stall_slope * (alpha - alpha_stall)) * cos_sweep2
    } else if alpha < -alpha_stall {
        (-slope * alpha_stall + stall_slope * (alpha + alpha_stall)) * cos_sweep2
    } else {
        slope * alpha * cos_sweep2
    }
}

/// Past stall a coefficient may shrink towards zero but never change sign.
pub fn hold_sign_past_stall(coefficient: f64, alpha: f64, alpha_stall: f64) -> f64 {
    if alpha > alpha_stall {
        coefficient.max(0.)
    } else if alpha < -alpha_stall {
        coefficient.min(0.)
    } else {
        coefficient
    }
}

/// The stall-aware moment coefficient shared by foil and keel.
pub fn stall_moment_coefficient(coef: &Coefficients, alpha: f64, cos_sweep2: f64) -> f64 {
    hold_sign_past_stall(
        stall_extrapolated(coef.cma, coef.cma_stall, alpha, coef.alpha_stall, cos_sweep2),
        alpha,
        coef.alpha_stall,
    )
}

/// Forces on an appendage of the given kind.
///
/// `velocity` is the body velocity relative to the water for rudders and keels,
/// and the apparent wind for sails.
pub fn appendage_forces(
    kind: AppendageKind,
    plane: &LiftDragPlane,
    velocity: &Vector3<f64>,
    coef: &Coefficients,
    area: f64,
    rho: f64,
) -> AeroForces {
    match kind {
        AppendageKind::Rudder => foil_forces(plane, velocity, coef, area, rho),
        AppendageKind::Keel => keel_forces(plane, velocity, coef, area, rho),
        AppendageKind::Sail => sail_forces(plane, velocity, area, rho),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn xz_plane() -> LiftDragPlane {
        LiftDragPlane::new(Vector3::x(), Vector3::z())
    }

    fn random_velocity(rng: &fastrand::Rng) -> Vector3<f64> {
        Vector3::new(
            rng.f64() * 20. - 10.,
            rng.f64() * 20. - 10.,
            rng.f64() * 20. - 10.,
        )
    }

    #[test]
    fn test_dynamic_pressure() {
        assert_relative_eq!(dynamic_pressure(1.2041, 0.), 0.);
        assert_relative_eq!(dynamic_pressure(1.2041, 2.), 0.5 * 1.2041 * 4.);
        assert_relative_eq!(
            dynamic_pressure(1000., 6.) / dynamic_pressure(1000., 3.),
            4.
        );
    }

    #[test]
    fn test_signed_alpha() {
        let plane = xz_plane();
        // Flow from below the forward axis is a positive angle of attack.
        assert_relative_eq!(
            signed_alpha(&plane, &Vector3::new(1., 0., -1.), 0.),
            FRAC_PI_2 / 2.
        );
        assert_relative_eq!(
            signed_alpha(&plane, &Vector3::new(1., 0., 1.), 0.),
            -FRAC_PI_2 / 2.
        );
        assert_relative_eq!(signed_alpha(&plane, &Vector3::x(), 0.1), 0.1);
    }

    #[test]
    fn test_stall_extrapolation_is_continuous() {
        let stall = 0.3;
        for (slope, stall_slope) in [(1., 0.), (1., -2.), (0.01, 1.)] {
            for edge in [stall, -stall] {
                let below = stall_extrapolated(slope, stall_slope, edge * (1. - 1e-12), stall, 1.);
                let at = stall_extrapolated(slope, stall_slope, edge, stall, 1.);
                let above = stall_extrapolated(slope, stall_slope, edge * (1. + 1e-12), stall, 1.);
                assert_relative_eq!(below, at, epsilon = 1e-9);
                assert_relative_eq!(above, at, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_hold_sign_past_stall() {
        assert_eq!(hold_sign_past_stall(-1., 0.5, 0.3), 0.);
        assert_eq!(hold_sign_past_stall(1., -0.5, 0.3), 0.);
        assert_eq!(hold_sign_past_stall(-1., 0.1, 0.3), -1.);
        assert_eq!(hold_sign_past_stall(2., 0.5, 0.3), 2.);
    }

    #[test]
    fn test_moment_is_always_zero() {
        let rng = fastrand::Rng::with_seed(77);
        let coef = Coefficients {
            cma: 3.,
            cma_stall: -1.,
            alpha_stall: 0.2,
            ..Default::default()
        };
        for _ in 0..500 {
            let plane = LiftDragPlane::new(
                random_velocity(&rng),
                random_velocity(&rng),
            );
            let velocity = random_velocity(&rng);
            for kind in [AppendageKind::Rudder, AppendageKind::Keel, AppendageKind::Sail] {
                let forces = appendage_forces(kind, &plane, &velocity, &coef, 1.5, 1000.);
                assert_eq!(forces.cm, 0.);
                assert_eq!(forces.moment, Vector3::zeros());
            }
        }
    }

    #[test]
    fn test_force_scales_with_speed_squared() {
        let plane = xz_plane();
        let coef = Coefficients::default();
        let velocity = Vector3::new(2., 0.4, -0.7);
        for kind in [AppendageKind::Rudder, AppendageKind::Keel, AppendageKind::Sail] {
            let slow = appendage_forces(kind, &plane, &velocity, &coef, 1., 1.2041);
            let fast = appendage_forces(kind, &plane, &(velocity * 2.), &coef, 1., 1.2041);
            assert_relative_eq!(fast.alpha, slow.alpha, epsilon = 1e-12);
            assert_relative_eq!(fast.dynamic_pressure, 4. * slow.dynamic_pressure);
            assert_relative_eq!(fast.lift, 4. * slow.lift, epsilon = 1e-9);
            assert_relative_eq!(fast.drag, 4. * slow.drag, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sweep_stays_within_right_angle() {
        let rng = fastrand::Rng::with_seed(1234);
        let coef = Coefficients::default();
        for _ in 0..500 {
            let plane = LiftDragPlane::new(
                random_velocity(&rng),
                random_velocity(&rng),
            );
            let velocity = random_velocity(&rng);
            let foil = foil_forces(&plane, &velocity, &coef, 1., 1.);
            let keel = keel_forces(&plane, &velocity, &coef, 1., 1.);
            assert!(foil.sweep.abs() <= FRAC_PI_2);
            assert!(keel.sweep.abs() <= FRAC_PI_2);
        }
    }
}
