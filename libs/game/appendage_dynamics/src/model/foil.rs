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
use crate::model::{
    hold_sign_past_stall, stall_extrapolated, stall_moment_coefficient, AeroForces, Coefficients,
    ForceInputs, ProjectedFlow,
};
use foil_math::{fold_to_90, LiftDragPlane};
use nalgebra::Vector3;

/// Lift coefficient of a thin foil, with stall and sweep correction.
pub fn foil_lift_coefficient(coef: &Coefficients, alpha: f64, cos_sweep2: f64) -> f64 {
    hold_sign_past_stall(
        stall_extrapolated(coef.cla, coef.cla_stall, alpha, coef.alpha_stall, cos_sweep2),
        alpha,
        coef.alpha_stall,
    )
}

/// Drag coefficient of a thin foil. Drag never pulls forward.
pub fn foil_drag_coefficient(coef: &Coefficients, alpha: f64, cos_sweep2: f64) -> f64 {
    stall_extrapolated(coef.cda, coef.cda_stall, alpha, coef.alpha_stall, cos_sweep2).abs()
}

/// Rudder-style foil. `velocity` is the body's velocity through the water at the
/// center of pressure.
pub fn foil_forces(
    plane: &LiftDragPlane,
    velocity: &Vector3<f64>,
    coef: &Coefficients,
    area: f64,
    rho: f64,
) -> AeroForces {
    let flow = ProjectedFlow::new(plane, velocity, coef.alpha0);
    let alpha = fold_to_90(flow.alpha);
    flow.frame.resolve(
        ForceInputs {
            alpha,
            sweep: flow.sweep,
            speed: flow.speed,
            cl: foil_lift_coefficient(coef, alpha, flow.cos_sweep2),
            cd: foil_drag_coefficient(coef, alpha, flow.cos_sweep2),
            cm_estimate: stall_moment_coefficient(coef, alpha, flow.cos_sweep2),
        },
        area,
        rho,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn xz_plane() -> LiftDragPlane {
        LiftDragPlane::new(Vector3::x(), Vector3::z())
    }

    #[test]
    fn test_lift_is_linear_below_stall() {
        let coef = Coefficients {
            cla: 2.5,
            alpha_stall: 0.35,
            cla_stall: -4.,
            ..Default::default()
        };
        let rng = fastrand::Rng::with_seed(42);
        for _ in 0..1_000 {
            let alpha = (rng.f64() * 2. - 1.) * coef.alpha_stall;
            let cos_sweep2 = rng.f64();
            assert_relative_eq!(
                foil_lift_coefficient(&coef, alpha, cos_sweep2),
                coef.cla * alpha * cos_sweep2,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_lift_is_continuous_at_stall() {
        let coef = Coefficients {
            cla: 2.5,
            alpha_stall: 0.35,
            cla_stall: -1.,
            ..Default::default()
        };
        for alpha in [coef.alpha_stall, -coef.alpha_stall] {
            let pre = coef.cla * alpha * 0.8;
            assert_relative_eq!(foil_lift_coefficient(&coef, alpha, 0.8), pre);
            assert_relative_eq!(
                foil_lift_coefficient(&coef, alpha * (1. + 1e-10), 0.8),
                pre,
                epsilon = 1e-8
            );
        }
    }

    #[test]
    fn test_lift_never_reverses_past_stall() {
        let coef = Coefficients {
            cla: 1.,
            alpha_stall: 0.2,
            cla_stall: -10.,
            ..Default::default()
        };
        assert_eq!(foil_lift_coefficient(&coef, 1.4, 1.), 0.);
        assert_eq!(foil_lift_coefficient(&coef, -1.4, 1.), 0.);
        // Just past stall the lift is reduced but still positive.
        let cl = foil_lift_coefficient(&coef, 0.21, 1.);
        assert!(cl > 0. && cl < 0.2);
    }

    #[test]
    fn test_drag_is_never_negative() {
        let coef = Coefficients {
            cda: 0.5,
            cda_stall: -3.,
            alpha_stall: 0.2,
            ..Default::default()
        };
        let rng = fastrand::Rng::with_seed(9);
        for _ in 0..1_000 {
            let alpha = (rng.f64() * 2. - 1.) * FRAC_PI_2;
            assert!(foil_drag_coefficient(&coef, alpha, rng.f64()) >= 0.);
        }
        // Negative alpha below stall gives a negative raw value; it is flipped.
        assert_relative_eq!(foil_drag_coefficient(&coef, -0.1, 1.), 0.05);
    }

    #[test]
    fn test_in_plane_flow() {
        // Moving forward and slightly down through still water.
        let velocity = Vector3::new(3., 0., -0.3);
        let coef = Coefficients::default();
        let forces = foil_forces(&xz_plane(), &velocity, &coef, 0.5, 1000.);
        let alpha = (0.3f64).atan2(3.);
        assert_relative_eq!(forces.alpha, alpha, epsilon = 1e-12);
        assert_relative_eq!(forces.sweep, 0.);
        assert_relative_eq!(forces.cl, alpha, epsilon = 1e-12);
        assert_relative_eq!(forces.cd, 0.01 * alpha, epsilon = 1e-12);
        let q = 0.5 * 1000. * velocity.norm_squared();
        assert_relative_eq!(forces.dynamic_pressure, q, epsilon = 1e-9);
        // Drag opposes the motion, lift is perpendicular to it in the plane.
        assert_relative_eq!(
            forces.drag,
            -velocity.normalize() * forces.cd * q * 0.5,
            epsilon = 1e-9
        );
        assert_relative_eq!(forces.lift.dot(&velocity), 0., epsilon = 1e-9);
        assert_relative_eq!(forces.lift.y, 0.);
        assert!(forces.lift.z > 0.);
        assert_relative_eq!(forces.lift.norm(), forces.cl * q * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_scales_coefficients() {
        let coef = Coefficients::default();
        let straight = foil_forces(&xz_plane(), &Vector3::new(3., 0., -0.3), &coef, 1., 1.);
        // Same in-plane flow plus a spanwise component.
        let swept = foil_forces(&xz_plane(), &Vector3::new(3., 1., -0.3), &coef, 1., 1.);
        let sin_sweep: f64 = -1. / Vector3::new(3., 1., -0.3).norm();
        assert_relative_eq!(swept.sweep, sin_sweep.asin(), epsilon = 1e-12);
        assert_relative_eq!(swept.alpha, straight.alpha, epsilon = 1e-12);
        assert_relative_eq!(
            swept.cl,
            straight.cl * (1. - sin_sweep * sin_sweep),
            epsilon = 1e-12
        );
        assert_relative_eq!(swept.dynamic_pressure, straight.dynamic_pressure, epsilon = 1e-12);
    }

    #[test]
    fn test_flow_along_span_points_nowhere() {
        // Forward +X, upward +Z, flow straight along the span.
        let forces = foil_forces(
            &xz_plane(),
            &Vector3::new(0., 1., 0.),
            &Coefficients::default(),
            1.,
            1.2041,
        );
        // No in-plane component: the flow is perpendicular to forward.
        assert_relative_eq!(forces.alpha.abs(), FRAC_PI_2);
        assert_relative_eq!(forces.alpha, -FRAC_PI_2);
        assert_relative_eq!(forces.sweep, -FRAC_PI_2);
        assert_relative_eq!(forces.cl, 0.);
        assert_relative_eq!(forces.cd, 0.);
        assert_eq!(forces.dynamic_pressure, 0.);
        assert_eq!(forces.force(), Vector3::zeros());
    }

    #[test]
    fn test_alpha0_offsets_and_folds() {
        let coef = Coefficients {
            alpha0: 1.2,
            ..Default::default()
        };
        // Raw alpha of 1.2 + pi/4 exceeds 90 degrees and folds back by 180.
        let forces = foil_forces(&xz_plane(), &Vector3::new(1., 0., -1.), &coef, 1., 1.);
        assert_relative_eq!(
            forces.alpha,
            1.2 + FRAC_PI_2 / 2. - std::f64::consts::PI,
            epsilon = 1e-12
        );
    }
}
