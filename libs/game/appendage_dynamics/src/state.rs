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
use crate::{config::AppendageConfig, model::AeroForces};
use nalgebra::Vector3;

/// What the last evaluated tick produced. All vectors are world frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DynamicState {
    pub alpha: f64,
    pub sweep: f64,
    pub fluid_velocity: Vector3<f64>,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
    pub cm_estimate: f64,
    pub dynamic_pressure: f64,
    pub lift: Vector3<f64>,
    pub drag: Vector3<f64>,
    pub moment: Vector3<f64>,
    pub force: Vector3<f64>,

    // From the center of mass to the center of pressure.
    pub moment_arm: Vector3<f64>,

    // Computed, never applied to the body.
    pub torque: Vector3<f64>,
}

impl DynamicState {
    pub(crate) fn record(
        &mut self,
        fluid_velocity: Vector3<f64>,
        forces: &AeroForces,
        moment_arm: Vector3<f64>,
    ) {
        let force = forces.force();
        *self = Self {
            alpha: forces.alpha,
            sweep: forces.sweep,
            fluid_velocity,
            cl: forces.cl,
            cd: forces.cd,
            cm: forces.cm,
            cm_estimate: forces.cm_estimate,
            dynamic_pressure: forces.dynamic_pressure,
            lift: forces.lift,
            drag: forces.drag,
            moment: forces.moment,
            force,
            moment_arm,
            torque: moment_arm.cross(&force) + forces.moment,
        };
    }
}

/// Configuration plus the per-tick values of one appendage.
#[derive(Clone, Debug)]
pub struct AppendageState {
    config: AppendageConfig,
    dynamic: DynamicState,
    ticks_applied: u64,
}

impl AppendageState {
    pub(crate) fn new(config: AppendageConfig) -> Self {
        Self {
            config,
            dynamic: DynamicState::default(),
            ticks_applied: 0,
        }
    }

    pub fn config(&self) -> &AppendageConfig {
        &self.config
    }

    pub fn dynamic(&self) -> &DynamicState {
        &self.dynamic
    }

    /// How many ticks ended with a force applied to the body.
    pub fn ticks_applied(&self) -> u64 {
        self.ticks_applied
    }

    pub(crate) fn record(
        &mut self,
        fluid_velocity: Vector3<f64>,
        forces: &AeroForces,
        moment_arm: Vector3<f64>,
    ) {
        self.dynamic.record(fluid_velocity, forces, moment_arm);
        self.ticks_applied += 1;
    }
}
