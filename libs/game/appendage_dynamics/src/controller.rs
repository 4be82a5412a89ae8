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
use crate::{
    body::{HingeJoint, RigidBody, VehicleModel},
    config::{AppendageConfig, AppendageKind},
    model::{appendage_forces, Coefficients},
    state::AppendageState,
    AppendageError,
};
use anyhow::Result;
use fluid_velocity::{
    FluidVelocityHandle, FluidVelocityProvider, Medium, ParameterStore, RefreshTiming,
    VelocityService,
};
use foil_math::{rotate_into_world, LiftDragPlane};
use log::{info, trace};
use nalgebra::{Isometry3, Point3, Vector3};
use parking_lot::RwLock;
use std::sync::Arc;

/// Below this relative speed, m/s, the directions are too noisy to be useful and
/// the tick is skipped.
pub const MIN_RELATIVE_SPEED: f64 = 0.01;

/// The sail's current target angle, radians. Whoever simulates the sheet pushes
/// new targets here; the controller turns them into hinge stops each tick.
#[derive(Clone, Debug, Default)]
pub struct SailTrim {
    target: Arc<RwLock<f64>>,
}

impl SailTrim {
    pub fn set_target_angle(&self, angle: f64) {
        *self.target.write() = angle;
    }

    pub fn target_angle(&self) -> f64 {
        *self.target.read()
    }
}

/// Drives one appendage: every tick, work out the relative flow, evaluate the
/// model and push the result into the host's rigid body.
///
/// Construction resolves everything the appendage touches, so a controller that
/// exists is ready to step. Dropping it stops any background refresh.
pub struct AppendageController<M: VehicleModel> {
    state: AppendageState,
    coefficients: Coefficients,
    link: M::Link,
    joint: Option<M::Joint>,
    provider: FluidVelocityProvider,
    trim: SailTrim,
}

impl<M: VehicleModel> AppendageController<M> {
    /// Resolve the link (and the sail's joint) in `model`, then start whatever
    /// fluid source `config` asks for. `connect` is only called in local mode.
    pub fn load<C>(
        model: &M,
        config: AppendageConfig,
        params: &dyn ParameterStore,
        timing: RefreshTiming,
        connect: C,
    ) -> Result<Self>
    where
        C: FnOnce(Medium) -> Result<Box<dyn VelocityService>>,
    {
        let config = config.sanitized();
        let (link, joint) = Self::resolve(model, &config)?;
        let provider = FluidVelocityProvider::from_source(
            &config.link_name,
            config.fluid_velocity,
            config.link_type.medium(),
            &world_center_of_mass(&link, &link.world_pose()),
            params,
            timing,
            connect,
        )?;
        Ok(Self::assemble(model, config, link, joint, provider))
    }

    /// As `load`, but with a fluid source the caller has already built.
    pub fn with_provider(
        model: &M,
        config: AppendageConfig,
        provider: FluidVelocityProvider,
    ) -> Result<Self> {
        let config = config.sanitized();
        let (link, joint) = Self::resolve(model, &config)?;
        Ok(Self::assemble(model, config, link, joint, provider))
    }

    fn resolve(model: &M, config: &AppendageConfig) -> Result<(M::Link, Option<M::Joint>)> {
        let link = model
            .link(&config.link_name)
            .ok_or_else(|| AppendageError::MissingLink {
                model: model.name().to_owned(),
                link: config.link_name.clone(),
            })?;
        let joint = config
            .joint_name
            .as_deref()
            .and_then(|name| model.joint(name));
        if config.link_type == AppendageKind::Sail && joint.is_none() {
            return Err(AppendageError::MissingJoint {
                model: model.name().to_owned(),
                link: config.link_name.clone(),
                joint: config.joint_name.clone(),
            }
            .into());
        }
        Ok((link, joint))
    }

    fn assemble(
        model: &M,
        config: AppendageConfig,
        link: M::Link,
        joint: Option<M::Joint>,
        provider: FluidVelocityProvider,
    ) -> Self {
        info!(
            "{}: {:?} on {} ({} from {:?}), area {} m^2, cp {:?}",
            model.name(),
            config.link_type,
            config.link_name,
            provider.medium(),
            provider.source(),
            config.area,
            config.cp.as_slice(),
        );
        Self {
            coefficients: config.coefficients(),
            state: AppendageState::new(config),
            link,
            joint,
            provider,
            trim: SailTrim::default(),
        }
    }

    pub fn state(&self) -> &AppendageState {
        &self.state
    }

    /// Push side of the fluid estimate; current updates go here.
    pub fn fluid_handle(&self) -> FluidVelocityHandle {
        self.provider.handle()
    }

    pub fn trim(&self) -> SailTrim {
        self.trim.clone()
    }

    /// One physics step. Returns the world-frame force applied at the center of
    /// pressure, or `None` if the relative flow was too slow to act on.
    pub fn on_update(&mut self) -> Option<Vector3<f64>> {
        let config = self.state.config();
        let kind = config.link_type;
        let cp = config.cp;
        let forward = config.forward;
        let upward = config.upward;
        let area = config.area;
        let rho = config.rho;

        let pose = self.link.world_pose();
        if self.provider.is_refreshing() {
            self.provider
                .report_position(&world_center_of_mass(&self.link, &pose));
        }

        let body_velocity = self.link.world_linear_velocity_at(&cp);
        let fluid = self.provider.velocity();
        let relative = match kind {
            AppendageKind::Sail => {
                if let Some(joint) = self.joint.as_mut() {
                    let target = self.trim.target_angle();
                    joint.set_limits(-target, target);
                }
                fluid - body_velocity
            }
            AppendageKind::Rudder | AppendageKind::Keel => body_velocity - fluid,
        };

        let speed = relative.norm();
        if speed.is_nan() || speed <= MIN_RELATIVE_SPEED {
            trace!("{}: relative speed {speed} too low", config.link_name);
            return None;
        }

        let plane = LiftDragPlane::from_body_axes(&pose, &forward, &upward);
        let forces = appendage_forces(kind, &plane, &relative, &self.coefficients, area, rho);
        let moment_arm = rotate_into_world(&pose, &(cp - self.link.center_of_mass()));
        let force = forces.force();
        self.link.add_force_at_relative_position(&force, &cp);

        trace!(
            "{}: alpha {:.4} sweep {:.4} cl {:.4} cd {:.4} q {:.3} force {:?}",
            self.state.config().link_name,
            forces.alpha,
            forces.sweep,
            forces.cl,
            forces.cd,
            forces.dynamic_pressure,
            force.as_slice(),
        );
        self.state.record(fluid, &forces, moment_arm);
        Some(force)
    }
}

fn world_center_of_mass<L: RigidBody>(link: &L, pose: &Isometry3<f64>) -> Point3<f64> {
    pose * Point3::from(link.center_of_mass())
}
