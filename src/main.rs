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
use anyhow::{Context, Result};
use appendage_dynamics::{
    AppendageConfig, AppendageController, AppendageKind, HingeJoint, RigidBody, VehicleModel,
};
use fluid_velocity::{Medium, QueryError, RefreshTiming, StaticParameters, VelocityService};
use log::{debug, info};
use nalgebra::{Isometry3, Point2, Translation3, UnitQuaternion, Vector2, Vector3};
use parking_lot::RwLock;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Duration,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "usv_sailing",
    about = "Step a toy sailboat through a wind and current field"
)]
struct Opt {
    /// Vehicle and environment description
    #[structopt(short, long, default_value = "demos/sailboat.yaml")]
    config: PathBuf,

    /// Number of physics steps to run
    #[structopt(short = "n", long, default_value = "100")]
    ticks: usize,

    /// Step length in seconds
    #[structopt(short, long, default_value = "0.05")]
    dt: f64,

    /// Sleep for each step so background refreshes keep up
    #[structopt(short, long)]
    realtime: bool,
}

#[derive(Debug, Deserialize)]
struct HullConfig {
    mass: f64,
    yaw_inertia: f64,
    #[serde(default)]
    center_of_mass: Vector3<f64>,
    #[serde(default)]
    velocity: Vector3<f64>,

    // Linear and angular damping per second, standing in for hull resistance.
    #[serde(default = "HullConfig::default_damping")]
    damping: f64,
}

impl HullConfig {
    fn default_damping() -> f64 {
        0.5
    }
}

/// A uniform flow with a swirl about the origin.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
struct FieldConfig {
    base: Vector2<f64>,
    #[serde(default)]
    swirl: f64,
}

impl FieldConfig {
    fn sample(&self, position: Point2<f64>) -> Vector2<f64> {
        let radius = position.coords.norm().max(1.);
        self.base + Vector2::new(-position.y, position.x) * (self.swirl / radius)
    }
}

#[derive(Debug, Deserialize)]
struct VehicleFile {
    name: String,
    hull: HullConfig,
    appendages: Vec<AppendageConfig>,
    #[serde(default)]
    parameters: StaticParameters,
    #[serde(default)]
    wind_field: FieldConfig,
    #[serde(default)]
    current_field: FieldConfig,

    // Pushed once at startup to every water appendage.
    #[serde(default)]
    current: Option<Vector3<f64>>,

    #[serde(default)]
    sail_angle: f64,
}

impl VehicleFile {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading vehicle file {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[derive(Debug)]
struct Hull {
    pose: Isometry3<f64>,
    velocity: Vector3<f64>,
    yaw_rate: f64,
    mass: f64,
    yaw_inertia: f64,
    center_of_mass: Vector3<f64>,
    damping: f64,
    force: Vector3<f64>,
    torque: Vector3<f64>,
}

impl Hull {
    fn new(config: &HullConfig) -> Self {
        Self {
            pose: Isometry3::identity(),
            velocity: config.velocity,
            yaw_rate: 0.,
            mass: config.mass,
            yaw_inertia: config.yaw_inertia,
            center_of_mass: config.center_of_mass,
            damping: config.damping,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
        }
    }

    // Planar integration: the hull floats, so only x, y and yaw move.
    fn step(&mut self, dt: f64) {
        let mut acceleration = self.force / self.mass - self.velocity * self.damping;
        acceleration.z = 0.;
        self.velocity += acceleration * dt;
        self.yaw_rate +=
            (self.torque.z / self.yaw_inertia - self.yaw_rate * self.damping) * dt;
        self.pose = Isometry3::from_parts(
            Translation3::from(self.pose.translation.vector + self.velocity * dt),
            UnitQuaternion::from_euler_angles(0., 0., self.yaw_rate * dt) * self.pose.rotation,
        );
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }
}

#[derive(Clone, Debug)]
struct HullHandle(Arc<RwLock<Hull>>);

impl RigidBody for HullHandle {
    fn world_pose(&self) -> Isometry3<f64> {
        self.0.read().pose
    }

    fn world_linear_velocity_at(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        let hull = self.0.read();
        let arm = hull.pose.rotation * (offset - hull.center_of_mass);
        hull.velocity + Vector3::z().cross(&arm) * hull.yaw_rate
    }

    fn center_of_mass(&self) -> Vector3<f64> {
        self.0.read().center_of_mass
    }

    fn add_force_at_relative_position(&mut self, force: &Vector3<f64>, offset: &Vector3<f64>) {
        let mut hull = self.0.write();
        let arm = hull.pose.rotation * (offset - hull.center_of_mass);
        hull.force += force;
        hull.torque += arm.cross(force);
    }
}

#[derive(Clone, Debug, Default)]
struct MastJoint(Arc<RwLock<(f64, f64)>>);

impl HingeJoint for MastJoint {
    fn set_limits(&mut self, low: f64, high: f64) {
        *self.0.write() = (low, high);
    }
}

/// The toy boat is a single body: every link name resolves to the hull.
struct Boat {
    name: String,
    hull: HullHandle,
    mast: MastJoint,
}

impl VehicleModel for Boat {
    type Link = HullHandle;
    type Joint = MastJoint;

    fn name(&self) -> &str {
        &self.name
    }

    fn link(&self, _name: &str) -> Option<HullHandle> {
        Some(self.hull.clone())
    }

    fn joint(&self, name: &str) -> Option<MastJoint> {
        (name == "mast").then(|| self.mast.clone())
    }
}

fn field_service(field: FieldConfig) -> Box<dyn VelocityService> {
    Box::new(move |position: Point2<f64>| -> Result<Vector2<f64>, QueryError> {
        Ok(field.sample(position))
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    let vehicle = VehicleFile::load(&opt.config)?;

    let boat = Boat {
        name: vehicle.name.clone(),
        hull: HullHandle(Arc::new(RwLock::new(Hull::new(&vehicle.hull)))),
        mast: MastJoint::default(),
    };
    let mut controllers = Vec::with_capacity(vehicle.appendages.len());
    for config in &vehicle.appendages {
        let controller = AppendageController::load(
            &boat,
            config.clone(),
            &vehicle.parameters,
            RefreshTiming::default(),
            |medium| {
                Ok(field_service(match medium {
                    Medium::Air => vehicle.wind_field,
                    Medium::Water => vehicle.current_field,
                }))
            },
        )?;
        if let Some(current) = vehicle.current {
            controller.fluid_handle().push_current(current);
        }
        if config.link_type == AppendageKind::Sail {
            controller.trim().set_target_angle(vehicle.sail_angle);
        }
        controllers.push(controller);
    }
    info!(
        "{}: {} appendages, {} steps of {}s",
        boat.name,
        controllers.len(),
        opt.ticks,
        opt.dt
    );

    for tick in 0..opt.ticks {
        for controller in &mut controllers {
            if let Some(force) = controller.on_update() {
                let dynamic = controller.state().dynamic();
                debug!(
                    "{tick:>4} {:<8} alpha {:>7.3} cl {:>7.3} cd {:>7.3} force [{:>8.2}, {:>8.2}, {:>8.2}]",
                    controller.state().config().link_name,
                    dynamic.alpha,
                    dynamic.cl,
                    dynamic.cd,
                    force.x,
                    force.y,
                    force.z,
                );
            }
        }
        boat.hull.0.write().step(opt.dt);
        if opt.realtime {
            thread::sleep(Duration::from_secs_f64(opt.dt));
        }
    }

    let hull = boat.hull.0.read();
    let (_, _, yaw) = hull.pose.rotation.euler_angles();
    println!(
        "{} after {:.1}s: position ({:.2}, {:.2}) heading {:.1} deg speed {:.2} m/s",
        boat.name,
        opt.ticks as f64 * opt.dt,
        hull.pose.translation.x,
        hull.pose.translation.y,
        yaw.to_degrees(),
        hull.velocity.norm(),
    );
    for controller in &controllers {
        let state = controller.state();
        println!(
            "  {:<8} applied {:>4} times, last force {:?}",
            state.config().link_name,
            state.ticks_applied(),
            state.dynamic().force.as_slice(),
        );
    }
    Ok(())
}
