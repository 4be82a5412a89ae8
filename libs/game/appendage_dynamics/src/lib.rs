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
//! Lift and drag on the rudder, keel and sail of a small sailing vehicle, and the
//! per-tick driver that pushes them into the host simulator's rigid bodies.
mod body;
mod config;
mod controller;
pub mod model;
mod state;

pub use crate::{
    body::{HingeJoint, RigidBody, VehicleModel},
    config::{AppendageConfig, AppendageKind, DEFAULT_FLUID_DENSITY},
    controller::{AppendageController, SailTrim, MIN_RELATIVE_SPEED},
    model::{AeroForces, Coefficients},
    state::{AppendageState, DynamicState},
};

use thiserror::Error;

/// Collaborators that must exist before an appendage can run.
#[derive(Debug, Error)]
pub enum AppendageError {
    #[error("{model}: no link named {link:?}")]
    MissingLink { model: String, link: String },
    #[error("{model}: sail on {link:?} has no joint named {joint:?}")]
    MissingJoint {
        model: String,
        link: String,
        joint: Option<String>,
    },
}
