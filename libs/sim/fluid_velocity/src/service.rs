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
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Parameter names holding the global wind in global mode.
pub const GLOBAL_WIND_X: &str = "/uwsim/wind/x";
pub const GLOBAL_WIND_Y: &str = "/uwsim/wind/y";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("velocity service {0} is unavailable")]
    Unavailable(String),
    #[error("velocity service {service} rejected the request: {reason}")]
    Rejected { service: String, reason: String },
}

/// A remote request/response exchange answering "what is the fluid doing here".
///
/// Calls may block for as long as the transport takes; they are only ever made
/// from the background refresh thread.
pub trait VelocityService: Send + 'static {
    fn query(&mut self, position: Point2<f64>) -> Result<Vector2<f64>, QueryError>;
}

impl<F> VelocityService for F
where
    F: FnMut(Point2<f64>) -> Result<Vector2<f64>, QueryError> + Send + 'static,
{
    fn query(&mut self, position: Point2<f64>) -> Result<Vector2<f64>, QueryError> {
        self(position)
    }
}

/// Scalar lookups in the simulator's shared parameter store.
pub trait ParameterStore {
    fn get_f64(&self, name: &str) -> Option<f64>;
}

/// A parameter store fixed at load time.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StaticParameters {
    values: HashMap<String, f64>,
}

impl StaticParameters {
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_owned(), value);
        self
    }
}

impl ParameterStore for StaticParameters {
    fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}
