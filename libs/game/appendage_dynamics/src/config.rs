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
use crate::model::Coefficients;
use fluid_velocity::{FluidSource, Medium};
use log::warn;
use nalgebra::Vector3;
use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Density of air at sea level and 20C, kg/m^3.
pub const DEFAULT_FLUID_DENSITY: f64 = 1.2041;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendageKind {
    #[default]
    Rudder,
    Keel,
    Sail,
}

impl AppendageKind {
    pub fn medium(&self) -> Medium {
        match self {
            Self::Sail => Medium::Air,
            Self::Rudder | Self::Keel => Medium::Water,
        }
    }
}

/// Everything an appendage needs to know about itself, fixed at load time.
///
/// Every key is optional; anything absent takes the default below.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppendageConfig {
    // Which body the appendage pushes on and which variant of the model it uses.
    #[serde(deserialize_with = "lenient")]
    pub link_name: String,
    #[serde(deserialize_with = "lenient")]
    pub link_type: AppendageKind,

    // The sail's hinge; unused by other kinds.
    #[serde(deserialize_with = "lenient")]
    pub joint_name: Option<String>,

    // Unset means the estimate only moves on pushed current updates.
    #[serde(deserialize_with = "lenient")]
    pub fluid_velocity: Option<FluidSource>,

    // Zero-lift angle of attack, radians.
    #[serde(rename = "a0", deserialize_with = "lenient")]
    pub alpha0: f64,

    // Lift, drag and moment slopes below stall, per radian.
    #[serde(deserialize_with = "lenient")]
    pub cla: f64,
    #[serde(deserialize_with = "lenient")]
    pub cda: f64,
    #[serde(deserialize_with = "lenient")]
    pub cma: f64,

    // Stall angle, radians, and the slopes used past it.
    #[serde(deserialize_with = "lenient")]
    pub alpha_stall: f64,
    #[serde(deserialize_with = "lenient")]
    pub cla_stall: f64,
    #[serde(deserialize_with = "lenient")]
    pub cda_stall: f64,
    #[serde(deserialize_with = "lenient")]
    pub cma_stall: f64,

    // Reference area, m^2.
    #[serde(deserialize_with = "lenient")]
    pub area: f64,

    // Fluid density, kg/m^3.
    #[serde(rename = "air_density", deserialize_with = "lenient")]
    pub rho: f64,

    // Center of pressure, body frame.
    #[serde(deserialize_with = "lenient")]
    pub cp: Vector3<f64>,

    // Blade forward (-drag) and upward (+lift) directions, body frame.
    #[serde(deserialize_with = "lenient")]
    pub forward: Vector3<f64>,
    #[serde(deserialize_with = "lenient")]
    pub upward: Vector3<f64>,
}

impl Default for AppendageConfig {
    fn default() -> Self {
        Self {
            link_name: String::new(),
            link_type: AppendageKind::default(),
            joint_name: None,
            fluid_velocity: None,
            alpha0: 0.,
            cla: 1.,
            cda: 0.01,
            cma: 0.01,
            alpha_stall: FRAC_PI_2,
            cla_stall: 0.,
            cda_stall: 1.,
            cma_stall: 0.,
            area: 1.,
            rho: DEFAULT_FLUID_DENSITY,
            cp: Vector3::zeros(),
            forward: Vector3::x(),
            upward: Vector3::z(),
        }
    }
}

/// What a key that is present but unreadable turns into. Numbers become NaN so
/// that `AppendageConfig::sanitized` swaps in the field's default.
trait Fallback {
    const WHAT: &'static str;
    fn fallback() -> Self;
}

impl Fallback for f64 {
    const WHAT: &'static str = "number";
    fn fallback() -> Self {
        f64::NAN
    }
}

impl Fallback for Vector3<f64> {
    const WHAT: &'static str = "vector";
    fn fallback() -> Self {
        Vector3::repeat(f64::NAN)
    }
}

impl Fallback for String {
    const WHAT: &'static str = "link name";
    fn fallback() -> Self {
        String::new()
    }
}

impl Fallback for Option<String> {
    const WHAT: &'static str = "joint name";
    fn fallback() -> Self {
        None
    }
}

impl Fallback for AppendageKind {
    const WHAT: &'static str = "link_type";
    fn fallback() -> Self {
        AppendageKind::default()
    }
}

impl Fallback for Option<FluidSource> {
    const WHAT: &'static str = "fluid_velocity source";
    fn fallback() -> Self {
        None
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Readable(T),
    Unreadable(IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Fallback,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Readable(value) => value,
        Lenient::Unreadable(_) => {
            warn!("ignoring unreadable {}; using the default", T::WHAT);
            T::fallback()
        }
    })
}

fn finite_or(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!("{name} = {value} is not usable; falling back to {default}");
        default
    }
}

fn positive_or(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0. {
        value
    } else {
        warn!("{name} = {value} must be positive; falling back to {default}");
        default
    }
}

impl AppendageConfig {
    /// Replace anything unusable with its default. Bad configuration is never
    /// fatal; it is logged and defaulted.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let (forward, upward) = if self.forward.iter().all(|v| v.is_finite())
            && self.upward.iter().all(|v| v.is_finite())
            && self.forward.cross(&self.upward).norm() > 1e-9
        {
            (self.forward, self.upward)
        } else {
            warn!(
                "{}: forward {:?} and upward {:?} do not span a plane; using +X and +Z",
                self.link_name, self.forward, self.upward
            );
            (defaults.forward, defaults.upward)
        };
        let cp = if self.cp.iter().all(|v| v.is_finite()) {
            self.cp
        } else {
            warn!("{}: cp {:?} is not usable; using the origin", self.link_name, self.cp);
            defaults.cp
        };
        Self {
            alpha0: finite_or("a0", self.alpha0, defaults.alpha0),
            cla: finite_or("cla", self.cla, defaults.cla),
            cda: finite_or("cda", self.cda, defaults.cda),
            cma: finite_or("cma", self.cma, defaults.cma),
            alpha_stall: finite_or("alpha_stall", self.alpha_stall, defaults.alpha_stall),
            cla_stall: finite_or("cla_stall", self.cla_stall, defaults.cla_stall),
            cda_stall: finite_or("cda_stall", self.cda_stall, defaults.cda_stall),
            cma_stall: finite_or("cma_stall", self.cma_stall, defaults.cma_stall),
            area: positive_or("area", self.area, defaults.area),
            rho: positive_or("air_density", self.rho, defaults.rho),
            cp,
            forward,
            upward,
            ..self
        }
    }

    pub fn coefficients(&self) -> Coefficients {
        Coefficients {
            alpha0: self.alpha0,
            cla: self.cla,
            cda: self.cda,
            cma: self.cma,
            alpha_stall: self.alpha_stall,
            cla_stall: self.cla_stall,
            cda_stall: self.cda_stall,
            cma_stall: self.cma_stall,
        }
    }
}
