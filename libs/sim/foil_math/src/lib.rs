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
//! Small vector, rotation and angle helpers shared by the appendage force
//! models. Everything here is in `f64` and world-agnostic.
pub mod algorithm;
mod plane;

pub use crate::{
    algorithm::{
        fold_angle, fold_to_180, fold_to_90, normalize_or_zero, ratio_or_zero,
        rotate_into_world, DIRECTION_EPSILON,
    },
    plane::LiftDragPlane,
};
