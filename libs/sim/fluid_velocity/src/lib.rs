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
mod estimate;
mod provider;
mod refresh;
mod service;

pub use crate::{
    estimate::FluidVelocityHandle,
    provider::{FluidSource, FluidVelocityProvider, Medium},
    refresh::RefreshTiming,
    service::{
        ParameterStore, QueryError, StaticParameters, VelocityService, GLOBAL_WIND_X,
        GLOBAL_WIND_Y,
    },
};
