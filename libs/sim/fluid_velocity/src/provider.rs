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
    estimate::FluidVelocityHandle,
    refresh::{RefreshTiming, Refresher},
    service::{ParameterStore, VelocityService, GLOBAL_WIND_X, GLOBAL_WIND_Y},
};
use anyhow::Result;
use log::{debug, info};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a fluid velocity estimate comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FluidSource {
    /// Read once from the shared parameter store at startup.
    Global,
    /// Polled from a remote service at the appendage's position.
    Local,
}

/// The fluid an appendage works in. Sails see wind, everything else water.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Medium {
    Air,
    Water,
}

impl Medium {
    /// Name of the remote service answering for this medium.
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::Air => "/windCurrent",
            Self::Water => "/waterCurrent",
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Air => write!(f, "wind"),
            Self::Water => write!(f, "water current"),
        }
    }
}

/// Supplies the ambient fluid velocity for one appendage.
///
/// The estimate is always readable without blocking on I/O. In local mode a
/// background thread owns every remote call; it is stopped and joined when the
/// provider is dropped.
pub struct FluidVelocityProvider {
    source: Option<FluidSource>,
    handle: FluidVelocityHandle,
    refresher: Option<Refresher>,
}

impl FluidVelocityProvider {
    /// No polling: the estimate starts at rest and only pushed updates move it.
    pub fn fixed(medium: Medium) -> Self {
        Self {
            source: None,
            handle: FluidVelocityHandle::new(medium, Vector3::zeros()),
            refresher: None,
        }
    }

    /// Seed the estimate from the global wind parameters. The value is read once
    /// and never refreshed. Only wind estimates take it; water starts at rest.
    pub fn global(medium: Medium, params: &dyn ParameterStore) -> Self {
        let mut initial = Vector3::zeros();
        match (params.get_f64(GLOBAL_WIND_X), params.get_f64(GLOBAL_WIND_Y)) {
            (Some(x), Some(y)) => {
                if medium == Medium::Air {
                    initial = Vector3::new(x, y, 0.);
                } else {
                    debug!("global wind ({x}, {y}) does not apply to a {medium} estimate");
                }
            }
            _ => info!(
                "cannot find {GLOBAL_WIND_X} and {GLOBAL_WIND_Y} in the parameter store; \
                 assuming still air"
            ),
        }
        Self {
            source: Some(FluidSource::Global),
            handle: FluidVelocityHandle::new(medium, initial),
            refresher: None,
        }
    }

    /// Poll `service` from a background thread with the given timing.
    /// Poll `service` in the background. `position` is where the first query is
    /// made; later queries follow `report_position`.
    pub fn local(
        name: &str,
        medium: Medium,
        position: &Point3<f64>,
        service: Box<dyn VelocityService>,
        timing: RefreshTiming,
    ) -> Result<Self> {
        let handle = FluidVelocityHandle::new(medium, Vector3::zeros());
        handle.report_position(position);
        info!("{name}: polling {} for {medium}", medium.service_name());
        let refresher = Refresher::spawn(name, service, handle.clone(), timing)?;
        Ok(Self {
            source: Some(FluidSource::Local),
            handle,
            refresher: Some(refresher),
        })
    }

    /// Build a provider for the configured source. `connect` is only called in
    /// local mode, to open the service for this medium.
    pub fn from_source<C>(
        name: &str,
        source: Option<FluidSource>,
        medium: Medium,
        position: &Point3<f64>,
        params: &dyn ParameterStore,
        timing: RefreshTiming,
        connect: C,
    ) -> Result<Self>
    where
        C: FnOnce(Medium) -> Result<Box<dyn VelocityService>>,
    {
        Ok(match source {
            None => Self::fixed(medium),
            Some(FluidSource::Global) => Self::global(medium, params),
            Some(FluidSource::Local) => {
                Self::local(name, medium, position, connect(medium)?, timing)?
            }
        })
    }

    pub fn source(&self) -> Option<FluidSource> {
        self.source
    }

    pub fn medium(&self) -> Medium {
        self.handle.medium()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_some()
    }

    /// Last written estimate, world frame.
    pub fn velocity(&self) -> Vector3<f64> {
        self.handle.velocity()
    }

    pub fn report_position(&self, position: &Point3<f64>) {
        self.handle.report_position(position);
    }

    /// A handle for push subscriptions to write through.
    pub fn handle(&self) -> FluidVelocityHandle {
        self.handle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{QueryError, StaticParameters};
    use anyhow::anyhow;
    use approx::assert_relative_eq;
    use crossbeam::channel::unbounded;
    use nalgebra::{Point2, Vector2};
    use std::{
        collections::VecDeque,
        time::{Duration, Instant},
    };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn wind_params() -> StaticParameters {
        StaticParameters::default()
            .with(GLOBAL_WIND_X, 4.)
            .with(GLOBAL_WIND_Y, -2.)
    }

    #[test]
    fn test_global_wind_is_read_once() {
        let provider = FluidVelocityProvider::global(Medium::Air, &wind_params());
        assert_eq!(provider.source(), Some(FluidSource::Global));
        assert!(!provider.is_refreshing());
        assert_relative_eq!(provider.velocity(), Vector3::new(4., -2., 0.));
    }

    #[test]
    fn test_global_wind_missing_is_still_air() {
        let params = StaticParameters::default().with(GLOBAL_WIND_X, 4.);
        let provider = FluidVelocityProvider::global(Medium::Air, &params);
        assert_relative_eq!(provider.velocity(), Vector3::zeros());
    }

    #[test]
    fn test_global_wind_does_not_seed_water() {
        let provider = FluidVelocityProvider::global(Medium::Water, &wind_params());
        assert_relative_eq!(provider.velocity(), Vector3::zeros());
        provider.handle().push_current(Vector3::new(0.3, 0.1, 0.));
        assert_relative_eq!(provider.velocity(), Vector3::new(0.3, 0.1, 0.));
    }

    #[test]
    fn test_from_source_only_connects_in_local_mode() -> Result<()> {
        let params = wind_params();
        for source in [None, Some(FluidSource::Global)] {
            let provider = FluidVelocityProvider::from_source(
                "keel",
                source,
                Medium::Water,
                &Point3::origin(),
                &params,
                RefreshTiming::default(),
                |_| Err(anyhow!("should not connect")),
            )?;
            assert!(!provider.is_refreshing());
        }
        assert!(FluidVelocityProvider::from_source(
            "keel",
            Some(FluidSource::Local),
            Medium::Water,
            &Point3::origin(),
            &params,
            RefreshTiming::default(),
            |_| Err(anyhow!("no service")),
        )
        .is_err());
        Ok(())
    }

    struct ScriptedService {
        replies: VecDeque<Result<Vector2<f64>, QueryError>>,
        calls: crossbeam::channel::Sender<Instant>,
    }

    impl VelocityService for ScriptedService {
        fn query(&mut self, _position: Point2<f64>) -> Result<Vector2<f64>, QueryError> {
            self.calls.send(Instant::now()).ok();
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(Vector2::new(1.5, -0.5)))
        }
    }

    #[test]
    fn test_local_backs_off_until_success() -> Result<()> {
        init_logging();
        let timing = RefreshTiming {
            period: Duration::from_millis(5),
            backoff: Duration::from_millis(60),
        };
        let (calls, called) = unbounded();
        let mut replies = VecDeque::new();
        for _ in 0..3 {
            replies.push_back(Err(QueryError::Unavailable("/waterCurrent".to_owned())));
        }
        replies.push_back(Ok(Vector2::new(1.5, -0.5)));
        let provider = FluidVelocityProvider::local(
            "rudder",
            Medium::Water,
            &Point3::origin(),
            Box::new(ScriptedService { replies, calls }),
            timing,
        )?;

        // Three failures: the estimate stays where it started.
        let mut attempts = Vec::new();
        for _ in 0..3 {
            attempts.push(called.recv_timeout(Duration::from_secs(5))?);
            assert_relative_eq!(provider.velocity(), Vector3::zeros());
        }
        // The fourth call succeeds; its result is stored before the fifth call.
        attempts.push(called.recv_timeout(Duration::from_secs(5))?);
        called.recv_timeout(Duration::from_secs(5))?;
        assert_relative_eq!(provider.velocity(), Vector3::new(1.5, -0.5, 0.));

        // Every failed attempt waited out the backoff before trying again.
        for pair in attempts.windows(2) {
            assert!(pair[1] - pair[0] >= timing.backoff);
        }
        Ok(())
    }

    #[test]
    fn test_first_local_query_is_at_start_position() -> Result<()> {
        let (positions, seen) = unbounded();
        let service = move |position: Point2<f64>| -> Result<Vector2<f64>, QueryError> {
            positions.send(position).ok();
            Ok(Vector2::zeros())
        };
        let _provider = FluidVelocityProvider::local(
            "keel",
            Medium::Water,
            &Point3::new(10., 20., -1.),
            Box::new(service),
            RefreshTiming::default(),
        )?;
        assert_eq!(
            seen.recv_timeout(Duration::from_secs(5))?,
            Point2::new(10., 20.)
        );
        Ok(())
    }

    #[test]
    fn test_drop_joins_refresh_thread() -> Result<()> {
        let service = |_: Point2<f64>| -> Result<Vector2<f64>, QueryError> {
            Err(QueryError::Unavailable("/windCurrent".to_owned()))
        };
        let provider = FluidVelocityProvider::local(
            "sail",
            Medium::Air,
            &Point3::origin(),
            Box::new(service),
            RefreshTiming {
                period: Duration::from_secs(60),
                backoff: Duration::from_secs(60),
            },
        )?;
        assert!(provider.is_refreshing());
        let start = Instant::now();
        drop(provider);
        assert!(start.elapsed() < Duration::from_secs(5));
        Ok(())
    }
}
