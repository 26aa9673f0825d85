//! Numerical propagation of a trajectory.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::{debug, trace, warn};

use crate::{
    bodies::GravityModel,
    trajectory::{Trajectory, TrajectoryEntry},
};

/// Outcome of a propagation attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ExitCode {
    Succeeded = 0,
    NoInitialPosition = 1,
    CentralBodyUndefined = 2,
    InconsistentTimes = 3,
}

impl ExitCode {
    pub fn message(self) -> &'static str {
        match self {
            ExitCode::Succeeded => "succeeded",
            ExitCode::NoInitialPosition => "no initial position",
            ExitCode::CentralBodyUndefined => "central body undefined",
            ExitCode::InconsistentTimes => "final time or time step not set/inconsistent",
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Succeeded
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PropagatorState {
    #[default]
    NotStarted,
    Running,
    Succeeded,
    Failed(ExitCode),
}

/// Everything a propagator needs for one run. Borrowed only for the
/// duration of [`Propagator::propagate`].
pub struct Propagation<'a> {
    pub gravity: &'a dyn GravityModel,
    pub trajectory: &'a mut Trajectory,
    /// Step (s).
    pub time_step: Option<f64>,
    /// Time (s) the propagation must not go past.
    pub final_time: Option<f64>,
}

pub trait Propagator {
    /// Reset the trajectory to its epoch and propagate it.
    fn propagate(&mut self, ctx: Propagation<'_>) -> ExitCode;

    fn state(&self) -> PropagatorState;

    fn name(&self) -> &'static str;
}

/// Fixed-step leapfrog (velocity Verlet) integration.
///
/// The acceleration only depends on the position, which is what makes
/// the scheme applicable. See
/// <http://www.artcompsci.org/vol_1/v1_web/node34.html>.
#[derive(Clone, Debug, Default)]
pub struct LeapfrogPropagator {
    state: PropagatorState,
}

impl LeapfrogPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, code: ExitCode) -> ExitCode {
        warn!("propagation failed: {code}");
        self.state = PropagatorState::Failed(code);
        code
    }
}

impl Propagator for LeapfrogPropagator {
    #[allow(clippy::cast_precision_loss)]
    fn propagate(&mut self, ctx: Propagation<'_>) -> ExitCode {
        let Propagation {
            gravity,
            trajectory,
            time_step,
            final_time,
        } = ctx;

        if gravity.gravitational_parameter() == 0.0 {
            return self.fail(ExitCode::CentralBodyUndefined);
        }
        let Some(&epoch) = trajectory.epoch() else {
            return self.fail(ExitCode::NoInitialPosition);
        };
        trajectory.reset();

        let (Some(dt), Some(tf)) = (time_step, final_time) else {
            return self.fail(ExitCode::InconsistentTimes);
        };
        let t0 = epoch.time();
        // Also catches NaN or infinite settings and steps too small to
        // advance t0.
        if !(dt > 0.0 && tf.is_finite() && t0 < tf - dt) || t0 + dt == t0 {
            return self.fail(ExitCode::InconsistentTimes);
        }

        self.state = PropagatorState::Running;
        debug!(t0, tf, dt, "starting leapfrog propagation");

        let mut x = epoch.position();
        let mut v = epoch.velocity();
        let mut a = gravity.acceleration(&x);

        let mut t = t0;
        let mut step = 0_u64;
        while t < tf - dt {
            step += 1;
            t = t0 + step as f64 * dt;
            x = &x + &(&v * dt) + &a * (dt * dt / 2.0);
            let a_next = gravity.acceleration(&x);
            v = &v + &(&a + &a_next) * (dt / 2.0);
            a = a_next;
            let entry = TrajectoryEntry::from_vectors(&x, &v, t);
            trace!("{entry}");
            trajectory.include(entry);
        }

        debug!(entries = trajectory.len(), "propagation finished");
        self.state = PropagatorState::Succeeded;
        ExitCode::Succeeded
    }

    fn state(&self) -> PropagatorState {
        self.state
    }

    fn name(&self) -> &'static str {
        "leapfrog"
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts;

    use itertools::Itertools;

    use super::*;
    use crate::{bodies::Body, math::VectorN};

    const MU: f64 = 398_600.0;

    fn run(
        propagator: &mut LeapfrogPropagator,
        body: &Body,
        trajectory: &mut Trajectory,
        time_step: Option<f64>,
        final_time: Option<f64>,
    ) -> ExitCode {
        propagator.propagate(Propagation {
            gravity: body,
            trajectory,
            time_step,
            final_time,
        })
    }

    fn seeded(entry: TrajectoryEntry) -> Trajectory {
        let mut trajectory = Trajectory::new();
        trajectory.set_initial_entry(entry);
        trajectory
    }

    #[test]
    fn exit_codes() {
        assert_eq!(u8::from(ExitCode::Succeeded), 0);
        assert_eq!(u8::from(ExitCode::InconsistentTimes), 3);
        assert_eq!(ExitCode::try_from(2).ok(), Some(ExitCode::CentralBodyUndefined));
        assert!(ExitCode::try_from(4).is_err());
        assert_eq!(ExitCode::NoInitialPosition.to_string(), "no initial position");
    }

    #[test]
    fn preconditions_are_checked_in_order() {
        let mut propagator = LeapfrogPropagator::new();
        assert_eq!(propagator.state(), PropagatorState::NotStarted);

        let mut empty = Trajectory::new();
        let code = run(&mut propagator, &Body::default(), &mut empty, None, None);
        assert_eq!(code, ExitCode::CentralBodyUndefined);
        assert_eq!(
            propagator.state(),
            PropagatorState::Failed(ExitCode::CentralBodyUndefined)
        );

        let earth = Body::new(MU).unwrap();
        let code = run(&mut propagator, &earth, &mut empty, Some(10.0), Some(100.0));
        assert_eq!(code, ExitCode::NoInitialPosition);

        let epoch = TrajectoryEntry::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0, 50.0);
        let mut trajectory = seeded(epoch);
        trajectory.include(TrajectoryEntry::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 60.0));
        let code = run(&mut propagator, &earth, &mut trajectory, None, Some(100.0));
        assert_eq!(code, ExitCode::InconsistentTimes);
        // The store is still reset to its epoch.
        assert_eq!(trajectory.len(), 1);

        let code = run(&mut propagator, &earth, &mut trajectory, Some(10.0), Some(60.0));
        assert_eq!(code, ExitCode::InconsistentTimes);
        let code = run(&mut propagator, &earth, &mut trajectory, Some(10.0), Some(60.5));
        assert_eq!(code, ExitCode::Succeeded);
        assert_eq!(trajectory.len(), 2);
    }

    #[test]
    fn nan_and_infinite_times_are_inconsistent() {
        let mut propagator = LeapfrogPropagator::new();
        let earth = Body::new(MU).unwrap();
        let mut trajectory = seeded(TrajectoryEntry::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0, 0.0));

        for (dt, tf) in [
            (f64::NAN, 100.0),
            (10.0, f64::NAN),
            (10.0, f64::INFINITY),
            (f64::INFINITY, 100.0),
        ] {
            let code = run(&mut propagator, &earth, &mut trajectory, Some(dt), Some(tf));
            assert_eq!(code, ExitCode::InconsistentTimes, "dt = {dt}, tf = {tf}");
            assert_eq!(trajectory.len(), 1);
        }
    }

    #[test]
    fn steps_must_advance_the_clock() {
        let mut propagator = LeapfrogPropagator::new();
        let earth = Body::new(MU).unwrap();

        // 1 s is below the resolution of an f64 at 2^53.
        let t0 = 2.0_f64.powi(53);
        let mut trajectory = seeded(TrajectoryEntry::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0, t0));
        let code = run(&mut propagator, &earth, &mut trajectory, Some(1.0), Some(t0 + 100.0));
        assert_eq!(code, ExitCode::InconsistentTimes);

        // At 2^52 it is exactly one ulp.
        let t0 = 2.0_f64.powi(52);
        let mut trajectory = seeded(TrajectoryEntry::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0, t0));
        let code = run(&mut propagator, &earth, &mut trajectory, Some(1.0), Some(t0 + 11.0));
        assert_eq!(code, ExitCode::Succeeded);
        assert_eq!(trajectory.len(), 11);
        assert_eq!(trajectory.last().unwrap().time(), t0 + 10.0);
    }

    #[test]
    fn earth_orbit_reference_case() {
        let mut propagator = LeapfrogPropagator::new();
        let earth = Body::new(MU).unwrap();
        let mut trajectory = seeded(TrajectoryEntry::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0, 0.0));

        let code = run(&mut propagator, &earth, &mut trajectory, Some(10.0), Some(6000.0));
        assert_eq!(code, ExitCode::Succeeded);
        assert_eq!(propagator.state(), PropagatorState::Succeeded);
        assert!(trajectory
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.time() < b.time()));

        let last = trajectory.last().unwrap();
        assert!(last.time() <= 6000.0);
        assert!(last.time() >= 6000.0 - 10.0);
        assert_eq!(trajectory.len(), 600);

        // Running again does not pile up samples.
        let code = run(&mut propagator, &earth, &mut trajectory, Some(10.0), Some(6000.0));
        assert_eq!(code, ExitCode::Succeeded);
        assert_eq!(trajectory.len(), 600);
    }

    #[test]
    fn circular_orbit_closes_after_one_period() {
        let r = 7000.0_f64;
        let v = libm::sqrt(MU / r);
        let period = 2.0 * consts::PI * libm::sqrt(r.powi(3) / MU);
        let dt = period / 6000.0;

        let mut propagator = LeapfrogPropagator::new();
        let earth = Body::new(MU).unwrap();
        let mut trajectory = seeded(TrajectoryEntry::new(r, 0.0, 0.0, 0.0, v, 0.0, 0.0));
        let code = run(
            &mut propagator,
            &earth,
            &mut trajectory,
            Some(dt),
            Some(period + dt),
        );
        assert_eq!(code, ExitCode::Succeeded);

        let end = trajectory.when(period).unwrap();
        assert!((end.time() - period).abs() < dt / 2.0);
        assert!((end.x() - r).abs() < 1e-2, "x = {}", end.x());
        assert!(end.y().abs() < 1e-2, "y = {}", end.y());
        assert!(end.vx().abs() < 1e-5, "vx = {}", end.vx());
        assert!((end.vy() - v).abs() < 1e-5, "vy = {}", end.vy());
    }

    #[test]
    fn energy_is_conserved() {
        let mut propagator = LeapfrogPropagator::new();
        let earth = Body::new(MU).unwrap();
        let mut trajectory = seeded(TrajectoryEntry::new(7000.0, 0.0, 1000.0, 0.0, 8.0, 1.0, 0.0));
        let code = run(&mut propagator, &earth, &mut trajectory, Some(2.0), Some(20_000.0));
        assert_eq!(code, ExitCode::Succeeded);

        let energy =
            |e: &TrajectoryEntry| e.velocity().norm_squared() / 2.0 - MU / e.position().norm();
        let e0 = energy(trajectory.epoch().unwrap());
        let drift = trajectory
            .iter()
            .map(|e| ((energy(e) - e0) / e0).abs())
            .fold(0.0, f64::max);
        assert!(drift < 1e-4, "relative energy drift {drift}");
    }

    struct Constant;

    impl GravityModel for Constant {
        fn gravitational_parameter(&self) -> f64 {
            1.0
        }

        fn acceleration(&self, _position: &VectorN) -> VectorN {
            VectorN::from([0.0, 0.0, -1.0])
        }
    }

    #[test]
    fn constant_field_is_integrated_exactly() {
        let mut propagator = LeapfrogPropagator::new();
        let mut trajectory = seeded(TrajectoryEntry::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
        let code = propagator.propagate(Propagation {
            gravity: &Constant,
            trajectory: &mut trajectory,
            time_step: Some(0.5),
            final_time: Some(10.0),
        });
        assert_eq!(code, ExitCode::Succeeded);

        for e in &trajectory {
            let t = e.time();
            assert!((e.x() - t).abs() < 1e-12);
            assert!((e.z() + t * t / 2.0).abs() < 1e-12);
            assert!((e.vz() + t).abs() < 1e-12);
        }
    }
}
