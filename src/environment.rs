use std::{fmt, fs, path::Path};

use color_eyre::eyre;
use orbcalc::{
    bodies::{Body, GravityModel},
    kepler::builder::EntryBuilder,
    math::VectorN,
    propagator::{ExitCode, LeapfrogPropagator, Propagation, Propagator},
    trajectory::{Trajectory, TrajectoryEntry},
    Error,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything a simulation run works on: the central body, the
/// trajectory being built, the entry builder used to assemble initial
/// conditions and the propagation settings.
pub struct Environment {
    central_body: Body,
    trajectory: Trajectory,
    builder: EntryBuilder,
    propagator: Box<dyn Propagator>,
    time_step: Option<f64>,
    final_time: Option<f64>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            central_body: Body::default(),
            trajectory: Trajectory::new(),
            builder: EntryBuilder::new(),
            propagator: Box::new(LeapfrogPropagator::new()),
            time_step: None,
            final_time: None,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("central_body", &self.central_body)
            .field("trajectory", &self.trajectory.len())
            .field("builder", &self.builder)
            .field("propagator", &self.propagator.name())
            .field("time_step", &self.time_step)
            .field("final_time", &self.final_time)
            .finish()
    }
}

/// The persisted part of an [`Environment`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Session {
    pub central_body: Body,
    pub trajectory: Trajectory,
    #[serde(default)]
    pub time_step: Option<f64>,
    #[serde(default)]
    pub final_time: Option<f64>,
}

impl Environment {
    pub fn central_body(&self) -> &Body {
        &self.central_body
    }

    pub fn central_body_mut(&mut self) -> &mut Body {
        &mut self.central_body
    }

    pub fn set_central_body(&mut self, body: Body) {
        self.central_body = body;
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn trajectory_mut(&mut self) -> &mut Trajectory {
        &mut self.trajectory
    }

    pub fn builder(&self) -> &EntryBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut EntryBuilder {
        &mut self.builder
    }

    pub fn set_builder(&mut self, builder: EntryBuilder) {
        self.builder = builder;
    }

    pub fn propagator(&self) -> &dyn Propagator {
        &*self.propagator
    }

    pub fn set_propagator(&mut self, propagator: Box<dyn Propagator>) {
        self.propagator = propagator;
    }

    pub fn time_step(&self) -> Option<f64> {
        self.time_step
    }

    pub fn set_time_step(&mut self, dt: f64) -> orbcalc::Result<()> {
        if !(dt > 0.0) {
            return Err(Error::InvalidTimeStep(dt));
        }
        self.time_step = Some(dt);
        Ok(())
    }

    pub fn final_time(&self) -> Option<f64> {
        self.final_time
    }

    pub fn set_final_time(&mut self, tf: f64) -> orbcalc::Result<()> {
        if !(tf > 0.0) {
            return Err(Error::InvalidFinalTime(tf));
        }
        self.final_time = Some(tf);
        Ok(())
    }

    /// Acceleration at the position of `entry` due to the central body.
    pub fn acceleration(&self, entry: &TrajectoryEntry) -> VectorN {
        self.central_body.acceleration(&entry.position())
    }

    pub fn propagate(&mut self) -> ExitCode {
        let code = self.propagator.propagate(Propagation {
            gravity: &self.central_body,
            trajectory: &mut self.trajectory,
            time_step: self.time_step,
            final_time: self.final_time,
        });
        info!(
            propagator = self.propagator.name(),
            code = u8::from(code),
            entries = self.trajectory.len(),
            "{code}"
        );
        code
    }

    pub fn session(&self) -> Session {
        Session {
            central_body: self.central_body.clone(),
            trajectory: self.trajectory.clone(),
            time_step: self.time_step,
            final_time: self.final_time,
        }
    }

    /// Replace the body, trajectory and time settings with those of
    /// `session`. Nothing changes if a time setting is invalid.
    pub fn restore(&mut self, session: Session) -> eyre::Result<()> {
        let mut staged = Self::default();
        if let Some(dt) = session.time_step {
            staged.set_time_step(dt)?;
        }
        if let Some(tf) = session.final_time {
            staged.set_final_time(tf)?;
        }
        self.time_step = staged.time_step;
        self.final_time = staged.final_time;
        self.central_body = session.central_body;
        self.trajectory = session.trajectory;
        Ok(())
    }

    pub fn save_session(&self, path: &Path) -> eyre::Result<()> {
        fs::write(
            path,
            ron::ser::to_string_pretty(&self.session(), ron::ser::PrettyConfig::default())?,
        )?;
        info!("saved session to {}", path.display());
        Ok(())
    }

    pub fn load_session(&mut self, path: &Path) -> eyre::Result<()> {
        let session: Session = ron::from_str(&fs::read_to_string(path)?)?;
        self.restore(session)?;
        info!("loaded session from {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use orbcalc::propagator::PropagatorState;

    use super::*;

    fn leo() -> Environment {
        let mut env = Environment::default();
        env.central_body_mut()
            .set_gravitational_parameter(398_600.0)
            .unwrap();
        env.trajectory_mut()
            .set_initial_entry(TrajectoryEntry::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0, 0.0));
        env.set_time_step(10.0).unwrap();
        env.set_final_time(600.0).unwrap();
        env
    }

    #[test]
    fn time_settings_must_be_positive() {
        let mut env = Environment::default();
        assert_eq!(env.set_time_step(0.0), Err(Error::InvalidTimeStep(0.0)));
        assert_eq!(env.set_final_time(-3.0), Err(Error::InvalidFinalTime(-3.0)));
        assert!(env.set_time_step(f64::NAN).is_err());
        assert!(env.set_final_time(f64::NAN).is_err());
        assert_eq!(env.time_step(), None);
        assert_eq!(env.final_time(), None);
    }

    #[test]
    fn propagate_uses_the_configured_strategy() {
        let mut env = leo();
        assert_eq!(env.propagator().state(), PropagatorState::NotStarted);
        assert_eq!(env.propagate(), ExitCode::Succeeded);
        assert_eq!(env.propagator().state(), PropagatorState::Succeeded);
        assert_eq!(env.trajectory().len(), 60);

        let mut env = Environment::default();
        assert_eq!(env.propagate(), ExitCode::CentralBodyUndefined);
    }

    struct Stub;

    impl Propagator for Stub {
        fn propagate(&mut self, ctx: Propagation<'_>) -> ExitCode {
            ctx.trajectory.clear();
            ExitCode::NoInitialPosition
        }

        fn state(&self) -> PropagatorState {
            PropagatorState::Failed(ExitCode::NoInitialPosition)
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    #[test]
    fn propagator_can_be_swapped() {
        let mut env = leo();
        env.set_propagator(Box::new(Stub));
        assert_eq!(env.propagator().name(), "stub");
        assert_eq!(env.propagate(), ExitCode::NoInitialPosition);
        assert!(env.trajectory().is_empty());
    }

    #[test]
    fn acceleration_points_at_the_body() {
        let env = leo();
        let entry = TrajectoryEntry::new(0.0, -7000.0, 0.0, 1.0, 2.0, 3.0, 0.0);
        let a = env.acceleration(&entry);
        assert!(a[1] > 0.0);
        assert_eq!(a[0], 0.0);
    }

    #[test]
    fn session_round_trip() {
        let mut env = leo();
        env.central_body_mut().set_jeffery_constant(2, 1.755_53e10).unwrap();
        assert_eq!(env.propagate(), ExitCode::Succeeded);

        let path = std::env::temp_dir().join(format!("orbcalc-session-{}.ron", std::process::id()));
        env.save_session(&path).unwrap();

        let mut restored = Environment::default();
        restored.load_session(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(restored.central_body(), env.central_body());
        assert_eq!(restored.trajectory().len(), env.trajectory().len());
        assert_eq!(restored.time_step(), Some(10.0));
        assert_eq!(restored.final_time(), Some(600.0));
        let (a, b) = (restored.trajectory().at(30).unwrap(), env.trajectory().at(30).unwrap());
        assert_eq!(a.x(), b.x());
        assert_eq!(a.vz(), b.vz());
    }

    const ENTRY_5: &str = "(x: 1.0, y: 0.0, z: 0.0, vx: 0.0, vy: 1.0, vz: 0.0, t: 5.0)";
    const ENTRY_10: &str = "(x: 0.0, y: 1.0, z: 0.0, vx: -1.0, vy: 0.0, vz: 0.0, t: 10.0)";

    fn session_text(mu: f64, entries: &[&str]) -> String {
        format!(
            "(central_body: (mu: {mu:?}, harmonics: [1.0]), trajectory: [{}], time_step: Some(1.0))",
            entries.join(", ")
        )
    }

    #[test]
    fn sessions_are_validated_on_load() {
        let text = session_text(1.0, &[ENTRY_5, ENTRY_10]);
        let session: Session = ron::from_str(&text).unwrap();
        assert_eq!(session.trajectory.len(), 2);
        assert_eq!(session.central_body.jeffery_constant(2), Ok(1.0));

        assert!(ron::from_str::<Session>(&session_text(1.0, &[ENTRY_10, ENTRY_5])).is_err());
        assert!(ron::from_str::<Session>(&session_text(1.0, &[ENTRY_5, ENTRY_5])).is_err());
        assert!(ron::from_str::<Session>(&session_text(-1.0, &[ENTRY_5])).is_err());

        let path = std::env::temp_dir().join(format!("orbcalc-unordered-{}.ron", std::process::id()));
        fs::write(&path, session_text(1.0, &[ENTRY_10, ENTRY_5])).unwrap();
        let mut env = leo();
        assert!(env.load_session(&path).is_err());
        fs::remove_file(&path).unwrap();
        assert_eq!(env.trajectory().len(), 1);
        assert_eq!(env.central_body().gravitational_parameter(), 398_600.0);
    }

    #[test]
    fn restore_is_all_or_nothing() {
        let mut env = leo();
        let session = Session {
            central_body: Body::earth(),
            trajectory: Trajectory::new(),
            time_step: Some(5.0),
            final_time: Some(-1.0),
        };
        assert!(env.restore(session).is_err());
        assert_eq!(env.time_step(), Some(10.0));
        assert_eq!(env.trajectory().len(), 1);
    }
}
