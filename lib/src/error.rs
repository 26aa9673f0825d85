//! Errors raised by the orbit library.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("the gravitational parameter cannot be negative, got {0}")]
    NegativeGravitationalParameter(f64),

    #[error("Jeffery constant J{order} cannot be set before J{}", .order - 1)]
    HarmonicOutOfSequence { order: u32 },

    #[error("Jeffery constant order must be at least 2, got {0}")]
    HarmonicOrderTooLow(u32),

    #[error("Jeffery constant J{0} has not been set")]
    HarmonicNotSet(u32),

    #[error("semi-major axis must be greater than 0, got {0} km")]
    InvalidSemiMajorAxis(f64),

    #[error("eccentricity must be >= 0 and < 1, got {0}")]
    InvalidEccentricity(f64),

    #[error("inclination must be between 0 and 180 degrees, got {0}")]
    InvalidInclination(f64),

    #[error("reference time must be greater than or equal to 0, got {0} s")]
    InvalidTime(f64),

    #[error("time step must be greater than 0, got {0} s")]
    InvalidTimeStep(f64),

    #[error("final time must be greater than 0, got {0} s")]
    InvalidFinalTime(f64),

    #[error("not enough parameters have been set (missing: {})", .0.join(", "))]
    IncompleteEntry(Vec<&'static str>),

    #[error("vector dimension must be greater than 0")]
    ZeroDimension,

    #[error("vector dimensions must coincide ({left} != {right})")]
    DimensionMismatch { left: usize, right: usize },

    #[error("cross product is only defined for 3-vectors, got dimension {0}")]
    CrossDimension(usize),

    #[error("index {index} is out of range for a vector of dimension {dim}")]
    VectorIndex { index: usize, dim: usize },

    #[error("index {index} is out of range for a trajectory of {len} entries")]
    TrajectoryIndex { index: usize, len: usize },

    #[error("trajectory entry {index} is not later than the one before it")]
    UnorderedTrajectory { index: usize },

    #[error("the trajectory is empty")]
    EmptyTrajectory,
}
