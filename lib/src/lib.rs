#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::neg_cmp_op_on_partial_ord,
    clippy::float_cmp
)]
//! Trajectory simulation of a particle orbiting a single central body
//! with optional zonal harmonics.

pub mod bodies;
pub mod error;
pub mod kepler;
pub mod math;
pub mod propagator;
pub mod trajectory;

pub use error::{Error, Result};
