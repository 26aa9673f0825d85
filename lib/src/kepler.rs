//! Keplerian orbits and conversion to and from Cartesian state.

pub mod builder;
pub mod orbits;
