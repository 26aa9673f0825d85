//! Definitions of celestial bodies.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::{Error, Result},
    math::VectorN,
};

/// Something that can tell the propagator how a particle accelerates.
///
/// The acceleration depends on the position only.
pub trait GravityModel {
    /// Standard gravitational parameter (`km^3/s^2`). A value of 0
    /// means the model has not been configured.
    fn gravitational_parameter(&self) -> f64;

    /// Acceleration (`km/s^2`) at `position` (`km`).
    fn acceleration(&self, position: &VectorN) -> VectorN;
}

/// Zonal harmonic ("Jeffery") constants `J2, J3, ...` of a body, in
/// units of `km^(n+3)/s^2`.
///
/// Orders are stored contiguously starting at 2, so `Jn` can only be
/// set once `J(n-1)` is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZonalHarmonics(Vec<f64>);

impl ZonalHarmonics {
    pub const FIRST_ORDER: u32 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    fn slot(order: u32) -> Result<usize> {
        if order < Self::FIRST_ORDER {
            return Err(Error::HarmonicOrderTooLow(order));
        }
        Ok((order - Self::FIRST_ORDER) as usize)
    }

    /// Set `J{order}`, overwriting it if it is already present.
    pub fn set(&mut self, order: u32, value: f64) -> Result<()> {
        let slot = Self::slot(order)?;
        match slot.cmp(&self.0.len()) {
            std::cmp::Ordering::Less => self.0[slot] = value,
            std::cmp::Ordering::Equal => self.0.push(value),
            std::cmp::Ordering::Greater => return Err(Error::HarmonicOutOfSequence { order }),
        }
        Ok(())
    }

    pub fn get(&self, order: u32) -> Option<f64> {
        Self::slot(order)
            .ok()
            .and_then(|slot| self.0.get(slot).copied())
    }

    pub fn contains(&self, order: u32) -> bool {
        self.get(order).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(order, value)` pairs in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        (Self::FIRST_ORDER..).zip(self.0.iter().copied())
    }
}

/// A celestial body exerting gravitational influence on a particle.
///
/// Deserializing goes through the same checks as the setters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BodyRecord")]
pub struct Body {
    /// Standard gravitational parameter (`km^3/s^2`)
    mu: f64,
    /// Jeffery constants (`km^(n+3)/s^2`)
    #[serde(default)]
    harmonics: ZonalHarmonics,
}

#[derive(Deserialize)]
struct BodyRecord {
    mu: f64,
    #[serde(default)]
    harmonics: Vec<f64>,
}

impl TryFrom<BodyRecord> for Body {
    type Error = Error;

    fn try_from(record: BodyRecord) -> Result<Self> {
        Self::with_jeffery_constants(record.mu, &record.harmonics)
    }
}

impl Body {
    pub fn new(mu: f64) -> Result<Self> {
        let mut body = Self::default();
        body.set_gravitational_parameter(mu)?;
        Ok(body)
    }

    /// A body with `J2, J3, ...` taken in order from `harmonics`.
    pub fn with_jeffery_constants(mu: f64, harmonics: &[f64]) -> Result<Self> {
        let mut body = Self::new(mu)?;
        for (n, &j) in (ZonalHarmonics::FIRST_ORDER..).zip(harmonics) {
            body.set_jeffery_constant(n, j)?;
        }
        Ok(body)
    }

    /// Earth with its `J2` and `J3` terms.
    pub fn earth() -> Self {
        Self {
            mu: 398_600.441_8,
            harmonics: ZonalHarmonics(vec![1.755_53e10, -2.619_13e11]),
        }
    }

    pub fn set_gravitational_parameter(&mut self, mu: f64) -> Result<()> {
        if !(mu >= 0.0) {
            return Err(Error::NegativeGravitationalParameter(mu));
        }
        self.mu = mu;
        Ok(())
    }

    pub fn gravitational_parameter(&self) -> f64 {
        self.mu
    }

    pub fn set_jeffery_constant(&mut self, n: u32, value: f64) -> Result<()> {
        self.harmonics.set(n, value)
    }

    pub fn jeffery_constant(&self, n: u32) -> Result<f64> {
        self.harmonics.get(n).ok_or(Error::HarmonicNotSet(n))
    }

    pub fn is_jeffery_constant_set(&self, n: u32) -> bool {
        self.harmonics.contains(n)
    }

    pub fn harmonics(&self) -> &ZonalHarmonics {
        &self.harmonics
    }
}

impl GravityModel for Body {
    fn gravitational_parameter(&self) -> f64 {
        self.mu
    }

    /// Two-body acceleration plus the `J2` and `J3` zonal terms when
    /// they are set. Higher orders are not modelled.
    fn acceleration(&self, position: &VectorN) -> VectorN {
        let r = position.norm();
        let mut accel = -self.mu / r.powi(3) * position;
        if position.dim() != 3 {
            return accel;
        }

        let (x, y, z) = (position[0], position[1], position[2]);
        let z2 = z * z;
        // Squared distance to the spin axis.
        let rho2 = x * x + y * y;

        if let Some(j2) = self.harmonics.get(2) {
            let k = j2 / r.powi(7);
            accel[0] += k * x * (6.0 * z2 - 1.5 * rho2);
            accel[1] += k * y * (6.0 * z2 - 1.5 * rho2);
            accel[2] += k * z * (3.0 * z2 - 4.5 * rho2);
        }

        if let Some(j3) = self.harmonics.get(3) {
            let k = j3 / r.powi(9);
            accel[0] += k * x * z * (10.0 * z2 - 7.5 * rho2);
            accel[1] += k * y * z * (10.0 * z2 - 7.5 * rho2);
            accel[2] += k * (4.0 * z2 * (z2 - 3.0 * rho2) + 1.5 * rho2 * rho2);
        }

        if self.harmonics.len() > 2 {
            trace!(
                "ignoring {} zonal harmonic(s) above J3",
                self.harmonics.len() - 2
            );
        }

        accel
    }
}
