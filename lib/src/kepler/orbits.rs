//! Keplerian orbits.

use std::f64::consts;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{error::Result, math::VectorN, trajectory::TrajectoryEntry};

/// Classical orbital elements of a closed orbit.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeplerianElements {
    /// Semi-major axis (km).
    pub a: f64,
    /// Eccentricity (dimensionless).
    pub e: f64,
    /// Inclination (radians).
    pub i: f64,
    /// Longitude of ascending node (radians).
    pub lan: f64,
    /// Argument of periapsis (radians).
    pub argpe: f64,
    /// True anomaly (radians).
    pub ta: f64,
}

fn acos(x: f64) -> f64 {
    libm::acos(x.clamp(-1.0, 1.0))
}

impl KeplerianElements {
    /// Derive the elements of the orbit through `entry` around a body
    /// with gravitational parameter `mu`.
    ///
    /// Angles that are undefined for circular or equatorial orbits
    /// come out as NaN.
    pub fn from_state(entry: &TrajectoryEntry, mu: f64) -> Result<Self> {
        let rv = entry.position();
        let vv = entry.velocity();
        let r = rv.norm();

        // Specific mechanical energy
        let energy = vv.norm_squared() / 2.0 - mu / r;
        let hv = rv.cross(&vv)?;
        let ev = &vv.cross(&hv)? / mu - &rv / r;
        // Ascending node vector
        let nv = VectorN::from([0.0, 0.0, 1.0]).cross(&hv)?;

        let e = ev.norm();
        let n = nv.norm();

        let mut lan = acos(nv[0] / n);
        if nv[1] < 0.0 {
            lan = 2.0 * consts::PI - lan;
        }
        let mut argpe = acos(&ev * &nv / (n * e));
        if ev[2] < 0.0 {
            argpe = 2.0 * consts::PI - argpe;
        }
        let mut ta = acos(&ev * &rv / (r * e));
        if &rv * &vv < 0.0 {
            ta = 2.0 * consts::PI - ta;
        }

        Ok(Self {
            a: -mu / (2.0 * energy),
            e,
            i: acos(hv[2] / hv.norm()),
            lan,
            argpe,
            ta,
        })
    }

    /// Semi-latus rectum (km).
    pub fn p(&self) -> f64 {
        self.a * (1.0 - self.e.powi(2))
    }

    /// Calculate the position and velocity in the perifocal
    /// coordinate system PQW at the orbit's true anomaly.
    fn sv_pqw(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let p = self.p();
        let r = p / (1.0 + self.e * libm::cos(self.ta));
        let rv = r * libm::cos(self.ta) * Vector3::x() + r * libm::sin(self.ta) * Vector3::y();
        let vv = libm::sqrt(mu / p)
            * (-libm::sin(self.ta) * Vector3::x() + (self.e + libm::cos(self.ta)) * Vector3::y());
        (rv, vv)
    }

    /// Rotation undoing the three Euler angles `(lan, i, argpe)`.
    fn pqw_ijk_matrix(&self) -> Matrix3<f64> {
        let (sl, cl) = libm::sincos(self.lan);
        let (sw, cw) = libm::sincos(self.argpe);
        let (si, ci) = libm::sincos(self.i);

        Matrix3::new(
            cl * cw - sl * sw * ci,
            -cl * sw - sl * cw * ci,
            sl * si,
            sl * cw + cl * sw * ci,
            -sl * sw + cl * cw * ci,
            -cl * si,
            sw * si,
            cw * si,
            ci,
        )
    }

    /// Position and velocity in the reference frame at time `t`, for
    /// a central body with gravitational parameter `mu`.
    pub fn to_state(&self, mu: f64, t: f64) -> TrajectoryEntry {
        let (rv, vv) = self.sv_pqw(mu);
        let mat = self.pqw_ijk_matrix();
        let rv = VectorN::from(mat * rv);
        let vv = VectorN::from(mat * vv);
        TrajectoryEntry::from_vectors(&rv, &vv, t)
    }
}
