//! Incremental construction of trajectory entries from either Cartesian
//! coordinates or Keplerian elements.

use std::fmt;

use crate::{
    bodies::Body,
    error::{Error, Result},
    kepler::orbits::KeplerianElements,
    trajectory::TrajectoryEntry,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartesianFields {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub vz: Option<f64>,
}

/// Angles are in radians.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeplerianFields {
    pub a: Option<f64>,
    pub e: Option<f64>,
    pub i: Option<f64>,
    pub lan: Option<f64>,
    pub argpe: Option<f64>,
    pub ta: Option<f64>,
}

impl From<KeplerianElements> for KeplerianFields {
    fn from(el: KeplerianElements) -> Self {
        Self {
            a: Some(el.a),
            e: Some(el.e),
            i: Some(el.i),
            lan: Some(el.lan),
            argpe: Some(el.argpe),
            ta: Some(el.ta),
        }
    }
}

/// Which family of setters was called last, and so which fields
/// [`EntryBuilder::build`] uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    Cartesian,
    #[default]
    Keplerian,
}

fn missing<const N: usize>(fields: [(&'static str, bool); N]) -> Vec<&'static str> {
    fields
        .into_iter()
        .filter_map(|(name, set)| (!set).then_some(name))
        .collect()
}

/// Builder for a [`TrajectoryEntry`].
///
/// Fields of both families are kept when switching between them; only
/// the active [`Mode`] changes. Angle setters take degrees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryBuilder {
    mode: Mode,
    cartesian: CartesianFields,
    keplerian: KeplerianFields,
    time: Option<f64>,
    reference_body: Option<Body>,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing entry: its state vector and its Keplerian
    /// elements around `body` are both filled in, Keplerian active.
    pub fn from_entry(entry: &TrajectoryEntry, body: Body) -> Result<Self> {
        let elements = KeplerianElements::from_state(entry, body.gravitational_parameter())?;
        Ok(Self {
            mode: Mode::Keplerian,
            cartesian: CartesianFields {
                x: Some(entry.x()),
                y: Some(entry.y()),
                z: Some(entry.z()),
                vx: Some(entry.vx()),
                vy: Some(entry.vy()),
                vz: Some(entry.vz()),
            },
            keplerian: elements.into(),
            time: Some(entry.time()),
            reference_body: Some(body),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cartesian_fields(&self) -> &CartesianFields {
        &self.cartesian
    }

    pub fn keplerian_fields(&self) -> &KeplerianFields {
        &self.keplerian
    }

    pub fn time(&self) -> Option<f64> {
        self.time
    }

    pub fn reference_body(&self) -> Option<&Body> {
        self.reference_body.as_ref()
    }

    fn cartesian(&mut self) -> &mut CartesianFields {
        self.mode = Mode::Cartesian;
        &mut self.cartesian
    }

    fn keplerian(&mut self) -> &mut KeplerianFields {
        self.mode = Mode::Keplerian;
        &mut self.keplerian
    }

    /// Position x-coordinate (km).
    pub fn set_x(&mut self, x: f64) -> &mut Self {
        self.cartesian().x = Some(x);
        self
    }

    /// Position y-coordinate (km).
    pub fn set_y(&mut self, y: f64) -> &mut Self {
        self.cartesian().y = Some(y);
        self
    }

    /// Position z-coordinate (km).
    pub fn set_z(&mut self, z: f64) -> &mut Self {
        self.cartesian().z = Some(z);
        self
    }

    /// Velocity x-coordinate (km/s).
    pub fn set_vx(&mut self, vx: f64) -> &mut Self {
        self.cartesian().vx = Some(vx);
        self
    }

    /// Velocity y-coordinate (km/s).
    pub fn set_vy(&mut self, vy: f64) -> &mut Self {
        self.cartesian().vy = Some(vy);
        self
    }

    /// Velocity z-coordinate (km/s).
    pub fn set_vz(&mut self, vz: f64) -> &mut Self {
        self.cartesian().vz = Some(vz);
        self
    }

    /// Semi-major axis (km), greater than 0.
    pub fn set_semi_major_axis(&mut self, a: f64) -> Result<&mut Self> {
        if !(a > 0.0) {
            return Err(Error::InvalidSemiMajorAxis(a));
        }
        self.keplerian().a = Some(a);
        Ok(self)
    }

    /// Eccentricity in `[0, 1)`. Open orbits are not supported.
    pub fn set_eccentricity(&mut self, e: f64) -> Result<&mut Self> {
        if !(0.0..1.0).contains(&e) {
            return Err(Error::InvalidEccentricity(e));
        }
        self.keplerian().e = Some(e);
        Ok(self)
    }

    /// Inclination in `[0, 180]` degrees.
    pub fn set_inclination(&mut self, i: f64) -> Result<&mut Self> {
        if !(0.0..=180.0).contains(&i) {
            return Err(Error::InvalidInclination(i));
        }
        self.keplerian().i = Some(i.to_radians());
        Ok(self)
    }

    pub fn set_longitude_ascending_node(&mut self, lan: f64) -> &mut Self {
        self.keplerian().lan = Some(lan.to_radians());
        self
    }

    pub fn set_argument_periapsis(&mut self, argpe: f64) -> &mut Self {
        self.keplerian().argpe = Some(argpe.to_radians());
        self
    }

    pub fn set_true_anomaly(&mut self, ta: f64) -> &mut Self {
        self.keplerian().ta = Some(ta.to_radians());
        self
    }

    /// Reference time (s), not negative. Shared by both modes.
    pub fn set_time(&mut self, t: f64) -> Result<&mut Self> {
        if !(t >= 0.0) {
            return Err(Error::InvalidTime(t));
        }
        self.time = Some(t);
        Ok(self)
    }

    /// Body the Keplerian elements refer to.
    pub fn set_reference_body(&mut self, body: Body) -> &mut Self {
        self.reference_body = Some(body);
        self
    }

    /// Names of the fields the active mode still needs.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let time = ("t", self.time.is_some());
        match self.mode {
            Mode::Cartesian => {
                let c = &self.cartesian;
                missing([
                    ("x", c.x.is_some()),
                    ("y", c.y.is_some()),
                    ("z", c.z.is_some()),
                    ("vx", c.vx.is_some()),
                    ("vy", c.vy.is_some()),
                    ("vz", c.vz.is_some()),
                    time,
                ])
            }
            Mode::Keplerian => {
                let k = &self.keplerian;
                missing([
                    ("a", k.a.is_some()),
                    ("e", k.e.is_some()),
                    ("i", k.i.is_some()),
                    ("lan", k.lan.is_some()),
                    ("argpe", k.argpe.is_some()),
                    ("ta", k.ta.is_some()),
                    time,
                    ("reference body", self.reference_body.is_some()),
                ])
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn build(&self) -> Result<TrajectoryEntry> {
        match (
            self.mode,
            self.time,
            &self.cartesian,
            &self.keplerian,
            self.reference_body.as_ref(),
        ) {
            (
                Mode::Cartesian,
                Some(t),
                &CartesianFields {
                    x: Some(x),
                    y: Some(y),
                    z: Some(z),
                    vx: Some(vx),
                    vy: Some(vy),
                    vz: Some(vz),
                },
                _,
                _,
            ) => Ok(TrajectoryEntry::new(x, y, z, vx, vy, vz, t)),
            (
                Mode::Keplerian,
                Some(t),
                _,
                &KeplerianFields {
                    a: Some(a),
                    e: Some(e),
                    i: Some(i),
                    lan: Some(lan),
                    argpe: Some(argpe),
                    ta: Some(ta),
                },
                Some(body),
            ) => {
                let elements = KeplerianElements {
                    a,
                    e,
                    i,
                    lan,
                    argpe,
                    ta,
                };
                Ok(elements.to_state(body.gravitational_parameter(), t))
            }
            _ => Err(Error::IncompleteEntry(self.missing_fields())),
        }
    }
}

struct Field(Option<f64>, &'static str);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) if self.1.is_empty() => write!(f, "{v}"),
            Some(v) => write!(f, "{v} {}", self.1),
            None => write!(f, "not set"),
        }
    }
}

/// Lists the fields of the active mode, angles in degrees, followed by
/// the reference time.
impl fmt::Display for EntryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Cartesian => {
                let c = &self.cartesian;
                writeln!(f, "x: {}", Field(c.x, "km"))?;
                writeln!(f, "y: {}", Field(c.y, "km"))?;
                writeln!(f, "z: {}", Field(c.z, "km"))?;
                writeln!(f, "vx: {}", Field(c.vx, "km/s"))?;
                writeln!(f, "vy: {}", Field(c.vy, "km/s"))?;
                writeln!(f, "vz: {}", Field(c.vz, "km/s"))?;
            }
            Mode::Keplerian => {
                let k = &self.keplerian;
                let deg = |v: Option<f64>| Field(v.map(f64::to_degrees), "degrees");
                writeln!(f, "a: {}", Field(k.a, "km"))?;
                writeln!(f, "e: {}", Field(k.e, ""))?;
                writeln!(f, "i: {}", deg(k.i))?;
                writeln!(f, "Longitude of Ascending Node: {}", deg(k.lan))?;
                writeln!(f, "Argument of Periapsis: {}", deg(k.argpe))?;
                writeln!(f, "True Anomaly: {}", deg(k.ta))?;
            }
        }
        write!(f, "Reference Time: {}", Field(self.time, "seconds"))
    }
}
