//! Time-ordered trajectory samples.

use std::{cmp, fmt, io};

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    math::VectorN,
};

/// A particle's position (`km`) and velocity (`km/s`) at a reference
/// time (`s`).
///
/// Entries compare and order by time only.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    t: f64,
}

impl TrajectoryEntry {
    pub fn new(x: f64, y: f64, z: f64, vx: f64, vy: f64, vz: f64, t: f64) -> Self {
        Self {
            x,
            y,
            z,
            vx,
            vy,
            vz,
            t,
        }
    }

    /// # Panics
    ///
    /// Panics if `position` or `velocity` are not 3-vectors.
    pub fn from_vectors(position: &VectorN, velocity: &VectorN, t: f64) -> Self {
        Self::new(
            position[0],
            position[1],
            position[2],
            velocity[0],
            velocity[1],
            velocity[2],
            t,
        )
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn vx(&self) -> f64 {
        self.vx
    }

    pub fn vy(&self) -> f64 {
        self.vy
    }

    pub fn vz(&self) -> f64 {
        self.vz
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn position(&self) -> VectorN {
        VectorN::from([self.x, self.y, self.z])
    }

    pub fn velocity(&self) -> VectorN {
        VectorN::from([self.vx, self.vy, self.vz])
    }

    fn key(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.t)
    }
}

impl PartialEq for TrajectoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TrajectoryEntry {}

impl PartialOrd for TrajectoryEntry {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TrajectoryEntry {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

/// One line, tab separated: `t x y z vx vy vz`. The alternate form
/// (`{:#}`) prints one labelled field per line.
impl fmt::Display for TrajectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "x: {} km", self.x)?;
            writeln!(f, "y: {} km", self.y)?;
            writeln!(f, "z: {} km", self.z)?;
            writeln!(f, "vx: {} km/s", self.vx)?;
            writeln!(f, "vy: {} km/s", self.vy)?;
            writeln!(f, "vz: {} km/s", self.vz)?;
            write!(f, "t: {} s", self.t)
        } else {
            write!(
                f,
                "{}",
                [self.t, self.x, self.y, self.z, self.vx, self.vy, self.vz]
                    .iter()
                    .join("\t")
            )
        }
    }
}

/// Entries kept in strictly increasing time order.
///
/// The first entry is the epoch: the initial conditions the trajectory
/// is propagated from. Serialized as the plain list of entries; a list
/// out of time order is rejected when deserializing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TrajectoryEntry>", into = "Vec<TrajectoryEntry>")]
pub struct Trajectory {
    entries: Vec<TrajectoryEntry>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<&TrajectoryEntry> {
        self.entries.get(index).ok_or(Error::TrajectoryIndex {
            index,
            len: self.len(),
        })
    }

    pub fn epoch(&self) -> Option<&TrajectoryEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&TrajectoryEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryEntry> {
        self.entries.iter()
    }

    /// The entry closest in time to `t`.
    ///
    /// Times before the epoch give the epoch and times after the last
    /// entry give the last entry. When `t` is equally far from two
    /// neighbouring entries the earlier one is returned.
    pub fn when(&self, t: f64) -> Result<&TrajectoryEntry> {
        let first = self.entries.first().ok_or(Error::EmptyTrajectory)?;
        if t < first.time() {
            return Ok(first);
        }

        // Index of the first entry later than `t`.
        let after = self.entries.partition_point(|e| e.time() <= t);
        match self.entries.get(after) {
            None => Ok(&self.entries[after - 1]),
            Some(next) => {
                let prev = &self.entries[after - 1];
                if next.time() - t < t - prev.time() {
                    Ok(next)
                } else {
                    Ok(prev)
                }
            }
        }
    }

    /// Insert `entry` keeping the time order and return its index.
    ///
    /// An entry with the same time as an existing one replaces it.
    pub fn include(&mut self, entry: TrajectoryEntry) -> usize {
        // Propagation appends in order, so check that first.
        let append = self
            .entries
            .last()
            .map_or(true, |last| last.key() < entry.key());
        if append {
            self.entries.push(entry);
            return self.entries.len() - 1;
        }

        match self.entries.binary_search_by_key(&entry.key(), TrajectoryEntry::key) {
            Ok(index) => {
                self.entries[index] = entry;
                index
            }
            Err(index) => {
                self.entries.insert(index, entry);
                index
            }
        }
    }

    /// Remove every entry and make `entry` the epoch.
    pub fn set_initial_entry(&mut self, entry: TrajectoryEntry) {
        self.entries.clear();
        self.entries.push(entry);
    }

    /// Remove every entry except the epoch.
    pub fn reset(&mut self) {
        self.entries.truncate(1);
    }

    /// Remove every entry, the epoch included.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write one tab separated line per entry, in time order.
    pub fn write_delimited(&self, mut w: impl io::Write) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(w, "{entry}")?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<TrajectoryEntry>> for Trajectory {
    type Error = Error;

    fn try_from(entries: Vec<TrajectoryEntry>) -> Result<Self> {
        if let Some((index, _)) = entries
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| a.key() >= b.key())
        {
            return Err(Error::UnorderedTrajectory { index: index + 1 });
        }
        Ok(Self { entries })
    }
}

impl From<Trajectory> for Vec<TrajectoryEntry> {
    fn from(trajectory: Trajectory) -> Self {
        trajectory.entries
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryEntry;
    type IntoIter = std::slice::Iter<'a, TrajectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
