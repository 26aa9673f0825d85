//! Math utilities.

use std::{fmt, ops};

use itertools::Itertools;
use nalgebra::Vector3;

use crate::error::{Error, Result};

/// A real vector whose dimension is fixed at construction.
///
/// Binary operators panic when the dimensions of the operands differ;
/// the `checked_*` methods, [`VectorN::dot`] and [`VectorN::cross`]
/// report the mismatch as an [`Error`] instead.
///
/// `*` between two vectors is the dot product. Use
/// [`VectorN::component_mul`] for the element-wise product.
///
/// Division by zero follows IEEE-754 and produces infinite or NaN
/// components.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorN {
    data: Box<[f64]>,
}

impl VectorN {
    /// A vector of dimension `dim` with every component set to 0.
    pub fn zeros(dim: usize) -> Result<Self> {
        Self::from_vec(vec![0.0; dim])
    }

    pub fn from_vec(data: Vec<f64>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::ZeroDimension);
        }
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    pub fn dim(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        self.data.get(index).copied().ok_or(Error::VectorIndex {
            index,
            dim: self.dim(),
        })
    }

    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let dim = self.dim();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(Error::VectorIndex { index, dim })?;
        *slot = value;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        libm::sqrt(self.norm_squared())
    }

    pub fn norm_squared(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    fn zip_with(&self, other: &VectorN, f: impl Fn(f64, f64) -> f64) -> Result<VectorN> {
        if self.dim() != other.dim() {
            return Err(Error::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(Self {
            data: self.iter().zip(other.iter()).map(|(a, b)| f(a, b)).collect(),
        })
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> VectorN {
        Self {
            data: self.iter().map(f).collect(),
        }
    }

    pub fn checked_add(&self, other: &VectorN) -> Result<VectorN> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn checked_sub(&self, other: &VectorN) -> Result<VectorN> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn component_mul(&self, other: &VectorN) -> Result<VectorN> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn dot(&self, other: &VectorN) -> Result<f64> {
        Ok(self.component_mul(other)?.iter().sum())
    }

    pub fn cross(&self, other: &VectorN) -> Result<VectorN> {
        if self.dim() != 3 {
            return Err(Error::CrossDimension(self.dim()));
        }
        if other.dim() != 3 {
            return Err(Error::CrossDimension(other.dim()));
        }
        let (a, b) = (&self.data, &other.data);
        Ok(Self {
            data: Box::new([
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ]),
        })
    }
}

fn unwrap_dim<T>(res: Result<T>) -> T {
    match res {
        Ok(v) => v,
        Err(e) => panic!("{e}"),
    }
}

impl<const N: usize> From<[f64; N]> for VectorN {
    /// # Panics
    ///
    /// Panics if `N` is 0.
    fn from(value: [f64; N]) -> Self {
        unwrap_dim(Self::from_vec(value.to_vec()))
    }
}

impl From<Vector3<f64>> for VectorN {
    fn from(value: Vector3<f64>) -> Self {
        Self {
            data: Box::new([value.x, value.y, value.z]),
        }
    }
}

impl TryFrom<&VectorN> for Vector3<f64> {
    type Error = Error;

    fn try_from(value: &VectorN) -> Result<Self> {
        match value.data[..] {
            [x, y, z] => Ok(Vector3::new(x, y, z)),
            _ => Err(Error::DimensionMismatch {
                left: value.dim(),
                right: 3,
            }),
        }
    }
}

impl ops::Index<usize> for VectorN {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl ops::IndexMut<usize> for VectorN {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl ops::Neg for &VectorN {
    type Output = VectorN;

    fn neg(self) -> Self::Output {
        self.map(|x| -x)
    }
}

impl ops::Neg for VectorN {
    type Output = VectorN;

    fn neg(self) -> Self::Output {
        -&self
    }
}

macro_rules! vector_binop {
    ($trait:ident, $method:ident, $checked:ident) => {
        impl ops::$trait<&VectorN> for &VectorN {
            type Output = VectorN;

            fn $method(self, rhs: &VectorN) -> Self::Output {
                unwrap_dim(self.$checked(rhs))
            }
        }

        impl ops::$trait<VectorN> for VectorN {
            type Output = VectorN;

            fn $method(self, rhs: VectorN) -> Self::Output {
                unwrap_dim(self.$checked(&rhs))
            }
        }

        impl ops::$trait<&VectorN> for VectorN {
            type Output = VectorN;

            fn $method(self, rhs: &VectorN) -> Self::Output {
                unwrap_dim(self.$checked(rhs))
            }
        }

        impl ops::$trait<VectorN> for &VectorN {
            type Output = VectorN;

            fn $method(self, rhs: VectorN) -> Self::Output {
                unwrap_dim(self.$checked(&rhs))
            }
        }
    };
}

vector_binop!(Add, add, checked_add);
vector_binop!(Sub, sub, checked_sub);

impl ops::Mul<&VectorN> for &VectorN {
    type Output = f64;

    fn mul(self, rhs: &VectorN) -> Self::Output {
        unwrap_dim(self.dot(rhs))
    }
}

impl ops::Mul<VectorN> for VectorN {
    type Output = f64;

    fn mul(self, rhs: VectorN) -> Self::Output {
        &self * &rhs
    }
}

impl ops::Mul<f64> for &VectorN {
    type Output = VectorN;

    fn mul(self, rhs: f64) -> Self::Output {
        self.map(|x| x * rhs)
    }
}

impl ops::Mul<f64> for VectorN {
    type Output = VectorN;

    fn mul(self, rhs: f64) -> Self::Output {
        &self * rhs
    }
}

impl ops::Mul<&VectorN> for f64 {
    type Output = VectorN;

    fn mul(self, rhs: &VectorN) -> Self::Output {
        rhs * self
    }
}

impl ops::Mul<VectorN> for f64 {
    type Output = VectorN;

    fn mul(self, rhs: VectorN) -> Self::Output {
        &rhs * self
    }
}

impl ops::Div<f64> for &VectorN {
    type Output = VectorN;

    fn div(self, rhs: f64) -> Self::Output {
        self.map(|x| x / rhs)
    }
}

impl ops::Div<f64> for VectorN {
    type Output = VectorN;

    fn div(self, rhs: f64) -> Self::Output {
        &self / rhs
    }
}

/// `s / v` divides `s` by every component of `v`.
impl ops::Div<&VectorN> for f64 {
    type Output = VectorN;

    fn div(self, rhs: &VectorN) -> Self::Output {
        rhs.map(|x| self / x)
    }
}

impl ops::Div<VectorN> for f64 {
    type Output = VectorN;

    fn div(self, rhs: VectorN) -> Self::Output {
        self / &rhs
    }
}

impl fmt::Display for VectorN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join(","))
    }
}
