use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Loyalty points as a fixed-point amount in hundredths of a point.
///
/// Storage and arithmetic use the integer minor-unit representation so that
/// repeated accruals and withdrawals stay exact. On the wire, amounts appear
/// as plain JSON numbers: `500` for five hundred points, `600.5` for a
/// fractional award.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Mul<i64> for Points {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl PartialEq for Points {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Points {}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in points: {0}")]
pub struct PointsConversionError(String);

impl Points {
    pub const MINOR_UNITS_PER_POINT: i64 = 100;

    /// Amount in hundredths of a point.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    pub fn from_points(points: i64) -> Self {
        Self(points * Self::MINOR_UNITS_PER_POINT)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn try_from_f64(value: f64) -> Result<Self, PointsConversionError> {
        if !value.is_finite() {
            return Err(PointsConversionError(value.to_string()));
        }
        let units = value * Self::MINOR_UNITS_PER_POINT as f64;
        if units <= i64::MIN as f64 || units >= i64::MAX as f64 {
            return Err(PointsConversionError(value.to_string()));
        }
        Ok(Self(units.round() as i64))
    }
}

impl From<i64> for Points {
    fn from(units: i64) -> Self {
        Self(units)
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 % Self::MINOR_UNITS_PER_POINT == 0 {
            write!(f, "{}", self.0 / Self::MINOR_UNITS_PER_POINT)
        } else {
            write!(f, "{:.2}", self.0 as f64 / Self::MINOR_UNITS_PER_POINT as f64)
        }
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % Self::MINOR_UNITS_PER_POINT == 0 {
            serializer.serialize_i64(self.0 / Self::MINOR_UNITS_PER_POINT)
        } else {
            serializer.serialize_f64(self.0 as f64 / Self::MINOR_UNITS_PER_POINT as f64)
        }
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from_f64(value).map_err(de::Error::custom)
    }
}
