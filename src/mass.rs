//! Unbounded mass arithmetic
//!
//! Mass is health, ammunition and reward value at once. Multiplicative
//! rewards (x2/x4/x8) compound quickly past 64 bits, so it is backed by a
//! `BigInt` and never wraps. Negative values are meaningful: several combat
//! rules read a negative mass before the entity is destroyed.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// Arbitrary-precision signed mass
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mass(BigInt);

impl Mass {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn new(value: i64) -> Self {
        Self(BigInt::from(value))
    }

    /// Zero or below: the owner is destroyed
    #[inline]
    pub fn is_depleted(&self) -> bool {
        !self.0.is_positive()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Half of this mass, truncated toward zero
    pub fn half(&self) -> Mass {
        Mass(&self.0 / 2u32)
    }

    /// Halve in place, truncating toward zero
    pub fn halve(&mut self) {
        self.0 /= 2u32;
    }

    /// Territory cost of one pixel
    #[inline]
    pub fn decrement(&mut self) {
        self.0 -= 1u32;
    }

    pub fn set_zero(&mut self) {
        self.0.set_zero();
    }

    /// Multiply by a small reward factor
    pub fn scaled(&self, factor: u32) -> Mass {
        Mass(&self.0 * factor)
    }

    /// Integer division, truncating toward zero
    pub fn divided(&self, divisor: u32) -> Mass {
        Mass(&self.0 / divisor)
    }

    /// Clamp to `ceiling`; only used when a reward value is created
    pub fn capped(self, ceiling: &Mass) -> Mass {
        if self > *ceiling { ceiling.clone() } else { self }
    }

    /// Lossy conversion for derived visuals; saturates to +-infinity
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(if self.0.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        })
    }

    /// Exact conversion when the value fits
    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }
}

impl From<i64> for Mass {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<u64> for Mass {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<BigInt> for Mass {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

impl fmt::Display for Mass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Add<&Mass> for &Mass {
    type Output = Mass;

    fn add(self, rhs: &Mass) -> Mass {
        Mass(&self.0 + &rhs.0)
    }
}

impl Sub<&Mass> for &Mass {
    type Output = Mass;

    fn sub(self, rhs: &Mass) -> Mass {
        Mass(&self.0 - &rhs.0)
    }
}

impl AddAssign<&Mass> for Mass {
    fn add_assign(&mut self, rhs: &Mass) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Mass> for Mass {
    fn sub_assign(&mut self, rhs: &Mass) {
        self.0 -= &rhs.0;
    }
}

impl Mul<u32> for &Mass {
    type Output = Mass;

    fn mul(self, rhs: u32) -> Mass {
        self.scaled(rhs)
    }
}

impl Neg for &Mass {
    type Output = Mass;

    fn neg(self) -> Mass {
        Mass(-&self.0)
    }
}
