//! Forward-mode automatic differentiation via dual numbers.

use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A dual number for forward-mode AD.
///
/// `val` holds the primal value, `dot` holds the derivative with respect
/// to the currently seeded parameter direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    /// Primal (function) value.
    pub val: f64,
    /// Tangent (derivative) value.
    pub dot: f64,
}

impl Dual {
    /// Create a constant (derivative = 0).
    #[inline]
    pub fn constant(val: f64) -> Self {
        Self { val, dot: 0.0 }
    }

    /// Create an independent variable (derivative = 1).
    #[inline]
    pub fn var(val: f64) -> Self {
        Self { val, dot: 1.0 }
    }

    /// Create a dual with explicit tangent.
    #[inline]
    pub fn new(val: f64, dot: f64) -> Self {
        Self { val, dot }
    }

    /// Natural logarithm: d/dx ln(x) = 1/x.
    #[inline]
    pub fn ln(self) -> Self {
        Self { val: self.val.ln(), dot: self.dot / self.val }
    }

    /// Exponential: d/dx exp(x) = exp(x).
    #[inline]
    pub fn exp(self) -> Self {
        let e = self.val.exp();
        Self { val: e, dot: self.dot * e }
    }

    /// Sine: d/dx sin(x) = cos(x).
    #[inline]
    pub fn sin(self) -> Self {
        Self { val: self.val.sin(), dot: self.dot * self.val.cos() }
    }

    /// Cosine: d/dx cos(x) = -sin(x).
    #[inline]
    pub fn cos(self) -> Self {
        Self { val: self.val.cos(), dot: -self.dot * self.val.sin() }
    }

    /// Tangent: d/dx tan(x) = 1/cos²(x).
    #[inline]
    pub fn tan(self) -> Self {
        let c = self.val.cos();
        Self { val: self.val.tan(), dot: self.dot / (c * c) }
    }

    /// Square root: d/dx sqrt(x) = 1/(2*sqrt(x)).
    #[inline]
    pub fn sqrt(self) -> Self {
        let s = self.val.sqrt();
        Self { val: s, dot: self.dot / (2.0 * s) }
    }

    /// Signed cube root: real-valued on negative inputs,
    /// d/dx cbrt(x) = 1/(3*cbrt(x)²).
    #[inline]
    pub fn cbrt(self) -> Self {
        let c = self.val.cbrt();
        Self { val: c, dot: self.dot / (3.0 * c * c) }
    }

    /// Square: d/dx x² = 2x.
    #[inline]
    pub fn square(self) -> Self {
        Self { val: self.val * self.val, dot: 2.0 * self.val * self.dot }
    }

    /// Power with f64 exponent: d/dx x^n = n * x^(n-1).
    #[inline]
    pub fn powf(self, n: f64) -> Self {
        Self { val: self.val.powf(n), dot: self.dot * n * self.val.powf(n - 1.0) }
    }

    /// Integer power: d/dx x^n = n * x^(n-1).
    #[inline]
    pub fn powi(self, n: i32) -> Self {
        Self { val: self.val.powi(n), dot: self.dot * (n as f64) * self.val.powi(n - 1) }
    }

    /// Absolute value: d/dx |x| = sign(x).
    #[inline]
    pub fn abs(self) -> Self {
        Self { val: self.val.abs(), dot: self.dot * self.val.signum() }
    }

    /// Maximum of two duals. Derivative follows the larger operand.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        if self.val >= other.val { self } else { other }
    }

    /// Minimum of two duals. Derivative follows the smaller operand.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        if self.val <= other.val { self } else { other }
    }

    /// Clamp the primal to `[min, max]`. The tangent is pinned to the
    /// bound's tangent where the value saturates.
    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        if self.val < min.val {
            min
        } else if self.val > max.val {
            max
        } else {
            self
        }
    }

    /// True when the primal value is neither NaN nor infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.val.is_finite()
    }
}

// --- Arithmetic: Dual op Dual ---

impl Add for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self { val: self.val + rhs.val, dot: self.dot + rhs.dot }
    }
}

impl Sub for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self { val: self.val - rhs.val, dot: self.dot - rhs.dot }
    }
}

impl Mul for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self { val: self.val * rhs.val, dot: self.dot * rhs.val + self.val * rhs.dot }
    }
}

impl Div for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self {
            val: self.val / rhs.val,
            dot: (self.dot * rhs.val - self.val * rhs.dot) / (rhs.val * rhs.val),
        }
    }
}

impl Neg for Dual {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self { val: -self.val, dot: -self.dot }
    }
}

// --- Sum ---

impl Sum for Dual {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Dual::constant(0.0), |acc, x| acc + x)
    }
}

// --- From ---

impl From<f64> for Dual {
    fn from(val: f64) -> Self {
        Self::constant(val)
    }
}

// --- PartialOrd ---

impl PartialOrd for Dual {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.val.partial_cmp(&other.val)
    }
}
