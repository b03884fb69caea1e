//! Pluggable numeric value with a NaN sentinel.
//!
//! A [`Num`] is tagged with the [`NumBackend`] that produced it. Arithmetic and
//! comparisons are total: division by zero, decimal overflow and anything
//! touching [`Num::NaN`] yield NaN, and comparisons involving NaN are `false`.
//! Mixing two backends is a contract violation: the plain operator surface
//! panics with the [`EngineError::TypeMismatch`] message, the `checked_*`
//! surface returns it.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};

use crate::domain::error::EngineError;

/// Numeric representation chosen once per series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumBackend {
    /// IEEE-754 `f64`.
    Double,
    /// `rust_decimal::Decimal`, 96-bit mantissa.
    #[default]
    Decimal,
}

impl NumBackend {
    /// Converts a native literal into this backend.
    ///
    /// Non-finite input (and `f64` values a decimal cannot hold) becomes NaN.
    pub fn num_of(self, value: f64) -> Num {
        match self {
            NumBackend::Double => Num::double(value),
            NumBackend::Decimal => Decimal::from_f64(value)
                .map(Num::Decimal)
                .unwrap_or(Num::NaN),
        }
    }

    pub fn num_of_i64(self, value: i64) -> Num {
        match self {
            NumBackend::Double => Num::Double(value as f64),
            NumBackend::Decimal => Num::Decimal(Decimal::from(value)),
        }
    }

    /// Parses a decimal literal without going through `f64`, so decimal
    /// values keep their exact digits.
    pub fn parse(self, text: &str) -> Result<Num, EngineError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("nan") {
            return Ok(Num::NaN);
        }
        let invalid = |reason: String| EngineError::DataSource {
            reason: format!("invalid number {text:?}: {reason}"),
        };
        match self {
            NumBackend::Double => text
                .parse::<f64>()
                .map(Num::double)
                .map_err(|e| invalid(e.to_string())),
            NumBackend::Decimal => Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .map(Num::Decimal)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for NumBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumBackend::Double => write!(f, "double"),
            NumBackend::Decimal => write!(f, "decimal"),
        }
    }
}

impl FromStr for NumBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "double" | "f64" => Ok(NumBackend::Double),
            "decimal" => Ok(NumBackend::Decimal),
            other => Err(format!("unknown numeric backend '{other}'")),
        }
    }
}

/// Immutable numeric value. `Double` never holds an `f64` NaN; that case is
/// always normalized to [`Num::NaN`].
#[derive(Debug, Clone, Copy)]
pub enum Num {
    Double(f64),
    Decimal(Decimal),
    NaN,
}

type DecimalOp = fn(Decimal, Decimal) -> Option<Decimal>;

impl Num {
    pub fn double(value: f64) -> Num {
        if value.is_nan() {
            Num::NaN
        } else {
            Num::Double(value)
        }
    }

    /// The producing backend; `None` for NaN, which belongs to every backend.
    pub fn backend(&self) -> Option<NumBackend> {
        match self {
            Num::Double(_) => Some(NumBackend::Double),
            Num::Decimal(_) => Some(NumBackend::Decimal),
            Num::NaN => None,
        }
    }

    /// Converts a literal into this value's backend. NaN stays NaN.
    pub fn num_of(&self, value: f64) -> Num {
        self.backend().map_or(Num::NaN, |b| b.num_of(value))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Num::NaN)
    }

    fn combine(
        self,
        other: Num,
        op: &'static str,
        double: fn(f64, f64) -> f64,
        decimal: DecimalOp,
    ) -> Result<Num, EngineError> {
        match (self, other) {
            (Num::NaN, _) | (_, Num::NaN) => Ok(Num::NaN),
            (Num::Double(a), Num::Double(b)) => Ok(Num::double(double(a, b))),
            (Num::Decimal(a), Num::Decimal(b)) => Ok(decimal(a, b).map_or(Num::NaN, Num::Decimal)),
            (left, right) => Err(mismatch(op, left, right)),
        }
    }

    pub fn checked_plus(self, other: Num) -> Result<Num, EngineError> {
        self.combine(other, "plus", |a, b| a + b, |a, b| a.checked_add(b))
    }

    pub fn checked_minus(self, other: Num) -> Result<Num, EngineError> {
        self.combine(other, "minus", |a, b| a - b, |a, b| a.checked_sub(b))
    }

    pub fn checked_multiplied_by(self, other: Num) -> Result<Num, EngineError> {
        self.combine(other, "multiplied_by", |a, b| a * b, |a, b| a.checked_mul(b))
    }

    pub fn checked_divided_by(self, other: Num) -> Result<Num, EngineError> {
        self.combine(
            other,
            "divided_by",
            |a, b| if b == 0.0 { f64::NAN } else { a / b },
            |a, b| a.checked_div(b),
        )
    }

    /// Orders two values of the same backend; `Ok(None)` when either is NaN.
    pub fn try_compare(&self, other: &Num) -> Result<Option<Ordering>, EngineError> {
        match (self, other) {
            (Num::NaN, _) | (_, Num::NaN) => Ok(None),
            (Num::Double(a), Num::Double(b)) => Ok(a.partial_cmp(b)),
            (Num::Decimal(a), Num::Decimal(b)) => Ok(Some(a.cmp(b))),
            (left, right) => Err(mismatch("compare", *left, *right)),
        }
    }

    /// # Panics
    ///
    /// Panics when the operands come from different backends.
    pub fn plus(self, other: Num) -> Num {
        fatal(self.checked_plus(other))
    }

    /// # Panics
    ///
    /// Panics when the operands come from different backends.
    pub fn minus(self, other: Num) -> Num {
        fatal(self.checked_minus(other))
    }

    /// # Panics
    ///
    /// Panics when the operands come from different backends.
    pub fn multiplied_by(self, other: Num) -> Num {
        fatal(self.checked_multiplied_by(other))
    }

    /// Division by zero yields NaN.
    ///
    /// # Panics
    ///
    /// Panics when the operands come from different backends.
    pub fn divided_by(self, other: Num) -> Num {
        fatal(self.checked_divided_by(other))
    }

    fn compare(&self, other: &Num) -> Option<Ordering> {
        fatal(self.try_compare(other))
    }

    pub fn is_greater_than(&self, other: Num) -> bool {
        self.compare(&other) == Some(Ordering::Greater)
    }

    pub fn is_greater_than_or_equal(&self, other: Num) -> bool {
        matches!(self.compare(&other), Some(Ordering::Greater | Ordering::Equal))
    }

    pub fn is_less_than(&self, other: Num) -> bool {
        self.compare(&other) == Some(Ordering::Less)
    }

    pub fn is_less_than_or_equal(&self, other: Num) -> bool {
        matches!(self.compare(&other), Some(Ordering::Less | Ordering::Equal))
    }

    /// Numeric equality; `false` whenever NaN is involved.
    pub fn is_equal(&self, other: Num) -> bool {
        self.compare(&other) == Some(Ordering::Equal)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Num::Double(v) => *v == 0.0,
            Num::Decimal(d) => d.is_zero(),
            Num::NaN => false,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Num::Double(v) => *v > 0.0,
            Num::Decimal(d) => d.is_sign_positive() && !d.is_zero(),
            Num::NaN => false,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Num::Double(v) => *v < 0.0,
            Num::Decimal(d) => d.is_sign_negative() && !d.is_zero(),
            Num::NaN => false,
        }
    }

    pub fn abs(self) -> Num {
        match self {
            Num::Double(v) => Num::Double(v.abs()),
            Num::Decimal(d) => Num::Decimal(d.abs()),
            Num::NaN => Num::NaN,
        }
    }

    /// Square root; negative input yields NaN.
    pub fn sqrt(self) -> Num {
        match self {
            Num::Double(v) => Num::double(v.sqrt()),
            Num::Decimal(d) => d.sqrt().map_or(Num::NaN, Num::Decimal),
            Num::NaN => Num::NaN,
        }
    }

    pub fn pow(self, exponent: i64) -> Num {
        match self {
            Num::Double(v) => {
                let clamped = exponent.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
                let exp = i32::try_from(clamped).unwrap_or_default();
                Num::double(v.powi(exp))
            }
            Num::Decimal(d) => d.checked_powi(exponent).map_or(Num::NaN, Num::Decimal),
            Num::NaN => Num::NaN,
        }
    }

    /// Smaller of the two values; NaN if either is NaN.
    pub fn min(self, other: Num) -> Num {
        match self.compare(&other) {
            None => Num::NaN,
            Some(Ordering::Greater) => other,
            Some(_) => self,
        }
    }

    /// Larger of the two values; NaN if either is NaN.
    pub fn max(self, other: Num) -> Num {
        match self.compare(&other) {
            None => Num::NaN,
            Some(Ordering::Less) => other,
            Some(_) => self,
        }
    }

    /// Lossy conversion for reporting and float assertions.
    pub fn to_f64(&self) -> f64 {
        match self {
            Num::Double(v) => *v,
            Num::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Num::NaN => f64::NAN,
        }
    }
}

fn mismatch(op: &'static str, left: Num, right: Num) -> EngineError {
    EngineError::TypeMismatch {
        op,
        left: left.backend().unwrap_or_default(),
        right: right.backend().unwrap_or_default(),
    }
}

fn fatal<T>(result: Result<T, EngineError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

/// Structural equality: `NaN == NaN`, and values of different backends are
/// never equal. Use [`Num::is_equal`] for numeric equality.
impl PartialEq for Num {
    fn eq(&self, other: &Num) -> bool {
        match (self, other) {
            (Num::NaN, Num::NaN) => true,
            (Num::Double(a), Num::Double(b)) => a == b,
            (Num::Decimal(a), Num::Decimal(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Double(v) => write!(f, "{v}"),
            Num::Decimal(d) => write!(f, "{}", d.normalize()),
            Num::NaN => write!(f, "NaN"),
        }
    }
}

impl Add for Num {
    type Output = Num;
    fn add(self, rhs: Num) -> Num {
        self.plus(rhs)
    }
}

impl Sub for Num {
    type Output = Num;
    fn sub(self, rhs: Num) -> Num {
        self.minus(rhs)
    }
}

impl Mul for Num {
    type Output = Num;
    fn mul(self, rhs: Num) -> Num {
        self.multiplied_by(rhs)
    }
}

impl Div for Num {
    type Output = Num;
    fn div(self, rhs: Num) -> Num {
        self.divided_by(rhs)
    }
}

impl Neg for Num {
    type Output = Num;
    fn neg(self) -> Num {
        match self {
            Num::Double(v) => Num::Double(-v),
            Num::Decimal(d) => Num::Decimal(-d),
            Num::NaN => Num::NaN,
        }
    }
}
