use std::fmt;

use serde_json::Number as JsonNumber;

use crate::CanonicalizeError;

/// Lower bound (inclusive) of the `f64` range that maps exactly onto `i64`.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
/// Upper bound (exclusive) of the `f64` range that maps exactly onto `i64`.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Numeric scalar of a [`Value`](crate::Value).
///
/// Integers that fit into `i64` are kept exact; every other number is stored
/// as a finite IEEE-754 double. Equality is numeric, so `Integer(1)` equals
/// `Float(1.0)`.
///
/// ```
/// # use snapdiff_core::Number;
/// assert_eq!(Number::from(1), Number::from_f64(1.0)?);
/// assert_ne!(Number::from(1), Number::from_f64(1.5)?);
/// # Ok::<(), snapdiff_core::CanonicalizeError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Number {
    /// Exact 64-bit integer.
    Integer(i64),
    /// Finite double precision float.
    Float(f64),
}

impl Number {
    /// Creates a floating-point number after validating finiteness.
    ///
    /// ```
    /// # use snapdiff_core::Number;
    /// assert!(Number::from_f64(f64::NAN).is_err());
    /// let num = Number::from_f64(2.5)?;
    /// assert_eq!(num.as_f64(), 2.5);
    /// # Ok::<(), snapdiff_core::CanonicalizeError>(())
    /// ```
    pub fn from_f64(value: f64) -> Result<Self, CanonicalizeError> {
        if value.is_finite() {
            Ok(Self::Float(value))
        } else {
            Err(CanonicalizeError::NotFinite { value })
        }
    }

    /// Returns the value as a double, possibly losing integer precision.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Returns the value as an exact integer when it has no fractional part.
    ///
    /// ```
    /// # use snapdiff_core::Number;
    /// assert_eq!(Number::from_f64(3.0)?.as_exact_i64(), Some(3));
    /// assert_eq!(Number::from_f64(3.5)?.as_exact_i64(), None);
    /// # Ok::<(), snapdiff_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn as_exact_i64(self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(i),
            Self::Float(f) if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&f) => {
                Some(f as i64)
            }
            Self::Float(_) => None,
        }
    }

    /// Converts the number into a `serde_json::Number`.
    #[must_use]
    pub fn to_json_number(self) -> Option<JsonNumber> {
        match self {
            Self::Integer(i) => Some(JsonNumber::from(i)),
            Self::Float(f) => JsonNumber::from_f64(f),
        }
    }

    /// Text used when the number identifies a keyed list element.
    ///
    /// Integral floats collapse onto their integer form so that `1` and `1.0`
    /// address the same element.
    pub(crate) fn identity_text(self) -> String {
        match self.as_exact_i64() {
            Some(i) => i.to_string(),
            None => self.to_string(),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(i), float @ Self::Float(_))
            | (float @ Self::Float(_), Self::Integer(i)) => float.as_exact_i64() == Some(i),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => match JsonNumber::from_f64(*v) {
                Some(number) => write!(f, "{number}"),
                None => write!(f, "{v}"),
            },
        }
    }
}
