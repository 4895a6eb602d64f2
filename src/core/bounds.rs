//! The hyper-rectangular integration domain.
use crate::error::{Error, Result};
use num_traits::Float;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Axis-aligned integration domain: one `(low, high)` pair per dimension.
///
/// Bounds are validated once, when they are constructed, and are immutable afterwards. In
/// artifacts they are stored in their textual form `[(low, high), ...]`, see [`Display`] and
/// [`FromStr`].
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds<T> {
    limits: Vec<(T, T)>,
}

impl<T: Float> Bounds<T> {
    /// Constructs the domain spanned by `limits`. Fails if `limits` is empty or if any pair does
    /// not satisfy `low < high` with both ends finite.
    pub fn new(limits: Vec<(T, T)>) -> Result<Self> {
        if limits.is_empty() {
            return Err(Error::configuration(
                "bounds must contain at least one dimension",
            ));
        }

        for (dim, &(low, high)) in limits.iter().enumerate() {
            if !low.is_finite() || !high.is_finite() {
                return Err(Error::configuration(format!(
                    "bounds of dimension {} are not finite",
                    dim
                )));
            }

            // also catches NaN
            if !(low < high) {
                return Err(Error::configuration(format!(
                    "lower bound of dimension {} is not smaller than its upper bound",
                    dim
                )));
            }
        }

        Ok(Self { limits })
    }

    /// Returns the number of dimensions.
    pub fn dim(&self) -> usize {
        self.limits.len()
    }

    /// Returns the `(low, high)` pairs.
    pub fn limits(&self) -> &[(T, T)] {
        &self.limits
    }

    /// Returns the volume, $V = \prod_i (b_i - a_i)$.
    pub fn volume(&self) -> T {
        self.limits
            .iter()
            .fold(T::one(), |volume, &(low, high)| volume * (high - low))
    }

    /// Maps the point `unit` of the unit hypercube into the domain, writing the result to `x`.
    pub(crate) fn map_from_unit(&self, unit: &[T], x: &mut [T]) {
        debug_assert_eq!(unit.len(), self.dim());
        debug_assert_eq!(x.len(), self.dim());

        for ((x, &u), &(low, high)) in x.iter_mut().zip(unit).zip(&self.limits) {
            *x = low + (high - low) * u;
        }
    }
}

impl<T: Display> Display for Bounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (index, (low, high)) in self.limits.iter().enumerate() {
            if index != 0 {
                write!(f, ", ")?;
            }
            write!(f, "({}, {})", low, high)?;
        }

        write!(f, "]")
    }
}

impl<T: Float + FromStr> FromStr for Bounds<T> {
    type Err = Error;

    /// Parses bounds written as a list of pairs, for example `[(-1, 1), (0, 2.5)]`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            Error::configuration(format!(
                "bounds must be a list of pairs, e.g. \"[(-1,1),(-1,1)]\", got `{}`",
                s
            ))
        };
        let parse = |text: Option<&str>| -> Result<T> {
            text.map(str::trim)
                .and_then(|text| text.parse().ok())
                .ok_or_else(malformed)
        };

        let mut rest = s
            .trim()
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .ok_or_else(malformed)?
            .trim();
        let mut limits = Vec::new();

        while !rest.is_empty() {
            let open = rest.strip_prefix('(').ok_or_else(malformed)?;
            let close = open.find(')').ok_or_else(malformed)?;
            let mut pair = open[..close].split(',');

            let low = parse(pair.next())?;
            let high = parse(pair.next())?;

            if pair.next().is_some() {
                return Err(malformed());
            }

            limits.push((low, high));

            rest = open[close + 1..].trim_start();
            rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
        }

        Self::new(limits)
    }
}

impl<T: Display> Serialize for Bounds<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: Float + FromStr> Deserialize<'de> for Bounds<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
