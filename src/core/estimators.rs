//! This module contains everything related to estimators.
use num_traits::{Float, FromPrimitive};
use serde::{Deserialize, Serialize};

/// Basic estimators, like the mean, variance, and the standard deviation.
pub trait BasicEstimators<T: Float> {
    /// Returns the mean value.
    fn mean(&self) -> T;

    /// Returns the (population) variance, $V$.
    fn var(&self) -> T;

    /// Returns the standard deviation, $\sigma = \sqrt{V}$.
    fn std(&self) -> T {
        self.var().sqrt()
    }
}

/// More estimators.
pub trait Estimators<T: Float>: BasicEstimators<T> {
    /// Returns the number of values, $N$, the estimators were computed from.
    fn calls(&self) -> usize;

    /// Returns the standard error of the mean, $\sigma / \sqrt{N}$.
    fn standard_error(&self) -> T;
}

/// A struct implementing the `BasicEstimator<T>` trait.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MeanVar<T> {
    mean: T,
    var: T,
    calls: usize,
}

impl<T> MeanVar<T> {
    /// Constructor.
    pub const fn new(mean: T, var: T, calls: usize) -> Self {
        Self { mean, var, calls }
    }
}

impl<T: Float + FromPrimitive> MeanVar<T> {
    /// Computes the mean and the population variance (normalized by $N$, not $N-1$) of `values`
    /// with two passes over the data. Returns `None` if `values` is empty.
    pub fn from_values(values: &[T]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let calls = T::from_usize(values.len())?;
        let mean = values.iter().fold(T::zero(), |sum, &v| sum + v) / calls;
        let var = values
            .iter()
            .fold(T::zero(), |sum, &v| sum + (v - mean) * (v - mean))
            / calls;

        Some(Self::new(mean, var, values.len()))
    }
}

impl<T: Float> BasicEstimators<T> for MeanVar<T> {
    fn mean(&self) -> T {
        self.mean
    }

    fn var(&self) -> T {
        self.var
    }
}

impl<T: Float + FromPrimitive> Estimators<T> for MeanVar<T> {
    fn calls(&self) -> usize {
        self.calls
    }

    fn standard_error(&self) -> T {
        T::from_usize(self.calls).map_or_else(T::nan, |calls| self.std() / calls.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_mean_var_from_values() {
        let mv = MeanVar::from_values(&[1.0, 1.1, 0.9]).unwrap();

        assert_eq!(mv.calls(), 3);
        assert_approx_eq!(mv.mean(), 1.0, 1e-15);
        assert_approx_eq!(mv.var(), 0.02 / 3.0, 1e-15);
        assert_approx_eq!(mv.standard_error(), (0.02f64 / 3.0).sqrt() / 3f64.sqrt(), 1e-15);
    }

    #[test]
    fn test_mean_var_of_nothing() {
        assert!(MeanVar::<f64>::from_values(&[]).is_none());
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let mv = MeanVar::from_values(&[2.5]).unwrap();

        assert_eq!(mv.mean(), 2.5);
        assert_eq!(mv.var(), 0.0);
        assert_eq!(mv.std(), 0.0);
    }
}
