//! Plain integrator
use crate::core::estimators::*;
use crate::core::*;
use crate::error::{Error, Result};

use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::warn;

/// Estimators for the plain integrator.
///
/// The mean and the sum of squared deviations are updated with Welford's algorithm, which stays
/// accurate when the mean of the integrand is large compared to its spread.
#[derive(Debug, Clone)]
pub struct PlainEstimators<T> {
    mean: T,
    m2: T,
    n: T,
    calls: usize,
}

impl<T: Float> Default for PlainEstimators<T> {
    fn default() -> Self {
        Self {
            mean: T::zero(),
            m2: T::zero(),
            n: T::zero(),
            calls: 0,
        }
    }
}

impl<T: Float> PlainEstimators<T> {
    /// Update the estimators with a finite integrand value.
    fn update(&mut self, value: T) {
        self.calls += 1;
        self.n = self.n + T::one();

        let delta = value - self.mean;
        self.mean = self.mean + delta / self.n;
        self.m2 = self.m2 + delta * (value - self.mean);
    }
}

impl<T> BasicEstimators<T> for PlainEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn mean(&self) -> T {
        if self.calls == 0 {
            T::nan()
        } else {
            self.mean
        }
    }

    /// Population variance, normalized by $N$.
    fn var(&self) -> T {
        if self.calls == 0 {
            T::nan()
        } else {
            self.m2 / self.n
        }
    }
}

impl<T> Estimators<T> for PlainEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn calls(&self) -> usize {
        self.calls
    }

    fn standard_error(&self) -> T {
        if self.calls == 0 {
            T::nan()
        } else {
            self.std() / self.n.sqrt()
        }
    }
}

/// The estimate of an integral obtained by [`estimate`].
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Estimate<T> {
    value: T,
    standard_error: T,
    calls: usize,
}

impl<T: Copy> Estimate<T> {
    /// Returns the estimated integral, $V \cdot \langle f \rangle$.
    pub fn value(&self) -> T {
        self.value
    }

    /// Returns the standard error, $\sigma_f / \sqrt{N}$, where $\sigma_f$ is the population
    /// standard deviation of the integrand values. It is not scaled by the volume.
    pub fn standard_error(&self) -> T {
        self.standard_error
    }

    /// Returns the number of integrand evaluations.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Returns `false` if the estimate is based on a single call, in which case the standard
    /// error is zero but the uncertainty is undefined.
    pub fn has_confidence(&self) -> bool {
        self.calls >= 2
    }
}

/// Integrate `integrand` over `bounds` using `calls` points drawn uniformly with `rng`.
///
/// The integrand dimension and the number of calls are checked before the first random number
/// is drawn. Any failure of the integrand, including a non-finite return value, aborts the whole
/// estimate.
pub fn estimate<T, R, I>(
    integrand: &I,
    bounds: &Bounds<T>,
    calls: usize,
    rng: &mut R,
) -> Result<Estimate<T>>
where
    I: Integrand<T> + ?Sized,
    T: Float + FromPrimitive + Debug,
    R: Rng,
    Standard: Distribution<T>,
{
    if calls == 0 {
        return Err(Error::configuration("the number of samples must be positive"));
    }

    if integrand.dim() != bounds.dim() {
        return Err(Error::configuration(format!(
            "the integrand has {} dimensions, but the bounds have {}",
            integrand.dim(),
            bounds.dim()
        )));
    }

    if calls == 1 {
        warn!("a single sample does not allow to estimate the uncertainty");
    }

    // create buffers for the sampled random variables such that
    // we do not need to allocate vectors in every call
    let mut unit = vec![T::zero(); bounds.dim()];
    let mut x = vec![T::zero(); bounds.dim()];

    let estimators = (0..calls).try_fold(PlainEstimators::<T>::default(), |mut acc, _| {
        // sample a new point
        unit.iter_mut().for_each(|u| *u = rng.gen());
        bounds.map_from_unit(&unit, &mut x);

        // evaluate the integrand
        let value = integrand.call(&x).map_err(|err| match err {
            Error::Evaluation { .. } => err,
            other => Error::evaluation(format!("at {:?}: {}", x, other)),
        })?;

        if !value.is_finite() {
            return Err(Error::evaluation(format!(
                "non-finite value {:?} at {:?}",
                value, x
            )));
        }

        acc.update(value);

        Ok(acc)
    })?;

    Ok(Estimate {
        value: bounds.volume() * estimators.mean(),
        standard_error: estimators.standard_error(),
        calls: estimators.calls(),
    })
}
