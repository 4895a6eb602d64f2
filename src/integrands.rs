//! A few integrands with known properties, used by the command-line tool and in tests.
use crate::core::Integrand;
use crate::error::Result;
use num_traits::{Float, FloatConst};

/// The two-dimensional function $f(x, y) = \sin(\pi x) \cos(\pi y) \exp(-(x^2 + y^2))$.
///
/// It is odd in $x$, so its integral over any domain symmetric in $x$ vanishes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SinCosGauss;

impl<T: Float + FloatConst + Send + Sync> Integrand<T> for SinCosGauss {
    fn call(&self, x: &[T]) -> Result<T> {
        let (u, v) = (x[0], x[1]);

        Ok((T::PI() * u).sin() * (T::PI() * v).cos() * (-(u * u + v * v)).exp())
    }

    fn dim(&self) -> usize {
        2
    }
}

/// A constant function in any number of dimensions; its integral is the volume times the
/// constant.
#[derive(Clone, Copy, Debug)]
pub struct Constant<T> {
    dim: usize,
    value: T,
}

impl<T> Constant<T> {
    /// Constructs the constant function with `value` in `dim` dimensions.
    pub const fn new(dim: usize, value: T) -> Self {
        Self { dim, value }
    }
}

impl<T: Float + Send + Sync> Integrand<T> for Constant<T> {
    fn call(&self, _: &[T]) -> Result<T> {
        Ok(self.value)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// The sum of all coordinates, $f(x) = \sum_i x_i$.
#[derive(Clone, Copy, Debug)]
pub struct Linear {
    dim: usize,
}

impl Linear {
    /// Constructs the function in `dim` dimensions.
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl<T: Float + Send + Sync> Integrand<T> for Linear {
    fn call(&self, x: &[T]) -> Result<T> {
        Ok(x.iter().fold(T::zero(), |sum, &x| sum + x))
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_sin_cos_gauss() {
        let f = SinCosGauss;

        assert_eq!(Integrand::<f64>::dim(&f), 2);
        assert_approx_eq!(
            Integrand::<f64>::call(&f, &[0.5, 0.0]).unwrap(),
            (-0.25f64).exp(),
            1e-15
        );
        assert_approx_eq!(Integrand::<f64>::call(&f, &[0.0, 0.3]).unwrap(), 0.0, 1e-15);
    }

    #[test]
    fn test_linear() {
        let f = Linear::new(3);

        assert_eq!(Integrand::<f64>::call(&f, &[1.0, 2.0, 0.5]).unwrap(), 3.5);
    }
}
