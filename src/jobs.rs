//! Running a single worker.
//!
//! A job derives its seed from the base seed and its identifier, samples the integrand with a
//! freshly seeded generator, and wraps the outcome into a record that can be stored and
//! aggregated later. Failures never escape a job: they are turned into a [`FailureRecord`].
use crate::callbacks::Callback;
use crate::core::*;
use crate::error::{Error, Result};
use crate::integrators::plain::{self, Estimate};

use chrono::{DateTime, Utc};
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::{Debug, Display};
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};

/// The result of a successful job.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(bound(
    serialize = "T: Serialize + Display",
    deserialize = "T: Deserialize<'de> + Float + FromStr"
))]
pub struct PartialResult<T> {
    job_id: u64,
    samples: usize,
    bounds: Bounds<T>,
    result: T,
    error: T,
    computation_time: f64,
    timestamp: DateTime<Utc>,
}

impl<T: Copy> PartialResult<T> {
    /// Constructor.
    pub fn new(
        job_id: u64,
        samples: usize,
        bounds: Bounds<T>,
        value: T,
        standard_error: T,
        computation_time: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            samples,
            bounds,
            result: value,
            error: standard_error,
            computation_time,
            timestamp,
        }
    }

    /// Returns the identifier of the job.
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// Returns the number of samples the job has drawn.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the integration domain.
    pub fn bounds(&self) -> &Bounds<T> {
        &self.bounds
    }

    /// Returns the estimated integral.
    pub fn value(&self) -> T {
        self.result
    }

    /// Returns the job's own standard error.
    pub fn standard_error(&self) -> T {
        self.error
    }

    /// Returns the time in seconds spent sampling.
    pub fn computation_time(&self) -> f64 {
        self.computation_time
    }

    /// Returns when the job finished.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// The record of a failed job.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FailureRecord {
    job_id: u64,
    error: String,
    timestamp: DateTime<Utc>,
}

impl FailureRecord {
    /// Constructor.
    pub fn new(job_id: u64, error: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            job_id,
            error: error.into(),
            timestamp,
        }
    }

    /// Returns the identifier of the job.
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// Returns the description of what went wrong.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Returns when the job failed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// What a job produced: exactly one of a result or a failure.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum JobOutcome<T> {
    /// The job finished and produced an estimate.
    Completed(PartialResult<T>),
    /// The job failed.
    Failed(FailureRecord),
}

impl<T: Copy> JobOutcome<T> {
    /// Returns the identifier of the job.
    pub fn job_id(&self) -> u64 {
        match self {
            Self::Completed(result) => result.job_id(),
            Self::Failed(failure) => failure.job_id(),
        }
    }

    /// Returns `true` if the job produced an estimate.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Sample with the generator of worker `worker_id` and measure the time spent in the sampler
/// only. A panicking integrand is reported as an evaluation error.
pub(crate) fn timed_estimate<T, I>(
    integrand: &I,
    bounds: &Bounds<T>,
    calls: usize,
    base_seed: u64,
    worker_id: u64,
) -> (Result<Estimate<T>>, f64)
where
    I: Integrand<T> + ?Sized,
    T: Float + FromPrimitive + Debug,
    Standard: Distribution<T>,
{
    let mut rng = Pcg64::seed_from_u64(seed_for(base_seed, worker_id));

    let start = Instant::now();
    let estimate = panic::catch_unwind(AssertUnwindSafe(|| {
        plain::estimate(integrand, bounds, calls, &mut rng)
    }))
    .unwrap_or_else(|payload| {
        Err(Error::evaluation(format!(
            "the integrand panicked: {}",
            panic_message(payload.as_ref())
        )))
    });
    let elapsed = start.elapsed().as_secs_f64();

    (estimate, elapsed)
}

/// Run job `job_id`: integrate `integrand` over `bounds` with `calls` samples, using the
/// generator seeded with [`seed_for`]`(base_seed, job_id)`.
///
/// The `callback` is called with the outcome before it is returned. Identical arguments produce
/// bit-identical estimates.
pub fn run_job<T, I>(
    integrand: &I,
    bounds: &Bounds<T>,
    calls: usize,
    base_seed: u64,
    job_id: u64,
    callback: &impl Callback<T>,
) -> JobOutcome<T>
where
    I: Integrand<T> + ?Sized,
    T: Float + FromPrimitive + Debug,
    Standard: Distribution<T>,
{
    debug!(job_id, calls, base_seed, "starting job");

    let (estimate, elapsed) = timed_estimate(integrand, bounds, calls, base_seed, job_id);

    let outcome = match estimate {
        Ok(estimate) => JobOutcome::Completed(PartialResult::new(
            job_id,
            estimate.calls(),
            bounds.clone(),
            estimate.value(),
            estimate.standard_error(),
            elapsed,
            Utc::now(),
        )),
        Err(err) => {
            warn!(job_id, error = %err, "job failed");
            JobOutcome::Failed(FailureRecord::new(job_id, err.to_string(), Utc::now()))
        }
    };

    callback.print(&outcome);

    outcome
}
