//! Synchronous gather-to-root reduction.
//!
//! All ranks share one global sample budget in equal parts, sample concurrently without any
//! communication, meet at a barrier and then send their partial estimates to the coordinator,
//! rank 0. Since every rank estimates the same integral with an equal share of the samples, the
//! combined value is the mean of the rank values and the combined error is the root of the sum
//! of the squared rank errors, divided by the number of ranks.
//!
//! There is no timeout: a rank that never reaches the barrier stalls the whole reduction.
use crate::core::*;
use crate::error::{Error, Result};
use crate::jobs::timed_estimate;

use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver};
use crossbeam::sync::WaitGroup;
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;
use tracing::{debug, info};

/// The contribution of a single rank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankPartial<T> {
    rank: usize,
    value: T,
    standard_error: T,
    elapsed: f64,
}

impl<T: Copy> RankPartial<T> {
    /// Constructor.
    pub fn new(rank: usize, value: T, standard_error: T, elapsed: f64) -> Self {
        Self {
            rank,
            value,
            standard_error,
            elapsed,
        }
    }

    /// Returns the rank that produced this partial result.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the rank's estimate of the integral.
    pub fn value(&self) -> T {
        self.value
    }

    /// Returns the rank's standard error.
    pub fn standard_error(&self) -> T {
        self.standard_error
    }

    /// Returns the time in seconds the rank spent sampling.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// The result of [`combine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Combined<T> {
    value: T,
    error: T,
    elapsed: f64,
}

impl<T: Copy> Combined<T> {
    /// Returns the mean of the rank values.
    pub fn value(&self) -> T {
        self.value
    }

    /// Returns $\sqrt{\sum_i \sigma_i^2} / N$.
    pub fn error(&self) -> T {
        self.error
    }

    /// Returns the elapsed time of the slowest rank.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// Combine the partial results of `rank_count` ranks that each drew an equal share of one global
/// sample budget.
///
/// Fails if `partials` is empty or does not contain exactly `rank_count` entries.
pub fn combine<T>(partials: &[RankPartial<T>], rank_count: usize) -> Result<Combined<T>>
where
    T: Float + FromPrimitive,
{
    if partials.is_empty() {
        return Err(Error::aggregation_input("no partial results to combine"));
    }

    if partials.len() != rank_count {
        return Err(Error::aggregation_input(format!(
            "expected {} partial results, got {}",
            rank_count,
            partials.len()
        )));
    }

    let ranks = T::from_usize(rank_count)
        .ok_or_else(|| Error::aggregation_input("too many ranks to combine"))?;

    let sum = partials.iter().fold(T::zero(), |sum, p| sum + p.value);
    let sumsq = partials
        .iter()
        .fold(T::zero(), |sum, p| sum + p.standard_error * p.standard_error);
    // the wall-clock time of a synchronous reduction is set by the slowest rank
    let elapsed = partials.iter().fold(0.0, |max: f64, p| max.max(p.elapsed));

    Ok(Combined {
        value: sum / ranks,
        error: sumsq.sqrt() / ranks,
        elapsed,
    })
}

/// The artifact written by the coordinator of a reduction.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(bound(
    serialize = "T: Serialize + Display",
    deserialize = "T: Deserialize<'de> + Float + FromStr"
))]
pub struct ReductionRecord<T> {
    samples_total: usize,
    bounds: Bounds<T>,
    result: T,
    error: T,
    computation_time: f64,
    timestamp: DateTime<Utc>,
    participant_count: usize,
}

impl<T: Copy> ReductionRecord<T> {
    /// Returns the number of samples drawn by all ranks together.
    pub fn samples_total(&self) -> usize {
        self.samples_total
    }

    /// Returns the integration domain.
    pub fn bounds(&self) -> &Bounds<T> {
        &self.bounds
    }

    /// Returns the combined estimate of the integral.
    pub fn value(&self) -> T {
        self.result
    }

    /// Returns the combined error.
    pub fn error(&self) -> T {
        self.error
    }

    /// Returns the elapsed time of the slowest rank in seconds.
    pub fn computation_time(&self) -> f64 {
        self.computation_time
    }

    /// Returns when the reduction finished.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the number of ranks.
    pub fn participant_count(&self) -> usize {
        self.participant_count
    }
}

fn sample_rank<T, I>(
    integrand: &I,
    bounds: &Bounds<T>,
    calls: usize,
    base_seed: u64,
    rank: usize,
) -> Result<RankPartial<T>>
where
    I: Integrand<T> + ?Sized,
    T: Float + FromPrimitive + Debug,
    Standard: Distribution<T>,
{
    let (estimate, elapsed) = timed_estimate(integrand, bounds, calls, base_seed, rank as u64);
    let estimate = estimate?;

    debug!(rank, elapsed, "rank finished sampling");

    Ok(RankPartial::new(
        rank,
        estimate.value(),
        estimate.standard_error(),
        elapsed,
    ))
}

/// Integrate `integrand` over `bounds` with `total_calls` samples shared equally among `ranks`
/// concurrently running ranks, each seeded with [`seed_for`]`(base_seed, rank)`, and combine
/// their estimates at rank 0.
///
/// Samples that cannot be shared equally are dropped; the record reports the number actually
/// drawn. If ranks fail, the failure of the lowest rank is returned.
pub fn reduce<T, I>(
    integrand: &I,
    bounds: &Bounds<T>,
    total_calls: usize,
    base_seed: u64,
    ranks: usize,
) -> Result<ReductionRecord<T>>
where
    I: Integrand<T> + ?Sized,
    T: Float + FromPrimitive + Debug + Send + Sync,
    Standard: Distribution<T>,
{
    let calls = calls_per_rank(ranks, total_calls)?;

    let partials = crossbeam::scope(|s| -> Result<Vec<RankPartial<T>>> {
        let barrier = WaitGroup::new();
        let mut receivers: Vec<Receiver<Result<RankPartial<T>>>> = Vec::with_capacity(ranks - 1);

        for rank in 1..ranks {
            // zero capacity: every send is a rendezvous with the coordinator
            let (sender, receiver) = channel::bounded(0);
            let barrier = barrier.clone();
            receivers.push(receiver);

            s.spawn(move |_| {
                let partial = sample_rank(integrand, bounds, calls, base_seed, rank);
                barrier.wait();
                // fails only if the coordinator already gave up because of a lower rank
                let _ = sender.send(partial);
            });
        }

        let own = sample_rank(integrand, bounds, calls, base_seed, 0);
        barrier.wait();

        let mut partials = Vec::with_capacity(ranks);
        partials.push(own?);

        for (rank, receiver) in (1..ranks).zip(receivers) {
            let partial = receiver
                .recv()
                .map_err(|_| Error::reduction(format!("rank {} hung up", rank)))?;
            partials.push(partial?);
        }

        Ok(partials)
    })
    .map_err(|_| Error::reduction("a rank panicked"))??;

    let combined = combine(&partials, ranks)?;

    info!(
        ranks,
        value = ?combined.value(),
        error = ?combined.error(),
        elapsed = combined.elapsed(),
        "reduction finished"
    );

    Ok(ReductionRecord {
        samples_total: calls * ranks,
        bounds: bounds.clone(),
        result: combined.value(),
        error: combined.error(),
        computation_time: combined.elapsed(),
        timestamp: Utc::now(),
        participant_count: ranks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrands::{Constant, Linear};
    use assert_approx_eq::assert_approx_eq;

    struct Failing {}

    impl Integrand<f64> for Failing {
        fn call(&self, _: &[f64]) -> Result<f64> {
            Err(Error::evaluation("always fails"))
        }

        fn dim(&self) -> usize {
            2
        }
    }

    struct Panicking {}

    impl Integrand<f64> for Panicking {
        fn call(&self, x: &[f64]) -> Result<f64> {
            assert!(x.len() > 2, "not enough coordinates");
            Ok(x[2])
        }

        fn dim(&self) -> usize {
            2
        }
    }

    fn unit_square() -> Bounds<f64> {
        Bounds::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_combine_two_ranks() {
        let partials = [
            RankPartial::new(0, 1.0, 0.1, 2.0),
            RankPartial::new(1, 1.0, 0.1, 3.0),
        ];
        let combined = combine(&partials, 2).unwrap();

        assert_approx_eq!(combined.value(), 1.0, 1e-15);
        assert_approx_eq!(combined.error(), 0.02f64.sqrt() / 2.0, 1e-15);
        assert_approx_eq!(combined.error(), 0.0707, 1e-4);
        assert_eq!(combined.elapsed(), 3.0);
    }

    #[test]
    fn test_combine_averages_values() {
        let partials = [
            RankPartial::new(0, 1.0, 0.3, 1.0),
            RankPartial::new(1, 2.0, 0.4, 1.0),
            RankPartial::new(2, 3.0, 0.0, 0.5),
        ];
        let combined = combine(&partials, 3).unwrap();

        assert_approx_eq!(combined.value(), 2.0, 1e-15);
        assert_approx_eq!(combined.error(), 0.5 / 3.0, 1e-15);
        assert_eq!(combined.elapsed(), 1.0);
    }

    #[test]
    fn test_combine_checks_input() {
        assert!(matches!(
            combine::<f64>(&[], 0),
            Err(Error::AggregationInput { .. })
        ));
        assert!(matches!(
            combine(&[RankPartial::new(0, 1.0, 0.1, 1.0)], 2),
            Err(Error::AggregationInput { .. })
        ));
    }

    #[test]
    fn test_reduce_constant() {
        let record = reduce(&Constant::new(2, 1.0), &unit_square(), 1001, 42, 4).unwrap();

        assert_eq!(record.participant_count(), 4);
        // one sample cannot be shared and is dropped
        assert_eq!(record.samples_total(), 1000);
        assert_approx_eq!(record.value(), 1.0, 1e-12);
        assert_eq!(record.error(), 0.0);
        assert!(record.computation_time() >= 0.0);
    }

    #[test]
    fn test_reduce_matches_individual_ranks() {
        let bounds = unit_square();
        let ranks = 3;
        let record = reduce(&Linear::new(2), &bounds, 3000, 7, ranks).unwrap();

        let partials = (0..ranks)
            .map(|rank| sample_rank(&Linear::new(2), &bounds, 1000, 7, rank).unwrap())
            .collect::<Vec<_>>();
        let combined = combine(&partials, ranks).unwrap();

        assert_eq!(record.value(), combined.value());
        assert_eq!(record.error(), combined.error());

        // int_0^1 int_0^1 (x + y) dx dy = 1
        assert!((record.value() - 1.0).abs() < 5.0 * record.error());
    }

    #[test]
    fn test_reduce_single_rank() {
        let record = reduce(&Linear::new(2), &unit_square(), 100, 1, 1).unwrap();

        assert_eq!(record.participant_count(), 1);
        assert_eq!(record.samples_total(), 100);
    }

    #[test]
    fn test_reduce_failures() {
        assert!(matches!(
            reduce(&Failing {}, &unit_square(), 100, 42, 4),
            Err(Error::Evaluation { .. })
        ));
        assert!(matches!(
            reduce(&Linear::new(2), &unit_square(), 100, 42, 0),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            reduce(&Linear::new(2), &unit_square(), 3, 42, 4),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_reduce_panics() {
        // every rank panics, including the coordinator
        for &ranks in &[1, 3] {
            match reduce(&Panicking {}, &unit_square(), 300, 42, ranks) {
                Err(Error::Evaluation { message }) => {
                    assert!(message.contains("not enough coordinates"));
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
    }

    #[test]
    fn test_record_fields() {
        let record = reduce(&Constant::new(2, 2.0), &unit_square(), 10, 42, 2).unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["samples_total"], 10);
        assert_eq!(json["bounds"], "[(0, 1), (0, 1)]");
        assert_eq!(json["result"], 2.0);
        assert_eq!(json["participant_count"], 2);
        assert!(json["computation_time"].is_number());
        assert!(json["timestamp"].is_string());
    }
}
