#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! The crate `mcgather` estimates definite multi-dimensional [integrals] with plain [Monte Carlo
//! integration], splitting the sample budget across independent workers and combining their
//! partial estimates into one result with a correctly propagated uncertainty.
//!
//! # Features
//!
//! - **Generic numeric type**. The numeric type is a generic parameter, so that the routines can
//! be used with either `f32`, `f64`, or a custom numeric type that implements the `Float` trait
//! from the `num-traits` crate.
//! - **Reproducibility**. Every worker owns a random number generator seeded with
//! [`seed_for`]`(base_seed, worker_id)`. Rerunning a worker with the same base seed reproduces its
//! estimate bit by bit, and no two workers of a run share a seed.
//! - **Scatter and gather**. Independent jobs, for example on a batch system, each write one
//! artifact into a shared directory; [`aggregators::files`] summarizes whatever artifacts exist
//! at the time it is run, listing failed jobs separately.
//! - **Synchronous reduction**. [`aggregators::reduction`] shares one global budget among
//! concurrently running ranks, which meet at a barrier and send their partial results to a
//! coordinator, much like an MPI gather.
//! - **No silent failures**. Invalid bounds or budgets are rejected before sampling, and an
//! integrand error or a non-finite integrand value fails the whole estimate instead of being
//! filtered out.
//!
//! # What is ...?
//!
//! Given a domain $\Omega = [a_1, b_1] \times \cdots \times [a_d, b_d]$ with volume $V$ we
//! approximate
//!
//! $$ I = \int_\Omega \mathrm{d}^d x \, f(x) \approx \frac{V}{N} \sum_{j=1}^N f \left( x^{(j)}
//! \right) $$
//!
//! where the points $x^{(j)}$ are uniformly distributed in $\Omega$. We use the following
//! terms:
//!
//! - the number of *calls* or the *sample size* is $N$,
//! - the *standard error* of a single worker is $\sigma_f / \sqrt{N}$, where $\sigma_f$ is the
//! population standard deviation of the integrand values,
//! - a *job* is an independent worker of the file-based topology, a *rank* a participant of the
//! reduction.
//!
//! The two topologies combine partial results differently. Independent jobs are repeated
//! experiments: their values are averaged and the uncertainty is the standard error of the mean
//! across jobs. Ranks are shares of one experiment: their values are averaged and their errors
//! are added in quadrature and divided by the number of ranks.
//!
//! [Monte Carlo integration]: https://en.wikipedia.org/wiki/Monte_Carlo_integration
//! [integrals]: https://en.wikipedia.org/wiki/Integral

pub mod aggregators;
pub mod artifacts;
pub mod callbacks;
pub mod config;
pub mod core;
pub mod error;
pub mod integrands;
pub mod integrators;
pub mod jobs;

pub use crate::core::*;
pub use crate::error::{Error, Result};
