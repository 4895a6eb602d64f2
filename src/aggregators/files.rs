//! Aggregation of independent jobs whose artifacts were written to a shared directory.
//!
//! Every job estimates the same integral with its own random numbers, so the job values are
//! treated as independent repetitions of one experiment: the combined estimate is their mean
//! and its uncertainty is the standard error of that mean, computed from the spread of the job
//! values. The jobs' own standard errors are only reported as a diagnostic.
use crate::artifacts::{parse_file_name, ArtifactKind};
use crate::core::estimators::*;
use crate::error::{Error, Result};
use crate::jobs::{FailureRecord, PartialResult};

use num_traits::{Float, FromPrimitive};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Summary of a collection of partial results.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryStatistics<T> {
    jobs: usize,
    samples: usize,
    mean: T,
    standard_error: T,
    std_dev: T,
    mean_job_error: T,
    single_sample_jobs: usize,
    total_time: f64,
    mean_time: f64,
    throughput: Option<f64>,
}

impl<T: Copy> SummaryStatistics<T> {
    /// Returns the number of jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Returns the number of samples drawn by all jobs together.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the mean of the job values.
    pub fn mean(&self) -> T {
        self.mean
    }

    /// Returns the standard error of [`Self::mean`], the population standard deviation of the
    /// job values divided by the square root of the number of jobs.
    pub fn standard_error(&self) -> T {
        self.standard_error
    }

    /// Returns the population standard deviation of the job values.
    pub fn std_dev(&self) -> T {
        self.std_dev
    }

    /// Returns the mean of the jobs' own standard errors.
    pub fn mean_job_error(&self) -> T {
        self.mean_job_error
    }

    /// Returns the number of jobs that drew a single sample. Their standard error of zero does
    /// not describe an uncertainty but still enters [`Self::mean_job_error`].
    pub fn single_sample_jobs(&self) -> usize {
        self.single_sample_jobs
    }

    /// Returns the summed computation time of all jobs in seconds.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Returns the mean computation time per job in seconds.
    pub fn mean_time(&self) -> f64 {
        self.mean_time
    }

    /// Returns the number of samples per second of summed computation time, or `None` if no
    /// measurable time was spent.
    pub fn throughput(&self) -> Option<f64> {
        self.throughput
    }
}

impl<T: Display> Display for SummaryStatistics<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Number of jobs: {}", self.jobs)?;
        writeln!(f, "  Total samples: {}", self.samples)?;
        writeln!(
            f,
            "  Mean result: {:.6} \u{b1} {:.6}",
            self.mean, self.standard_error
        )?;
        writeln!(f, "  Standard deviation: {:.6}", self.std_dev)?;
        writeln!(f, "  Mean Monte Carlo error: {:.6}", self.mean_job_error)?;
        if self.single_sample_jobs != 0 {
            writeln!(
                f,
                "  Jobs without error estimate: {}",
                self.single_sample_jobs
            )?;
        }
        writeln!(f, "  Total computation time: {:.2} seconds", self.total_time)?;
        writeln!(f, "  Mean time per job: {:.2} seconds", self.mean_time)?;

        match self.throughput {
            Some(throughput) => writeln!(f, "  Efficiency: {:.0} samples/second", throughput),
            None => writeln!(f, "  Efficiency: n/a"),
        }
    }
}

/// Summarize `results`.
///
/// Fails if `results` is empty or if the results do not share the same bounds, since their
/// values would then estimate different integrals.
pub fn summarize<T>(results: &[PartialResult<T>]) -> Result<SummaryStatistics<T>>
where
    T: Float + FromPrimitive,
{
    let first = results
        .first()
        .ok_or_else(|| Error::aggregation_input("no results to analyze"))?;

    if let Some(other) = results.iter().find(|r| r.bounds() != first.bounds()) {
        return Err(Error::aggregation_input(format!(
            "jobs {} and {} integrate over different bounds",
            first.job_id(),
            other.job_id()
        )));
    }

    let values = results.iter().map(PartialResult::value).collect::<Vec<_>>();
    let errors = results
        .iter()
        .map(PartialResult::standard_error)
        .collect::<Vec<_>>();

    let spread = MeanVar::from_values(&values)
        .ok_or_else(|| Error::aggregation_input("no results to analyze"))?;
    let job_errors = MeanVar::from_values(&errors)
        .ok_or_else(|| Error::aggregation_input("no results to analyze"))?;

    let single_sample_jobs = results.iter().filter(|r| r.samples() < 2).count();

    if single_sample_jobs != 0 {
        warn!(
            single_sample_jobs,
            "jobs with a single sample have no meaningful standard error"
        );
    }

    let jobs = results.len();
    let samples = results.iter().map(PartialResult::samples).sum::<usize>();
    let total_time = results
        .iter()
        .map(PartialResult::computation_time)
        .sum::<f64>();

    Ok(SummaryStatistics {
        jobs,
        samples,
        mean: spread.mean(),
        standard_error: spread.standard_error(),
        std_dev: spread.std(),
        mean_job_error: job_errors.mean(),
        single_sample_jobs,
        total_time,
        mean_time: total_time / jobs as f64,
        throughput: if total_time > 0.0 {
            Some(samples as f64 / total_time)
        } else {
            None
        },
    })
}

/// All artifacts found in a result directory.
#[derive(Debug)]
pub struct Collection<T> {
    results: Vec<PartialResult<T>>,
    failures: Vec<FailureRecord>,
    unreadable: Vec<PathBuf>,
}

impl<T> Collection<T>
where
    T: Float + FromPrimitive,
{
    /// Returns the results of the successful jobs, ordered by job id.
    pub fn results(&self) -> &[PartialResult<T>] {
        &self.results
    }

    /// Returns the records of the failed jobs, ordered by job id.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Returns the artifacts that could not be read or parsed.
    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }

    /// Summarize the successful jobs. Failures do not enter the summary.
    pub fn summarize(&self) -> Result<SummaryStatistics<T>> {
        summarize(&self.results)
    }
}

fn read_artifact<D: DeserializeOwned>(path: &Path) -> Result<D> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Load all job artifacts currently present in `dir`.
///
/// Jobs that are still running simply have no artifact yet. Artifacts that cannot be read or
/// parsed, or whose record belongs to a different job than their name says, are skipped and
/// reported in [`Collection::unreadable`]; files that are not job
/// artifacts are ignored. Only a failure to list `dir` itself is an error.
pub fn load_results<T>(dir: &Path) -> Result<Collection<T>>
where
    T: Float + FromPrimitive + FromStr + DeserializeOwned,
{
    let mut results: Vec<PartialResult<T>> = Vec::new();
    let mut failures: Vec<FailureRecord> = Vec::new();
    let mut unreadable = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let (kind, job_id) = match path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_file_name)
        {
            Some(parsed) => parsed,
            None => continue,
        };

        // a renamed or copied artifact would count its job twice
        let mismatch = |id: u64| {
            Error::aggregation_input(format!(
                "artifact of job {} holds the record of job {}",
                job_id, id
            ))
        };

        let loaded = match kind {
            ArtifactKind::Result => {
                read_artifact::<PartialResult<T>>(&path).and_then(|result| {
                    if result.job_id() == job_id {
                        results.push(result);
                        Ok(())
                    } else {
                        Err(mismatch(result.job_id()))
                    }
                })
            }
            ArtifactKind::Error => read_artifact::<FailureRecord>(&path).and_then(|failure| {
                if failure.job_id() == job_id {
                    failures.push(failure);
                    Ok(())
                } else {
                    Err(mismatch(failure.job_id()))
                }
            }),
        };

        if let Err(err) = loaded {
            warn!(path = %path.display(), error = %err, "skipping unreadable artifact");
            unreadable.push(path);
        }
    }

    results.sort_by_key(PartialResult::job_id);
    failures.sort_by_key(FailureRecord::job_id);
    unreadable.sort();

    debug!(
        results = results.len(),
        failures = failures.len(),
        unreadable = unreadable.len(),
        "artifacts loaded"
    );

    Ok(Collection {
        results,
        failures,
        unreadable,
    })
}
