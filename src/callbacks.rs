//! Implementation of different callback functions.
use crate::jobs::JobOutcome;
use std::fmt::Display;

/// Trait for implementing callbacks that report finished jobs.
pub trait Callback<T> {
    /// This method is called after a job has finished, successfully or not, and may print
    /// information about it.
    fn print(&self, outcome: &JobOutcome<T>);
}

/// A callback function that does nothing
pub struct SinkCallback {}

impl<T> Callback<T> for SinkCallback {
    fn print(&self, _: &JobOutcome<T>) {}
}

/// A callback function that prints the result or the failure of each job
pub struct SimpleCallback {}

impl<T> Callback<T> for SimpleCallback
where
    T: Copy + Display,
{
    fn print(&self, outcome: &JobOutcome<T>) {
        match outcome {
            JobOutcome::Completed(result) => {
                println!("job {} finished.", result.job_id());
                println!(
                    "N={} E={} \u{b1} {} ({:.2} s)",
                    result.samples(),
                    result.value(),
                    result.standard_error(),
                    result.computation_time()
                );
            }
            JobOutcome::Failed(failure) => {
                println!("job {} failed: {}", failure.job_id(), failure.error());
            }
        }
    }
}
