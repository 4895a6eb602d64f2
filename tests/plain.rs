use mcgather::callbacks::SinkCallback;
use mcgather::core::estimators::*;
use mcgather::integrators::plain;
use mcgather::jobs::{run_job, JobOutcome};
use mcgather::*;

use assert_approx_eq::assert_approx_eq;
use rand::SeedableRng;
use rand_pcg::Pcg64;

struct MyIntegrand {}

impl Integrand<f64> for MyIntegrand {
    // int_1^3 dx x^2 = 26/3
    fn call(&self, x: &[f64]) -> Result<f64> {
        Ok(x[0] * x[0])
    }

    fn dim(&self) -> usize {
        1
    }
}

fn completed(outcome: JobOutcome<f64>) -> jobs::PartialResult<f64> {
    match outcome {
        JobOutcome::Completed(result) => result,
        JobOutcome::Failed(failure) => panic!("job failed: {}", failure.error()),
    }
}

#[test]
fn plain_iteration() {
    const CALLS: usize = 100_000;

    let bounds = Bounds::new(vec![(1.0, 3.0)]).unwrap();
    let mut rng = Pcg64::seed_from_u64(seed_for(42, 0));
    let result = plain::estimate(&MyIntegrand {}, &bounds, CALLS, &mut rng).unwrap();

    assert_eq!(result.calls(), CALLS);

    // the standard error is not scaled by the volume; sigma(x^2) on [1,3] = sqrt(1456/45 - 169/9)
    let sigma = (1456.0f64 / 45.0 - 169.0 / 9.0).sqrt();
    assert_approx_eq!(result.standard_error(), sigma / (CALLS as f64).sqrt(), 1e-4);

    let volume_error = bounds.volume() * result.standard_error();
    assert!((result.value() - 26.0 / 3.0).abs() < 5.0 * volume_error);
}

#[test]
fn run_job_matches_estimate() {
    let bounds = Bounds::new(vec![(1.0, 3.0)]).unwrap();
    let result = completed(run_job(&MyIntegrand {}, &bounds, 1000, 42, 5, &SinkCallback {}));

    // the job uses the generator seeded with seed_for(42, 5)
    let mut rng = Pcg64::seed_from_u64(47);
    let estimate = plain::estimate(&MyIntegrand {}, &bounds, 1000, &mut rng).unwrap();

    assert_eq!(result.value(), estimate.value());
    assert_eq!(result.standard_error(), estimate.standard_error());
    assert_eq!(result.samples(), 1000);
}

#[test]
fn convergence() {
    let bounds = Bounds::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let f = integrands::Linear::new(2);

    let errors = [1_000, 10_000, 100_000]
        .iter()
        .map(|&calls| {
            let result = completed(run_job(&f, &bounds, calls, 42, 0, &SinkCallback {}));
            assert!((result.value() - 1.0).abs() < 5.0 * result.standard_error());
            result.standard_error()
        })
        .collect::<Vec<_>>();

    // ten times the calls shrink the error by sqrt(10)
    for pair in errors.windows(2) {
        let ratio = pair[0] / pair[1];
        assert!((ratio - 10f64.sqrt()).abs() < 0.3, "ratio = {}", ratio);
    }
}

#[test]
fn constant_integrand_gives_volume() {
    let bounds = Bounds::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let result = completed(run_job(
        &integrands::Constant::new(2, 1.0),
        &bounds,
        10_000,
        42,
        0,
        &SinkCallback {},
    ));

    assert_approx_eq!(result.value(), 1.0, 1e-12);
    assert_eq!(result.standard_error(), 0.0);
}

#[test]
fn estimators_of_job_values() {
    let bounds = Bounds::new(vec![(0.0, 1.0)]).unwrap();
    let values = (0..8)
        .map(|job_id| {
            completed(run_job(
                &integrands::Linear::new(1),
                &bounds,
                1000,
                42,
                job_id,
                &SinkCallback {},
            ))
            .value()
        })
        .collect::<Vec<_>>();
    let mv = MeanVar::from_values(&values).unwrap();

    assert_eq!(mv.calls(), 8);
    assert!((mv.mean() - 0.5).abs() < 5.0 * mv.standard_error() + 1e-3);
}
