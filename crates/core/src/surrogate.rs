//! The `Surrogate` trait: the contract between the control loop and any
//! field estimator.
//!
//! Callers accumulate point samples, ask for a fit, and query predictions.
//! The trait is object-safe so the planner and orchestrator can hold a
//! `&dyn Surrogate` and an estimator can be swapped without touching them.

use glam::DVec2;
use serde::Serialize;

use crate::generator::FieldGenerator;

/// Minimum accumulated samples before a surrogate may become fitted.
pub const MIN_FIT_SAMPLES: usize = 3;

/// One logged measurement: where it was taken and what was read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSample {
    pub position: DVec2,
    pub concentration: f64,
    pub flow: DVec2,
}

/// Online scattered-data estimator of the concentration field.
pub trait Surrogate {
    /// Appends a sample. Never fails and never rejects duplicates.
    fn add_sample(&mut self, sample: SensorSample);

    /// Refits the surrogate for time step `time_step`.
    ///
    /// Returns `false` and leaves all prior state untouched while fewer than
    /// [`MIN_FIT_SAMPLES`] samples have been accumulated.
    fn fit(&mut self, truth: &mut FieldGenerator, time_step: u64) -> bool;

    /// Predicted concentration at each position; all zeros while unfitted.
    fn predict(&self, positions: &[DVec2]) -> Vec<f64>;

    /// Whether a fit has succeeded since construction.
    fn is_fitted(&self) -> bool;

    /// Number of samples accumulated so far.
    fn sample_count(&self) -> usize;

    /// Predicted concentration at a single position.
    fn predict_at(&self, position: DVec2) -> f64 {
        self.predict(&[position]).first().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Running-mean surrogate used to verify trait object safety and the
    /// default `predict_at`.
    struct MeanSurrogate {
        samples: Vec<SensorSample>,
        mean: Option<f64>,
    }

    impl Surrogate for MeanSurrogate {
        fn add_sample(&mut self, sample: SensorSample) {
            self.samples.push(sample);
        }

        fn fit(&mut self, _truth: &mut FieldGenerator, _time_step: u64) -> bool {
            if self.samples.len() < MIN_FIT_SAMPLES {
                return false;
            }
            let sum: f64 = self.samples.iter().map(|s| s.concentration).sum();
            self.mean = Some(sum / self.samples.len() as f64);
            true
        }

        fn predict(&self, positions: &[DVec2]) -> Vec<f64> {
            vec![self.mean.unwrap_or(0.0); positions.len()]
        }

        fn is_fitted(&self) -> bool {
            self.mean.is_some()
        }

        fn sample_count(&self) -> usize {
            self.samples.len()
        }
    }

    fn sample(c: f64) -> SensorSample {
        SensorSample {
            position: DVec2::ZERO,
            concentration: c,
            flow: DVec2::ZERO,
        }
    }

    #[test]
    fn surrogate_trait_is_object_safe() {
        let s: Box<dyn Surrogate> = Box::new(MeanSurrogate {
            samples: Vec::new(),
            mean: None,
        });
        assert!(!s.is_fitted());
        assert_eq!(s.predict(&[DVec2::ZERO, DVec2::ONE]), vec![0.0, 0.0]);
    }

    #[test]
    fn predict_at_delegates_to_predict() {
        let mut s = MeanSurrogate {
            samples: Vec::new(),
            mean: None,
        };
        for c in [1.0, 2.0, 3.0] {
            s.add_sample(sample(c));
        }
        let domain = crate::domain::Domain::new(10.0, 10.0, 4).unwrap();
        let mut truth =
            FieldGenerator::new(domain, DVec2::splat(5.0), crate::prng::Xorshift64::new(1));
        let dyn_ref: &mut dyn Surrogate = &mut s;
        assert!(dyn_ref.fit(&mut truth, 0));
        assert!((dyn_ref.predict_at(DVec2::splat(3.0)) - 2.0).abs() < 1e-12);
        assert_eq!(dyn_ref.sample_count(), 3);
    }
}
