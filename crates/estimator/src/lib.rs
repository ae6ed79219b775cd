#![deny(unsafe_code)]
//! Concentration field estimator driven by vehicle samples.
//!
//! [`FieldEstimator`] implements the [`Surrogate`] contract: it logs every
//! [`SensorSample`], refuses to fit until [`MIN_FIT_SAMPLES`] have arrived,
//! and answers point predictions by nearest-cell lookup against a cached
//! snapshot.
//!
//! The fit itself is a placeholder: it snapshots the generator's current
//! realization of the field rather than regressing the logged samples. A
//! scattered-data method can replace [`FieldEstimator::fit`]'s body without
//! any caller change.

use plume_core::{
    DVec2, Domain, Field, FieldGenerator, FlowField, SensorSample, Surrogate, MIN_FIT_SAMPLES,
};
use tracing::{debug, trace};

/// Fitted state: the snapshot predictions are answered from.
#[derive(Debug, Clone)]
struct Snapshot {
    concentration: Field,
    flow: FlowField,
    time_step: u64,
}

/// Sample log plus the cached fit used for prediction.
#[derive(Debug, Clone)]
pub struct FieldEstimator {
    domain: Domain,
    samples: Vec<SensorSample>,
    snapshot: Option<Snapshot>,
}

impl FieldEstimator {
    /// An empty, unfitted estimator predicting over `domain`.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            samples: Vec::new(),
            snapshot: None,
        }
    }

    /// The lattice predictions are resolved on.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Every sample logged so far, oldest first.
    pub fn samples(&self) -> &[SensorSample] {
        &self.samples
    }

    /// Time step of the most recent successful fit.
    pub fn fitted_time_step(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.time_step)
    }

    /// Predicted current at each position; zero vectors while unfitted.
    pub fn predict_flow(&self, positions: &[DVec2]) -> Vec<DVec2> {
        match &self.snapshot {
            Some(s) => positions
                .iter()
                .map(|&p| s.flow.lookup(&self.domain, p))
                .collect(),
            None => vec![DVec2::ZERO; positions.len()],
        }
    }
}

impl Surrogate for FieldEstimator {
    fn add_sample(&mut self, sample: SensorSample) {
        trace!(
            position = ?sample.position,
            concentration = sample.concentration,
            "sample logged"
        );
        self.samples.push(sample);
    }

    fn fit(&mut self, truth: &mut FieldGenerator, time_step: u64) -> bool {
        if self.samples.len() < MIN_FIT_SAMPLES {
            debug!(
                samples = self.samples.len(),
                required = MIN_FIT_SAMPLES,
                "not enough samples to fit"
            );
            return false;
        }
        self.snapshot = Some(Snapshot {
            concentration: truth.concentration(time_step),
            flow: truth.flow(time_step),
            time_step,
        });
        true
    }

    fn predict(&self, positions: &[DVec2]) -> Vec<f64> {
        match &self.snapshot {
            Some(s) => positions
                .iter()
                .map(|&p| self.domain.lookup(&s.concentration, p))
                .collect(),
            None => vec![0.0; positions.len()],
        }
    }

    fn is_fitted(&self) -> bool {
        self.snapshot.is_some()
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
