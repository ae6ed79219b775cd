//! The sense, fit, plan, act control loop for one vehicle.

use plume_core::{
    DVec2, FieldGenerator, SensorSample, SimConfig, SimError, Surrogate, Xorshift64,
};
use plume_estimator::FieldEstimator;
use plume_planner::TrajectoryPlanner;
use plume_vehicle::Vehicle;
use tracing::{debug, info};

use crate::report::{
    FieldView, RunReport, SimState, SimStatus, StepOutcome, StepReport, StepSummary,
};

/// Unit time step of the control loop.
const DT: f64 = 1.0;

/// One vehicle tracking one plume.
///
/// Every random source is forked from a single session seeder, so a seeded
/// config replays the same run, resets included.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    seeder: Xorshift64,
    generator: FieldGenerator,
    // Separate noise stream for read-only field queries.
    observer: FieldGenerator,
    vehicle: Vehicle,
    estimator: FieldEstimator,
    planner: TrajectoryPlanner,
    time_step: u64,
}

impl Simulation {
    /// Builds a fresh simulation from a validated config.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let domain = config.domain()?;
        let mut seeder = Xorshift64::from_optional_seed(config.seed);
        let generator = FieldGenerator::new(domain.clone(), config.source, seeder.fork());
        let observer = FieldGenerator::new(domain.clone(), config.source, seeder.fork());
        let planner = TrajectoryPlanner::from_config(&config, domain.clone(), seeder.fork());
        Ok(Self {
            vehicle: Vehicle::from_config(&config),
            estimator: FieldEstimator::new(domain),
            generator,
            observer,
            planner,
            seeder,
            config,
            time_step: 0,
        })
    }

    /// Advances one tick.
    ///
    /// Samples at the current position, logs the sample, refits, plans one
    /// step and drives it. A depleted vehicle is reported as
    /// [`StepOutcome::Depleted`] with no state touched.
    pub fn step(&mut self) -> StepOutcome {
        let Some((summary, optimized)) = self.advance() else {
            return StepOutcome::Depleted {
                time_step: self.time_step,
            };
        };
        let t = self.time_step;
        let concentration = self.generator.concentration(t);
        let flow = self.generator.flow(t);
        StepOutcome::Advanced(StepReport {
            position: summary.position,
            concentration: summary.concentration,
            energy: summary.energy,
            time_step: t,
            optimized,
            field: FieldView::new(self.generator.domain(), &concentration, &flow, t),
        })
    }

    /// Steps up to `n` times, stopping early once the vehicle is depleted.
    ///
    /// The tick that exhausts the budget still produces a summary. The
    /// report's status tells a depleted vehicle apart from `n == 0`.
    pub fn run(&mut self, n: usize) -> RunReport {
        let mut summaries = Vec::with_capacity(n);
        for _ in 0..n {
            match self.advance() {
                Some((summary, _)) => summaries.push(summary),
                None => break,
            }
        }
        RunReport {
            summaries,
            status: self.status(),
        }
    }

    /// A fresh field realization at time step `t`.
    ///
    /// Leaves the vehicle, estimator, planner and time step untouched.
    pub fn query_field(&mut self, t: u64) -> FieldView {
        let concentration = self.observer.concentration(t);
        let flow = self.observer.flow(t);
        FieldView::new(self.observer.domain(), &concentration, &flow, t)
    }

    pub fn state(&self) -> SimState {
        SimState {
            position: self.vehicle.position(),
            trajectory: self.vehicle.trajectory().to_vec(),
            energy: self.vehicle.energy(),
            energy_history: self.vehicle.energy_history().to_vec(),
            time_step: self.time_step,
            sample_count: self.estimator.sample_count(),
            operational: self.vehicle.is_operational(),
            status: self.status(),
        }
    }

    /// Administrative teleport; not physical motion.
    ///
    /// Bypasses the speed cap, charges no energy and does not advance time.
    /// See [`Vehicle::set_position`].
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.vehicle.set_position(DVec2::new(x, y));
    }

    /// Replaces the vehicle, estimator and planner with fresh instances and
    /// rewinds time to zero. The field generator, and with it the domain and
    /// source, is kept. `None` restarts from the configured start position.
    pub fn reset(&mut self, start: Option<DVec2>) {
        let start = start.unwrap_or(self.config.start);
        let domain = self.generator.domain().clone();
        self.vehicle = Vehicle::new(start, *self.vehicle.params());
        self.estimator = FieldEstimator::new(domain.clone());
        self.planner = TrajectoryPlanner::from_config(&self.config, domain, self.seeder.fork());
        self.time_step = 0;
        info!(?start, "simulation reset");
    }

    pub fn status(&self) -> SimStatus {
        if self.vehicle.is_operational() {
            SimStatus::Active
        } else {
            SimStatus::Depleted
        }
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn estimator(&self) -> &FieldEstimator {
        &self.estimator
    }

    pub fn generator(&self) -> &FieldGenerator {
        &self.generator
    }

    /// One tick of the control loop without building field grids for the
    /// caller. Returns the summary and whether the plan was optimized, or
    /// `None` when depleted.
    fn advance(&mut self) -> Option<(StepSummary, bool)> {
        if !self.vehicle.is_operational() {
            debug!(time_step = self.time_step, "step refused, vehicle depleted");
            return None;
        }

        let t = self.time_step;
        let position = self.vehicle.position();
        let reading = self.generator.sample(&[position], t)[0];
        self.estimator.add_sample(SensorSample {
            position,
            concentration: reading.concentration,
            flow: reading.flow,
        });
        self.estimator.fit(&mut self.generator, t);

        let plan = self.planner.plan(&self.vehicle, &self.estimator, None, 1);
        if let Some(velocity) = plan.first() {
            self.vehicle.drive(velocity, DT);
        }
        self.time_step += 1;

        debug!(
            time_step = self.time_step,
            position = ?self.vehicle.position(),
            energy = self.vehicle.energy(),
            concentration = reading.concentration,
            optimized = plan.is_optimized(),
            "step"
        );

        let summary = StepSummary {
            step: self.time_step,
            position: self.vehicle.position(),
            concentration: reading.concentration,
            energy: self.vehicle.energy(),
        };
        Some((summary, plan.is_optimized()))
    }
}
