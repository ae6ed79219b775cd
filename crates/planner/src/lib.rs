#![deny(unsafe_code)]
//! Short-horizon trajectory planning against a field surrogate.
//!
//! [`TrajectoryPlanner::plan`] turns the surrogate's current belief into a
//! sequence of velocity commands. When the surrogate is fitted it picks the
//! highest predicted concentration on a coarse lattice as the target, seeds
//! the optimizer with unit-speed steps toward it, and minimizes
//! `energy - coverage_weight * coverage` with every velocity component boxed
//! to `[-max_speed, max_speed]`. When the surrogate is unfitted, or the
//! optimizer fails for any reason, the plan falls back to random
//! exploration. Planning itself never fails.

pub mod lbfgsb;

use plume_core::{DVec2, Domain, SimConfig, Surrogate, Xorshift64};
use plume_vehicle::{Vehicle, VehicleParams};
use tracing::{debug, warn};

pub use lbfgsb::{Bound, LbfgsbOptions, Minimum, OptimizeError};

const DEFAULT_COVERAGE_WEIGHT: f64 = 10.0;
const DEFAULT_LATTICE_RESOLUTION: usize = 20;
const DEFAULT_EXPLORATION_MIN_SPEED: f64 = 0.5;
const DEFAULT_MAX_ITERATIONS: usize = 200;
const DEFAULT_MAX_HORIZON: usize = 50;

/// Planner tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerParams {
    pub coverage_weight: f64,
    pub lattice_resolution: usize,
    pub exploration_min_speed: f64,
    pub max_iterations: usize,
    pub max_horizon: usize,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            coverage_weight: DEFAULT_COVERAGE_WEIGHT,
            lattice_resolution: DEFAULT_LATTICE_RESOLUTION,
            exploration_min_speed: DEFAULT_EXPLORATION_MIN_SPEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_horizon: DEFAULT_MAX_HORIZON,
        }
    }
}

impl PlannerParams {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            coverage_weight: config.coverage_weight,
            lattice_resolution: config.lattice_resolution,
            exploration_min_speed: config.exploration_min_speed,
            max_iterations: config.max_iterations,
            max_horizon: config.max_horizon,
        }
    }
}

/// Why a plan came from exploration instead of the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The surrogate has not been fitted yet.
    Unfitted,
    /// The optimizer ran and failed.
    Optimizer(OptimizeError),
}

/// Where a plan's velocities came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanSource {
    Optimized { iterations: usize, cost: f64 },
    Exploration { reason: FallbackReason },
}

/// A sequence of velocity commands, one per future step.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub velocities: Vec<DVec2>,
    pub source: PlanSource,
}

impl Plan {
    /// The command for the next step, if any.
    pub fn first(&self) -> Option<DVec2> {
        self.velocities.first().copied()
    }

    pub fn len(&self) -> usize {
        self.velocities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }

    pub fn is_optimized(&self) -> bool {
        matches!(self.source, PlanSource::Optimized { .. })
    }
}

/// Plans velocity sequences for one vehicle over one domain.
///
/// Owns the PRNG used for exploration so that a seeded session replays the
/// same fallback headings.
#[derive(Debug, Clone)]
pub struct TrajectoryPlanner {
    params: PlannerParams,
    domain: Domain,
    rng: Xorshift64,
}

impl TrajectoryPlanner {
    pub fn new(domain: Domain, params: PlannerParams, rng: Xorshift64) -> Self {
        Self {
            params,
            domain,
            rng,
        }
    }

    pub fn from_config(config: &SimConfig, domain: Domain, rng: Xorshift64) -> Self {
        Self::new(domain, PlannerParams::from_config(config), rng)
    }

    pub fn params(&self) -> &PlannerParams {
        &self.params
    }

    /// Cost of the flattened velocity vector `params` (`[vx0, vy0, vx1, ...]`)
    /// rolled out from `start` with unit time steps.
    ///
    /// Each velocity is clamped to the vehicle's speed cap before it is
    /// applied. Each step adds its energy charge and, once the surrogate is
    /// fitted, subtracts `coverage_weight` times the prediction at the
    /// waypoint it reaches. A trailing odd component is ignored.
    pub fn objective(
        &self,
        params: &[f64],
        start: DVec2,
        vehicle: &VehicleParams,
        surrogate: &dyn Surrogate,
    ) -> f64 {
        let mut position = start;
        let mut energy = 0.0;
        let mut waypoints = Vec::with_capacity(params.len() / 2);
        for pair in params.chunks_exact(2) {
            let velocity = vehicle.clamp_velocity(DVec2::new(pair[0], pair[1]));
            position += velocity;
            energy += vehicle.energy_cost(velocity.length(), 1.0);
            waypoints.push(position);
        }
        let coverage: f64 = if surrogate.is_fitted() {
            surrogate.predict(&waypoints).iter().sum()
        } else {
            0.0
        };
        energy - self.params.coverage_weight * coverage
    }

    /// Coarse-lattice point with the highest predicted concentration; the
    /// first such point in x-major order on ties.
    pub fn best_target(&self, surrogate: &dyn Surrogate) -> DVec2 {
        let lattice = self.domain.coarse_lattice(self.params.lattice_resolution);
        let predictions = surrogate.predict(&lattice);
        let mut best = 0;
        for (i, &c) in predictions.iter().enumerate() {
            if c > predictions[best] {
                best = i;
            }
        }
        lattice.get(best).copied().unwrap_or_else(|| self.domain.midpoint())
    }

    /// Plans `steps` velocity commands for `vehicle`.
    ///
    /// `target` overrides the lattice search. Requests longer than
    /// `max_horizon` are shortened to it; a zero-step request yields an empty
    /// plan.
    pub fn plan(
        &mut self,
        vehicle: &Vehicle,
        surrogate: &dyn Surrogate,
        target: Option<DVec2>,
        steps: usize,
    ) -> Plan {
        let steps = if steps > self.params.max_horizon {
            warn!(
                requested = steps,
                max_horizon = self.params.max_horizon,
                "planning horizon capped"
            );
            self.params.max_horizon
        } else {
            steps
        };

        if !surrogate.is_fitted() {
            debug!(steps, "surrogate unfitted, exploring");
            return self.exploration(vehicle.max_speed(), steps, FallbackReason::Unfitted);
        }

        match self.optimize(vehicle, surrogate, target, steps) {
            Ok(minimum) => {
                debug!(
                    iterations = minimum.iterations,
                    cost = minimum.value,
                    "optimized plan"
                );
                Plan {
                    velocities: minimum
                        .x
                        .chunks_exact(2)
                        .map(|p| DVec2::new(p[0], p[1]))
                        .collect(),
                    source: PlanSource::Optimized {
                        iterations: minimum.iterations,
                        cost: minimum.value,
                    },
                }
            }
            Err(err) => {
                if err.is_convergence_failure() {
                    debug!(%err, "optimizer did not converge, exploring");
                } else {
                    warn!(%err, "optimizer rejected the problem, exploring");
                }
                self.exploration(vehicle.max_speed(), steps, FallbackReason::Optimizer(err))
            }
        }
    }

    fn optimize(
        &self,
        vehicle: &Vehicle,
        surrogate: &dyn Surrogate,
        target: Option<DVec2>,
        steps: usize,
    ) -> Result<Minimum, OptimizeError> {
        let start = vehicle.position();
        let target = target.unwrap_or_else(|| self.best_target(surrogate));
        if !target.is_finite() {
            return Err(OptimizeError::InvalidInput(format!(
                "target {target} is not finite"
            )));
        }
        let heading = (target - start).normalize_or_zero();

        let x0: Vec<f64> = (0..steps).flat_map(|_| [heading.x, heading.y]).collect();
        let bounds = vec![Bound::symmetric(vehicle.max_speed()); x0.len()];
        let options = LbfgsbOptions {
            max_iterations: self.params.max_iterations,
            ..LbfgsbOptions::default()
        };
        let vehicle_params = *vehicle.params();

        lbfgsb::minimize(
            |x| self.objective(x, start, &vehicle_params, surrogate),
            &x0,
            &bounds,
            &options,
        )
    }

    /// Random headings at speeds drawn from `[exploration_min_speed, max_speed)`.
    fn exploration(&mut self, max_speed: f64, steps: usize, reason: FallbackReason) -> Plan {
        let min_speed = self.params.exploration_min_speed.min(max_speed);
        let velocities = (0..steps)
            .map(|_| {
                let angle = self.rng.next_range(0.0, std::f64::consts::TAU);
                let speed = self.rng.next_range(min_speed, max_speed);
                DVec2::from_angle(angle) * speed
            })
            .collect();
        Plan {
            velocities,
            source: PlanSource::Exploration { reason },
        }
    }
}
