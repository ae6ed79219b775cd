//! Reproducible configuration for a plume-tracking run.
//!
//! A [`SimConfig`] captures everything needed to recreate a session: domain
//! geometry, source and start positions, vehicle limits, planner tuning, and
//! the optional PRNG seed. Two sessions built from equal configs with the
//! same `Some(seed)` produce identical trajectories.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Domain;
use crate::error::SimError;
use crate::params::{param_f64, param_opt_u64, param_point, param_usize};

const DEFAULT_DOMAIN_SIZE: f64 = 100.0;
const DEFAULT_RESOLUTION: usize = 100;
const DEFAULT_SOURCE: DVec2 = DVec2::new(50.0, 50.0);
const DEFAULT_START: DVec2 = DVec2::new(20.0, 20.0);
const DEFAULT_MAX_SPEED: f64 = 2.0;
const DEFAULT_ENERGY_CAPACITY: f64 = 1000.0;
const DEFAULT_PROPULSION_COEFFICIENT: f64 = 0.1;
const DEFAULT_HOTEL_LOAD: f64 = 1.0;
const DEFAULT_COVERAGE_WEIGHT: f64 = 10.0;
const DEFAULT_LATTICE_RESOLUTION: usize = 20;
const DEFAULT_EXPLORATION_MIN_SPEED: f64 = 0.5;
const DEFAULT_MAX_ITERATIONS: usize = 200;
const DEFAULT_MAX_HORIZON: usize = 50;

/// Full parameter set for one simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Physical width of the domain.
    pub domain_width: f64,
    /// Physical height of the domain.
    pub domain_height: f64,
    /// Lattice samples per axis.
    pub resolution: usize,
    /// Plume source position.
    pub source: DVec2,
    /// Vehicle start position.
    pub start: DVec2,
    /// Speed cap applied to every actuated velocity.
    pub max_speed: f64,
    /// Initial (and maximum) energy budget.
    pub energy_capacity: f64,
    /// Quadratic propulsion cost coefficient (cost per speed² per unit time).
    pub propulsion_coefficient: f64,
    /// Fixed hotel-load cost per unit time.
    pub hotel_load: f64,
    /// Weight trading coverage reward against energy in the planner objective.
    pub coverage_weight: f64,
    /// Points per axis of the coarse lattice used to pick a planning target.
    pub lattice_resolution: usize,
    /// Lower bound of exploration speeds.
    pub exploration_min_speed: f64,
    /// Iteration cap for the bounded optimizer.
    pub max_iterations: usize,
    /// Longest plan the planner will produce.
    pub max_horizon: usize,
    /// PRNG seed; `None` draws a fresh entropy seed per session.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            domain_width: DEFAULT_DOMAIN_SIZE,
            domain_height: DEFAULT_DOMAIN_SIZE,
            resolution: DEFAULT_RESOLUTION,
            source: DEFAULT_SOURCE,
            start: DEFAULT_START,
            max_speed: DEFAULT_MAX_SPEED,
            energy_capacity: DEFAULT_ENERGY_CAPACITY,
            propulsion_coefficient: DEFAULT_PROPULSION_COEFFICIENT,
            hotel_load: DEFAULT_HOTEL_LOAD,
            coverage_weight: DEFAULT_COVERAGE_WEIGHT,
            lattice_resolution: DEFAULT_LATTICE_RESOLUTION,
            exploration_min_speed: DEFAULT_EXPLORATION_MIN_SPEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_horizon: DEFAULT_MAX_HORIZON,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Default configuration with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Reads overrides from a JSON object, falling back to defaults for
    /// missing or mistyped keys. Points are written as `[x, y]`.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            domain_width: param_f64(params, "domain_width", d.domain_width),
            domain_height: param_f64(params, "domain_height", d.domain_height),
            resolution: param_usize(params, "resolution", d.resolution),
            source: param_point(params, "source", d.source),
            start: param_point(params, "start", d.start),
            max_speed: param_f64(params, "max_speed", d.max_speed),
            energy_capacity: param_f64(params, "energy_capacity", d.energy_capacity),
            propulsion_coefficient: param_f64(
                params,
                "propulsion_coefficient",
                d.propulsion_coefficient,
            ),
            hotel_load: param_f64(params, "hotel_load", d.hotel_load),
            coverage_weight: param_f64(params, "coverage_weight", d.coverage_weight),
            lattice_resolution: param_usize(params, "lattice_resolution", d.lattice_resolution),
            exploration_min_speed: param_f64(
                params,
                "exploration_min_speed",
                d.exploration_min_speed,
            ),
            max_iterations: param_usize(params, "max_iterations", d.max_iterations),
            max_horizon: param_usize(params, "max_horizon", d.max_horizon),
            seed: param_opt_u64(params, "seed", d.seed),
        }
    }

    /// Checks every value is inside its accepted range.
    pub fn validate(&self) -> Result<(), SimError> {
        self.domain()?;
        let finite_nonneg = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {v}"
                )))
            }
        };
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "max_speed must be positive and finite, got {}",
                self.max_speed
            )));
        }
        finite_nonneg("energy_capacity", self.energy_capacity)?;
        finite_nonneg("propulsion_coefficient", self.propulsion_coefficient)?;
        finite_nonneg("hotel_load", self.hotel_load)?;
        finite_nonneg("coverage_weight", self.coverage_weight)?;
        finite_nonneg("exploration_min_speed", self.exploration_min_speed)?;
        if self.exploration_min_speed > self.max_speed {
            return Err(SimError::InvalidConfig(format!(
                "exploration_min_speed {} exceeds max_speed {}",
                self.exploration_min_speed, self.max_speed
            )));
        }
        if !(self.source.is_finite() && self.start.is_finite()) {
            return Err(SimError::InvalidConfig(
                "source and start must be finite points".into(),
            ));
        }
        if self.lattice_resolution == 0 {
            return Err(SimError::InvalidConfig(
                "lattice_resolution must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 || self.max_horizon == 0 {
            return Err(SimError::InvalidConfig(
                "max_iterations and max_horizon must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Builds the sampling lattice described by this config.
    pub fn domain(&self) -> Result<Domain, SimError> {
        Domain::new(self.domain_width, self.domain_height, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_matches_reference_scenario() {
        let c = SimConfig::default();
        assert_eq!(c.domain_width, 100.0);
        assert_eq!(c.resolution, 100);
        assert_eq!(c.source, DVec2::new(50.0, 50.0));
        assert_eq!(c.start, DVec2::new(20.0, 20.0));
        assert_eq!(c.max_speed, 2.0);
        assert_eq!(c.energy_capacity, 1000.0);
        assert_eq!(c.coverage_weight, 10.0);
        assert_eq!(c.seed, None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn from_json_overrides_and_falls_back() {
        let c = SimConfig::from_json(&json!({
            "max_speed": 3,
            "start": [5.0, 6.0],
            "coverage_weight": "heavy",
            "seed": 11
        }));
        assert_eq!(c.max_speed, 3.0);
        assert_eq!(c.start, DVec2::new(5.0, 6.0));
        assert_eq!(c.coverage_weight, 10.0);
        assert_eq!(c.seed, Some(11));
    }

    #[test]
    fn json_round_trip_with_seed() {
        let mut original = SimConfig::seeded(8675309);
        original.max_horizon = 12;
        let text = serde_json::to_string(&original).unwrap();
        let restored: SimConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn partial_json_uses_serde_defaults() {
        let c: SimConfig = serde_json::from_str(r#"{"energy_capacity": 50.0}"#).unwrap();
        assert_eq!(c.energy_capacity, 50.0);
        assert_eq!(c.max_speed, 2.0);
    }

    #[test]
    fn validate_rejects_bad_domain() {
        let c = SimConfig {
            domain_width: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(c.validate(), Err(SimError::InvalidDomain { .. })));
    }

    #[test]
    fn validate_rejects_non_positive_speed() {
        let c = SimConfig {
            max_speed: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(c.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_negative_costs() {
        let c = SimConfig {
            hotel_load: -1.0,
            ..SimConfig::default()
        };
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("hotel_load"));
    }

    #[test]
    fn validate_rejects_exploration_speed_above_cap() {
        let c = SimConfig {
            exploration_min_speed: 3.0,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_caps() {
        let c = SimConfig {
            max_horizon: 0,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
        let c = SimConfig {
            lattice_resolution: 0,
            ..SimConfig::default()
        };
        assert!(c.validate().is_err());
    }
}
