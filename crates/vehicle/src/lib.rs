#![deny(unsafe_code)]
//! Vehicle kinematics with a speed cap and energy accounting.
//!
//! A [`Vehicle`] integrates velocity commands one step at a time. Commands
//! faster than `max_speed` are rescaled to the cap before anything else
//! happens, and every step charges a quadratic propulsion cost plus a fixed
//! hotel load against a finite energy budget. Once the budget reaches zero
//! the vehicle is no longer operational.
//!
//! Position is never clamped to the sensed domain.

use plume_core::{DVec2, SimConfig};
use tracing::{info, warn};

/// Default speed cap.
const DEFAULT_MAX_SPEED: f64 = 2.0;
/// Default energy budget.
const DEFAULT_ENERGY_CAPACITY: f64 = 1000.0;
/// Default propulsion cost per speed² per unit time.
const DEFAULT_PROPULSION_COEFFICIENT: f64 = 0.1;
/// Default hotel-load cost per unit time.
const DEFAULT_HOTEL_LOAD: f64 = 1.0;

/// Speed cap and energy cost model shared by the vehicle and the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleParams {
    pub max_speed: f64,
    pub energy_capacity: f64,
    pub propulsion_coefficient: f64,
    pub hotel_load: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_MAX_SPEED,
            energy_capacity: DEFAULT_ENERGY_CAPACITY,
            propulsion_coefficient: DEFAULT_PROPULSION_COEFFICIENT,
            hotel_load: DEFAULT_HOTEL_LOAD,
        }
    }
}

impl VehicleParams {
    /// Extracts the vehicle section of a session config.
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            max_speed: config.max_speed,
            energy_capacity: config.energy_capacity,
            propulsion_coefficient: config.propulsion_coefficient,
            hotel_load: config.hotel_load,
        }
    }

    /// Rescales `velocity` to `max_speed` if it is faster, keeping its heading.
    pub fn clamp_velocity(&self, velocity: DVec2) -> DVec2 {
        let speed = velocity.length();
        if speed > self.max_speed {
            velocity * (self.max_speed / speed)
        } else {
            velocity
        }
    }

    /// Energy charged for moving at `speed` for `dt`.
    pub fn energy_cost(&self, speed: f64, dt: f64) -> f64 {
        self.propulsion_coefficient * speed * speed * dt + self.hotel_load * dt
    }
}

/// A single vehicle with position, energy budget, and append-only histories.
#[derive(Debug, Clone)]
pub struct Vehicle {
    params: VehicleParams,
    position: DVec2,
    energy: f64,
    trajectory: Vec<DVec2>,
    energy_history: Vec<f64>,
}

impl Vehicle {
    /// Places a fully charged vehicle at `start`.
    pub fn new(start: DVec2, params: VehicleParams) -> Self {
        Self {
            params,
            position: start,
            energy: params.energy_capacity,
            trajectory: vec![start],
            energy_history: vec![params.energy_capacity],
        }
    }

    /// Builds the vehicle described by `config`, placed at `config.start`.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.start, VehicleParams::from_config(config))
    }

    /// Applies one velocity command for `dt` and returns the new position.
    ///
    /// The command is first clamped to `max_speed`; the energy charge uses
    /// the clamped speed and never drives the budget below zero. A
    /// non-finite command is treated as holding station.
    pub fn drive(&mut self, velocity: DVec2, dt: f64) -> DVec2 {
        let velocity = if velocity.is_finite() {
            self.params.clamp_velocity(velocity)
        } else {
            warn!(?velocity, "non-finite velocity command, holding station");
            DVec2::ZERO
        };
        let speed = velocity.length();

        self.position += velocity * dt;

        let was_operational = self.is_operational();
        self.energy = (self.energy - self.params.energy_cost(speed, dt)).max(0.0);
        if was_operational && !self.is_operational() {
            info!(position = ?self.position, "energy budget exhausted");
        }

        self.trajectory.push(self.position);
        self.energy_history.push(self.energy);
        self.position
    }

    /// Administrative override: teleports the vehicle to `position`.
    ///
    /// This is not physical motion. It skips the speed cap, charges no
    /// energy, and appends to the trajectory only. The energy history is
    /// left as is, so after `k` overrides the trajectory holds `k` more
    /// entries than the energy history and the two are no longer
    /// index-aligned.
    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
        self.trajectory.push(position);
    }

    /// True while energy remains. The sole termination predicate of the
    /// control loop.
    pub fn is_operational(&self) -> bool {
        self.energy > 0.0
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn max_speed(&self) -> f64 {
        self.params.max_speed
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    /// Every position held so far, starting with the construction point.
    pub fn trajectory(&self) -> &[DVec2] {
        &self.trajectory
    }

    /// Energy after construction and after each `drive`.
    pub fn energy_history(&self) -> &[f64] {
        &self.energy_history
    }
}
