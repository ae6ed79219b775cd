#![deny(unsafe_code)]
//! Core types for the plume tracker.
//!
//! Provides the `Field` grid and `Domain` lattice, the analytic plume and
//! current sources, the noisy `FieldGenerator`, the `Surrogate` estimator
//! contract, the `Xorshift64` PRNG, `SimConfig`, and parameter helpers.

pub mod config;
pub mod domain;
pub mod error;
pub mod field;
pub mod generator;
pub mod params;
pub mod prng;
pub mod source;
pub mod surrogate;

pub use config::SimConfig;
pub use domain::Domain;
pub use error::SimError;
pub use field::Field;
pub use generator::{FieldGenerator, FlowField, SensorReading};
pub use glam::DVec2;
pub use prng::Xorshift64;
pub use surrogate::{SensorSample, Surrogate, MIN_FIT_SAMPLES};
