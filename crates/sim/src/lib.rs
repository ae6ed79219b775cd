#![deny(unsafe_code)]
//! Simulation orchestrator for the plume tracker.
//!
//! A [`Simulation`] wires one [`FieldGenerator`](plume_core::FieldGenerator),
//! one vehicle, one estimator and one planner into the sense, fit, plan, act
//! loop and exposes it as `step`, `run`, `query_field`, `state`,
//! `set_position` and `reset`. [`SessionRegistry`] hosts many independent
//! simulations behind per-session locks.

pub mod registry;
pub mod report;
mod simulation;

pub use registry::{SessionId, SessionRegistry};
pub use report::{FieldView, RunReport, SimState, SimStatus, StepOutcome, StepReport, StepSummary};
pub use simulation::Simulation;
