//! Serializable snapshots handed back to callers.

use plume_core::{DVec2, Domain, Field, FlowField};
use serde::Serialize;

/// Concentration and current grids with their coordinate axes, laid out as
/// nested rows (`rows[y][x]`) for external rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub time_step: u64,
    pub concentration: Vec<Vec<f64>>,
    pub u: Vec<Vec<f64>>,
    pub v: Vec<Vec<f64>>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl FieldView {
    pub fn new(domain: &Domain, concentration: &Field, flow: &FlowField, time_step: u64) -> Self {
        Self {
            time_step,
            concentration: concentration.to_rows(),
            u: flow.u.to_rows(),
            v: flow.v.to_rows(),
            xs: domain.xs().to_vec(),
            ys: domain.ys().to_vec(),
        }
    }
}

/// Lifecycle of a simulation. `Depleted` is terminal until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimStatus {
    Active,
    Depleted,
}

/// Result of one successful tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Position after the move.
    pub position: DVec2,
    /// Concentration read at the pre-move position.
    pub concentration: f64,
    pub energy: f64,
    /// Time step after the tick.
    pub time_step: u64,
    /// Whether the command came from the optimizer rather than exploration.
    pub optimized: bool,
    /// Fresh field realization at the new time step.
    pub field: FieldView,
}

/// Outcome of [`Simulation::step`](crate::Simulation::step).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Advanced(StepReport),
    /// The vehicle had no energy left; nothing was mutated.
    Depleted { time_step: u64 },
}

impl StepOutcome {
    pub fn report(&self) -> Option<&StepReport> {
        match self {
            StepOutcome::Advanced(report) => Some(report),
            StepOutcome::Depleted { .. } => None,
        }
    }

    pub fn is_depleted(&self) -> bool {
        matches!(self, StepOutcome::Depleted { .. })
    }
}

/// Per-step summary produced by [`Simulation::run`](crate::Simulation::run).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepSummary {
    /// Time step after the tick.
    pub step: u64,
    pub position: DVec2,
    pub concentration: f64,
    pub energy: f64,
}

impl From<&StepReport> for StepSummary {
    fn from(report: &StepReport) -> Self {
        Self {
            step: report.time_step,
            position: report.position,
            concentration: report.concentration,
            energy: report.energy,
        }
    }
}

/// Outcome of [`Simulation::run`](crate::Simulation::run).
///
/// `status` is the lifecycle after the last attempted tick. A run that was
/// cut short, or refused outright, by an empty battery reports
/// [`SimStatus::Depleted`] even when `summaries` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub summaries: Vec<StepSummary>,
    pub status: SimStatus,
}

impl RunReport {
    pub fn is_depleted(&self) -> bool {
        self.status == SimStatus::Depleted
    }

    /// Number of ticks that actually ran.
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn last(&self) -> Option<&StepSummary> {
        self.summaries.last()
    }
}

/// Full state snapshot for display and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimState {
    pub position: DVec2,
    pub trajectory: Vec<DVec2>,
    pub energy: f64,
    pub energy_history: Vec<f64>,
    pub time_step: u64,
    pub sample_count: usize,
    pub operational: bool,
    pub status: SimStatus,
}
