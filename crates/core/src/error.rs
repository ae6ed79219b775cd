//! Error types for the plume tracker core.

use thiserror::Error;

/// Errors produced when building or addressing simulation state.
///
/// Conditions that the control loop is expected to absorb (too few samples
/// to fit, optimizer failure, an exhausted energy budget) are not errors and
/// never appear here.
#[derive(Debug, Error)]
pub enum SimError {
    /// Width or height was zero when creating a Field or grid.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// The physical extent of the domain was not positive and finite.
    #[error("invalid domain extent ({width}, {height}): both sides must be positive and finite")]
    InvalidDomain { width: f64, height: f64 },

    /// Two grids had incompatible dimensions for an element-wise operation.
    #[error("dimension mismatch: ({lhs_w}, {lhs_h}) vs ({rhs_w}, {rhs_h})")]
    DimensionMismatch {
        lhs_w: usize,
        lhs_h: usize,
        rhs_w: usize,
        rhs_h: usize,
    },

    /// A configuration value was outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No simulation is registered under the given session id.
    #[error("unknown session: {0}")]
    UnknownSession(u64),

    /// A previous holder of the session lock panicked mid-operation.
    #[error("session {0} is poisoned")]
    SessionPoisoned(u64),
}
