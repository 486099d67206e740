//! Errors raised by the planner

use thiserror::Error;

use crate::assumptions::AssumptionsError;

/// Hard failures of a report generation call.
///
/// Recoverable conditions (missing population signal, infeasible sites,
/// malformed fields) never surface here; they become report questions.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("report generation cancelled before stage `{stage}`")]
    Cancelled { stage: &'static str },

    #[error(transparent)]
    InvalidAssumptions(#[from] AssumptionsError),

    #[error("contract violation: {0}")]
    ContractViolation(String),
}
