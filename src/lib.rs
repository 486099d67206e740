//! Development needs and site-allocation engine for urban master plans
//!
//! Reads the objects inside a master plan boundary, estimates the resident
//! population, sizes social-infrastructure gaps against fixed norms and
//! produces a phased 15-year project list with site recommendations.

pub mod assumptions;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod planner;
pub mod sample;

pub use assumptions::{Assumptions, AssumptionsError};
pub use error::PlanError;
pub use models::{MasterPlanContext, ObjectRecord};
pub use planner::report::Report;
pub use planner::{CancelToken, Planner};
