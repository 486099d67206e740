//! Planning assumptions shared by every stage of the planner

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssumptionsError {
    #[error("failed to read assumptions file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse assumptions file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid assumption `{name}` = {value}: {reason}")]
    Invalid {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Tunable constants for population, demand and siting rules.
///
/// Loaded as one block; keys missing from a TOML override keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    pub avg_household_size: f64,
    pub school_age_share: f64,
    pub kindergarten_age_share: f64,
    pub kindergarten_coverage: f64,
    pub school_unit_capacity: u32,
    pub kindergarten_unit_capacity: u32,
    pub parking_spaces_per_unit: f64,
    pub parking_multilevel_capacity: u32,
    pub env_risk_max: f64,
    pub park_rule_people_per_green_object: u32,

    /// Residents served per unit of clinic capacity, used both to estimate
    /// population from clinics and to judge existing clinic coverage
    pub clinic_population_multiplier: f64,
    pub clinic_forced_population_threshold: u32,
    pub clinic_unit_capacity: u32,
    pub min_power_capacity_kw: f64,
    /// Kindergarten gap (seats) that pulls one kindergarten into phase 1-3
    pub kindergarten_urgent_gap_seats: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            avg_household_size: 3.6,
            school_age_share: 0.14,
            kindergarten_age_share: 0.07,
            kindergarten_coverage: 0.60,
            school_unit_capacity: 900,
            kindergarten_unit_capacity: 240,
            parking_spaces_per_unit: 0.35,
            parking_multilevel_capacity: 300,
            env_risk_max: 0.60,
            park_rule_people_per_green_object: 12000,
            clinic_population_multiplier: 2.5,
            clinic_forced_population_threshold: 15000,
            clinic_unit_capacity: 250,
            min_power_capacity_kw: 50.0,
            kindergarten_urgent_gap_seats: 240.0,
        }
    }
}

impl Assumptions {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, AssumptionsError> {
        let assumptions: Assumptions =
            toml::from_str(text).map_err(|source| AssumptionsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        assumptions.validate()?;
        Ok(assumptions)
    }

    pub fn load(path: &Path) -> Result<Self, AssumptionsError> {
        let text = fs::read_to_string(path).map_err(|source| AssumptionsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Defaults, or the file's values layered over them
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AssumptionsError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), AssumptionsError> {
        let positive = [
            ("avg_household_size", self.avg_household_size),
            ("parking_spaces_per_unit", self.parking_spaces_per_unit),
            ("clinic_population_multiplier", self.clinic_population_multiplier),
            ("school_unit_capacity", f64::from(self.school_unit_capacity)),
            ("kindergarten_unit_capacity", f64::from(self.kindergarten_unit_capacity)),
            ("parking_multilevel_capacity", f64::from(self.parking_multilevel_capacity)),
            (
                "park_rule_people_per_green_object",
                f64::from(self.park_rule_people_per_green_object),
            ),
            ("clinic_unit_capacity", f64::from(self.clinic_unit_capacity)),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AssumptionsError::Invalid {
                    name,
                    value,
                    reason: "must be greater than zero",
                });
            }
        }

        let shares = [
            ("school_age_share", self.school_age_share),
            ("kindergarten_age_share", self.kindergarten_age_share),
            ("kindergarten_coverage", self.kindergarten_coverage),
        ];
        for (name, value) in shares {
            if !(value > 0.0 && value <= 1.0) {
                return Err(AssumptionsError::Invalid {
                    name,
                    value,
                    reason: "must be a share in (0, 1]",
                });
            }
        }

        if !(0.0..=1.0).contains(&self.env_risk_max) {
            return Err(AssumptionsError::Invalid {
                name: "env_risk_max",
                value: self.env_risk_max,
                reason: "must be within [0, 1]",
            });
        }

        let non_negative = [
            ("min_power_capacity_kw", self.min_power_capacity_kw),
            ("kindergarten_urgent_gap_seats", self.kindergarten_urgent_gap_seats),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AssumptionsError::Invalid {
                    name,
                    value,
                    reason: "must not be negative",
                });
            }
        }

        Ok(())
    }
}
