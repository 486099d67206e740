//! Population estimate via a prioritised fallback cascade

use serde::Serialize;

use crate::assumptions::Assumptions;
use crate::planner::inventory::Inventory;

/// Which signal the estimate was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationSource {
    Housing,
    SchoolSeats,
    KindergartenSeats,
    ClinicCapacity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationEstimate {
    pub population: Option<u64>,
    pub source: Option<PopulationSource>,
    pub questions: Vec<String>,
}

fn whole_persons(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

/// Estimate residents from the first available signal: housing units, then
/// school seats, kindergarten seats, clinic capacity.
pub fn estimate(inv: &Inventory, a: &Assumptions) -> PopulationEstimate {
    if inv.housing_units_total > 0 {
        return PopulationEstimate {
            population: Some(whole_persons(
                inv.housing_units_total as f64 * a.avg_household_size,
            )),
            source: Some(PopulationSource::Housing),
            questions: Vec::new(),
        };
    }

    if inv.school_seats_total > 0 {
        let pop = whole_persons(inv.school_seats_total as f64 / a.school_age_share);
        return PopulationEstimate {
            population: Some(pop),
            source: Some(PopulationSource::SchoolSeats),
            questions: vec![format!(
                "No housing units recorded: population ({pop}) was estimated from {} school seats \
                 at a school-age share of {}. Please provide housing unit counts or a census figure.",
                inv.school_seats_total, a.school_age_share
            )],
        };
    }

    if inv.kindergarten_seats_total > 0 {
        let pop = whole_persons(
            inv.kindergarten_seats_total as f64
                / (a.kindergarten_age_share * a.kindergarten_coverage),
        );
        return PopulationEstimate {
            population: Some(pop),
            source: Some(PopulationSource::KindergartenSeats),
            questions: vec![format!(
                "No housing units or school seats recorded: population ({pop}) was estimated from {} \
                 kindergarten seats (age share {}, coverage {}). Please provide housing unit counts \
                 or a census figure.",
                inv.kindergarten_seats_total, a.kindergarten_age_share, a.kindergarten_coverage
            )],
        };
    }

    if inv.clinic_capacity_total > 0 {
        let pop = whole_persons(inv.clinic_capacity_total as f64 * a.clinic_population_multiplier);
        return PopulationEstimate {
            population: Some(pop),
            source: Some(PopulationSource::ClinicCapacity),
            questions: vec![format!(
                "Population ({pop}) is a rough estimate: clinic capacity of {} multiplied by {}. \
                 This multiplier is a coarse proxy; please provide housing unit counts or a census figure.",
                inv.clinic_capacity_total, a.clinic_population_multiplier
            )],
        };
    }

    PopulationEstimate {
        population: None,
        source: None,
        questions: vec![
            "Population could not be estimated: no housing units, school seats, kindergarten seats \
             or clinic capacity were found. Please provide the resident population or the number \
             of housing units for this master plan."
                .to_string(),
        ],
    }
}
