//! 15-year required capacities and gaps per service

use serde::Serialize;

use crate::assumptions::Assumptions;
use crate::planner::inventory::Inventory;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ServiceGap {
    pub required: Option<f64>,
    pub current_total: f64,
    pub gap: f64,
}

impl ServiceGap {
    fn unknown(current_total: u64) -> Self {
        Self {
            required: None,
            current_total: current_total as f64,
            gap: 0.0,
        }
    }

    /// Exact values; rounding happens only when the report is assembled
    fn from_required(required: f64, current_total: u64) -> Self {
        let current_total = current_total as f64;
        Self {
            required: Some(required),
            current_total,
            gap: (required - current_total).max(0.0),
        }
    }

    pub fn is_open(&self) -> bool {
        self.gap > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NeedsAssessment {
    pub school_seats: ServiceGap,
    pub kindergarten_seats: ServiceGap,
    pub parking_spaces: ServiceGap,
    pub green_objects: ServiceGap,
}

pub fn assess(inv: &Inventory, population: Option<u64>, a: &Assumptions) -> NeedsAssessment {
    let Some(pop) = population else {
        return NeedsAssessment {
            school_seats: ServiceGap::unknown(inv.school_seats_total),
            kindergarten_seats: ServiceGap::unknown(inv.kindergarten_seats_total),
            parking_spaces: ServiceGap::unknown(inv.parking_spaces_total),
            green_objects: ServiceGap::unknown(inv.green_objects_total),
        };
    };
    let pop = pop as f64;

    let households = if inv.housing_units_total > 0 {
        inv.housing_units_total as f64
    } else {
        pop / a.avg_household_size
    };
    let green_required = (pop / f64::from(a.park_rule_people_per_green_object)).ceil();

    NeedsAssessment {
        school_seats: ServiceGap::from_required(pop * a.school_age_share, inv.school_seats_total),
        kindergarten_seats: ServiceGap::from_required(
            pop * a.kindergarten_age_share * a.kindergarten_coverage,
            inv.kindergarten_seats_total,
        ),
        parking_spaces: ServiceGap::from_required(
            households * a.parking_spaces_per_unit,
            inv.parking_spaces_total,
        ),
        green_objects: ServiceGap::from_required(green_required, inv.green_objects_total),
    }
}
