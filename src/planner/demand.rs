//! Translate capacity gaps into whole numbers of projects

use crate::assumptions::Assumptions;
use crate::models::{Action, CapacityAdded, ServiceType};
use crate::planner::inventory::Inventory;
use crate::planner::needs::NeedsAssessment;

/// A batch of identical projects for one service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDemand {
    pub service_type: ServiceType,
    pub action: Action,
    pub new_projects: u32,
    pub capacity_per_project: u64,
    /// Mandatory demands must be emitted even without a feasible site
    pub mandatory: bool,
    /// Gap the batch closes, in service units
    pub gap: f64,
}

impl ServiceDemand {
    pub fn capacity_added(&self) -> CapacityAdded {
        CapacityAdded::for_service(self.service_type, self.capacity_per_project)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandPlan {
    pub demands: Vec<ServiceDemand>,
    pub questions: Vec<String>,
}

impl DemandPlan {
    pub fn new_projects(&self, service: ServiceType) -> u32 {
        self.demands
            .iter()
            .filter(|d| d.service_type == service)
            .map(|d| d.new_projects)
            .sum()
    }
}

/// Smallest project count whose combined capacity covers the gap
pub fn projects_for_gap(gap: f64, unit_capacity: u32) -> u32 {
    if gap <= 0.0 {
        return 0;
    }
    (gap / f64::from(unit_capacity)).ceil() as u32
}

fn capacity_demand(service: ServiceType, gap: f64, unit_capacity: u32) -> Option<ServiceDemand> {
    let new_projects = projects_for_gap(gap, unit_capacity);
    (new_projects > 0).then(|| ServiceDemand {
        service_type: service,
        action: Action::NewBuild,
        new_projects,
        capacity_per_project: u64::from(unit_capacity),
        mandatory: true,
        gap,
    })
}

/// Project counts in service order: school, kindergarten, clinic, parking,
/// green space.
pub fn translate(
    inv: &Inventory,
    population: Option<u64>,
    needs: &NeedsAssessment,
    a: &Assumptions,
) -> DemandPlan {
    let mut plan = DemandPlan::default();
    let Some(pop) = population else {
        return plan;
    };

    plan.demands.extend(capacity_demand(
        ServiceType::School,
        needs.school_seats.gap,
        a.school_unit_capacity,
    ));
    plan.demands.extend(capacity_demand(
        ServiceType::Kindergarten,
        needs.kindergarten_seats.gap,
        a.kindergarten_unit_capacity,
    ));

    let threshold = u64::from(a.clinic_forced_population_threshold);
    if inv.clinic_capacity_total == 0 {
        if pop > threshold {
            plan.demands.push(ServiceDemand {
                service_type: ServiceType::Clinic,
                action: Action::NewBuild,
                new_projects: 1,
                capacity_per_project: u64::from(a.clinic_unit_capacity),
                mandatory: true,
                gap: f64::from(a.clinic_unit_capacity),
            });
        }
    } else {
        let served = inv.clinic_capacity_total as f64 * a.clinic_population_multiplier;
        if pop > threshold && pop as f64 > served {
            let shortfall = ((pop as f64 / a.clinic_population_multiplier).ceil() as u64)
                .saturating_sub(inv.clinic_capacity_total)
                .max(1);
            plan.demands.push(ServiceDemand {
                service_type: ServiceType::Clinic,
                action: Action::Expand,
                new_projects: 1,
                capacity_per_project: shortfall,
                mandatory: false,
                gap: shortfall as f64,
            });
            plan.questions.push(format!(
                "Existing clinics ({} capacity) appear to serve about {} residents against an \
                 estimated {pop}; a conditional clinic expansion is proposed. Please confirm clinic \
                 throughput and catchment data.",
                inv.clinic_capacity_total,
                served.round() as u64
            ));
        }
    }

    plan.demands.extend(capacity_demand(
        ServiceType::ParkingMultilevel,
        needs.parking_spaces.gap,
        a.parking_multilevel_capacity,
    ));

    let green_gap = needs.green_objects.gap.ceil() as u32;
    if green_gap > 0 {
        plan.demands.push(ServiceDemand {
            service_type: ServiceType::GreenSpace,
            action: Action::Convert,
            new_projects: green_gap,
            capacity_per_project: 1,
            mandatory: true,
            gap: needs.green_objects.gap,
        });
    }

    plan
}
