//! Report structure, assembly and contract checks

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::error::PlanError;
use crate::models::{CapacityAdded, ObjectRecord, Phase, ServiceType};
use crate::planner::demand::DemandPlan;
use crate::planner::inventory::Inventory;
use crate::planner::needs::NeedsAssessment;
use crate::planner::population::{PopulationEstimate, PopulationSource};

/// Keys every serialized report must carry
pub const REPORT_TOP_LEVEL_KEYS: [&str; 7] = [
    "masterplan_name",
    "generated_at",
    "assumptions",
    "baseline",
    "needs_15y",
    "phases",
    "questions",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacities {
    pub school_seats_total: u64,
    pub kindergarten_seats_total: u64,
    pub hospital_beds_total: u64,
    pub clinic_capacity_total: u64,
    pub parking_spaces_total: u64,
    pub green_objects_total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub objects_total: u64,
    pub housing_units_total: u64,
    pub population_estimated: Option<u64>,
    pub population_source: Option<String>,
    pub capacities: Capacities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Required {
    pub school_seats: Option<f64>,
    pub kindergarten_seats: Option<f64>,
    pub parking_spaces: Option<f64>,
    pub green_objects: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gaps {
    pub school_seats_gap: f64,
    pub kindergarten_seats_gap: f64,
    pub parking_spaces_gap: f64,
    pub green_objects_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub service_type: ServiceType,
    pub new_projects: u32,
    pub capacity_added: CapacityAdded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Needs15y {
    pub required: Required,
    pub gaps: Gaps,
    pub projects_summary: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub masterplan_name: String,
    pub generated_at: NaiveDate,
    pub assumptions: Assumptions,
    pub baseline: Baseline,
    pub needs_15y: Needs15y,
    pub phases: Vec<Phase>,
    pub questions: Vec<String>,
}

impl Report {
    pub fn projects(&self) -> impl Iterator<Item = &crate::models::Project> {
        self.phases.iter().flat_map(|p| p.projects.iter())
    }
}

/// Everything the assembler needs from earlier stages
pub struct ReportParts<'a> {
    pub masterplan_name: &'a str,
    pub generated_at: NaiveDate,
    pub assumptions: &'a Assumptions,
    pub inventory: &'a Inventory,
    pub population: &'a PopulationEstimate,
    pub needs: &'a NeedsAssessment,
    pub phases: Vec<Phase>,
    pub questions: Vec<String>,
}

fn source_label(source: PopulationSource) -> &'static str {
    match source {
        PopulationSource::Housing => "housing",
        PopulationSource::SchoolSeats => "school_seats",
        PopulationSource::KindergartenSeats => "kindergarten_seats",
        PopulationSource::ClinicCapacity => "clinic_capacity",
    }
}

/// Round to the hundredth for display. A positive value that would round to
/// zero is kept exact so an open gap never reads as closed.
pub fn reported(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 && value > 0.0 {
        value
    } else {
        rounded
    }
}

pub fn assemble(parts: ReportParts<'_>) -> Report {
    let inv = parts.inventory;
    let needs = parts.needs;

    let projects_summary = ServiceType::ALL
        .iter()
        .map(|&service| {
            let of_service = || {
                parts
                    .phases
                    .iter()
                    .flat_map(|p| p.projects.iter())
                    .filter(move |p| p.service_type == service)
            };
            ProjectSummary {
                service_type: service,
                new_projects: of_service().count() as u32,
                capacity_added: CapacityAdded::for_service(
                    service,
                    of_service().map(|p| p.capacity_added.amount()).sum(),
                ),
            }
        })
        .collect();

    Report {
        masterplan_name: parts.masterplan_name.to_string(),
        generated_at: parts.generated_at,
        assumptions: parts.assumptions.clone(),
        baseline: Baseline {
            objects_total: inv.objects_total,
            housing_units_total: inv.housing_units_total,
            population_estimated: parts.population.population,
            population_source: parts.population.source.map(|s| source_label(s).to_string()),
            capacities: Capacities {
                school_seats_total: inv.school_seats_total,
                kindergarten_seats_total: inv.kindergarten_seats_total,
                hospital_beds_total: inv.hospital_beds_total,
                clinic_capacity_total: inv.clinic_capacity_total,
                parking_spaces_total: inv.parking_spaces_total,
                green_objects_total: inv.green_objects_total,
            },
        },
        needs_15y: Needs15y {
            required: Required {
                school_seats: needs.school_seats.required.map(reported),
                kindergarten_seats: needs.kindergarten_seats.required.map(reported),
                parking_spaces: needs.parking_spaces.required.map(reported),
                green_objects: needs.green_objects.required.map(reported),
            },
            gaps: Gaps {
                school_seats_gap: reported(needs.school_seats.gap),
                kindergarten_seats_gap: reported(needs.kindergarten_seats.gap),
                parking_spaces_gap: reported(needs.parking_spaces.gap),
                green_objects_gap: reported(needs.green_objects.gap),
            },
            projects_summary,
        },
        phases: parts.phases,
        questions: parts.questions,
    }
}

/// Check the structural guarantees of a finished report.
///
/// Every open gap and every mandatory demand must have a project of its
/// service, and every referenced object must come from the input list.
pub fn verify_contract(
    report: &Report,
    demand: &DemandPlan,
    objects: &[ObjectRecord],
) -> Result<(), PlanError> {
    if report.phases.len() != 3 {
        return Err(PlanError::ContractViolation(format!(
            "expected 3 phases, found {}",
            report.phases.len()
        )));
    }

    let gaps = &report.needs_15y.gaps;
    let mut expected: BTreeSet<ServiceType> = [
        (ServiceType::School, gaps.school_seats_gap),
        (ServiceType::Kindergarten, gaps.kindergarten_seats_gap),
        (ServiceType::ParkingMultilevel, gaps.parking_spaces_gap),
        (ServiceType::GreenSpace, gaps.green_objects_gap),
    ]
    .into_iter()
    .filter(|(_, gap)| *gap > 0.0)
    .map(|(service, _)| service)
    .collect();
    expected.extend(demand.demands.iter().filter(|d| d.mandatory).map(|d| d.service_type));

    for service in expected {
        if !report.projects().any(|p| p.service_type == service) {
            return Err(PlanError::ContractViolation(format!(
                "open {service} demand has no project"
            )));
        }
    }

    let known: BTreeSet<&str> = objects.iter().map(|o| o.object_id.as_str()).collect();
    for project in report.projects() {
        let referenced = project
            .target_object_id
            .iter()
            .chain(project.backup_object_ids.iter());
        for id in referenced {
            if !known.contains(id.as_str()) {
                return Err(PlanError::ContractViolation(format!(
                    "{} references unknown object {id}",
                    project.project_id
                )));
            }
        }
    }

    Ok(())
}

/// Reject a serialized report that lacks any mandatory top-level key
pub fn validate_top_level(value: &serde_json::Value) -> anyhow::Result<()> {
    let Some(map) = value.as_object() else {
        anyhow::bail!("report must be a JSON object");
    };
    let missing: Vec<&str> = REPORT_TOP_LEVEL_KEYS
        .iter()
        .copied()
        .filter(|key| !map.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("report missing required keys: {}", missing.join(", "));
    }
    Ok(())
}
