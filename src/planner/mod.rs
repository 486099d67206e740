//! Development needs and site allocation pipeline
//!
//! Stages run strictly forward: inventory, population, needs, demand,
//! eligibility/assignment, phases, report. Each stage only reads the output
//! of the stages before it.

pub mod assignment;
pub mod demand;
pub mod eligibility;
pub mod inventory;
pub mod needs;
pub mod phases;
pub mod population;
pub mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::assumptions::Assumptions;
use crate::error::PlanError;
use crate::models::{Action, Eligibility, MasterPlanContext, ObjectRecord, Project, ServiceType};
use crate::planner::assignment::SiteAllocator;
use crate::planner::report::{Report, ReportParts};

/// Caller-controlled cancellation, checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Issues `PRJ-001`, `PRJ-002`, ... within one report
#[derive(Debug, Default)]
struct ProjectIds {
    next: u32,
}

impl ProjectIds {
    fn issue(&mut self) -> String {
        self.next += 1;
        format!("PRJ-{:03}", self.next)
    }
}

pub struct Planner {
    assumptions: Assumptions,
    cancel: CancelToken,
}

impl Planner {
    pub fn new(assumptions: Assumptions) -> Result<Self, PlanError> {
        assumptions.validate()?;
        Ok(Self {
            assumptions,
            cancel: CancelToken::default(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    fn checkpoint(&self, stage: &'static str) -> Result<(), PlanError> {
        if self.cancel.is_cancelled() {
            warn!(stage, "report generation cancelled");
            return Err(PlanError::Cancelled { stage });
        }
        Ok(())
    }

    /// Build the 15-year development report for the objects of one plan.
    ///
    /// Identical inputs always yield identical reports apart from
    /// `generated_at`.
    pub fn generate(
        &self,
        plan: &MasterPlanContext,
        objects: &[ObjectRecord],
        generated_at: NaiveDate,
    ) -> Result<Report, PlanError> {
        let a = &self.assumptions;
        info!(
            plan_id = plan.id,
            plan = %plan.name,
            area_m2 = ?plan.area_m2,
            objects = objects.len(),
            "generating development report"
        );

        self.checkpoint("inventory")?;
        let inventory = inventory::aggregate(objects);
        let mut questions = Vec::new();

        self.checkpoint("population")?;
        let population = population::estimate(&inventory, a);
        info!(
            population = ?population.population,
            source = ?population.source,
            "population estimated"
        );
        questions.extend(population.questions.iter().cloned());

        self.checkpoint("needs")?;
        let needs = needs::assess(&inventory, population.population, a);

        self.checkpoint("demand")?;
        let demand = demand::translate(&inventory, population.population, &needs, a);
        questions.extend(demand.questions.iter().cloned());

        self.checkpoint("assignment")?;
        let mut allocator = SiteAllocator::new(objects, a);
        let mut ids = ProjectIds::default();
        let mut projects = Vec::new();

        for batch in &demand.demands {
            for _ in 0..batch.new_projects {
                let site = allocator.assign(batch.service_type, batch.action);

                if site.target.is_none() && !batch.mandatory {
                    warn!(service = %batch.service_type, "optional project dropped: no eligible site");
                    questions.push(format!(
                        "A {} expansion was considered but no eligible existing facility was \
                         found; please confirm whether it is still needed.",
                        batch.service_type
                    ));
                    continue;
                }

                let project_id = ids.issue();
                let action = match (batch.action, site.target) {
                    (Action::NewBuild, Some(t))
                        if batch.service_type == ServiceType::ParkingMultilevel
                            && objects[t].parking_spaces_total.is_some_and(|n| n > 0) =>
                    {
                        Action::Expand
                    }
                    (action, _) => action,
                };

                let mut eligibility = site.eligibility;
                let mut required_interventions = site.required_interventions;
                if batch.action == Action::Expand && eligibility == Eligibility::BuildNow {
                    eligibility = Eligibility::Conditional;
                }
                if batch.action == Action::Expand && eligibility == Eligibility::Conditional {
                    required_interventions.push(
                        "confirm service throughput and catchment data before expanding"
                            .to_string(),
                    );
                }

                if site.target.is_none() {
                    warn!(project = %project_id, service = %batch.service_type, "no eligible site");
                    questions.push(format!(
                        "{project_id} ({}): no eligible site among the plan's objects; every \
                         candidate lies in a protected, heritage or flood zone, or there is no \
                         candidate object at all. Please propose \
                         additional land or confirm zoning constraints.",
                        batch.service_type
                    ));
                }

                projects.push(Project {
                    project_id,
                    service_type: batch.service_type,
                    action,
                    capacity_added: batch.capacity_added(),
                    target_object_id: site.target.map(|i| objects[i].object_id.clone()),
                    backup_object_ids: site
                        .backups
                        .iter()
                        .map(|&i| objects[i].object_id.clone())
                        .collect(),
                    eligibility,
                    why_this_object: site.why_this_object,
                    required_interventions,
                });
            }
        }

        if !inventory.malformed.is_empty() {
            let listed: Vec<String> = inventory
                .malformed
                .iter()
                .map(|(id, field)| format!("{id}.{field}"))
                .collect();
            questions.push(format!(
                "{} field value(s) could not be parsed and were treated as 0: {}. Please verify \
                 the source data.",
                listed.len(),
                listed.join(", ")
            ));
        }

        self.checkpoint("phases")?;
        let phases = phases::schedule(projects, &needs, a);

        self.checkpoint("report")?;
        let report = report::assemble(ReportParts {
            masterplan_name: &plan.name,
            generated_at,
            assumptions: a,
            inventory: &inventory,
            population: &population,
            needs: &needs,
            phases,
            questions,
        });
        report::verify_contract(&report, &demand, objects)?;

        info!(
            projects = report.projects().count(),
            questions = report.questions.len(),
            "development report ready"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> MasterPlanContext {
        MasterPlanContext {
            id: 1,
            name: "Test plan".to_string(),
            area_m2: Some(250_000.0),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn lot(id: &str, transit: u32) -> ObjectRecord {
        ObjectRecord {
            object_id: id.to_string(),
            object_type: "building".to_string(),
            function_type: Some("vacant_lot".to_string()),
            power_connected: Some(true),
            water_connected: Some(true),
            sewer_connected: Some(true),
            available_power_capacity_kw: Some(150.0),
            distance_public_transport_m: Some(transit),
            distance_primary_road_m: Some(20),
            ..Default::default()
        }
    }

    #[test]
    fn project_ids_are_sequential() {
        let mut ids = ProjectIds::default();
        assert_eq!(ids.issue(), "PRJ-001");
        assert_eq!(ids.issue(), "PRJ-002");
    }

    #[test]
    fn cancelled_token_aborts_without_report() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let planner = Planner::new(Assumptions::default())
            .unwrap()
            .with_cancel(cancel);
        let err = planner.generate(&plan(), &[], date()).unwrap_err();
        assert!(matches!(err, PlanError::Cancelled { stage: "inventory" }));
    }

    #[test]
    fn expired_deadline_cancels() {
        let cancel = CancelToken::with_timeout(Duration::ZERO);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn invalid_assumptions_are_refused() {
        let mut a = Assumptions::default();
        a.school_age_share = 0.0;
        assert!(matches!(
            Planner::new(a),
            Err(PlanError::InvalidAssumptions(_))
        ));
    }

    #[test]
    fn parking_on_existing_car_park_becomes_expansion() {
        let mut flats = lot("flats", 100);
        flats.function_type = Some("residential_apartment".to_string());
        flats.unit_count = Some(1000);
        let mut school = lot("school", 10);
        school.function_type = Some("education_school".to_string());
        school.student_capacity = Some(600);
        let mut kindergarten = lot("kindergarten", 10);
        kindergarten.function_type = Some("education_kindergarten".to_string());
        kindergarten.student_capacity = Some(200);
        let mut car_park = lot("car-park", 50);
        car_park.parking_spaces_total = Some(40);
        let objects = vec![
            flats,
            school,
            kindergarten,
            car_park,
            lot("lot-a", 300),
            lot("lot-b", 400),
        ];

        let report = Planner::new(Assumptions::default())
            .unwrap()
            .generate(&plan(), &objects, date())
            .unwrap();
        let parking: Vec<_> = report
            .projects()
            .filter(|p| p.service_type == ServiceType::ParkingMultilevel)
            .collect();
        // 1000 units * 0.35 = 350 required, 40 present -> 310 gap -> 2 projects
        assert_eq!(parking.len(), 2);
        assert_eq!(parking[0].target_object_id.as_deref(), Some("car-park"));
        assert_eq!(parking[0].action, Action::Expand);
        assert_eq!(parking[1].action, Action::NewBuild);
    }

    #[test]
    fn clinic_expansion_is_conditional() {
        let mut flats = lot("flats", 100);
        flats.function_type = Some("residential_apartment".to_string());
        flats.unit_count = Some(6000);
        let mut clinic = lot("clinic", 80);
        clinic.function_type = Some("health_clinic".to_string());
        clinic.capacity_people_max = Some(500);
        let objects = vec![flats, clinic, lot("lot-a", 300)];

        let report = Planner::new(Assumptions::default())
            .unwrap()
            .generate(&plan(), &objects, date())
            .unwrap();
        let expansion = report
            .projects()
            .find(|p| p.service_type == ServiceType::Clinic)
            .unwrap();
        assert_eq!(expansion.action, Action::Expand);
        assert_eq!(expansion.eligibility, Eligibility::Conditional);
        assert_eq!(expansion.target_object_id.as_deref(), Some("clinic"));
        assert!(!expansion.required_interventions.is_empty());
        assert!(report.questions.iter().any(|q| q.contains("clinic expansion")));
    }
}
