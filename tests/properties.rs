//! Invariants that must hold for any object list

use chrono::NaiveDate;
use proptest::prelude::*;

use devplan::models::Eligibility;
use devplan::planner::assignment::rank_sites;
use devplan::planner::demand::projects_for_gap;
use devplan::{Assumptions, MasterPlanContext, ObjectRecord, Planner};

const FUNCTIONS: [&str; 8] = [
    "residential_apartment",
    "education_school",
    "education_kindergarten",
    "health_clinic",
    "health_hospital",
    "vacant_lot",
    "industrial_warehouse",
    "parking_surface",
];

fn arb_object() -> impl Strategy<Value = ObjectRecord> {
    (
        0..FUNCTIONS.len(),
        proptest::option::of(0u32..3000),
        proptest::option::of(0u32..2000),
        proptest::option::of(0u32..500),
        proptest::option::of(0u32..1500),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0.0f64..1.0),
        any::<bool>(),
    )
        .prop_map(
            |(function, units, seats, capacity, transit, protected, power, risk, green)| {
                ObjectRecord {
                    object_type: if green { "green_space" } else { "building" }.to_string(),
                    function_type: Some(FUNCTIONS[function].to_string()),
                    unit_count: units,
                    student_capacity: seats,
                    capacity_people_max: capacity,
                    parking_spaces_total: capacity,
                    distance_public_transport_m: transit,
                    protected_zone: protected,
                    power_connected: power,
                    water_connected: Some(true),
                    sewer_connected: Some(true),
                    environmental_risk_score: risk,
                    ..Default::default()
                }
            },
        )
}

fn arb_objects() -> impl Strategy<Value = Vec<ObjectRecord>> {
    proptest::collection::vec(arb_object(), 0..40).prop_map(|mut objects| {
        for (i, obj) in objects.iter_mut().enumerate() {
            obj.object_id = format!("OBJ-{i}");
        }
        objects
    })
}

fn plan() -> MasterPlanContext {
    MasterPlanContext {
        id: 1,
        name: "Generated".to_string(),
        area_m2: None,
    }
}

proptest! {
    #[test]
    fn project_count_covers_gap(gap in 0.01f64..100_000.0, capacity in 1u32..2000) {
        let n = projects_for_gap(gap, capacity);
        prop_assert!(f64::from(n) * f64::from(capacity) >= gap);
        prop_assert!(f64::from(n - 1) * f64::from(capacity) < gap);
    }

    #[test]
    fn reports_are_consistent_and_repeatable(objects in arb_objects()) {
        let planner = Planner::new(Assumptions::default()).unwrap();
        let first = planner
            .generate(&plan(), &objects, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .unwrap();
        let second = planner
            .generate(&plan(), &objects, NaiveDate::from_ymd_opt(2027, 6, 30).unwrap())
            .unwrap();

        prop_assert_eq!(first.baseline.objects_total, objects.len() as u64);
        prop_assert_eq!(first.phases.len(), 3);

        let ids: Vec<&str> = objects.iter().map(|o| o.object_id.as_str()).collect();
        let assumptions = Assumptions::default();
        for project in first.projects() {
            for id in project.target_object_id.iter().chain(project.backup_object_ids.iter()) {
                prop_assert!(ids.contains(&id.as_str()));
            }
            if project.target_object_id.is_none() {
                prop_assert_eq!(project.eligibility, Eligibility::Reject);
                let ranked = rank_sites(project.service_type, project.action, &objects, &assumptions);
                prop_assert!(ranked.is_empty(), "{} left without an eligible site", project.project_id);
            }
        }

        let mut second = second;
        second.generated_at = first.generated_at;
        prop_assert_eq!(first, second);
    }
}
