//! End-to-end report generation on small hand-built plans

use chrono::NaiveDate;

use devplan::models::{Action, Eligibility, ServiceType};
use devplan::planner::eligibility;
use devplan::planner::report::validate_top_level;
use devplan::{Assumptions, MasterPlanContext, ObjectRecord, Planner, Report};

fn plan(name: &str) -> MasterPlanContext {
    MasterPlanContext {
        id: 7,
        name: name.to_string(),
        area_m2: Some(1_000_000.0),
    }
}

fn generated_at() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn vacant_lot(id: String, transit: u32) -> ObjectRecord {
    ObjectRecord {
        object_id: id,
        object_type: "parcel".to_string(),
        function_type: Some("vacant_lot".to_string()),
        latitude: Some(41.3),
        longitude: Some(69.2),
        power_connected: Some(true),
        water_connected: Some(true),
        sewer_connected: Some(true),
        available_power_capacity_kw: Some(200.0),
        environmental_risk_score: Some(0.2),
        distance_public_transport_m: Some(transit),
        distance_primary_road_m: Some(50),
        ..Default::default()
    }
}

fn lots(count: usize) -> Vec<ObjectRecord> {
    (0..count)
        .map(|i| vacant_lot(format!("LOT-{i:03}"), 100 + i as u32 * 10))
        .collect()
}

fn generate(objects: &[ObjectRecord]) -> Report {
    Planner::new(Assumptions::default())
        .unwrap()
        .generate(&plan("Scenario"), objects, generated_at())
        .unwrap()
}

fn count(report: &Report, service: ServiceType) -> usize {
    report.projects().filter(|p| p.service_type == service).count()
}

#[test]
fn school_seats_drive_population_when_housing_is_missing() {
    let mut objects = lots(98);
    for (i, seats) in [600, 400].into_iter().enumerate() {
        objects.push(ObjectRecord {
            object_id: format!("SCH-{i}"),
            object_type: "building".to_string(),
            function_type: Some("education_school".to_string()),
            student_capacity: Some(seats),
            ..Default::default()
        });
    }
    assert_eq!(objects.len(), 100);

    let report = generate(&objects);
    assert_eq!(report.baseline.objects_total, 100);
    assert_eq!(report.baseline.housing_units_total, 0);
    assert_eq!(report.baseline.population_estimated, Some(7143));
    assert_eq!(report.needs_15y.required.school_seats, Some(1000.02));
    assert_eq!(report.needs_15y.gaps.school_seats_gap, 0.02);
    assert_eq!(count(&report, ServiceType::School), 1);
    assert_eq!(count(&report, ServiceType::Kindergarten), 2);
    assert_eq!(count(&report, ServiceType::ParkingMultilevel), 3);
    assert_eq!(count(&report, ServiceType::GreenSpace), 1);
    assert_eq!(count(&report, ServiceType::Clinic), 0);
    assert!(report.questions.iter().any(|q| q.contains("school seats")));
}

#[test]
fn large_population_without_clinic_forces_one_clinic() {
    let mut objects = vec![ObjectRecord {
        object_id: "RES-1".to_string(),
        object_type: "building".to_string(),
        function_type: Some("residential_apartment".to_string()),
        unit_count: Some(5000),
        ..Default::default()
    }];
    objects.extend(lots(20));

    let report = generate(&objects);
    assert_eq!(report.baseline.population_estimated, Some(18000));
    let clinics: Vec<_> = report
        .projects()
        .filter(|p| p.service_type == ServiceType::Clinic)
        .collect();
    assert_eq!(clinics.len(), 1);
    assert_eq!(clinics[0].action, Action::NewBuild);
    assert!(clinics[0].target_object_id.is_some());

    let clinic_phase = report
        .phases
        .iter()
        .find(|phase| phase.projects.iter().any(|p| p.service_type == ServiceType::Clinic))
        .unwrap();
    assert_eq!(clinic_phase.phase.label(), "4-7");
}

#[test]
fn one_ready_lot_hosts_every_project() {
    let objects = vec![
        ObjectRecord {
            object_id: "RES-1".to_string(),
            object_type: "building".to_string(),
            function_type: Some("residential_apartment".to_string()),
            unit_count: Some(5000),
            ..Default::default()
        },
        vacant_lot("LOT".to_string(), 80),
    ];

    let report = generate(&objects);
    assert_eq!(report.projects().count(), 16);
    for project in report.projects() {
        assert_eq!(project.target_object_id.as_deref(), Some("LOT"), "{}", project.project_id);
        assert_eq!(project.eligibility, Eligibility::BuildNow, "{}", project.project_id);
    }
    assert!(!report.questions.iter().any(|q| q.contains("no eligible site")));
}

#[test]
fn reject_without_target_only_when_every_candidate_is_zoned() {
    let housing = ObjectRecord {
        object_id: "RES-1".to_string(),
        object_type: "building".to_string(),
        function_type: Some("residential_apartment".to_string()),
        unit_count: Some(3000),
        ..Default::default()
    };
    let mut flooded = vacant_lot("LOT-F".to_string(), 10);
    flooded.flood_zone = Some(true);
    let mut unserviced = vacant_lot("LOT-U".to_string(), 900);
    unserviced.sewer_connected = Some(false);

    let report = generate(&[housing.clone(), flooded.clone(), unserviced]);
    for project in report.projects().filter(|p| p.service_type.is_capital()) {
        assert_eq!(project.target_object_id.as_deref(), Some("LOT-U"), "{}", project.project_id);
        assert_eq!(project.eligibility, Eligibility::Conditional);
    }

    let report = generate(&[housing, flooded]);
    let school = report
        .projects()
        .find(|p| p.service_type == ServiceType::School)
        .unwrap();
    assert_eq!(school.target_object_id, None);
    assert_eq!(school.eligibility, Eligibility::Reject);
}

#[test]
fn sub_hundredth_kindergarten_gap_still_gets_a_project() {
    let kindergarten = ObjectRecord {
        object_id: "KG-1".to_string(),
        object_type: "building".to_string(),
        function_type: Some("education_kindergarten".to_string()),
        student_capacity: Some(16),
        ..Default::default()
    };
    let report = generate(&[kindergarten, vacant_lot("LOT".to_string(), 50)]);

    assert_eq!(report.baseline.population_estimated, Some(381));
    let gap = report.needs_15y.gaps.kindergarten_seats_gap;
    assert!(gap > 0.0 && gap < 0.01);
    assert_eq!(count(&report, ServiceType::Kindergarten), 1);
}

#[test]
fn protected_zone_rejects_capital_projects() {
    let mut protected = vacant_lot("LOT-P".to_string(), 10);
    protected.protected_zone = Some(true);

    let evaluation = eligibility::classify(ServiceType::School, &protected, &Assumptions::default());
    assert_eq!(evaluation.eligibility, Eligibility::Reject);

    let housing = ObjectRecord {
        object_id: "RES-1".to_string(),
        object_type: "building".to_string(),
        function_type: Some("residential_house".to_string()),
        unit_count: Some(500),
        ..Default::default()
    };
    let report = generate(&[housing, protected]);

    let school = report
        .projects()
        .find(|p| p.service_type == ServiceType::School)
        .unwrap();
    assert_eq!(school.eligibility, Eligibility::Reject);
    assert_eq!(school.target_object_id, None);
    assert!(school.backup_object_ids.is_empty());
    assert!(report.questions.iter().any(|q| q.contains(&school.project_id)));

    // green conversion is not capital construction
    let green = report
        .projects()
        .find(|p| p.service_type == ServiceType::GreenSpace)
        .unwrap();
    assert_eq!(green.target_object_id.as_deref(), Some("LOT-P"));
}

#[test]
fn empty_plan_yields_empty_phases_and_a_data_request() {
    let report = generate(&[]);
    assert_eq!(report.baseline.objects_total, 0);
    assert_eq!(report.baseline.population_estimated, None);
    let gaps = &report.needs_15y.gaps;
    assert_eq!(
        [
            gaps.school_seats_gap,
            gaps.kindergarten_seats_gap,
            gaps.parking_spaces_gap,
            gaps.green_objects_gap
        ],
        [0.0; 4]
    );
    assert_eq!(report.phases.len(), 3);
    assert!(report.phases.iter().all(|p| p.projects.is_empty()));
    assert!(!report.questions.is_empty());
}

#[test]
fn serialized_report_has_every_top_level_key() {
    let report = generate(&lots(5));
    let value = serde_json::to_value(&report).unwrap();
    validate_top_level(&value).unwrap();
    assert_eq!(value["generated_at"], "2026-10-19");
    assert_eq!(value["phases"][0]["phase"], "1-3");
}

#[test]
fn sample_quarter_produces_a_consistent_report() {
    let objects = devplan::sample::sample_objects();
    let report = generate(&objects);
    assert_eq!(report.baseline.population_estimated, Some(7560));

    let ids: Vec<&str> = objects.iter().map(|o| o.object_id.as_str()).collect();
    for project in report.projects() {
        if let Some(target) = &project.target_object_id {
            assert!(ids.contains(&target.as_str()));
            if project.service_type.is_capital() {
                assert_ne!(target, "LOT-003", "flood-zone parcel hosts {}", project.project_id);
            }
        }
    }
}
