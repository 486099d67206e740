//! Demo neighbourhood for trying the pipeline without seed files

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::ObjectRecord;

fn site(object_id: &str, object_type: &str, function_type: &str, name: &str) -> ObjectRecord {
    ObjectRecord {
        object_id: object_id.to_string(),
        object_type: object_type.to_string(),
        function_type: Some(function_type.to_string()),
        name: Some(name.to_string()),
        administrative_region: Some("Tashkent".to_string()),
        district: Some("Yunusobod".to_string()),
        power_connected: Some(true),
        water_connected: Some(true),
        sewer_connected: Some(true),
        available_power_capacity_kw: Some(120.0),
        protected_zone: Some(false),
        heritage_zone: Some(false),
        flood_zone: Some(false),
        ..Default::default()
    }
}

fn at(mut obj: ObjectRecord, latitude: f64, longitude: f64, transit_m: u32, road_m: u32) -> ObjectRecord {
    obj.latitude = Some(latitude);
    obj.longitude = Some(longitude);
    obj.distance_public_transport_m = Some(transit_m);
    obj.distance_primary_road_m = Some(road_m);
    obj
}

/// A mid-size residential quarter with one of each facility and a handful of
/// development sites in different states of readiness
pub fn sample_objects() -> Vec<ObjectRecord> {
    let mut objects = Vec::new();

    let mut block_a = site("RES-001", "building", "residential_apartment", "Block A");
    block_a.unit_count = Some(1200);
    block_a.parking_spaces_total = Some(60);
    objects.push(at(block_a, 41.3651, 69.2841, 150, 90));

    let mut block_b = site("RES-002", "building", "residential_apartment", "Block B");
    block_b.unit_count = Some(900);
    objects.push(at(block_b, 41.3662, 69.2870, 220, 140));

    let mut school = site("EDU-001", "building", "education_school", "School No. 214");
    school.student_capacity = Some(600);
    objects.push(at(school, 41.3640, 69.2855, 300, 200));

    let mut kindergarten = site("EDU-002", "building", "education_kindergarten", "Kindergarten No. 37");
    kindergarten.student_capacity = Some(120);
    objects.push(at(kindergarten, 41.3670, 69.2832, 180, 260));

    let mut clinic = site("HLT-001", "building", "health_clinic", "Family clinic");
    clinic.capacity_people_max = Some(300);
    objects.push(at(clinic, 41.3633, 69.2879, 90, 60));

    let mut car_park = site("PRK-001", "parking", "parking_surface", "Surface car park");
    car_park.parking_spaces_total = Some(80);
    objects.push(at(car_park, 41.3645, 69.2890, 120, 30));

    objects.push(at(site("GRN-001", "green_space", "park", "Bog' park"), 41.3680, 69.2860, 400, 350));

    objects.push(at(site("TRN-001", "transport_node", "bus_stop", "Bus stop"), 41.3650, 69.2880, 0, 15));

    objects.push(at(site("LOT-001", "parcel", "vacant_lot", "Vacant parcel north"), 41.3690, 69.2845, 250, 80));

    let mut lot_b = site("LOT-002", "parcel", "vacant_lot", "Vacant parcel east");
    lot_b.sewer_connected = Some(false);
    lot_b.available_power_capacity_kw = None;
    objects.push(at(lot_b, 41.3655, 69.2910, 140, 120));

    let mut lot_c = site("LOT-003", "parcel", "vacant_lot", "Riverside parcel");
    lot_c.flood_zone = Some(true);
    lot_c.environmental_risk_score = Some(0.8);
    objects.push(at(lot_c, 41.3620, 69.2825, 60, 40));

    let mut warehouse = site("IND-001", "building", "industrial_warehouse", "Disused warehouse");
    warehouse.environmental_risk_score = Some(0.72);
    warehouse.available_power_capacity_kw = Some(30.0);
    objects.push(at(warehouse, 41.3615, 69.2900, 500, 70));

    objects.push(at(site("LOT-004", "parcel", "vacant_lot", "Parcel by the ring road"), 41.3700, 69.2920, 600, 20));

    objects
}

/// Create a plan named `name` and fill it with the demo objects
pub fn load_sample(conn: &Connection, name: &str) -> Result<(i64, usize)> {
    let plan_id = db::create_master_plan(conn, name, Some(420_000.0))?;
    let objects = sample_objects();
    for obj in &objects {
        db::insert_object(conn, plan_id, obj)?;
    }
    Ok((plan_id, objects.len()))
}
