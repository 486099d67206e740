//! Database schema and operations for master plans and their objects

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{MasterPlanContext, ObjectRecord};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS master_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            area_m2 REAL
        );

        -- Objects already filtered to the plan boundary by the spatial layer
        CREATE TABLE IF NOT EXISTS objects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            master_plan_id INTEGER NOT NULL REFERENCES master_plans(id) ON DELETE CASCADE,
            object_id TEXT NOT NULL,
            parcel_id TEXT,
            object_type TEXT NOT NULL,
            function_type TEXT,
            name TEXT,
            latitude REAL,
            longitude REAL,
            administrative_region TEXT,
            district TEXT,
            mahalla TEXT,
            address_full TEXT,
            capacity_people_max INTEGER,
            student_capacity INTEGER,
            bed_count INTEGER,
            unit_count INTEGER,
            distance_public_transport_m INTEGER,
            distance_primary_road_m INTEGER,
            parking_spaces_total INTEGER,
            protected_zone INTEGER,
            heritage_zone INTEGER,
            flood_zone INTEGER,
            environmental_risk_score REAL,
            power_connected INTEGER,
            available_power_capacity_kw REAL,
            water_connected INTEGER,
            sewer_connected INTEGER,
            -- comma-separated names of fields that failed to parse on import
            malformed_fields TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_objects_plan ON objects(master_plan_id);
        "#,
    )?;
    Ok(())
}

/// Create a master plan and return its id
pub fn create_master_plan(conn: &Connection, name: &str, area_m2: Option<f64>) -> Result<i64> {
    conn.execute(
        "INSERT INTO master_plans (name, area_m2) VALUES (?1, ?2)",
        (name, area_m2),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_master_plan(conn: &Connection, id: i64) -> Result<Option<MasterPlanContext>> {
    let plan = conn
        .query_row(
            "SELECT id, name, area_m2 FROM master_plans WHERE id = ?1",
            [id],
            |row| {
                Ok(MasterPlanContext {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    area_m2: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(plan)
}

/// List all master plans with their object counts
pub fn list_master_plans(conn: &Connection) -> Result<Vec<(MasterPlanContext, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.area_m2, COUNT(o.id)
         FROM master_plans p
         LEFT JOIN objects o ON o.master_plan_id = p.id
         GROUP BY p.id
         ORDER BY p.id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            MasterPlanContext {
                id: row.get(0)?,
                name: row.get(1)?,
                area_m2: row.get(2)?,
            },
            row.get::<_, i64>(3)? as u64,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Delete a plan and, through the cascade, its objects
pub fn delete_master_plan(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM master_plans WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// Insert one object into a plan
pub fn insert_object(conn: &Connection, master_plan_id: i64, obj: &ObjectRecord) -> Result<()> {
    let malformed = (!obj.malformed_fields.is_empty()).then(|| obj.malformed_fields.join(","));
    conn.execute(
        "INSERT INTO objects (
            master_plan_id, object_id, parcel_id, object_type, function_type, name,
            latitude, longitude, administrative_region, district, mahalla, address_full,
            capacity_people_max, student_capacity, bed_count, unit_count,
            distance_public_transport_m, distance_primary_road_m, parking_spaces_total,
            protected_zone, heritage_zone, flood_zone, environmental_risk_score,
            power_connected, available_power_capacity_kw, water_connected, sewer_connected,
            malformed_fields
         ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28
         )",
        params![
            master_plan_id,
            obj.object_id,
            obj.parcel_id,
            obj.object_type,
            obj.function_type,
            obj.name,
            obj.latitude,
            obj.longitude,
            obj.administrative_region,
            obj.district,
            obj.mahalla,
            obj.address_full,
            obj.capacity_people_max,
            obj.student_capacity,
            obj.bed_count,
            obj.unit_count,
            obj.distance_public_transport_m,
            obj.distance_primary_road_m,
            obj.parking_spaces_total,
            obj.protected_zone,
            obj.heritage_zone,
            obj.flood_zone,
            obj.environmental_risk_score,
            obj.power_connected,
            obj.available_power_capacity_kw,
            obj.water_connected,
            obj.sewer_connected,
            malformed,
        ],
    )
    .with_context(|| format!("Failed to insert object {}", obj.object_id))?;
    Ok(())
}

fn object_from_row(row: &Row<'_>) -> rusqlite::Result<ObjectRecord> {
    let malformed: Option<String> = row.get(26)?;
    Ok(ObjectRecord {
        object_id: row.get(0)?,
        parcel_id: row.get(1)?,
        object_type: row.get(2)?,
        function_type: row.get(3)?,
        name: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        administrative_region: row.get(7)?,
        district: row.get(8)?,
        mahalla: row.get(9)?,
        address_full: row.get(10)?,
        capacity_people_max: row.get(11)?,
        student_capacity: row.get(12)?,
        bed_count: row.get(13)?,
        unit_count: row.get(14)?,
        distance_public_transport_m: row.get(15)?,
        distance_primary_road_m: row.get(16)?,
        parking_spaces_total: row.get(17)?,
        protected_zone: row.get(18)?,
        heritage_zone: row.get(19)?,
        flood_zone: row.get(20)?,
        environmental_risk_score: row.get(21)?,
        power_connected: row.get(22)?,
        available_power_capacity_kw: row.get(23)?,
        water_connected: row.get(24)?,
        sewer_connected: row.get(25)?,
        malformed_fields: malformed
            .map(|m| m.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
    })
}

/// All objects inside a plan, in insertion order
pub fn list_objects_in_plan(conn: &Connection, master_plan_id: i64) -> Result<Vec<ObjectRecord>> {
    let mut stmt = conn.prepare(
        "SELECT object_id, parcel_id, object_type, function_type, name,
                latitude, longitude, administrative_region, district, mahalla, address_full,
                capacity_people_max, student_capacity, bed_count, unit_count,
                distance_public_transport_m, distance_primary_road_m, parking_spaces_total,
                protected_zone, heritage_zone, flood_zone, environmental_risk_score,
                power_connected, available_power_capacity_kw, water_connected, sewer_connected,
                malformed_fields
         FROM objects
         WHERE master_plan_id = ?1
         ORDER BY id",
    )?;

    let rows = stmt.query_map([master_plan_id], object_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Remove all objects from a plan (for re-import)
pub fn clear_plan_objects(conn: &Connection, master_plan_id: i64) -> Result<usize> {
    let removed = conn.execute("DELETE FROM objects WHERE master_plan_id = ?1", [master_plan_id])?;
    Ok(removed)
}
