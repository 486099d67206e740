//! Baseline inventory of the objects inside a master plan

use serde::Serialize;

use crate::models::ObjectRecord;

/// Per-category totals gathered in a single pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub objects_total: u64,
    pub housing_units_total: u64,
    pub school_seats_total: u64,
    pub kindergarten_seats_total: u64,
    pub hospital_beds_total: u64,
    pub clinic_capacity_total: u64,
    pub parking_spaces_total: u64,
    pub green_objects_total: u64,
    /// (object_id, field) pairs degraded to 0 at ingestion
    #[serde(skip)]
    pub malformed: Vec<(String, String)>,
}

fn count(value: Option<u32>) -> u64 {
    value.map(u64::from).unwrap_or(0)
}

/// Aggregate the baseline totals. Never fails; absent values count as 0.
pub fn aggregate(objects: &[ObjectRecord]) -> Inventory {
    let mut inv = Inventory::default();

    for obj in objects {
        inv.objects_total += 1;

        if obj.is_housing() {
            inv.housing_units_total += count(obj.unit_count);
        }
        if obj.is_school() {
            inv.school_seats_total += count(obj.student_capacity);
        }
        if obj.is_kindergarten() {
            inv.kindergarten_seats_total += count(obj.student_capacity);
        }
        if obj.is_hospital() {
            inv.hospital_beds_total += count(obj.bed_count);
        }
        if obj.is_clinic() {
            inv.clinic_capacity_total += count(obj.capacity_people_max);
        }
        inv.parking_spaces_total += count(obj.parking_spaces_total);
        if obj.is_green_space() {
            inv.green_objects_total += 1;
        }

        for field in &obj.malformed_fields {
            inv.malformed.push((obj.object_id.clone(), field.clone()));
        }
    }

    inv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str, object_type: &str, function_type: Option<&str>) -> ObjectRecord {
        ObjectRecord {
            object_id: id.to_string(),
            object_type: object_type.to_string(),
            function_type: function_type.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn empty_list_has_zero_totals() {
        assert_eq!(aggregate(&[]), Inventory::default());
    }

    #[test]
    fn sums_each_category_from_its_own_field() {
        let mut flat = object("h1", "building", Some("residential_apartment"));
        flat.unit_count = Some(120);
        flat.parking_spaces_total = Some(40);

        let mut school = object("s1", "building", Some("education_school"));
        school.student_capacity = Some(900);

        let mut lyceum = object("s2", "building", Some("education_lyceum"));
        lyceum.student_capacity = Some(300);

        let mut kg = object("k1", "building", Some("education_kindergarten"));
        kg.student_capacity = Some(120);

        let mut hospital = object("hp", "facility", Some("health_hospital"));
        hospital.bed_count = Some(250);
        hospital.parking_spaces_total = Some(60);

        let mut clinic = object("c1", "facility", Some("health_clinic"));
        clinic.capacity_people_max = Some(400);

        let park = object("g1", "green_space", None);

        let inv = aggregate(&[flat, school, lyceum, kg, hospital, clinic, park]);
        assert_eq!(inv.objects_total, 7);
        assert_eq!(inv.housing_units_total, 120);
        assert_eq!(inv.school_seats_total, 1200);
        assert_eq!(inv.kindergarten_seats_total, 120);
        assert_eq!(inv.hospital_beds_total, 250);
        assert_eq!(inv.clinic_capacity_total, 400);
        assert_eq!(inv.parking_spaces_total, 100);
        assert_eq!(inv.green_objects_total, 1);
    }

    #[test]
    fn absent_capacities_count_as_zero() {
        let flat = object("h1", "building", Some("housing"));
        let clinic = object("c1", "facility", Some("health_clinic"));
        let inv = aggregate(&[flat, clinic]);
        assert_eq!(inv.objects_total, 2);
        assert_eq!(inv.housing_units_total, 0);
        assert_eq!(inv.clinic_capacity_total, 0);
    }

    #[test]
    fn housing_units_ignored_on_non_housing_objects() {
        let mut office = object("b1", "building", Some("commercial_office"));
        office.unit_count = Some(50);
        assert_eq!(aggregate(&[office]).housing_units_total, 0);
    }

    #[test]
    fn collects_malformed_fields() {
        let mut obj = object("x1", "building", Some("residential"));
        obj.malformed_fields = vec!["unit_count".to_string()];
        let inv = aggregate(&[obj]);
        assert_eq!(inv.malformed, vec![("x1".to_string(), "unit_count".to_string())]);
    }
}
