//! Object ingestion from seed JSON files
//!
//! Accepts a list of objects or `{ "objects": [...] }`, using either the
//! plain field names or the seed-file aliases (`object_type_code`,
//! `function_type_code`, `name_ru`, point `geometry`). Values that cannot be
//! parsed are dropped and recorded on the object instead of failing the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use rusqlite::Connection;
use serde_json::{Map, Value};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::ObjectRecord;

/// Find all *.json files under a directory (or the file itself)
pub fn find_object_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} is neither a file nor a directory", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

enum Parsed<T> {
    Absent,
    Value(T),
    Malformed,
}

/// Lenient field reader for one object entry
pub struct FieldParser {
    numeric: Regex,
}

impl FieldParser {
    pub fn new() -> Result<Self> {
        // 1200, 1 200, 12,5, -0.3
        Ok(Self {
            numeric: Regex::new(r"^[+-]?\d+(?:[.,]\d+)?$")?,
        })
    }

    fn number(&self, value: Option<&Value>) -> Parsed<f64> {
        match value {
            None | Some(Value::Null) => Parsed::Absent,
            Some(Value::Number(n)) => n.as_f64().map_or(Parsed::Malformed, Parsed::Value),
            Some(Value::String(s)) => {
                let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                if compact.is_empty() {
                    Parsed::Absent
                } else if self.numeric.is_match(&compact) {
                    compact
                        .replace(',', ".")
                        .parse()
                        .map_or(Parsed::Malformed, Parsed::Value)
                } else {
                    Parsed::Malformed
                }
            }
            Some(_) => Parsed::Malformed,
        }
    }

    /// Whole, non-negative counts only; `"1,200"` reads as 1.2 and is refused
    fn count(&self, value: Option<&Value>) -> Parsed<u32> {
        match self.number(value) {
            Parsed::Value(n)
                if n.is_finite() && n.fract() == 0.0 && n >= 0.0 && n <= f64::from(u32::MAX) =>
            {
                Parsed::Value(n as u32)
            }
            Parsed::Value(_) | Parsed::Malformed => Parsed::Malformed,
            Parsed::Absent => Parsed::Absent,
        }
    }

    fn flag(&self, value: Option<&Value>) -> Parsed<bool> {
        match value {
            None | Some(Value::Null) => Parsed::Absent,
            Some(Value::Bool(b)) => Parsed::Value(*b),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => Parsed::Value(true),
                Some(0) => Parsed::Value(false),
                _ => Parsed::Malformed,
            },
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "" => Parsed::Absent,
                "true" | "yes" | "1" | "да" => Parsed::Value(true),
                "false" | "no" | "0" | "нет" => Parsed::Value(false),
                _ => Parsed::Malformed,
            },
            Some(_) => Parsed::Malformed,
        }
    }
}

fn text(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// `[lon, lat]` from a GeoJSON point
fn point(entry: &Map<String, Value>) -> Option<(f64, f64)> {
    let coords = entry.get("geometry")?.get("coordinates")?.as_array()?;
    Some((coords.first()?.as_f64()?, coords.get(1)?.as_f64()?))
}

/// Build one record, or `None` when it has no usable location
pub fn record_from_json(
    parser: &FieldParser,
    entry: &Map<String, Value>,
    fallback_id: &str,
) -> Option<ObjectRecord> {
    let mut malformed = Vec::new();

    macro_rules! field {
        ($method:ident, $name:literal) => {
            match parser.$method(entry.get($name)) {
                Parsed::Value(v) => Some(v),
                Parsed::Absent => None,
                Parsed::Malformed => {
                    malformed.push($name.to_string());
                    None
                }
            }
        };
    }

    let (mut latitude, mut longitude) = (field!(number, "latitude"), field!(number, "longitude"));
    if latitude.is_none() || longitude.is_none() {
        if let Some((lon, lat)) = point(entry) {
            latitude = Some(lat);
            longitude = Some(lon);
        }
    }
    if latitude.is_none() || longitude.is_none() {
        return None;
    }

    let record = ObjectRecord {
        object_id: text(entry, &["object_id"]).unwrap_or_else(|| fallback_id.to_string()),
        parcel_id: text(entry, &["parcel_id"]),
        object_type: text(entry, &["object_type", "object_type_code"])
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| "other".to_string()),
        function_type: text(entry, &["function_type", "function_type_code"])
            .map(|t| t.to_lowercase()),
        name: text(entry, &["name", "name_ru"]),
        latitude,
        longitude,
        administrative_region: text(entry, &["administrative_region"]),
        district: text(entry, &["district"]),
        mahalla: text(entry, &["mahalla"]),
        address_full: text(entry, &["address_full"]),
        capacity_people_max: field!(count, "capacity_people_max"),
        student_capacity: field!(count, "student_capacity"),
        bed_count: field!(count, "bed_count"),
        unit_count: field!(count, "unit_count"),
        distance_public_transport_m: field!(count, "distance_public_transport_m"),
        distance_primary_road_m: field!(count, "distance_primary_road_m"),
        parking_spaces_total: field!(count, "parking_spaces_total"),
        protected_zone: field!(flag, "protected_zone"),
        heritage_zone: field!(flag, "heritage_zone"),
        flood_zone: field!(flag, "flood_zone"),
        environmental_risk_score: field!(number, "environmental_risk_score"),
        power_connected: field!(flag, "power_connected"),
        available_power_capacity_kw: field!(number, "available_power_capacity_kw"),
        water_connected: field!(flag, "water_connected"),
        sewer_connected: field!(flag, "sewer_connected"),
        malformed_fields: Vec::new(),
    };

    if !malformed.is_empty() {
        warn!(
            object_id = %record.object_id,
            fields = %malformed.join(","),
            "unparseable values treated as absent"
        );
    }
    Some(ObjectRecord {
        malformed_fields: malformed,
        ..record
    })
}

/// Result of parsing one document
#[derive(Debug, Default)]
pub struct ParsedObjects {
    pub objects: Vec<ObjectRecord>,
    pub skipped: usize,
}

/// Parse a seed document; `source` names the fallback ids (`<source>-<n>`)
pub fn parse_objects_json(text: &str, source: &str) -> Result<ParsedObjects> {
    let doc: Value = serde_json::from_str(text).context("Invalid JSON")?;
    let entries = match &doc {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("objects") {
            Some(Value::Array(items)) => items,
            _ => bail!("expected an array of objects or an object with an \"objects\" array"),
        },
        _ => bail!("expected an array of objects or an object with an \"objects\" array"),
    };

    let parser = FieldParser::new()?;
    let mut parsed = ParsedObjects::default();
    for (n, entry) in entries.iter().enumerate() {
        let record = entry
            .as_object()
            .and_then(|map| record_from_json(&parser, map, &format!("{source}-{}", n + 1)));
        match record {
            Some(obj) => parsed.objects.push(obj),
            None => parsed.skipped += 1,
        }
    }
    Ok(parsed)
}

pub fn parse_object_file(path: &Path) -> Result<ParsedObjects> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("object");
    parse_objects_json(&text, source).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Statistics from an import run
#[derive(Debug, Default)]
pub struct ImportStats {
    pub files_processed: usize,
    pub objects_imported: usize,
    pub objects_skipped: usize,
    pub malformed_fields: usize,
    pub errors: Vec<String>,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import complete:")?;
        writeln!(f, "  Files processed:  {}", self.files_processed)?;
        writeln!(f, "  Objects imported: {}", self.objects_imported)?;
        writeln!(f, "  Objects skipped:  {} (no coordinates)", self.objects_skipped)?;
        writeln!(f, "  Malformed fields: {}", self.malformed_fields)?;
        if !self.errors.is_empty() {
            writeln!(f, "  Errors: {}", self.errors.len())?;
            for e in self.errors.iter().take(5) {
                writeln!(f, "    - {}", e)?;
            }
        }
        Ok(())
    }
}

/// Import every object file under `path` into a master plan
pub fn import_to_database(conn: &Connection, master_plan_id: i64, path: &Path) -> Result<ImportStats> {
    let files = find_object_files(path)?;
    info!(files = files.len(), path = %path.display(), "importing objects");

    let mut stats = ImportStats::default();
    for file in files {
        match parse_object_file(&file) {
            Ok(parsed) => {
                stats.files_processed += 1;
                stats.objects_skipped += parsed.skipped;
                for obj in &parsed.objects {
                    db::insert_object(conn, master_plan_id, obj)?;
                    stats.objects_imported += 1;
                    stats.malformed_fields += obj.malformed_fields.len();
                }
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping file");
                stats.errors.push(format!("{}: {:#}", file.display(), e));
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_one(value: Value) -> Option<ObjectRecord> {
        let parser = FieldParser::new().unwrap();
        record_from_json(&parser, value.as_object().unwrap(), "seed-1")
    }

    #[test]
    fn reads_plain_fields() {
        let obj = parse_one(json!({
            "object_id": "SCH-7",
            "object_type": "Building",
            "function_type": "education_school",
            "latitude": 41.3,
            "longitude": 69.28,
            "student_capacity": 900,
            "protected_zone": false,
            "environmental_risk_score": 0.4
        }))
        .unwrap();
        assert_eq!(obj.object_id, "SCH-7");
        assert_eq!(obj.object_type, "building");
        assert_eq!(obj.student_capacity, Some(900));
        assert_eq!(obj.protected_zone, Some(false));
        assert_eq!(obj.environmental_risk_score, Some(0.4));
        assert!(obj.malformed_fields.is_empty());
    }

    #[test]
    fn reads_seed_aliases_and_point_geometry() {
        let obj = parse_one(json!({
            "object_type_code": "green_space",
            "function_type_code": "park",
            "name_ru": "Парк",
            "geometry": { "type": "Point", "coordinates": [69.279, 41.308] }
        }))
        .unwrap();
        assert_eq!(obj.object_id, "seed-1");
        assert_eq!(obj.object_type, "green_space");
        assert_eq!(obj.function_type.as_deref(), Some("park"));
        assert_eq!(obj.name.as_deref(), Some("Парк"));
        assert_eq!(obj.longitude, Some(69.279));
        assert_eq!(obj.latitude, Some(41.308));
    }

    #[test]
    fn numeric_strings_and_localized_flags() {
        let obj = parse_one(json!({
            "latitude": "41,31",
            "longitude": "69.27",
            "unit_count": "1 200",
            "power_connected": "Да",
            "water_connected": "нет",
            "sewer_connected": 1
        }))
        .unwrap();
        assert_eq!(obj.latitude, Some(41.31));
        assert_eq!(obj.unit_count, Some(1200));
        assert_eq!(obj.power_connected, Some(true));
        assert_eq!(obj.water_connected, Some(false));
        assert_eq!(obj.sewer_connected, Some(true));
    }

    #[test]
    fn malformed_values_degrade_to_absent() {
        let obj = parse_one(json!({
            "object_id": "X",
            "latitude": 41.3,
            "longitude": 69.2,
            "unit_count": "many",
            "bed_count": -4,
            "flood_zone": "maybe",
            "student_capacity": ""
        }))
        .unwrap();
        assert_eq!(obj.unit_count, None);
        assert_eq!(obj.bed_count, None);
        assert_eq!(obj.flood_zone, None);
        assert_eq!(obj.student_capacity, None);
        assert_eq!(obj.malformed_fields, vec!["bed_count", "unit_count", "flood_zone"]);
    }

    #[test]
    fn fractional_counts_are_malformed() {
        let obj = parse_one(json!({
            "object_id": "Y",
            "latitude": 41.3,
            "longitude": 69.2,
            "unit_count": "1,200",
            "student_capacity": "12,5",
            "bed_count": 40.0,
            "parking_spaces_total": "1 200"
        }))
        .unwrap();
        assert_eq!(obj.unit_count, None);
        assert_eq!(obj.student_capacity, None);
        assert_eq!(obj.bed_count, Some(40));
        assert_eq!(obj.parking_spaces_total, Some(1200));
        assert_eq!(obj.malformed_fields, vec!["student_capacity", "unit_count"]);
    }

    #[test]
    fn entries_without_location_are_skipped() {
        let parsed = parse_objects_json(
            r#"{"objects": [{"object_id": "a"}, {"object_id": "b", "latitude": 1, "longitude": 2}]}"#,
            "seed",
        )
        .unwrap();
        assert_eq!(parsed.objects.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.objects[0].object_id, "b");
    }

    #[test]
    fn rejects_unexpected_document_shape() {
        assert!(parse_objects_json(r#"{"items": []}"#, "seed").is_err());
        assert!(parse_objects_json("not json", "seed").is_err());
    }
}
