//! Data models for master plans, facility objects and planned projects

use std::fmt;

use serde::{Deserialize, Serialize};

/// Master plan as handed over by the spatial layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterPlanContext {
    pub id: i64,
    pub name: String,
    pub area_m2: Option<f64>,
}

/// One facility or site inside a master plan.
///
/// Every attribute except identity is optional: absent capacities count as 0
/// when aggregating, but stay distinguishable from "present but zero" when a
/// site is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub object_id: String,
    pub parcel_id: Option<String>,
    pub object_type: String,
    pub function_type: Option<String>,
    pub name: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub administrative_region: Option<String>,
    pub district: Option<String>,
    pub mahalla: Option<String>,
    pub address_full: Option<String>,

    pub capacity_people_max: Option<u32>,
    pub student_capacity: Option<u32>,
    pub bed_count: Option<u32>,
    pub unit_count: Option<u32>,

    pub distance_public_transport_m: Option<u32>,
    pub distance_primary_road_m: Option<u32>,
    pub parking_spaces_total: Option<u32>,

    pub protected_zone: Option<bool>,
    pub heritage_zone: Option<bool>,
    pub flood_zone: Option<bool>,
    pub environmental_risk_score: Option<f64>,

    pub power_connected: Option<bool>,
    pub available_power_capacity_kw: Option<f64>,
    pub water_connected: Option<bool>,
    pub sewer_connected: Option<bool>,

    /// Fields that were present in the source but could not be parsed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_fields: Vec<String>,
}

impl ObjectRecord {
    fn function_is(&self, code: &str) -> bool {
        self.function_type
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case(code))
    }

    pub fn is_housing(&self) -> bool {
        self.function_type.as_deref().is_some_and(|f| {
            let f = f.to_ascii_lowercase();
            f.contains("residential") || f.contains("housing")
        })
    }

    pub fn is_kindergarten(&self) -> bool {
        self.function_is("education_kindergarten")
    }

    /// Any `education_*` function except kindergarten
    pub fn is_school(&self) -> bool {
        self.function_type.as_deref().is_some_and(|f| {
            f.to_ascii_lowercase().starts_with("education_")
        }) && !self.is_kindergarten()
    }

    pub fn is_hospital(&self) -> bool {
        self.function_is("health_hospital")
    }

    pub fn is_clinic(&self) -> bool {
        self.function_is("health_clinic")
    }

    pub fn is_health_facility(&self) -> bool {
        self.function_type
            .as_deref()
            .is_some_and(|f| f.to_ascii_lowercase().starts_with("health_"))
    }

    pub fn is_green_space(&self) -> bool {
        self.object_type.eq_ignore_ascii_case("green_space")
    }

    pub fn is_network_node(&self) -> bool {
        self.object_type.eq_ignore_ascii_case("transport_node")
            || self.object_type.eq_ignore_ascii_case("utility_node")
    }

    /// True when any zoning flag forbids capital construction
    pub fn in_restricted_zone(&self) -> bool {
        self.protected_zone == Some(true)
            || self.heritage_zone == Some(true)
            || self.flood_zone == Some(true)
    }

    pub fn utilities_connected(&self) -> bool {
        self.power_connected == Some(true)
            && self.water_connected == Some(true)
            && self.sewer_connected == Some(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    School,
    Kindergarten,
    Clinic,
    ParkingMultilevel,
    GreenSpace,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::School,
        ServiceType::Kindergarten,
        ServiceType::Clinic,
        ServiceType::ParkingMultilevel,
        ServiceType::GreenSpace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::School => "school",
            ServiceType::Kindergarten => "kindergarten",
            ServiceType::Clinic => "clinic",
            ServiceType::ParkingMultilevel => "parking_multilevel",
            ServiceType::GreenSpace => "green_space",
        }
    }

    /// Capital objects are subject to zoning rejection
    pub fn is_capital(self) -> bool {
        !matches!(self, ServiceType::GreenSpace)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    NewBuild,
    Expand,
    Upgrade,
    Convert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Eligibility {
    BuildNow,
    Conditional,
    Reject,
}

/// Capacity a project adds; only the unit relevant to the service is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityAdded {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaces: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_people_max: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<u64>,
}

impl CapacityAdded {
    pub fn for_service(service: ServiceType, amount: u64) -> Self {
        let mut cap = CapacityAdded::default();
        match service {
            ServiceType::School | ServiceType::Kindergarten => cap.seats = Some(amount),
            ServiceType::ParkingMultilevel => cap.spaces = Some(amount),
            ServiceType::Clinic => cap.capacity_people_max = Some(amount),
            ServiceType::GreenSpace => cap.objects = Some(amount),
        }
        cap
    }

    pub fn amount(&self) -> u64 {
        self.seats
            .or(self.spaces)
            .or(self.capacity_people_max)
            .or(self.objects)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub service_type: ServiceType,
    pub action: Action,
    pub capacity_added: CapacityAdded,
    pub target_object_id: Option<String>,
    pub backup_object_ids: Vec<String>,
    pub eligibility: Eligibility,
    pub why_this_object: Vec<String>,
    pub required_interventions: Vec<String>,
}

/// The three fixed delivery horizons
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseWindow {
    #[serde(rename = "1-3")]
    Years1To3,
    #[serde(rename = "4-7")]
    Years4To7,
    #[serde(rename = "8-15")]
    Years8To15,
}

impl PhaseWindow {
    pub const ALL: [PhaseWindow; 3] = [
        PhaseWindow::Years1To3,
        PhaseWindow::Years4To7,
        PhaseWindow::Years8To15,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PhaseWindow::Years1To3 => "1-3",
            PhaseWindow::Years4To7 => "4-7",
            PhaseWindow::Years8To15 => "8-15",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub phase: PhaseWindow,
    pub projects: Vec<Project>,
}
