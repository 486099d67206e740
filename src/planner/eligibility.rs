//! Site eligibility: BUILD_NOW, CONDITIONAL or REJECT per service and object

use crate::assumptions::Assumptions;
use crate::models::{Eligibility, ObjectRecord, ServiceType};

#[derive(Debug, Clone, PartialEq)]
pub struct SiteEvaluation {
    pub eligibility: Eligibility,
    pub why_this_object: Vec<String>,
    pub required_interventions: Vec<String>,
}

fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

fn metres(label: &str, value: Option<u32>) -> String {
    match value {
        Some(m) => format!("{label}={m}"),
        None => format!("{label}: not recorded"),
    }
}

/// Deciding fields for a site, in a fixed order
fn reasons(obj: &ObjectRecord, a: &Assumptions) -> Vec<String> {
    let mut why = Vec::with_capacity(5);
    why.push(format!(
        "utilities: power={}, water={}, sewer={}",
        yes_no(obj.power_connected),
        yes_no(obj.water_connected),
        yes_no(obj.sewer_connected)
    ));
    why.push(match obj.environmental_risk_score {
        Some(risk) => format!("environmental_risk_score={risk:.2} (max {:.2})", a.env_risk_max),
        None => "environmental_risk_score: not recorded".to_string(),
    });
    why.push(metres("distance_public_transport_m", obj.distance_public_transport_m));
    why.push(metres("distance_primary_road_m", obj.distance_primary_road_m));
    why.push(match obj.parking_spaces_total {
        Some(n) => format!("parking_spaces_total={n}"),
        None => "parking_spaces_total: not recorded".to_string(),
    });
    why
}

fn interventions(obj: &ObjectRecord, a: &Assumptions) -> Vec<String> {
    let mut out = Vec::new();
    for (flag, what) in [
        (obj.power_connected, "connect to the power grid"),
        (obj.water_connected, "connect to the water supply"),
        (obj.sewer_connected, "connect to the sewer network"),
    ] {
        if flag != Some(true) {
            out.push(what.to_string());
        }
    }

    match obj.available_power_capacity_kw {
        None => out.push("confirm or upgrade available power capacity (not recorded)".to_string()),
        Some(kw) if kw < a.min_power_capacity_kw => out.push(format!(
            "upgrade available power capacity ({kw:.0} kW, below {:.0} kW)",
            a.min_power_capacity_kw
        )),
        Some(_) => {}
    }

    if let Some(risk) = obj.environmental_risk_score {
        if risk > a.env_risk_max {
            out.push(format!(
                "environmental mitigation or relocation (risk {risk:.2} above {:.2})",
                a.env_risk_max
            ));
        }
    }
    out
}

/// Classify one object as a site for one service.
///
/// Zoning rejection applies to capital services only and wins over every
/// other rule.
pub fn classify(service: ServiceType, obj: &ObjectRecord, a: &Assumptions) -> SiteEvaluation {
    if service.is_capital() && obj.in_restricted_zone() {
        let mut why = Vec::new();
        for (flag, name) in [
            (obj.protected_zone, "protected_zone"),
            (obj.heritage_zone, "heritage_zone"),
            (obj.flood_zone, "flood_zone"),
        ] {
            if flag == Some(true) {
                why.push(format!("{name}=true"));
            }
        }
        why.extend(reasons(obj, a));
        return SiteEvaluation {
            eligibility: Eligibility::Reject,
            why_this_object: why,
            required_interventions: Vec::new(),
        };
    }

    let risk_ok = obj
        .environmental_risk_score
        .is_none_or(|risk| risk <= a.env_risk_max);

    if obj.utilities_connected() && risk_ok {
        return SiteEvaluation {
            eligibility: Eligibility::BuildNow,
            why_this_object: reasons(obj, a),
            required_interventions: Vec::new(),
        };
    }

    SiteEvaluation {
        eligibility: Eligibility::Conditional,
        why_this_object: reasons(obj, a),
        required_interventions: interventions(obj, a),
    }
}
