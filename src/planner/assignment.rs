//! Greedy site assignment: one target and up to two backups per project

use std::collections::BTreeMap;

use tracing::debug;

use crate::assumptions::Assumptions;
use crate::models::{Action, Eligibility, ObjectRecord, ServiceType};
use crate::planner::eligibility::{classify, SiteEvaluation};

const MAX_BACKUPS: usize = 2;

/// A non-rejected candidate with its evaluation
#[derive(Debug, Clone)]
pub struct RankedSite {
    pub index: usize,
    pub evaluation: SiteEvaluation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteAssignment {
    pub target: Option<usize>,
    pub backups: Vec<usize>,
    pub eligibility: Eligibility,
    pub why_this_object: Vec<String>,
    pub required_interventions: Vec<String>,
}

/// Whether an object may host a project of this kind at all
pub fn is_candidate(service: ServiceType, action: Action, obj: &ObjectRecord) -> bool {
    if action == Action::Expand {
        return match service {
            ServiceType::Clinic => obj.is_clinic(),
            ServiceType::School => obj.is_school(),
            ServiceType::Kindergarten => obj.is_kindergarten(),
            ServiceType::ParkingMultilevel => obj.parking_spaces_total.is_some_and(|n| n > 0),
            ServiceType::GreenSpace => obj.is_green_space(),
        };
    }
    !(obj.is_housing()
        || obj.is_school()
        || obj.is_kindergarten()
        || obj.is_health_facility()
        || obj.is_network_node()
        || obj.is_green_space())
}

fn class_rank(eligibility: Eligibility) -> u8 {
    match eligibility {
        Eligibility::BuildNow => 0,
        _ => 1,
    }
}

fn sort_key(site: &RankedSite, obj: &ObjectRecord) -> (u8, bool, u32, bool, u32, usize) {
    let transit = obj.distance_public_transport_m;
    let road = obj.distance_primary_road_m;
    (
        class_rank(site.evaluation.eligibility),
        transit.is_none(),
        transit.unwrap_or(0),
        road.is_none(),
        road.unwrap_or(0),
        site.index,
    )
}

/// Evaluate every candidate and order the non-rejected ones: BUILD_NOW first,
/// then nearest transit stop, then nearest primary road, then input order.
pub fn rank_sites(
    service: ServiceType,
    action: Action,
    objects: &[ObjectRecord],
    a: &Assumptions,
) -> Vec<RankedSite> {
    let mut ranked: Vec<RankedSite> = objects
        .iter()
        .enumerate()
        .filter(|(_, obj)| is_candidate(service, action, obj))
        .filter_map(|(index, obj)| {
            let evaluation = classify(service, obj, a);
            debug!(
                service = %service,
                object_id = %obj.object_id,
                eligibility = ?evaluation.eligibility,
                "evaluated site"
            );
            (evaluation.eligibility != Eligibility::Reject).then_some(RankedSite { index, evaluation })
        })
        .collect();

    ranked.sort_by_key(|site| sort_key(site, &objects[site.index]));
    ranked
}

/// Hands out sites to projects in request order. A site may host several
/// projects; within an eligibility class, sites already holding fewer
/// projects come first.
pub struct SiteAllocator<'a> {
    objects: &'a [ObjectRecord],
    assumptions: &'a Assumptions,
    rankings: BTreeMap<(ServiceType, bool), Vec<RankedSite>>,
    assigned: BTreeMap<usize, u32>,
}

impl<'a> SiteAllocator<'a> {
    pub fn new(objects: &'a [ObjectRecord], assumptions: &'a Assumptions) -> Self {
        Self {
            objects,
            assumptions,
            rankings: BTreeMap::new(),
            assigned: BTreeMap::new(),
        }
    }

    pub fn assign(&mut self, service: ServiceType, action: Action) -> SiteAssignment {
        let key = (service, action == Action::Expand);
        let objects = self.objects;
        let assumptions = self.assumptions;
        let ranked = self
            .rankings
            .entry(key)
            .or_insert_with(|| rank_sites(service, action, objects, assumptions));

        let assigned = &self.assigned;
        let mut order: Vec<&RankedSite> = ranked.iter().collect();
        // stable: distance order survives inside each (class, load) group
        order.sort_by_key(|site| {
            (
                class_rank(site.evaluation.eligibility),
                assigned.get(&site.index).copied().unwrap_or(0),
            )
        });

        let Some((target, rest)) = order.split_first() else {
            return SiteAssignment {
                target: None,
                backups: Vec::new(),
                eligibility: Eligibility::Reject,
                why_this_object: vec![format!(
                    "no eligible {service} site: no candidate object outside protected, \
                     heritage and flood zones"
                )],
                required_interventions: Vec::new(),
            };
        };
        let backups: Vec<usize> = rest.iter().take(MAX_BACKUPS).map(|site| site.index).collect();

        let assignment = SiteAssignment {
            target: Some(target.index),
            backups,
            eligibility: target.evaluation.eligibility,
            why_this_object: target.evaluation.why_this_object.clone(),
            required_interventions: target.evaluation.required_interventions.clone(),
        };
        *self.assigned.entry(target.index).or_default() += 1;
        assignment
    }
}
