//! Phase scheduling by service-type lookup table

use crate::assumptions::Assumptions;
use crate::models::{Action, Phase, PhaseWindow, Project, ServiceType};
use crate::planner::needs::NeedsAssessment;

/// Where a service's projects go: the first `lead_slots` projects land in
/// `lead`, the rest in `residual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseRule {
    lead: PhaseWindow,
    lead_slots: Option<usize>,
    residual: PhaseWindow,
}

const fn all_in(window: PhaseWindow) -> PhaseRule {
    PhaseRule {
        lead: window,
        lead_slots: None,
        residual: window,
    }
}

fn rule_for(
    service: ServiceType,
    action: Action,
    needs: &NeedsAssessment,
    a: &Assumptions,
) -> PhaseRule {
    match (service, action) {
        (ServiceType::ParkingMultilevel, _) => all_in(PhaseWindow::Years1To3),
        (ServiceType::Kindergarten, _) => PhaseRule {
            lead: PhaseWindow::Years1To3,
            lead_slots: Some(usize::from(
                needs.kindergarten_seats.gap >= a.kindergarten_urgent_gap_seats,
            )),
            residual: PhaseWindow::Years8To15,
        },
        (ServiceType::School, _) => PhaseRule {
            lead: PhaseWindow::Years4To7,
            lead_slots: Some(1),
            residual: PhaseWindow::Years8To15,
        },
        (ServiceType::Clinic, Action::Expand) => all_in(PhaseWindow::Years8To15),
        (ServiceType::Clinic, _) => all_in(PhaseWindow::Years4To7),
        (ServiceType::GreenSpace, _) => all_in(PhaseWindow::Years8To15),
    }
}

fn project_number(project: &Project) -> u32 {
    project
        .project_id
        .rsplit('-')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

/// Bucket projects into the three fixed phases. Always returns all three
/// phases; within each phase projects keep project-id order.
pub fn schedule(projects: Vec<Project>, needs: &NeedsAssessment, a: &Assumptions) -> Vec<Phase> {
    let mut phases: Vec<Phase> = PhaseWindow::ALL
        .iter()
        .map(|&phase| Phase {
            phase,
            projects: Vec::new(),
        })
        .collect();
    let mut placed: Vec<(ServiceType, bool, usize)> = Vec::new();

    for project in projects {
        let expand = project.action == Action::Expand;
        let rule = rule_for(project.service_type, project.action, needs, a);

        let seen = match placed
            .iter_mut()
            .find(|(s, e, _)| *s == project.service_type && *e == expand)
        {
            Some((_, _, n)) => {
                *n += 1;
                *n - 1
            }
            None => {
                placed.push((project.service_type, expand, 1));
                0
            }
        };

        let window = match rule.lead_slots {
            Some(slots) if seen >= slots => rule.residual,
            _ => rule.lead,
        };
        if let Some(bucket) = phases.iter_mut().find(|p| p.phase == window) {
            bucket.projects.push(project);
        }
    }

    for phase in &mut phases {
        phase.projects.sort_by_key(project_number);
    }
    phases
}
