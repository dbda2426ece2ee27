use crate::domain::model::{AcademicPlan, CareerTerm, CareerTermRole, TermSummary};
use std::collections::HashMap;

pub const FPF_ROLE: &str = "fpf";
pub const DEFAULT_ROLE: &str = "default";

/// Student plans grouped by (role, career code), in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanRoleGroups {
    groups: Vec<CareerTermRole>,
    index: HashMap<(String, String), usize>,
}

impl PlanRoleGroups {
    /// Role the plans are grouped under, e.g. 'default' or 'fpf'.
    pub fn group(plans: Vec<AcademicPlan>) -> Self {
        let mut grouped = Self::default();
        for plan in plans {
            let key = (plan.enrollment_role.clone(), plan.career.code.clone());
            let groups = &mut grouped.groups;
            let position = *grouped.index.entry(key).or_insert_with(|| {
                groups.push(CareerTermRole {
                    role: plan.enrollment_role.clone(),
                    career_code: plan.career.code.clone(),
                    academic_plans: Vec::new(),
                    term: None,
                });
                groups.len() - 1
            });
            grouped.groups[position].academic_plans.push(plan);
        }
        grouped
    }

    pub fn get(&self, role: &str, career_code: &str) -> Option<&CareerTermRole> {
        self.index
            .get(&(role.to_string(), career_code.to_string()))
            .map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CareerTermRole> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Cross join: a group expands into one entry per career term of the same
    /// career.
    pub fn join_with_career_terms(&self, career_terms: &[CareerTerm]) -> Vec<CareerTermRole> {
        let mut joined = Vec::new();
        for group in &self.groups {
            for career_term in career_terms {
                if group.career_code == career_term.acad_career {
                    joined.push(CareerTermRole {
                        term: Some(TermSummary::from(career_term)),
                        ..group.clone()
                    });
                }
            }
        }
        joined
    }
}

/// At most one entry may keep the singleton role; later ones fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleRoleRule {
    pub singleton_role: String,
    pub fallback_role: String,
}

impl Default for SingleRoleRule {
    fn default() -> Self {
        Self {
            singleton_role: FPF_ROLE.to_string(),
            fallback_role: DEFAULT_ROLE.to_string(),
        }
    }
}

impl SingleRoleRule {
    pub fn new(singleton_role: &str, fallback_role: &str) -> Self {
        Self {
            singleton_role: singleton_role.to_string(),
            fallback_role: fallback_role.to_string(),
        }
    }

    /// Single left-to-right pass; the result depends on input order.
    pub fn resolve(&self, entries: Vec<CareerTermRole>) -> Vec<CareerTermRole> {
        let (resolved, _) = entries.into_iter().fold(
            (Vec::new(), false),
            |(mut resolved, singleton_seen), mut entry| {
                let mut seen = singleton_seen;
                if entry.role == self.singleton_role {
                    if singleton_seen {
                        tracing::debug!(
                            "Relabeling extra '{}' role for career {} to '{}'",
                            self.singleton_role,
                            entry.career_code,
                            self.fallback_role
                        );
                        self.relabel(&mut entry);
                    } else {
                        seen = true;
                    }
                }
                resolved.push(entry);
                (resolved, seen)
            },
        );
        resolved
    }

    fn relabel(&self, entry: &mut CareerTermRole) {
        entry.role = self.fallback_role.clone();
        for plan in &mut entry.academic_plans {
            plan.enrollment_role = self.fallback_role.clone();
        }
    }
}
