//! View derivation: category filter, then free-text search, then stats over
//! the full list.

use std::{collections::HashMap, convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::model::Employee;

pub const NOT_APPLICABLE: &str = "N/A";

/// The "All / Certified / department" selector.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Certified,
    Department { name: String },
}

impl CategoryFilter {
    pub fn department(name: impl Into<String>) -> Self {
        Self::Department { name: name.into() }
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Certified => employee.certified,
            CategoryFilter::Department { name } => employee.department == *name,
        }
    }
}

/// Button labels: "All", "Certified", anything else names a department.
impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Ok(match label {
            "All" => CategoryFilter::All,
            "Certified" => CategoryFilter::Certified,
            other => CategoryFilter::department(other),
        })
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Certified => f.write_str("Certified"),
            CategoryFilter::Department { name } => f.write_str(name),
        }
    }
}

/// Trimmed, lowercased search term; `None` when nothing is left.
pub fn normalize_term(raw: &str) -> Option<String> {
    let term = raw.trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

/// `term` must already be normalized.
pub fn matches_term(employee: &Employee, term: &str) -> bool {
    employee.name.to_lowercase().contains(term)
        || employee
            .skills
            .iter()
            .any(|skill| skill.to_lowercase().contains(term))
}

/// Stable two-stage filter. A record the category filter drops is never
/// brought back by the search.
pub fn apply<'a>(
    records: &'a [Employee],
    filter: &CategoryFilter,
    search: &str,
) -> Vec<&'a Employee> {
    let term = normalize_term(search);
    records
        .iter()
        .filter(|employee| filter.matches(employee))
        .filter(|employee| term.as_deref().is_none_or(|term| matches_term(employee, term)))
        .collect()
}

/// Summary numbers, always over the unfiltered list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RosterStats {
    pub total: usize,
    pub certified: usize,
    pub non_certified: usize,
    pub most_common_skill: Option<String>,
}

impl RosterStats {
    pub fn compute(records: &[Employee]) -> Self {
        let total = records.len();
        let certified = records.iter().filter(|employee| employee.certified).count();
        Self {
            total,
            certified,
            non_certified: total - certified,
            most_common_skill: most_common_skill(records),
        }
    }

    pub fn most_common_skill_label(&self) -> &str {
        self.most_common_skill.as_deref().unwrap_or(NOT_APPLICABLE)
    }
}

/// Highest count wins; among equal counts the skill seen first wins.
pub fn most_common_skill(records: &[Employee]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for skill in records.iter().flat_map(|employee| employee.skills.iter()) {
        let count = counts.entry(skill.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(skill.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for skill in first_seen {
        let count = counts[skill];
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((skill, count));
        }
    }
    best.map(|(skill, _)| skill.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::seed_employees;

    fn names(view: &[&Employee]) -> Vec<String> {
        view.iter().map(|employee| employee.name.clone()).collect()
    }

    fn roster() -> Vec<Employee> {
        let mut records = seed_employees();
        records.push(Employee {
            id: 4,
            name: "Dana Ruiz".into(),
            email: "dana@technova.com".into(),
            department: "Sales".into(),
            skills: vec!["SQL".into()],
            certified: false,
        });
        records
    }

    #[test]
    fn all_keeps_everything_in_order() {
        let records = roster();
        let view = apply(&records, &CategoryFilter::All, "");
        assert_eq!(view.len(), records.len());
        assert_eq!(
            names(&view),
            vec!["Aisha Khan", "Bob Smith", "Charlie Jain", "Dana Ruiz"]
        );
    }

    #[test]
    fn certified_keeps_exactly_certified() {
        let records = roster();
        let view = apply(&records, &CategoryFilter::Certified, "");
        assert!(view.iter().all(|employee| employee.certified));
        assert_eq!(names(&view), vec!["Aisha Khan", "Charlie Jain"]);
    }

    #[test]
    fn department_match_is_exact_and_case_sensitive() {
        let records = roster();
        let sales = apply(&records, &CategoryFilter::department("Sales"), "");
        assert_eq!(names(&sales), vec!["Charlie Jain", "Dana Ruiz"]);
        assert!(apply(&records, &CategoryFilter::department("sales"), "").is_empty());
    }

    #[test]
    fn search_matches_name_or_skill_case_insensitively() {
        let records = roster();
        assert_eq!(
            names(&apply(&records, &CategoryFilter::All, "  BOB ")),
            vec!["Bob Smith"]
        );
        assert_eq!(
            names(&apply(&records, &CategoryFilter::All, "sql")),
            vec!["Bob Smith", "Dana Ruiz"]
        );
        assert_eq!(apply(&records, &CategoryFilter::All, "   ").len(), 4);
    }

    #[test]
    fn search_runs_after_the_category_filter() {
        let records = roster();
        let view = apply(&records, &CategoryFilter::Certified, "charlie");
        assert_eq!(names(&view), vec!["Charlie Jain"]);

        let excluded = apply(&records, &CategoryFilter::Certified, "bob");
        assert!(excluded.is_empty());
        let excluded = apply(&records, &CategoryFilter::department("HR"), "sql");
        assert!(excluded.is_empty());
    }

    #[test]
    fn legacy_labels_parse_into_variants() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Certified".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Certified
        );
        assert_eq!(
            "Engineering".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::department("Engineering")
        );
        assert_eq!(CategoryFilter::department("HR").to_string(), "HR");
    }

    #[test]
    fn filter_serializes_as_tagged_variant() {
        let json = serde_json::to_value(CategoryFilter::department("HR")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "department", "name": "HR"}));
        let parsed: CategoryFilter = serde_json::from_str(r#"{"kind":"certified"}"#).unwrap();
        assert_eq!(parsed, CategoryFilter::Certified);
    }

    #[test]
    fn stats_cover_the_full_list() {
        let stats = RosterStats::compute(&roster());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.certified, 2);
        assert_eq!(stats.non_certified + stats.certified, stats.total);
    }

    #[test]
    fn most_common_skill_ties_go_to_first_seen() {
        let stats = RosterStats::compute(&seed_employees());
        assert_eq!(stats.most_common_skill.as_deref(), Some("CSS"));
    }

    #[test]
    fn strictly_higher_count_beats_first_seen() {
        let mut records = roster();
        records[3].skills = vec!["JavaScript".into()];
        assert_eq!(most_common_skill(&records).as_deref(), Some("JavaScript"));
    }

    #[test]
    fn no_skills_reports_not_applicable() {
        let mut records = seed_employees();
        for employee in &mut records {
            employee.skills.clear();
        }
        let stats = RosterStats::compute(&records);
        assert_eq!(stats.most_common_skill, None);
        assert_eq!(stats.most_common_skill_label(), "N/A");
        assert_eq!(RosterStats::compute(&[]).total, 0);
    }
}
