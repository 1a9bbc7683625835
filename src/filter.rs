use crate::models::{FilterSpec, Issue};

const ALL: &str = "all";

// Conjunctive across dimensions, stable: survivors keep their relative order.
pub fn apply(issues: &[Issue], spec: &FilterSpec) -> Vec<Issue> {
    issues
        .iter()
        .filter(|issue| matches(issue, spec))
        .cloned()
        .collect()
}

fn matches(issue: &Issue, spec: &FilterSpec) -> bool {
    exact(&spec.project, &issue.project)
        && exact(&spec.sprint, &issue.sprint.name)
        && exact(&spec.developer, &issue.developer)
        && member(&spec.status, &issue.status)
        && member(&spec.issue_type, &issue.issue_type)
        && in_date_range(spec, issue)
}

// "all" is the UI sentinel for "no constraint"
fn exact(selected: &Option<String>, value: &str) -> bool {
    match selected {
        Some(wanted) if wanted != ALL => wanted == value,
        _ => true,
    }
}

// selecting nothing selects everything
fn member(selected: &[String], value: &str) -> bool {
    selected.is_empty() || selected.iter().any(|s| s == value)
}

fn in_date_range(spec: &FilterSpec, issue: &Issue) -> bool {
    match &spec.date_range {
        Some(range) => range.start <= issue.created && issue.created <= range.end,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{DateRange, Sprint, SprintState};

    fn issue(key: &str, project: &str, status: &str, created: (i32, u32, u32)) -> Issue {
        Issue {
            key: key.to_string(),
            summary: String::new(),
            status: status.to_string(),
            priority: "Medium".to_string(),
            issue_type: "Task".to_string(),
            project: project.to_string(),
            project_name: project.to_string(),
            developer: "Ada".to_string(),
            qa: "Unassigned".to_string(),
            ba: "Unassigned".to_string(),
            module: "Unknown".to_string(),
            product: "Unknown".to_string(),
            demand_type: "Unknown".to_string(),
            sprint: Sprint {
                name: "Sprint 12".to_string(),
                id: Some(501),
                state: SprintState::Active,
            },
            story_points: 0.0,
            created: NaiveDate::from_ymd_opt(created.0, created.1, created.2).unwrap(),
            updated: NaiveDate::from_ymd_opt(created.0, created.1, created.2).unwrap(),
            resolution_date: None,
            age_in_days: 0,
            is_resolved: false,
        }
    }

    #[test]
    fn dimensions_combine_conjunctively() {
        let issues = vec![
            issue("A-1", "X", "Done", (2024, 1, 10)),
            issue("A-2", "X", "Open", (2024, 1, 11)),
            issue("A-3", "Y", "Done", (2024, 1, 12)),
        ];
        let spec = FilterSpec {
            project: Some("X".to_string()),
            status: vec!["Done".to_string()],
            ..FilterSpec::default()
        };

        let kept = apply(&issues, &spec);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].key, "A-1");
    }

    #[test]
    fn all_sentinel_and_empty_selections_match_everything() {
        let issues = vec![
            issue("A-1", "X", "Done", (2024, 1, 10)),
            issue("A-2", "Y", "Open", (2024, 1, 11)),
        ];
        let spec = FilterSpec {
            project: Some("all".to_string()),
            sprint: Some("all".to_string()),
            developer: None,
            status: Vec::new(),
            issue_type: Vec::new(),
            date_range: None,
        };

        assert_eq!(apply(&issues, &spec).len(), 2);
    }

    #[test]
    fn date_range_is_inclusive_on_both_bounds() {
        let issues = vec![
            issue("A-1", "X", "Open", (2024, 1, 9)),
            issue("A-2", "X", "Open", (2024, 1, 10)),
            issue("A-3", "X", "Open", (2024, 1, 20)),
            issue("A-4", "X", "Open", (2024, 1, 21)),
        ];
        let spec = FilterSpec {
            date_range: Some(DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            }),
            ..FilterSpec::default()
        };

        let kept = apply(&issues, &spec);
        let keys: Vec<&str> = kept.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["A-2", "A-3"]);
    }

    #[test]
    fn surviving_issues_keep_their_original_order() {
        let issues = vec![
            issue("A-3", "X", "Open", (2024, 1, 12)),
            issue("A-1", "X", "Open", (2024, 1, 10)),
            issue("A-2", "X", "Open", (2024, 1, 11)),
        ];
        let kept = apply(&issues, &FilterSpec::default());
        let keys: Vec<&str> = kept.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["A-3", "A-1", "A-2"]);
    }

    #[test]
    fn multi_select_status_matches_any_member() {
        let issues = vec![
            issue("A-1", "X", "Done", (2024, 1, 10)),
            issue("A-2", "X", "Open", (2024, 1, 11)),
            issue("A-3", "X", "In Progress", (2024, 1, 12)),
        ];
        let spec = FilterSpec {
            status: vec!["Done".to_string(), "Open".to_string()],
            ..FilterSpec::default()
        };

        assert_eq!(apply(&issues, &spec).len(), 2);
    }
}
