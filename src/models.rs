use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const UNASSIGNED: &str = "Unassigned";
pub const NO_SPRINT: &str = "No Sprint";

#[derive(Debug, Deserialize)]
pub struct JiraUser {
    pub name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

impl JiraUser {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("unknown user")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

// A response without a decodable issue list deserializes to `issues: None`,
// which the fetcher treats as a benign end-of-data signal.
#[derive(Debug, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Option<Vec<RawIssue>>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub priority: String,
    pub issue_type: String,
    pub project: String,
    pub project_name: String,
    pub developer: String,
    pub qa: String,
    pub ba: String,
    pub module: String,
    pub product: String,
    pub demand_type: String,
    pub sprint: Sprint,
    pub story_points: f64,
    pub created: NaiveDate,
    pub updated: NaiveDate,
    pub resolution_date: Option<NaiveDate>,
    pub age_in_days: i64,
    pub is_resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sprint {
    pub name: String,
    pub id: Option<u64>,
    pub state: SprintState,
}

impl Default for Sprint {
    fn default() -> Self {
        Sprint {
            name: NO_SPRINT.to_string(),
            id: None,
            state: SprintState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Active,
    Future,
    Closed,
    Unknown,
}

impl SprintState {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "active" => SprintState::Active,
            "future" => SprintState::Future,
            "closed" => SprintState::Closed,
            _ => SprintState::Unknown,
        }
    }

    // sort priority: active sprints first, unknown last
    pub fn order(self) -> u8 {
        match self {
            SprintState::Active => 0,
            SprintState::Future => 1,
            SprintState::Closed => 2,
            SprintState::Unknown => 3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub project: Option<String>,
    pub sprint: Option<String>,
    pub developer: Option<String>,
    pub status: Vec<String>,
    pub issue_type: Vec<String>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub name: String,
    pub value: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperWorkload {
    pub developer: String,
    pub total_issues: usize,
    pub resolved_issues: usize,
    pub in_progress_issues: usize,
    pub pending_issues: usize,
    pub story_points: f64,
    pub avg_age_days: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintProgress {
    pub sprint: String,
    pub total_issues: usize,
    pub resolved_issues: usize,
    pub total_story_points: f64,
    pub resolved_story_points: f64,
    pub completion_rate: f64,
    pub status_breakdown: BTreeMap<String, usize>,
    pub state: SprintState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub period: String,
    pub count: usize,
    pub story_points: f64,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionTrendBucket {
    pub period: String,
    pub count: usize,
    pub story_points: f64,
    pub avg_resolution_days: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_issues: usize,
    pub resolved_issues: usize,
    pub in_progress_issues: usize,
    pub pending_issues: usize,
    pub resolution_rate: f64,
    pub total_story_points: f64,
    pub resolved_story_points: f64,
    pub pending_story_points: f64,
    pub story_points_completion_rate: f64,
    pub avg_age_days: f64,
    pub unique_developers: usize,
    pub unique_sprints: usize,
    pub unique_projects: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub key: String,
    pub name: String,
}

// Semantic names for the custom fields requested from the search endpoint.
// Labeling only; normalization reads the identifiers directly.
pub const CUSTOM_FIELD_LABELS: &[(&str, &str)] = &[
    ("customfield_10002", "Story Points"),
    ("customfield_10005", "Sprint"),
    ("customfield_10105", "Module"),
    ("customfield_10800", "Request User"),
    ("customfield_10801", "app"),
    ("customfield_10802", "module"),
    ("customfield_11000", "Developer(single)"),
    ("customfield_11102", "QA"),
    ("customfield_11103", "Developer"),
    ("customfield_11104", "BA"),
    ("customfield_12000", "Product"),
    ("customfield_12300", "Demand Type"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprint_state_parse_is_case_insensitive() {
        assert_eq!(SprintState::parse("active"), SprintState::Active);
        assert_eq!(SprintState::parse("ACTIVE"), SprintState::Active);
        assert_eq!(SprintState::parse("Future"), SprintState::Future);
        assert_eq!(SprintState::parse("closed"), SprintState::Closed);
        assert_eq!(SprintState::parse("archived"), SprintState::Unknown);
    }

    #[test]
    fn sprint_state_order_puts_active_first() {
        assert!(SprintState::Active.order() < SprintState::Future.order());
        assert!(SprintState::Future.order() < SprintState::Closed.order());
        assert!(SprintState::Closed.order() < SprintState::Unknown.order());
    }

    #[test]
    fn search_page_without_issue_list_decodes_to_none() {
        let page: SearchPage =
            serde_json::from_value(serde_json::json!({ "total": 12 })).unwrap();
        assert!(page.issues.is_none());
        assert_eq!(page.total, Some(12));
    }
}
