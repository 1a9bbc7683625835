use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;

use crate::models::{
    DeveloperWorkload, Distribution, Issue, ProjectRef, ResolutionTrendBucket, Sprint,
    SprintProgress, SprintState, SummaryStats, TrendBucket, NO_SPRINT, UNASSIGNED, UNKNOWN,
};

// Status-matching vocabularies, configurable with the dashboard's defaults.
// Matching is a case-insensitive substring test.
pub struct StatusVocabulary {
    pub in_progress: Vec<String>,
    pub pending: Vec<String>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        StatusVocabulary {
            in_progress: ["progress", "development", "coding", "active", "working"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pending: ["to do", "open", "new", "backlog", "pending", "waiting"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl StatusVocabulary {
    pub fn is_in_progress(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        self.in_progress.iter().any(|term| status.contains(term))
    }

    pub fn is_pending(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        self.pending.iter().any(|term| status.contains(term))
    }
}

pub fn status_distribution(issues: &[Issue]) -> Vec<Distribution> {
    distribution_by(issues, |issue| &issue.status)
}

pub fn priority_distribution(issues: &[Issue]) -> Vec<Distribution> {
    distribution_by(issues, |issue| &issue.priority)
}

pub fn issue_type_distribution(issues: &[Issue]) -> Vec<Distribution> {
    distribution_by(issues, |issue| &issue.issue_type)
}

pub fn module_distribution(issues: &[Issue]) -> Vec<Distribution> {
    let mut distribution = distribution_by(issues, |issue| &issue.module);
    distribution.sort_by(|a, b| b.value.cmp(&a.value));
    distribution
}

pub fn product_distribution(issues: &[Issue]) -> Vec<Distribution> {
    let mut distribution = distribution_by(issues, |issue| &issue.product);
    distribution.sort_by(|a, b| b.value.cmp(&a.value));
    distribution
}

// Counts in first-seen order; an empty input yields an empty distribution
// rather than a division by zero.
fn distribution_by<F>(issues: &[Issue], attribute: F) -> Vec<Distribution>
where
    F: Fn(&Issue) -> &str,
{
    if issues.is_empty() {
        return Vec::new();
    }
    let total = issues.len() as f64;

    let mut counts: Vec<(String, usize)> = Vec::new();
    for issue in issues {
        let name = attribute(issue);
        match counts.iter_mut().find(|(n, _)| n.as_str() == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.to_string(), 1)),
        }
    }

    counts
        .into_iter()
        .map(|(name, value)| Distribution {
            name,
            value,
            percentage: round1(value as f64 / total * 100.0),
        })
        .collect()
}

pub fn developer_workload(issues: &[Issue], vocabulary: &StatusVocabulary) -> Vec<DeveloperWorkload> {
    let groups = issues
        .iter()
        .into_group_map_by(|issue| issue.developer.clone());

    let mut workloads: Vec<DeveloperWorkload> = groups
        .into_iter()
        .map(|(developer, group)| {
            let total_issues = group.len();
            let resolved_issues = group.iter().filter(|i| i.is_resolved).count();
            let in_progress_issues = group
                .iter()
                .filter(|i| vocabulary.is_in_progress(&i.status))
                .count();
            DeveloperWorkload {
                developer,
                total_issues,
                resolved_issues,
                in_progress_issues,
                // residual: whatever is neither resolved nor in progress
                pending_issues: total_issues.saturating_sub(resolved_issues + in_progress_issues),
                story_points: group.iter().map(|i| i.story_points).sum(),
                avg_age_days: round1(
                    group.iter().map(|i| i.age_in_days as f64).sum::<f64>() / total_issues as f64,
                ),
            }
        })
        .collect();

    workloads.sort_by(|a, b| b.total_issues.cmp(&a.total_issues));
    workloads
}

pub fn sprint_progress(issues: &[Issue]) -> Vec<SprintProgress> {
    let groups = issues
        .iter()
        .into_group_map_by(|issue| issue.sprint.name.clone());

    let mut progress: Vec<SprintProgress> = groups
        .into_iter()
        .map(|(sprint, group)| {
            let total_story_points: f64 = group.iter().map(|i| i.story_points).sum();
            let resolved_story_points: f64 = group
                .iter()
                .filter(|i| i.is_resolved)
                .map(|i| i.story_points)
                .sum();

            let mut status_breakdown: BTreeMap<String, usize> = BTreeMap::new();
            for issue in &group {
                *status_breakdown.entry(issue.status.clone()).or_insert(0) += 1;
            }

            SprintProgress {
                sprint,
                total_issues: group.len(),
                resolved_issues: group.iter().filter(|i| i.is_resolved).count(),
                total_story_points,
                resolved_story_points,
                completion_rate: if total_story_points > 0.0 {
                    round1(resolved_story_points / total_story_points * 100.0)
                } else {
                    0.0
                },
                status_breakdown,
                state: group
                    .first()
                    .map(|i| i.sprint.state)
                    .unwrap_or(SprintState::Unknown),
            }
        })
        .collect();

    progress.sort_by(|a, b| {
        a.state
            .order()
            .cmp(&b.state.order())
            .then_with(|| a.sprint.cmp(&b.sprint))
    });
    progress
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendPeriod {
    Day,
    Week,
    Month,
}

impl TrendPeriod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(TrendPeriod::Day),
            "week" => Some(TrendPeriod::Week),
            "month" => Some(TrendPeriod::Month),
            _ => None,
        }
    }

    // Zero-padded and year-prefixed so lexicographic order is calendar order.
    // Weeks use ISO numbering.
    pub fn label(self, date: NaiveDate) -> String {
        match self {
            TrendPeriod::Week => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TrendPeriod::Month => date.format("%Y-%m").to_string(),
            TrendPeriod::Day => date.format("%Y-%m-%d").to_string(),
        }
    }
}

pub fn creation_trend(issues: &[Issue], period: TrendPeriod) -> Vec<TrendBucket> {
    let groups = issues
        .iter()
        .into_group_map_by(|issue| period.label(issue.created));

    let mut buckets: Vec<TrendBucket> = groups
        .into_iter()
        .map(|(label, group)| TrendBucket {
            period: label,
            count: group.len(),
            story_points: group.iter().map(|i| i.story_points).sum(),
            resolved: group.iter().filter(|i| i.is_resolved).count(),
        })
        .collect();

    buckets.sort_by(|a, b| a.period.cmp(&b.period));
    buckets
}

pub fn resolution_trend(issues: &[Issue], period: TrendPeriod) -> Vec<ResolutionTrendBucket> {
    let entries: Vec<(NaiveDate, &Issue)> = issues
        .iter()
        .filter_map(|issue| issue.resolution_date.map(|date| (date, issue)))
        .collect();
    let groups = entries
        .into_iter()
        .into_group_map_by(|(date, _)| period.label(*date));

    let mut buckets: Vec<ResolutionTrendBucket> = groups
        .into_iter()
        .map(|(label, group)| {
            let count = group.len();
            let total_days: f64 = group
                .iter()
                .map(|(date, issue)| (*date - issue.created).num_days() as f64)
                .sum();
            ResolutionTrendBucket {
                period: label,
                count,
                story_points: group.iter().map(|(_, i)| i.story_points).sum(),
                avg_resolution_days: round1(total_days / count as f64),
            }
        })
        .collect();

    buckets.sort_by(|a, b| a.period.cmp(&b.period));
    buckets
}

pub fn summary_stats(issues: &[Issue], vocabulary: &StatusVocabulary) -> SummaryStats {
    let total_issues = issues.len();
    let resolved_issues = issues.iter().filter(|i| i.is_resolved).count();
    let total_story_points: f64 = issues.iter().map(|i| i.story_points).sum();
    let resolved_story_points: f64 = issues
        .iter()
        .filter(|i| i.is_resolved)
        .map(|i| i.story_points)
        .sum();

    SummaryStats {
        total_issues,
        resolved_issues,
        in_progress_issues: issues
            .iter()
            .filter(|i| vocabulary.is_in_progress(&i.status))
            .count(),
        pending_issues: issues
            .iter()
            .filter(|i| vocabulary.is_pending(&i.status))
            .count(),
        resolution_rate: percentage(resolved_issues as f64, total_issues as f64),
        total_story_points,
        resolved_story_points,
        pending_story_points: total_story_points - resolved_story_points,
        story_points_completion_rate: percentage(resolved_story_points, total_story_points),
        avg_age_days: if total_issues > 0 {
            round1(issues.iter().map(|i| i.age_in_days as f64).sum::<f64>() / total_issues as f64)
        } else {
            0.0
        },
        unique_developers: unique_developers(issues).len(),
        unique_sprints: unique_sprints(issues).len(),
        unique_projects: unique_projects(issues).len(),
    }
}

pub fn unique_developers(issues: &[Issue]) -> Vec<String> {
    let mut developers: Vec<String> = issues
        .iter()
        .map(|issue| issue.developer.clone())
        .filter(|developer| developer != UNASSIGNED)
        .unique()
        .collect();
    developers.sort();
    developers
}

pub fn unique_sprints(issues: &[Issue]) -> Vec<Sprint> {
    let mut sprints: Vec<Sprint> = issues
        .iter()
        .map(|issue| issue.sprint.clone())
        .filter(|sprint| sprint.name != NO_SPRINT)
        .unique_by(|sprint| sprint.id)
        .collect();
    sprints.sort_by(|a, b| {
        a.state
            .order()
            .cmp(&b.state.order())
            .then_with(|| a.name.cmp(&b.name))
    });
    sprints
}

pub fn unique_projects(issues: &[Issue]) -> Vec<ProjectRef> {
    let mut projects: Vec<ProjectRef> = issues
        .iter()
        .filter(|issue| issue.project != UNKNOWN)
        .map(|issue| ProjectRef {
            key: issue.project.clone(),
            name: issue.project_name.clone(),
        })
        .unique_by(|project| project.key.clone())
        .collect();
    projects.sort_by(|a, b| a.key.cmp(&b.key));
    projects
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round1(part / whole * 100.0)
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
