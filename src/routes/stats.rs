use axum::extract::{Query, State};
use axum::Json;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, StatusVocabulary, TrendPeriod};
use crate::filter;
use crate::models::{
    DeveloperWorkload, Distribution, FilterSpec, Issue, ProjectRef, ResolutionTrendBucket, Sprint,
    SprintProgress, SummaryStats, TrendBucket,
};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub matched_issues: usize,
    pub summary: SummaryStats,
    pub status_distribution: Vec<Distribution>,
    pub priority_distribution: Vec<Distribution>,
    pub issue_type_distribution: Vec<Distribution>,
    pub module_distribution: Vec<Distribution>,
    pub product_distribution: Vec<Distribution>,
    pub developer_workload: Vec<DeveloperWorkload>,
    pub sprint_progress: Vec<SprintProgress>,
    pub creation_trend: Vec<TrendBucket>,
    pub resolution_trend: Vec<ResolutionTrendBucket>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub projects: Vec<ProjectRef>,
    pub sprints: Vec<Sprint>,
    pub developers: Vec<String>,
    pub statuses: Vec<String>,
    pub issue_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    period: Option<String>,
}

pub async fn issues(State(state): State<AppState>) -> Json<Vec<Issue>> {
    Json(state.store.snapshot().await)
}

pub async fn summary(State(state): State<AppState>) -> Json<SummaryStats> {
    let issues = state.store.snapshot().await;
    Json(aggregate::summary_stats(
        &issues,
        &StatusVocabulary::default(),
    ))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Json(spec): Json<FilterSpec>,
) -> Json<DashboardStats> {
    let issues = state.store.snapshot().await;
    Json(build_dashboard(&issues, &spec))
}

pub async fn filter_options(State(state): State<AppState>) -> Json<FilterOptions> {
    let issues = state.store.snapshot().await;
    Json(FilterOptions {
        projects: aggregate::unique_projects(&issues),
        sprints: aggregate::unique_sprints(&issues),
        developers: aggregate::unique_developers(&issues),
        statuses: issues
            .iter()
            .map(|issue| issue.status.clone())
            .unique()
            .sorted()
            .collect(),
        issue_types: issues
            .iter()
            .map(|issue| issue.issue_type.clone())
            .unique()
            .sorted()
            .collect(),
    })
}

pub async fn creation_trend(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Json<Vec<TrendBucket>> {
    let issues = state.store.snapshot().await;
    Json(aggregate::creation_trend(&issues, parse_period(&query)))
}

pub async fn resolution_trend(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Json<Vec<ResolutionTrendBucket>> {
    let issues = state.store.snapshot().await;
    Json(aggregate::resolution_trend(&issues, parse_period(&query)))
}

fn parse_period(query: &TrendQuery) -> TrendPeriod {
    query
        .period
        .as_deref()
        .and_then(TrendPeriod::parse)
        .unwrap_or(TrendPeriod::Week)
}

pub fn build_dashboard(issues: &[Issue], spec: &FilterSpec) -> DashboardStats {
    let filtered = filter::apply(issues, spec);
    let vocabulary = StatusVocabulary::default();
    DashboardStats {
        matched_issues: filtered.len(),
        summary: aggregate::summary_stats(&filtered, &vocabulary),
        status_distribution: aggregate::status_distribution(&filtered),
        priority_distribution: aggregate::priority_distribution(&filtered),
        issue_type_distribution: aggregate::issue_type_distribution(&filtered),
        module_distribution: aggregate::module_distribution(&filtered),
        product_distribution: aggregate::product_distribution(&filtered),
        developer_workload: aggregate::developer_workload(&filtered, &vocabulary),
        sprint_progress: aggregate::sprint_progress(&filtered),
        creation_trend: aggregate::creation_trend(&filtered, TrendPeriod::Week),
        resolution_trend: aggregate::resolution_trend(&filtered, TrendPeriod::Week),
    }
}
