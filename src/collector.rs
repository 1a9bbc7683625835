use std::env;

use crate::fetcher::FetchCaps;
use crate::jira_client::JiraClient;
use crate::models::Issue;
use crate::normalize::normalize;
use crate::store::IssueStore;

pub async fn collect_data(jira_client: &JiraClient, store: &IssueStore) -> Result<(), String> {
    println!("Collecting issue data...");

    let issues_jql = env::var("JIRA_ISSUES_JQL").expect("JIRA_ISSUES_JQL must be set");

    let user = jira_client
        .get_myself()
        .await
        .map_err(|e| format!("Connection check failed: {e}"))?;
    println!("Connected to Jira as {}", user.label());

    let outcome = jira_client
        .fetch_all_issues(&issues_jql, &FetchCaps::default())
        .await
        .map_err(|e| e.to_string())?;

    let issues: Vec<Issue> = outcome.issues.iter().map(normalize).collect();
    println!("Normalized {} issues", issues.len());

    store.replace_all(issues).await;
    println!("Issue snapshot refreshed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::aggregate::{self, StatusVocabulary, TrendPeriod};
    use crate::fetcher::{fetch_all_pages, FetchCaps};
    use crate::filter;
    use crate::models::{FilterSpec, Issue, RawIssue, SearchPage};
    use crate::normalize::normalize_with_today;
    use crate::transport::TransportError;

    fn record(key: &str, status: &str, created: &str, resolved: Option<&str>) -> RawIssue {
        RawIssue {
            key: key.to_string(),
            fields: json!({
                "summary": format!("work on {key}"),
                "status": { "name": status },
                "project": { "key": "WMS", "name": "Warehouse" },
                "assignee": { "displayName": "Ada" },
                "customfield_10002": 2,
                "created": created,
                "resolutiondate": resolved,
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        }
    }

    // mock-paged ingest -> normalize -> filter -> aggregate, end to end
    #[tokio::test]
    async fn pipeline_turns_overlapping_pages_into_stats() {
        let caps = FetchCaps {
            page_size: 2,
            page_delay: std::time::Duration::ZERO,
            ..FetchCaps::default()
        };
        let outcome = fetch_all_pages(
            |start_at| {
                let page = match start_at {
                    0 => SearchPage {
                        issues: Some(vec![
                            record("A-1", "Open", "2024-01-02T09:00:00.000+0000", None),
                            record(
                                "A-2",
                                "Done",
                                "2024-01-03T09:00:00.000+0000",
                                Some("2024-01-20T09:00:00.000+0000"),
                            ),
                        ]),
                        total: Some(3),
                    },
                    _ => SearchPage {
                        issues: Some(vec![
                            record(
                                "A-2",
                                "Done",
                                "2024-01-03T09:00:00.000+0000",
                                Some("2024-01-20T09:00:00.000+0000"),
                            ),
                            record("A-3", "In Progress", "2024-02-05T09:00:00.000+0000", None),
                        ]),
                        total: Some(3),
                    },
                };
                async move { Ok::<_, TransportError>(page) }
            },
            &caps,
        )
        .await
        .unwrap();

        assert_eq!(outcome.total, 3);

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let issues: Vec<Issue> = outcome
            .issues
            .iter()
            .map(|raw| normalize_with_today(raw, today))
            .collect();

        let spec = FilterSpec {
            project: Some("WMS".to_string()),
            ..FilterSpec::default()
        };
        let filtered = filter::apply(&issues, &spec);
        assert_eq!(filtered.len(), 3);

        let summary = aggregate::summary_stats(&filtered, &StatusVocabulary::default());
        assert_eq!(summary.total_issues, 3);
        assert_eq!(summary.resolved_issues, 1);
        assert_eq!(summary.in_progress_issues, 1);
        assert_eq!(summary.total_story_points, 6.0);

        let trend = aggregate::creation_trend(&filtered, TrendPeriod::Month);
        let labels: Vec<&str> = trend.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02"]);
        assert_eq!(trend[0].count, 2);
        assert_eq!(trend[0].resolved, 1);
    }
}
