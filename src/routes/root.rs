use itertools::Itertools;

use crate::aggregate::{self, StatusVocabulary};
use crate::models::CUSTOM_FIELD_LABELS;
use crate::AppState;

pub async fn root(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::response::Html<String> {
    let issues = state.store.snapshot().await;
    let summary = aggregate::summary_stats(&issues, &StatusVocabulary::default());

    let status_html = aggregate::status_distribution(&issues)
        .iter()
        .map(|d| format!("<li>{}: {} ({:.1}%)</li>", d.name, d.value, d.percentage))
        .collect::<Vec<_>>()
        .join("");

    let issues_by_sprint = issues
        .iter()
        .into_group_map_by(|issue| issue.sprint.name.clone());
    let sprints_html = issues_by_sprint
        .iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(sprint, sprint_issues)| {
            format!(
                "<h2>{} ({} issues)</h2><ul>{}</ul>",
                sprint,
                sprint_issues.len(),
                sprint_issues
                    .iter()
                    .take(25)
                    .map(|issue| format!(
                        "<li>{}: {} <em>[{}]</em></li>",
                        issue.key, issue.summary, issue.status
                    ))
                    .collect::<Vec<_>>()
                    .join("")
            )
        })
        .collect::<Vec<_>>()
        .join("");

    let fields_html = CUSTOM_FIELD_LABELS
        .iter()
        .map(|(id, label)| format!("<tr><td>{}</td><td>{}</td></tr>", id, label))
        .collect::<Vec<_>>()
        .join("");

    axum::response::Html(format!(
        r#"
        <!DOCTYPE html>
        <html>
            <head>
                <title>Issue Dashboard</title>
                <link rel="stylesheet" href="/static/style.css">
            </head>
            <body>
                <h1>Issue Dashboard</h1>
                <p>
                    {} issues, {} resolved ({:.1}%), {:.1} story points,
                    average age {:.1} days
                </p>
                <h2>Status</h2>
                <ul>{}</ul>
                <h2>Creation trend</h2>
                <img src="/charts/trend/week.svg" alt="weekly creation trend">
                {}
                <h2>Tracked custom fields</h2>
                <table>{}</table>
            </body>
        </html>
        "#,
        summary.total_issues,
        summary.resolved_issues,
        summary.resolution_rate,
        summary.total_story_points,
        summary.avg_age_days,
        status_html,
        sprints_html,
        fields_html
    ))
}
