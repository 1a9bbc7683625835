use tokio::sync::RwLock;

use crate::models::Issue;

// Latest normalized snapshot; the collector swaps it wholesale, request
// handlers only read.
#[derive(Default)]
pub struct IssueStore {
    issues: RwLock<Vec<Issue>>,
}

impl IssueStore {
    pub fn new() -> Self {
        IssueStore::default()
    }

    pub async fn replace_all(&self, issues: Vec<Issue>) {
        *self.issues.write().await = issues;
    }

    pub async fn snapshot(&self) -> Vec<Issue> {
        self.issues.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{RawIssue, SearchPage};
    use crate::normalize::normalize_with_today;

    fn issues_from(page: &str) -> Vec<Issue> {
        let page: SearchPage = serde_json::from_str(page).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        page.issues
            .unwrap_or_default()
            .iter()
            .map(|raw: &RawIssue| normalize_with_today(raw, today))
            .collect()
    }

    #[tokio::test]
    async fn replace_all_swaps_the_snapshot() {
        let store = IssueStore::new();
        assert!(store.snapshot().await.is_empty());

        store
            .replace_all(issues_from(
                r#"{"issues":[{"key":"A-1","fields":{}},{"key":"A-2","fields":{}}],"total":2}"#,
            ))
            .await;
        assert_eq!(store.snapshot().await.len(), 2);

        store
            .replace_all(issues_from(r#"{"issues":[{"key":"B-1","fields":{}}],"total":1}"#))
            .await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key, "B-1");
    }
}
