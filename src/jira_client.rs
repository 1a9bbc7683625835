use std::env;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;

use crate::fetcher::{self, FetchCaps, FetchError, FetchOutcome};
use crate::models::{JiraUser, SearchPage};
use crate::transport::{RelayPeer, RequestOptions, Transport, TransportError, TransportResponse};

// Field selection for the search endpoint; covers everything normalization
// reads.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &[
    "key",
    "summary",
    "status",
    "assignee",
    "reporter",
    "priority",
    "issuetype",
    "created",
    "updated",
    "resolutiondate",
    "project",
    "customfield_10005",
    "customfield_10002",
    "customfield_11103",
    "customfield_11102",
    "customfield_11104",
    "customfield_10105",
    "customfield_12000",
    "customfield_12300",
    "customfield_10800",
    "customfield_10801",
    "customfield_10802",
    "customfield_11000",
];

pub struct JiraClient {
    transport: Transport,
    base_url: String,
    default_headers: HeaderMap,
}

impl JiraClient {
    pub fn new() -> Self {
        let base_url = env::var("JIRA_BASE_URL").expect("JIRA_BASE_URL must be set");
        let token = env::var("JIRA_TOKEN").expect("JIRA_TOKEN must be set");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {token}")
                .parse()
                .expect("JIRA_TOKEN must be a valid header value"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let relay = env::var("JIRA_RELAY_URL")
            .ok()
            .map(|endpoint| RelayPeer { endpoint });

        JiraClient {
            transport: Transport::new(relay),
            base_url,
            default_headers: headers,
        }
    }

    fn options(&self) -> RequestOptions {
        RequestOptions {
            headers: self.default_headers.clone(),
            ..RequestOptions::default()
        }
    }

    async fn get(&self, url: Url) -> Result<TransportResponse, TransportError> {
        self.transport.send(url.as_str(), &self.options()).await
    }

    pub async fn get_myself(&self) -> Result<JiraUser, TransportError> {
        let url = Url::parse(&format!("{}/rest/api/2/myself", self.base_url))
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let response = self.get(url).await?;
        serde_json::from_value(response.data).map_err(|e| TransportError::Decode(e.to_string()))
    }

    pub async fn search_page(
        &self,
        jql: &str,
        start_at: u64,
        max_results: u64,
    ) -> Result<SearchPage, TransportError> {
        let start_at = start_at.to_string();
        let max_results = max_results.to_string();
        let fields = DEFAULT_SEARCH_FIELDS.join(",");
        let url = Url::parse_with_params(
            &format!("{}/rest/api/2/search", self.base_url),
            [
                ("jql", jql),
                ("startAt", start_at.as_str()),
                ("maxResults", max_results.as_str()),
                ("fields", fields.as_str()),
            ],
        )
        .map_err(|e| TransportError::Network(e.to_string()))?;

        let response = self.get(url).await?;
        // a page that does not decode is a benign end-of-data signal
        Ok(serde_json::from_value(response.data).unwrap_or_default())
    }

    pub async fn fetch_all_issues(
        &self,
        jql: &str,
        caps: &FetchCaps,
    ) -> Result<FetchOutcome, FetchError> {
        fetcher::fetch_all_pages(
            |start_at| self.search_page(jql, start_at, caps.page_size),
            caps,
        )
        .await
    }
}
