use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const DIRECT_TIMEOUT: Duration = Duration::from_secs(30);
const RELAY_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status}: {status_text}")]
    Status { status: u16, status_text: String },
    #[error("request failed: {0}")]
    Network(String),
    #[error("{strategy} strategy timed out after {timeout:?}")]
    Timeout {
        strategy: &'static str,
        timeout: Duration,
    },
    #[error("response was not valid JSON: {0}")]
    Decode(String),
    #[error("no relay peer configured")]
    RelayUnavailable,
    #[error("relay refused request: {0}")]
    RelayRefused(String),
    #[error("relay answered request {got}, expected {expected}")]
    RelayMismatch { expected: u64, got: u64 },
    #[error("response was not padded as {callback}(...)")]
    CallbackShape { callback: String },
    #[error("all transport strategies failed: {last}")]
    Exhausted { last: Box<TransportError> },
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
}

// Explicit handle for the cooperating relay peer. The peer accepts a request
// envelope over POST and answers with a `RelayReply`.
#[derive(Debug, Clone)]
pub struct RelayPeer {
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Direct,
    Relay,
    Probe,
    Callback,
}

const FALLBACK_ORDER: [Strategy; 4] = [
    Strategy::Direct,
    Strategy::Relay,
    Strategy::Probe,
    Strategy::Callback,
];

impl Strategy {
    fn name(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Relay => "relay",
            Strategy::Probe => "probe",
            Strategy::Callback => "callback",
        }
    }

    fn default_timeout(self) -> Duration {
        match self {
            Strategy::Direct => DIRECT_TIMEOUT,
            Strategy::Relay => RELAY_TIMEOUT,
            Strategy::Probe => PROBE_TIMEOUT,
            Strategy::Callback => CALLBACK_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayEnvelope<'a> {
    request_id: u64,
    url: &'a str,
    method: &'a str,
    headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayReply {
    request_id: u64,
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    status: u16,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct Transport {
    client: reqwest::Client,
    relay: Option<RelayPeer>,
    request_counter: AtomicU64,
    callback_counter: AtomicU64,
}

impl Transport {
    pub fn new(relay: Option<RelayPeer>) -> Self {
        Transport {
            client: reqwest::Client::new(),
            relay,
            request_counter: AtomicU64::new(0),
            callback_counter: AtomicU64::new(0),
        }
    }

    // Tries every strategy in FALLBACK_ORDER, one at a time. A failed strategy
    // advances the chain; only full exhaustion fails the call, carrying the
    // last error verbatim. Never retries on its own.
    pub async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let mut last = TransportError::Network("no strategy attempted".to_string());
        for strategy in FALLBACK_ORDER {
            match self.attempt(strategy, url, options).await {
                Ok(response) => {
                    if strategy != Strategy::Direct {
                        println!(
                            "Transport fell back to {} for {} (HTTP {} {})",
                            strategy.name(),
                            url,
                            response.status,
                            response.status_text
                        );
                    }
                    return Ok(response);
                }
                Err(err) => {
                    println!("Transport strategy {} failed: {}", strategy.name(), err);
                    last = err;
                }
            }
        }
        Err(TransportError::Exhausted {
            last: Box::new(last),
        })
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let budget = options.timeout.unwrap_or(strategy.default_timeout());
        let attempt = async {
            match strategy {
                Strategy::Direct => self.direct(url, options).await,
                Strategy::Relay => self.relay(url, options).await,
                Strategy::Probe => self.probe(url, options).await,
                Strategy::Callback => self.callback(url, options).await,
            }
        };
        match tokio::time::timeout(budget, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                strategy: strategy.name(),
                timeout: budget,
            }),
        }
    }

    async fn direct(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .request(options.method.clone(), url)
            .headers(options.headers.clone());
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let data = response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(TransportResponse {
            data,
            status: status.as_u16(),
            status_text: status_text(status),
        })
    }

    // Wraps the logical request in a JSON envelope and lets the relay peer
    // execute it on our behalf. The request id ties the reply to this attempt.
    async fn relay(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let peer = self.relay.as_ref().ok_or(TransportError::RelayUnavailable)?;
        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;

        let headers: BTreeMap<String, String> = options
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();
        let envelope = RelayEnvelope {
            request_id,
            url,
            method: options.method.as_str(),
            headers,
            body: options.body.as_deref(),
        };

        let response = self
            .client
            .post(&peer.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let reply: RelayReply = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        if reply.request_id != request_id {
            return Err(TransportError::RelayMismatch {
                expected: request_id,
                got: reply.request_id,
            });
        }
        if !reply.success {
            return Err(TransportError::RelayRefused(
                reply
                    .error
                    .unwrap_or_else(|| "unspecified relay error".to_string()),
            ));
        }

        Ok(TransportResponse {
            data: reply.data,
            status: reply.status,
            status_text: reply.status_text,
        })
    }

    // Fire-and-forget: confirms the request went through without reading the
    // body, so the response carries no data.
    async fn probe(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .request(options.method.clone(), url)
            .headers(options.headers.clone());
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(TransportResponse {
            data: Value::Null,
            status: response.status().as_u16(),
            status_text: "opaque".to_string(),
        })
    }

    // Callback-style GET for endpoints that answer with a padded body,
    // `<name>({...})`. The callback name is unique per attempt.
    async fn callback(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<TransportResponse, TransportError> {
        let name = format!(
            "cb_{}",
            self.callback_counter.fetch_add(1, Ordering::Relaxed) + 1
        );
        let separator = if url.contains('?') { '&' } else { '?' };
        let padded_url = format!("{url}{separator}callback={name}");

        let response = self
            .client
            .get(&padded_url)
            .headers(options.headers.clone())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                status_text: status_text(status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        match unwrap_callback_padding(&body, &name) {
            Some(inner) => {
                let data = serde_json::from_str(inner)
                    .map_err(|e| TransportError::Decode(e.to_string()))?;
                Ok(TransportResponse {
                    data,
                    status: status.as_u16(),
                    status_text: status_text(status),
                })
            }
            None => Err(TransportError::CallbackShape { callback: name }),
        }
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

fn unwrap_callback_padding<'a>(body: &'a str, callback: &str) -> Option<&'a str> {
    let rest = body.trim().strip_prefix(callback)?.trim_start();
    let rest = rest.strip_prefix('(')?.trim_end();
    let rest = rest.strip_suffix(';').unwrap_or(rest).trim_end();
    rest.strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_padding_unwraps_plain_and_terminated_bodies() {
        assert_eq!(
            unwrap_callback_padding("cb_1({\"a\":1})", "cb_1"),
            Some("{\"a\":1}")
        );
        assert_eq!(
            unwrap_callback_padding("  cb_7 ( {\"a\":1} ) ;  ", "cb_7"),
            Some(" {\"a\":1} ")
        );
        assert_eq!(unwrap_callback_padding("{\"a\":1}", "cb_1"), None);
        assert_eq!(unwrap_callback_padding("cb_2({\"a\":1})", "cb_1"), None);
    }

    #[test]
    fn relay_reply_decodes_success_and_failure_shapes() {
        let ok: RelayReply = serde_json::from_str(
            r#"{"requestId":3,"success":true,"data":{"issues":[]},"status":200,"statusText":"OK"}"#,
        )
        .unwrap();
        assert_eq!(ok.request_id, 3);
        assert!(ok.success);
        assert_eq!(ok.status, 200);

        let refused: RelayReply =
            serde_json::from_str(r#"{"requestId":4,"success":false,"error":"denied"}"#).unwrap();
        assert!(!refused.success);
        assert_eq!(refused.error.as_deref(), Some("denied"));
        assert!(refused.data.is_null());
    }

    #[test]
    fn relay_envelope_serializes_camel_case_without_empty_body() {
        let envelope = RelayEnvelope {
            request_id: 9,
            url: "https://jira.example.com/rest/api/2/search",
            method: "GET",
            headers: BTreeMap::new(),
            body: None,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["requestId"], 9);
        assert_eq!(json["method"], "GET");
        assert!(json.get("body").is_none());
    }

    #[test]
    fn exhaustion_reports_the_last_error_verbatim() {
        let err = TransportError::Exhausted {
            last: Box::new(TransportError::Status {
                status: 502,
                status_text: "Bad Gateway".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "all transport strategies failed: HTTP 502: Bad Gateway"
        );
    }

    #[test]
    fn request_options_default_to_get_without_budget() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(options.headers.is_empty());
        assert!(options.body.is_none());
        assert!(options.timeout.is_none());
    }
}
