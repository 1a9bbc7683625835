use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::models::{RawIssue, SearchPage};
use crate::transport::TransportError;

#[derive(Debug, Clone)]
pub struct FetchCaps {
    pub page_size: u64,
    pub max_total_records: usize,
    pub max_iterations: u32,
    pub page_delay: Duration,
}

impl Default for FetchCaps {
    fn default() -> Self {
        FetchCaps {
            page_size: 100,
            max_total_records: 5000,
            max_iterations: 50,
            page_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub issues: Vec<RawIssue>,
    pub total: usize,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("fetch aborted: {0}")]
    Aborted(#[from] TransportError),
}

// Pulls an unbounded paged collection through `fetch_page`, one page at a
// time. Pages from a live search index can overlap or repeat, so records are
// deduplicated by key and the loop carries three independent termination
// guards (short page, repeated page, reported total) on top of the hard caps.
// A transport failure aborts the whole fetch; partial results are discarded.
pub async fn fetch_all_pages<F, Fut>(
    mut fetch_page: F,
    caps: &FetchCaps,
) -> Result<FetchOutcome, FetchError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<SearchPage, TransportError>>,
{
    let mut start_at: u64 = 0;
    let mut collected: Vec<RawIssue> = Vec::new();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut iteration: u32 = 0;

    while iteration < caps.max_iterations && collected.len() < caps.max_total_records {
        let page = fetch_page(start_at).await?;

        let Some(records) = page.issues else {
            println!("Search response had no issue list, treating as end of data");
            break;
        };
        if records.is_empty() {
            break;
        }

        let page_len = records.len();
        let mut fresh: Vec<RawIssue> = Vec::new();
        let mut duplicates = 0usize;
        for record in records {
            if seen_keys.contains(&record.key) {
                duplicates += 1;
            } else {
                seen_keys.insert(record.key.clone());
                fresh.push(record);
            }
        }
        if duplicates > 0 {
            println!(
                "Page at startAt {} repeated {} of {} records",
                start_at, duplicates, page_len
            );
        }

        // the server is re-serving data it already gave us
        if duplicates == page_len {
            println!("Entire page already seen, stopping");
            break;
        }

        let mut capped = false;
        for record in fresh {
            if collected.len() >= caps.max_total_records {
                capped = true;
                break;
            }
            collected.push(record);
        }
        if capped {
            println!("Reached the {} record cap, stopping", caps.max_total_records);
            break;
        }

        // a short page is the last page
        if page_len < caps.page_size as usize {
            break;
        }

        // the reported total is advisory; zero means the server did not know
        if let Some(total) = page.total.filter(|&t| t > 0) {
            if start_at >= total || collected.len() as u64 >= total {
                break;
            }
        }

        start_at += caps.page_size;
        iteration += 1;
        tokio::time::sleep(caps.page_delay).await;
    }

    if iteration >= caps.max_iterations {
        println!("Reached the {} request cap, stopping", caps.max_iterations);
    }

    let total = collected.len();
    println!("Fetched {} unique records", total);
    Ok(FetchOutcome {
        issues: collected,
        total,
    })
}
