// src/tasks/update_check.rs

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::fetcher::RemoteFetcher;
use crate::http::HttpClient;
use crate::Error;

const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    tag_name: Option<String>,
}

/// Dotted numeric comparison with an optional leading `v`. Missing or
/// non-numeric components count as 0, so `1.2` equals `1.2.0`.
pub fn is_newer_version(latest_tag: &str, current: &str) -> bool {
    let latest = version_parts(latest_tag);
    let current = version_parts(current);
    for i in 0..latest.len().max(current.len()) {
        let l = latest.get(i).copied().unwrap_or(0);
        let c = current.get(i).copied().unwrap_or(0);
        if l != c {
            return l > c;
        }
    }
    false
}

fn version_parts(tag: &str) -> Vec<u64> {
    tag.trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

/// Returns the newer release tag, if there is one.
pub async fn check_for_update(
    client: Arc<dyn HttpClient>,
    releases_url: &str,
    current_version: &str,
) -> Result<Option<String>, Error> {
    let body = RemoteFetcher::new(client)
        .fetch(releases_url, UPDATE_CHECK_TIMEOUT)
        .await?;
    let release: ReleaseInfo = serde_json::from_value(body)?;
    Ok(release
        .tag_name
        .filter(|tag| is_newer_version(tag, current_version)))
}

/// One-shot background check that only logs its result.
pub fn spawn_update_check(
    client: Arc<dyn HttpClient>,
    releases_url: String,
    current_version: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match check_for_update(client, &releases_url, &current_version).await {
            Ok(Some(tag)) => info!("Update to {} available (running {})", tag, current_version),
            Ok(None) => info!("Running the latest release ({})", current_version),
            Err(e) => error!("Failed to check for updates: {}", e),
        }
    })
}
