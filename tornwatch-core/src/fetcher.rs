// src/fetcher.rs

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use tornwatch_common::error::FetchError;
use tornwatch_common::models::ApiKey;

use crate::http::{HttpClient, HttpResponse, TransportError};
use crate::Error;

const PRIMARY_SELECTIONS: &str = "bars,cooldowns,refills,personalstats,notifications,travel";

/// Bounded GET plus classification. Holds no state besides the client.
#[derive(Clone)]
pub struct RemoteFetcher {
    client: Arc<dyn HttpClient>,
}

impl RemoteFetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        // The outer timeout also bounds clients that ignore the per-request one.
        let reply = match tokio::time::timeout(timeout, self.client.get(url, timeout)).await {
            Err(_) => return Err(FetchError::Timeout),
            Ok(Err(TransportError::Timeout)) => return Err(FetchError::Timeout),
            Ok(Err(TransportError::Network(msg))) => return Err(FetchError::Network(msg)),
            Ok(Ok(reply)) => reply,
        };
        classify_response(reply)
    }
}

/// Maps a raw reply to a JSON body or a `FetchError`.
pub fn classify_response(reply: HttpResponse) -> Result<Value, FetchError> {
    let parsed: Result<Value, _> = serde_json::from_str(&reply.body);

    if !reply.is_success() {
        return match parsed.ok().as_ref().and_then(api_error_code) {
            Some(code) => Err(FetchError::Api(code)),
            None => Err(FetchError::Http(reply.status)),
        };
    }

    let body = parsed.map_err(|e| FetchError::Malformed(e.to_string()))?;
    if let Some(code) = api_error_code(&body) {
        debug!("2xx response carried application error {}", code);
        return Err(FetchError::Api(code));
    }
    Ok(body)
}

/// `{"error": {"code": N, ...}}`
fn api_error_code(body: &Value) -> Option<i64> {
    body.get("error")?.get("code")?.as_i64()
}

/// URLs of the two remote resources.
#[derive(Debug, Clone)]
pub struct Endpoints {
    primary: Url,
    races: Url,
    comment: String,
}

impl Endpoints {
    pub fn new(base: &str, comment: &str) -> Result<Self, Error> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            primary: base.join("user/")?,
            races: base.join("v2/user/races")?,
            comment: comment.to_string(),
        })
    }

    pub fn primary_url(&self, key: &ApiKey) -> String {
        let mut url = self.primary.clone();
        url.set_query(Some(&format!(
            "selections={}&key={}&comment={}",
            PRIMARY_SELECTIONS,
            key.as_str(),
            self.comment
        )));
        url.into()
    }

    pub fn race_url(&self, key: &ApiKey) -> String {
        let mut url = self.races.clone();
        url.set_query(Some(&format!(
            "limit=1&sort=DESC&key={}&comment={}",
            key.as_str(),
            self.comment
        )));
        url.into()
    }
}
