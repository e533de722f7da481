//! Fetch a third-party JSON document, keep only what the filter needs, and
//! republish it through the cache.

use std::sync::Arc;
use std::time::Duration;

use attestor_utils::text::{truncate_for_log, MAX_DIAGNOSTIC_LEN};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::{Map, Value};

use crate::{CacheError, CacheProxy};

/// Timeout for the pre-fetch itself; generous compared to the verifier's.
const PREFETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Code-hosting APIs reject requests without a user agent.
const PREFETCH_USER_AGENT: &str = concat!("attestor/", env!("CARGO_PKG_VERSION"));

/// Pre-fetches sources and publishes minimised copies through the cache.
pub struct Prefetcher {
    http: reqwest::Client,
    cache: Arc<CacheProxy>,
    public_base_url: Option<String>,
}

impl Prefetcher {
    pub fn new(cache: Arc<CacheProxy>, public_base_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PREFETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            cache,
            public_base_url: public_base_url.filter(|u| !u.trim().is_empty()),
        }
    }

    /// The configured public base URL, or [`CacheError::MissingPublicUrl`].
    pub fn public_base_url(&self) -> Result<&str, CacheError> {
        self.public_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .ok_or(CacheError::MissingPublicUrl)
    }

    /// Fetch `source_url`, keep the dotted `keep` paths, cache the result and
    /// return the URL the verifier should fetch instead.
    pub async fn proxy(&self, source_url: &str, keep: &[&str]) -> Result<String, CacheError> {
        let base = self.public_base_url()?;

        let response = self
            .http
            .get(source_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, PREFETCH_USER_AGENT)
            .send()
            .await
            .map_err(|e| CacheError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::Upstream {
                status: status.as_u16(),
                body: truncate_for_log(&body, MAX_DIAGNOSTIC_LEN),
            });
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| CacheError::InvalidSource(e.to_string()))?;
        let minimal = minimise(&document, keep);
        let key = self.cache.put(&minimal)?;
        let url = format!("{base}/cache/{key}");
        tracing::info!(source = source_url, kept = keep.len(), "published proxied source");
        Ok(url)
    }
}

/// Project `document` onto the given dotted paths, preserving nesting so the
/// same filter expression works against the copy. Missing paths become `null`.
pub fn minimise(document: &Value, keep: &[&str]) -> Value {
    let mut out = Map::new();
    for path in keep {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }
        let value = segments
            .iter()
            .try_fold(document, |node, seg| node.get(seg))
            .cloned()
            .unwrap_or(Value::Null);
        insert_path(&mut out, &segments, value);
    }
    Value::Object(out)
}

fn insert_path(target: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = target
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}
