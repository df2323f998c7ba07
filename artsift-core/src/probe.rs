//! Per-item verification: one bounded GET per target, classified per source.
//!
//! HTTP access goes through the [`ProbeHttpClient`] seam; production uses
//! reqwest, tests and embedders can substitute [`ScriptedProbeClient`].
//! Every transport or decode fault is absorbed here and reported as
//! [`Verification::Absent`], so a single bad item can never abort a batch.

use crate::error::ProbeError;
use crate::source::Source;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// JSON field holding the Met's primary image URL.
const MET_PRIMARY_IMAGE_FIELD: &str = "primaryImage";

/// Host whose 200 responses still need a body sniff.
const DROPBOX_HOST_PREFIX: &str = "https://www.dropbox.com";

/// Leading bytes of an HTML doctype declaration, which is what a dead
/// dropbox share serves instead of image bytes.
const HTML_DOCTYPE_PREFIX: &[u8] = b"<!DOCTYPE";

/// How many leading body bytes the Europeana check reads. Only this much
/// of the payload is ever downloaded.
pub const PREFIX_PROBE_LEN: usize = HTML_DOCTYPE_PREFIX.len();

/// Outcome of verifying one lookup target.
///
/// A tagged type rather than an empty-string sentinel, so "no result" and
/// "empty value" cannot be confused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The target resolved to a usable image URL.
    Valid(String),
    /// No usable image behind this target.
    Absent,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Verification::Valid(url) => Some(url),
            Verification::Absent => None,
        }
    }
}

/// HTTP access used by the verifier.
#[async_trait]
pub trait ProbeHttpClient: Send + Sync {
    /// GET `url` and parse the body as JSON. `Ok(None)` means a
    /// non-success status; transport and decode faults are `Err`.
    async fn get_json(&self, url: &str) -> Result<Option<serde_json::Value>, ProbeError>;

    /// GET `url` and read at most `limit` leading body bytes, abandoning
    /// the rest of the payload. `Ok(None)` means a non-success status.
    async fn get_prefix(&self, url: &str, limit: usize) -> Result<Option<Vec<u8>>, ProbeError>;
}

/// Production client backed by a reqwest connection pool.
///
/// One instance is built per pipeline invocation and dropped with it,
/// which tears the pool down on every exit path.
pub struct ReqwestProbeClient {
    client: reqwest::Client,
}

impl ReqwestProbeClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeHttpClient for ReqwestProbeClient {
    async fn get_json(&self, url: &str) -> Result<Option<serde_json::Value>, ProbeError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    async fn get_prefix(&self, url: &str, limit: usize) -> Result<Option<Vec<u8>>, ProbeError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let mut prefix = Vec::with_capacity(limit);
        let mut body = response.bytes_stream();
        while prefix.len() < limit {
            match body.next().await {
                Some(chunk) => {
                    let chunk = chunk?;
                    let take = (limit - prefix.len()).min(chunk.len());
                    prefix.extend_from_slice(&chunk[..take]);
                }
                None => break,
            }
        }
        // dropping `body` here closes the connection without reading the rest
        Ok(Some(prefix))
    }
}

/// One canned outcome for a scripted URL.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Success status with a JSON body.
    Json(serde_json::Value),
    /// Success status with raw body bytes.
    Bytes(Vec<u8>),
    /// Non-success status.
    Status(u16),
    /// Transport failure.
    Error(String),
}

/// Scripted in-memory client mapping request URLs to canned outcomes.
///
/// URLs with no script entry fail as transport errors, which the verifier
/// classifies as absent.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbeClient {
    responses: HashMap<String, ScriptedResponse>,
}

impl ScriptedProbeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: ScriptedResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }
}

#[async_trait]
impl ProbeHttpClient for ScriptedProbeClient {
    async fn get_json(&self, url: &str) -> Result<Option<serde_json::Value>, ProbeError> {
        match self.responses.get(url) {
            Some(ScriptedResponse::Json(body)) => Ok(Some(body.clone())),
            Some(ScriptedResponse::Bytes(_)) => {
                Err(ProbeError::Other(format!("scripted body for {url} is not JSON")))
            }
            Some(ScriptedResponse::Status(_)) => Ok(None),
            Some(ScriptedResponse::Error(message)) => Err(ProbeError::Other(message.clone())),
            None => Err(ProbeError::Other(format!("no scripted response for {url}"))),
        }
    }

    async fn get_prefix(&self, url: &str, limit: usize) -> Result<Option<Vec<u8>>, ProbeError> {
        match self.responses.get(url) {
            Some(ScriptedResponse::Bytes(body)) => {
                Ok(Some(body.iter().copied().take(limit).collect()))
            }
            Some(ScriptedResponse::Json(_)) => {
                Err(ProbeError::Other(format!("scripted body for {url} is JSON")))
            }
            Some(ScriptedResponse::Status(_)) => Ok(None),
            Some(ScriptedResponse::Error(message)) => Err(ProbeError::Other(message.clone())),
            None => Err(ProbeError::Other(format!("no scripted response for {url}"))),
        }
    }
}

/// Verify one request URL against its source's rules.
///
/// Every fault is absorbed at this boundary; callers only ever see a
/// [`Verification`].
pub async fn verify(client: &dyn ProbeHttpClient, request_url: &str, source: Source) -> Verification {
    match probe(client, request_url, source).await {
        Ok(verification) => verification,
        Err(e) => {
            debug!(url = %request_url, error = %e, "probe failed, treating as absent");
            Verification::Absent
        }
    }
}

async fn probe(
    client: &dyn ProbeHttpClient,
    request_url: &str,
    source: Source,
) -> Result<Verification, ProbeError> {
    match source {
        Source::Met => {
            let Some(body) = client.get_json(request_url).await? else {
                return Ok(Verification::Absent);
            };
            match body.get(MET_PRIMARY_IMAGE_FIELD).and_then(|v| v.as_str()) {
                Some(url) if !url.is_empty() => Ok(Verification::Valid(url.to_string())),
                _ => Ok(Verification::Absent),
            }
        }
        Source::Europeana => {
            let Some(prefix) = client.get_prefix(request_url, PREFIX_PROBE_LEN).await? else {
                return Ok(Verification::Absent);
            };
            Ok(classify_prefix(request_url, &prefix))
        }
    }
}

/// Dropbox shares can answer 200 with an HTML landing page instead of the
/// shared file; a 9-byte sniff tells the two apart. Fragile: it assumes a
/// live share starts with binary image data, so a non-doctype text
/// response still passes. Other hosts are trusted without inspection.
fn classify_prefix(url: &str, prefix: &[u8]) -> Verification {
    if url.starts_with(DROPBOX_HOST_PREFIX) && prefix == HTML_DOCTYPE_PREFIX {
        debug!(url, "dropbox share answered with an HTML page");
        Verification::Absent
    } else {
        Verification::Valid(url.to_string())
    }
}
