//! Typed HTTP client for the confession backend.
//!
//! Two consumers share this crate: the question page, which records the
//! visitor's answer, and the reporting view, which lists responses and
//! fetches aggregate stats. The record path comes in two flavors: a strict
//! one that surfaces errors, and a best-effort one for the page flow where
//! persistence must never block the user-visible transition.

use reqwest::{Client, StatusCode};
use shared::{
    domain::ResponseKind,
    error::ApiError,
    protocol::{RecordResponseRequest, ResponsePayload, StatsPayload},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend was unreachable or the response was not valid JSON.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-2xx status and a structured error body.
    #[error("api error ({status}): {error}")]
    Api { status: StatusCode, error: ApiError },
}

/// Outcome of a best-effort record attempt. There is no error variant on
/// purpose: the caller shows its confirmation view either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded(Box<ResponsePayload>),
    Dropped,
}

#[derive(Clone)]
pub struct ConfessionClient {
    http: Client,
    base_url: String,
}

impl ConfessionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn record_response(
        &self,
        kind: ResponseKind,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<ResponsePayload, ClientError> {
        let request = RecordResponseRequest {
            response: kind.as_str().to_string(),
            user_agent,
            ip_address,
        };
        let response = self
            .http
            .post(self.url("/api/confession/response"))
            .json(&request)
            .send()
            .await?;
        decode(response).await
    }

    /// Fire the write and report what happened without failing. The caller
    /// drives its view transition off local user intent; persistence is a
    /// side channel.
    pub async fn record_response_best_effort(
        &self,
        kind: ResponseKind,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> RecordOutcome {
        match self.record_response(kind, user_agent, ip_address).await {
            Ok(payload) => RecordOutcome::Recorded(Box::new(payload)),
            Err(error) => {
                warn!(kind = kind.as_str(), %error, "failed to record response, continuing");
                RecordOutcome::Dropped
            }
        }
    }

    pub async fn fetch_responses(&self) -> Result<Vec<ResponsePayload>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/confession/responses"))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn fetch_stats(&self) -> Result<StatsPayload, ClientError> {
        let response = self
            .http
            .get(self.url("/api/confession/stats"))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let error = response.json::<ApiError>().await?;
    Err(ClientError::Api { status, error })
}
