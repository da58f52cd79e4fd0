use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ResponseId, ResponseKind, StatusCheckId};

/// A stored response as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub id: ResponseId,
    pub response: ResponseKind,
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Body of `POST /api/confession/response`. The `response` field stays a raw
/// string here so an unknown kind is rejected with a typed validation error
/// instead of a serde decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponseRequest {
    pub response: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Aggregate view served by `GET /api/confession/stats`. Derived on demand,
/// never persisted. `total_responses == yes_count + maybe_count` always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub total_responses: i64,
    pub yes_count: i64,
    pub maybe_count: i64,
    pub latest_response: Option<ResponsePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheckPayload {
    pub id: StatusCheckId,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatusCheckRequest {
    pub client_name: String,
}
