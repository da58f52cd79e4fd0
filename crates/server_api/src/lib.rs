use shared::{
    domain::ResponseKind,
    error::{ApiError, ErrorCode},
    protocol::{ResponsePayload, StatsPayload, StatusCheckPayload},
};
use storage::{Storage, StoredResponse, StoredStatusCheck};
use tracing::info;

/// Everything a request handler needs. The service itself is stateless; all
/// state lives behind the storage handle.
#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// The only write path. `raw_kind` is validated here, before storage is
/// touched: a kind outside {yes, maybe} is rejected as-is, never coerced.
pub async fn record_response(
    ctx: &ApiContext,
    raw_kind: &str,
    user_agent: Option<&str>,
    ip_address: Option<&str>,
) -> Result<ResponsePayload, ApiError> {
    let kind: ResponseKind = raw_kind
        .parse()
        .map_err(|e: shared::domain::InvalidResponseKind| {
            ApiError::new(ErrorCode::Validation, e.to_string())
        })?;

    let stored = ctx
        .storage
        .insert_response(kind, user_agent, ip_address)
        .await
        .map_err(internal)?;
    info!(kind = kind.as_str(), timestamp = %stored.created_at, "response recorded");
    Ok(response_payload(stored))
}

pub async fn get_responses(ctx: &ApiContext) -> Result<Vec<ResponsePayload>, ApiError> {
    let responses = ctx.storage.list_responses().await.map_err(internal)?;
    Ok(responses.into_iter().map(response_payload).collect())
}

/// Counts are read per kind plus a total; the schema only admits the two
/// kinds, so `total_responses == yes_count + maybe_count` holds at all times.
pub async fn get_stats(ctx: &ApiContext) -> Result<StatsPayload, ApiError> {
    let total_responses = ctx.storage.count_all_responses().await.map_err(internal)?;
    let yes_count = ctx
        .storage
        .count_responses(ResponseKind::Yes)
        .await
        .map_err(internal)?;
    let maybe_count = ctx
        .storage
        .count_responses(ResponseKind::Maybe)
        .await
        .map_err(internal)?;
    let latest_response = ctx
        .storage
        .latest_response()
        .await
        .map_err(internal)?
        .map(response_payload);

    Ok(StatsPayload {
        total_responses,
        yes_count,
        maybe_count,
        latest_response,
    })
}

pub async fn record_status_check(
    ctx: &ApiContext,
    client_name: &str,
) -> Result<StatusCheckPayload, ApiError> {
    let trimmed = client_name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "client_name cannot be empty",
        ));
    }
    let stored = ctx
        .storage
        .insert_status_check(trimmed)
        .await
        .map_err(internal)?;
    Ok(status_check_payload(stored))
}

pub async fn get_status_checks(ctx: &ApiContext) -> Result<Vec<StatusCheckPayload>, ApiError> {
    let checks = ctx.storage.list_status_checks().await.map_err(internal)?;
    Ok(checks.into_iter().map(status_check_payload).collect())
}

fn response_payload(stored: StoredResponse) -> ResponsePayload {
    ResponsePayload {
        id: stored.id,
        response: stored.kind,
        timestamp: stored.created_at,
        user_agent: stored.user_agent,
        ip_address: stored.ip_address,
    }
}

fn status_check_payload(stored: StoredStatusCheck) -> StatusCheckPayload {
    StatusCheckPayload {
        id: stored.id,
        client_name: stored.client_name,
        timestamp: stored.created_at,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
