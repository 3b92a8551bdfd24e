use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue},
    Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::{
    proxy::headers::referer_headers,
    types::{OutboundCall, OutboundResult, ProxyError, QrisPayload, QrisQuery, QrisRequest, Result},
};

/// Accepts a caller-supplied id only if it is one plain URL path segment,
/// so it cannot move the outbound call off its fixed prefix.
fn path_segment<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    if value.is_empty() || value == "." || value == ".." || !plain {
        return Err(ProxyError::BadRequest(format!("Invalid {}", name)));
    }
    Ok(value)
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Saweria Payment Gateway API is running"
    }))
}

pub async fn calculate_fee(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OutboundResult>> {
    let request_data: Value = serde_json::from_slice(&body)
        .map_err(|_| ProxyError::BadRequest("Invalid JSON in request body".to_string()))?;
    tracing::info!("Calculate fee request received");

    let path = format!(
        "/donations/{}/calculate_pg_amount",
        state.config.upstream.username
    );

    let mut outbound = referer_headers(&headers);
    outbound.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let response = state
        .upstream
        .call(OutboundCall::post(path, outbound, request_data))
        .await?;
    Ok(Json(response))
}

pub async fn qris_generator(
    State(state): State<AppState>,
    Query(query): Query<QrisQuery>,
    headers: HeaderMap,
    payload: std::result::Result<Json<QrisRequest>, JsonRejection>,
) -> Result<Json<OutboundResult>> {
    let Json(request) = payload.map_err(|e| ProxyError::BadRequest(e.body_text()))?;
    tracing::info!(
        "QRIS generator request received for {} ({}) - Amount: {}",
        request.first_name,
        request.email,
        request.amount
    );

    let donation_id = match query.donation_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => state.config.upstream.donation_id.as_str(),
    };
    let path = format!("/donations/snap/{}", path_segment("donation_id", donation_id)?);

    let body = serde_json::to_value(QrisPayload::from(request))
        .map_err(|e| ProxyError::Internal(format!("Failed to serialize payload: {}", e)))?;

    let mut outbound = referer_headers(&headers);
    outbound.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let response = state
        .upstream
        .call(OutboundCall::post(path, outbound, body))
        .await?;
    Ok(Json(response))
}

pub async fn payment_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<OutboundResult>> {
    let payment_id = path_segment("payment_id", &payment_id)?;
    tracing::info!("Payment status request for ID: {}", payment_id);

    let path = format!("/donations/qris/snap/{}", payment_id);

    let mut outbound = referer_headers(&headers);
    outbound.insert(
        axum::http::header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );

    let response = state
        .upstream
        .call(OutboundCall::get(path, outbound))
        .await?;
    Ok(Json(response))
}
