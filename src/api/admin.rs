//! Manual match management. Every route requires `Authorization: Bearer <ADMIN_TOKEN>`;
//! without a configured token the whole surface is disabled.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};

use crate::db;
use crate::models::{ApiResponse, ManualMatch, ManualMatchInput, StatusReport};

use super::{ApiError, AppState};

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(ApiError::forbidden("Admin access is disabled"));
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::unauthorized("Invalid or missing admin token")),
    }
}

fn validated(input: &ManualMatchInput) -> Result<(), ApiError> {
    input.validate().map_err(ApiError::bad_request)
}

// GET /admin/matches
pub(super) async fn list_matches(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<ManualMatch>>>, ApiError> {
    authorize(&state, &headers)?;

    let matches = db::list_manual_matches(&state.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load manual matches: {}", e)))?;

    Ok(Json(ApiResponse::success(matches)))
}

// POST /admin/matches
pub(super) async fn create_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ManualMatchInput>,
) -> Result<(StatusCode, Json<ApiResponse<ManualMatch>>), ApiError> {
    authorize(&state, &headers)?;
    validated(&input)?;

    let created = db::insert_manual_match(&state.pool, &input)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save manual match: {}", e)))?;

    tracing::info!("Manual match added: {} vs {}", created.home_team, created.away_team);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

// PUT /admin/matches/{id}
pub(super) async fn update_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ManualMatchInput>,
) -> Result<Json<ApiResponse<ManualMatch>>, ApiError> {
    authorize(&state, &headers)?;
    validated(&input)?;

    let updated = db::update_manual_match(&state.pool, &id, &input)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update manual match: {}", e)))?
        .ok_or_else(|| ApiError::not_found(format!("Manual match '{}' not found", id)))?;

    Ok(Json(ApiResponse::success(updated)))
}

// DELETE /admin/matches/{id}
pub(super) async fn delete_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;

    let deleted = db::delete_manual_match(&state.pool, &id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete manual match: {}", e)))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Manual match '{}' not found", id)))
    }
}

// POST /admin/refresh - run a cycle now instead of waiting for the timer
pub(super) async fn refresh_now(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<StatusReport>>, ApiError> {
    authorize(&state, &headers)?;
    tracing::info!("Manual refresh requested");
    Ok(Json(ApiResponse::success(state.refresher.refresh().await)))
}
