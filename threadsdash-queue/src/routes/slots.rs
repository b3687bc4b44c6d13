use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use threadsdash_shared::errors::{AppError, AppResult, ErrorCode};
use threadsdash_shared::types::{ApiResponse, QueueSlot, SlotTime};

use crate::AppState;

// --- GET /accounts/:account_id/slots ---

pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<QueueSlot>>>> {
    let slots = state.store.list_slots(account_id)?;
    Ok(Json(ApiResponse::ok(slots)))
}

// --- POST /accounts/:account_id/slots ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    #[validate(range(min = 0, max = 6, message = "dayOfWeek must be between 0 (Sunday) and 6 (Saturday)"))]
    pub day_of_week: i32,
    #[validate(length(equal = 5, message = "time must be HH:MM"))]
    pub time: String,
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<CreateSlotRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<QueueSlot>>)> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let time: SlotTime = req.time.parse()?;
    let day_of_week = u8::try_from(req.day_of_week)
        .map_err(|_| AppError::new(ErrorCode::ValidationError, "dayOfWeek out of range"))?;

    let slot = state.store.create_slot(account_id, day_of_week, time)?;

    tracing::info!(
        account_id = %account_id,
        slot_id = %slot.id,
        day_of_week,
        time = %slot.time,
        "queue slot created"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(slot))))
}

// --- PATCH /slots/:slot_id ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlotRequest {
    pub is_active: bool,
}

pub async fn update_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<Uuid>,
    Json(req): Json<UpdateSlotRequest>,
) -> AppResult<Json<ApiResponse<QueueSlot>>> {
    let slot = state.store.set_slot_active(slot_id, req.is_active)?;
    tracing::info!(slot_id = %slot_id, is_active = req.is_active, "queue slot updated");
    Ok(Json(ApiResponse::ok(slot)))
}

// --- DELETE /slots/:slot_id ---

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.store.delete_slot(slot_id)?;
    tracing::info!(slot_id = %slot_id, "queue slot deleted");
    Ok(StatusCode::NO_CONTENT)
}
