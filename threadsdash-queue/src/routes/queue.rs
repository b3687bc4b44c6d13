use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use threadsdash_shared::errors::{AppError, AppResult, ErrorCode};
use threadsdash_shared::types::{ApiResponse, Post};

use crate::events::publisher;
use crate::scheduler::assign::{self, BatchOutcome};
use crate::scheduler::slots::{find_next_available_slot, SlotSearch};
use crate::AppState;

// --- GET /accounts/:account_id/queue/next-slot ---

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NextSlotStatus {
    Found,
    NoSlotsConfigured,
    HorizonExhausted,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSlotResponse {
    pub next_slot: Option<DateTime<Utc>>,
    pub status: NextSlotStatus,
}

impl From<SlotSearch> for NextSlotResponse {
    fn from(search: SlotSearch) -> Self {
        match search {
            SlotSearch::Found(at) => Self { next_slot: Some(at), status: NextSlotStatus::Found },
            SlotSearch::NoSlotsConfigured => Self { next_slot: None, status: NextSlotStatus::NoSlotsConfigured },
            SlotSearch::HorizonExhausted => Self { next_slot: None, status: NextSlotStatus::HorizonExhausted },
        }
    }
}

/// Preview only; nothing is reserved.
pub async fn next_slot(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<NextSlotResponse>>> {
    let slots = state.store.list_active_slots(account_id)?;
    let scheduled = state.store.list_scheduled_post_timestamps(account_id)?;

    let search = find_next_available_slot(&slots, &scheduled, &Local::now());
    Ok(Json(ApiResponse::ok(search.into())))
}

// --- POST /accounts/:account_id/queue/posts/:post_id ---

pub async fn enqueue_post(
    State(state): State<Arc<AppState>>,
    Path((account_id, post_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let post = assign::assign_post_to_queue(
        &*state.store,
        &state.locks,
        account_id,
        post_id,
        &Local::now(),
    )?;

    if let (Some(rabbitmq), Some(at)) = (&state.rabbitmq, post.scheduled_for) {
        publisher::publish_post_scheduled(rabbitmq, post.id, account_id, at).await;
    }

    Ok(Json(ApiResponse::ok(post)))
}

// --- POST /accounts/:account_id/queue/batch ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchEnqueueRequest {
    #[validate(length(min = 1, max = 100, message = "postIds must hold 1 to 100 ids"))]
    pub post_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEnqueueResponse {
    pub scheduled: usize,
    pub failed: usize,
    pub results: Vec<BatchOutcome>,
}

pub async fn batch_enqueue(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<BatchEnqueueRequest>,
) -> AppResult<Json<ApiResponse<BatchEnqueueResponse>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let results = assign::batch_enqueue(
        &*state.store,
        &state.locks,
        account_id,
        &req.post_ids,
        &Local::now(),
    );

    if let Some(rabbitmq) = &state.rabbitmq {
        for outcome in &results {
            if let Some(at) = outcome.scheduled_for {
                publisher::publish_post_scheduled(rabbitmq, outcome.post_id, account_id, at).await;
            }
        }
    }

    let scheduled = results.iter().filter(|r| r.is_scheduled()).count();
    let failed = results.len() - scheduled;
    tracing::info!(account_id = %account_id, scheduled, failed, "batch enqueue finished");

    Ok(Json(ApiResponse::ok(BatchEnqueueResponse { scheduled, failed, results })))
}
