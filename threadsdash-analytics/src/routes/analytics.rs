use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use threadsdash_shared::errors::{AppError, AppResult, ErrorCode};
use threadsdash_shared::types::{ApiResponse, DailyAnalytics, DateRange, Post};

use crate::services::export::daily_analytics_csv;
use crate::services::insights::{generate_insights, Insight};
use crate::services::performance::{
    compute_optimal_time_slots, rank_top_posts, summarize_period, OptimalTimeSlot, PeriodSummary, TopPost,
};
use crate::AppState;

/// Days covered when the caller gives no `from`.
const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Deserialize, Validate)]
pub struct RangeQuery {
    /// Start date in YYYY-MM-DD format
    pub from: Option<String>,
    /// End date in YYYY-MM-DD format
    pub to: Option<String>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid '{field}' date format, expected YYYY-MM-DD")))
}

impl RangeQuery {
    /// Resolve against `today`: `to` defaults to today, `from` to the
    /// 30 days ending at `to`.
    pub fn resolve(&self, today: NaiveDate) -> AppResult<DateRange> {
        self.validate()
            .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

        let to = self.to.as_deref().map(|v| parse_date(v, "to")).transpose()?.unwrap_or(today);
        let from = match self.from.as_deref() {
            Some(v) => parse_date(v, "from")?,
            None => DateRange::last_days(to, DEFAULT_RANGE_DAYS).from,
        };
        DateRange::new(from, to)
    }
}

fn posts_in_range(state: &AppState, account_id: Uuid, range: DateRange) -> AppResult<Vec<Post>> {
    let posts = state.store.list_published_posts(account_id, Some(range))?;
    Ok(posts
        .into_iter()
        .filter(|p| p.published_at.is_some_and(|at| range.contains(&at, &Local)))
        .collect())
}

fn sorted_snapshots(state: &AppState, account_id: Uuid, range: DateRange) -> AppResult<Vec<DailyAnalytics>> {
    let mut snapshots = state.store.list_daily_analytics(account_id, range)?;
    snapshots.sort_by_key(|s| s.date);
    Ok(snapshots)
}

// --- GET /accounts/:id/analytics/summary ---

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<PeriodSummary>>> {
    let range = query.resolve(Local::now().date_naive())?;
    let posts = posts_in_range(&state, account_id, range)?;
    Ok(Json(ApiResponse::ok(summarize_period(&posts, range, &Local))))
}

// --- GET /accounts/:id/analytics/top-posts ---

pub async fn get_top_posts(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<TopPost>>>> {
    let range = query.resolve(Local::now().date_naive())?;
    let posts = posts_in_range(&state, account_id, range)?;
    let limit = query.limit.unwrap_or(10);
    Ok(Json(ApiResponse::ok(rank_top_posts(&posts, limit))))
}

// --- GET /accounts/:id/analytics/optimal-times ---

pub async fn get_optimal_times(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<OptimalTimeSlot>>>> {
    let range = query.resolve(Local::now().date_naive())?;
    let posts = posts_in_range(&state, account_id, range)?;
    Ok(Json(ApiResponse::ok(compute_optimal_time_slots(&posts, &Local))))
}

// --- GET /accounts/:id/analytics/insights ---

pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<Insight>>>> {
    let range = query.resolve(Local::now().date_naive())?;
    let snapshots = sorted_snapshots(&state, account_id, range)?;
    let posts = posts_in_range(&state, account_id, range)?;

    let insights = generate_insights(&snapshots, &posts, range, &Local);
    tracing::debug!(account_id = %account_id, count = insights.len(), "insights generated");
    Ok(Json(ApiResponse::ok(insights)))
}

// --- GET /accounts/:id/analytics/daily ---

pub async fn get_daily(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<DailyAnalytics>>>> {
    let range = query.resolve(Local::now().date_naive())?;
    Ok(Json(ApiResponse::ok(sorted_snapshots(&state, account_id, range)?)))
}

// --- GET /accounts/:id/analytics/export.csv ---

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
) -> AppResult<impl IntoResponse> {
    let range = query.resolve(Local::now().date_naive())?;
    let snapshots = state.store.list_daily_analytics(account_id, range)?;
    let filename = format!("attachment; filename=\"analytics-{}-{}.csv\"", range.from, range.to);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        daily_analytics_csv(&snapshots),
    ))
}
