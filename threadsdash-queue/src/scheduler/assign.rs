use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use threadsdash_shared::errors::{AppError, AppResult, ErrorCode};
use threadsdash_shared::types::Post;

use super::slots::{find_next_available_slot, SlotSearch, HORIZON_DAYS};
use crate::repository::QueueRepository;

/// One mutex per account so that the read-check-write of an assignment
/// never interleaves with another assignment for the same account.
#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(account_id).or_default().clone()
    }

    /// Drop the account's entry once the caller was its last holder.
    /// Clones are only handed out under the map lock, so a count of two
    /// (map plus `lock`) means nobody else is waiting on it.
    fn release(&self, account_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) <= 2 {
            map.remove(&account_id);
        }
    }

    #[cfg(test)]
    fn tracked_accounts(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Put `post_id` on the account's queue at the next free slot.
pub fn assign_post_to_queue<R, Tz>(
    repo: &R,
    locks: &AccountLocks,
    account_id: Uuid,
    post_id: Uuid,
    now: &DateTime<Tz>,
) -> AppResult<Post>
where
    R: QueueRepository + ?Sized,
    Tz: TimeZone,
{
    let lock = locks.lock_for(account_id);
    let result = {
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        assign_locked(repo, account_id, post_id, now)
    };
    locks.release(account_id, lock);

    let outcome = match &result {
        Ok(_) => "scheduled",
        Err(e) => match e.code() {
            Some(ErrorCode::NoActiveSlots) => "no_slots",
            Some(ErrorCode::NoAvailableSlot) => "horizon_exhausted",
            Some(ErrorCode::SlotAlreadyTaken) => "slot_taken",
            _ => "rejected",
        },
    };
    counter!("queue_assignments_total", "outcome" => outcome).increment(1);

    result
}

fn assign_locked<R, Tz>(
    repo: &R,
    account_id: Uuid,
    post_id: Uuid,
    now: &DateTime<Tz>,
) -> AppResult<Post>
where
    R: QueueRepository + ?Sized,
    Tz: TimeZone,
{
    let post = repo.get_post(post_id)?;

    if post.account_id != account_id {
        return Err(AppError::with_details(
            ErrorCode::PostNotOwned,
            "post does not belong to account",
            serde_json::json!({ "postId": post_id, "accountId": account_id }),
        ));
    }
    if post.is_published() {
        return Err(AppError::new(
            ErrorCode::PostAlreadyPublished,
            format!("post {post_id} is already published"),
        ));
    }

    let slots = repo.list_active_slots(account_id)?;
    let scheduled = repo.list_scheduled_post_timestamps(account_id)?;

    match find_next_available_slot(&slots, &scheduled, now) {
        SlotSearch::Found(at) => {
            let updated = repo.update_post_schedule(post_id, at)?;
            tracing::info!(
                post_id = %post_id,
                account_id = %account_id,
                scheduled_for = %at,
                "post queued"
            );
            Ok(updated)
        }
        SlotSearch::NoSlotsConfigured => {
            tracing::debug!(account_id = %account_id, "no active queue slots");
            Err(AppError::new(
                ErrorCode::NoActiveSlots,
                "no active queue slots configured",
            ))
        }
        SlotSearch::HorizonExhausted => {
            tracing::debug!(
                account_id = %account_id,
                active_slots = slots.len(),
                scheduled = scheduled.len(),
                "queue horizon exhausted"
            );
            Err(AppError::new(
                ErrorCode::NoAvailableSlot,
                format!("no available slot within {HORIZON_DAYS} days"),
            ))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub post_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub code: &'static str,
    pub message: String,
}

impl BatchOutcome {
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_for.is_some()
    }
}

/// Queue each post in order. A failed post does not undo earlier
/// assignments and does not stop the remaining ones.
pub fn batch_enqueue<R, Tz>(
    repo: &R,
    locks: &AccountLocks,
    account_id: Uuid,
    post_ids: &[Uuid],
    now: &DateTime<Tz>,
) -> Vec<BatchOutcome>
where
    R: QueueRepository + ?Sized,
    Tz: TimeZone,
{
    post_ids
        .iter()
        .map(|&post_id| match assign_post_to_queue(repo, locks, account_id, post_id, now) {
            Ok(post) => BatchOutcome {
                post_id,
                scheduled_for: post.scheduled_for,
                error: None,
            },
            Err(e) => {
                tracing::warn!(post_id = %post_id, account_id = %account_id, error = %e, "batch enqueue skipped post");
                BatchOutcome {
                    post_id,
                    scheduled_for: None,
                    error: Some(BatchError {
                        code: e.code().map(|c| c.code()).unwrap_or("E0001"),
                        message: e.to_string(),
                    }),
                }
            }
        })
        .collect()
}
