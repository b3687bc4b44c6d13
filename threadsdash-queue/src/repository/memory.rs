use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use threadsdash_shared::errors::{AppError, AppResult, ErrorCode};
use threadsdash_shared::types::{HealthCheck, Post, PostStatus, QueueSlot, SlotTime};

use super::{PostRepository, QueueRepository, SlotRepository};

/// In-memory store with the same ordering and conditional-write rules as
/// the Postgres store.
#[derive(Default)]
pub struct MemoryQueueStore {
    slots: Mutex<Vec<QueueSlot>>,
    posts: Mutex<Vec<Post>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.lock().unwrap_or_else(PoisonError::into_inner).push(post);
    }

    pub fn post(&self, post_id: Uuid) -> Option<Post> {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }
}

impl SlotRepository for MemoryQueueStore {
    fn list_active_slots(&self, account_id: Uuid) -> AppResult<Vec<QueueSlot>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut active: Vec<QueueSlot> = slots
            .iter()
            .filter(|s| s.account_id == account_id && s.is_active)
            .cloned()
            .collect();
        // Stable: insertion order survives within a day.
        active.sort_by_key(|s| s.day_of_week);
        Ok(active)
    }

    fn list_slots(&self, account_id: Uuid) -> AppResult<Vec<QueueSlot>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<QueueSlot> = slots
            .iter()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect();
        all.sort_by_key(|s| (s.day_of_week, s.time));
        Ok(all)
    }

    fn create_slot(&self, account_id: Uuid, day_of_week: u8, time: SlotTime) -> AppResult<QueueSlot> {
        let slot = QueueSlot {
            id: Uuid::new_v4(),
            account_id,
            day_of_week,
            time,
            is_active: true,
        };
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(slot.clone());
        Ok(slot)
    }

    fn set_slot_active(&self, slot_id: Uuid, is_active: bool) -> AppResult<QueueSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| AppError::new(ErrorCode::SlotNotFound, format!("queue slot {slot_id} not found")))?;
        slot.is_active = is_active;
        Ok(slot.clone())
    }

    fn delete_slot(&self, slot_id: Uuid) -> AppResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|s| s.id != slot_id);
        if slots.len() == before {
            return Err(AppError::new(ErrorCode::SlotNotFound, format!("queue slot {slot_id} not found")));
        }
        Ok(())
    }
}

impl PostRepository for MemoryQueueStore {
    fn get_post(&self, post_id: Uuid) -> AppResult<Post> {
        self.post(post_id)
            .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, format!("post {post_id} not found")))
    }

    fn list_scheduled_post_timestamps(&self, account_id: Uuid) -> AppResult<HashSet<DateTime<Utc>>> {
        let posts = self.posts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(posts
            .iter()
            .filter(|p| p.account_id == account_id && p.status == PostStatus::Scheduled)
            .filter_map(|p| p.scheduled_for)
            .collect())
    }

    fn update_post_schedule(&self, post_id: Uuid, at: DateTime<Utc>) -> AppResult<Post> {
        let mut posts = self.posts.lock().unwrap_or_else(PoisonError::into_inner);

        let idx = posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, format!("post {post_id} not found")))?;

        if posts[idx].is_published() {
            return Err(AppError::new(ErrorCode::PostAlreadyPublished, format!("post {post_id} is already published")));
        }

        let account_id = posts[idx].account_id;
        let taken = posts.iter().any(|p| {
            p.id != post_id
                && p.account_id == account_id
                && p.status == PostStatus::Scheduled
                && p.scheduled_for == Some(at)
        });
        if taken {
            return Err(AppError::new(ErrorCode::SlotAlreadyTaken, format!("slot {at} is already taken")));
        }

        let post = &mut posts[idx];
        post.status = PostStatus::Scheduled;
        post.scheduled_for = Some(at);
        Ok(post.clone())
    }
}

impl QueueRepository for MemoryQueueStore {
    fn check_health(&self) -> HealthCheck {
        HealthCheck::healthy("memory")
    }
}
