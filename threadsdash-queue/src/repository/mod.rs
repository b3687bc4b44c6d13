use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use threadsdash_shared::errors::AppResult;
use threadsdash_shared::types::{HealthCheck, Post, QueueSlot, SlotTime};

mod postgres;
#[cfg(test)]
pub mod memory;

pub use postgres::PgQueueStore;

/// Read/write access to an account's recurring weekly slots.
pub trait SlotRepository: Send + Sync {
    /// Active slots ordered by day of week, then stored order.
    fn list_active_slots(&self, account_id: Uuid) -> AppResult<Vec<QueueSlot>>;

    /// Every slot of the account, ordered by day of week then time.
    fn list_slots(&self, account_id: Uuid) -> AppResult<Vec<QueueSlot>>;

    fn create_slot(&self, account_id: Uuid, day_of_week: u8, time: SlotTime) -> AppResult<QueueSlot>;

    fn set_slot_active(&self, slot_id: Uuid, is_active: bool) -> AppResult<QueueSlot>;

    fn delete_slot(&self, slot_id: Uuid) -> AppResult<()>;
}

/// The post-store operations the scheduler needs.
pub trait PostRepository: Send + Sync {
    fn get_post(&self, post_id: Uuid) -> AppResult<Post>;

    /// Instants already held by the account's scheduled posts.
    fn list_scheduled_post_timestamps(&self, account_id: Uuid) -> AppResult<HashSet<DateTime<Utc>>>;

    /// Mark the post scheduled at `at`.
    ///
    /// Conditional write: fails with `PostAlreadyPublished` if the post was
    /// published meanwhile and with `SlotAlreadyTaken` if another scheduled
    /// post of the same account already holds `at`.
    fn update_post_schedule(&self, post_id: Uuid, at: DateTime<Utc>) -> AppResult<Post>;
}

pub trait QueueRepository: SlotRepository + PostRepository {
    fn check_health(&self) -> HealthCheck;
}
