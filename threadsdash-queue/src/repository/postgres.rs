use std::collections::HashSet;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Timestamptz, Uuid as SqlUuid};
use uuid::Uuid;

use threadsdash_shared::clients::db::{check_database, get_conn, DbPool};
use threadsdash_shared::errors::{AppError, AppResult, ErrorCode};
use threadsdash_shared::types::{HealthCheck, Post, PostRow, PostStatus, QueueSlot, SlotTime};

use super::{PostRepository, QueueRepository, SlotRepository};
use crate::models::{slots_from_rows, NewQueueSlot, QueueSlotRow};
use crate::schema::{posts, queue_slots};

/// Diesel-backed store over the `posts` and `queue_slots` tables.
pub struct PgQueueStore {
    pool: DbPool,
}

impl PgQueueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn slot_not_found(slot_id: Uuid) -> impl FnOnce(DieselError) -> AppError {
    move |e| match e {
        DieselError::NotFound => AppError::new(
            ErrorCode::SlotNotFound,
            format!("queue slot {slot_id} not found"),
        ),
        other => AppError::Database(other),
    }
}

fn slot_taken(at: DateTime<Utc>) -> AppError {
    AppError::new(ErrorCode::SlotAlreadyTaken, format!("slot {at} is already taken"))
}

/// The partial unique index rejecting a second scheduled post at `at`.
fn schedule_write_error(e: DieselError, at: DateTime<Utc>) -> AppError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => slot_taken(at),
        other => AppError::Database(other),
    }
}

/// Why the conditional UPDATE matched no row, judged from the post re-read after it.
fn unapplied_schedule_error(post: &Post, at: DateTime<Utc>) -> AppError {
    if post.is_published() {
        AppError::new(ErrorCode::PostAlreadyPublished, format!("post {} is already published", post.id))
    } else {
        slot_taken(at)
    }
}

impl SlotRepository for PgQueueStore {
    fn list_active_slots(&self, account_id: Uuid) -> AppResult<Vec<QueueSlot>> {
        let mut conn = get_conn(&self.pool)?;

        let rows: Vec<QueueSlotRow> = queue_slots::table
            .filter(queue_slots::account_id.eq(account_id))
            .filter(queue_slots::is_active.eq(true))
            .order((queue_slots::day_of_week.asc(), queue_slots::created_at.asc()))
            .load(&mut conn)?;

        Ok(slots_from_rows(rows))
    }

    fn list_slots(&self, account_id: Uuid) -> AppResult<Vec<QueueSlot>> {
        let mut conn = get_conn(&self.pool)?;

        let rows: Vec<QueueSlotRow> = queue_slots::table
            .filter(queue_slots::account_id.eq(account_id))
            .order((queue_slots::day_of_week.asc(), queue_slots::time.asc()))
            .load(&mut conn)?;

        Ok(slots_from_rows(rows))
    }

    fn create_slot(&self, account_id: Uuid, day_of_week: u8, time: SlotTime) -> AppResult<QueueSlot> {
        let mut conn = get_conn(&self.pool)?;

        let new_slot = NewQueueSlot {
            account_id,
            day_of_week: day_of_week as i16,
            time: time.to_string(),
            is_active: true,
        };

        let row: QueueSlotRow = diesel::insert_into(queue_slots::table)
            .values(&new_slot)
            .get_result(&mut conn)?;

        QueueSlot::try_from(row)
    }

    fn set_slot_active(&self, slot_id: Uuid, is_active: bool) -> AppResult<QueueSlot> {
        let mut conn = get_conn(&self.pool)?;

        let row: QueueSlotRow = diesel::update(queue_slots::table.filter(queue_slots::id.eq(slot_id)))
            .set(queue_slots::is_active.eq(is_active))
            .get_result(&mut conn)
            .map_err(slot_not_found(slot_id))?;

        QueueSlot::try_from(row)
    }

    fn delete_slot(&self, slot_id: Uuid) -> AppResult<()> {
        let mut conn = get_conn(&self.pool)?;

        let deleted = diesel::delete(queue_slots::table.filter(queue_slots::id.eq(slot_id)))
            .execute(&mut conn)?;

        if deleted == 0 {
            return Err(slot_not_found(slot_id)(DieselError::NotFound));
        }
        Ok(())
    }
}

impl PostRepository for PgQueueStore {
    fn get_post(&self, post_id: Uuid) -> AppResult<Post> {
        let mut conn = get_conn(&self.pool)?;

        let row: PostRow = posts::table
            .filter(posts::id.eq(post_id))
            .first(&mut conn)
            .map_err(|e| match e {
                DieselError::NotFound => AppError::new(
                    ErrorCode::PostNotFound,
                    format!("post {post_id} not found"),
                ),
                other => AppError::Database(other),
            })?;

        Post::try_from(row)
    }

    fn list_scheduled_post_timestamps(&self, account_id: Uuid) -> AppResult<HashSet<DateTime<Utc>>> {
        let mut conn = get_conn(&self.pool)?;

        let timestamps: Vec<Option<DateTime<Utc>>> = posts::table
            .filter(posts::account_id.eq(account_id))
            .filter(posts::status.eq(PostStatus::Scheduled.as_str()))
            .select(posts::scheduled_for)
            .load(&mut conn)?;

        Ok(timestamps.into_iter().flatten().collect())
    }

    fn update_post_schedule(&self, post_id: Uuid, at: DateTime<Utc>) -> AppResult<Post> {
        let mut conn = get_conn(&self.pool)?;

        // One statement: the published check and the collision check are
        // evaluated together with the write. The partial unique index
        // `posts_account_scheduled_for_key` covers writers racing past both.
        let updated = diesel::sql_query(
            "UPDATE posts SET status = 'scheduled', scheduled_for = $2 \
             WHERE id = $1 \
             AND status <> 'published' \
             AND NOT EXISTS ( \
                 SELECT 1 FROM posts other \
                 WHERE other.account_id = posts.account_id \
                 AND other.id <> posts.id \
                 AND other.status = 'scheduled' \
                 AND other.scheduled_for = $2 \
             )"
        )
        .bind::<SqlUuid, _>(post_id)
        .bind::<Timestamptz, _>(at)
        .execute(&mut conn)
        .map_err(|e| schedule_write_error(e, at))?;

        drop(conn);
        let post = self.get_post(post_id)?;

        if updated == 0 {
            return Err(unapplied_schedule_error(&post, at));
        }

        Ok(post)
    }
}

impl QueueRepository for PgQueueStore {
    fn check_health(&self) -> HealthCheck {
        check_database(&self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn post(status: PostStatus) -> Post {
        Post {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            content: "queued".into(),
            status,
            scheduled_for: None,
            published_at: None,
            performance: None,
        }
    }

    #[test]
    fn unique_violation_means_slot_taken() {
        let violation = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key value violates posts_account_scheduled_for_key")),
        );
        assert_eq!(schedule_write_error(violation, at()).code(), Some(ErrorCode::SlotAlreadyTaken));

        let other = schedule_write_error(DieselError::RollbackTransaction, at());
        assert!(matches!(other, AppError::Database(_)));
    }

    #[test]
    fn unmatched_update_is_explained_by_post_state() {
        let published = unapplied_schedule_error(&post(PostStatus::Published), at());
        assert_eq!(published.code(), Some(ErrorCode::PostAlreadyPublished));

        let collided = unapplied_schedule_error(&post(PostStatus::Draft), at());
        assert_eq!(collided.code(), Some(ErrorCode::SlotAlreadyTaken));
    }
}
