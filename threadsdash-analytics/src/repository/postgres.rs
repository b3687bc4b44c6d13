use chrono::{Duration, NaiveDate, NaiveTime};
use diesel::prelude::*;
use uuid::Uuid;

use threadsdash_shared::clients::db::{check_database, get_conn, DbPool};
use threadsdash_shared::errors::AppResult;
use threadsdash_shared::types::{
    posts_from_rows, DailyAnalytics, DateRange, HealthCheck, Post, PostRow, PostStatus,
};

use super::AnalyticsRepository;
use crate::models::{self, Account, DailyAnalyticsRow};
use crate::schema::{accounts, daily_analytics, posts};

/// Diesel-backed store over `accounts`, `posts` and `daily_analytics`.
pub struct PgAnalyticsStore {
    pool: DbPool,
}

impl PgAnalyticsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

// A day of slack on both sides so any host offset is covered.
fn widened_bounds(range: DateRange) -> (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>) {
    let start = (range.from - Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
    let end = (range.to + Duration::days(2)).and_time(NaiveTime::MIN).and_utc();
    (start, end)
}

impl AnalyticsRepository for PgAnalyticsStore {
    fn list_published_posts(&self, account_id: Uuid, range: Option<DateRange>) -> AppResult<Vec<Post>> {
        let mut conn = get_conn(&self.pool)?;

        let mut query = posts::table
            .filter(posts::account_id.eq(account_id))
            .filter(posts::status.eq(PostStatus::Published.as_str()))
            .into_boxed();

        if let Some(range) = range {
            let (start, end) = widened_bounds(range);
            query = query
                .filter(posts::published_at.ge(start))
                .filter(posts::published_at.lt(end));
        }

        let rows: Vec<PostRow> = query
            .order(posts::published_at.asc())
            .load(&mut conn)?;

        Ok(posts_from_rows(rows))
    }

    fn list_daily_analytics(&self, account_id: Uuid, range: DateRange) -> AppResult<Vec<DailyAnalytics>> {
        let mut conn = get_conn(&self.pool)?;

        let rows: Vec<DailyAnalyticsRow> = daily_analytics::table
            .filter(daily_analytics::account_id.eq(account_id))
            .filter(daily_analytics::date.ge(range.from))
            .filter(daily_analytics::date.le(range.to))
            .load(&mut conn)?;

        Ok(rows.into_iter().map(DailyAnalytics::from).collect())
    }

    fn get_daily_analytics(&self, account_id: Uuid, date: NaiveDate) -> AppResult<Option<DailyAnalytics>> {
        let mut conn = get_conn(&self.pool)?;

        let row: Option<DailyAnalyticsRow> = daily_analytics::table
            .filter(daily_analytics::account_id.eq(account_id))
            .filter(daily_analytics::date.eq(date))
            .first(&mut conn)
            .optional()?;

        Ok(row.map(DailyAnalytics::from))
    }

    fn upsert_daily_analytics(&self, snapshot: &DailyAnalytics) -> AppResult<()> {
        let mut conn = get_conn(&self.pool)?;
        models::upsert_daily_analytics(&mut conn, snapshot)?;
        Ok(())
    }

    fn list_accounts(&self) -> AppResult<Vec<Account>> {
        let mut conn = get_conn(&self.pool)?;
        Ok(accounts::table.order(accounts::created_at.asc()).load(&mut conn)?)
    }

    fn get_account(&self, account_id: Uuid) -> AppResult<Option<Account>> {
        let mut conn = get_conn(&self.pool)?;
        Ok(accounts::table
            .filter(accounts::id.eq(account_id))
            .first(&mut conn)
            .optional()?)
    }

    fn check_health(&self) -> HealthCheck {
        check_database(&self.pool)
    }
}
