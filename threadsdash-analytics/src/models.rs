use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date as DieselDate, Double, Nullable, Uuid as SqlUuid};
use serde::Serialize;
use uuid::Uuid;

use threadsdash_shared::types::DailyAnalytics;

use crate::schema::{accounts, daily_analytics};

// --- Accounts ---

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = accounts)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub follower_count: i64,
    pub created_at: DateTime<Utc>,
}

// --- Daily analytics ---

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = daily_analytics)]
pub struct DailyAnalyticsRow {
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub followers: i64,
    pub followers_gained: i64,
    pub followers_lost: i64,
    pub post_count: i64,
    pub views: i64,
    pub likes: i64,
    pub replies: i64,
    pub reposts: i64,
    pub engagement_rate: f64,
    pub top_post_id: Option<Uuid>,
}

impl From<DailyAnalyticsRow> for DailyAnalytics {
    fn from(row: DailyAnalyticsRow) -> Self {
        Self {
            account_id: row.account_id,
            date: row.date,
            followers: row.followers,
            followers_gained: row.followers_gained,
            followers_lost: row.followers_lost,
            post_count: row.post_count,
            views: row.views,
            likes: row.likes,
            replies: row.replies,
            reposts: row.reposts,
            engagement_rate: row.engagement_rate,
            top_post_id: row.top_post_id,
        }
    }
}

/// Upsert a snapshot using ON CONFLICT (account_id, date) DO UPDATE.
pub fn upsert_daily_analytics(
    conn: &mut diesel::pg::PgConnection,
    snapshot: &DailyAnalytics,
) -> Result<(), diesel::result::Error> {
    diesel::sql_query(
        "INSERT INTO daily_analytics \
         (account_id, date, followers, followers_gained, followers_lost, post_count, \
          views, likes, replies, reposts, engagement_rate, top_post_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (account_id, date) DO UPDATE SET \
         followers = EXCLUDED.followers, \
         followers_gained = EXCLUDED.followers_gained, \
         followers_lost = EXCLUDED.followers_lost, \
         post_count = EXCLUDED.post_count, \
         views = EXCLUDED.views, \
         likes = EXCLUDED.likes, \
         replies = EXCLUDED.replies, \
         reposts = EXCLUDED.reposts, \
         engagement_rate = EXCLUDED.engagement_rate, \
         top_post_id = EXCLUDED.top_post_id"
    )
    .bind::<SqlUuid, _>(snapshot.account_id)
    .bind::<DieselDate, _>(snapshot.date)
    .bind::<BigInt, _>(snapshot.followers)
    .bind::<BigInt, _>(snapshot.followers_gained)
    .bind::<BigInt, _>(snapshot.followers_lost)
    .bind::<BigInt, _>(snapshot.post_count)
    .bind::<BigInt, _>(snapshot.views)
    .bind::<BigInt, _>(snapshot.likes)
    .bind::<BigInt, _>(snapshot.replies)
    .bind::<BigInt, _>(snapshot.reposts)
    .bind::<Double, _>(snapshot.engagement_rate)
    .bind::<Nullable<SqlUuid>, _>(snapshot.top_post_id)
    .execute(conn)?;
    Ok(())
}
