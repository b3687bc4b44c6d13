use chrono::NaiveDate;
use uuid::Uuid;

use threadsdash_shared::errors::AppResult;
use threadsdash_shared::types::{DailyAnalytics, DateRange, HealthCheck, Post};

use crate::models::Account;

mod postgres;
#[cfg(test)]
pub mod memory;

pub use postgres::PgAnalyticsStore;

/// Storage the analytics service reads from and writes snapshots to.
///
/// Ranges are inclusive calendar days; implementations may return a slightly
/// wider set of posts (UTC day boundaries) since the services re-filter in
/// the host time zone.
pub trait AnalyticsRepository: Send + Sync {
    /// Published posts of the account, optionally restricted to a range of
    /// `published_at` days.
    fn list_published_posts(&self, account_id: Uuid, range: Option<DateRange>) -> AppResult<Vec<Post>>;

    /// Snapshots inside the range, in no particular order.
    fn list_daily_analytics(&self, account_id: Uuid, range: DateRange) -> AppResult<Vec<DailyAnalytics>>;

    fn get_daily_analytics(&self, account_id: Uuid, date: NaiveDate) -> AppResult<Option<DailyAnalytics>>;

    fn upsert_daily_analytics(&self, snapshot: &DailyAnalytics) -> AppResult<()>;

    fn list_accounts(&self) -> AppResult<Vec<Account>>;

    fn get_account(&self, account_id: Uuid) -> AppResult<Option<Account>>;

    fn check_health(&self) -> HealthCheck;
}
