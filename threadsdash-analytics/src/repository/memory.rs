use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use threadsdash_shared::errors::AppResult;
use threadsdash_shared::types::{DailyAnalytics, DateRange, HealthCheck, Post};

use super::AnalyticsRepository;
use crate::models::Account;

#[derive(Default)]
pub struct MemoryAnalyticsStore {
    accounts: Mutex<Vec<Account>>,
    posts: Mutex<Vec<Post>>,
    snapshots: Mutex<BTreeMap<(Uuid, NaiveDate), DailyAnalytics>>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, id: Uuid, follower_count: i64) {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Account {
                id,
                username: format!("account-{id}"),
                follower_count,
                created_at: Utc::now(),
            });
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.lock().unwrap_or_else(PoisonError::into_inner).push(post);
    }
}

impl AnalyticsRepository for MemoryAnalyticsStore {
    fn list_published_posts(&self, account_id: Uuid, range: Option<DateRange>) -> AppResult<Vec<Post>> {
        let posts = self.posts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(posts
            .iter()
            .filter(|p| p.account_id == account_id && p.is_published())
            .filter(|p| match (range, p.published_at) {
                (None, _) => true,
                // Same one-day slack as the Postgres store.
                (Some(range), Some(at)) => {
                    let day = at.date_naive();
                    range.from - Duration::days(1) <= day && day <= range.to + Duration::days(1)
                }
                (Some(_), None) => false,
            })
            .cloned()
            .collect())
    }

    fn list_daily_analytics(&self, account_id: Uuid, range: DateRange) -> AppResult<Vec<DailyAnalytics>> {
        let snapshots = self.snapshots.lock().unwrap_or_else(PoisonError::into_inner);
        // Reverse order, the services must not rely on storage order.
        Ok(snapshots
            .values()
            .rev()
            .filter(|s| s.account_id == account_id && range.contains_date(s.date))
            .cloned()
            .collect())
    }

    fn get_daily_analytics(&self, account_id: Uuid, date: NaiveDate) -> AppResult<Option<DailyAnalytics>> {
        let snapshots = self.snapshots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshots.get(&(account_id, date)).cloned())
    }

    fn upsert_daily_analytics(&self, snapshot: &DailyAnalytics) -> AppResult<()> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((snapshot.account_id, snapshot.date), snapshot.clone());
        Ok(())
    }

    fn list_accounts(&self) -> AppResult<Vec<Account>> {
        Ok(self.accounts.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn get_account(&self, account_id: Uuid) -> AppResult<Option<Account>> {
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.iter().find(|a| a.id == account_id).cloned())
    }

    fn check_health(&self) -> HealthCheck {
        HealthCheck::healthy("memory")
    }
}
