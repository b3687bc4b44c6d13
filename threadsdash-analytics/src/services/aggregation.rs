use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use metrics::counter;

use threadsdash_shared::errors::AppResult;
use threadsdash_shared::types::{DailyAnalytics, DateRange, Post};

use super::performance::rank_top_posts;
use crate::models::Account;
use crate::repository::AnalyticsRepository;
use crate::AppState;

/// Build the snapshot of `date` for one account.
///
/// Follower movement is measured against the previous day's snapshot; with
/// no previous snapshot both gained and lost are 0. `posts` must already be
/// restricted to posts published on `date`.
pub fn build_daily_snapshot(
    account: &Account,
    date: NaiveDate,
    previous: Option<&DailyAnalytics>,
    posts: &[Post],
) -> DailyAnalytics {
    let delta = previous.map(|p| account.follower_count - p.followers).unwrap_or(0);

    let mut snapshot = DailyAnalytics {
        account_id: account.id,
        date,
        followers: account.follower_count,
        followers_gained: delta.max(0),
        followers_lost: (-delta).max(0),
        post_count: 0,
        views: 0,
        likes: 0,
        replies: 0,
        reposts: 0,
        engagement_rate: 0.0,
        top_post_id: None,
    };

    let mut rate_sum = 0.0;
    let mut measured = 0u32;
    for post in posts.iter().filter(|p| p.is_published()) {
        snapshot.post_count += 1;
        let Some(perf) = post.performance.as_ref() else { continue };
        snapshot.views += perf.views;
        snapshot.likes += perf.likes;
        snapshot.replies += perf.replies;
        snapshot.reposts += perf.reposts;
        rate_sum += post.engagement_rate().filter(|r| r.is_finite()).unwrap_or(0.0);
        measured += 1;
    }

    if measured > 0 {
        snapshot.engagement_rate = rate_sum / measured as f64;
    }
    snapshot.top_post_id = rank_top_posts(posts, 1).first().map(|t| t.post.id);
    snapshot
}

/// Recompute and upsert today's snapshot for one account.
pub fn aggregate_account<R, Tz>(repo: &R, account: &Account, now: &DateTime<Tz>) -> AppResult<DailyAnalytics>
where
    R: AnalyticsRepository + ?Sized,
    Tz: TimeZone,
{
    let tz = now.timezone();
    let today = now.date_naive();
    let day = DateRange { from: today, to: today };

    let previous = repo.get_daily_analytics(account.id, today - Duration::days(1))?;
    let posts: Vec<Post> = repo
        .list_published_posts(account.id, Some(day))?
        .into_iter()
        .filter(|p| p.published_at.is_some_and(|at| day.contains(&at, &tz)))
        .collect();

    let snapshot = build_daily_snapshot(account, today, previous.as_ref(), &posts);
    repo.upsert_daily_analytics(&snapshot)?;
    counter!("analytics_snapshots_upserted_total").increment(1);

    tracing::debug!(
        account_id = %account.id,
        date = %today,
        followers = snapshot.followers,
        post_count = snapshot.post_count,
        "daily snapshot upserted"
    );

    Ok(snapshot)
}

/// Aggregate today's snapshot for every account. A failing account is
/// logged and skipped; returns how many snapshots were written.
pub fn aggregate_daily_snapshots<R, Tz>(repo: &R, now: &DateTime<Tz>) -> AppResult<usize>
where
    R: AnalyticsRepository + ?Sized,
    Tz: TimeZone,
{
    let accounts = repo.list_accounts()?;
    let mut written = 0;

    for account in &accounts {
        match aggregate_account(repo, account, now) {
            Ok(_) => written += 1,
            Err(e) => {
                tracing::error!(account_id = %account.id, error = %e, "daily snapshot aggregation failed");
            }
        }
    }

    tracing::info!(accounts = accounts.len(), written, "daily snapshots aggregated");
    Ok(written)
}

/// Spawn a background task that runs aggregate_daily_snapshots on the
/// configured interval (hourly by default).
pub fn spawn_aggregation_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(state.config.aggregation_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            tracing::info!("running daily snapshot aggregation");
            if let Err(e) = aggregate_daily_snapshots(&*state.store, &Local::now()) {
                tracing::error!(error = %e, "daily snapshot aggregation failed");
            }
        }
    });
}
