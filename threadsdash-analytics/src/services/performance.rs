use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{TimeZone, Timelike};
use serde::Serialize;

use threadsdash_shared::types::{day_of_week, DateRange, Post};

/// Number of buckets returned by [`compute_optimal_time_slots`].
pub const MAX_OPTIMAL_SLOTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPost {
    #[serde(flatten)]
    pub post: Post,
    pub engagement_rate: f64,
}

/// Published posts ranked by engagement rate, highest first.
///
/// Posts without a metric snapshot, with zero views and no stored rate, or
/// with a non-finite rate are left out. Equal rates keep their input order.
pub fn rank_top_posts(posts: &[Post], limit: usize) -> Vec<TopPost> {
    let mut ranked: Vec<TopPost> = posts
        .iter()
        .filter(|p| p.is_published() && p.performance.is_some())
        .filter_map(|p| {
            let rate = p.engagement_rate()?;
            rate.is_finite().then(|| TopPost {
                post: p.clone(),
                engagement_rate: rate,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.engagement_rate
            .partial_cmp(&a.engagement_rate)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalTimeSlot {
    pub hour: u8,
    pub day_of_week: u8,
    pub score: f64,
    pub avg_engagement: f64,
    pub post_count: u32,
}

/// Rank `(day of week, hour)` buckets of publication time by engagement.
///
/// `score = avg * ln(count + 1)` so that a bucket backed by several posts
/// outranks a single lucky post with the same average.
pub fn compute_optimal_time_slots<Tz: TimeZone>(posts: &[Post], tz: &Tz) -> Vec<OptimalTimeSlot> {
    let mut buckets: BTreeMap<(u8, u8), (f64, u32)> = BTreeMap::new();

    for post in posts.iter().filter(|p| p.is_published()) {
        let (Some(published_at), Some(perf)) = (post.published_at, post.performance.as_ref()) else {
            continue;
        };
        if perf.views <= 0 {
            continue;
        }

        let local = published_at.with_timezone(tz);
        let key = (day_of_week(local.date_naive()), local.hour() as u8);
        let engagement = perf.interactions() as f64 / perf.views as f64;

        let entry = buckets.entry(key).or_insert((0.0, 0));
        entry.0 += engagement;
        entry.1 += 1;
    }

    // BTreeMap order is (day, hour) ascending; the stable sort keeps it for ties.
    let mut slots: Vec<OptimalTimeSlot> = buckets
        .into_iter()
        .filter_map(|((day, hour), (sum, count))| {
            let avg = sum / count as f64;
            (avg > 0.0 && avg.is_finite()).then(|| OptimalTimeSlot {
                hour,
                day_of_week: day,
                score: avg * (count as f64 + 1.0).ln(),
                avg_engagement: avg,
                post_count: count,
            })
        })
        .collect();

    slots.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    slots.truncate(MAX_OPTIMAL_SLOTS);
    slots
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub total_posts: u64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_replies: i64,
    pub total_reposts: i64,
    pub avg_engagement_rate: f64,
}

/// Totals over published posts with metrics whose publication day is in `range`.
pub fn summarize_period<Tz: TimeZone>(posts: &[Post], range: DateRange, tz: &Tz) -> PeriodSummary {
    let mut summary = PeriodSummary::default();
    let mut rate_sum = 0.0;

    for post in posts.iter().filter(|p| p.is_published()) {
        let (Some(published_at), Some(perf)) = (post.published_at, post.performance.as_ref()) else {
            continue;
        };
        if !range.contains(&published_at, tz) {
            continue;
        }

        summary.total_posts += 1;
        summary.total_views += perf.views;
        summary.total_likes += perf.likes;
        summary.total_replies += perf.replies;
        summary.total_reposts += perf.reposts;
        rate_sum += post.engagement_rate().filter(|r| r.is_finite()).unwrap_or(0.0);
    }

    if summary.total_posts > 0 {
        summary.avg_engagement_rate = rate_sum / summary.total_posts as f64;
    }
    summary
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
    use threadsdash_shared::types::{PostPerformance, PostStatus};
    use uuid::Uuid;

    pub(crate) fn published(at: DateTime<Utc>, views: i64, likes: i64, replies: i64, reposts: i64, rate: Option<f64>) -> Post {
        Post {
            id: Uuid::new_v4(),
            account_id: Uuid::nil(),
            content: String::new(),
            status: PostStatus::Published,
            scheduled_for: None,
            published_at: Some(at),
            performance: Some(PostPerformance { views, likes, replies, reposts, engagement_rate: rate }),
        }
    }

    fn monday_9am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 15, 0).unwrap()
    }

    #[test]
    fn zero_view_post_without_rate_is_excluded() {
        let good = published(monday_9am(), 1000, 50, 20, 10, None);
        let silent = published(monday_9am(), 0, 0, 0, 0, None);

        let top = rank_top_posts(&[good.clone(), silent], 10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].post.id, good.id);
        assert!((top[0].engagement_rate - 0.08).abs() < 1e-12);
    }

    #[test]
    fn ranking_is_stable_and_limited() {
        let a = published(monday_9am(), 100, 5, 0, 0, None);
        let b = published(monday_9am(), 100, 10, 0, 0, None);
        let c = published(monday_9am(), 200, 10, 0, 0, None);
        let stored = published(monday_9am(), 0, 0, 0, 0, Some(0.2));
        let mut draft = published(monday_9am(), 10, 10, 0, 0, None);
        draft.status = PostStatus::Draft;

        let top = rank_top_posts(&[a.clone(), b.clone(), c.clone(), stored.clone(), draft], 10);
        let ids: Vec<Uuid> = top.iter().map(|t| t.post.id).collect();
        // a and c tie at 0.05 and keep input order.
        assert_eq!(ids, vec![stored.id, b.id, a.id, c.id]);

        assert_eq!(rank_top_posts(&[a, b, c], 2).len(), 2);
    }

    #[test]
    fn non_finite_stored_rate_is_skipped() {
        let broken = published(monday_9am(), 10, 1, 0, 0, Some(f64::NAN));
        assert!(rank_top_posts(&[broken], 5).is_empty());
    }

    #[test]
    fn optimal_slots_bucket_by_day_and_hour() {
        let posts = vec![
            published(monday_9am(), 100, 10, 0, 0, None),
            published(monday_9am() + Duration::minutes(30), 100, 6, 0, 0, None),
            published(monday_9am() + Duration::days(1), 100, 9, 0, 0, None),
            published(monday_9am() + Duration::hours(5), 100, 0, 0, 0, None),
            published(monday_9am(), 0, 0, 0, 0, None),
        ];

        let slots = compute_optimal_time_slots(&posts, &Utc);
        assert_eq!(slots.len(), 2);

        // Monday 09h: avg 0.08 over two posts beats Tuesday 09h: 0.09 over one.
        assert_eq!((slots[0].day_of_week, slots[0].hour, slots[0].post_count), (1, 9, 2));
        assert!((slots[0].avg_engagement - 0.08).abs() < 1e-12);
        assert!((slots[0].score - 0.08 * 3f64.ln()).abs() < 1e-12);
        assert_eq!((slots[1].day_of_week, slots[1].hour), (2, 9));
    }

    #[test]
    fn optimal_slots_follow_the_given_time_zone() {
        let tz = FixedOffset::west_opt(10 * 3600).unwrap();
        let slots = compute_optimal_time_slots(&[published(monday_9am(), 10, 1, 0, 0, None)], &tz);
        // 09:15 UTC Monday is 23:15 Sunday at UTC-10.
        assert_eq!((slots[0].day_of_week, slots[0].hour), (0, 23));
    }

    #[test]
    fn optimal_slots_are_capped_and_sorted() {
        let start = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let posts: Vec<Post> = (0..40)
            .map(|i| published(start + Duration::hours(i * 5), 100, (i % 7 + 1) as i64, 0, 0, None))
            .collect();

        let slots = compute_optimal_time_slots(&posts, &Utc);
        assert_eq!(slots.len(), MAX_OPTIMAL_SLOTS);
        assert!(slots.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(slots.iter().all(|s| s.avg_engagement > 0.0));
    }

    #[test]
    fn equal_scores_order_by_day_then_hour() {
        let sunday_noon = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        let posts = vec![
            published(monday_9am(), 100, 5, 0, 0, None),
            published(sunday_noon, 100, 5, 0, 0, None),
            published(sunday_noon - Duration::hours(2), 100, 5, 0, 0, None),
        ];
        let order: Vec<(u8, u8)> = compute_optimal_time_slots(&posts, &Utc)
            .iter()
            .map(|s| (s.day_of_week, s.hour))
            .collect();
        assert_eq!(order, vec![(0, 10), (0, 12), (1, 9)]);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let range = DateRange::last_days(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(), 30);
        assert_eq!(summarize_period(&[], range, &Utc), PeriodSummary::default());
    }

    #[test]
    fn summary_counts_only_posts_in_range() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        )
        .unwrap();
        let posts = vec![
            published(monday_9am(), 1000, 50, 20, 10, None),
            published(monday_9am() - Duration::days(1), 0, 0, 0, 0, None),
            published(monday_9am() + Duration::days(5), 500, 100, 0, 0, None),
        ];

        let summary = summarize_period(&posts, range, &Utc);
        assert_eq!(summary.total_posts, 2);
        assert_eq!(summary.total_views, 1000);
        assert_eq!(summary.total_likes, 50);
        assert_eq!(summary.total_reposts, 10);
        // The zero-view post contributes a zero rate.
        assert!((summary.avg_engagement_rate - 0.04).abs() < 1e-12);
    }
}
