use chrono::TimeZone;
use serde::{Serialize, Serializer};

use threadsdash_shared::types::{day_of_week, weekday_name, DailyAnalytics, DateRange, Post};

/// Relative change, in percent, the engagement trend must exceed.
pub const ENGAGEMENT_TREND_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// A generated observation about an account's period.
#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    FollowerGrowth { change: i64, growth_rate: Option<f64> },
    FollowerDecline { change: i64, growth_rate: Option<f64> },
    EngagementUp { change_pct: f64 },
    EngagementDown { change_pct: f64 },
    BestDay { day_of_week: u8, avg_engagement: f64, improvement: f64 },
    Consistency { avg_posts_per_day: f64 },
}

impl Insight {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FollowerGrowth { .. } => "growth",
            Self::FollowerDecline { .. } => "decline",
            Self::EngagementUp { .. } => "engagement_up",
            Self::EngagementDown { .. } => "engagement_down",
            Self::BestDay { .. } => "best_day",
            Self::Consistency { .. } => "consistency",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::FollowerGrowth { .. } => "Follower growth",
            Self::FollowerDecline { .. } => "Follower decline",
            Self::EngagementUp { .. } => "Engagement is improving",
            Self::EngagementDown { .. } => "Engagement is declining",
            Self::BestDay { .. } => "Best day to post",
            Self::Consistency { .. } => "Post more consistently",
        }
    }

    pub fn description(&self) -> String {
        match *self {
            Self::FollowerGrowth { change, growth_rate } => match growth_rate {
                Some(rate) => format!("You gained {change} followers ({rate:.1}%) over this period."),
                None => format!("You gained {change} followers over this period."),
            },
            Self::FollowerDecline { change, growth_rate } => match growth_rate {
                Some(rate) => format!("You lost {} followers ({:.1}%) over this period.", change.abs(), rate.abs()),
                None => format!("You lost {} followers over this period.", change.abs()),
            },
            Self::EngagementUp { change_pct } => format!(
                "Your average engagement rate rose {change_pct:.1}% compared with the first half of the period."
            ),
            Self::EngagementDown { change_pct } => format!(
                "Your average engagement rate fell {:.1}% compared with the first half of the period.",
                change_pct.abs()
            ),
            Self::BestDay { day_of_week, avg_engagement, improvement } => format!(
                "Posts published on {} average {:.2}% engagement, {:.0}% above your overall average.",
                weekday_name(day_of_week),
                avg_engagement * 100.0,
                improvement
            ),
            Self::Consistency { avg_posts_per_day } => format!(
                "You averaged {avg_posts_per_day:.1} posts per day. Posting at least once a day keeps your audience engaged."
            ),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::FollowerGrowth { growth_rate, .. } | Self::FollowerDecline { growth_rate, .. } => growth_rate,
            Self::EngagementUp { change_pct } | Self::EngagementDown { change_pct } => Some(change_pct),
            Self::BestDay { improvement, .. } => Some(improvement),
            Self::Consistency { avg_posts_per_day } => Some(avg_posts_per_day),
        }
    }

    pub fn trend(&self) -> Option<Trend> {
        match self {
            Self::FollowerGrowth { .. } | Self::EngagementUp { .. } => Some(Trend::Up),
            Self::FollowerDecline { .. } | Self::EngagementDown { .. } => Some(Trend::Down),
            Self::BestDay { .. } => Some(Trend::Neutral),
            Self::Consistency { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct InsightView {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trend: Option<Trend>,
}

impl Serialize for Insight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        InsightView {
            kind: self.kind(),
            title: self.title(),
            description: self.description(),
            value: self.value(),
            trend: self.trend(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestDay {
    pub day_of_week: u8,
    pub avg_engagement: f64,
    pub overall_avg: f64,
    /// Percent uplift of the best day over the overall average.
    pub improvement: f64,
}

/// The weekday whose posts in `range` have the highest mean engagement rate.
/// Earlier weekdays (Sunday first) win ties.
pub fn best_day_insight<Tz: TimeZone>(posts: &[Post], range: DateRange, tz: &Tz) -> Option<BestDay> {
    let mut sums = [0.0f64; 7];
    let mut counts = [0u32; 7];

    for post in posts.iter().filter(|p| p.is_published() && p.views() > 0) {
        let Some(published_at) = post.published_at else { continue };
        if !range.contains(&published_at, tz) {
            continue;
        }
        let Some(rate) = post.engagement_rate().filter(|r| r.is_finite()) else { continue };

        let day = day_of_week(published_at.with_timezone(tz).date_naive()) as usize;
        sums[day] += rate;
        counts[day] += 1;
    }

    let total: u32 = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let overall_avg = sums.iter().sum::<f64>() / total as f64;

    let mut best: Option<(usize, f64)> = None;
    for day in (0..7).filter(|&d| counts[d] > 0) {
        let avg = sums[day] / counts[day] as f64;
        if best.map_or(true, |(_, top)| avg > top) {
            best = Some((day, avg));
        }
    }
    let (day, avg_engagement) = best?;

    let improvement = if overall_avg == 0.0 {
        0.0
    } else {
        (avg_engagement - overall_avg) / overall_avg * 100.0
    };

    Some(BestDay {
        day_of_week: day as u8,
        avg_engagement,
        overall_avg,
        improvement,
    })
}

/// Build the insight list for `range`: follower change, engagement trend,
/// best day, posting consistency (each only when it applies).
pub fn generate_insights<Tz: TimeZone>(
    snapshots: &[DailyAnalytics],
    posts: &[Post],
    range: DateRange,
    tz: &Tz,
) -> Vec<Insight> {
    let mut in_range: Vec<&DailyAnalytics> = snapshots
        .iter()
        .filter(|s| range.contains_date(s.date))
        .collect();
    in_range.sort_by_key(|s| s.date);

    let mut insights = Vec::new();

    if let (Some(first), Some(last)) = (in_range.first(), in_range.last()) {
        if let Some(insight) = follower_insight(first.followers, last.followers) {
            insights.push(insight);
        }
        if let Some(insight) = engagement_trend_insight(&in_range) {
            insights.push(insight);
        }
    }

    if let Some(best) = best_day_insight(posts, range, tz) {
        insights.push(Insight::BestDay {
            day_of_week: best.day_of_week,
            avg_engagement: best.avg_engagement,
            improvement: best.improvement,
        });
    }

    if !in_range.is_empty() {
        let avg_posts_per_day =
            in_range.iter().map(|s| s.post_count as f64).sum::<f64>() / in_range.len() as f64;
        if avg_posts_per_day < 1.0 {
            insights.push(Insight::Consistency { avg_posts_per_day });
        }
    }

    insights
}

fn follower_insight(first: i64, last: i64) -> Option<Insight> {
    let change = last - first;
    let growth_rate = (first != 0).then(|| change as f64 / first as f64 * 100.0);

    match change {
        0 => None,
        c if c > 0 => Some(Insight::FollowerGrowth { change, growth_rate }),
        _ => Some(Insight::FollowerDecline { change, growth_rate }),
    }
}

/// Compare mean engagement of the two halves; the first half takes the
/// middle element when the count is odd.
fn engagement_trend_insight(sorted: &[&DailyAnalytics]) -> Option<Insight> {
    if sorted.len() < 2 {
        return None;
    }
    let (first, second) = sorted.split_at(sorted.len().div_ceil(2));

    let mean = |half: &[&DailyAnalytics]| {
        half.iter().map(|s| s.engagement_rate).sum::<f64>() / half.len() as f64
    };
    let first_avg = mean(first);
    let second_avg = mean(second);

    if first_avg == 0.0 || !first_avg.is_finite() {
        return None;
    }
    let change_pct = (second_avg - first_avg) / first_avg * 100.0;
    if !change_pct.is_finite() || change_pct.abs() <= ENGAGEMENT_TREND_THRESHOLD_PCT {
        return None;
    }

    Some(if change_pct > 0.0 {
        Insight::EngagementUp { change_pct }
    } else {
        Insight::EngagementDown { change_pct }
    })
}
