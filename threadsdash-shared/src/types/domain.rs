use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, ErrorCode};

// --- Posts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PostStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            other => Err(AppError::new(
                ErrorCode::ValidationError,
                format!("unknown post status '{other}'"),
            )),
        }
    }
}

/// Metrics synced from the platform after publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPerformance {
    pub views: i64,
    pub likes: i64,
    pub replies: i64,
    pub reposts: i64,
    pub engagement_rate: Option<f64>,
}

impl PostPerformance {
    pub fn interactions(&self) -> i64 {
        self.likes + self.replies + self.reposts
    }

    /// `(likes + replies + reposts) / views`, or `None` with no views.
    pub fn computed_rate(&self) -> Option<f64> {
        if self.views > 0 {
            Some(self.interactions() as f64 / self.views as f64)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub account_id: Uuid,
    pub content: String,
    pub status: PostStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub performance: Option<PostPerformance>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Stored engagement rate when the sync provided one, otherwise the
    /// rate computed from the raw counters.
    pub fn engagement_rate(&self) -> Option<f64> {
        let perf = self.performance.as_ref()?;
        perf.engagement_rate.or_else(|| perf.computed_rate())
    }

    pub fn views(&self) -> i64 {
        self.performance.as_ref().map(|p| p.views).unwrap_or(0)
    }
}

// --- Queue slots ---

/// Time of day in 24-hour `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime {
    hour: u8,
    minute: u8,
}

impl SlotTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for SlotTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            AppError::new(
                ErrorCode::ValidationError,
                format!("invalid slot time '{s}', expected HH:MM"),
            )
        };

        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        if h.len() != 2 || m.len() != 2 || !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A recurring weekly opportunity to publish. `day_of_week` is 0 = Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSlot {
    pub id: Uuid,
    pub account_id: Uuid,
    pub day_of_week: u8,
    pub time: SlotTime,
    pub is_active: bool,
}

/// Day of week of a calendar date, Sunday = 0.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn weekday_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Unknown",
    }
}

// --- Daily analytics ---

/// One snapshot per account per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalytics {
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

// --- Date ranges ---

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::new(
                ErrorCode::InvalidDateRange,
                "'from' date must be before or equal to 'to' date",
            ));
        }
        Ok(Self { from, to })
    }

    /// The `days` calendar days ending at `today`, inclusive.
    pub fn last_days(today: NaiveDate, days: i64) -> Self {
        Self {
            from: today - Duration::days((days - 1).max(0)),
            to: today,
        }
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Whether `instant` falls on one of the range's days in `tz`.
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Utc>, tz: &Tz) -> bool {
        self.contains_date(instant.with_timezone(tz).date_naive())
    }

    pub fn num_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(views: i64, likes: i64, replies: i64, reposts: i64, rate: Option<f64>) -> PostPerformance {
        PostPerformance { views, likes, replies, reposts, engagement_rate: rate }
    }

    #[test]
    fn slot_time_parses_and_formats() {
        let t: SlotTime = "09:05".parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (9, 5));
        assert_eq!(t.to_string(), "09:05");
        assert_eq!("23:59".parse::<SlotTime>().unwrap().to_naive_time(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn slot_time_rejects_malformed() {
        for bad in ["24:00", "12:60", "9:00", "09:0", "0900", "ab:cd", "", "09:00:00", "-1:00"] {
            assert!(bad.parse::<SlotTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn slot_time_serde_is_a_string() {
        let t = SlotTime::new(18, 30).unwrap();
        assert_eq!(serde_json::to_value(t).unwrap(), "18:30");
        assert!(serde_json::from_value::<SlotTime>(serde_json::json!("25:00")).is_err());
    }

    #[test]
    fn engagement_rate_prefers_stored_value() {
        let mut post = Post {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            content: String::new(),
            status: PostStatus::Published,
            scheduled_for: None,
            published_at: None,
            performance: Some(perf(1000, 50, 20, 10, Some(0.5))),
        };
        assert_eq!(post.engagement_rate(), Some(0.5));

        post.performance = Some(perf(1000, 50, 20, 10, None));
        assert_eq!(post.engagement_rate(), Some(0.08));

        post.performance = Some(perf(0, 5, 0, 0, None));
        assert_eq!(post.engagement_rate(), None);

        post.performance = None;
        assert_eq!(post.engagement_rate(), None);
    }

    #[test]
    fn post_status_round_trips_through_text() {
        for status in [PostStatus::Draft, PostStatus::Scheduled, PostStatus::Published, PostStatus::Failed] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("queued".parse::<PostStatus>().is_err());
    }

    #[test]
    fn day_of_week_starts_on_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert_eq!(day_of_week(sunday), 0);
        assert_eq!(day_of_week(sunday.succ_opt().unwrap()), 1);
        assert_eq!(weekday_name(3), "Wednesday");
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let from = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let range = DateRange::new(from, to).unwrap();
        assert!(range.contains_date(from));
        assert!(range.contains_date(to));
        assert!(!range.contains_date(to.succ_opt().unwrap()));
        assert_eq!(range.num_days(), 10);

        let late = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 0).unwrap();
        assert!(range.contains(&late, &Utc));

        let err = DateRange::new(to, from).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidDateRange));
    }

    #[test]
    fn last_days_ends_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let range = DateRange::last_days(today, 30);
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(range.num_days(), 30);
    }
}
