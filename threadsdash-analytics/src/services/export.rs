use std::fmt::Write;

use threadsdash_shared::types::DailyAnalytics;

pub const CSV_HEADER: &str = "Date,Followers,Gained,Lost,Posts,Views,Likes,Replies,Reposts,Engagement Rate";

/// Render snapshots as CSV, one row per day in date order. The engagement
/// rate is written as a percentage with two decimals (`0.0523` -> `5.23%`).
pub fn daily_analytics_csv(snapshots: &[DailyAnalytics]) -> String {
    let mut rows: Vec<&DailyAnalytics> = snapshots.iter().collect();
    rows.sort_by_key(|s| s.date);

    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + rows.len() * 64);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for s in rows {
        // Writing into a String cannot fail.
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{},{:.2}%",
            s.date.format("%Y-%m-%d"),
            s.followers,
            s.followers_gained,
            s.followers_lost,
            s.post_count,
            s.views,
            s.likes,
            s.replies,
            s.reposts,
            s.engagement_rate * 100.0,
        );
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn snapshot(day: u32, engagement_rate: f64) -> DailyAnalytics {
        DailyAnalytics {
            account_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            followers: 1000 + day as i64,
            followers_gained: 3,
            followers_lost: 1,
            post_count: 2,
            views: 480,
            likes: 20,
            replies: 4,
            reposts: 1,
            engagement_rate,
            top_post_id: None,
        }
    }

    #[test]
    fn rows_are_sorted_and_formatted() {
        let csv = daily_analytics_csv(&[snapshot(9, 0.1), snapshot(2, 0.0523)]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "2024-06-02,1002,3,1,2,480,20,4,1,5.23%");
        assert_eq!(lines[2], "2024-06-09,1009,3,1,2,480,20,4,1,10.00%");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_export_is_just_the_header() {
        assert_eq!(daily_analytics_csv(&[]), format!("{CSV_HEADER}\n"));
    }
}
