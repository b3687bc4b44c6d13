use chrono::{DateTime, Utc};
use diesel::Queryable;
use uuid::Uuid;

use super::domain::{Post, PostPerformance};
use crate::errors::AppError;

/// A full `posts` row in column order. Both services load posts through it.
#[derive(Debug, Queryable)]
pub struct PostRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub content: String,
    pub status: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub replies: Option<i64>,
    pub reposts: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        // Metrics columns are null until the first sync.
        let performance = row.views.map(|views| PostPerformance {
            views,
            likes: row.likes.unwrap_or(0),
            replies: row.replies.unwrap_or(0),
            reposts: row.reposts.unwrap_or(0),
            engagement_rate: row.engagement_rate,
        });

        Ok(Post {
            id: row.id,
            account_id: row.account_id,
            content: row.content,
            status: row.status.parse()?,
            scheduled_for: row.scheduled_for,
            published_at: row.published_at,
            performance,
        })
    }
}

/// Convert loaded rows, logging and dropping the ones that do not parse.
pub fn posts_from_rows(rows: Vec<PostRow>) -> Vec<Post> {
    rows.into_iter()
        .filter_map(|row| {
            let post_id = row.id;
            Post::try_from(row)
                .map_err(|e| tracing::warn!(post_id = %post_id, error = %e, "skipping malformed post row"))
                .ok()
        })
        .collect()
}
