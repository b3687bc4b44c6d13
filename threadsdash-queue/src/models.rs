use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use threadsdash_shared::errors::{AppError, ErrorCode};
use threadsdash_shared::types::{QueueSlot, SlotTime};

use crate::schema::queue_slots;

// --- Queue slots ---

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = queue_slots)]
pub struct QueueSlotRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub day_of_week: i16,
    pub time: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<QueueSlotRow> for QueueSlot {
    type Error = AppError;

    fn try_from(row: QueueSlotRow) -> Result<Self, Self::Error> {
        let day_of_week = u8::try_from(row.day_of_week)
            .ok()
            .filter(|d| *d <= 6)
            .ok_or_else(|| {
                AppError::new(
                    ErrorCode::ValidationError,
                    format!("slot {} has day_of_week {} outside 0-6", row.id, row.day_of_week),
                )
            })?;
        let time: SlotTime = row.time.parse()?;

        Ok(QueueSlot {
            id: row.id,
            account_id: row.account_id,
            day_of_week,
            time,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = queue_slots)]
pub struct NewQueueSlot {
    pub account_id: Uuid,
    pub day_of_week: i16,
    pub time: String,
    pub is_active: bool,
}

/// Convert loaded slot rows, dropping rows that violate the slot invariants.
pub fn slots_from_rows(rows: Vec<QueueSlotRow>) -> Vec<QueueSlot> {
    rows.into_iter()
        .filter_map(|row| {
            let slot_id = row.id;
            QueueSlot::try_from(row)
                .map_err(|e| tracing::warn!(slot_id = %slot_id, error = %e, "skipping malformed queue slot"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_row(day_of_week: i16, time: &str) -> QueueSlotRow {
        QueueSlotRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            day_of_week,
            time: time.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn malformed_slot_rows_are_dropped() {
        let slots = slots_from_rows(vec![
            slot_row(1, "09:00"),
            slot_row(7, "09:00"),
            slot_row(2, "25:00"),
            slot_row(-1, "10:00"),
        ]);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].day_of_week, 1);
    }
}
