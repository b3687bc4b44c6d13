use std::collections::HashSet;

use chrono::{DateTime, Days, TimeZone, Utc};

use threadsdash_shared::types::{day_of_week, QueueSlot};

/// Number of calendar days searched, today included.
pub const HORIZON_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSearch {
    Found(DateTime<Utc>),
    NoSlotsConfigured,
    HorizonExhausted,
}

/// Find the first free slot instant strictly after `now`.
///
/// Days are walked from `now`'s local date forward; within a day, slots are
/// tried in the order given. Slot times are wall-clock times in `now`'s
/// time zone: a time skipped by a DST transition yields no candidate, an
/// ambiguous one resolves to the earlier instant.
pub fn find_next_available_slot<Tz: TimeZone>(
    active_slots: &[QueueSlot],
    scheduled: &HashSet<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> SlotSearch {
    let active: Vec<&QueueSlot> = active_slots.iter().filter(|s| s.is_active).collect();
    if active.is_empty() {
        return SlotSearch::NoSlotsConfigured;
    }

    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();

    for offset in 0..HORIZON_DAYS {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        let weekday = day_of_week(date);

        for slot in active.iter().filter(|s| s.day_of_week == weekday) {
            let local = date.and_time(slot.time.to_naive_time());
            let Some(candidate) = tz.from_local_datetime(&local).earliest() else {
                continue;
            };
            let candidate = candidate.with_timezone(&Utc);

            if candidate <= now_utc || scheduled.contains(&candidate) {
                continue;
            }
            return SlotSearch::Found(candidate);
        }
    }

    SlotSearch::HorizonExhausted
}
