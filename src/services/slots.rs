use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::db::store::BookingStore;

/// Window and stepping parameters for slot generation. Defaults match the
/// salon's working hours, half-hour grid, two-day lookahead.
#[derive(Debug, Clone, Copy)]
pub struct SlotQuery {
    pub horizon_days: i64,
    pub max_results: usize,
    pub granularity_minutes: i64,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
}

impl Default for SlotQuery {
    fn default() -> Self {
        Self {
            horizon_days: 2,
            max_results: 10,
            granularity_minutes: 30,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        }
    }
}

pub fn available_slots(
    store: &dyn BookingStore,
    duration_minutes: i64,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<NaiveDateTime>> {
    available_slots_with(store, duration_minutes, now, SlotQuery::default())
}

/// Walks the working window of each day in the horizon on the granularity
/// grid and keeps every start whose `[start, start + duration)` interval has
/// no overlapping booking. Day 0 starts at `now` rounded up to the next grid
/// boundary. Recomputed from the store on every call; results are
/// chronological and capped at `max_results` across day boundaries.
pub fn available_slots_with(
    store: &dyn BookingStore,
    duration_minutes: i64,
    now: NaiveDateTime,
    query: SlotQuery,
) -> anyhow::Result<Vec<NaiveDateTime>> {
    let duration = Duration::minutes(duration_minutes);
    let earliest_today = round_up_to_grid(now, query.granularity_minutes);

    let mut slots = Vec::new();

    for day_offset in 0..query.horizon_days {
        let date = now.date() + Duration::days(day_offset);
        let day_end = date.and_time(query.work_end);

        let mut cursor = date.and_time(query.work_start);
        if day_offset == 0 && earliest_today > cursor {
            cursor = earliest_today;
        }

        while cursor + duration <= day_end {
            if store.find_overlapping(cursor, cursor + duration)?.is_none() {
                slots.push(cursor);
                if slots.len() >= query.max_results {
                    return Ok(slots);
                }
            }
            cursor += Duration::minutes(query.granularity_minutes);
        }
    }

    Ok(slots)
}

/// Next grid boundary strictly after `dt` (10:00 rounds to 10:30, 10:01 to
/// 10:30, 10:31 to 11:00). Minute rolls to 0 and the hour advances when the
/// step crosses an hour.
fn round_up_to_grid(dt: NaiveDateTime, granularity_minutes: i64) -> NaiveDateTime {
    let hour_floor = dt
        .date()
        .and_hms_opt(dt.hour(), 0, 0)
        .unwrap_or(dt);
    let next_minute = (i64::from(dt.minute()) / granularity_minutes + 1) * granularity_minutes;
    hour_floor + Duration::minutes(next_minute)
}
