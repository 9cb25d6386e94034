use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::models::Booking;

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Datetimes are stored as `%Y-%m-%d %H:%M:%S` text, which compares
// lexicographically the same as chronologically.

fn fmt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

fn parse_booking_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let start_str: String = row.get(3)?;
    let end_str: String = row.get(4)?;
    let created_str: String = row.get(5)?;

    let parse = |s: &str| {
        NaiveDateTime::parse_from_str(s, DT_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    };

    Ok(Booking {
        id: row.get(0)?,
        client_name: row.get(1)?,
        service: row.get(2)?,
        start_time: parse(&start_str)?,
        end_time: parse(&end_str)?,
        created_at: parse(&created_str)?,
    })
}

const BOOKING_COLUMNS: &str = "id, client_name, service, start_time, end_time, created_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, client_name, service, start_time, end_time, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            booking.id,
            booking.client_name,
            booking.service,
            fmt(&booking.start_time),
            fmt(&booking.end_time),
            fmt(&booking.created_at),
        ],
    )?;
    Ok(())
}

/// First booking whose `[start_time, end_time)` overlaps `[start, end)`.
pub fn find_overlapping(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<Option<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE start_time < ?1 AND end_time > ?2
         ORDER BY start_time ASC LIMIT 1",
    ))?;

    let result = stmt.query_row(params![fmt(end), fmt(start)], parse_booking_row);

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Latest booking (by start time) for a client, for reschedule/cancel flows.
pub fn find_latest_by_client(conn: &Connection, client_name: &str) -> anyhow::Result<Option<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE client_name = ?1 ORDER BY start_time DESC LIMIT 1",
    ))?;

    let result = stmt.query_row(params![client_name], parse_booking_row);

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY start_time ASC",
    ))?;

    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}
