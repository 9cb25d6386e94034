use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::Booking;

/// Query/insert surface the conversation core needs from the booking
/// persistence. The core never touches SQL directly.
pub trait BookingStore: Send + Sync {
    fn find_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Option<Booking>>;

    fn insert(&self, booking: &Booking) -> anyhow::Result<()>;

    /// Latest booking for a client, used by reschedule and cancel.
    fn find_by_client(&self, client_name: &str) -> anyhow::Result<Option<Booking>>;

    fn delete(&self, id: &str) -> anyhow::Result<bool>;

    fn list_all(&self) -> anyhow::Result<Vec<Booking>>;
}

pub struct SqliteBookingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookingStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl BookingStore for SqliteBookingStore {
    fn find_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> anyhow::Result<Option<Booking>> {
        let conn = self.conn.lock().unwrap();
        queries::find_overlapping(&conn, &start, &end)
    }

    fn insert(&self, booking: &Booking) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        queries::insert_booking(&conn, booking)
    }

    fn find_by_client(&self, client_name: &str) -> anyhow::Result<Option<Booking>> {
        let conn = self.conn.lock().unwrap();
        queries::find_latest_by_client(&conn, client_name)
    }

    fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        queries::delete_booking(&conn, id)
    }

    fn list_all(&self) -> anyhow::Result<Vec<Booking>> {
        let conn = self.conn.lock().unwrap();
        queries::list_bookings(&conn)
    }
}
