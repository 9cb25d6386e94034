use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A persisted appointment. `end_time` is derived from the service duration
/// at creation and stored denormalized so overlap queries stay a single
/// range comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_name: String,
    pub service: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub created_at: NaiveDateTime,
}
