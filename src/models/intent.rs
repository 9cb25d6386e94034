use serde::{Deserialize, Serialize};

/// What the user is asking for, derived from `(message, stage)`.
///
/// Numeric selectors are carried raw (1-based, as typed); range checks
/// belong to the conversation handlers, which know the catalog and the
/// currently offered slot list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "intent")]
pub enum Intent {
    Greet,
    ListServices,
    SelectService { key: String },
    SelectServiceIndex { index: i64 },
    SelectSlot { index: i64 },
    Reschedule,
    CancelBooking,
    CancelSession,
    PriceInquiry,
    LocationInquiry,
    Waitlist,
    Farewell,
    Unknown,
}
