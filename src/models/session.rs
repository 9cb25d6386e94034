use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// How long an idle session survives before `get_or_create` discards it.
pub const SESSION_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greeting,
    AwaitingService,
    ShowTimes,
    Booked,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::AwaitingService => "awaiting_service",
            Stage::ShowTimes => "show_times",
            Stage::Booked => "booked",
        }
    }
}

/// Per-client dialogue state. Lives only in memory; a fresh session starts
/// in `Greeting` and is dropped on cancel, farewell, or TTL expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub client_name: String,
    pub stage: Stage,
    pub selected_service: Option<String>,
    /// Slots last offered to the user. Position defines the 1-based
    /// selection index, so order must never be shuffled after display.
    pub available_times: Vec<NaiveDateTime>,
    /// Set when the previous reply offered the waitlist, so a plain "yes"
    /// on the next message counts as joining it.
    pub waitlist_offered: bool,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Session {
    pub fn new(id: &str, client_name: &str, now: NaiveDateTime) -> Self {
        Self {
            id: id.to_string(),
            client_name: client_name.to_string(),
            stage: Stage::Greeting,
            selected_service: None,
            available_times: vec![],
            waitlist_offered: false,
            last_activity: now,
            expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn touch(&mut self, now: NaiveDateTime) {
        self.last_activity = now;
        self.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
    }
}
