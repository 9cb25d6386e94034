use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::models::Session;

/// Session persistence as the conversation core sees it. The in-memory
/// implementation is the only one shipped; the trait exists so a shared
/// store could replace it without touching the core.
pub trait SessionStore: Send + Sync {
    /// Loads the session for `session_id`, discarding it first if its TTL
    /// has lapsed, and creates a fresh `Greeting`-stage session otherwise.
    fn get_or_create(&self, session_id: &str, client_name: &str, now: NaiveDateTime) -> Session;

    fn save(&self, session: &Session);

    fn delete(&self, session_id: &str);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, session_id: &str, client_name: &str, now: NaiveDateTime) -> Session {
        let mut sessions = self.sessions.lock().unwrap();

        if let Some(existing) = sessions.get(session_id) {
            if existing.expires_at > now {
                return existing.clone();
            }
            tracing::debug!(session = session_id, "session expired, starting over");
            sessions.remove(session_id);
        }

        Session::new(session_id, client_name, now)
    }

    fn save(&self, session: &Session) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
    }

    fn delete(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }
}
