use crate::config::AppConfig;
use crate::db::store::BookingStore;
use crate::services::clock::Clock;
use crate::services::intent::IntentClassifier;
use crate::services::sessions::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub bookings: Box<dyn BookingStore>,
    pub sessions: Box<dyn SessionStore>,
    pub clock: Box<dyn Clock>,
    pub classifier: Box<dyn IntentClassifier>,
    /// Serializes message handling; session read-modify-write must be
    /// atomic per message.
    pub message_lock: tokio::sync::Mutex<()>,
}
