use async_trait::async_trait;

use crate::models::{Intent, Stage};
use crate::services::catalog;

/// Maps `(message, stage)` to an intent. Implementations must be safe to
/// call concurrently and must always produce an intent; `Intent::Unknown`
/// is the "no idea" answer, not an error.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, message: &str, stage: &Stage) -> Intent;
}

/// The default classifier: a fixed, prioritized rule list with no state and
/// no I/O, so it doubles as the fallback when an LLM classifier fails.
pub struct KeywordClassifier;

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, message: &str, stage: &Stage) -> Intent {
        keyword_classify(message, stage)
    }
}

const GREETINGS: &[&str] = &["hi", "hello", "hey"];
const TIME_KEYWORDS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "today",
    "tomorrow",
];

/// Rules evaluated top to bottom, first match wins:
///
/// 1. bare integer while slots are on offer -> slot selection (the
///    stage-dependent override; a number next to a day name is left to the
///    time resolver instead)
/// 2. service name mention -> service selection, from any stage
/// 3. reschedule / cancel-booking phrases (before the shorter "cancel")
/// 4. greeting, catalog, session-cancel keywords
/// 5. price / location / waitlist / farewell inquiries
/// 6. bare integer with no day name nearby -> service selection by index
///    (a number next to a day name belongs to the time phrase, so the
///    message stays Unknown for the time resolver)
pub fn keyword_classify(message: &str, stage: &Stage) -> Intent {
    let message = message.to_lowercase();
    let words: Vec<&str> = message
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .collect();

    let bare_int = words.iter().find_map(|w| w.parse::<i64>().ok());
    let mentions_day = TIME_KEYWORDS.iter().any(|k| message.contains(k));

    if *stage == Stage::ShowTimes && !mentions_day {
        if let Some(n) = bare_int {
            return Intent::SelectSlot { index: n };
        }
    }

    if let Some(service) = catalog::find_in_message(&message) {
        return Intent::SelectService {
            key: service.key.to_string(),
        };
    }

    if message.contains("reschedule") || message.contains("change my booking") || message.contains("modify") {
        return Intent::Reschedule;
    }
    if message.contains("cancel my booking") || message.contains("delete my booking") {
        return Intent::CancelBooking;
    }

    if words.iter().any(|w| GREETINGS.contains(w)) {
        return Intent::Greet;
    }
    if message.contains("services") {
        return Intent::ListServices;
    }
    if words.contains(&"cancel") || words.contains(&"no") || message.contains("nevermind") {
        return Intent::CancelSession;
    }

    if message.contains("price") || message.contains("cost") || message.contains("how much") {
        return Intent::PriceInquiry;
    }
    if message.contains("where") || message.contains("location") || message.contains("address") {
        return Intent::LocationInquiry;
    }
    if message.contains("waitlist") {
        return Intent::Waitlist;
    }
    if words.iter().any(|w| ["thanks", "thank", "bye", "goodbye"].contains(w)) {
        return Intent::Farewell;
    }

    if !mentions_day {
        if let Some(n) = bare_int {
            return Intent::SelectServiceIndex { index: n };
        }
    }

    Intent::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting() {
        assert_eq!(keyword_classify("Hello!", &Stage::Greeting), Intent::Greet);
        assert_eq!(keyword_classify("hey there", &Stage::AwaitingService), Intent::Greet);
        // "hi" must match as a word, not inside "this".
        assert_ne!(keyword_classify("this one", &Stage::Greeting), Intent::Greet);
    }

    #[test]
    fn test_service_name_wins_over_stage() {
        let intent = keyword_classify("actually make it a manicure", &Stage::ShowTimes);
        assert_eq!(intent, Intent::SelectService { key: "manicure".to_string() });
    }

    #[test]
    fn test_numeric_in_show_times_is_slot_selection() {
        assert_eq!(
            keyword_classify("2", &Stage::ShowTimes),
            Intent::SelectSlot { index: 2 }
        );
        assert_eq!(
            keyword_classify("book 2", &Stage::ShowTimes),
            Intent::SelectSlot { index: 2 }
        );
    }

    #[test]
    fn test_numeric_outside_show_times_is_service_index() {
        assert_eq!(
            keyword_classify("2", &Stage::AwaitingService),
            Intent::SelectServiceIndex { index: 2 }
        );
        assert_eq!(
            keyword_classify("book 3 please", &Stage::Greeting),
            Intent::SelectServiceIndex { index: 3 }
        );
    }

    #[test]
    fn test_day_phrase_in_show_times_is_not_a_slot_pick() {
        // Left Unknown so the orchestrator can run the time resolver on it.
        assert_eq!(keyword_classify("friday 2pm", &Stage::ShowTimes), Intent::Unknown);
        // A spaced meridiem or a bare hour next to a day name is still a
        // time phrase, never a service index.
        assert_eq!(keyword_classify("friday 2 pm", &Stage::ShowTimes), Intent::Unknown);
        assert_eq!(keyword_classify("friday 9", &Stage::ShowTimes), Intent::Unknown);
        assert_eq!(keyword_classify("tomorrow at 10", &Stage::ShowTimes), Intent::Unknown);
    }

    #[test]
    fn test_cancel_booking_beats_cancel_session() {
        assert_eq!(
            keyword_classify("please cancel my booking", &Stage::Greeting),
            Intent::CancelBooking
        );
        assert_eq!(keyword_classify("cancel", &Stage::ShowTimes), Intent::CancelSession);
        assert_eq!(keyword_classify("no", &Stage::ShowTimes), Intent::CancelSession);
    }

    #[test]
    fn test_inquiries() {
        assert_eq!(
            keyword_classify("what services do you offer?", &Stage::Greeting),
            Intent::ListServices
        );
        assert_eq!(
            keyword_classify("how much is it", &Stage::Greeting),
            Intent::PriceInquiry
        );
        assert_eq!(
            keyword_classify("where are you located", &Stage::Greeting),
            Intent::LocationInquiry
        );
        assert_eq!(
            keyword_classify("put me on the waitlist", &Stage::Greeting),
            Intent::Waitlist
        );
        assert_eq!(keyword_classify("thanks, bye!", &Stage::Greeting), Intent::Farewell);
    }

    #[test]
    fn test_reschedule() {
        assert_eq!(
            keyword_classify("can i reschedule to friday 2pm", &Stage::Greeting),
            Intent::Reschedule
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            keyword_classify("the weather is nice", &Stage::Greeting),
            Intent::Unknown
        );
    }
}
