use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

use crate::db::store::BookingStore;
use crate::models::{Booking, Intent, Session, Stage};
use crate::services::{catalog, slots, timeparse};
use crate::state::AppState;

/// How many of the computed slots are shown in a reply. More may be held in
/// the session; selection indexes past this are still valid.
const MAX_SLOTS_SHOWN: usize = 8;

const WAITLIST_ACK: &str =
    "Sure, I've added you to the waitlist. We'll let you know if a slot opens up.";

#[derive(Debug)]
pub struct ChatOutcome {
    pub reply: String,
    pub booking_confirmed: bool,
}

/// The single entry point the HTTP layer calls. Loads (or creates) the
/// session, classifies the message against the current stage, dispatches,
/// and writes the session back. Store failures propagate; every
/// conversational dead end becomes a reply instead.
pub async fn handle_message(
    state: &AppState,
    message: &str,
    session_id: &str,
    client_name: &str,
) -> anyhow::Result<ChatOutcome> {
    // Global critical section: the per-message read-modify-write of the
    // session must not interleave with another message for the same id.
    let _guard = state.message_lock.lock().await;

    let now = state.clock.now();
    let mut session = state.sessions.get_or_create(session_id, client_name, now);

    // The waitlist offer is only good for the very next message.
    let waitlist_pending = std::mem::take(&mut session.waitlist_offered);

    let intent = state.classifier.classify(message, &session.stage).await;

    tracing::info!(
        session = session_id,
        stage = session.stage.as_str(),
        intent = ?intent,
        "processing message"
    );

    let mut booking_confirmed = false;
    let mut drop_session = false;

    let reply = match intent {
        Intent::Greet => {
            session.stage = Stage::AwaitingService;
            format!(
                "Welcome to {}, {}! How can I help you today? We do haircuts, shaving, manicures and more. Say \"services\" for the full menu.",
                state.config.business_name, client_name,
            )
        }

        Intent::ListServices => {
            format!("Here's what we offer:\n{}\nReply with a service name or number to book.", catalog::menu_text())
        }

        Intent::SelectService { key } => offer_slots(state, &mut session, &key, now)?,

        Intent::SelectServiceIndex { index } => match catalog::by_index(index) {
            Some(service) => offer_slots(state, &mut session, service.key, now)?,
            None => format!(
                "I didn't catch which service you meant. Here's the menu:\n{}",
                catalog::menu_text()
            ),
        },

        Intent::SelectSlot { index } => handle_slot_selection(
            state,
            &mut session,
            index,
            client_name,
            now,
            &mut booking_confirmed,
        )?,

        Intent::Reschedule => handle_reschedule(state, message, client_name, now)?,

        Intent::CancelBooking => match state.bookings.find_by_client(client_name)? {
            Some(booking) => {
                state.bookings.delete(&booking.id)?;
                tracing::info!(booking = %booking.id, "booking cancelled");
                "Your appointment has been cancelled.".to_string()
            }
            None => "You have no existing bookings to cancel.".to_string(),
        },

        Intent::CancelSession => {
            drop_session = true;
            "No problem, I've cleared that. Let me know whenever you'd like to book.".to_string()
        }

        Intent::PriceInquiry => format!(
            "Our prices: {}. Would you like to book an appointment?",
            catalog::price_list_text()
        ),

        Intent::LocationInquiry => format!(
            "We're at {}. Open 9 AM to 7 PM daily.",
            state.config.business_address
        ),

        Intent::Waitlist => WAITLIST_ACK.to_string(),

        Intent::Farewell => {
            drop_session = true;
            "Thanks for choosing us! Have a great day.".to_string()
        }

        Intent::Unknown => {
            if waitlist_pending && is_affirmative(message) {
                WAITLIST_ACK.to_string()
            } else if session.stage == Stage::ShowTimes {
                handle_time_phrase(state, &mut session, message, client_name, now, &mut booking_confirmed)?
            } else {
                "I'm sorry, I didn't understand that. You can book an appointment, check available slots, or ask about our services.".to_string()
            }
        }
    };

    if drop_session {
        state.sessions.delete(session_id);
    } else {
        session.touch(now);
        state.sessions.save(&session);
    }

    Ok(ChatOutcome {
        reply,
        booking_confirmed,
    })
}

/// The single mutation point for new bookings. No overlap re-check here:
/// the slot was free when offered, and the offer-to-confirm race is an
/// accepted limitation.
pub fn create_booking(
    store: &dyn BookingStore,
    client_name: &str,
    service_key: &str,
    slot_start: NaiveDateTime,
    now: NaiveDateTime,
) -> anyhow::Result<Booking> {
    let duration = catalog::duration_for(service_key);
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        client_name: client_name.to_string(),
        service: service_key.to_string(),
        start_time: slot_start,
        end_time: slot_start + Duration::minutes(duration),
        created_at: now,
    };
    store.insert(&booking)?;
    tracing::info!(booking = %booking.id, service = service_key, "booking created");
    Ok(booking)
}

fn offer_slots(
    state: &AppState,
    session: &mut Session,
    service_key: &str,
    now: NaiveDateTime,
) -> anyhow::Result<String> {
    let service = match catalog::by_key(service_key) {
        Some(s) => s,
        None => {
            return Ok(format!(
                "I didn't catch which service you meant. Here's the menu:\n{}",
                catalog::menu_text()
            ))
        }
    };

    let times = slots::available_slots(state.bookings.as_ref(), service.duration_minutes, now)?;

    if times.is_empty() {
        session.selected_service = Some(service.key.to_string());
        session.waitlist_offered = true;
        return Ok(
            "Sorry, no available slots in the next couple of days. Would you like to join the waitlist? Reply \"yes\" or \"waitlist\"."
                .to_string(),
        );
    }

    session.selected_service = Some(service.key.to_string());
    session.available_times = times;
    session.stage = Stage::ShowTimes;

    Ok(format!(
        "Great, a {} takes {} minutes (${}). Here are the next openings:\n{}\nReply with a number to book, or tell me a time like \"Friday 2pm\".",
        service.name,
        service.duration_minutes,
        service.price_dollars,
        slot_list_text(&session.available_times),
    ))
}

fn handle_slot_selection(
    state: &AppState,
    session: &mut Session,
    index: i64,
    client_name: &str,
    now: NaiveDateTime,
    booking_confirmed: &mut bool,
) -> anyhow::Result<String> {
    // Cannot normally happen from ShowTimes, but a slot pick without a
    // chosen service routes back to the catalog rather than erroring.
    let Some(service_key) = session.selected_service.clone() else {
        session.stage = Stage::AwaitingService;
        return Ok(format!(
            "Let's pick a service first. Here's the menu:\n{}",
            catalog::menu_text()
        ));
    };

    if index < 1 || index as usize > session.available_times.len() {
        return Ok(format!(
            "That's not one of the offered slots. Please pick a number between 1 and {}.",
            session.available_times.len()
        ));
    }

    let slot = session.available_times[index as usize - 1];
    let booking = create_booking(state.bookings.as_ref(), client_name, &service_key, slot, now)?;

    session.stage = Stage::Booked;
    session.available_times.clear();
    *booking_confirmed = true;

    Ok(confirmation_text(&booking))
}

/// A message in ShowTimes that wasn't a number: try to read it as a time
/// phrase and book that exact time instead of an offered slot.
fn handle_time_phrase(
    state: &AppState,
    session: &mut Session,
    message: &str,
    client_name: &str,
    now: NaiveDateTime,
    booking_confirmed: &mut bool,
) -> anyhow::Result<String> {
    let Some(service_key) = session.selected_service.clone() else {
        session.stage = Stage::AwaitingService;
        return Ok(format!(
            "Let's pick a service first. Here's the menu:\n{}",
            catalog::menu_text()
        ));
    };

    let Some(start) = timeparse::resolve(message, now) else {
        return Ok(format!(
            "Sorry, I didn't catch a time there. Reply with a slot number between 1 and {}, or a time like \"Friday 2pm\".",
            session.available_times.len()
        ));
    };

    let end = start + Duration::minutes(catalog::duration_for(&service_key));
    if state.bookings.find_overlapping(start, end)?.is_some() {
        return Ok(format!(
            "Sorry, that time is already booked. These are still open:\n{}",
            slot_list_text(&session.available_times)
        ));
    }

    let booking = create_booking(state.bookings.as_ref(), client_name, &service_key, start, now)?;

    session.stage = Stage::Booked;
    session.available_times.clear();
    *booking_confirmed = true;

    Ok(confirmation_text(&booking))
}

fn handle_reschedule(
    state: &AppState,
    message: &str,
    client_name: &str,
    now: NaiveDateTime,
) -> anyhow::Result<String> {
    let Some(existing) = state.bookings.find_by_client(client_name)? else {
        return Ok("You have no existing bookings to modify.".to_string());
    };

    let Some(new_start) = timeparse::resolve(message, now) else {
        return Ok("Please tell me the new day and time, for example \"reschedule to Friday 2pm\".".to_string());
    };

    let duration = existing.end_time - existing.start_time;

    // Explicit reschedule keeps the booking's identity: same id, new times.
    state.bookings.delete(&existing.id)?;
    let moved = Booking {
        start_time: new_start,
        end_time: new_start + duration,
        ..existing
    };
    state.bookings.insert(&moved)?;
    tracing::info!(booking = %moved.id, "booking rescheduled");

    Ok(format!(
        "Your appointment has been moved to {}.",
        fmt_slot(&moved.start_time)
    ))
}

fn is_affirmative(message: &str) -> bool {
    message
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|w| matches!(w, "yes" | "yeah" | "yep" | "sure" | "ok" | "okay"))
}

fn fmt_slot(dt: &NaiveDateTime) -> String {
    dt.format("%A %I:%M %p").to_string()
}

fn slot_list_text(times: &[NaiveDateTime]) -> String {
    times
        .iter()
        .take(MAX_SLOTS_SHOWN)
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, fmt_slot(t)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn confirmation_text(booking: &Booking) -> String {
    let service_name = catalog::by_key(&booking.service)
        .map(|s| s.name)
        .unwrap_or("appointment");
    format!(
        "Your {} on {} is confirmed. Thank you, {}!",
        service_name,
        fmt_slot(&booking.start_time),
        booking.client_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::config::AppConfig;
    use crate::db;
    use crate::db::store::SqliteBookingStore;
    use crate::services::clock::FixedClock;
    use crate::services::intent::KeywordClassifier;
    use crate::services::sessions::InMemorySessionStore;
    use crate::state::AppState;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    // 2025-06-18 is a Wednesday, mid-morning.
    const NOW: &str = "2025-06-18 10:00";

    fn test_state() -> AppState {
        let conn = db::init_db(":memory:").unwrap();
        AppState {
            config: AppConfig {
                port: 3000,
                database_url: ":memory:".to_string(),
                business_name: "Salon Deluxe".to_string(),
                business_address: "123 Main Street, Downtown".to_string(),
                classifier: "keyword".to_string(),
                ollama_url: String::new(),
                ollama_model: String::new(),
            },
            bookings: Box::new(SqliteBookingStore::new(Arc::new(Mutex::new(conn)))),
            sessions: Box::new(InMemorySessionStore::new()),
            clock: Box::new(FixedClock(dt(NOW))),
            classifier: Box::new(KeywordClassifier),
            message_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn send(state: &AppState, message: &str) -> ChatOutcome {
        handle_message(state, message, "s1", "Alice").await.unwrap()
    }

    fn current_stage(state: &AppState) -> Stage {
        state.sessions.get_or_create("s1", "Alice", dt(NOW)).stage
    }

    fn numbered_lines(reply: &str) -> usize {
        reply
            .lines()
            .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()) && l.contains(". "))
            .count()
    }

    #[tokio::test]
    async fn test_greeting_advances_without_booking() {
        let state = test_state();
        let outcome = send(&state, "hello").await;

        assert!(outcome.reply.contains("Welcome to Salon Deluxe, Alice"));
        assert!(!outcome.booking_confirmed);
        assert_eq!(current_stage(&state), Stage::AwaitingService);
        assert!(state.bookings.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_booking_flow() {
        let state = test_state();
        send(&state, "hello").await;

        let offer = send(&state, "I'd like a haircut").await;
        assert_eq!(current_stage(&state), Stage::ShowTimes);
        assert!(numbered_lines(&offer.reply) <= 8);
        assert!(!offer.booking_confirmed);

        let confirm = send(&state, "2").await;
        assert!(confirm.booking_confirmed);
        assert!(confirm.reply.contains("confirmed"));
        assert_eq!(current_stage(&state), Stage::Booked);

        let bookings = state.bookings.list_all().unwrap();
        assert_eq!(bookings.len(), 1);
        // Second offered slot: 10:00 rounds up to 10:30, so slot 2 is 11:00.
        assert_eq!(bookings[0].start_time, dt("2025-06-18 11:00"));
        // End time carries the haircut duration.
        assert_eq!(bookings[0].end_time - bookings[0].start_time, Duration::minutes(30));
        assert_eq!(bookings[0].client_name, "Alice");
    }

    #[tokio::test]
    async fn test_slot_list_caps_at_eight() {
        let state = test_state();
        let offer = send(&state, "haircut").await;

        assert_eq!(numbered_lines(&offer.reply), 8);
        // More slots are held than shown, and index 9 still books.
        let confirm = send(&state, "9").await;
        assert!(confirm.booking_confirmed);
    }

    #[tokio::test]
    async fn test_invalid_slot_keeps_session_usable() {
        let state = test_state();
        send(&state, "haircut").await;

        let outcome = send(&state, "99").await;
        assert!(!outcome.booking_confirmed);
        assert!(outcome.reply.contains("not one of the offered slots"));
        assert_eq!(current_stage(&state), Stage::ShowTimes);
        assert!(state.bookings.list_all().unwrap().is_empty());

        // A valid pick afterwards still works.
        let confirm = send(&state, "1").await;
        assert!(confirm.booking_confirmed);
    }

    #[tokio::test]
    async fn test_bare_number_before_service_routes_to_catalog() {
        let state = test_state();
        let outcome = send(&state, "99").await;

        assert!(!outcome.booking_confirmed);
        assert!(outcome.reply.contains("1. Haircut"));
        assert!(state.bookings.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_valid_number_outside_show_times_selects_service() {
        let state = test_state();
        // 4 = manicure in catalog order.
        let outcome = send(&state, "4").await;

        assert_eq!(current_stage(&state), Stage::ShowTimes);
        assert!(outcome.reply.contains("Manicure"));
    }

    #[tokio::test]
    async fn test_cancel_resets_to_fresh_session() {
        let state = test_state();
        send(&state, "hello").await;
        send(&state, "haircut").await;

        let outcome = send(&state, "cancel").await;
        assert!(outcome.reply.contains("cleared"));
        assert_eq!(current_stage(&state), Stage::Greeting);

        let again = send(&state, "hello").await;
        assert!(again.reply.contains("Welcome"));
    }

    #[tokio::test]
    async fn test_time_phrase_books_directly() {
        let state = test_state();
        send(&state, "haircut").await;

        let outcome = send(&state, "friday 2pm").await;
        assert!(outcome.booking_confirmed);

        let bookings = state.bookings.list_all().unwrap();
        assert_eq!(bookings[0].start_time, dt("2025-06-20 14:00"));
    }

    #[tokio::test]
    async fn test_spaced_time_phrase_books_instead_of_switching_service() {
        let state = test_state();
        send(&state, "haircut").await;

        // "2 pm" with a space must not be read as service number 2.
        let outcome = send(&state, "friday 2 pm").await;
        assert!(outcome.booking_confirmed);
        assert!(outcome.reply.contains("Haircut"));

        let bookings = state.bookings.list_all().unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].service, "haircut");
        assert_eq!(bookings[0].start_time, dt("2025-06-20 14:00"));
    }

    #[tokio::test]
    async fn test_day_with_bare_hour_books_at_that_hour() {
        let state = test_state();
        send(&state, "haircut").await;

        let outcome = send(&state, "friday 9").await;
        assert!(outcome.booking_confirmed);

        let bookings = state.bookings.list_all().unwrap();
        assert_eq!(bookings[0].start_time, dt("2025-06-20 09:00"));
    }

    #[tokio::test]
    async fn test_time_phrase_conflict_reoffers_slots() {
        let state = test_state();
        create_booking(
            state.bookings.as_ref(),
            "Bob",
            "haircut",
            dt("2025-06-20 14:00"),
            dt(NOW),
        )
        .unwrap();

        send(&state, "haircut").await;
        let outcome = send(&state, "friday 2pm").await;

        assert!(!outcome.booking_confirmed);
        assert!(outcome.reply.contains("already booked"));
        assert_eq!(current_stage(&state), Stage::ShowTimes);
        assert_eq!(state.bookings.list_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_time_in_show_times_asks_again() {
        let state = test_state();
        send(&state, "haircut").await;

        let outcome = send(&state, "whenever works").await;
        assert!(!outcome.booking_confirmed);
        assert!(outcome.reply.contains("slot number"));
        assert_eq!(current_stage(&state), Stage::ShowTimes);
    }

    #[tokio::test]
    async fn test_reschedule_moves_latest_booking() {
        let state = test_state();
        send(&state, "haircut").await;
        send(&state, "1").await;

        let before = state.bookings.list_all().unwrap();
        let outcome = send(&state, "reschedule to friday 3pm").await;

        assert!(outcome.reply.contains("moved"));
        let after = state.bookings.list_all().unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].start_time, dt("2025-06-20 15:00"));
        assert_eq!(after[0].end_time - after[0].start_time, Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_reschedule_without_booking_or_time() {
        let state = test_state();
        let none = send(&state, "reschedule to friday 3pm").await;
        assert!(none.reply.contains("no existing bookings"));

        send(&state, "haircut").await;
        send(&state, "1").await;
        let vague = send(&state, "reschedule it please").await;
        assert!(vague.reply.contains("new day and time"));
    }

    #[tokio::test]
    async fn test_cancel_booking_deletes_it() {
        let state = test_state();
        send(&state, "haircut").await;
        send(&state, "1").await;
        assert_eq!(state.bookings.list_all().unwrap().len(), 1);

        let outcome = send(&state, "cancel my booking").await;
        assert!(outcome.reply.contains("cancelled"));
        assert!(state.bookings.list_all().unwrap().is_empty());

        let nothing = send(&state, "cancel my booking").await;
        assert!(nothing.reply.contains("no existing bookings"));
    }

    #[tokio::test]
    async fn test_booked_slot_not_reoffered_to_next_client() {
        let state = test_state();
        send(&state, "haircut").await;
        send(&state, "1").await;
        let booked = state.bookings.list_all().unwrap()[0].start_time;

        let offer = handle_message(&state, "haircut", "s2", "Bob").await.unwrap();
        assert!(!offer.reply.contains(&fmt_slot(&booked)));
    }

    #[tokio::test]
    async fn test_inquiries_do_not_touch_stores() {
        let state = test_state();

        let price = send(&state, "what are your prices").await;
        assert!(price.reply.contains("Haircut: $20"));
        assert!(!price.booking_confirmed);

        let loc = send(&state, "where are you").await;
        assert!(loc.reply.contains("123 Main Street"));

        let menu = send(&state, "what services do you offer").await;
        assert!(menu.reply.contains("6. Styling"));

        assert!(state.bookings.list_all().unwrap().is_empty());
        assert_eq!(current_stage(&state), Stage::Greeting);
    }

    #[tokio::test]
    async fn test_no_slots_offer_accepts_a_plain_yes() {
        let state = test_state();
        // One block booking covering the whole search horizon.
        state
            .bookings
            .insert(&Booking {
                id: "maintenance-block".to_string(),
                client_name: "Staff".to_string(),
                service: "styling".to_string(),
                start_time: dt("2025-06-18 09:00"),
                end_time: dt("2025-06-21 19:00"),
                created_at: dt(NOW),
            })
            .unwrap();

        let offer = send(&state, "haircut").await;
        assert!(offer.reply.contains("waitlist"));
        assert!(!offer.booking_confirmed);

        let yes = send(&state, "yes").await;
        assert!(yes.reply.contains("added you to the waitlist"));
        assert!(!yes.booking_confirmed);

        // The offer is spent; a later stray "yes" is not a waitlist join.
        let stray = send(&state, "yes").await;
        assert!(stray.reply.contains("didn't understand"));
    }

    #[tokio::test]
    async fn test_farewell_drops_session() {
        let state = test_state();
        send(&state, "haircut").await;

        let outcome = send(&state, "thanks, bye").await;
        assert!(outcome.reply.contains("Have a great day"));
        assert_eq!(current_stage(&state), Stage::Greeting);
    }

    #[tokio::test]
    async fn test_unknown_message_is_a_soft_fallback() {
        let state = test_state();
        let outcome = send(&state, "the weather is nice").await;

        assert!(!outcome.booking_confirmed);
        assert!(outcome.reply.contains("didn't understand"));
        assert_eq!(current_stage(&state), Stage::Greeting);
    }
}
