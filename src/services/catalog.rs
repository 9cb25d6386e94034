use crate::models::Service;

/// Fallback appointment length when a booking is created for a service the
/// catalog no longer knows (e.g. rescheduling an old row).
pub const DEFAULT_DURATION_MINUTES: i64 = 30;

/// The salon's menu. Declaration order is the display order and therefore
/// the numeric index users reply with ("book 3" means `SERVICES[2]`).
pub const SERVICES: &[Service] = &[
    Service { key: "haircut", name: "Haircut", duration_minutes: 30, price_dollars: 20 },
    Service { key: "shaving", name: "Shaving", duration_minutes: 15, price_dollars: 10 },
    Service { key: "beard_trimming", name: "Beard trimming", duration_minutes: 15, price_dollars: 12 },
    Service { key: "manicure", name: "Manicure", duration_minutes: 45, price_dollars: 25 },
    Service { key: "pedicure", name: "Pedicure", duration_minutes: 45, price_dollars: 30 },
    Service { key: "styling", name: "Styling", duration_minutes: 60, price_dollars: 40 },
];

pub fn by_key(key: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.key == key)
}

/// 1-based, matching the numbering shown to the user.
pub fn by_index(index: i64) -> Option<&'static Service> {
    if index < 1 {
        return None;
    }
    SERVICES.get(index as usize - 1)
}

/// Scans a lowercased message for a service name mention.
pub fn find_in_message(message: &str) -> Option<&'static Service> {
    SERVICES
        .iter()
        .find(|s| message.contains(&s.name.to_lowercase()))
}

pub fn duration_for(key: &str) -> i64 {
    by_key(key)
        .map(|s| s.duration_minutes)
        .unwrap_or(DEFAULT_DURATION_MINUTES)
}

/// Numbered menu used by the "what services" and invalid-selector replies.
pub fn menu_text() -> String {
    SERVICES
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {} ({} min, ${})", i + 1, s.name, s.duration_minutes, s.price_dollars))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn price_list_text() -> String {
    SERVICES
        .iter()
        .map(|s| format!("{}: ${}", s.name, s.price_dollars))
        .collect::<Vec<_>>()
        .join(", ")
}
