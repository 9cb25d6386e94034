use serde::Serialize;

/// A catalog entry. The catalog is static, so entries borrow their strings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Service {
    pub key: &'static str,
    pub name: &'static str,
    pub duration_minutes: i64,
    pub price_dollars: u32,
}
