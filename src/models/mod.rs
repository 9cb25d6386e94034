pub mod booking;
pub mod intent;
pub mod service;
pub mod session;

pub use booking::Booking;
pub use intent::Intent;
pub use service::Service;
pub use session::{Session, Stage};
