pub mod ai;
pub mod catalog;
pub mod clock;
pub mod conversation;
pub mod intent;
pub mod sessions;
pub mod slots;
pub mod timeparse;
