pub mod user;

pub use user::{SearchHistoryEntry, User};
