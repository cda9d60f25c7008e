/// HTTP handlers for matching endpoints
pub mod health;
pub mod matches;

pub use health::{health, ready};
pub use matches::{get_matches, get_suggestions, swipe, unmatch};
