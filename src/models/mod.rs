//! Data models for the Tidecal calendar.
//!
//! Wire field names stay snake_case to match the existing calendar clients.

mod event;
mod user;

pub use event::*;
pub use user::*;
