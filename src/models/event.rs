//! Calendar event model.

use serde::{Deserialize, Serialize};

use crate::codec::ListInput;

/// A calendar event owned by exactly one username.
///
/// `tags` and `platforms` are always materialized as lists here, whatever
/// shape they were stored or submitted in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ISO calendar date, `YYYY-MM-DD`
    pub event_date: String,
    /// Legacy time-of-day field; current clients always leave it null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    pub username: String,
    pub created_at: String,
}

/// Request body for creating a new event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub event_date: String,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub tags: Option<ListInput>,
    #[serde(default)]
    pub platforms: Option<ListInput>,
}

/// Request body for partially updating an existing event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub tags: Option<ListInput>,
    #[serde(default)]
    pub platforms: Option<ListInput>,
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    /// Inclusive lower bound on `event_date`
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper bound on `event_date`
    #[serde(default)]
    pub end_date: Option<String>,
}
