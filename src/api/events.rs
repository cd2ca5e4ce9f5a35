//! Event API endpoints.
//!
//! Every handler operates on the session user's own events; the repository
//! predicates make cross-user access impossible.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;

use super::{success, ApiResult};
use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::{CreateEventRequest, Event, EventFilter, UpdateEventRequest};
use crate::AppState;

/// GET /api/events - List the session user's events, optionally bounded by
/// an inclusive start_date/end_date range.
pub async fn list_events(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Vec<Event>> {
    let events = state.repo.list_events(&user.username, &filter).await?;
    success(events)
}

/// POST /api/events - Create a new event for the session user.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<Event> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    validate_date(&request.event_date)?;

    let event = state.repo.create_event(&user.username, &request).await?;
    success(event)
}

/// PUT /api/events/{id} - Partially update one of the session user's events.
pub async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Event> {
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
    }
    if let Some(date) = &request.event_date {
        validate_date(date)?;
    }

    let event = state
        .repo
        .update_event(id, &user.username, &request)
        .await?;
    success(event)
}

/// DELETE /api/events/{id} - Delete one of the session user's events.
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let removed = state.repo.delete_event(id, &user.username).await?;
    if !removed {
        return Err(AppError::NotFound(format!("Event {} not found", id)));
    }
    success(())
}

fn validate_date(date: &str) -> Result<(), AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Invalid event_date '{}', expected YYYY-MM-DD", date)))
}
