//! Database repository for CRUD operations over events and user profiles.
//!
//! Every event operation is ownership-scoped: the predicate always includes
//! `username`, and a mutation that matches another user's row behaves
//! exactly like one that matches nothing. Tag and platform fields go
//! through the list codec on the way in and out, so callers only ever see
//! `Vec<String>`.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::codec;
use crate::errors::AppError;
use crate::models::{CreateEventRequest, Event, EventFilter, UpdateEventRequest, UserProfile};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== EVENT OPERATIONS ====================

    /// Create a new event for `username`.
    ///
    /// Stamps `created_at` with the server clock and returns the stored
    /// event with tags/platforms decoded back to lists.
    pub async fn create_event(
        &self,
        username: &str,
        request: &CreateEventRequest,
    ) -> Result<Event, AppError> {
        let now = Utc::now().to_rfc3339();
        let tags_json = codec::encode(request.tags.as_ref());
        let platforms_json = codec::encode(request.platforms.as_ref());

        let result = sqlx::query(
            "INSERT INTO events (title, description, event_date, event_time, tags, platforms, username, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.event_date)
        .bind(&request.event_time)
        .bind(&tags_json)
        .bind(&platforms_json)
        .bind(username)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Event {
            id: result.last_insert_rowid(),
            title: request.title.clone(),
            description: request.description.clone(),
            event_date: request.event_date.clone(),
            event_time: request.event_time.clone(),
            tags: codec::decode(&tags_json),
            platforms: codec::decode(&platforms_json),
            username: username.to_string(),
            created_at: now,
        })
    }

    /// List events for `username`, optionally bounded by an inclusive date
    /// range, ascending by `event_date`.
    pub async fn list_events(
        &self,
        username: &str,
        filter: &EventFilter,
    ) -> Result<Vec<Event>, AppError> {
        let mut sql = String::from(
            "SELECT id, title, description, event_date, event_time, tags, platforms, username, created_at FROM events WHERE username = ?"
        );
        if filter.start_date.is_some() {
            sql.push_str(" AND event_date >= ?");
        }
        if filter.end_date.is_some() {
            sql.push_str(" AND event_date <= ?");
        }
        sql.push_str(" ORDER BY event_date ASC, id ASC");

        let mut query = sqlx::query(&sql).bind(username);
        if let Some(start) = &filter.start_date {
            query = query.bind(start);
        }
        if let Some(end) = &filter.end_date {
            query = query.bind(end);
        }

        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.iter().map(event_from_row).collect())
    }

    /// Get a single event scoped to its owner.
    ///
    /// Returns `None` both for a nonexistent id and for an id owned by a
    /// different username.
    pub async fn get_event(&self, id: i64, username: &str) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, description, event_date, event_time, tags, platforms, username, created_at FROM events WHERE id = ? AND username = ?"
        )
        .bind(id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(event_from_row))
    }

    /// Partially update an event scoped to its owner.
    ///
    /// Fields absent from the request keep their stored values; tags and
    /// platforms are re-encoded when present.
    pub async fn update_event(
        &self,
        id: i64,
        username: &str,
        request: &UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let existing = self
            .get_event(id, username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

        let title = request.title.as_ref().unwrap_or(&existing.title);
        let description = request
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let event_date = request.event_date.as_ref().unwrap_or(&existing.event_date);
        let event_time = request.event_time.clone().or(existing.event_time.clone());
        let tags = match &request.tags {
            Some(input) => codec::encode(Some(input)),
            None => codec::encode_items(&existing.tags),
        };
        let platforms = match &request.platforms {
            Some(input) => codec::encode(Some(input)),
            None => codec::encode_items(&existing.platforms),
        };

        let result = sqlx::query(
            "UPDATE events SET title = ?, description = ?, event_date = ?, event_time = ?, tags = ?, platforms = ? WHERE id = ? AND username = ?"
        )
        .bind(title)
        .bind(description)
        .bind(event_date)
        .bind(&event_time)
        .bind(&tags)
        .bind(&platforms)
        .bind(id)
        .bind(username)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Row vanished between read and write
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }

        Ok(Event {
            id,
            title: title.clone(),
            description: description.clone(),
            event_date: event_date.clone(),
            event_time,
            tags: codec::decode(&tags),
            platforms: codec::decode(&platforms),
            username: username.to_string(),
            created_at: existing.created_at,
        })
    }

    /// Delete an event scoped to its owner.
    ///
    /// Returns whether a row was removed; a non-owned or nonexistent id
    /// removes nothing and returns `false`.
    pub async fn delete_event(&self, id: i64, username: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ? AND username = ?")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== PROFILE OPERATIONS ====================

    /// Save or replace the profile picture for `username`.
    ///
    /// Upsert keyed on `username`: a second save replaces the picture and
    /// refreshes `updated_at` instead of adding a row.
    pub async fn save_profile_picture(
        &self,
        username: &str,
        picture_data: &str,
    ) -> Result<UserProfile, AppError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO users (username, profile_picture, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(username) DO UPDATE SET
                   profile_picture = excluded.profile_picture,
                   updated_at = excluded.updated_at"#,
        )
        .bind(username)
        .bind(picture_data)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(UserProfile {
            username: username.to_string(),
            profile_picture: Some(picture_data.to_string()),
            updated_at: now,
        })
    }

    /// Get the stored profile picture for `username`, if any.
    pub async fn get_profile_picture(&self, username: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT profile_picture FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| r.get("profile_picture")))
    }
}

// Helper functions for row conversion

fn event_from_row(row: &sqlx::sqlite::SqliteRow) -> Event {
    let tags: Option<String> = row.get("tags");
    let platforms: Option<String> = row.get("platforms");
    Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        event_date: row.get("event_date"),
        event_time: row.get("event_time"),
        tags: codec::decode_opt(tags.as_deref()),
        platforms: codec::decode_opt(platforms.as_deref()),
        username: row.get("username"),
        created_at: row.get("created_at"),
    }
}
