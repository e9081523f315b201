/// Event model and database operations
///
/// An event belongs to the user who created it (the organizer). Any other
/// user may join while the event is under capacity, and leave at any time.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     category VARCHAR(100) NOT NULL,
///     date TIMESTAMPTZ NOT NULL,
///     location VARCHAR(255) NOT NULL,
///     image TEXT,
///     organizer_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     max_attendees INTEGER CHECK (max_attendees IS NULL OR max_attendees > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE event_attendees (
///     event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (event_id, user_id)
/// );
/// ```
///
/// # Membership rules
///
/// ```text
/// join:  organizer        → MembershipError::Organizer
///        already present  → MembershipError::AlreadyAttending
///        at capacity      → MembershipError::Full
/// leave: not present      → MembershipError::NotAttending
/// ```
///
/// Both stores evaluate these rules, and the capacity check on update,
/// inside their atomic section, so the attendee count never exceeds
/// `max_attendees`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Event model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub category: String,

    /// When the event takes place
    pub date: DateTime<Utc>,

    pub location: String,

    /// Image URL or path
    pub image: Option<String>,

    /// User who created the event
    #[serde(rename = "organizer")]
    pub organizer_id: Uuid,

    /// Attendee user ids, in join order
    pub attendees: Vec<Uuid>,

    /// Capacity, `None` for unlimited
    pub max_attendees: Option<i32>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Why a join or leave was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("Organizers cannot join their own event")]
    Organizer,

    #[error("You are already attending this event")]
    AlreadyAttending,

    #[error("Event is full")]
    Full,

    #[error("You are not attending this event")]
    NotAttending,
}

/// Why a capacity change was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("Maximum attendees must be at least 1")]
    NotPositive,

    #[error("Maximum attendees cannot be lower than the current attendee count ({current})")]
    BelowAttendeeCount { current: usize },
}

impl Event {
    pub fn is_organizer(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }

    pub fn is_attending(&self, user_id: Uuid) -> bool {
        self.attendees.contains(&user_id)
    }

    /// True when a maximum is set and reached
    pub fn is_full(&self) -> bool {
        match self.max_attendees {
            Some(max) => self.attendees.len() as i64 >= i64::from(max),
            None => false,
        }
    }

    /// Checks whether `user_id` may join
    pub fn check_join(&self, user_id: Uuid) -> Result<(), MembershipError> {
        if self.is_organizer(user_id) {
            return Err(MembershipError::Organizer);
        }
        if self.is_attending(user_id) {
            return Err(MembershipError::AlreadyAttending);
        }
        if self.is_full() {
            return Err(MembershipError::Full);
        }
        Ok(())
    }

    /// Checks whether `user_id` may leave
    pub fn check_leave(&self, user_id: Uuid) -> Result<(), MembershipError> {
        if !self.is_attending(user_id) {
            return Err(MembershipError::NotAttending);
        }
        Ok(())
    }

    /// Checks a new capacity against the current attendees
    pub fn check_capacity(&self, max_attendees: Option<i32>) -> Result<(), CapacityError> {
        validate_capacity(max_attendees)?;
        if let Some(max) = max_attendees {
            if (max as usize) < self.attendees.len() {
                return Err(CapacityError::BelowAttendeeCount {
                    current: self.attendees.len(),
                });
            }
        }
        Ok(())
    }
}

/// Rejects non-positive capacities
pub fn validate_capacity(max_attendees: Option<i32>) -> Result<(), CapacityError> {
    match max_attendees {
        Some(max) if max < 1 => Err(CapacityError::NotPositive),
        _ => Ok(()),
    }
}

/// Input for creating a new event
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub image: Option<String>,
    pub organizer_id: Uuid,
    pub max_attendees: Option<i32>,
}

/// Input for updating an event
///
/// `None` leaves a field unchanged. For the two nullable columns the inner
/// `Option` distinguishes "clear" (`Some(None)`) from "set".
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub image: Option<Option<String>>,
    pub max_attendees: Option<Option<i32>>,
}

impl UpdateEvent {
    /// Applies the update to an in-memory event
    pub fn apply_to(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(image) = self.image {
            event.image = image;
        }
        if let Some(max_attendees) = self.max_attendees {
            event.max_attendees = max_attendees;
        }
        event.updated_at = Utc::now();
    }
}

const SELECT_EVENT: &str = r#"
    SELECT e.id, e.title, e.description, e.category, e.date, e.location, e.image,
           e.organizer_id, e.max_attendees, e.created_at, e.updated_at,
           COALESCE(
               ARRAY_AGG(a.user_id ORDER BY a.joined_at) FILTER (WHERE a.user_id IS NOT NULL),
               '{}'
           ) AS attendees
    FROM events e
    LEFT JOIN event_attendees a ON a.event_id = e.id
"#;

impl Event {
    /// Lists all events, soonest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{} GROUP BY e.id ORDER BY e.date ASC", SELECT_EVENT);
        sqlx::query_as::<_, Event>(&query).fetch_all(pool).await
    }

    /// Finds an event by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        Self::fetch_by_id(pool, id).await
    }

    async fn fetch_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("{} WHERE e.id = $1 GROUP BY e.id", SELECT_EVENT);
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Inserts a new event with no attendees
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO events
                (title, description, category, date, location, image, organizer_id, max_attendees)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.category)
        .bind(data.date)
        .bind(data.location)
        .bind(data.image)
        .bind(data.organizer_id)
        .bind(data.max_attendees)
        .fetch_one(pool)
        .await?;

        Self::fetch_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Updates an event under a row lock
    ///
    /// Nullable columns use a "touch" flag so that they can be cleared.
    /// Returns `Ok(None)` when no event has this id and `Ok(Some(Err(..)))`
    /// when a new capacity is below the attendee count. The lock serializes
    /// the check with concurrent joins.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateEvent,
    ) -> Result<Option<Result<Self, CapacityError>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        if let Some(max_attendees) = data.max_attendees {
            let Some(event) = Self::fetch_by_id(&mut *tx, id).await? else {
                return Ok(None);
            };
            if let Err(refused) = event.check_capacity(max_attendees) {
                return Ok(Some(Err(refused)));
            }
        }

        sqlx::query(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                date = COALESCE($5, date),
                location = COALESCE($6, location),
                image = CASE WHEN $7 THEN $8 ELSE image END,
                max_attendees = CASE WHEN $9 THEN $10 ELSE max_attendees END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.category)
        .bind(data.date)
        .bind(data.location)
        .bind(data.image.is_some())
        .bind(data.image.flatten())
        .bind(data.max_attendees.is_some())
        .bind(data.max_attendees.flatten())
        .execute(&mut *tx)
        .await?;

        let updated = Self::fetch_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(updated.map(Ok))
    }

    /// Deletes an event and its attendee rows
    ///
    /// Returns false if the event didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds an attendee under a row lock on the event
    ///
    /// Returns `Ok(None)` when the event doesn't exist and
    /// `Ok(Some(Err(..)))` when the membership rules refuse the join.
    pub async fn add_attendee(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Result<Self, MembershipError>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let Some(event) = Self::fetch_by_id(&mut *tx, event_id).await? else {
            return Ok(None);
        };
        if let Err(refused) = event.check_join(user_id) {
            return Ok(Some(Err(refused)));
        }

        sqlx::query("INSERT INTO event_attendees (event_id, user_id) VALUES ($1, $2)")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let updated = Self::fetch_by_id(&mut *tx, event_id).await?;
        tx.commit().await?;

        Ok(updated.map(Ok))
    }

    /// Removes an attendee
    ///
    /// Same return convention as [`Event::add_attendee`].
    pub async fn remove_attendee(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Result<Self, MembershipError>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Ok(Some(Err(MembershipError::NotAttending)));
        }

        let updated = Self::fetch_by_id(&mut *tx, event_id).await?;
        tx.commit().await?;

        Ok(updated.map(Ok))
    }
}
