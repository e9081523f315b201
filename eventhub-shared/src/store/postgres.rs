/// PostgreSQL store
///
/// Thin adapter from the store traits to the model functions. The only
/// logic here is error translation: unique violations on `users.email`
/// become [`StoreError::DuplicateEmail`], and the model's
/// `Option<Result<..>>` convention becomes `EventNotFound`, `Membership`
/// or `Capacity`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EventStore, Store, StoreError, StoreResult, UserStore};
use crate::db::pool::health_check;
use crate::models::{
    event::{CreateEvent, Event, MembershipError, UpdateEvent},
    user::{CreateUser, UpdateUser, User},
};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_user_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(err)
}

fn membership_outcome(
    outcome: Option<Result<Event, MembershipError>>,
) -> StoreResult<Event> {
    match outcome {
        None => Err(StoreError::EventNotFound),
        Some(Err(refused)) => Err(StoreError::Membership(refused)),
        Some(Ok(event)) => Ok(event),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(map_user_write_error)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        User::update(&self.pool, id, data)
            .await
            .map_err(map_user_write_error)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(Event::list(&self.pool).await?)
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(Event::find_by_id(&self.pool, id).await?)
    }

    async fn create_event(&self, data: CreateEvent) -> StoreResult<Event> {
        Ok(Event::create(&self.pool, data).await?)
    }

    async fn update_event(&self, id: Uuid, data: UpdateEvent) -> StoreResult<Option<Event>> {
        match Event::update(&self.pool, id, data).await? {
            None => Ok(None),
            Some(Err(refused)) => Err(StoreError::Capacity(refused)),
            Some(Ok(event)) => Ok(Some(event)),
        }
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Event::delete(&self.pool, id).await?)
    }

    async fn join_event(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Event> {
        membership_outcome(Event::add_attendee(&self.pool, event_id, user_id).await?)
    }

    async fn leave_event(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Event> {
        membership_outcome(Event::remove_attendee(&self.pool, event_id, user_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
