/// Persistence seam for users and events
///
/// Handlers depend on the [`Store`] trait object, never on a concrete
/// backend. Two implementations exist:
///
/// - [`postgres::PgStore`]: delegates to the model functions over a `PgPool`
/// - [`memory::MemoryStore`]: process-local maps behind a `RwLock`, used when
///   no database is configured and throughout the test suites
///
/// Both backends enforce the same invariants: unique normalized email, and
/// membership and capacity rules checked atomically with the write they
/// guard.
///
/// # Example
///
/// ```
/// use eventhub_shared::store::{memory::MemoryStore, UserStore};
/// use eventhub_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store.create_user(CreateUser {
///     name: "Ann".to_string(),
///     email: "ann@x.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_guest: false,
/// }).await?;
///
/// assert!(store.find_user_by_email("ann@x.com").await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

pub use sqlx::Error as DatabaseError;

use crate::models::{
    event::{CapacityError, CreateEvent, Event, MembershipError, UpdateEvent},
    user::{CreateUser, UpdateUser, User},
};

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email already belongs to another user
    #[error("Email already registered")]
    DuplicateEmail,

    /// Event does not exist
    #[error("Event not found")]
    EventNotFound,

    /// Join or leave refused by the membership rules
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Capacity change refused against the current attendees
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; fails with `DuplicateEmail` when the email is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact-match lookup, no normalization
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Returns `None` when the user doesn't exist
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;
}

/// Event persistence
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events, soonest first
    async fn list_events(&self) -> StoreResult<Vec<Event>>;

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn create_event(&self, data: CreateEvent) -> StoreResult<Event>;

    /// Returns `None` when the event doesn't exist. A new `max_attendees` is
    /// checked against the attendee count atomically with the write.
    async fn update_event(&self, id: Uuid, data: UpdateEvent) -> StoreResult<Option<Event>>;

    /// Returns false when the event doesn't exist
    async fn delete_event(&self, id: Uuid) -> StoreResult<bool>;

    /// Adds `user_id` to the attendees, checking the membership rules
    /// atomically with the write
    async fn join_event(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Event>;

    /// Removes `user_id` from the attendees
    async fn leave_event(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Event>;
}

/// Complete storage backend
#[async_trait]
pub trait Store: UserStore + EventStore {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Checks the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
