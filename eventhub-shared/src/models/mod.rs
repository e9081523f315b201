/// Database models for EventHub
///
/// # Models
///
/// - `user`: registered and guest accounts
/// - `event`: events, their organizer and attendees
///
/// Each model exposes its PostgreSQL operations as associated functions
/// taking a `&PgPool`. Handlers reach them through the [`crate::store`]
/// traits rather than calling them directly.
///
/// # Example
///
/// ```no_run
/// use eventhub_shared::models::user::{CreateUser, User};
/// use eventhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Ann".to_string(),
///     email: "ann@x.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_guest: false,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod event;
pub mod user;
