/// User model and database operations
///
/// A user is either a registered account or a guest. Guests are created by
/// guest login with a random password and can later be promoted in place
/// (same id) by registering with the same email or by convert-guest.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     is_guest BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are normalized with [`normalize_email`] before they are written,
/// so the plain `UNIQUE` constraint enforces uniqueness of the normalized
/// form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
/// Display name given to accounts created by guest login
pub const GUEST_DISPLAY_NAME: &str = "Guest User";

/// User model representing an account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Normalized email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Whether this is a guest account
    pub is_guest: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_guest: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_guest: user.is_guest,
        }
    }
}

impl User {
    /// Returns the public summary of this user
    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address, already normalized
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Whether the account is a guest
    pub is_guest: bool,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub is_guest: Option<bool>,
}

/// Normalizes an email for storage and lookup: trimmed and lower-cased
///
/// # Example
///
/// ```
/// use eventhub_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("  Ann@X.com "), "ann@x.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a database error with the `users_email_key` constraint when the
    /// email is already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, is_guest)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, is_guest, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.is_guest)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, is_guest, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by exact email
    ///
    /// No normalization is applied here; callers decide whether to normalize.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, is_guest, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates an existing user
    ///
    /// Returns `None` when no user has this id.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                is_guest = COALESCE($4, is_guest),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, password_hash, is_guest, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.is_guest)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            is_guest: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Ann@X.com"), "ann@x.com");
        assert_eq!(normalize_email("\tbob@example.org \n"), "bob@example.org");
        assert_eq!(normalize_email("already@lower.io"), "already@lower.io");
    }

    #[test]
    fn test_summary_serialization() {
        let user = sample_user();
        let json = serde_json::to_value(user.summary()).unwrap();

        assert_eq!(json["_id"], user.id.to_string());
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["email"], "ann@x.com");
        assert_eq!(json["isGuest"], false);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.password_hash.is_none());
        assert!(update.is_guest.is_none());
    }
}
