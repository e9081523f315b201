/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing, length rule, guest passwords
/// - [`jwt`]: session token generation and validation
/// - [`middleware`]: bearer-token middleware and the `AuthContext` extractor
///
/// # Example
///
/// ```no_run
/// use eventhub_shared::auth::password::{hash_password, verify_password};
/// use eventhub_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4()), "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
