/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, guest login, profile, convert guest)
/// - `events`: Event CRUD plus join and leave

pub mod auth;
pub mod events;
pub mod health;
