/// Middleware modules for the API server
///
/// Authentication lives in `eventhub_shared::auth::middleware`; this module
/// holds the HTTP concerns that only the server needs.

pub mod security;
