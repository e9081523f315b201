//! # EventHub Client
//!
//! Client-side half of EventHub: an HTTP client for the REST API, the
//! event context that holds the signed-in user and the event list, and the
//! headless event details component built on top of it.
//!
//! ```text
//! HttpClient (EventApi) ──► EventContext ──► EventDetails ──► EventView
//!        ▲                      │ join / leave / delete
//!        └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `api`: `EventApi` trait and its reqwest implementation
//! - `context`: shared client state and the mutations that keep it fresh
//! - `details`: view model for a single event with role-aware controls

pub mod api;
pub mod context;
pub mod details;

pub use api::{ClientError, EventApi, HttpClient, Session};
pub use context::EventContext;
pub use details::{Action, ActionOutcome, Control, EventDetails, EventView};
