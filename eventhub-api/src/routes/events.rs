/// Event endpoints
///
/// # Endpoints
///
/// - `GET /api/events` - List events, soonest first
/// - `GET /api/events/:id` - Event details
/// - `POST /api/events` - Create an event (authenticated)
/// - `PUT /api/events/:id` - Update an event (organizer)
/// - `DELETE /api/events/:id` - Delete an event (organizer)
/// - `POST /api/events/:id/join` - Join an event (authenticated)
/// - `POST /api/events/:id/leave` - Leave an event (authenticated)
///
/// Single-event responses are wrapped as `{ "event": ... }`, the list as
/// `{ "events": [...] }`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use eventhub_shared::{
    auth::middleware::AuthContext,
    models::event::{CreateEvent, Event, UpdateEvent},
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create event request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Please provide a title"))]
    pub title: String,

    #[validate(length(min = 1, message = "Please provide a description"))]
    pub description: String,

    #[validate(length(min = 1, max = 100, message = "Please provide a category"))]
    pub category: String,

    /// RFC 3339 timestamp
    pub date: DateTime<Utc>,

    #[validate(length(min = 1, max = 255, message = "Please provide a location"))]
    pub location: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, message = "Maximum attendees must be at least 1"))]
    pub max_attendees: Option<i32>,
}

/// Update event request
///
/// Absent fields are left unchanged; `null` clears `image` and
/// `maxAttendees`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub max_attendees: Option<Option<i32>>,
}

/// Wraps any present value (including `null`) in `Some`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub event: Event,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Unparseable ids can't name an event
fn event_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::NotFound("Event not found".to_string()))
}

fn required(field: &str, value: &str, message: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::invalid_field(field, message));
    }
    Ok(value.to_string())
}

fn optional_required(field: &str, value: Option<String>, message: &str) -> ApiResult<Option<String>> {
    value.map(|value| required(field, &value, message)).transpose()
}

/// Loads the event and checks the caller organizes it
async fn owned_event(state: &AppState, id: Uuid, auth: AuthContext) -> ApiResult<Event> {
    let event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if !event.is_organizer(auth.user_id) {
        tracing::warn!(event_id = %id, user_id = %auth.user_id, "Non-organizer tried to modify event");
        return Err(ApiError::Forbidden(
            "Only the organizer can modify this event".to_string(),
        ));
    }

    Ok(event)
}

/// Lists all events
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<EventListResponse>> {
    let events = state.store.list_events().await?;
    Ok(Json(EventListResponse { events }))
}

/// Event details
///
/// # Errors
///
/// - `404 Not Found`: No such event
pub async fn get_event(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EventResponse>> {
    let id = event_id(path)?;
    let event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(EventResponse { event }))
}

/// Creates an event organized by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/events
/// Authorization: Bearer eyJ...
/// Content-Type: application/json
///
/// {
///   "title": "Rust meetup",
///   "description": "Talks and pizza",
///   "category": "Tech",
///   "date": "2026-11-05T18:00:00Z",
///   "location": "Library",
///   "maxAttendees": 30
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: No identity
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventResponse>)> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::from_validation)?;

    let event = state
        .store
        .create_event(CreateEvent {
            title: required("title", &req.title, "Please provide a title")?,
            description: required("description", &req.description, "Please provide a description")?,
            category: required("category", &req.category, "Please provide a category")?,
            date: req.date,
            location: required("location", &req.location, "Please provide a location")?,
            image: req.image.filter(|image| !image.trim().is_empty()),
            organizer_id: auth.user_id,
            max_attendees: req.max_attendees,
        })
        .await?;

    tracing::info!(event_id = %event.id, organizer = %auth.user_id, "Event created");
    Ok((StatusCode::CREATED, Json(EventResponse { event })))
}

/// Updates an event
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the new maximum is below the
///   current attendee count
/// - `403 Forbidden`: Caller is not the organizer
/// - `404 Not Found`: No such event
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> ApiResult<Json<EventResponse>> {
    let id = event_id(path)?;
    let Json(req) = payload?;

    owned_event(&state, id, auth).await?;

    let update = UpdateEvent {
        title: optional_required("title", req.title, "Please provide a title")?,
        description: optional_required("description", req.description, "Please provide a description")?,
        category: optional_required("category", req.category, "Please provide a category")?,
        date: req.date,
        location: optional_required("location", req.location, "Please provide a location")?,
        image: req
            .image
            .map(|image| image.filter(|image| !image.trim().is_empty())),
        max_attendees: req.max_attendees,
    };

    let event = state
        .store
        .update_event(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    tracing::info!(event_id = %id, "Event updated");
    Ok(Json(EventResponse { event }))
}

/// Deletes an event and its attendee list
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not the organizer
/// - `404 Not Found`: No such event
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = event_id(path)?;
    owned_event(&state, id, auth).await?;

    if !state.store.delete_event(id).await? {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    tracing::info!(event_id = %id, "Event deleted");
    Ok(Json(MessageResponse {
        message: "Event removed".to_string(),
    }))
}

/// Adds the caller to the attendees
///
/// # Errors
///
/// - `400 Bad Request`: Caller organizes the event, already attends, or the
///   event is full
/// - `404 Not Found`: No such event
pub async fn join_event(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EventResponse>> {
    let id = event_id(path)?;
    let event = state.store.join_event(id, auth.user_id).await?;

    tracing::debug!(event_id = %id, user_id = %auth.user_id, "Joined event");
    Ok(Json(EventResponse { event }))
}

/// Removes the caller from the attendees
///
/// # Errors
///
/// - `400 Bad Request`: Caller is not attending
/// - `404 Not Found`: No such event
pub async fn leave_event(
    State(state): State<AppState>,
    auth: AuthContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EventResponse>> {
    let id = event_id(path)?;
    let event = state.store.leave_event(id, auth.user_id).await?;

    tracing::debug!(event_id = %id, user_id = %auth.user_id, "Left event");
    Ok(Json(EventResponse { event }))
}
