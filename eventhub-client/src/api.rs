/// HTTP access to the EventHub API
///
/// [`EventApi`] is the seam the event context talks through; [`HttpClient`]
/// implements it with `reqwest` and adds the authentication calls. A
/// successful auth call stores the returned session token, and every later
/// request sends it as `Authorization: Bearer <token>`.
///
/// # Example
///
/// ```no_run
/// use eventhub_client::api::{EventApi, HttpClient};
///
/// # async fn example() -> Result<(), eventhub_client::ClientError> {
/// let client = HttpClient::new("http://localhost:8080")?;
/// let session = client.guest_login("guest@example.com").await?;
/// println!("Signed in as {}", session.user.name);
///
/// for event in client.list_events().await? {
///     println!("{} at {}", event.title, event.location);
/// }
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use eventhub_shared::models::{event::Event, user::UserSummary};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

/// Client error types
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or undecodable body
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(err) => err.status(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Authenticated user with the token that proves it
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub user: UserSummary,
    pub token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct EventBody {
    event: Event,
}

#[derive(Deserialize)]
struct EventListBody {
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct ProfileBody {
    user: UserSummary,
}

/// Event operations used by the event context
#[async_trait]
pub trait EventApi: Send + Sync {
    async fn list_events(&self) -> ClientResult<Vec<Event>>;

    async fn get_event(&self, id: Uuid) -> ClientResult<Event>;

    /// Joins as the signed-in user; returns the refreshed event
    async fn join_event(&self, id: Uuid) -> ClientResult<Event>;

    /// Leaves as the signed-in user; returns the refreshed event
    async fn leave_event(&self, id: Uuid) -> ClientResult<Event>;

    async fn delete_event(&self, id: Uuid) -> ClientResult<()>;
}

/// `reqwest` implementation of [`EventApi`] plus the auth endpoints
#[derive(Debug)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl HttpClient {
    /// Creates a client for the API at `base_url` (no trailing `/api`)
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            token: RwLock::new(None),
        })
    }

    /// Current session token, if signed in
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|token| token.clone())
    }

    /// Replaces the session token (e.g. one restored from storage)
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.token.write() {
            *current = token;
        }
    }

    pub fn sign_out(&self) {
        self.set_token(None);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.authorized(request).send().await?;
        decode(response).await
    }

    async fn authenticate(&self, path: &str, body: serde_json::Value) -> ClientResult<Session> {
        let session: Session = self.send(self.client.post(self.url(path)).json(&body)).await?;
        self.set_token(Some(session.token.clone()));
        tracing::debug!(user_id = %session.user.id, is_guest = session.user.is_guest, "Signed in");
        Ok(session)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<Session> {
        self.authenticate(
            "/auth/register",
            json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        self.authenticate(
            "/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn guest_login(&self, email: &str) -> ClientResult<Session> {
        self.authenticate("/auth/guest-login", json!({ "email": email }))
            .await
    }

    /// Turns the signed-in guest into a registered account
    pub async fn convert_guest(&self, name: &str, password: &str) -> ClientResult<Session> {
        self.authenticate(
            "/auth/convert-guest",
            json!({ "name": name, "password": password }),
        )
        .await
    }

    pub async fn profile(&self) -> ClientResult<UserSummary> {
        let body: ProfileBody = self.send(self.client.get(self.url("/auth/profile"))).await?;
        Ok(body.user)
    }
}

/// Decodes a success body or turns the server's `{ error }` into
/// [`ClientError::Api`]
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Err(ClientError::Api { status, message })
}

#[async_trait]
impl EventApi for HttpClient {
    async fn list_events(&self) -> ClientResult<Vec<Event>> {
        let body: EventListBody = self.send(self.client.get(self.url("/events"))).await?;
        Ok(body.events)
    }

    async fn get_event(&self, id: Uuid) -> ClientResult<Event> {
        let body: EventBody = self
            .send(self.client.get(self.url(&format!("/events/{}", id))))
            .await?;
        Ok(body.event)
    }

    async fn join_event(&self, id: Uuid) -> ClientResult<Event> {
        let body: EventBody = self
            .send(self.client.post(self.url(&format!("/events/{}/join", id))))
            .await?;
        Ok(body.event)
    }

    async fn leave_event(&self, id: Uuid) -> ClientResult<Event> {
        let body: EventBody = self
            .send(self.client.post(self.url(&format!("/events/{}/leave", id))))
            .await?;
        Ok(body.event)
    }

    async fn delete_event(&self, id: Uuid) -> ClientResult<()> {
        let _: serde_json::Value = self
            .send(self.client.delete(self.url(&format!("/events/{}", id))))
            .await?;
        Ok(())
    }
}
