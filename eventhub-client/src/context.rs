/// Client-held application state
///
/// The context owns the signed-in user and the last known event list.
/// Mutations go to the server first; only a successful response touches the
/// held list, so a failed call leaves the state exactly as it was.

use eventhub_shared::models::{event::Event, user::UserSummary};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::{ClientResult, EventApi};

/// Shared event and user state over an [`EventApi`]
pub struct EventContext {
    api: Arc<dyn EventApi>,
    user: RwLock<Option<UserSummary>>,
    events: RwLock<Vec<Event>>,
}

impl EventContext {
    pub fn new(api: Arc<dyn EventApi>) -> Self {
        Self {
            api,
            user: RwLock::new(None),
            events: RwLock::new(Vec::new()),
        }
    }

    /// Sets or clears the signed-in user
    pub async fn set_user(&self, user: Option<UserSummary>) {
        *self.user.write().await = user;
    }

    pub async fn current_user(&self) -> Option<UserSummary> {
        self.user.read().await.clone()
    }

    /// Snapshot of the held event list
    pub async fn events(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    pub async fn event(&self, id: Uuid) -> Option<Event> {
        self.events
            .read()
            .await
            .iter()
            .find(|event| event.id == id)
            .cloned()
    }

    /// Reloads the event list from the server
    pub async fn refresh(&self) -> ClientResult<()> {
        let events = self.api.list_events().await?;
        tracing::debug!(count = events.len(), "Event list refreshed");
        *self.events.write().await = events;
        Ok(())
    }

    /// Fetches one event and stores it in the list
    pub async fn load_event(&self, id: Uuid) -> ClientResult<Event> {
        let event = self.api.get_event(id).await?;
        self.replace(event.clone()).await;
        Ok(event)
    }

    pub async fn join_event(&self, id: Uuid) -> ClientResult<Event> {
        let event = self.api.join_event(id).await?;
        self.replace(event.clone()).await;
        Ok(event)
    }

    pub async fn leave_event(&self, id: Uuid) -> ClientResult<Event> {
        let event = self.api.leave_event(id).await?;
        self.replace(event.clone()).await;
        Ok(event)
    }

    pub async fn delete_event(&self, id: Uuid) -> ClientResult<()> {
        self.api.delete_event(id).await?;
        self.events.write().await.retain(|event| event.id != id);
        Ok(())
    }

    async fn replace(&self, event: Event) {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|held| held.id == event.id) {
            Some(held) => *held = event,
            None => events.push(event),
        }
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext").finish_non_exhaustive()
    }
}
