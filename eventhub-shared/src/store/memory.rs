/// In-memory store
///
/// Keeps users and events in hash maps behind a single `tokio::sync::RwLock`.
/// Every mutation takes the write lock for its whole read-check-write
/// sequence, which gives the same atomicity the Postgres store gets from
/// its row lock. Data lives only as long as the process.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, Store, StoreError, StoreResult, UserStore};
use crate::models::{
    event::{CreateEvent, Event, UpdateEvent},
    user::{CreateUser, UpdateUser, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// email → user id
    emails: HashMap<String, Uuid>,
    events: HashMap<Uuid, Event>,
}

/// Process-local store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.emails.contains_key(&data.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            is_guest: data.is_guest,
            created_at: now,
            updated_at: now,
        };

        tables.emails.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_guest) = data.is_guest {
            user.is_guest = is_guest;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self.tables.read().await.events.values().cloned().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(events)
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn create_event(&self, data: CreateEvent) -> StoreResult<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            category: data.category,
            date: data.date,
            location: data.location,
            image: data.image,
            organizer_id: data.organizer_id,
            attendees: Vec::new(),
            max_attendees: data.max_attendees,
            created_at: now,
            updated_at: now,
        };

        self.tables
            .write()
            .await
            .events
            .insert(event.id, event.clone());

        Ok(event)
    }

    async fn update_event(&self, id: Uuid, data: UpdateEvent) -> StoreResult<Option<Event>> {
        let mut tables = self.tables.write().await;

        let Some(event) = tables.events.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(max_attendees) = data.max_attendees {
            event.check_capacity(max_attendees)?;
        }
        data.apply_to(event);

        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.events.remove(&id).is_some())
    }

    async fn join_event(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Event> {
        let mut tables = self.tables.write().await;

        let event = tables
            .events
            .get_mut(&event_id)
            .ok_or(StoreError::EventNotFound)?;
        event.check_join(user_id)?;
        event.attendees.push(user_id);

        Ok(event.clone())
    }

    async fn leave_event(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Event> {
        let mut tables = self.tables.write().await;

        let event = tables
            .events
            .get_mut(&event_id)
            .ok_or(StoreError::EventNotFound)?;
        event.check_leave(user_id)?;
        event.attendees.retain(|id| *id != user_id);

        Ok(event.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{CapacityError, MembershipError};
    use chrono::Duration;

    fn new_user(email: &str, is_guest: bool) -> CreateUser {
        CreateUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_guest,
        }
    }

    fn new_event(organizer_id: Uuid, max_attendees: Option<i32>) -> CreateEvent {
        CreateEvent {
            title: "Board games".to_string(),
            description: "Bring snacks".to_string(),
            category: "Social".to_string(),
            date: Utc::now() + Duration::days(3),
            location: "Cafe".to_string(),
            image: None,
            organizer_id,
            max_attendees,
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let store = MemoryStore::new();

        store.create_user(new_user("ann@x.com", false)).await.unwrap();
        let second = store.create_user(new_user("ann@x.com", true)).await;

        assert!(matches!(second, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_find_user_by_email_is_exact() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ann@x.com", false)).await.unwrap();

        let found = store.find_user_by_email("ann@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_user_by_email("Ann@X.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("bob@x.com", true)).await.unwrap();

        let updated = store
            .update_user(
                user.id,
                UpdateUser {
                    name: Some("Bob".to_string()),
                    is_guest: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "Bob");
        assert!(!updated.is_guest);
        assert_eq!(updated.password_hash, "hash");

        let missing = store
            .update_user(Uuid::new_v4(), UpdateUser::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_events_sorted_by_date() {
        let store = MemoryStore::new();
        let organizer = Uuid::new_v4();

        let mut later = new_event(organizer, None);
        later.date = Utc::now() + Duration::days(10);
        let later = store.create_event(later).await.unwrap();
        let sooner = store.create_event(new_event(organizer, None)).await.unwrap();

        let ids: Vec<Uuid> = store
            .list_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }

    #[tokio::test]
    async fn test_join_respects_capacity() {
        let store = MemoryStore::new();
        let event = store
            .create_event(new_event(Uuid::new_v4(), Some(1)))
            .await
            .unwrap();

        let first = Uuid::new_v4();
        let joined = store.join_event(event.id, first).await.unwrap();
        assert_eq!(joined.attendees, vec![first]);

        let refused = store.join_event(event.id, Uuid::new_v4()).await;
        assert!(matches!(
            refused,
            Err(StoreError::Membership(MembershipError::Full))
        ));

        let stored = store.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.attendees.len(), 1);
    }

    #[tokio::test]
    async fn test_update_refuses_capacity_below_attendees() {
        let store = MemoryStore::new();
        let event = store
            .create_event(new_event(Uuid::new_v4(), Some(3)))
            .await
            .unwrap();
        store.join_event(event.id, Uuid::new_v4()).await.unwrap();
        store.join_event(event.id, Uuid::new_v4()).await.unwrap();

        let refused = store
            .update_event(
                event.id,
                UpdateEvent {
                    title: Some("Renamed".to_string()),
                    max_attendees: Some(Some(1)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            refused,
            Err(StoreError::Capacity(CapacityError::BelowAttendeeCount { current: 2 }))
        ));

        // Nothing from the refused update was written
        let stored = store.find_event(event.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Board games");
        assert_eq!(stored.max_attendees, Some(3));

        let updated = store
            .update_event(
                event.id,
                UpdateEvent {
                    max_attendees: Some(Some(2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.max_attendees, Some(2));
        assert!(updated.is_full());
    }

    #[tokio::test]
    async fn test_concurrent_joins_never_exceed_capacity() {
        let store = MemoryStore::new();
        let event = store
            .create_event(new_event(Uuid::new_v4(), Some(3)))
            .await
            .unwrap();
        let event_id = event.id;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.join_event(event_id, Uuid::new_v4()).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 3);
        let stored = store.find_event(event_id).await.unwrap().unwrap();
        assert_eq!(stored.attendees.len(), 3);
    }

    #[tokio::test]
    async fn test_leave_and_missing_event() {
        let store = MemoryStore::new();
        let event = store.create_event(new_event(Uuid::new_v4(), None)).await.unwrap();
        let user = Uuid::new_v4();

        assert!(matches!(
            store.leave_event(event.id, user).await,
            Err(StoreError::Membership(MembershipError::NotAttending))
        ));

        store.join_event(event.id, user).await.unwrap();
        let left = store.leave_event(event.id, user).await.unwrap();
        assert!(left.attendees.is_empty());

        assert!(matches!(
            store.join_event(Uuid::new_v4(), user).await,
            Err(StoreError::EventNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_event() {
        let store = MemoryStore::new();
        let event = store.create_event(new_event(Uuid::new_v4(), None)).await.unwrap();

        assert!(store.delete_event(event.id).await.unwrap());
        assert!(!store.delete_event(event.id).await.unwrap());
        assert!(store.find_event(event.id).await.unwrap().is_none());
    }
}
