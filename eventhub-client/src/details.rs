/// Event details component
///
/// Headless view model for one event. [`EventDetails::view`] derives the
/// viewer's role from the context and lists the controls to render;
/// [`EventDetails::join`], [`EventDetails::leave`] and
/// [`EventDetails::delete`] run the matching context operation.
///
/// ```text
/// viewer          controls
/// ─────────────   ─────────────────────────────────────────
/// organizer       Edit Event, Delete Event / Deleting...
/// attendee        Leave Event / Leaving...
/// signed in       Join Event / Joining...  or  Event Full (disabled)
/// signed out      Sign in to join (disabled)
/// ```
///
/// Each action has its own busy flag. While it is set the control is
/// disabled and a second press is ignored; different actions may overlap.
/// Action failures are logged and swallowed: the flag is reset and the view
/// simply re-derives from the unchanged context.

use chrono::{DateTime, Utc};
use eventhub_shared::models::event::Event;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::context::EventContext;

/// What a control does when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Navigate to the edit form (handled by the host)
    Edit,
    Delete,
    Join,
    Leave,
    /// Navigate to sign in (handled by the host)
    SignIn,
}

/// A button to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub action: Action,
    pub label: &'static str,
    pub disabled: bool,
}

/// Everything needed to render the details page
#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    pub event: Event,
    pub is_organizer: bool,
    pub is_attending: bool,
    pub is_full: bool,
    pub date_label: String,
    pub attendance_label: String,
    pub controls: Vec<Control>,
}

impl EventView {
    pub fn control(&self, action: Action) -> Option<&Control> {
        self.controls.iter().find(|control| control.action == action)
    }
}

/// Result of pressing an action control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The event is gone; the host should navigate away
    Deleted,
    /// The call failed; it was logged and state is unchanged
    Failed,
    /// The same action was already in flight
    Ignored,
}

#[derive(Debug, Default)]
struct BusyFlags {
    joining: AtomicBool,
    leaving: AtomicBool,
    deleting: AtomicBool,
}

/// Clears a busy flag when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Details component for a single event
#[derive(Debug, Clone)]
pub struct EventDetails {
    context: Arc<EventContext>,
    event_id: Uuid,
    busy: Arc<BusyFlags>,
}

impl EventDetails {
    pub fn new(context: Arc<EventContext>, event_id: Uuid) -> Self {
        Self {
            context,
            event_id,
            busy: Arc::new(BusyFlags::default()),
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn is_joining(&self) -> bool {
        self.busy.joining.load(Ordering::Acquire)
    }

    pub fn is_leaving(&self) -> bool {
        self.busy.leaving.load(Ordering::Acquire)
    }

    pub fn is_deleting(&self) -> bool {
        self.busy.deleting.load(Ordering::Acquire)
    }

    /// Derives the view; `None` when the event isn't in the context
    pub async fn view(&self) -> Option<EventView> {
        let event = self.context.event(self.event_id).await?;
        let viewer = self.context.current_user().await.map(|user| user.id);

        let is_organizer = viewer.map_or(false, |id| event.is_organizer(id));
        let is_attending = viewer.map_or(false, |id| event.is_attending(id));
        let is_full = event.is_full();

        let controls = match viewer {
            None => vec![Control {
                action: Action::SignIn,
                label: "Sign in to join",
                disabled: true,
            }],
            Some(_) if is_organizer => vec![
                Control {
                    action: Action::Edit,
                    label: "Edit Event",
                    disabled: false,
                },
                Control {
                    action: Action::Delete,
                    label: if self.is_deleting() {
                        "Deleting..."
                    } else {
                        "Delete Event"
                    },
                    disabled: self.is_deleting(),
                },
            ],
            Some(_) if is_attending => vec![Control {
                action: Action::Leave,
                label: if self.is_leaving() {
                    "Leaving..."
                } else {
                    "Leave Event"
                },
                disabled: self.is_leaving(),
            }],
            Some(_) if is_full => vec![Control {
                action: Action::Join,
                label: "Event Full",
                disabled: true,
            }],
            Some(_) => vec![Control {
                action: Action::Join,
                label: if self.is_joining() {
                    "Joining..."
                } else {
                    "Join Event"
                },
                disabled: self.is_joining(),
            }],
        };

        Some(EventView {
            date_label: date_label(event.date),
            attendance_label: attendance_label(&event),
            is_organizer,
            is_attending,
            is_full,
            controls,
            event,
        })
    }

    pub async fn join(&self) -> ActionOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy.joining) else {
            return ActionOutcome::Ignored;
        };

        match self.context.join_event(self.event_id).await {
            Ok(_) => ActionOutcome::Completed,
            Err(err) => {
                tracing::error!(event_id = %self.event_id, error = %err, "Error joining event");
                ActionOutcome::Failed
            }
        }
    }

    pub async fn leave(&self) -> ActionOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy.leaving) else {
            return ActionOutcome::Ignored;
        };

        match self.context.leave_event(self.event_id).await {
            Ok(_) => ActionOutcome::Completed,
            Err(err) => {
                tracing::error!(event_id = %self.event_id, error = %err, "Error leaving event");
                ActionOutcome::Failed
            }
        }
    }

    pub async fn delete(&self) -> ActionOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy.deleting) else {
            return ActionOutcome::Ignored;
        };

        match self.context.delete_event(self.event_id).await {
            Ok(()) => ActionOutcome::Deleted,
            Err(err) => {
                tracing::error!(event_id = %self.event_id, error = %err, "Error deleting event");
                ActionOutcome::Failed
            }
        }
    }
}

fn date_label(date: DateTime<Utc>) -> String {
    date.format("%A, %B %-d, %Y at %H:%M UTC").to_string()
}

fn attendance_label(event: &Event) -> String {
    match event.max_attendees {
        Some(max) => format!("{} / {} attending", event.attendees.len(), max),
        None => format!("{} attending", event.attendees.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{sample_event, MockApi};
    use chrono::TimeZone;
    use eventhub_shared::models::user::UserSummary;

    fn summary(id: Uuid) -> UserSummary {
        UserSummary {
            id,
            name: "Viewer".to_string(),
            email: "viewer@x.com".to_string(),
            is_guest: false,
        }
    }

    async fn details_for(
        viewer: Option<Uuid>,
        event: Event,
    ) -> (EventDetails, Arc<MockApi>, Arc<EventContext>) {
        let api = Arc::new(MockApi::new(viewer.unwrap_or_else(Uuid::new_v4), vec![event.clone()]));
        let context = Arc::new(EventContext::new(api.clone()));
        context.set_user(viewer.map(summary)).await;
        context.refresh().await.unwrap();
        (EventDetails::new(context.clone(), event.id), api, context)
    }

    #[tokio::test]
    async fn test_full_event_shows_event_full() {
        let event = sample_event(Uuid::new_v4(), vec![Uuid::new_v4(), Uuid::new_v4()], Some(2));
        let (details, _, _) = details_for(Some(Uuid::new_v4()), event).await;

        let view = details.view().await.unwrap();
        assert!(view.is_full);
        assert!(!view.is_organizer);
        assert!(!view.is_attending);
        assert_eq!(
            view.controls,
            vec![Control {
                action: Action::Join,
                label: "Event Full",
                disabled: true,
            }]
        );
        assert_eq!(view.attendance_label, "2 / 2 attending");
    }

    #[tokio::test]
    async fn test_organizer_controls() {
        let organizer = Uuid::new_v4();
        let event = sample_event(organizer, vec![], Some(2));
        let (details, _, _) = details_for(Some(organizer), event).await;

        let view = details.view().await.unwrap();
        assert!(view.is_organizer);
        let labels: Vec<_> = view.controls.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["Edit Event", "Delete Event"]);
        assert!(view.control(Action::Join).is_none());
    }

    #[tokio::test]
    async fn test_attendee_sees_leave_even_when_full() {
        let me = Uuid::new_v4();
        let event = sample_event(Uuid::new_v4(), vec![me, Uuid::new_v4()], Some(2));
        let (details, _, _) = details_for(Some(me), event).await;

        let view = details.view().await.unwrap();
        assert!(view.is_attending);
        assert!(view.is_full);
        let leave = view.control(Action::Leave).unwrap();
        assert_eq!(leave.label, "Leave Event");
        assert!(!leave.disabled);
    }

    #[tokio::test]
    async fn test_signed_out_viewer() {
        let event = sample_event(Uuid::new_v4(), vec![], None);
        let (details, _, _) = details_for(None, event).await;

        let view = details.view().await.unwrap();
        assert_eq!(view.controls.len(), 1);
        assert_eq!(view.controls[0].action, Action::SignIn);
        assert!(view.controls[0].disabled);
        assert_eq!(view.attendance_label, "0 attending");
    }

    #[tokio::test]
    async fn test_join_then_leave() {
        let me = Uuid::new_v4();
        let event = sample_event(Uuid::new_v4(), vec![], Some(5));
        let (details, _, _) = details_for(Some(me), event).await;

        assert_eq!(
            details.view().await.unwrap().control(Action::Join).unwrap().label,
            "Join Event"
        );

        assert_eq!(details.join().await, ActionOutcome::Completed);
        let view = details.view().await.unwrap();
        assert!(view.is_attending);
        assert_eq!(view.control(Action::Leave).unwrap().label, "Leave Event");
        assert!(!details.is_joining());

        assert_eq!(details.leave().await, ActionOutcome::Completed);
        assert!(!details.view().await.unwrap().is_attending);
    }

    #[tokio::test]
    async fn test_failed_action_is_swallowed_and_resets_busy_flag() {
        let me = Uuid::new_v4();
        let event = sample_event(Uuid::new_v4(), vec![], None);
        let (details, api, _) = details_for(Some(me), event).await;

        api.failing(true);
        assert_eq!(details.join().await, ActionOutcome::Failed);
        assert!(!details.is_joining());

        let view = details.view().await.unwrap();
        assert!(!view.is_attending);
        let join = view.control(Action::Join).unwrap();
        assert_eq!(join.label, "Join Event");
        assert!(!join.disabled);
    }

    #[tokio::test]
    async fn test_busy_action_is_ignored_and_labelled() {
        let me = Uuid::new_v4();
        let event = sample_event(Uuid::new_v4(), vec![], None);
        let (details, _, _) = details_for(Some(me), event).await;

        let _busy = BusyGuard::acquire(&details.busy.joining).unwrap();
        assert_eq!(details.join().await, ActionOutcome::Ignored);

        let join = details.view().await.unwrap().control(Action::Join).cloned().unwrap();
        assert_eq!(join.label, "Joining...");
        assert!(join.disabled);
    }

    #[tokio::test]
    async fn test_delete_reports_deleted() {
        let organizer = Uuid::new_v4();
        let event = sample_event(organizer, vec![], None);
        let (details, _, context) = details_for(Some(organizer), event).await;

        assert_eq!(details.delete().await, ActionOutcome::Deleted);
        assert!(context.events().await.is_empty());
        assert!(details.view().await.is_none());
    }

    #[test]
    fn test_date_label() {
        let date = Utc.with_ymd_and_hms(2026, 11, 5, 18, 0, 0).unwrap();
        assert_eq!(date_label(date), "Thursday, November 5, 2026 at 18:00 UTC");
    }
}
