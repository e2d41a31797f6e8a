//! Topic-based event bus implementation.

use serde::Serialize;
use tokio::sync::broadcast;

use super::types::{RegistrationEvent, SessionEvent, SubmissionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum Topic {
    /// State machine transitions and submission milestones
    Submission,
    /// Prover session lifecycle
    Session,
    /// Verifier contract registration
    Registration,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    Submission(SubmissionEvent),
    Session(SessionEvent),
    Registration(RegistrationEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Submission(_) => Topic::Submission,
            Event::Session(_) => Topic::Session,
            Event::Registration(_) => Topic::Registration,
        }
    }
}

impl From<SubmissionEvent> for Event {
    fn from(event: SubmissionEvent) -> Self {
        Event::Submission(event)
    }
}

impl From<SessionEvent> for Event {
    fn from(event: SessionEvent) -> Self {
        Event::Session(event)
    }
}

impl From<RegistrationEvent> for Event {
    fn from(event: RegistrationEvent) -> Self {
        Event::Registration(event)
    }
}

/// Topic-based event bus
///
/// Channels for every topic exist from construction, so subscribing never
/// fails.
#[derive(Clone)]
pub struct EventBus {
    submission: broadcast::Sender<Event>,
    session: broadcast::Sender<Event>,
    registration: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            submission: broadcast::channel(capacity).0,
            session: broadcast::channel(capacity).0,
            registration: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Submission => &self.submission,
            Topic::Session => &self.session,
            Topic::Registration => &self.registration,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
