//! Topic-based event bus for submission progress.
//!
//! Events are published to topics and consumers subscribe only to the topics
//! they need. Delivery is best-effort: a slow subscriber lags rather than
//! blocking the orchestrator.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{RegistrationEvent, SessionEvent, SubmissionEvent};
