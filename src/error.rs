//! Error types for the subscription registry.

use thiserror::Error;

/// Main error type for registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Handler {handler} already registered for '{event_name}'")]
    DuplicateHandler { event_name: String, handler: String },

    #[error("No subscriptions for event: {0}")]
    UnknownEvent(String),

    #[error("Event name '{event_name}' already bound to {existing}, cannot bind {incoming}")]
    EventNameConflict {
        event_name: String,
        existing: String,
        incoming: String,
    },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, SubscriptionError>;
