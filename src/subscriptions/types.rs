//! Configuration and observer types for the subscription manager.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a subscription manager.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// What `handlers_for_event` does for an event name with no subscriptions.
    /// Default: `LookupPolicy::Strict`
    #[serde(default)]
    pub lookup_policy: LookupPolicy,
}

impl ManagerConfig {
    /// Config that answers unknown event lookups with an empty list.
    pub fn lenient() -> Self {
        Self {
            lookup_policy: LookupPolicy::Lenient,
        }
    }
}

/// Behavior of handler lookups for unregistered event names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Fail with `SubscriptionError::UnknownEvent`.
    #[default]
    Strict,
    /// Return an empty handler list.
    Lenient,
}

/// Identifier returned when registering a removal observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// Serializable view of one event name's registrations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_name: String,
    /// Payload type backing this name, if any typed subscription exists.
    pub payload_type: Option<String>,
    pub handlers: Vec<HandlerSummary>,
}

/// Serializable view of one subscription record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSummary {
    pub handler: String,
    pub dynamic: bool,
}

/// Channel-backed stream of removed event names.
pub struct RemovalFeed {
    pub id: ObserverId,
    /// Channel to receive removed event names.
    pub receiver: crossbeam_channel::Receiver<String>,
}

impl RemovalFeed {
    /// Receive the next removed event name (blocking).
    pub fn recv(&self) -> Result<String, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a removed event name (non-blocking).
    pub fn try_recv(&self) -> Result<String, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<String, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
