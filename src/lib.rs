//! # Subscription Registry
//!
//! The in-process half of an event bus: a registry mapping event names to
//! the handler types subscribed to them. Transport, serialization and
//! handler invocation live elsewhere.
//!
//! ## Core Concepts
//!
//! - **Event names**: canonical strings derived from payload types
//! - **Typed subscriptions**: handlers bound to a known payload type
//! - **Dynamic subscriptions**: handlers keyed by event name only
//! - **Removal observers**: told when an event name loses its last handler
//!
//! ## Example
//!
//! ```ignore
//! use subscription_registry::{IntegrationEvent, IntegrationEventHandler, SubscriptionManager};
//!
//! struct OrderCreated;
//! impl IntegrationEvent for OrderCreated {}
//!
//! struct SendReceipt;
//! impl IntegrationEventHandler<OrderCreated> for SendReceipt {}
//!
//! let manager = SubscriptionManager::new();
//! manager.on_event_removed(|name| println!("unsubscribe upstream topic {name}"));
//!
//! manager.add_subscription::<OrderCreated, SendReceipt>()?;
//! assert!(manager.has_subscriptions_for_event("OrderCreated"));
//! ```

pub mod error;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{Result, SubscriptionError};
pub use subscriptions::{
    EventSummary, HandlerSummary, LookupPolicy, ManagerConfig, ObserverId, RemovalFeed,
    SubscriptionManager,
};
pub use types::*;
