//! Subscription bookkeeping for an event bus.
//!
//! The manager tracks which handler types are subscribed to which event
//! names:
//! - Typed subscriptions, bound to a payload type known at registration
//! - Dynamic subscriptions, keyed by event name only
//!
//! When an event name loses its last handler, removal observers are
//! notified so the transport can drop the upstream topic.
//!
//! # Example
//!
//! ```ignore
//! let manager = SubscriptionManager::new();
//! let feed = manager.removal_feed();
//!
//! manager.add_subscription::<OrderCreated, SendReceipt>()?;
//! manager.add_dynamic_subscription::<AuditLog>("OrderCreated")?;
//!
//! for record in manager.handlers_for_event("OrderCreated")? {
//!     println!("{} (dynamic: {})", record.handler_name(), record.is_dynamic);
//! }
//!
//! manager.remove_subscription::<OrderCreated, SendReceipt>();
//! manager.remove_dynamic_subscription::<AuditLog>("OrderCreated");
//! assert_eq!(feed.try_recv().unwrap(), "OrderCreated");
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    EventSummary, HandlerSummary, LookupPolicy, ManagerConfig, ObserverId, RemovalFeed,
};
