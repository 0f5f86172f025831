//! Subscription manager mapping event names to handler registrations.

use crate::error::{Result, SubscriptionError};
use crate::types::{
    DynamicIntegrationEventHandler, IntegrationEvent, IntegrationEventHandler,
    SubscriptionRecord, TypeTag,
};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::{ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::types::{
    EventSummary, HandlerSummary, LookupPolicy, ManagerConfig, ObserverId, RemovalFeed,
};

/// Callback invoked with the name of a removed event.
type RemovalCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// A registered removal observer.
#[derive(Clone)]
enum Observer {
    Callback(RemovalCallback),
    Feed(Sender<String>),
}

impl Observer {
    /// Deliver a removal. Returns false if the observer is gone (feed dropped).
    fn notify(&self, event_name: &str) -> bool {
        match self {
            Observer::Callback(callback) => {
                callback(event_name);
                true
            }
            Observer::Feed(sender) => sender.send(event_name.to_string()).is_ok(),
        }
    }
}

/// Outcome of removing a record from the registry.
#[derive(Debug, PartialEq, Eq)]
enum Removal {
    NotFound,
    Removed,
    /// The record was the last one; the event name is gone.
    EventRemoved,
}

/// Registry state guarded by the manager's lock.
#[derive(Default)]
struct Registry {
    /// Records per event name.
    handlers: HashMap<String, Vec<SubscriptionRecord>>,
    /// Event names in first-subscription order.
    order: Vec<String>,
    /// Payload type backing each event name with typed subscriptions.
    event_types: HashMap<String, TypeTag>,
}

impl Registry {
    /// Append a record, rejecting a handler already present under `event_name`.
    fn insert(&mut self, event_name: &str, record: SubscriptionRecord) -> Result<()> {
        if let Some(records) = self.handlers.get(event_name) {
            if records.iter().any(|r| r.handler == record.handler) {
                return Err(SubscriptionError::DuplicateHandler {
                    event_name: event_name.to_string(),
                    handler: record.handler.name().to_string(),
                });
            }
        }

        match self.handlers.get_mut(event_name) {
            Some(records) => records.push(record),
            None => {
                self.handlers.insert(event_name.to_string(), vec![record]);
                self.order.push(event_name.to_string());
            }
        }

        Ok(())
    }

    /// Remove `handler` from `event_name`, whichever kind it was registered as.
    fn remove(&mut self, event_name: &str, handler: TypeTag) -> Removal {
        let Some(records) = self.handlers.get_mut(event_name) else {
            return Removal::NotFound;
        };

        let Some(pos) = records.iter().position(|r| r.handler == handler) else {
            return Removal::NotFound;
        };

        records.remove(pos);

        if !records.iter().any(|r| !r.is_dynamic) {
            self.event_types.remove(event_name);
        }

        if !records.is_empty() {
            return Removal::Removed;
        }

        self.handlers.remove(event_name);
        self.order.retain(|name| name != event_name);
        Removal::EventRemoved
    }
}

/// In-memory registry of event bus subscriptions.
///
/// Maps event names to the ordered list of handlers subscribed to them and
/// remembers which payload type backs each typed event name. When the last
/// handler for an event name is removed, the name is dropped and every
/// removal observer is told about it.
///
/// All methods take `&self`; state sits behind a single lock so each call is
/// applied atomically. Mutations are serialized with their removal
/// notifications, so observers never see a name that was re-added by another
/// thread. Observers run after the state lock is released and may call back
/// into the manager, including mutating it from the notifying thread.
pub struct SubscriptionManager {
    /// Subscription state.
    registry: RwLock<Registry>,
    /// Held by every mutation until its notifications are delivered.
    mutation: ReentrantMutex<()>,
    /// Removal observers in registration order.
    observers: RwLock<Vec<(ObserverId, Observer)>>,
    /// Counter for generating observer IDs.
    next_observer_id: AtomicU64,
    config: ManagerConfig,
}

impl SubscriptionManager {
    /// Create a new subscription manager with the default config.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create a new subscription manager with a custom config.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            mutation: ReentrantMutex::new(()),
            observers: RwLock::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // --- Queries ---

    /// True if no event name has any subscription.
    pub fn is_empty(&self) -> bool {
        self.registry.read().handlers.is_empty()
    }

    /// Number of event names with at least one subscription.
    pub fn event_count(&self) -> usize {
        self.registry.read().handlers.len()
    }

    /// Event names with subscriptions, in first-subscription order.
    pub fn event_names(&self) -> Vec<String> {
        self.registry.read().order.clone()
    }

    /// Canonical event name for a payload type.
    pub fn event_key<E: IntegrationEvent>(&self) -> &'static str {
        E::event_name()
    }

    pub fn has_subscriptions<E: IntegrationEvent>(&self) -> bool {
        self.has_subscriptions_for_event(E::event_name())
    }

    pub fn has_subscriptions_for_event(&self, event_name: &str) -> bool {
        self.registry.read().handlers.contains_key(event_name)
    }

    /// Payload type registered for `event_name` through a typed subscription.
    ///
    /// Returns `None` for unknown names and for names with dynamic
    /// subscriptions only.
    pub fn event_type_by_name(&self, event_name: &str) -> Option<TypeTag> {
        self.registry.read().event_types.get(event_name).copied()
    }

    /// Handlers subscribed to `event_name`, in registration order.
    ///
    /// Under `LookupPolicy::Strict` an event name without subscriptions is an
    /// error; check `has_subscriptions_for_event` first. Under
    /// `LookupPolicy::Lenient` it yields an empty list.
    pub fn handlers_for_event(&self, event_name: &str) -> Result<Vec<SubscriptionRecord>> {
        match self.registry.read().handlers.get(event_name) {
            Some(records) => Ok(records.clone()),
            None => match self.config.lookup_policy {
                LookupPolicy::Strict => Err(SubscriptionError::UnknownEvent(event_name.to_string())),
                LookupPolicy::Lenient => Ok(Vec::new()),
            },
        }
    }

    pub fn handlers_for<E: IntegrationEvent>(&self) -> Result<Vec<SubscriptionRecord>> {
        self.handlers_for_event(E::event_name())
    }

    /// Serializable view of every event name and its handlers.
    pub fn snapshot(&self) -> Vec<EventSummary> {
        let registry = self.registry.read();
        registry
            .order
            .iter()
            .filter_map(|name| {
                let records = registry.handlers.get(name)?;
                Some(EventSummary {
                    event_name: name.clone(),
                    payload_type: registry
                        .event_types
                        .get(name)
                        .map(|tag| tag.name().to_string()),
                    handlers: records
                        .iter()
                        .map(|r| HandlerSummary {
                            handler: r.handler_name().to_string(),
                            dynamic: r.is_dynamic,
                        })
                        .collect(),
                })
            })
            .collect()
    }

    // --- Mutation ---

    /// Subscribe handler `H` to payload type `E`.
    ///
    /// Fails if `H` is already subscribed under `E`'s event name, or if a
    /// different payload type already owns that name.
    pub fn add_subscription<E, H>(&self) -> Result<()>
    where
        E: IntegrationEvent,
        H: IntegrationEventHandler<E>,
    {
        let event_name = E::event_name();
        let event_type = TypeTag::event::<E>();
        let handler = TypeTag::of::<H>();
        let _mutation = self.mutation.lock();

        {
            let mut registry = self.registry.write();

            if let Some(existing) = registry.event_types.get(event_name) {
                if *existing != event_type {
                    warn!(
                        event = %event_name,
                        existing = %existing.type_path(),
                        incoming = %event_type.type_path(),
                        "Event name already bound to another payload type"
                    );
                    return Err(SubscriptionError::EventNameConflict {
                        event_name: event_name.to_string(),
                        existing: existing.type_path().to_string(),
                        incoming: event_type.type_path().to_string(),
                    });
                }
            }

            if let Err(e) = registry.insert(event_name, SubscriptionRecord::typed(handler)) {
                warn!(event = %event_name, handler = %handler, "Duplicate handler rejected");
                return Err(e);
            }
            registry
                .event_types
                .insert(event_name.to_string(), event_type);
        }

        debug!(event = %event_name, handler = %handler, "Added subscription");
        Ok(())
    }

    /// Subscribe dynamic handler `H` to `event_name`.
    pub fn add_dynamic_subscription<H>(&self, event_name: &str) -> Result<()>
    where
        H: DynamicIntegrationEventHandler,
    {
        let handler = TypeTag::of::<H>();
        let _mutation = self.mutation.lock();

        if let Err(e) = self
            .registry
            .write()
            .insert(event_name, SubscriptionRecord::dynamic(handler))
        {
            warn!(event = %event_name, handler = %handler, "Duplicate handler rejected");
            return Err(e);
        }

        debug!(event = %event_name, handler = %handler, "Added dynamic subscription");
        Ok(())
    }

    /// Unsubscribe handler `H` from `E`'s event name. No-op if not subscribed.
    pub fn remove_subscription<E, H>(&self)
    where
        E: IntegrationEvent,
        H: IntegrationEventHandler<E>,
    {
        self.remove(E::event_name(), TypeTag::of::<H>());
    }

    /// Unsubscribe dynamic handler `H` from `event_name`. No-op if not subscribed.
    pub fn remove_dynamic_subscription<H>(&self, event_name: &str)
    where
        H: DynamicIntegrationEventHandler,
    {
        self.remove(event_name, TypeTag::of::<H>());
    }

    /// Drop every subscription and payload type. Observers are not notified.
    pub fn clear(&self) {
        let _mutation = self.mutation.lock();
        let mut registry = self.registry.write();
        let events = registry.handlers.len();
        registry.handlers.clear();
        registry.order.clear();
        registry.event_types.clear();
        debug!(events, "Cleared subscriptions");
    }

    fn remove(&self, event_name: &str, handler: TypeTag) {
        let _mutation = self.mutation.lock();
        let removal = self.registry.write().remove(event_name, handler);

        match removal {
            Removal::NotFound => {
                trace!(event = %event_name, handler = %handler, "No subscription to remove");
            }
            Removal::Removed => {
                debug!(event = %event_name, handler = %handler, "Removed subscription");
            }
            Removal::EventRemoved => {
                debug!(event = %event_name, handler = %handler, "Removed last subscription for event");
                self.notify_removed(event_name);
            }
        }
    }

    // --- Removal observers ---

    /// Register a callback run once each time an event name loses its last handler.
    ///
    /// Callbacks run synchronously, in registration order, after the registry
    /// change is complete. Other threads' mutations wait until every callback
    /// has returned; the notifying thread may mutate the manager from inside one.
    pub fn on_event_removed<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.add_observer(Observer::Callback(Arc::new(callback)))
    }

    /// Register a channel that receives each removed event name.
    ///
    /// Names are sent in removal order. The feed is unregistered on the first
    /// removal after its receiver is dropped.
    pub fn removal_feed(&self) -> RemovalFeed {
        let (sender, receiver) = unbounded();
        let id = self.add_observer(Observer::Feed(sender));
        RemovalFeed { id, receiver }
    }

    /// Unregister an observer. Returns false if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    fn add_observer(&self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::SeqCst));
        self.observers.write().push((id, observer));
        id
    }

    fn notify_removed(&self, event_name: &str) {
        // Snapshot so observers can re-enter the manager.
        let observers: Vec<(ObserverId, Observer)> = self.observers.read().clone();

        let mut disconnected = Vec::new();
        for (id, observer) in &observers {
            if !observer.notify(event_name) {
                disconnected.push(*id);
            }
        }

        if !disconnected.is_empty() {
            self.observers
                .write()
                .retain(|(id, _)| !disconnected.contains(id));
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
