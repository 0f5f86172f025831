//! Property tests: random operation sequences checked against a simple model.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use subscription_registry::{
    DynamicIntegrationEventHandler, IntegrationEvent, IntegrationEventHandler, SubscriptionError,
    SubscriptionManager, TypeTag,
};

struct Alpha;
impl IntegrationEvent for Alpha {}

struct Beta;
impl IntegrationEvent for Beta {}

struct H0;
struct H1;
struct H2;

macro_rules! handles_everything {
    ($($handler:ty),*) => {
        $(
            impl IntegrationEventHandler<Alpha> for $handler {}
            impl IntegrationEventHandler<Beta> for $handler {}
            impl DynamicIntegrationEventHandler for $handler {}
        )*
    };
}

handles_everything!(H0, H1, H2);

/// Event names used by the generated operations. The first two back typed events.
const NAMES: [&str; 3] = ["Alpha", "Beta", "Gamma"];

#[derive(Clone, Debug)]
enum Op {
    AddTyped { event: usize, handler: usize },
    AddDynamic { name: usize, handler: usize },
    RemoveTyped { event: usize, handler: usize },
    RemoveDynamic { name: usize, handler: usize },
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..2usize, 0..3usize).prop_map(|(event, handler)| Op::AddTyped { event, handler }),
        4 => (0..3usize, 0..3usize).prop_map(|(name, handler)| Op::AddDynamic { name, handler }),
        4 => (0..2usize, 0..3usize).prop_map(|(event, handler)| Op::RemoveTyped { event, handler }),
        4 => (0..3usize, 0..3usize).prop_map(|(name, handler)| Op::RemoveDynamic { name, handler }),
        1 => Just(Op::Clear),
    ]
}

fn handler_tag(handler: usize) -> TypeTag {
    match handler {
        0 => TypeTag::of::<H0>(),
        1 => TypeTag::of::<H1>(),
        _ => TypeTag::of::<H2>(),
    }
}

fn add_typed<E>(manager: &SubscriptionManager, handler: usize) -> Result<(), SubscriptionError>
where
    E: IntegrationEvent,
    H0: IntegrationEventHandler<E>,
    H1: IntegrationEventHandler<E>,
    H2: IntegrationEventHandler<E>,
{
    match handler {
        0 => manager.add_subscription::<E, H0>(),
        1 => manager.add_subscription::<E, H1>(),
        _ => manager.add_subscription::<E, H2>(),
    }
}

fn remove_typed<E>(manager: &SubscriptionManager, handler: usize)
where
    E: IntegrationEvent,
    H0: IntegrationEventHandler<E>,
    H1: IntegrationEventHandler<E>,
    H2: IntegrationEventHandler<E>,
{
    match handler {
        0 => manager.remove_subscription::<E, H0>(),
        1 => manager.remove_subscription::<E, H1>(),
        _ => manager.remove_subscription::<E, H2>(),
    }
}

fn add_dynamic(manager: &SubscriptionManager, name: &str, handler: usize) -> Result<(), SubscriptionError> {
    match handler {
        0 => manager.add_dynamic_subscription::<H0>(name),
        1 => manager.add_dynamic_subscription::<H1>(name),
        _ => manager.add_dynamic_subscription::<H2>(name),
    }
}

fn remove_dynamic(manager: &SubscriptionManager, name: &str, handler: usize) {
    match handler {
        0 => manager.remove_dynamic_subscription::<H0>(name),
        1 => manager.remove_dynamic_subscription::<H1>(name),
        _ => manager.remove_dynamic_subscription::<H2>(name),
    }
}

/// Reference model: event name -> ordered (handler, is_dynamic) pairs.
#[derive(Default)]
struct Model {
    events: BTreeMap<&'static str, Vec<(usize, bool)>>,
}

impl Model {
    fn add(&mut self, name: &'static str, handler: usize, dynamic: bool) -> bool {
        let records = self.events.entry(name).or_default();
        if records.iter().any(|(h, _)| *h == handler) {
            return false;
        }
        records.push((handler, dynamic));
        true
    }

    /// Removes `handler` whatever its kind. Returns true if the event name was emptied.
    fn remove(&mut self, name: &'static str, handler: usize) -> bool {
        let Some(records) = self.events.get_mut(name) else {
            return false;
        };
        let before = records.len();
        records.retain(|(h, _)| *h != handler);
        if records.len() == before || !records.is_empty() {
            return false;
        }
        self.events.remove(name);
        true
    }

    fn has_typed(&self, name: &str) -> bool {
        self.events
            .get(name)
            .is_some_and(|records| records.iter().any(|(_, dynamic)| !dynamic))
    }
}

proptest! {
    #[test]
    fn prop_manager_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let manager = SubscriptionManager::new();
        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&removed);
        manager.on_event_removed(move |name| sink.lock().unwrap().push(name.to_string()));

        let mut model = Model::default();

        for op in ops {
            let mut expected_removal = None;

            match op {
                Op::AddTyped { event, handler } => {
                    let result = if event == 0 {
                        add_typed::<Alpha>(&manager, handler)
                    } else {
                        add_typed::<Beta>(&manager, handler)
                    };
                    let accepted = model.add(NAMES[event], handler, false);
                    prop_assert_eq!(result.is_ok(), accepted);
                    if !accepted {
                        let is_duplicate = matches!(result, Err(SubscriptionError::DuplicateHandler { .. }));
                        prop_assert!(is_duplicate);
                    }
                }
                Op::AddDynamic { name, handler } => {
                    let result = add_dynamic(&manager, NAMES[name], handler);
                    prop_assert_eq!(result.is_ok(), model.add(NAMES[name], handler, true));
                }
                Op::RemoveTyped { event, handler } => {
                    if event == 0 {
                        remove_typed::<Alpha>(&manager, handler);
                    } else {
                        remove_typed::<Beta>(&manager, handler);
                    }
                    if model.remove(NAMES[event], handler) {
                        expected_removal = Some(NAMES[event]);
                    }
                }
                Op::RemoveDynamic { name, handler } => {
                    remove_dynamic(&manager, NAMES[name], handler);
                    if model.remove(NAMES[name], handler) {
                        expected_removal = Some(NAMES[name]);
                    }
                }
                Op::Clear => {
                    manager.clear();
                    model.events.clear();
                    prop_assert!(manager.is_empty());
                }
            }

            // Exactly one notification per emptied event name, none otherwise
            let fired: Vec<String> = removed.lock().unwrap().drain(..).collect();
            let expected: Vec<String> = expected_removal.iter().map(|n| n.to_string()).collect();
            prop_assert_eq!(fired, expected);

            prop_assert_eq!(manager.is_empty(), model.events.is_empty());

            for name in NAMES {
                let records = model.events.get(name);
                prop_assert_eq!(manager.has_subscriptions_for_event(name), records.is_some());

                if let Some(records) = records {
                    let actual: Vec<(TypeTag, bool)> = manager
                        .handlers_for_event(name)
                        .unwrap()
                        .into_iter()
                        .map(|r| (r.handler, r.is_dynamic))
                        .collect();
                    let expected: Vec<(TypeTag, bool)> = records
                        .iter()
                        .map(|(h, dynamic)| (handler_tag(*h), *dynamic))
                        .collect();
                    prop_assert_eq!(actual, expected);
                }
            }

            prop_assert_eq!(
                manager.event_type_by_name("Alpha"),
                model.has_typed("Alpha").then(TypeTag::event::<Alpha>)
            );
            prop_assert_eq!(
                manager.event_type_by_name("Beta"),
                model.has_typed("Beta").then(TypeTag::event::<Beta>)
            );
            prop_assert_eq!(manager.event_type_by_name("Gamma"), None);
        }
    }
}
