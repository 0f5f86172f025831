//! Core types for the subscription registry.

use std::any::{type_name, TypeId};
use std::fmt;

/// Identity token for an event payload type or a handler type.
///
/// `name` is the display name (the event name for payload tags), `path` the
/// full type path and `id` the `TypeId`. Equality covers all three; tags built
/// the same way for the same type are always equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    name: &'static str,
    path: &'static str,
    id: TypeId,
}

impl TypeTag {
    /// Tag for any type, named by its full type path.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: type_name::<T>(),
            path: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Tag for an event payload type, named by its canonical event name.
    pub fn event<E: IntegrationEvent>() -> Self {
        Self {
            name: E::event_name(),
            path: type_name::<E>(),
            id: TypeId::of::<E>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Full type path, regardless of how the tag is named.
    pub fn type_path(&self) -> &'static str {
        self.path
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Last path segment of `T`'s type name, with generic arguments kept as-is.
///
/// `my_app::events::OrderCreated` becomes `OrderCreated`, and
/// `my_app::Envelope<my_app::Order>` becomes `Envelope<my_app::Order>`.
/// Tuples, arrays and slices keep their full type name.
pub fn short_type_name<T: ?Sized + 'static>() -> &'static str {
    let full = type_name::<T>();
    let path_end = full.find(&['<', '(', '['][..]).unwrap_or(full.len());
    match full[..path_end].rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// An event payload that can be published on the bus.
pub trait IntegrationEvent: 'static {
    /// Canonical event name used as the registry key.
    fn event_name() -> &'static str {
        short_type_name::<Self>()
    }
}

/// A handler bound to a concrete payload type.
pub trait IntegrationEventHandler<E: IntegrationEvent>: 'static {}

/// A handler resolved by event name only; the payload type is unknown here.
pub trait DynamicIntegrationEventHandler: 'static {}

/// One handler registration under an event name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub handler: TypeTag,
    pub is_dynamic: bool,
}

impl SubscriptionRecord {
    pub fn typed(handler: TypeTag) -> Self {
        Self {
            handler,
            is_dynamic: false,
        }
    }

    pub fn dynamic(handler: TypeTag) -> Self {
        Self {
            handler,
            is_dynamic: true,
        }
    }

    pub fn handler_name(&self) -> &'static str {
        self.handler.name()
    }
}
