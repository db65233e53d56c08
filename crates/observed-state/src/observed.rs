#![forbid(unsafe_code)]

//! Reactive proxy over a [`RawObject`].
//!
//! # Design
//!
//! Rust has no transparent property traps, so [`ObservedObject`] is an
//! explicit wrapper: every access goes through [`ObservedObject::get`] and
//! [`ObservedObject::set`], which route to a [`SubscribableHandler`]. Reads
//! pass through; writes that change a value notify every owning subscriber.
//!
//! Cloning an `ObservedObject` creates another handle to the **same** proxy:
//! same target, same owner set.
//!
//! # Invariants
//!
//! 1. A RawObject is wrapped by at most one live proxy. The factory
//!    [`create_new`](ObservedObject::create_new) returns the existing proxy
//!    instead of building a second one; the raw constructor
//!    [`new`](ObservedObject::new) refuses with
//!    [`ObservedError::InvariantViolation`].
//! 2. Wrapping never copies fields.
//! 3. Once every handle to a proxy is dropped, its RawObject may be wrapped
//!    again.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use observed_state::{
//!     ObservedObject, RawObject, Subscriber, SubscriberId, SubscriberRegistry, Value,
//!     ValueChangeSubscriber,
//! };
//!
//! struct Label {
//!     id: SubscriberId,
//!     redraws: Cell<u32>,
//! }
//!
//! impl Subscriber for Label {
//!     fn id(&self) -> SubscriberId {
//!         self.id
//!     }
//!     fn as_value_subscriber(&self) -> Option<&dyn ValueChangeSubscriber> {
//!         Some(self)
//!     }
//! }
//!
//! impl ValueChangeSubscriber for Label {
//!     fn has_changed(&self, _new_value: &Value) {
//!         self.redraws.set(self.redraws.get() + 1);
//!     }
//! }
//!
//! let registry = SubscriberRegistry::new();
//! let label = Rc::new(Label { id: registry.make_id(), redraws: Cell::new(0) });
//! registry.register(&label);
//!
//! let raw: RawObject = [("a", 1)].into_iter().collect();
//! let proxy = ObservedObject::create_new(raw.clone(), Some(label.id), &registry).unwrap();
//!
//! proxy.set("a", 2);
//! assert_eq!(label.redraws.get(), 1);
//! assert_eq!(raw.get("a"), Value::from(2));
//!
//! proxy.set("a", 2); // unchanged, no notification
//! assert_eq!(label.redraws.get(), 1);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::ObservedError;
use crate::handler::{PropertyHandler, SubscribableHandler};
use crate::raw::RawObject;
use crate::registry::SubscriberRegistry;
use crate::subscriber::{Subscriber, SubscriberId};
use crate::value::{PropertyKey, Value};

/// A RawObject wrapped with change notification.
#[derive(Clone)]
pub struct ObservedObject {
    target: RawObject,
    handler: Rc<SubscribableHandler>,
}

impl fmt::Debug for ObservedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedObject")
            .field("target", &self.target)
            .field("owners", &self.handler.owners())
            .finish()
    }
}

impl PartialEq for ObservedObject {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl ObservedObject {
    /// Factory: wrap `raw`, or sign `owner` up with the proxy that already
    /// wraps it.
    ///
    /// - An [`Value::Observed`] input, or a [`Value::Object`] already
    ///   wrapped by a live proxy, yields that proxy with `owner` added to its
    ///   owner set. The existing proxy keeps its own registry.
    /// - An unwrapped object gets a new proxy seeded with `owner`.
    /// - `Null` and primitives are logged and yield `None`.
    pub fn create_new(
        raw: impl Into<Value>,
        owner: Option<SubscriberId>,
        registry: &SubscriberRegistry,
    ) -> Option<Self> {
        match raw.into() {
            Value::Observed(existing) => {
                existing.set(PropertyKey::Subscribe, owner);
                Some(existing)
            }
            Value::Object(raw) => match raw.wrapper() {
                Some(handler) => {
                    let existing = Self {
                        target: raw,
                        handler,
                    };
                    existing.set(PropertyKey::Subscribe, owner);
                    Some(existing)
                }
                None => Some(Self::bind(raw, owner, registry)),
            },
            other => {
                tracing::error!(
                    kind = other.kind(),
                    "ObservedObject::create_new: input must be an object"
                );
                None
            }
        }
    }

    /// Wrap `raw` with no owner, reusing the live proxy if there is one.
    ///
    /// This is the path for types that are always observed from
    /// construction onward.
    #[must_use]
    pub fn observed(raw: RawObject, registry: &SubscriberRegistry) -> Self {
        match raw.wrapper() {
            Some(handler) => Self {
                target: raw,
                handler,
            },
            None => Self::bind(raw, None, registry),
        }
    }

    /// Raw constructor: always builds a fresh proxy.
    ///
    /// # Errors
    ///
    /// - [`ObservedError::InvariantViolation`] if `raw` is a proxy or is
    ///   already wrapped by a live proxy.
    /// - [`ObservedError::NotAnObject`] for `Null` and primitives.
    pub fn new(
        raw: impl Into<Value>,
        owner: Option<SubscriberId>,
        registry: &SubscriberRegistry,
    ) -> Result<Self, ObservedError> {
        match raw.into() {
            Value::Observed(_) => Err(ObservedError::InvariantViolation(
                "ObservedObject constructor called with an observed object".to_string(),
            )),
            Value::Object(raw) if raw.is_wrapped() => Err(ObservedError::InvariantViolation(
                "object is already wrapped by a live ObservedObject".to_string(),
            )),
            Value::Object(raw) => Ok(Self::bind(raw, owner, registry)),
            other => Err(ObservedError::NotAnObject { kind: other.kind() }),
        }
    }

    fn bind(target: RawObject, owner: Option<SubscriberId>, registry: &SubscriberRegistry) -> Self {
        let handler = Rc::new(SubscribableHandler::new(owner, registry.clone()));
        target.attach_wrapper(&handler);
        Self { target, handler }
    }

    /// Read `key` through the proxy.
    #[must_use]
    pub fn get(&self, key: impl Into<PropertyKey>) -> Value {
        self.handler.get(&self.target, &key.into())
    }

    /// Write `value` to `key` through the proxy, notifying owners on change.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> bool {
        self.handler.set(&self.target, &key.into(), value.into())
    }

    /// The unwrapped object. Do not hold on to it: writes made through it
    /// are not observed.
    #[must_use]
    pub fn raw_object(&self) -> RawObject {
        self.target.clone()
    }

    /// Add `subscriber` to the owner set. `None` is logged and ignored.
    pub fn add_owner(&self, subscriber: Option<SubscriberId>) {
        self.set(PropertyKey::Subscribe, subscriber);
    }

    pub fn remove_owner(&self, subscriber: SubscriberId) {
        self.set(PropertyKey::Unsubscribe, subscriber);
    }

    /// [`add_owner`](Self::add_owner) taking the subscriber itself.
    pub fn add_subscriber(&self, subscriber: Option<&dyn Subscriber>) {
        self.add_owner(subscriber.map(|s| s.id()));
    }

    /// [`remove_owner`](Self::remove_owner) taking the subscriber itself.
    pub fn remove_subscriber(&self, subscriber: &dyn Subscriber) {
        self.remove_owner(subscriber.id());
    }

    #[must_use]
    pub fn has_owner(&self, subscriber: SubscriberId) -> bool {
        self.handler.has_owner(subscriber)
    }

    /// Owner ids in ascending order.
    #[must_use]
    pub fn owners(&self) -> Vec<SubscriberId> {
        self.handler.owners()
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        self.handler.registry()
    }

    /// Whether both handles name the same proxy.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.handler, &b.handler)
    }

    /// `true` if `value` is a proxy. A raw object never is, even while
    /// wrapped.
    #[must_use]
    pub fn is_observed_object(value: &Value) -> bool {
        value
            .as_observed()
            .is_some_and(|obs| obs.get(PropertyKey::IsObservedObject) == Value::Bool(true))
    }

    /// The raw object behind `value`, or `value` itself if it is not a
    /// proxy.
    #[must_use]
    pub fn get_raw_object(value: &Value) -> Value {
        match value.as_observed() {
            Some(obs) => obs.get(PropertyKey::RawObject),
            None => value.clone(),
        }
    }

    /// Add `subscriber` to the owners of `value`. `false` if `value` is not
    /// a proxy.
    pub fn add_owning_subscriber(value: &Value, subscriber: Option<SubscriberId>) -> bool {
        match value.as_observed() {
            Some(obs) => {
                obs.add_owner(subscriber);
                true
            }
            None => false,
        }
    }

    /// Remove `subscriber` from the owners of `value`. `false` if `value` is
    /// not a proxy.
    pub fn remove_owning_subscriber(value: &Value, subscriber: SubscriberId) -> bool {
        match value.as_observed() {
            Some(obs) => {
                obs.remove_owner(subscriber);
                true
            }
            None => false,
        }
    }
}
