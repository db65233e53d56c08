#![forbid(unsafe_code)]

//! Property interception and owner bookkeeping.
//!
//! # Design
//!
//! [`PropertyHandler`] is the trap seam: a proxy routes every read and write
//! of its target through one. [`SubscribableHandler`] is the implementation
//! used by [`ObservedObject`](crate::ObservedObject). It owns the set of
//! subscriber ids interested in the target and fans a change out to them.
//!
//! # Invariants
//!
//! 1. The owning set never contains duplicates.
//! 2. Membership is independent of subscriber liveness; ids are resolved
//!    through the registry only when a change is delivered.
//! 3. A write of a value equal to the stored one is a no-op: no store, no
//!    notification.
//! 4. Each differing write notifies every id in the owning set exactly once,
//!    before `set` returns.
//!
//! # Failure Modes
//!
//! - **Absent owner**: adding `None` logs a warning and changes nothing.
//! - **Stale id**: an owner missing from the registry is logged and skipped;
//!   the remaining owners are still notified.
//! - **Re-entrant write**: a subscriber writing to the proxy from inside a
//!   callback triggers a nested fan-out. No borrow is held across callbacks,
//!   so this does not panic, but the ordering is the caller's problem.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

use crate::raw::RawObject;
use crate::registry::SubscriberRegistry;
use crate::subscriber::SubscriberId;
use crate::value::{PropertyKey, Value};

/// Interception hooks for reads and writes of a proxied object.
pub trait PropertyHandler {
    /// Value observed when reading `key` through the proxy.
    fn get(&self, target: &RawObject, key: &PropertyKey) -> Value;

    /// Apply a write of `new_value` to `key`. Returns whether the write was
    /// accepted.
    fn set(&self, target: &RawObject, key: &PropertyKey, new_value: Value) -> bool;
}

/// Owner set plus change fan-out for one observed object.
pub struct SubscribableHandler {
    owning: RefCell<BTreeSet<SubscriberId>>,
    registry: SubscriberRegistry,
}

impl fmt::Debug for SubscribableHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribableHandler")
            .field("owners", &self.owners())
            .finish_non_exhaustive()
    }
}

impl SubscribableHandler {
    /// Create a handler, seeding the owner set with `owner` when present.
    #[must_use]
    pub fn new(owner: Option<SubscriberId>, registry: SubscriberRegistry) -> Self {
        let handler = Self {
            owning: RefCell::new(BTreeSet::new()),
            registry,
        };
        if let Some(owner) = owner {
            handler.add_owning_subscriber(Some(owner));
        }
        tracing::debug!("SubscribableHandler: created");
        handler
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Add `subscriber` to the owner set. `None` is logged and ignored.
    pub fn add_owning_subscriber(&self, subscriber: Option<SubscriberId>) {
        match subscriber {
            Some(id) => {
                tracing::debug!(%id, "SubscribableHandler: add owning subscriber");
                self.owning.borrow_mut().insert(id);
            }
            None => {
                tracing::warn!("SubscribableHandler: add owning subscriber: absent subscriber");
            }
        }
    }

    /// Remove `id` from the owner set. Removing an absent id is a no-op.
    pub fn remove_owning_subscriber(&self, id: SubscriberId) {
        tracing::debug!(%id, "SubscribableHandler: remove owning subscriber");
        self.owning.borrow_mut().remove(&id);
    }

    #[must_use]
    pub fn has_owner(&self, id: SubscriberId) -> bool {
        self.owning.borrow().contains(&id)
    }

    /// Snapshot of the owner set in ascending id order.
    #[must_use]
    pub fn owners(&self) -> Vec<SubscriberId> {
        self.owning.borrow().iter().copied().collect()
    }

    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.owning.borrow().len()
    }

    /// Deliver a change of `name` to every current owner.
    fn notify_property_has_changed(&self, name: &str, new_value: &Value) {
        // Snapshot so callbacks may add or remove owners.
        let owners = self.owners();
        tracing::debug!(
            property = name,
            owners = owners.len(),
            "SubscribableHandler: property has changed"
        );

        let config = self.registry.config();
        let mut stale = Vec::new();
        for id in owners {
            let Some(subscriber) = self.registry.find(id) else {
                if config.warn_on_stale_subscriber {
                    tracing::warn!(%id, "SubscribableHandler: notify: unknown subscriber");
                } else {
                    tracing::debug!(%id, "SubscribableHandler: notify: unknown subscriber");
                }
                stale.push(id);
                continue;
            };
            if let Some(single) = subscriber.as_value_subscriber() {
                single.has_changed(new_value);
            }
            if let Some(multi) = subscriber.as_property_subscriber() {
                multi.property_has_changed(name);
            }
        }

        if config.prune_stale_subscribers && !stale.is_empty() {
            let mut owning = self.owning.borrow_mut();
            for id in &stale {
                owning.remove(id);
            }
        }
    }
}

impl PropertyHandler for SubscribableHandler {
    fn get(&self, target: &RawObject, key: &PropertyKey) -> Value {
        match key {
            PropertyKey::IsObservedObject => Value::Bool(true),
            PropertyKey::RawObject => Value::Object(target.clone()),
            PropertyKey::Subscribe | PropertyKey::Unsubscribe => Value::Null,
            PropertyKey::Name(name) => target.get(name),
        }
    }

    fn set(&self, target: &RawObject, key: &PropertyKey, new_value: Value) -> bool {
        match key {
            PropertyKey::Subscribe => {
                self.add_owning_subscriber(SubscriberId::from_value(&new_value));
                true
            }
            PropertyKey::Unsubscribe => {
                match SubscriberId::from_value(&new_value) {
                    Some(id) => self.remove_owning_subscriber(id),
                    None => tracing::warn!(
                        kind = new_value.kind(),
                        "SubscribableHandler: unsubscribe: not a subscriber id"
                    ),
                }
                true
            }
            PropertyKey::IsObservedObject | PropertyKey::RawObject => {
                tracing::warn!(%key, "SubscribableHandler: write to read-only sentinel ignored");
                false
            }
            PropertyKey::Name(name) => {
                if target.get(name) == new_value {
                    return true;
                }
                target.insert(name.clone(), new_value.clone());
                self.notify_property_has_changed(name, &new_value);
                true
            }
        }
    }
}
