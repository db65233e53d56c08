#![forbid(unsafe_code)]

//! Subscriber directory: id to subscriber lookup.
//!
//! # Design
//!
//! The host populates a [`SubscriberRegistry`]; the proxy layer only reads
//! it. Entries are `Weak`, so registering a subscriber never extends its
//! lifetime. A subscriber that was dropped without unregistering simply stops
//! resolving, the same as one that was never registered.
//!
//! The registry is injected rather than global. Clones share one table, so a
//! registry can be handed to every proxy of an application while tests each
//! build their own.
//!
//! # Failure Modes
//!
//! - **Id collision**: `register` refuses to replace a live subscriber with
//!   the same id and returns `false`. A dead entry is replaced silently.
//! - **Stale id**: `find` returns `None`; callers decide how loud to be.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::ObservedConfig;
use crate::subscriber::{Subscriber, SubscriberId};

struct RegistryInner {
    config: ObservedConfig,
    entries: RefCell<HashMap<SubscriberId, Weak<dyn Subscriber>>>,
    next_id: Cell<u32>,
}

/// Shared id to subscriber table holding weak references.
#[derive(Clone)]
pub struct SubscriberRegistry {
    inner: Rc<RegistryInner>,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("config", &self.inner.config)
            .field("live", &self.len())
            .field("next_id", &self.inner.next_id.get())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Empty registry with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ObservedConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ObservedConfig) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                config,
                entries: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> ObservedConfig {
        self.inner.config
    }

    /// Allocate an id not currently held by a live subscriber.
    ///
    /// Ids increase monotonically up to `u32::MAX`. Past that the counter
    /// restarts at 1 with a warning; ids of live subscribers are still
    /// skipped, but a restarted id may match a stale id left in an owning set.
    pub fn make_id(&self) -> SubscriberId {
        loop {
            let raw = self.inner.next_id.get();
            let next = raw.checked_add(1).unwrap_or_else(|| {
                tracing::warn!("SubscriberRegistry: id space exhausted, restarting at 1");
                1
            });
            self.inner.next_id.set(next);
            let id = SubscriberId::new(raw);
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// Register `subscriber` under its own id.
    ///
    /// Returns `false` if another live subscriber already holds the id.
    pub fn register<S: Subscriber + 'static>(&self, subscriber: &Rc<S>) -> bool {
        let subscriber: Rc<dyn Subscriber> = subscriber.clone();
        self.register_dyn(&subscriber)
    }

    /// [`register`](Self::register) for an already type-erased subscriber.
    pub fn register_dyn(&self, subscriber: &Rc<dyn Subscriber>) -> bool {
        let id = subscriber.id();
        let mut entries = self.inner.entries.borrow_mut();
        if let Some(existing) = entries.get(&id)
            && let Some(existing) = existing.upgrade()
        {
            if Rc::ptr_eq(&existing, subscriber) {
                return true;
            }
            tracing::warn!(%id, "SubscriberRegistry: id already registered to a live subscriber");
            return false;
        }
        entries.insert(id, Rc::downgrade(subscriber));
        tracing::debug!(%id, "SubscriberRegistry: registered");
        true
    }

    /// Remove the entry for `id`. Returns whether one existed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.inner.entries.borrow_mut().remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "SubscriberRegistry: unregistered");
        }
        removed
    }

    /// Resolve `id` to a live subscriber.
    #[must_use]
    pub fn find(&self, id: SubscriberId) -> Option<Rc<dyn Subscriber>> {
        self.inner
            .entries
            .borrow()
            .get(&id)
            .and_then(Weak::upgrade)
    }

    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.find(id).is_some()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .entries
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose subscriber no longer exists.
    pub fn prune_dead(&self) {
        self.inner
            .entries
            .borrow_mut()
            .retain(|_, w| w.strong_count() > 0);
    }

    /// Remove every entry. Ids already handed out are not reused.
    pub fn clear(&self) {
        self.inner.entries.borrow_mut().clear();
    }
}
