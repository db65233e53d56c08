#![forbid(unsafe_code)]

//! The plain data aggregate observed by a proxy.
//!
//! [`RawObject`] is a shared handle (`Rc<RefCell<..>>`) to a key/value map.
//! Cloning the handle never copies fields: every clone, and every proxy
//! wrapping it, sees the same storage.
//!
//! Each RawObject carries a weak back-link to the handler of the proxy that
//! currently wraps it. The link does not keep the proxy alive; once the last
//! proxy handle is dropped the object counts as unwrapped again.
//!
//! Writes made directly on a RawObject bypass change notification.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::handler::SubscribableHandler;
use crate::value::Value;

struct RawInner {
    props: BTreeMap<String, Value>,
    /// Handler of the live proxy wrapping this object, if any.
    wrapper: Weak<SubscribableHandler>,
}

/// Shared, unwrapped key/value object.
#[derive(Clone)]
pub struct RawObject {
    inner: Rc<RefCell<RawInner>>,
}

impl Default for RawObject {
    fn default() -> Self {
        Self::new()
    }
}

impl RawObject {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RawInner {
                props: BTreeMap::new(),
                wrapper: Weak::new(),
            })),
        }
    }

    /// Clone of the value stored at `key`, or `Null` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.inner
            .borrow()
            .props
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Store `value` at `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner
            .borrow_mut()
            .props
            .insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.borrow_mut().props.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().props.contains_key(key)
    }

    /// Property names in ascending order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().props.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().props.is_empty()
    }

    /// Access the property map by reference without cloning values.
    pub fn with<R>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> R) -> R {
        f(&self.inner.borrow().props)
    }

    /// Whether both handles name the same object.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Whether a live proxy currently wraps this object.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        self.inner.borrow().wrapper.strong_count() > 0
    }

    /// Address of the shared storage, stable for the object's lifetime.
    #[must_use]
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.inner).cast()
    }

    pub(crate) fn wrapper(&self) -> Option<Rc<SubscribableHandler>> {
        self.inner.borrow().wrapper.upgrade()
    }

    pub(crate) fn attach_wrapper(&self, handler: &Rc<SubscribableHandler>) {
        self.inner.borrow_mut().wrapper = Rc::downgrade(handler);
    }
}

impl fmt::Debug for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f.debug_map().entries(inner.props.iter()).finish(),
            Err(_) => f.write_str("RawObject { <borrowed> }"),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let raw = Self::new();
        {
            let mut inner = raw.inner.borrow_mut();
            for (k, v) in iter {
                inner.props.insert(k.into(), v.into());
            }
        }
        raw
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Map<String, serde_json::Value>> for RawObject {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

#[cfg(feature = "serde")]
impl RawObject {
    /// Snapshot the object as a JSON object. A property pointing back at
    /// an enclosing object (a cycle) is written as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_within(&mut Vec::new())
    }

    pub(crate) fn to_json_within(&self, ancestors: &mut Vec<*const ()>) -> serde_json::Value {
        let ptr = self.as_ptr();
        if ancestors.contains(&ptr) {
            tracing::debug!("RawObject::to_json: cycle replaced with null");
            return serde_json::Value::Null;
        }
        ancestors.push(ptr);
        let map = self.with(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_within(ancestors)))
                .collect::<serde_json::Map<_, _>>()
        });
        ancestors.pop();
        serde_json::Value::Object(map)
    }
}
