#![forbid(unsafe_code)]

//! Dynamic property values and property keys.
//!
//! # Equality
//!
//! `Value` equality is what the write path uses to decide whether an
//! assignment is a change:
//!
//! | Variant            | Compared by                         |
//! |--------------------|-------------------------------------|
//! | `Null`, `Bool`     | value                               |
//! | `Number`           | `f64` equality (`NaN != NaN`)       |
//! | `String`           | contents                            |
//! | `Object`           | identity of the RawObject           |
//! | `Observed`         | identity of the proxy               |
//!
//! A proxy and the raw object it wraps are different references and never
//! compare equal, so replacing a stored raw object with its proxy is a
//! change.
//!
//! `Debug` prints nested objects and proxies as identity markers only, so
//! self-referencing objects format without recursing.

use std::fmt;

use crate::observed::ObservedObject;
use crate::raw::RawObject;

/// A property value stored in a [`RawObject`].
#[derive(Clone, Default)]
pub enum Value {
    /// Absent / null value. Missing properties read as `Null`.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A plain, unwrapped object.
    Object(RawObject),
    /// An object wrapped in a reactive proxy.
    Observed(ObservedObject),
}

impl Value {
    /// Short name of the variant, used in log and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Observed(_) => "observed object",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The RawObject behind this value, looking through a proxy.
    #[must_use]
    pub fn as_raw_object(&self) -> Option<RawObject> {
        match self {
            Self::Object(raw) => Some(raw.clone()),
            Self::Observed(obs) => Some(obs.raw_object()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_observed(&self) -> Option<&ObservedObject> {
        match self {
            Self::Observed(obs) => Some(obs),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => RawObject::ptr_eq(a, b),
            (Self::Observed(a), Self::Observed(b)) => ObservedObject::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Object(raw) => write!(f, "Object({:p})", raw.as_ptr()),
            Self::Observed(obs) => write!(f, "Observed({:p})", obs.raw_object().as_ptr()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<RawObject> for Value {
    fn from(value: RawObject) -> Self {
        Self::Object(value)
    }
}

impl From<ObservedObject> for Value {
    fn from(value: ObservedObject) -> Self {
        Self::Observed(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Key used to address a proxy property.
///
/// Besides ordinary named properties there are four reserved sentinels that
/// never collide with a name: two introspection reads and two subscription
/// writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Name(String),
    /// Read: always `true` on a proxy.
    IsObservedObject,
    /// Read: the unwrapped RawObject.
    RawObject,
    /// Write: add the assigned subscriber id to the owning set.
    Subscribe,
    /// Write: remove the assigned subscriber id from the owning set.
    Unsubscribe,
}

impl PropertyKey {
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Name(_))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::IsObservedObject => f.write_str("<is_observed_object>"),
            Self::RawObject => f.write_str("<raw_object>"),
            Self::Subscribe => f.write_str("<subscribe>"),
            Self::Unsubscribe => f.write_str("<unsubscribe>"),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::Value;
    use crate::raw::RawObject;

    impl From<serde_json::Value> for Value {
        /// Arrays have no counterpart and become objects keyed by index.
        fn from(value: serde_json::Value) -> Self {
            match value {
                serde_json::Value::Null => Self::Null,
                serde_json::Value::Bool(b) => Self::Bool(b),
                serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
                serde_json::Value::String(s) => Self::String(s),
                serde_json::Value::Array(items) => Self::Object(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| (i.to_string(), Value::from(v)))
                        .collect(),
                ),
                serde_json::Value::Object(map) => Self::Object(RawObject::from(map)),
            }
        }
    }

    impl Value {
        /// Snapshot this value as JSON. Proxies serialize as their raw
        /// contents. Non-finite numbers and back-references to an enclosing
        /// object become `null`.
        #[must_use]
        pub fn to_json(&self) -> serde_json::Value {
            self.to_json_within(&mut Vec::new())
        }

        /// `ancestors` holds the objects currently being serialized.
        pub(crate) fn to_json_within(&self, ancestors: &mut Vec<*const ()>) -> serde_json::Value {
            match self {
                Self::Null => serde_json::Value::Null,
                Self::Bool(b) => serde_json::Value::Bool(*b),
                Self::Number(n) => serde_json::Number::from_f64(*n)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
                Self::String(s) => serde_json::Value::String(s.clone()),
                Self::Object(raw) => raw.to_json_within(ancestors),
                Self::Observed(obs) => obs.raw_object().to_json_within(ancestors),
            }
        }
    }
}
