#![forbid(unsafe_code)]

//! Subscriber identity and notification capabilities.
//!
//! A subscriber is anything that wants to hear about writes to an observed
//! object. The proxy layer only ever stores a subscriber's [`SubscriberId`];
//! the subscriber itself is found through a
//! [`SubscriberRegistry`](crate::SubscriberRegistry) at notification time.
//!
//! Notification has two independent channels. A subscriber opts into either,
//! both, or neither by returning `Some(self)` from the matching accessor:
//!
//! ```
//! use observed_state::{PropertyChangeSubscriber, Subscriber, SubscriberCaps, SubscriberId};
//!
//! struct Row {
//!     id: SubscriberId,
//! }
//!
//! impl Subscriber for Row {
//!     fn id(&self) -> SubscriberId {
//!         self.id
//!     }
//!
//!     fn as_property_subscriber(&self) -> Option<&dyn PropertyChangeSubscriber> {
//!         Some(self)
//!     }
//! }
//!
//! impl PropertyChangeSubscriber for Row {
//!     fn property_has_changed(&self, _name: &str) {}
//! }
//!
//! let row = Row { id: SubscriberId::new(7) };
//! assert_eq!(row.capabilities(), SubscriberCaps::PROPERTY_CHANGED);
//! ```

use std::fmt;

use bitflags::bitflags;

use crate::value::Value;

/// Stable numeric identity of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubscriberId(u32);

impl SubscriberId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Interpret a property value as a subscriber id.
    ///
    /// Only non-negative integral numbers within `u32` range qualify.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let n = value.as_number()?;
        if n.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&n) {
            return None;
        }
        // Range checked above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let raw = n as u32;
        Some(Self(raw))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SubscriberId> for Value {
    fn from(id: SubscriberId) -> Self {
        Value::Number(f64::from(id.0))
    }
}

bitflags! {
    /// Notification channels a subscriber implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SubscriberCaps: u8 {
        /// Receives the new value via [`ValueChangeSubscriber::has_changed`].
        const VALUE_CHANGED = 0b01;
        /// Receives the property name via
        /// [`PropertyChangeSubscriber::property_has_changed`].
        const PROPERTY_CHANGED = 0b10;
    }
}

/// "Single value changed" channel.
pub trait ValueChangeSubscriber {
    fn has_changed(&self, new_value: &Value);
}

/// "Named property changed" channel.
pub trait PropertyChangeSubscriber {
    fn property_has_changed(&self, name: &str);
}

/// An entity that can own observed objects and be notified of their changes.
pub trait Subscriber {
    /// Stable id under which this subscriber is registered.
    fn id(&self) -> SubscriberId;

    fn as_value_subscriber(&self) -> Option<&dyn ValueChangeSubscriber> {
        None
    }

    fn as_property_subscriber(&self) -> Option<&dyn PropertyChangeSubscriber> {
        None
    }

    /// Channels this subscriber implements, derived from the accessors above.
    fn capabilities(&self) -> SubscriberCaps {
        let mut caps = SubscriberCaps::empty();
        if self.as_value_subscriber().is_some() {
            caps |= SubscriberCaps::VALUE_CHANGED;
        }
        if self.as_property_subscriber().is_some() {
            caps |= SubscriberCaps::PROPERTY_CHANGED;
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent(SubscriberId);

    impl Subscriber for Silent {
        fn id(&self) -> SubscriberId {
            self.0
        }
    }

    struct Both(SubscriberId);

    impl Subscriber for Both {
        fn id(&self) -> SubscriberId {
            self.0
        }

        fn as_value_subscriber(&self) -> Option<&dyn ValueChangeSubscriber> {
            Some(self)
        }

        fn as_property_subscriber(&self) -> Option<&dyn PropertyChangeSubscriber> {
            Some(self)
        }
    }

    impl ValueChangeSubscriber for Both {
        fn has_changed(&self, _new_value: &Value) {}
    }

    impl PropertyChangeSubscriber for Both {
        fn property_has_changed(&self, _name: &str) {}
    }

    #[test]
    fn capabilities_follow_accessors() {
        assert!(Silent(SubscriberId::new(1)).capabilities().is_empty());
        assert_eq!(
            Both(SubscriberId::new(2)).capabilities(),
            SubscriberCaps::VALUE_CHANGED | SubscriberCaps::PROPERTY_CHANGED
        );
    }

    #[test]
    fn id_from_value() {
        assert_eq!(
            SubscriberId::from_value(&Value::from(12)),
            Some(SubscriberId::new(12))
        );
        assert_eq!(SubscriberId::from_value(&Value::Number(1.5)), None);
        assert_eq!(SubscriberId::from_value(&Value::Number(-1.0)), None);
        assert_eq!(SubscriberId::from_value(&Value::Number(f64::NAN)), None);
        assert_eq!(SubscriberId::from_value(&Value::from("3")), None);
        assert_eq!(SubscriberId::from_value(&Value::Null), None);
    }

    #[test]
    fn id_round_trips_through_value() {
        let id = SubscriberId::new(42);
        assert_eq!(SubscriberId::from_value(&Value::from(id)), Some(id));
        assert_eq!(id.to_string(), "42");
    }
}
