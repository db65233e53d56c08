#![forbid(unsafe_code)]

//! Observed objects for declarative UI state.
//!
//! This crate wraps plain key/value objects in reactive proxies. Reads are
//! transparent; a write that changes a value notifies every subscriber that
//! owns the object.
//!
//! - [`RawObject`]: the shared, unwrapped data aggregate.
//! - [`ObservedObject`]: the proxy. Built with
//!   [`ObservedObject::create_new`], which never wraps an object twice.
//! - [`SubscribableHandler`]: per-proxy owner set and change fan-out, behind
//!   the [`PropertyHandler`] trap trait.
//! - [`SubscriberRegistry`]: id to subscriber lookup, holding weak
//!   references only.
//! - [`Subscriber`]: stable id plus two optional notification channels,
//!   [`ValueChangeSubscriber`] and [`PropertyChangeSubscriber`].
//!
//! # Architecture
//!
//! Proxies store subscriber ids, never subscribers. At notification time
//! each id is resolved through the registry; ids that no longer resolve are
//! logged and skipped. Everything is single-threaded (`Rc`/`RefCell`) and
//! notification completes before the triggering `set` returns.
//!
//! # Failure Modes
//!
//! | Failure                       | Behavior                             |
//! |-------------------------------|--------------------------------------|
//! | Raw constructor on a proxy    | `Err(ObservedError::InvariantViolation)` |
//! | `Null`/primitive to factory   | `error!` log, `None`                 |
//! | Absent owner                  | `warn!` log, no-op                   |
//! | Stale owner id on notify      | `warn!` log, skipped                 |

pub mod config;
pub mod error;
pub mod handler;
pub mod observed;
pub mod raw;
pub mod registry;
pub mod subscriber;
pub mod value;

pub use config::ObservedConfig;
pub use error::ObservedError;
pub use handler::{PropertyHandler, SubscribableHandler};
pub use observed::ObservedObject;
pub use raw::RawObject;
pub use registry::SubscriberRegistry;
pub use subscriber::{
    PropertyChangeSubscriber, Subscriber, SubscriberCaps, SubscriberId, ValueChangeSubscriber,
};
pub use value::{PropertyKey, Value};
