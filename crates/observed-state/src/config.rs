#![forbid(unsafe_code)]

//! Notification policy knobs.
//!
//! Defaults reproduce the forgiving behavior UI state code relies on: stale
//! subscriber ids stay in owning sets and are reported with a warning.
//!
//! # Environment
//!
//! | Variable                      | Field                        |
//! |-------------------------------|------------------------------|
//! | `OBSERVED_STATE_PRUNE_STALE`  | `prune_stale_subscribers`    |
//! | `OBSERVED_STATE_WARN_STALE`   | `warn_on_stale_subscriber`   |
//!
//! Values `1`, `true`, `yes`, `on` enable a flag; `0`, `false`, `no`, `off`
//! disable it. Anything else leaves the default in place.

pub const ENV_PRUNE_STALE: &str = "OBSERVED_STATE_PRUNE_STALE";
pub const ENV_WARN_STALE: &str = "OBSERVED_STATE_WARN_STALE";

/// Policy shared by a registry and every handler notifying through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservedConfig {
    /// Drop ids that miss the registry from the owning set after a fan-out.
    pub prune_stale_subscribers: bool,
    /// Log stale lookups at `warn` (otherwise `debug`).
    pub warn_on_stale_subscriber: bool,
}

impl Default for ObservedConfig {
    fn default() -> Self {
        Self {
            prune_stale_subscribers: false,
            warn_on_stale_subscriber: true,
        }
    }
}

#[inline]
fn env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ObservedConfig {
    #[must_use]
    pub fn with_prune_stale_subscribers(mut self, prune: bool) -> Self {
        self.prune_stale_subscribers = prune;
        self
    }

    #[must_use]
    pub fn with_warn_on_stale_subscriber(mut self, warn: bool) -> Self {
        self.warn_on_stale_subscriber = warn;
        self
    }

    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(flag) = get_env(ENV_PRUNE_STALE).as_deref().and_then(env_flag) {
            config.prune_stale_subscribers = flag;
        }
        if let Some(flag) = get_env(ENV_WARN_STALE).as_deref().and_then(env_flag) {
            config.warn_on_stale_subscriber = flag;
        }
        config
    }
}
