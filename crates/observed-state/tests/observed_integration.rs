//! End-to-end scenarios for observed objects, subscribers and the registry.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use observed_state::{
    ObservedConfig, ObservedError, ObservedObject, PropertyChangeSubscriber, PropertyKey,
    RawObject, Subscriber, SubscriberCaps, SubscriberId, SubscriberRegistry, Value,
    ValueChangeSubscriber,
};
use tracing_test::traced_test;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Subscriber with a configurable set of channels that records every call.
struct Probe {
    id: SubscriberId,
    caps: SubscriberCaps,
    values: RefCell<Vec<Value>>,
    names: RefCell<Vec<String>>,
}

impl Probe {
    fn new(registry: &SubscriberRegistry, caps: SubscriberCaps) -> Rc<Self> {
        let probe = Rc::new(Self {
            id: registry.make_id(),
            caps,
            values: RefCell::new(Vec::new()),
            names: RefCell::new(Vec::new()),
        });
        assert!(registry.register(&probe));
        probe
    }

    fn calls(&self) -> usize {
        self.values.borrow().len() + self.names.borrow().len()
    }
}

impl Subscriber for Probe {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn as_value_subscriber(&self) -> Option<&dyn ValueChangeSubscriber> {
        self.caps
            .contains(SubscriberCaps::VALUE_CHANGED)
            .then_some(self as &dyn ValueChangeSubscriber)
    }

    fn as_property_subscriber(&self) -> Option<&dyn PropertyChangeSubscriber> {
        self.caps
            .contains(SubscriberCaps::PROPERTY_CHANGED)
            .then_some(self as &dyn PropertyChangeSubscriber)
    }
}

impl ValueChangeSubscriber for Probe {
    fn has_changed(&self, new_value: &Value) {
        self.values.borrow_mut().push(new_value.clone());
    }
}

impl PropertyChangeSubscriber for Probe {
    fn property_has_changed(&self, name: &str) {
        self.names.borrow_mut().push(name.to_string());
    }
}

fn all_caps() -> SubscriberCaps {
    SubscriberCaps::VALUE_CHANGED | SubscriberCaps::PROPERTY_CHANGED
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn single_owner_scenario() {
    let registry = SubscriberRegistry::new();
    let sub1 = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let o: RawObject = [("a", 1)].into_iter().collect();
    let p = ObservedObject::create_new(o.clone(), Some(sub1.id), &registry).unwrap();

    p.set("a", 2);
    assert_eq!(*sub1.values.borrow(), vec![Value::from(2)]);
    assert_eq!(o.get("a"), Value::from(2));
    assert_eq!(p.get("a"), Value::from(2));

    p.set("a", 2);
    assert_eq!(sub1.values.borrow().len(), 1);
}

#[test]
fn channels_are_independent() {
    let registry = SubscriberRegistry::new();
    let value_only = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let name_only = Probe::new(&registry, SubscriberCaps::PROPERTY_CHANGED);
    let both = Probe::new(&registry, all_caps());
    let neither = Probe::new(&registry, SubscriberCaps::empty());

    let p = ObservedObject::observed(RawObject::new(), &registry);
    for probe in [&value_only, &name_only, &both, &neither] {
        p.add_owner(Some(probe.id));
    }

    p.set("count", 3);

    assert_eq!(*value_only.values.borrow(), vec![Value::from(3)]);
    assert!(value_only.names.borrow().is_empty());
    assert_eq!(*name_only.names.borrow(), vec!["count".to_string()]);
    assert!(name_only.values.borrow().is_empty());
    assert_eq!(both.calls(), 2);
    assert_eq!(neither.calls(), 0);
}

#[test]
fn unsubscribe_stops_notification() {
    let registry = SubscriberRegistry::new();
    let s1 = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let s2 = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let p = ObservedObject::create_new(RawObject::new(), Some(s1.id), &registry).unwrap();
    p.add_owner(Some(s2.id));

    p.set("x", 1);
    let value = Value::from(p.clone());
    assert!(ObservedObject::remove_owning_subscriber(&value, s1.id));
    p.set("x", 2);

    assert_eq!(s1.values.borrow().len(), 1);
    assert_eq!(s2.values.borrow().len(), 2);
}

#[test]
fn sentinel_writes_manage_subscription() {
    let registry = SubscriberRegistry::new();
    let s = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let raw = RawObject::new();
    let p = ObservedObject::observed(raw.clone(), &registry);

    assert!(p.set(PropertyKey::Subscribe, s.id));
    p.set("k", "v");
    assert!(p.set(PropertyKey::Unsubscribe, s.id));
    p.set("k", "w");

    assert_eq!(s.values.borrow().len(), 1);
    assert_eq!(raw.keys(), vec!["k".to_string()]);
}

#[traced_test]
#[test]
fn stale_subscriber_is_skipped_and_logged() {
    let registry = SubscriberRegistry::new();
    let live = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let gone = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let p = ObservedObject::create_new(RawObject::new(), Some(gone.id), &registry).unwrap();
    p.add_owner(Some(live.id));

    assert!(registry.unregister(gone.id));
    assert!(p.set("a", 1));

    assert_eq!(live.values.borrow().len(), 1);
    assert!(gone.values.borrow().is_empty());
    assert!(p.has_owner(gone.id));
    assert!(logs_contain("unknown subscriber"));
}

#[test]
fn dropped_subscriber_is_treated_as_stale() {
    let registry = SubscriberRegistry::new();
    let live = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let p = ObservedObject::create_new(RawObject::new(), Some(live.id), &registry).unwrap();
    {
        let short_lived = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
        p.add_owner(Some(short_lived.id));
    }
    assert!(p.set("a", true));
    assert_eq!(live.values.borrow().len(), 1);
    assert_eq!(p.owners().len(), 2);
}

#[test]
fn pruning_policy_drops_stale_owners() {
    let registry =
        SubscriberRegistry::with_config(ObservedConfig::default().with_prune_stale_subscribers(true));
    let live = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let p = ObservedObject::create_new(RawObject::new(), Some(live.id), &registry).unwrap();
    p.add_owner(Some(SubscriberId::new(999)));

    p.set("a", 1);
    assert_eq!(p.owners(), vec![live.id]);
}

#[traced_test]
#[test]
fn absent_owner_is_logged_noop() {
    let registry = SubscriberRegistry::new();
    let p = ObservedObject::observed(RawObject::new(), &registry);
    p.add_owner(None);
    assert!(p.owners().is_empty());
    assert!(logs_contain("absent subscriber"));
}

#[traced_test]
#[test]
fn null_input_to_factory_is_logged() {
    let registry = SubscriberRegistry::new();
    assert!(ObservedObject::create_new(Value::Null, Some(SubscriberId::new(1)), &registry).is_none());
    assert!(logs_contain("input must be an object"));
}

#[test]
fn double_wrap_through_constructor_fails() {
    let registry = SubscriberRegistry::new();
    let p = ObservedObject::observed(RawObject::new(), &registry);
    let value = Value::from(p);
    assert!(ObservedObject::is_observed_object(&value));

    let err = ObservedObject::new(value, None, &registry).unwrap_err();
    assert!(matches!(err, ObservedError::InvariantViolation(_)));
    assert!(err.to_string().starts_with("invariant violation"));
}

#[test]
fn raw_writes_bypass_notification() {
    let registry = SubscriberRegistry::new();
    let s = Probe::new(&registry, SubscriberCaps::VALUE_CHANGED);
    let p = ObservedObject::create_new(RawObject::new(), Some(s.id), &registry).unwrap();

    let Value::Object(raw) = ObservedObject::get_raw_object(&Value::from(p.clone())) else {
        panic!("proxy must unwrap to an object");
    };
    raw.insert("hidden", 1);

    assert_eq!(p.get("hidden"), Value::from(1));
    assert!(s.values.borrow().is_empty());
}

#[test]
fn reentrant_write_runs_nested_fan_out() {
    struct Doubler {
        id: SubscriberId,
        target: RefCell<Option<ObservedObject>>,
        hits: Cell<u32>,
    }

    impl Subscriber for Doubler {
        fn id(&self) -> SubscriberId {
            self.id
        }

        fn as_property_subscriber(&self) -> Option<&dyn PropertyChangeSubscriber> {
            Some(self)
        }
    }

    impl PropertyChangeSubscriber for Doubler {
        fn property_has_changed(&self, name: &str) {
            self.hits.set(self.hits.get() + 1);
            let target = self.target.borrow().clone();
            if let (Some(obs), "input") = (target, name) {
                let n = obs.get("input").as_number().unwrap_or(0.0);
                obs.set("output", n * 2.0);
            }
        }
    }

    let registry = SubscriberRegistry::new();
    let doubler = Rc::new(Doubler {
        id: registry.make_id(),
        target: RefCell::new(None),
        hits: Cell::new(0),
    });
    registry.register(&doubler);
    let p = ObservedObject::create_new(RawObject::new(), Some(doubler.id), &registry).unwrap();
    *doubler.target.borrow_mut() = Some(p.clone());

    p.set("input", 21);
    assert_eq!(p.get("output"), Value::from(42));
    assert_eq!(doubler.hits.get(), 2);

    doubler.target.borrow_mut().take();
}

#[test]
fn config_from_env_lookup() {
    let config = ObservedConfig::from_env_with(|key| {
        (key == observed_state::config::ENV_PRUNE_STALE).then(|| "1".to_string())
    });
    let registry = SubscriberRegistry::with_config(config);
    assert!(registry.config().prune_stale_subscribers);
}
