//! Live set of killswitch devices plus the observer slots fed by backend
//! notifications. The set is mutated only during construction-time
//! discovery and from the manager's pump task, so mutation and observer
//! dispatch are serialized behind a single owner.

pub(crate) mod hal;
pub(crate) mod rfkill;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use system_bus::SystemBus;
use tracing::{debug, warn};

use crate::switch::Killswitch;
use crate::types::{SwitchId, SwitchState};

type StateChangedFn = dyn Fn(&Arc<Killswitch>, SwitchState) + Send + Sync;
type SwitchFn = dyn Fn(&Arc<Killswitch>) + Send + Sync;

/// Single-slot observers; re-registering replaces the previous callback.
#[derive(Default)]
struct Observers {
    state_changed: Option<Arc<StateChangedFn>>,
    added: Option<Arc<SwitchFn>>,
    removed: Option<Arc<SwitchFn>>,
}

pub(crate) struct Registry {
    bus: Arc<dyn SystemBus>,
    switches: Mutex<Vec<Arc<Killswitch>>>,
    observers: RwLock<Observers>,
}

impl Registry {
    pub(crate) fn new(bus: Arc<dyn SystemBus>) -> Self {
        Self {
            bus,
            switches: Mutex::new(Vec::new()),
            observers: RwLock::new(Observers::default()),
        }
    }

    pub(crate) fn bus(&self) -> &Arc<dyn SystemBus> {
        &self.bus
    }

    /// The live contents, in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Killswitch>> {
        self.switches.lock().clone()
    }

    pub(crate) fn contains(&self, id: &SwitchId) -> bool {
        self.switches.lock().iter().any(|ks| ks.matches(id))
    }

    fn find(&self, id: &SwitchId) -> Option<Arc<Killswitch>> {
        self.switches
            .lock()
            .iter()
            .find(|ks| ks.matches(id))
            .cloned()
    }

    /// Insert unless the id is already present. Returns whether the entry
    /// was admitted.
    pub(crate) fn insert(&self, switch: Arc<Killswitch>) -> bool {
        let mut switches = self.switches.lock();
        let id = switch.id();
        if switches.iter().any(|ks| ks.matches(&id)) {
            debug!(switch = %id, "duplicate add ignored");
            return false;
        }
        switches.push(switch);
        true
    }

    pub(crate) fn set_state_changed_cb<F>(&self, callback: F)
    where
        F: Fn(&Arc<Killswitch>, SwitchState) + Send + Sync + 'static,
    {
        self.observers.write().state_changed = Some(Arc::new(callback));
    }

    pub(crate) fn set_added_cb<F>(&self, callback: F)
    where
        F: Fn(&Arc<Killswitch>) + Send + Sync + 'static,
    {
        self.observers.write().added = Some(Arc::new(callback));
    }

    pub(crate) fn set_removed_cb<F>(&self, callback: F)
    where
        F: Fn(&Arc<Killswitch>) + Send + Sync + 'static,
    {
        self.observers.write().removed = Some(Arc::new(callback));
    }

    /// A change notification for `id`: re-fetch the live state and forward
    /// it. Unknown ids are a no-op (the device was already removed).
    pub(crate) async fn handle_changed(&self, id: SwitchId) {
        let Some(switch) = self.find(&id) else {
            return;
        };
        let state = match switch.state().await {
            Ok(state) => state,
            Err(err) => {
                warn!(switch = %id, error = %err, "state re-fetch failed after change notification");
                return;
            }
        };
        let callback = self.observers.read().state_changed.clone();
        if let Some(callback) = callback {
            callback(&switch, state);
        }
    }

    pub(crate) fn notify_added(&self, switch: &Arc<Killswitch>) {
        let callback = self.observers.read().added.clone();
        if let Some(callback) = callback {
            callback(switch);
        }
    }

    /// A removal notification for `id`. The observer runs before the entry
    /// is deleted, so the device's identity is still readable; unknown ids
    /// are a no-op.
    pub(crate) fn handle_removed(&self, id: SwitchId) {
        let Some(switch) = self.find(&id) else {
            return;
        };
        let callback = self.observers.read().removed.clone();
        if let Some(callback) = callback {
            callback(&switch);
        }
        self.switches.lock().retain(|ks| !ks.matches(&id));
        debug!(switch = %id, "killswitch removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SwitchType;
    use system_bus::LocalBus;

    fn test_registry() -> Registry {
        Registry::new(Arc::new(LocalBus::new()))
    }

    fn hal_switch(registry: &Registry, udi: &str) -> Arc<Killswitch> {
        Arc::new(Killswitch::hal(
            registry.bus().clone(),
            udi.to_string(),
            format!("switch {udi}"),
            SwitchType::Wlan,
        ))
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let registry = test_registry();
        assert!(registry.insert(hal_switch(&registry, "/dev/a")));
        assert!(!registry.insert(hal_switch(&registry, "/dev/a")));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let registry = test_registry();
        for udi in ["/dev/a", "/dev/b", "/dev/c"] {
            registry.insert(hal_switch(&registry, udi));
        }
        let ids: Vec<_> = registry.snapshot().iter().map(|ks| ks.id()).collect();
        assert_eq!(
            ids,
            vec![
                SwitchId::Udi("/dev/a".to_string()),
                SwitchId::Udi("/dev/b".to_string()),
                SwitchId::Udi("/dev/c".to_string()),
            ]
        );
    }

    #[test]
    fn removal_of_unknown_id_is_a_no_op() {
        let registry = test_registry();
        registry.insert(hal_switch(&registry, "/dev/a"));
        registry.handle_removed(SwitchId::Udi("/dev/missing".to_string()));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn removed_observer_sees_identity_before_deletion() {
        let registry = test_registry();
        registry.insert(hal_switch(&registry, "/dev/a"));

        let seen: Arc<Mutex<Vec<(SwitchId, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.set_removed_cb(move |ks| {
            sink.lock().push((ks.id(), ks.name().to_string()));
        });

        registry.handle_removed(SwitchId::Udi("/dev/a".to_string()));
        assert_eq!(registry.snapshot().len(), 0);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, SwitchId::Udi("/dev/a".to_string()));
        assert_eq!(seen[0].1, "switch /dev/a");
    }
}
