//! Manager façade: the one object an application talks to. Owns the
//! backend choice, the registry, and the pump task that drains bus
//! notifications in delivery order.

use std::sync::Arc;

use system_bus::SystemBus;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SwitchResult;
use crate::probe::{select_backend, BackendKind};
use crate::registry::{self, Registry};
use crate::switch::Killswitch;
use crate::types::SwitchState;

pub struct KillswitchManager {
    backend: BackendKind,
    registry: Arc<Registry>,
    pump: JoinHandle<()>,
}

impl KillswitchManager {
    /// Probe for a backend, subscribe to its notifications, discover the
    /// existing devices, and start draining notifications. The backend
    /// choice is fixed for this manager's lifetime.
    pub async fn connect(bus: Arc<dyn SystemBus>) -> SwitchResult<Self> {
        let backend = select_backend(bus.as_ref()).await?;
        let registry = Arc::new(Registry::new(bus.clone()));

        // Subscriptions go in before discovery so nothing announced while
        // we enumerate is lost; a device seen by both paths is deduplicated
        // by the registry.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let rules = match backend {
            BackendKind::Hal => registry::hal::subscriptions(),
            BackendKind::Rfkill => registry::rfkill::subscriptions(),
        };
        for rule in rules {
            bus.subscribe(rule, tx.clone());
        }
        drop(tx);

        match backend {
            BackendKind::Hal => registry::hal::discover(&registry).await?,
            BackendKind::Rfkill => registry::rfkill::discover(&registry).await?,
        }
        debug!(
            backend = %backend,
            switches = registry.snapshot().len(),
            "killswitch discovery complete"
        );

        let pump_registry = registry.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match backend {
                    BackendKind::Hal => registry::hal::handle_signal(&pump_registry, event).await,
                    BackendKind::Rfkill => {
                        registry::rfkill::handle_signal(&pump_registry, event).await
                    }
                }
            }
        });

        Ok(Self {
            backend,
            registry,
            pump,
        })
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// The currently known killswitches, in discovery/announcement order.
    pub fn get_killswitches(&self) -> Vec<Arc<Killswitch>> {
        self.registry.snapshot()
    }

    /// Enable every registered killswitch. Best-effort: one attempt per
    /// device, failures are logged and do not halt the sweep.
    pub async fn enable_all(&self) {
        self.sweep(1).await;
    }

    /// Disable every registered killswitch, with the same best-effort
    /// contract as [`enable_all`](Self::enable_all).
    pub async fn disable_all(&self) {
        self.sweep(0).await;
    }

    async fn sweep(&self, state: i32) {
        for switch in self.registry.snapshot() {
            if let Err(err) = switch.set_state(state).await {
                warn!(switch = %switch.id(), error = %err, "set_state failed during sweep");
            }
        }
    }

    /// Register the observer invoked with `(device, new_state)` after a
    /// state-change notification. Single slot; replaces any previous
    /// callback.
    pub fn set_state_changed_cb<F>(&self, callback: F)
    where
        F: Fn(&Arc<Killswitch>, SwitchState) + Send + Sync + 'static,
    {
        self.registry.set_state_changed_cb(callback);
    }

    /// Register the observer invoked with each newly announced device.
    /// Single slot; replaces any previous callback.
    pub fn set_killswitch_added_cb<F>(&self, callback: F)
    where
        F: Fn(&Arc<Killswitch>) + Send + Sync + 'static,
    {
        self.registry.set_added_cb(callback);
    }

    /// Register the observer invoked with each removed device, before it
    /// leaves the registry. Single slot; replaces any previous callback.
    pub fn set_killswitch_removed_cb<F>(&self, callback: F)
    where
        F: Fn(&Arc<Killswitch>) + Send + Sync + 'static,
    {
        self.registry.set_removed_cb(callback);
    }
}

impl std::fmt::Debug for KillswitchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KillswitchManager")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Drop for KillswitchManager {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KillswitchError;
    use system_bus::LocalBus;

    #[tokio::test]
    async fn connect_fails_without_a_backend() {
        let bus: Arc<dyn SystemBus> = Arc::new(LocalBus::new());
        let err = KillswitchManager::connect(bus).await.unwrap_err();
        assert!(matches!(err, KillswitchError::NoBackendAvailable));
    }
}
