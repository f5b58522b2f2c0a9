//! Discovery and notification decoding for the legacy device-property
//! backend: a capability directory walk at startup, then per-device
//! property-change notifications plus bus-wide add/remove.

use std::sync::Arc;

use system_bus::{SignalEvent, SignalMatch};
use tracing::{debug, warn};

use super::Registry;
use crate::backend::{hal, str_arg};
use crate::error::{KillswitchError, SwitchResult};
use crate::switch::Killswitch;
use crate::types::{SwitchId, SwitchType};

/// Walk the capability directory and populate the registry. Failures of
/// the directory query abort discovery; a failure on an individual device
/// only skips that device.
pub(crate) async fn discover(registry: &Registry) -> SwitchResult<()> {
    let bus = registry.bus().clone();
    for udi in hal::find_killswitch_devices(bus.as_ref()).await? {
        match build_switch(registry, &udi).await {
            Ok(switch) => {
                registry.insert(Arc::new(switch));
            }
            Err(KillswitchError::MissingIdentity(udi)) => {
                warn!(device = %udi, "killswitch device offers no usable name; skipped");
            }
            Err(err) => {
                warn!(device = %udi, error = %err, "failed to read killswitch device; skipped");
            }
        }
    }
    Ok(())
}

/// Read a device's identity and wrap it. The primary name property falls
/// back to the generic product name; a device with neither is rejected.
async fn build_switch(registry: &Registry, udi: &str) -> SwitchResult<Killswitch> {
    let bus = registry.bus();
    let name = match hal::get_string_property(bus.as_ref(), udi, hal::NAME_PROPERTY).await? {
        Some(name) => name,
        None => hal::get_string_property(bus.as_ref(), udi, hal::PRODUCT_PROPERTY)
            .await?
            .ok_or_else(|| KillswitchError::MissingIdentity(udi.to_string()))?,
    };
    let type_label = hal::get_string_property(bus.as_ref(), udi, hal::TYPE_PROPERTY)
        .await?
        .unwrap_or_default();
    Ok(Killswitch::hal(
        bus.clone(),
        udi.to_string(),
        name,
        SwitchType::from_label(&type_label),
    ))
}

pub(crate) fn subscriptions() -> Vec<SignalMatch> {
    vec![
        // Property changes arrive from every device path; the registry
        // lookup filters them down to known killswitches.
        SignalMatch::new(
            hal::SIG_PROPERTY_MODIFIED,
            hal::DEVICE_IFACE,
            hal::SERVICE,
            None,
        ),
        SignalMatch::new(
            hal::SIG_DEVICE_ADDED,
            hal::MANAGER_IFACE,
            hal::SERVICE,
            Some(hal::MANAGER_PATH.to_string()),
        ),
        SignalMatch::new(
            hal::SIG_DEVICE_REMOVED,
            hal::MANAGER_IFACE,
            hal::SERVICE,
            Some(hal::MANAGER_PATH.to_string()),
        ),
    ]
}

pub(crate) async fn handle_signal(registry: &Registry, event: SignalEvent) {
    match event.signal.as_str() {
        hal::SIG_PROPERTY_MODIFIED => {
            registry
                .handle_changed(SwitchId::Udi(event.path.clone()))
                .await;
        }
        hal::SIG_DEVICE_ADDED => match str_arg(&event.args, 0, "device path") {
            Ok(udi) => handle_added(registry, udi.to_string()).await,
            Err(err) => warn!(error = %err, "malformed device-added notification"),
        },
        hal::SIG_DEVICE_REMOVED => match str_arg(&event.args, 0, "device path") {
            Ok(udi) => registry.handle_removed(SwitchId::Udi(udi.to_string())),
            Err(err) => warn!(error = %err, "malformed device-removed notification"),
        },
        other => debug!(signal = %other, "ignoring unexpected signal"),
    }
}

async fn handle_added(registry: &Registry, udi: String) {
    let bus = registry.bus();
    match hal::query_capability(bus.as_ref(), &udi, hal::CAPABILITY).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(err) => {
            warn!(device = %udi, error = %err, "capability query failed for added device");
            return;
        }
    }
    if registry.contains(&SwitchId::Udi(udi.clone())) {
        debug!(device = %udi, "duplicate device-added notification ignored");
        return;
    }
    match build_switch(registry, &udi).await {
        Ok(switch) => {
            let switch = Arc::new(switch);
            if registry.insert(switch.clone()) {
                registry.notify_added(&switch);
            }
        }
        Err(KillswitchError::MissingIdentity(udi)) => {
            warn!(device = %udi, "added killswitch offers no usable name; skipped");
        }
        Err(err) => {
            warn!(device = %udi, error = %err, "failed to read added killswitch; skipped");
        }
    }
}
