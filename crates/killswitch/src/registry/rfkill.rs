//! Discovery and notification decoding for the centralized rfkill-manager
//! backend: one bulk listing at startup, then three bus-wide signals. No
//! per-device subscriptions exist in this variant.

use std::sync::Arc;

use system_bus::{SignalEvent, SignalMatch};
use tracing::{debug, warn};

use super::Registry;
use crate::backend::{rfkill, u64_arg};
use crate::error::SwitchResult;
use crate::switch::Killswitch;
use crate::types::{SwitchId, SwitchType};

/// Populate the registry from the manager's bulk listing. Wholly unnamed
/// devices are dropped.
pub(crate) async fn discover(registry: &Registry) -> SwitchResult<()> {
    let bus = registry.bus().clone();
    for record in rfkill::get_all(bus.as_ref()).await? {
        match switch_from_record(registry, &record) {
            Some(switch) => {
                registry.insert(Arc::new(switch));
            }
            None => {
                debug!(index = record.index, "unnamed rfkill device dropped");
            }
        }
    }
    Ok(())
}

fn switch_from_record(
    registry: &Registry,
    record: &rfkill::RfkillRecord,
) -> Option<Killswitch> {
    if record.name.is_empty() {
        return None;
    }
    Some(Killswitch::rfkill(
        registry.bus().clone(),
        record.index,
        record.name.clone(),
        SwitchType::from_code(record.type_code),
    ))
}

pub(crate) fn subscriptions() -> Vec<SignalMatch> {
    [rfkill::SIG_CHANGED, rfkill::SIG_ADDED, rfkill::SIG_REMOVED]
        .into_iter()
        .map(|signal| {
            SignalMatch::new(
                signal,
                rfkill::IFACE,
                rfkill::SERVICE,
                Some(rfkill::PATH.to_string()),
            )
        })
        .collect()
}

pub(crate) async fn handle_signal(registry: &Registry, event: SignalEvent) {
    match event.signal.as_str() {
        rfkill::SIG_CHANGED => match u64_arg(&event.args, 0, "device index") {
            Ok(index) => registry.handle_changed(SwitchId::Index(index)).await,
            Err(err) => warn!(error = %err, "malformed rfkill-changed notification"),
        },
        rfkill::SIG_ADDED => match rfkill::decode_fields(&event.args) {
            Ok(record) => handle_added(registry, record),
            Err(err) => warn!(error = %err, "malformed rfkill-added notification"),
        },
        rfkill::SIG_REMOVED => match u64_arg(&event.args, 0, "device index") {
            Ok(index) => registry.handle_removed(SwitchId::Index(index)),
            Err(err) => warn!(error = %err, "malformed rfkill-removed notification"),
        },
        other => debug!(signal = %other, "ignoring unexpected signal"),
    }
}

fn handle_added(registry: &Registry, record: rfkill::RfkillRecord) {
    if registry.contains(&SwitchId::Index(record.index)) {
        debug!(index = record.index, "duplicate rfkill-added notification ignored");
        return;
    }
    match switch_from_record(registry, &record) {
        Some(switch) => {
            let switch = Arc::new(switch);
            if registry.insert(switch.clone()) {
                registry.notify_added(&switch);
            }
        }
        None => {
            warn!(index = record.index, "added rfkill device offers no usable name; skipped");
        }
    }
}
