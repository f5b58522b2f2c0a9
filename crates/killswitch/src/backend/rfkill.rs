//! Centralized rfkill-manager backend: one manager object, devices
//! addressed by index, block flags instead of power codes.

use serde_json::Value;
use system_bus::{CallAddress, SystemBus};

use super::{array_arg, bool_arg, str_arg, u64_arg};
use crate::error::{KillswitchError, SwitchResult};
use crate::types::SwitchState;

pub(crate) const SERVICE: &str = "org.freedesktop.URfkill";
pub(crate) const PATH: &str = "/org/freedesktop/URfkill";
pub(crate) const IFACE: &str = "org.freedesktop.URfkill";
pub(crate) const PEER_IFACE: &str = "org.freedesktop.DBus.Peer";

pub(crate) const SIG_CHANGED: &str = "RfkillChanged";
pub(crate) const SIG_ADDED: &str = "RfkillAdded";
pub(crate) const SIG_REMOVED: &str = "RfkillRemoved";

pub(crate) fn manager_address() -> CallAddress {
    CallAddress::new(SERVICE, PATH, IFACE)
}

pub(crate) fn peer_address() -> CallAddress {
    CallAddress::new(SERVICE, PATH, PEER_IFACE)
}

/// One device row as reported by the manager: index, numeric type code,
/// the two block flags, and the device name.
#[derive(Debug, Clone)]
pub(crate) struct RfkillRecord {
    pub index: u64,
    pub type_code: u64,
    pub soft: bool,
    pub hard: bool,
    pub name: String,
}

impl RfkillRecord {
    pub(crate) fn state(&self) -> SwitchState {
        SwitchState::from_block_flags(self.soft, self.hard)
    }
}

/// Decode the positional fields (index, type, soft, hard, name) shared by
/// the bulk listing rows, the per-device query reply, and the add/change
/// signals.
pub(crate) fn decode_fields(fields: &[Value]) -> SwitchResult<RfkillRecord> {
    Ok(RfkillRecord {
        index: u64_arg(fields, 0, "device index")?,
        type_code: u64_arg(fields, 1, "device type code")?,
        soft: bool_arg(fields, 2, "soft block flag")?,
        hard: bool_arg(fields, 3, "hard block flag")?,
        name: str_arg(fields, 4, "device name")?.to_string(),
    })
}

/// Bulk-list every killswitch the manager knows about.
pub(crate) async fn get_all(bus: &dyn SystemBus) -> SwitchResult<Vec<RfkillRecord>> {
    let reply = bus.call(&manager_address(), "GetAll", &[]).await?;
    let rows = array_arg(&reply, 0, "device listing")?;
    rows.iter()
        .map(|row| {
            let fields = row
                .as_array()
                .ok_or_else(|| KillswitchError::Remote("expected array device row".to_string()))?;
            decode_fields(fields)
        })
        .collect()
}

pub(crate) async fn get_killswitch(bus: &dyn SystemBus, index: u64) -> SwitchResult<RfkillRecord> {
    let reply = bus
        .call(&manager_address(), "GetKillswitch", &[Value::from(index)])
        .await?;
    decode_fields(&reply)
}

pub(crate) async fn query_state(bus: &dyn SystemBus, index: u64) -> SwitchResult<SwitchState> {
    Ok(get_killswitch(bus, index).await?.state())
}

pub(crate) async fn unblock(bus: &dyn SystemBus, index: u64) -> SwitchResult<()> {
    bus.call(&manager_address(), "UnblockIdx", &[Value::from(index)])
        .await?;
    Ok(())
}

pub(crate) async fn block(bus: &dyn SystemBus, index: u64) -> SwitchResult<()> {
    bus.call(&manager_address(), "BlockIdx", &[Value::from(index)])
        .await?;
    Ok(())
}
