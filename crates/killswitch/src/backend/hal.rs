//! Legacy device-property backend: one object per device, power calls on
//! the device's own path, identity read from device properties.

use serde_json::Value;
use system_bus::{CallAddress, SystemBus};

use super::{array_arg, bool_arg, i64_arg, str_arg};
use crate::error::{KillswitchError, SwitchResult};
use crate::types::SwitchState;

pub(crate) const SERVICE: &str = "org.freedesktop.Hal";
pub(crate) const MANAGER_PATH: &str = "/org/freedesktop/Hal/Manager";
pub(crate) const MANAGER_IFACE: &str = "org.freedesktop.Hal.Manager";
pub(crate) const DEVICE_IFACE: &str = "org.freedesktop.Hal.Device";
pub(crate) const KILLSWITCH_IFACE: &str = "org.freedesktop.Hal.Device.KillSwitch";

pub(crate) const CAPABILITY: &str = "killswitch";
pub(crate) const NAME_PROPERTY: &str = "killswitch.name";
pub(crate) const TYPE_PROPERTY: &str = "killswitch.type";
pub(crate) const PRODUCT_PROPERTY: &str = "info.product";

pub(crate) const SIG_PROPERTY_MODIFIED: &str = "PropertyModified";
pub(crate) const SIG_DEVICE_ADDED: &str = "DeviceAdded";
pub(crate) const SIG_DEVICE_REMOVED: &str = "DeviceRemoved";

pub(crate) fn manager_address() -> CallAddress {
    CallAddress::new(SERVICE, MANAGER_PATH, MANAGER_IFACE)
}

fn device_address(udi: &str) -> CallAddress {
    CallAddress::new(SERVICE, udi, DEVICE_IFACE)
}

fn killswitch_address(udi: &str) -> CallAddress {
    CallAddress::new(SERVICE, udi, KILLSWITCH_IFACE)
}

/// Enumerate the object paths of every device advertising the killswitch
/// capability.
pub(crate) async fn find_killswitch_devices(bus: &dyn SystemBus) -> SwitchResult<Vec<String>> {
    let reply = bus
        .call(
            &manager_address(),
            "FindDeviceByCapability",
            &[Value::from(CAPABILITY)],
        )
        .await?;
    let udis = array_arg(&reply, 0, "device list")?;
    udis.iter()
        .map(|udi| {
            udi.as_str()
                .map(str::to_string)
                .ok_or_else(|| KillswitchError::Remote("expected string device path".to_string()))
        })
        .collect()
}

pub(crate) async fn query_capability(
    bus: &dyn SystemBus,
    udi: &str,
    capability: &str,
) -> SwitchResult<bool> {
    let reply = bus
        .call(
            &device_address(udi),
            "QueryCapability",
            &[Value::from(capability)],
        )
        .await?;
    bool_arg(&reply, 0, "capability flag")
}

/// Read a string device property, `None` when the property does not exist.
pub(crate) async fn get_string_property(
    bus: &dyn SystemBus,
    udi: &str,
    key: &str,
) -> SwitchResult<Option<String>> {
    let exists = bus
        .call(&device_address(udi), "PropertyExists", &[Value::from(key)])
        .await?;
    if !bool_arg(&exists, 0, "property existence flag")? {
        return Ok(None);
    }
    let reply = bus
        .call(&device_address(udi), "GetProperty", &[Value::from(key)])
        .await?;
    Ok(Some(str_arg(&reply, 0, key)?.to_string()))
}

pub(crate) async fn get_power(bus: &dyn SystemBus, udi: &str) -> SwitchResult<SwitchState> {
    let reply = bus.call(&killswitch_address(udi), "GetPower", &[]).await?;
    let code = i64_arg(&reply, 0, "power state")?;
    SwitchState::from_power_code(code)
        .ok_or_else(|| KillswitchError::Remote(format!("power state {code} out of range")))
}

pub(crate) async fn set_power(bus: &dyn SystemBus, udi: &str, state: i32) -> SwitchResult<()> {
    bus.call(&killswitch_address(udi), "SetPower", &[Value::from(state)])
        .await?;
    Ok(())
}
