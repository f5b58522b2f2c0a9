//! Backend availability probe. Runs once per manager: the centralized
//! rfkill manager is preferred, with an activation attempt before giving
//! up on it; the legacy device-property service is probed by name
//! ownership only.

use std::fmt;

use system_bus::{BusError, SystemBus};
use tracing::{debug, info, warn};

use crate::backend::{hal, rfkill};
use crate::error::{KillswitchError, SwitchResult};

/// Which system service drives the registry. Fixed for the lifetime of a
/// manager; failover requires constructing a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hal,
    Rfkill,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hal => f.write_str("hal"),
            Self::Rfkill => f.write_str("rfkill"),
        }
    }
}

/// Decide which backend drives the registry.
pub async fn select_backend(bus: &dyn SystemBus) -> SwitchResult<BackendKind> {
    if !bus.owns_name(rfkill::SERVICE).await {
        // Contacting the well-known object path gives the bus a chance to
        // activate the service before we rule it out.
        match bus.call(&rfkill::peer_address(), "Ping", &[]).await {
            Ok(_) => {}
            Err(BusError::ServiceUnknown(service)) => {
                debug!(%service, "rfkill manager not activatable");
            }
            Err(err) => {
                debug!(error = %err, "rfkill manager activation attempt failed");
            }
        }
    }

    if bus.owns_name(rfkill::SERVICE).await {
        info!(backend = %BackendKind::Rfkill, "selected killswitch backend");
        return Ok(BackendKind::Rfkill);
    }
    if bus.owns_name(hal::SERVICE).await {
        info!(backend = %BackendKind::Hal, "selected killswitch backend");
        return Ok(BackendKind::Hal);
    }

    warn!("no killswitch backend owns a name on the system bus");
    Err(KillswitchError::NoBackendAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use system_bus::LocalBus;

    #[tokio::test]
    async fn prefers_rfkill_when_both_backends_are_owned() {
        let bus = LocalBus::new();
        bus.add_owned_name(rfkill::SERVICE);
        bus.add_owned_name(hal::SERVICE);

        let backend = select_backend(&bus).await.unwrap();
        assert_eq!(backend, BackendKind::Rfkill);
    }

    #[tokio::test]
    async fn activates_rfkill_on_contact() {
        let bus = LocalBus::new();
        bus.add_activatable_name(rfkill::SERVICE);
        bus.add_owned_name(hal::SERVICE);

        let backend = select_backend(&bus).await.unwrap();
        assert_eq!(backend, BackendKind::Rfkill);
        assert!(bus.owns_name(rfkill::SERVICE).await);
    }

    #[tokio::test]
    async fn falls_back_to_hal_when_rfkill_is_absent() {
        let bus = LocalBus::new();
        bus.add_owned_name(hal::SERVICE);

        let backend = select_backend(&bus).await.unwrap();
        assert_eq!(backend, BackendKind::Hal);
    }

    #[tokio::test]
    async fn fails_when_no_backend_is_owned() {
        let bus = LocalBus::new();
        let err = select_backend(&bus).await.unwrap_err();
        assert!(matches!(err, KillswitchError::NoBackendAvailable));
    }
}
