//! Per-device facade. A [`Killswitch`] presents one uniform surface over
//! whichever backend discovered it; the backend choice is baked in at
//! construction and never re-dispatched.

use std::fmt;
use std::sync::Arc;

use system_bus::SystemBus;
use tracing::warn;

use crate::backend::{hal, rfkill};
use crate::error::{KillswitchError, SwitchResult};
use crate::types::{SwitchId, SwitchState, SwitchType};

enum Adapter {
    Hal { bus: Arc<dyn SystemBus>, udi: String },
    Rfkill { bus: Arc<dyn SystemBus>, index: u64 },
}

/// One radio killswitch. Identity is immutable after construction; state
/// is never cached and every read is a live backend query.
pub struct Killswitch {
    name: String,
    switch_type: SwitchType,
    adapter: Adapter,
}

impl Killswitch {
    pub(crate) fn hal(
        bus: Arc<dyn SystemBus>,
        udi: String,
        name: String,
        switch_type: SwitchType,
    ) -> Self {
        Self {
            name,
            switch_type,
            adapter: Adapter::Hal { bus, udi },
        }
    }

    pub(crate) fn rfkill(
        bus: Arc<dyn SystemBus>,
        index: u64,
        name: String,
        switch_type: SwitchType,
    ) -> Self {
        Self {
            name,
            switch_type,
            adapter: Adapter::Rfkill { bus, index },
        }
    }

    pub fn id(&self) -> SwitchId {
        match &self.adapter {
            Adapter::Hal { udi, .. } => SwitchId::Udi(udi.clone()),
            Adapter::Rfkill { index, .. } => SwitchId::Index(*index),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn switch_type(&self) -> SwitchType {
        self.switch_type
    }

    pub(crate) fn matches(&self, id: &SwitchId) -> bool {
        match (&self.adapter, id) {
            (Adapter::Hal { udi, .. }, SwitchId::Udi(other)) => udi == other,
            (Adapter::Rfkill { index, .. }, SwitchId::Index(other)) => index == other,
            _ => false,
        }
    }

    /// Current state, fetched live from the backend.
    pub async fn state(&self) -> SwitchResult<SwitchState> {
        match &self.adapter {
            Adapter::Hal { bus, udi } => hal::get_power(bus.as_ref(), udi).await,
            Adapter::Rfkill { bus, index } => rfkill::query_state(bus.as_ref(), *index).await,
        }
    }

    /// Request state 1 (enable) or 0 (disable). Any other value is logged
    /// and dropped without a bus call; a hard block cannot be cleared this
    /// way.
    pub async fn set_state(&self, state: i32) -> SwitchResult<()> {
        if state != 0 && state != 1 {
            let err = KillswitchError::InvalidStateRequest(state);
            warn!(switch = %self.id(), %err, "rejected state request");
            return Ok(());
        }
        match &self.adapter {
            Adapter::Hal { bus, udi } => hal::set_power(bus.as_ref(), udi, state).await,
            Adapter::Rfkill { bus, index } => {
                if state == 1 {
                    rfkill::unblock(bus.as_ref(), *index).await
                } else {
                    rfkill::block(bus.as_ref(), *index).await
                }
            }
        }
    }

    pub async fn is_enabled(&self) -> SwitchResult<bool> {
        Ok(self.state().await? == SwitchState::Unblocked)
    }
}

impl fmt::Display for Killswitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.switch_type)
    }
}

impl fmt::Debug for Killswitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Killswitch")
            .field("id", &self.id())
            .field("name", &self.name)
            .field("type", &self.switch_type)
            .finish()
    }
}
