//! Unified killswitch management over the system bus.
//!
//! Responsibilities:
//! - probing which backend service currently drives the system's radio
//!   killswitches and picking exactly one
//! - keeping a live registry of killswitch devices, fed by backend
//!   add/remove/change notifications
//! - presenting one uniform device model (id, name, type, tri-state power)
//!   that hides the backends' protocol and polarity differences
//! - best-effort bulk enable/disable across every known device
//!
//! ```no_run
//! # async fn demo() -> Result<(), killswitch::KillswitchError> {
//! use std::sync::Arc;
//! use system_bus::{LocalBus, SystemBus};
//!
//! let bus: Arc<dyn SystemBus> = Arc::new(LocalBus::new());
//! let manager = killswitch::KillswitchManager::connect(bus).await?;
//! for ks in manager.get_killswitches() {
//!     println!("{}: {} ({})", ks.id(), ks.name(), ks.switch_type());
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
pub mod error;
pub mod manager;
pub mod probe;
mod registry;
pub mod switch;
pub mod types;

pub use error::{KillswitchError, SwitchResult};
pub use manager::KillswitchManager;
pub use probe::{select_backend, BackendKind};
pub use switch::Killswitch;
pub use types::{SwitchId, SwitchState, SwitchType};
