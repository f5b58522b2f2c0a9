use system_bus::BusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KillswitchError {
    #[error("no killswitch backend available on the system bus")]
    NoBackendAvailable,
    #[error("backend service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("unexpected backend reply: {0}")]
    Remote(String),
    #[error("state {0} is not a valid request (expected 0 or 1)")]
    InvalidStateRequest(i32),
    #[error("device {0} offers no usable name")]
    MissingIdentity(String),
}

impl From<BusError> for KillswitchError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::ServiceUnknown(service) | BusError::ServiceUnavailable(service) => {
                Self::ServiceUnavailable(service)
            }
            BusError::CallFailed { method, reason } => {
                Self::Remote(format!("{method}: {reason}"))
            }
        }
    }
}

pub type SwitchResult<T> = Result<T, KillswitchError>;
