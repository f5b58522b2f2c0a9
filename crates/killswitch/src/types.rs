use std::fmt;

/// Power state of a killswitch.
///
/// The wire encoding follows the legacy backend: 0 soft-off, 1 on,
/// 2 hard-off. A hard block comes from a physical switch and cannot be
/// cleared by software.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    SoftBlocked,
    Unblocked,
    HardBlocked,
}

impl SwitchState {
    pub fn from_power_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::SoftBlocked),
            1 => Some(Self::Unblocked),
            2 => Some(Self::HardBlocked),
            _ => None,
        }
    }

    pub fn as_power_code(self) -> i32 {
        match self {
            Self::SoftBlocked => 0,
            Self::Unblocked => 1,
            Self::HardBlocked => 2,
        }
    }

    /// Reconcile the centralized backend's block flags. A hard block wins
    /// over a soft block; neither flag means the radio is operational.
    pub fn from_block_flags(soft: bool, hard: bool) -> Self {
        if hard {
            Self::HardBlocked
        } else if soft {
            Self::SoftBlocked
        } else {
            Self::Unblocked
        }
    }

    pub fn is_blocked(self) -> bool {
        !matches!(self, Self::Unblocked)
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SoftBlocked => "soft-blocked",
            Self::Unblocked => "on",
            Self::HardBlocked => "hard-blocked",
        };
        f.write_str(label)
    }
}

/// Radio category of a killswitch device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchType {
    All,
    Wlan,
    Bluetooth,
    Uwb,
    Wimax,
    Wwan,
    Gps,
    Fm,
    Unknown,
}

impl SwitchType {
    /// Decode the centralized backend's numeric type code.
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::All,
            1 => Self::Wlan,
            2 => Self::Bluetooth,
            3 => Self::Uwb,
            4 => Self::Wimax,
            5 => Self::Wwan,
            6 => Self::Gps,
            7 => Self::Fm,
            _ => Self::Unknown,
        }
    }

    /// Decode the legacy backend's type label. An absent or empty label is
    /// tolerated and maps to [`SwitchType::Unknown`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "all" => Self::All,
            "wlan" => Self::Wlan,
            "bluetooth" => Self::Bluetooth,
            "uwb" => Self::Uwb,
            "wimax" => Self::Wimax,
            "wwan" => Self::Wwan,
            "gps" => Self::Gps,
            "fm" => Self::Fm,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Wlan => "wlan",
            Self::Bluetooth => "bluetooth",
            Self::Uwb => "uwb",
            Self::Wimax => "wimax",
            Self::Wwan => "wwan",
            Self::Gps => "gps",
            Self::Fm => "fm",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SwitchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-specific device identity: the legacy backend addresses devices
/// by object path, the centralized one by numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SwitchId {
    Udi(String),
    Index(u64),
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udi(udi) => f.write_str(udi),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_follow_the_fixed_table() {
        let expected = [
            (0, SwitchType::All),
            (1, SwitchType::Wlan),
            (2, SwitchType::Bluetooth),
            (3, SwitchType::Uwb),
            (4, SwitchType::Wimax),
            (5, SwitchType::Wwan),
            (6, SwitchType::Gps),
            (7, SwitchType::Fm),
        ];
        for (code, ty) in expected {
            assert_eq!(SwitchType::from_code(code), ty);
        }
        assert_eq!(SwitchType::from_code(8), SwitchType::Unknown);
        assert_eq!(SwitchType::from_code(u64::MAX), SwitchType::Unknown);
    }

    #[test]
    fn type_labels_round_trip() {
        for label in ["all", "wlan", "bluetooth", "uwb", "wimax", "wwan", "gps", "fm"] {
            assert_eq!(SwitchType::from_label(label).as_str(), label);
        }
        assert_eq!(SwitchType::from_label(""), SwitchType::Unknown);
        assert_eq!(SwitchType::from_label("zigbee"), SwitchType::Unknown);
    }

    #[test]
    fn block_flags_reconcile_to_tri_state() {
        assert_eq!(
            SwitchState::from_block_flags(false, false),
            SwitchState::Unblocked
        );
        assert_eq!(
            SwitchState::from_block_flags(true, false),
            SwitchState::SoftBlocked
        );
        // A hard block wins regardless of the soft flag.
        assert_eq!(
            SwitchState::from_block_flags(false, true),
            SwitchState::HardBlocked
        );
        assert_eq!(
            SwitchState::from_block_flags(true, true),
            SwitchState::HardBlocked
        );
        assert!(!SwitchState::Unblocked.is_blocked());
        assert!(SwitchState::SoftBlocked.is_blocked());
        assert!(SwitchState::HardBlocked.is_blocked());
    }

    #[test]
    fn power_codes_round_trip() {
        for state in [
            SwitchState::SoftBlocked,
            SwitchState::Unblocked,
            SwitchState::HardBlocked,
        ] {
            assert_eq!(
                SwitchState::from_power_code(state.as_power_code() as i64),
                Some(state)
            );
        }
        assert_eq!(SwitchState::from_power_code(3), None);
        assert_eq!(SwitchState::from_power_code(-1), None);
    }
}
