//! Status enums for session state.

use serde::{Deserialize, Serialize};

/// Wallet connection status for one browser session.
///
/// Transitions: `Disconnected -> Connecting -> Connected`, or back to
/// `Disconnected` when the connection attempt fails. There is no explicit
/// disconnect; the session simply ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Returns `true` once an address has been resolved.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Human-readable label for templates and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
        assert!(!ConnectionStatus::default().is_connected());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ConnectionStatus::Connected).ok();
        assert_eq!(json.as_deref(), Some("\"connected\""));
    }
}
