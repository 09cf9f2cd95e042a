use thiserror::Error;

/// Errors surfaced by the bridge. None of these are fatal; every one is
/// recovered by re-driving the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// An operation was attempted before a scan/connect cycle was started.
    #[error("bridge not initialized; start a scan first")]
    NotInitialized,

    /// A buffer with an unexpected length reached the packet scaler.
    /// Logged and dropped; never affects the connection state.
    #[error("invalid packet: expected {expected} bytes, got {len}")]
    InvalidPacket { len: usize, expected: usize },

    /// Connect was requested with no device chosen.
    #[error("no device selected")]
    NoDeviceSelected,
}
