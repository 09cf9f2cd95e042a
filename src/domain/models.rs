use std::time::{Duration, Instant};

/// Connection lifecycle of the bridge. Exactly one value is live at a time,
/// owned by the [`super::connection::ConnectionStateMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Inactive,
    Scanning,
    ScanComplete,
    Connecting,
    ConnectionComplete,
    Active,
}

/// The six controller buttons. Discriminants double as bit positions in the
/// packed button byte of a raw packet (transport contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonId {
    Touch = 0,
    Main = 1,
    App = 2,
    Home = 3,
    VolMinus = 4,
    VolPlus = 5,
}

impl ButtonId {
    pub const ALL: [ButtonId; 6] = [
        ButtonId::Touch,
        ButtonId::Main,
        ButtonId::App,
        ButtonId::Home,
        ButtonId::VolMinus,
        ButtonId::VolPlus,
    ];

    /// Bitmask of this button inside the packed button byte.
    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// One-shot notifications pushed from the bridge to its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEvent {
    /// The state machine entered a new connection state.
    Connection(ConnectionState),
    ButtonDown(ButtonId),
    ButtonUp(ButtonId),
    CalibrationBegan,
    CalibrationCancelled,
    CalibrationComplete,
}

/// Packet throughput over fixed rolling windows, decoupled from the
/// consumer's frame rate. The reported rate is recomputed at each window
/// boundary, not continuously.
#[derive(Debug)]
pub struct PacketRateCounter {
    window: Duration,
    window_start: Instant,
    count: u32,
    rate: f32,
}

impl PacketRateCounter {
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            count: 0,
            rate: 0.0,
        }
    }

    /// Record one received packet.
    pub fn record(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= self.window {
            self.rate = self.count as f32 / self.window.as_secs_f32();
            self.count = 0;
            self.window_start = now;
        }
        self.count += 1;
    }

    /// Packets per second measured over the most recently closed window.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.count = 0;
        self.rate = 0.0;
    }
}
