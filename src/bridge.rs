//! Bridge facade - the single integration point for consumers.
//!
//! Owns one instance of every domain component and drives them from
//! transport signals once per application tick. Consumers read state through
//! the synchronous accessors and drain the event channel handed out by
//! [`ControllerBridge::new`].

use crate::domain::buttons::{ButtonEdgeDetector, PacketHistory};
use crate::domain::connection::ConnectionStateMachine;
use crate::domain::models::{BridgeEvent, ButtonId, ConnectionState, PacketRateCounter};
use crate::domain::orientation::{CalibrationController, OrientationEngine};
use crate::domain::packet::{scale_packet, RawPacket, ScaledSample};
use crate::domain::settings::Settings;
use crate::error::BridgeError;
use crate::transport::{DeviceDescriptor, Transport};
use glam::Quat;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ControllerBridge {
    transport: Box<dyn Transport>,

    machine: ConnectionStateMachine,
    engine: OrientationEngine,
    calibration: CalibrationController,
    buttons: ButtonEdgeDetector,
    history: PacketHistory,
    rate: PacketRateCounter,

    latest_sample: Option<ScaledSample>,
    hold_delay: Duration,
    history_separator: String,

    /// Set on the first scan/connect cycle; all reads and calibration
    /// operations are rejected until then.
    initialized: bool,
    device_selected: bool,

    events_tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ControllerBridge {
    /// Build the bridge around a transport. Returns the receiving half of
    /// the event channel; the consumer drains it each tick with `try_recv`.
    pub fn new(
        mut transport: Box<dyn Transport>,
        settings: &Settings,
    ) -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        apply_uuid_override(settings.ble_service_uuid.as_str(), |uuid| {
            transport.set_service_identifier(uuid)
        });
        apply_uuid_override(settings.ble_data_char_uuid.as_str(), |uuid| {
            transport.set_characteristic_identifier(uuid)
        });

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let bridge = Self {
            transport,
            machine: ConnectionStateMachine::new(),
            engine: OrientationEngine::new(),
            calibration: CalibrationController::new(),
            buttons: ButtonEdgeDetector::new(),
            history: PacketHistory::new(settings.packet_history_depth),
            rate: PacketRateCounter::new(
                Duration::from_secs(settings.rate_window_secs),
                Instant::now(),
            ),
            latest_sample: None,
            hold_delay: Duration::from_millis(settings.calibration_hold_ms),
            history_separator: settings.history_separator.clone(),
            initialized: false,
            device_selected: false,
            events_tx,
        };
        (bridge, events_rx)
    }

    // --- lifecycle -------------------------------------------------------

    /// Start a scan/connect cycle. With `auto_connect` the transport pairs
    /// with the first matching device and the machine goes straight to
    /// `Connecting`; otherwise it scans and waits for a device selection.
    pub fn start_scan(&mut self, auto_connect: bool) {
        self.initialized = true;
        self.transport.start_scan(auto_connect);
        let next = if auto_connect {
            self.device_selected = true;
            ConnectionState::Connecting
        } else {
            ConnectionState::Scanning
        };
        self.enter(next);
    }

    pub fn discovered_devices(&self) -> Result<Vec<DeviceDescriptor>, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.transport.discovered_devices())
    }

    pub fn select_device(&mut self, device: &DeviceDescriptor) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        self.transport.select_device(device);
        self.device_selected = true;
        Ok(())
    }

    /// Begin connecting to the previously selected device.
    pub fn connect(&mut self) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        if !self.device_selected {
            return Err(BridgeError::NoDeviceSelected);
        }
        self.enter(ConnectionState::Connecting);
        Ok(())
    }

    /// Tear the connection down: button shadows are cleared (no synthetic
    /// Up events) and the machine returns to `Inactive`. A pending
    /// calibration hold is deliberately left alone.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        self.buttons.reset();
        self.device_selected = false;
        self.enter(ConnectionState::Inactive);
    }

    /// Drive one application tick. Never blocks.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Tick against an explicit clock; the production path is [`tick`].
    pub fn tick_at(&mut self, now: Instant) {
        match self.machine.state() {
            ConnectionState::Scanning => {
                if self.transport.is_scan_complete() {
                    self.enter(ConnectionState::ScanComplete);
                }
            }
            ConnectionState::Connecting => {
                // Observed flow goes straight to Active once services are up.
                if self.transport.is_service_initialized() {
                    self.enter(ConnectionState::Active);
                }
            }
            ConnectionState::Active => self.process_packet(now),
            ConnectionState::Inactive
            | ConnectionState::ScanComplete
            | ConnectionState::ConnectionComplete => {}
        }

        if self.calibration.poll(now) {
            self.finish_calibration();
        }
    }

    fn process_packet(&mut self, now: Instant) {
        let Some(packet) = self.transport.latest_raw_packet() else {
            return;
        };

        let sample = scale_packet(&packet);
        self.engine.update(sample.orientation);
        for event in self.buttons.sample(sample.buttons) {
            self.emit(event);
        }
        self.history.push(packet);
        self.rate.record(now);
        self.latest_sample = Some(sample);
    }

    // --- calibration -----------------------------------------------------

    /// Start a hold-to-calibrate session with the configured delay.
    pub fn begin_calibration(&mut self) -> Result<(), BridgeError> {
        self.begin_calibration_with(self.hold_delay)
    }

    /// Start a hold-to-calibrate session. A no-op while one is pending.
    pub fn begin_calibration_with(&mut self, delay: Duration) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        if self.calibration.begin(delay, Instant::now()) {
            self.emit(BridgeEvent::CalibrationBegan);
        }
        Ok(())
    }

    /// Abort a pending hold; the previous offset stays in effect.
    pub fn cancel_calibration(&mut self) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        if self.calibration.cancel() {
            self.emit(BridgeEvent::CalibrationCancelled);
        }
        Ok(())
    }

    /// Capture the calibration offset immediately, skipping the hold.
    pub fn calibrate_now(&mut self) -> Result<(), BridgeError> {
        self.ensure_initialized()?;
        self.finish_calibration();
        Ok(())
    }

    fn finish_calibration(&mut self) {
        self.calibration.complete(&mut self.engine);
        self.emit(BridgeEvent::CalibrationComplete);
    }

    // --- accessors -------------------------------------------------------

    pub fn connection_state(&self) -> Result<ConnectionState, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.machine.state())
    }

    /// Controller pose in calibrated application space.
    pub fn orientation(&self) -> Result<Quat, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.engine.applied())
    }

    /// Latest decoded rotation before the calibration offset is applied.
    pub fn sensor_space_orientation(&self) -> Result<Quat, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.engine.sensor_space())
    }

    /// Latest scaled sensor values, if any packet arrived yet.
    pub fn latest_sample(&self) -> Result<Option<ScaledSample>, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.latest_sample)
    }

    pub fn is_button_down(&self, id: ButtonId) -> Result<bool, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.buttons.is_down(id))
    }

    /// Retained raw packets, oldest first.
    pub fn packet_history(&self) -> Result<Vec<RawPacket>, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.history.packets().cloned().collect())
    }

    /// Retained raw packets as hex lines with the configured separator.
    pub fn formatted_history(&self) -> Result<String, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.history.formatted(&self.history_separator))
    }

    /// Measured device packet rate, packets per second over the last closed
    /// window.
    pub fn packet_rate(&self) -> Result<f32, BridgeError> {
        self.ensure_initialized()?;
        Ok(self.rate.rate())
    }

    pub fn set_service_identifier(&mut self, uuid: Uuid) {
        self.transport.set_service_identifier(uuid);
    }

    pub fn set_characteristic_identifier(&mut self, uuid: Uuid) {
        self.transport.set_characteristic_identifier(uuid);
    }

    // --- internals -------------------------------------------------------

    fn ensure_initialized(&self) -> Result<(), BridgeError> {
        if self.initialized {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }

    fn enter(&mut self, next: ConnectionState) {
        if let Some(entered) = self.machine.enter(next) {
            self.emit(BridgeEvent::Connection(entered));
        }
    }

    fn emit(&self, event: BridgeEvent) {
        debug!(?event, "bridge event");
        if self.events_tx.send(event).is_err() {
            warn!("event receiver dropped, event discarded");
        }
    }
}

fn apply_uuid_override(value: &str, apply: impl FnOnce(Uuid)) {
    match Uuid::parse_str(value) {
        Ok(uuid) => apply(uuid),
        Err(e) => warn!(value, error = %e, "ignoring malformed UUID override"),
    }
}
