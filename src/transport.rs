//! Boundary with the radio stack.
//!
//! The bridge never talks to a BLE API directly; it consumes connection
//! signals and raw packets through the [`Transport`] trait. Implementations
//! own all synchronization with their capture thread - every method here is
//! non-blocking and called only from the tick thread.

use crate::domain::packet::RawPacket;
use std::collections::VecDeque;
use uuid::Uuid;

/// Controller BLE service UUID ("OculusThreemote" in ASCII), used unless a
/// settings override is supplied.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x4f63756c_7573_2054_6872_65656d6f7465);

/// Characteristic the sensor packet stream is notified on.
pub const DATA_CHAR_UUID: Uuid = Uuid::from_u128(0xc8c51726_81bc_483b_a052_f7a14ea3d281);

/// A device reported by the transport's scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub address: u64,
    pub name: String,
    pub rssi: Option<i16>,
}

/// Signals and data the bridge consumes from the radio stack.
///
/// `latest_raw_packet` is the hand-off boundary: the transport delivers
/// packets from its capture thread into a thread-safe latest-value slot and
/// the bridge drains it once per tick. Lost connections and scan timeouts
/// are reported by the transport as a disconnect, never as errors through
/// the bridge.
pub trait Transport {
    fn start_scan(&mut self, auto_connect: bool);
    fn is_scan_complete(&self) -> bool;
    fn is_service_initialized(&self) -> bool;
    /// Most recent undelivered packet, if any. Never blocks.
    fn latest_raw_packet(&mut self) -> Option<RawPacket>;
    fn disconnect(&mut self);
    fn discovered_devices(&self) -> Vec<DeviceDescriptor>;
    fn select_device(&mut self, device: &DeviceDescriptor);

    /// Override the controller service UUID before scanning.
    fn set_service_identifier(&mut self, _uuid: Uuid) {}
    /// Override the data characteristic UUID before scanning.
    fn set_characteristic_identifier(&mut self, _uuid: Uuid) {}
}

/// Scripted in-process transport for tests and the demo driver. Signals are
/// flipped by the script; packets are queued and handed out one per tick.
#[derive(Debug, Default)]
pub struct SimulatedTransport {
    scan_complete: bool,
    service_ready: bool,
    devices: Vec<DeviceDescriptor>,
    selected: Option<DeviceDescriptor>,
    packets: VecDeque<RawPacket>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script: add a device the scanner will report.
    pub fn add_device(&mut self, device: DeviceDescriptor) {
        self.devices.push(device);
    }

    /// Script: mark the scan finished.
    pub fn finish_scan(&mut self) {
        self.scan_complete = true;
    }

    /// Script: mark GATT services initialized, packets may flow.
    pub fn finish_service_init(&mut self) {
        self.service_ready = true;
    }

    /// Script: enqueue a packet for delivery.
    pub fn push_packet(&mut self, packet: RawPacket) {
        self.packets.push_back(packet);
    }

    pub fn selected_device(&self) -> Option<&DeviceDescriptor> {
        self.selected.as_ref()
    }
}

impl Transport for SimulatedTransport {
    fn start_scan(&mut self, auto_connect: bool) {
        if auto_connect {
            // Auto-connect picks the first known device as soon as it shows up.
            self.selected = self.devices.first().cloned();
        }
    }

    fn is_scan_complete(&self) -> bool {
        self.scan_complete
    }

    fn is_service_initialized(&self) -> bool {
        self.service_ready
    }

    fn latest_raw_packet(&mut self) -> Option<RawPacket> {
        if !self.service_ready {
            return None;
        }
        self.packets.pop_front()
    }

    fn disconnect(&mut self) {
        self.scan_complete = false;
        self.service_ready = false;
        self.selected = None;
        self.packets.clear();
    }

    fn discovered_devices(&self) -> Vec<DeviceDescriptor> {
        self.devices.clone()
    }

    fn select_device(&mut self, device: &DeviceDescriptor) {
        self.selected = Some(device.clone());
    }
}
