//! Raw packet layout and unit scaling.
//!
//! The 28-byte packet layout is a contract with the transport collaborator
//! and must be preserved exactly for interoperability:
//!
//! ```text
//! [0-3]   : Timestamp (u32 little-endian, milliseconds)
//! [4-5]   : Sequence counter (u16 little-endian)
//! [6-11]  : Orientation X/Y/Z (3 x i16, axis-angle components)
//! [12-17] : Accel X/Y/Z (3 x i16)
//! [18-23] : Gyro X/Y/Z (3 x i16)
//! [24]    : Touch X (u8, circular pad - corner values never occur)
//! [25]    : Touch Y (u8)
//! [26]    : Button byte
//!           bit 0: Touch
//!           bit 1: Main
//!           bit 2: App
//!           bit 3: Home
//!           bit 4: Volume Minus
//!           bit 5: Volume Plus
//! [27]    : Reserved
//! ```

use crate::error::BridgeError;
use glam::Vec3;

/// Size of a sensor data packet in bytes.
pub const PACKET_LEN: usize = 28;

const OFF_TIMESTAMP: usize = 0;
const OFF_SEQUENCE: usize = 4;
const OFF_ORIENTATION: usize = 6;
const OFF_ACCEL: usize = 12;
const OFF_GYRO: usize = 18;
const OFF_TOUCH: usize = 24;
const OFF_BUTTONS: usize = 26;

/// Per-channel scale constants, raw sensor counts to physical units.
pub mod scale {
    use std::f32::consts::PI;

    /// Orientation axis-angle components, 12-bit raw to radians.
    pub const ORIENTATION: f32 = 2.0 * PI / 4095.0;
    /// Accelerometer, +/-8 g over 12 bits, to m/s^2.
    pub const ACCEL: f32 = 8.0 * 9.8 / 4095.0;
    /// Gyroscope, to rad/s.
    pub const GYRO: f32 = 2048.0 / 180.0 * PI / 4095.0;
}

/// An immutable raw sensor packet as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    bytes: [u8; PACKET_LEN],
}

impl RawPacket {
    /// Validate length and take ownership of a transport buffer. The
    /// transport is expected to reject malformed buffers before this point;
    /// if it does not, the error is surfaced here instead of producing
    /// undefined sensor values.
    pub fn from_bytes(data: &[u8]) -> Result<Self, BridgeError> {
        if data.len() != PACKET_LEN {
            return Err(BridgeError::InvalidPacket {
                len: data.len(),
                expected: PACKET_LEN,
            });
        }
        let mut bytes = [0u8; PACKET_LEN];
        bytes.copy_from_slice(data);
        Ok(Self { bytes })
    }

    pub fn timestamp_ms(&self) -> u32 {
        u32::from_le_bytes([
            self.bytes[OFF_TIMESTAMP],
            self.bytes[OFF_TIMESTAMP + 1],
            self.bytes[OFF_TIMESTAMP + 2],
            self.bytes[OFF_TIMESTAMP + 3],
        ])
    }

    pub fn sequence(&self) -> u16 {
        u16::from_le_bytes([self.bytes[OFF_SEQUENCE], self.bytes[OFF_SEQUENCE + 1]])
    }

    fn axes(&self, offset: usize) -> [i16; 3] {
        let mut out = [0i16; 3];
        for (i, v) in out.iter_mut().enumerate() {
            *v = i16::from_le_bytes([self.bytes[offset + i * 2], self.bytes[offset + i * 2 + 1]]);
        }
        out
    }

    pub fn raw_orientation(&self) -> [i16; 3] {
        self.axes(OFF_ORIENTATION)
    }

    pub fn raw_accel(&self) -> [i16; 3] {
        self.axes(OFF_ACCEL)
    }

    pub fn raw_gyro(&self) -> [i16; 3] {
        self.axes(OFF_GYRO)
    }

    pub fn touch(&self) -> (u8, u8) {
        (self.bytes[OFF_TOUCH], self.bytes[OFF_TOUCH + 1])
    }

    pub fn buttons(&self) -> u8 {
        self.bytes[OFF_BUTTONS]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex dump of the packet with a configurable separator between bytes.
    pub fn to_hex(&self, separator: &str) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Builder for raw packets, used by simulated transports and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketBuilder {
    pub timestamp_ms: u32,
    pub sequence: u16,
    pub orientation: [i16; 3],
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub touch: (u8, u8),
    pub buttons: u8,
}

impl PacketBuilder {
    pub fn buttons(mut self, mask: u8) -> Self {
        self.buttons = mask;
        self
    }

    pub fn orientation(mut self, x: i16, y: i16, z: i16) -> Self {
        self.orientation = [x, y, z];
        self
    }

    pub fn accel(mut self, x: i16, y: i16, z: i16) -> Self {
        self.accel = [x, y, z];
        self
    }

    pub fn gyro(mut self, x: i16, y: i16, z: i16) -> Self {
        self.gyro = [x, y, z];
        self
    }

    pub fn sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn build(&self) -> RawPacket {
        let mut bytes = [0u8; PACKET_LEN];
        bytes[OFF_TIMESTAMP..OFF_TIMESTAMP + 4].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        bytes[OFF_SEQUENCE..OFF_SEQUENCE + 2].copy_from_slice(&self.sequence.to_le_bytes());
        for (i, v) in self.orientation.iter().enumerate() {
            bytes[OFF_ORIENTATION + i * 2..OFF_ORIENTATION + i * 2 + 2]
                .copy_from_slice(&v.to_le_bytes());
        }
        for (i, v) in self.accel.iter().enumerate() {
            bytes[OFF_ACCEL + i * 2..OFF_ACCEL + i * 2 + 2].copy_from_slice(&v.to_le_bytes());
        }
        for (i, v) in self.gyro.iter().enumerate() {
            bytes[OFF_GYRO + i * 2..OFF_GYRO + i * 2 + 2].copy_from_slice(&v.to_le_bytes());
        }
        bytes[OFF_TOUCH] = self.touch.0;
        bytes[OFF_TOUCH + 1] = self.touch.1;
        bytes[OFF_BUTTONS] = self.buttons;
        RawPacket { bytes }
    }
}

/// Sensor values of one packet in physical units. A pure function of the
/// packet bytes and the constants in [`scale`]; recomputed every packet, no
/// hidden accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScaledSample {
    /// Axis-angle orientation components, radians.
    pub orientation: Vec3,
    /// Acceleration, m/s^2.
    pub acceleration: Vec3,
    /// Angular velocity, rad/s.
    pub gyro: Vec3,
    /// Touch coordinates, raw 0-255 circular domain.
    pub touch: (u8, u8),
    /// Packed button levels.
    pub buttons: u8,
    pub timestamp_ms: u32,
    pub sequence: u16,
}

fn scale_axes(raw: [i16; 3], factor: f32) -> Vec3 {
    Vec3::new(
        raw[0] as f32 * factor,
        raw[1] as f32 * factor,
        raw[2] as f32 * factor,
    )
}

/// Convert a raw packet to physical units.
pub fn scale_packet(packet: &RawPacket) -> ScaledSample {
    ScaledSample {
        orientation: scale_axes(packet.raw_orientation(), scale::ORIENTATION),
        acceleration: scale_axes(packet.raw_accel(), scale::ACCEL),
        gyro: scale_axes(packet.raw_gyro(), scale::GYRO),
        touch: packet.touch(),
        buttons: packet.buttons(),
        timestamp_ms: packet.timestamp_ms(),
        sequence: packet.sequence(),
    }
}
