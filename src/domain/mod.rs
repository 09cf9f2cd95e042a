//! Domain logic for the controller bridge.
//!
//! - [`packet`] - raw packet layout and unit scaling
//! - [`orientation`] - sensor-space rotation and hold-to-calibrate protocol
//! - [`buttons`] - button edge detection and bounded packet history
//! - [`connection`] - connection lifecycle state machine
//! - [`models`] - shared enums, events, and the packet rate counter
//! - [`settings`] - persisted configuration

pub mod buttons;
pub mod connection;
pub mod models;
pub mod orientation;
pub mod packet;
pub mod settings;
