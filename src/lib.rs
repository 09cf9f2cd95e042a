//! Motion-controller bridge core.
//!
//! Turns the raw packet stream of a handheld BLE motion controller into an
//! application-consumable model: connection lifecycle, scaled sensor vectors,
//! edge-triggered button events, and a user-calibrated orientation.
//!
//! The radio stack itself is an external collaborator behind the
//! [`transport::Transport`] trait; rendering and UI live entirely outside this
//! crate. The consumer polls [`bridge::ControllerBridge::tick`] once per
//! application frame and drains the event channel returned at construction.

pub mod bridge;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod transport;

pub use bridge::ControllerBridge;
pub use domain::models::{BridgeEvent, ButtonId, ConnectionState};
pub use error::BridgeError;
pub use transport::{DeviceDescriptor, Transport};
