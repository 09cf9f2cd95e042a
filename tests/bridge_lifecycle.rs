//! End-to-end tests driving the facade through a scripted transport.

use controller_bridge::domain::packet::{scale, PacketBuilder};
use controller_bridge::domain::settings::Settings;
use controller_bridge::transport::SimulatedTransport;
use controller_bridge::{
    BridgeEvent, ButtonId, ConnectionState, ControllerBridge, DeviceDescriptor,
};
use glam::Quat;
use std::time::Duration;
use tokio::sync::mpsc;

fn controller() -> DeviceDescriptor {
    DeviceDescriptor {
        address: 0xDE_AD_BE_EF,
        name: "Gear VR Controller".to_string(),
        rssi: Some(-55),
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<BridgeEvent>) -> Vec<BridgeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn manual_scan_select_connect_cycle() {
    let mut transport = SimulatedTransport::new();
    transport.add_device(controller());
    transport.finish_scan();
    transport.finish_service_init();

    let (mut bridge, mut rx) = ControllerBridge::new(Box::new(transport), &Settings::default());

    bridge.start_scan(false);
    bridge.tick();

    let devices = bridge.discovered_devices().unwrap();
    assert_eq!(devices, vec![controller()]);
    bridge.select_device(&devices[0]).unwrap();
    bridge.connect().unwrap();
    bridge.tick();

    assert_eq!(
        drain(&mut rx),
        vec![
            BridgeEvent::Connection(ConnectionState::Scanning),
            BridgeEvent::Connection(ConnectionState::ScanComplete),
            BridgeEvent::Connection(ConnectionState::Connecting),
            BridgeEvent::Connection(ConnectionState::Active),
        ]
    );
    assert_eq!(bridge.connection_state(), Ok(ConnectionState::Active));
}

#[test]
fn packets_drive_sensors_buttons_and_history() {
    let mut transport = SimulatedTransport::new();
    transport.add_device(controller());
    transport.finish_service_init();

    // Press Main for two samples, release, with full-scale accel on X.
    let masks = [0u8, 0b10, 0b10, 0];
    for (i, mask) in masks.iter().enumerate() {
        transport.push_packet(
            PacketBuilder::default()
                .sequence(i as u16)
                .accel(4095, 0, 0)
                .orientation(0, 0, 0)
                .buttons(*mask)
                .build(),
        );
    }

    let mut settings = Settings::default();
    settings.packet_history_depth = 3;
    let (mut bridge, mut rx) = ControllerBridge::new(Box::new(transport), &settings);

    bridge.start_scan(true);
    bridge.tick(); // Connecting -> Active
    for _ in 0..4 {
        bridge.tick();
    }

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            BridgeEvent::Connection(ConnectionState::Connecting),
            BridgeEvent::Connection(ConnectionState::Active),
            BridgeEvent::ButtonDown(ButtonId::Main),
            BridgeEvent::ButtonUp(ButtonId::Main),
        ]
    );

    // Zero orientation vector decodes to the identity rotation.
    assert_eq!(bridge.sensor_space_orientation(), Ok(Quat::IDENTITY));

    // Full-scale accel scales by the documented constant: 4095 * scale = 78.4.
    let sample = bridge.latest_sample().unwrap().unwrap();
    assert!((sample.acceleration.x - 4095.0 * scale::ACCEL).abs() < 1e-6);
    assert!((sample.acceleration.x - 78.4).abs() < 1e-4);

    // Four packets through a depth-3 ring: the oldest was evicted.
    let history = bridge.packet_history().unwrap();
    let sequences: Vec<u16> = history.iter().map(|p| p.sequence()).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[test]
fn timed_calibration_captures_offset_at_completion() {
    let mut transport = SimulatedTransport::new();
    transport.finish_service_init();
    // Quarter turn about Z in raw counts: 1024 * (2*pi/4095) ~ pi/2.
    transport.push_packet(PacketBuilder::default().orientation(0, 0, 1024).build());

    let (mut bridge, mut rx) = ControllerBridge::new(Box::new(transport), &Settings::default());
    bridge.start_scan(true);
    bridge.tick();
    bridge.tick();

    bridge
        .begin_calibration_with(Duration::from_millis(20))
        .unwrap();
    bridge.tick();
    // Hold not yet elapsed: Began only, no Complete.
    assert_eq!(
        drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, BridgeEvent::CalibrationBegan | BridgeEvent::CalibrationComplete))
            .collect::<Vec<_>>(),
        vec![BridgeEvent::CalibrationBegan]
    );

    std::thread::sleep(Duration::from_millis(30));
    bridge.tick();
    assert_eq!(drain(&mut rx), vec![BridgeEvent::CalibrationComplete]);

    // Offset is the inverse of the sensor rotation captured at completion,
    // so the calibrated pose at that orientation is the identity.
    let applied = bridge.orientation().unwrap();
    assert!(applied.abs_diff_eq(Quat::IDENTITY, 1e-5));

    // Exactly one completion per begin.
    bridge.tick();
    assert!(drain(&mut rx).is_empty());
}
