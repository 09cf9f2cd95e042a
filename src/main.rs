//! Demo driver: runs the bridge against a simulated transport and prints
//! the events a real consumer would react to.

use anyhow::Result;
use controller_bridge::domain::packet::PacketBuilder;
use controller_bridge::domain::settings::SettingsService;
use controller_bridge::infrastructure::logging;
use controller_bridge::transport::SimulatedTransport;
use controller_bridge::{ControllerBridge, DeviceDescriptor};
use std::time::Duration;
use tracing::info;

fn main() -> Result<()> {
    let settings_service = SettingsService::new()?;
    let _logging_guard = logging::init_logger(&settings_service.get().log_settings)?;

    info!("Starting controller bridge demo");

    let mut transport = SimulatedTransport::new();
    transport.add_device(DeviceDescriptor {
        address: 0x2C_BA_BA_C4_12_34,
        name: "Gear VR Controller".to_string(),
        rssi: Some(-48),
    });
    transport.finish_scan();
    transport.finish_service_init();

    // A short synthetic capture: a slow roll about Z, one Main press.
    for i in 0..120u16 {
        let z = (i as i32 * 12).min(4095) as i16;
        let buttons = if (30..60).contains(&i) { 0b0000_0010 } else { 0 };
        transport.push_packet(
            PacketBuilder {
                timestamp_ms: i as u32 * 16,
                sequence: i,
                ..Default::default()
            }
            .orientation(0, 0, z)
            .buttons(buttons)
            .build(),
        );
    }

    let (mut bridge, mut events) =
        ControllerBridge::new(Box::new(transport), settings_service.get());

    bridge.start_scan(true);
    bridge.begin_calibration_with(Duration::from_millis(500))?;

    for _ in 0..130 {
        bridge.tick();
        while let Ok(event) = events.try_recv() {
            println!("event: {:?}", event);
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    let orientation = bridge.orientation()?;
    println!("final orientation: {:?}", orientation);
    println!("packet rate: {:.1} pkt/s", bridge.packet_rate()?);
    if let Some(sample) = bridge.latest_sample()? {
        println!("last sample: seq={} accel={:?}", sample.sequence, sample.acceleration);
    }
    println!("history:\n{}", bridge.formatted_history()?);

    Ok(())
}
