//! Button edge detection and the bounded raw-packet history.

use super::models::{BridgeEvent, ButtonId};
use super::packet::RawPacket;
use std::collections::VecDeque;
use tracing::debug;

/// Converts each button's instantaneous down/up level into one-shot
/// "became down" / "became up" events. Sustained holds emit nothing after
/// the first Down.
#[derive(Debug, Default)]
pub struct ButtonEdgeDetector {
    /// Last sampled level per button, same bit layout as the packet byte.
    shadow: u8,
}

impl ButtonEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of one button as of the last sample.
    pub fn is_down(&self, id: ButtonId) -> bool {
        self.shadow & id.mask() != 0
    }

    /// Compare a packed button byte against the shadows and return one event
    /// per level transition, in [`ButtonId::ALL`] order.
    pub fn sample(&mut self, mask: u8) -> Vec<BridgeEvent> {
        let changed = mask ^ self.shadow;
        if changed == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        for id in ButtonId::ALL {
            if changed & id.mask() == 0 {
                continue;
            }
            if mask & id.mask() != 0 {
                events.push(BridgeEvent::ButtonDown(id));
            } else {
                events.push(BridgeEvent::ButtonUp(id));
            }
        }
        self.shadow = mask & 0b0011_1111;
        debug!(mask, "button levels changed");
        events
    }

    /// Clear all shadows without emitting synthetic Up events.
    pub fn reset(&mut self) {
        self.shadow = 0;
    }
}

/// Ring buffer of the last N raw packets, kept for diagnostics. A bound of
/// zero retains only the most recent packet.
#[derive(Debug)]
pub struct PacketHistory {
    capacity: usize,
    packets: VecDeque<RawPacket>,
}

impl PacketHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            packets: VecDeque::new(),
        }
    }

    /// Insert a packet, evicting the oldest entry once the bound is reached.
    pub fn push(&mut self, packet: RawPacket) {
        while self.packets.len() >= self.capacity {
            self.packets.pop_front();
        }
        self.packets.push_back(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Retained packets, oldest first.
    pub fn packets(&self) -> impl Iterator<Item = &RawPacket> {
        self.packets.iter()
    }

    /// All retained packets as hex lines, bytes joined by `separator`.
    pub fn formatted(&self, separator: &str) -> String {
        self.packets
            .iter()
            .map(|p| p.to_hex(separator))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::packet::PacketBuilder;

    #[test]
    fn down_then_up_emits_one_event_each() {
        let mut detector = ButtonEdgeDetector::new();

        let events = detector.sample(ButtonId::Main.mask());
        assert_eq!(events, vec![BridgeEvent::ButtonDown(ButtonId::Main)]);
        assert!(detector.is_down(ButtonId::Main));

        // Sustained hold is silent.
        assert!(detector.sample(ButtonId::Main.mask()).is_empty());
        assert!(detector.sample(ButtonId::Main.mask()).is_empty());

        let events = detector.sample(0);
        assert_eq!(events, vec![BridgeEvent::ButtonUp(ButtonId::Main)]);
        assert!(!detector.is_down(ButtonId::Main));
    }

    #[test]
    fn simultaneous_transitions_each_emit() {
        let mut detector = ButtonEdgeDetector::new();
        detector.sample(ButtonId::Touch.mask() | ButtonId::Home.mask());

        let events = detector.sample(ButtonId::VolPlus.mask());
        assert_eq!(events.len(), 3);
        assert!(events.contains(&BridgeEvent::ButtonUp(ButtonId::Touch)));
        assert!(events.contains(&BridgeEvent::ButtonUp(ButtonId::Home)));
        assert!(events.contains(&BridgeEvent::ButtonDown(ButtonId::VolPlus)));
    }

    #[test]
    fn down_events_match_rising_transitions() {
        let masks = [0u8, 1, 1, 0, 1, 1, 1, 0, 0, 1];
        let mut detector = ButtonEdgeDetector::new();
        let mut downs = 0;
        let mut ups = 0;
        for mask in masks {
            for event in detector.sample(mask) {
                match event {
                    BridgeEvent::ButtonDown(_) => downs += 1,
                    BridgeEvent::ButtonUp(_) => ups += 1,
                    _ => unreachable!(),
                }
            }
        }
        assert_eq!(downs, 3);
        assert_eq!(ups, 2);
    }

    #[test]
    fn reset_emits_nothing_and_clears_levels() {
        let mut detector = ButtonEdgeDetector::new();
        detector.sample(ButtonId::App.mask());
        detector.reset();
        assert!(!detector.is_down(ButtonId::App));
        // After a reset the next press is a fresh Down, not a repeat.
        let events = detector.sample(ButtonId::App.mask());
        assert_eq!(events, vec![BridgeEvent::ButtonDown(ButtonId::App)]);
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut history = PacketHistory::new(3);
        for seq in 0..5u16 {
            history.push(PacketBuilder::default().sequence(seq).build());
        }
        let sequences: Vec<u16> = history.packets().map(|p| p.sequence()).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
    }

    #[test]
    fn zero_capacity_keeps_most_recent_only() {
        let mut history = PacketHistory::new(0);
        for seq in 0..4u16 {
            history.push(PacketBuilder::default().sequence(seq).build());
        }
        let sequences: Vec<u16> = history.packets().map(|p| p.sequence()).collect();
        assert_eq!(sequences, vec![3]);
    }

    #[test]
    fn formatted_history_is_one_line_per_packet() {
        let mut history = PacketHistory::new(4);
        history.push(PacketBuilder::default().build());
        history.push(PacketBuilder::default().buttons(0x3F).build());
        let dump = history.formatted(" ");
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.lines().nth(1).unwrap().contains("3F"));
    }
}
