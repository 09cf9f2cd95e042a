//! Sensor-space rotation decoding and the hold-to-calibrate protocol.

use glam::{Quat, Vec3};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Builds the instantaneous controller rotation from scaled orientation data
/// and applies the user's calibration offset.
///
/// The applied rotation drifts over time with sensor integration error;
/// consumers recalibrate periodically, this engine never corrects drift on
/// its own.
#[derive(Debug)]
pub struct OrientationEngine {
    sensor_space: Quat,
    offset: Quat,
    applied: Quat,
}

impl Default for OrientationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationEngine {
    pub fn new() -> Self {
        Self {
            sensor_space: Quat::IDENTITY,
            offset: Quat::IDENTITY,
            applied: Quat::IDENTITY,
        }
    }

    /// Decode an axis-angle 3-vector (radians) into the sensor-space
    /// rotation and recompose the applied rotation.
    ///
    /// The device reports X and Y negated relative to the application frame;
    /// Z matches. Vector magnitude is the rotation angle, direction is the
    /// axis; zero magnitude decodes to the identity.
    pub fn update(&mut self, orientation: Vec3) {
        let v = Vec3::new(-orientation.x, -orientation.y, orientation.z);
        let angle = v.length();
        self.sensor_space = if angle > f32::EPSILON {
            Quat::from_axis_angle(v / angle, angle)
        } else {
            Quat::IDENTITY
        };
        self.applied = self.offset * self.sensor_space;
    }

    /// Latest decoded rotation, uncalibrated.
    pub fn sensor_space(&self) -> Quat {
        self.sensor_space
    }

    /// Current calibration offset, identity until the user calibrates.
    pub fn offset(&self) -> Quat {
        self.offset
    }

    /// Controller pose in calibrated application space.
    pub fn applied(&self) -> Quat {
        self.applied
    }

    fn capture_offset(&mut self) {
        self.offset = self.sensor_space.inverse();
        self.applied = self.offset * self.sensor_space;
        info!("calibration offset captured");
    }
}

/// Cancellable, timed "hold to calibrate" protocol. The delay lets the user
/// aim the device before the offset is captured; cancelling before the
/// deadline leaves the previous offset untouched.
///
/// The deadline is a stored monotonic instant checked once per tick, so
/// completion never stalls tick processing and fires at most once per
/// [`begin`](CalibrationController::begin).
#[derive(Debug, Default)]
pub struct CalibrationController {
    deadline: Option<Instant>,
}

impl CalibrationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Schedule a completion at `now + delay`. Returns `false` (a plain
    /// no-op, not an error) when a hold is already pending: only one pending
    /// timer may exist.
    pub fn begin(&mut self, delay: Duration, now: Instant) -> bool {
        if self.deadline.is_some() {
            debug!("calibration already pending, begin ignored");
            return false;
        }
        self.deadline = Some(now + delay);
        info!(delay_ms = delay.as_millis() as u64, "calibration hold started");
        true
    }

    /// Abort a pending hold. Returns `true` if there was one to abort.
    pub fn cancel(&mut self) -> bool {
        match self.deadline.take() {
            Some(_) => {
                info!("calibration cancelled");
                true
            }
            None => false,
        }
    }

    /// Deadline check, called once per tick. Returns `true` exactly once per
    /// elapsed hold.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Capture the offset from the engine's current sensor-space rotation.
    /// Clears any pending deadline so a direct call cannot be followed by a
    /// second timed completion.
    pub fn complete(&mut self, engine: &mut OrientationEngine) {
        self.deadline = None;
        engine.capture_offset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Quat, b: Quat) -> bool {
        a.abs_diff_eq(b, 1e-5) || a.abs_diff_eq(-b, 1e-5)
    }

    #[test]
    fn zero_vector_decodes_to_identity() {
        let mut engine = OrientationEngine::new();
        engine.update(Vec3::ZERO);
        assert!(approx(engine.sensor_space(), Quat::IDENTITY));
        assert!(approx(engine.applied(), Quat::IDENTITY));
    }

    #[test]
    fn x_and_y_axes_are_negated() {
        let mut engine = OrientationEngine::new();
        engine.update(Vec3::new(FRAC_PI_2, 0.0, 0.0));
        assert!(approx(
            engine.sensor_space(),
            Quat::from_axis_angle(Vec3::NEG_X, FRAC_PI_2)
        ));

        engine.update(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert!(approx(
            engine.sensor_space(),
            Quat::from_axis_angle(Vec3::Z, FRAC_PI_2)
        ));
    }

    #[test]
    fn applied_rotation_stays_unit() {
        let mut engine = OrientationEngine::new();
        engine.update(Vec3::new(0.3, -1.2, 2.5));
        assert!((engine.applied().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn completion_captures_inverse_of_sensor_space() {
        let mut engine = OrientationEngine::new();
        let mut calibration = CalibrationController::new();
        engine.update(Vec3::new(0.0, 0.0, FRAC_PI_2));

        calibration.complete(&mut engine);
        assert!(approx(engine.offset(), engine.sensor_space().inverse()));
        // Calibrated pose at the captured orientation is the identity.
        assert!(approx(engine.applied(), Quat::IDENTITY));
    }

    #[test]
    fn cancel_before_deadline_leaves_offset_untouched() {
        let mut engine = OrientationEngine::new();
        let mut calibration = CalibrationController::new();
        engine.update(Vec3::new(1.0, 0.0, 0.0));

        let start = Instant::now();
        assert!(calibration.begin(Duration::from_secs(2), start));
        assert!(calibration.cancel());
        assert!(!calibration.poll(start + Duration::from_secs(5)));
        assert!(approx(engine.offset(), Quat::IDENTITY));
    }

    #[test]
    fn begin_while_pending_is_a_noop() {
        let mut calibration = CalibrationController::new();
        let start = Instant::now();
        assert!(calibration.begin(Duration::from_secs(1), start));
        // The second begin must not move the deadline.
        assert!(!calibration.begin(Duration::from_secs(60), start));
        assert!(calibration.poll(start + Duration::from_secs(1)));
    }

    #[test]
    fn poll_fires_at_most_once() {
        let mut calibration = CalibrationController::new();
        let start = Instant::now();
        calibration.begin(Duration::from_millis(100), start);
        assert!(!calibration.poll(start + Duration::from_millis(99)));
        assert!(calibration.poll(start + Duration::from_millis(100)));
        assert!(!calibration.poll(start + Duration::from_millis(200)));
    }
}
