use std::fmt;
use std::thread;
use std::time::Duration;

/// One raw telemetry frame as delivered by the flight stack. Values are
/// untouched vehicle units: altitude in millimeters, velocity in mm/s,
/// magnetometer axes uncorrected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NavFrame {
    /// Raw accelerometer vector.
    pub acceleration: [f64; 3],
    /// Raw gyroscope vector.
    pub angular_rate: [f64; 3],
    /// GPS latitude and longitude, degrees.
    pub gps: (f64, f64),
    /// Pitch, roll, yaw in degrees.
    pub attitude: [f64; 3],
    /// Raw magnetometer x, y, z.
    pub magnetometer: [f64; 3],
    /// Fused field strength reported by the vehicle.
    pub mag_field: f64,
    /// Horizontal velocity vector, mm/s.
    pub velocity: [f64; 3],
    /// Barometric altitude, millimeters.
    pub altitude_mm: f64,
}

/// A 4-degree-of-freedom motion command: lateral and forward/back speed,
/// vertical speed, and yaw rate, each in the vehicle's normalized units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveCommand {
    pub lateral: f64,
    pub forward: f64,
    pub vertical: f64,
    pub yaw: f64,
}

impl MoveCommand {
    /// The all-zero command: hold position.
    pub fn hover() -> Self {
        Self {
            lateral: 0.0,
            forward: 0.0,
            vertical: 0.0,
            yaw: 0.0,
        }
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2}, {:.2}, {:.2}, {:.2}]",
            self.lateral, self.forward, self.vertical, self.yaw
        )
    }
}

/// The vehicle interface the navigation core runs against.
///
/// Implementations are expected to be shared across threads: the sampler
/// polls `frame_count`/`frame` continuously while the control loop issues
/// motion commands, so every method takes `&self`.
pub trait DroneLink: Send + Sync {
    /// Monotonically increasing counter, bumped whenever a new telemetry
    /// frame is available.
    fn frame_count(&self) -> u64;

    /// The most recent telemetry frame.
    fn frame(&self) -> NavFrame;

    /// Apply a 4-DOF motion command.
    fn execute(&self, command: MoveCommand);

    /// Hold position.
    fn hover(&self);

    fn takeoff(&self);

    fn land(&self);

    /// Rotate in place by `degrees` (negative is counterclockwise) at the
    /// given normalized speed.
    fn turn_angle(&self, degrees: f64, speed: f64);

    /// Level trim, performed on the ground or in steady hover.
    fn trim(&self);

    /// Magnetometer trim, performed in hover.
    fn mag_trim(&self);

    /// Give the vehicle time to settle after a maneuver. Real links wait
    /// out the physics; simulated ones may return immediately.
    fn settle(&self, wait: Duration) {
        thread::sleep(wait);
    }
}
