use std::time::Duration;

// ** STEERING CONFIGURATION ** //

/// Turn rate used when the heading error is outside the turn band.
pub const HARD_TURN: f64 = 0.3;
/// Turn rate used for small in-band heading corrections.
pub const SOFT_TURN: f64 = 0.1;
/// Default forward speed while tracking the target bearing.
pub const DEFAULT_SPEED: f64 = 0.3;
/// Heading error (degrees) beyond which forward motion stops and the
/// vehicle turns in place.
pub const TURN_BAND_DEGREES: f64 = 10.0;
/// Distance (meters) at which the demo control loop considers the
/// target reached.
pub const ARRIVAL_THRESHOLD_M: f64 = 2.0;

// ** SAMPLING CONFIGURATION ** //

/// Number of telemetry samples kept in the sliding window.
pub const SAMPLE_CAPACITY: usize = 150;
/// Pause between sampler iterations.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(5);
/// Pause between polls while waiting for the vehicle to publish a
/// fresh telemetry frame.
pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ** MAGNETOMETER CONFIGURATION ** //

/// Empirical hard iron offsets, used until a calibration run replaces them.
pub const MAG_BIAS_X: f64 = -14.0;
pub const MAG_BIAS_Y: f64 = 13.0;
/// Number of in-place rotations performed during magnetometer calibration.
pub const CALIBRATION_STOPS: usize = 6;
/// Rotation speed for each calibration turn.
pub const CALIBRATION_TURN_SPEED: f64 = 1.0;
/// Hover time after trim / takeoff / flat-trim steps.
pub const TRIM_SETTLE: Duration = Duration::from_secs(5);
/// Hover time after each calibration rotation, letting attitude settle.
pub const ROTATION_SETTLE: Duration = Duration::from_secs(2);

// ** OUTLIER FILTER ** //

/// Modified z-score scale constant (Iglewicz and Hoaglin 1993).
pub const OUTLIER_SCALE: f64 = 0.6745;
/// Modified z-score above which a sample is rejected.
pub const OUTLIER_THRESHOLD: f64 = 3.5;
