use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use log::{debug, info, warn};

use crate::{NavError, NavResult};
use crate::config::{
    CALIBRATION_STOPS, CALIBRATION_TURN_SPEED, DEFAULT_SPEED, FRAME_POLL_INTERVAL, HARD_TURN,
    ROTATION_SETTLE, SAMPLE_CAPACITY, SAMPLE_INTERVAL, SOFT_TURN, TRIM_SETTLE, TURN_BAND_DEGREES,
};
use crate::drone::{DroneLink, MoveCommand, NavFrame};
use crate::position::{Position, angle_diff};
use crate::state::{AggregatedState, MagnetometerBias, aggregate};
use crate::telemetry::{SampleWindow, TelemetrySample};

/// Navigation core for a single vehicle.
///
/// Construction spawns the telemetry sampler thread and blocks until the
/// first averaged state is available, which also becomes the home
/// coordinate. The sampler runs for the rest of the process and has no
/// shutdown channel; teardown is process exit. If the vehicle link stops
/// delivering frames the sampler blocks and state updates stop, so
/// callers that need liveness guarantees wrap their calls in a watchdog.
///
/// `calibrate` flies the vehicle and must not overlap with navigation
/// commands; keeping the two apart is the caller's responsibility.
pub struct Navigator {
    drone: Arc<dyn DroneLink>,
    window: Arc<Mutex<SampleWindow>>,
    mag_bias: MagnetometerBias,
    target: Position,
    home: Position,
}

impl Navigator {
    /// Start sampling and wait for the first aggregated state. A vehicle
    /// link that never produces a frame keeps this blocked forever.
    pub fn new(drone: Arc<dyn DroneLink>) -> Self {
        let window = Arc::new(Mutex::new(SampleWindow::new()));
        {
            let drone = Arc::clone(&drone);
            let window = Arc::clone(&window);
            thread::spawn(move || sample_loop(drone, window));
        }

        let mag_bias = MagnetometerBias::default();

        let first = loop {
            match aggregate(&snapshot(&window), mag_bias) {
                Ok(state) => break state,
                Err(NavError::NotReady) => thread::sleep(SAMPLE_INTERVAL),
            }
        };
        info!("navigator ready, home at {}", first.position);

        Self {
            drone,
            window,
            mag_bias,
            target: Position::new(0.0, 0.0),
            home: first.position,
        }
    }

    /// Recompute the averaged state from the current sample window.
    fn refresh(&self) -> NavResult<AggregatedState> {
        aggregate(&snapshot(&self.window), self.mag_bias)
    }

    /// Compute the next steering command and the remaining great-circle
    /// distance to the target. The caller re-invokes this each control
    /// tick until the distance drops under its own arrival threshold.
    pub fn get_move(&self) -> NavResult<(MoveCommand, f64)> {
        let state = self.refresh()?;

        let bearing = state.position.bearing_to(&self.target);
        let distance = state.position.distance_to(&self.target);
        let delta = angle_diff(state.heading, bearing);

        if delta.is_nan() {
            // An unset or NaN target makes the angular error meaningless;
            // hold position instead of comparing NaN against the bands.
            warn!("angular error undefined (target {}), holding", self.target);
            return Ok((MoveCommand::hover(), distance));
        }

        Ok((steer(delta), distance))
    }

    /// Current GPS target.
    ///
    /// Starts at (0, 0); callers set a real target before flying.
    pub fn target(&self) -> Position {
        self.target
    }

    pub fn set_target(&mut self, target: Position) {
        self.target = target;
    }

    /// Position captured when the navigator came up.
    pub fn home(&self) -> Position {
        self.home
    }

    pub fn set_home(&mut self, home: Position) {
        self.home = home;
    }

    /// Hard iron offset currently applied to magnetometer readings.
    pub fn mag_bias(&self) -> MagnetometerBias {
        self.mag_bias
    }

    // Diagnostic accessors; each one recomputes the averaged state.

    /// Compass heading in degrees, [0, 360).
    pub fn heading(&self) -> NavResult<f64> {
        Ok(self.refresh()?.heading)
    }

    /// Averaged velocity vector, mm/s.
    pub fn velocity(&self) -> NavResult<[f64; 3]> {
        Ok(self.refresh()?.velocity)
    }

    /// Averaged raw accelerometer vector.
    pub fn acceleration(&self) -> NavResult<[f64; 3]> {
        Ok(self.refresh()?.acceleration)
    }

    /// Averaged GPS position.
    pub fn gps(&self) -> NavResult<Position> {
        Ok(self.refresh()?.position)
    }

    /// Averaged fused field strength.
    pub fn mag_field(&self) -> NavResult<f64> {
        Ok(self.refresh()?.mag_field)
    }

    /// Attitude as a printable pitch/roll/yaw block.
    pub fn attitude_text(&self) -> NavResult<String> {
        let [pitch, roll, yaw] = self.refresh()?.attitude;
        Ok(format!("pitch: {pitch:.2}\nroll: {roll:.2}\nyaw: {yaw:.2}"))
    }

    /// The full averaged state snapshot.
    pub fn state(&self) -> NavResult<AggregatedState> {
        self.refresh()
    }

    /// Trim and, optionally, magnetometer calibration. Takes off, hovers
    /// through the trim sequence, and when `include_mag` is set rotates
    /// through a full circle of in-place stops, recording raw magnetometer
    /// axes at each; the recorded means replace the hard iron bias. Lands
    /// when done either way. Needs clear airspace around the vehicle.
    pub fn calibrate(&mut self, include_mag: bool) {
        info!("calibration: trim and takeoff");
        self.drone.trim();
        self.drone.settle(TRIM_SETTLE);
        self.drone.takeoff();
        self.drone.settle(TRIM_SETTLE);
        self.drone.mag_trim();
        self.drone.settle(TRIM_SETTLE);

        if include_mag {
            self.mag_bias = self.collect_mag_bias();
            info!(
                "magnetometer bias set to ({:.2}, {:.2})",
                self.mag_bias.x, self.mag_bias.y
            );
        }

        self.drone.land();
    }

    /// Rotate through a full circle in discrete stops, recording raw
    /// magnetometer x/y at each; the per-axis means become the new bias.
    fn collect_mag_bias(&self) -> MagnetometerBias {
        let step = -(360.0 / CALIBRATION_STOPS as f64);
        let mut xs = Vec::with_capacity(CALIBRATION_STOPS);
        let mut ys = Vec::with_capacity(CALIBRATION_STOPS);

        for stop in 0..CALIBRATION_STOPS {
            let frame = self.fresh_frame();
            debug!(
                "calibration stop {}: mag ({:.1}, {:.1})",
                stop, frame.magnetometer[0], frame.magnetometer[1]
            );
            xs.push(frame.magnetometer[0]);
            ys.push(frame.magnetometer[1]);

            self.drone.turn_angle(step, CALIBRATION_TURN_SPEED);
            self.drone.hover();
            self.drone.settle(ROTATION_SETTLE);
        }

        MagnetometerBias {
            x: xs.iter().sum::<f64>() / xs.len() as f64,
            y: ys.iter().sum::<f64>() / ys.len() as f64,
        }
    }

    /// Block until the vehicle publishes a frame newer than the current
    /// one, then return it.
    fn fresh_frame(&self) -> NavFrame {
        let seen = self.drone.frame_count();
        while self.drone.frame_count() == seen {
            thread::sleep(FRAME_POLL_INTERVAL);
        }
        self.drone.frame()
    }
}

/// Banded steering policy: big heading errors get a pure turn, small
/// ones get forward motion with a gentle correction.
fn steer(delta: f64) -> MoveCommand {
    let (forward, yaw) = if delta > TURN_BAND_DEGREES {
        (0.0, -HARD_TURN)
    } else if delta < -TURN_BAND_DEGREES {
        (0.0, HARD_TURN)
    } else if delta > 0.0 {
        (DEFAULT_SPEED, -SOFT_TURN)
    } else if delta < 0.0 {
        (DEFAULT_SPEED, SOFT_TURN)
    } else {
        (DEFAULT_SPEED, 0.0)
    };

    MoveCommand {
        lateral: 0.0,
        forward,
        vertical: 0.0,
        yaw,
    }
}

/// Sampler body: runs on its own thread for the life of the process.
/// Waits for each fresh frame (short sleeps, never spinning), converts
/// it, and appends it to the shared window.
fn sample_loop(drone: Arc<dyn DroneLink>, window: Arc<Mutex<SampleWindow>>) {
    let mut last_count = drone.frame_count();
    let mut filled = false;

    loop {
        while drone.frame_count() == last_count {
            thread::sleep(FRAME_POLL_INTERVAL);
        }
        last_count = drone.frame_count();

        let sample = TelemetrySample::from_frame(&drone.frame());
        {
            let mut window = window.lock().unwrap_or_else(PoisonError::into_inner);
            window.push(sample);
            if !filled && window.len() == SAMPLE_CAPACITY {
                filled = true;
                debug!("sample window filled ({} samples)", SAMPLE_CAPACITY);
            }
        }

        thread::sleep(SAMPLE_INTERVAL);
    }
}

fn snapshot(window: &Mutex<SampleWindow>) -> Vec<TelemetrySample> {
    window
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAG_BIAS_X, MAG_BIAS_Y};
    use crate::mocks::mock_drone::MockDrone;

    fn level_frame(gps: (f64, f64)) -> NavFrame {
        NavFrame {
            gps,
            // Raw field at bias + (R, 0): derived heading is due north.
            magnetometer: [MAG_BIAS_X + 120.0, MAG_BIAS_Y, 0.0],
            altitude_mm: 1200.0,
            ..NavFrame::default()
        }
    }

    #[test]
    fn test_steer_hard_turn_bands() {
        let cmd = steer(15.0);
        assert_eq!(cmd.forward, 0.0);
        assert_eq!(cmd.yaw, -HARD_TURN);

        let cmd = steer(-15.0);
        assert_eq!(cmd.forward, 0.0);
        assert_eq!(cmd.yaw, HARD_TURN);
    }

    #[test]
    fn test_steer_soft_turn_bands() {
        let cmd = steer(5.0);
        assert_eq!(cmd.forward, DEFAULT_SPEED);
        assert_eq!(cmd.yaw, -SOFT_TURN);

        let cmd = steer(-5.0);
        assert_eq!(cmd.forward, DEFAULT_SPEED);
        assert_eq!(cmd.yaw, SOFT_TURN);
    }

    #[test]
    fn test_steer_straight_ahead() {
        let cmd = steer(0.0);
        assert_eq!(cmd.forward, DEFAULT_SPEED);
        assert_eq!(cmd.yaw, 0.0);
        assert_eq!(cmd.lateral, 0.0);
        assert_eq!(cmd.vertical, 0.0);
    }

    #[test]
    fn test_steer_band_edges() {
        // Exactly 10 degrees is still a soft correction.
        assert_eq!(steer(10.0).forward, DEFAULT_SPEED);
        assert_eq!(steer(-10.0).forward, DEFAULT_SPEED);
        assert_eq!(steer(10.1).forward, 0.0);
    }

    #[test]
    fn test_initialization_captures_home() {
        let drone = Arc::new(MockDrone::with_frame(level_frame((25.75, -80.375))));
        let navigator = Navigator::new(drone);

        let home = navigator.home();
        assert!((home.latitude - 25.75).abs() < 1e-9);
        assert!((home.longitude + 80.375).abs() < 1e-9);
    }

    #[test]
    fn test_arrival_at_target() {
        let drone = Arc::new(MockDrone::with_frame(level_frame((25.75, -80.375))));
        let mut navigator = Navigator::new(drone);
        navigator.set_target(Position::new(25.75, -80.375));

        let (command, distance) = navigator.get_move().unwrap();
        assert!(distance < 1e-6);
        // Zero-distance bearing degenerates to 0, matching the heading.
        assert_eq!(command.forward, DEFAULT_SPEED);
        assert_eq!(command.yaw, 0.0);
    }

    #[test]
    fn test_target_due_east_forces_hard_turn() {
        let drone = Arc::new(MockDrone::with_frame(level_frame((0.0, 0.0))));
        let mut navigator = Navigator::new(drone);
        navigator.set_target(Position::new(0.0, 0.001));

        let (command, distance) = navigator.get_move().unwrap();
        // Heading north, target due east: hard turn, no forward motion.
        assert_eq!(command.forward, 0.0);
        assert_eq!(command.yaw, -HARD_TURN);
        assert!((distance - 111.2).abs() < 2.0);
    }

    #[test]
    fn test_nan_target_holds_position() {
        let drone = Arc::new(MockDrone::with_frame(level_frame((25.75, -80.375))));
        let mut navigator = Navigator::new(drone);
        navigator.set_target(Position::new(f64::NAN, f64::NAN));

        let (command, _) = navigator.get_move().unwrap();
        assert_eq!(command, MoveCommand::hover());
    }

    #[test]
    fn test_accessors() {
        let drone = Arc::new(MockDrone::with_frame(level_frame((25.75, -80.375))));
        let mut navigator = Navigator::new(drone);

        navigator.set_target(Position::new(1.0, 2.0));
        assert_eq!(navigator.target(), Position::new(1.0, 2.0));

        navigator.set_home(Position::new(3.0, 4.0));
        assert_eq!(navigator.home(), Position::new(3.0, 4.0));

        assert!(navigator.heading().unwrap().abs() < 1e-9);
        assert_eq!(navigator.velocity().unwrap(), [0.0, 0.0, 0.0]);
        let text = navigator.attitude_text().unwrap();
        assert!(text.contains("pitch: 0.00"));
        assert!(text.contains("yaw: 0.00"));
    }

    #[test]
    fn test_calibration_replaces_bias_with_exact_means() {
        let frames: Vec<NavFrame> = [
            (10.0, 20.0),
            (30.0, 40.0),
            (-10.0, 5.0),
            (0.0, -5.0),
            (20.0, 10.0),
            (-20.0, 14.0),
        ]
        .iter()
        .map(|&(x, y)| NavFrame {
            gps: (25.75, -80.375),
            magnetometer: [x, y, 0.0],
            ..NavFrame::default()
        })
        .collect();

        let drone = Arc::new(MockDrone::with_frames(frames));
        let mut navigator = Navigator::new(Arc::clone(&drone) as Arc<dyn DroneLink>);
        navigator.calibrate(true);

        // Means of the scripted stops: x = 30/6, y = 84/6.
        assert_eq!(navigator.mag_bias(), MagnetometerBias { x: 5.0, y: 14.0 });
        assert_eq!(drone.turns().len(), CALIBRATION_STOPS);
        assert_eq!(drone.events().last(), Some(&"land"));
    }

    #[test]
    fn test_calibration_without_mag_lands_and_keeps_bias() {
        let drone = Arc::new(MockDrone::with_frame(level_frame((25.75, -80.375))));
        let mut navigator = Navigator::new(Arc::clone(&drone) as Arc<dyn DroneLink>);
        navigator.calibrate(false);

        assert_eq!(navigator.mag_bias(), MagnetometerBias::default());
        assert!(drone.turns().is_empty());
        assert_eq!(drone.events().last(), Some(&"land"));
    }
}
