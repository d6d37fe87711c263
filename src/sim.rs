use std::error::Error;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::{MAG_BIAS_X, MAG_BIAS_Y};
use crate::drone::{DroneLink, MoveCommand, NavFrame};
use crate::position::Position;

/// Ground speed at full forward stick, m/s.
const SPEED_SCALE_M_S: f64 = 5.0;
/// Yaw rate at full stick, degrees per second.
const YAW_RATE_DPS: f64 = 90.0;
/// Telemetry frame period.
const FRAME_PERIOD: Duration = Duration::from_millis(5);
/// Magnitude of the simulated horizontal field, raw units.
const MAG_RADIUS: f64 = 120.0;
/// Hover altitude, millimeters.
const HOVER_ALT_MM: f64 = 1000.0;
/// Latitude offset of a GPS glitch frame, degrees (roughly 111 m).
const GLITCH_OFFSET_DEG: f64 = 0.001;

/// Noise and initial-state configuration for the simulated vehicle.
pub struct SimConfig {
    pub start: Position,
    /// Initial heading, degrees.
    pub heading: f64,
    /// Hard iron offset baked into the raw magnetometer readings.
    pub mag_bias: (f64, f64),
    /// GPS noise standard deviation, degrees.
    pub gps_noise_deg: f64,
    /// Magnetometer noise standard deviation, raw units.
    pub mag_noise: f64,
    /// Velocity noise standard deviation, mm/s.
    pub velocity_noise: f64,
    /// Per-frame probability of a single-frame GPS spike, the kind of
    /// multipath glitch the outlier filter exists to reject.
    pub gps_glitch_probability: f64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start: Position::new(25.759027, -80.374598),
            heading: 0.0,
            mag_bias: (MAG_BIAS_X, MAG_BIAS_Y),
            gps_noise_deg: 2e-7,
            mag_noise: 0.8,
            velocity_noise: 15.0,
            gps_glitch_probability: 0.01,
            seed: 42,
        }
    }
}

struct SimState {
    position: Position,
    heading: f64,
    altitude_mm: f64,
    airborne: bool,
    command: MoveCommand,
    last_step: Instant,
    rng: StdRng,
}

/// A software vehicle behind the `DroneLink` trait: integrates motion
/// commands into position and heading, and renders noisy telemetry
/// frames consistent with the navigator's sensor model. Used by the
/// demo binaries and integration tests in place of a real airframe.
pub struct SimulatedDrone {
    started: Instant,
    mag_bias: (f64, f64),
    gps_noise: Normal<f64>,
    mag_noise: Normal<f64>,
    velocity_noise: Normal<f64>,
    glitch_probability: f64,
    state: Mutex<SimState>,
}

impl SimulatedDrone {
    pub fn new(config: SimConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            started: Instant::now(),
            mag_bias: config.mag_bias,
            gps_noise: Normal::new(0.0, config.gps_noise_deg)?,
            mag_noise: Normal::new(0.0, config.mag_noise)?,
            velocity_noise: Normal::new(0.0, config.velocity_noise)?,
            glitch_probability: config.gps_glitch_probability,
            state: Mutex::new(SimState {
                position: config.start,
                heading: config.heading.rem_euclid(360.0),
                altitude_mm: 0.0,
                airborne: false,
                command: MoveCommand::hover(),
                last_step: Instant::now(),
                rng: StdRng::seed_from_u64(config.seed),
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Integrate the active command over the time since the last step.
    /// Negative yaw commands turn clockwise (heading increases), matching
    /// the steering convention of the navigation core.
    fn advance(&self, state: &mut SimState) {
        let now = Instant::now();
        let dt = now.duration_since(state.last_step).as_secs_f64();
        state.last_step = now;

        if !state.airborne {
            return;
        }

        state.heading =
            (state.heading - state.command.yaw * YAW_RATE_DPS * dt).rem_euclid(360.0);

        let distance = state.command.forward * SPEED_SCALE_M_S * dt;
        if distance != 0.0 {
            state.position = state.position.project(state.heading, distance);
        }
    }
}

impl DroneLink for SimulatedDrone {
    fn frame_count(&self) -> u64 {
        (self.started.elapsed().as_micros() / FRAME_PERIOD.as_micros()) as u64
    }

    fn frame(&self) -> NavFrame {
        let mut state = self.lock();
        self.advance(&mut state);

        let mut lat = state.position.latitude + self.gps_noise.sample(&mut state.rng);
        let mut lon = state.position.longitude + self.gps_noise.sample(&mut state.rng);
        if state.rng.r#gen::<f64>() < self.glitch_probability {
            lat += GLITCH_OFFSET_DEG;
        }

        let heading_rad = state.heading.to_radians();
        let mag_x =
            self.mag_bias.0 + MAG_RADIUS * heading_rad.cos() + self.mag_noise.sample(&mut state.rng);
        let mag_y =
            self.mag_bias.1 - MAG_RADIUS * heading_rad.sin() + self.mag_noise.sample(&mut state.rng);

        // Attitude yaw is reported in (-180, 180].
        let yaw = if state.heading > 180.0 {
            state.heading - 360.0
        } else {
            state.heading
        };

        let forward_mm_s = state.command.forward * SPEED_SCALE_M_S * 1000.0;

        NavFrame {
            acceleration: [
                self.velocity_noise.sample(&mut state.rng),
                self.velocity_noise.sample(&mut state.rng),
                1000.0 + self.velocity_noise.sample(&mut state.rng),
            ],
            angular_rate: [
                0.0,
                0.0,
                -state.command.yaw * YAW_RATE_DPS,
            ],
            gps: (lat, lon),
            attitude: [0.0, 0.0, yaw],
            magnetometer: [mag_x, mag_y, self.mag_noise.sample(&mut state.rng)],
            mag_field: MAG_RADIUS + self.mag_noise.sample(&mut state.rng),
            velocity: [
                forward_mm_s + self.velocity_noise.sample(&mut state.rng),
                self.velocity_noise.sample(&mut state.rng),
                0.0,
            ],
            altitude_mm: state.altitude_mm,
        }
    }

    fn execute(&self, command: MoveCommand) {
        let mut state = self.lock();
        self.advance(&mut state);
        state.command = command;
    }

    fn hover(&self) {
        self.execute(MoveCommand::hover());
    }

    fn takeoff(&self) {
        let mut state = self.lock();
        state.airborne = true;
        state.altitude_mm = HOVER_ALT_MM;
        state.command = MoveCommand::hover();
        state.last_step = Instant::now();
    }

    fn land(&self) {
        let mut state = self.lock();
        state.airborne = false;
        state.altitude_mm = 0.0;
        state.command = MoveCommand::hover();
    }

    // Rotations complete instantly in simulation, whatever the speed.
    fn turn_angle(&self, degrees: f64, _speed: f64) {
        let mut state = self.lock();
        self.advance(&mut state);
        state.heading = (state.heading + degrees).rem_euclid(360.0);
    }

    fn trim(&self) {
        // Nothing drifts in simulation.
    }

    fn mag_trim(&self) {}

    fn settle(&self, _wait: Duration) {
        // Simulated physics settle instantly.
    }
}
