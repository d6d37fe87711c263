use std::collections::VecDeque;
use std::time::Instant;

use crate::config::SAMPLE_CAPACITY;
use crate::drone::NavFrame;

/// One unit-converted telemetry sample. Built from a raw frame once and
/// immutable afterwards. Magnetometer axes are kept raw here; the hard
/// iron bias is only subtracted during aggregation.
#[derive(Clone, Copy, Debug)]
pub struct TelemetrySample {
    pub taken_at: Instant,
    /// Velocity vector, mm/s.
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    pub angular_rate: [f64; 3],
    /// Latitude, longitude in degrees.
    pub gps: [f64; 2],
    /// Barometric altitude, meters.
    pub altitude: f64,
    /// Raw magnetometer x and y. The z axis carries no heading
    /// information for a level vehicle and is dropped.
    pub magnetometer: [f64; 2],
    /// Pitch, roll, yaw in degrees.
    pub attitude: [f64; 3],
    /// Fused field strength reported by the vehicle.
    pub mag_field: f64,
}

impl TelemetrySample {
    pub fn from_frame(frame: &NavFrame) -> Self {
        Self {
            taken_at: Instant::now(),
            velocity: frame.velocity,
            acceleration: frame.acceleration,
            angular_rate: frame.angular_rate,
            gps: [frame.gps.0, frame.gps.1],
            // Altitude arrives in millimeters
            altitude: frame.altitude_mm / 1000.0,
            magnetometer: [frame.magnetometer[0], frame.magnetometer[1]],
            attitude: frame.attitude,
            mag_field: frame.mag_field,
        }
    }
}

/// Bounded FIFO of the most recent telemetry samples. The sampler thread
/// appends, the aggregator takes snapshots; callers wrap it in a mutex.
pub struct SampleWindow {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::with_capacity(SAMPLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, sample: TelemetrySample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Copy out the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<TelemetrySample> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}
