use crate::config::{MAG_BIAS_X, MAG_BIAS_Y};
use crate::{NavError, NavResult};
use crate::outlier::filter_outliers;
use crate::position::Position;
use crate::telemetry::TelemetrySample;

/// Hard iron offset subtracted from raw magnetometer axes before the
/// heading is derived. Owned by the navigator instance; only a
/// calibration run replaces it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagnetometerBias {
    pub x: f64,
    pub y: f64,
}

impl Default for MagnetometerBias {
    fn default() -> Self {
        Self {
            x: MAG_BIAS_X,
            y: MAG_BIAS_Y,
        }
    }
}

/// Denoised snapshot of the vehicle state: every channel is the
/// outlier-filtered average of the current sample window, and `heading`
/// is derived from the averaged, bias-corrected magnetometer axes.
#[derive(Clone, Copy, Debug)]
pub struct AggregatedState {
    /// Velocity vector, mm/s.
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    pub angular_rate: [f64; 3],
    pub position: Position,
    /// Barometric altitude, meters.
    pub altitude: f64,
    /// Averaged raw magnetometer x/y, bias not applied.
    pub magnetometer: [f64; 2],
    /// Pitch, roll, yaw in degrees.
    pub attitude: [f64; 3],
    pub mag_field: f64,
    /// Compass heading in degrees, [0, 360).
    pub heading: f64,
}

/// Per-channel value series for one aggregation pass. The channel set is
/// closed and known at compile time, so this is a plain struct of arrays
/// rather than a keyed map.
struct ChannelSeries {
    velocity: Vec<[f64; 3]>,
    acceleration: Vec<[f64; 3]>,
    angular_rate: Vec<[f64; 3]>,
    gps: Vec<[f64; 2]>,
    altitude: Vec<[f64; 1]>,
    magnetometer: Vec<[f64; 2]>,
    /// Bias-corrected magnetometer x/y, the inputs to heading derivation.
    heading_input: Vec<[f64; 2]>,
    attitude: Vec<[f64; 3]>,
    mag_field: Vec<[f64; 1]>,
}

impl ChannelSeries {
    fn collect(samples: &[TelemetrySample], bias: MagnetometerBias) -> Self {
        let n = samples.len();
        let mut series = Self {
            velocity: Vec::with_capacity(n),
            acceleration: Vec::with_capacity(n),
            angular_rate: Vec::with_capacity(n),
            gps: Vec::with_capacity(n),
            altitude: Vec::with_capacity(n),
            magnetometer: Vec::with_capacity(n),
            heading_input: Vec::with_capacity(n),
            attitude: Vec::with_capacity(n),
            mag_field: Vec::with_capacity(n),
        };

        for sample in samples {
            series.velocity.push(sample.velocity);
            series.acceleration.push(sample.acceleration);
            series.angular_rate.push(sample.angular_rate);
            series.gps.push(sample.gps);
            series.altitude.push([sample.altitude]);
            series.magnetometer.push(sample.magnetometer);
            series
                .heading_input
                .push([sample.magnetometer[0] - bias.x, sample.magnetometer[1] - bias.y]);
            series.attitude.push(sample.attitude);
            series.mag_field.push([sample.mag_field]);
        }

        series
    }
}

/// Outlier-filter one channel and average what survives. If the filter
/// rejects every sample, the full list is averaged instead; changing that
/// fallback changes navigation accuracy under sensor noise, so it stays.
fn denoised_mean<const N: usize>(values: &[[f64; N]]) -> [f64; N] {
    let filtered = filter_outliers(values);
    let kept: &[[f64; N]] = if filtered.is_empty() {
        values
    } else {
        &filtered
    };

    let mut mean = [0.0; N];
    for value in kept {
        for axis in 0..N {
            mean[axis] += value[axis];
        }
    }
    for axis in mean.iter_mut() {
        *axis /= kept.len() as f64;
    }
    mean
}

/// Compass heading from bias-corrected magnetometer axes:
/// `(360 - atan2(my, mx) in degrees) mod 360`.
pub fn heading_from_axes(mx: f64, my: f64) -> f64 {
    (360.0 - my.atan2(mx).to_degrees()).rem_euclid(360.0)
}

/// Reduce a window snapshot to one averaged state. Fails with `NotReady`
/// when the window has no samples yet; every other input produces a
/// fully-populated state.
pub fn aggregate(
    samples: &[TelemetrySample],
    bias: MagnetometerBias,
) -> NavResult<AggregatedState> {
    if samples.is_empty() {
        return Err(NavError::NotReady);
    }

    let series = ChannelSeries::collect(samples, bias);

    let gps = denoised_mean(&series.gps);
    let heading_axes = denoised_mean(&series.heading_input);

    Ok(AggregatedState {
        velocity: denoised_mean(&series.velocity),
        acceleration: denoised_mean(&series.acceleration),
        angular_rate: denoised_mean(&series.angular_rate),
        position: Position::new(gps[0], gps[1]),
        altitude: denoised_mean(&series.altitude)[0],
        magnetometer: denoised_mean(&series.magnetometer),
        attitude: denoised_mean(&series.attitude),
        mag_field: denoised_mean(&series.mag_field)[0],
        heading: heading_from_axes(heading_axes[0], heading_axes[1]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drone::NavFrame;

    fn sample_from(frame: NavFrame) -> TelemetrySample {
        TelemetrySample::from_frame(&frame)
    }

    fn steady_frame() -> NavFrame {
        NavFrame {
            acceleration: [1.0, 2.0, 3.0],
            angular_rate: [0.125, 0.25, 0.5],
            gps: (25.75, -80.375),
            attitude: [1.5, -0.5, 12.0],
            magnetometer: [86.0, 13.0, 0.0],
            mag_field: 0.875,
            velocity: [250.0, -10.0, 0.0],
            altitude_mm: 1500.0,
        }
    }

    #[test]
    fn test_empty_window_is_not_ready() {
        let result = aggregate(&[], MagnetometerBias::default());
        assert_eq!(result.unwrap_err(), NavError::NotReady);
    }

    #[test]
    fn test_identical_samples_average_to_themselves() {
        let samples: Vec<_> = (0..50).map(|_| sample_from(steady_frame())).collect();
        let state = aggregate(&samples, MagnetometerBias::default()).unwrap();

        assert_eq!(state.velocity, [250.0, -10.0, 0.0]);
        assert_eq!(state.acceleration, [1.0, 2.0, 3.0]);
        assert_eq!(state.angular_rate, [0.125, 0.25, 0.5]);
        assert_eq!(state.position, Position::new(25.75, -80.375));
        assert_eq!(state.altitude, 1.5);
        assert_eq!(state.magnetometer, [86.0, 13.0]);
        assert_eq!(state.attitude, [1.5, -0.5, 12.0]);
        assert_eq!(state.mag_field, 0.875);
    }

    #[test]
    fn test_single_sample_is_enough() {
        let samples = vec![sample_from(steady_frame())];
        assert!(aggregate(&samples, MagnetometerBias::default()).is_ok());
    }

    #[test]
    fn test_gps_glitch_filtered_out() {
        let mut samples = Vec::new();
        for i in 0..30 {
            let mut frame = steady_frame();
            // a few centimeters of jitter so the channel isn't degenerate
            frame.gps.0 += (i as f64) * 1e-7;
            samples.push(sample_from(frame));
        }
        let mut glitch = steady_frame();
        glitch.gps = (26.75, -80.375); // ~111 km north
        samples.push(sample_from(glitch));

        let state = aggregate(&samples, MagnetometerBias::default()).unwrap();
        assert!((state.position.latitude - 25.75).abs() < 1e-4);
    }

    #[test]
    fn test_heading_from_axes() {
        // Corrected field pointing along +x is due north.
        assert_eq!(heading_from_axes(100.0, 0.0), 0.0);
        // atan2(my, mx) positive quadrant rotates the heading backwards.
        assert!((heading_from_axes(0.0, 100.0) - 270.0).abs() < 1e-9);
        assert!((heading_from_axes(0.0, -100.0) - 90.0).abs() < 1e-9);
        assert!((heading_from_axes(-100.0, 0.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_uses_bias_corrected_average() {
        // Raw readings sit at bias + (R, 0); corrected axes point along +x.
        let bias = MagnetometerBias { x: -14.0, y: 13.0 };
        let mut frame = steady_frame();
        frame.magnetometer = [bias.x + 120.0, bias.y, 0.0];

        let samples: Vec<_> = (0..10).map(|_| sample_from(frame)).collect();
        let state = aggregate(&samples, bias).unwrap();
        assert!(state.heading.abs() < 1e-9);
    }

    #[test]
    fn test_all_rejected_channel_falls_back_to_full_list() {
        // NaN samples fail the keep test, so the filtered subset is empty
        // and the aggregator must average the full list instead of
        // dividing by zero.
        let mut frame = steady_frame();
        frame.altitude_mm = f64::NAN;
        let samples: Vec<_> = (0..5).map(|_| sample_from(frame)).collect();

        let state = aggregate(&samples, MagnetometerBias::default()).unwrap();
        assert!(state.altitude.is_nan());
        // The other channels are untouched by the bad one.
        assert_eq!(state.velocity, [250.0, -10.0, 0.0]);
    }
}
