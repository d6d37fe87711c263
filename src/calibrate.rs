use std::error::Error;
use std::sync::Arc;

use nav_rs::Navigator;
use nav_rs::config::CALIBRATION_STOPS;
use nav_rs::sim::{SimConfig, SimulatedDrone};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║     Magnetometer Calibration Flight                  ║");
    println!("╚══════════════════════════════════════════════════════╝\n");

    println!("Procedure:");
    println!("1. The vehicle takes off and hovers");
    println!(
        "2. It performs {} in-place rotations of {:.0}° each",
        CALIBRATION_STOPS,
        360.0 / CALIBRATION_STOPS as f64
    );
    println!("3. Raw magnetometer x/y are recorded at every stop");
    println!("4. The per-axis means replace the hard iron bias");
    println!("5. The vehicle lands\n");

    // Simulated airframe with a deliberately skewed hard iron offset
    // for the calibration to find.
    let actual = (-44.0, 27.0);
    let config = SimConfig {
        mag_bias: actual,
        ..SimConfig::default()
    };
    let drone = Arc::new(SimulatedDrone::new(config)?);

    println!("Collecting telemetry...");
    let mut navigator = Navigator::new(drone);
    let before = navigator.mag_bias();
    println!("✓ Navigator ready");
    println!("  Bias before: X: {:>7.1}  Y: {:>7.1}", before.x, before.y);

    println!("\nCalibrating... (ROTATING)");
    navigator.calibrate(true);

    let after = navigator.mag_bias();
    println!("\n✓ Calibration complete");
    println!("  Recovered:   X: {:>7.1}  Y: {:>7.1}", after.x, after.y);
    println!("  Actual:      X: {:>7.1}  Y: {:>7.1}", actual.0, actual.1);

    Ok(())
}
