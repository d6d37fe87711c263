use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nav_rs::config::ARRIVAL_THRESHOLD_M;
use nav_rs::sim::{SimConfig, SimulatedDrone};
use nav_rs::{DroneLink, Navigator, Vector};

/// Demo flight: bring up the navigator against the simulated airframe,
/// pick a target 80 m northeast of home, and steer toward it with
/// `get_move` until the remaining distance drops under the arrival
/// threshold.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("Starting drone navigation demo...");
    let drone = Arc::new(SimulatedDrone::new(SimConfig::default())?);
    drone.takeoff();

    println!("Collecting telemetry...");
    let mut navigator = Navigator::new(Arc::clone(&drone) as Arc<dyn DroneLink>);
    let home = navigator.home();
    println!("✓ Navigator ready");
    println!("  Home: {}", home);

    let leg = Vector::new(home, 45.0, 80.0);
    let target = leg.end_position();
    navigator.set_target(target);
    println!("  {}\n", leg);

    let started = Instant::now();
    let mut tick = 0u32;
    loop {
        // A demo should not hang forever if the tuning ever regresses.
        if started.elapsed() > Duration::from_secs(180) {
            drone.hover();
            drone.land();
            return Err("flight did not reach the target in time".into());
        }

        let (command, distance) = navigator.get_move()?;
        if distance < ARRIVAL_THRESHOLD_M {
            println!("\n✓ Arrived: {:.2} m from target. Landing.", distance);
            drone.hover();
            drone.land();
            break;
        }

        drone.execute(command);
        if tick % 20 == 0 {
            println!(
                "→ {:>6.1} m to target | heading {:>5.1}° | move {}",
                distance,
                navigator.heading()?,
                command
            );
        }
        tick += 1;

        thread::sleep(Duration::from_millis(150));
    }

    println!("Flight complete in {:.1} s.", started.elapsed().as_secs_f64());
    Ok(())
}
