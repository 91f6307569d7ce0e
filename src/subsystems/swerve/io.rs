use crate::subsystems::swerve::geometry::WheelPosition;
use crate::subsystems::swerve::samples::SampleQueue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uom::si::f64::{Angle, Length};

/// Latest readings from one module's motors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleInputs {
    pub connected: bool,
    pub drive_position: Length,
    /// meters/second
    pub drive_velocity: f64,
    pub turn_position: Angle,
}

/// ## One swerve module's motors.
/// Closed loop control happens on the other side of this trait.
pub trait ModuleIo {
    fn update_inputs(&mut self, inputs: &mut ModuleInputs);

    /// meters/second at the wheel
    fn set_drive_velocity(&mut self, velocity: f64);

    fn set_turn_position(&mut self, angle: Angle);

    fn set_drive_voltage(&mut self, volts: f64);

    fn set_turn_voltage(&mut self, volts: f64);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GyroInputs {
    pub connected: bool,
    pub yaw: Angle,
    /// radians/second
    pub yaw_velocity: f64,
}

pub trait GyroIo {
    fn update_inputs(&mut self, inputs: &mut GyroInputs);

    /// Re-zeroes the gyro so it reads `yaw` from now on.
    fn set_yaw(&mut self, yaw: Angle);
}

/// One synchronized read of every odometry signal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OdometryReading {
    pub wheels: [WheelPosition; 4],
    /// None when the gyro did not answer this read.
    pub heading: Option<Angle>,
}

/// Read by the sampler thread, so it has to be Send.
pub trait OdometrySource: Send {
    fn sample(&mut self) -> OdometryReading;
}

/// ## Starts the high rate sampling thread.
/// Reads `source` at `frequency_hz` and pushes into `queue` until `running` goes false.
/// Never waits on the control loop; the queue evicts if nobody drains it.
pub fn spawn_sampler<S>(
    mut source: S,
    queue: SampleQueue,
    frequency_hz: f64,
    running: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    S: OdometrySource + 'static,
{
    let period = Duration::from_secs_f64(1.0 / frequency_hz.max(1.0));

    std::thread::Builder::new()
        .name("odometry-sampler".to_owned())
        .spawn(move || {
            info!(frequency_hz, "odometry sampler started");
            let mut next = Instant::now();
            let mut missed = 0u64;

            while running.load(Ordering::Relaxed) {
                queue.push(&source.sample());

                next += period;
                let now = Instant::now();
                if next > now {
                    spin_sleep::sleep(next - now);
                } else {
                    // fell behind, don't try to catch up with a burst of reads
                    missed += 1;
                    next = now;
                }
            }

            debug!(missed, "sampler deadlines missed");
            info!("odometry sampler stopped");
        })
}

#[cfg(test)]
mod io_tests {
    use super::*;
    use uom::si::length::meter;

    struct CountingSource {
        count: f64,
    }

    impl OdometrySource for CountingSource {
        fn sample(&mut self) -> OdometryReading {
            self.count += 1.0;
            let mut reading = OdometryReading::default();
            for wheel in reading.wheels.iter_mut() {
                wheel.distance = Length::new::<meter>(self.count);
            }
            reading
        }
    }

    #[test]
    fn sampler_fills_the_queue_until_stopped() {
        let queue = SampleQueue::new(1000);
        let running = Arc::new(AtomicBool::new(true));
        let handle = spawn_sampler(
            CountingSource { count: 0.0 },
            queue.clone(),
            500.0,
            running.clone(),
        )
        .expect("spawns");

        std::thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::Relaxed);
        handle.join().expect("joins");

        let drained = queue.drain(false);
        println!("sampled {} times", drained.len());
        assert!(drained.len() >= 5);
        // in order, no gaps
        for (i, position) in drained.wheels[3].iter().enumerate() {
            assert_eq!(position.distance.get::<meter>(), (i + 1) as f64);
        }
    }
}
