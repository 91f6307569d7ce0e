#![warn(non_snake_case)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use swerve_core::config::RobotConfig;
use swerve_core::constants::config::DEFAULT_CONFIG_PATH;
use swerve_core::error::SwerveError;
use swerve_core::subsystems::swerve::drivetrain::DrivetrainIo;
use swerve_core::subsystems::swerve::geometry::Pose;
use swerve_core::subsystems::swerve::io::spawn_sampler;
use swerve_core::subsystems::swerve::samples::SampleQueue;
use swerve_core::subsystems::swerve::sim::SimDrivetrain;
use swerve_core::telemetry::{MemoryTelemetry, TracingTelemetry};
use swerve_core::{DriverInput, Ferris, teleop};
use tokio::task::{self, spawn_local};
use tokio::time::{Duration, Instant, sleep};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long the scripted run lasts, seconds.
const RUN_SECONDS: f64 = 6.0;
/// Gyro is unplugged for this window of the run, seconds.
const GYRO_DROPOUT: std::ops::Range<f64> = 4.0..5.0;
/// Loop overrun that trips the watchdog, milliseconds.
const WATCHDOG_MILLIS: u64 = 150;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_millis() as u64)
        .unwrap_or(0)
}

/// Stand-in for the driver: drive, aim while strafing, then spin.
fn scripted_input(t: f64) -> DriverInput {
    if t < 1.5 {
        DriverInput {
            x: 0.3,
            y: 0.1,
            ..DriverInput::default()
        }
    } else if t < 4.0 {
        DriverInput {
            y: 0.2,
            aim: true,
            ..DriverInput::default()
        }
    } else {
        DriverInput {
            rotation: 0.2,
            ..DriverInput::default()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), SwerveError> {
    let config = RobotConfig::load(DEFAULT_CONFIG_PATH)?;

    // simulated hardware; swap these for real ModuleIo/GyroIo/OdometrySource on a robot
    let sim = SimDrivetrain::new(config.kinematics()?, Pose::default());
    let samples = SampleQueue::new(config.drivetrain.odometry_queue_capacity);

    // the sampler runs on its own thread at the odometry rate
    let running = Arc::new(AtomicBool::new(true));
    let sampler = spawn_sampler(
        sim.odometry_source(),
        samples.clone(),
        config.drivetrain.odometry_frequency_hz,
        running.clone(),
    )?;

    let io = DrivetrainIo {
        modules: sim.module_ios(),
        gyro: Box::new(sim.gyro_io()),
        samples,
    };
    // we create our ferris here
    let ferris = Rc::new(RefCell::new(Ferris::new(&config, io)?));
    let control_period = Duration::from_secs_f64(config.drivetrain.control_period_seconds);
    let mut telemetry = MemoryTelemetry::default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = task::LocalSet::new();

    runtime.block_on(local.run_until(async {
        // Watchdog setup
        let last_loop_time = Arc::new(AtomicU64::new(0));
        let watchdog_last_loop = Arc::clone(&last_loop_time);
        let watchdog_ferris = ferris.clone();

        spawn_local(async move {
            loop {
                sleep(Duration::from_millis(20)).await;
                let last = watchdog_last_loop.load(Ordering::Relaxed);
                let now = now_millis();

                // if more than 150 ms has passed the loop has overrun and the watchdog triggers
                if last != 0 && now.saturating_sub(last) > WATCHDOG_MILLIS {
                    warn!(overrun_ms = now - last, "loop overrun");
                    if let Ok(mut ferris) = watchdog_ferris.try_borrow_mut() {
                        ferris.stop();
                        warn!("watchdog triggered: motors stopped");
                    } else {
                        error!("watchdog failed to get ferris to stop");
                    }
                }
            }
        });

        info!("control loop started");
        let start = Instant::now();
        let mut last_loop = Instant::now();
        loop {
            let t = start.elapsed().as_secs_f64();
            if t >= RUN_SECONDS {
                break;
            }
            let dt = last_loop.elapsed();
            last_loop = Instant::now();

            sim.set_gyro_connected(!GYRO_DROPOUT.contains(&t));

            if let Ok(mut robot) = ferris.try_borrow_mut() {
                robot.dt = dt;
                robot.periodic(true);
                teleop(&mut robot, &scripted_input(t));
                robot.post(&mut TracingTelemetry);
                robot.post(&mut telemetry);
            }

            // update watchdog
            last_loop_time.store(now_millis(), Ordering::Relaxed);

            // enforce the control period
            let left = control_period.saturating_sub(last_loop.elapsed());
            sleep(left).await;
        }

        if let Ok(mut robot) = ferris.try_borrow_mut() {
            robot.stop();
        }
    }));

    running.store(false, Ordering::Relaxed);
    if sampler.join().is_err() {
        warn!("odometry sampler panicked");
    }

    let (pose, truth) = (ferris.borrow().drivetrain.borrow().get_pose(), sim.true_pose());
    info!(?pose, ?truth, "finished");
    println!("{}", telemetry.to_json()?);
    Ok(())
}
