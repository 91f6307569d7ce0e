use crate::constants::drivetrain::{DRIVE_KV, SIM_TURN_RATE_RADIANS_PER_SECOND};
use crate::subsystems::swerve::geometry::{Pose, WheelDelta, WheelPosition, wrap_radians};
use crate::subsystems::swerve::io::{
    GyroInputs, GyroIo, ModuleInputs, ModuleIo, OdometryReading, OdometrySource,
};
use crate::subsystems::swerve::kinematics::Kinematics;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

#[derive(Clone, Copy, Debug)]
struct SimModule {
    connected: bool,
    /// meters
    drive_position: f64,
    /// meters/second
    drive_velocity: f64,
    target_velocity: f64,
    /// radians
    turn_angle: f64,
    target_angle: f64,
}

impl Default for SimModule {
    fn default() -> Self {
        SimModule {
            connected: true,
            drive_position: 0.0,
            drive_velocity: 0.0,
            target_velocity: 0.0,
            turn_angle: 0.0,
            target_angle: 0.0,
        }
    }
}

#[derive(Debug)]
struct SimState {
    kinematics: Kinematics,
    modules: [SimModule; 4],
    pose: Pose,
    /// radians, starts at zero no matter where the robot starts
    yaw: f64,
    yaw_velocity: f64,
    gyro_connected: bool,
}

/// ## Ideal swerve drivetrain.
/// Drive motors hit their target speed instantly, steering slews at a fixed rate, wheels never
/// slip. Cloning shares the same robot.
#[derive(Clone, Debug)]
pub struct SimDrivetrain {
    state: Arc<Mutex<SimState>>,
}

impl SimDrivetrain {
    pub fn new(kinematics: Kinematics, starting_pose: Pose) -> SimDrivetrain {
        SimDrivetrain {
            state: Arc::new(Mutex::new(SimState {
                kinematics,
                modules: [SimModule::default(); 4],
                pose: starting_pose,
                yaw: 0.0,
                yaw_velocity: 0.0,
                gyro_connected: true,
            })),
        }
    }

    /// Advances the physics by dt seconds.
    pub fn step(&self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let mut state = self.state.lock();
        let max_turn = SIM_TURN_RATE_RADIANS_PER_SECOND * dt;

        let mut deltas = [WheelDelta::default(); 4];
        for (module, delta) in state.modules.iter_mut().zip(deltas.iter_mut()) {
            let turn_error = wrap_radians(module.target_angle - module.turn_angle);
            module.turn_angle =
                wrap_radians(module.turn_angle + turn_error.clamp(-max_turn, max_turn));
            module.drive_velocity = module.target_velocity;
            module.drive_position += module.drive_velocity * dt;

            *delta = WheelDelta {
                distance: Length::new::<meter>(module.drive_velocity * dt),
                angle: Angle::new::<radian>(module.turn_angle),
            };
        }

        let twist = state.kinematics.to_twist(&deltas);
        let dtheta = twist.dtheta.get::<radian>();
        state.pose = state.pose.exp(&twist);
        state.yaw = wrap_radians(state.yaw + dtheta);
        state.yaw_velocity = dtheta / dt;
    }

    /// Where the robot really is.
    pub fn true_pose(&self) -> Pose {
        self.state.lock().pose
    }

    /// What the odometry signals read right now.
    pub fn reading(&self) -> OdometryReading {
        let state = self.state.lock();
        OdometryReading {
            wheels: state.modules.map(|module| WheelPosition {
                distance: Length::new::<meter>(module.drive_position),
                angle: Angle::new::<radian>(module.turn_angle),
            }),
            heading: state
                .gyro_connected
                .then(|| Angle::new::<radian>(state.yaw)),
        }
    }

    pub fn set_gyro_connected(&self, connected: bool) {
        self.state.lock().gyro_connected = connected;
    }

    pub fn set_module_connected(&self, module: usize, connected: bool) {
        if let Some(module) = self.state.lock().modules.get_mut(module) {
            module.connected = connected;
        }
    }

    pub fn module_io(&self, index: usize) -> SimModuleIo {
        SimModuleIo {
            state: self.state.clone(),
            index,
        }
    }

    pub fn module_ios(&self) -> [Box<dyn ModuleIo>; 4] {
        std::array::from_fn(|index| Box::new(self.module_io(index)) as Box<dyn ModuleIo>)
    }

    pub fn gyro_io(&self) -> SimGyroIo {
        SimGyroIo {
            state: self.state.clone(),
        }
    }

    /// A source for the sampler thread. Each sample steps the physics by the wall time
    /// since the previous sample, so the sim runs in real time.
    pub fn odometry_source(&self) -> SimOdometrySource {
        SimOdometrySource {
            sim: self.clone(),
            last_sample: None,
        }
    }
}

pub struct SimModuleIo {
    state: Arc<Mutex<SimState>>,
    index: usize,
}

impl SimModuleIo {
    fn with_module(&self, f: impl FnOnce(&mut SimModule)) {
        let mut state = self.state.lock();
        match state.modules.get_mut(self.index) {
            Some(module) if module.connected => f(module),
            _ => {}
        }
    }
}

impl ModuleIo for SimModuleIo {
    fn update_inputs(&mut self, inputs: &mut ModuleInputs) {
        let state = self.state.lock();
        let Some(module) = state.modules.get(self.index) else {
            inputs.connected = false;
            return;
        };
        inputs.connected = module.connected;
        if module.connected {
            inputs.drive_position = Length::new::<meter>(module.drive_position);
            inputs.drive_velocity = module.drive_velocity;
            inputs.turn_position = Angle::new::<radian>(module.turn_angle);
        }
    }

    fn set_drive_velocity(&mut self, velocity: f64) {
        self.with_module(|module| module.target_velocity = velocity);
    }

    fn set_turn_position(&mut self, angle: Angle) {
        self.with_module(|module| module.target_angle = wrap_radians(angle.get::<radian>()));
    }

    fn set_drive_voltage(&mut self, volts: f64) {
        self.with_module(|module| module.target_velocity = volts / DRIVE_KV);
    }

    fn set_turn_voltage(&mut self, _volts: f64) {
        // no steering model below position control, just stop where it is
        self.with_module(|module| module.target_angle = module.turn_angle);
    }
}

pub struct SimGyroIo {
    state: Arc<Mutex<SimState>>,
}

impl GyroIo for SimGyroIo {
    fn update_inputs(&mut self, inputs: &mut GyroInputs) {
        let state = self.state.lock();
        inputs.connected = state.gyro_connected;
        if state.gyro_connected {
            inputs.yaw = Angle::new::<radian>(state.yaw);
            inputs.yaw_velocity = state.yaw_velocity;
        }
    }

    fn set_yaw(&mut self, yaw: Angle) {
        let mut state = self.state.lock();
        if state.gyro_connected {
            state.yaw = wrap_radians(yaw.get::<radian>());
        }
    }
}

pub struct SimOdometrySource {
    sim: SimDrivetrain,
    last_sample: Option<Instant>,
}

impl OdometrySource for SimOdometrySource {
    fn sample(&mut self) -> OdometryReading {
        let now = Instant::now();
        if let Some(last_sample) = self.last_sample {
            self.sim.step((now - last_sample).as_secs_f64());
        }
        self.last_sample = Some(now);
        self.sim.reading()
    }
}

/// Deterministic harness: a drivetrain on top of the sim with the sampler run by hand.
#[cfg(test)]
pub(crate) mod rig {
    use super::*;
    use crate::config::RobotConfig;
    use crate::subsystems::swerve::drivetrain::{Drivetrain, DrivetrainIo};
    use crate::subsystems::swerve::samples::SampleQueue;

    /// Odometry samples per control cycle, 250hz against 50hz.
    pub const SAMPLES_PER_CYCLE: usize = 5;

    pub struct SimRig {
        pub sim: SimDrivetrain,
        pub samples: SampleQueue,
        pub drivetrain: Drivetrain,
    }

    impl SimRig {
        pub fn new(starting_pose: Pose) -> SimRig {
            let config = RobotConfig::default();
            let kinematics = config.kinematics().expect("valid geometry");
            let sim = SimDrivetrain::new(kinematics, starting_pose);
            let samples = SampleQueue::new(config.drivetrain.odometry_queue_capacity);
            let io = DrivetrainIo {
                modules: sim.module_ios(),
                gyro: Box::new(sim.gyro_io()),
                samples: samples.clone(),
            };
            let drivetrain = Drivetrain::new(&config, io, starting_pose).expect("valid config");
            SimRig {
                sim,
                samples,
                drivetrain,
            }
        }

        /// One control period of physics and sampling, then the drivetrain's periodic.
        pub fn cycle(&mut self, enabled: bool) {
            let dt = self.drivetrain.control_period() / SAMPLES_PER_CYCLE as f64;
            for _ in 0..SAMPLES_PER_CYCLE {
                self.sim.step(dt);
                self.samples.push(&self.sim.reading());
            }
            self.drivetrain.periodic(enabled);
        }
    }
}
