use crate::auto::aim::PointTowardCommand;
use crate::config::RobotConfig;
use crate::error::{Condition, SwerveError};
use crate::subsystems::auto_aim::AutoAim;
use crate::subsystems::swerve::geometry::{ChassisVelocity, Pose, WheelSetpoint, WheelState};
use crate::subsystems::swerve::heading::{Constraints, HeadingServoConfig};
use crate::subsystems::swerve::io::{GyroInputs, GyroIo, ModuleIo};
use crate::subsystems::swerve::kinematics::Kinematics;
use crate::subsystems::swerve::module::SwerveModule;
use crate::subsystems::swerve::odometry::{Odometry, OdometryMode};
use crate::subsystems::swerve::samples::SampleQueue;
use crate::telemetry::Telemetry;
use std::mem::discriminant;
use tracing::{debug, info, warn};
use uom::si::angle::{degree, radian};
use uom::si::f64::{Angle, Time};
use uom::si::length::meter;
use uom::si::time::second;

/// The hardware a Drivetrain runs on, in FL, FR, BL, BR order.
pub struct DrivetrainIo {
    pub modules: [Box<dyn ModuleIo>; 4],
    pub gyro: Box<dyn GyroIo>,
    /// Shared with whatever thread samples odometry.
    pub samples: SampleQueue,
}

/// Drivetrain struct.
/// kinematics field interfaces with the forward and inverse kinematics.
/// held_angles are where the wheels point when asked to stop, so they don't snap back to zero.
pub struct Drivetrain {
    kinematics: Kinematics,
    odometry: Odometry,
    modules: [SwerveModule; 4],
    gyro: Box<dyn GyroIo>,
    gyro_inputs: GyroInputs,
    samples: SampleQueue,

    auto_aim: AutoAim,
    heading_servo: HeadingServoConfig,
    control_period: f64,

    held_angles: [Angle; 4],
    setpoints: [WheelSetpoint; 4],

    conditions: Vec<Condition>,
    previous_conditions: Vec<Condition>,
    overflowed: usize,
}

/// Same condition, ignoring payloads that change every cycle.
fn same_kind(a: &Condition, b: &Condition) -> bool {
    match (a, b) {
        (Condition::StaleSetpoint { module: a }, Condition::StaleSetpoint { module: b }) => a == b,
        _ => discriminant(a) == discriminant(b),
    }
}

impl Drivetrain {
    pub fn new(
        config: &RobotConfig,
        io: DrivetrainIo,
        starting_pose: Pose,
    ) -> Result<Drivetrain, SwerveError> {
        config.validate()?;
        let kinematics = config.kinematics()?;
        let auto_aim = AutoAim::new(
            config.shot_table()?,
            Time::new::<second>(config.aim.lookahead_seconds),
            Angle::new::<degree>(config.aim.effector_heading_offset_degrees),
        );
        info!(
            shots = auto_aim.shot_table().len(),
            lookahead_s = auto_aim.lookahead().get::<second>(),
            "auto aim ready"
        );

        // fastest the chassis can spin with every wheel at max speed
        let max_angular_speed = kinematics.max_linear_speed() / kinematics.drive_base_radius();
        let heading_servo = HeadingServoConfig {
            kp: config.aim.heading_kp,
            ki: config.aim.heading_ki,
            kd: config.aim.heading_kd,
            constraints: Constraints {
                max_velocity: max_angular_speed,
                max_acceleration: max_angular_speed / config.aim.heading_max_accel_time_seconds,
            },
        };

        let [fl, fr, bl, br] = io.modules;
        let modules = [
            SwerveModule::new(0, fl),
            SwerveModule::new(1, fr),
            SwerveModule::new(2, bl),
            SwerveModule::new(3, br),
        ];

        Ok(Drivetrain {
            kinematics,
            odometry: Odometry::new(starting_pose),
            modules,
            gyro: io.gyro,
            gyro_inputs: GyroInputs::default(),
            samples: io.samples,
            auto_aim,
            heading_servo,
            control_period: config.drivetrain.control_period_seconds,
            held_angles: [Angle::new::<radian>(0.0); 4],
            setpoints: [WheelSetpoint::default(); 4],
            conditions: Vec::new(),
            previous_conditions: Vec::new(),
            overflowed: 0,
        })
    }

    /// ## Once per control cycle, before any command runs.
    /// Refreshes sensor inputs, folds every queued odometry sample into the pose, and stops
    /// the motors when the robot is disabled.
    pub fn periodic(&mut self, enabled: bool) {
        self.previous_conditions = std::mem::take(&mut self.conditions);

        self.gyro.update_inputs(&mut self.gyro_inputs);
        for module in self.modules.iter_mut() {
            module.update_inputs();
        }
        if !enabled {
            self.stop();
        }

        let gyro_fused = self.gyro_inputs.connected;
        if !gyro_fused {
            self.raise(Condition::SensorUnavailable);
        }

        let drained = self.samples.drain(gyro_fused);
        let modules = &mut self.modules;
        let wheel_deltas = std::array::from_fn(|i| modules[i].get_deltas(&drained.wheels[i]));
        let update = self.odometry.update(
            &self.kinematics,
            &wheel_deltas,
            &drained.headings,
            gyro_fused,
        );
        if drained.pending > 0 {
            self.raise(Condition::SampleUnderrun {
                processed: update.processed,
                pending: drained.pending,
            });
        }

        let overflowed = self.samples.overflowed();
        if overflowed > self.overflowed {
            warn!(
                dropped = overflowed - self.overflowed,
                "odometry queue overflowed, oldest samples dropped"
            );
            self.overflowed = overflowed;
        }
    }

    /// Records a condition for this cycle. Logged only when it wasn't already active last cycle.
    pub(crate) fn raise(&mut self, condition: Condition) {
        if self.conditions.iter().any(|c| same_kind(c, &condition)) {
            return;
        }
        if !self.previous_conditions.iter().any(|c| same_kind(c, &condition)) {
            warn!("{}", condition);
        }
        self.conditions.push(condition);
    }

    /// Conditions raised since the last periodic.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// ## Drives at a robot-relative velocity.
    /// Returns what each module was actually sent, after optimization.
    pub fn run_velocity(&mut self, velocity: ChassisVelocity) -> [WheelSetpoint; 4] {
        let discrete = velocity.discretize(self.control_period);
        let mut targets = self.kinematics.to_wheel_states(&discrete);

        if discrete.is_zero() {
            // nothing to do, leave the wheels pointed where they were
            for (target, angle) in targets.iter_mut().zip(self.held_angles) {
                target.angle = angle;
            }
        } else {
            self.held_angles = targets.map(|target| target.angle);
        }

        self.apply(targets)
    }

    /// Drives at a field-relative velocity, rotated by the current pose estimate.
    pub fn run_velocity_field_relative(&mut self, velocity: ChassisVelocity) -> [WheelSetpoint; 4] {
        let robot_relative = velocity.to_robot_relative(self.get_pose().angle);
        self.run_velocity(robot_relative)
    }

    pub fn stop_in_place(&mut self) -> [WheelSetpoint; 4] {
        self.run_velocity(ChassisVelocity::default())
    }

    /// Points every wheel at the center so the robot is hard to push.
    pub fn stop_in_x_formation(&mut self) -> [WheelSetpoint; 4] {
        self.held_angles = self.kinematics.x_formation();
        let targets = self.held_angles.map(|angle| WheelSetpoint::new(0.0, angle));
        self.apply(targets)
    }

    fn apply(&mut self, targets: [WheelSetpoint; 4]) -> [WheelSetpoint; 4] {
        let mut sent = targets;
        let mut stale = Vec::new();
        for (index, (module, target)) in self.modules.iter_mut().zip(targets).enumerate() {
            sent[index] = module.run_setpoint(target);
            if !module.is_initialized() {
                stale.push(index);
            }
        }
        for module in stale {
            self.raise(Condition::StaleSetpoint { module });
        }

        self.setpoints = sent;
        sent
    }

    /// Zero volts on every motor.
    pub fn stop(&mut self) {
        for module in self.modules.iter_mut() {
            module.stop();
        }
        for setpoint in self.setpoints.iter_mut() {
            setpoint.speed = 0.0;
        }
    }

    /// ## Gets the pose estimate.
    /// Note: only reflects samples folded in by the last periodic.
    pub fn get_pose(&self) -> Pose {
        self.odometry.pose_estimate
    }

    /// ## Set the robot's pose.
    /// Queued samples are thrown away and every baseline moved to the newest of them, so motion
    /// from before the reset never leaks into the new pose.
    pub fn set_pose(&mut self, pose: Pose) {
        let heading_baseline = match self.reseed_from_queue() {
            Some(newest) => newest,
            None => self.odometry.heading_baseline(),
        };
        self.odometry.reset_pose(pose, heading_baseline);
    }

    /// ## Re-zeroes the gyro so it reads `yaw` and turns the pose estimate to match.
    /// The translation estimate is kept.
    pub fn set_yaw(&mut self, yaw: Angle) {
        self.gyro.set_yaw(yaw);
        self.gyro_inputs.yaw = yaw;
        // anything still queued was read in the old gyro frame
        self.reseed_from_queue();

        let pose = self.get_pose();
        let heading_baseline = self.gyro_inputs.connected.then_some(yaw);
        self.odometry
            .reset_pose(Pose::new(pose.x, pose.y, yaw), heading_baseline);
    }

    /// ## Empties the sample queue, moving each wheel baseline to its newest queued position.
    /// Returns the newest queued heading entry, or None when the heading stream was empty.
    fn reseed_from_queue(&mut self) -> Option<Option<Angle>> {
        let leftover = self.samples.drain_all();
        for (module, positions) in self.modules.iter_mut().zip(&leftover.wheels) {
            if let Some(newest) = positions.last() {
                module.reseed(*newest);
            }
        }
        debug!(dropped = leftover.headings.len(), "odometry queue emptied for reset");
        leftover.headings.last().copied()
    }

    pub fn get_module_states(&self) -> [WheelState; 4] {
        std::array::from_fn(|i| self.modules[i].get_state())
    }

    pub fn get_setpoints(&self) -> [WheelSetpoint; 4] {
        self.setpoints
    }

    /// Chassis velocity measured from the wheels, robot frame.
    pub fn get_robot_relative_velocity(&self) -> ChassisVelocity {
        self.kinematics.to_chassis_velocity(&self.get_module_states())
    }

    /// Chassis velocity measured from the wheels, field frame.
    pub fn get_velocity(&self) -> ChassisVelocity {
        self.get_robot_relative_velocity()
            .to_field_relative(self.get_pose().angle)
    }

    pub fn odometry_mode(&self) -> OdometryMode {
        self.odometry.mode()
    }

    /// ## Drive with the given field-relative translation while the heading servo aims at `target`.
    /// The returned command has to be executed every cycle.
    pub fn point_toward_while_driving(
        &mut self,
        vx: f64,
        vy: f64,
        target: Pose,
    ) -> PointTowardCommand {
        debug!(vx, vy, ?target, "point toward while driving");
        PointTowardCommand::new(self, vx, vy, target)
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn auto_aim_mut(&mut self) -> &mut AutoAim {
        &mut self.auto_aim
    }

    pub fn heading_servo_config(&self) -> &HeadingServoConfig {
        &self.heading_servo
    }

    /// seconds
    pub fn control_period(&self) -> f64 {
        self.control_period
    }

    pub fn post_odo(&self, telemetry: &mut dyn Telemetry) {
        let pose = self.get_pose();
        telemetry.put_number("odo_x", pose.x.get::<meter>());
        telemetry.put_number("odo_y", pose.y.get::<meter>());
        telemetry.put_number("odo_heading", pose.angle.get::<radian>());
        telemetry.put_bool(
            "odo_gyro_fused",
            self.odometry_mode() == OdometryMode::GyroFused,
        );

        let velocity = self.get_velocity();
        telemetry.put_number("odo_vx", velocity.vx);
        telemetry.put_number("odo_vy", velocity.vy);
        telemetry.put_number("odo_omega", velocity.omega);

        for (i, (state, setpoint)) in self
            .get_module_states()
            .iter()
            .zip(self.setpoints.iter())
            .enumerate()
        {
            let module = &self.modules[i];
            telemetry.put_bool(&format!("module_{i}/connected"), module.is_connected());
            telemetry.put_number(
                &format!("module_{i}/position"),
                module.get_position().distance.get::<meter>(),
            );
            telemetry.put_number(&format!("module_{i}/speed"), state.speed);
            telemetry.put_number(&format!("module_{i}/angle"), state.angle.get::<radian>());
            telemetry.put_number(&format!("module_{i}/setpoint_speed"), setpoint.speed);
            telemetry.put_number(
                &format!("module_{i}/setpoint_angle"),
                setpoint.angle.get::<radian>(),
            );
        }
        telemetry.put_number("conditions", self.conditions.len() as f64);
    }
}

// run tests with cargo test -- --nocapture to see println! output
#[cfg(test)]
mod drivetrain_tests {
    use super::*;
    use crate::subsystems::swerve::sim::rig::{SAMPLES_PER_CYCLE, SimRig};
    use crate::telemetry::MemoryTelemetry;
    use float_cmp::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_pose_near(result: Pose, expected: Pose, epsilon: f64) {
        println!("result: {:?}", result);
        println!("expected: {:?}", expected);
        assert_approx_eq!(f64, result.x.get::<meter>(), expected.x.get::<meter>(), epsilon = epsilon);
        assert_approx_eq!(f64, result.y.get::<meter>(), expected.y.get::<meter>(), epsilon = epsilon);
        let heading_error = (result.angle - expected.angle).get::<radian>();
        assert!(heading_error.sin().abs() < epsilon, "heading error {}", heading_error);
    }

    fn drive(rig: &mut SimRig, velocity: ChassisVelocity, cycles: usize) {
        for _ in 0..cycles {
            rig.cycle(true);
            rig.drivetrain.run_velocity(velocity);
        }
    }

    #[test]
    fn odometry_tracks_straight_drive() {
        let mut rig = SimRig::new(Pose::default());
        drive(&mut rig, ChassisVelocity::new(1.0, 0.0, 0.0), 50);
        rig.cycle(true);

        let truth = rig.sim.true_pose();
        assert!(truth.x.get::<meter>() > 0.9);
        assert_pose_near(rig.drivetrain.get_pose(), truth, 1e-6);
        assert_eq!(rig.drivetrain.odometry_mode(), OdometryMode::GyroFused);
        assert!(rig.drivetrain.conditions().is_empty());
    }

    #[test]
    fn gyro_disconnect_mid_run_keeps_pose_continuous() {
        let start = Pose::from_meters(2.0, 1.0, 0.3);
        let mut rig = SimRig::new(start);
        let velocity = ChassisVelocity::new(1.0, 0.5, 0.8);

        drive(&mut rig, velocity, 25);
        rig.sim.set_gyro_connected(false);

        let mut last = rig.drivetrain.get_pose();
        for _ in 0..25 {
            rig.cycle(true);
            rig.drivetrain.run_velocity(velocity);
            assert_eq!(rig.drivetrain.odometry_mode(), OdometryMode::WheelsOnly);
            assert!(rig.drivetrain.conditions().contains(&Condition::SensorUnavailable));

            let pose = rig.drivetrain.get_pose();
            // ~3.8 m/s flat out is 0.08 m per cycle
            assert!(pose.translation_distance(&last).get::<meter>() < 0.1);
            last = pose;
        }
        assert_pose_near(rig.drivetrain.get_pose(), rig.sim.true_pose(), 1e-6);

        rig.sim.set_gyro_connected(true);
        drive(&mut rig, velocity, 25);
        rig.cycle(true);
        assert_eq!(rig.drivetrain.odometry_mode(), OdometryMode::GyroFused);
        assert!(!rig.drivetrain.conditions().contains(&Condition::SensorUnavailable));
        assert_pose_near(rig.drivetrain.get_pose(), rig.sim.true_pose(), 1e-6);
    }

    #[test]
    fn set_pose_reseeds() {
        let mut rig = SimRig::new(Pose::default());
        drive(&mut rig, ChassisVelocity::new(0.5, 0.5, 0.0), 10);
        rig.cycle(true);

        let reset_to = Pose::from_meters(5.0, 5.0, 1.0);
        rig.drivetrain.set_pose(reset_to);
        let truth_at_reset = rig.sim.true_pose();
        assert_eq!(rig.drivetrain.get_pose(), reset_to);

        drive(&mut rig, ChassisVelocity::new(1.0, 0.0, 0.5), 20);
        rig.cycle(true);

        let moved = truth_at_reset.log(&rig.sim.true_pose());
        assert_pose_near(rig.drivetrain.get_pose(), reset_to.exp(&moved), 1e-6);
    }

    /// One sampler read that lands after periodic and before the next one.
    fn sample_once(rig: &SimRig) {
        rig.sim
            .step(rig.drivetrain.control_period() / SAMPLES_PER_CYCLE as f64);
        rig.samples.push(&rig.sim.reading());
    }

    #[test]
    fn set_pose_discards_samples_queued_before_reset() {
        let mut rig = SimRig::new(Pose::default());
        let velocity = ChassisVelocity::new(1.0, 0.0, 0.5);
        drive(&mut rig, velocity, 10);
        sample_once(&rig);

        let reset_to = Pose::from_meters(5.0, 5.0, 0.0);
        rig.drivetrain.set_pose(reset_to);
        let truth_at_reset = rig.sim.true_pose();
        assert_eq!(rig.samples.pending(), 0);

        drive(&mut rig, velocity, 6);
        rig.cycle(true);

        let moved = truth_at_reset.log(&rig.sim.true_pose());
        assert_pose_near(rig.drivetrain.get_pose(), reset_to.exp(&moved), 1e-6);
    }

    #[test]
    fn gyro_reconnect_mid_cycle_stays_in_step() {
        let mut rig = SimRig::new(Pose::from_meters(1.0, 1.0, 0.0));
        let velocity = ChassisVelocity::new(1.0, 0.0, 0.8);
        drive(&mut rig, velocity, 10);
        rig.sim.set_gyro_connected(false);
        drive(&mut rig, velocity, 3);

        // the gyro misses the first two reads of this window
        for sample in 0..SAMPLES_PER_CYCLE {
            rig.sim.set_gyro_connected(sample >= 2);
            sample_once(&rig);
        }
        rig.drivetrain.periodic(true);
        rig.drivetrain.run_velocity(velocity);
        assert_eq!(rig.drivetrain.odometry_mode(), OdometryMode::GyroFused);
        assert_eq!(rig.samples.pending(), 0);

        for _ in 0..10 {
            rig.cycle(true);
            rig.drivetrain.run_velocity(velocity);
            assert_eq!(rig.samples.pending(), 0);
            assert!(
                !rig.drivetrain
                    .conditions()
                    .iter()
                    .any(|condition| matches!(condition, Condition::SampleUnderrun { .. }))
            );
        }
        assert_pose_near(rig.drivetrain.get_pose(), rig.sim.true_pose(), 1e-6);
    }

    #[test]
    fn set_yaw_rezeroes_the_gyro() {
        let mut rig = SimRig::new(Pose::from_meters(1.0, 2.0, 0.0));
        let velocity = ChassisVelocity::new(1.0, 0.0, 0.5);
        drive(&mut rig, velocity, 10);
        sample_once(&rig);

        let before = rig.drivetrain.get_pose();
        rig.drivetrain.set_yaw(Angle::new::<radian>(FRAC_PI_2));
        let reset_to = rig.drivetrain.get_pose();
        let truth_at_reset = rig.sim.true_pose();
        assert_eq!(reset_to.x, before.x);
        assert_eq!(reset_to.y, before.y);
        assert_approx_eq!(f64, reset_to.angle.get::<radian>(), FRAC_PI_2);

        drive(&mut rig, velocity, 10);
        rig.cycle(true);
        let moved = truth_at_reset.log(&rig.sim.true_pose());
        let pose = rig.drivetrain.get_pose();
        assert_pose_near(pose, reset_to.exp(&moved), 1e-6);

        // odometry and the gyro agree in the new frame
        let mut inputs = GyroInputs::default();
        rig.sim.gyro_io().update_inputs(&mut inputs);
        let heading_error = (inputs.yaw - pose.angle).get::<radian>();
        assert!(heading_error.sin().abs() < 1e-6, "heading error {}", heading_error);
    }

    #[test]
    fn zero_velocity_holds_wheel_angles() {
        let mut rig = SimRig::new(Pose::default());
        drive(&mut rig, ChassisVelocity::new(0.0, 1.0, 0.0), 10);

        rig.cycle(true);
        let held = rig.drivetrain.stop_in_place();
        for setpoint in held {
            assert_approx_eq!(f64, setpoint.speed, 0.0);
            assert_approx_eq!(f64, setpoint.angle.get::<radian>(), FRAC_PI_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn x_formation() {
        let mut rig = SimRig::new(Pose::default());
        rig.cycle(true);
        let sent = rig.drivetrain.stop_in_x_formation();
        let expected = rig.drivetrain.kinematics().x_formation();
        for (setpoint, angle) in sent.iter().zip(expected) {
            assert_approx_eq!(f64, setpoint.speed, 0.0);
            // optimization may have flipped it, either way it's on the same line
            let difference = (setpoint.angle - angle).get::<radian>();
            assert!(difference.sin().abs() < 1e-9);
        }
    }

    #[test]
    fn disconnected_module_is_stale() {
        let mut rig = SimRig::new(Pose::default());
        drive(&mut rig, ChassisVelocity::new(1.0, 0.0, 0.0), 3);
        let before = rig.drivetrain.get_setpoints()[2];

        rig.sim.set_module_connected(2, false);
        rig.cycle(true);
        let sent = rig.drivetrain.run_velocity(ChassisVelocity::new(0.0, 1.0, 0.0));

        assert_eq!(sent[2], before);
        assert!(
            rig.drivetrain
                .conditions()
                .contains(&Condition::StaleSetpoint { module: 2 })
        );
        assert!(
            !rig.drivetrain
                .conditions()
                .contains(&Condition::StaleSetpoint { module: 0 })
        );
    }

    #[test]
    fn disabled_stops_the_robot() {
        let mut rig = SimRig::new(Pose::default());
        drive(&mut rig, ChassisVelocity::new(1.0, 0.0, 0.0), 10);

        rig.cycle(false);
        let stopped_at = rig.sim.true_pose();
        for _ in 0..5 {
            rig.cycle(false);
        }
        assert_pose_near(rig.sim.true_pose(), stopped_at, 1e-9);
        for setpoint in rig.drivetrain.get_setpoints() {
            assert_approx_eq!(f64, setpoint.speed, 0.0);
        }
    }

    #[test]
    fn measured_velocity() {
        let mut rig = SimRig::new(Pose::from_meters(0.0, 0.0, FRAC_PI_2));
        drive(&mut rig, ChassisVelocity::new(1.0, 0.0, 0.0), 10);
        rig.cycle(true);

        let robot = rig.drivetrain.get_robot_relative_velocity();
        assert_approx_eq!(f64, robot.vx, 1.0, epsilon = 1e-9);
        assert_approx_eq!(f64, robot.vy, 0.0, epsilon = 1e-9);

        // facing field +y
        let field = rig.drivetrain.get_velocity();
        assert_approx_eq!(f64, field.vx, 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, field.vy, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn field_relative_drive() {
        let mut rig = SimRig::new(Pose::from_meters(0.0, 0.0, FRAC_PI_2));
        for _ in 0..30 {
            rig.cycle(true);
            rig.drivetrain
                .run_velocity_field_relative(ChassisVelocity::new(1.0, 0.0, 0.0));
        }
        rig.cycle(true);
        let pose = rig.drivetrain.get_pose();
        assert!(pose.x.get::<meter>() > 0.4);
        assert_pose_near(pose, rig.sim.true_pose(), 1e-6);

        // wheels have finished steering, all motion is along field +x
        let field = rig.drivetrain.get_velocity();
        assert_approx_eq!(f64, field.vx, 1.0, epsilon = 1e-9);
        assert_approx_eq!(f64, field.vy, 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, pose.angle.get::<radian>(), FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn post_odo_publishes() {
        let mut rig = SimRig::new(Pose::from_meters(1.0, 2.0, 0.0));
        rig.cycle(true);
        let mut telemetry = MemoryTelemetry::default();
        rig.drivetrain.post_odo(&mut telemetry);

        assert_eq!(telemetry.get("odo_x"), Some(1.0));
        assert_eq!(telemetry.get("odo_y"), Some(2.0));
        assert_eq!(telemetry.get("odo_gyro_fused"), Some(1.0));
        assert!(telemetry.get("module_3/setpoint_angle").is_some());
        assert_eq!(telemetry.get("module_1/connected"), Some(1.0));
        assert!(telemetry.get("module_0/position").is_some());
    }
}
