use crate::subsystems::auto_aim::AimSolution;
use crate::subsystems::swerve::drivetrain::Drivetrain;
use crate::subsystems::swerve::geometry::{ChassisVelocity, Pose};
use crate::subsystems::swerve::heading::{HeadingServo, ServoState};
use crate::telemetry::Telemetry;
use tracing::debug;

/// ## Drive with a driver-chosen field translation while the robot turns to aim.
/// Rotation comes from the heading servo, translation passes through untouched. The aim goal
/// is recomputed every cycle from the latest pose and velocity.
#[derive(Clone, Debug)]
pub struct PointTowardCommand {
    target: Pose,
    servo: HeadingServo,
    last_solution: AimSolution,
}

impl PointTowardCommand {
    pub fn new(drivetrain: &mut Drivetrain, vx: f64, vy: f64, target: Pose) -> PointTowardCommand {
        let mut servo = HeadingServo::new(drivetrain.heading_servo_config());
        let pose = drivetrain.get_pose();
        servo.arm(pose.angle);

        let field_velocity = ChassisVelocity::new(vx, vy, drivetrain.get_velocity().omega);
        let last_solution = drivetrain
            .auto_aim_mut()
            .aim_heading(&pose, &target, &field_velocity);

        PointTowardCommand {
            target,
            servo,
            last_solution,
        }
    }

    /// ## Runs one cycle. vx and vy are field-relative, meters/second.
    /// Returns the field-relative velocity sent to the drivetrain, None once cancelled.
    pub fn execute(&mut self, drivetrain: &mut Drivetrain, vx: f64, vy: f64) -> Option<ChassisVelocity> {
        if !self.servo.is_active() {
            return None;
        }

        let pose = drivetrain.get_pose();
        let field_velocity = ChassisVelocity::new(vx, vy, drivetrain.get_velocity().omega);
        let solution = drivetrain
            .auto_aim_mut()
            .aim_heading(&pose, &self.target, &field_velocity);
        for condition in solution.conditions() {
            drivetrain.raise(condition);
        }
        self.last_solution = solution;

        let omega = self
            .servo
            .calculate(pose.angle, solution.heading, drivetrain.control_period())?;
        let command = ChassisVelocity::new(vx, vy, omega);
        drivetrain.run_velocity_field_relative(command);
        Some(command)
    }

    pub fn cancel(&mut self) {
        self.servo.cancel();
    }

    /// Restarts the heading profile from wherever the robot points now.
    pub fn rearm(&mut self, drivetrain: &Drivetrain) {
        debug!("point toward rearmed");
        self.servo.arm(drivetrain.get_pose().angle);
    }

    pub fn is_active(&self) -> bool {
        self.servo.is_active()
    }

    pub fn state(&self) -> ServoState {
        self.servo.state()
    }

    pub fn target(&self) -> Pose {
        self.target
    }

    pub fn last_solution(&self) -> &AimSolution {
        &self.last_solution
    }

    pub fn post(&self, telemetry: &mut dyn Telemetry) {
        self.last_solution.post(telemetry);
        telemetry.put_bool("AutoAim/Active", self.is_active());
        telemetry.put_number("AutoAim/SetpointHeading", self.servo.setpoint().position);
        telemetry.put_number("AutoAim/SetpointVelocity", self.servo.setpoint().velocity);
    }
}

#[cfg(test)]
mod aim_tests {
    use super::*;
    use crate::subsystems::swerve::geometry::wrap_radians;
    use crate::subsystems::swerve::sim::rig::SimRig;
    use crate::telemetry::MemoryTelemetry;
    use float_cmp::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;
    use uom::si::angle::radian;

    #[test]
    fn translation_passes_through() {
        let mut rig = SimRig::new(Pose::from_meters(3.0, 3.0, 0.0));
        rig.cycle(true);
        let mut command =
            rig.drivetrain
                .point_toward_while_driving(1.0, 0.5, Pose::from_meters(3.0, 6.0, 0.0));
        assert_eq!(command.state(), ServoState::Armed);

        rig.cycle(true);
        let sent = command
            .execute(&mut rig.drivetrain, 1.0, 0.5)
            .expect("command is active");
        assert_approx_eq!(f64, sent.vx, 1.0);
        assert_approx_eq!(f64, sent.vy, 0.5);
        assert_eq!(command.state(), ServoState::Tracking);
    }

    #[test]
    fn cancelled_command_does_nothing() {
        let mut rig = SimRig::new(Pose::default());
        rig.cycle(true);
        let mut command =
            rig.drivetrain
                .point_toward_while_driving(0.0, 0.0, Pose::from_meters(3.0, 0.0, 0.0));
        command.cancel();
        assert!(!command.is_active());

        rig.cycle(true);
        assert_eq!(command.execute(&mut rig.drivetrain, 1.0, 0.0), None);

        command.rearm(&rig.drivetrain);
        assert_eq!(command.state(), ServoState::Armed);
    }

    #[test]
    fn turns_the_effector_to_the_target() {
        // effector is on the back, target is straight up field
        let mut rig = SimRig::new(Pose::from_meters(3.0, 3.0, 0.0));
        rig.cycle(true);
        let mut command =
            rig.drivetrain
                .point_toward_while_driving(0.0, 0.0, Pose::from_meters(3.0, 6.0, 0.0));

        for _ in 0..150 {
            rig.cycle(true);
            command.execute(&mut rig.drivetrain, 0.0, 0.0);
        }

        let heading = rig.drivetrain.get_pose().angle.get::<radian>();
        println!("heading: {}", heading);
        assert!(wrap_radians(heading + FRAC_PI_2).abs() < 0.05);
        assert!(!command.last_solution().held);

        let mut telemetry = MemoryTelemetry::default();
        command.post(&mut telemetry);
        assert_eq!(telemetry.get("AutoAim/Active"), Some(1.0));
        assert!(telemetry.get("AutoAim/VirtualTarget/y").is_some());
    }

    #[test]
    fn out_of_table_range_is_raised() {
        // 0.5 m away, the table starts at 1 m
        let mut rig = SimRig::new(Pose::from_meters(3.0, 3.0, 0.0));
        rig.cycle(true);
        let mut command =
            rig.drivetrain
                .point_toward_while_driving(0.0, 0.0, Pose::from_meters(3.5, 3.0, 0.0));
        rig.cycle(true);
        command.execute(&mut rig.drivetrain, 0.0, 0.0);

        assert!(command.last_solution().shot.clamped);
        assert!(rig.drivetrain.conditions().iter().any(|condition| matches!(
            condition,
            crate::error::Condition::RangeOutOfTable { .. }
        )));
    }
}
