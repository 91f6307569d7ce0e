use crate::auto::aim::PointTowardCommand;
use crate::config::RobotConfig;
use crate::error::SwerveError;
use crate::subsystems::swerve::drivetrain::{Drivetrain, DrivetrainIo};
use crate::subsystems::swerve::geometry::{ChassisVelocity, Pose};
use crate::telemetry::Telemetry;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub mod auto;
pub mod config;
pub mod constants;
pub mod error;
pub mod subsystems;
pub mod telemetry;

/// One frame of driver sticks, each axis in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriverInput {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    /// Held to aim while driving.
    pub aim: bool,
}

#[derive(Clone)]
pub struct Ferris {
    pub drivetrain: Rc<RefCell<Drivetrain>>,
    pub aim_command: Option<PointTowardCommand>,
    /// Where aiming points the effector.
    pub target: Pose,
    pub field_oriented: bool,
    /// meters/second at full stick
    max_linear_speed: f64,
    /// radians/second at full stick
    max_angular_speed: f64,
    pub dt: Duration,
}

impl Ferris {
    pub fn new(config: &RobotConfig, io: DrivetrainIo) -> Result<Ferris, SwerveError> {
        let drivetrain = Drivetrain::new(config, io, Pose::default())?;
        let max_linear_speed = drivetrain.kinematics().max_linear_speed();
        let max_angular_speed = max_linear_speed / drivetrain.kinematics().drive_base_radius();

        Ok(Ferris {
            drivetrain: Rc::new(RefCell::new(drivetrain)),
            aim_command: None,
            target: config.target(),
            field_oriented: config.drivetrain.field_oriented,
            max_linear_speed,
            max_angular_speed,
            dt: Duration::from_millis(0),
        })
    }

    /// Runs the drivetrain's periodic. Call once per loop before teleop.
    pub fn periodic(&self, enabled: bool) {
        if let Ok(mut drivetrain) = self.drivetrain.try_borrow_mut() {
            drivetrain.periodic(enabled);
        }
    }

    pub fn stop(&mut self) {
        if let Some(command) = self.aim_command.as_mut() {
            command.cancel();
        }
        self.aim_command = None;
        if let Ok(mut drivetrain) = self.drivetrain.try_borrow_mut() {
            drivetrain.stop();
        }
        // other subsystems here
    }

    pub fn post(&self, telemetry: &mut dyn Telemetry) {
        if let Ok(drivetrain) = self.drivetrain.try_borrow() {
            drivetrain.post_odo(telemetry);
        }
        // loop rate from the last measured cycle
        if self.dt > Duration::ZERO {
            telemetry.put_number("Loop Rate", 1. / self.dt.as_secs_f64());
        }
        telemetry.put_bool("Aiming", self.aim_command.is_some());
        if let Some(command) = &self.aim_command {
            command.post(telemetry);
        }
    }
}

pub fn teleop(ferris: &mut Ferris, input: &DriverInput) {
    let drivetrain = ferris.drivetrain.clone();
    let Ok(mut drivetrain) = drivetrain.try_borrow_mut() else {
        return;
    };

    let translation = ChassisVelocity::new(
        input.x * ferris.max_linear_speed,
        input.y * ferris.max_linear_speed,
        input.rotation * ferris.max_angular_speed,
    );

    if input.aim {
        // aiming is always field relative, the servo owns rotation
        let field = if ferris.field_oriented {
            translation
        } else {
            translation.to_field_relative(drivetrain.get_pose().angle)
        };

        let target = ferris.target;
        let command = ferris.aim_command.get_or_insert_with(|| {
            drivetrain.point_toward_while_driving(field.vx, field.vy, target)
        });
        command.execute(&mut drivetrain, field.vx, field.vy);
        return;
    }

    if let Some(mut command) = ferris.aim_command.take() {
        command.cancel();
    }
    if ferris.field_oriented {
        drivetrain.run_velocity_field_relative(translation);
    } else {
        drivetrain.run_velocity(translation);
    }
}
