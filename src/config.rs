use crate::constants::{auto_aim, config as defaults, drivetrain, field};
use crate::error::SwerveError;
use crate::subsystems::shot_table::{ShotParameters, ShotTable};
use crate::subsystems::swerve::geometry::Pose;
use crate::subsystems::swerve::kinematics::Kinematics;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uom::si::f64::Length;
use uom::si::length::inch;
use uom::si::velocity::{foot_per_second, meter_per_second};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub track_width_x_inches: f64,
    pub track_width_y_inches: f64,
    pub max_linear_speed_feet_per_second: f64,
    pub odometry_frequency_hz: f64,
    pub control_period_seconds: f64,
    pub odometry_queue_capacity: usize,
    pub field_oriented: bool,
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        DrivetrainConfig {
            track_width_x_inches: defaults::TRACK_WIDTH_X_INCHES,
            track_width_y_inches: defaults::TRACK_WIDTH_Y_INCHES,
            max_linear_speed_feet_per_second: drivetrain::MAX_LINEAR_SPEED_FEET_PER_SECOND,
            odometry_frequency_hz: drivetrain::ODOMETRY_FREQUENCY_HZ,
            control_period_seconds: drivetrain::CONTROL_PERIOD_SECONDS,
            odometry_queue_capacity: drivetrain::ODOMETRY_QUEUE_CAPACITY,
            field_oriented: defaults::FIELD_ORIENTED,
        }
    }
}

impl DrivetrainConfig {
    /// meters/second
    pub fn max_linear_speed(&self) -> f64 {
        uom::si::f64::Velocity::new::<foot_per_second>(self.max_linear_speed_feet_per_second)
            .get::<meter_per_second>()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AimConfig {
    pub lookahead_seconds: f64,
    pub effector_heading_offset_degrees: f64,
    pub heading_kp: f64,
    pub heading_ki: f64,
    pub heading_kd: f64,
    /// Time to reach max angular speed from rest.
    pub heading_max_accel_time_seconds: f64,
    pub target_x_meters: f64,
    pub target_y_meters: f64,
}

impl Default for AimConfig {
    fn default() -> Self {
        AimConfig {
            lookahead_seconds: auto_aim::LOOKAHEAD_TIME_SECONDS,
            effector_heading_offset_degrees: auto_aim::EFFECTOR_HEADING_OFFSET_DEGREES,
            heading_kp: auto_aim::HEADING_KP,
            heading_ki: auto_aim::HEADING_KI,
            heading_kd: auto_aim::HEADING_KD,
            heading_max_accel_time_seconds: auto_aim::HEADING_MAX_ACCEL_TIME_SECONDS,
            target_x_meters: field::SPEAKER_X_METERS,
            target_y_meters: field::SPEAKER_Y_METERS,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct ShotTableRow {
    pub range_meters: f64,
    pub effector_angle_degrees: f64,
    pub left_output: f64,
    pub right_output: f64,
    pub flight_time_seconds: f64,
}

/// ## Everything tunable about the robot.
/// Missing keys fall back to constants.rs.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RobotConfig {
    pub drivetrain: DrivetrainConfig,
    pub aim: AimConfig,
    pub shot_table: Vec<ShotTableRow>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            drivetrain: DrivetrainConfig::default(),
            aim: AimConfig::default(),
            shot_table: auto_aim::SHOT_TABLE
                .iter()
                .map(|&(range, angle, left, right, flight)| ShotTableRow {
                    range_meters: range,
                    effector_angle_degrees: angle,
                    left_output: left,
                    right_output: right,
                    flight_time_seconds: flight,
                })
                .collect(),
        }
    }
}

impl RobotConfig {
    /// ## Loads a TOML file over the defaults.
    /// A missing file is fine and gives the defaults. A file that doesn't parse, or values
    /// that can't build a robot, are errors.
    pub fn load(path: impl AsRef<Path>) -> Result<RobotConfig, SwerveError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading config");

        let config: RobotConfig = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything a Drivetrain would reject, up front.
    pub fn validate(&self) -> Result<(), SwerveError> {
        let drivetrain = &self.drivetrain;
        if !(drivetrain.odometry_frequency_hz.is_finite() && drivetrain.odometry_frequency_hz > 0.0)
        {
            return Err(SwerveError::InvalidGeometry(format!(
                "odometry frequency must be positive, got {}",
                drivetrain.odometry_frequency_hz
            )));
        }
        if !(drivetrain.control_period_seconds.is_finite() && drivetrain.control_period_seconds > 0.0)
        {
            return Err(SwerveError::InvalidGeometry(format!(
                "control period must be positive, got {}",
                drivetrain.control_period_seconds
            )));
        }
        if drivetrain.odometry_queue_capacity == 0 {
            return Err(SwerveError::InvalidGeometry(
                "odometry queue capacity must be at least 1".to_owned(),
            ));
        }
        self.kinematics()?;
        self.shot_table()?;
        Ok(())
    }

    pub fn kinematics(&self) -> Result<Kinematics, SwerveError> {
        Kinematics::new(
            Length::new::<inch>(self.drivetrain.track_width_x_inches),
            Length::new::<inch>(self.drivetrain.track_width_y_inches),
            self.drivetrain.max_linear_speed(),
        )
    }

    pub fn shot_table(&self) -> Result<ShotTable, SwerveError> {
        ShotTable::new(
            self.shot_table
                .iter()
                .map(|row| {
                    (
                        row.range_meters,
                        ShotParameters::new(
                            row.effector_angle_degrees,
                            row.left_output,
                            row.right_output,
                            row.flight_time_seconds,
                        ),
                    )
                })
                .collect(),
        )
    }

    /// The field point the robot aims at.
    pub fn target(&self) -> Pose {
        Pose::from_meters(self.aim.target_x_meters, self.aim.target_y_meters, 0.0)
    }
}
