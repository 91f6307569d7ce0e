use crate::subsystems::swerve::geometry::{Pose, WheelDelta, wrap_angle};
use crate::subsystems::swerve::kinematics::Kinematics;
use tracing::info;
use uom::si::f64::Angle;

/// Where rotation comes from when integrating wheel motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OdometryMode {
    /// Heading deltas come from the gyro, translation from the wheels.
    GyroFused,
    /// Everything comes from the wheels.
    WheelsOnly,
}

/// What one call to Odometry::update did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OdometryUpdate {
    pub processed: usize,
    pub mode: OdometryMode,
    pub mode_changed: bool,
}

/// ## Robot Odometry system.
/// pose_estimate: where the robot thinks it is.
/// last_heading: the gyro reading the next heading sample is measured against. None means
/// the next gyro sample only seeds it.
pub struct Odometry {
    pub pose_estimate: Pose,
    mode: OdometryMode,
    last_heading: Option<Angle>,
}

impl Odometry {
    /// ## Makes a new Odometry system.
    /// The parameter Pose will be where the robot starts from.
    pub fn new(pose: Pose) -> Odometry {
        Odometry {
            pose_estimate: pose,
            mode: OdometryMode::WheelsOnly,
            last_heading: None,
        }
    }

    pub fn mode(&self) -> OdometryMode {
        self.mode
    }

    /// ## Integrates a batch of samples, oldest first.
    /// wheel_deltas[module][i] and headings[i] all belong to sample i. The batch is cut to the
    /// shortest stream, so a late stream can't pair one sample's wheels with another's heading.
    /// A None heading is a sample the gyro missed: that sample turns by the wheels and the next
    /// gyro value only seeds the baseline.
    pub fn update(
        &mut self,
        kinematics: &Kinematics,
        wheel_deltas: &[Vec<WheelDelta>; 4],
        headings: &[Option<Angle>],
        gyro_connected: bool,
    ) -> OdometryUpdate {
        let mode = if gyro_connected {
            OdometryMode::GyroFused
        } else {
            OdometryMode::WheelsOnly
        };
        let mode_changed = mode != self.mode;
        if mode_changed {
            info!(from = ?self.mode, to = ?mode, "odometry mode changed");
            // a reconnected gyro could read anything, re-seed from its first sample
            self.last_heading = None;
            self.mode = mode;
        }

        let mut processed = wheel_deltas.iter().map(Vec::len).min().unwrap_or(0);
        if mode == OdometryMode::GyroFused {
            processed = processed.min(headings.len());
        }

        for sample in 0..processed {
            let deltas = std::array::from_fn(|module| wheel_deltas[module][sample]);
            let mut twist = kinematics.to_twist(&deltas);

            if mode == OdometryMode::GyroFused {
                let heading = headings[sample];
                if let (Some(heading), Some(last_heading)) = (heading, self.last_heading) {
                    twist.dtheta = wrap_angle(heading - last_heading);
                }
                // a gap clears the baseline, the gyro is never bridged across one
                self.last_heading = heading;
            }

            self.pose_estimate = self.pose_estimate.exp(&twist);
        }

        OdometryUpdate {
            processed,
            mode,
            mode_changed,
        }
    }

    /// The gyro reading the next heading sample is measured against.
    pub fn heading_baseline(&self) -> Option<Angle> {
        self.last_heading
    }

    /// ## Jumps the estimate to `pose`.
    /// The next heading sample is measured against heading_baseline, or just seeds it when None.
    /// Wheel baselines live in each SwerveModule and are re-seeded there.
    pub fn reset_pose(&mut self, pose: Pose, heading_baseline: Option<Angle>) {
        info!(?pose, "odometry reset");
        self.pose_estimate = pose;
        self.last_heading = heading_baseline;
    }
}
