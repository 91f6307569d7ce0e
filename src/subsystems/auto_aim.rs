use crate::error::Condition;
use crate::subsystems::shot_table::{ShotSample, ShotTable};
use crate::subsystems::swerve::geometry::{ChassisVelocity, Pose, Transform, wrap_angle};
use crate::telemetry::Telemetry;
use uom::si::angle::{degree, radian};
use uom::si::f64::{Angle, Length, Time};
use uom::si::length::meter;
use uom::si::time::second;

/// Closer than this and there's no direction to aim in.
const MIN_AIM_DISTANCE_METERS: f64 = 1e-9;

/// One cycle's aim.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimSolution {
    /// Robot heading that points the effector at the virtual target.
    pub heading: Angle,
    pub future_pose: Pose,
    pub virtual_target: Pose,
    /// From the future pose to the real target.
    pub range: Length,
    pub shot: ShotSample,
    /// Geometry was degenerate and heading is the previous one.
    pub held: bool,
}

impl AimSolution {
    pub fn conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        if self.shot.clamped {
            conditions.push(Condition::RangeOutOfTable {
                range: self.range.get::<meter>(),
            });
        }
        if self.held {
            conditions.push(Condition::DegenerateGeometry);
        }
        conditions
    }

    pub fn post(&self, telemetry: &mut dyn Telemetry) {
        telemetry.put_number("AutoAim/Heading", self.heading.get::<radian>());
        telemetry.put_number("AutoAim/Range", self.range.get::<meter>());
        telemetry.put_pose("AutoAim/FuturePose", &self.future_pose);
        telemetry.put_pose("AutoAim/VirtualTarget", &self.virtual_target);

        let shot = self.shot.parameters;
        telemetry.put_number("AutoAim/EffectorAngle", shot.effector_angle.get::<degree>());
        telemetry.put_number("AutoAim/LeftOutput", shot.left_output);
        telemetry.put_number("AutoAim/RightOutput", shot.right_output);
        telemetry.put_number("AutoAim/FlightTime", shot.flight_time.get::<second>());
        telemetry.put_bool("AutoAim/Clamped", self.shot.clamped);
        telemetry.put_bool("AutoAim/Held", self.held);
    }
}

/// ## Shoot-on-the-move aiming.
/// Looks ahead to where the robot will be, then leads the target by how far the robot's own
/// velocity carries the projectile during its flight.
#[derive(Clone, Debug)]
pub struct AutoAim {
    shot_table: ShotTable,
    lookahead: Time,
    effector_heading_offset: Angle,
    last_heading: Option<Angle>,
}

/// ## Heading from `from` toward `target`.
/// None when the two are on top of each other.
pub fn heading_toward(target: &Pose, from: &Pose) -> Option<Angle> {
    let offset = target.translation() - from.translation();
    if offset.norm() < MIN_AIM_DISTANCE_METERS {
        return None;
    }
    Some(Angle::new::<radian>(offset.y.atan2(offset.x)))
}

impl AutoAim {
    pub fn new(shot_table: ShotTable, lookahead: Time, effector_heading_offset: Angle) -> AutoAim {
        AutoAim {
            shot_table,
            lookahead,
            effector_heading_offset,
            last_heading: None,
        }
    }

    pub fn shot_table(&self) -> &ShotTable {
        &self.shot_table
    }

    pub fn lookahead(&self) -> Time {
        self.lookahead
    }

    /// ## Where `pose` ends up after holding a field-relative velocity for `dt`.
    pub fn future_pose(pose: &Pose, dt: Time, field_velocity: &ChassisVelocity) -> Pose {
        let dt = dt.get::<second>();
        let robot_velocity = field_velocity.to_robot_relative(pose.angle);
        pose.transform_by(&Transform::from_meters(
            robot_velocity.vx * dt,
            robot_velocity.vy * dt,
            robot_velocity.omega * dt,
        ))
    }

    pub fn shot_parameters(&self, range: Length) -> ShotSample {
        self.shot_table.sample(range.get::<meter>())
    }

    /// ## The target shifted against the robot's velocity for one flight time.
    /// Aiming at this while moving lands the shot on the real target. Keeps the target's heading.
    pub fn virtual_target(
        &self,
        current: &Pose,
        target: &Pose,
        field_velocity: &ChassisVelocity,
    ) -> Pose {
        let future = AutoAim::future_pose(current, self.lookahead, field_velocity);
        self.lead_target(&future, target, field_velocity).0
    }

    fn lead_target(
        &self,
        future: &Pose,
        target: &Pose,
        field_velocity: &ChassisVelocity,
    ) -> (Pose, Length, ShotSample) {
        let range = future.translation_distance(target);
        let shot = self.shot_parameters(range);
        let flight = shot.parameters.flight_time.get::<second>();
        let virtual_target = Pose {
            x: target.x - Length::new::<meter>(field_velocity.vx * flight),
            y: target.y - Length::new::<meter>(field_velocity.vy * flight),
            angle: target.angle,
        };
        (virtual_target, range, shot)
    }

    /// ## Robot heading to hold so the effector points at the virtual target.
    /// When the future pose sits on the virtual target, the last good heading is held instead
    /// (or the current one if there never was one).
    pub fn aim_heading(
        &mut self,
        current: &Pose,
        target: &Pose,
        field_velocity: &ChassisVelocity,
    ) -> AimSolution {
        let future_pose = AutoAim::future_pose(current, self.lookahead, field_velocity);
        let (virtual_target, range, shot) = self.lead_target(&future_pose, target, field_velocity);

        let (heading, held) = match heading_toward(&virtual_target, &future_pose) {
            Some(toward) => {
                let heading = wrap_angle(toward - self.effector_heading_offset);
                self.last_heading = Some(heading);
                (heading, false)
            }
            None => (self.last_heading.unwrap_or(current.angle), true),
        };

        AimSolution {
            heading,
            future_pose,
            virtual_target,
            range,
            shot,
            held,
        }
    }
}
