use nalgebra::{Rotation2, Vector2};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::ops::Sub;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

/// Below this, arc math falls back to its Taylor expansion.
const SMALL_ANGLE_RADIANS: f64 = 1e-9;

/// ## Wraps an angle into (-PI, PI].
pub fn wrap_angle(angle: Angle) -> Angle {
    Angle::new::<radian>(wrap_radians(angle.get::<radian>()))
}

pub(crate) fn wrap_radians(radians: f64) -> f64 {
    PI - (PI - radians).rem_euclid(TAU)
}

/// ## Where the robot thinks it is.
/// x and y are in the fixed field frame, angle is counterclockwise positive and wrapped to (-PI, PI].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Pose {
    pub x: Length,
    pub y: Length,
    pub angle: Angle,
}

/// ## An infinitesimal planar motion in the robot frame.
/// Composed onto a Pose with Pose::exp, never by adding components.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Twist {
    pub dx: Length,
    pub dy: Length,
    pub dtheta: Angle,
}

/// A rigid offset expressed in the frame of the pose it gets applied to.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Transform {
    pub x: Length,
    pub y: Length,
    pub rotation: Angle,
}

/// ## Chassis velocity.
/// vx and vy in meters/second, omega in radians/second (counterclockwise positive).
/// Whether it is robot or field relative depends on who handed it to you.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ChassisVelocity {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

/// ## A wheel's (angle, speed) pair.
/// Used both as a target and as a measured state. Speed is signed, in meters/second.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WheelSetpoint {
    pub angle: Angle,
    pub speed: f64,
}

/// Measured wheel state; same shape as a setpoint.
pub type WheelState = WheelSetpoint;

/// ## Cumulative odometer-style wheel reading.
/// distance is total distance the drive wheel has rolled, angle is the wheel's current heading.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WheelPosition {
    pub distance: Length,
    pub angle: Angle,
}

/// ## Distance rolled between two consecutive samples of one wheel.
/// angle is the newer sample's heading, not a difference.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WheelDelta {
    pub distance: Length,
    pub angle: Angle,
}

impl Pose {
    pub fn new(x: Length, y: Length, angle: Angle) -> Pose {
        Pose {
            x,
            y,
            angle: wrap_angle(angle),
        }
    }

    pub fn from_meters(x: f64, y: f64, angle_radians: f64) -> Pose {
        Pose::new(
            Length::new::<meter>(x),
            Length::new::<meter>(y),
            Angle::new::<radian>(angle_radians),
        )
    }

    /// Translation in meters.
    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.x.get::<meter>(), self.y.get::<meter>())
    }

    fn from_translation(translation: Vector2<f64>, angle_radians: f64) -> Pose {
        Pose::from_meters(translation.x, translation.y, angle_radians)
    }

    /// ## Applies a twist with the exponential map.
    /// The robot is assumed to have moved along a constant-curvature arc, so heading changes
    /// bend the translation instead of being tacked on afterwards.
    pub fn exp(&self, twist: &Twist) -> Pose {
        let dx = twist.dx.get::<meter>();
        let dy = twist.dy.get::<meter>();
        let dtheta = twist.dtheta.get::<radian>();

        let (sin_theta, cos_theta) = dtheta.sin_cos();
        let (s, c) = if dtheta.abs() < SMALL_ANGLE_RADIANS {
            (1.0 - dtheta * dtheta / 6.0, 0.5 * dtheta)
        } else {
            (sin_theta / dtheta, (1.0 - cos_theta) / dtheta)
        };

        let robot_frame = Vector2::new(dx * s - dy * c, dx * c + dy * s);
        let field_frame = Rotation2::new(self.angle.get::<radian>()) * robot_frame;

        Pose::from_translation(
            self.translation() + field_frame,
            self.angle.get::<radian>() + dtheta,
        )
    }

    /// ## The twist that takes this pose to `end`. Inverse of exp.
    pub fn log(&self, end: &Pose) -> Twist {
        let relative = self.relative_to_self(end);
        let tx = relative.x.get::<meter>();
        let ty = relative.y.get::<meter>();
        let dtheta = relative.rotation.get::<radian>();

        let half_dtheta = dtheta / 2.0;
        let cos_minus_one = dtheta.cos() - 1.0;
        let half_theta_by_tan_of_half_dtheta = if cos_minus_one.abs() < SMALL_ANGLE_RADIANS {
            1.0 - dtheta * dtheta / 12.0
        } else {
            -(half_dtheta * dtheta.sin()) / cos_minus_one
        };

        Twist {
            dx: Length::new::<meter>(
                tx * half_theta_by_tan_of_half_dtheta + ty * half_dtheta,
            ),
            dy: Length::new::<meter>(
                ty * half_theta_by_tan_of_half_dtheta - tx * half_dtheta,
            ),
            dtheta: Angle::new::<radian>(dtheta),
        }
    }

    /// `end` expressed as an offset in this pose's frame.
    fn relative_to_self(&self, end: &Pose) -> Transform {
        let delta = Rotation2::new(-self.angle.get::<radian>())
            * (end.translation() - self.translation());
        Transform::from_meters(
            delta.x,
            delta.y,
            wrap_radians(end.angle.get::<radian>() - self.angle.get::<radian>()),
        )
    }

    /// ## Applies a robot-frame offset to this pose.
    pub fn transform_by(&self, transform: &Transform) -> Pose {
        let offset = Rotation2::new(self.angle.get::<radian>()) * transform.translation();
        Pose::from_translation(
            self.translation() + offset,
            self.angle.get::<radian>() + transform.rotation.get::<radian>(),
        )
    }

    pub fn translation_distance(&self, other: &Pose) -> Length {
        Length::new::<meter>((self.translation() - other.translation()).norm())
    }
}

impl Twist {
    pub fn from_meters(dx: f64, dy: f64, dtheta_radians: f64) -> Twist {
        Twist {
            dx: Length::new::<meter>(dx),
            dy: Length::new::<meter>(dy),
            dtheta: Angle::new::<radian>(dtheta_radians),
        }
    }
}

impl Transform {
    pub fn from_meters(x: f64, y: f64, rotation_radians: f64) -> Transform {
        Transform {
            x: Length::new::<meter>(x),
            y: Length::new::<meter>(y),
            rotation: Angle::new::<radian>(rotation_radians),
        }
    }

    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.x.get::<meter>(), self.y.get::<meter>())
    }

    /// The transform that undoes this one.
    pub fn inverse(&self) -> Transform {
        let rotation = -self.rotation.get::<radian>();
        let translation = Rotation2::new(rotation) * -self.translation();
        Transform::from_meters(translation.x, translation.y, rotation)
    }
}

impl ChassisVelocity {
    pub fn new(vx: f64, vy: f64, omega: f64) -> ChassisVelocity {
        ChassisVelocity { vx, vy, omega }
    }

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0 && self.omega == 0.0
    }

    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.vx, self.vy)
    }

    /// ## Field-relative velocity -> robot-relative, given the robot's heading.
    pub fn to_robot_relative(&self, heading: Angle) -> ChassisVelocity {
        let rotated = Rotation2::new(-heading.get::<radian>()) * self.translation();
        ChassisVelocity::new(rotated.x, rotated.y, self.omega)
    }

    /// ## Robot-relative velocity -> field-relative, given the robot's heading.
    pub fn to_field_relative(&self, heading: Angle) -> ChassisVelocity {
        let rotated = Rotation2::new(heading.get::<radian>()) * self.translation();
        ChassisVelocity::new(rotated.x, rotated.y, self.omega)
    }

    /// ## Compensates for translating while rotating during one control period.
    /// Finds the twist that would land the robot where holding this velocity for dt should,
    /// and returns that twist as a velocity.
    pub fn discretize(&self, dt: f64) -> ChassisVelocity {
        if dt <= 0.0 {
            return *self;
        }
        let desired = Pose::from_meters(self.vx * dt, self.vy * dt, self.omega * dt);
        let twist = Pose::default().log(&desired);
        ChassisVelocity::new(
            twist.dx.get::<meter>() / dt,
            twist.dy.get::<meter>() / dt,
            twist.dtheta.get::<radian>() / dt,
        )
    }
}

impl WheelSetpoint {
    pub fn new(speed: f64, angle: Angle) -> WheelSetpoint {
        WheelSetpoint {
            angle: wrap_angle(angle),
            speed,
        }
    }

    /// ## Flips the target by PI and reverses speed when that needs less steering.
    /// A wheel spinning backwards while pointed the opposite way pushes the ground the same
    /// direction, so the wheel never has to turn more than PI/2 to reach its target.
    pub fn optimize(self, current_angle: Angle) -> WheelSetpoint {
        let error = wrap_radians(self.angle.get::<radian>() - current_angle.get::<radian>());
        if error.abs() > FRAC_PI_2 {
            WheelSetpoint {
                angle: wrap_angle(self.angle + Angle::new::<radian>(PI)),
                speed: -self.speed,
            }
        } else {
            self
        }
    }

    /// Velocity this wheel applies to the ground, in meters/second.
    pub fn ground_vector(&self) -> Vector2<f64> {
        let angle = self.angle.get::<radian>();
        Vector2::new(self.speed * angle.cos(), self.speed * angle.sin())
    }
}

impl WheelDelta {
    /// Displacement vector of this wheel in the robot frame, in meters.
    pub fn displacement(&self) -> Vector2<f64> {
        let angle = self.angle.get::<radian>();
        let distance = self.distance.get::<meter>();
        Vector2::new(distance * angle.cos(), distance * angle.sin())
    }
}

impl Sub for WheelPosition {
    type Output = WheelDelta;

    fn sub(self, baseline: WheelPosition) -> WheelDelta {
        WheelDelta {
            distance: self.distance - baseline.distance,
            angle: self.angle,
        }
    }
}
