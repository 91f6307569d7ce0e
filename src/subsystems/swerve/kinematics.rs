use crate::error::SwerveError;
use crate::subsystems::swerve::geometry::{ChassisVelocity, Twist, WheelDelta, WheelSetpoint, WheelState};
use nalgebra::{Rotation2, SMatrix, SVector, Vector2};
use std::f64::consts::PI;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

/// ## Kinematics stores where each swerve module sits and how it moves when the robot spins.
/// Module order everywhere in this crate is FL, FR, BL, BR.
/// Nothing here changes after new(), so every conversion is a pure function of its inputs.
#[derive(Clone, Debug)]
pub struct Kinematics {
    module_translations: [Vector2<f64>; 4],
    /// Velocity each module sees when the robot spins at 1 rad/s (omega cross r).
    module_rotation_vectors: [Vector2<f64>; 4],
    /// Least-squares inverse of the 8x3 module velocity matrix.
    forward_kinematics: SMatrix<f64, 3, 8>,
    max_linear_speed: f64,
}

impl Kinematics {
    /// ## Builds the module geometry from the wheel-to-wheel track width along x and y.
    /// max_linear_speed (meters/second) is what to_wheel_states desaturates to.
    pub fn new(
        track_width_x: Length,
        track_width_y: Length,
        max_linear_speed: f64,
    ) -> Result<Kinematics, SwerveError> {
        let half_x = track_width_x.get::<meter>() / 2.0;
        let half_y = track_width_y.get::<meter>() / 2.0;

        if !(half_x.is_finite() && half_y.is_finite() && half_x > 0.0 && half_y > 0.0) {
            return Err(SwerveError::InvalidGeometry(format!(
                "track widths must be positive, got {} x {} m",
                half_x * 2.0,
                half_y * 2.0
            )));
        }
        if !(max_linear_speed.is_finite() && max_linear_speed > 0.0) {
            return Err(SwerveError::InvalidGeometry(format!(
                "max linear speed must be positive, got {} m/s",
                max_linear_speed
            )));
        }

        // vectors pointing to each module from center of robot.
        let module_translations = [
            Vector2::new(half_x, half_y),   // FL
            Vector2::new(half_x, -half_y),  // FR
            Vector2::new(-half_x, half_y),  // BL
            Vector2::new(-half_x, -half_y), // BR
        ];

        // rotate each vector by 90 degrees. Unlike a unit vector, the length is kept,
        // so scaling by omega gives the module's actual speed in meters/second.
        let ninety_degree_rotation = Rotation2::new(PI / 2.0);
        let module_rotation_vectors = module_translations.map(|vector| ninety_degree_rotation * vector);

        // each module contributes two rows: vx - omega * r_y and vy + omega * r_x
        let inverse_kinematics = SMatrix::<f64, 8, 3>::from_fn(|row, col| {
            let translation = module_translations[row / 2];
            match (row % 2, col) {
                (0, 0) => 1.0,
                (0, 2) => -translation.y,
                (1, 1) => 1.0,
                (1, 2) => translation.x,
                _ => 0.0,
            }
        });
        let normal = inverse_kinematics.transpose() * inverse_kinematics;
        let normal_inverse = normal.try_inverse().ok_or_else(|| {
            SwerveError::InvalidGeometry("module layout has no least-squares solution".to_owned())
        })?;
        let forward_kinematics = normal_inverse * inverse_kinematics.transpose();

        Ok(Kinematics {
            module_translations,
            module_rotation_vectors,
            forward_kinematics,
            max_linear_speed,
        })
    }

    pub fn module_translations(&self) -> [Vector2<f64>; 4] {
        self.module_translations
    }

    pub fn max_linear_speed(&self) -> f64 {
        self.max_linear_speed
    }

    /// Distance from robot center to the farthest module, in meters.
    pub fn drive_base_radius(&self) -> f64 {
        self.module_translations
            .iter()
            .map(|translation| translation.norm())
            .fold(0.0, f64::max)
    }

    /// ## Module angles that point every wheel away from center.
    /// With all four in this fan, no chassis motion is possible without scrubbing.
    pub fn x_formation(&self) -> [Angle; 4] {
        self.module_translations
            .map(|translation| Angle::new::<radian>(f64::atan2(translation.y, translation.x)))
    }

    /// ## Raw per-module targets for a robot-relative chassis velocity, before desaturation.
    /// A module asked for zero velocity gets speed 0 and angle 0; holding the old angle is the
    /// caller's problem.
    fn calculate_targets(&self, velocity: &ChassisVelocity) -> [WheelSetpoint; 4] {
        let target_transformation = velocity.translation();

        self.module_rotation_vectors.map(|rotation_vector| {
            // add the scaled rotation vector to the target transformation vector in order to get the final vector.
            let final_vector = target_transformation + rotation_vector * velocity.omega;
            let final_angle = Angle::new::<radian>(f64::atan2(final_vector.y, final_vector.x));
            WheelSetpoint::new(final_vector.magnitude(), final_angle)
        })
    }

    /// ## Scales all four speeds down together if any is over max_speed.
    /// Ratios between modules are kept exactly, so the chassis still moves in the commanded direction.
    pub fn desaturate(targets: &mut [WheelSetpoint; 4], max_speed: f64) {
        let fastest = targets
            .iter()
            .map(|target| target.speed.abs())
            .fold(0.0, f64::max);

        if fastest > max_speed {
            let scale = max_speed / fastest;
            for target in targets.iter_mut() {
                target.speed *= scale;
            }
        }
    }

    /// ## Returns desaturated module setpoints for a robot-relative chassis velocity.
    pub fn to_wheel_states(&self, velocity: &ChassisVelocity) -> [WheelSetpoint; 4] {
        let mut targets = self.calculate_targets(velocity);
        Kinematics::desaturate(&mut targets, self.max_linear_speed);
        targets
    }

    fn solve(&self, module_vectors: [Vector2<f64>; 4]) -> SVector<f64, 3> {
        let stacked = SVector::<f64, 8>::from_fn(|row, _| {
            let vector = module_vectors[row / 2];
            if row % 2 == 0 { vector.x } else { vector.y }
        });
        self.forward_kinematics * stacked
    }

    /// ## Robot-relative chassis velocity that best explains the measured module states.
    /// Four modules overdetermine three unknowns, so this is a least-squares fit.
    pub fn to_chassis_velocity(&self, states: &[WheelState; 4]) -> ChassisVelocity {
        let solution = self.solve(states.map(|state| state.ground_vector()));
        ChassisVelocity::new(solution[0], solution[1], solution[2])
    }

    /// ## Robot-frame twist that best explains four module displacements.
    pub fn to_twist(&self, deltas: &[WheelDelta; 4]) -> Twist {
        let solution = self.solve(deltas.map(|delta| delta.displacement()));
        Twist::from_meters(solution[0], solution[1], solution[2])
    }
}

// run tests with
//      cargo test -- --nocapture
// to show prints even for successful tests.
#[cfg(test)]
mod kinematics_tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn half_meter_square() -> Kinematics {
        Kinematics::new(Length::new::<meter>(0.5), Length::new::<meter>(0.5), 4.0)
            .expect("valid geometry")
    }

    fn assert_targets_eq(results: [WheelSetpoint; 4], expected: [(f64, f64); 4]) {
        println!("expected: {:?}", expected);
        println!("results: {:?}", results);
        for (result, (speed, angle)) in results.iter().zip(expected.iter()) {
            assert_approx_eq!(f64, result.speed, *speed, epsilon = 1e-9);
            assert_approx_eq!(f64, result.angle.get::<radian>(), *angle, epsilon = 1e-9);
        }
    }

    #[test]
    fn kinematics_new_test() {
        let kinematics = half_meter_square();

        let expected = [
            Vector2::new(-0.25, 0.25),
            Vector2::new(0.25, 0.25),
            Vector2::new(-0.25, -0.25),
            Vector2::new(0.25, -0.25),
        ];
        for (result, expected) in kinematics.module_rotation_vectors.iter().zip(expected.iter()) {
            assert_approx_eq!(f64, result.x, expected.x, epsilon = 1e-12);
            assert_approx_eq!(f64, result.y, expected.y, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(Kinematics::new(Length::new::<meter>(0.0), Length::new::<meter>(0.5), 4.0).is_err());
        assert!(Kinematics::new(Length::new::<meter>(0.5), Length::new::<meter>(-1.0), 4.0).is_err());
        assert!(Kinematics::new(Length::new::<meter>(0.5), Length::new::<meter>(0.5), 0.0).is_err());
        assert!(
            Kinematics::new(Length::new::<meter>(f64::NAN), Length::new::<meter>(0.5), 4.0).is_err()
        );
    }

    #[test]
    fn forward_full_speed_test() {
        let results = half_meter_square().to_wheel_states(&ChassisVelocity::new(1.0, 0.0, 0.0));
        assert_targets_eq(results, [(1.0, 0.0); 4]);
    }

    #[test]
    fn backward_test() {
        let results = half_meter_square().to_wheel_states(&ChassisVelocity::new(-0.5, 0.0, 0.0));
        assert_targets_eq(results, [(0.5, PI); 4]);
    }

    #[test]
    fn left_test() {
        let results = half_meter_square().to_wheel_states(&ChassisVelocity::new(0.0, 1.0, 0.0));
        assert_targets_eq(results, [(1.0, FRAC_PI_2); 4]);
    }

    #[test]
    fn spin_in_place_test() {
        let kinematics = half_meter_square();
        let radius = kinematics.drive_base_radius();
        assert_approx_eq!(f64, radius, 0.125f64.sqrt(), epsilon = 1e-12);

        let results = kinematics.to_wheel_states(&ChassisVelocity::new(0.0, 0.0, 1.0));
        // every wheel is tangent to the circle through the modules
        assert_targets_eq(
            results,
            [
                (radius, 3.0 * FRAC_PI_4),
                (radius, FRAC_PI_4),
                (radius, -3.0 * FRAC_PI_4),
                (radius, -FRAC_PI_4),
            ],
        );
    }

    #[test]
    fn zero_velocity_gives_stopped_wheels() {
        let results = half_meter_square().to_wheel_states(&ChassisVelocity::default());
        assert_targets_eq(results, [(0.0, 0.0); 4]);
    }

    #[test]
    fn desaturate_keeps_ratios() {
        let kinematics = half_meter_square();
        let velocity = ChassisVelocity::new(3.5, 2.0, 6.0);
        let raw = kinematics.calculate_targets(&velocity);
        let scaled = kinematics.to_wheel_states(&velocity);

        let fastest = scaled.iter().map(|target| target.speed.abs()).fold(0.0, f64::max);
        assert_approx_eq!(f64, fastest, 4.0, epsilon = 1e-12);

        let scale = scaled[0].speed / raw[0].speed;
        assert!(scale < 1.0);
        for (raw, scaled) in raw.iter().zip(scaled.iter()) {
            assert_approx_eq!(f64, scaled.speed, raw.speed * scale, epsilon = 1e-12);
            assert_eq!(scaled.angle, raw.angle);
        }
    }

    #[test]
    fn desaturate_leaves_slow_targets_alone() {
        let mut targets = [WheelSetpoint::new(-1.0, Angle::new::<radian>(0.3)); 4];
        Kinematics::desaturate(&mut targets, 2.0);
        assert_eq!(targets, [WheelSetpoint::new(-1.0, Angle::new::<radian>(0.3)); 4]);
    }

    #[test]
    fn round_trip_test() {
        let kinematics = half_meter_square();
        for velocity in [
            ChassisVelocity::new(1.0, 0.0, 0.0),
            ChassisVelocity::new(-0.7, 1.3, 0.0),
            ChassisVelocity::new(0.0, 0.0, -2.0),
            ChassisVelocity::new(1.1, -0.4, 1.7),
            ChassisVelocity::default(),
        ] {
            let states = kinematics.to_wheel_states(&velocity);
            let result = kinematics.to_chassis_velocity(&states);
            println!("velocity: {:?}, result: {:?}", velocity, result);
            assert_approx_eq!(f64, result.vx, velocity.vx, epsilon = 1e-9);
            assert_approx_eq!(f64, result.vy, velocity.vy, epsilon = 1e-9);
            assert_approx_eq!(f64, result.omega, velocity.omega, epsilon = 1e-9);
        }
    }

    #[test]
    fn to_twist_matches_velocity_times_time() {
        let kinematics = half_meter_square();
        let velocity = ChassisVelocity::new(0.8, -0.3, 0.5);
        let dt = 0.004;
        let deltas = kinematics.to_wheel_states(&velocity).map(|state| WheelDelta {
            distance: Length::new::<meter>(state.speed * dt),
            angle: state.angle,
        });

        let twist = kinematics.to_twist(&deltas);
        assert_approx_eq!(f64, twist.dx.get::<meter>(), 0.8 * dt, epsilon = 1e-12);
        assert_approx_eq!(f64, twist.dy.get::<meter>(), -0.3 * dt, epsilon = 1e-12);
        assert_approx_eq!(f64, twist.dtheta.get::<radian>(), 0.5 * dt, epsilon = 1e-12);
    }

    #[test]
    fn x_formation_points_outward() {
        let angles = half_meter_square().x_formation().map(|angle| angle.get::<radian>());
        let expected = [FRAC_PI_4, -FRAC_PI_4, 3.0 * FRAC_PI_4, -3.0 * FRAC_PI_4];
        for (angle, expected) in angles.iter().zip(expected.iter()) {
            assert_approx_eq!(f64, *angle, *expected, epsilon = 1e-12);
        }
    }
}
