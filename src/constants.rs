pub mod config {
    /// Wheel-Wheel distance front to back.
    pub const TRACK_WIDTH_X_INCHES: f64 = 21.75;
    /// Wheel-Wheel distance side to side.
    pub const TRACK_WIDTH_Y_INCHES: f64 = 21.25;

    pub const FIELD_ORIENTED: bool = true;

    /// Where RobotConfig::load looks when no path is given.
    pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
}

pub mod drivetrain {
    pub const MAX_LINEAR_SPEED_FEET_PER_SECOND: f64 = 12.5;

    /// How often the sampler thread reads wheel and gyro positions.
    pub const ODOMETRY_FREQUENCY_HZ: f64 = 250.0;
    /// Main loop period.
    pub const CONTROL_PERIOD_SECONDS: f64 = 0.02;
    /// Samples held per stream before the oldest are evicted. ~80ms at 250hz.
    pub const ODOMETRY_QUEUE_CAPACITY: usize = 20;

    /// Drive feedforward, volts per meter/second. Used by the sim to turn voltage into speed.
    pub const DRIVE_KV: f64 = 2.5;
    /// Fastest a simulated module can steer, radians/second.
    pub const SIM_TURN_RATE_RADIANS_PER_SECOND: f64 = 30.0;
}

pub mod auto_aim {
    /// How far ahead to project the robot's pose when aiming.
    pub const LOOKAHEAD_TIME_SECONDS: f64 = 0.2;
    /// The shooter fires out the back of the robot.
    pub const EFFECTOR_HEADING_OFFSET_DEGREES: f64 = 180.0;

    pub const HEADING_KP: f64 = 40.0;
    pub const HEADING_KI: f64 = 0.0;
    pub const HEADING_KD: f64 = 0.0;
    /// Assume we can accelerate to max angular speed in 2/3 of a second.
    pub const HEADING_MAX_ACCEL_TIME_SECONDS: f64 = 0.666666;

    /// (range meters, effector angle degrees, left output, right output, flight time seconds)
    pub const SHOT_TABLE: [(f64, f64, f64, f64, f64); 6] = [
        (1.0, 55.0, 40.0, 40.0, 0.10),
        (2.0, 45.0, 50.0, 50.0, 0.17),
        (3.0, 37.0, 60.0, 60.0, 0.24),
        (4.0, 31.0, 70.0, 65.0, 0.31),
        (5.0, 27.0, 80.0, 72.0, 0.39),
        (6.0, 24.0, 90.0, 80.0, 0.47),
    ];
}

pub mod field {
    /// Blue speaker opening, field frame (meters).
    pub const SPEAKER_X_METERS: f64 = 0.0;
    pub const SPEAKER_Y_METERS: f64 = 5.55;
}
