use crate::subsystems::swerve::geometry::{wrap_angle, wrap_radians};
use tracing::debug;
use uom::si::angle::radian;
use uom::si::f64::Angle;

/// Position and velocity along a motion profile. Radians and radians/second for heading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

/// ## Trapezoidal motion profile.
/// Accelerate at max, cruise at max velocity, decelerate into the goal. Short moves never
/// reach cruise and come out triangular.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrapezoidProfile {
    constraints: Constraints,
}

impl TrapezoidProfile {
    pub fn new(constraints: Constraints) -> TrapezoidProfile {
        TrapezoidProfile { constraints }
    }

    /// Where the profile from `current` to `goal` is `t` seconds in.
    pub fn calculate(&self, t: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_velocity = self.constraints.max_velocity;
        let max_acceleration = self.constraints.max_acceleration;

        // solve everything as a forward move, flip back at the end
        let direction = if current.position > goal.position {
            -1.0
        } else {
            1.0
        };
        let mut current = directed(current, direction);
        let goal = directed(goal, direction);
        if current.velocity > max_velocity {
            current.velocity = max_velocity;
        }

        let cutoff_begin = current.velocity / max_acceleration;
        let cutoff_distance_begin = cutoff_begin * cutoff_begin * max_acceleration / 2.0;
        let cutoff_end = goal.velocity / max_acceleration;
        let cutoff_distance_end = cutoff_end * cutoff_end * max_acceleration / 2.0;

        // the full trapezoid as if it started and ended at rest
        let full_trapezoid_distance =
            cutoff_distance_begin + (goal.position - current.position) + cutoff_distance_end;
        let mut acceleration_time = max_velocity / max_acceleration;
        let mut full_speed_distance =
            full_trapezoid_distance - acceleration_time * acceleration_time * max_acceleration;
        if full_speed_distance < 0.0 {
            acceleration_time = (full_trapezoid_distance / max_acceleration).sqrt();
            full_speed_distance = 0.0;
        }

        let end_acceleration = acceleration_time - cutoff_begin;
        let end_full_speed = end_acceleration + full_speed_distance / max_velocity;
        let end_deceleration = end_full_speed + acceleration_time - cutoff_end;

        let mut result = current;
        if t < end_acceleration {
            result.velocity += t * max_acceleration;
            result.position += (current.velocity + t * max_acceleration / 2.0) * t;
        } else if t < end_full_speed {
            result.velocity = max_velocity;
            result.position += (current.velocity + end_acceleration * max_acceleration / 2.0)
                * end_acceleration
                + max_velocity * (t - end_acceleration);
        } else if t <= end_deceleration {
            let time_left = end_deceleration - t;
            result.velocity = goal.velocity + time_left * max_acceleration;
            result.position =
                goal.position - (goal.velocity + time_left * max_acceleration / 2.0) * time_left;
        } else {
            result = goal;
        }

        directed(result, direction)
    }
}

fn directed(state: ProfileState, direction: f64) -> ProfileState {
    ProfileState {
        position: state.position * direction,
        velocity: state.velocity * direction,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingServoConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub constraints: Constraints,
}

/// ## PID that chases a trapezoid-profiled setpoint instead of the raw goal.
/// Input is continuous over [-PI, PI], so it always takes the short way around.
#[derive(Clone, Debug)]
pub struct ProfiledPidController {
    kp: f64,
    ki: f64,
    kd: f64,
    profile: TrapezoidProfile,
    setpoint: ProfileState,
    goal: ProfileState,
    integral: f64,
    previous_error: Option<f64>,
}

impl ProfiledPidController {
    pub fn new(config: &HeadingServoConfig) -> ProfiledPidController {
        ProfiledPidController {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            profile: TrapezoidProfile::new(config.constraints),
            setpoint: ProfileState::default(),
            goal: ProfileState::default(),
            integral: 0.0,
            previous_error: None,
        }
    }

    /// Starts the profile over from the measured state.
    pub fn reset(&mut self, position: f64, velocity: f64) {
        self.setpoint = ProfileState { position, velocity };
        self.integral = 0.0;
        self.previous_error = None;
    }

    pub fn setpoint(&self) -> ProfileState {
        self.setpoint
    }

    pub fn goal(&self) -> ProfileState {
        self.goal
    }

    /// ## Steps the profile by dt and returns the pid output toward the new setpoint.
    pub fn calculate(&mut self, measurement: f64, goal: f64, dt: f64) -> f64 {
        // unwrap goal and setpoint so both sit within PI of the measurement
        let goal_min_distance = wrap_radians(goal - measurement);
        let setpoint_min_distance = wrap_radians(self.setpoint.position - measurement);
        self.goal = ProfileState {
            position: measurement + goal_min_distance,
            velocity: 0.0,
        };
        self.setpoint.position = measurement + setpoint_min_distance;

        self.setpoint = self.profile.calculate(dt, self.setpoint, self.goal);

        let error = wrap_radians(self.setpoint.position - measurement);
        self.integral += error * dt;
        if self.ki != 0.0 {
            let i_max = self.profile.constraints.max_velocity / self.ki.abs();
            self.integral = self.integral.clamp(-i_max, i_max);
        }
        let derivative = match self.previous_error {
            Some(previous) if dt > 0.0 => (error - previous) / dt,
            _ => 0.0,
        };
        self.previous_error = Some(error);

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServoState {
    Idle,
    /// Reset and waiting for its first calculate.
    Armed,
    Tracking,
}

/// ## Turns a heading goal into an angular velocity.
/// Idle until armed; arming always restarts the profile from the measured heading.
#[derive(Clone, Debug)]
pub struct HeadingServo {
    controller: ProfiledPidController,
    state: ServoState,
}

impl HeadingServo {
    pub fn new(config: &HeadingServoConfig) -> HeadingServo {
        HeadingServo {
            controller: ProfiledPidController::new(config),
            state: ServoState::Idle,
        }
    }

    pub fn arm(&mut self, measured: Angle) {
        self.controller.reset(wrap_angle(measured).get::<radian>(), 0.0);
        self.state = ServoState::Armed;
        debug!(measured = measured.get::<radian>(), "heading servo armed");
    }

    /// ## Angular velocity (radians/second) that drives `measured` toward `goal`.
    /// pid output plus the profile's feedforward velocity. None while idle.
    pub fn calculate(&mut self, measured: Angle, goal: Angle, dt: f64) -> Option<f64> {
        if self.state == ServoState::Idle {
            return None;
        }
        self.state = ServoState::Tracking;

        let feedback = self
            .controller
            .calculate(measured.get::<radian>(), goal.get::<radian>(), dt);
        Some(feedback + self.controller.setpoint().velocity)
    }

    pub fn cancel(&mut self) {
        if self.state != ServoState::Idle {
            debug!("heading servo cancelled");
        }
        self.state = ServoState::Idle;
    }

    pub fn state(&self) -> ServoState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != ServoState::Idle
    }

    pub fn setpoint(&self) -> ProfileState {
        self.controller.setpoint()
    }

    pub fn goal(&self) -> ProfileState {
        self.controller.goal()
    }
}
