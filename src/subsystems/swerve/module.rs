use crate::subsystems::swerve::geometry::{WheelDelta, WheelPosition, WheelSetpoint, WheelState};
use crate::subsystems::swerve::io::{ModuleInputs, ModuleIo};
use tracing::debug;
use uom::si::f64::Angle;

/// ## One corner of the drivetrain.
/// Owns the module's motors and the odometry baseline its deltas are measured against.
pub struct SwerveModule {
    index: usize,
    io: Box<dyn ModuleIo>,
    inputs: ModuleInputs,
    last_setpoint: WheelSetpoint,
    initialized: bool,
    baseline: Option<WheelPosition>,
}

impl SwerveModule {
    pub fn new(index: usize, io: Box<dyn ModuleIo>) -> SwerveModule {
        SwerveModule {
            index,
            io,
            inputs: ModuleInputs::default(),
            last_setpoint: WheelSetpoint::default(),
            initialized: false,
            baseline: None,
        }
    }

    pub fn update_inputs(&mut self) {
        self.io.update_inputs(&mut self.inputs);
        if !self.inputs.connected && self.initialized {
            debug!(module = self.index, "module stopped reporting");
            self.initialized = false;
        }
    }

    /// Whether the module is reporting and has taken a command since it came up.
    pub fn is_initialized(&self) -> bool {
        self.initialized && self.inputs.connected
    }

    pub fn is_connected(&self) -> bool {
        self.inputs.connected
    }

    /// ## Sends a setpoint, optimized against the measured wheel angle.
    /// A module that isn't reporting gets nothing new and keeps its last setpoint, which is returned.
    pub fn run_setpoint(&mut self, setpoint: WheelSetpoint) -> WheelSetpoint {
        if !self.inputs.connected {
            return self.last_setpoint;
        }

        let optimized = setpoint.optimize(self.get_angle());
        self.io.set_turn_position(optimized.angle);
        self.io.set_drive_velocity(optimized.speed);

        self.last_setpoint = optimized;
        self.initialized = true;
        optimized
    }

    /// Zero volts on both motors.
    pub fn stop(&mut self) {
        self.io.set_drive_voltage(0.0);
        self.io.set_turn_voltage(0.0);
        self.last_setpoint.speed = 0.0;
    }

    pub fn get_angle(&self) -> Angle {
        self.inputs.turn_position
    }

    pub fn get_position(&self) -> WheelPosition {
        WheelPosition {
            distance: self.inputs.drive_position,
            angle: self.inputs.turn_position,
        }
    }

    pub fn get_state(&self) -> WheelState {
        WheelState::new(self.inputs.drive_velocity, self.inputs.turn_position)
    }

    pub fn last_setpoint(&self) -> WheelSetpoint {
        self.last_setpoint
    }

    /// ## Distance rolled between each sample and the one before it.
    /// The first sample this module ever sees only sets the baseline and yields a zero delta.
    pub fn get_deltas(&mut self, positions: &[WheelPosition]) -> Vec<WheelDelta> {
        positions
            .iter()
            .map(|position| {
                let baseline = self.baseline.unwrap_or(*position);
                self.baseline = Some(*position);
                *position - baseline
            })
            .collect()
    }

    pub fn reseed(&mut self, baseline: WheelPosition) {
        self.baseline = Some(baseline);
    }
}
