use crate::error::SwerveError;
use uom::si::angle::degree;
use uom::si::f64::{Angle, Time};
use uom::si::time::second;

/// Everything the shooter needs for one shot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotParameters {
    pub effector_angle: Angle,
    pub left_output: f64,
    pub right_output: f64,
    pub flight_time: Time,
}

impl ShotParameters {
    pub fn new(
        effector_angle_degrees: f64,
        left_output: f64,
        right_output: f64,
        flight_time_seconds: f64,
    ) -> ShotParameters {
        ShotParameters {
            effector_angle: Angle::new::<degree>(effector_angle_degrees),
            left_output,
            right_output,
            flight_time: Time::new::<second>(flight_time_seconds),
        }
    }

    /// Componentwise lerp, t = 0 is self.
    pub fn interpolate(&self, other: &ShotParameters, t: f64) -> ShotParameters {
        ShotParameters {
            effector_angle: self.effector_angle + (other.effector_angle - self.effector_angle) * t,
            left_output: self.left_output + (other.left_output - self.left_output) * t,
            right_output: self.right_output + (other.right_output - self.right_output) * t,
            flight_time: self.flight_time + (other.flight_time - self.flight_time) * t,
        }
    }

    fn is_finite(&self) -> bool {
        self.effector_angle.get::<degree>().is_finite()
            && self.left_output.is_finite()
            && self.right_output.is_finite()
            && self.flight_time.get::<second>().is_finite()
    }
}

/// Result of a lookup. clamped is set when the range fell outside the table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotSample {
    pub parameters: ShotParameters,
    pub clamped: bool,
}

/// ## Range (meters) -> shot parameters, linearly interpolated between entries.
/// Never empty, keys strictly increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotTable {
    entries: Vec<(f64, ShotParameters)>,
}

impl ShotTable {
    /// Entries can come in any order. Empty tables, repeated ranges and non-finite values are rejected.
    pub fn new(mut entries: Vec<(f64, ShotParameters)>) -> Result<ShotTable, SwerveError> {
        if entries.is_empty() {
            return Err(SwerveError::InvalidShotTable("no entries".to_owned()));
        }
        if let Some((range, _)) = entries
            .iter()
            .find(|(range, parameters)| !range.is_finite() || !parameters.is_finite())
        {
            return Err(SwerveError::InvalidShotTable(format!(
                "non-finite entry at range {range}"
            )));
        }

        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(SwerveError::InvalidShotTable(format!(
                "range {} appears more than once",
                pair[0].0
            )));
        }

        Ok(ShotTable { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ranges(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(range, _)| *range)
    }

    /// ## Interpolated parameters at `range`.
    /// Outside the table the nearest end entry is used and the sample is marked clamped.
    pub fn sample(&self, range: f64) -> ShotSample {
        let first = self.entries[0];
        let last = self.entries[self.entries.len() - 1];

        if range.is_nan() || range < first.0 {
            return ShotSample {
                parameters: first.1,
                clamped: true,
            };
        }
        if range >= last.0 {
            return ShotSample {
                parameters: last.1,
                clamped: range > last.0,
            };
        }

        // first key <= range < last key, so 1 <= upper <= len - 1
        let upper = self.entries.partition_point(|(key, _)| *key <= range);
        let (low_range, low) = self.entries[upper - 1];
        let (high_range, high) = self.entries[upper];
        let t = ((range - low_range) / (high_range - low_range)).clamp(0.0, 1.0);

        ShotSample {
            parameters: low.interpolate(&high, t),
            clamped: false,
        }
    }
}
