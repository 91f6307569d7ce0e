use crate::subsystems::swerve::geometry::Pose;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;
use uom::si::angle::radian;
use uom::si::length::meter;

/// ## Named key -> value sink for an external logger or dashboard.
/// Nothing in the core reads these values back.
pub trait Telemetry {
    fn put_number(&mut self, key: &str, value: f64);

    fn put_bool(&mut self, key: &str, value: bool) {
        self.put_number(key, if value { 1.0 } else { 0.0 });
    }

    fn put_pose(&mut self, key: &str, pose: &Pose) {
        self.put_number(&format!("{key}/x"), pose.x.get::<meter>());
        self.put_number(&format!("{key}/y"), pose.y.get::<meter>());
        self.put_number(&format!("{key}/heading"), pose.angle.get::<radian>());
    }
}

/// Emits every value as a trace event under the `telemetry` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn put_number(&mut self, key: &str, value: f64) {
        trace!(target: "telemetry", key, value);
    }
}

/// Keeps the latest value per key. The binary dumps it as json on exit.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryTelemetry {
    values: BTreeMap<String, f64>,
}

impl MemoryTelemetry {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.values)
    }
}

impl Telemetry for MemoryTelemetry {
    fn put_number(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_owned(), value);
    }
}
