use crate::subsystems::swerve::geometry::WheelPosition;
use crate::subsystems::swerve::io::OdometryReading;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use uom::si::f64::Angle;

/// The buffered streams behind the lock. One ring per wheel plus one for the gyro.
/// Every push of a full reading adds one entry to every ring, so index i of each ring is the
/// same sample. A heading of None is a sample the gyro missed.
#[derive(Debug)]
pub struct OdometrySamples {
    wheels: [VecDeque<WheelPosition>; 4],
    headings: VecDeque<Option<Angle>>,
    capacity: usize,
    overflowed: usize,
}

/// Everything taken out of the queue by one drain.
/// Every wheel vec has the same length, as does headings when the gyro was fused.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrainedSamples {
    pub wheels: [Vec<WheelPosition>; 4],
    pub headings: Vec<Option<Angle>>,
    /// Entries still queued in the longest stream after the drain.
    pub pending: usize,
}

impl DrainedSamples {
    pub fn len(&self) -> usize {
        self.wheels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ## Hand-off between the sampling thread and the control loop.
/// Cloning shares the same underlying rings.
#[derive(Clone, Debug)]
pub struct SampleQueue {
    inner: Arc<Mutex<OdometrySamples>>,
}

fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) -> bool {
    let evicted = if queue.len() >= capacity {
        queue.pop_front();
        true
    } else {
        false
    };
    queue.push_back(value);
    evicted
}

fn longest(samples: &OdometrySamples) -> usize {
    samples
        .wheels
        .iter()
        .map(VecDeque::len)
        .chain(std::iter::once(samples.headings.len()))
        .max()
        .unwrap_or(0)
}

impl SampleQueue {
    pub fn new(capacity: usize) -> SampleQueue {
        let capacity = capacity.max(1);
        SampleQueue {
            inner: Arc::new(Mutex::new(OdometrySamples {
                wheels: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
                headings: VecDeque::with_capacity(capacity),
                capacity,
                overflowed: 0,
            })),
        }
    }

    /// Pushes one synchronized reading. A missing gyro value still takes its slot so the
    /// heading ring never drifts out of step with the wheels.
    pub fn push(&self, reading: &OdometryReading) {
        let mut samples = self.inner.lock();
        let capacity = samples.capacity;
        let mut evicted = false;
        for (queue, position) in samples.wheels.iter_mut().zip(reading.wheels) {
            evicted |= push_bounded(queue, position, capacity);
        }
        evicted |= push_bounded(&mut samples.headings, reading.heading, capacity);
        if evicted {
            samples.overflowed += 1;
        }
    }

    pub fn push_wheel(&self, module: usize, position: WheelPosition) {
        let mut samples = self.inner.lock();
        let capacity = samples.capacity;
        let Some(queue) = samples.wheels.get_mut(module) else {
            return;
        };
        if push_bounded(queue, position, capacity) {
            samples.overflowed += 1;
        }
    }

    /// Pushes the gyro's part of a sample on its own. None marks a sample the gyro missed.
    pub fn push_heading(&self, heading: Option<Angle>) {
        let mut samples = self.inner.lock();
        let capacity = samples.capacity;
        if push_bounded(&mut samples.headings, heading, capacity) {
            samples.overflowed += 1;
        }
    }

    /// ## Takes the longest prefix every stream can supply.
    /// Whatever a faster stream has beyond that stays queued for next cycle.
    /// Without a fused gyro the heading entries for the drained samples are thrown away, so
    /// the rings stay in step for when the gyro comes back.
    pub fn drain(&self, gyro_fused: bool) -> DrainedSamples {
        let mut samples = self.inner.lock();
        let wheel_count = samples.wheels.iter().map(VecDeque::len).min().unwrap_or(0);
        let count = if gyro_fused {
            wheel_count.min(samples.headings.len())
        } else {
            wheel_count
        };

        let wheels = std::array::from_fn(|module| samples.wheels[module].drain(..count).collect());
        let heading_count = count.min(samples.headings.len());
        let headings: Vec<Option<Angle>> = samples.headings.drain(..heading_count).collect();
        let headings = if gyro_fused { headings } else { Vec::new() };
        let pending = longest(&samples);

        DrainedSamples {
            wheels,
            headings,
            pending,
        }
    }

    /// ## Empties every stream in one go.
    /// Unlike drain the streams are not cut to a common length, each vec holds everything its
    /// ring had. The last entry of each is the newest value that stream has seen.
    pub fn drain_all(&self) -> DrainedSamples {
        let mut samples = self.inner.lock();
        let wheels = std::array::from_fn(|module| samples.wheels[module].drain(..).collect());
        let headings = samples.headings.drain(..).collect();
        DrainedSamples {
            wheels,
            headings,
            pending: 0,
        }
    }

    /// Length of the longest stream.
    pub fn pending(&self) -> usize {
        longest(&self.inner.lock())
    }

    /// How many pushes have evicted an entry since this queue was made.
    pub fn overflowed(&self) -> usize {
        self.inner.lock().overflowed
    }
}
