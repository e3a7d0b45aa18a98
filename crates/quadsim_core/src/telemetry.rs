//! Joint telemetry recorded by the controller
//!
//! One sample is taken each time the controller re-targets the joints. The
//! overlay plots the buffered samples as joint speed and joint torque over
//! time; the buffer is emptied whenever the robot pose is reset.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One telemetry record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Controller time since the last pose reset, seconds
    pub time: f64,
    /// Actuated joint velocities, rad/s
    pub joint_speed: Vec<f64>,
    /// Actuated joint torques, N·m
    pub joint_torque: Vec<f64>,
}

/// Which recorded quantity to read back
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    JointSpeed,
    JointTorque,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 2] = [SeriesKind::JointSpeed, SeriesKind::JointTorque];

    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::JointSpeed => "joint speed",
            SeriesKind::JointTorque => "joint torque",
        }
    }

    fn select<'a>(&self, sample: &'a TelemetrySample) -> &'a [f64] {
        match self {
            SeriesKind::JointSpeed => &sample.joint_speed,
            SeriesKind::JointTorque => &sample.joint_torque,
        }
    }
}

/// Receiver of controller telemetry
pub trait TelemetrySink {
    fn push(&mut self, sample: TelemetrySample);
    fn clear(&mut self);
}

/// Append-only sample store with an optional size cap
#[derive(Clone, Debug, Default, Serialize)]
pub struct TelemetryBuffer {
    samples: VecDeque<TelemetrySample>,
    capacity: Option<usize>,
}

impl TelemetryBuffer {
    /// Unbounded buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that drops its oldest sample once `capacity` is reached
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&TelemetrySample> {
        self.samples.back()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Number of joints in the most recent sample
    pub fn joint_count(&self) -> usize {
        self.latest().map(|s| s.joint_speed.len()).unwrap_or(0)
    }

    /// `(time, value)` pairs for one joint; samples missing the joint are skipped
    pub fn series(&self, kind: SeriesKind, joint: usize) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| kind.select(s).get(joint).map(|v| (s.time, *v)))
            .collect()
    }

    /// First and last sample time
    pub fn time_span(&self) -> Option<(f64, f64)> {
        Some((self.samples.front()?.time, self.samples.back()?.time))
    }

    /// Smallest and largest value of a quantity across all joints
    pub fn value_range(&self, kind: SeriesKind) -> Option<(f64, f64)> {
        self.samples
            .iter()
            .flat_map(|s| kind.select(s).iter().copied())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl TelemetrySink for TelemetryBuffer {
    fn push(&mut self, sample: TelemetrySample) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.samples.len() >= capacity {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, speed: f64, torque: f64) -> TelemetrySample {
        TelemetrySample {
            time,
            joint_speed: vec![speed, -speed],
            joint_torque: vec![torque, 2.0 * torque],
        }
    }

    #[test]
    fn test_push_and_clear() {
        let mut buffer = TelemetryBuffer::new();
        assert!(buffer.is_empty());
        buffer.push(sample(0.1, 1.0, 5.0));
        buffer.push(sample(0.2, 2.0, 6.0));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.times(), vec![0.1, 0.2]);
        assert_eq!(buffer.latest().unwrap().time, 0.2);
        assert_eq!(buffer.joint_count(), 2);

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
        assert!(buffer.time_span().is_none());
    }

    #[test]
    fn test_series() {
        let mut buffer = TelemetryBuffer::new();
        buffer.push(sample(0.1, 1.0, 5.0));
        buffer.push(sample(0.2, 2.0, 6.0));
        assert_eq!(buffer.series(SeriesKind::JointSpeed, 1), vec![(0.1, -1.0), (0.2, -2.0)]);
        assert_eq!(buffer.series(SeriesKind::JointTorque, 1), vec![(0.1, 10.0), (0.2, 12.0)]);
        assert!(buffer.series(SeriesKind::JointTorque, 5).is_empty());
    }

    #[test]
    fn test_ranges() {
        let mut buffer = TelemetryBuffer::new();
        assert!(buffer.value_range(SeriesKind::JointSpeed).is_none());
        buffer.push(sample(0.1, 1.0, 5.0));
        buffer.push(sample(0.3, 2.0, -6.0));
        assert_eq!(buffer.time_span(), Some((0.1, 0.3)));
        assert_eq!(buffer.value_range(SeriesKind::JointSpeed), Some((-2.0, 2.0)));
        assert_eq!(buffer.value_range(SeriesKind::JointTorque), Some((-12.0, 10.0)));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut buffer = TelemetryBuffer::with_capacity(2);
        for i in 0..5 {
            buffer.push(sample(i as f64, 0.0, 0.0));
        }
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.times(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut buffer = TelemetryBuffer::with_capacity(0);
        buffer.push(sample(0.0, 0.0, 0.0));
        assert!(buffer.is_empty());
    }
}
