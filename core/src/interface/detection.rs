use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::prelude::Condition;

/// Cube coordinate of a detected cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeakCoordinate {
    pub receiver: usize,
    pub chirp: usize,
    pub sample: usize,
}

impl PeakCoordinate {
    pub fn new(receiver: usize, chirp: usize, sample: usize) -> Self {
        Self {
            receiver,
            chirp,
            sample,
        }
    }
}

impl fmt::Display for PeakCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.receiver, self.chirp, self.sample)
    }
}

/// Spatial sample: one value per receiver at a single (chirp, sample) cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    values: Vec<Complex64>,
}

impl Snapshot {
    pub fn new(values: Vec<Complex64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    pub fn receivers(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Snapshots index-aligned with the peaks that produced them.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    pub peaks: Vec<PeakCoordinate>,
    pub snapshots: Vec<Snapshot>,
    pub conditions: Vec<Condition>,
}

impl SnapshotSet {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Direction of arrival for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoaEstimate {
    /// Index of the snapshot this estimate was computed from.
    pub snapshot: usize,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DoaBatch {
    pub estimates: Vec<DoaEstimate>,
    pub conditions: Vec<Condition>,
}
