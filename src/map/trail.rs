//! Bounded history of recently rendered rider positions.

use crate::geo::LatLng;
use std::collections::VecDeque;

/// Default number of points kept.
pub const DEFAULT_TRAIL_CAPACITY: usize = 50;

/// Ring buffer of the most recent rendered points, oldest first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<LatLng>,
    capacity: usize,
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_CAPACITY)
    }
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest when full.
    pub fn push(&mut self, point: LatLng) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<LatLng> {
        self.points.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LatLng> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
