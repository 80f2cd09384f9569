//! Axis aligned bounding boxes, and the distance bounds used to prune proximity searches.

use serde::{Deserialize, Serialize};

use crate::types::point::{PointSet, PointType, Window};

/// Flat storage of one bounding box per node. Slot `i` spans
/// `mins[i * dim..(i + 1) * dim]` and `maxs[i * dim..(i + 1) * dim]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxTable {
    dim: usize,
    mins: Vec<PointType>,
    maxs: Vec<PointType>,
}

/// A borrowed view of a single box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<'a> {
    pub min: &'a [PointType],
    pub max: &'a [PointType],
}

impl BoxTable {
    pub fn with_capacity(dim: usize, nboxes: usize) -> BoxTable {
        BoxTable {
            dim,
            mins: Vec::with_capacity(dim * nboxes),
            maxs: Vec::with_capacity(dim * nboxes),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of boxes written so far, which is also the next write slot.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.mins.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    pub fn mins(&self) -> &[PointType] {
        &self.mins
    }

    pub fn maxs(&self) -> &[PointType] {
        &self.maxs
    }

    pub fn get(&self, slot: usize) -> Option<Bounds<'_>> {
        if slot >= self.len() {
            return None;
        }
        let range = slot * self.dim..(slot + 1) * self.dim;
        Some(Bounds {
            min: &self.mins[range.clone()],
            max: &self.maxs[range],
        })
    }

    pub fn push(&mut self, bounds: Bounds<'_>) -> usize {
        debug_assert_eq!(bounds.dim(), self.dim);
        self.mins.extend_from_slice(bounds.min);
        self.maxs.extend_from_slice(bounds.max);
        self.len() - 1
    }

    /// Append the tightest box around the points of a non-empty window, returning a view of it.
    pub fn push_window(&mut self, points: &PointSet, window: Window) -> Bounds<'_> {
        debug_assert!(!window.is_empty());
        let first = points.point(window.start);
        self.mins.extend_from_slice(first);
        self.maxs.extend_from_slice(first);

        let offset = self.mins.len() - self.dim;
        let (mins, maxs) = (&mut self.mins[offset..], &mut self.maxs[offset..]);

        for index in (window.start + 1)..window.end() {
            for (d, &value) in points.point(index).iter().enumerate() {
                if value < mins[d] {
                    mins[d] = value;
                } else if value > maxs[d] {
                    maxs[d] = value;
                }
            }
        }
        Bounds {
            min: &self.mins[offset..],
            max: &self.maxs[offset..],
        }
    }

    pub fn clear(&mut self) {
        self.mins.clear();
        self.maxs.clear();
    }
}

impl<'a> Bounds<'a> {
    pub fn dim(&self) -> usize {
        self.min.len()
    }

    /// The dimension of largest extent, the first one on ties, and the midpoint along it.
    pub fn widest_dimension(&self) -> (usize, PointType) {
        let mut widest = 0;
        let mut range = self.max[0] - self.min[0];

        for d in 1..self.dim() {
            let r = self.max[d] - self.min[d];
            if r > range {
                range = r;
                widest = d;
            }
        }
        (widest, (self.max[widest] + self.min[widest]) / 2.)
    }

    pub fn contains_point(&self, point: &[PointType]) -> bool {
        point
            .iter()
            .enumerate()
            .all(|(d, &p)| self.min[d] <= p && p <= self.max[d])
    }

    pub fn contains(&self, other: &Bounds<'_>) -> bool {
        (0..self.dim()).all(|d| self.min[d] <= other.min[d] && other.max[d] <= self.max[d])
    }

    pub fn overlaps(&self, other: &Bounds<'_>) -> bool {
        (0..self.dim()).all(|d| self.min[d] <= other.max[d] && other.min[d] <= self.max[d])
    }

    /// Squared distance from a point to the nearest point of the box, zero inside.
    pub fn min_sq_dist_point(&self, point: &[PointType]) -> PointType {
        let mut sq_dist = 0.;
        for (d, &p) in point.iter().enumerate() {
            if p < self.min[d] {
                let delta = self.min[d] - p;
                sq_dist += delta * delta;
            } else if p > self.max[d] {
                let delta = p - self.max[d];
                sq_dist += delta * delta;
            }
        }
        sq_dist
    }

    /// Squared gap between two boxes, zero when they overlap or touch.
    pub fn min_sq_dist(&self, other: &Bounds<'_>) -> PointType {
        let mut sq_dist = 0.;
        for d in 0..self.dim() {
            if self.max[d] < other.min[d] {
                let delta = other.min[d] - self.max[d];
                sq_dist += delta * delta;
            } else if self.min[d] > other.max[d] {
                let delta = self.min[d] - other.max[d];
                sq_dist += delta * delta;
            }
        }
        sq_dist
    }

    /// Upper bound on the squared distance between a point of each box: the squared diagonal
    /// of their union.
    pub fn max_sq_dist(&self, other: &Bounds<'_>) -> PointType {
        let mut sq_dist = 0.;
        for d in 0..self.dim() {
            let delta = self.max[d].max(other.max[d]) - self.min[d].min(other.min[d]);
            sq_dist += delta * delta;
        }
        sq_dist
    }
}
