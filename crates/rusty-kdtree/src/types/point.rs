//! Data structures and methods for sets of k-dimensional points.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type PointType = f64;

pub type PointId = u64;

/// A set of `k`-dimensional points stored as one flat coordinate buffer, together with a unique
/// identifier per point. Reordering always moves a point's coordinates and its identifier
/// together.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    dim: usize,
    coordinates: Vec<PointType>,
    ids: Vec<PointId>,
}

/// The active range `[start, start + len)` of a point set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub len: usize,
}

impl Window {
    pub fn new(start: usize, len: usize) -> Window {
        Window { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Split into the first `left_len` entries and the rest.
    pub fn split_at(self, left_len: usize) -> (Window, Window) {
        debug_assert!(left_len <= self.len);
        (
            Window::new(self.start, left_len),
            Window::new(self.start + left_len, self.len - left_len),
        )
    }
}

impl PointSet {
    /// Create a point set from flat coordinates, `dim` values per point.
    pub fn new(dim: usize, coordinates: Vec<PointType>, ids: Vec<PointId>) -> Result<PointSet> {
        if dim == 0 {
            return Err(Error::Dimension {
                expected: 1,
                found: 0,
            });
        }
        if coordinates.len() != dim * ids.len() {
            return Err(Error::Dimension {
                expected: dim * ids.len(),
                found: coordinates.len(),
            });
        }
        Ok(PointSet {
            dim,
            coordinates,
            ids,
        })
    }

    /// Create a point set from fixed size points, numbered by their position.
    pub fn from_points<const N: usize>(points: &[[PointType; N]]) -> Result<PointSet> {
        let coordinates = points.iter().flat_map(|p| p.iter().copied()).collect();
        let ids = (0..points.len() as PointId).collect();
        PointSet::new(N, coordinates, ids)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    pub fn coordinates(&self) -> &[PointType] {
        &self.coordinates
    }

    /// The window covering every point.
    pub fn window(&self) -> Window {
        Window::new(0, self.len())
    }

    pub fn point(&self, index: usize) -> &[PointType] {
        &self.coordinates[index * self.dim..(index + 1) * self.dim]
    }

    #[inline]
    pub fn coordinate(&self, index: usize, dim: usize) -> PointType {
        self.coordinates[index * self.dim + dim]
    }

    /// Exchange two points along with their identifiers.
    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for d in 0..self.dim {
            self.coordinates.swap(a * self.dim + d, b * self.dim + d);
        }
        self.ids.swap(a, b);
    }

    /// Copy the points of a window into a new, exactly sized, point set.
    pub fn extract(&self, window: Window) -> PointSet {
        PointSet {
            dim: self.dim,
            coordinates: self.coordinates[window.start * self.dim..window.end() * self.dim]
                .to_vec(),
            ids: self.ids[window.range()].to_vec(),
        }
    }
}
