//! In place partitioning of a window of points along one dimension.
//!
//! Points and their identifiers are always moved together, every routine here only swaps
//! whole entries of a [`PointSet`].

use crate::types::{
    bounds::Bounds,
    point::{PointSet, PointType, Window},
};

/// Outcome of partitioning a window around `value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Split {
    pub value: PointType,
    /// Number of entries with coordinate `<= value`, these now lead the window.
    pub left_len: usize,
    /// Both sides are non-empty.
    pub occurred: bool,
}

impl Split {
    pub fn right_len(&self, window: Window) -> usize {
        window.len - self.left_len
    }

    /// A usable split leaves at least two points on either side.
    pub fn is_usable(&self, window: Window) -> bool {
        self.occurred && self.left_len != 1 && self.right_len(window) != 1
    }
}

/// Rearrange the window so that coordinates `<= value` along `dim` precede those `> value`.
pub fn left_right_split(
    points: &mut PointSet,
    window: Window,
    dim: usize,
    value: PointType,
) -> Split {
    // [start, lo) is known to be <= value, [hi, end) is known to be > value.
    let mut lo = window.start;
    let mut hi = window.end();

    loop {
        while lo < hi && points.coordinate(lo, dim) <= value {
            lo += 1;
        }
        while lo < hi && points.coordinate(hi - 1, dim) > value {
            hi -= 1;
        }
        if lo < hi {
            points.swap(lo, hi - 1);
            lo += 1;
            hi -= 1;
        } else {
            break;
        }
    }

    let left_len = lo - window.start;
    Split {
        value,
        left_len,
        occurred: left_len > 0 && left_len < window.len,
    }
}

/// Split at the exact median of `dim`, the element of rank `(n - 1) / 2`.
pub fn median_split(points: &mut PointSet, window: Window, dim: usize) -> Split {
    let nth = (window.len - 1) / 2;
    select_nth(points, window, dim, nth);
    let value = points.coordinate(window.start + nth, dim);
    left_right_split(points, window, dim, value)
}

/// Split at the centre of the window's extent along `dim`.
pub fn midpoint_split(
    points: &mut PointSet,
    window: Window,
    dim: usize,
    bounds: &Bounds<'_>,
) -> Split {
    let value = (bounds.min[dim] + bounds.max[dim]) / 2.;
    left_right_split(points, window, dim, value)
}

/// Quickselect: place the element of rank `nth` (counted within the window) along `dim` at
/// `window.start + nth`, with no greater element before it and no smaller one after it.
///
/// The pivot is the middle element of the current range, as the windows handed in here are
/// often already sorted from previous splits.
pub fn select_nth(points: &mut PointSet, window: Window, dim: usize, nth: usize) {
    debug_assert!(nth < window.len);
    let target = window.start + nth;
    let mut lo = window.start;
    let mut hi = window.end();

    while hi - lo > 1 {
        let (lt, gt) = partition_three_way(points, lo, hi, dim);
        if target < lt {
            hi = lt;
        } else if target >= gt {
            lo = gt;
        } else {
            return;
        }
    }
}

/// Partition `[lo, hi)` around its middle element into `< pivot`, `== pivot`, `> pivot`, and
/// return the bounds `[lt, gt)` of the equal run, which is never empty.
fn partition_three_way(points: &mut PointSet, lo: usize, hi: usize, dim: usize) -> (usize, usize) {
    let pivot = points.coordinate(lo + (hi - lo) / 2, dim);
    let mut lt = lo;
    let mut i = lo;
    let mut gt = hi;

    while i < gt {
        let value = points.coordinate(i, dim);
        if value < pivot {
            points.swap(lt, i);
            lt += 1;
            i += 1;
        } else if value > pivot {
            gt -= 1;
            points.swap(i, gt);
        } else {
            i += 1;
        }
    }
    (lt, gt)
}
