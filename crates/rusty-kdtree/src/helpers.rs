//! Assorted helper functions.

use rand::prelude::*;
use rand::SeedableRng;

use crate::{
    error::Result,
    types::point::{PointId, PointSet, PointType},
};

/// `npoints` seeded, uniformly distributed points in the unit cube of dimension `dim`,
/// numbered from zero.
pub fn uniform_points(npoints: usize, dim: usize, seed: u64) -> Result<PointSet> {
    let mut range = StdRng::seed_from_u64(seed);
    let between = rand::distributions::Uniform::from(0.0..1.0);

    let coordinates: Vec<PointType> = (0..npoints * dim)
        .map(|_| between.sample(&mut range))
        .collect();
    let ids: Vec<PointId> = (0..npoints as PointId).collect();

    PointSet::new(dim, coordinates, ids)
}

/// Estimated number of nodes in a tree over `npoints` points, used to size the node list and
/// box table up front so the recursive build does not reallocate.
pub fn initial_capacity(npoints: usize, leaf_size: usize) -> usize {
    let ratio = (2 * npoints) as f64 / leaf_size.max(1) as f64;
    if ratio <= 1. {
        return 2;
    }
    let exponent = ratio.log2().ceil() as u32;
    2usize.saturating_mul(1usize.checked_shl(exponent).unwrap_or(usize::MAX))
}
