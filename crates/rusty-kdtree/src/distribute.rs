//! Communication free distribution of the point set over the workers.
//!
//! Every worker receives the full point set and repeats the same `log2(W)` median splits, so
//! all of them agree on the top of the tree without exchanging any data. Each split produces a
//! node of the global skeleton, stored only by the rank that owns it, and every worker narrows
//! its window to the half selected by one bit of its rank. What remains after the last round
//! is the slice the worker builds its own subtree over.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    partition::median_split,
    types::{
        bounds::BoxTable,
        node::Node,
        point::PointSet,
    },
};

/// The skeleton nodes stored by one worker, top down, with their boxes in the same order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub nodes: Vec<Node>,
    pub boxes: BoxTable,
}

/// A worker's private slice of the point set, and the part of the skeleton it owns.
#[derive(Debug)]
pub struct WorkingSet {
    pub points: PointSet,
    pub skeleton: Skeleton,
    /// Depth at which the workers' subtrees start, `log2(W)`.
    pub levels: usize,
}

/// Number of skeleton levels for `size` workers, which must be a power of two.
pub fn levels(size: usize) -> Result<usize> {
    if !size.is_power_of_two() {
        return Err(Error::WorldSize(size));
    }
    Ok(size.trailing_zeros() as usize)
}

/// Distance between the ranks that own skeleton nodes created in `round`.
pub fn stride(size: usize, round: usize) -> usize {
    size >> round
}

/// Whether `rank` stores the skeleton node it computes in `round`. Round `i` is owned by ranks
/// `0, stride, 2 * stride, ...` with `stride = size >> i`.
pub fn owns_skeleton_node(rank: usize, size: usize, round: usize) -> bool {
    let stride = stride(size, round);
    stride > 0 && rank % stride == 0
}

/// Whether `rank` continues with the right half after the split of `round`. This is bit
/// `levels - round - 1` of the rank, read from the most significant used bit downwards.
pub fn takes_right_half(rank: usize, size: usize, round: usize) -> bool {
    let levels = size.trailing_zeros() as usize;
    debug_assert!(round < levels);
    (rank >> (levels - round - 1)) & 1 == 1
}

/// Narrow the full point set down to this worker's slice, recording the skeleton nodes this
/// rank owns along the way. The input set is released once the slice has been copied out.
pub fn identify_working_set(points: PointSet, rank: usize, size: usize) -> Result<WorkingSet> {
    let levels = levels(size)?;
    if points.is_empty() {
        return Err(Error::EmptyPointSet);
    }

    let mut points = points;
    let dim = points.dim();
    let mut skeleton = Skeleton {
        nodes: Vec::with_capacity(levels),
        boxes: BoxTable::with_capacity(dim, levels + 1),
    };
    let mut scratch = BoxTable::with_capacity(dim, 1);
    let mut window = points.window();

    for round in 0..levels {
        scratch.clear();
        let bounds = scratch.push_window(&points, window);
        let (split_dim, _) = bounds.widest_dimension();

        let split = median_split(&mut points, window, split_dim);
        let right_len = split.right_len(window);

        if !split.is_usable(window) {
            return Err(Error::DegenerateSplit {
                round,
                left: split.left_len,
                right: right_len,
            });
        }

        if owns_skeleton_node(rank, size, round) {
            let id = skeleton.nodes.len() + 1;
            skeleton.nodes.push(Node::internal(
                id,
                split_dim,
                split.value,
                window.len,
                round,
            ));
            skeleton.boxes.push(bounds);
        }

        let (left, right) = window.split_at(split.left_len);
        window = if takes_right_half(rank, size, round) {
            right
        } else {
            left
        };

        debug!(
            "rank {} round {}: split dim {} at {} ({} | {}), keeping {:?}",
            rank, round, split_dim, split.value, split.left_len, right_len, window
        );
    }

    let slice = points.extract(window);
    drop(points);

    Ok(WorkingSet {
        points: slice,
        skeleton,
        levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use crate::{helpers::uniform_points, types::node::NodeKind};

    #[test]
    fn test_levels() {
        assert_eq!(levels(1).unwrap(), 0);
        assert_eq!(levels(2).unwrap(), 1);
        assert_eq!(levels(8).unwrap(), 3);
        assert!(matches!(levels(0), Err(Error::WorldSize(0))));
        assert!(matches!(levels(6), Err(Error::WorldSize(6))));
    }

    #[test]
    fn test_ownership() {
        // Round 0 is the root, owned by rank 0 alone
        let owners = |size: usize, round: usize| -> Vec<usize> {
            (0..size)
                .filter(|&rank| owns_skeleton_node(rank, size, round))
                .collect()
        };
        assert_eq!(owners(8, 0), vec![0]);
        assert_eq!(owners(8, 1), vec![0, 4]);
        assert_eq!(owners(8, 2), vec![0, 2, 4, 6]);
        assert_eq!(owners(2, 0), vec![0]);

        // Every skeleton node has exactly one owner, W - 1 nodes in total
        for size in [2usize, 4, 8, 16, 32] {
            let total: usize = (0..levels(size).unwrap())
                .map(|round| owners(size, round).len())
                .sum();
            assert_eq!(total, size - 1);
        }
    }

    #[test]
    fn test_direction() {
        // With 8 workers ranks 0-3 go left first, then 0-1 and 4-5 go left, then the even ranks
        let path = |rank: usize| -> Vec<bool> {
            (0..3).map(|round| takes_right_half(rank, 8, round)).collect()
        };
        assert_eq!(path(0), vec![false, false, false]);
        assert_eq!(path(1), vec![false, false, true]);
        assert_eq!(path(5), vec![true, false, true]);
        assert_eq!(path(6), vec![true, true, false]);
        assert_eq!(path(7), vec![true, true, true]);

        // Each rank takes a different path
        let paths: HashSet<Vec<bool>> = (0..8).map(path).collect();
        assert_eq!(paths.len(), 8);
    }

    #[test]
    fn test_single_worker_keeps_everything() {
        let points = uniform_points(100, 3, 0).unwrap();
        let working = identify_working_set(points.clone(), 0, 1).unwrap();

        assert_eq!(working.levels, 0);
        assert_eq!(working.points, points);
        assert!(working.skeleton.nodes.is_empty());
    }

    #[test]
    fn test_slices_partition_the_points() {
        let size = 8;
        let points = uniform_points(1000, 3, 0).unwrap();

        let mut seen: HashSet<u64> = HashSet::new();
        let mut nskeleton = 0;

        for rank in 0..size {
            let working = identify_working_set(points.clone(), rank, size).unwrap();
            let n = working.points.len();
            assert!(n == 125, "rank {} holds {} points", rank, n);

            for &id in working.points.ids() {
                assert!(seen.insert(id));
                // Coordinates travelled with their ids
                let i = working.points.ids().iter().position(|&x| x == id).unwrap();
                assert_eq!(working.points.point(i), points.point(id as usize));
            }

            let skeleton = &working.skeleton;
            assert_eq!(skeleton.nodes.len(), skeleton.boxes.len());
            for (position, node) in skeleton.nodes.iter().enumerate() {
                assert_eq!(node.id, position + 1);
                assert_eq!(node.left(), Some(node.id + 1));
                assert!(matches!(node.kind, NodeKind::Internal { right: None, .. }));
            }
            nskeleton += skeleton.nodes.len();
        }

        assert_eq!(seen.len(), 1000);
        assert_eq!(nskeleton, size - 1);
    }

    #[test]
    fn test_skeleton_of_rank_zero() {
        let points = uniform_points(64, 2, 3).unwrap();
        let working = identify_working_set(points, 0, 4).unwrap();
        let nodes = &working.skeleton.nodes;

        // Rank 0 owns the root and its left child
        assert_eq!(nodes.len(), 2);
        assert_eq!((nodes[0].level, nodes[0].npoints), (0, 64));
        assert_eq!((nodes[1].level, nodes[1].npoints), (1, 32));
        let root = working.skeleton.boxes.get(0).unwrap();
        let child = working.skeleton.boxes.get(1).unwrap();
        assert!(root.contains(&child));
        assert_eq!(working.points.len(), 16);
    }

    #[test]
    fn test_too_few_points() {
        // Four points can not be split twice without leaving a single point
        let points = uniform_points(4, 2, 0).unwrap();
        assert!(matches!(
            identify_working_set(points, 1, 4),
            Err(Error::DegenerateSplit {
                round: 1,
                left: 1,
                right: 1
            })
        ));

        let points = uniform_points(100, 2, 0).unwrap();
        assert!(matches!(
            identify_working_set(points, 0, 3),
            Err(Error::WorldSize(3))
        ));
    }

    #[test]
    fn test_duplicate_points_are_fatal() {
        let points = PointSet::new(2, vec![1.; 40], (0..20).collect()).unwrap();
        assert!(matches!(
            identify_working_set(points, 0, 2),
            Err(Error::DegenerateSplit { round: 0, left: 20, right: 0 })
        ));
    }
}
