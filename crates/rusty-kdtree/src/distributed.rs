//! Data structures and methods to create distributed k-d trees.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    collate::collate,
    comm::Exchange,
    config::TreeConfig,
    data::JSON,
    distribute::{identify_working_set, Skeleton, WorkingSet},
    error::{Error, Result},
    single_node::{BuildParams, LocalTree},
    types::{
        bounds::{BoxTable, Bounds},
        node::{Node, NodeId},
        point::{PointSet, PointType},
    },
};

/// One worker's share of a k-d tree built across all workers of a communicator.
///
/// Node identifiers are global: the union of every worker's `nodes` and skeleton nodes is a
/// single preorder numbering `1..=global_node_count`, and a node's box lives at global index
/// `id - 1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributedTree {
    rank: usize,
    size: usize,
    levels: usize,
    leaf_size: usize,

    /// This worker's slice of the points, reordered so that every node's points are contiguous.
    points: PointSet,

    /// The local subtree in preorder, its root first.
    nodes: Vec<Node>,
    boxes: BoxTable,

    /// Leaf holding each local point.
    node_of_point: Vec<NodeId>,

    /// The nodes above the local subtrees that this worker owns.
    skeleton: Skeleton,

    total_points: usize,
    global_node_count: Option<usize>,
    creation_time: Duration,
}

/// Summary of a worker's local subtree.
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub number_of_points: usize,
    pub number_of_nodes: usize,
    pub number_of_leaves: usize,
    pub max_level: usize,
    pub creation_time: Duration,
    pub minimum_points_in_leaf: usize,
    pub maximum_points_in_leaf: usize,
    pub average_points_in_leaf: f64,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\n\nTree Statistics\n\
             ==============================\n\
             Number of points: {}\n\
             Number of nodes: {}\n\
             Number of leaves: {}\n\
             Maximum level: {}\n\
             Creation time [s]: {}\n\
             Minimum number of points in leaf: {}\n\
             Maximum number of points in leaf: {}\n\
             Average number of points in leaf: {:.2}\n\
             ==============================\n",
            self.number_of_points,
            self.number_of_nodes,
            self.number_of_leaves,
            self.max_level,
            (self.creation_time.as_millis() as f64) / 1000.0,
            self.minimum_points_in_leaf,
            self.maximum_points_in_leaf,
            self.average_points_in_leaf
        )
    }
}

impl DistributedTree {
    /// Create a new DistributedTree with the default leaf size. Every worker passes the same
    /// full point set.
    pub fn new<E: Exchange>(points: PointSet, comm: &E) -> Result<DistributedTree> {
        DistributedTree::with_config(points, &TreeConfig::default(), comm)
    }

    /// Create a new DistributedTree with a chosen configuration.
    ///
    /// An error on one worker surfaces on its partners only as a failed exchange, and under MPI
    /// not at all: callers using `MpiExchange` must abort the job on `Err`.
    pub fn with_config<E: Exchange>(
        points: PointSet,
        config: &TreeConfig,
        comm: &E,
    ) -> Result<DistributedTree> {
        config.validate()?;
        let start = Instant::now();

        let rank = comm.rank();
        let size = comm.size();
        let total_points = points.len();

        // Workers settle on their slices without communicating
        let WorkingSet {
            mut points,
            mut skeleton,
            levels,
        } = identify_working_set(points, rank, size)?;

        let params = BuildParams {
            leaf_size: config.leaf_size,
            median_cutoff: levels,
            first_id: skeleton.nodes.len() + 1,
            level: levels,
        };
        let mut local = LocalTree::build(&mut points, params);

        let global_node_count = collate(comm, &mut skeleton.nodes, &mut local)?;
        let creation_time = start.elapsed();

        info!(
            "rank {} of {}: {} nodes over {} points in {:?}",
            rank,
            size,
            local.len(),
            points.len(),
            creation_time
        );
        if let Some(count) = global_node_count {
            info!("global tree has {} nodes over {} points", count, total_points);
        }

        Ok(DistributedTree {
            rank,
            size,
            levels,
            leaf_size: config.leaf_size,
            points,
            nodes: local.nodes,
            boxes: local.boxes,
            node_of_point: local.node_of_point,
            skeleton,
            total_points,
            global_node_count,
            creation_time,
        })
    }

    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Depth of the skeleton, the level at which the local subtrees start.
    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Deepest level still split at the median, below it splits are at the midpoint.
    pub fn median_cutoff(&self) -> usize {
        self.levels
    }

    /// Number of nodes in the local subtree.
    pub fn nnodes(&self) -> usize {
        self.nodes.len()
    }

    /// Local node by its position in preorder.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Root of the local subtree.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn boxes(&self) -> &BoxTable {
        &self.boxes
    }

    pub fn node_of_point(&self) -> &[NodeId] {
        &self.node_of_point
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn skeleton_nodes(&self) -> &[Node] {
        &self.skeleton.nodes
    }

    pub fn skeleton_boxes(&self) -> &BoxTable {
        &self.skeleton.boxes
    }

    /// Size of the point set the tree was built over, across all workers.
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// Node count of the whole tree, only known on rank 0.
    pub fn global_node_count(&self) -> Option<usize> {
        self.global_node_count
    }

    /// Bounding box of a node held by this worker, either in its subtree or its skeleton.
    pub fn bounds(&self, id: NodeId) -> Result<Bounds<'_>> {
        if let Some(position) = self.skeleton.nodes.iter().position(|n| n.id == id) {
            return self.skeleton.boxes.get(position).ok_or(Error::NodeNotFound(id));
        }

        let first = self.nodes.first().map(|n| n.id).ok_or(Error::NodeNotFound(id))?;
        if id < first {
            return Err(Error::NodeNotFound(id));
        }
        match self.nodes.get(id - first) {
            Some(node) if node.id == id => {
                self.boxes.get(id - first).ok_or(Error::NodeNotFound(id))
            }
            _ => Err(Error::NodeNotFound(id)),
        }
    }

    /// Squared distance from `point` to the nearest point of a node's box.
    pub fn min_sq_dist_to_point(&self, id: NodeId, point: &[PointType]) -> Result<PointType> {
        if point.len() != self.dim() {
            return Err(Error::Dimension {
                expected: self.dim(),
                found: point.len(),
            });
        }
        Ok(self.bounds(id)?.min_sq_dist_point(point))
    }

    /// Lower bound on the squared distance between points of two nodes.
    pub fn min_sq_dist(&self, a: NodeId, b: NodeId) -> Result<PointType> {
        Ok(self.bounds(a)?.min_sq_dist(&self.bounds(b)?))
    }

    /// Upper bound on the squared distance between points of two nodes.
    pub fn max_sq_dist(&self, a: NodeId, b: NodeId) -> Result<PointType> {
        Ok(self.bounds(a)?.max_sq_dist(&self.bounds(b)?))
    }

    pub fn statistics(&self) -> Statistics {
        let leaves: Vec<usize> = self
            .nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.npoints)
            .collect();

        let average = if leaves.is_empty() {
            0.
        } else {
            leaves.iter().sum::<usize>() as f64 / leaves.len() as f64
        };

        Statistics {
            number_of_points: self.points.len(),
            number_of_nodes: self.nodes.len(),
            number_of_leaves: leaves.len(),
            max_level: self.nodes.iter().map(|n| n.level).max().unwrap_or(self.levels),
            creation_time: self.creation_time,
            minimum_points_in_leaf: leaves.iter().copied().min().unwrap_or(0),
            maximum_points_in_leaf: leaves.iter().copied().max().unwrap_or(0),
            average_points_in_leaf: average,
        }
    }

    /// Write this worker's share to `<prefix>.<rank>.json`, once every worker has finished
    /// building.
    pub fn save<E: Exchange, P: AsRef<Path>>(&self, comm: &E, prefix: P) -> Result<PathBuf> {
        comm.barrier()?;
        let path = rank_file(prefix.as_ref(), self.rank);
        self.write_json(&path)?;
        Ok(path)
    }

    /// Read back the share saved by this rank with [`DistributedTree::save`].
    pub fn load<E: Exchange, P: AsRef<Path>>(comm: &E, prefix: P) -> Result<DistributedTree> {
        let tree = DistributedTree::read_json(rank_file(prefix.as_ref(), comm.rank()))?;
        if tree.rank != comm.rank() || tree.size != comm.size() {
            return Err(Error::WrongWorker {
                rank: tree.rank,
                size: tree.size,
            });
        }
        Ok(tree)
    }
}

impl JSON for DistributedTree {}

fn rank_file(prefix: &Path, rank: usize) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".{}.json", rank));
    PathBuf::from(name)
}
