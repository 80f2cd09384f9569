use mpi::{
    topology::{Rank, UserCommunicator},
    traits::*,
};

use itertools::Itertools;

use rusty_kdtree::{
    comm::{Exchange, MpiExchange},
    config::TreeConfig,
    constants::ROOT_RANK,
    distributed::DistributedTree,
    helpers::uniform_points,
};

const NPOINTS: usize = 10000;
const LEAF_SIZE: usize = 32;

type Comm = MpiExchange<UserCommunicator>;

fn tree_fixture(comm: &Comm) -> DistributedTree {
    let points = uniform_points(NPOINTS, 3, 0).unwrap();
    let config = TreeConfig::with_leaf_size(LEAF_SIZE).unwrap();

    // A failed rank would leave its partners waiting forever
    match DistributedTree::with_config(points, &config, comm) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("rank {}: {}", comm.rank(), e);
            comm.abort(1)
        }
    }
}

/// Test that leaves respect the leaf size, and hold the points mapped to them.
fn test_leaves(tree: &DistributedTree) {
    for node in tree.nodes().iter().filter(|n| n.is_leaf()) {
        assert!(node.npoints <= LEAF_SIZE);
    }

    for (i, &id) in tree.node_of_point().iter().enumerate() {
        let bounds = tree.bounds(id).unwrap();
        assert!(bounds.contains_point(tree.points().point(i)));
    }
}

/// Test that the local subtree is numbered contiguously, in preorder.
fn test_local_preorder(tree: &DistributedTree) {
    assert!(tree
        .nodes()
        .iter()
        .tuple_windows()
        .all(|(a, b)| b.id == a.id + 1));

    for node in tree.nodes() {
        assert_eq!(node.box_idx, node.id - 1);
        if let Some(left) = node.left() {
            assert_eq!(left, node.id + 1);
            assert!(node.right().unwrap() > left);
        }
    }
}

/// Test that the workers' subtrees and skeletons tile the identifiers `1..=total`.
fn test_global_numbering(comm: &Comm, tree: &DistributedTree) {
    let world = comm.communicator();
    let root_process = world.process_at_rank(ROOT_RANK as Rank);
    let size = world.size() as usize;
    let levels = tree.levels();

    let first = tree.root().map(|n| n.id as u64).unwrap_or_default();
    let nnodes = tree.nnodes() as u64;
    let npoints = tree.points().len() as u64;

    // A rank owns at most one skeleton node per level, unused entries stay 0
    let mut skeleton = vec![0u64; levels];
    for (entry, node) in skeleton.iter_mut().zip(tree.skeleton_nodes()) {
        *entry = node.id as u64;
    }

    if world.rank() == ROOT_RANK as Rank {
        let mut firsts = vec![0u64; size];
        let mut counts = vec![0u64; size];
        let mut points = vec![0u64; size];
        let mut skeletons = vec![0u64; size * levels];

        root_process.gather_into_root(&first, &mut firsts[..]);
        root_process.gather_into_root(&nnodes, &mut counts[..]);
        root_process.gather_into_root(&npoints, &mut points[..]);
        if levels > 0 {
            root_process.gather_into_root(&skeleton[..], &mut skeletons[..]);
        }

        let total = tree.global_node_count().unwrap() as u64;
        assert_eq!(points.iter().sum::<u64>(), NPOINTS as u64);

        // Subtrees follow each other in rank order
        let blocks: Vec<(u64, u64)> = firsts.into_iter().zip(counts).collect();
        assert!(blocks
            .iter()
            .tuple_windows()
            .all(|(a, b)| a.0 + a.1 <= b.0));

        let ids: Vec<u64> = skeletons
            .into_iter()
            .filter(|&id| id > 0)
            .chain(
                blocks
                    .iter()
                    .flat_map(|&(first, count)| first..first + count),
            )
            .sorted()
            .collect();
        assert_eq!(ids, (1..=total).collect::<Vec<_>>());

        println!("{} workers: {} nodes over {} points", size, total, NPOINTS);
    } else {
        root_process.gather_into(&first);
        root_process.gather_into(&nnodes);
        root_process.gather_into(&npoints);
        if levels > 0 {
            root_process.gather_into(&skeleton[..]);
        }
    }
}

fn main() {
    env_logger::init();

    let universe = mpi::initialize().unwrap();
    let comm = MpiExchange::new(universe.world().duplicate());

    let tree = tree_fixture(&comm);

    test_leaves(&tree);
    test_local_preorder(&tree);
    test_global_numbering(&comm, &tree);
}
