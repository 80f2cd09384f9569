use std::collections::HashMap;
use std::time::Instant;

use mpi::collective::SystemOperation;
use mpi::{
    topology::{Rank, UserCommunicator},
    traits::*,
};

use rusty_kdtree::{
    comm::{Exchange, MpiExchange},
    constants::ROOT_RANK,
    distributed::DistributedTree,
    helpers::uniform_points,
};

/// Points per process, the problem grows with the number of processes.
const NPOINTS: usize = 100000;

pub type Times = HashMap<String, u128>;

/// Test fixture for a tree over NPOINTS points per process.
fn tree_fixture(comm: &MpiExchange<UserCommunicator>) -> (DistributedTree, Times) {
    let npoints = NPOINTS * comm.size();
    let points = uniform_points(npoints, 3, 0).unwrap();

    let mut times: Times = HashMap::new();
    let start = Instant::now();
    let tree = match DistributedTree::new(points, comm) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("rank {}: {}", comm.rank(), e);
            comm.abort(1)
        }
    };
    times.insert("total".to_string(), start.elapsed().as_millis());
    (tree, times)
}

fn main() {
    env_logger::init();

    let universe = mpi::initialize().unwrap();
    let comm = MpiExchange::new(universe.world().duplicate());

    let (tree, times) = tree_fixture(&comm);

    let world = comm.communicator();
    let rank = world.rank();
    let size = world.size();

    let root_rank = ROOT_RANK as Rank;
    let nleaves = tree.nodes().iter().filter(|n| n.is_leaf()).count() as u64;
    let mut sum = 0u64;

    // Print runtime to stdout
    if rank == root_rank {
        world
            .process_at_rank(root_rank)
            .reduce_into_root(&nleaves, &mut sum, SystemOperation::sum());

        // universe size, number of leaves, number of nodes, total runtime
        println!(
            "{:?}, {:?}, {:?}, {:?}",
            size,
            sum,
            tree.global_node_count().unwrap_or_default(),
            times.get(&"total".to_string()),
        )
    } else {
        world
            .process_at_rank(root_rank)
            .reduce_into(&nleaves, SystemOperation::sum())
    }
}
