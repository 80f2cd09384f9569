//! Build a tree over four in-process workers and report each worker's share.
//!
//! Run with `RUST_LOG=debug` to follow the partitioning and collation rounds.

use rusty_kdtree::{
    comm::run_threaded, config::TreeConfig, distributed::DistributedTree,
    helpers::uniform_points, Result,
};

fn main() -> Result<()> {
    env_logger::init();

    let points = uniform_points(100000, 3, 0)?;
    let config = TreeConfig::with_leaf_size(32)?;

    let trees = run_threaded(4, |comm| {
        DistributedTree::with_config(points.clone(), &config, &comm)
    });

    for tree in trees {
        let tree = tree?;
        if let Some(total) = tree.global_node_count() {
            println!("global tree: {} nodes", total);
        }
        println!("rank {}: {}", tree.rank(), tree.statistics());
    }
    Ok(())
}
