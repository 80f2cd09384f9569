//! Stitching the workers' subtrees into one preorder numbering.
//!
//! After the local build every worker numbers its nodes as if it were alone. Each worker's
//! *spine* is the list of skeleton nodes it owns followed by its local root, top down. The
//! up-sweep accumulates subtree node counts towards rank 0 along the same binary tree the
//! partitioner used, and the down-sweep hands every right subtree the identifier offset at
//! which it starts. A final local pass shifts the remaining nodes, so identifiers `1..=total`
//! are used exactly once across all workers.

use log::debug;

use crate::{
    comm::Exchange,
    constants::{FAN_OUT, NODE_ID_TAG, OFFSET_TAG, ROOT_RANK, SUBTREE_SIZE_TAG},
    error::{Error, Result},
    single_node::LocalTree,
    types::node::Node,
};

/// Node counts of the subtrees rooted at each spine node, top down. Rank 0's first entry is
/// the node count of the whole tree.
pub fn up_sweep<E: Exchange>(comm: &E, local_count: usize) -> Result<Vec<usize>> {
    let rank = comm.rank();
    let size = comm.size();

    let mut sizes = vec![local_count];
    let mut stride = FAN_OUT;

    while stride <= size {
        let half = stride / FAN_OUT;
        if rank % stride == 0 {
            let theirs = comm.receive(rank + half, SUBTREE_SIZE_TAG)? as usize;
            let mine = sizes.last().copied().unwrap_or_default();
            sizes.push(mine + theirs + 1);
            debug!(
                "rank {} stride {}: subtree of {} + {} + 1 nodes",
                rank, stride, mine, theirs
            );
        } else if rank % stride == half {
            let mine = sizes.last().copied().unwrap_or_default();
            comm.send(mine as u64, rank - half, SUBTREE_SIZE_TAG)?;
        }
        stride *= FAN_OUT;
    }

    sizes.reverse();
    Ok(sizes)
}

/// Assign final identifiers to the spine, and link every skeleton node to its right child.
pub fn down_sweep<E: Exchange>(comm: &E, spine: &mut [Node], sizes: &[usize]) -> Result<()> {
    let rank = comm.rank();
    let mut stride = comm.size();
    let mut curr = 0;

    while stride >= FAN_OUT {
        let half = stride / FAN_OUT;

        if rank % stride == 0 {
            curr += 1;
            let (Some(node), Some(&count)) = (spine.get(curr), sizes.get(curr)) else {
                return Err(Error::Spine {
                    rank,
                    length: spine.len(),
                    index: curr,
                });
            };

            // The right subtree starts where the left one, rooted at spine[curr], ends
            let offset = count + node.id - 1;
            comm.send(offset as u64, rank + half, OFFSET_TAG)?;
            let right = comm.receive(rank + half, NODE_ID_TAG)? as usize;
            spine[curr - 1].set_right(right);

            debug!(
                "rank {} stride {}: node {} gets right child {}",
                rank,
                stride,
                spine[curr - 1].id,
                right
            );
        } else if rank % stride == half {
            let offset = comm.receive(rank - half, OFFSET_TAG)? as usize;
            for node in spine.iter_mut() {
                node.shift(offset);
            }
            let top = spine.first().map(|node| node.id).unwrap_or_default();
            comm.send(top as u64, rank - half, NODE_ID_TAG)?;
            debug!("rank {} stride {}: shifted by {}", rank, stride, offset);
        }

        stride /= FAN_OUT;
    }

    Ok(())
}

/// Move the local subtree to the identifiers its root was given by the down-sweep.
pub fn fixup(local: &mut LocalTree, root: &Node) {
    let offset = root.id - local.first_id;
    if offset == 0 {
        return;
    }

    for node in local.nodes.iter_mut() {
        node.shift(offset);
    }
    for id in local.node_of_point.iter_mut() {
        *id += offset;
    }
    local.first_id = root.id;
    debug_assert_eq!(local.nodes.first(), Some(root));
}

/// Run the whole protocol on one worker. `skeleton` holds the skeleton nodes this rank owns,
/// top down, and is updated in place. Returns the total node count on rank 0.
pub fn collate<E: Exchange>(
    comm: &E,
    skeleton: &mut Vec<Node>,
    local: &mut LocalTree,
) -> Result<Option<usize>> {
    let root = *local.root().ok_or(Error::EmptyPointSet)?;

    let sizes = up_sweep(comm, local.len())?;
    if sizes.len() != skeleton.len() + 1 {
        return Err(Error::Spine {
            rank: comm.rank(),
            length: skeleton.len() + 1,
            index: sizes.len() - 1,
        });
    }

    skeleton.push(root);
    let swept = down_sweep(comm, skeleton, &sizes);
    let root = skeleton.pop();
    swept?;

    if let Some(root) = root {
        fixup(local, &root);
    }

    let total = (comm.rank() == ROOT_RANK).then(|| sizes[0]);
    if let Some(total) = total {
        debug!("collated tree has {} nodes", total);
    }
    Ok(total)
}
