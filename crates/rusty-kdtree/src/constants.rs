//! Crate wide constants
use crate::comm::Tag;

/// Windows holding at most this many points become leaves.
pub const LEAF_SIZE: usize = 45;

/// Number of children of an internal node.
pub const FAN_OUT: usize = 2;

/// The rank that holds the root of the global tree.
pub const ROOT_RANK: usize = 0;

/// Up-sweep messages, carrying subtree node counts.
pub const SUBTREE_SIZE_TAG: Tag = 0;

/// Down-sweep messages, carrying the identifier offset of a right subtree.
pub const OFFSET_TAG: Tag = 1;

/// Down-sweep replies, carrying the final identifier of a right child.
pub const NODE_ID_TAG: Tag = 2;
