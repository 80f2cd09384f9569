//! Distributed k-d trees.
//!
//! Steps:
//! ------
//! 0) Every worker receives the full point set and derives its own slice from its rank.
//! 1) Create the local subtree on each worker.
//! 2) Collate the subtrees into one preorder numbering, exchanging only node counts.
pub mod collate;
pub mod comm;
pub mod config;
pub mod constants;
pub mod data;
pub mod distribute;
pub mod distributed;
pub mod error;
pub mod helpers;
pub mod partition;
pub mod single_node;
pub mod types;

pub use error::{Error, Result};
