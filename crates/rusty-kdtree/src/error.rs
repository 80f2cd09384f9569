//! Errors raised while building, collating or persisting a tree.

use std::fmt;

use crate::{comm::Tag, types::node::NodeId};

#[derive(Debug)]
pub enum Error {
    /// The number of workers is zero or not a power of two.
    WorldSize(usize),
    /// A split of the shared skeleton left one side with fewer than two points, the point set
    /// is too small for the number of workers.
    DegenerateSplit {
        round: usize,
        left: usize,
        right: usize,
    },
    /// Coordinates do not line up with the dimensionality or the identifiers.
    Dimension { expected: usize, found: usize },
    EmptyPointSet,
    LeafSize(usize),
    /// A blocking send or receive did not complete as the protocol expects.
    Exchange {
        partner: usize,
        tag: Tag,
        reason: String,
    },
    /// Collation reached a round the worker's spine has no node for.
    Spine {
        rank: usize,
        length: usize,
        index: usize,
    },
    /// The node's bounding box is held by another worker.
    NodeNotFound(NodeId),
    /// A persisted tree was written by a different worker or world size.
    WrongWorker { rank: usize, size: usize },
    Io(std::io::Error),
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WorldSize(size) => {
                write!(f, "world size {} is not a positive power of two", size)
            }
            Error::DegenerateSplit { round, left, right } => write!(
                f,
                "degenerate split in round {} ({} | {} points), \
                 too few points for this many workers",
                round, left, right
            ),
            Error::Dimension { expected, found } => {
                write!(f, "expected {} values, found {}", expected, found)
            }
            Error::EmptyPointSet => write!(f, "point set is empty"),
            Error::LeafSize(size) => write!(f, "leaf size must be at least 1, got {}", size),
            Error::Exchange {
                partner,
                tag,
                reason,
            } => write!(
                f,
                "exchange with rank {} (tag {}) failed: {}",
                partner, tag, reason
            ),
            Error::Spine {
                rank,
                length,
                index,
            } => write!(
                f,
                "rank {} has a spine of {} nodes, collation needs entry {}",
                rank, length, index
            ),
            Error::NodeNotFound(id) => write!(f, "node {} is not held by this worker", id),
            Error::WrongWorker { rank, size } => write!(
                f,
                "tree was saved by rank {} of a world of {}",
                rank, size
            ),
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Json(e)
    }
}
