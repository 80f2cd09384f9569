//! The message passing contract the distributed build relies on.
//!
//! Only small integers cross worker boundaries: blocking point to point messages matched by
//! partner and tag, plus a global barrier. [`ThreadExchange`] runs a whole universe of workers
//! inside one process, [`MpiExchange`] (feature `mpi`) runs one worker per MPI process.

#[cfg(feature = "mpi")]
mod message_passing;
mod threaded;

#[cfg(feature = "mpi")]
pub use message_passing::MpiExchange;
pub use threaded::{run_threaded, ThreadExchange};

use crate::error::Result;

/// Message tag, matching MPI's integer tags.
pub type Tag = i32;

/// A worker's view of the communicator it belongs to.
pub trait Exchange {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Blocking send of a single value to `dest`.
    fn send(&self, value: u64, dest: usize, tag: Tag) -> Result<()>;

    /// Blocking receive of a single value from `source`.
    fn receive(&self, source: usize, tag: Tag) -> Result<u64>;

    fn barrier(&self) -> Result<()>;
}
