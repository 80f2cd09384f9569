use mpi::{topology::Rank, traits::*};

use crate::{
    comm::{Exchange, Tag},
    error::{Error, Result},
};

/// A worker backed by an MPI communicator, one worker per process.
///
/// A rank that fails leaves its partners blocked in their receives, so callers should
/// [`abort`](MpiExchange::abort) on any error returned by a collective build instead of
/// returning or unwinding.
pub struct MpiExchange<C> {
    comm: C,
}

impl<C: Communicator> MpiExchange<C> {
    pub fn new(comm: C) -> MpiExchange<C> {
        MpiExchange { comm }
    }

    pub fn communicator(&self) -> &C {
        &self.comm
    }

    /// Terminate every process of the communicator.
    pub fn abort(&self, code: i32) -> ! {
        self.comm.abort(code)
    }

    fn process_rank(&self, partner: usize, tag: Tag) -> Result<Rank> {
        match Rank::try_from(partner) {
            Ok(rank) if rank < self.comm.size() => Ok(rank),
            _ => Err(Error::Exchange {
                partner,
                tag,
                reason: format!("no such rank in a world of {}", self.comm.size()),
            }),
        }
    }
}

impl<C: Communicator> Exchange for MpiExchange<C> {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn send(&self, value: u64, dest: usize, tag: Tag) -> Result<()> {
        let rank = self.process_rank(dest, tag)?;
        self.comm.process_at_rank(rank).send_with_tag(&value, tag);
        Ok(())
    }

    fn receive(&self, source: usize, tag: Tag) -> Result<u64> {
        let rank = self.process_rank(source, tag)?;
        let (value, status) = self.comm.process_at_rank(rank).receive_with_tag::<u64>(tag);

        if status.source_rank() != rank || status.tag() != tag {
            return Err(Error::Exchange {
                partner: source,
                tag,
                reason: format!(
                    "message from rank {} with tag {}",
                    status.source_rank(),
                    status.tag()
                ),
            });
        }
        Ok(value)
    }

    fn barrier(&self) -> Result<()> {
        self.comm.barrier();
        Ok(())
    }
}
