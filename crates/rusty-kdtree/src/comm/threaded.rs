use std::{
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, Barrier,
    },
    thread,
};

use crate::{
    comm::{Exchange, Tag},
    error::{Error, Result},
};

/// One worker of an in-process universe. Every ordered pair of workers shares its own channel,
/// so messages from one source arrive in the order they were sent.
pub struct ThreadExchange {
    rank: usize,
    outboxes: Vec<Sender<(Tag, u64)>>,
    inboxes: Vec<Receiver<(Tag, u64)>>,
    barrier: Arc<Barrier>,
}

impl ThreadExchange {
    /// Create the workers of a universe of `size` ranks, indexed by rank.
    pub fn universe(size: usize) -> Vec<ThreadExchange> {
        let barrier = Arc::new(Barrier::new(size));

        // channels[source][dest]
        let mut senders: Vec<Vec<Sender<(Tag, u64)>>> = Vec::with_capacity(size);
        let mut receivers: Vec<Vec<Option<Receiver<(Tag, u64)>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for source in 0..size {
            let mut row = Vec::with_capacity(size);
            for dest_inboxes in receivers.iter_mut() {
                let (tx, rx) = channel();
                row.push(tx);
                dest_inboxes[source] = Some(rx);
            }
            senders.push(row);
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ThreadExchange {
                rank,
                outboxes,
                inboxes: inboxes.into_iter().flatten().collect(),
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    fn check_partner(&self, partner: usize, tag: Tag) -> Result<()> {
        if partner >= self.outboxes.len() {
            return Err(Error::Exchange {
                partner,
                tag,
                reason: format!("no such rank in a world of {}", self.outboxes.len()),
            });
        }
        Ok(())
    }
}

impl Exchange for ThreadExchange {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, value: u64, dest: usize, tag: Tag) -> Result<()> {
        self.check_partner(dest, tag)?;
        self.outboxes[dest]
            .send((tag, value))
            .map_err(|_| Error::Exchange {
                partner: dest,
                tag,
                reason: "receiver hung up".to_string(),
            })
    }

    fn receive(&self, source: usize, tag: Tag) -> Result<u64> {
        self.check_partner(source, tag)?;
        let (received_tag, value) = self.inboxes[source].recv().map_err(|_| Error::Exchange {
            partner: source,
            tag,
            reason: "sender hung up".to_string(),
        })?;

        if received_tag != tag {
            return Err(Error::Exchange {
                partner: source,
                tag,
                reason: format!("received tag {}", received_tag),
            });
        }
        Ok(value)
    }

    fn barrier(&self) -> Result<()> {
        self.barrier.wait();
        Ok(())
    }
}

/// Run `f` once per rank of a `size` worker universe, each on its own thread, and collect the
/// results by rank.
pub fn run_threaded<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ThreadExchange) -> T + Sync,
{
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = ThreadExchange::universe(size)
            .into_iter()
            .map(|comm| scope.spawn(move || f(comm)))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
