//! Bounded command channel between the control loop and the link worker.
//!
//! The producer never waits: when the channel is full the newest command is
//! dropped. The consumer drains everything pending and keeps only the latest
//! command, so a slow link never replays stale stick positions.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::drive::mixer::DriveCommand;

/// Result of offering a command to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// Channel full; the offered command was discarded.
    Dropped,
    /// Worker has gone away.
    Closed,
}

/// Result of draining the channel on one worker tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Drain {
    pub latest: Option<DriveCommand>,
    /// Commands replaced by a newer one in the same drain.
    pub superseded: u64,
    /// The producer side has been dropped.
    pub closed: bool,
}

/// Create a command channel. Capacity is raised to at least one slot.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CommandSender { tx }, CommandReceiver { rx })
}

#[derive(Debug)]
pub struct CommandSender {
    tx: mpsc::Sender<DriveCommand>,
}

impl CommandSender {
    /// Enqueue without blocking.
    pub fn offer(&self, command: DriveCommand) -> Offer {
        match self.tx.try_send(command) {
            Ok(()) => Offer::Accepted,
            Err(TrySendError::Full(_)) => Offer::Dropped,
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }
}

#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<DriveCommand>,
}

impl CommandReceiver {
    /// Take every pending command, keeping the most recent.
    pub fn drain_latest(&mut self) -> Drain {
        let mut drain = Drain::default();

        loop {
            match self.rx.try_recv() {
                Ok(command) => {
                    if drain.latest.replace(command).is_some() {
                        drain.superseded += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drain.closed = true;
                    break;
                }
            }
        }

        drain
    }
}
