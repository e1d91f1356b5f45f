//! Cross-shard synchronization layer.
//!
//! Shards exchange state exclusively through two collective operations,
//! gather-doubles and gather-longs. Each call takes a per-shard payload
//! and returns the concatenation from all shards in rank order, blocking
//! until every shard has issued the matching call. Correctness hinges on
//! every shard calling the collectives the same number of times, in the
//! same order, every generation; a shard that diverges stalls the group.
//!
//! Two implementations are provided: `SoloCollective` for a single shard
//! and `ChannelCollective`, a full mesh of `std::sync::mpsc` channels for
//! in-process shards running on threads.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use ndarray::Array1;

use crate::error::{JadeError, Result};
use crate::{FitnessFn, JadeConfig, JadeReport, SubPopulation};

/// Collective boundary to the process group.
pub trait Collective: Send {
    /// Rank of this shard, in 0..size().
    fn rank(&self) -> usize;

    /// Number of participating shards.
    fn size(&self) -> usize;

    /// All-to-all gather of doubles; returns the rank-ordered
    /// concatenation of every shard's payload.
    fn all_gather_doubles(&mut self, payload: &[f64]) -> Result<Vec<f64>>;

    /// All-to-all gather of longs; same contract as
    /// [`Collective::all_gather_doubles`].
    fn all_gather_longs(&mut self, payload: &[i64]) -> Result<Vec<i64>>;
}

/// Collective for a single shard; gathers return the payload unchanged.
pub struct SoloCollective;

impl Collective for SoloCollective {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather_doubles(&mut self, payload: &[f64]) -> Result<Vec<f64>> {
        Ok(payload.to_vec())
    }

    fn all_gather_longs(&mut self, payload: &[i64]) -> Result<Vec<i64>> {
        Ok(payload.to_vec())
    }
}

enum GatherMessage {
    Doubles { rank: usize, payload: Vec<f64> },
    Longs { rank: usize, payload: Vec<i64> },
}

impl GatherMessage {
    fn rank(&self) -> usize {
        match self {
            GatherMessage::Doubles { rank, .. } => *rank,
            GatherMessage::Longs { rank, .. } => *rank,
        }
    }
}

/// One member of a full-mesh channel group created by [`channel_group`].
///
/// Every gather sends this shard's payload to all members (itself
/// included) and blocks on its inbox until one message per rank has
/// arrived. Messages from shards that already raced ahead to their next
/// collective call are stashed and replayed on that later call, which
/// keeps per-sender FIFO order intact.
pub struct ChannelCollective {
    rank: usize,
    peers: Vec<Sender<GatherMessage>>,
    inbox: Receiver<GatherMessage>,
    pending: VecDeque<GatherMessage>,
}

/// Wire a full mesh of `size` channel collectives, one per rank.
pub fn channel_group(size: usize) -> Vec<ChannelCollective> {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| channel()).unzip();
    receivers
        .into_iter()
        .enumerate()
        .map(|(rank, inbox)| ChannelCollective {
            rank,
            peers: senders.clone(),
            inbox,
            pending: VecDeque::new(),
        })
        .collect()
}

impl ChannelCollective {
    fn broadcast(&self, make: impl Fn() -> GatherMessage) -> Result<()> {
        for peer in &self.peers {
            peer.send(make())
                .map_err(|_| JadeError::CollectiveDisconnected { rank: self.rank })?;
        }
        Ok(())
    }

    fn next_message(&mut self) -> Result<GatherMessage> {
        if let Some(msg) = self.pending.pop_front() {
            return Ok(msg);
        }
        self.inbox
            .recv()
            .map_err(|_| JadeError::CollectiveDisconnected { rank: self.rank })
    }
}

impl Collective for ChannelCollective {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn all_gather_doubles(&mut self, payload: &[f64]) -> Result<Vec<f64>> {
        let size = self.size();
        let rank = self.rank;
        self.broadcast(|| GatherMessage::Doubles {
            rank,
            payload: payload.to_vec(),
        })?;

        let mut slots: Vec<Option<Vec<f64>>> = (0..size).map(|_| None).collect();
        let mut filled = 0usize;
        let mut stash = VecDeque::new();
        while filled < size {
            let msg = self.next_message()?;
            let sender = msg.rank();
            match msg {
                GatherMessage::Doubles { payload, .. } if slots[sender].is_none() => {
                    slots[sender] = Some(payload);
                    filled += 1;
                }
                GatherMessage::Longs { .. } if slots[sender].is_none() => {
                    return Err(JadeError::CollectiveTypeMismatch {
                        expected: "doubles",
                        received: "longs",
                    });
                }
                // Slot already filled: the sender is ahead of us by one or
                // more calls. Replay on a later call.
                later => stash.push_back(later),
            }
        }
        self.pending.append(&mut stash);
        Ok(slots.into_iter().flatten().flatten().collect())
    }

    fn all_gather_longs(&mut self, payload: &[i64]) -> Result<Vec<i64>> {
        let size = self.size();
        let rank = self.rank;
        self.broadcast(|| GatherMessage::Longs {
            rank,
            payload: payload.to_vec(),
        })?;

        let mut slots: Vec<Option<Vec<i64>>> = (0..size).map(|_| None).collect();
        let mut filled = 0usize;
        let mut stash = VecDeque::new();
        while filled < size {
            let msg = self.next_message()?;
            let sender = msg.rank();
            match msg {
                GatherMessage::Longs { payload, .. } if slots[sender].is_none() => {
                    slots[sender] = Some(payload);
                    filled += 1;
                }
                GatherMessage::Doubles { .. } if slots[sender].is_none() => {
                    return Err(JadeError::CollectiveTypeMismatch {
                        expected: "longs",
                        received: "doubles",
                    });
                }
                later => stash.push_back(later),
            }
        }
        self.pending.append(&mut stash);
        Ok(slots.into_iter().flatten().flatten().collect())
    }
}

/// Run one optimizer per shard, wired through a channel group, each shard
/// on its own thread. Shard seeds are derived from the configured seed by
/// adding the rank, so runs stay reproducible without making the shards
/// identical. Returns the per-shard reports in rank order.
pub fn run_sharded<F>(func: F, config: JadeConfig, shards: usize) -> Result<Vec<JadeReport>>
where
    F: Fn(&Array1<f64>) -> f64 + Send + Sync + 'static,
{
    let func: FitnessFn = Arc::new(func);
    let mut handles = Vec::with_capacity(shards);
    for (rank, collective) in channel_group(shards).into_iter().enumerate() {
        let mut cfg = config.clone();
        cfg.seed = cfg.seed.map(|s| s.wrapping_add(rank as u64));
        let func = Arc::clone(&func);
        let handle = std::thread::Builder::new()
            .name(format!("jade-shard-{rank}"))
            .spawn(move || -> Result<JadeReport> {
                let mut shard = SubPopulation::new(cfg, Box::new(collective))?;
                shard.set_fitness_function(func);
                shard.run_optimization()
            })
            .map_err(|_| JadeError::ShardSpawn { rank })?;
        handles.push(handle);
    }
    let mut reports = Vec::with_capacity(shards);
    for (rank, handle) in handles.into_iter().enumerate() {
        let report = handle
            .join()
            .map_err(|_| JadeError::ShardPanicked { rank })??;
        reports.push(report);
    }
    Ok(reports)
}
