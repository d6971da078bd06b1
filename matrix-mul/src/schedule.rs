//! Loop scheduling policies: how outer-loop iterations are handed to workers.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Error;

/// The rule distributing iterations among the workers of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulePolicy {
    /// Chunks are dealt round-robin to workers before the loop starts.
    Static,
    /// Workers take the next chunk from a shared counter when they finish one.
    Dynamic,
    /// Like `Dynamic`, but batches start large and shrink toward the chunk size.
    Guided,
}

impl SchedulePolicy {
    pub const ALL: [SchedulePolicy; 3] = [Self::Static, Self::Dynamic, Self::Guided];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Guided => "guided",
        }
    }
}

impl FromStr for SchedulePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            "guided" => Ok(Self::Guided),
            other => Err(Error::InvalidSchedulePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A policy together with its chunk size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    policy: SchedulePolicy,
    chunk: usize,
}

impl Schedule {
    /// `chunk` is the batch size for static and dynamic, and the minimum
    /// batch size for guided. It must be at least 1.
    pub fn new(policy: SchedulePolicy, chunk: usize) -> Result<Self, Error> {
        if chunk == 0 {
            return Err(Error::InvalidChunkSize(chunk.to_string()));
        }
        Ok(Self { policy, chunk })
    }

    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    pub fn chunk(&self) -> usize {
        self.chunk
    }
}

/// Hands out the iterations `[0, total)` to a fixed number of workers.
///
/// Every iteration is claimed by exactly one worker exactly once.
pub struct Dispatcher {
    schedule: Schedule,
    total: usize,
    workers: usize,
    next: AtomicUsize,
}

impl Dispatcher {
    pub fn new(schedule: Schedule, total: usize, workers: usize) -> Self {
        Self {
            schedule,
            total,
            workers: workers.max(1),
            next: AtomicUsize::new(0),
        }
    }

    /// The batches claimed by `worker`, in claim order.
    pub fn claims(&self, worker: usize) -> Claims<'_> {
        Claims {
            dispatcher: self,
            worker,
            round: 0,
        }
    }

    fn claim(&self, worker: usize, round: usize) -> Option<Range<usize>> {
        let chunk = self.schedule.chunk;
        match self.schedule.policy {
            SchedulePolicy::Static => {
                let start = round
                    .checked_mul(self.workers)?
                    .checked_add(worker)?
                    .checked_mul(chunk)?;
                (start < self.total).then(|| start..start.saturating_add(chunk).min(self.total))
            }
            SchedulePolicy::Dynamic | SchedulePolicy::Guided => {
                let mut size = 0;
                let start = self
                    .next
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |start| {
                        if start >= self.total {
                            return None;
                        }
                        size = self.batch_size(self.total - start);
                        Some(start + size)
                    })
                    .ok()?;
                Some(start..start + size)
            }
        }
    }

    fn batch_size(&self, remaining: usize) -> usize {
        let chunk = self.schedule.chunk;
        match self.schedule.policy {
            SchedulePolicy::Guided => remaining.div_ceil(self.workers).max(chunk).min(remaining),
            _ => chunk.min(remaining),
        }
    }
}

/// Iterator over one worker's batches; see [`Dispatcher::claims`].
pub struct Claims<'a> {
    dispatcher: &'a Dispatcher,
    worker: usize,
    round: usize,
}

impl Iterator for Claims<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.dispatcher.claim(self.worker, self.round)?;
        self.round += 1;
        Some(batch)
    }
}
