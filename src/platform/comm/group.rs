use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::Communicator;
use crate::error::{LogMfdError, Result};

/// Replicas running as threads of one process, reducing through shared memory.
///
/// `ReplicaGroup::new(n, timeout)` hands out one [`ReplicaHandle`] per
/// replica; move each into its own thread. A reduction completes when all `n`
/// handles have contributed. A handle that waits longer than `timeout` marks
/// the whole group as broken, so the peers fail too instead of hanging.
pub struct ReplicaGroup;

impl ReplicaGroup {
    pub fn new(size: usize, timeout: Duration) -> Vec<ReplicaHandle> {
        let shared = Arc::new(Shared {
            size,
            timeout,
            round: Mutex::new(Round::default()),
            arrived: Condvar::new(),
        });
        (0..size)
            .map(|rank| ReplicaHandle {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

struct Shared {
    size: usize,
    timeout: Duration,
    round: Mutex<Round>,
    arrived: Condvar,
}

#[derive(Default)]
struct Round {
    generation: u64,
    count: usize,
    operation: Option<&'static str>,
    accumulator: f64,
    result: f64,
    broken: Option<String>,
}

pub struct ReplicaHandle {
    rank: usize,
    shared: Arc<Shared>,
}

impl ReplicaHandle {
    fn lock(&self) -> Result<MutexGuard<'_, Round>> {
        self.shared
            .round
            .lock()
            .map_err(|_| LogMfdError::ReplicaFault("replica group lock poisoned".to_string()))
    }

    fn break_group(&self, round: &mut Round, reason: String) -> LogMfdError {
        tracing::error!(rank = self.rank, %reason, "replica group broken");
        round.broken = Some(reason.clone());
        self.shared.arrived.notify_all();
        LogMfdError::ReplicaFault(reason)
    }

    fn reduce(&self, value: f64, operation: &'static str, combine: fn(f64, f64) -> f64) -> Result<f64> {
        let mut round = self.lock()?;
        if let Some(reason) = &round.broken {
            return Err(LogMfdError::ReplicaFault(reason.clone()));
        }

        if round.count == 0 {
            round.operation = Some(operation);
            round.accumulator = value;
        } else {
            if round.operation != Some(operation) {
                let reason = format!(
                    "replica {} called {} while the group is in {}",
                    self.rank,
                    operation,
                    round.operation.unwrap_or("none")
                );
                return Err(self.break_group(&mut round, reason));
            }
            round.accumulator = combine(round.accumulator, value);
        }
        round.count += 1;

        if round.count == self.shared.size {
            round.result = round.accumulator;
            round.count = 0;
            round.operation = None;
            round.generation = round.generation.wrapping_add(1);
            self.shared.arrived.notify_all();
            return Ok(round.result);
        }

        let generation = round.generation;
        let (mut round, wait) = self
            .shared
            .arrived
            .wait_timeout_while(round, self.shared.timeout, |r| {
                r.generation == generation && r.broken.is_none()
            })
            .map_err(|_| LogMfdError::ReplicaFault("replica group lock poisoned".to_string()))?;

        // The round completed: its result stays valid until this replica joins the next one.
        if round.generation != generation {
            return Ok(round.result);
        }
        if let Some(reason) = &round.broken {
            return Err(LogMfdError::ReplicaFault(reason.clone()));
        }
        if wait.timed_out() {
            let reason = format!("replica {} timed out waiting for {}", self.rank, operation);
            self.break_group(&mut round, reason);
            return Err(LogMfdError::CommTimeout {
                rank: self.rank,
                operation,
                timeout: self.shared.timeout,
            });
        }
        Err(LogMfdError::ReplicaFault(format!(
            "replica {} woke without a result for {}",
            self.rank, operation
        )))
    }
}

impl Communicator for ReplicaHandle {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn sum(&self, value: f64) -> Result<f64> {
        self.reduce(value, "sum", |a, b| a + b)
    }

    fn min(&self, value: f64) -> Result<f64> {
        self.reduce(value, "min", f64::min)
    }
}

impl Drop for ReplicaHandle {
    /// A replica that leaves (finished or panicked) can no longer take part in
    /// reductions; peers still waiting on one must not wait for the timeout.
    fn drop(&mut self) {
        if let Ok(mut round) = self.shared.round.lock() {
            if round.broken.is_none() {
                round.broken = Some(format!("replica {} left the group", self.rank));
                self.shared.arrived.notify_all();
            }
        }
    }
}
