use crate::error::Result;

mod group;

pub use group::{ReplicaGroup, ReplicaHandle};

/// Blocking collective reductions across the replicas of a LogPD run.
///
/// Every replica must call the same reductions in the same order; each call
/// is a barrier. Implementations must fail rather than block forever when a
/// peer never shows up.
pub trait Communicator: Send {
    /// Index of this replica, `0..size()`.
    fn rank(&self) -> usize;

    /// Number of replicas in the group.
    fn size(&self) -> usize;

    /// Sum of `value` over all replicas, returned to every replica.
    fn sum(&self, value: f64) -> Result<f64>;

    /// Minimum of `value` over all replicas, returned to every replica.
    fn min(&self, value: f64) -> Result<f64>;
}

/// A group of one: every reduction is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleReplica;

impl Communicator for SingleReplica {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn sum(&self, value: f64) -> Result<f64> {
        Ok(value)
    }

    fn min(&self, value: f64) -> Result<f64> {
        Ok(value)
    }
}

impl<C: Communicator + ?Sized> Communicator for Box<C> {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn sum(&self, value: f64) -> Result<f64> {
        (**self).sum(value)
    }

    fn min(&self, value: f64) -> Result<f64> {
        (**self).min(value)
    }
}
