use crate::core::state::FictitiousState;
use crate::error::Result;
use crate::platform::comm::Communicator;

/// Nonequilibrium-work bookkeeping of one replica (LogPD).
///
/// Each replica restrains its own copy of the atoms to the same X(t). The
/// mean force is combined over replicas with Crooks-Jarzynski weights
/// $W_k = e^{-\beta (w_k - w_{min})} / \sum_l e^{-\beta (w_l - w_{min})}$.
/// Subtracting $w_{min}$ keeps every exponent <= 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaWeighting {
    /// Work w_k done on this replica by the fictitious variables.
    pub work: f64,
    /// Normalized weight W_k of this replica.
    pub weight: f64,
    kbt: f64,
}

impl ReplicaWeighting {
    pub fn new(initial_work: f64, kbt: f64) -> Self {
        Self {
            work: initial_work,
            weight: 1.0,
            kbt,
        }
    }

    /// w -= sum_i F_i V_i dt for the MFD step about to be taken.
    pub fn accumulate_work(&mut self, state: &FictitiousState, dt: f64) {
        for i in 0..state.len() {
            // sign flipped with respect to dH/dX dX
            self.work -= state.force[i] * state.velocity[i] * dt;
        }
    }

    /// Computes this replica's normalized weight. Two blocking reductions.
    pub fn normalize(&mut self, comm: &dyn Communicator) -> Result<f64> {
        let work_min = comm.min(self.work)?;

        let raw = if self.kbt == 0.0 {
            if self.work == work_min {
                1.0
            } else {
                0.0
            }
        } else {
            (-(self.work - work_min) / self.kbt).exp()
        };

        let total = comm.sum(raw)?;
        self.weight = raw / total;
        Ok(self.weight)
    }

    /// Replaces the local mean force in `state.force` with the replica-weighted
    /// mean force. A lone replica keeps its own force and weight 1.
    pub fn mean_force(&mut self, state: &mut FictitiousState, comm: &dyn Communicator, dt: f64) -> Result<()> {
        self.accumulate_work(state, dt);

        if comm.size() <= 1 {
            self.weight = 1.0;
            return Ok(());
        }

        let weight = self.normalize(comm)?;
        for force in state.force.iter_mut() {
            *force = comm.sum(*force * weight)?;
        }
        Ok(())
    }
}
