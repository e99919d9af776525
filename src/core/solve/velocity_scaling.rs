use crate::core::state::FictitiousState;
use crate::error::{LogMfdError, Result};
use crate::laws::free_energy::FreeEnergy;

use super::Thermostat;

/// Isokinetic dynamics: after every force kick the velocities are rescaled so
/// that the kinetic energy is N k_B T / 2.
///
/// There is no conserved H_log here. Instead the work done by the rescaling
/// is booked into `potential`, which plays the role of Psi_log.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityScaling {
    /// Accumulated Psi_log.
    pub potential: f64,
    /// Target N k_B T.
    pub nkt: f64,
}

impl VelocityScaling {
    pub fn new(potential: f64, nkt: f64) -> Self {
        Self { potential, nkt }
    }

    /// Sets V_i = sqrt(k_B T / M_i), so that sum_i M_i V_i^2 = N k_B T from the start.
    pub fn initialize_velocities(&self, state: &mut FictitiousState) {
        let kbt = if state.is_empty() {
            0.0
        } else {
            self.nkt / state.len() as f64
        };
        for i in 0..state.len() {
            state.velocity[i] = (kbt / state.mass[i]).sqrt();
        }
    }

    pub(super) fn step(
        &mut self,
        state: &mut FictitiousState,
        free_energy: &FreeEnergy,
        dt: f64,
    ) -> Result<()> {
        let flog = free_energy.from_potential(self.potential);
        let clog = free_energy.coefficient(flog);

        for i in 0..state.len() {
            state.velocity[i] += clog * state.force[i] * dt / state.mass[i];
        }

        let ekin = state.kinetic_energy();
        if ekin == 0.0 {
            return Err(LogMfdError::ZeroKineticEnergy);
        }
        let scale = (self.nkt / ekin / 2.0).sqrt();

        for i in 0..state.len() {
            state.velocity[i] *= scale;
            state.value[i] += state.velocity[i] * dt;
        }

        self.potential += self.nkt * scale.ln();
        Ok(())
    }
}

impl From<VelocityScaling> for Thermostat {
    fn from(vs: VelocityScaling) -> Self {
        Thermostat::VelocityScaling(vs)
    }
}
