use crate::core::solve::Thermostat;
use crate::core::state::FictitiousState;

use super::flattening::Flattening;

/// On-the-fly free energy reconstruction.
///
/// If the mean force is converged, X and the atoms evolve adiabatically and
/// H_log is a constant of motion. The free energy at the current X then
/// follows from H_log minus the kinetic (and bath) energy, pushed through
/// the inverse of the flattening map. Nothing has to be integrated
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeEnergy {
    flattening: Flattening,
    /// H_log, fixed at the start of the run.
    hlog: f64,
}

impl FreeEnergy {
    /// Fixes H_log so that the initial state reproduces `initial` (FLOG).
    pub fn new(flattening: Flattening, thermostat: &Thermostat, state: &FictitiousState, initial: f64) -> Self {
        let hlog = thermostat.conserved_quantity(flattening.flatten(initial), state);
        Self { flattening, hlog }
    }

    pub fn hlog(&self) -> f64 {
        self.hlog
    }

    pub fn flattening(&self) -> Flattening {
        self.flattening
    }

    /// F(X(t)) for the current state.
    pub fn reconstruct(&self, thermostat: &Thermostat, state: &FictitiousState) -> f64 {
        self.from_potential(thermostat.potential(self.hlog, state))
    }

    /// F from a flattened potential value.
    pub fn from_potential(&self, potential: f64) -> f64 {
        self.flattening.free_energy(potential)
    }

    /// The flattening coefficient at free energy `flog`.
    pub fn coefficient(&self, flog: f64) -> f64 {
        self.flattening.coefficient(flog)
    }
}
