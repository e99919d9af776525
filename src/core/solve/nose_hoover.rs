use crate::core::state::FictitiousState;
use crate::laws::free_energy::FreeEnergy;

use super::Thermostat;

/// Fixed-point passes used to make the half-kick consistent with the
/// free energy, which itself depends on the velocities being updated.
const SELF_CONSISTENT_PASSES: usize = 5;

/// Nose-Hoover heat bath coupled to all fictitious variables.
///
/// EOM: $M_i \ddot X_i = c F_i - M_i \dot X_i \dot\eta$ and
/// $Q \ddot\eta = \sum_i M_i V_i^2 - N k_B T$.
#[derive(Debug, Clone, PartialEq)]
pub struct NoseHoover {
    pub eta: f64,
    pub veta: f64,
    /// Q, mass of the bath variable.
    pub mass: f64,
    /// Target N k_B T.
    pub nkt: f64,
}

impl NoseHoover {
    pub fn new(eta: f64, veta: f64, mass: f64, nkt: f64) -> Self {
        Self {
            eta,
            veta,
            mass,
            nkt,
        }
    }

    /// Bath contribution to the conserved quantity, Q veta^2 / 2 + eta N k_B T.
    pub fn energy(&self) -> f64 {
        0.5 * self.veta * self.veta * self.mass + self.eta * self.nkt
    }

    pub fn potential(&self, hlog: f64, state: &FictitiousState) -> f64 {
        hlog - state.kinetic_energy() - self.energy()
    }

    /// Trotter-split step: bath scaling around each force half-kick, then
    /// a full drift, then the bath variables.
    pub(super) fn step(&mut self, state: &mut FictitiousState, free_energy: &FreeEnergy, dt: f64) {
        let n = state.len();
        let start_velocity = state.velocity.clone();

        for _ in 0..SELF_CONSISTENT_PASSES {
            let clog = self.current_coefficient(state, free_energy);
            state.velocity.copy_from_slice(&start_velocity);
            self.half_kick(state, clog, dt);
        }

        let clog = self.current_coefficient(state, free_energy);
        self.half_kick(state, clog, dt);
        for i in 0..n {
            state.value[i] += dt * state.velocity[i];
        }

        self.eta += 0.5 * dt * self.veta;
        let ekin = state.kinetic_energy();
        self.veta += dt * (2.0 * ekin - self.nkt) / self.mass;
        self.eta += 0.5 * dt * self.veta;
    }

    fn current_coefficient(&self, state: &FictitiousState, free_energy: &FreeEnergy) -> f64 {
        let flog = free_energy.from_potential(self.potential(free_energy.hlog(), state));
        free_energy.coefficient(flog)
    }

    fn half_kick(&self, state: &mut FictitiousState, clog: f64, dt: f64) {
        let scale = (-0.25 * dt * self.veta).exp();
        for i in 0..state.len() {
            state.velocity[i] *= scale;
            state.velocity[i] += 0.5 * dt * clog * state.force[i] / state.mass[i];
            state.velocity[i] *= scale;
        }
    }
}

impl From<NoseHoover> for Thermostat {
    fn from(bath: NoseHoover) -> Self {
        Thermostat::NoseHoover(bath)
    }
}
