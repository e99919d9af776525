use std::fmt;
use std::str::FromStr;

use crate::core::state::FictitiousState;
use crate::error::{LogMfdError, Result};
use crate::laws::free_energy::FreeEnergy;

pub mod constraints;
pub mod nose_hoover;
pub mod velocity_scaling;

pub use nose_hoover::NoseHoover;
pub use velocity_scaling::VelocityScaling;

/// The THERMOSTAT keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatKind {
    Nve,
    Nvt,
    Vs,
}

impl ThermostatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThermostatKind::Nve => "NVE",
            ThermostatKind::Nvt => "NVT",
            ThermostatKind::Vs => "VS",
        }
    }
}

impl FromStr for ThermostatKind {
    type Err = LogMfdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NVE" => Ok(ThermostatKind::Nve),
            "NVT" => Ok(ThermostatKind::Nvt),
            "VS" => Ok(ThermostatKind::Vs),
            other => Err(LogMfdError::UnknownThermostat(other.to_string())),
        }
    }
}

impl fmt::Display for ThermostatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equations of motion for the fictitious variables.
///
/// Chosen once when the run is set up and never switched afterwards. Each
/// variant carries exactly the extra degrees of freedom its dynamics needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Thermostat {
    /// Plain Newtonian dynamics; H_log = E_kin + Psi is conserved.
    Nve,
    /// Single Nose-Hoover heat bath.
    NoseHoover(NoseHoover),
    /// Gaussian isokinetic dynamics by velocity rescaling.
    VelocityScaling(VelocityScaling),
}

impl Thermostat {
    pub fn kind(&self) -> ThermostatKind {
        match self {
            Thermostat::Nve => ThermostatKind::Nve,
            Thermostat::NoseHoover(_) => ThermostatKind::Nvt,
            Thermostat::VelocityScaling(_) => ThermostatKind::Vs,
        }
    }

    /// Advances the fictitious variables by one MFD step of length `dt`.
    ///
    /// `state.force` must already hold the mean force for this step.
    pub fn step(
        &mut self,
        state: &mut FictitiousState,
        free_energy: &FreeEnergy,
        dt: f64,
    ) -> Result<()> {
        match self {
            Thermostat::Nve => {
                step_nve(state, free_energy, dt);
                Ok(())
            }
            Thermostat::NoseHoover(bath) => {
                bath.step(state, free_energy, dt);
                Ok(())
            }
            Thermostat::VelocityScaling(vs) => vs.step(state, free_energy, dt),
        }
    }

    /// The flattened potential Psi implied by the current state.
    pub fn potential(&self, hlog: f64, state: &FictitiousState) -> f64 {
        match self {
            Thermostat::Nve => hlog - state.kinetic_energy(),
            Thermostat::NoseHoover(bath) => bath.potential(hlog, state),
            Thermostat::VelocityScaling(vs) => vs.potential,
        }
    }

    /// The invariant H_log for a state whose flattened potential is `potential`.
    /// Velocity scaling has no such invariant and returns 0.
    pub fn conserved_quantity(&self, potential: f64, state: &FictitiousState) -> f64 {
        match self {
            Thermostat::Nve => potential + state.kinetic_energy(),
            Thermostat::NoseHoover(bath) => potential + state.kinetic_energy() + bath.energy(),
            Thermostat::VelocityScaling(_) => 0.0,
        }
    }

    pub fn eta(&self) -> f64 {
        match self {
            Thermostat::NoseHoover(bath) => bath.eta,
            _ => 0.0,
        }
    }

    pub fn veta(&self) -> f64 {
        match self {
            Thermostat::NoseHoover(bath) => bath.veta,
            _ => 0.0,
        }
    }
}

/// v += c f dt / M, then x += v dt.
fn step_nve(state: &mut FictitiousState, free_energy: &FreeEnergy, dt: f64) {
    let flog = free_energy.reconstruct(&Thermostat::Nve, state);
    let clog = free_energy.coefficient(flog);

    for i in 0..state.len() {
        state.velocity[i] += clog * state.force[i] * dt / state.mass[i];
        state.value[i] += state.velocity[i] * dt;
    }
}
