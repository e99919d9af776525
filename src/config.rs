use std::path::Path;

use ron::extensions::Extensions;
use serde::Deserialize;

use crate::core::solve::ThermostatKind;
use crate::error::{LogMfdError, Result};
use crate::laws::Flattening;

/// Default mass of each fictitious variable (MFICT).
pub const DEFAULT_MASS: f64 = 10_000.0;

/// Boltzmann constant in kJ/(mol K).
pub const KB_KJ_PER_MOL: f64 = 0.0083144626;

/// Input of the LOGMFD action, as read from a RON file.
///
/// Every field is optional at the parsing level; [`LogMfdConfig::validate`]
/// enforces the compulsory ones so that a missing key is reported by its
/// keyword (`KAPPA`, `FLOG`, ...) rather than as a parse error.
///
/// ```ron
/// (
///     interval: 1,
///     delta_t: 0.5,
///     thermostat: "NVE",
///     flog: 10.0,
///     alpha: 4.0,
///     kappa: [50.0, 50.0],
///     mfict: [6000.0, 6000.0],
///     fict_max: [3.1, 3.1],
///     fict_min: [-3.1, -3.1],
/// )
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogMfdConfig {
    /// MD steps per MFD step (N_m).
    pub interval: Option<u64>,
    /// MFD time step.
    pub delta_t: Option<f64>,
    /// NVE, NVT or VS.
    pub thermostat: Option<String>,
    /// Temperature of the fictitious variables in K. Absent: the host temperature.
    pub temp: Option<f64>,
    pub alpha: Option<f64>,
    pub gamma: Option<f64>,
    pub kappa: Option<Vec<f64>>,
    pub fict_max: Option<Vec<f64>>,
    pub fict_min: Option<Vec<f64>>,
    /// Initial X. Absent: the CV values of the first MD step, averaged over replicas.
    pub fict: Option<Vec<f64>>,
    pub vfict: Option<Vec<f64>>,
    pub mfict: Option<Vec<f64>>,
    pub xeta: Option<f64>,
    pub veta: Option<f64>,
    /// Nose-Hoover bath mass. Absent or 0: N k_B T 10^4.
    pub meta: Option<f64>,
    /// Initial free energy.
    pub flog: Option<f64>,
    /// Initial work, one entry per replica.
    pub work: Option<Vec<f64>>,
}

/// Unit system of the host engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    /// k_B in host energy units per K.
    pub kboltzmann: f64,
    /// k_B T of the MD system, used when TEMP is absent.
    pub kbt: f64,
}

impl Units {
    pub fn new(kboltzmann: f64, temperature: f64) -> Self {
        Self {
            kboltzmann,
            kbt: kboltzmann * temperature,
        }
    }
}

impl Default for Units {
    fn default() -> Self {
        Self::new(KB_KJ_PER_MOL, 300.0)
    }
}

/// Validated parameters of one replica.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub names: Vec<String>,
    pub interval: u64,
    pub delta_t: f64,
    pub thermostat: ThermostatKind,
    /// k_B T of the fictitious variables.
    pub kbt: f64,
    pub kboltzmann: f64,
    pub flattening: Flattening,
    pub kappa: Vec<f64>,
    pub fict_min: Vec<f64>,
    pub fict_max: Vec<f64>,
    pub fict: Option<Vec<f64>>,
    pub vfict: Vec<f64>,
    pub mfict: Vec<f64>,
    pub xeta: f64,
    pub veta: f64,
    pub meta: f64,
    pub flog: f64,
    /// Initial work of this replica.
    pub work: f64,
}

impl Parameters {
    /// N k_B T.
    pub fn nkt(&self) -> f64 {
        self.names.len() as f64 * self.kbt
    }

    /// Structural checks for parameters that did not come through
    /// [`LogMfdConfig::validate`]: per-CV lengths, interval, time step and masses.
    pub fn check(&self) -> Result<()> {
        let n = self.names.len();
        if n == 0 {
            return Err(LogMfdError::MissingParameter("ARG"));
        }
        if self.interval == 0 {
            return Err(LogMfdError::invalid("INTERVAL", "must be at least 1"));
        }
        if !(self.delta_t.is_finite() && self.delta_t > 0.0) {
            return Err(LogMfdError::invalid("DELTA_T", format!("must be positive, got {}", self.delta_t)));
        }
        length("KAPPA", &self.kappa, n)?;
        length("FICT_MIN", &self.fict_min, n)?;
        length("FICT_MAX", &self.fict_max, n)?;
        length("VFICT", &self.vfict, n)?;
        length("MFICT", &self.mfict, n)?;
        if let Some(fict) = &self.fict {
            length("FICT", fict, n)?;
        }
        if let Some(m) = self.mfict.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
            return Err(LogMfdError::invalid("MFICT", format!("masses must be positive, got {m}")));
        }
        finite("FLOG", self.flog)
    }
}

impl LogMfdConfig {
    /// Parses RON text. `Option` fields may be written bare (implicit `Some`).
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron_options().from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Checks the configuration against the CVs it restrains and the replica
    /// it runs in.
    pub fn validate(&self, names: &[String], units: &Units, rank: usize, replicas: usize) -> Result<Parameters> {
        let n = names.len();
        if n == 0 {
            return Err(LogMfdError::MissingParameter("ARG"));
        }

        let interval = require("INTERVAL", self.interval)?;
        if interval == 0 {
            return Err(LogMfdError::invalid("INTERVAL", "must be at least 1"));
        }

        let delta_t = require("DELTA_T", self.delta_t)?;
        if !(delta_t.is_finite() && delta_t > 0.0) {
            return Err(LogMfdError::invalid("DELTA_T", format!("must be positive, got {delta_t}")));
        }

        let thermostat: ThermostatKind = require("THERMOSTAT", self.thermostat.as_deref())?.parse()?;

        let kbt = match self.temp {
            Some(t) if t.is_finite() && t >= 0.0 => t * units.kboltzmann,
            Some(t) => return Err(LogMfdError::invalid("TEMP", format!("must be non-negative, got {t}"))),
            None => units.kbt,
        };
        if thermostat == ThermostatKind::Vs && kbt <= 0.0 {
            return Err(LogMfdError::invalid("TEMP", "velocity scaling needs a positive temperature"));
        }

        let flattening = Flattening::from_params(self.alpha, self.gamma)?;

        let kappa = sized("KAPPA", require("KAPPA", self.kappa.clone())?, n)?;
        let fict_max = sized("FICT_MAX", require("FICT_MAX", self.fict_max.clone())?, n)?;
        let fict_min = sized("FICT_MIN", require("FICT_MIN", self.fict_min.clone())?, n)?;
        all_finite("KAPPA", &kappa)?;
        all_finite("FICT_MAX", &fict_max)?;
        all_finite("FICT_MIN", &fict_min)?;
        if let Some(i) = (0..n).find(|&i| fict_min[i] > fict_max[i]) {
            return Err(LogMfdError::invalid(
                "FICT_MIN",
                format!("{} exceeds FICT_MAX {} for {}", fict_min[i], fict_max[i], names[i]),
            ));
        }

        let fict = self.fict.clone().map(|v| sized("FICT", v, n)).transpose()?;
        if let Some(fict) = &fict {
            all_finite("FICT", fict)?;
        }
        let vfict = sized("VFICT", self.vfict.clone().unwrap_or_else(|| vec![0.0; n]), n)?;
        all_finite("VFICT", &vfict)?;
        let mfict = sized("MFICT", self.mfict.clone().unwrap_or_else(|| vec![DEFAULT_MASS; n]), n)?;
        if let Some(m) = mfict.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
            return Err(LogMfdError::invalid("MFICT", format!("masses must be positive, got {m}")));
        }

        let xeta = self.xeta.unwrap_or(0.0);
        let veta = self.veta.unwrap_or(0.0);
        finite("XETA", xeta)?;
        finite("VETA", veta)?;

        let meta = match self.meta {
            Some(m) if m != 0.0 => m,
            _ => n as f64 * kbt * 100.0 * 100.0,
        };
        finite("META", meta)?;
        if thermostat == ThermostatKind::Nvt && !(meta.is_finite() && meta > 0.0) {
            return Err(LogMfdError::invalid("META", format!("must be positive for NVT, got {meta}")));
        }

        let flog = require("FLOG", self.flog)?;
        finite("FLOG", flog)?;

        let work = if replicas > 1 {
            let work = sized("WORK", self.work.clone().unwrap_or_else(|| vec![0.0; replicas]), replicas)?;
            all_finite("WORK", &work)?;
            work[rank]
        } else {
            0.0
        };

        Ok(Parameters {
            names: names.to_vec(),
            interval,
            delta_t,
            thermostat,
            kbt,
            kboltzmann: units.kboltzmann,
            flattening,
            kappa,
            fict_min,
            fict_max,
            fict,
            vfict,
            mfict,
            xeta,
            veta,
            meta,
            flog,
            work,
        })
    }
}

/// RON reader shared by every input file of the crate.
pub(crate) fn ron_options() -> ron::Options {
    ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}

fn require<T>(name: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or(LogMfdError::MissingParameter(name))
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(LogMfdError::invalid(name, format!("must be finite, got {value}")));
    }
    Ok(())
}

fn all_finite(name: &'static str, values: &[f64]) -> Result<()> {
    values.iter().try_for_each(|&v| finite(name, v))
}

fn length(name: &'static str, values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(LogMfdError::WrongLength {
            name,
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

fn sized(name: &'static str, values: Vec<f64>, expected: usize) -> Result<Vec<f64>> {
    length(name, &values, expected)?;
    Ok(values)
}
