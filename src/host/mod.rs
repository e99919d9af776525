//! A stand-in MD engine for driving LogMFD runs without a real one.
//!
//! Each CV is one coordinate of a particle undergoing overdamped Langevin
//! dynamics on a separable analytic surface. It is enough to exercise
//! barrier crossings, periodic CVs and independent replicas.

use std::path::Path;

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;
use serde::Deserialize;

use crate::config::{ron_options, LogMfdConfig, Units, KB_KJ_PER_MOL};
use crate::core::geometry::{CvDomain, Periodic, Real};
use crate::error::{LogMfdError, Result};

/// Potential energy along each coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum Surface {
    /// V = k x^2 / 2
    Harmonic { k: f64 },
    /// V = h ((x/a)^2 - 1)^2, minima at +-a, barrier h at 0.
    DoubleWell { barrier: f64, minimum: f64 },
    /// V = h (1 - cos 2x) / 2, minima at 0 and pi.
    Torsion { barrier: f64 },
}

impl Surface {
    pub fn energy(&self, x: f64) -> f64 {
        match *self {
            Surface::Harmonic { k } => 0.5 * k * x * x,
            Surface::DoubleWell { barrier, minimum } => {
                let r = (x / minimum).powi(2) - 1.0;
                barrier * r * r
            }
            Surface::Torsion { barrier } => 0.5 * barrier * (1.0 - (2.0 * x).cos()),
        }
    }

    /// -dV/dx
    pub fn force(&self, x: f64) -> f64 {
        match *self {
            Surface::Harmonic { k } => -k * x,
            Surface::DoubleWell { barrier, minimum } => {
                let a2 = minimum * minimum;
                -4.0 * barrier * x * (x * x / a2 - 1.0) / a2
            }
            Surface::Torsion { barrier } => -barrier * (2.0 * x).sin(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostCv {
    pub name: String,
    pub initial: f64,
    /// `(min, max)` for a periodic coordinate.
    #[serde(default)]
    pub periodic: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub cvs: Vec<HostCv>,
    pub surface: Surface,
    /// Temperature in K.
    pub temperature: f64,
    pub dt: f64,
    /// Viscous drag coefficient.
    pub visc: f64,
    #[serde(default)]
    pub seed: u64,
}

/// A complete demo run: host, LOGMFD input and length.
#[derive(Debug, Clone, Deserialize)]
pub struct RunFile {
    pub steps: u64,
    /// k_B in host units per K. Defaults to kJ/(mol K).
    #[serde(default)]
    pub kboltzmann: Option<f64>,
    pub host: HostConfig,
    pub logmfd: LogMfdConfig,
}

impl RunFile {
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron_options().from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    pub fn units(&self) -> Units {
        Units::new(self.kboltzmann.unwrap_or(KB_KJ_PER_MOL), self.host.temperature)
    }
}

/// Overdamped Langevin particle, one coordinate per CV.
pub struct LangevinHost {
    pub x: Vec<f64>,
    names: Vec<String>,
    periodic: Vec<Option<Periodic>>,
    surface: Surface,
    rng: Pcg64,
    normal: Normal<f64>,
    a_term: f64,
    b_term: f64,
}

impl LangevinHost {
    /// `seed_offset` separates the random streams of replicas sharing one config.
    pub fn new(config: &HostConfig, kboltzmann: f64, seed_offset: u64) -> Result<Self> {
        if !(config.dt > 0.0) {
            return Err(LogMfdError::invalid("host.dt", format!("must be positive, got {}", config.dt)));
        }
        if !(config.visc > 0.0) {
            return Err(LogMfdError::invalid("host.visc", format!("must be positive, got {}", config.visc)));
        }
        let normal = Normal::new(0.0, config.dt.sqrt())
            .map_err(|e| LogMfdError::invalid("host.dt", e.to_string()))?;
        let kbt = kboltzmann * config.temperature;
        let periodic = config
            .cvs
            .iter()
            .map(|cv| cv.periodic.map(|(min, max)| Periodic::new(min, max)).transpose())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            x: config.cvs.iter().map(|cv| cv.initial).collect(),
            names: config.cvs.iter().map(|cv| cv.name.clone()).collect(),
            periodic,
            surface: config.surface,
            rng: Pcg64::seed_from_u64(config.seed.wrapping_add(seed_offset)),
            normal,
            a_term: config.dt / config.visc,
            b_term: (2.0 * kbt / config.visc).sqrt(),
        })
    }

    /// Names and domains of the CVs, in the order of `cvs()`.
    pub fn collective_variables(&self) -> Vec<(String, Box<dyn CvDomain>)> {
        self.names
            .iter()
            .zip(&self.periodic)
            .map(|(name, periodic)| {
                let domain: Box<dyn CvDomain> = match periodic {
                    Some(p) => Box::new(*p),
                    None => Box::new(Real),
                };
                (name.clone(), domain)
            })
            .collect()
    }

    pub fn cvs(&self) -> &[f64] {
        &self.x
    }

    pub fn potential_energy(&self) -> f64 {
        self.x.iter().map(|&x| self.surface.energy(x)).sum()
    }

    /// Euler-Maruyama step under the surface force plus `bias` (one force per CV).
    pub fn step(&mut self, bias: &[f64]) {
        for i in 0..self.x.len() {
            let force = self.surface.force(self.x[i]) + bias[i];
            let w = self.normal.sample(&mut self.rng);
            self.x[i] += self.a_term * force + self.b_term * w;
            if let Some(p) = &self.periodic[i] {
                self.x[i] = p.bring_back(self.x[i]);
            }
        }
    }
}
