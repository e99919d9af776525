use crate::error::{LogMfdError, Result};

/// The map between the free energy F(X) and the potential Psi that drives X.
///
/// LogMFD uses the logarithmic surface
/// $\Psi_{log} = \gamma \log(\alpha F + 1)$,
/// which is much flatter than F, so the fictitious variables cross barriers
/// faster. With no flattening (TAMD / d-AFED) the dynamics runs on F itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flattening {
    /// Psi = F.
    Tamd,
    /// Psi = sgn(F) gamma ln(alpha |F| + 1).
    Logarithmic { alpha: f64, gamma: f64 },
}

impl Flattening {
    /// Resolves the ALPHA/GAMMA pair.
    ///
    /// A value of `0` counts as not given. Given one, the other is its
    /// reciprocal. Given neither, flattening is off.
    pub fn from_params(alpha: Option<f64>, gamma: Option<f64>) -> Result<Self> {
        let alpha = alpha.filter(|a| *a != 0.0);
        let gamma = gamma.filter(|g| *g != 0.0);

        let (alpha, gamma) = match (alpha, gamma) {
            (None, None) => return Ok(Flattening::Tamd),
            (Some(alpha), None) => (alpha, 1.0 / alpha),
            (None, Some(gamma)) => (1.0 / gamma, gamma),
            (Some(alpha), Some(gamma)) => {
                return Err(LogMfdError::ConflictingFlattening { alpha, gamma });
            }
        };

        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(LogMfdError::invalid("ALPHA", format!("must be positive, got {alpha}")));
        }
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(LogMfdError::invalid("GAMMA", format!("must be positive, got {gamma}")));
        }

        Ok(Flattening::Logarithmic { alpha, gamma })
    }

    pub fn is_tamd(&self) -> bool {
        matches!(self, Flattening::Tamd)
    }

    /// Forward map F -> Psi.
    pub fn flatten(&self, free_energy: f64) -> f64 {
        match *self {
            Flattening::Tamd => free_energy,
            Flattening::Logarithmic { alpha, gamma } => {
                sgn(free_energy) * gamma * (alpha * free_energy.abs() + 1.0).ln()
            }
        }
    }

    /// Inverse map Psi -> F, used to read the free energy off the dynamics.
    pub fn free_energy(&self, potential: f64) -> f64 {
        match *self {
            Flattening::Tamd => potential,
            Flattening::Logarithmic { alpha, gamma } => {
                sgn(potential) * ((potential.abs() / gamma).exp() - 1.0) / alpha
            }
        }
    }

    /// Damping factor dPsi/dF applied to the mean force, alpha gamma / (alpha |F| + 1).
    pub fn coefficient(&self, free_energy: f64) -> f64 {
        match *self {
            Flattening::Tamd => 1.0,
            Flattening::Logarithmic { alpha, gamma } => {
                alpha * gamma / (alpha * free_energy.abs() + 1.0)
            }
        }
    }

    pub fn alpha(&self) -> f64 {
        match *self {
            Flattening::Tamd => 0.0,
            Flattening::Logarithmic { alpha, .. } => alpha,
        }
    }

    pub fn gamma(&self) -> f64 {
        match *self {
            Flattening::Tamd => 0.0,
            Flattening::Logarithmic { gamma, .. } => gamma,
        }
    }
}

fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
