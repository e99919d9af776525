use super::domain::CvDomain;
use crate::error::{LogMfdError, Result};

/// A periodic CV on `[min, max)`, e.g. a torsion on `[-pi, pi)`.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    pub min: f64,
    pub max: f64,
    width: f64,
}

impl Periodic {
    /// Fails unless both ends are finite and `max > min`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(LogMfdError::invalid(
                "periodic",
                format!("domain [{min}, {max}) is empty or not finite"),
            ));
        }
        Ok(Self {
            min,
            max,
            width: max - min,
        })
    }

    /// The usual angular domain `[-pi, pi)`.
    pub fn angle() -> Self {
        let pi = std::f64::consts::PI;
        Self {
            min: -pi,
            max: pi,
            width: 2.0 * pi,
        }
    }
}

impl CvDomain for Periodic {
    fn difference(&self, from: f64, to: f64) -> f64 {
        let s = (to - from) / self.width;
        (s - s.round()) * self.width
    }

    /// Folds `x` around the centre of the domain.
    fn bring_back(&self, x: f64) -> f64 {
        let centre = self.min + 0.5 * self.width;
        centre + self.difference(centre, x)
    }

    fn is_periodic(&self) -> bool {
        true
    }

    fn period(&self) -> Option<(f64, f64)> {
        Some((self.min, self.max))
    }
}
