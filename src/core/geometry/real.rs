use super::domain::CvDomain;

/// A non-periodic CV: plain subtraction, no wrapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct Real;

impl CvDomain for Real {
    fn difference(&self, from: f64, to: f64) -> f64 {
        to - from
    }

    fn bring_back(&self, x: f64) -> f64 {
        x
    }

    fn is_periodic(&self) -> bool {
        false
    }
}
