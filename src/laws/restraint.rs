use crate::core::geometry::CvDomain;
use crate::core::state::FictitiousState;

/// Harmonic spring between each physical CV s_i and its fictitious partner X_i.
///
/// V = sum_i kappa_i (s_i - X_i)^2 / 2
#[derive(Debug, Clone)]
pub struct HarmonicRestraint {
    pub kappa: Vec<f64>,
}

/// What one MD step hands back to the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestraintOutput {
    /// Force on each physical CV, -kappa_i (s_i - X_i).
    pub forces: Vec<f64>,
    /// Restraint (bias) energy.
    pub energy: f64,
}

impl HarmonicRestraint {
    pub fn new(kappa: Vec<f64>) -> Self {
        Self { kappa }
    }

    /// Evaluates the spring for the current CV values and books the force on
    /// X and the displacement into the state's accumulators.
    ///
    /// `cvs` and `domains` must have one entry per fictitious variable.
    pub fn accumulate(
        &self,
        state: &mut FictitiousState,
        cvs: &[f64],
        domains: &[Box<dyn CvDomain>],
    ) -> RestraintOutput {
        let n = state.len();
        let mut forces = Vec::with_capacity(n);
        let mut energy = 0.0;

        for i in 0..n {
            // s - X in the minimal image
            let diff = domains[i].difference(state.value[i], cvs[i]);
            let f = -self.kappa[i] * diff;
            forces.push(f);
            energy += 0.5 * self.kappa[i] * diff * diff;

            state.force[i] += -f;
            state.average[i] += diff;
        }

        RestraintOutput { forces, energy }
    }

    /// Turns the sums collected over `interval` MD steps into averages:
    /// the local mean force on X, and the mean CV value wrapped into its domain.
    pub fn average_over_interval(state: &mut FictitiousState, domains: &[Box<dyn CvDomain>], interval: u64) {
        let steps = interval as f64;
        for i in 0..state.len() {
            state.force[i] /= steps;
            state.average[i] /= steps;
            state.average[i] += state.value[i];
            state.average[i] = domains[i].bring_back(state.average[i]);
        }
    }
}
