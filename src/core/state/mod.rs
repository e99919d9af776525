/// State of the fictitious dynamical variables, one entry per collective variable.
///
/// Structure-of-Arrays layout: one `Vec<f64>` per quantity instead of a
/// `Vec<FictitiousVariable>`. The integrators sweep a single quantity over all
/// CVs at a time (e.g. a velocity half-kick), so this keeps them tight loops.
#[derive(Debug, Clone, Default)]
pub struct FictitiousState {
    /// CV labels, used to name output components and log columns.
    pub names: Vec<String>,

    /// Current value X_i of each fictitious variable.
    pub value: Vec<f64>,

    /// Current velocity V_i.
    pub velocity: Vec<f64>,

    /// Mass M_i.
    pub mass: Vec<f64>,

    /// Mirror boundaries. `min[i] <= value[i] <= max[i]` after every update cycle.
    pub min: Vec<f64>,
    pub max: Vec<f64>,

    /// Restraint force on X_i, summed every MD step and averaged once per interval.
    /// After averaging (and replica weighting) this holds the mean force.
    pub force: Vec<f64>,

    /// Sum of the CV-minus-X differences, averaged into the mean CV value per interval.
    pub average: Vec<f64>,
}

impl FictitiousState {
    pub fn new(names: Vec<String>) -> Self {
        let n = names.len();
        Self {
            names,
            value: vec![0.0; n],
            velocity: vec![0.0; n],
            mass: vec![1.0; n],
            min: vec![f64::NEG_INFINITY; n],
            max: vec![f64::INFINITY; n],
            force: vec![0.0; n],
            average: vec![0.0; n],
        }
    }

    /// Number of fictitious variables (N).
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Kinetic energy sum_i M_i V_i^2 / 2.
    pub fn kinetic_energy(&self) -> f64 {
        self.mass
            .iter()
            .zip(&self.velocity)
            .map(|(m, v)| 0.5 * m * v * v)
            .sum()
    }

    /// Instantaneous kinetic temperature 2 E_kin / (N k_B).
    pub fn temperature(&self, kboltzmann: f64) -> f64 {
        if self.is_empty() || kboltzmann == 0.0 {
            return 0.0;
        }
        2.0 * self.kinetic_energy() / self.len() as f64 / kboltzmann
    }

    /// Clears the per-interval accumulators.
    pub fn reset_accumulators(&mut self) {
        self.force.iter_mut().for_each(|f| *f = 0.0);
        self.average.iter_mut().for_each(|a| *a = 0.0);
    }

    pub fn within_bounds(&self, i: usize) -> bool {
        self.value[i] >= self.min[i] && self.value[i] <= self.max[i]
    }
}
