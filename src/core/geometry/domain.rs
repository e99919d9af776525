/// The space a collective variable lives in.
///
/// The restraint and the fictitious dynamics never subtract two CV values or
/// store one directly: they go through the domain, so periodic CVs (torsions)
/// use the minimal image and stay in their canonical range.
pub trait CvDomain: std::fmt::Debug + Send + Sync {
    /// Minimal displacement that carries `from` onto `to`.
    /// On the real line this is `to - from`.
    /// On a circle it is folded into `[-period/2, period/2]`.
    fn difference(&self, from: f64, to: f64) -> f64;

    /// Maps `x` onto its canonical representative.
    fn bring_back(&self, x: f64) -> f64;

    fn is_periodic(&self) -> bool;

    /// `(min, max)` of a periodic domain, `None` for an unbounded one.
    fn period(&self) -> Option<(f64, f64)> {
        None
    }
}
