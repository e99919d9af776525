use crate::core::state::FictitiousState;

/// A condition imposed on the fictitious variables after each MFD step.
pub trait Constraint {
    /// Projects the state back onto the allowed region.
    /// Modifies position (value) and velocity.
    fn project(&self, state: &mut FictitiousState);
}

/// Elastic mirror at `min[i]` and `max[i]` of every fictitious variable.
///
/// A variable that overshot a wall by `d` is folded back to `d` inside it and
/// its velocity is reversed. The upper wall is handled before the lower one,
/// each CV independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorBoundary;

impl MirrorBoundary {
    /// Reflects a single variable. Returns the new `(value, velocity)`.
    pub fn reflect(value: f64, velocity: f64, min: f64, max: f64) -> (f64, f64) {
        let (mut x, mut v) = (value, velocity);
        if x > max {
            x = max - (x - max);
            v = -v;
        }
        if x < min {
            x = min + (min - x);
            v = -v;
        }
        (x, v)
    }
}

impl Constraint for MirrorBoundary {
    fn project(&self, state: &mut FictitiousState) {
        for i in 0..state.len() {
            let (x, v) = Self::reflect(state.value[i], state.velocity[i], state.min[i], state.max[i]);
            if x != state.value[i] {
                tracing::trace!(cv = %state.names[i], from = state.value[i], to = x, "mirror reflection");
            }
            state.value[i] = x;
            state.velocity[i] = v;
        }
    }
}
