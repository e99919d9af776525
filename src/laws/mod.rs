pub mod flattening;
pub mod free_energy;
pub mod replica;
pub mod restraint;

pub use flattening::Flattening;
pub use free_energy::FreeEnergy;
pub use replica::ReplicaWeighting;
pub use restraint::{HarmonicRestraint, RestraintOutput};
