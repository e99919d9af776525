pub mod domain;
pub mod real;
pub mod periodic;

pub use domain::CvDomain;
pub use periodic::Periodic;
pub use real::Real;
