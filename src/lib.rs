//! Monte-Carlo point clouds of hydrogen-like orbitals.
//!
//! `physics` evaluates the wavefunction factors, `sampler` rejection-samples
//! |ψ|² and `orbital` turns the accepted draws into colored points.

pub mod config;
pub mod orbital;
pub mod physics;
pub mod sampler;

pub use config::Settings;
pub use orbital::{OrbitalBuilder, OrbitalPointCloud, PointVertex, SpinPalette};
pub use physics::{QuantumState, Spin};
pub use sampler::{ProbabilitySampler, SamplerConfig};
