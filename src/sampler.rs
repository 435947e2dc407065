//! Two-phase rejection sampler for |ψ|².
//!
//! The probe phase estimates the density maximum over the sampling domain,
//! the acceptance phase draws uniform candidates and keeps each one with
//! probability density / maximum. The maximum is empirical, not a proven
//! bound: if the probes miss the true peak some ratios exceed 1 and those
//! candidates are always kept.

use std::f64::consts::PI;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use tracing::{debug, warn};

use crate::physics::{probability_density, QuantumState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SamplerConfig {
    /// Draws used to estimate the density maximum.
    #[default = 10_000]
    pub probe_samples: usize,

    /// Candidate draws in the acceptance phase; upper bound on the point count.
    #[default = 50_000]
    pub candidate_samples: usize,

    /// r_max = radial_scale * n², in Bohr radii.
    #[default = 2.5]
    pub radial_scale: f64,
}

/// An accepted draw in spherical coordinates (r, θ, φ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalSample {
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
}

impl SphericalSample {
    pub fn to_cartesian(&self) -> [f32; 3] {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let (sin_p, cos_p) = self.phi.sin_cos();
        [
            (self.r * sin_t * cos_p) as f32,
            (self.r * sin_t * sin_p) as f32,
            (self.r * cos_t) as f32,
        ]
    }
}

pub struct ProbabilitySampler {
    state: QuantumState,
    config: SamplerConfig,
}

impl ProbabilitySampler {
    pub fn new(state: QuantumState, config: SamplerConfig) -> Self {
        ProbabilitySampler { state, config }
    }

    pub fn state(&self) -> &QuantumState {
        &self.state
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Outer radius of the sampling domain.
    pub fn max_radius(&self) -> f64 {
        let n = self.state.n as f64;
        n * n * self.config.radial_scale
    }

    /// Uniform (r, θ) over [0, r_max] x [0, π] and its density.
    fn draw<R: Rng>(&self, rng: &mut R) -> (f64, f64, f64) {
        let r = rng.gen::<f64>() * self.max_radius();
        let theta = rng.gen::<f64>() * PI;
        (r, theta, probability_density(&self.state, r, theta))
    }

    /// Keeps the candidate iff density / max_prob beats a fresh uniform threshold.
    fn try_accept<R: Rng>(&self, max_prob: f64, rng: &mut R) -> Option<SphericalSample> {
        let (r, theta, density) = self.draw(rng);
        let phi = rng.gen::<f64>() * 2.0 * PI;
        let threshold = rng.gen::<f64>();

        if density / max_prob > threshold {
            Some(SphericalSample { r, theta, phi })
        } else {
            None
        }
    }

    /// Probe phase. Returns 1 when no probe saw a nonzero density so the
    /// acceptance ratio stays defined.
    pub fn estimate_max_probability<R: Rng>(&self, rng: &mut R) -> f64 {
        let max_prob = (0..self.config.probe_samples)
            .map(|_| self.draw(rng).2)
            .fold(0.0_f64, f64::max);
        debug!("{} probe maximum: {:e}", self.state.label(), max_prob);
        self.guard_max(max_prob)
    }

    /// Non-positive or NaN maxima become 1.
    fn guard_max(&self, max_prob: f64) -> f64 {
        if max_prob > 0.0 {
            max_prob
        } else {
            warn!(
                "{} (n={}, l={}, m={}) has no positive density maximum ({}), falling back to max_prob = 1",
                self.state.label(),
                self.state.n,
                self.state.l,
                self.state.m,
                max_prob
            );
            1.0
        }
    }

    /// Acceptance phase against a known maximum. Samples come back in draw order.
    /// A `max_prob` that is not positive is replaced by 1, as in the probe phase.
    pub fn accept<R: Rng>(&self, max_prob: f64, rng: &mut R) -> Vec<SphericalSample> {
        let max_prob = self.guard_max(max_prob);
        let samples: Vec<SphericalSample> = (0..self.config.candidate_samples)
            .filter_map(|_| self.try_accept(max_prob, rng))
            .collect();
        debug!(
            "{} accepted {} of {} candidates",
            self.state.label(),
            samples.len(),
            self.config.candidate_samples
        );
        samples
    }

    /// Both phases with a caller-supplied generator.
    pub fn sample_with<R: Rng>(&self, rng: &mut R) -> Vec<SphericalSample> {
        let max_prob = self.estimate_max_probability(rng);
        self.accept(max_prob, rng)
    }

    /// Both phases with a freshly seeded thread-local generator.
    pub fn sample(&self) -> Vec<SphericalSample> {
        let mut rng = rand::thread_rng();
        self.sample_with(&mut rng)
    }

    /// Both phases spread over the rayon pool. Every worker draws from its
    /// own thread-local generator; the probe maximum is fully reduced before
    /// any candidate is tested.
    pub fn sample_parallel(&self) -> Vec<SphericalSample> {
        let max_prob = (0..self.config.probe_samples)
            .into_par_iter()
            .map_init(rand::thread_rng, |rng, _| self.draw(rng).2)
            .reduce(|| 0.0, f64::max);
        debug!("{} probe maximum: {:e}", self.state.label(), max_prob);
        let max_prob = self.guard_max(max_prob);

        let samples: Vec<SphericalSample> = (0..self.config.candidate_samples)
            .into_par_iter()
            .map_init(rand::thread_rng, |rng, _| self.try_accept(max_prob, rng))
            .flatten()
            .collect();
        debug!(
            "{} accepted {} of {} candidates (parallel)",
            self.state.label(),
            samples.len(),
            self.config.candidate_samples
        );
        samples
    }
}
