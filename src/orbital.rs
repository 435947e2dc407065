//! Turns accepted samples into a colored point cloud ready for upload.

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use tracing::{info, warn};

use crate::config::Settings;
use crate::physics::{QuantumState, Spin};
use crate::sampler::{ProbabilitySampler, SamplerConfig, SphericalSample};

pub type Color = [f32; 3];

/// Point colors for the two spin directions, RGB in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SpinPalette {
    #[default(_code = "[0.2, 0.5, 1.0]")]
    pub up: Color,
    #[default(_code = "[1.0, 0.3, 0.2]")]
    pub down: Color,
}

impl SpinPalette {
    /// Mixed spin flips a fair coin per call.
    pub fn pick<R: Rng>(&self, spin: Spin, rng: &mut R) -> Color {
        match spin {
            Spin::Up => self.up,
            Spin::Down => self.down,
            Spin::Mixed => {
                if rng.gen_bool(0.5) {
                    self.up
                } else {
                    self.down
                }
            }
        }
    }
}

/// Interleaved vertex layout: position then color, 24 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: Color,
}

/// One generation's output. `colors[i]` belongs to `positions[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitalPointCloud {
    pub state: QuantumState,
    pub max_radius: f32,
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<Color>,
}

impl OrbitalPointCloud {
    /// Number of points to draw.
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(&position, &color)| PointVertex { position, color })
            .collect()
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Regenerates point clouds on request. Holds only configuration, so one
/// builder can serve any number of states.
#[derive(Debug, Clone, Default)]
pub struct OrbitalBuilder {
    sampler: SamplerConfig,
    palette: SpinPalette,
    parallel: bool,
}

impl OrbitalBuilder {
    pub fn new(sampler: SamplerConfig, palette: SpinPalette) -> Self {
        OrbitalBuilder {
            sampler,
            palette,
            parallel: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        OrbitalBuilder {
            sampler: settings.sampler,
            palette: settings.palette,
            parallel: settings.parallel,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn sampler_config(&self) -> &SamplerConfig {
        &self.sampler
    }

    pub fn palette(&self) -> &SpinPalette {
        &self.palette
    }

    /// Builds a fresh cloud for `state`, drawing from entropy-seeded generators.
    pub fn regenerate(&self, state: QuantumState) -> OrbitalPointCloud {
        let start = Instant::now();
        if !state.is_modeled() {
            warn!(
                "{} (n={}, l={}, m={}) is outside the modeled table, expect an empty cloud",
                state.label(),
                state.n,
                state.l,
                state.m
            );
        }

        let sampler = ProbabilitySampler::new(state, self.sampler);
        let cloud = if self.parallel {
            let samples = sampler.sample_parallel();
            let (positions, colors): (Vec<[f32; 3]>, Vec<Color>) = samples
                .par_iter()
                .map_init(rand::thread_rng, |rng, s| {
                    (s.to_cartesian(), self.palette.pick(state.spin, rng))
                })
                .unzip();
            OrbitalPointCloud {
                state,
                max_radius: sampler.max_radius() as f32,
                positions,
                colors,
            }
        } else {
            let mut rng = rand::thread_rng();
            let samples = sampler.sample_with(&mut rng);
            self.assemble(&sampler, &samples, &mut rng)
        };

        info!(
            "Generated {} with {} points in {:?}",
            state.label(),
            cloud.count(),
            start.elapsed()
        );
        cloud
    }

    /// Serial generation with a caller-supplied generator.
    pub fn regenerate_with<R: Rng>(&self, state: QuantumState, rng: &mut R) -> OrbitalPointCloud {
        let sampler = ProbabilitySampler::new(state, self.sampler);
        let samples = sampler.sample_with(rng);
        self.assemble(&sampler, &samples, rng)
    }

    fn assemble<R: Rng>(
        &self,
        sampler: &ProbabilitySampler,
        samples: &[SphericalSample],
        rng: &mut R,
    ) -> OrbitalPointCloud {
        let spin = sampler.state().spin;
        let mut positions = Vec::with_capacity(samples.len());
        let mut colors = Vec::with_capacity(samples.len());
        for s in samples {
            positions.push(s.to_cartesian());
            colors.push(self.palette.pick(spin, rng));
        }

        OrbitalPointCloud {
            state: *sampler.state(),
            max_radius: sampler.max_radius() as f32,
            positions,
            colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state(n: u32, l: u32, m: i32, spin: Spin) -> QuantumState {
        QuantumState { n, l, m, spin }
    }

    fn polar_angle(p: &[f32; 3]) -> f32 {
        let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        (p[2] / r).clamp(-1.0, 1.0).acos()
    }

    #[test]
    fn test_default_palette() {
        let palette = SpinPalette::default();
        assert_eq!(palette.up, [0.2, 0.5, 1.0]);
        assert_eq!(palette.down, [1.0, 0.3, 0.2]);
    }

    #[test]
    fn test_spin_up_colors_every_point_up() {
        let builder = OrbitalBuilder::default();
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = builder.regenerate_with(state(1, 0, 0, Spin::Up), &mut rng);

        assert!(!cloud.is_empty());
        assert_eq!(cloud.positions.len(), cloud.colors.len());
        assert!(cloud.colors.iter().all(|c| *c == builder.palette().up));
    }

    #[test]
    fn test_spin_down_colors_every_point_down() {
        let builder = OrbitalBuilder::default();
        let mut rng = StdRng::seed_from_u64(2);
        let cloud = builder.regenerate_with(state(2, 0, 0, Spin::Down), &mut rng);

        assert!(!cloud.is_empty());
        assert!(cloud.colors.iter().all(|c| *c == builder.palette().down));
    }

    #[test]
    fn test_mixed_spin_splits_colors_evenly() {
        let builder = OrbitalBuilder::default();
        let mut rng = StdRng::seed_from_u64(3);
        let cloud = builder.regenerate_with(state(1, 0, 0, Spin::Mixed), &mut rng);

        assert!(cloud.count() >= 1000, "only {} points", cloud.count());
        let palette = builder.palette();
        let up = cloud.colors.iter().filter(|c| **c == palette.up).count();
        let down = cloud.colors.iter().filter(|c| **c == palette.down).count();
        assert_eq!(up + down, cloud.count());

        let up_share = up as f64 / cloud.count() as f64;
        assert!((up_share - 0.5).abs() < 0.05, "up share {up_share}");
    }

    #[test]
    fn test_2p_concentrates_along_polar_axis() {
        let builder = OrbitalBuilder::default();
        let mut rng = StdRng::seed_from_u64(4);
        let cloud = builder.regenerate_with(state(2, 1, 0, Spin::Up), &mut rng);

        let quarter = std::f32::consts::FRAC_PI_4;
        let (mut polar, mut equatorial) = (0usize, 0usize);
        for p in &cloud.positions {
            let theta = polar_angle(p);
            if theta < quarter || theta > 3.0 * quarter {
                polar += 1;
            } else {
                equatorial += 1;
            }
        }
        assert!(polar > 2 * equatorial, "polar {polar}, equatorial {equatorial}");
    }

    #[test]
    fn test_unmodeled_state_gives_empty_cloud() {
        let builder = OrbitalBuilder::default();
        for seed in 0..3 {
            let mut rng = StdRng::seed_from_u64(seed);
            let cloud = builder.regenerate_with(state(5, 0, 0, Spin::Up), &mut rng);
            assert_eq!(cloud.count(), 0);
            assert!(cloud.colors.is_empty());
        }
        assert!(builder.regenerate(state(5, 0, 0, Spin::Up)).is_empty());
    }

    #[test]
    fn test_count_bounded_by_candidates() {
        let config = SamplerConfig {
            candidate_samples: 4_000,
            ..SamplerConfig::default()
        };
        let builder = OrbitalBuilder::new(config, SpinPalette::default());
        let mut rng = StdRng::seed_from_u64(5);
        for s in [state(1, 0, 0, Spin::Up), state(3, 2, 1, Spin::Mixed), state(4, 3, -3, Spin::Down)] {
            let cloud = builder.regenerate_with(s, &mut rng);
            assert!(cloud.count() <= 4_000);
            assert_eq!(cloud.positions.len(), cloud.colors.len());
            assert_eq!(cloud.state, s);
        }
    }

    #[test]
    fn test_points_stay_inside_domain() {
        let builder = OrbitalBuilder::default();
        let mut rng = StdRng::seed_from_u64(6);
        let cloud = builder.regenerate_with(state(3, 1, 1, Spin::Up), &mut rng);
        assert_eq!(cloud.max_radius, 22.5);
        for p in &cloud.positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!(r <= cloud.max_radius + 1e-3);
        }
    }

    #[test]
    fn test_parallel_regenerate() {
        let builder = OrbitalBuilder::default().with_parallel(true);
        let cloud = builder.regenerate(state(1, 0, 0, Spin::Mixed));
        assert!(cloud.count() >= 1000);
        assert!(cloud.count() <= builder.sampler_config().candidate_samples);
        assert_eq!(cloud.positions.len(), cloud.colors.len());
        let palette = builder.palette();
        assert!(cloud.colors.iter().any(|c| *c == palette.up));
        assert!(cloud.colors.iter().any(|c| *c == palette.down));
    }

    #[test]
    fn test_vertex_buffers() {
        let builder = OrbitalBuilder::default();
        let mut rng = StdRng::seed_from_u64(7);
        let cloud = builder.regenerate_with(state(2, 1, 1, Spin::Mixed), &mut rng);

        let vertices = cloud.vertices();
        assert_eq!(vertices.len(), cloud.count());
        assert_eq!(std::mem::size_of::<PointVertex>(), 24);
        assert_eq!(bytemuck::cast_slice::<PointVertex, u8>(&vertices).len(), 24 * cloud.count());
        assert_eq!(cloud.position_bytes().len(), 12 * cloud.count());
        assert_eq!(cloud.color_bytes().len(), 12 * cloud.count());
        for (i, v) in vertices.iter().enumerate().take(50) {
            assert_eq!(v.position, cloud.positions[i]);
            assert_eq!(v.color, cloud.colors[i]);
        }
    }
}
