//! Hydrogen-like wavefunction factors in atomic units.
//! All distances are in units of the Bohr radius a₀.

use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Highest principal quantum number covered by the radial table.
pub const MAX_MODELED_N: u32 = 4;

/// Highest angular quantum number covered by the angular table.
pub const MAX_MODELED_L: u32 = 3;

/// Cap on n accepted from command-line and web input.
pub const MAX_INPUT_N: u32 = 7;

/// Spin selector of an orbital. Only affects how sampled points are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spin {
    #[default]
    Up,
    Down,
    /// Both spins; each point picks one at random.
    Mixed,
}

impl Spin {
    /// Maps the integer selector used by input layers: 1 = up, -1 = down, 0 = both.
    pub fn from_selector(s: i32) -> Option<Self> {
        match s {
            1 => Some(Spin::Up),
            -1 => Some(Spin::Down),
            0 => Some(Spin::Mixed),
            _ => None,
        }
    }

    pub fn selector(self) -> i32 {
        match self {
            Spin::Up => 1,
            Spin::Down => -1,
            Spin::Mixed => 0,
        }
    }
}

/// Quantum numbers (n, l, m, s) of the orbital to sample.
///
/// The fields are public and the evaluator never rejects a state: an
/// inconsistent or unmodeled tuple evaluates to zero density. Keeping
/// 1 <= n, l < n and |m| <= l is the caller's job; [`QuantumState::new`]
/// is there for input layers that want to check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumState {
    pub n: u32,
    pub l: u32,
    pub m: i32,
    pub spin: Spin,
}

impl Default for QuantumState {
    fn default() -> Self {
        QuantumState {
            n: 1,
            l: 0,
            m: 0,
            spin: Spin::Up,
        }
    }
}

impl QuantumState {
    pub fn new(n: u32, l: u32, m: i32, spin: Spin) -> Option<Self> {
        if n == 0 || l >= n || m.unsigned_abs() > l {
            return None;
        }
        Some(QuantumState { n, l, m, spin })
    }

    /// Checks raw input from a front end: n <= [`MAX_INPUT_N`], consistent
    /// (n, l, m) and a spin selector of 1, -1 or 0.
    pub fn from_input(n: u32, l: u32, m: i32, s: i32) -> Result<Self, String> {
        if n > MAX_INPUT_N {
            return Err(format!("n = {n} is above the cap of {MAX_INPUT_N}"));
        }
        let spin = Spin::from_selector(s).ok_or_else(|| format!("s must be 1, -1 or 0, got {s}"))?;
        QuantumState::new(n, l, m, spin)
            .ok_or_else(|| format!("inconsistent quantum numbers n={n}, l={l}, m={m}"))
    }

    /// True when both closed-form tables have an entry for this state.
    pub fn is_modeled(&self) -> bool {
        (1..=MAX_MODELED_N).contains(&self.n)
            && self.l < self.n
            && self.l <= MAX_MODELED_L
            && self.m.unsigned_abs() <= self.l
    }

    /// Spectroscopic name, e.g. "2p" or "4f".
    pub fn label(&self) -> String {
        const LETTERS: [char; 7] = ['s', 'p', 'd', 'f', 'g', 'h', 'i'];
        match LETTERS.get(self.l as usize) {
            Some(c) => format!("{}{}", self.n, c),
            None => format!("{}l{}", self.n, self.l),
        }
    }
}

/// Radial factor R_nl(r).
///
/// Closed forms for the shells n = 1..=4. Any (n, l) outside that table
/// returns 0, meaning "not modeled"; sampling such a state yields no points.
pub fn radial_amplitude(n: u32, l: u32, r: f64) -> f64 {
    match (n, l) {
        // 1s
        (1, 0) => 2.0 * (-r).exp(),
        // 2s, 2p
        (2, 0) => (1.0 / (2.0 * 2f64.sqrt())) * (2.0 - r) * (-r / 2.0).exp(),
        (2, 1) => (1.0 / (2.0 * 6f64.sqrt())) * r * (-r / 2.0).exp(),
        // 3s, 3p, 3d
        (3, 0) => {
            (2.0 / (81.0 * 3f64.sqrt())) * (27.0 - 18.0 * r + 2.0 * r * r) * (-r / 3.0).exp()
        }
        (3, 1) => (8.0 / (27.0 * 6f64.sqrt())) * r * (1.0 - r / 6.0) * (-r / 3.0).exp(),
        (3, 2) => (4.0 / (81.0 * 30f64.sqrt())) * r * r * (-r / 3.0).exp(),
        // 4s, 4p, 4d, 4f
        (4, 0) => {
            0.25 * (1.0 - 0.75 * r + r * r / 8.0 - r * r * r / 192.0) * (-r / 4.0).exp()
        }
        (4, 1) => {
            (5f64.sqrt() / (16.0 * 3f64.sqrt()))
                * r
                * (1.0 - r / 4.0 + r * r / 80.0)
                * (-r / 4.0).exp()
        }
        (4, 2) => (1.0 / (64.0 * 5f64.sqrt())) * r * r * (1.0 - r / 12.0) * (-r / 4.0).exp(),
        (4, 3) => (1.0 / (768.0 * 35f64.sqrt())) * r * r * r * (-r / 4.0).exp(),
        _ => 0.0,
    }
}

/// Polar factor Θ_l|m|(θ), normalized so that ∫ Θ² sinθ dθ = 1 over [0, π].
///
/// Only |m| matters here; the sign of m lives in the azimuthal phase.
/// Unmodeled (l, m) returns 0.
pub fn angular_amplitude(l: u32, m: i32, theta: f64) -> f64 {
    let (s, c) = theta.sin_cos();
    match (l, m.unsigned_abs()) {
        (0, 0) => (1.0f64 / 2.0).sqrt(),

        (1, 0) => (3.0f64 / 2.0).sqrt() * c,
        (1, 1) => (3.0f64 / 4.0).sqrt() * s,

        (2, 0) => (5.0f64 / 8.0).sqrt() * (3.0 * c * c - 1.0),
        (2, 1) => (15.0f64 / 4.0).sqrt() * s * c,
        (2, 2) => (15.0f64 / 16.0).sqrt() * s * s,

        (3, 0) => (7.0f64 / 8.0).sqrt() * (5.0 * c * c * c - 3.0 * c),
        (3, 1) => (21.0f64 / 32.0).sqrt() * s * (5.0 * c * c - 1.0),
        (3, 2) => (105.0f64 / 16.0).sqrt() * s * s * c,
        (3, 3) => (35.0f64 / 32.0).sqrt() * s * s * s,

        _ => 0.0,
    }
}

/// Azimuthal factor e^{i m φ}. Unit magnitude, so it never changes |ψ|².
pub fn azimuthal_phase(m: i32, phi: f64) -> Complex<f64> {
    Complex::from_polar(1.0, m as f64 * phi)
}

/// Unnormalized sampling weight R² · Θ² at (r, θ). Independent of φ.
pub fn probability_density(state: &QuantumState, r: f64, theta: f64) -> f64 {
    let radial = radial_amplitude(state.n, state.l, r);
    let angular = angular_amplitude(state.l, state.m, theta);

    let amplitude = radial * angular;
    amplitude * amplitude
}
