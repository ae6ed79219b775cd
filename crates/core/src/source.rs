//! Analytic, noise-free sources for the plume and the ambient current.
//!
//! A [`ScalarSource`] yields a concentration and a [`FlowSource`] a current
//! vector at any point in space and time. Both are deterministic: the
//! stochastic part of the synthetic environment is added on top by
//! [`FieldGenerator`](crate::generator::FieldGenerator).

use glam::DVec2;

/// Deterministic scalar intensity over space and time.
pub trait ScalarSource: Send + Sync {
    /// Intensity at `(x, y)` at time step `time`.
    fn intensity(&self, x: f64, y: f64, time: f64) -> f64;
}

/// Deterministic 2D vector field over space and time.
pub trait FlowSource: Send + Sync {
    /// Returns the `(u, v)` current at `(x, y)` at time step `time`.
    fn sample(&self, x: f64, y: f64, time: f64) -> (f64, f64);
}

// ---------------------------------------------------------------------------
// Plume
// ---------------------------------------------------------------------------

/// Number of secondary fragment blobs shed by the main plume.
pub const FRAGMENT_COUNT: usize = 3;
/// Peak intensity of each fragment relative to the main plume.
const FRAGMENT_SCALE: f64 = 0.3;

/// Isotropic 2D Gaussian bump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlob {
    pub center: DVec2,
    pub sigma: f64,
    pub amplitude: f64,
}

impl GaussianBlob {
    /// Intensity at `(x, y)`: `amplitude · exp(-r² / 2σ²)`.
    pub fn intensity(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center.x;
        let dy = y - self.center.y;
        self.amplitude * (-(dx * dx + dy * dy) / (2.0 * self.sigma * self.sigma)).exp()
    }
}

/// Meandering main plume plus phase-offset fragments.
///
/// At time `t` the main blob sits at `source + (5·sin 0.05t, 3·cos 0.07t)`
/// with spread `15 + 3·sin 0.1t`. Fragment `i` sits at
/// `center + (20·sin(0.1t + i), 15·cos(0.08t + 2i))` with spread
/// `8 + 2·sin(0.15t + i)` and peak [`FRAGMENT_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlumeSource {
    pub source: DVec2,
}

impl PlumeSource {
    pub fn new(source: DVec2) -> Self {
        Self { source }
    }

    /// Drifted centre of the main plume at time `t`.
    pub fn center(&self, t: f64) -> DVec2 {
        self.source + DVec2::new(5.0 * (0.05 * t).sin(), 3.0 * (0.07 * t).cos())
    }

    /// The main blob followed by the fragments, in index order.
    pub fn blobs(&self, t: f64) -> [GaussianBlob; FRAGMENT_COUNT + 1] {
        let center = self.center(t);
        let main = GaussianBlob {
            center,
            sigma: 15.0 + 3.0 * (0.1 * t).sin(),
            amplitude: 1.0,
        };
        let mut blobs = [main; FRAGMENT_COUNT + 1];
        for (i, blob) in blobs.iter_mut().skip(1).enumerate() {
            let phase = i as f64;
            *blob = GaussianBlob {
                center: center
                    + DVec2::new(
                        20.0 * (0.1 * t + phase).sin(),
                        15.0 * (0.08 * t + 2.0 * phase).cos(),
                    ),
                sigma: 8.0 + 2.0 * (0.15 * t + phase).sin(),
                amplitude: FRAGMENT_SCALE,
            };
        }
        blobs
    }
}

impl ScalarSource for PlumeSource {
    fn intensity(&self, x: f64, y: f64, time: f64) -> f64 {
        self.blobs(time).iter().map(|b| b.intensity(x, y)).sum()
    }
}

// ---------------------------------------------------------------------------
// Current
// ---------------------------------------------------------------------------

/// Rigid-rotation current about `center`, normalized by the domain half-extent.
///
/// `u = -(y - cy) / hy · (1 + 0.2·sin 0.03t)` and
/// `v = (x - cx) / hx · (1 + 0.2·cos 0.03t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationalFlow {
    pub center: DVec2,
    pub half_extent: DVec2,
}

impl RotationalFlow {
    /// Current rotating about the midpoint of a `extent`-sized domain.
    pub fn centered_in(extent: DVec2) -> Self {
        Self {
            center: extent * 0.5,
            half_extent: extent * 0.5,
        }
    }
}

impl FlowSource for RotationalFlow {
    fn sample(&self, x: f64, y: f64, time: f64) -> (f64, f64) {
        let u = -(y - self.center.y) / self.half_extent.y * (1.0 + 0.2 * (0.03 * time).sin());
        let v = (x - self.center.x) / self.half_extent.x * (1.0 + 0.2 * (0.03 * time).cos());
        (u, v)
    }
}
