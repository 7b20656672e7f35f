use crate::constants::{DEFAULT_VIEWPORT_WIDTH, NARROW_BREAKPOINT, NARROW_HEIGHT, WIDE_HEIGHT};

/// How source nodes are connected to the next layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Wiring {
    /// Every source reaches every node of the next layer.
    #[default]
    Full,
    /// Legacy sparse wiring: edges carrying a negligible share are dropped.
    Pruned,
}

/// Width of the drawing surface in surface units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
}

impl Viewport {
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    /// Width used for layout; a collapsed surface falls back to a sane default.
    pub fn layout_width(&self) -> f32 {
        if self.width > 0.0 && self.width.is_finite() {
            self.width
        } else {
            DEFAULT_VIEWPORT_WIDTH
        }
    }

    /// Narrow viewports use a flatter canvas.
    pub fn layout_height(&self) -> f32 {
        if self.layout_width() < NARROW_BREAKPOINT {
            NARROW_HEIGHT
        } else {
            WIDE_HEIGHT
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
        }
    }
}

/// Construction parameters for a [`crate::Controller`].
///
/// - `wiring` selects full or pruned connectivity for every rebuild
/// - `viewport` is the initial surface size; `Controller::resize` updates it
/// - `seed` feeds the renderer and effects RNG streams
#[derive(Clone, Debug)]
pub struct VizConfig {
    pub wiring: Wiring,
    pub viewport: Viewport,
    pub seed: u64,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            wiring: Wiring::Full,
            viewport: Viewport::default(),
            seed: 42,
        }
    }
}

/// Derive an independent RNG seed for a sub-component from a base seed.
#[inline]
pub(crate) fn mix_seed(seed: u64, stream: u64) -> u64 {
    seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
