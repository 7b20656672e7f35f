// Shared layout, propagation and styling constants used by every front-end.

// Layout
pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0; // used when the surface reports a zero width
pub const NARROW_BREAKPOINT: f32 = 768.0; // below this width the canvas gets flatter
pub const NARROW_HEIGHT: f32 = 350.0;
pub const WIDE_HEIGHT: f32 = 500.0;
pub const TIMER_INSET_X: f32 = 40.0;
pub const TIMER_INSET_BOTTOM: f32 = 30.0;

// Topology
pub const MIN_LAYERS: usize = 2;
pub const PRUNE_SHARE: f32 = 0.01; // pruned wiring drops edges at or below this fan-out share
pub const MIN_LAYER_DENSITY: f32 = 0.7; // floor for per-transition density factors

// Energy telemetry and onset detection
pub const ENERGY_AVG_KEEP: f32 = 0.95; // avg = keep*avg + (1-keep)*current
pub const FRAME_DROP_RATIO: f32 = 0.6; // random mode: frame energy vs. avg_energy
pub const FRAME_DROP_FLOOR: f32 = 20.0;
pub const FRAME_DROP_COOLDOWN_MS: u64 = 1500;
pub const INPUT_DROP_RATIO: f32 = 0.5; // input-layer energy vs. m_avg
pub const INPUT_DROP_FLOOR: f32 = 10.0;
pub const INPUT_DROP_COOLDOWN_MS: u64 = 1000;
pub const HISTORY_DEPTH: usize = 60; // retained spectral frames

// Input injection band (Hz)
pub const BAND_LOW_HZ: f32 = 50.0;
pub const BAND_HIGH_HZ: f32 = 8000.0;

// Propagation
pub const WEIGHT_EASE: f32 = 0.05; // fraction of (target - current) applied per tick
pub const WEIGHT_SNAP_EPSILON: f32 = 0.001;
pub const NODE_VALUE_EASE: f32 = 0.35; // smoothing of the rendered node value
pub const SOURCE_ACTIVE_THRESHOLD: f32 = 0.1;
pub const EDGE_ACTIVE_THRESHOLD: f32 = 0.5;
pub const NODE_ACTIVE_THRESHOLD: f32 = 0.1;

// Edge visual mapping
pub const EDGE_ENERGY_FULL_SCALE: f32 = 100.0; // compensated energy mapped to ratio 1.0
pub const EDGE_MAX_WIDTH: f32 = 8.0;
pub const EDGE_OPACITY_FLOOR: f32 = 0.1;
pub const DASH_PERIOD: f32 = 15.0; // matches the "10 5" dash pattern
pub const DASH_BASE_SPEED: f32 = 20.0; // dash units per second at ratio 0
pub const DASH_SPEED_GAIN: f32 = 5.0;
pub const EDGE_LIGHT_BASE: f32 = 50.0;
pub const EDGE_LIGHT_SPAN: f32 = 30.0;
pub const EDGE_LIGHT_SCALE: f32 = 20.0;

// Node visual mapping
pub const RESTING_RADIUS: f32 = 18.0;
pub const NODE_RADIUS_GAIN: f32 = 2.0;
pub const NODE_RADIUS_BASE: f32 = 5.0;
pub const NODE_LIGHT_BASE: f32 = 50.0;
pub const NODE_LIGHT_SPAN: f32 = 25.0;
pub const NODE_LIGHT_DIVISOR: f32 = 4.0;
pub const NODE_STROKE_SPAN: f32 = 1.5;
pub const NODE_STROKE_DIVISOR: f32 = 50.0;
pub const GLOW_MAX: f32 = 30.0;
pub const GLOW_DIVISOR: f32 = 40.0;
pub const GLOW_EXPONENT: f32 = 1.5;

// Layer hue scheme
pub const HUE_BASE: f32 = 180.0;
pub const HUE_STEP: f32 = 40.0;

// Auto flow
pub const AUTO_FLOW_MAX_SPEED: u32 = 1000;
pub const AUTO_FLOW_DEFAULT_SPEED: u32 = 500;
pub const AUTO_FLOW_BASE_INTERVAL_MS: u64 = 1100;
pub const AUTO_FLOW_MIN_INTERVAL_MS: u64 = 20;
pub const AUTO_FLOW_FAST_SPEED: u32 = 800; // above this the flow flashes more edges for less time
pub const AUTO_FLOW_FAST_BATCH: usize = 5;
pub const AUTO_FLOW_SLOW_BATCH: usize = 3;
pub const AUTO_FLOW_FAST_DECAY_MS: u64 = 400;
pub const AUTO_FLOW_SLOW_DECAY_MS: u64 = 800;
pub const FLASH_GLOW: f32 = 15.0;

// Effect palette
pub const PREMIUM_COLORS: [&str; 10] = [
    "#00f2fe", "#4facfe", "#8b5cf6", "#f472b6", "#38bdf8", "#a78bfa", "#22d3ee", "#818cf8",
    "#c084fc", "#fb7185",
];

// Stroke color of each layer's circles at build time
pub const LAYER_COLORS: [&str; 6] = [
    "#22d3ee", // cyan
    "#818cf8", // indigo
    "#c084fc", // purple
    "#f472b6", // pink
    "#38bdf8", // sky
    "#4ade80", // emerald
];

/// Hue shared by a layer's nodes and its outgoing edges.
#[inline]
pub fn layer_hue(layer: usize) -> f32 {
    (HUE_BASE + HUE_STEP * layer as f32) % 360.0
}
