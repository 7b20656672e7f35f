//! Audio-driven energy propagation.
//!
//! Each tick injects band energy from one spectral frame into the input
//! layer, pushes it forward through the weighted edges and maps the resulting
//! per-node and per-edge energy onto styles. Physical amplitudes are never
//! compensated; density factors only touch the visual mapping.

use crate::constants::*;
use crate::effects::EffectsEngine;
use crate::error::ModeParseError;
use crate::renderer::{format_timer, GraphRenderer};
use crate::scene::{Color, EdgeStyle, Glow, NodeStyle, Scene};
use crate::topology::Topology;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One analysis frame supplied by the audio collaborator.
///
/// - `spectral_magnitudes`: non-negative magnitudes, low to high frequency
/// - `sample_rate`: Hz of the analysed signal
/// - `window_size`: FFT window length the magnitudes came from
/// - `elapsed_seconds`: playback position, when the source knows it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioFrame {
    pub spectral_magnitudes: Vec<f32>,
    pub sample_rate: f32,
    pub window_size: usize,
    pub elapsed_seconds: Option<f64>,
}

impl AudioFrame {
    /// Mean magnitude over the whole frame.
    pub fn mean_energy(&self) -> f32 {
        if self.spectral_magnitudes.is_empty() {
            return 0.0;
        }
        self.spectral_magnitudes.iter().sum::<f32>() / self.spectral_magnitudes.len() as f32
    }

    /// Width of one spectral bin in Hz, if the frame describes one.
    pub fn bin_hz(&self) -> Option<f32> {
        if self.window_size == 0 {
            return None;
        }
        let hz = self.sample_rate / self.window_size as f32;
        (hz.is_finite() && hz > 0.0).then_some(hz)
    }
}

/// Non-blocking access to the most recent analysis frame.
pub trait AudioSource {
    /// `None` while nothing is playing or decoding has not finished.
    fn current_frame(&mut self) -> Option<AudioFrame>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VizMode {
    #[default]
    Propagation,
    /// Legacy alias of propagation that also rewires on whole-frame energy drops.
    Random,
}

impl VizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VizMode::Propagation => "propagation",
            VizMode::Random => "random",
        }
    }
}

impl fmt::Display for VizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VizMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagation" => Ok(VizMode::Propagation),
            "random" => Ok(VizMode::Random),
            _ => Err(ModeParseError(s.to_owned())),
        }
    }
}

/// Moving averages, rewire bookkeeping and recent spectra.
#[derive(Clone, Debug, Default)]
pub struct AnimationState {
    /// Slow baseline of whole-frame energy.
    pub avg_energy: f32,
    /// Independent baseline of input-layer energy.
    pub m_avg: f32,
    pub last_rewire: Option<Duration>,
    history: VecDeque<Vec<f32>>,
}

impl AnimationState {
    /// Most recent frame first, at most `HISTORY_DEPTH` entries.
    pub fn history(&self) -> &VecDeque<Vec<f32>> {
        &self.history
    }

    fn push_history(&mut self, frame: &[f32]) {
        self.history.push_front(frame.to_vec());
        self.history.truncate(HISTORY_DEPTH);
    }

    fn cooled_down(&self, now: Duration, cooldown_ms: u64) -> bool {
        self.last_rewire
            .map_or(true, |t| now.saturating_sub(t) >= Duration::from_millis(cooldown_ms))
    }

    /// Whole-frame drop check; compares against the average before it absorbs `current`.
    fn frame_energy_dropped(&self, current: f32, now: Duration) -> bool {
        current < self.avg_energy * FRAME_DROP_RATIO
            && self.avg_energy > FRAME_DROP_FLOOR
            && self.cooled_down(now, FRAME_DROP_COOLDOWN_MS)
    }

    fn absorb_frame_energy(&mut self, current: f32) {
        self.avg_energy = self.avg_energy * ENERGY_AVG_KEEP + current * (1.0 - ENERGY_AVG_KEEP);
    }

    /// Input-layer drop check; the average absorbs `energy` first.
    fn input_energy_dropped(&mut self, energy: f32, now: Duration) -> bool {
        if self.m_avg == 0.0 {
            self.m_avg = energy;
        }
        self.m_avg = self.m_avg * ENERGY_AVG_KEEP + energy * (1.0 - ENERGY_AVG_KEEP);
        self.m_avg > INPUT_DROP_FLOOR
            && energy / self.m_avg < INPUT_DROP_RATIO
            && self.cooled_down(now, INPUT_DROP_COOLDOWN_MS)
    }
}

#[derive(Debug, Default)]
pub struct PropagationAnimator {
    mode: VizMode,
    state: AnimationState,
}

impl PropagationAnimator {
    pub fn new(mode: VizMode) -> Self {
        Self {
            mode,
            state: AnimationState::default(),
        }
    }

    pub fn mode(&self) -> VizMode {
        self.mode
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Switch strategy and forget all accumulated energy.
    pub fn set_viz_mode(&mut self, mode: VizMode, topology: Option<&mut Topology>) {
        self.mode = mode;
        self.state = AnimationState::default();
        if let Some(topology) = topology {
            for node in topology.layers.iter_mut().flatten() {
                node.amplitude = 0.0;
                node.value = 0.0;
            }
        }
        log::info!("[animator] mode={mode}");
    }

    /// Advance one tick. Returns false when there was no frame to consume.
    pub fn update_from_audio_data<S: Scene>(
        &mut self,
        frame: Option<&AudioFrame>,
        renderer: &mut GraphRenderer<S>,
        effects: &mut EffectsEngine,
        now: Duration,
    ) -> bool {
        let Some(frame) = frame else {
            return false;
        };
        if let Some(elapsed) = frame.elapsed_seconds {
            renderer.update_timer(&format_timer(elapsed));
        }

        let current = frame.mean_energy();
        let frame_drop = self.mode == VizMode::Random && self.state.frame_energy_dropped(current, now);
        self.state.absorb_frame_energy(current);
        self.state.push_history(&frame.spectral_magnitudes);

        let Some((topology, scene)) = renderer.split_mut() else {
            return true;
        };
        if frame_drop {
            log::debug!("[animator] frame energy drop {current:.1} vs {:.1}", self.state.avg_energy);
            self.rewire(effects, topology, now);
        }

        let input_energy = inject(topology, frame);
        if self.state.input_energy_dropped(input_energy, now) {
            log::debug!("[animator] input energy drop {input_energy:.1} vs {:.1}", self.state.m_avg);
            self.rewire(effects, topology, now);
        }

        propagate(topology, frame, now);
        paint(topology, scene);
        true
    }

    fn rewire(&mut self, effects: &mut EffectsEngine, topology: &mut Topology, now: Duration) {
        effects.rewire_weights(topology);
        self.state.last_rewire = Some(now);
    }
}

/// Fill the input layer from equal-width slices of the 50Hz..8kHz band.
/// Returns the mean injected amplitude.
pub fn inject(topology: &mut Topology, frame: &AudioFrame) -> f32 {
    let Some(input) = topology.layers.first_mut() else {
        return 0.0;
    };
    if input.is_empty() {
        return 0.0;
    }
    let (start, chunk) = match frame.bin_hz() {
        Some(bin_hz) => {
            let start = (BAND_LOW_HZ / bin_hz).floor() as usize;
            let end = (BAND_HIGH_HZ / bin_hz).floor() as usize;
            (start, end.saturating_sub(start) / input.len())
        }
        None => (0, 0),
    };
    let data = &frame.spectral_magnitudes;
    let mut total = 0.0;
    for (i, node) in input.iter_mut().enumerate() {
        // Bins past the end of the data count as silence.
        let from = (start + i * chunk).min(data.len());
        let to = (start + (i + 1) * chunk).min(data.len());
        let sum: f32 = data[from..to].iter().map(|v| v.max(0.0)).sum();
        node.amplitude = sum / chunk.max(1) as f32;
        total += node.amplitude;
    }
    total / input.len() as f32
}

/// Push input energy through every transition, easing weights on the way,
/// and style each edge from the energy it carried this tick.
fn propagate(topology: &mut Topology, frame: &AudioFrame, now: Duration) {
    let seconds = now.as_secs_f32();
    let bins = frame.spectral_magnitudes.len();
    for edge in &mut topology.edges {
        edge.style = EdgeStyle::BASELINE;
    }
    for l in 0..topology.layers.len().saturating_sub(1) {
        let layer_factor = topology.density.layer(l);
        let hue = layer_hue(l);
        let mut inputs = vec![0.0f32; topology.layers[l + 1].len()];
        for src in 0..topology.layers[l].len() {
            let source = &topology.layers[l][src];
            let amplitude = source.amplitude;
            let range = source.out_edges.clone();
            let Some(out) = topology.edges.get_mut(range) else {
                continue;
            };
            for edge in out {
                edge.ease_toward_target();
                let energy = amplitude * edge.weight;
                if let Some(slot) = inputs.get_mut(edge.to.index) {
                    *slot += energy;
                }
                if amplitude <= SOURCE_ACTIVE_THRESHOLD {
                    continue;
                }
                edge.style = if energy > EDGE_ACTIVE_THRESHOLD {
                    let phase = edge
                        .spectral_bin(bins)
                        .map_or(0.0, |b| frame.spectral_magnitudes[b].max(0.0) % DASH_PERIOD);
                    active_edge_style(energy * layer_factor, hue, seconds, phase)
                } else {
                    EdgeStyle::INACTIVE
                };
            }
        }
        for (node, energy) in topology.layers[l + 1].iter_mut().zip(inputs) {
            node.amplitude = energy;
        }
    }
    for node in topology.layers.iter_mut().flatten() {
        node.value += (node.amplitude - node.value) * NODE_VALUE_EASE;
    }
}

fn paint<S: Scene>(topology: &mut Topology, scene: &mut S) {
    for edge in &topology.edges {
        scene.set_edge_style(edge.id, &edge.style);
    }
    for (l, layer) in topology.layers.iter_mut().enumerate() {
        let factor = topology.density.node(l);
        for node in layer {
            node.style = node_style(node.value.max(0.0), factor, layer_hue(l));
            scene.set_node_style(node.id, &node.style);
        }
    }
}

pub fn active_edge_style(compensated: f32, hue: f32, seconds: f32, phase: f32) -> EdgeStyle {
    let ratio = (compensated / EDGE_ENERGY_FULL_SCALE).min(1.0);
    let speed = 1.0 + ratio * DASH_SPEED_GAIN;
    let offset = (seconds * DASH_BASE_SPEED * speed + phase) % DASH_PERIOD;
    let light =
        EDGE_LIGHT_BASE + (compensated / EDGE_LIGHT_SCALE * EDGE_LIGHT_SPAN).min(EDGE_LIGHT_SPAN);
    EdgeStyle {
        stroke: Color::hsl(hue, 100.0, light),
        opacity: (ratio + EDGE_OPACITY_FLOOR).min(1.0),
        width: ratio * EDGE_MAX_WIDTH,
        dash_offset: -offset,
    }
}

/// Sub-linear size mapping so loud peaks do not swamp the canvas.
pub fn node_style(energy: f32, density: f32, hue: f32) -> NodeStyle {
    if energy <= NODE_ACTIVE_THRESHOLD {
        return NodeStyle::QUIET;
    }
    let compensated = energy * density;
    let light = NODE_LIGHT_BASE + (energy / NODE_LIGHT_DIVISOR).min(NODE_LIGHT_SPAN);
    let glow = (energy / GLOW_DIVISOR).powf(GLOW_EXPONENT).min(GLOW_MAX);
    NodeStyle {
        radius: compensated.sqrt() * NODE_RADIUS_GAIN + NODE_RADIUS_BASE,
        fill: Color::hsl(hue, 100.0, light),
        fill_opacity: 0.9,
        stroke: Color::hsl(hue, 100.0, 75.0),
        stroke_width: 1.0 + (energy / NODE_STROKE_DIVISOR).min(NODE_STROKE_SPAN),
        glow: Some(Glow {
            radius: glow,
            color: Color::hsl(hue, 100.0, 65.0),
        }),
    }
}
