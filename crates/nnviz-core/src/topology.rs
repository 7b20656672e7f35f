//! Layered graph structure: typed ids, nodes, weighted edges and the
//! density factors derived from layer widths.

use crate::config::{Viewport, Wiring};
use crate::constants::*;
use crate::error::TopologyError;
use crate::scene::{Color, EdgeStyle, NodeStyle};
use fnv::FnvHashMap;
use glam::Vec2;
use rand::Rng;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Position of a node: layer index and offset within the layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub layer: usize,
    pub index: usize,
}

impl NodeId {
    pub const fn new(layer: usize, index: usize) -> Self {
        Self { layer, index }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.layer, self.index)
    }
}

/// Index into the topology's flat edge list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec2,
    /// Smoothed activation used for rendering.
    pub value: f32,
    /// Energy propagated this tick, unsmoothed.
    pub amplitude: f32,
    /// Outgoing edges, contiguous in `Topology::edges`.
    pub out_edges: Range<usize>,
    pub label: String,
    pub style: NodeStyle,
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f32,
    pub target_weight: f32,
    pub freq_seed: f32,
    pub style: EdgeStyle,
}

impl Edge {
    /// Move the current weight a fixed fraction toward the target, snapping
    /// once close enough. Never overshoots.
    pub fn ease_toward_target(&mut self) {
        let diff = self.target_weight - self.weight;
        if diff.abs() <= WEIGHT_SNAP_EPSILON {
            self.weight = self.target_weight;
        } else {
            self.weight += diff * WEIGHT_EASE;
        }
    }

    /// Spectral bin this edge listens to in a frame of `bins` magnitudes.
    pub fn spectral_bin(&self, bins: usize) -> Option<usize> {
        if bins == 0 {
            return None;
        }
        Some(((self.freq_seed * bins as f32) as usize).min(bins - 1))
    }
}

/// Parsed list of layer widths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSpec(Vec<usize>);

impl LayerSpec {
    pub fn sizes(&self) -> &[usize] {
        &self.0
    }
}

impl FromStr for LayerSpec {
    type Err = TopologyError;

    /// Comma separated positive integers. Each entry is read up to its first
    /// non-digit (`"6px"` is 6); entries without a leading integer are skipped.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let sizes: Vec<usize> = spec
            .split(',')
            .filter_map(leading_int)
            .filter(|&n| n > 0)
            .map(|n| n as usize)
            .collect();
        if sizes.len() < MIN_LAYERS {
            return Err(TopologyError::TooFewLayers {
                spec: spec.to_owned(),
                found: sizes.len(),
            });
        }
        Ok(LayerSpec(sizes))
    }
}

/// Leading integer of a trimmed entry, with an optional sign.
fn leading_int(part: &str) -> Option<i64> {
    let part = part.trim();
    let (negative, rest) = match part.as_bytes().first() {
        Some(b'-') => (true, &part[1..]),
        Some(b'+') => (false, &part[1..]),
        _ => (false, part),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    let value = digits.parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

/// Visual compensation for unequal layer widths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DensityFactors {
    /// One per layer transition, floored at `MIN_LAYER_DENSITY`.
    pub layer: Vec<f32>,
    /// One per layer, relative to the input layer.
    pub node: Vec<f32>,
}

impl DensityFactors {
    pub fn compute(sizes: &[usize]) -> Self {
        if sizes.len() < MIN_LAYERS || sizes[0] == 0 {
            return Self::default();
        }
        let base_lines = (sizes[0] * sizes[1]).max(1) as f32;
        let layer = sizes
            .windows(2)
            .map(|pair| ((pair[0] * pair[1]) as f32 / base_lines).max(MIN_LAYER_DENSITY))
            .collect();
        let input = sizes[0] as f32;
        let node = sizes.iter().map(|&n| n as f32 / input).collect();
        Self { layer, node }
    }

    /// Factor for the transition leaving `layer`; neutral when unknown.
    pub fn layer(&self, transition: usize) -> f32 {
        self.layer.get(transition).copied().unwrap_or(1.0)
    }

    pub fn node(&self, layer: usize) -> f32 {
        self.node.get(layer).copied().unwrap_or(1.0)
    }
}

/// Draw `n` uniform weights and divide by their sum.
pub fn fan_out_distribution<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f32> {
    // Accumulate in f64 so wide fan-outs still sum to one after the cast back.
    let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.into_iter().map(|w| (w / total) as f32).collect()
    } else {
        vec![1.0 / n as f32; n]
    }
}

#[derive(Clone, Debug)]
pub struct Topology {
    pub layers: Vec<Vec<Node>>,
    pub edges: Vec<Edge>,
    pub density: DensityFactors,
    pub width: f32,
    pub height: f32,
    /// Bumped on every rebuild; deferred effects compare against it.
    pub generation: u64,
    lookup: FnvHashMap<(NodeId, NodeId), EdgeId>,
}

impl Topology {
    pub fn build<R: Rng + ?Sized>(
        spec: &LayerSpec,
        viewport: Viewport,
        wiring: Wiring,
        rng: &mut R,
        generation: u64,
    ) -> Self {
        let sizes = spec.sizes();
        let width = viewport.layout_width();
        let height = viewport.layout_height();
        let layer_spacing = width / (sizes.len() + 1) as f32;

        let mut layers: Vec<Vec<Node>> = sizes
            .iter()
            .enumerate()
            .map(|(l, &count)| {
                let x = layer_spacing * (l + 1) as f32;
                let node_spacing = height / (count + 1) as f32;
                let color = LAYER_COLORS[l % LAYER_COLORS.len()];
                (0..count)
                    .map(|i| Node {
                        id: NodeId::new(l, i),
                        position: Vec2::new(x, node_spacing * (i + 1) as f32),
                        value: 0.0,
                        amplitude: 0.0,
                        out_edges: 0..0,
                        label: format!("{}{}", l + 1, i + 1),
                        style: NodeStyle {
                            stroke: Color::Hex(color),
                            ..NodeStyle::RESTING
                        },
                    })
                    .collect()
            })
            .collect();

        let mut edges = Vec::new();
        let mut lookup = FnvHashMap::default();
        for l in 0..layers.len() - 1 {
            let targets = layers[l + 1].len();
            for src in 0..layers[l].len() {
                let start = edges.len();
                let from = NodeId::new(l, src);
                for (dst, weight) in wired_weights(rng, targets, wiring) {
                    let id = EdgeId(edges.len());
                    let to = NodeId::new(l + 1, dst);
                    lookup.insert((from, to), id);
                    edges.push(Edge {
                        id,
                        from,
                        to,
                        weight,
                        target_weight: weight,
                        freq_seed: rng.gen::<f32>(),
                        style: EdgeStyle::RESTING,
                    });
                }
                layers[l][src].out_edges = start..edges.len();
            }
        }

        Self {
            density: DensityFactors::compute(sizes),
            layers,
            edges,
            width,
            height,
            generation,
            lookup,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.layers.get(id.layer)?.get(id.index)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.layers.get_mut(id.layer)?.get_mut(id.index)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0)
    }

    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.lookup.get(&(from, to)).and_then(|&id| self.edge(id))
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Vec::len).collect()
    }

    pub fn node_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.layers.iter().flatten()
    }

    /// Outgoing edges of `source`; empty for unknown nodes.
    pub fn outgoing(&self, source: NodeId) -> &[Edge] {
        match self.node(source) {
            Some(node) => &self.edges[node.out_edges.clone()],
            None => &[],
        }
    }
}

/// Destination index and normalized weight of every edge leaving one source.
fn wired_weights<R: Rng + ?Sized>(rng: &mut R, targets: usize, wiring: Wiring) -> Vec<(usize, f32)> {
    let weights = fan_out_distribution(rng, targets);
    match wiring {
        Wiring::Full => weights.into_iter().enumerate().collect(),
        Wiring::Pruned => {
            let mut kept: Vec<(usize, f32)> = weights
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, w)| w > PRUNE_SHARE)
                .collect();
            if kept.is_empty() {
                // Very wide targets: keep the strongest share so the source still fans out.
                if let Some(best) = weights
                    .iter()
                    .copied()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                {
                    kept.push(best);
                }
            }
            let total: f32 = kept.iter().map(|&(_, w)| w).sum();
            if total > 0.0 {
                for (_, w) in &mut kept {
                    *w /= total;
                }
            }
            kept
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(spec: &str, wiring: Wiring) -> Topology {
        let spec: LayerSpec = spec.parse().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        Topology::build(&spec, Viewport::new(1000.0), wiring, &mut rng, 1)
    }

    #[test]
    fn layer_spec_skips_bad_entries() {
        let spec: LayerSpec = " 4, x, -2, 0, 3 ,2".parse().unwrap();
        assert_eq!(spec.sizes(), &[4, 3, 2]);
        assert!(matches!(
            "5".parse::<LayerSpec>(),
            Err(TopologyError::TooFewLayers { found: 1, .. })
        ));
        assert!("".parse::<LayerSpec>().is_err());
        assert!("a,b,c".parse::<LayerSpec>().is_err());
        let spec: LayerSpec = "4.0,3".parse().unwrap();
        assert_eq!(spec.sizes(), &[4, 3]);
        let spec: LayerSpec = "6px, +2".parse().unwrap();
        assert_eq!(spec.sizes(), &[6, 2]);
        assert!("-4px,px3".parse::<LayerSpec>().is_err());
    }

    #[test]
    fn layout_spaces_layers_and_nodes_evenly() {
        let topo = build("3,2", Wiring::Full);
        assert_eq!(topo.height, WIDE_HEIGHT);
        let first = topo.node(NodeId::new(0, 0)).unwrap();
        let spacing = 1000.0 / 3.0;
        assert!((first.position.x - spacing).abs() < 1e-3);
        assert!((first.position.y - WIDE_HEIGHT / 4.0).abs() < 1e-3);
        let last = topo.node(NodeId::new(1, 1)).unwrap();
        assert!((last.position.x - 2.0 * spacing).abs() < 1e-3);
        assert_eq!(last.label, "22");
    }

    #[test]
    fn full_wiring_connects_every_pair() {
        let topo = build("4,3,2", Wiring::Full);
        assert_eq!(topo.edges.len(), 4 * 3 + 3 * 2);
        for node in topo.nodes().filter(|n| n.id.layer < 2) {
            let expected = topo.layers[node.id.layer + 1].len();
            assert_eq!(topo.outgoing(node.id).len(), expected);
        }
        let edge = topo
            .edge_between(NodeId::new(0, 3), NodeId::new(1, 2))
            .unwrap();
        assert_eq!(edge.from, NodeId::new(0, 3));
        assert!(topo.edge_between(NodeId::new(0, 0), NodeId::new(2, 0)).is_none());
    }

    #[test]
    fn pruned_wiring_still_sums_to_one() {
        let topo = build("3,300,2", Wiring::Pruned);
        for node in topo.nodes().filter(|n| n.id.layer < 2) {
            let out = topo.outgoing(node.id);
            assert!(!out.is_empty());
            let sum: f32 = out.iter().map(|e| e.weight).sum();
            assert!((sum - 1.0).abs() < 1e-4, "sum {sum} for {}", node.id);
            assert!(out.len() <= topo.layers[node.id.layer + 1].len());
        }
    }

    #[test]
    fn density_factors_follow_widths() {
        let density = DensityFactors::compute(&[4, 8, 4]);
        assert_eq!(density.layer, vec![1.0, 1.0]);
        assert_eq!(density.node, vec![1.0, 2.0, 1.0]);
        let density = DensityFactors::compute(&[4, 2, 1]);
        assert_eq!(density.layer, vec![1.0, MIN_LAYER_DENSITY]);
        assert_eq!(density.node, vec![1.0, 0.5, 0.25]);
        assert_eq!(density.layer(9), 1.0);
    }

    #[test]
    fn easing_snaps_without_overshoot() {
        let topo = build("1,2", Wiring::Full);
        let mut edge = topo.edges[0].clone();
        edge.weight = 0.2;
        edge.target_weight = 0.2005;
        edge.ease_toward_target();
        assert_eq!(edge.weight, 0.2005);
    }

    #[test]
    fn spectral_bin_is_in_range() {
        let topo = build("5,5", Wiring::Full);
        for edge in &topo.edges {
            let bin = edge.spectral_bin(128).unwrap();
            assert!(bin < 128);
            assert_eq!(edge.spectral_bin(128), Some(bin));
        }
        assert_eq!(topo.edges[0].spectral_bin(0), None);
    }
}
