//! Topology construction and drawing.
//!
//! `GraphRenderer` is the single owner of the topology and of the scene it is
//! drawn on. Effects and the animator mutate both through it on the same
//! thread.

use crate::config::{mix_seed, Viewport, Wiring};
use crate::constants::{TIMER_INSET_BOTTOM, TIMER_INSET_X};
use crate::error::TopologyError;
use crate::scene::{EdgeShape, EdgeStyle, NodeShape, NodeStyle, Scene};
use crate::topology::{DensityFactors, Edge, EdgeId, LayerSpec, Node, NodeId, Topology};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const TIMER_ZERO: &str = "00:00";

pub struct GraphRenderer<S: Scene> {
    scene: S,
    topology: Option<Topology>,
    wiring: Wiring,
    viewport: Viewport,
    rng: StdRng,
    generation: u64,
}

impl<S: Scene> GraphRenderer<S> {
    pub fn new(scene: S, wiring: Wiring, viewport: Viewport, seed: u64) -> Self {
        Self {
            scene,
            topology: None,
            wiring,
            viewport,
            rng: StdRng::seed_from_u64(mix_seed(seed, 1)),
            generation: 0,
        }
    }

    /// Rebuild topology and scene from a layer spec such as `"4,6,3"`.
    ///
    /// An unusable spec leaves the previous topology and drawing untouched.
    pub fn render(&mut self, layer_spec: &str) -> Result<&Topology, TopologyError> {
        let spec: LayerSpec = layer_spec.parse()?;
        self.generation += 1;
        let topology = Topology::build(
            &spec,
            self.viewport,
            self.wiring,
            &mut self.rng,
            self.generation,
        );
        draw(&mut self.scene, &topology);
        log::info!(
            "[render] layers={:?} edges={} size={}x{} gen={}",
            spec.sizes(),
            topology.edges.len(),
            topology.width,
            topology.height,
            topology.generation
        );
        Ok(self.topology.insert(topology))
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn topology_mut(&mut self) -> Option<&mut Topology> {
        self.topology.as_mut()
    }

    /// Topology and scene borrowed together for bulk updates.
    pub fn split_mut(&mut self) -> Option<(&mut Topology, &mut S)> {
        let topology = self.topology.as_mut()?;
        Some((topology, &mut self.scene))
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Generation of the current topology, if one has been built.
    pub fn generation(&self) -> Option<u64> {
        self.topology.as_ref().map(|t| t.generation)
    }

    pub fn density_factors(&self) -> Option<&DensityFactors> {
        self.topology.as_ref().map(|t| &t.density)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.topology.as_ref()?.node(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.topology.as_ref()?.edge(id)
    }

    /// Store and draw a new edge style. Returns false for unknown edges.
    pub fn style_edge(&mut self, id: EdgeId, style: EdgeStyle) -> bool {
        self.update_edge_style(id, |current| *current = style)
    }

    /// Store and draw a new node style. Returns false for unknown nodes.
    pub fn style_node(&mut self, id: NodeId, style: NodeStyle) -> bool {
        self.update_node_style(id, |current| *current = style)
    }

    /// Adjust part of an edge's style in place and redraw it.
    pub fn update_edge_style(&mut self, id: EdgeId, f: impl FnOnce(&mut EdgeStyle)) -> bool {
        let Some(edge) = self.topology.as_mut().and_then(|t| t.edge_mut(id)) else {
            return false;
        };
        f(&mut edge.style);
        self.scene.set_edge_style(id, &edge.style);
        true
    }

    /// Adjust part of a node's style in place and redraw it.
    pub fn update_node_style(&mut self, id: NodeId, f: impl FnOnce(&mut NodeStyle)) -> bool {
        let Some(node) = self.topology.as_mut().and_then(|t| t.node_mut(id)) else {
            return false;
        };
        f(&mut node.style);
        self.scene.set_node_style(id, &node.style);
        true
    }

    /// Return every shape to its neutral look and zero the timer.
    pub fn reset_visuals(&mut self) {
        if let Some(topology) = &mut self.topology {
            for node in topology.layers.iter_mut().flatten() {
                node.style = NodeStyle::RESTING;
                self.scene.set_node_style(node.id, &node.style);
            }
            for edge in &mut topology.edges {
                edge.style = EdgeStyle::RESTING;
                self.scene.set_edge_style(edge.id, &edge.style);
            }
        }
        self.update_timer(TIMER_ZERO);
    }

    pub fn update_timer(&mut self, text: &str) {
        self.scene.set_timer_text(text);
    }
}

fn draw<S: Scene>(scene: &mut S, topology: &Topology) {
    scene.clear();
    scene.set_view_box(topology.width, topology.height);
    for edge in &topology.edges {
        let (Some(from), Some(to)) = (topology.node(edge.from), topology.node(edge.to)) else {
            continue;
        };
        let shape = EdgeShape {
            id: edge.id,
            from: edge.from,
            to: edge.to,
            start: from.position,
            end: to.position,
        };
        scene.add_edge(&shape, &edge.style);
    }
    for node in topology.nodes() {
        let shape = NodeShape {
            id: node.id,
            center: node.position,
            label: node.label.clone(),
        };
        scene.add_node(&shape, &node.style);
    }
    scene.add_timer(
        Vec2::new(TIMER_INSET_X, topology.height - TIMER_INSET_BOTTOM),
        TIMER_ZERO,
    );
}

/// Format elapsed playback seconds as `mm:ss`.
pub fn format_timer(elapsed_seconds: f64) -> String {
    let total = if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
        elapsed_seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingScene;

    fn renderer() -> GraphRenderer<RecordingScene> {
        GraphRenderer::new(RecordingScene::new(), Wiring::Full, Viewport::new(1000.0), 3)
    }

    #[test]
    fn render_draws_every_shape() {
        let mut r = renderer();
        r.render("4,3,2").unwrap();
        let scene = r.scene();
        assert_eq!(scene.nodes.len(), 9);
        assert_eq!(scene.edges.len(), 18);
        assert_eq!(scene.timer.as_deref(), Some(TIMER_ZERO));
        assert_eq!(scene.view_box, Some((1000.0, 500.0)));
    }

    #[test]
    fn bad_spec_keeps_previous_topology() {
        let mut r = renderer();
        r.render("4,3").unwrap();
        let generation = r.generation();
        assert!(r.render("7").is_err());
        assert!(r.render("nope").is_err());
        assert_eq!(r.generation(), generation);
        assert_eq!(r.topology().unwrap().layer_sizes(), vec![4, 3]);
        assert_eq!(r.scene().clears, 1);
    }

    #[test]
    fn reset_visuals_restores_resting_styles() {
        let mut r = renderer();
        r.render("2,2").unwrap();
        assert!(r.style_edge(EdgeId(0), EdgeStyle::BASELINE));
        assert!(r.style_node(NodeId::new(1, 1), NodeStyle::QUIET));
        r.update_timer("01:02");
        r.reset_visuals();
        assert_eq!(r.scene().edge_style(EdgeId(0)), Some(&EdgeStyle::RESTING));
        assert_eq!(
            r.scene().node_style(NodeId::new(1, 1)),
            Some(&NodeStyle::RESTING)
        );
        assert_eq!(r.scene().timer.as_deref(), Some(TIMER_ZERO));
    }

    #[test]
    fn styling_unknown_ids_is_a_miss() {
        let mut r = renderer();
        assert!(!r.style_edge(EdgeId(0), EdgeStyle::BASELINE));
        r.render("2,2").unwrap();
        assert!(!r.style_edge(EdgeId(99), EdgeStyle::BASELINE));
        assert!(!r.style_node(NodeId::new(5, 0), NodeStyle::QUIET));
    }

    #[test]
    fn timer_formats_minutes_and_seconds() {
        assert_eq!(format_timer(0.0), "00:00");
        assert_eq!(format_timer(59.9), "00:59");
        assert_eq!(format_timer(61.0), "01:01");
        assert_eq!(format_timer(-3.0), "00:00");
        assert_eq!(format_timer(3600.0), "60:00");
    }
}
