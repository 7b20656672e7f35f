//! Drawing-surface abstraction.
//!
//! The renderer never talks to a concrete graphics API. It pushes shapes and
//! whole-style snapshots through [`Scene`]; the web front-end turns them into
//! SVG elements while tests and the native replay keep them in a
//! [`RecordingScene`].

use crate::topology::{EdgeId, NodeId};
use fnv::FnvHashMap;
use glam::Vec2;
use std::fmt;

/// Paint value understood by every surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Color {
    Hex(&'static str),
    Rgba([u8; 3], f32),
    Hsl {
        hue: f32,
        saturation: f32,
        lightness: f32,
    },
}

impl Color {
    pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        Color::Hsl {
            hue,
            saturation,
            lightness,
        }
    }
}

impl fmt::Display for Color {
    /// CSS notation, usable directly as an SVG paint.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Hex(hex) => f.write_str(hex),
            Color::Rgba([r, g, b], a) => write!(f, "rgba({r}, {g}, {b}, {a})"),
            Color::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({hue:.0}, {saturation:.0}%, {lightness:.1}%)"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
    pub radius: f32,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
    pub stroke: Color,
    pub opacity: f32,
    pub width: f32,
    pub dash_offset: f32,
}

impl EdgeStyle {
    /// Neutral look after `reset_visuals` and right after a build.
    pub const RESTING: EdgeStyle = EdgeStyle {
        stroke: Color::Rgba([255, 255, 255], 0.05),
        opacity: 0.1,
        width: 0.5,
        dash_offset: 0.0,
    };
    /// Applied to every edge at the start of a propagation tick.
    pub const BASELINE: EdgeStyle = EdgeStyle {
        stroke: Color::Rgba([255, 255, 255], 0.02),
        opacity: 0.02,
        width: 0.1,
        dash_offset: 0.0,
    };
    /// A carrying edge whose energy stayed under the activity threshold.
    pub const INACTIVE: EdgeStyle = EdgeStyle {
        stroke: Color::Rgba([255, 255, 255], 0.01),
        opacity: 0.02,
        width: 0.5,
        dash_offset: 0.0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
    pub radius: f32,
    pub fill: Color,
    pub fill_opacity: f32,
    pub stroke: Color,
    pub stroke_width: f32,
    pub glow: Option<Glow>,
}

impl NodeStyle {
    pub const RESTING: NodeStyle = NodeStyle {
        radius: crate::constants::RESTING_RADIUS,
        fill: Color::Rgba([22, 33, 62], 0.7),
        fill_opacity: 1.0,
        stroke: Color::Hex("#00f2fe"),
        stroke_width: 2.0,
        glow: None,
    };
    /// Node below the activity threshold during propagation.
    pub const QUIET: NodeStyle = NodeStyle {
        radius: crate::constants::RESTING_RADIUS,
        fill: Color::Rgba([22, 33, 62], 0.5),
        fill_opacity: 0.3,
        stroke: Color::Rgba([0, 242, 254], 0.2),
        stroke_width: 1.0,
        glow: None,
    };

    pub fn is_quiet(&self) -> bool {
        *self == NodeStyle::QUIET || *self == NodeStyle::RESTING
    }
}

/// Geometry of a connection line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeShape {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub start: Vec2,
    pub end: Vec2,
}

/// Geometry of a node circle with its label.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
    pub id: NodeId,
    pub center: Vec2,
    pub label: String,
}

/// Generic 2D scene-graph surface the renderer draws onto.
pub trait Scene {
    /// Remove every shape.
    fn clear(&mut self);
    fn set_view_box(&mut self, width: f32, height: f32);
    fn add_edge(&mut self, shape: &EdgeShape, style: &EdgeStyle);
    fn add_node(&mut self, shape: &NodeShape, style: &NodeStyle);
    fn add_timer(&mut self, position: Vec2, text: &str);
    /// Unknown ids are ignored.
    fn set_edge_style(&mut self, id: EdgeId, style: &EdgeStyle);
    /// Unknown ids are ignored.
    fn set_node_style(&mut self, id: NodeId, style: &NodeStyle);
    fn set_timer_text(&mut self, text: &str);
}

/// In-memory surface that keeps the latest style of every shape.
#[derive(Debug, Default)]
pub struct RecordingScene {
    pub view_box: Option<(f32, f32)>,
    pub edges: FnvHashMap<EdgeId, (EdgeShape, EdgeStyle)>,
    pub nodes: FnvHashMap<NodeId, (NodeShape, NodeStyle)>,
    pub timer: Option<String>,
    pub clears: usize,
    pub style_writes: usize,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_style(&self, id: EdgeId) -> Option<&EdgeStyle> {
        self.edges.get(&id).map(|(_, style)| style)
    }

    pub fn node_style(&self, id: NodeId) -> Option<&NodeStyle> {
        self.nodes.get(&id).map(|(_, style)| style)
    }
}

impl Scene for RecordingScene {
    fn clear(&mut self) {
        self.edges.clear();
        self.nodes.clear();
        self.timer = None;
        self.clears += 1;
    }

    fn set_view_box(&mut self, width: f32, height: f32) {
        self.view_box = Some((width, height));
    }

    fn add_edge(&mut self, shape: &EdgeShape, style: &EdgeStyle) {
        self.edges.insert(shape.id, (*shape, *style));
    }

    fn add_node(&mut self, shape: &NodeShape, style: &NodeStyle) {
        self.nodes.insert(shape.id, (shape.clone(), *style));
    }

    fn add_timer(&mut self, _position: Vec2, text: &str) {
        self.timer = Some(text.to_owned());
    }

    fn set_edge_style(&mut self, id: EdgeId, style: &EdgeStyle) {
        if let Some((_, current)) = self.edges.get_mut(&id) {
            *current = *style;
            self.style_writes += 1;
        }
    }

    fn set_node_style(&mut self, id: NodeId, style: &NodeStyle) {
        if let Some((_, current)) = self.nodes.get_mut(&id) {
            *current = *style;
            self.style_writes += 1;
        }
    }

    fn set_timer_text(&mut self, text: &str) {
        if let Some(timer) = &mut self.timer {
            text.clone_into(timer);
        }
    }
}
