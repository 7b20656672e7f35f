use fnv::FnvHashMap;
use glam::Vec2;
use nnviz_core::{EdgeId, EdgeShape, EdgeStyle, NodeId, NodeShape, NodeStyle, Scene};
use web_sys as web;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// [`Scene`] backed by live elements under an `<svg>` root.
pub struct SvgScene {
    document: web::Document,
    root: web::Element,
    edges: FnvHashMap<EdgeId, web::Element>,
    nodes: FnvHashMap<NodeId, web::Element>,
    timer: Option<web::Element>,
}

impl SvgScene {
    pub fn new(document: web::Document, root: web::Element) -> Self {
        Self {
            document,
            root,
            edges: FnvHashMap::default(),
            nodes: FnvHashMap::default(),
            timer: None,
        }
    }

    /// Rendered width of the `<svg>` element in CSS pixels.
    pub fn client_width(&self) -> f32 {
        self.root.get_bounding_client_rect().width() as f32
    }

    fn create(&self, tag: &str) -> Option<web::Element> {
        match self.document.create_element_ns(Some(SVG_NS), tag) {
            Ok(el) => Some(el),
            Err(e) => {
                log::warn!("[svg] create <{tag}> failed: {e:?}");
                None
            }
        }
    }

    fn append(&self, el: &web::Element) {
        _ = self.root.append_child(el);
    }
}

fn set_attrs(el: &web::Element, attrs: &[(&str, String)]) {
    for (name, value) in attrs {
        _ = el.set_attribute(name, value);
    }
}

fn point_attrs(prefix_x: &'static str, prefix_y: &'static str, p: Vec2) -> [(&'static str, String); 2] {
    [(prefix_x, format!("{:.2}", p.x)), (prefix_y, format!("{:.2}", p.y))]
}

fn edge_css(style: &EdgeStyle) -> String {
    format!(
        "stroke:{};opacity:{};stroke-width:{};stroke-dashoffset:{}",
        style.stroke, style.opacity, style.width, style.dash_offset
    )
}

fn node_css(style: &NodeStyle) -> String {
    let filter = match style.glow {
        Some(glow) => format!("drop-shadow(0 0 {}px {})", glow.radius, glow.color),
        None => "none".to_string(),
    };
    format!(
        "fill:{};fill-opacity:{};stroke:{};stroke-width:{}px;filter:{}",
        style.fill, style.fill_opacity, style.stroke, style.stroke_width, filter
    )
}

impl Scene for SvgScene {
    fn clear(&mut self) {
        self.root.set_inner_html("");
        self.edges.clear();
        self.nodes.clear();
        self.timer = None;
    }

    fn set_view_box(&mut self, width: f32, height: f32) {
        _ = self
            .root
            .set_attribute("viewBox", &format!("0 0 {width} {height}"));
    }

    fn add_edge(&mut self, shape: &EdgeShape, style: &EdgeStyle) {
        let Some(line) = self.create("line") else {
            return;
        };
        set_attrs(&line, &point_attrs("x1", "y1", shape.start));
        set_attrs(&line, &point_attrs("x2", "y2", shape.end));
        set_attrs(
            &line,
            &[
                ("id", format!("line-{}-{}", shape.from, shape.to)),
                ("class", "conn-line".to_string()),
                ("stroke-dasharray", "10 5".to_string()),
                ("stroke-linecap", "round".to_string()),
                ("style", edge_css(style)),
            ],
        );
        self.append(&line);
        self.edges.insert(shape.id, line);
    }

    fn add_node(&mut self, shape: &NodeShape, style: &NodeStyle) {
        let (Some(group), Some(circle), Some(label)) =
            (self.create("g"), self.create("circle"), self.create("text"))
        else {
            return;
        };
        set_attrs(&circle, &point_attrs("cx", "cy", shape.center));
        set_attrs(
            &circle,
            &[
                ("id", format!("node-{}", shape.id)),
                ("class", "node".to_string()),
                ("r", style.radius.to_string()),
                ("style", node_css(style)),
            ],
        );
        set_attrs(&label, &point_attrs("x", "y", shape.center));
        set_attrs(
            &label,
            &[
                ("class", "node-label".to_string()),
                ("text-anchor", "middle".to_string()),
                ("dominant-baseline", "central".to_string()),
            ],
        );
        label.set_text_content(Some(&shape.label));
        _ = group.append_child(&circle);
        _ = group.append_child(&label);
        self.append(&group);
        self.nodes.insert(shape.id, circle);
    }

    fn add_timer(&mut self, position: Vec2, text: &str) {
        let Some(timer) = self.create("text") else {
            return;
        };
        set_attrs(&timer, &point_attrs("x", "y", position));
        set_attrs(
            &timer,
            &[
                ("text-anchor", "start".to_string()),
                ("fill", "#00f2fe".to_string()),
                ("fill-opacity", "0.8".to_string()),
                ("font-family", "'Courier New', monospace".to_string()),
                ("font-size", "20px".to_string()),
                ("font-weight", "bold".to_string()),
            ],
        );
        timer.set_text_content(Some(text));
        self.append(&timer);
        self.timer = Some(timer);
    }

    fn set_edge_style(&mut self, id: EdgeId, style: &EdgeStyle) {
        if let Some(line) = self.edges.get(&id) {
            _ = line.set_attribute("style", &edge_css(style));
        }
    }

    fn set_node_style(&mut self, id: NodeId, style: &NodeStyle) {
        if let Some(circle) = self.nodes.get(&id) {
            _ = circle.set_attribute("r", &style.radius.to_string());
            _ = circle.set_attribute("style", &node_css(style));
        }
    }

    fn set_timer_text(&mut self, text: &str) {
        if let Some(timer) = &self.timer {
            timer.set_text_content(Some(text));
        }
    }
}
