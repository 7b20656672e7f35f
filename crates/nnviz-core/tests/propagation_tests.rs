// Host-side integration tests for topology construction and energy propagation.

use nnviz_core::constants::layer_hue;
use nnviz_core::*;
use std::time::Duration;

fn make_controller(spec: &str) -> Controller<RecordingScene> {
    let mut controller = Controller::new(
        RecordingScene::new(),
        VizConfig {
            viewport: Viewport::new(1200.0),
            ..VizConfig::default()
        },
    );
    assert!(controller.render(spec), "spec {spec:?} should build");
    controller
}

fn uniform_frame(level: f32) -> AudioFrame {
    AudioFrame {
        spectral_magnitudes: vec![level; 1024],
        sample_rate: 44_100.0,
        window_size: 2048,
        elapsed_seconds: None,
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn topology(controller: &Controller<RecordingScene>) -> &Topology {
    controller.renderer().topology().unwrap()
}

#[test]
fn outgoing_weights_sum_to_one_after_build() {
    for spec in ["2,2", "3,2", "4,6,3", "1,32,8,1", "16,4,16,4", "7,1"] {
        let controller = make_controller(spec);
        let topo = topology(&controller);
        for node in topo.nodes().filter(|n| n.id.layer + 1 < topo.layers.len()) {
            let out = topo.outgoing(node.id);
            let sum: f64 = out.iter().map(|e| e.weight as f64).sum();
            assert!(
                (sum - 1.0).abs() < 1e-6,
                "spec {spec}: source {} sums to {sum}",
                node.id
            );
            for edge in out {
                assert_eq!(edge.weight, edge.target_weight);
                assert!((0.0..=1.0).contains(&edge.weight));
                assert!((0.0..1.0).contains(&edge.freq_seed));
            }
        }
    }
}

#[test]
fn rewired_weights_converge_without_overshoot() {
    let mut controller = make_controller("4,5,3");
    let mut effects = EffectsEngine::new(99);
    effects.rewire_weights(controller.renderer_mut().topology_mut().unwrap());
    let initial: Vec<f32> = topology(&controller)
        .edges
        .iter()
        .map(|e| e.target_weight - e.weight)
        .collect();

    let silent = uniform_frame(0.0);
    let mut previous = initial.clone();
    for tick in 0..100 {
        controller.update_from_audio_data(Some(&silent), ms(tick * 16));
        let diffs: Vec<f32> = topology(&controller)
            .edges
            .iter()
            .map(|e| e.target_weight - e.weight)
            .collect();
        for (i, (now, before)) in diffs.iter().zip(&previous).enumerate() {
            assert!(
                now.abs() <= before.abs(),
                "edge {i} moved away from target at tick {tick}: {before} -> {now}"
            );
            assert!(
                *now == 0.0 || now.signum() == initial[i].signum(),
                "edge {i} overshot at tick {tick}"
            );
        }
        previous = diffs;
    }
    for (i, diff) in previous.iter().enumerate() {
        assert!(diff.abs() < 1e-2, "edge {i} still {diff} away after 100 ticks");
    }
}

#[test]
fn density_factors_are_bounded() {
    for spec in ["1,1", "10,1", "1,10", "8,2,2,30", "3,2,1", "50,50,50"] {
        let controller = make_controller(spec);
        let density = controller.renderer().density_factors().unwrap();
        assert_eq!(density.layer.len(), spec.split(',').count() - 1);
        for f in &density.layer {
            assert!(*f >= 0.7, "spec {spec}: layer factor {f}");
        }
        for f in &density.node {
            assert!(*f > 0.0, "spec {spec}: node factor {f}");
        }
    }
}

#[test]
fn injection_is_a_pure_function_of_the_frame() {
    let controller = make_controller("6,3");
    let mut a = topology(&controller).clone();
    let mut b = topology(&controller).clone();
    let frame = AudioFrame {
        spectral_magnitudes: (0..1024).map(|i| ((i * 37) % 255) as f32).collect(),
        sample_rate: 48_000.0,
        window_size: 2048,
        elapsed_seconds: Some(3.0),
    };
    let mean_a = inject(&mut a, &frame);
    let first: Vec<f32> = a.layers[0].iter().map(|n| n.amplitude).collect();
    let mean_again = inject(&mut a, &frame);
    let second: Vec<f32> = a.layers[0].iter().map(|n| n.amplitude).collect();
    let mean_b = inject(&mut b, &frame);
    let other: Vec<f32> = b.layers[0].iter().map(|n| n.amplitude).collect();
    assert_eq!(first, second);
    assert_eq!(first, other);
    assert_eq!(mean_a, mean_again);
    assert_eq!(mean_a, mean_b);
}

#[test]
fn silence_keeps_every_layer_at_rest() {
    let mut controller = make_controller("4,6,3");
    let silent = uniform_frame(0.0);
    for tick in 0..50 {
        assert!(controller.update_from_audio_data(Some(&silent), ms(tick * 16)));
    }
    let topo = topology(&controller);
    for node in topo.nodes() {
        assert_eq!(node.amplitude, 0.0, "node {} carries energy", node.id);
        assert!(controller.scene().node_style(node.id).unwrap().is_quiet());
    }
    for edge in &topo.edges {
        assert_eq!(controller.scene().edge_style(edge.id), Some(&EdgeStyle::BASELINE));
    }
    assert_eq!(controller.effects().rewire_count(), 0);
}

#[test]
fn two_layer_uniform_input_sums_over_sources() {
    let mut controller = make_controller("3,2");
    for edge in &mut controller.renderer_mut().topology_mut().unwrap().edges {
        edge.weight = 0.5;
        edge.target_weight = 0.5;
    }
    controller.update_from_audio_data(Some(&uniform_frame(10.0)), ms(0));
    let topo = topology(&controller);
    for node in &topo.layers[0] {
        assert!((node.amplitude - 10.0).abs() < 1e-4);
    }
    for node in &topo.layers[1] {
        assert!(
            (node.amplitude - 15.0).abs() < 1e-4,
            "output {} got {}",
            node.id,
            node.amplitude
        );
    }
}

#[test]
fn raw_amplitude_replaces_previous_tick() {
    let mut controller = make_controller("2,2");
    controller.update_from_audio_data(Some(&uniform_frame(80.0)), ms(0));
    controller.update_from_audio_data(Some(&uniform_frame(0.0)), ms(16));
    for node in &topology(&controller).layers[1] {
        assert_eq!(node.amplitude, 0.0);
    }
}

#[test]
fn loud_input_lights_nodes_and_edges() {
    let mut controller = make_controller("3,3");
    for tick in 0..30 {
        controller.update_from_audio_data(Some(&uniform_frame(120.0)), ms(tick * 16));
    }
    let scene = controller.scene();
    let topo = topology(&controller);
    for node in topo.nodes() {
        let style = scene.node_style(node.id).unwrap();
        assert!(!style.is_quiet(), "node {} stayed quiet", node.id);
        assert!(style.radius > 5.0);
        assert!(style.glow.is_some());
    }
    let active = topo.edges.iter().filter(|e| e.style.width > 0.5).count();
    assert!(active > 0, "expected some active edges");
    for edge in &topo.edges {
        assert!(edge.style.opacity <= 1.0);
        assert!(edge.style.width <= 8.0);
    }
}

#[test]
fn energy_drop_triggers_a_single_rewire() {
    let mut controller = make_controller("4,3");
    let loud = uniform_frame(100.0);
    let mut t = 0;
    for _ in 0..100 {
        controller.update_from_audio_data(Some(&loud), ms(t));
        t += 16;
    }
    assert_eq!(controller.effects().rewire_count(), 0);
    for _ in 0..3 {
        t += 1000;
        controller.update_from_audio_data(Some(&loud), ms(t));
    }
    t += 1000;
    controller.update_from_audio_data(Some(&uniform_frame(20.0)), ms(t));
    assert_eq!(controller.effects().rewire_count(), 1);

    t += 500;
    controller.update_from_audio_data(Some(&uniform_frame(20.0)), ms(t));
    assert_eq!(controller.effects().rewire_count(), 1);
}

#[test]
fn random_mode_rewires_once_per_drop() {
    let mut controller = make_controller("4,3");
    controller.set_viz_mode(VizMode::Random);
    let loud = uniform_frame(100.0);
    let mut t = 0;
    for _ in 0..100 {
        controller.update_from_audio_data(Some(&loud), ms(t));
        t += 16;
    }
    assert!(controller.animator().state().avg_energy > 95.0);
    t += 1000;
    controller.update_from_audio_data(Some(&uniform_frame(20.0)), ms(t));
    assert_eq!(controller.effects().rewire_count(), 1);
    t += 500;
    controller.update_from_audio_data(Some(&uniform_frame(20.0)), ms(t));
    assert_eq!(controller.effects().rewire_count(), 1);
}

#[test]
fn rebuild_keeps_counts_but_redraws_weights() {
    let mut controller = make_controller("4,3,2");
    let first = topology(&controller).clone();
    assert!(controller.render("4,3,2"));
    let second = topology(&controller);
    assert_eq!(first.layer_sizes(), second.layer_sizes());
    assert_eq!(first.edges.len(), second.edges.len());
    assert_eq!(first.node_count(), second.node_count());
    assert!(second.generation > first.generation);
    let differs = first
        .edges
        .iter()
        .zip(&second.edges)
        .any(|(a, b)| a.weight != b.weight);
    assert!(differs, "expected freshly drawn weights");
}

#[test]
fn timer_follows_elapsed_playback() {
    let mut controller = make_controller("2,2");
    let mut frame = uniform_frame(1.0);
    frame.elapsed_seconds = Some(125.4);
    controller.update_from_audio_data(Some(&frame), ms(0));
    assert_eq!(controller.scene().timer.as_deref(), Some("02:05"));
}

#[test]
fn missing_frame_changes_nothing() {
    let mut controller = make_controller("3,2");
    let writes = controller.scene().style_writes;
    assert!(!controller.update_from_audio_data(None, ms(0)));
    assert_eq!(controller.scene().style_writes, writes);
    assert!(controller.animator().state().history().is_empty());
}

fn hue_of(color: Color) -> Option<f32> {
    match color {
        Color::Hsl { hue, .. } => Some(hue),
        _ => None,
    }
}

fn lightness_of(color: Color) -> Option<f32> {
    match color {
        Color::Hsl { lightness, .. } => Some(lightness),
        _ => None,
    }
}

#[test]
fn node_radius_uses_layer_density() {
    use nnviz_core::constants::{NODE_ACTIVE_THRESHOLD, NODE_RADIUS_BASE, NODE_RADIUS_GAIN};

    let mut controller = make_controller("2,8");
    assert_eq!(controller.renderer().density_factors().unwrap().node, vec![1.0, 4.0]);
    for tick in 0..20 {
        controller.update_from_audio_data(Some(&uniform_frame(100.0)), ms(tick * 16));
    }
    let mut checked = 0;
    for node in topology(&controller).layers[1]
        .iter()
        .filter(|n| n.value > NODE_ACTIVE_THRESHOLD)
    {
        let style = controller.scene().node_style(node.id).unwrap();
        let expected = (node.value * 4.0).sqrt() * NODE_RADIUS_GAIN + NODE_RADIUS_BASE;
        assert!(
            (style.radius - expected).abs() < 1e-3,
            "node {} radius {} expected {expected}",
            node.id,
            style.radius
        );
        checked += 1;
    }
    assert!(checked > 0, "no active output node");
}

#[test]
fn narrowing_transition_uses_density_floor() {
    use nnviz_core::constants::*;

    let mut controller = make_controller("4,2,1");
    assert_eq!(
        controller.renderer().density_factors().unwrap().layer,
        vec![1.0, MIN_LAYER_DENSITY]
    );
    controller.update_from_audio_data(Some(&uniform_frame(5.0)), ms(0));
    let topo = topology(&controller);
    let mut checked = 0;
    for edge in topo.edges.iter().filter(|e| e.from.layer == 1) {
        let energy = topo.node(edge.from).unwrap().amplitude * edge.weight;
        if energy <= EDGE_ACTIVE_THRESHOLD {
            continue;
        }
        let compensated = energy * MIN_LAYER_DENSITY;
        assert!(compensated < EDGE_LIGHT_SCALE, "test level saturates lightness");
        let style = controller.scene().edge_style(edge.id).unwrap();
        let width = (compensated / EDGE_ENERGY_FULL_SCALE).min(1.0) * EDGE_MAX_WIDTH;
        let light = EDGE_LIGHT_BASE + compensated / EDGE_LIGHT_SCALE * EDGE_LIGHT_SPAN;
        assert!((style.width - width).abs() < 1e-5, "width {} vs {width}", style.width);
        let drawn = lightness_of(style.stroke).unwrap();
        assert!((drawn - light).abs() < 1e-3, "lightness {drawn} vs {light}");
        checked += 1;
    }
    assert!(checked > 0, "no active edge out of the middle layer");
}

#[test]
fn hues_follow_layer_index() {
    let mut controller = make_controller("2,2,2,2,2,2");
    for tick in 0..20 {
        controller.update_from_audio_data(Some(&uniform_frame(50.0)), ms(tick * 16));
    }
    let scene = controller.scene();
    let topo = topology(&controller);

    let mut nodes = 0;
    for node in topo.nodes() {
        let style = scene.node_style(node.id).unwrap();
        if style.is_quiet() {
            continue;
        }
        assert_eq!(hue_of(style.fill), Some(layer_hue(node.id.layer)), "node {}", node.id);
        nodes += 1;
    }
    assert!(nodes > 0);
    assert!(topo.layers[5]
        .iter()
        .any(|n| hue_of(scene.node_style(n.id).unwrap().fill) == Some(20.0)));

    let mut edges = 0;
    for edge in &topo.edges {
        if let Some(hue) = hue_of(scene.edge_style(edge.id).unwrap().stroke) {
            assert_eq!(hue, layer_hue(edge.from.layer), "edge {:?}", edge.id);
            edges += 1;
        }
    }
    assert!(edges > 0);
}
