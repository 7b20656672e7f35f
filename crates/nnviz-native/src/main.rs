use clap::Parser;
use nnviz_core::{Controller, RecordingScene, Topology, Viewport, VizConfig};
use std::time::Duration;

mod cli;
mod synth;

use cli::Args;
use synth::SyntheticSpectrum;

fn layer_energy(topology: &Topology) -> Vec<f32> {
    topology
        .layers
        .iter()
        .map(|layer| {
            let total: f32 = layer.iter().map(|n| n.amplitude).sum();
            total / layer.len().max(1) as f32
        })
        .collect()
}

fn report(controller: &Controller<RecordingScene>, now: Duration) {
    let Some(topology) = controller.renderer().topology() else {
        return;
    };
    let energy: Vec<String> = layer_energy(topology)
        .iter()
        .map(|e| format!("{e:.1}"))
        .collect();
    let scene = controller.scene();
    log::info!(
        "[replay] t={:.2}s timer={} rewires={} decays={} energy=[{}]",
        now.as_secs_f64(),
        scene.timer.as_deref().unwrap_or("-"),
        controller.effects().rewire_count(),
        controller.effects().pending_decays(),
        energy.join(", ")
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let mode = args.viz_mode()?;
    let config = VizConfig {
        wiring: args.wiring(),
        viewport: Viewport::default(),
        seed: args.seed,
    };
    let mut controller = Controller::new(RecordingScene::new(), config);
    if !controller.render(&args.layers) {
        anyhow::bail!("unusable layer spec {:?}", args.layers);
    }
    controller.set_viz_mode(mode);
    {
        let topology = controller
            .renderer()
            .topology()
            .ok_or_else(|| anyhow::anyhow!("no topology after render"))?;
        log::info!(
            "[replay] layers={:?} nodes={} edges={} mode={mode}",
            topology.layer_sizes(),
            topology.node_count(),
            topology.edges.len()
        );
    }

    let mut source = SyntheticSpectrum::new(args.seed, args.fps, args.drop_every, args.frames);
    match args.auto_flow {
        Some(speed) => controller.start_auto_flow(Some(speed), Duration::ZERO),
        None => controller.start_audio(),
    }

    let frame_dt = Duration::from_secs_f64(1.0 / f64::from(args.fps.max(1)));
    let report_every = args.report_every.max(1);
    let mut now = Duration::ZERO;
    for i in 0..args.frames {
        now = frame_dt * i;
        if !controller.frame(now, &mut source) {
            log::info!("[replay] source exhausted after {i} frames");
            break;
        }
        if i % report_every == 0 {
            report(&controller, now);
        }
    }
    report(&controller, now);
    log::info!(
        "[replay] done rewires={} active={:?}",
        controller.effects().rewire_count(),
        controller.active()
    );
    Ok(())
}
