//! Non-audio visual effects and weight rewiring.

use crate::config::mix_seed;
use crate::constants::*;
use crate::renderer::GraphRenderer;
use crate::scene::{Color, Glow, Scene};
use crate::scheduler::Scheduler;
use crate::topology::{fan_out_distribution, EdgeId, NodeId, Topology};
use rand::prelude::*;
use smallvec::SmallVec;
use std::time::Duration;

/// Timing of the auto-flow demo for one speed setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoFlow {
    speed: u32,
}

impl AutoFlow {
    /// `speed` is clamped to `0..=1000`.
    pub fn new(speed: u32) -> Self {
        Self {
            speed: speed.min(AUTO_FLOW_MAX_SPEED),
        }
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn interval(&self) -> Duration {
        let ms = AUTO_FLOW_BASE_INTERVAL_MS
            .saturating_sub(u64::from(self.speed))
            .max(AUTO_FLOW_MIN_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    fn is_fast(&self) -> bool {
        self.speed > AUTO_FLOW_FAST_SPEED
    }

    pub fn batch_size(&self) -> usize {
        if self.is_fast() {
            AUTO_FLOW_FAST_BATCH
        } else {
            AUTO_FLOW_SLOW_BATCH
        }
    }

    pub fn decay_delay(&self) -> Duration {
        Duration::from_millis(if self.is_fast() {
            AUTO_FLOW_FAST_DECAY_MS
        } else {
            AUTO_FLOW_SLOW_DECAY_MS
        })
    }
}

impl Default for AutoFlow {
    fn default() -> Self {
        Self::new(AUTO_FLOW_DEFAULT_SPEED)
    }
}

/// Dims a flashed edge and its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashDecay {
    pub edge: EdgeId,
}

pub struct EffectsEngine {
    rng: StdRng,
    auto_flow: Option<AutoFlow>,
    scheduler: Scheduler<FlashDecay>,
    rewires: u64,
}

impl EffectsEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(mix_seed(seed, 2)),
            auto_flow: None,
            scheduler: Scheduler::new(),
            rewires: 0,
        }
    }

    /// Paint each edge and its endpoints with a random palette color.
    pub fn randomize_connection_colors<S: Scene>(&mut self, renderer: &mut GraphRenderer<S>) {
        let Some(topology) = renderer.topology() else {
            return;
        };
        let picks: Vec<(EdgeId, NodeId, NodeId, Color)> = topology
            .edges
            .iter()
            .map(|e| (e.id, e.from, e.to, random_color(&mut self.rng)))
            .collect();
        for (edge, from, to, color) in picks {
            renderer.update_edge_style(edge, |s| {
                s.stroke = color;
                s.width = 2.5;
                s.opacity = 0.8;
            });
            for node in [from, to] {
                renderer.update_node_style(node, |s| {
                    s.stroke = color;
                    s.fill = color;
                    s.fill_opacity = 0.2;
                });
            }
        }
    }

    /// Begin (or restart) the timer-driven flow demo.
    pub fn start_auto_flow(&mut self, speed: Option<u32>, now: Duration) {
        let flow = speed.map(AutoFlow::new).unwrap_or_default();
        self.scheduler.start_ticks(now, flow.interval());
        self.auto_flow = Some(flow);
        log::info!(
            "[effects] auto flow speed={} interval={:?} batch={}",
            flow.speed(),
            flow.interval(),
            flow.batch_size()
        );
    }

    /// Stop the demo and drop any flash still waiting to decay.
    pub fn stop_auto_flow(&mut self) {
        if self.auto_flow.take().is_some() {
            log::info!("[effects] auto flow stopped");
        }
        self.scheduler.cancel_all();
    }

    pub fn auto_flow(&self) -> Option<AutoFlow> {
        self.auto_flow
    }

    pub fn pending_decays(&self) -> usize {
        self.scheduler.pending()
    }

    /// Run every flow tick and flash decay that came due by `now`.
    pub fn poll<S: Scene>(&mut self, renderer: &mut GraphRenderer<S>, now: Duration) {
        if let Some(flow) = self.auto_flow {
            for _ in 0..self.scheduler.due_ticks(now) {
                self.flash_batch(renderer, flow, now);
            }
        }
        let current = renderer.generation();
        for deferred in self.scheduler.drain_due(now) {
            if Some(deferred.generation) != current {
                continue;
            }
            decay_flash(renderer, deferred.event);
        }
    }

    fn flash_batch<S: Scene>(&mut self, renderer: &mut GraphRenderer<S>, flow: AutoFlow, now: Duration) {
        let Some(topology) = renderer.topology() else {
            return;
        };
        if topology.edges.is_empty() {
            return;
        }
        let generation = topology.generation;
        let batch: SmallVec<[(EdgeId, NodeId, NodeId); 5]> = (0..flow.batch_size())
            .filter_map(|_| topology.edges.choose(&mut self.rng))
            .map(|e| (e.id, e.from, e.to))
            .collect();
        for (edge, from, to) in batch {
            let color = random_color(&mut self.rng);
            renderer.update_edge_style(edge, |s| {
                s.stroke = color;
                s.opacity = 1.0;
                s.width = 2.5;
            });
            for node in [from, to] {
                renderer.update_node_style(node, |s| {
                    s.fill = color;
                    s.fill_opacity = 0.5;
                    s.glow = Some(Glow {
                        radius: FLASH_GLOW,
                        color,
                    });
                });
            }
            self.scheduler
                .schedule(now + flow.decay_delay(), generation, FlashDecay { edge });
        }
    }

    /// Draw a fresh normalized distribution for every source and store it as
    /// the edges' target weights. Current weights ease toward it later.
    pub fn rewire_weights(&mut self, topology: &mut Topology) {
        let sources: Vec<std::ops::Range<usize>> = topology
            .nodes()
            .map(|n| n.out_edges.clone())
            .filter(|r| !r.is_empty())
            .collect();
        for range in sources {
            let targets = fan_out_distribution(&mut self.rng, range.len());
            for (edge, target) in topology.edges[range].iter_mut().zip(targets) {
                edge.target_weight = target;
            }
        }
        self.rewires += 1;
        log::debug!(
            "[effects] rewired gen={} total={}",
            topology.generation,
            self.rewires
        );
    }

    pub fn rewire_count(&self) -> u64 {
        self.rewires
    }
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    Color::Hex(PREMIUM_COLORS[rng.gen_range(0..PREMIUM_COLORS.len())])
}

fn decay_flash<S: Scene>(renderer: &mut GraphRenderer<S>, decay: FlashDecay) {
    let Some((from, to)) = renderer.edge(decay.edge).map(|e| (e.from, e.to)) else {
        return;
    };
    renderer.update_edge_style(decay.edge, |s| {
        s.opacity = 0.15;
        s.width = 1.5;
    });
    for node in [from, to] {
        renderer.update_node_style(node, |s| {
            s.fill_opacity = 0.1;
            s.glow = None;
        });
    }
}
