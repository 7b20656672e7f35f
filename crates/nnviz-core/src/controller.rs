//! Top-level owner wiring UI intents to renderer, effects and animator.
//!
//! At most one of audio propagation, auto flow or the manual color pulse is
//! active. Starting one stops whichever was running and resets visuals first.

use crate::animator::{AudioFrame, AudioSource, PropagationAnimator, VizMode};
use crate::config::{Viewport, VizConfig};
use crate::effects::EffectsEngine;
use crate::renderer::GraphRenderer;
use crate::scene::Scene;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveMode {
    #[default]
    Idle,
    Audio,
    AutoFlow,
    ColorPulse,
}

pub struct Controller<S: Scene> {
    renderer: GraphRenderer<S>,
    effects: EffectsEngine,
    animator: PropagationAnimator,
    active: ActiveMode,
    layer_spec: Option<String>,
}

impl<S: Scene> Controller<S> {
    pub fn new(scene: S, config: VizConfig) -> Self {
        Self {
            renderer: GraphRenderer::new(scene, config.wiring, config.viewport, config.seed),
            effects: EffectsEngine::new(config.seed),
            animator: PropagationAnimator::new(VizMode::default()),
            active: ActiveMode::Idle,
            layer_spec: None,
        }
    }

    /// Rebuild from a layer spec. Unusable specs keep the current graph.
    pub fn render(&mut self, layer_spec: &str) -> bool {
        match self.renderer.render(layer_spec) {
            Ok(_) => {
                self.layer_spec = Some(layer_spec.to_owned());
                true
            }
            Err(e) => {
                log::debug!("[controller] keeping previous topology: {e}");
                false
            }
        }
    }

    /// Adopt a new surface size and rebuild with the last accepted spec.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        self.renderer.set_viewport(viewport);
        match self.layer_spec.clone() {
            Some(spec) => self.render(&spec),
            None => false,
        }
    }

    pub fn layer_spec(&self) -> Option<&str> {
        self.layer_spec.as_deref()
    }

    pub fn set_viz_mode(&mut self, mode: VizMode) {
        self.animator.set_viz_mode(mode, self.renderer.topology_mut());
    }

    pub fn viz_mode(&self) -> VizMode {
        self.animator.mode()
    }

    pub fn active(&self) -> ActiveMode {
        self.active
    }

    pub fn randomize_connection_colors(&mut self) {
        self.stop_active();
        self.effects.randomize_connection_colors(&mut self.renderer);
        self.active = ActiveMode::ColorPulse;
    }

    pub fn start_auto_flow(&mut self, speed: Option<u32>, now: Duration) {
        self.stop_active();
        self.effects.start_auto_flow(speed, now);
        self.active = ActiveMode::AutoFlow;
    }

    /// Apply a new speed; restarts the flow only if it is running.
    pub fn set_auto_flow_speed(&mut self, speed: u32, now: Duration) {
        if self.active == ActiveMode::AutoFlow {
            self.effects.start_auto_flow(Some(speed), now);
        }
    }

    pub fn stop_auto_flow(&mut self) {
        if self.active == ActiveMode::AutoFlow {
            self.stop_active();
        }
    }

    /// Toggle the flow demo, returning whether it is now running.
    pub fn toggle_auto_flow(&mut self, speed: Option<u32>, now: Duration) -> bool {
        if self.active == ActiveMode::AutoFlow {
            self.stop_auto_flow();
            false
        } else {
            self.start_auto_flow(speed, now);
            true
        }
    }

    /// Enter audio mode with fresh moving averages.
    pub fn start_audio(&mut self) {
        self.stop_active();
        self.set_viz_mode(self.viz_mode());
        self.active = ActiveMode::Audio;
    }

    pub fn stop_audio(&mut self) {
        if self.active == ActiveMode::Audio {
            self.stop_active();
        }
    }

    /// Per-tick audio entry point. Returns false when there was no frame.
    pub fn update_from_audio_data(&mut self, frame: Option<&AudioFrame>, now: Duration) -> bool {
        self.animator
            .update_from_audio_data(frame, &mut self.renderer, &mut self.effects, now)
    }

    pub fn reset_visuals(&mut self) {
        self.renderer.reset_visuals();
    }

    /// Run one display frame. Returns whether another frame should be requested.
    pub fn frame<A: AudioSource + ?Sized>(&mut self, now: Duration, audio: &mut A) -> bool {
        match self.active {
            ActiveMode::Audio => {
                let frame = audio.current_frame();
                self.update_from_audio_data(frame.as_ref(), now)
            }
            ActiveMode::AutoFlow => {
                self.effects.poll(&mut self.renderer, now);
                true
            }
            ActiveMode::Idle | ActiveMode::ColorPulse => false,
        }
    }

    fn stop_active(&mut self) {
        self.effects.stop_auto_flow();
        if self.active != ActiveMode::Idle {
            log::info!("[controller] stopping {:?}", self.active);
        }
        self.renderer.reset_visuals();
        self.active = ActiveMode::Idle;
    }

    pub fn renderer(&self) -> &GraphRenderer<S> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut GraphRenderer<S> {
        &mut self.renderer
    }

    pub fn effects(&self) -> &EffectsEngine {
        &self.effects
    }

    pub fn animator(&self) -> &PropagationAnimator {
        &self.animator
    }

    pub fn scene(&self) -> &S {
        self.renderer.scene()
    }
}
