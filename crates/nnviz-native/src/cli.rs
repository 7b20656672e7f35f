//! Command-line argument parsing.

use clap::Parser;
use nnviz_core::{VizMode, Wiring};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "nnviz-native")]
#[command(about = "Headless replay of the audio-reactive network visualizer", long_about = None)]
pub struct Args {
    /// Comma separated layer widths
    #[arg(long, value_name = "SPEC", default_value = "4,6,6,3")]
    pub layers: String,

    /// Number of frames to simulate
    #[arg(long, default_value = "600")]
    pub frames: u32,

    /// Simulated display refresh rate
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// Base seed for topology and effects
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Visualization mode: propagation (default) or random
    #[arg(long, default_value = "propagation")]
    pub mode: String,

    /// Drop edges that would carry less than 1% of a source's output
    #[arg(long)]
    pub pruned: bool,

    /// Run the auto-flow demo at this speed (0..=1000) instead of audio
    #[arg(long, value_name = "SPEED")]
    pub auto_flow: Option<u32>,

    /// Seconds between synthetic energy drops
    #[arg(long, value_name = "SECONDS", default_value = "2.5")]
    pub drop_every: f32,

    /// Log a layer energy summary every N frames
    #[arg(long, value_name = "N", default_value = "30")]
    pub report_every: u32,
}

impl Args {
    pub fn viz_mode(&self) -> anyhow::Result<VizMode> {
        Ok(self.mode.parse()?)
    }

    pub fn wiring(&self) -> Wiring {
        if self.pruned {
            Wiring::Pruned
        } else {
            Wiring::Full
        }
    }
}
