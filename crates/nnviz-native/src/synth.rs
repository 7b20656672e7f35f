use nnviz_core::{AudioFrame, AudioSource};
use rand::prelude::*;

pub const SAMPLE_RATE: f32 = 44_100.0;
pub const WINDOW_SIZE: usize = 2048;
const BINS: usize = WINDOW_SIZE / 2;
const PEAK_LEVEL: f32 = 220.0; // byte-scale magnitude at the sweep centre
const FLOOR_LEVEL: f32 = 40.0;
const NOISE: f32 = 12.0;
const SWEEP_PERIOD_S: f64 = 4.0;
const DROP_LENGTH_S: f64 = 0.3;
const DROP_GAIN: f32 = 0.15; // energy kept during a drop

/// Deterministic stand-in for an analyser: a spectral peak sweeping through
/// the bass band, with short quiet gaps to exercise onset rewiring.
pub struct SyntheticSpectrum {
    rng: StdRng,
    frame_dt: f64,
    frame: u64,
    drop_every: f64,
    remaining: u64,
}

impl SyntheticSpectrum {
    pub fn new(seed: u64, fps: u32, drop_every: f32, frames: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            frame_dt: 1.0 / f64::from(fps.max(1)),
            frame: 0,
            drop_every: f64::from(drop_every.max(0.1)),
            remaining: u64::from(frames),
        }
    }

    fn in_drop(&self, t: f64) -> bool {
        t > self.drop_every && t % self.drop_every < DROP_LENGTH_S
    }

    fn level(&mut self, bin: usize, centre: f64, gain: f32) -> f32 {
        let distance = (bin as f64 - centre).abs() / 24.0;
        let peak = PEAK_LEVEL * (-distance * distance).exp() as f32;
        let noise = self.rng.gen_range(-NOISE..NOISE);
        ((FLOOR_LEVEL + peak + noise) * gain).clamp(0.0, 255.0)
    }
}

impl AudioSource for SyntheticSpectrum {
    fn current_frame(&mut self) -> Option<AudioFrame> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let t = self.frame as f64 * self.frame_dt;
        self.frame += 1;
        let phase = (t / SWEEP_PERIOD_S * std::f64::consts::TAU).sin() * 0.5 + 0.5;
        let centre = 4.0 + phase * 170.0;
        let gain = if self.in_drop(t) { DROP_GAIN } else { 1.0 };
        let spectral_magnitudes = (0..BINS).map(|bin| self.level(bin, centre, gain)).collect();
        Some(AudioFrame {
            spectral_magnitudes,
            sample_rate: SAMPLE_RATE,
            window_size: WINDOW_SIZE,
            elapsed_seconds: Some(t),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_out_after_requested_frames() {
        let mut synth = SyntheticSpectrum::new(1, 60, 2.5, 3);
        assert!(synth.current_frame().is_some());
        assert!(synth.current_frame().is_some());
        assert!(synth.current_frame().is_some());
        assert!(synth.current_frame().is_none());
    }

    #[test]
    fn drops_lower_the_frame_energy() {
        let mut synth = SyntheticSpectrum::new(7, 10, 1.0, 20);
        let frames: Vec<AudioFrame> = std::iter::from_fn(|| synth.current_frame()).collect();
        let loud = frames[5].mean_energy();
        // t = 1.1s falls inside the first drop
        let quiet = frames[11].mean_energy();
        assert!(quiet < loud * 0.5, "quiet {quiet} vs loud {loud}");
    }
}
