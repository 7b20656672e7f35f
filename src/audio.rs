use instant::Instant;
use js_sys::ArrayBuffer;
use nnviz_core::{AudioFrame, AudioSource};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub const FFT_SIZE: u32 = 2048; // analyser window; yields 1024 byte bins

fn js_err(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}

/// Fetch an audio file into memory.
pub async fn fetch_bytes(url: &str) -> anyhow::Result<ArrayBuffer> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let response: web::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_err)?
        .dyn_into()
        .map_err(js_err)?;
    if !response.ok() {
        anyhow::bail!("fetch {url} failed with status {}", response.status());
    }
    let body = JsFuture::from(response.array_buffer().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    body.dyn_into().map_err(js_err)
}

/// Read a user-selected file into memory.
pub async fn file_bytes(file: &web::File) -> anyhow::Result<ArrayBuffer> {
    let body = JsFuture::from(file.array_buffer()).await.map_err(js_err)?;
    body.dyn_into().map_err(js_err)
}

/// A decoded track looping through an analyser to the speakers.
pub struct Playback {
    ctx: web::AudioContext,
    source: web::AudioBufferSourceNode,
    analyser: web::AnalyserNode,
    started: Instant,
}

impl Playback {
    pub async fn start(bytes: ArrayBuffer) -> anyhow::Result<Self> {
        let ctx = web::AudioContext::new().map_err(js_err)?;
        let decoded = JsFuture::from(ctx.decode_audio_data(&bytes).map_err(js_err)?)
            .await
            .map_err(js_err)?;
        let buffer: web::AudioBuffer = decoded.dyn_into().map_err(js_err)?;

        let source = ctx.create_buffer_source().map_err(js_err)?;
        source.set_buffer(Some(&buffer));
        source.set_loop(true);

        let analyser = create_analyser(&ctx)?;
        source.connect_with_audio_node(&analyser).map_err(js_err)?;
        analyser
            .connect_with_audio_node(&ctx.destination())
            .map_err(js_err)?;
        source.start().map_err(js_err)?;
        log::info!(
            "[audio] playing {:.1}s at {} Hz",
            buffer.duration(),
            ctx.sample_rate()
        );
        Ok(Self {
            ctx,
            source,
            analyser,
            started: Instant::now(),
        })
    }

    fn stop(self) {
        _ = self.source.stop();
        _ = self.ctx.close();
        log::info!("[audio] stopped");
    }
}

fn create_analyser(ctx: &web::AudioContext) -> anyhow::Result<web::AnalyserNode> {
    let analyser = ctx.create_analyser().map_err(js_err)?;
    analyser.set_fft_size(FFT_SIZE);
    Ok(analyser)
}

/// [`AudioSource`] reading byte spectra from the current playback.
///
/// Loading is asynchronous, so each `begin` hands out a session number and a
/// playback that finishes decoding after `stop` was requested is discarded.
#[derive(Default)]
pub struct WebAudioSource {
    playback: Option<Playback>,
    session: u64,
    active: bool,
    bins: Vec<u8>,
}

impl WebAudioSource {
    pub fn begin(&mut self) -> u64 {
        self.stop();
        self.active = true;
        self.session
    }

    pub fn is_current(&self, session: u64) -> bool {
        self.active && self.session == session
    }

    /// Adopt a finished playback. Returns false if it arrived too late.
    pub fn attach(&mut self, session: u64, playback: Playback) -> bool {
        if !self.is_current(session) {
            playback.stop();
            return false;
        }
        self.bins = vec![0; playback.analyser.frequency_bin_count() as usize];
        self.playback = Some(playback);
        true
    }

    pub fn stop(&mut self) {
        self.session += 1;
        self.active = false;
        if let Some(playback) = self.playback.take() {
            playback.stop();
        }
    }

    /// Loading or playing.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl AudioSource for WebAudioSource {
    fn current_frame(&mut self) -> Option<AudioFrame> {
        let playback = self.playback.as_ref()?;
        playback.analyser.get_byte_frequency_data(&mut self.bins);
        Some(AudioFrame {
            spectral_magnitudes: self.bins.iter().map(|&b| f32::from(b)).collect(),
            sample_rate: playback.ctx.sample_rate(),
            window_size: playback.analyser.fft_size() as usize,
            elapsed_seconds: Some(playback.started.elapsed().as_secs_f64()),
        })
    }
}
