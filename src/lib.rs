#![cfg(target_arch = "wasm32")]
use instant::Instant;
use nnviz_core::{Controller, Viewport, VizConfig, VizMode, Wiring};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod dom;
mod frame;
mod svg;

use audio::{Playback, WebAudioSource};
use frame::FrameLoop;
use svg::SvgScene;

const SVG_ID: &str = "nnSvg";
const STRUCTURE_ID: &str = "nnStructure";
const RANDOM_BTN_ID: &str = "nnRandomBtn";
const AUTO_BTN_ID: &str = "nnAutoBtn";
const SPEED_ID: &str = "nnSpeed";
const MODE_ID: &str = "nnMode";
const MUSIC_BTN_ID: &str = "nnMusicBtn";
const MUSIC_SELECT_ID: &str = "musicSelect";
const MUSIC_FILE_ID: &str = "musicFile";

const DEFAULT_LAYERS: &str = "4,6,6,3";
const DEFAULT_TRACK: &str = "music.mp3";

enum Track {
    Url(String),
    File(web::File),
}

/// Everything the DOM handlers and the frame loop share.
struct App {
    document: web::Document,
    controller: RefCell<Controller<SvgScene>>,
    audio: RefCell<WebAudioSource>,
    epoch: Instant,
}

impl App {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn step(&self) -> bool {
        let now = self.now();
        let mut audio = self.audio.borrow_mut();
        self.controller.borrow_mut().frame(now, &mut *audio)
    }

    fn speed(&self) -> Option<u32> {
        dom::input_value(&self.document, SPEED_ID)?.trim().parse().ok()
    }

    fn render_structure(&self) {
        let spec = dom::input_value(&self.document, STRUCTURE_ID)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LAYERS.to_string());
        self.controller.borrow_mut().render(&spec);
    }

    fn resize(&self) {
        let mut controller = self.controller.borrow_mut();
        let width = controller.scene().client_width();
        controller.resize(Viewport::new(width));
    }

    fn stop_music(&self) {
        self.audio.borrow_mut().stop();
        self.controller.borrow_mut().stop_audio();
        self.update_buttons();
    }

    fn update_buttons(&self) {
        let music = if self.audio.borrow().is_active() {
            "⏹ STOP MUSIC"
        } else {
            "▶ PLAY MUSIC"
        };
        dom::set_text(&self.document, MUSIC_BTN_ID, music);
        let flowing = self.controller.borrow().effects().auto_flow().is_some();
        let auto = if flowing { "⏸ STOP FLOW" } else { "⚡ AUTO FLOW" };
        dom::set_text(&self.document, AUTO_BTN_ID, auto);
    }
}

async fn load(track: &Track) -> anyhow::Result<Playback> {
    let bytes = match track {
        Track::Url(url) => audio::fetch_bytes(url).await?,
        Track::File(file) => audio::file_bytes(file).await?,
    };
    Playback::start(bytes).await
}

fn play(app: &Rc<App>, frames: &Rc<FrameLoop>, track: Track) {
    let session = app.audio.borrow_mut().begin();
    app.controller.borrow_mut().stop_auto_flow();
    app.update_buttons();

    let app = app.clone();
    let frames = frames.clone();
    spawn_local(async move {
        match load(&track).await {
            Ok(playback) => {
                if app.audio.borrow_mut().attach(session, playback) {
                    app.controller.borrow_mut().start_audio();
                    frames.request();
                }
            }
            Err(e) => {
                log::error!("[audio] cannot play track: {e:?}");
                if app.audio.borrow().is_current(session) {
                    app.stop_music();
                }
            }
        }
    });
}

fn wire_controls(app: &Rc<App>, frames: &Rc<FrameLoop>) {
    let document = &app.document;

    let a = app.clone();
    dom::add_listener(document, STRUCTURE_ID, "input", move || a.render_structure());

    let a = app.clone();
    dom::add_click_listener(document, RANDOM_BTN_ID, move || {
        a.audio.borrow_mut().stop();
        a.controller.borrow_mut().randomize_connection_colors();
        a.update_buttons();
    });

    let (a, f) = (app.clone(), frames.clone());
    dom::add_click_listener(document, AUTO_BTN_ID, move || {
        a.audio.borrow_mut().stop();
        let speed = a.speed();
        let now = a.now();
        if a.controller.borrow_mut().toggle_auto_flow(speed, now) {
            f.request();
        }
        a.update_buttons();
    });

    let a = app.clone();
    dom::add_listener(document, SPEED_ID, "input", move || {
        if let Some(speed) = a.speed() {
            let now = a.now();
            a.controller.borrow_mut().set_auto_flow_speed(speed, now);
        }
    });

    let a = app.clone();
    dom::add_listener(document, MODE_ID, "change", move || {
        let Some(value) = dom::select_value(&a.document, MODE_ID) else {
            return;
        };
        match value.parse::<VizMode>() {
            Ok(mode) => a.controller.borrow_mut().set_viz_mode(mode),
            Err(e) => log::warn!("[controls] {e}"),
        }
    });

    let (a, f) = (app.clone(), frames.clone());
    dom::add_click_listener(document, MUSIC_BTN_ID, move || {
        if a.audio.borrow().is_active() {
            a.stop_music();
            return;
        }
        match dom::select_value(&a.document, MUSIC_SELECT_ID).as_deref() {
            Some("custom") => dom::click(&a.document, MUSIC_FILE_ID),
            _ => play(&a, &f, Track::Url(DEFAULT_TRACK.to_string())),
        }
    });

    let a = app.clone();
    dom::add_listener(document, MUSIC_SELECT_ID, "change", move || {
        if dom::select_value(&a.document, MUSIC_SELECT_ID).as_deref() == Some("custom") {
            dom::click(&a.document, MUSIC_FILE_ID);
        }
    });

    let (a, f) = (app.clone(), frames.clone());
    dom::add_listener(document, MUSIC_FILE_ID, "change", move || {
        if let Some(file) = dom::selected_file(&a.document, MUSIC_FILE_ID) {
            log::info!("[audio] loading {}", file.name());
            play(&a, &f, Track::File(file));
        }
    });

    let a = app.clone();
    dom::add_window_listener("resize", move || a.resize());
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("nnviz-web starting");

    if let Err(e) = init() {
        log::error!("init error: {:?}", e);
    }
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let root = document
        .get_element_by_id(SVG_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{SVG_ID}"))?;

    let scene = SvgScene::new(document.clone(), root);
    let config = VizConfig {
        wiring: Wiring::Full,
        viewport: Viewport::new(scene.client_width()),
        seed: rand::random(),
    };
    log::info!("[init] seed={} width={:.0}", config.seed, config.viewport.width);

    let app = Rc::new(App {
        document,
        controller: RefCell::new(Controller::new(scene, config)),
        audio: RefCell::new(WebAudioSource::default()),
        epoch: Instant::now(),
    });
    app.render_structure();

    let step_app = app.clone();
    let frames = FrameLoop::new(move || step_app.step());
    wire_controls(&app, &frames);
    app.update_buttons();
    Ok(())
}
