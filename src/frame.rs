use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// `requestAnimationFrame` loop that keeps running only while its step asks
/// for another frame. `request` restarts it after it went idle.
pub struct FrameLoop {
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
    pending: Cell<bool>,
}

impl FrameLoop {
    pub fn new(mut step: impl FnMut() -> bool + 'static) -> Rc<Self> {
        let frames = Rc::new(Self {
            tick: RefCell::new(None),
            pending: Cell::new(false),
        });
        let weak: Weak<Self> = Rc::downgrade(&frames);
        *frames.tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            let Some(frames) = weak.upgrade() else {
                return;
            };
            frames.pending.set(false);
            if step() {
                frames.request();
            }
        }) as Box<dyn FnMut()>));
        frames
    }

    /// Schedule the next frame unless one is already queued.
    pub fn request(&self) {
        if self.pending.get() {
            return;
        }
        let tick = self.tick.borrow();
        let (Some(window), Some(tick)) = (web::window(), tick.as_ref()) else {
            return;
        };
        if window
            .request_animation_frame(tick.as_ref().unchecked_ref())
            .is_ok()
        {
            self.pending.set(true);
        }
    }
}
