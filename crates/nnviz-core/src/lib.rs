//! Audio-reactive layered network visualization engine.
//!
//! Platform independent: front-ends supply a [`Scene`] to draw on and an
//! [`AudioSource`] to read spectra from, then call [`Controller::frame`] once
//! per display refresh.

pub mod animator;
pub mod config;
pub mod constants;
pub mod controller;
pub mod effects;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod scheduler;
pub mod topology;

pub use animator::*;
pub use config::*;
pub use controller::*;
pub use effects::*;
pub use error::*;
pub use renderer::*;
pub use scene::*;
pub use scheduler::*;
pub use topology::*;
