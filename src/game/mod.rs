//! Memory game module — card and deck types, the session state machine,
//! scoring, timers, and the HTML fragments the page swaps in.
//! The session lives in WASM memory (thread_local) for the lifetime of the
//! Web Worker.

pub mod card;
pub mod config;
pub mod deck;
pub mod render;
pub mod rng;
pub mod score;
pub mod session;
pub mod state;
pub mod timer;
