//! Numerical progression engine for "the Particle", a browser idle game.
//!
//! All simulation lives behind [`engine::ParticleGame`]: generator
//! cascades, the three-layer reset ladder, autobuyers, offline replay
//! and versioned persistence. The crate is UI-agnostic; the `web`
//! module binds the engine to the browser through wasm-bindgen, and
//! everything below it runs identically on native for tests.

pub mod autobuyer;
pub mod cost;
pub mod engine;
pub mod format;
pub mod offline;
pub mod prestige;
pub mod production;
pub mod save;
pub mod state;
pub mod storage;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod web;

mod simulator;

pub use engine::{ActionError, ParticleGame, PrestigeOutcome, PurchaseOutcome};
pub use offline::OfflineReport;
pub use state::{GameState, Notation};
pub use storage::{KeyValueStore, MemoryStore};
pub use tuning::Tuning;
