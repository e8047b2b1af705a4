//! Higher or Lower core crate.
//!
//! Game logic for the number-comparison drill: round generation with a forced
//! equal pair every fifth round, answer evaluation against the selected
//! "greater than" / "less than" mode, and the ten-win streak with its
//! celebration. Rendering, audio playback and styling live in the page; it
//! drives the game through the exports in `web` (wasm32) and reacts to the
//! `GameEvent`s the session emits.
//!
//! Everything outside `web` is host-independent and tested natively.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod speech;
pub mod storage;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::GameConfig;
pub use error::{GameError, Result, StorageError};
pub use game::evaluator::{evaluate, evaluate_raw};
pub use game::round::{generate, RandomSource, RngSource};
pub use game::streak::{StreakEvent, StreakTracker};
pub use game::{EventSink, GameEvent, GameSession, Phase, Submission};
pub use model::{Answer, ComparisonMode, HintReason, Language, RoundNumbers, MAX_NUMBER};
pub use schedule::{ManualScheduler, Scheduler, Timer, TimerHandle};
pub use storage::{GameStore, KeyValueStore, MemoryStore};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}
