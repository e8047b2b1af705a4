//! Browser bridge: wasm-bindgen exports over one thread-local session.
//!
//! The page calls the exported functions from its button handlers and
//! listens for `CustomEvent`s on `document` (`round-started`,
//! `result-ready`, `streak-completed`, ...). Each event's `detail` is the
//! JSON form of [`GameEvent`].
//!
//! Events are queued while the session is borrowed and dispatched after the
//! borrow ends, so a listener may call straight back into these exports.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::{debug, error, warn};
use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, StorageEvent, window};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::evaluator;
use crate::game::round::RngSource;
use crate::game::{GameEvent, GameSession, Submission};
use crate::model::Answer;
use crate::schedule::{Scheduler, Timer, TimerHandle};
use crate::storage::LocalStorageStore;

type BrowserSession = GameSession<LocalStorageStore, RngSource<StdRng>, BrowserScheduler, Vec<GameEvent>>;

thread_local! {
    static SESSION: RefCell<Option<BrowserSession>> = const { RefCell::new(None) };
    static STORAGE_LISTENER: Cell<bool> = const { Cell::new(false) };
}

/// `setTimeout`-backed scheduler. Fired timers re-enter the session through
/// [`with_session`].
///
/// Each pending timeout owns its closure, so cancelling frees it. A fired
/// closure cannot be dropped while it runs; it is parked in `spent` and freed
/// on the next scheduling call.
#[derive(Debug, Default)]
pub struct BrowserScheduler {
    next_id: u64,
    timeouts: HashMap<TimerHandle, (i32, Closure<dyn FnMut()>)>,
    spent: Vec<Closure<dyn FnMut()>>,
}

impl BrowserScheduler {
    fn forget(&mut self, handle: TimerHandle) {
        if let Some((_, closure)) = self.timeouts.remove(&handle) {
            self.spent.push(closure);
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn after(&mut self, delay_ms: u32, timer: Timer) -> TimerHandle {
        self.spent.clear();
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let callback: Closure<dyn FnMut()> = Closure::once(move || {
            if let Err(e) = with_session(|s| {
                s.scheduler_mut().forget(handle);
                s.on_timer(handle, timer);
            }) {
                debug!("timer {timer:?} dropped: {e}");
            }
        });
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay,
            )
        }) {
            Some(Ok(id)) => {
                self.timeouts.insert(handle, (id, callback));
            }
            _ => warn!("could not schedule {timer:?}"),
        }
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some((id, _closure)) = self.timeouts.remove(&handle) {
            if let Some(w) = window() {
                w.clear_timeout_with_handle(id);
            }
        }
    }
}

/// Run `f` against the live session, then dispatch whatever it emitted.
fn with_session<T>(f: impl FnOnce(&mut BrowserSession) -> T) -> Result<T, GameError> {
    let (out, events) = SESSION.with(|cell| {
        let mut guard = cell
            .try_borrow_mut()
            .map_err(|_| GameError::Web("session busy".into()))?;
        let session = guard
            .as_mut()
            .ok_or_else(|| GameError::Web("game not started".into()))?;
        let out = f(session);
        let events = std::mem::take(session.sink_mut());
        Ok::<_, GameError>((out, events))
    })?;
    for event in events {
        dispatch(&event);
    }
    Ok(out)
}

fn dispatch(event: &GameEvent) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    let detail = match serde_json::to_string(event) {
        Ok(json) => JsValue::from_str(&json),
        Err(e) => {
            error!("could not encode {}: {e}", event.name());
            return;
        }
    };
    let init = CustomEventInit::new();
    init.set_detail(&detail);
    match CustomEvent::new_with_event_init_dict(event.name(), &init) {
        Ok(custom) => {
            if doc.dispatch_event(&custom).is_err() {
                warn!("dispatch of {} failed", event.name());
            }
        }
        Err(e) => warn!("could not create {} event: {e:?}", event.name()),
    }
}

/// Resync preferences when another tab writes `localStorage`.
fn install_storage_listener() -> Result<(), JsValue> {
    if STORAGE_LISTENER.with(|installed| installed.replace(true)) {
        return Ok(());
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let closure = Closure::wrap(Box::new(move |evt: StorageEvent| {
        if let Some(key) = evt.key() {
            if let Err(e) = with_session(|s| s.on_storage_changed(&key)) {
                debug!("storage change for '{key}' dropped: {e}");
            }
        }
    }) as Box<dyn FnMut(_)>);
    win.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    launch(GameConfig::default())
}

/// Start with rule/timing overrides given as a (partial) JSON object.
#[wasm_bindgen]
pub fn start_game_with_config(config_json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(config_json).inspect_err(|e| error!("{e}"))?;
    launch(config)
}

fn launch(config: GameConfig) -> Result<(), JsValue> {
    stop_game();
    let session = GameSession::new(
        config,
        LocalStorageStore::new(),
        RngSource::from_entropy(),
        BrowserScheduler::default(),
        Vec::new(),
    )?;
    SESSION.with(|cell| cell.replace(Some(session)));
    install_storage_listener()?;
    with_session(|s| s.start())?;
    Ok(())
}

/// Tear down the running session, cancelling its timers.
#[wasm_bindgen]
pub fn stop_game() {
    if let Err(e) = with_session(|s| s.teardown()) {
        debug!("stop_game: {e}");
    }
    SESSION.with(|cell| cell.replace(None));
}

/// `answer` is one of `"higher"` (True), `"lower"` (False), `"equal"`.
/// Returns `"ignored"`, `"hint"`, `"won"` or `"lost"`.
#[wasm_bindgen]
pub fn submit_answer(answer: &str) -> Result<String, JsValue> {
    let answer = answer.parse::<Answer>().inspect_err(|e| error!("round aborted: {e}"))?;
    let outcome = with_session(|s| s.submit_answer(answer))?;
    Ok(match outcome {
        Submission::Ignored => "ignored",
        Submission::Hint => "hint",
        Submission::Scored { won: true } => "won",
        Submission::Scored { won: false } => "lost",
    }
    .to_string())
}

#[wasm_bindgen]
pub fn set_mode(mode: &str) -> Result<(), JsValue> {
    with_session(|s| s.set_mode_name(mode))??;
    Ok(())
}

#[wasm_bindgen]
pub fn countdown_complete() -> Result<(), JsValue> {
    Ok(with_session(|s| s.on_countdown_complete())?)
}

#[wasm_bindgen]
pub fn celebration_done() -> Result<(), JsValue> {
    Ok(with_session(|s| s.on_celebration_done())?)
}

#[wasm_bindgen]
pub fn manual_reset() -> Result<(), JsValue> {
    Ok(with_session(|s| s.manual_reset())?)
}

#[wasm_bindgen]
pub fn set_player_name(name: &str) -> Result<(), JsValue> {
    with_session(|s| s.set_player_name(name))??;
    Ok(())
}

#[wasm_bindgen]
pub fn set_language(code: &str) -> Result<(), JsValue> {
    with_session(|s| s.set_language_code(code))??;
    Ok(())
}

#[wasm_bindgen]
pub fn set_text_to_speech(enabled: bool) -> Result<(), JsValue> {
    Ok(with_session(|s| s.set_text_to_speech(enabled))?)
}

#[wasm_bindgen]
pub fn set_music(enabled: bool) -> Result<(), JsValue> {
    Ok(with_session(|s| s.set_music(enabled))?)
}

#[wasm_bindgen]
pub fn current_streak() -> Result<u8, JsValue> {
    Ok(with_session(|s| s.streak())?)
}

#[wasm_bindgen]
pub fn player_name() -> Result<String, JsValue> {
    Ok(with_session(|s| s.player_name().to_string())?)
}

/// Stateless check, e.g. for the result screen's explanation.
#[wasm_bindgen]
pub fn evaluate_answer(left: u16, right: u16, answer: &str, mode: &str) -> Result<bool, JsValue> {
    Ok(evaluator::evaluate_raw(left, right, answer, mode)?)
}
