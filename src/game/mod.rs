//! Game session: drives rounds, answers and the win streak.
//!
//! A [`GameSession`] owns every piece of mutable game state and talks to the
//! outside world only through four ports:
//! - [`KeyValueStore`] (wrapped in [`GameStore`]) for persistence
//! - [`RandomSource`] for number generation
//! - [`Scheduler`] for deferred effects
//! - [`EventSink`] for everything the UI, audio and speech layers react to
//!
//! Execution is single threaded. Every method runs to completion before the
//! next host callback, so read-modify-write against the store needs no locking.
//!
//! Round lifecycle:
//! 1. `start_round` bumps and persists the round index, draws numbers, emits
//!    `RoundStarted` and schedules speech (short delay) and input enable
//!    (longer delay).
//! 2. `submit_answer` is ignored until input is enabled. A wrong first click
//!    only produces a hint. Anything else is scored: the streak moves, then
//!    `ResultReady` is emitted.
//! 3. The result screen counts down and calls `on_countdown_complete`, which
//!    starts the next round. On the win that reaches the cap the session waits
//!    for `on_celebration_done` instead.

pub mod evaluator;
pub mod round;
pub mod streak;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::model::{Answer, ComparisonMode, HintReason, Language, RoundNumbers};
use crate::schedule::{ManualScheduler, Scheduler, Timer, TimerHandle};
use crate::speech;
use crate::storage::{self, keys, GameStore, KeyValueStore};

use self::round::RandomSource;
use self::streak::{number_line_visible, StreakEvent, StreakTracker};

/// Outbound notifications.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
        numbers: RoundNumbers,
        mode: ComparisonMode,
        number_line_visible: bool,
    },
    SpeakProblem {
        text: String,
    },
    InputEnabled {
        round: u32,
    },
    HintRequested {
        reason: HintReason,
        message: String,
        /// The number line was hidden for this round and should appear now.
        reveal_number_line: bool,
    },
    ResultReady {
        won: bool,
        numbers: RoundNumbers,
        mode: ComparisonMode,
        countdown_ticks: u32,
        tick_ms: u32,
    },
    SpeakExplanation {
        text: String,
    },
    StreakChanged {
        streak: u8,
    },
    StreakCompleted {
        player_name: String,
        duration_ms: u32,
    },
    StreakDraining,
    ModeChanged {
        mode: ComparisonMode,
        numbers: Option<RoundNumbers>,
    },
    PlayerNameChanged {
        name: String,
    },
    LanguageChanged {
        language: Language,
    },
    TextToSpeechChanged {
        enabled: bool,
    },
    MusicChanged {
        enabled: bool,
    },
    GameReset,
}

impl GameEvent {
    /// DOM event name used by the browser bridge.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::RoundStarted { .. } => "round-started",
            GameEvent::SpeakProblem { .. } => "speak-problem",
            GameEvent::InputEnabled { .. } => "input-enabled",
            GameEvent::HintRequested { .. } => "hint-requested",
            GameEvent::ResultReady { .. } => "result-ready",
            GameEvent::SpeakExplanation { .. } => "speak-explanation",
            GameEvent::StreakChanged { .. } => "streak-changed",
            GameEvent::StreakCompleted { .. } => "streak-completed",
            GameEvent::StreakDraining => "streak-draining",
            GameEvent::ModeChanged { .. } => "mode-change",
            GameEvent::PlayerNameChanged { .. } => "name-change",
            GameEvent::LanguageChanged { .. } => "language-change",
            GameEvent::TextToSpeechChanged { .. } => "tts-toggle",
            GameEvent::MusicChanged { .. } => "music-toggle",
            GameEvent::GameReset => "game-reset",
        }
    }
}

pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Constructed, no round yet.
    Idle,
    /// A round is showing and waiting for an answer.
    Playing,
    /// The result screen is counting down.
    ShowingResult,
    /// The streak hit the cap; waiting for the celebration to end.
    Celebrating,
    /// Torn down. Nothing mutates state any more.
    Stopped,
}

/// What a submission did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Input gated (not enabled yet, result showing, or session stopped).
    Ignored,
    /// Wrong first click: hint shown, round still open.
    Hint,
    Scored { won: bool },
}

pub struct GameSession<S, R, C, E> {
    config: GameConfig,
    store: GameStore<S>,
    rng: R,
    scheduler: C,
    sink: E,

    tracker: StreakTracker,
    streak_unsaved: bool,
    round_index: u32,
    mode: ComparisonMode,
    language: Language,
    player_name: String,
    text_to_speech: bool,
    music: bool,

    // Round-scoped
    numbers: Option<RoundNumbers>,
    first_click: bool,
    input_enabled: bool,
    number_line_visible: bool,

    phase: Phase,
    pending: Vec<TimerHandle>,
}

impl<S, R, C, E> GameSession<S, R, C, E>
where
    S: KeyValueStore,
    R: RandomSource,
    C: Scheduler,
    E: EventSink,
{
    /// Build a session from persisted state, repairing anything out of range.
    pub fn new(config: GameConfig, store: S, mut rng: R, scheduler: C, sink: E) -> Result<Self> {
        config.validate()?;
        let mut store = GameStore::new(store);

        let (tracker, repaired) = StreakTracker::restore(store.streak(), config.streak_cap);
        let mut streak_unsaved = false;
        if repaired {
            warn!("stored streak was at or above {}; reset to 0", config.streak_cap);
            streak_unsaved = !store.set_streak(0);
        }
        let player_name = store.player_name(&mut rng);

        Ok(Self {
            round_index: store.round_index(),
            mode: store.mode(),
            language: store.language(),
            text_to_speech: store.text_to_speech(),
            music: store.music(),
            player_name,
            tracker,
            streak_unsaved,
            config,
            store,
            rng,
            scheduler,
            sink,
            numbers: None,
            first_click: true,
            input_enabled: false,
            number_line_visible: true,
            phase: Phase::Idle,
            pending: Vec::new(),
        })
    }

    /// Publish the restored streak and begin the first round.
    pub fn start(&mut self) {
        let streak = self.tracker.streak();
        self.emit(GameEvent::StreakChanged { streak });
        self.start_round();
    }

    pub fn start_round(&mut self) {
        if self.phase == Phase::Stopped {
            debug!("start_round after teardown ignored");
            return;
        }
        self.cancel_pending();
        self.retry_unsaved_streak();

        self.round_index = if self.round_index + 1 >= storage::MAX_ROUND_INDEX {
            info!("round index wrapped after {}", self.round_index);
            storage::DEFAULT_ROUND_INDEX + 1
        } else {
            self.round_index + 1
        };
        self.store.set_round_index(self.round_index);

        let numbers = round::generate(self.round_index, &mut self.rng, &self.config);
        self.numbers = Some(numbers);
        self.first_click = true;
        self.input_enabled = false;
        self.number_line_visible = number_line_visible(self.tracker.streak());
        self.phase = Phase::Playing;

        info!(
            "round {} started: {} {} {}",
            self.round_index,
            numbers.left,
            self.mode.symbol(),
            numbers.right
        );
        self.emit(GameEvent::RoundStarted {
            round: self.round_index,
            numbers,
            mode: self.mode,
            number_line_visible: self.number_line_visible,
        });

        let round = self.round_index;
        self.schedule(self.config.speech_delay_ms, Timer::SpeakProblem { round });
        self.schedule(self.config.input_enable_delay_ms, Timer::EnableInput { round });
    }

    pub fn submit_answer(&mut self, answer: Answer) -> Submission {
        if self.phase != Phase::Playing || !self.input_enabled {
            debug!("answer '{answer}' ignored in phase {:?}", self.phase);
            return Submission::Ignored;
        }
        let Some(numbers) = self.numbers else {
            return Submission::Ignored;
        };

        let won = evaluator::evaluate(numbers, answer, self.mode);

        if !won && self.first_click {
            self.first_click = false;
            let reveal_number_line = !self.number_line_visible;
            self.number_line_visible = true;
            let reason = self.mode.hint_reason();
            debug!("first wrong click on round {}; showing hint", self.round_index);
            self.emit(GameEvent::HintRequested {
                reason,
                message: speech::hint_text(reason, self.language).to_string(),
                reveal_number_line,
            });
            return Submission::Hint;
        }

        self.first_click = false;
        self.input_enabled = false;
        self.phase = Phase::ShowingResult;
        info!("round {} answered '{answer}': won = {won}", self.round_index);

        let events = self.tracker.record(won);
        self.apply_streak_events(events);

        self.emit(GameEvent::ResultReady {
            won,
            numbers,
            mode: self.mode,
            countdown_ticks: self.config.countdown_ticks(won),
            tick_ms: self.config.countdown_tick_ms,
        });

        if !won {
            let round = self.round_index;
            self.schedule(self.config.explanation_delay_ms, Timer::SpeakExplanation { round });
        }
        Submission::Scored { won }
    }

    /// Host callback for a fired timer.
    pub fn on_timer(&mut self, handle: TimerHandle, timer: Timer) {
        let Some(pos) = self.pending.iter().position(|h| *h == handle) else {
            debug!("stale timer {handle:?} ({timer:?}) ignored");
            return;
        };
        self.pending.swap_remove(pos);
        if self.phase == Phase::Stopped || timer.round() != self.round_index {
            return;
        }
        let Some(numbers) = self.numbers else {
            return;
        };

        match timer {
            Timer::SpeakProblem { .. } => {
                if self.text_to_speech && self.phase == Phase::Playing {
                    let text = speech::problem_text(numbers, self.mode);
                    self.emit(GameEvent::SpeakProblem { text });
                }
            }
            Timer::EnableInput { round } => {
                if self.phase == Phase::Playing {
                    self.input_enabled = true;
                    self.emit(GameEvent::InputEnabled { round });
                }
            }
            Timer::SpeakExplanation { .. } => {
                if self.text_to_speech {
                    let text = speech::explanation_text(numbers, self.mode);
                    self.emit(GameEvent::SpeakExplanation { text });
                }
            }
        }
    }

    /// The result screen finished counting down.
    pub fn on_countdown_complete(&mut self) {
        if self.phase == Phase::ShowingResult {
            self.start_round();
        } else {
            debug!("countdown completion ignored in phase {:?}", self.phase);
        }
    }

    /// The celebration sequence ended: clear the streak and play on.
    pub fn on_celebration_done(&mut self) {
        if self.phase != Phase::Celebrating {
            debug!("celebration completion ignored in phase {:?}", self.phase);
            return;
        }
        let events = self.tracker.finish_celebration();
        self.apply_streak_events(events);
        self.start_round();
    }

    /// Switch between "greater than" and "less than". The current numbers
    /// stay; only the displayed relation changes.
    pub fn set_mode(&mut self, mode: ComparisonMode) {
        if self.phase == Phase::Stopped {
            debug!("mode change after teardown ignored");
            return;
        }
        self.mode = mode;
        self.store.set_mode(mode);
        if !matches!(self.phase, Phase::ShowingResult | Phase::Celebrating) {
            self.emit(GameEvent::ModeChanged { mode, numbers: self.numbers });
        }
    }

    pub fn set_mode_name(&mut self, mode: &str) -> Result<()> {
        let mode: ComparisonMode = mode.parse()?;
        self.set_mode(mode);
        Ok(())
    }

    /// Escape hatch for a stuck progress display: zero the streak, forget the
    /// round count and start over.
    pub fn manual_reset(&mut self) {
        if self.phase == Phase::Stopped {
            debug!("manual reset after teardown ignored");
            return;
        }
        info!("manual reset requested");
        let events = self.tracker.reset();
        self.streak_unsaved = !self.store.clear_streak();
        self.store.clear_round_index();
        self.round_index = storage::DEFAULT_ROUND_INDEX;
        for event in events {
            if let StreakEvent::Changed(streak) = event {
                self.emit(GameEvent::StreakChanged { streak });
            }
        }
        self.emit(GameEvent::GameReset);
        self.start_round();
    }

    /// Cancel everything outstanding. Later host callbacks become no-ops.
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.phase = Phase::Stopped;
        debug!("session torn down at round {}", self.round_index);
    }

    /// Another tab changed a stored key; pick up preferences it owns.
    /// Round and streak stay authoritative in this tab.
    pub fn on_storage_changed(&mut self, key: &str) {
        match key {
            keys::MODE => {
                let mode = self.store.mode();
                if mode != self.mode {
                    self.mode = mode;
                    if !matches!(self.phase, Phase::ShowingResult | Phase::Celebrating) {
                        self.emit(GameEvent::ModeChanged { mode, numbers: self.numbers });
                    }
                }
            }
            keys::PLAYER_NAME => {
                if let Some(name) = self.store.stored_player_name() {
                    if name != self.player_name {
                        self.player_name = name.clone();
                        self.emit(GameEvent::PlayerNameChanged { name });
                    }
                }
            }
            keys::LANGUAGE => {
                let language = self.store.language();
                if language != self.language {
                    self.language = language;
                    self.emit(GameEvent::LanguageChanged { language });
                }
            }
            keys::TEXT_TO_SPEECH => {
                let enabled = self.store.text_to_speech();
                if enabled != self.text_to_speech {
                    self.text_to_speech = enabled;
                    self.emit(GameEvent::TextToSpeechChanged { enabled });
                }
            }
            keys::MUSIC => {
                let enabled = self.store.music();
                if enabled != self.music {
                    self.music = enabled;
                    self.emit(GameEvent::MusicChanged { enabled });
                }
            }
            other => debug!("storage change for '{other}' not synced"),
        }
    }

    pub fn set_player_name(&mut self, name: &str) -> Result<()> {
        let name = storage::normalize_player_name(name)
            .ok_or_else(|| GameError::InvalidArgument("player name must not be blank".into()))?;
        self.store.set_player_name(&name);
        self.player_name = name.clone();
        self.emit(GameEvent::PlayerNameChanged { name });
        Ok(())
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.store.set_language(language);
        self.emit(GameEvent::LanguageChanged { language });
    }

    pub fn set_language_code(&mut self, code: &str) -> Result<()> {
        let language: Language = code.parse()?;
        self.set_language(language);
        Ok(())
    }

    pub fn set_text_to_speech(&mut self, enabled: bool) {
        self.text_to_speech = enabled;
        self.store.set_text_to_speech(enabled);
        self.emit(GameEvent::TextToSpeechChanged { enabled });
    }

    pub fn set_music(&mut self, enabled: bool) {
        self.music = enabled;
        self.store.set_music(enabled);
        self.emit(GameEvent::MusicChanged { enabled });
    }

    fn apply_streak_events(&mut self, events: Vec<StreakEvent>) {
        for event in events {
            match event {
                StreakEvent::Changed(streak) => {
                    self.streak_unsaved = !self.store.set_streak(streak);
                    self.emit(GameEvent::StreakChanged { streak });
                }
                StreakEvent::Completed => {
                    info!("streak of {} reached", self.tracker.cap());
                    self.phase = Phase::Celebrating;
                    self.emit(GameEvent::StreakCompleted {
                        player_name: self.player_name.clone(),
                        duration_ms: self.config.celebration_duration_ms,
                    });
                }
                StreakEvent::Draining => self.emit(GameEvent::StreakDraining),
            }
        }
    }

    fn retry_unsaved_streak(&mut self) {
        if self.streak_unsaved && self.store.set_streak(self.tracker.streak()) {
            debug!("deferred streak write succeeded");
            self.streak_unsaved = false;
        }
    }

    fn schedule(&mut self, delay_ms: u32, timer: Timer) {
        let handle = self.scheduler.after(delay_ms, timer);
        self.pending.push(handle);
    }

    fn cancel_pending(&mut self) {
        for handle in self.pending.drain(..) {
            self.scheduler.cancel(handle);
        }
    }

    fn emit(&mut self, event: GameEvent) {
        debug!("emit {}", event.name());
        self.sink.emit(event);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn numbers(&self) -> Option<RoundNumbers> {
        self.numbers
    }

    pub fn streak(&self) -> u8 {
        self.tracker.streak()
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn text_to_speech(&self) -> bool {
        self.text_to_speech
    }

    pub fn music(&self) -> bool {
        self.music
    }

    pub fn first_click(&self) -> bool {
        self.first_click
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn store(&self) -> &GameStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GameStore<S> {
        &mut self.store
    }

    pub fn scheduler(&self) -> &C {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut C {
        &mut self.scheduler
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }
}

impl<S, R, E> GameSession<S, R, ManualScheduler, E>
where
    S: KeyValueStore,
    R: RandomSource,
    E: EventSink,
{
    /// Advance the fake clock and deliver every timer that came due.
    pub fn advance(&mut self, ms: u64) {
        for (handle, timer) in self.scheduler.advance(ms) {
            self.on_timer(handle, timer);
        }
    }
}
