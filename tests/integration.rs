// Integration tests (native) for the `higher-lower` crate.
// Sessions run against an in-memory store, a scripted random source and the
// manual scheduler, so every timer fires exactly when a test advances time.

use std::collections::VecDeque;

use higher_lower::game::evaluator::correct_answer;
use higher_lower::storage::keys;
use higher_lower::{
    Answer, ComparisonMode, GameConfig, GameEvent, GameSession, HintReason, KeyValueStore,
    ManualScheduler, MemoryStore, Phase, RandomSource, RoundNumbers, Submission,
};

/// Replays queued draws, then walks the unit interval in fixed steps.
struct Script {
    queue: VecDeque<f64>,
    walk: f64,
}

impl Script {
    fn new(values: &[f64]) -> Self {
        Self { queue: values.iter().copied().collect(), walk: 0.0 }
    }
}

impl RandomSource for Script {
    fn next_unit(&mut self) -> f64 {
        self.queue.pop_front().unwrap_or_else(|| {
            self.walk = (self.walk + 0.137) % 1.0;
            self.walk
        })
    }
}

/// Unit float that draws exactly `n` from 0..=1000.
fn unit(n: u16) -> f64 {
    (f64::from(n) + 0.5) / 1001.0
}

type Session = GameSession<MemoryStore, Script, ManualScheduler, Vec<GameEvent>>;

fn session_with(entries: &[(&str, &str)], draws: &[f64]) -> Session {
    let mut all = vec![(keys::PLAYER_NAME, "Mia")];
    all.extend_from_slice(entries);
    GameSession::new(
        GameConfig::default(),
        MemoryStore::with_entries(all),
        Script::new(draws),
        ManualScheduler::new(),
        Vec::new(),
    )
    .unwrap()
}

fn enable_input(s: &mut Session) {
    s.advance(u64::from(s.config().input_enable_delay_ms));
    assert!(s.input_enabled());
}

fn wrong_answer(numbers: RoundNumbers, mode: ComparisonMode) -> Answer {
    let right = correct_answer(numbers, mode);
    Answer::ALL.into_iter().find(|a| *a != right).unwrap()
}

fn stored(s: &Session, key: &str) -> Option<String> {
    s.store().inner().peek(key).map(str::to_string)
}

#[test]
fn full_round_win() {
    let mut s = session_with(
        &[(keys::ROUND, "2"), (keys::STREAK, "4")],
        &[unit(812), unit(340)],
    );
    s.start();
    assert_eq!(s.round_index(), 3);
    assert_eq!(s.numbers(), Some(RoundNumbers::new(812, 340)));
    assert_eq!(stored(&s, keys::ROUND).as_deref(), Some("3"));

    enable_input(&mut s);
    s.sink_mut().clear();
    assert_eq!(s.submit_answer(Answer::AssertHigher), Submission::Scored { won: true });

    assert_eq!(
        s.sink().as_slice(),
        &[
            GameEvent::StreakChanged { streak: 5 },
            GameEvent::ResultReady {
                won: true,
                numbers: RoundNumbers::new(812, 340),
                mode: ComparisonMode::Greater,
                countdown_ticks: 3,
                tick_ms: 1000,
            },
        ]
    );
    assert_eq!(stored(&s, keys::STREAK).as_deref(), Some("5"));
    assert_eq!(s.phase(), Phase::ShowingResult);

    s.on_countdown_complete();
    assert_eq!(s.round_index(), 4);
    assert_eq!(s.phase(), Phase::Playing);
}

#[test]
fn equality_round() {
    let mut s = session_with(&[(keys::ROUND, "9")], &[unit(447)]);
    s.start();
    assert_eq!(s.round_index(), 10);
    assert_eq!(s.numbers(), Some(RoundNumbers::new(447, 447)));
    enable_input(&mut s);
    assert_eq!(s.submit_answer(Answer::AssertEqual), Submission::Scored { won: true });
}

#[test]
fn answers_before_input_enabled_are_ignored() {
    let mut s = session_with(&[], &[]);
    s.start();
    s.advance(1999);
    let numbers = s.numbers().unwrap();
    let answer = correct_answer(numbers, s.mode());
    assert_eq!(s.submit_answer(answer), Submission::Ignored);
    assert!(s.first_click());
    s.advance(1);
    assert_eq!(s.submit_answer(answer), Submission::Scored { won: true });
}

#[test]
fn ten_wins_celebrate_once_then_reset() {
    let mut s = session_with(&[], &[]);
    s.start();
    for _ in 0..10 {
        enable_input(&mut s);
        let answer = correct_answer(s.numbers().unwrap(), s.mode());
        assert_eq!(s.submit_answer(answer), Submission::Scored { won: true });
        s.on_countdown_complete();
    }
    assert_eq!(s.streak(), 10);
    assert_eq!(s.phase(), Phase::Celebrating);
    let completions = s
        .sink()
        .iter()
        .filter(|e| matches!(e, GameEvent::StreakCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert!(s.sink().contains(&GameEvent::StreakCompleted {
        player_name: "Mia".to_string(),
        duration_ms: 12_000,
    }));

    // The result countdown ending does not start a round mid-celebration,
    // and no answer can push the streak past the cap.
    let round = s.round_index();
    s.on_countdown_complete();
    assert_eq!(s.round_index(), round);
    assert_eq!(s.submit_answer(Answer::AssertEqual), Submission::Ignored);
    assert_eq!(s.streak(), 10);

    s.sink_mut().clear();
    s.on_celebration_done();
    assert_eq!(s.streak(), 0);
    assert_eq!(stored(&s, keys::STREAK).as_deref(), Some("0"));
    assert_eq!(s.phase(), Phase::Playing);
    assert_eq!(s.round_index(), round + 1);
    assert_eq!(s.sink()[0], GameEvent::StreakChanged { streak: 0 });
    assert!(matches!(s.sink()[1], GameEvent::RoundStarted { .. }));

    // A duplicate completion signal is ignored.
    s.on_celebration_done();
    assert_eq!(s.round_index(), round + 1);
}

#[test]
fn loss_drains_streak_before_committing_zero() {
    let mut s = session_with(&[(keys::STREAK, "6")], &[]);
    s.start();
    enable_input(&mut s);
    let numbers = s.numbers().unwrap();
    let wrong = wrong_answer(numbers, s.mode());

    assert_eq!(s.submit_answer(wrong), Submission::Hint);
    s.sink_mut().clear();
    assert_eq!(s.submit_answer(wrong), Submission::Scored { won: false });

    let events = s.sink();
    let drain = events.iter().position(|e| *e == GameEvent::StreakDraining).unwrap();
    let zero = events
        .iter()
        .position(|e| *e == GameEvent::StreakChanged { streak: 0 })
        .unwrap();
    assert!(drain < zero);
    assert!(matches!(
        events.last(),
        Some(GameEvent::ResultReady { won: false, countdown_ticks: 15, .. })
    ));
    assert_eq!(s.streak(), 0);
    assert_eq!(stored(&s, keys::STREAK).as_deref(), Some("0"));
}

#[test]
fn loss_at_zero_streak_does_not_drain() {
    let mut s = session_with(&[], &[]);
    s.start();
    enable_input(&mut s);
    let wrong = wrong_answer(s.numbers().unwrap(), s.mode());
    s.submit_answer(wrong);
    s.sink_mut().clear();
    assert_eq!(s.submit_answer(wrong), Submission::Scored { won: false });
    assert!(!s.sink().contains(&GameEvent::StreakDraining));
    assert!(!s.sink().iter().any(|e| matches!(e, GameEvent::StreakChanged { .. })));
}

#[test]
fn first_wrong_click_only_hints() {
    let mut s = session_with(&[(keys::STREAK, "3")], &[]);
    s.start();
    enable_input(&mut s);
    let numbers = s.numbers().unwrap();
    assert!(s.first_click());
    s.sink_mut().clear();

    assert_eq!(s.submit_answer(wrong_answer(numbers, s.mode())), Submission::Hint);
    assert!(!s.first_click());
    assert_eq!(s.streak(), 3);
    assert_eq!(s.phase(), Phase::Playing);
    // Streak 3 hides the number line, so the hint brings it back.
    assert!(matches!(
        s.sink().as_slice(),
        [GameEvent::HintRequested {
            reason: HintReason::WrongFirstTryGreater,
            reveal_number_line: true,
            ..
        }]
    ));

    // The second submission always scores, here as a win.
    assert_eq!(
        s.submit_answer(correct_answer(numbers, s.mode())),
        Submission::Scored { won: true }
    );
    assert_eq!(s.streak(), 4);
}

#[test]
fn hint_reason_follows_mode() {
    let mut s = session_with(&[(keys::MODE, "less")], &[]);
    s.start();
    enable_input(&mut s);
    let wrong = wrong_answer(s.numbers().unwrap(), ComparisonMode::Less);
    s.submit_answer(wrong);
    assert!(matches!(
        s.sink().last(),
        Some(GameEvent::HintRequested { reason: HintReason::WrongFirstTryLess, .. })
    ));
}

#[test]
fn stuck_streak_repaired_on_load() {
    for raw in ["10", "25"] {
        let s = session_with(&[(keys::STREAK, raw)], &[]);
        assert_eq!(s.streak(), 0);
        assert_eq!(stored(&s, keys::STREAK).as_deref(), Some("0"));
    }
    let s = session_with(&[(keys::STREAK, "garbage"), (keys::ROUND, "x")], &[]);
    assert_eq!(s.streak(), 0);
    assert_eq!(s.round_index(), 1);
}

#[test]
fn mode_change_keeps_numbers_and_streak() {
    let mut s = session_with(&[(keys::STREAK, "2")], &[unit(3), unit(7)]);
    s.start();
    s.sink_mut().clear();
    s.set_mode(ComparisonMode::Less);
    assert_eq!(
        s.sink().as_slice(),
        &[GameEvent::ModeChanged {
            mode: ComparisonMode::Less,
            numbers: Some(RoundNumbers::new(3, 7)),
        }]
    );
    assert_eq!(s.numbers(), Some(RoundNumbers::new(3, 7)));
    assert_eq!(s.streak(), 2);
    assert_eq!(stored(&s, keys::MODE).as_deref(), Some("less"));

    // "True" now means 3 < 7.
    enable_input(&mut s);
    assert_eq!(s.submit_answer(Answer::AssertHigher), Submission::Scored { won: true });

    // While the result shows, the mode is stored but the display is left alone.
    s.sink_mut().clear();
    s.set_mode(ComparisonMode::Greater);
    assert!(s.sink().is_empty());
    assert_eq!(s.mode(), ComparisonMode::Greater);
}

#[test]
fn teardown_cancels_pending_timers() {
    let mut s = session_with(&[], &[]);
    s.set_text_to_speech(true);
    s.start();
    assert_eq!(s.scheduler().pending_count(), 2);
    s.teardown();
    assert_eq!(s.scheduler().pending_count(), 0);
    s.sink_mut().clear();

    s.advance(10_000);
    assert!(s.sink().is_empty());
    assert!(!s.input_enabled());
    assert_eq!(s.submit_answer(Answer::AssertEqual), Submission::Ignored);
    let round = s.round_index();
    s.start_round();
    assert_eq!(s.round_index(), round);
    assert_eq!(s.phase(), Phase::Stopped);
}

#[test]
fn speech_only_when_enabled() {
    let mut s = session_with(&[], &[unit(3), unit(7)]);
    s.start();
    s.advance(500);
    assert!(!s.sink().iter().any(|e| matches!(e, GameEvent::SpeakProblem { .. })));

    let mut s = session_with(&[(keys::TEXT_TO_SPEECH, "true")], &[unit(3), unit(7)]);
    s.start();
    s.advance(500);
    assert!(s.sink().contains(&GameEvent::SpeakProblem {
        text: "3 is greater than 7. True or false?".to_string()
    }));
    s.advance(1500);
    // 3 > 7 is false, so "True" is wrong twice over and the round is lost.
    s.submit_answer(Answer::AssertHigher);
    assert_eq!(s.submit_answer(Answer::AssertHigher), Submission::Scored { won: false });
    s.sink_mut().clear();
    s.advance(999);
    assert!(s.sink().is_empty());
    s.advance(1);
    assert!(matches!(s.sink().as_slice(), [GameEvent::SpeakExplanation { .. }]));
}

#[test]
fn storage_failures_do_not_stop_play() {
    let mut s = session_with(&[], &[]);
    s.store_mut().inner_mut().set_failing(true);
    s.start();
    enable_input(&mut s);
    let answer = correct_answer(s.numbers().unwrap(), s.mode());
    assert_eq!(s.submit_answer(answer), Submission::Scored { won: true });
    assert_eq!(s.streak(), 1);
    assert_eq!(stored(&s, keys::STREAK), None);

    // Storage comes back; the next round start retries the streak write.
    s.store_mut().inner_mut().set_failing(false);
    s.on_countdown_complete();
    assert_eq!(stored(&s, keys::STREAK).as_deref(), Some("1"));
}

#[test]
fn manual_reset_clears_streak_and_round() {
    let mut s = session_with(&[(keys::STREAK, "6"), (keys::ROUND, "42")], &[]);
    s.start();
    assert_eq!(s.round_index(), 43);
    s.sink_mut().clear();
    s.manual_reset();
    assert_eq!(s.streak(), 0);
    assert_eq!(stored(&s, keys::STREAK), None);
    assert_eq!(s.round_index(), 2);
    assert_eq!(stored(&s, keys::ROUND).as_deref(), Some("2"));
    assert_eq!(s.sink()[0], GameEvent::StreakChanged { streak: 0 });
    assert_eq!(s.sink()[1], GameEvent::GameReset);
    assert!(matches!(s.sink()[2], GameEvent::RoundStarted { round: 2, .. }));
}

#[test]
fn preferences_persist_and_validate() {
    let mut s = session_with(&[], &[]);
    assert_eq!(s.player_name(), "Mia");
    s.set_player_name("  Leo  ").unwrap();
    assert_eq!(s.player_name(), "Leo");
    assert_eq!(stored(&s, keys::PLAYER_NAME).as_deref(), Some("Leo"));
    assert!(s.set_player_name("   ").is_err());
    assert_eq!(s.player_name(), "Leo");

    s.set_language_code("ko").unwrap();
    assert_eq!(stored(&s, keys::LANGUAGE).as_deref(), Some("ko"));
    assert!(s.set_language_code("xx").is_err());

    s.set_music(true);
    assert_eq!(stored(&s, keys::MUSIC).as_deref(), Some("true"));
    assert!(s.music());
}

#[test]
fn other_tab_changes_are_picked_up() {
    let mut s = session_with(&[], &[]);
    s.start();
    s.sink_mut().clear();
    s.store_mut().inner_mut().set(keys::PLAYER_NAME, "Zoe").unwrap();
    s.store_mut().inner_mut().set(keys::MODE, "less").unwrap();
    s.on_storage_changed(keys::PLAYER_NAME);
    s.on_storage_changed(keys::MODE);
    s.on_storage_changed(keys::STREAK);
    assert_eq!(s.player_name(), "Zoe");
    assert_eq!(s.mode(), ComparisonMode::Less);
    assert_eq!(s.sink().len(), 2);
    assert_eq!(s.sink()[0], GameEvent::PlayerNameChanged { name: "Zoe".to_string() });
}

#[test]
fn random_name_assigned_when_none_stored() {
    let s: Session = GameSession::new(
        GameConfig::default(),
        MemoryStore::new(),
        Script::new(&[0.0]),
        ManualScheduler::new(),
        Vec::new(),
    )
    .unwrap();
    assert_eq!(s.player_name(), "ACE");
    assert_eq!(s.store().inner().peek(keys::PLAYER_NAME), Some("ACE"));
}

#[test]
fn invalid_config_is_rejected() {
    let config = GameConfig { speech_delay_ms: 3000, ..GameConfig::default() };
    let result: higher_lower::Result<Session> = GameSession::new(
        config,
        MemoryStore::new(),
        Script::new(&[]),
        ManualScheduler::new(),
        Vec::new(),
    );
    assert!(result.is_err());
}

#[test]
fn tampered_round_index_keeps_advancing() {
    for raw in ["4294967295", "4294967294"] {
        let mut s = session_with(&[(keys::ROUND, raw)], &[]);
        s.start();
        let mut rounds = vec![s.round_index()];
        s.start_round();
        rounds.push(s.round_index());
        s.start_round();
        rounds.push(s.round_index());
        assert_eq!(rounds, vec![2, 3, 4], "stored '{raw}'");
        assert!(!s.numbers().unwrap().is_equal());
        assert_eq!(stored(&s, keys::ROUND).as_deref(), Some("4"));
    }
}

#[test]
fn round_index_wraps_before_the_limit() {
    let last = higher_lower::storage::MAX_ROUND_INDEX - 1;
    let mut s = session_with(&[(keys::ROUND, &last.to_string())], &[]);
    assert_eq!(s.round_index(), last);
    s.start();
    assert_eq!(s.round_index(), 2);
    s.start_round();
    assert_eq!(s.round_index(), 3);
}

#[test]
fn stopped_session_rejects_mode_change_and_reset() {
    let mut s = session_with(&[(keys::STREAK, "4"), (keys::ROUND, "7")], &[]);
    s.start();
    s.teardown();
    s.sink_mut().clear();

    s.set_mode(ComparisonMode::Less);
    assert_eq!(s.mode(), ComparisonMode::Greater);
    assert_eq!(stored(&s, keys::MODE), None);
    assert!(s.set_mode_name("less").is_ok());
    assert_eq!(s.mode(), ComparisonMode::Greater);

    s.manual_reset();
    assert_eq!(s.streak(), 4);
    assert_eq!(stored(&s, keys::STREAK).as_deref(), Some("4"));
    assert_eq!(stored(&s, keys::ROUND).as_deref(), Some("8"));
    assert_eq!(s.phase(), Phase::Stopped);
    assert!(s.sink().is_empty());
}
