//! Behavioral properties of the tools, exercised through the `Tools` facade.
//!
//! Every test drives the machines with explicit deltas and a manual clock,
//! so results do not depend on wall-clock timing.

use tokio::sync::mpsc;

use polar_clock::settings::Settings;
use polar_clock::tools::{CueKind, ManualClock, ToolEvent, Tools};
use polar_clock::types::{PersistedTools, PomodoroPhase, ToolsSnapshot};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_tools() -> (Tools, ManualClock, mpsc::UnboundedReceiver<ToolEvent>) {
    create_tools_from(None)
}

fn create_tools_from(
    state: Option<&PersistedTools>,
) -> (Tools, ManualClock, mpsc::UnboundedReceiver<ToolEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let clock = ManualClock::new();
    let tools = Tools::init(&Settings::default(), state, Box::new(clock.clone()), tx);
    (tools, clock, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ToolEvent>) -> Vec<ToolEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Feeds `total` seconds in steps of `step`, checking `check` after each tick.
fn feed(tools: &mut Tools, total: f64, step: f64, mut check: impl FnMut(&ToolsSnapshot)) {
    let steps = (total / step).round() as usize;
    for _ in 0..steps {
        tools.update(step);
        check(&tools.get_state());
    }
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn pause_and_reset_are_idempotent() {
    let (mut tools, clock, _rx) = create_tools();
    tools.timer_configure(0, 2, 0);
    tools.timer_start();
    tools.stopwatch_start();
    tools.pomodoro_start();
    clock.advance(3000.0);
    tools.update(3.0);

    tools.timer_pause();
    tools.stopwatch_pause();
    tools.pomodoro_pause();
    let once = tools.get_state();

    tools.timer_pause();
    tools.stopwatch_pause();
    tools.pomodoro_pause();
    assert_eq!(tools.get_state(), once);

    tools.timer_reset();
    tools.stopwatch_reset();
    tools.pomodoro_reset();
    let once = tools.get_state();

    tools.timer_reset();
    tools.stopwatch_reset();
    tools.pomodoro_reset();
    assert_eq!(tools.get_state(), once);
}

// ============================================================================
// Conservation
// ============================================================================

#[test]
fn stopwatch_conserves_time_across_pauses() {
    let (mut tools, clock, _rx) = create_tools();

    tools.stopwatch_start();
    clock.advance(1500.0);
    tools.update(1.5);
    tools.stopwatch_pause();

    clock.advance(10_000.0);
    tools.update(10.0);

    tools.stopwatch_start();
    clock.advance(700.0);
    tools.stopwatch_pause();

    assert_eq!(tools.get_state().stopwatch.elapsed_time, 2200.0);

    assert!(tools.stopwatch_add_catch_up(800.0));
    assert_eq!(tools.get_state().stopwatch.elapsed_time, 3000.0);
}

// ============================================================================
// Countdown monotonicity
// ============================================================================

#[test]
fn countdown_is_monotonic_until_alarm() {
    let (mut tools, _clock, _rx) = create_tools();
    tools.timer_configure(0, 0, 5);
    tools.timer_start();

    let mut last = tools.get_state().timer.remaining_seconds;
    feed(&mut tools, 6.0, 0.25, |state| {
        let timer = &state.timer;
        assert!(timer.remaining_seconds <= last);
        assert!(timer.remaining_seconds >= 0.0);
        if timer.remaining_seconds > 0.0 {
            assert!(timer.is_running);
            assert!(!timer.alarm_playing);
        } else {
            assert!(!timer.is_running);
            assert!(timer.alarm_playing);
        }
        last = timer.remaining_seconds;
    });

    assert_eq!(last, 0.0);
}

#[test]
fn countdown_alarm_cue_fires_once() {
    let (mut tools, _clock, mut rx) = create_tools();
    tools.timer_configure(0, 0, 2);
    tools.timer_start();
    drain(&mut rx);

    feed(&mut tools, 5.0, 0.5, |_| {});

    let alarms = drain(&mut rx)
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                ToolEvent::PlayCue {
                    cue: CueKind::Alarm,
                    ..
                }
            )
        })
        .count();
    assert_eq!(alarms, 1);
}

// ============================================================================
// Interval repeat
// ============================================================================

#[test]
fn interval_timer_repeats_without_alarm() {
    let (mut tools, _clock, mut rx) = create_tools();
    tools.timer_configure(0, 0, 10);
    tools.timer_set_interval(true);
    tools.timer_start();
    drain(&mut rx);

    feed(&mut tools, 25.0, 0.5, |state| {
        assert!(!state.timer.alarm_playing);
        assert!(state.timer.is_running);
    });

    let timer = tools.get_state().timer;
    assert_eq!(timer.completed_cycles, 2);
    assert!(timer.remaining_seconds >= 0.0 && timer.remaining_seconds < 10.0);

    let repeats = drain(&mut rx)
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                ToolEvent::PlayCue {
                    cue: CueKind::IntervalRepeat,
                    ..
                }
            )
        })
        .count();
    assert_eq!(repeats, 2);
}

#[test]
fn interval_timer_carries_over_large_deltas() {
    let (mut tools, _clock, _rx) = create_tools();
    tools.timer_configure(0, 0, 10);
    tools.timer_set_interval(true);
    tools.timer_start();

    tools.update(25.0);

    let timer = tools.get_state().timer;
    assert_eq!(timer.completed_cycles, 2);
    assert_eq!(timer.remaining_seconds, 5.0);
    assert!(!timer.alarm_playing);
}

// ============================================================================
// Pomodoro cadence
// ============================================================================

#[test]
fn pomodoro_long_break_after_four_work_phases() {
    let (mut tools, _clock, _rx) = create_tools();
    let mut breaks = Vec::new();

    tools.pomodoro_start();
    for _ in 0..4 {
        // Work phase runs out and the alarm waits for acknowledgement.
        let work = tools.get_state().pomodoro;
        assert_eq!(work.phase, PomodoroPhase::Work);
        tools.update(work.remaining_seconds);
        assert!(tools.get_state().pomodoro.alarm_playing);

        tools.pomodoro_start();
        let pause = tools.get_state().pomodoro;
        breaks.push(pause.phase);

        tools.update(pause.remaining_seconds);
        tools.pomodoro_start();
    }

    assert_eq!(
        breaks,
        vec![
            PomodoroPhase::ShortBreak,
            PomodoroPhase::ShortBreak,
            PomodoroPhase::ShortBreak,
            PomodoroPhase::LongBreak,
        ]
    );
    assert_eq!(tools.get_state().pomodoro.cycles, 4);
}

#[test]
fn pomodoro_continuous_mode_advances_without_alarm() {
    let (mut tools, _clock, _rx) = create_tools();
    tools.pomodoro_set_continuous(true);
    tools.pomodoro_start();

    tools.update(25.0 * 60.0);

    let pomodoro = tools.get_state().pomodoro;
    assert_eq!(pomodoro.phase, PomodoroPhase::ShortBreak);
    assert_eq!(pomodoro.cycles, 1);
    assert!(pomodoro.is_running);
    assert!(!pomodoro.alarm_playing);
}

// ============================================================================
// Snooze
// ============================================================================

#[test]
fn pomodoro_snooze_extends_the_current_phase() {
    let (mut tools, _clock, _rx) = create_tools();
    tools.pomodoro_start();
    tools.update(25.0 * 60.0);

    let before = tools.get_state().pomodoro;
    assert_eq!(before.remaining_seconds, 0.0);
    assert!(before.alarm_playing);

    tools.pomodoro_snooze();

    let after = tools.get_state().pomodoro;
    assert_eq!(after.phase, PomodoroPhase::Work);
    assert_eq!(after.cycles, before.cycles);
    assert_eq!(after.remaining_seconds, 300.0);
    assert!(!after.alarm_playing);
}

// ============================================================================
// Lap ordering
// ============================================================================

#[test]
fn laps_keep_chronological_order_and_display_mapping() {
    let (mut tools, clock, _rx) = create_tools();
    tools.stopwatch_start();

    for at in [1000.0, 2500.0, 4000.0] {
        clock.set(at);
        assert!(tools.stopwatch_lap());
    }

    let times: Vec<f64> = tools
        .get_state()
        .stopwatch
        .laps
        .iter()
        .map(|lap| lap.time)
        .collect();
    assert_eq!(times, vec![1000.0, 2500.0, 4000.0]);

    // Display index 0 is the most recent lap.
    assert!(tools.stopwatch_set_lap_label_by_display(0, "last"));
    assert!(tools.stopwatch_set_lap_label_by_display(2, "first"));
    assert!(!tools.stopwatch_set_lap_label_by_display(3, "missing"));

    let laps = tools.get_state().stopwatch.laps;
    assert_eq!(laps[0].label, "first");
    assert_eq!(laps[1].label, "");
    assert_eq!(laps[2].label, "last");
}

#[test]
fn lap_before_start_is_ignored() {
    let (mut tools, _clock, _rx) = create_tools();
    assert!(!tools.stopwatch_lap());
    assert!(tools.get_state().stopwatch.laps.is_empty());
}

// ============================================================================
// Reload safety
// ============================================================================

#[test]
fn reload_never_resumes_running() {
    let document = r#"{
        "version": 1,
        "timer": {"totalSeconds": 60, "remainingSeconds": 42, "isInterval": true, "isRunning": true},
        "stopwatch": {"elapsedTime": 5000, "isRunning": true},
        "pomodoro": {
            "phase": "shortBreak",
            "cycles": 3,
            "remainingSeconds": 120,
            "workDuration": 30,
            "shortBreakDuration": 6,
            "longBreakDuration": 20,
            "continuous": true,
            "isRunning": true,
            "alarmPlaying": true
        }
    }"#;
    let state: PersistedTools = serde_json::from_str(document).unwrap();
    let (tools, _clock, _rx) = create_tools_from(Some(&state));
    let snapshot = tools.get_state();

    assert!(!snapshot.timer.is_running);
    assert!(!snapshot.stopwatch.is_running);
    assert!(!snapshot.pomodoro.is_running);
    assert!(!snapshot.pomodoro.alarm_playing);

    assert_eq!(snapshot.timer.remaining_seconds, 42.0);
    assert!(snapshot.timer.is_interval);
    assert_eq!(snapshot.stopwatch.elapsed_time, 5000.0);
    assert!(snapshot.stopwatch.laps.is_empty());
    assert_eq!(snapshot.pomodoro.phase, PomodoroPhase::ShortBreak);
    assert_eq!(snapshot.pomodoro.cycles, 3);
    assert_eq!(snapshot.pomodoro.remaining_seconds, 120.0);
    assert_eq!(snapshot.pomodoro.work_duration, 30.0);
}

#[test]
fn persisted_round_trip_through_facade() {
    let (mut tools, clock, _rx) = create_tools();
    tools.timer_configure(0, 10, 0);
    tools.timer_start();
    tools.update(30.0);
    tools.stopwatch_start();
    clock.advance(1234.0);
    tools.stopwatch_lap();

    let persisted = tools.persisted();
    let (restored, _clock, _rx) = create_tools_from(Some(&persisted));
    let snapshot = restored.get_state();

    assert_eq!(snapshot.timer.remaining_seconds, 570.0);
    assert!(!snapshot.timer.is_running);
    assert_eq!(snapshot.stopwatch.laps.len(), 1);
    assert_eq!(snapshot.stopwatch.elapsed_time, 1234.0);
}

#[test]
fn snooze_extension_survives_restore() {
    let (mut tools, _clock, _rx) = create_tools();
    tools.timer_configure(0, 0, 10);
    tools.timer_start();
    tools.update(10.0);
    tools.timer_snooze();
    tools.update(1.0);
    tools.pomodoro_end_cycle();
    tools.pomodoro_snooze();

    let persisted = tools.persisted();
    let (mut restored, _clock, _rx) = create_tools_from(Some(&persisted));
    let snapshot = restored.get_state();

    assert_eq!(snapshot.timer.remaining_seconds, 299.0);
    assert_eq!(snapshot.pomodoro.phase, PomodoroPhase::ShortBreak);
    assert_eq!(snapshot.pomodoro.remaining_seconds, 600.0);

    restored.timer_start();
    restored.update(1.0);
    assert_eq!(restored.get_state().timer.remaining_seconds, 298.0);
}

// ============================================================================
// Update robustness
// ============================================================================

#[test]
fn invalid_deltas_do_not_move_time() {
    let (mut tools, _clock, _rx) = create_tools();
    tools.timer_configure(0, 1, 0);
    tools.timer_start();

    tools.update(-5.0);
    tools.update(f64::NAN);
    tools.update(f64::INFINITY);

    assert_eq!(tools.get_state().timer.remaining_seconds, 60.0);
}
