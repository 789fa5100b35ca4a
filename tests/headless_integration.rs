use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use chrono::FixedOffset;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use focusflight::app::{App, AppState, LaunchOptions, FRAME_INTERVAL};
use focusflight::geo;
use focusflight::runtime::{FixedTicker, FlightEvent, ManualClock, Runner, TestEventSource};
use focusflight::store::{MemoryStore, SqliteStore};
use focusflight::timer::TimerStatus;

// Headless integration using the internal runtime + App without a TTY.
// Ticks come from the Runner every millisecond; each one moves the manual
// clock forward by a full second.

const START_MS: i64 = 1_715_650_000_000;

fn key(code: KeyCode) -> FlightEvent {
    FlightEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn tz() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

fn one_minute_hop() -> LaunchOptions {
    LaunchOptions {
        origin: geo::city_by_name("Beijing"),
        destination: geo::city_by_name("Tianjin"),
        minutes: Some(1),
    }
}

/// Drive the app like the terminal loop does, for at most `max_steps` events
fn drive(
    app: &mut App,
    runner: &mut Runner<TestEventSource, FixedTicker>,
    clock: &ManualClock,
    max_steps: u32,
    done: impl Fn(&App) -> bool,
) {
    for _ in 0..max_steps {
        let event = runner.step();
        if let FlightEvent::Tick = event {
            clock.advance(Duration::from_secs(1));
        }
        app.handle(event);

        if app.take_tick_reset() {
            runner.reset_tick();
        }
        runner.set_frame_interval(app.needs_frames().then_some(FRAME_INTERVAL));

        if done(app) {
            return;
        }
    }
}

#[test]
fn headless_flight_lands_and_is_logged() {
    let clock = Rc::new(ManualClock::new(START_MS));
    let mut app = App::new(
        Rc::new(MemoryStore::new()),
        Box::new(Rc::clone(&clock)),
        tz(),
        one_minute_hop(),
    );

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &mut runner, &clock, 1_000, |app| {
        !app.records.history().is_empty()
    });

    assert_eq!(app.state, AppState::Flight);
    assert_eq!(app.records.history().len(), 1);
    assert_eq!(app.records.total_minutes(), 1);

    let record = &app.records.history()[0];
    assert_eq!(record.from_city, "Beijing");
    assert_eq!(record.to_city, "Tianjin");
    assert!(record.completed);
    assert_eq!(record.ended_at_epoch_ms - record.started_at_epoch_ms, 60_000);
    assert!(app.take_bell());

    tx.send(key(KeyCode::Enter)).unwrap();
    drive(&mut app, &mut runner, &clock, 100, |app| {
        app.state == AppState::Profile
    });
    assert_eq!(app.state, AppState::Profile);
}

#[test]
fn headless_focus_loss_pauses_until_resumed() {
    let clock = Rc::new(ManualClock::new(START_MS));
    let mut app = App::new(
        Rc::new(MemoryStore::new()),
        Box::new(Rc::clone(&clock)),
        tz(),
        one_minute_hop(),
    );

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(FlightEvent::FocusLost).unwrap();
    drive(&mut app, &mut runner, &clock, 20, |_| false);

    let timer = app.timer.as_ref().unwrap();
    assert_eq!(timer.status(), TimerStatus::Paused);
    let remaining = timer.remaining_sec();
    assert!(remaining > 50);

    // Ticks keep arriving but the countdown holds
    drive(&mut app, &mut runner, &clock, 20, |_| false);
    assert_eq!(app.timer.as_ref().unwrap().remaining_sec(), remaining);

    tx.send(FlightEvent::FocusGained).unwrap();
    tx.send(key(KeyCode::Char(' '))).unwrap();
    drive(&mut app, &mut runner, &clock, 1_000, |app| {
        !app.records.history().is_empty()
    });
    assert_eq!(app.records.history().len(), 1);
}

#[test]
fn headless_cancelled_flight_leaves_no_trace() {
    let clock = Rc::new(ManualClock::new(START_MS));
    let mut app = App::new(
        Rc::new(MemoryStore::new()),
        Box::new(Rc::clone(&clock)),
        tz(),
        one_minute_hop(),
    );

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();
    drive(&mut app, &mut runner, &clock, 200, |_| false);

    assert_eq!(app.state, AppState::Home);
    assert!(app.timer.is_none());
    assert!(app.records.history().is_empty());
    assert_eq!(app.records.total_minutes(), 0);
}

#[test]
fn flights_and_settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flights.db");
    let clock = Rc::new(ManualClock::new(START_MS));

    {
        let mut app = App::new(
            Rc::new(SqliteStore::open(&db).unwrap()),
            Box::new(Rc::clone(&clock)),
            tz(),
            one_minute_hop(),
        );
        app.settings.set_auto_pause(false).unwrap();
        app.take_off().unwrap();
        for _ in 0..60 {
            clock.advance(Duration::from_secs(1));
            app.handle(FlightEvent::Tick);
        }
        assert_eq!(app.records.history().len(), 1);
    }

    let app = App::new(
        Rc::new(SqliteStore::open(&db).unwrap()),
        Box::new(Rc::clone(&clock)),
        tz(),
        LaunchOptions::default(),
    );
    assert_eq!(app.records.history().len(), 1);
    assert_eq!(app.records.total_minutes(), 1);
    assert!(!app.settings.current().auto_pause_enabled);
    assert_eq!(app.profile_summary().streak, 1);
}
