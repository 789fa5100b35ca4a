use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum FlightEvent {
    Key(KeyEvent),
    Resize,
    FocusGained,
    FocusLost,
    /// One second of flight time has passed
    Tick,
    /// Animation redraw between ticks
    Frame,
}

/// Source of terminal events (keyboard, resize, focus)
pub trait FlightEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<FlightEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<FlightEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                // Release/repeat events show up on Windows; only presses matter
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => FlightEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => FlightEvent::Resize,
                Ok(CtEvent::FocusGained) => FlightEvent::FocusGained,
                Ok(CtEvent::FocusLost) => FlightEvent::FocusLost,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlightEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The one-second cadence the countdown is defined against
    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit and integration tests
pub struct TestEventSource {
    rx: Receiver<FlightEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FlightEvent>) -> Self {
        Self { rx }
    }
}

impl FlightEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlightEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are scheduled against a deadline, so a burst of key presses does not
/// stretch the interval between two ticks. An optional frame interval adds
/// `Frame` events between ticks for animations; those never touch the timer.
pub struct Runner<E: FlightEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
    frame_interval: Option<Duration>,
    next_frame: Option<Instant>,
}

impl<E: FlightEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
            frame_interval: None,
            next_frame: None,
        }
    }

    /// Restart the tick schedule, e.g. when a new flight takes off
    pub fn reset_tick(&mut self) {
        self.next_tick = Instant::now() + self.ticker.interval();
    }

    /// Emit `Frame` events every `interval`, or stop with `None`
    pub fn set_frame_interval(&mut self, interval: Option<Duration>) {
        if self.frame_interval == interval {
            return;
        }
        self.frame_interval = interval;
        self.next_frame = interval.map(|i| Instant::now() + i);
    }

    /// Blocks until the next event or deadline, whichever comes first
    pub fn step(&mut self) -> FlightEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.fire_due(now);
        }
        if self.next_frame.is_some_and(|f| now >= f) {
            return self.fire_due(now);
        }

        let deadline = match self.next_frame {
            Some(frame) => frame.min(self.next_tick),
            None => self.next_tick,
        };

        match self.event_source.recv_timeout(deadline - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.fire_due(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                self.fire_due(Instant::now())
            }
        }
    }

    fn fire_due(&mut self, now: Instant) -> FlightEvent {
        if now >= self.next_tick {
            self.next_tick = advance(self.next_tick, self.ticker.interval(), now);
            return FlightEvent::Tick;
        }
        if let (Some(frame), Some(interval)) = (self.next_frame, self.frame_interval) {
            self.next_frame = Some(advance(frame, interval, now));
        }
        FlightEvent::Frame
    }
}

fn advance(deadline: Instant, interval: Duration, now: Instant) -> Instant {
    let next = deadline + interval;
    // After a long stall, skip missed deadlines instead of replaying them
    if next <= now {
        now + interval
    } else {
        next
    }
}

/// Wall-clock source for record timestamps
pub trait Clock {
    fn now_ms(&self) -> i64;
}

impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as i64);
    }

    pub fn set(&self, ms: i64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            FlightEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(FlightEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(50));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            FlightEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn events_do_not_postpone_the_tick() {
        let (tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(20));
        let mut runner = Runner::new(es, ticker);

        for _ in 0..5 {
            tx.send(FlightEvent::FocusGained).unwrap();
        }
        std::thread::sleep(Duration::from_millis(25));

        // The deadline already passed, so the tick wins over queued events
        assert!(matches!(runner.step(), FlightEvent::Tick));
        assert!(matches!(runner.step(), FlightEvent::FocusGained));
    }

    #[test]
    fn disconnected_source_still_ticks() {
        let (tx, rx) = mpsc::channel::<FlightEvent>();
        drop(tx);
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(2)),
        );
        assert!(matches!(runner.step(), FlightEvent::Tick));
    }

    #[test]
    fn frames_fill_the_gap_between_ticks() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(200)),
        );
        runner.set_frame_interval(Some(Duration::from_millis(20)));

        let events: Vec<FlightEvent> = (0..3).map(|_| runner.step()).collect();
        assert!(events.iter().all(|e| matches!(e, FlightEvent::Frame)));

        runner.set_frame_interval(None);
        assert!(matches!(runner.step(), FlightEvent::Tick));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 3_000);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }
}
