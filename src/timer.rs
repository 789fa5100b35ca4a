use log::{debug, info};
use strum_macros::Display;

use crate::error::FlightError;
use crate::records::FocusRecord;
use crate::runtime::Clock;
use crate::session::{SessionConfig, SessionState, MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};
use crate::util::format_clock;

/// Cruise altitude in metres the flight view levels off at
pub const CRUISE_ALTITUDE_M: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TimerStatus {
    Running,
    Paused,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or already finished; nothing changed
    Ignored,
    Advanced,
    /// The countdown hit zero. Carries the record to log.
    Arrived(FocusRecord),
}

/// One-second countdown bound to a route.
///
/// Construction starts the flight. `Completed` and `Cancelled` are terminal
/// and every later call is a no-op.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    config: SessionConfig,
    state: SessionState,
    status: TimerStatus,
}

impl SessionTimer {
    pub fn start<C: Clock + ?Sized>(config: SessionConfig, clock: &C) -> Result<Self, FlightError> {
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&config.duration_min) {
            return Err(FlightError::InvalidDuration {
                got: config.duration_min as i64,
                min: MIN_SESSION_MINUTES,
                max: MAX_SESSION_MINUTES,
            });
        }

        let state = SessionState::new(config.duration_min * 60, clock.now_ms());
        info!(
            "flight {} took off: {} -> {}, {}m",
            config.flight_number, config.from.name, config.to.name, config.duration_min
        );

        Ok(Self {
            config,
            state,
            status: TimerStatus::Running,
        })
    }

    /// Advance by one second
    pub fn tick<C: Clock + ?Sized>(&mut self, clock: &C) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }

        if self.state.remaining_sec > 1 {
            self.state.remaining_sec -= 1;
            return TickOutcome::Advanced;
        }

        self.state.remaining_sec = 0;
        self.state.completed = true;
        self.status = TimerStatus::Completed;

        let now = clock.now_ms();
        info!(
            "flight {} arrived at {} after {}m",
            self.config.flight_number, self.config.to.name, self.config.duration_min
        );

        TickOutcome::Arrived(FocusRecord {
            id: now,
            from_city: self.config.from.name.clone(),
            to_city: self.config.to.name.clone(),
            duration_min: self.config.duration_min,
            flight_number: self.config.flight_number.clone(),
            distance_km: self.config.distance_km,
            started_at_epoch_ms: self.state.started_at_epoch_ms,
            ended_at_epoch_ms: now,
            completed: true,
        })
    }

    pub fn toggle_pause(&mut self) -> TimerStatus {
        match self.status {
            TimerStatus::Running => self.pause(),
            TimerStatus::Paused => self.resume(),
            _ => {}
        }
        self.status
    }

    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
            self.state.paused = true;
            info!("flight {} paused", self.config.flight_number);
        }
    }

    pub fn resume(&mut self) {
        if self.status == TimerStatus::Paused {
            self.status = TimerStatus::Running;
            self.state.paused = false;
            info!("flight {} resumed", self.config.flight_number);
        }
    }

    /// Abort the flight. No record is produced.
    pub fn cancel(&mut self) {
        match self.status {
            TimerStatus::Running | TimerStatus::Paused => {
                self.status = TimerStatus::Cancelled;
                info!(
                    "flight {} cancelled with {}s focused",
                    self.config.flight_number,
                    self.state.focused_sec()
                );
            }
            other => debug!("cancel ignored in state {other}"),
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TimerStatus::Completed | TimerStatus::Cancelled
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn remaining_sec(&self) -> u32 {
        self.state.remaining_sec
    }

    pub fn focused_sec(&self) -> u32 {
        self.state.focused_sec()
    }

    pub fn progress(&self) -> f64 {
        if self.state.total_sec == 0 {
            return 0.0;
        }
        self.focused_sec() as f64 / self.state.total_sec as f64
    }

    pub fn progress_percent(&self) -> u32 {
        (self.progress() * 100.0).round() as u32
    }

    pub fn altitude(&self) -> i64 {
        altitude_for(self.progress())
    }

    /// Remaining time as `MM:SS`
    pub fn display_time(&self) -> String {
        format_clock(self.state.remaining_sec)
    }

    /// Elapsed focus time as `MM:SS`
    pub fn focused_time(&self) -> String {
        format_clock(self.focused_sec())
    }

    pub fn status_text(&self) -> &'static str {
        match self.status {
            TimerStatus::Running if self.progress() < 0.2 => "Taking off...",
            TimerStatus::Running => "Cruising",
            TimerStatus::Paused => "Paused",
            TimerStatus::Completed => "Arrived!",
            TimerStatus::Cancelled => "Cancelled",
        }
    }
}

/// Climb over the first fifth, wobble at cruise, descend over the last fifth
pub fn altitude_for(progress: f64) -> i64 {
    let cruise = CRUISE_ALTITUDE_M as f64;
    if progress < 0.2 {
        (progress * 5.0 * cruise).round() as i64
    } else if progress < 0.8 {
        CRUISE_ALTITUDE_M + ((progress * 10.0).sin() * 1000.0).round() as i64
    } else {
        (cruise * (1.0 - (progress - 0.8) * 5.0)).round() as i64
    }
}
