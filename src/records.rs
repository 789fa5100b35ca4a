use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlightError, StoreError};
use crate::session::{MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};
use crate::store::{get_json, keys, set_json, KeyValueStore};

/// One finished flight. Append-only: never edited once stored.
///
/// Older logs used `duration`, `distance`, `startTime` and `endTime`; those
/// names are still accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusRecord {
    /// Creation time in epoch milliseconds, doubles as the dedup key
    pub id: i64,
    pub from_city: String,
    pub to_city: String,
    #[serde(alias = "duration")]
    pub duration_min: u32,
    pub flight_number: String,
    #[serde(alias = "distance", default)]
    pub distance_km: u32,
    #[serde(alias = "startTime")]
    pub started_at_epoch_ms: i64,
    #[serde(alias = "endTime")]
    pub ended_at_epoch_ms: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { total_minutes: u64 },
    /// A record with the same id was already logged; nothing changed
    Duplicate,
}

/// Owner of the flight log and the running total of focused minutes.
///
/// Every mutation writes through to the backing store before the in-memory
/// copy changes, so a failed write leaves both untouched.
#[derive(Debug)]
pub struct RecordStore<S: KeyValueStore> {
    store: S,
    history: Vec<FocusRecord>,
    total_minutes: u64,
    read_only: bool,
}

impl<S: KeyValueStore> RecordStore<S> {
    fn empty(store: S) -> Self {
        Self {
            store,
            history: Vec::new(),
            total_minutes: 0,
            read_only: false,
        }
    }

    pub fn open(store: S) -> Result<Self, FlightError> {
        let mut records = Self::empty(store);
        records.reload()?;
        Ok(records)
    }

    /// Open the log, or fall back to an empty read-only one when the stored
    /// value cannot be read.
    ///
    /// The unreadable value is left in place: appends are refused until a
    /// later [`reload`](Self::reload) succeeds or the log is cleared.
    pub fn open_or_read_only(store: S) -> (Self, Option<FlightError>) {
        let mut records = Self::empty(store);
        match records.reload() {
            Ok(()) => (records, None),
            Err(e) => {
                warn!("flight log opened read-only, stored value left untouched");
                records.read_only = true;
                (records, Some(e))
            }
        }
    }

    /// True while the stored log could not be read
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Re-read history and total from the backing store
    pub fn reload(&mut self) -> Result<(), FlightError> {
        let history: Vec<FocusRecord> = get_json(&self.store, keys::FOCUS_HISTORY)
            .inspect_err(|e| error!("failed to load focus history: {e}"))?
            .unwrap_or_default();

        let expected = completed_minutes(&history);
        let stored = self
            .load_stored_total()
            .inspect_err(|e| error!("failed to load total focus time: {e}"))?;

        match stored {
            Some(total) if total == expected => {}
            Some(total) => {
                warn!("stored total {total}m disagrees with history ({expected}m), using history");
            }
            None if expected > 0 => {
                warn!("total focus time missing, rebuilt as {expected}m from history");
            }
            None => {}
        }

        self.history = history;
        self.total_minutes = expected;
        self.read_only = false;
        Ok(())
    }

    fn load_stored_total(&self) -> Result<Option<u64>, StoreError> {
        // Older builds wrote the total as a string
        let value: Option<Value> = get_json(&self.store, keys::TOTAL_FOCUS_TIME)?;
        Ok(value.and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }))
    }

    /// Log a finished flight.
    ///
    /// Re-appending a known id is a no-op. Durations outside 1..=180 minutes
    /// are rejected without touching history or total.
    pub fn append(&mut self, record: FocusRecord) -> Result<AppendOutcome, FlightError> {
        if self.read_only {
            warn!("not logging record {}: flight log is unreadable", record.id);
            return Err(FlightError::LogUnreadable);
        }

        if self.history.iter().any(|r| r.id == record.id) {
            info!("record {} already logged, skipping", record.id);
            return Ok(AppendOutcome::Duplicate);
        }

        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&record.duration_min) {
            warn!(
                "rejecting record {} with duration {}m",
                record.id, record.duration_min
            );
            return Err(FlightError::InvalidDuration {
                got: record.duration_min as i64,
                min: MIN_SESSION_MINUTES,
                max: MAX_SESSION_MINUTES,
            });
        }

        let added = if record.completed {
            record.duration_min as u64
        } else {
            0
        };
        let new_total = self.total_minutes + added;

        let mut new_history = Vec::with_capacity(self.history.len() + 1);
        new_history.push(record);
        new_history.extend(self.history.iter().cloned());

        if let Err(e) = set_json(&self.store, keys::FOCUS_HISTORY, &new_history) {
            error!("failed to save focus history: {e}");
            return Err(e.into());
        }

        if let Err(e) = set_json(&self.store, keys::TOTAL_FOCUS_TIME, &new_total) {
            error!("failed to save total focus time: {e}");
            if let Err(rollback) = set_json(&self.store, keys::FOCUS_HISTORY, &self.history) {
                error!("failed to roll back focus history: {rollback}");
            }
            return Err(e.into());
        }

        self.history = new_history;
        self.total_minutes = new_total;

        info!(
            "logged flight {}: {}m, total {}m across {} records",
            self.history[0].id,
            self.history[0].duration_min,
            self.total_minutes,
            self.history.len()
        );

        Ok(AppendOutcome::Appended {
            total_minutes: new_total,
        })
    }

    /// Full log, newest first
    pub fn history(&self) -> &[FocusRecord] {
        &self.history
    }

    pub fn total_minutes(&self) -> u64 {
        self.total_minutes
    }

    /// Drop the whole log and reset the total. Irreversible.
    ///
    /// Also the way out of a read-only log.
    pub fn clear(&mut self) -> Result<(), FlightError> {
        for key in [keys::FOCUS_HISTORY, keys::TOTAL_FOCUS_TIME] {
            if let Err(e) = self.store.remove(key) {
                error!("failed to clear {key}: {e}");
                return Err(e.into());
            }
        }

        self.history.clear();
        self.total_minutes = 0;
        self.read_only = false;
        info!("flight log cleared");
        Ok(())
    }
}

fn completed_minutes(history: &[FocusRecord]) -> u64 {
    history
        .iter()
        .filter(|r| r.completed)
        .map(|r| r.duration_min as u64)
        .sum()
}
