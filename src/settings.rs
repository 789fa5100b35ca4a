use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::error::FlightError;
use crate::geo::{self, City};
use crate::session::{MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};
use crate::store::{get_json, keys, set_json, KeyValueStore};

pub const DEFAULT_MIN_DURATION: u32 = 5;
pub const DEFAULT_MAX_DURATION: u32 = 180;

/// Persisted user preferences. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub default_city: City,
    pub sound_enabled: bool,
    /// Kept for compatibility; terminals cannot vibrate
    pub vibration_enabled: bool,
    pub min_duration: u32,
    pub max_duration: u32,
    pub auto_pause_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_city: geo::home_city().clone(),
            sound_enabled: true,
            vibration_enabled: true,
            min_duration: DEFAULT_MIN_DURATION,
            max_duration: DEFAULT_MAX_DURATION,
            auto_pause_enabled: true,
        }
    }
}

impl AppSettings {
    /// Range a planned flight may be adjusted within
    pub fn duration_bounds(&self) -> (u32, u32) {
        (
            self.min_duration.max(MIN_SESSION_MINUTES),
            self.max_duration.min(MAX_SESSION_MINUTES),
        )
    }

    pub fn clamp_duration(&self, minutes: u32) -> u32 {
        let (lo, hi) = self.duration_bounds();
        minutes.clamp(lo, hi.max(lo))
    }

    /// Replace zero or inverted bounds left behind by older data
    fn sanitized(mut self) -> Self {
        if self.min_duration == 0 {
            self.min_duration = DEFAULT_MIN_DURATION;
        }
        if self.max_duration == 0 {
            self.max_duration = DEFAULT_MAX_DURATION;
        }
        if self.min_duration >= self.max_duration {
            warn!(
                "stored duration bounds {}..{} are inverted, using defaults",
                self.min_duration, self.max_duration
            );
            self.min_duration = DEFAULT_MIN_DURATION;
            self.max_duration = DEFAULT_MAX_DURATION;
        }
        self
    }
}

/// Choices offered for the shortest flight
pub fn min_duration_options() -> Vec<u32> {
    (5..=60).step_by(5).collect()
}

/// Choices offered for the longest flight
pub fn max_duration_options() -> Vec<u32> {
    (30..=300).step_by(15).collect()
}

/// Write-through holder for [`AppSettings`]
#[derive(Debug)]
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
    current: AppSettings,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Load stored settings; unreadable values fall back to defaults
    pub fn load(store: S) -> Self {
        let current = match get_json::<_, AppSettings>(&store, keys::APP_SETTINGS) {
            Ok(Some(settings)) => settings.sanitized(),
            Ok(None) => AppSettings::default(),
            Err(e) => {
                error!("failed to load settings, using defaults: {e}");
                AppSettings::default()
            }
        };
        Self { store, current }
    }

    pub fn current(&self) -> &AppSettings {
        &self.current
    }

    /// Forget the cached copy, e.g. after every key was wiped
    pub fn reset(&mut self) {
        self.current = AppSettings::default();
    }

    fn update(&mut self, change: impl FnOnce(&mut AppSettings)) -> Result<(), FlightError> {
        let mut next = self.current.clone();
        change(&mut next);

        if let Err(e) = set_json(&self.store, keys::APP_SETTINGS, &next) {
            error!("failed to save settings: {e}");
            return Err(e.into());
        }
        debug!("settings updated: {next:?}");
        self.current = next;
        Ok(())
    }

    pub fn set_default_city(&mut self, city: &City) -> Result<(), FlightError> {
        let city = city.clone();
        self.update(|s| s.default_city = city)
    }

    pub fn set_sound(&mut self, enabled: bool) -> Result<(), FlightError> {
        self.update(|s| s.sound_enabled = enabled)
    }

    pub fn set_vibration(&mut self, enabled: bool) -> Result<(), FlightError> {
        self.update(|s| s.vibration_enabled = enabled)
    }

    pub fn set_auto_pause(&mut self, enabled: bool) -> Result<(), FlightError> {
        self.update(|s| s.auto_pause_enabled = enabled)
    }

    pub fn set_min_duration(&mut self, minutes: u32) -> Result<(), FlightError> {
        if !min_duration_options().contains(&minutes) {
            return Err(FlightError::InvalidSetting(format!(
                "{minutes} minutes is not an offered minimum"
            )));
        }
        if minutes >= self.current.max_duration {
            return Err(FlightError::InvalidSetting(
                "Minimum must be shorter than the maximum".to_string(),
            ));
        }
        self.update(|s| s.min_duration = minutes)
    }

    pub fn set_max_duration(&mut self, minutes: u32) -> Result<(), FlightError> {
        if !max_duration_options().contains(&minutes) {
            return Err(FlightError::InvalidSetting(format!(
                "{minutes} minutes is not an offered maximum"
            )));
        }
        if minutes <= self.current.min_duration {
            return Err(FlightError::InvalidSetting(
                "Maximum must be longer than the minimum".to_string(),
            ));
        }
        self.update(|s| s.max_duration = minutes)
    }

    /// Step the minimum to the next or previous offered value
    pub fn cycle_min_duration(&mut self, forward: bool) -> Result<(), FlightError> {
        let next = cycle(&min_duration_options(), self.current.min_duration, forward);
        self.set_min_duration(next)
    }

    pub fn cycle_max_duration(&mut self, forward: bool) -> Result<(), FlightError> {
        let next = cycle(&max_duration_options(), self.current.max_duration, forward);
        self.set_max_duration(next)
    }
}

fn cycle(options: &[u32], current: u32, forward: bool) -> u32 {
    let len = options.len();
    let idx = options.iter().position(|&o| o == current);
    let next = match (idx, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, _) => 0,
    };
    options[next]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use std::rc::Rc;

    #[test]
    fn defaults_when_nothing_is_stored() {
        let settings = SettingsStore::load(MemoryStore::new());
        let current = settings.current();
        assert_eq!(current.default_city.name, "Beijing");
        assert!(current.sound_enabled);
        assert!(current.vibration_enabled);
        assert!(current.auto_pause_enabled);
        assert_eq!((current.min_duration, current.max_duration), (5, 180));
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let store = MemoryStore::new();
        store
            .set(keys::APP_SETTINGS, r#"{"soundEnabled":false,"minDuration":10}"#)
            .unwrap();

        let settings = SettingsStore::load(store);
        assert!(!settings.current().sound_enabled);
        assert_eq!(settings.current().min_duration, 10);
        assert_eq!(settings.current().max_duration, 180);
        assert!(settings.current().auto_pause_enabled);
    }

    #[test]
    fn changes_are_persisted() {
        let store = Rc::new(MemoryStore::new());
        let mut settings = SettingsStore::load(Rc::clone(&store));
        settings.set_sound(false).unwrap();
        settings
            .set_default_city(geo::city_by_name("Chengdu").unwrap())
            .unwrap();

        let reloaded = SettingsStore::load(store);
        assert!(!reloaded.current().sound_enabled);
        assert_eq!(reloaded.current().default_city.name, "Chengdu");
    }

    #[test]
    fn min_must_stay_below_max() {
        let mut settings = SettingsStore::load(MemoryStore::new());
        settings.set_max_duration(45).unwrap();

        assert_matches!(
            settings.set_min_duration(45),
            Err(FlightError::InvalidSetting(_))
        );
        assert_matches!(
            settings.set_min_duration(7),
            Err(FlightError::InvalidSetting(_))
        );
        settings.set_min_duration(40).unwrap();

        assert_matches!(
            settings.set_max_duration(30),
            Err(FlightError::InvalidSetting(_))
        );
        assert_eq!(settings.current().min_duration, 40);
        assert_eq!(settings.current().max_duration, 45);
    }

    #[test]
    fn cycling_walks_the_offered_values() {
        let mut settings = SettingsStore::load(MemoryStore::new());
        settings.cycle_min_duration(true).unwrap();
        assert_eq!(settings.current().min_duration, 10);
        settings.cycle_min_duration(false).unwrap();
        settings.cycle_min_duration(false).unwrap();
        assert_eq!(settings.current().min_duration, 60);

        settings.cycle_max_duration(true).unwrap();
        assert_eq!(settings.current().max_duration, 195);
    }

    #[test]
    fn inverted_bounds_are_reset_on_load() {
        let store = MemoryStore::new();
        store
            .set(keys::APP_SETTINGS, r#"{"minDuration":60,"maxDuration":30}"#)
            .unwrap();
        let settings = SettingsStore::load(store);
        assert_eq!(settings.current().duration_bounds(), (5, 180));
    }

    #[test]
    fn duration_bounds_respect_session_limits() {
        let settings = AppSettings {
            min_duration: 20,
            max_duration: 300,
            ..AppSettings::default()
        };
        assert_eq!(settings.duration_bounds(), (20, 180));
        assert_eq!(settings.clamp_duration(5), 20);
        assert_eq!(settings.clamp_duration(240), 180);
        assert_eq!(settings.clamp_duration(45), 45);
    }

    #[test]
    fn options_match_the_pickers() {
        assert_eq!(min_duration_options().len(), 12);
        assert_eq!(max_duration_options().first(), Some(&30));
        assert_eq!(max_duration_options().last(), Some(&300));
    }
}
