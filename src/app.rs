use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use strum_macros::Display;
use webbrowser::Browser;

use crate::app_dirs::AppDirs;
use crate::celebration::Celebration;
use crate::error::FlightError;
use crate::export::{self, ExportFormat};
use crate::geo::{self, City};
use crate::profile::{self, UserInfo};
use crate::records::{AppendOutcome, FocusRecord, RecordStore};
use crate::route::{self, Route};
use crate::runtime::{Clock, FlightEvent};
use crate::session::{SessionConfig, SessionParams};
use crate::settings::SettingsStore;
use crate::stats::{self, DayGroup, ProfileSummary};
use crate::store::KeyValueStore;
use crate::timer::{SessionTimer, TickOutcome, TimerStatus};
use crate::util::format_minutes;

pub type SharedStore = Rc<dyn KeyValueStore>;

/// Step used by the duration +/- keys on the route screen
pub const DURATION_STEP_MIN: i32 = 5;
/// Redraw cadence while the arrival animation plays
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const TOAST_SECS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AppState {
    Home,
    Flight,
    Profile,
    Calendar,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerFocus {
    Origin,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SettingsItem {
    #[strum(serialize = "Default city")]
    DefaultCity,
    #[strum(serialize = "Arrival sound")]
    Sound,
    #[strum(serialize = "Vibration")]
    Vibration,
    #[strum(serialize = "Auto-pause when away")]
    AutoPause,
    #[strum(serialize = "Shortest flight")]
    MinDuration,
    #[strum(serialize = "Longest flight")]
    MaxDuration,
    #[strum(serialize = "Export flight log")]
    Export,
    #[strum(serialize = "Clear all data")]
    ClearData,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 8] = [
        SettingsItem::DefaultCity,
        SettingsItem::Sound,
        SettingsItem::Vibration,
        SettingsItem::AutoPause,
        SettingsItem::MinDuration,
        SettingsItem::MaxDuration,
        SettingsItem::Export,
        SettingsItem::ClearData,
    ];

    /// Items whose change invalidates the planned route
    pub fn affects_route(self) -> bool {
        matches!(
            self,
            SettingsItem::DefaultCity | SettingsItem::MinDuration | SettingsItem::MaxDuration
        )
    }
}

/// Transient one-line message at the bottom of the screen
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub text: String,
    pub is_error: bool,
    ttl: u8,
}

/// Origin/destination selection on the route screen
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePicker {
    pub origin: usize,
    pub destination: usize,
    pub focus: PickerFocus,
    popular: Option<usize>,
}

/// Values taken from the command line before the UI starts
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub origin: Option<&'static City>,
    pub destination: Option<&'static City>,
    pub minutes: Option<u32>,
}

pub struct App {
    pub state: AppState,
    pub records: RecordStore<SharedStore>,
    pub settings: SettingsStore<SharedStore>,
    pub user: UserInfo,
    pub picker: RoutePicker,
    pub planned: Option<Route>,
    pub timer: Option<SessionTimer>,
    pub celebration: Celebration,
    pub toast: Option<Toast>,
    pub calendar_month: NaiveDate,
    pub calendar_selected: NaiveDate,
    pub settings_cursor: usize,
    pub confirm_cancel: bool,
    pub confirm_clear: bool,
    pub should_quit: bool,
    tz: FixedOffset,
    store: SharedStore,
    clock: Box<dyn Clock>,
    viewport: (u16, u16),
    bell: bool,
    tick_reset: bool,
}

impl App {
    pub fn new(
        store: SharedStore,
        clock: Box<dyn Clock>,
        tz: FixedOffset,
        launch: LaunchOptions,
    ) -> Self {
        let (records, history_error) = RecordStore::open_or_read_only(Rc::clone(&store));
        let settings = SettingsStore::load(Rc::clone(&store));
        let user = load_user(&store);

        let origin = launch
            .origin
            .map(city_index)
            .unwrap_or_else(|| city_index(&settings.current().default_city));
        let destination = launch
            .destination
            .map(city_index)
            .unwrap_or((origin + 1) % geo::all_cities().len());

        let mut app = Self {
            state: AppState::Home,
            records,
            settings,
            user,
            picker: RoutePicker {
                origin,
                destination,
                focus: PickerFocus::Destination,
                popular: None,
            },
            planned: None,
            timer: None,
            celebration: Celebration::new(),
            toast: None,
            calendar_month: NaiveDate::default(),
            calendar_selected: NaiveDate::default(),
            settings_cursor: 0,
            confirm_cancel: false,
            confirm_clear: false,
            should_quit: false,
            tz,
            store,
            clock,
            viewport: (80, 24),
            bell: false,
            tick_reset: false,
        };

        let today = app.today();
        app.select_day(today);
        app.replan();

        if let Some(minutes) = launch.minutes {
            if let Err(e) = app.set_duration(minutes) {
                app.notify_error(&e);
            }
        }

        if let Some(e) = history_error {
            error!("could not load flight history: {e}");
            app.notify_error(&FlightError::LogUnreadable);
        }

        app
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.tz
            .timestamp_millis_opt(self.clock.now_ms())
            .single()
            .unwrap_or_else(|| Utc::now().with_timezone(&self.tz))
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn tz(&self) -> &FixedOffset {
        &self.tz
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
    }

    /// True once after arrival when the terminal bell should ring
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    /// True once after take-off, so the tick schedule can restart
    pub fn take_tick_reset(&mut self) -> bool {
        std::mem::take(&mut self.tick_reset)
    }

    pub fn needs_frames(&self) -> bool {
        self.celebration.is_active()
    }

    pub fn origin(&self) -> &'static City {
        &geo::all_cities()[self.picker.origin]
    }

    pub fn destination(&self) -> &'static City {
        &geo::all_cities()[self.picker.destination]
    }

    pub fn profile_summary(&self) -> ProfileSummary {
        stats::profile_summary(
            self.records.history(),
            self.records.total_minutes(),
            self.today(),
            &self.tz,
        )
    }

    pub fn day_groups(&self) -> BTreeMap<NaiveDate, DayGroup> {
        stats::group_by_day(self.records.history(), &self.tz)
    }

    pub fn handle(&mut self, event: FlightEvent) {
        match event {
            FlightEvent::Key(key) => self.on_key(key),
            FlightEvent::Tick => self.on_tick(),
            FlightEvent::Frame => self.on_frame(FRAME_INTERVAL.as_secs_f64()),
            FlightEvent::FocusLost => self.on_focus_lost(),
            FlightEvent::FocusGained | FlightEvent::Resize => {}
        }
    }

    /// One second of wall time
    pub fn on_tick(&mut self) {
        let outcome = match self.timer.as_mut() {
            Some(timer) => timer.tick(self.clock.as_ref()),
            None => TickOutcome::Ignored,
        };
        if let TickOutcome::Arrived(record) = outcome {
            self.land(record);
        }

        if let Some(toast) = self.toast.as_mut() {
            toast.ttl = toast.ttl.saturating_sub(1);
            if toast.ttl == 0 {
                self.toast = None;
            }
        }
    }

    pub fn on_frame(&mut self, dt: f64) {
        self.celebration.update(dt);
    }

    pub fn on_focus_lost(&mut self) {
        if !self.settings.current().auto_pause_enabled {
            return;
        }
        if let Some(timer) = self.timer.as_mut() {
            if timer.status() == TimerStatus::Running {
                timer.pause();
                self.notify("Flight paused while you were away");
            }
        }
    }

    fn land(&mut self, record: FocusRecord) {
        let destination = record.to_city.clone();
        let minutes = record.duration_min;

        match self.records.append(record) {
            Ok(AppendOutcome::Appended { .. }) => self.notify(format!(
                "Welcome to {destination}! {} of focus logged",
                format_minutes(minutes)
            )),
            Ok(AppendOutcome::Duplicate) => {}
            Err(e) => self.notify_error(&e),
        }

        let (w, h) = self.viewport;
        self.celebration.start(w, h, &mut rand::thread_rng());
        if self.settings.current().sound_enabled {
            self.bell = true;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match self.state {
            AppState::Home => self.on_home_key(key),
            AppState::Flight => self.on_flight_key(key),
            AppState::Profile => self.on_profile_key(key),
            AppState::Calendar => self.on_calendar_key(key),
            AppState::Settings => self.on_settings_key(key),
        }
    }

    /// Screen switching shared by every screen except the flight view
    fn on_nav_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('1') => self.state = AppState::Home,
            KeyCode::Char('2') => self.state = AppState::Profile,
            KeyCode::Char('3') => self.state = AppState::Calendar,
            KeyCode::Char('4') => self.state = AppState::Settings,
            KeyCode::Char('q') => self.quit(),
            KeyCode::Esc if self.state == AppState::Home => self.quit(),
            KeyCode::Esc => self.state = AppState::Home,
            _ => {}
        }
    }

    fn quit(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
        self.should_quit = true;
    }

    fn on_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.picker.focus = match self.picker.focus {
                    PickerFocus::Origin => PickerFocus::Destination,
                    PickerFocus::Destination => PickerFocus::Origin,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Left | KeyCode::Char('-') => self.adjust_duration(-DURATION_STEP_MIN),
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.adjust_duration(DURATION_STEP_MIN)
            }
            KeyCode::Char('s') => {
                std::mem::swap(&mut self.picker.origin, &mut self.picker.destination);
                self.replan();
            }
            KeyCode::Char('p') => self.next_popular_route(),
            KeyCode::Enter => {
                if let Err(e) = self.take_off() {
                    self.notify_error(&e);
                }
            }
            _ => self.on_nav_key(key),
        }
    }

    fn move_selection(&mut self, delta: i32) {
        let len = geo::all_cities().len() as i32;
        let slot = match self.picker.focus {
            PickerFocus::Origin => &mut self.picker.origin,
            PickerFocus::Destination => &mut self.picker.destination,
        };
        *slot = (*slot as i32 + delta).rem_euclid(len) as usize;
        self.picker.popular = None;
        self.replan();
    }

    /// Rebuild the planned route from the picker, fitting the estimate into
    /// the configured duration bounds
    pub fn replan(&mut self) {
        let (from, to) = (self.origin(), self.destination());
        self.planned = match Route::plan(from, to) {
            Ok(route) => {
                let minutes = self.settings.current().clamp_duration(route.duration_min);
                match route.with_duration(minutes) {
                    Ok(route) => Some(route),
                    Err(e) => {
                        warn!("cannot fit {} -> {} into settings: {e}", from.name, to.name);
                        None
                    }
                }
            }
            Err(e) => {
                debug!("no route: {e}");
                None
            }
        };
    }

    pub fn adjust_duration(&mut self, delta: i32) {
        let Some(route) = self.planned.take() else {
            return;
        };
        let (lo, hi) = self.settings.current().duration_bounds();
        let next = (route.duration_min as i32 + delta).clamp(lo as i32, hi.max(lo) as i32) as u32;

        self.planned = match route.clone().with_duration(next) {
            Ok(adjusted) => Some(adjusted),
            Err(e) => {
                self.notify_error(&e);
                Some(route)
            }
        };
    }

    /// Explicit flight time, e.g. from the command line
    pub fn set_duration(&mut self, minutes: u32) -> Result<(), FlightError> {
        let route = self.planned.take().ok_or_else(|| self.no_route_error())?;
        match route.clone().with_duration(minutes) {
            Ok(adjusted) => {
                self.planned = Some(adjusted);
                Ok(())
            }
            Err(e) => {
                self.planned = Some(route);
                Err(e)
            }
        }
    }

    fn next_popular_route(&mut self) {
        let routes = route::popular_routes();
        if routes.is_empty() {
            return;
        }
        let idx = self.picker.popular.map_or(0, |i| (i + 1) % routes.len());
        let chosen = routes[idx].clone();
        let minutes = self.settings.current().clamp_duration(chosen.duration_min);

        self.picker.origin = city_index(&chosen.from);
        self.picker.destination = city_index(&chosen.to);
        self.picker.popular = Some(idx);
        self.planned = match chosen.clone().with_duration(minutes) {
            Ok(route) => Some(route),
            Err(e) => {
                warn!("keeping preset time for {}: {e}", chosen.flight_number);
                Some(chosen)
            }
        };
    }

    fn no_route_error(&self) -> FlightError {
        FlightError::SameCity(self.origin().name.clone())
    }

    pub fn take_off(&mut self) -> Result<(), FlightError> {
        let route = self.planned.as_ref().ok_or_else(|| self.no_route_error())?;
        let params = SessionConfig::from(route).to_params();
        self.start_flight(&params)
    }

    /// Switch to the flight view with the hand-off parameters from route selection
    pub fn start_flight(&mut self, params: &SessionParams) -> Result<(), FlightError> {
        let config = SessionConfig::from_params(params)?;
        let timer = SessionTimer::start(config, self.clock.as_ref())?;

        self.timer = Some(timer);
        self.state = AppState::Flight;
        self.confirm_cancel = false;
        self.tick_reset = true;
        self.toast = None;
        Ok(())
    }

    fn on_flight_key(&mut self, key: KeyEvent) {
        let finished = self.timer.as_ref().map_or(true, |t| t.is_finished());
        let confirming = std::mem::take(&mut self.confirm_cancel);

        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') if !finished => {
                if let Some(timer) = self.timer.as_mut() {
                    match timer.toggle_pause() {
                        TimerStatus::Paused => self.notify("Flight paused"),
                        TimerStatus::Running => self.notify("Resuming flight"),
                        _ => {}
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('x') if !finished => {
                if confirming {
                    if let Some(timer) = self.timer.as_mut() {
                        timer.cancel();
                    }
                    self.leave_flight(AppState::Home);
                    self.notify("Flight cancelled, progress not saved");
                } else {
                    self.confirm_cancel = true;
                    self.notify("Press Esc again to abandon this flight");
                }
            }
            KeyCode::Enter if finished => self.leave_flight(AppState::Profile),
            KeyCode::Esc if finished => self.leave_flight(AppState::Home),
            KeyCode::Char('q') if finished => self.quit(),
            _ => {}
        }
    }

    fn leave_flight(&mut self, next: AppState) {
        self.timer = None;
        self.celebration.stop();
        self.state = next;
        self.replan();
    }

    fn on_profile_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('t') => self.share(),
            _ => self.on_nav_key(key),
        }
    }

    fn share(&mut self) {
        let summary = self.profile_summary();
        let message = stats::share_message(summary.flights, summary.total_minutes);

        let opened = Browser::is_available()
            && stats::share_url(&message).is_some_and(|url| match webbrowser::open(&url) {
                Ok(()) => true,
                Err(e) => {
                    warn!("failed to open browser: {e}");
                    false
                }
            });

        if !opened {
            self.notify(message);
        }
    }

    fn on_calendar_key(&mut self, key: KeyEvent) {
        let selected = self.calendar_selected;
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.select_day(selected - chrono::Duration::days(1)),
            KeyCode::Right | KeyCode::Char('l') => {
                self.select_day(selected + chrono::Duration::days(1))
            }
            KeyCode::Up | KeyCode::Char('k') => self.select_day(selected - chrono::Duration::days(7)),
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_day(selected + chrono::Duration::days(7))
            }
            KeyCode::Char('[') | KeyCode::PageUp => {
                self.select_day(stats::shift_month(self.calendar_month, -1))
            }
            KeyCode::Char(']') | KeyCode::PageDown => {
                self.select_day(stats::shift_month(self.calendar_month, 1))
            }
            KeyCode::Char('t') => {
                let today = self.today();
                self.select_day(today);
            }
            _ => self.on_nav_key(key),
        }
    }

    pub fn select_day(&mut self, day: NaiveDate) {
        self.calendar_selected = day;
        self.calendar_month = stats::shift_month(day, 0);
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        if std::mem::take(&mut self.confirm_clear) {
            if key.code == KeyCode::Char('y') {
                match self.clear_all_data() {
                    Ok(()) => self.notify("All flights and settings erased"),
                    Err(e) => self.notify_error(&e),
                }
            } else {
                self.notify("Nothing was erased");
            }
            return;
        }

        let items = SettingsItem::ALL.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.settings_cursor = (self.settings_cursor + items - 1) % items
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.settings_cursor = (self.settings_cursor + 1) % items
            }
            KeyCode::Left | KeyCode::Char('h') => self.apply_setting(false),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
                self.apply_setting(true)
            }
            _ => self.on_nav_key(key),
        }
    }

    pub fn selected_setting(&self) -> SettingsItem {
        SettingsItem::ALL[self.settings_cursor % SettingsItem::ALL.len()]
    }

    fn apply_setting(&mut self, forward: bool) {
        let current = self.settings.current().clone();
        let item = self.selected_setting();
        let result = match item {
            SettingsItem::DefaultCity => {
                let cities = geo::all_cities();
                let idx = city_index(&current.default_city) as i32 + if forward { 1 } else { -1 };
                let city = &cities[idx.rem_euclid(cities.len() as i32) as usize];
                self.settings.set_default_city(city).map(|()| {
                    self.picker.origin = city_index(city);
                })
            }
            SettingsItem::Sound => self.settings.set_sound(!current.sound_enabled),
            SettingsItem::Vibration => self.settings.set_vibration(!current.vibration_enabled),
            SettingsItem::AutoPause => self.settings.set_auto_pause(!current.auto_pause_enabled),
            SettingsItem::MinDuration => self.settings.cycle_min_duration(forward),
            SettingsItem::MaxDuration => self.settings.cycle_max_duration(forward),
            SettingsItem::Export => {
                let path = default_export_path(self.now());
                self.export_to(&path).map(|_| {
                    self.notify(format!("Exported to {}", path.display()));
                })
            }
            SettingsItem::ClearData => {
                self.confirm_clear = true;
                self.notify("Press y to erase every flight and setting");
                Ok(())
            }
        };

        match result {
            Ok(()) if item.affects_route() => self.replan(),
            Ok(()) => {}
            Err(e) => self.notify_error(&e),
        }
    }

    pub fn export_to(&self, path: &Path) -> Result<ExportFormat, FlightError> {
        let at = Utc
            .timestamp_millis_opt(self.clock.now_ms())
            .single()
            .unwrap_or_else(Utc::now);
        export::export_to_path(&self.records, path, at).map_err(|e| {
            error!("export to {} failed: {e}", path.display());
            FlightError::from(e)
        })
    }

    /// Wipe every stored key and start over with defaults
    pub fn clear_all_data(&mut self) -> Result<(), FlightError> {
        self.records.clear()?;
        if let Err(e) = self.store.clear() {
            error!("failed to clear storage: {e}");
            return Err(e.into());
        }

        self.settings.reset();
        self.user = load_user(&self.store);
        self.picker.origin = city_index(&self.settings.current().default_city);
        self.replan();
        info!("all data cleared");
        Ok(())
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            is_error: false,
            ttl: TOAST_SECS,
        });
    }

    fn notify_error(&mut self, e: &FlightError) {
        warn!("{e}");
        self.alert(e.user_message());
    }

    /// Like [`notify`](Self::notify), styled as an error
    pub fn alert(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            is_error: true,
            ttl: TOAST_SECS,
        });
    }
}

fn city_index(city: &City) -> usize {
    geo::all_cities()
        .iter()
        .position(|c| c.id == city.id)
        .unwrap_or(0)
}

fn load_user(store: &SharedStore) -> UserInfo {
    profile::load_or_create(&**store, &mut rand::thread_rng()).unwrap_or_else(|e| {
        warn!("using a temporary profile: {e}");
        UserInfo::default()
    })
}

pub fn default_export_path(now: DateTime<FixedOffset>) -> PathBuf {
    AppDirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!("focusflight-export-{}.json", now.format("%Y%m%d-%H%M%S")))
}
