use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::{App, AppState};
use crate::ui::{
    calendar::CalendarScreen, flight::FlightScreen, home::HomeScreen, profile::ProfileScreen,
    settings::SettingsScreen,
};

/// A UI Screen boundary: draws the body area for one app state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
    /// Key hints shown in the footer
    fn legend(&self, app: &App) -> String;
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Home => Box::new(HomeScreen),
        AppState::Flight => Box::new(FlightScreen),
        AppState::Profile => Box::new(ProfileScreen),
        AppState::Calendar => Box::new(CalendarScreen),
        AppState::Settings => Box::new(SettingsScreen),
    }
}
