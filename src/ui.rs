pub mod calendar;
pub mod charting;
pub mod flight;
pub mod home;
pub mod profile;
pub mod screen;
pub mod settings;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, AppState};
use crate::celebration::Celebration;
use crate::ui::screen::current_screen;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const TABS: [(AppState, &str); 4] = [
    (AppState::Home, "1 Route"),
    (AppState::Profile, "2 Logbook"),
    (AppState::Calendar, "3 Calendar"),
    (AppState::Settings, "4 Settings"),
];

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2), // tabs
                Constraint::Min(1),    // body
                Constraint::Length(1), // toast
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_tabs(self.state, chunks[0], buf);

        let screen = current_screen(&self.state);
        screen.render(self, chunks[1], buf);

        if let Some(toast) = &self.toast {
            let style = if toast.is_error {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Yellow)
            };
            Paragraph::new(Span::styled(fit_width(&toast.text, chunks[2].width), style))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            fit_width(&screen.legend(self), chunks[3].width),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);

        if self.celebration.is_active() {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

/// Cut `text` to `width` terminal columns, ending in "…" when shortened
fn fit_width(text: &str, width: u16) -> String {
    let width = width as usize;
    if text.width() <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    if width > 0 {
        out.push('…');
    }
    out
}

fn render_tabs(state: AppState, area: Rect, buf: &mut Buffer) {
    let mut spans = vec![Span::styled(
        "✈ FocusFlight  ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if state == AppState::Flight {
        spans.push(Span::styled(
            "In flight",
            Style::default().add_modifier(Modifier::BOLD),
        ));
    } else {
        for (tab, label) in TABS {
            let style = if tab == state {
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw("  "));
        }
    }

    Paragraph::new(Line::from(spans)).render(area, buf);
}

/// Render celebration particles on top of the current screen
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            let alpha = 1.0 - (particle.age / particle.max_age);

            let style = if particle.is_letter() {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LaunchOptions;
    use crate::geo;
    use crate::records::FocusRecord;
    use crate::runtime::{FlightEvent, ManualClock};
    use crate::store::MemoryStore;
    use chrono::FixedOffset;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::rc::Rc;
    use std::time::Duration;

    const START_MS: i64 = 1_715_650_000_000;

    fn create_test_app() -> (App, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(START_MS));
        let app = App::new(
            Rc::new(MemoryStore::new()),
            Box::new(Rc::clone(&clock)),
            FixedOffset::east_opt(8 * 3600).unwrap(),
            LaunchOptions {
                origin: geo::city_by_name("Beijing"),
                destination: geo::city_by_name("Xi'an"),
                minutes: Some(2),
            },
        );
        (app, clock)
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle(FlightEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("hello", 10), "hello");
        assert_eq!(fit_width("hello world", 6), "hello…");
        assert_eq!(fit_width("北京到上海", 5), "北京…");
        assert_eq!(fit_width("abc", 0), "");
    }

    #[test]
    fn test_home_shows_boarding_pass() {
        let (app, _) = create_test_app();
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("FocusFlight"));
        assert!(rendered.contains("BJS"));
        assert!(rendered.contains("XIY"));
        assert!(rendered.contains("Beijing → Xi'an"));
        assert!(rendered.contains("take off"));
    }

    #[test]
    fn test_flight_shows_countdown() {
        let (mut app, clock) = create_test_app();
        press(&mut app, KeyCode::Enter);
        clock.advance(Duration::from_secs(1));
        app.handle(FlightEvent::Tick);

        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("01:59"));
        assert!(rendered.contains("Taking off..."));
        assert!(rendered.contains("In flight"));
        assert!(rendered.contains("(space) pause"));
    }

    #[test]
    fn test_paused_flight_status() {
        let (mut app, _) = create_test_app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char(' '));
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("Paused"));
        assert!(rendered.contains("Flight paused"));
    }

    #[test]
    fn test_arrival_renders_celebration() {
        let (mut app, clock) = create_test_app();
        app.set_viewport(100, 30);
        press(&mut app, KeyCode::Enter);
        for _ in 0..120 {
            clock.advance(Duration::from_secs(1));
            app.handle(FlightEvent::Tick);
        }
        assert!(app.celebration.is_active());
        let with_particles = render(&app, 100, 30);

        app.celebration.stop();
        let rendered = render(&app, 100, 30);
        assert_ne!(with_particles, rendered);
        assert!(rendered.contains("Arrived!"));
        assert!(rendered.contains("00:00"));
        assert!(rendered.contains("(enter) logbook"));
    }

    #[test]
    fn test_profile_lists_recent_flight() {
        let (mut app, _) = create_test_app();
        app.records
            .append(FocusRecord {
                id: START_MS - 60_000,
                from_city: "Beijing".into(),
                to_city: "Tianjin".into(),
                duration_min: 25,
                flight_number: "FFBJST123".into(),
                distance_km: 110,
                started_at_epoch_ms: START_MS - 25 * 60_000,
                ended_at_epoch_ms: START_MS - 60_000,
                completed: true,
            })
            .unwrap();
        press(&mut app, KeyCode::Char('2'));

        let rendered = render(&app, 100, 30);
        assert!(rendered.contains(app.user.pilot_id()));
        assert!(rendered.contains("1 flights"));
        assert!(rendered.contains("Beijing → Tianjin"));
        assert!(rendered.contains("This week"));
    }

    #[test]
    fn test_empty_profile_invites_first_flight() {
        let (mut app, _) = create_test_app();
        press(&mut app, KeyCode::Char('2'));
        assert!(render(&app, 100, 30).contains("No flights yet"));
    }

    #[test]
    fn test_calendar_shows_month_and_detail() {
        let (mut app, _) = create_test_app();
        press(&mut app, KeyCode::Char('3'));
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("May 2024"));
        assert!(rendered.contains("May 14, 2024"));
        assert!(rendered.contains("No flights on this day"));
    }

    #[test]
    fn test_settings_lists_every_item() {
        let (mut app, _) = create_test_app();
        press(&mut app, KeyCode::Char('4'));
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("Default city"));
        assert!(rendered.contains("Auto-pause when away"));
        assert!(rendered.contains("Clear all data"));
        assert!(rendered.contains("180 min"));
    }

    #[test]
    fn test_renders_in_tiny_areas() {
        let (mut app, _) = create_test_app();
        for state in [
            AppState::Home,
            AppState::Profile,
            AppState::Calendar,
            AppState::Settings,
        ] {
            app.state = state;
            for (w, h) in [(20, 5), (200, 5), (10, 50)] {
                let area = Rect::new(0, 0, w, h);
                let mut buffer = Buffer::empty(area);
                (&app).render(area, &mut buffer);
                assert_eq!(*buffer.area(), area);
            }
        }
    }
}
