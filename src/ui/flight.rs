use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::App;
use crate::timer::TimerStatus;
use crate::ui::{charting, screen::Screen};

const HORIZONTAL_MARGIN: u16 = 5;

/// In-flight view: countdown, progress track and cockpit readouts
pub struct FlightScreen;

impl Screen for FlightScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Some(timer) = app.timer.as_ref() else {
            return;
        };
        let config = timer.config();
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1), // flight number
                Constraint::Length(2), // route
                Constraint::Length(2), // track
                Constraint::Length(2), // countdown
                Constraint::Length(1), // status
                Constraint::Length(1), // readouts
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(Span::styled(
            format!("Flight {}", config.flight_number),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} {}", config.from.code, config.from.name), bold),
            Span::raw("   →   "),
            Span::styled(format!("{} {}", config.to.name, config.to.code), bold),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        Paragraph::new(Span::styled(
            charting::flight_path(timer.progress(), chunks[3].width),
            Style::default().fg(Color::Cyan),
        ))
        .render(chunks[3], buf);

        let clock_style = match timer.status() {
            TimerStatus::Paused => bold.fg(Color::Yellow),
            TimerStatus::Completed => bold.fg(Color::Green),
            TimerStatus::Cancelled => bold.fg(Color::Red),
            TimerStatus::Running => bold,
        };
        Paragraph::new(Span::styled(timer.display_time(), clock_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        Paragraph::new(Span::styled(
            timer.status_text(),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

        Paragraph::new(format!(
            "{}%   alt {} m   {} km   focused {}",
            timer.progress_percent(),
            timer.altitude(),
            config.distance_km,
            timer.focused_time(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    fn legend(&self, app: &App) -> String {
        let finished = app.timer.as_ref().map_or(true, |t| t.is_finished());
        if finished {
            "(enter) logbook / (esc) new flight / (q)uit".to_string()
        } else if app.confirm_cancel {
            "(esc) again to abandon the flight".to_string()
        } else {
            "(space) pause / (esc) abandon".to_string()
        }
    }
}
