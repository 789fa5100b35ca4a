use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use webbrowser::Browser;

use crate::app::App;
use crate::stats::{self, RECENT_FLIGHTS};
use crate::ui::{charting, screen::Screen};
use crate::util::format_minutes;

const BAR_WIDTH: u16 = 20;

/// Pilot logbook: totals, this week's bars and the latest flights
pub struct ProfileScreen;

impl Screen for ProfileScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let dim = Style::default().add_modifier(Modifier::DIM);
        let today = app.today();
        let history = app.records.history();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(9),
                Constraint::Min(3),
            ])
            .split(area);

        let login = app
            .user
            .login_text(app.now())
            .map(|t| format!("   last login {t}"))
            .unwrap_or_default();
        Paragraph::new(Line::from(vec![
            Span::styled(format!("Pilot {}", app.user.pilot_id()), bold),
            Span::styled(login, dim),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let summary = app.profile_summary();
        Paragraph::new(format!(
            "{} flights   {} focused   {} km flown   {} day streak",
            summary.flights,
            summary.total_time_text(),
            summary.total_distance_km,
            summary.streak,
        ))
        .style(bold.fg(Color::Cyan))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let week: Vec<Line> = stats::week_summary(history, today, app.tz())
            .into_iter()
            .map(|day| {
                let style = if day.is_today {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:<4}", day.label), style),
                    Span::styled(charting::bar(day.bar_percent, BAR_WIDTH), style),
                    Span::styled(format!(" {}", format_minutes(day.minutes)), dim),
                ])
            })
            .collect();
        Paragraph::new(week)
            .block(Block::default().borders(Borders::ALL).title(" This week "))
            .render(chunks[2], buf);

        let recent = stats::recent_flights(history, RECENT_FLIGHTS, today, app.tz());
        let lines: Vec<Line> = if recent.is_empty() {
            vec![Line::from(Span::styled(
                "No flights yet. Pick a route and take off!",
                dim,
            ))]
        } else {
            recent
                .iter()
                .map(|f| {
                    Line::from(vec![
                        Span::styled(format!("{:<12}", f.date_text), dim),
                        Span::raw(format!(
                            "{} → {}  ",
                            f.record.from_city, f.record.to_city
                        )),
                        Span::styled(format_minutes(f.record.duration_min), bold),
                        Span::styled(format!("  {}", f.record.flight_number), dim),
                    ])
                })
                .collect()
        };
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Recent flights "))
            .render(chunks[3], buf);
    }

    fn legend(&self, _app: &App) -> String {
        String::from(if Browser::is_available() {
            "(1) route / (3) calendar / (4) settings / (t)weet / (esc)ape"
        } else {
            "(1) route / (3) calendar / (4) settings / (t) share / (esc)ape"
        })
    }
}
