use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::{App, PickerFocus};
use crate::geo;
use crate::route;
use crate::ui::screen::Screen;

/// Route picker: origin and destination lists over a boarding-pass card
pub struct HomeScreen;

impl Screen for HomeScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(6)])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        render_picker(
            "From",
            app.picker.origin,
            app.picker.focus == PickerFocus::Origin,
            columns[0],
            buf,
        );
        render_picker(
            "To",
            app.picker.destination,
            app.picker.focus == PickerFocus::Destination,
            columns[1],
            buf,
        );

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let card: Vec<Line> = match &app.planned {
            Some(route) => vec![
                Line::from(vec![
                    Span::styled(route.from.code.clone(), bold.fg(Color::Cyan)),
                    Span::raw("  ✈  "),
                    Span::styled(route.to.code.clone(), bold.fg(Color::Cyan)),
                ]),
                Line::from(format!("{} → {}", route.from.name, route.to.name)),
                Line::from(format!(
                    "{}   {} km   {}   boarding {}",
                    route.flight_number,
                    route.distance_km,
                    route.duration_text(),
                    route::departure_time(app.now()),
                )),
                Line::from(Span::styled(
                    "press Enter to take off",
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ],
            None => vec![Line::from(Span::styled(
                "Pick two different cities",
                Style::default().fg(Color::Yellow),
            ))],
        };

        Paragraph::new(card)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Boarding pass "))
            .render(rows[1], buf);
    }

    fn legend(&self, _app: &App) -> String {
        "(tab) switch / (↑↓) city / (←→) time / (s)wap / (p)opular / (enter) take off / (q)uit"
            .to_string()
    }
}

fn render_picker(title: &str, selected: usize, focused: bool, area: Rect, buf: &mut Buffer) {
    let cities = geo::all_cities();
    let visible = area.height.saturating_sub(2).max(1) as usize;
    let first = window_start(selected, visible, cities.len());

    let lines: Vec<Line> = cities
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(idx, city)| {
            let text = format!("{} {}", city.code, city.name);
            if idx == selected {
                let style = Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED);
                Line::from(Span::styled(format!("▸ {text}"), style))
            } else {
                Line::from(format!("  {text}"))
            }
        })
        .collect();

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!(" {title} ")),
        )
        .render(area, buf);
}

/// First list row to show so that `selected` stays roughly centred
fn window_start(selected: usize, visible: usize, len: usize) -> usize {
    if len <= visible {
        return 0;
    }
    selected.saturating_sub(visible / 2).min(len - visible)
}
