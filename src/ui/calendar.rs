use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::stats::{self, CalendarDay};
use crate::ui::screen::Screen;

const CELL_WIDTH: usize = 5;

/// Month grid of focus days with the selected day's flights alongside
pub struct CalendarScreen;

impl Screen for CalendarScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let groups = app.day_groups();
        let grid = stats::month_grid(app.calendar_month, app.today(), &groups);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length((CELL_WIDTH * 7 + 2) as u16),
                Constraint::Min(10),
            ])
            .split(area);

        let mut lines = vec![
            Line::from(Span::styled(
                app.calendar_month.format("%B %Y").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]
                    .iter()
                    .map(|d| format!("{d:^CELL_WIDTH$}"))
                    .collect::<String>(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        lines.extend(grid.chunks(7).map(|week| {
            Line::from(
                week.iter()
                    .map(|day| day_cell(day, day.date == app.calendar_selected))
                    .collect::<Vec<_>>(),
            )
        }));
        lines.push(Line::default());
        lines.push(Line::from(format!(
            "{} focus days this month, {} overall",
            stats::focus_days_in_month(&groups, app.calendar_month),
            stats::total_focus_days(&groups),
        )));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Calendar "))
            .render(columns[0], buf);

        let detail = stats::day_detail(app.calendar_selected, groups.get(&app.calendar_selected));
        Paragraph::new(detail)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Day "))
            .render(columns[1], buf);
    }

    fn legend(&self, _app: &App) -> String {
        "(←→) day / (↑↓) week / ([ ]) month / (t)oday / (esc)ape".to_string()
    }
}

fn day_cell(day: &CalendarDay, selected: bool) -> Span<'static> {
    let mark = if day.has_focus() { "✈" } else { " " };
    let text = format!("{:>2}{mark}", day.date.format("%-d"));

    let mut style = Style::default();
    if !day.in_month {
        style = style.add_modifier(Modifier::DIM);
    }
    if day.has_focus() {
        style = style.fg(Color::Green);
    }
    if day.is_today {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }

    Span::styled(format!("{text:^CELL_WIDTH$}"), style)
}
