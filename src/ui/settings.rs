use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::{App, SettingsItem};
use crate::ui::screen::Screen;

pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let selected = app.selected_setting();

        let lines: Vec<Line> = SettingsItem::ALL
            .iter()
            .map(|item| {
                let style = if *item == selected {
                    Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default()
                };
                let value_style = match item {
                    SettingsItem::ClearData => Style::default().fg(Color::Red),
                    _ => Style::default().fg(Color::Cyan),
                };
                Line::from(vec![
                    Span::styled(format!(" {:<24}", item.to_string()), style),
                    Span::styled(setting_value(app, *item), value_style),
                ])
            })
            .collect();

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Settings "))
            .render(area, buf);
    }

    fn legend(&self, app: &App) -> String {
        if app.confirm_clear {
            "(y) erase everything / any other key to keep".to_string()
        } else {
            "(↑↓) select / (←→ enter) change / (esc)ape".to_string()
        }
    }
}

fn on_off(enabled: bool) -> String {
    String::from(if enabled { "ON" } else { "OFF" })
}

fn setting_value(app: &App, item: SettingsItem) -> String {
    let settings = app.settings.current();
    match item {
        SettingsItem::DefaultCity => settings.default_city.name.clone(),
        SettingsItem::Sound => on_off(settings.sound_enabled),
        SettingsItem::Vibration => on_off(settings.vibration_enabled),
        SettingsItem::AutoPause => on_off(settings.auto_pause_enabled),
        SettingsItem::MinDuration => format!("{} min", settings.min_duration),
        SettingsItem::MaxDuration => format!("{} min", settings.max_duration),
        SettingsItem::Export => format!("{} flights", app.records.history().len()),
        SettingsItem::ClearData => String::new(),
    }
}
