//! Bottom status bar: last update, refresh countdown, status message.

use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use signalwatch_core::clock::format_local;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();

    let updated = match &app.report {
        Some(report) => format!(" Last updated {}", format_local(report.checked_at, app.tz)),
        None => " Last updated: never".to_string(),
    };
    spans.push(Span::styled(updated, theme::muted()));
    spans.push(Span::raw(" | "));

    match (&app.progress, app.next_refresh_in(Instant::now())) {
        (Some(progress), _) => {
            let text = match &progress.symbol {
                Some(symbol) => format!(
                    "Checking {symbol} ({}/{})",
                    progress.index + 1,
                    progress.total
                ),
                None => format!("Checking {} symbols", progress.total),
            };
            spans.push(Span::styled(text, theme::warning()));
        }
        (None, Some(left)) => {
            spans.push(Span::styled(
                format!("next refresh in {}s", left.as_secs()),
                theme::neutral(),
            ));
        }
        (None, None) => {}
    }
    spans.push(Span::raw(" | "));

    let style = match app.status_level {
        StatusLevel::Info => theme::accent(),
        StatusLevel::Warning => theme::warning(),
        StatusLevel::Error => theme::negative(),
    };
    spans.push(Span::styled(app.status_message.as_str(), style));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
