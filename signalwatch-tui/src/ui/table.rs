//! The signal table: one row per qualifying symbol in the current view.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use signalwatch_core::clock::format_local;
use signalwatch_core::domain::{Signal, SignalResult};
use signalwatch_core::SortColumn;

use crate::app::AppState;
use crate::theme;

const WIDTHS: [usize; 7] = [16, 10, 13, 13, 12, 12, 20];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let view = app.view();
    let total = app.report.as_ref().map_or(0, |r| r.results.len());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border())
        .title(format!(
            " Signals ({} of {}) | WATCHING {} | SELL {} ",
            view.len(),
            total,
            view.count(Signal::Watching),
            view.count(Signal::Sell)
        ))
        .title_style(theme::panel_title());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![header_line(app)];

    if let Some(message) = app.empty_message(&view) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {message}"), theme::muted())));
        f.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let visible = (inner.height as usize).saturating_sub(1);
    let start = first_visible(app.scroll, visible);
    for (i, row) in view.iter().enumerate().skip(start).take(visible) {
        let mut style = theme::signal_style(row.signal);
        if i == app.scroll {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(format_row(row, app), style)));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

/// Keep the cursor row on screen.
fn first_visible(cursor: usize, visible: usize) -> usize {
    if visible == 0 {
        return cursor;
    }
    (cursor + 1).saturating_sub(visible)
}

fn header_line(app: &AppState) -> Line<'static> {
    let cells: Vec<String> = SortColumn::ALL
        .iter()
        .zip(WIDTHS)
        .map(|(column, width)| {
            let marker = match app.sort {
                Some(key) if key.column == *column && key.descending => " v",
                Some(key) if key.column == *column => " ^",
                _ => "",
            };
            pad(&format!("{}{marker}", column.header()), width, is_numeric(*column))
        })
        .collect();
    Line::from(Span::styled(cells.join(" "), theme::accent_bold()))
}

fn format_row(row: &SignalResult, app: &AppState) -> String {
    let cells = [
        row.symbol.clone(),
        row.signal.to_string(),
        format!("{:.2}", row.candle_open),
        format!("{:.2}", row.live_price),
        row.volume.to_string(),
        row.prev_volume.to_string(),
        format_local(row.checked_at, app.tz),
    ];
    cells
        .iter()
        .zip(SortColumn::ALL.iter().zip(WIDTHS))
        .map(|(cell, (column, width))| pad(cell, width, is_numeric(*column)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_numeric(column: SortColumn) -> bool {
    matches!(
        column,
        SortColumn::CandleOpen | SortColumn::LivePrice | SortColumn::Volume | SortColumn::PrevVolume
    )
}

fn pad(text: &str, width: usize, right: bool) -> String {
    if right {
        format!("{text:>width$}")
    } else {
        format!("{text:<width$}")
    }
}
