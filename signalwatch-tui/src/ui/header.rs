//! Title, rule caption, and current view controls.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use signalwatch_core::RULE_CAPTION;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let title = Line::from(vec![
        Span::styled(" SignalWatch ", theme::accent_bold()),
        Span::styled(
            format!(
                "Stock Signal Dashboard (refresh every {}s)",
                app.refresh_interval.as_secs()
            ),
            theme::neutral(),
        ),
    ]);

    let caption = Line::from(Span::styled(format!(" {RULE_CAPTION}"), theme::muted()));

    let search = if app.criteria.search.is_empty() {
        "-".to_string()
    } else {
        app.criteria.search.clone()
    };
    let sort = match app.sort {
        Some(key) => format!(
            "{} {}",
            key.column.header(),
            if key.descending { "desc" } else { "asc" }
        ),
        None => "watchlist order".to_string(),
    };
    let controls = Line::from(vec![
        Span::styled(" Search: ", theme::muted()),
        Span::styled(search, theme::accent()),
        Span::styled("  Signal: ", theme::muted()),
        Span::styled(app.criteria.category.label(), theme::accent()),
        Span::styled("  Sort: ", theme::muted()),
        Span::styled(sort, theme::accent()),
        Span::styled(
            "   [/]search [f]ilter [s]ort [r]everse [c]lear [R]efresh [x]export [e]rrors [q]uit",
            theme::muted(),
        ),
    ]);

    f.render_widget(Paragraph::new(vec![title, caption, controls]), area);
}
