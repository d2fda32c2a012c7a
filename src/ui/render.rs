use crate::ui::text_layout::{cursor_cell, fit_width, wrap_rows};
use crate::ui::transcript::{HistoryLine, LineKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Paragraph, Wrap},
    Frame,
};

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_rows(input, width).len()
}

/// First visible row when the view is `scroll_back` rows above the bottom.
pub fn history_top_row(total_rows: usize, viewport_rows: usize, scroll_back: usize) -> usize {
    let max_top = total_rows.saturating_sub(viewport_rows);
    max_top.saturating_sub(scroll_back)
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }
    let inner = area;

    let input_width = inner.width.saturating_sub(2).max(1) as usize;
    let lines = wrap_rows(input, input_width);
    let (cursor_row, cursor_col) = cursor_cell(input, cursor_byte, input_width);
    let visible_rows = inner.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let mut rendered = Vec::with_capacity(visible_rows);
    for offset in 0..visible_rows {
        let row_index = window_start + offset;
        let prefix = if row_index == 0 { "> " } else { "  " };
        let line = lines.get(row_index).cloned().unwrap_or_default();
        rendered.push(Line::from(format!("{prefix}{line}")));
    }

    frame.render_widget(
        Paragraph::new(rendered)
            .style(Style::default().fg(Color::Gray).bg(Color::Rgb(24, 24, 24)))
            .wrap(Wrap { trim: false }),
        inner,
    );

    let cursor_y = inner
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = inner
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(inner.x.saturating_add(inner.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

pub fn render_messages(frame: &mut Frame<'_>, area: Rect, lines: &[HistoryLine], scroll_back: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let width = area.width as usize;
    let mut rows: Vec<Line> = Vec::new();
    for line in lines {
        let style = line_style(line.kind);
        for row in wrap_rows(&line.text, width) {
            rows.push(Line::styled(row, style));
        }
    }
    let top = history_top_row(rows.len(), area.height as usize, scroll_back);

    let paragraph = Paragraph::new(rows)
        .style(Style::default().fg(Color::White))
        .scroll((top.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = fit_width(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::User => Style::default().fg(Color::Cyan),
        LineKind::Thinking => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        LineKind::Error | LineKind::ValidationFailed => Style::default().fg(Color::Red),
        LineKind::Warning => Style::default().fg(Color::Yellow),
        LineKind::Validated => Style::default().fg(Color::Green),
        LineKind::QueryType | LineKind::Notice => Style::default().fg(Color::Magenta),
        LineKind::Answer | LineKind::Plain => Style::default(),
    }
}
