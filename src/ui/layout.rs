use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatPanes {
    pub header: Rect,
    pub history: Rect,
    pub input: Rect,
}

/// Status row on top, prompt at the bottom, transcript in between. The
/// prompt never takes more than half the screen.
pub fn split_chat_panes(area: Rect, input_rows: u16) -> ChatPanes {
    let input_rows = input_rows.clamp(1, (area.height / 2).max(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_rows),
        ])
        .split(area);

    ChatPanes {
        header: chunks[0],
        history: chunks[1],
        input: chunks[2],
    }
}
