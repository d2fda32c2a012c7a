use unicode_width::UnicodeWidthChar;

/// Terminal columns taken by `ch`. Control characters take none.
pub fn glyph_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Largest char boundary in `text` that is not past `index`.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

enum Placement {
    Skipped,
    HardBreak,
    Glyph { soft_break: bool },
}

/// Position of the next glyph while text is laid out in a fixed number of
/// columns. `\n` starts a new row, `\r` is dropped, and a glyph that would
/// overflow a non-empty row moves to the next one.
struct Pen {
    width: usize,
    row: usize,
    col: usize,
}

impl Pen {
    fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            row: 0,
            col: 0,
        }
    }

    fn place(&mut self, ch: char) -> Placement {
        match ch {
            '\r' => Placement::Skipped,
            '\n' => {
                self.row += 1;
                self.col = 0;
                Placement::HardBreak
            }
            _ => {
                let glyph = glyph_width(ch);
                let soft_break = self.col > 0 && self.col + glyph > self.width;
                if soft_break {
                    self.row += 1;
                    self.col = 0;
                }
                self.col += glyph;
                Placement::Glyph { soft_break }
            }
        }
    }
}

/// Splits `text` into the rows it occupies at `width` columns. Always at
/// least one row, so an empty prompt still has a line to draw.
pub fn wrap_rows(text: &str, width: usize) -> Vec<String> {
    let mut pen = Pen::new(width);
    let mut rows = vec![String::new()];
    for ch in text.chars() {
        match pen.place(ch) {
            Placement::Skipped => {}
            Placement::HardBreak => rows.push(String::new()),
            Placement::Glyph { soft_break } => {
                if soft_break {
                    rows.push(String::new());
                }
                if let Some(row) = rows.last_mut() {
                    row.push(ch);
                }
            }
        }
    }
    rows
}

/// Row and column of the cursor sitting before byte `cursor` of `text`. A
/// cursor right after a full row is drawn at the start of the next one.
pub fn cursor_cell(text: &str, cursor: usize, width: usize) -> (usize, usize) {
    let end = floor_char_boundary(text, cursor);
    let mut pen = Pen::new(width);
    for ch in text[..end].chars() {
        pen.place(ch);
    }
    if pen.col >= pen.width {
        (pen.row + 1, 0)
    } else {
        (pen.row, pen.col)
    }
}

/// Clips a single line to `width` columns, marking the cut with `...` when
/// there is room for it.
pub fn fit_width(text: &str, width: usize) -> String {
    let width = width.max(1);
    if text.chars().map(glyph_width).sum::<usize>() <= width {
        return text.to_string();
    }

    let ellipsis = width >= 4;
    let budget = if ellipsis { width - 3 } else { width };
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let glyph = glyph_width(ch);
        if used + glyph > budget {
            break;
        }
        out.push(ch);
        used += glyph;
    }
    if ellipsis {
        out.push_str("...");
    }
    out
}
