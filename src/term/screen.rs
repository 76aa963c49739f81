// src/term/screen.rs

//! Grid mutators: printing, cursor motion, scrolling, erase, and the
//! insert/delete family. The parser dispatches here; nothing in this module
//! touches parser state.

use super::{seed_tabs, Cursor, DecModes, Term};
use crate::glyph::{Attributes, Glyph, WIDE_CHAR_PLACEHOLDER};
use unicode_width::UnicodeWidthChar;

/// Writes a decoded character at the cursor, honoring pending wrap, wide
/// characters, and the autowrap mode.
pub(super) fn put_char(term: &mut Term, c: char) {
    let width = UnicodeWidthChar::width(c).unwrap_or(1);
    if width == 0 {
        // Combining marks occupy no cell of their own.
        return;
    }
    if width > term.cols {
        return;
    }
    if term.wrap_next {
        term.wrap_next = false;
        term.cursor.x = 0;
        index(term);
    }
    if term.cursor.x + width > term.cols {
        // A wide character that does not fit at the margin wraps early.
        if term.modes.autowrap {
            term.cursor.x = 0;
            index(term);
        } else {
            term.cursor.x = term.cols - width;
        }
    }
    let Cursor { x, y } = term.cursor;
    set_cell(term, x, y, c);
    if width == 2 {
        set_cell(term, x + 1, y, WIDE_CHAR_PLACEHOLDER);
    }
    if x + width >= term.cols {
        if term.modes.autowrap {
            term.cursor.x = term.cols - 1;
            term.wrap_next = true;
        } else {
            term.cursor.x = term.cols - 1;
        }
    } else {
        term.cursor.x = x + width;
    }
}

fn set_cell(term: &mut Term, x: usize, y: usize, c: char) {
    if y >= term.rows || x >= term.cols {
        return;
    }
    let glyph = Glyph {
        c,
        attr: term.current_attributes,
    };
    if term.grid[y][x] != glyph {
        term.grid[y][x] = glyph;
        term.mark_dirty();
    }
}

pub(super) fn carriage_return(term: &mut Term) {
    term.wrap_next = false;
    if term.cursor.x != 0 {
        term.cursor.x = 0;
    }
}

pub(super) fn backspace(term: &mut Term) {
    term.wrap_next = false;
    if term.cursor.x > 0 {
        term.cursor.x -= 1;
    }
}

/// Moves the cursor down one line, scrolling the region when it sits on the
/// bottom margin.
pub(super) fn index(term: &mut Term) {
    term.wrap_next = false;
    if term.cursor.y == term.scroll_bot {
        scroll_up(term, 1);
    } else if term.cursor.y + 1 < term.rows {
        term.cursor.y += 1;
    }
}

/// Moves the cursor up one line, scrolling backwards at the top margin.
pub(super) fn reverse_index(term: &mut Term) {
    term.wrap_next = false;
    if term.cursor.y == term.scroll_top {
        scroll_down(term, 1);
    } else if term.cursor.y > 0 {
        term.cursor.y -= 1;
    }
}

pub(super) fn tab_forward(term: &mut Term, n: usize) {
    term.wrap_next = false;
    for _ in 0..n.max(1) {
        let next = (term.cursor.x + 1..term.cols).find(|&x| term.tabs[x]);
        term.cursor.x = next.unwrap_or(term.cols - 1);
    }
}

pub(super) fn tab_backward(term: &mut Term, n: usize) {
    term.wrap_next = false;
    for _ in 0..n.max(1) {
        let prev = (0..term.cursor.x).rev().find(|&x| term.tabs[x]);
        term.cursor.x = prev.unwrap_or(0);
    }
}

pub(super) fn set_tab_stop(term: &mut Term) {
    if term.cursor.x < term.cols {
        term.tabs[term.cursor.x] = true;
    }
}

pub(super) fn clear_tab_stops(term: &mut Term, mode: usize) {
    match mode {
        0 => {
            if term.cursor.x < term.cols {
                term.tabs[term.cursor.x] = false;
            }
        }
        3 => term.tabs.fill(false),
        _ => {}
    }
}

pub(super) fn move_cursor_up(term: &mut Term, n: usize) {
    term.wrap_next = false;
    let limit = if term.cursor.y >= term.scroll_top {
        term.scroll_top
    } else {
        0
    };
    term.cursor.y = term.cursor.y.saturating_sub(n.max(1)).max(limit);
}

pub(super) fn move_cursor_down(term: &mut Term, n: usize) {
    term.wrap_next = false;
    let limit = if term.cursor.y <= term.scroll_bot {
        term.scroll_bot
    } else {
        term.rows - 1
    };
    term.cursor.y = (term.cursor.y + n.max(1)).min(limit);
}

pub(super) fn move_cursor_forward(term: &mut Term, n: usize) {
    term.wrap_next = false;
    term.cursor.x = (term.cursor.x + n.max(1)).min(term.cols - 1);
}

pub(super) fn move_cursor_backward(term: &mut Term, n: usize) {
    term.wrap_next = false;
    term.cursor.x = term.cursor.x.saturating_sub(n.max(1));
}

/// Absolute cursor positioning (CUP/HVP), 1-based. Origin mode confines the
/// row to the scroll region.
pub(super) fn set_cursor_pos(term: &mut Term, row: usize, col: usize) {
    term.wrap_next = false;
    let row = row.max(1) - 1;
    let col = col.max(1) - 1;
    term.cursor.y = if term.modes.origin_mode {
        (term.scroll_top + row).min(term.scroll_bot)
    } else {
        row.min(term.rows - 1)
    };
    term.cursor.x = col.min(term.cols - 1);
}

pub(super) fn set_cursor_column(term: &mut Term, col: usize) {
    term.wrap_next = false;
    term.cursor.x = (col.max(1) - 1).min(term.cols - 1);
}

pub(super) fn set_cursor_row(term: &mut Term, row: usize) {
    term.wrap_next = false;
    let row = row.max(1) - 1;
    term.cursor.y = if term.modes.origin_mode {
        (term.scroll_top + row).min(term.scroll_bot)
    } else {
        row.min(term.rows - 1)
    };
}

pub(super) fn save_cursor(term: &mut Term) {
    term.saved_cursor = term.cursor;
    term.saved_attributes = term.current_attributes;
}

pub(super) fn restore_cursor(term: &mut Term) {
    term.wrap_next = false;
    term.cursor = Cursor {
        x: term.saved_cursor.x.min(term.cols - 1),
        y: term.saved_cursor.y.min(term.rows - 1),
    };
    term.current_attributes = term.saved_attributes;
}

/// Fills `[x0, x1)` of row `y` with blanks carrying the current background.
fn fill_range(term: &mut Term, y: usize, x0: usize, x1: usize) {
    if y >= term.rows {
        return;
    }
    let blank = Glyph::blank(term.current_attributes);
    for x in x0..x1.min(term.cols) {
        if term.grid[y][x] != blank {
            term.grid[y][x] = blank;
            term.mark_dirty();
        }
    }
}

pub(super) fn erase_line_to_end(term: &mut Term) {
    fill_range(term, term.cursor.y, term.cursor.x, term.cols);
}

pub(super) fn erase_line_to_start(term: &mut Term) {
    fill_range(term, term.cursor.y, 0, term.cursor.x + 1);
}

pub(super) fn erase_line(term: &mut Term) {
    fill_range(term, term.cursor.y, 0, term.cols);
}

pub(super) fn erase_display_to_end(term: &mut Term) {
    erase_line_to_end(term);
    for y in term.cursor.y + 1..term.rows {
        fill_range(term, y, 0, term.cols);
    }
}

pub(super) fn erase_display_to_start(term: &mut Term) {
    for y in 0..term.cursor.y {
        fill_range(term, y, 0, term.cols);
    }
    erase_line_to_start(term);
}

pub(super) fn erase_display(term: &mut Term) {
    for y in 0..term.rows {
        fill_range(term, y, 0, term.cols);
    }
}

/// ECH: blanks `n` cells starting at the cursor without moving anything.
pub(super) fn erase_chars(term: &mut Term, n: usize) {
    let x = term.cursor.x;
    fill_range(term, term.cursor.y, x, x + n.max(1));
}

/// Scrolls the region up by `n` lines; fresh lines enter at the bottom.
/// Dirty only when cell content actually changed; rotating blanks over
/// blanks is not a visible change.
pub(super) fn scroll_up(term: &mut Term, n: usize) {
    let height = term.scroll_bot + 1 - term.scroll_top;
    let n = n.max(1).min(height);
    let blank = Glyph::blank(term.current_attributes);
    let before = term.grid[term.scroll_top..=term.scroll_bot].to_vec();
    term.grid[term.scroll_top..=term.scroll_bot].rotate_left(n);
    for y in term.scroll_bot + 1 - n..=term.scroll_bot {
        term.grid[y].fill(blank);
    }
    if term.grid[term.scroll_top..=term.scroll_bot] != before[..] {
        term.mark_dirty();
    }
}

/// Scrolls the region down by `n` lines; fresh lines enter at the top.
pub(super) fn scroll_down(term: &mut Term, n: usize) {
    let height = term.scroll_bot + 1 - term.scroll_top;
    let n = n.max(1).min(height);
    let blank = Glyph::blank(term.current_attributes);
    let before = term.grid[term.scroll_top..=term.scroll_bot].to_vec();
    term.grid[term.scroll_top..=term.scroll_bot].rotate_right(n);
    for y in term.scroll_top..term.scroll_top + n {
        term.grid[y].fill(blank);
    }
    if term.grid[term.scroll_top..=term.scroll_bot] != before[..] {
        term.mark_dirty();
    }
}

/// IL: inserts blank lines at the cursor, pushing the rest of the region
/// down. Inert outside the scroll region.
pub(super) fn insert_blank_lines(term: &mut Term, n: usize) {
    let y = term.cursor.y;
    if y < term.scroll_top || y > term.scroll_bot {
        return;
    }
    let span = term.scroll_bot + 1 - y;
    let n = n.max(1).min(span);
    let blank = Glyph::blank(term.current_attributes);
    let before = term.grid[y..=term.scroll_bot].to_vec();
    term.grid[y..=term.scroll_bot].rotate_right(n);
    for row in y..y + n {
        term.grid[row].fill(blank);
    }
    if term.grid[y..=term.scroll_bot] != before[..] {
        term.mark_dirty();
    }
}

/// DL: deletes lines at the cursor, pulling the rest of the region up.
pub(super) fn delete_lines(term: &mut Term, n: usize) {
    let y = term.cursor.y;
    if y < term.scroll_top || y > term.scroll_bot {
        return;
    }
    let span = term.scroll_bot + 1 - y;
    let n = n.max(1).min(span);
    let blank = Glyph::blank(term.current_attributes);
    let before = term.grid[y..=term.scroll_bot].to_vec();
    term.grid[y..=term.scroll_bot].rotate_left(n);
    for row in term.scroll_bot + 1 - n..=term.scroll_bot {
        term.grid[row].fill(blank);
    }
    if term.grid[y..=term.scroll_bot] != before[..] {
        term.mark_dirty();
    }
}

/// ICH: shifts the tail of the line right and blanks `n` cells at the cursor.
pub(super) fn insert_blank_chars(term: &mut Term, n: usize) {
    let Cursor { x, y } = term.cursor;
    if y >= term.rows || x >= term.cols {
        return;
    }
    let n = n.max(1).min(term.cols - x);
    let blank = Glyph::blank(term.current_attributes);
    let before = term.grid[y][x..].to_vec();
    term.grid[y][x..].rotate_right(n);
    term.grid[y][x..x + n].fill(blank);
    if term.grid[y][x..] != before[..] {
        term.mark_dirty();
    }
}

/// DCH: deletes `n` cells at the cursor, pulling the tail of the line left.
pub(super) fn delete_chars(term: &mut Term, n: usize) {
    let Cursor { x, y } = term.cursor;
    if y >= term.rows || x >= term.cols {
        return;
    }
    let n = n.max(1).min(term.cols - x);
    let blank = Glyph::blank(term.current_attributes);
    let before = term.grid[y][x..].to_vec();
    term.grid[y][x..].rotate_left(n);
    let start = term.cols - n;
    term.grid[y][start..].fill(blank);
    if term.grid[y][x..] != before[..] {
        term.mark_dirty();
    }
}

/// DECSTBM. `bottom` of 0 means the last line. Degenerate regions are
/// ignored; a valid one homes the cursor (origin-mode aware).
pub(super) fn set_scrolling_region(term: &mut Term, top: usize, bottom: usize) {
    let top = top.max(1) - 1;
    let bottom = if bottom == 0 {
        term.rows - 1
    } else {
        (bottom - 1).min(term.rows - 1)
    };
    if top >= bottom {
        return;
    }
    term.scroll_top = top;
    term.scroll_bot = bottom;
    set_cursor_pos(term, 1, 1);
}

/// RIS: back to the power-on state.
pub(super) fn reset(term: &mut Term) {
    let had_cells = term
        .grid
        .iter()
        .any(|row| row.iter().any(|g| *g != Glyph::default()));
    for row in term.grid.iter_mut() {
        row.fill(Glyph::default());
    }
    term.cursor = Cursor::default();
    term.saved_cursor = Cursor::default();
    term.current_attributes = Attributes::default();
    term.saved_attributes = Attributes::default();
    term.scroll_top = 0;
    term.scroll_bot = term.rows - 1;
    term.tabs = seed_tabs(term.cols, term.tab_interval);
    term.charsets = Default::default();
    term.active_charset = 0;
    term.modes = DecModes::default();
    term.wrap_next = false;
    if had_cells {
        term.mark_dirty();
    }
}
