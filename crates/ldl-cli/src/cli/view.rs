//! Console progress view: one line per item, updated in place.
//!
//! Each item's row is a pure function of its sequence number. When stdout is
//! not a terminal, or the list does not fit the screen, the view falls back
//! to plain scrolling output (one line per retired item).

use std::collections::HashSet;
use std::io::{self, IsTerminal, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue, terminal};

use ldl_core::scheduler::ProgressSink;
use ldl_core::transfer::{TransferSnapshot, TransferStatus};

use super::fmt::{align, digits, filled_cells, format_bytes};

/// Width of the bracketed progress region.
const BAR_WIDTH: usize = 24;
/// Captions longer than this are cut to keep rows on one line.
const MAX_CAPTION: usize = 50;

pub struct ConsoleView {
    total: usize,
    seq_width: usize,
    mode: Mode,
}

enum Mode {
    /// In-place updates: item `seq` renders at `base_row + seq - 1`.
    Positional { base_row: u16 },
    /// One plain line per retired item.
    Scrolling { reported: HashSet<usize> },
}

impl ConsoleView {
    pub fn new(total: usize) -> Self {
        let mode = Self::positional(total)
            .unwrap_or(Mode::Scrolling {
                reported: HashSet::new(),
            });
        Self {
            total,
            seq_width: digits(total),
            mode,
        }
    }

    /// Reserves one row per item; None when stdout is not a tty or the list
    /// does not fit the terminal.
    fn positional(total: usize) -> Option<Mode> {
        if total == 0 || !io::stdout().is_terminal() {
            return None;
        }
        let (_, term_rows) = terminal::size().ok()?;
        if total + 1 > term_rows as usize {
            return None;
        }
        let mut out = io::stdout();
        for _ in 0..total {
            writeln!(out).ok()?;
        }
        out.flush().ok()?;
        let (_, row_after) = cursor::position().ok()?;
        Some(Mode::Positional {
            base_row: row_after.saturating_sub(total as u16),
        })
    }

    /// Moves the cursor below the block so the summary prints cleanly.
    pub fn finish(&mut self) {
        if let Mode::Positional { base_row } = self.mode {
            let mut out = io::stdout();
            let _ = queue!(out, MoveTo(0, base_row + self.total as u16));
            let _ = out.flush();
        }
    }

    fn draw_at(&self, row: u16, snapshot: &TransferSnapshot) -> io::Result<()> {
        let (inner, fill, color) = self.compose_bar(snapshot);
        let filled: String = inner.chars().take(fill).collect();
        let rest: String = inner.chars().skip(fill).collect();

        let mut out = io::stdout();
        queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        queue!(
            out,
            Print(format!(
                "{:0w$}/{:0w$} [",
                snapshot.seq,
                self.total,
                w = self.seq_width
            )),
            SetBackgroundColor(color),
            Print(filled),
            ResetColor,
            Print(rest),
            Print("] "),
            Print(caption_cut(&snapshot.caption)),
        )?;
        // Park below the block so stray output never lands mid-table.
        queue!(out, MoveTo(0, self.block_end()))?;
        out.flush()
    }

    fn block_end(&self) -> u16 {
        match self.mode {
            Mode::Positional { base_row } => base_row + self.total as u16,
            Mode::Scrolling { .. } => 0,
        }
    }

    /// Bar interior, fill width, and color for the item's current stage.
    fn compose_bar(&self, s: &TransferSnapshot) -> (String, usize, Color) {
        match s.status {
            TransferStatus::Active => {
                if s.total_bytes > 0 {
                    (
                        align(
                            &format_bytes(s.transferred_bytes),
                            " ",
                            &format_bytes(s.total_bytes),
                            BAR_WIDTH,
                        ),
                        filled_cells(s.transferred_bytes, s.total_bytes, BAR_WIDTH),
                        Color::DarkGrey,
                    )
                } else {
                    (align("", "...", "", BAR_WIDTH), 0, Color::DarkGrey)
                }
            }
            TransferStatus::Paused => {
                let left = format!("{}ms", s.pause_remaining_ms);
                if s.is_failed() {
                    (
                        align(&left, " ", &short_error(s), BAR_WIDTH),
                        BAR_WIDTH,
                        Color::DarkRed,
                    )
                } else {
                    (
                        align(&left, " ", &format_bytes(s.total_bytes), BAR_WIDTH),
                        BAR_WIDTH,
                        Color::DarkGreen,
                    )
                }
            }
            TransferStatus::Done => {
                if s.is_failed() {
                    (
                        align("", &short_error(s), "", BAR_WIDTH),
                        BAR_WIDTH,
                        Color::DarkRed,
                    )
                } else {
                    (
                        align("", "", &format_bytes(s.total_bytes), BAR_WIDTH),
                        BAR_WIDTH,
                        Color::DarkGreen,
                    )
                }
            }
            TransferStatus::Idle => (align("", "", "", BAR_WIDTH), 0, Color::Reset),
        }
    }

    fn plain_line(&self, s: &TransferSnapshot) -> String {
        let outcome = if s.is_failed() {
            format!("ERROR {}", short_error(s))
        } else {
            format!("done {}", format_bytes(s.total_bytes))
        };
        format!(
            "{:0w$}/{:0w$} {} - {}",
            s.seq,
            self.total,
            outcome,
            caption_cut(&s.caption),
            w = self.seq_width
        )
    }
}

impl ProgressSink for ConsoleView {
    fn report(&mut self, snapshot: &TransferSnapshot) {
        if snapshot.status == TransferStatus::Idle {
            return;
        }
        let row = match &self.mode {
            Mode::Positional { base_row } => Some(base_row + (snapshot.seq as u16) - 1),
            Mode::Scrolling { .. } => None,
        };
        match row {
            Some(row) => {
                let _ = self.draw_at(row, snapshot);
            }
            None => {
                if let Mode::Scrolling { reported } = &mut self.mode {
                    if snapshot.status == TransferStatus::Done && reported.insert(snapshot.seq) {
                        println!("{}", self.plain_line(snapshot));
                    }
                }
            }
        }
    }
}

fn short_error(s: &TransferSnapshot) -> String {
    if s.http_status != 0 {
        format!("HTTP {}", s.http_status)
    } else {
        s.error.chars().take(BAR_WIDTH - 2).collect()
    }
}

fn caption_cut(caption: &str) -> String {
    if caption.chars().count() <= MAX_CAPTION {
        caption.to_string()
    } else {
        let cut: String = caption.chars().take(MAX_CAPTION - 1).collect();
        format!("{}…", cut)
    }
}
