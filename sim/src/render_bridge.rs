//! Renderer Bridge
//!
//! Converts a `Snapshot` into forms renderers can consume directly: a flat
//! integer buffer for renderers living across an FFI boundary, and a text
//! board for terminals.
//!
//! # Buffer Layout (Version 1.0)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (HEADER_SIZE elements)                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ [0]  rows                                                       │
//! │ [1]  cols                                                       │
//! │ [2]  tile_size      - Tile edge in pixels                       │
//! │ [3]  status         - See STATUS_* constants                    │
//! │ [4]  agent_row                                                  │
//! │ [5]  agent_col                                                  │
//! │ [6]  goal_row                                                   │
//! │ [7]  goal_col                                                   │
//! │ [8]  obstacle_count                                             │
//! │ [9]  path_len                                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ OBSTACLES (obstacle_count × CELL_STRIDE): row, col              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ PATH (path_len × CELL_STRIDE): row, col, next cell first        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pixel position of a cell is `(col * tile_size, row * tile_size)`.
//!
//! # Status Mapping
//!
//! | Status      | ID |
//! |-------------|----|
//! | Running     | 0  |
//! | Stalled     | 1  |
//! | GoalReached | 2  |
//! | Destroyed   | 3  |
//! | Unreachable | 4  |

use crate::components::{row_label, Cell, RunStatus};
use crate::error::Result;
use crate::host::Renderer;
use crate::world::Snapshot;
use std::io::Write;

// ============================================================================
// CONSTANTS - STABLE FFI CONTRACT
// ============================================================================

/// Number of i32 values in the buffer header.
pub const HEADER_SIZE: usize = 10;

/// Number of i32 values per cell (row, col).
pub const CELL_STRIDE: usize = 2;

pub const FIELD_ROWS: usize = 0;
pub const FIELD_COLS: usize = 1;
pub const FIELD_TILE_SIZE: usize = 2;
pub const FIELD_STATUS: usize = 3;
pub const FIELD_AGENT_ROW: usize = 4;
pub const FIELD_AGENT_COL: usize = 5;
pub const FIELD_GOAL_ROW: usize = 6;
pub const FIELD_GOAL_COL: usize = 7;
pub const FIELD_OBSTACLE_COUNT: usize = 8;
pub const FIELD_PATH_LEN: usize = 9;

pub const STATUS_RUNNING: i32 = 0;
pub const STATUS_STALLED: i32 = 1;
pub const STATUS_GOAL_REACHED: i32 = 2;
pub const STATUS_DESTROYED: i32 = 3;
pub const STATUS_UNREACHABLE: i32 = 4;

// ============================================================================
// BUFFER ENCODING
// ============================================================================

#[inline]
pub fn status_to_id(status: RunStatus) -> i32 {
    match status {
        RunStatus::Running => STATUS_RUNNING,
        RunStatus::Stalled { .. } => STATUS_STALLED,
        RunStatus::GoalReached => STATUS_GOAL_REACHED,
        RunStatus::Destroyed => STATUS_DESTROYED,
        RunStatus::Unreachable => STATUS_UNREACHABLE,
    }
}

/// Encode a snapshot as a flat buffer.
///
/// Deterministic: the same snapshot always yields the same buffer.
pub fn snapshot_to_buffer(snapshot: &Snapshot) -> Vec<i32> {
    let buffer_size = calculate_buffer_size(snapshot.obstacles.len(), snapshot.path.len());
    let mut buffer = Vec::with_capacity(buffer_size);

    buffer.push(snapshot.rows as i32);
    buffer.push(snapshot.cols as i32);
    buffer.push(snapshot.tile_size as i32);
    buffer.push(status_to_id(snapshot.status));
    buffer.push(snapshot.agent.row as i32);
    buffer.push(snapshot.agent.col as i32);
    buffer.push(snapshot.goal.row as i32);
    buffer.push(snapshot.goal.col as i32);
    buffer.push(snapshot.obstacles.len() as i32);
    buffer.push(snapshot.path.len() as i32);

    for cell in snapshot.obstacles.iter().chain(&snapshot.path) {
        buffer.push(cell.row as i32);
        buffer.push(cell.col as i32);
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

/// `HEADER_SIZE + (obstacle_count + path_len) * CELL_STRIDE`
#[inline]
pub fn calculate_buffer_size(obstacle_count: usize, path_len: usize) -> usize {
    HEADER_SIZE + (obstacle_count + path_len) * CELL_STRIDE
}

/// Offset of the `index`-th obstacle cell.
#[inline]
pub const fn obstacle_offset(index: usize) -> usize {
    HEADER_SIZE + index * CELL_STRIDE
}

/// Offset of the `index`-th path cell.
#[inline]
pub const fn path_offset(obstacle_count: usize, index: usize) -> usize {
    HEADER_SIZE + (obstacle_count + index) * CELL_STRIDE
}

/// Read the cells back out of a buffer.
///
/// Returns `None` if the buffer is shorter than its header claims.
pub fn parse_cells(buffer: &[i32]) -> Option<(Vec<Cell>, Vec<Cell>)> {
    let header = buffer.get(..HEADER_SIZE)?;
    let obstacle_count = usize::try_from(header[FIELD_OBSTACLE_COUNT]).ok()?;
    let path_len = usize::try_from(header[FIELD_PATH_LEN]).ok()?;
    if buffer.len() < calculate_buffer_size(obstacle_count, path_len) {
        return None;
    }

    let cell_at = |offset: usize| -> Option<Cell> {
        Some(Cell::new(
            usize::try_from(buffer[offset]).ok()?,
            usize::try_from(buffer[offset + 1]).ok()?,
        ))
    };
    let obstacles = (0..obstacle_count)
        .map(|i| cell_at(obstacle_offset(i)))
        .collect::<Option<Vec<_>>>()?;
    let path = (0..path_len)
        .map(|i| cell_at(path_offset(obstacle_count, i)))
        .collect::<Option<Vec<_>>>()?;
    Some((obstacles, path))
}

// ============================================================================
// TEXT BOARD
// ============================================================================

/// Draw the board as text.
///
/// Rows carry letter labels, columns 1-based numbers. `@` is the agent, `G`
/// the goal, `X` an obstacle, `*` a remaining path cell and `.` free ground.
/// An obstacle drawn over the agent shows the collision.
pub fn render_board(snapshot: &Snapshot) -> String {
    let (rows, cols) = (snapshot.rows, snapshot.cols);
    let mut board = vec![vec!['.'; cols]; rows];
    let mut put = |cell: &Cell, glyph: char| {
        if let Some(slot) = board.get_mut(cell.row).and_then(|row| row.get_mut(cell.col)) {
            *slot = glyph;
        }
    };

    for cell in &snapshot.path {
        put(cell, '*');
    }
    put(&snapshot.goal, 'G');
    put(&snapshot.agent, '@');
    for cell in &snapshot.obstacles {
        put(cell, 'X');
    }

    let label_width = row_label(rows.saturating_sub(1)).len();
    let col_width = cols.to_string().len();

    let mut out = format!(
        "tick {} | {} | steps {}\n",
        snapshot.tick,
        snapshot.status.name(),
        snapshot.steps
    );
    out.push_str(&" ".repeat(label_width));
    for col in 0..cols {
        out.push_str(&format!(" {:>col_width$}", col + 1));
    }
    out.push('\n');
    for (row, glyphs) in board.iter().enumerate() {
        out.push_str(&format!("{:>label_width$}", row_label(row)));
        for glyph in glyphs {
            out.push_str(&format!(" {glyph:>col_width$}"));
        }
        out.push('\n');
    }
    out
}

/// Renderer that writes the text board to any `Write` sink.
pub struct AsciiRenderer<W: Write> {
    out: W,
    /// Emit an ANSI clear-screen before each frame.
    clear: bool,
}

impl<W: Write> AsciiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, clear: false }
    }

    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    fn render(&mut self, frame: &Snapshot) -> Result<()> {
        if self.clear {
            write!(self.out, "\x1b[2J\x1b[H")?;
        }
        self.out.write_all(render_board(frame).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
