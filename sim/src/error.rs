//! Errors raised while setting up a simulation.
//!
//! Only construction and rendering can fail. Once a `SimWorld` exists,
//! planning failures, collisions and victories are reported through
//! `RunStatus`.

use crate::components::Cell;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("grid must have at least one row and one column, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("{what} cell {cell} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        what: &'static str,
        cell: Cell,
        rows: usize,
        cols: usize,
    },

    #[error("obstacle at ({row}, {col}) is outside the grid")]
    ObstacleOutOfBounds { row: usize, col: usize },

    #[error("obstacle lane on row {row} shares a row with the start or goal")]
    ObstacleOnAgentRow { row: usize },

    #[error("tick rate must be a positive number of ticks per second, got {0}")]
    InvalidTickRate(f32),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
