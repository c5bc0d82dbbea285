//! Hex-style connection game.
//!
//! Two players alternately place stones on an N x N rhombus of hexagonal
//! cells. Player 0 joins the top and bottom rows, player 1 joins the left and
//! right columns. Cells can be blocked at setup to build narrow positions.

mod eval;
mod game;

pub use eval::ConnectEvaluator;
pub use game::{Cell, ConnectBoard, DEFAULT_SIZE, PLACE};
