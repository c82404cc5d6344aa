//! Pixel Grid Model
//!
//! A grid is an ordered sequence of rows, each an ordered sequence of
//! string-encoded colors. It is indexed `[row][col]`, that is `[y][x]`.
//!
//! # Invariants
//!
//! - Every row has the same length (`xsize`)
//! - The number of rows equals `ysize`
//! - A request with either dimension below 1 produces a grid with zero rows
//! - Neither dimension exceeds [`MAX_GRID_SIDE`]; callers check requested
//!   sizes with [`check_dimensions`] before allocating
//!
//! # Serialization
//!
//! Grids serialize as a JSON array of arrays of strings. The same text form is
//! what the store keeps in its `grid` column.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Background color used for freshly created grids
pub const DEFAULT_COLOR: &str = "#FFF";

/// Largest accepted width or height
pub const MAX_GRID_SIDE: i64 = 512;

/// Errors raised by grid access and decoding
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A cell outside of the grid was addressed
    #[error("cell ({x}, {y}) is outside of a {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// A requested width or height is above [`MAX_GRID_SIDE`]
    #[error("a {width}x{height} grid exceeds the {max} cell side limit")]
    TooLarge { width: i64, height: i64, max: i64 },

    /// The stored text could not be turned back into a grid
    #[error("failed to decode grid: {message}")]
    Decode { message: String },
}

/// Fixed-size 2D container of color cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Create a `height` x `width` grid filled with `fill`.
    ///
    /// Returns an empty grid (zero rows) when either dimension is below 1.
    /// Callers rely on this to treat "no grid yet" and "degenerate size" the
    /// same way, so it is not an error.
    pub fn new(width: i64, height: i64, fill: &str) -> Self {
        if width < 1 || height < 1 {
            return Self::empty();
        }

        let row = vec![fill.to_string(); width as usize];
        Self {
            rows: vec![row; height as usize],
        }
    }

    /// A grid with no rows
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of columns (0 for an empty grid)
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in `[y][x]` order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Read the color at column `x`, row `y`
    pub fn cell(&self, x: usize, y: usize) -> Option<&str> {
        self.rows.get(y).and_then(|row| row.get(x)).map(String::as_str)
    }

    /// Overwrite the color at column `x`, row `y`.
    ///
    /// Out-of-bounds coordinates are reported, never clamped.
    pub fn set_cell(&mut self, x: usize, y: usize, color: impl Into<String>) -> Result<(), GridError> {
        let width = self.width();
        let height = self.height();
        let cell = self
            .rows
            .get_mut(y)
            .and_then(|row| row.get_mut(x))
            .ok_or(GridError::OutOfBounds { x, y, width, height })?;
        *cell = color.into();
        Ok(())
    }

    /// True when every row has the same length
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|row| row.len() == width)
    }

    /// Encode to the text form kept by the store
    pub fn to_json(&self) -> Result<String, GridError> {
        serde_json::to_string(self).map_err(|e| GridError::Decode {
            message: e.to_string(),
        })
    }

    /// Decode the text form kept by the store.
    ///
    /// Ragged rows are rejected since they would break the width invariant.
    pub fn from_json(text: &str) -> Result<Self, GridError> {
        let grid: Grid = serde_json::from_str(text).map_err(|e| GridError::Decode {
            message: e.to_string(),
        })?;
        if !grid.is_rectangular() {
            return Err(GridError::Decode {
                message: "rows have different lengths".to_string(),
            });
        }
        Ok(grid)
    }
}

/// Reject sizes above [`MAX_GRID_SIDE`].
///
/// Sizes below 1 pass: they yield an empty grid.
pub fn check_dimensions(width: i64, height: i64) -> Result<(), GridError> {
    if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
        return Err(GridError::TooLarge {
            width,
            height,
            max: MAX_GRID_SIDE,
        });
    }
    Ok(())
}

/// Create a grid filled with [`DEFAULT_COLOR`]
pub fn create_grid(width: i64, height: i64) -> Grid {
    Grid::new(width, height, DEFAULT_COLOR)
}
