//! Grid: the 7x7 board of tiles plus the pending tile staged above it.
//!
//! Cells are indexed `[column][row]`, row 0 is the top. Rects are expressed in
//! board coordinates where one tile is `tile_dimension` wide; row -1 is the
//! staging row the pending tile sits in.

use rand::Rng;

use crate::tile::{MAX_TILE_VALUE, Tile, TileRect, TileState};

pub const COLUMNS: usize = 7;
pub const ROWS: usize = 7;

/// Row index of the staging row above the board.
pub const PENDING_ROW: i32 = -1;
/// Column the pending tile is staged over.
pub const PENDING_COLUMN: i32 = (COLUMNS / 2) as i32;

/// Addresses a tile whose rect can be animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSlot {
    Cell { column: usize, row: usize },
    Pending,
}

#[derive(Debug, Clone)]
pub struct Grid {
    cells: [[Tile; ROWS]; COLUMNS],
    pending: Tile,
    tile_dimension: f32,
}

impl Grid {
    /// Every cell starts as a Number tile of value 1, laid out at its slot.
    pub fn new(tile_dimension: f32) -> Self {
        let tile_dimension = tile_dimension.max(f32::EPSILON);
        let mut cells = [[Tile::default(); ROWS]; COLUMNS];
        for (c, column) in cells.iter_mut().enumerate() {
            for (r, tile) in column.iter_mut().enumerate() {
                *tile = Tile::new(
                    1,
                    TileState::Number,
                    layout_rect(tile_dimension, c as i32, r as i32),
                );
            }
        }
        let pending = Tile::new(
            1,
            TileState::Number,
            layout_rect(tile_dimension, PENDING_COLUMN, PENDING_ROW),
        );
        Self {
            cells,
            pending,
            tile_dimension,
        }
    }

    /// Board extent in board units, staging row excluded.
    pub fn content_width(&self) -> f32 {
        self.tile_dimension * COLUMNS as f32
    }

    pub fn content_height(&self) -> f32 {
        self.tile_dimension * ROWS as f32
    }

    /// Layout rect for (column, row); row may be `PENDING_ROW`.
    pub fn tile_rect(&self, column: i32, row: i32) -> TileRect {
        layout_rect(self.tile_dimension, column, row)
    }

    pub fn get(&self, column: i32, row: i32) -> Option<&Tile> {
        let (c, r) = index(column, row)?;
        Some(&self.cells[c][r])
    }

    pub fn get_mut(&mut self, column: i32, row: i32) -> Option<&mut Tile> {
        let (c, r) = index(column, row)?;
        Some(&mut self.cells[c][r])
    }

    #[inline]
    pub fn pending(&self) -> &Tile {
        &self.pending
    }

    pub fn tile_mut(&mut self, slot: TileSlot) -> Option<&mut Tile> {
        match slot {
            TileSlot::Cell { column, row } => self.cells.get_mut(column)?.get_mut(row),
            TileSlot::Pending => Some(&mut self.pending),
        }
    }

    /// All board cells with their (column, row).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Tile)> {
        self.cells.iter().enumerate().flat_map(|(c, column)| {
            column.iter().enumerate().map(move |(r, tile)| (c, r, tile))
        })
    }

    /// True when the column's top cell is occupied (or the column does not exist).
    pub fn is_column_full(&self, column: i32) -> bool {
        self.get(column, 0).is_none_or(|t| !t.is_empty())
    }

    /// Landing row for a tile dropped into `column`.
    ///
    /// Scans from the top; returns the row just above the first occupied cell,
    /// the bottom row for an empty column, and -1 for a full or unknown column.
    pub fn find_last_empty_row(&self, column: i32) -> i32 {
        if column < 0 || column >= COLUMNS as i32 {
            return -1;
        }
        let cells = &self.cells[column as usize];
        match cells.iter().position(|t| !t.is_empty()) {
            Some(first) => first as i32 - 1,
            None => ROWS as i32 - 1,
        }
    }

    /// Bubble non-empty tiles down through empty cells until every column is
    /// contiguous from the bottom. Slots keep their layout rects.
    pub fn collapse_tiles(&mut self) {
        loop {
            let mut swapped = false;
            for column in &mut self.cells {
                for r in (0..ROWS - 1).rev() {
                    if !column[r].is_empty() && column[r + 1].is_empty() {
                        column.swap(r, r + 1);
                        let rect = column[r].rect;
                        column[r].rect = column[r + 1].rect;
                        column[r + 1].rect = rect;
                        swapped = true;
                    }
                }
            }
            if !swapped {
                break;
            }
        }
    }

    /// Randomize `tile` in place.
    ///
    /// One in four outcomes is a real tile; when `can_be_empty` is false every
    /// outcome is. A real tile is Gray two times in three, Number otherwise,
    /// with a value uniform in 1..=7. The rect is untouched.
    pub fn generate_random_tile<R: Rng + ?Sized>(tile: &mut Tile, can_be_empty: bool, rng: &mut R) {
        let is_tile = rng.gen_range(0..=3) == 0;
        if is_tile || !can_be_empty {
            let is_gray = rng.gen_range(0..=2) > 0;
            tile.state = if is_gray {
                TileState::Gray
            } else {
                TileState::Number
            };
            tile.set_value(i32::from(rng.gen_range(1..=MAX_TILE_VALUE)));
        } else {
            tile.clear();
        }
    }

    /// Fresh random board, a guaranteed non-empty pending tile, then collapse.
    pub fn generate_puzzle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for column in &mut self.cells {
            for tile in column.iter_mut() {
                Self::generate_random_tile(tile, true, rng);
            }
        }
        self.regenerate_pending(rng);
        self.collapse_tiles();
    }

    pub fn regenerate_pending<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        Self::generate_random_tile(&mut self.pending, false, rng);
    }

    /// Copy the pending tile's value and state into `target`.
    pub fn drop_placement(target: &mut Tile, pending: &Tile) {
        target.take_face_of(pending);
    }

    /// Place the pending tile's face into (column, row) and move that cell's
    /// rect to where the pending tile is drawn, so it can animate into place.
    pub fn place_pending(&mut self, column: i32, row: i32) -> bool {
        let pending = self.pending;
        match self.get_mut(column, row) {
            Some(target) => {
                Self::drop_placement(target, &pending);
                target.rect = pending.rect;
                true
            }
            None => false,
        }
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// No column has an empty cell beneath an occupied one.
    pub fn is_contiguous(&self) -> bool {
        self.cells.iter().all(|column| {
            column
                .windows(2)
                .all(|pair| pair[0].is_empty() || !pair[1].is_empty())
        })
    }
}

fn layout_rect(tile_dimension: f32, column: i32, row: i32) -> TileRect {
    TileRect::new(
        column as f32 * tile_dimension,
        row as f32 * tile_dimension,
        tile_dimension,
        tile_dimension,
    )
}

#[inline]
fn index(column: i32, row: i32) -> Option<(usize, usize)> {
    if column < 0 || row < 0 || column >= COLUMNS as i32 || row >= ROWS as i32 {
        return None;
    }
    Some((column as usize, row as usize))
}
