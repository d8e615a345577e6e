//! Tile: value (0..=7), visual state, and the rectangle it is drawn in.

/// Highest value a tile can hold. 0 means empty.
pub const MAX_TILE_VALUE: u8 = 7;

/// Visual variant of a tile. Only affects which asset is drawn.
///
/// `Grinded` exists for completeness but generation never produces it; the
/// legacy constants for Gray and Grinded shared one value, so a Grinded tile
/// was never distinguishable from a Gray one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileState {
    #[default]
    Number,
    Gray,
    Grinded,
}

/// Axis-aligned rectangle in board drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TileRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TileRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Straight-line distance between the top-left corners of two rects.
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `to`; `t` is clamped to [0, 1].
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            width: self.width + (to.width - self.width) * t,
            height: self.height + (to.height - self.height) * t,
        }
    }
}

/// One cell of the board (or the pending tile above it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    value: u8,
    pub state: TileState,
    pub rect: TileRect,
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(0, TileState::Number, TileRect::default())
    }
}

impl Tile {
    pub fn new(value: i32, state: TileState, rect: TileRect) -> Self {
        let mut tile = Self {
            value: 0,
            state,
            rect,
        };
        tile.set_value(value);
        tile
    }

    /// Set the value, clamping into 0..=MAX_TILE_VALUE.
    pub fn set_value(&mut self, value: i32) {
        self.value = value.clamp(0, i32::from(MAX_TILE_VALUE)) as u8;
    }

    #[inline]
    pub fn value(&self) -> u8 {
        self.value
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value == 0
    }

    /// Copy value and state from `other`; the rect is left alone.
    pub fn take_face_of(&mut self, other: &Self) {
        self.value = other.value;
        self.state = other.state;
    }

    /// Empty the tile (value 0, Number state). The rect is kept.
    pub fn clear(&mut self) {
        self.value = 0;
        self.state = TileState::Number;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_clamped() {
        let mut t = Tile::default();
        t.set_value(-4);
        assert_eq!(t.value(), 0);
        t.set_value(12);
        assert_eq!(t.value(), 7);
        t.set_value(5);
        assert_eq!(t.value(), 5);
        let t = Tile::new(99, TileState::Gray, TileRect::default());
        assert_eq!(t.value(), 7);
    }

    #[test]
    fn test_empty_iff_zero() {
        for v in -2..10 {
            let t = Tile::new(v, TileState::Number, TileRect::default());
            assert_eq!(t.is_empty(), t.value() == 0, "value {}", v);
        }
    }

    #[test]
    fn test_take_face_keeps_rect() {
        let src = Tile::new(4, TileState::Gray, TileRect::new(3.0, -1.0, 1.0, 1.0));
        let mut dst = Tile::new(0, TileState::Number, TileRect::new(0.0, 6.0, 1.0, 1.0));
        dst.take_face_of(&src);
        assert_eq!(dst.value(), 4);
        assert_eq!(dst.state, TileState::Gray);
        assert_eq!(dst.rect, TileRect::new(0.0, 6.0, 1.0, 1.0));
    }

    #[test]
    fn test_lerp_clamps() {
        let a = TileRect::new(0.0, 0.0, 1.0, 1.0);
        let b = TileRect::new(4.0, 0.0, 1.0, 1.0);
        assert_eq!(a.lerp(&b, 0.5).x, 2.0);
        assert_eq!(a.lerp(&b, 3.0), b);
        assert_eq!(a.lerp(&b, -1.0), a);
        assert_eq!(a.distance_to(&b), 4.0);
    }
}
