//! PuzzleController: drop requests, the drop animation lifecycle, levels and score.

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animation::{
    Animation, AnimationEvent, AnimationKind, AnimationManager, AnimationNotice,
};
use crate::grid::{COLUMNS, Grid, PENDING_ROW, TileSlot};

/// Number of levels; also the drop budget of level 1.
pub const MAX_LEVELS: u32 = 30;

/// Drop speed in tiles per second.
pub const DEFAULT_DROP_RATE: f32 = 10.0;

/// Inclusive range of the score granted per completed drop.
pub const DROP_SCORE_MIN: u32 = 50;
pub const DROP_SCORE_MAX: u32 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleConfig {
    pub seed: u64,
    pub start_level: u32,
    /// Width of one tile in board units.
    pub tile_dimension: f32,
    /// Tiles per second. Infinite means drops land on the first tick.
    pub drop_rate: f32,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_level: 1,
            tile_dimension: 1.0,
            drop_rate: DEFAULT_DROP_RATE,
        }
    }
}

impl PuzzleConfig {
    /// Board units per second the drop animation moves at.
    pub fn units_per_sec(&self) -> f32 {
        self.tile_dimension * self.drop_rate
    }
}

/// Why a drop request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    AlreadyDropping,
    OutOfBounds,
    ColumnFull,
    NothingToPlace,
}

/// Drop budget for `level`.
pub fn numbers_for_level(level: u32) -> u32 {
    MAX_LEVELS.saturating_sub(level.saturating_sub(1))
}

/// Column under board x coordinate `x`, or None when left of the board or past it.
pub fn column_from_x(left_offset: f32, tile_dimension: f32, x: f32) -> Option<i32> {
    if tile_dimension.is_nan() || tile_dimension <= 0.0 {
        return None;
    }
    let column = ((x - left_offset) / tile_dimension).floor();
    (column >= 0.0 && column < COLUMNS as f32).then_some(column as i32)
}

#[derive(Debug)]
pub struct PuzzleController {
    config: PuzzleConfig,
    grid: Grid,
    animations: AnimationManager,
    rng: StdRng,
    current_level: u32,
    numbers_to_place: u32,
    score: u32,
    is_dropping: bool,
    /// Notices handled during the last tick, for hosts that want to react too.
    last_notices: Vec<AnimationNotice>,
}

impl PuzzleController {
    pub fn new(config: PuzzleConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut grid = Grid::new(config.tile_dimension);
        grid.generate_puzzle(&mut rng);
        let mut controller = Self {
            grid,
            animations: AnimationManager::new(),
            rng,
            current_level: 1,
            numbers_to_place: 0,
            score: 0,
            is_dropping: false,
            last_notices: Vec::new(),
            config,
        };
        controller.set_current_level(controller.config.start_level);
        info!(
            "new puzzle: seed {} level {}",
            controller.config.seed, controller.current_level
        );
        controller
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    #[inline]
    pub fn numbers_to_place(&self) -> u32 {
        self.numbers_to_place
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn is_dropping(&self) -> bool {
        self.is_dropping
    }

    pub fn last_notices(&self) -> &[AnimationNotice] {
        &self.last_notices
    }

    /// Final level reached and its budget spent.
    pub fn is_complete(&self) -> bool {
        self.current_level >= MAX_LEVELS && self.numbers_to_place == 0
    }

    /// Clamp to 1..=MAX_LEVELS and reset the drop budget for that level.
    pub fn set_current_level(&mut self, level: u32) {
        self.current_level = level.clamp(1, MAX_LEVELS);
        self.numbers_to_place = numbers_for_level(self.current_level);
    }

    pub fn set_numbers_to_place(&mut self, numbers: i64) {
        self.numbers_to_place = numbers.clamp(0, i64::from(u32::MAX)) as u32;
    }

    pub fn increase_score(&mut self, amount: u32) {
        self.score = self.score.saturating_add(amount);
    }

    /// Input boundary: a tap resolved to `column`.
    pub fn on_column_tapped(&mut self, column: i32) -> bool {
        self.request_drop(column).is_ok()
    }

    /// Place the pending tile into `column` and schedule its drop animation.
    ///
    /// The cell takes the pending tile's value right away; the animation only
    /// moves its rect from the staging slot over the column and then down.
    pub fn request_drop(&mut self, column: i32) -> Result<(), DropRejection> {
        let rejection = if self.is_dropping {
            Some(DropRejection::AlreadyDropping)
        } else if column < 0 || column >= COLUMNS as i32 {
            Some(DropRejection::OutOfBounds)
        } else if self.grid.is_column_full(column) {
            Some(DropRejection::ColumnFull)
        } else if self.numbers_to_place == 0 {
            Some(DropRejection::NothingToPlace)
        } else {
            None
        };
        if let Some(reason) = rejection {
            debug!("drop into column {} rejected: {:?}", column, reason);
            return Err(reason);
        }

        self.is_dropping = true;
        let row = self.grid.find_last_empty_row(column);
        let start = self.grid.pending().rect;
        let placed = self.grid.place_pending(column, row);
        debug_assert!(placed, "open column {} has no landing cell", column);

        let slot = TileSlot::Cell {
            column: column as usize,
            row: row as usize,
        };
        let over_column = self.grid.tile_rect(column, PENDING_ROW);
        let landing = self.grid.tile_rect(column, row);
        let speed = self.config.units_per_sec();
        let event = AnimationEvent::new(AnimationKind::TileDrop)
            .with(Animation::with_speed(slot, &start, over_column, speed))
            .with(Animation::with_speed(slot, &over_column, landing, speed));
        let id = self.animations.add(event);
        debug!("drop {:?} into column {} row {}", id, column, row);
        Ok(())
    }

    /// Advance animations by `dt` seconds and apply the state changes they trigger.
    pub fn tick(&mut self, dt: f32) {
        self.last_notices.clear();
        for notice in self.animations.start_pending() {
            self.handle_notice(notice);
        }
        for notice in self.animations.advance(dt, &mut self.grid) {
            self.handle_notice(notice);
        }
    }

    fn handle_notice(&mut self, notice: AnimationNotice) {
        trace!("animation notice {:?}", notice);
        match notice {
            AnimationNotice::Started {
                kind: AnimationKind::TileDrop,
                ..
            } => self.grid.clear_pending(),
            AnimationNotice::Finished {
                kind: AnimationKind::TileDrop,
                ..
            } => {
                self.on_drop_complete();
                let bonus = self.rng.gen_range(DROP_SCORE_MIN..=DROP_SCORE_MAX);
                self.increase_score(bonus);
            }
            AnimationNotice::Canceled { .. } => {}
        }
        self.last_notices.push(notice);
    }

    fn on_drop_complete(&mut self) {
        self.grid.regenerate_pending(&mut self.rng);
        self.set_numbers_to_place(i64::from(self.numbers_to_place) - 1);
        if self.numbers_to_place == 0 && self.current_level < MAX_LEVELS {
            self.grid.generate_puzzle(&mut self.rng);
            self.set_current_level(self.current_level + 1);
            info!(
                "level {} reached, {} numbers to place",
                self.current_level, self.numbers_to_place
            );
        }
        self.is_dropping = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ROWS;

    fn controller() -> PuzzleController {
        PuzzleController::new(PuzzleConfig {
            seed: 9,
            ..PuzzleConfig::default()
        })
    }

    /// First column with room, if any.
    fn open_column(p: &PuzzleController) -> i32 {
        (0..COLUMNS as i32)
            .find(|&c| !p.grid().is_column_full(c))
            .expect("open column")
    }

    fn run_until_idle(p: &mut PuzzleController) {
        for _ in 0..1000 {
            if !p.is_dropping() {
                return;
            }
            p.tick(1.0 / 60.0);
        }
        panic!("drop never finished");
    }

    #[test]
    fn test_initial_state() {
        let p = controller();
        assert_eq!(p.current_level(), 1);
        assert_eq!(p.numbers_to_place(), 30);
        assert_eq!(p.score(), 0);
        assert!(!p.is_dropping());
        assert!(p.grid().is_contiguous());
        assert!(!p.grid().pending().is_empty());
    }

    #[test]
    fn test_numbers_for_level() {
        assert_eq!(numbers_for_level(1), 30);
        assert_eq!(numbers_for_level(2), 29);
        assert_eq!(numbers_for_level(30), 1);
    }

    #[test]
    fn test_start_level_is_clamped() {
        let p = PuzzleController::new(PuzzleConfig {
            start_level: 99,
            ..PuzzleConfig::default()
        });
        assert_eq!(p.current_level(), 30);
        assert_eq!(p.numbers_to_place(), 1);
    }

    #[test]
    fn test_second_request_rejected_while_dropping() {
        let mut p = controller();
        let c = open_column(&p);
        assert_eq!(p.request_drop(c), Ok(()));
        assert!(p.is_dropping());
        assert_eq!(p.request_drop(c), Err(DropRejection::AlreadyDropping));
        p.tick(0.001);
        assert!(p.is_dropping());
        run_until_idle(&mut p);
        assert!(!p.is_dropping());
        assert_eq!(p.numbers_to_place(), 29);
    }

    #[test]
    fn test_rejections() {
        let mut p = controller();
        assert_eq!(p.request_drop(-1), Err(DropRejection::OutOfBounds));
        assert_eq!(p.request_drop(7), Err(DropRejection::OutOfBounds));
        p.set_numbers_to_place(0);
        let c = open_column(&p);
        assert_eq!(p.request_drop(c), Err(DropRejection::NothingToPlace));
        assert!(!p.is_dropping());
    }

    #[test]
    fn test_full_column_rejected() {
        let mut p = controller();
        let c = open_column(&p);
        let mut drops = 0;
        while !p.grid().is_column_full(c) {
            assert!(p.on_column_tapped(c));
            run_until_idle(&mut p);
            drops += 1;
            assert!(drops <= ROWS);
        }
        assert_eq!(p.request_drop(c), Err(DropRejection::ColumnFull));
    }

    #[test]
    fn test_placement_is_immediate_and_pending_clears_on_start() {
        let mut p = controller();
        let c = open_column(&p);
        let row = p.grid().find_last_empty_row(c);
        let pending = *p.grid().pending();
        p.request_drop(c).unwrap();
        let placed = *p.grid().get(c, row).unwrap();
        assert_eq!(placed.value(), pending.value());
        assert_eq!(placed.state, pending.state);
        assert_eq!(placed.rect, pending.rect);
        assert!(!p.grid().pending().is_empty());

        p.tick(0.0);
        assert!(p.grid().pending().is_empty());
        assert!(matches!(p.last_notices(), [AnimationNotice::Started { .. }]));

        run_until_idle(&mut p);
        let landed = p.grid().get(c, row).unwrap();
        assert_eq!(landed.rect, p.grid().tile_rect(c, row));
        assert!(!p.grid().pending().is_empty());
    }

    #[test]
    fn test_last_drop_of_level_advances() {
        let mut p = controller();
        p.set_numbers_to_place(1);
        let c = open_column(&p);
        p.request_drop(c).unwrap();
        run_until_idle(&mut p);
        assert_eq!(p.current_level(), 2);
        assert_eq!(p.numbers_to_place(), 29);
        assert!(p.grid().is_contiguous());
    }

    #[test]
    fn test_final_level_does_not_advance() {
        let mut p = PuzzleController::new(PuzzleConfig {
            start_level: 30,
            ..PuzzleConfig::default()
        });
        let c = open_column(&p);
        p.request_drop(c).unwrap();
        run_until_idle(&mut p);
        assert_eq!(p.current_level(), 30);
        assert_eq!(p.numbers_to_place(), 0);
        assert!(p.is_complete());
        assert_eq!(p.request_drop(c), Err(DropRejection::NothingToPlace));
    }

    #[test]
    fn test_every_open_column_takes_the_pending_face() {
        let mut p = PuzzleController::new(PuzzleConfig {
            seed: 21,
            drop_rate: f32::INFINITY,
            ..PuzzleConfig::default()
        });
        for c in 0..COLUMNS as i32 {
            if p.grid().is_column_full(c) {
                continue;
            }
            let row = p.grid().find_last_empty_row(c);
            let pending = *p.grid().pending();
            p.request_drop(c).unwrap();
            let placed = p.grid().get(c, row).unwrap();
            assert_eq!((placed.value(), placed.state), (pending.value(), pending.state));
            p.tick(0.0);
            assert!(!p.is_dropping());
        }
    }

    #[test]
    fn test_score_increment_in_range() {
        let mut p = controller();
        let c = open_column(&p);
        p.request_drop(c).unwrap();
        run_until_idle(&mut p);
        assert!((DROP_SCORE_MIN..=DROP_SCORE_MAX).contains(&p.score()));
    }

    #[test]
    fn test_instant_drop_rate() {
        let mut p = PuzzleController::new(PuzzleConfig {
            drop_rate: f32::INFINITY,
            ..PuzzleConfig::default()
        });
        let c = open_column(&p);
        p.request_drop(c).unwrap();
        p.tick(0.0);
        assert!(!p.is_dropping());
        assert_eq!(p.last_notices().len(), 2);
    }

    #[test]
    fn test_column_from_x() {
        assert_eq!(column_from_x(0.0, 1.0, 0.5), Some(0));
        assert_eq!(column_from_x(2.0, 3.0, 2.0 + 3.0 * 6.9), Some(6));
        assert_eq!(column_from_x(2.0, 3.0, 1.0), None);
        assert_eq!(column_from_x(0.0, 1.0, 7.0), None);
        assert_eq!(column_from_x(0.0, 0.0, 1.0), None);
        assert_eq!(column_from_x(0.0, -1.0, -0.5), None);
        assert_eq!(column_from_x(0.0, f32::NAN, 1.0), None);
    }
}
