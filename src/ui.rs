//! Layout and drawing: board, staging row, score, level pips, overlays.
//!
//! Everything here reads a [`PuzzleController`]; nothing mutates it.

use crate::grid::{COLUMNS, ROWS};
use crate::puzzle::{MAX_LEVELS, PuzzleController, column_from_x};
use crate::theme::{Theme, TileAsset};
use crate::tile::{Tile, TileRect};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal cells per tile. Cells are roughly twice as tall as wide.
pub const TILE_W: u16 = 6;
pub const TILE_H: u16 = 3;

const BOARD_W: u16 = TILE_W * COLUMNS as u16;
const BOARD_H: u16 = TILE_H * ROWS as u16;
/// Score line, cursor line, staging row, board, border, level line, help line.
const TOTAL_H: u16 = 2 + TILE_H + BOARD_H + 1 + 2;
const TOTAL_W: u16 = BOARD_W + 2;

const LANDING_FLASH_MS: u32 = 180;
const LEVEL_FADE_MS: u32 = 450;

/// Where the board sits on screen for a given terminal area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub outer: Rect,
    /// Top-left terminal cell of (column 0, row 0).
    pub origin: Position,
}

impl BoardLayout {
    pub fn for_area(area: Rect) -> Self {
        let x = area.x + area.width.saturating_sub(TOTAL_W) / 2;
        let y = area.y + area.height.saturating_sub(TOTAL_H) / 2;
        let outer = Rect {
            x,
            y,
            width: TOTAL_W.min(area.width),
            height: TOTAL_H.min(area.height),
        };
        Self {
            outer,
            origin: Position::new(x + 1, y + 2 + TILE_H),
        }
    }

    /// The board rows only (no staging row, no border).
    pub fn board(&self) -> Rect {
        Rect::new(self.origin.x, self.origin.y, BOARD_W, BOARD_H)
    }

    /// Column under a click, if the click landed on the board.
    pub fn column_at(&self, x: u16, y: u16) -> Option<i32> {
        let board = self.board();
        if y < board.y || y >= board.y + board.height {
            return None;
        }
        column_from_x(f32::from(self.origin.x), f32::from(TILE_W), f32::from(x))
    }

    /// Top-left terminal cell for a tile rect, given the board's
    /// (width, height) in board units.
    pub fn screen_rect(&self, rect: &TileRect, extent: (f32, f32)) -> (i32, i32) {
        let (width, height) = extent;
        let x = (rect.x / width * f32::from(BOARD_W)).round() as i32;
        let y = (rect.y / height * f32::from(BOARD_H)).round() as i32;
        (i32::from(self.origin.x) + x, i32::from(self.origin.y) + y)
    }
}

/// Short-lived tachyonfx effects layered over the board.
#[derive(Default)]
pub struct Effects {
    landing: Option<(Effect, Rect)>,
    level: Option<Effect>,
    last_processed: Option<Instant>,
}

impl Effects {
    /// Flash the cell a tile just landed in.
    pub fn landed(&mut self, layout: &BoardLayout, column: i32, row: i32, theme: &Theme) {
        let x = layout.origin.x + column as u16 * TILE_W;
        let y = layout.origin.y + row as u16 * TILE_H;
        let area = Rect::new(x, y, TILE_W, TILE_H);
        let effect = fx::fade_from(theme.title, theme.title, (LANDING_FLASH_MS, Interpolation::QuadOut))
            .with_area(area);
        self.landing = Some((effect, area));
    }

    /// Fade a freshly generated board in.
    pub fn level_changed(&mut self, layout: &BoardLayout, theme: &Theme) {
        let effect = fx::fade_from(theme.bg, theme.bg, (LEVEL_FADE_MS, Interpolation::Linear))
            .with_area(layout.board());
        self.level = Some(effect);
    }

    pub fn clear(&mut self) {
        self.landing = None;
        self.level = None;
        self.last_processed = None;
    }

    fn process(&mut self, frame: &mut Frame, board: Rect, now: Instant) {
        let delta = self
            .last_processed
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        let tfx_delta = TfxDuration::from_millis(delta_ms);
        self.last_processed = Some(now);

        if let Some(effect) = &mut self.level {
            frame.render_effect(effect, board, tfx_delta);
            if effect.done() {
                self.level = None;
            }
        }
        if let Some((effect, area)) = &mut self.landing {
            frame.render_effect(effect, *area, tfx_delta);
            if effect.done() {
                self.landing = None;
            }
        }
        if self.level.is_none() && self.landing.is_none() {
            self.last_processed = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Paused,
    Complete,
}

/// Draw one frame.
pub fn draw(
    frame: &mut Frame,
    puzzle: &PuzzleController,
    theme: &Theme,
    cursor: i32,
    overlay: Overlay,
    effects: &mut Effects,
    now: Instant,
) {
    let area = frame.area();
    let layout = BoardLayout::for_area(area);
    let outer = layout.outer;

    draw_header(frame, puzzle, theme, outer);
    draw_cursor(frame, puzzle, theme, &layout, cursor);

    let border = Rect::new(outer.x, layout.origin.y, TOTAL_W, BOARD_H + 1).intersection(area);
    frame.render_widget(
        Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_style(Style::default().fg(theme.div_line))
            .style(Style::default().bg(theme.bg)),
        border,
    );
    draw_board_lines(frame.buffer_mut(), theme, &layout, area);

    let grid = puzzle.grid();
    let extent = (grid.content_width(), grid.content_height());
    for (_, _, tile) in grid.cells() {
        draw_tile(frame.buffer_mut(), theme, &layout, tile, extent, area);
    }
    draw_tile(frame.buffer_mut(), theme, &layout, grid.pending(), extent, area);

    effects.process(frame, layout.board().intersection(area), now);

    draw_footer(frame, puzzle, theme, &layout);

    match overlay {
        Overlay::None => {}
        Overlay::Paused => draw_message(frame, theme, &layout, "PAUSED", "p resume · q quit"),
        Overlay::Complete => draw_message(
            frame,
            theme,
            &layout,
            "ALL LEVELS COMPLETE",
            "r restart · q quit",
        ),
    }
}

fn draw_header(frame: &mut Frame, puzzle: &PuzzleController, theme: &Theme, outer: Rect) {
    let row = Rect::new(outer.x, outer.y, outer.width, 1);
    let title = Paragraph::new(Line::from(Span::styled(
        " drop7 ",
        Style::default()
            .fg(theme.title)
            .add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(title, row);
    let score = Paragraph::new(Line::from(Span::styled(
        format!("{} ", puzzle.score()),
        Style::default()
            .fg(theme.main_fg)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Right);
    frame.render_widget(score, row);
}

fn draw_cursor(
    frame: &mut Frame,
    puzzle: &PuzzleController,
    theme: &Theme,
    layout: &BoardLayout,
    cursor: i32,
) {
    let y = layout.outer.y + 1;
    let x = layout.origin.x + cursor.clamp(0, COLUMNS as i32 - 1) as u16 * TILE_W + TILE_W / 2;
    let color = if puzzle.grid().is_column_full(cursor) || puzzle.is_dropping() {
        theme.inactive_fg
    } else {
        theme.title
    };
    if let Some(cell) = frame.buffer_mut().cell_mut(Position::new(x, y)) {
        cell.set_char('▼').set_fg(color);
    }
}

/// Column and row separators. Tiles are painted over them; the right-hand
/// column of each slot is the gap `paint_tile` leaves, so vertical lines stay visible.
fn draw_board_lines(buf: &mut Buffer, theme: &Theme, layout: &BoardLayout, clip: Rect) {
    let board = layout.board();
    let style = Style::default().fg(theme.div_line).bg(theme.bg);
    for dy in 0..BOARD_H {
        for dx in 0..BOARD_W {
            let on_column_line = dx % TILE_W == TILE_W - 1 && dx != BOARD_W - 1;
            let on_row_line = dy % TILE_H == 0 && dy != 0;
            let symbol = match (on_column_line, on_row_line) {
                (true, true) => "┼",
                (true, false) => "│",
                (false, true) => "─",
                (false, false) => continue,
            };
            let pos = Position::new(board.x + dx, board.y + dy);
            if !clip.contains(pos) {
                continue;
            }
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_symbol(symbol).set_style(style);
            }
        }
    }
}

fn draw_tile(
    buf: &mut Buffer,
    theme: &Theme,
    layout: &BoardLayout,
    tile: &Tile,
    extent: (f32, f32),
    clip: Rect,
) {
    let Some(asset) = theme.asset_for(tile.value(), tile.state) else {
        return;
    };
    let (x0, y0) = layout.screen_rect(&tile.rect, extent);
    paint_tile(buf, asset, x0, y0, clip);
}

fn paint_tile(buf: &mut Buffer, asset: TileAsset, x0: i32, y0: i32, clip: Rect) {
    for dy in 0..i32::from(TILE_H) {
        for dx in 0..i32::from(TILE_W) {
            let (x, y) = (x0 + dx, y0 + dy);
            let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
                continue;
            };
            let pos = Position::new(x, y);
            if !clip.contains(pos) {
                continue;
            }
            // Leave a one-cell gap on the right so neighbours read as separate tiles.
            let is_gap = dx == i32::from(TILE_W) - 1;
            let is_center = dx == i32::from(TILE_W) / 2 - 1 && dy == i32::from(TILE_H) / 2;
            if let Some(cell) = buf.cell_mut(pos) {
                if is_gap {
                    continue;
                }
                cell.set_char(if is_center { asset.glyph } else { ' ' })
                    .set_fg(asset.fg)
                    .set_bg(asset.bg);
            }
        }
    }
}

fn draw_footer(frame: &mut Frame, puzzle: &PuzzleController, theme: &Theme, layout: &BoardLayout) {
    let y = layout.origin.y + BOARD_H + 1;
    let remaining = puzzle.numbers_to_place();
    let mut spans = vec![Span::styled(
        format!("Level {:<3}", puzzle.current_level()),
        Style::default().fg(theme.main_fg),
    )];
    // One pip per level-1 number; lit pips are the drops left this level.
    for i in 0..MAX_LEVELS {
        let color = if i < remaining {
            theme.title
        } else {
            theme.inactive_fg
        };
        spans.push(Span::styled("•", Style::default().fg(color)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect::new(layout.outer.x, y, TOTAL_W, 1).intersection(frame.area()),
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "1-7/click drop · ←→ move · enter drop · p pause · q quit",
            Style::default().fg(theme.inactive_fg),
        ))),
        Rect::new(layout.outer.x, y + 1, TOTAL_W, 1).intersection(frame.area()),
    );
}

fn draw_message(frame: &mut Frame, theme: &Theme, layout: &BoardLayout, title: &str, hint: &str) {
    let board = layout.board();
    let w = 30u16.min(board.width);
    let h = 5u16;
    let popup = Rect {
        x: board.x + board.width.saturating_sub(w) / 2,
        y: board.y + board.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    }
    .intersection(frame.area());
    frame.render_widget(Clear, popup);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(theme.main_fg),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line))
                .style(Style::default().bg(theme.bg)),
        ),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_layout_hit_testing() {
        let layout = BoardLayout::for_area(Rect::new(0, 0, 80, 40));
        let board = layout.board();
        assert_eq!(layout.column_at(board.x, board.y), Some(0));
        assert_eq!(layout.column_at(board.x + TILE_W * 3 + 1, board.y + 4), Some(3));
        assert_eq!(layout.column_at(board.x + BOARD_W - 1, board.y + BOARD_H - 1), Some(6));
        assert_eq!(layout.column_at(board.x + BOARD_W, board.y), None);
        assert_eq!(layout.column_at(board.x.saturating_sub(1), board.y), None);
        // Staging row sits above the board and is not a drop target.
        assert_eq!(layout.column_at(board.x, board.y - 1), None);
    }

    #[test]
    fn test_screen_rect_scales_units() {
        let layout = BoardLayout::for_area(Rect::new(0, 0, 80, 40));
        let (x, y) = layout.screen_rect(&TileRect::new(2.0, -1.0, 1.0, 1.0), (7.0, 7.0));
        assert_eq!(x, i32::from(layout.origin.x + 2 * TILE_W));
        assert_eq!(y, i32::from(layout.origin.y) - i32::from(TILE_H));
    }

    #[test]
    fn test_screen_rect_follows_grid_extent() {
        let layout = BoardLayout::for_area(Rect::new(0, 0, 80, 40));
        let grid = crate::grid::Grid::new(2.5);
        let extent = (grid.content_width(), grid.content_height());
        let (x, y) = layout.screen_rect(&grid.tile_rect(6, 6), extent);
        assert_eq!(x, i32::from(layout.origin.x + 6 * TILE_W));
        assert_eq!(y, i32::from(layout.origin.y + 6 * TILE_H));
    }

    #[test]
    fn test_board_lines_separate_slots() {
        let area = Rect::new(0, 0, 80, 40);
        let layout = BoardLayout::for_area(area);
        let board = layout.board();
        let mut buf = Buffer::empty(area);
        draw_board_lines(&mut buf, &Theme::default(), &layout, area);
        assert_eq!(buf[(board.x + TILE_W - 1, board.y + 1)].symbol(), "│");
        assert_eq!(buf[(board.x + 1, board.y + TILE_H)].symbol(), "─");
        assert_eq!(buf[(board.x + TILE_W - 1, board.y + TILE_H)].symbol(), "┼");
        // No line on the outer edges; the border block draws those.
        assert_eq!(buf[(board.x + BOARD_W - 1, board.y + 1)].symbol(), " ");
        assert_eq!(buf[(board.x + 1, board.y)].symbol(), " ");
    }

    #[test]
    fn test_draw_renders_score_and_level() {
        let puzzle = PuzzleController::new(PuzzleConfig::default());
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(60, 32)).unwrap();
        let mut effects = Effects::default();
        terminal
            .draw(|f| {
                draw(f, &puzzle, &theme, 3, Overlay::None, &mut effects, Instant::now());
            })
            .unwrap();
        let buf = terminal.backend().buffer();
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Level 1"));
        assert!(text.contains("drop7"));
        assert!(text.contains('▼'));
    }
}
