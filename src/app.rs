//! App: terminal init, the paced update/draw loop, and action handling.

use crate::animation::{AnimationKind, AnimationNotice};
use crate::grid::COLUMNS;
use crate::input::{Action, InputThread};
use crate::puzzle::PuzzleController;
use crate::theme::Theme;
use crate::ui::{self, BoardLayout, Effects, Overlay};
use crate::GameConfig;
use anyhow::Result;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

/// Longest step fed to the simulation, so a stall doesn't teleport tiles.
const MAX_STEP_SECS: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    Complete,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    puzzle: PuzzleController,
    screen: Screen,
    cursor: i32,
    /// Layout of the last drawn frame; clicks are resolved against it.
    layout: BoardLayout,
    effects: Effects,
    /// Cell the in-flight drop lands in.
    landing: Option<(i32, i32)>,
    last_step: Instant,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let puzzle = PuzzleController::new(config.puzzle.clone());
        Self {
            config,
            theme,
            puzzle,
            screen: Screen::Playing,
            cursor: COLUMNS as i32 / 2,
            layout: BoardLayout::for_area(Rect::new(0, 0, 80, 32)),
            effects: Effects::default(),
            landing: None,
            last_step: Instant::now(),
        }
    }

    pub fn puzzle(&self) -> &PuzzleController {
        &self.puzzle
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn cursor(&self) -> i32 {
        self.cursor
    }

    /// New board from the next seed, back to the starting level.
    fn reset_game(&mut self) {
        self.config.puzzle.seed = self.config.puzzle.seed.wrapping_add(1);
        self.puzzle = PuzzleController::new(self.config.puzzle.clone());
        self.screen = Screen::Playing;
        self.landing = None;
        self.effects.clear();
        if !self.config.no_animation {
            self.effects.level_changed(&self.layout, &self.theme);
        }
    }

    fn drop_into(&mut self, column: i32) {
        let row = self.puzzle.grid().find_last_empty_row(column);
        if self.puzzle.on_column_tapped(column) {
            self.cursor = column;
            self.landing = Some((column, row));
        }
    }

    /// Returns false when the app should exit.
    pub fn apply_action(&mut self, action: Action) -> bool {
        match (self.screen, action) {
            (_, Action::Quit) => return false,
            (_, Action::Restart) => self.reset_game(),
            (Screen::Playing, Action::Pause) => self.screen = Screen::Paused,
            (Screen::Paused, Action::Pause) => self.screen = Screen::Playing,
            (Screen::Playing, Action::CursorLeft) => self.cursor = (self.cursor - 1).max(0),
            (Screen::Playing, Action::CursorRight) => {
                self.cursor = (self.cursor + 1).min(COLUMNS as i32 - 1);
            }
            (Screen::Playing, Action::DropAtCursor) => self.drop_into(self.cursor),
            (Screen::Playing, Action::DropColumn(c)) => self.drop_into(i32::from(c)),
            (Screen::Playing, Action::Click { x, y }) => {
                if let Some(column) = self.layout.column_at(x, y) {
                    self.drop_into(column);
                }
            }
            _ => {}
        }
        true
    }

    /// Advance the simulation by `dt` and react to what it reported.
    pub fn step(&mut self, dt: f32) {
        if self.screen == Screen::Paused {
            return;
        }
        let level_before = self.puzzle.current_level();
        self.puzzle.tick(dt);
        let landed = self.puzzle.last_notices().iter().any(|n| {
            matches!(n, AnimationNotice::Finished { .. }) && n.kind() == AnimationKind::TileDrop
        });
        if landed {
            let landing = self.landing.take();
            if self.config.no_animation {
                return self.check_complete();
            }
            if self.puzzle.current_level() != level_before {
                self.effects.level_changed(&self.layout, &self.theme);
            } else if let Some((column, row)) = landing {
                self.effects.landed(&self.layout, column, row, &self.theme);
            }
        }
        self.check_complete();
    }

    fn check_complete(&mut self) {
        if self.puzzle.is_complete() && !self.puzzle.is_dropping() {
            self.screen = Screen::Complete;
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let (mut input, actions) = InputThread::spawn();
        let result = self.run_loop(&mut terminal, &actions);
        let stopped = input.stop();

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        result.and(stopped)
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal, actions: &Receiver<Action>) -> Result<()> {
        let frame_interval = self.config.frame_interval();
        self.last_step = Instant::now();
        loop {
            let elapsed = self.last_step.elapsed();
            if elapsed < frame_interval {
                std::thread::sleep(frame_interval - elapsed);
                continue;
            }
            let now = Instant::now();
            let dt = now.duration_since(self.last_step).as_secs_f32().min(MAX_STEP_SECS);
            self.last_step = now;

            // Input only reaches the puzzle here, on the loop thread.
            loop {
                match actions.try_recv() {
                    Ok(action) => {
                        if !self.apply_action(action) {
                            return Ok(());
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::warn!("input channel closed, leaving");
                        return Ok(());
                    }
                }
            }

            self.step(dt);

            let overlay = match self.screen {
                Screen::Playing => Overlay::None,
                Screen::Paused => Overlay::Paused,
                Screen::Complete => Overlay::Complete,
            };
            terminal.draw(|f| {
                self.layout = BoardLayout::for_area(f.area());
                ui::draw(
                    f,
                    &self.puzzle,
                    &self.theme,
                    self.cursor,
                    overlay,
                    &mut self.effects,
                    now,
                );
            })?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleConfig;

    fn app(no_animation: bool) -> App {
        let drop_rate = if no_animation { f32::INFINITY } else { 10.0 };
        App::new(
            GameConfig {
                puzzle: PuzzleConfig {
                    seed: 11,
                    drop_rate,
                    ..PuzzleConfig::default()
                },
                frame_rate: 60.0,
                no_animation,
            },
            Theme::default(),
        )
    }

    fn open_column(app: &App) -> i32 {
        (0..COLUMNS as i32)
            .find(|&c| !app.puzzle().grid().is_column_full(c))
            .expect("open column")
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let mut a = app(false);
        for _ in 0..10 {
            a.apply_action(Action::CursorLeft);
        }
        assert_eq!(a.cursor(), 0);
        for _ in 0..10 {
            a.apply_action(Action::CursorRight);
        }
        assert_eq!(a.cursor(), 6);
    }

    #[test]
    fn test_quit_returns_false() {
        let mut a = app(false);
        assert!(!a.apply_action(Action::Quit));
        assert!(a.apply_action(Action::None));
    }

    #[test]
    fn test_pause_blocks_drops_and_ticks() {
        let mut a = app(false);
        a.apply_action(Action::Pause);
        assert_eq!(a.screen(), Screen::Paused);
        let c = open_column(&a);
        a.apply_action(Action::DropColumn(c as u8));
        assert!(!a.puzzle().is_dropping());
        a.apply_action(Action::Pause);
        a.apply_action(Action::DropColumn(c as u8));
        assert!(a.puzzle().is_dropping());
        a.apply_action(Action::Pause);
        for _ in 0..100 {
            a.step(0.1);
        }
        assert!(a.puzzle().is_dropping());
    }

    #[test]
    fn test_click_on_board_drops() {
        let mut a = app(true);
        let c = open_column(&a);
        let board = a.layout.board();
        let x = board.x + c as u16 * ui::TILE_W + 1;
        assert!(a.apply_action(Action::Click { x, y: board.y + 2 }));
        assert!(a.puzzle().is_dropping());
        a.step(0.016);
        assert!(!a.puzzle().is_dropping());
        assert_eq!(a.puzzle().numbers_to_place(), 29);
    }

    #[test]
    fn test_restart_resets_progress() {
        let mut a = app(true);
        let c = open_column(&a);
        a.apply_action(Action::DropColumn(c as u8));
        a.step(0.016);
        assert!(a.puzzle().score() > 0);
        a.apply_action(Action::Restart);
        assert_eq!(a.puzzle().score(), 0);
        assert_eq!(a.puzzle().numbers_to_place(), 30);
    }
}
