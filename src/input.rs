//! Key and mouse bindings, and the input thread that hands actions to the game loop.

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the input thread blocks before re-checking the running flag.
const POLL_INTERVAL_MS: u64 = 50;

/// Action from a key press or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop straight into a column (0-based).
    DropColumn(u8),
    CursorLeft,
    CursorRight,
    DropAtCursor,
    /// Left click at terminal cell (x, y).
    Click { x: u16, y: u16 },
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Digits 1..7 pick a column directly; arrows / vim keys move the cursor.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char(c @ '1'..='7') => Action::DropColumn(c as u8 - b'1'),
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Enter | KeyCode::Char(' ') => {
            Action::DropAtCursor
        }
        _ => Action::None,
    }
}

pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::Click {
            x: mouse.column,
            y: mouse.row,
        },
        _ => Action::None,
    }
}

fn event_to_action(ev: Event) -> Action {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => key_to_action(key),
        Event::Mouse(mouse) => mouse_to_action(mouse),
        _ => Action::None,
    }
}

/// Reads terminal events on its own thread. The game loop only ever sees them
/// through the channel, so board state is touched from one thread.
pub struct InputThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl InputThread {
    pub fn spawn() -> (Self, Receiver<Action>) {
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel();
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("input".into())
            .spawn(move || read_loop(&flag, &tx))
            .ok();
        if handle.is_none() {
            log::warn!("could not spawn input thread");
        }
        (Self { running, handle }, rx)
    }

    /// Clear the running flag and wait for the thread to exit.
    pub fn stop(&mut self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow::anyhow!("input thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn read_loop(running: &AtomicBool, tx: &Sender<Action>) -> anyhow::Result<()> {
    log::info!("input thread started");
    while running.load(Ordering::SeqCst) {
        if !event::poll(Duration::from_millis(POLL_INTERVAL_MS))? {
            continue;
        }
        let action = event_to_action(event::read()?);
        if action == Action::None {
            continue;
        }
        if tx.send(action).is_err() {
            break;
        }
    }
    log::info!("input thread stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_digits_pick_columns() {
        assert_eq!(key_to_action(key(KeyCode::Char('1'), KeyModifiers::NONE)), Action::DropColumn(0));
        assert_eq!(key_to_action(key(KeyCode::Char('7'), KeyModifiers::NONE)), Action::DropColumn(6));
        assert_eq!(key_to_action(key(KeyCode::Char('8'), KeyModifiers::NONE)), Action::None);
    }

    #[test]
    fn test_cursor_and_quit_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char('h'), KeyModifiers::NONE)), Action::CursorLeft);
        assert_eq!(key_to_action(key(KeyCode::Right, KeyModifiers::NONE)), Action::CursorRight);
        assert_eq!(key_to_action(key(KeyCode::Enter, KeyModifiers::NONE)), Action::DropAtCursor);
        assert_eq!(key_to_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('q'), KeyModifiers::ALT)), Action::None);
    }

    #[test]
    fn test_left_click() {
        let ev = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 12,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(mouse_to_action(ev), Action::Click { x: 12, y: 4 });
        let moved = MouseEvent {
            kind: MouseEventKind::Moved,
            ..ev
        };
        assert_eq!(mouse_to_action(moved), Action::None);
    }
}
