//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Cursor direction on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Dir),
    /// Press at the cursor, or let go if already pressed.
    Grab,
    Cancel,
    Hammer,
    Hint,
    Skip,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Arrows and vim-style hjkl both move.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Left | KeyCode::Char('h') => Action::Move(Dir::Left),
        KeyCode::Right | KeyCode::Char('l') => Action::Move(Dir::Right),
        KeyCode::Up | KeyCode::Char('k') => Action::Move(Dir::Up),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(Dir::Down),
        KeyCode::Enter | KeyCode::Char(' ') => Action::Grab,
        KeyCode::Char('x') => Action::Hammer,
        KeyCode::Char('n') => Action::Hint,
        KeyCode::Char('s') => Action::Skip,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

/// Left-button pointer gesture at a terminal position (column, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Down(u16, u16),
    Enter(u16, u16),
    Up(u16, u16),
}

pub fn mouse_to_pointer(ev: MouseEvent) -> Option<Pointer> {
    let (col, row) = (ev.column, ev.row);
    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Pointer::Down(col, row)),
        MouseEventKind::Drag(MouseButton::Left) => Some(Pointer::Enter(col, row)),
        MouseEventKind::Up(MouseButton::Left) => Some(Pointer::Up(col, row)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_keys_move() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::Move(Dir::Left));
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::Move(Dir::Down));
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Move(Dir::Up));
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::Move(Dir::Right));
    }

    #[test]
    fn power_ups_and_control() {
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Grab);
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Grab);
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), Action::Hammer);
        assert_eq!(key_to_action(key(KeyCode::Char('n'))), Action::Hint);
        assert_eq!(key_to_action(key(KeyCode::Char('s'))), Action::Skip);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Cancel);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn only_left_button_is_a_pointer() {
        let ev = |kind| MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            mouse_to_pointer(ev(MouseEventKind::Down(MouseButton::Left))),
            Some(Pointer::Down(3, 4))
        );
        assert_eq!(
            mouse_to_pointer(ev(MouseEventKind::Drag(MouseButton::Left))),
            Some(Pointer::Enter(3, 4))
        );
        assert_eq!(
            mouse_to_pointer(ev(MouseEventKind::Up(MouseButton::Left))),
            Some(Pointer::Up(3, 4))
        );
        assert_eq!(mouse_to_pointer(ev(MouseEventKind::Down(MouseButton::Right))), None);
        assert_eq!(mouse_to_pointer(ev(MouseEventKind::Moved)), None);
    }
}
