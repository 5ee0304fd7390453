use crate::game::direction::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
    Esc,
    Home,
    End,
    Next,
    Prev,
    M,
    N,
    O,
    P,
    Q,
    R,
    Y,
}

impl Command {
    pub(crate) fn from_key_event(ev: KeyEvent) -> Option<Command> {
        match (ev.modifiers, ev.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Command::Quit),
            (KeyModifiers::NONE, KeyCode::Char('w' | 'k') | KeyCode::Up) => Some(Command::Up),
            (KeyModifiers::NONE, KeyCode::Char('s' | 'j') | KeyCode::Down) => Some(Command::Down),
            (KeyModifiers::NONE, KeyCode::Char('a' | 'h') | KeyCode::Left) => Some(Command::Left),
            (KeyModifiers::NONE, KeyCode::Char('d' | 'l') | KeyCode::Right) => Some(Command::Right),
            (_, KeyCode::Enter) => Some(Command::Enter),
            (KeyModifiers::NONE, KeyCode::Char(' ')) => Some(Command::Space),
            (_, KeyCode::Esc) => Some(Command::Esc),
            (_, KeyCode::Home) => Some(Command::Home),
            (_, KeyCode::End) => Some(Command::End),
            (_, KeyCode::Tab) => Some(Command::Next),
            (_, KeyCode::BackTab) => Some(Command::Prev),
            (KeyModifiers::NONE, KeyCode::Char('m')) => Some(Command::M),
            (KeyModifiers::NONE, KeyCode::Char('n')) => Some(Command::N),
            (KeyModifiers::NONE, KeyCode::Char('o')) => Some(Command::O),
            (KeyModifiers::NONE, KeyCode::Char('p')) => Some(Command::P),
            (KeyModifiers::NONE, KeyCode::Char('q')) => Some(Command::Q),
            (KeyModifiers::NONE, KeyCode::Char('r')) => Some(Command::R),
            (KeyModifiers::NONE, KeyCode::Char('y')) => Some(Command::Y),
            _ => None,
        }
    }

    /// The direction this command steers in, if any
    pub(crate) fn direction(self) -> Option<Direction> {
        match self {
            Command::Up => Some(Direction::North),
            Command::Down => Some(Direction::South),
            Command::Left => Some(Direction::West),
            Command::Right => Some(Direction::East),
            _ => None,
        }
    }
}

/// Which seat a hot-seat steering key belongs to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Seat {
    /// WASD
    First,
    /// Arrow keys
    Second,
}

/// Map a key to a hot-seat steering input.  Unlike
/// [`Command::from_key_event()`], WASD and the arrow keys are told apart.
pub(crate) fn seat_steer(ev: KeyEvent) -> Option<(Seat, Direction)> {
    if ev.modifiers != KeyModifiers::NONE {
        return None;
    }
    match ev.code {
        KeyCode::Char('w') => Some((Seat::First, Direction::North)),
        KeyCode::Char('a') => Some((Seat::First, Direction::West)),
        KeyCode::Char('s') => Some((Seat::First, Direction::South)),
        KeyCode::Char('d') => Some((Seat::First, Direction::East)),
        KeyCode::Up => Some((Seat::Second, Direction::North)),
        KeyCode::Left => Some((Seat::Second, Direction::West)),
        KeyCode::Down => Some((Seat::Second, Direction::South)),
        KeyCode::Right => Some((Seat::Second, Direction::East)),
        _ => None,
    }
}
