//! Modal pop-ups drawn over the field: the pause menu and the restart
//! confirmation
use crate::command::Command;
use crate::consts;
use crate::util::EnumExt;
use crossterm::event::Event;
use enum_map::Enum;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        block::{Block, Padding},
        Widget,
    },
};

/// Draw a bordered, centered-title frame over `area`, clearing whatever was
/// underneath, and return the space inside it
fn frame(title: &str, area: Rect, buf: &mut Buffer) -> Rect {
    let block = Block::bordered()
        .title(format!(" {title} "))
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(1))
        .style(Style::reset());
    let inner = block.inner(area);
    block.render(area, buf);
    inner
}

/// `label (key)`, with the key highlighted
fn hint(label: &'static str, key: &'static str) -> [Span<'static>; 4] {
    [
        Span::raw(label),
        Span::raw(" ("),
        Span::styled(key, consts::KEY_STYLE),
        Span::raw(")"),
    ]
}

/// Where a menu navigation command moves the cursor from `current`, or
/// `None` if `cmd` is not a navigation command.  Up/Down stop at the ends;
/// Tab/Shift-Tab wrap around.
fn navigate<T: EnumExt + Copy>(current: T, cmd: Command) -> Option<T> {
    let moved = match cmd {
        Command::Up => current.prev().unwrap_or(current),
        Command::Down => current.next().unwrap_or(current),
        Command::Next => current.next().unwrap_or_else(T::min),
        Command::Prev => current.prev().unwrap_or_else(T::max),
        Command::Home => T::min(),
        Command::End => T::max(),
        _ => return None,
    };
    Some(moved)
}

/// The menu shown while a session is paused
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct PauseMenu {
    cursor: PauseOpt,
}

impl PauseMenu {
    /// Size of the `Rect` to render into
    pub(super) const HEIGHT: u16 = 5;
    pub(super) const WIDTH: u16 = 20;

    pub(super) fn new() -> PauseMenu {
        PauseMenu {
            cursor: PauseOpt::min(),
        }
    }

    /// Handle an input event.  Returns `Some` if the user made a choice.
    pub(super) fn handle_event(&mut self, event: &Event) -> Option<PauseOpt> {
        let cmd = Command::from_key_event(event.as_key_press_event()?)?;
        if cmd == Command::Enter {
            return Some(self.cursor);
        }
        if let Some(opt) = PauseOpt::from_shortcut(cmd) {
            return Some(opt);
        }
        if let Some(cursor) = navigate(self.cursor, cmd) {
            self.cursor = cursor;
        }
        None
    }
}

#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
pub(super) enum PauseOpt {
    Resume,
    /// Start over, after confirmation
    Restart,
    Quit,
}

impl PauseOpt {
    fn from_shortcut(cmd: Command) -> Option<PauseOpt> {
        match cmd {
            Command::Esc | Command::Space | Command::P => Some(PauseOpt::Resume),
            Command::R => Some(PauseOpt::Restart),
            Command::Q | Command::Quit => Some(PauseOpt::Quit),
            _ => None,
        }
    }

    fn hint(self) -> [Span<'static>; 4] {
        match self {
            PauseOpt::Resume => hint("Resume", "p"),
            PauseOpt::Restart => hint("Restart", "r"),
            PauseOpt::Quit => hint("Quit", "q"),
        }
    }
}

impl Widget for PauseMenu {
    /*
     * ┌───── PAUSED ─────┐
     * │ » Resume (p)     │
     * │   Restart (r)    │
     * │   Quit (q)       │
     * └──────────────────┘
     */

    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = frame("PAUSED", area, buf);
        for (opt, row) in PauseOpt::iter().zip(inner.rows()) {
            let on = opt == self.cursor;
            let marker = Span::raw(if on { "» " } else { "  " });
            let line = Line::from_iter(std::iter::once(marker).chain(opt.hint()));
            if on {
                line.style(consts::MENU_SELECTION_STYLE).render(row, buf);
            } else {
                line.render(row, buf);
            }
        }
    }
}

/// The "are you sure?" pop-up shown before restarting a session in progress
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct ConfirmRestart;

impl ConfirmRestart {
    pub(super) const HEIGHT: u16 = 4;
    pub(super) const WIDTH: u16 = 20;

    /// Returns `Some(true)` to restart, `Some(false)` to go back
    pub(super) fn handle_event(event: &Event) -> Option<bool> {
        match Command::from_key_event(event.as_key_press_event()?)? {
            Command::Y | Command::Enter => Some(true),
            Command::N | Command::Esc => Some(false),
            _ => None,
        }
    }
}

impl Widget for ConfirmRestart {
    /*
     * ┌──── RESTART? ────┐
     * │ Progress is lost │
     * │  Yes (y) No (n)  │
     * └──────────────────┘
     */

    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = frame("RESTART?", area, buf);
        let answers = hint("Yes", "y")
            .into_iter()
            .chain([Span::raw(" ")])
            .chain(hint("No", "n"));
        let lines = [Line::from("Progress is lost"), Line::from_iter(answers)];
        for (line, row) in lines.into_iter().zip(inner.rows()) {
            line.alignment(Alignment::Center).render(row, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::buffer_lines;
    use crossterm::event::{KeyCode, KeyEvent};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::from(code))
    }

    #[test]
    fn navigate_and_choose() {
        let mut menu = PauseMenu::new();
        assert_eq!(menu.handle_event(&key(KeyCode::Down)), None);
        assert_eq!(menu.handle_event(&key(KeyCode::Enter)), Some(PauseOpt::Restart));
        assert_eq!(menu.handle_event(&key(KeyCode::End)), None);
        assert_eq!(menu.handle_event(&key(KeyCode::Tab)), None);
        assert_eq!(menu.handle_event(&key(KeyCode::Enter)), Some(PauseOpt::Resume));
        assert_eq!(menu.handle_event(&key(KeyCode::Char('q'))), Some(PauseOpt::Quit));
    }

    #[rstest]
    #[case(PauseOpt::Resume, Command::Up, Some(PauseOpt::Resume))]
    #[case(PauseOpt::Quit, Command::Down, Some(PauseOpt::Quit))]
    #[case(PauseOpt::Resume, Command::Prev, Some(PauseOpt::Quit))]
    #[case(PauseOpt::Quit, Command::Next, Some(PauseOpt::Resume))]
    #[case(PauseOpt::Quit, Command::Home, Some(PauseOpt::Resume))]
    #[case(PauseOpt::Restart, Command::Enter, None)]
    fn test_navigate(#[case] from: PauseOpt, #[case] cmd: Command, #[case] to: Option<PauseOpt>) {
        assert_eq!(navigate(from, cmd), to);
    }

    #[test]
    fn confirm_keys() {
        assert_eq!(ConfirmRestart::handle_event(&key(KeyCode::Char('y'))), Some(true));
        assert_eq!(ConfirmRestart::handle_event(&key(KeyCode::Esc)), Some(false));
        assert_eq!(ConfirmRestart::handle_event(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn render_pause_menu() {
        let area = Rect::new(0, 0, PauseMenu::WIDTH, PauseMenu::HEIGHT);
        let mut buffer = Buffer::empty(area);
        PauseMenu::new().render(area, &mut buffer);
        assert_eq!(
            buffer_lines(&buffer),
            [
                "┌───── PAUSED ─────┐",
                "│ » Resume (p)     │",
                "│   Restart (r)    │",
                "│   Quit (q)       │",
                "└──────────────────┘",
            ]
        );
        assert_eq!(buffer[(13, 2)].style().fg, consts::KEY_STYLE.fg);
    }

    #[test]
    fn render_confirm() {
        let area = Rect::new(0, 0, ConfirmRestart::WIDTH, ConfirmRestart::HEIGHT);
        let mut buffer = Buffer::empty(area);
        ConfirmRestart.render(area, &mut buffer);
        assert_eq!(
            buffer_lines(&buffer),
            [
                "┌──── RESTART? ────┐",
                "│ Progress is lost │",
                "│  Yes (y) No (n)  │",
                "└──────────────────┘",
            ]
        );
    }
}
