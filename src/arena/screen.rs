//! Two players at one keyboard, wired up exactly like a networked match: the
//! first seat owns the host's simulation, the second sees only the
//! snapshots the host relays to it
use super::messages::NetMessage;
use super::relay::LoopbackRelay;
use super::{Arena, Mode, Outcome, PlayerId, Role};
use crate::app::Screen;
use crate::command::{seat_steer, Command, Seat};
use crate::consts;
use crate::game::grid::{Bounds, Cell};
use crate::game::interp;
use crate::game::snake::Snake;
use crate::util::{center_rect, get_display_area, ErrorChain};
use crossterm::event::{poll, read, Event};
use log::warn;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Margin, Rect, Size},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
    Frame,
};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::time::Duration;

const HOST: PlayerId = 0;
const GUEST: PlayerId = 1;

#[derive(Debug)]
pub(crate) struct Versus {
    host: Arena,
    /// The guest's replica, rebuilt from every snapshot; this is what gets
    /// drawn
    guest: Arena,
    /// Each snake as it was before the latest snapshot, for smoothing
    prev: BTreeMap<PlayerId, Snake>,
    /// When the latest snapshot arrived
    snapshot_at: Duration,
    relay: LoopbackRelay,
    now: Duration,
}

impl Versus {
    pub(crate) fn new(mode: Mode) -> Versus {
        let mut relay = LoopbackRelay::new();
        relay.join(HOST);
        relay.join(GUEST);
        let host = Arena::new(mode, Role::Host, 2);
        let mut guest = Arena::new(mode, Role::Client, 2);
        guest.apply_snapshot(&host.snapshot());
        let prev = snakes(&guest);
        Versus {
            host,
            guest,
            prev,
            snapshot_at: Duration::ZERO,
            relay,
            now: Duration::ZERO,
        }
    }

    pub(crate) fn frame(&mut self, now: Duration) {
        self.now = now;
        while let Some(msg) = self.relay.recv(HOST) {
            match msg {
                NetMessage::Move { player, direction } => {
                    self.host.apply_remote_move(player, direction);
                }
                NetMessage::RematchRequest { player } | NetMessage::RematchAccept { player } => {
                    if self.host.accept_rematch(player, now) {
                        self.broadcast();
                    }
                }
                NetMessage::Snapshot(_) => warn!("Host received a snapshot; ignoring"),
            }
        }
        if self.host.frame(now) {
            self.broadcast();
        }
        while let Some(msg) = self.relay.recv(GUEST) {
            match msg {
                NetMessage::Snapshot(snapshot) => {
                    self.prev = snakes(&self.guest);
                    self.snapshot_at = now;
                    self.guest.apply_snapshot(&snapshot);
                }
                NetMessage::RematchRequest { player } | NetMessage::RematchAccept { player } => {
                    self.guest.note_rematch(player);
                }
                NetMessage::Move { player, direction } => {
                    self.guest.apply_remote_move(player, direction);
                }
            }
        }
    }

    fn broadcast(&mut self) {
        let msg = NetMessage::Snapshot(self.host.snapshot());
        self.send(HOST, &msg);
    }

    fn send(&mut self, from: PlayerId, msg: &NetMessage) {
        if let Err(e) = self.relay.send(from, msg) {
            warn!("{}", ErrorChain(&e));
        }
    }

    pub(crate) fn process_input(&mut self) -> io::Result<Option<Screen>> {
        if poll(consts::FRAME_PERIOD)? {
            Ok(self.handle_event(&read()?))
        } else {
            Ok(None)
        }
    }

    fn handle_event(&mut self, event: &Event) -> Option<Screen> {
        let ev = event.as_key_press_event()?;
        if let Some((seat, direction)) = seat_steer(ev) {
            match seat {
                Seat::First => {
                    if let Some(msg) = self.host.steer_local(HOST, direction) {
                        self.send(HOST, &msg);
                    }
                }
                Seat::Second => {
                    if let Some(msg) = self.guest.steer_local(GUEST, direction) {
                        self.send(GUEST, &msg);
                    }
                }
            }
            return None;
        }
        match Command::from_key_event(ev)? {
            Command::Quit | Command::Q | Command::Esc => return Some(Screen::Quit),
            Command::R => self.host_rematch(),
            Command::Enter => self.guest_rematch(),
            _ => (),
        }
        None
    }

    fn host_rematch(&mut self) {
        if self.host.outcome().is_none() || self.host.wants_rematch(HOST) {
            return;
        }
        let msg = self.host.rematch_message(HOST);
        self.send(HOST, &msg);
        if self.host.accept_rematch(HOST, self.now) {
            self.broadcast();
        }
    }

    fn guest_rematch(&mut self) {
        if self.guest.outcome().is_none() || self.guest.wants_rematch(GUEST) {
            return;
        }
        let msg = self.guest.rematch_message(GUEST);
        self.guest.note_rematch(GUEST);
        self.send(GUEST, &msg);
    }

    /// The cells to draw for `player`, partway between the last two
    /// snapshots
    fn smoothed(&self, player: PlayerId, snake: &Snake) -> Vec<Cell> {
        let Some(prev) = self.prev.get(&player) else {
            return snake.to_vec();
        };
        let alpha = interp::alpha(self.now, self.snapshot_at, self.guest.tick_length());
        interp::interpolate(prev, snake, alpha, 1.0)
            .into_iter()
            .map(|p| p.to_cell(1.0))
            .collect()
    }

    pub(crate) fn draw(&self, frame: &mut Frame<'_>) {
        frame.render_widget(self, frame.area());
    }

    fn status_line(&self) -> String {
        let mut parts = vec![format!(" {} round {}", self.guest.mode(), self.guest.round())];
        for (&id, p) in self.guest.players() {
            parts.push(format!(
                "P{}: {} pts, {} wins{}",
                id + 1,
                p.score,
                p.round_wins,
                if p.alive { "" } else { " (out)" }
            ));
        }
        if let Some(left) = self.guest.remaining() {
            parts.push(format!("{}s left", left.as_secs()));
        }
        parts.join("  ")
    }
}

impl Widget for &Versus {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let display = get_display_area(area);
        let [score_area, block_area, msg1_area, msg2_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(display);
        Line::styled(self.status_line(), consts::SCORE_BAR_STYLE).render(score_area, buf);

        let bounds = self.guest.bounds();
        let block_area = center_rect(block_area, HalfBlocks::size(bounds));
        Block::bordered().render(block_area, buf);
        let mut field = HalfBlocks::new(bounds);
        field.put(self.guest.food(), consts::FOOD_COLOR);
        for (&id, p) in self.guest.players() {
            let color = if p.alive {
                consts::PLAYER_COLORS[usize::from(id) % consts::PLAYER_COLORS.len()]
            } else {
                Color::DarkGray
            };
            for c in self.smoothed(id, &p.snake) {
                field.put(c, color);
            }
        }
        field.render(block_area.inner(Margin::new(1, 1)), buf);

        match self.guest.outcome() {
            None => {
                Line::from_iter([
                    Span::raw(" P1: "),
                    Span::styled("WASD", consts::KEY_STYLE),
                    Span::raw("  P2: "),
                    Span::styled("arrows", consts::KEY_STYLE),
                ])
                .render(msg1_area, buf);
            }
            Some(outcome) => {
                let verdict = match outcome {
                    Outcome::Winner(id) => format!(" Player {} wins!", id + 1),
                    Outcome::Draw => String::from(" Draw!"),
                };
                let mut spans = vec![Span::raw(verdict)];
                for (id, who) in [(HOST, "P1"), (GUEST, "P2")] {
                    if self.guest.wants_rematch(id) {
                        spans.push(Span::raw(format!("  {who} is ready")));
                    }
                }
                Line::from_iter(spans).render(msg1_area, buf);
                Line::from_iter([
                    Span::raw(" Rematch: P1 ("),
                    Span::styled("r", consts::KEY_STYLE),
                    Span::raw(") P2 ("),
                    Span::styled("Enter", consts::KEY_STYLE),
                    Span::raw(")"),
                ])
                .render(msg2_area, buf);
                return;
            }
        }
        Line::from_iter([
            Span::raw(" Quit ("),
            Span::styled("q", consts::KEY_STYLE),
            Span::raw(")"),
        ])
        .render(msg2_area, buf);
    }
}

fn snakes(arena: &Arena) -> BTreeMap<PlayerId, Snake> {
    arena
        .players()
        .iter()
        .map(|(&id, p)| (id, p.snake.clone()))
        .collect()
}

/// Draws a field at two cells per character, stacked vertically with
/// upper-half blocks, so that arena-sized fields fit the display
#[derive(Clone, Debug, Eq, PartialEq)]
struct HalfBlocks {
    bounds: Bounds,
    colors: HashMap<Cell, Color>,
}

impl HalfBlocks {
    fn new(bounds: Bounds) -> HalfBlocks {
        HalfBlocks {
            bounds,
            colors: HashMap::new(),
        }
    }

    /// Terminal size needed for a field of `bounds`, border included
    fn size(bounds: Bounds) -> Size {
        let width = u16::try_from(bounds.cols).unwrap_or(u16::MAX);
        let height = u16::try_from(bounds.rows / 2 + bounds.rows % 2).unwrap_or(u16::MAX);
        Size::new(width.saturating_add(2), height.saturating_add(2))
    }

    fn put(&mut self, cell: Cell, color: Color) {
        if self.bounds.contains(cell) {
            self.colors.insert(cell, color);
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        for (dy, y) in (0..area.height).zip((0..).step_by(2)) {
            for (dx, x) in (0..area.width).zip(0..) {
                let top = self.colors.get(&Cell::new(x, y)).copied();
                let bottom = self.colors.get(&Cell::new(x, y + 1)).copied();
                let Some(c) = buf.cell_mut((area.x + dx, area.y + dy)) else {
                    continue;
                };
                match (top, bottom) {
                    (None, None) => {
                        c.set_char(' ');
                        c.set_style(Style::reset());
                    }
                    (top, bottom) => {
                        c.set_char('▀');
                        c.set_style(
                            Style::reset()
                                .fg(top.unwrap_or(Color::Reset))
                                .bg(bottom.unwrap_or(Color::Reset)),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::direction::Direction;
    use crate::util::buffer_lines;
    use crossterm::event::{KeyCode, KeyEvent};
    use pretty_assertions::assert_eq;

    fn press(versus: &mut Versus, code: KeyCode) -> Option<Screen> {
        versus.handle_event(&Event::Key(KeyEvent::from(code)))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn guest_mirrors_host() {
        let mut versus = Versus::new(Mode::Duel);
        assert_eq!(versus.guest.snapshot(), versus.host.snapshot());
        versus.frame(ms(100));
        assert_eq!(versus.guest.snapshot(), versus.host.snapshot());
        assert_eq!(versus.relay.pending(HOST), 0);
        assert_eq!(versus.relay.pending(GUEST), 0);
    }

    #[test]
    fn moves_reach_the_host() {
        let mut versus = Versus::new(Mode::Duel);
        // Player 2 starts heading west; the guest predicts, the host decides
        press(&mut versus, KeyCode::Up);
        assert_eq!(versus.guest.players()[&GUEST].next_direction, Direction::North);
        assert_eq!(versus.host.players()[&GUEST].next_direction, Direction::West);
        press(&mut versus, KeyCode::Char('s'));
        assert_eq!(versus.host.players()[&HOST].next_direction, Direction::South);
        versus.frame(ms(100));
        assert_eq!(versus.host.players()[&GUEST].direction, Direction::North);
        assert_eq!(versus.guest.players()[&GUEST].direction, Direction::North);
        assert_eq!(versus.guest.players()[&HOST].direction, Direction::South);
    }

    #[test]
    fn host_moves_reach_the_guest() {
        let mut versus = Versus::new(Mode::Duel);
        press(&mut versus, KeyCode::Char('s'));
        assert_eq!(versus.guest.players()[&HOST].next_direction, Direction::East);
        // No tick is due yet, so only the move itself can have arrived
        versus.frame(ms(16));
        assert_eq!(versus.relay.pending(GUEST), 0);
        assert_eq!(versus.guest.players()[&HOST].next_direction, Direction::South);
        assert_eq!(versus.guest.players()[&HOST].direction, Direction::East);
    }

    #[test]
    fn guest_view_is_smoothed_between_snapshots() {
        let mut versus = Versus::new(Mode::Duel);
        versus.frame(ms(100));
        let snake = versus.guest.players()[&HOST].snake.clone();
        assert_eq!(snake.head(), Cell::new(4, 3));
        assert_eq!(versus.smoothed(HOST, &snake)[0], Cell::new(3, 3));
        versus.frame(ms(130));
        assert_eq!(versus.smoothed(HOST, &snake)[0], Cell::new(3, 3));
        versus.frame(ms(160));
        assert_eq!(versus.smoothed(HOST, &snake)[0], Cell::new(4, 3));
        assert_eq!(versus.guest.players()[&HOST].snake, snake);
    }

    #[test]
    fn rematch_needs_both_seats() {
        let mut versus = Versus::new(Mode::Duel);
        // Player 1 drives north into the wall
        press(&mut versus, KeyCode::Char('w'));
        let mut t = 0;
        while versus.guest.outcome().is_none() {
            t += 100;
            versus.frame(ms(t));
            assert!(t < 10_000, "round should have ended");
        }
        assert_eq!(versus.guest.outcome(), Some(Outcome::Winner(GUEST)));
        assert_eq!(versus.guest.round(), 1);
        press(&mut versus, KeyCode::Char('r'));
        versus.frame(ms(t + 16));
        assert!(versus.guest.wants_rematch(HOST), "guest should see the request");
        assert_eq!(versus.guest.round(), 1);
        press(&mut versus, KeyCode::Enter);
        versus.frame(ms(t + 32));
        assert_eq!(versus.guest.round(), 2);
        assert_eq!(versus.guest.outcome(), None);
        assert_eq!(versus.guest.players()[&GUEST].round_wins, 1);
    }

    #[test]
    fn render_duel() {
        let versus = Versus::new(Mode::Duel);
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        versus.render(area, &mut buffer);
        let lines = buffer_lines(&buffer);
        assert_eq!(
            lines[0].trim_end(),
            " duel round 1  P1: 0 pts, 0 wins  P2: 0 pts, 0 wins"
        );
        assert_eq!(lines[22].trim_end(), " P1: WASD  P2: arrows");
        // 25x25 cells fit in a 27x15 frame; player 1 starts at (3, 3), the
        // bottom half of the second character row
        let field = center_rect(Rect::new(0, 1, 80, 21), Size::new(27, 15));
        assert_eq!(field.y, 4);
        let c = &buffer[(field.x + 4, field.y + 2)];
        assert_eq!(c.symbol(), "▀");
        assert_eq!(c.bg, consts::PLAYER_COLORS[0]);
    }

    #[test]
    fn quit() {
        let mut versus = Versus::new(Mode::Points);
        assert!(press(&mut versus, KeyCode::Char('x')).is_none());
        assert!(matches!(
            press(&mut versus, KeyCode::Char('q')),
            Some(Screen::Quit)
        ));
    }
}
