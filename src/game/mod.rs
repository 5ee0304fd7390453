//! The single-player game: the simulation core and the screen that drives it
pub(crate) mod direction;
mod effects;
mod engine;
pub(crate) mod expression;
pub(crate) mod grid;
pub(crate) mod hooks;
pub(crate) mod interp;
mod obstacles;
mod popup;
pub(crate) mod powerup;
mod session;
pub(crate) mod snake;
mod timers;
use self::direction::Direction;
use self::effects::{EffectQueue, Particles};
use self::expression::Expression;
use self::grid::{Bounds, Cell};
use self::hooks::{Hooks, SharedSettings};
use self::interp::Point;
use self::popup::{ConfirmRestart, PauseMenu, PauseOpt};
use self::session::{Phase, RenderSample, Session};
use crate::app::Screen;
use crate::command::Command;
use crate::config::Config;
use crate::consts;
use crate::util::{center_rect, get_display_area};
use crossterm::event::{poll, read, Event};
use rand::{rngs::ThreadRng, Rng};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Margin, Rect, Size},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
    Frame,
};
use std::io;
use std::time::Duration;

#[derive(Debug)]
pub(crate) struct Game<R = ThreadRng> {
    session: Session<R>,
    effects: EffectQueue,
    particles: Particles,
    /// What was last drawn; left alone while the board is frozen
    sample: RenderSample,
    pause_menu: PauseMenu,
    now: Duration,
}

impl Game<ThreadRng> {
    pub(crate) fn new(config: &Config) -> Self {
        let hooks = Hooks::new(SharedSettings::new(config.game.settings()))
            .with_scores(config.score_history())
            .with_best(config.best_score_store());
        Game::new_with_rng(
            hooks,
            config.game.bounds(),
            config.game.repeat_weight_factor,
            rand::rng(),
        )
    }
}

impl<R: Rng> Game<R> {
    pub(crate) fn new_with_rng(hooks: Hooks, bounds: Bounds, repeat_factor: f64, rng: R) -> Game<R> {
        let effects = EffectQueue::new();
        let hooks = hooks.with_effects(effects.clone());
        let mut session = Session::new_with_rng(hooks, bounds, rng).with_repeat_factor(repeat_factor);
        let sample = session.sample(Duration::ZERO);
        Game {
            session,
            effects,
            particles: Particles::new(),
            sample,
            pause_menu: PauseMenu::new(),
            now: Duration::ZERO,
        }
    }

    /// Advance everything to `now`
    pub(crate) fn frame(&mut self, now: Duration) -> io::Result<()> {
        self.now = now;
        self.session.frame(now);
        let (sounds, bursts) = self.effects.drain();
        for sound in sounds {
            effects::ring_for(sound)?;
        }
        for (cell, color) in bursts {
            self.particles.add(cell, color, now);
        }
        self.particles.prune(now);
        if self.session.should_render() {
            self.sample = self.session.sample(now);
        }
        Ok(())
    }

    /// Wait up to one frame period for input and act on it
    pub(crate) fn process_input(&mut self) -> io::Result<Option<Screen>> {
        if poll(consts::FRAME_PERIOD)? {
            Ok(self.handle_event(&read()?))
        } else {
            Ok(None)
        }
    }

    fn handle_event(&mut self, event: &Event) -> Option<Screen> {
        let now = self.now;
        match self.session.phase() {
            Phase::Paused => match self.pause_menu.handle_event(event)? {
                PauseOpt::Resume => self.session.toggle_pause(),
                PauseOpt::Restart => {
                    self.session.request_restart(now);
                }
                PauseOpt::Quit => return Some(Screen::Quit),
            },
            Phase::ConfirmRestart { .. } => {
                if ConfirmRestart::handle_event(event)? {
                    self.session.confirm_restart(now);
                    self.particles.clear();
                } else {
                    self.session.cancel_restart();
                }
            }
            phase => {
                if *event == Event::FocusLost {
                    if phase == Phase::Running {
                        self.pause();
                    }
                    return None;
                }
                match Command::from_key_event(event.as_key_press_event()?)? {
                    Command::Quit | Command::Q => return Some(Screen::Quit),
                    Command::M => {
                        self.settings().toggle_sound();
                    }
                    Command::O => {
                        self.settings().toggle_obstacles();
                    }
                    Command::Space | Command::P | Command::Esc if phase == Phase::Running => {
                        self.pause();
                    }
                    Command::R => {
                        self.session.request_restart(now);
                        self.particles.clear();
                    }
                    Command::Enter if matches!(phase, Phase::Idle | Phase::GameOver) => {
                        self.session.start(now);
                        self.particles.clear();
                    }
                    cmd => {
                        if let Some(d) = cmd.direction() {
                            self.session.steer(d);
                        }
                    }
                }
            }
        }
        None
    }

    fn pause(&mut self) {
        self.pause_menu = PauseMenu::new();
        self.session.toggle_pause();
    }
}

impl<R> Game<R> {
    pub(crate) fn draw(&self, frame: &mut Frame<'_>) {
        frame.render_widget(self, frame.area());
    }

    fn settings(&self) -> &SharedSettings {
        self.session.settings()
    }

    fn status_line(&self) -> String {
        let mut parts = vec![
            format!(" Score: {}", self.session.score()),
            format!("Best: {}", self.session.best()),
        ];
        if self.session.multiplier() > 1 {
            parts.push(format!("x{}", self.session.multiplier()));
        }
        if let Some(kind) = self.session.active_power_up() {
            parts.push(format!("[{kind}]"));
        }
        parts.push(String::from(face(self.sample.expression)));
        parts.join("  ")
    }

    fn snake_style(&self) -> Style {
        if self.sample.immune {
            consts::IMMUNE_STYLE
        } else if self.sample.glow >= 0.5 {
            consts::SNAKE_GLOW_STYLE
        } else {
            consts::SNAKE_STYLE
        }
    }

    fn head_symbol(&self) -> char {
        if self.sample.expression == Expression::Blink {
            return consts::SNAKE_HEAD_BLINK_SYMBOL;
        }
        match self.session.board().direction {
            Direction::North => consts::SNAKE_HEAD_NORTH_SYMBOL,
            Direction::South => consts::SNAKE_HEAD_SOUTH_SYMBOL,
            Direction::East => consts::SNAKE_HEAD_EAST_SYMBOL,
            Direction::West => consts::SNAKE_HEAD_WEST_SYMBOL,
        }
    }
}

/// A little text face for each expression, for the status bar
fn face(expression: Expression) -> &'static str {
    match expression {
        Expression::Normal => "(o_o)",
        Expression::Blink => "(-_-)",
        Expression::Aggressive => "(>_<)",
        Expression::Relaxed => "(^_^)",
        Expression::Surprised => "(O_O)",
        Expression::Focused => "(=_=)",
    }
}

fn on_off(b: bool) -> &'static str {
    if b {
        "on"
    } else {
        "off"
    }
}

impl<R> Widget for &Game<R> {
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

        let board = self.session.board();
        let block_area = center_rect(block_area, board_size(board.bounds));
        Block::bordered().render(block_area, buf);
        let level_area = block_area.inner(Margin::new(1, 1));
        let mut level = Canvas {
            area: level_area,
            buf,
        };

        if self.sample.glitch.is_empty() {
            for c in board.obstacles.iter() {
                level.draw_cell(c, consts::OBSTACLE_SYMBOL, consts::OBSTACLE_STYLE);
            }
        } else {
            for sprite in &self.sample.glitch {
                let c = Point::new(sprite.x, sprite.y).to_cell(1.0);
                let symbol = if sprite.opacity >= 0.5 {
                    consts::OBSTACLE_SYMBOL
                } else {
                    consts::GLITCH_SYMBOL
                };
                level.draw_cell(c, symbol, consts::OBSTACLE_STYLE);
            }
        }
        level.draw_cell(board.food, consts::FOOD_SYMBOL, consts::FOOD_STYLE);
        for p in &board.power_ups {
            let spec = p.kind.spec();
            level.draw_cell(p.cell, spec.shape.symbol(), Style::new().fg(spec.color));
        }
        for p in self.particles.iter() {
            level.draw_cell(p.cell, consts::PARTICLE_SYMBOL, Style::new().fg(p.color));
        }

        let style = self.snake_style();
        let mut segments = self.sample.segments.iter().map(|p| p.to_cell(1.0));
        let head = segments.next();
        for c in segments {
            level.draw_cell(c, consts::SNAKE_BODY_SYMBOL, style);
        }
        // Draw the head last so that, if it's a collision, we overwrite
        // whatever it's colliding with
        if let Some(head) = head {
            if self.session.ending().is_some() {
                level.draw_cell(head, consts::COLLISION_SYMBOL, consts::COLLISION_STYLE);
            } else {
                level.draw_cell(head, self.head_symbol(), style);
            }
        }

        let settings = self.settings().get();
        match self.session.phase() {
            Phase::Idle => {
                Line::from_iter([
                    Span::raw(" Press "),
                    Span::styled("Enter", consts::KEY_STYLE),
                    Span::raw(" to start"),
                ])
                .render(msg1_area, buf);
            }
            Phase::Countdown(n) => {
                let area = center_rect(block_area, Size::new(3, 1));
                Line::from(format!(" {n} "))
                    .alignment(Alignment::Center)
                    .style(Style::reset())
                    .render(area, buf);
            }
            Phase::Running => (),
            Phase::Paused => {
                let area = center_rect(display, Size::new(PauseMenu::WIDTH, PauseMenu::HEIGHT));
                self.pause_menu.render(area, buf);
            }
            Phase::ConfirmRestart { .. } => {
                let area = center_rect(
                    display,
                    Size::new(ConfirmRestart::WIDTH, ConfirmRestart::HEIGHT),
                );
                ConfirmRestart.render(area, buf);
            }
            Phase::GameOver => {
                let why = self
                    .session
                    .ending()
                    .map(|e| format!(": {e}"))
                    .unwrap_or_default();
                Span::from(format!(" GAME OVER{why}")).render(msg1_area, buf);
                Line::from_iter([
                    Span::raw(" Play again ("),
                    Span::styled("Enter", consts::KEY_STYLE),
                    Span::raw(") Quit ("),
                    Span::styled("q", consts::KEY_STYLE),
                    Span::raw(")"),
                ])
                .render(msg2_area, buf);
                return;
            }
        }
        Line::from_iter([
            Span::raw(" Pause ("),
            Span::styled("p", consts::KEY_STYLE),
            Span::raw(")  Restart ("),
            Span::styled("r", consts::KEY_STYLE),
            Span::raw(")  Sound ("),
            Span::styled("m", consts::KEY_STYLE),
            Span::raw(format!("): {}  Obstacles (", on_off(settings.sound))),
            Span::styled("o", consts::KEY_STYLE),
            Span::raw(format!("): {}", on_off(settings.obstacles))),
        ])
        .render(msg2_area, buf);
    }
}

/// Size of a field plus its border
pub(crate) fn board_size(bounds: Bounds) -> Size {
    let width = u16::try_from(bounds.cols).unwrap_or(u16::MAX);
    let height = u16::try_from(bounds.rows).unwrap_or(u16::MAX);
    Size::new(width.saturating_add(2), height.saturating_add(2))
}

/// A drawing surface addressed in field cells
#[derive(Debug)]
pub(crate) struct Canvas<'a> {
    pub(crate) area: Rect,
    pub(crate) buf: &'a mut Buffer,
}

impl Canvas<'_> {
    /// Draw `symbol` at `cell`.  Cells outside the canvas are skipped.
    pub(crate) fn draw_cell(&mut self, cell: Cell, symbol: char, style: Style) {
        let (Ok(dx), Ok(dy)) = (u16::try_from(cell.x), u16::try_from(cell.y)) else {
            return;
        };
        if dx >= self.area.width || dy >= self.area.height {
            return;
        }
        let x = self.area.x + dx;
        let y = self.area.y + dy;
        if let Some(c) = self.buf.cell_mut((x, y)) {
            c.set_char(symbol);
            c.set_style(Style::reset().patch(style));
        }
    }
}
