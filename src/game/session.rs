use super::direction::Direction;
use super::engine::{Board, Collision};
use super::expression::{Expression, ExpressionState, Glow};
use super::grid::Bounds;
use super::hooks::{Hooks, SharedSettings, Sound};
use super::interp::{self, Point};
use super::obstacles::{GlitchSprite, Obstacles};
use super::powerup::{self, Effect, PowerUpKind};
use super::timers::{Scheduler, Task, TaskHandle};
use crate::consts;
use crate::util::ErrorChain;
use log::{debug, info, warn};
use rand::{rngs::ThreadRng, Rng};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Where a session is in its lifecycle
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Phase {
    /// Nothing started yet
    Idle,
    /// Counting down to the start; the payload is the number on screen
    Countdown(u8),
    Running,
    Paused,
    /// The player asked to restart mid-game and hasn't confirmed yet
    ConfirmRestart { was_paused: bool },
    GameOver,
}

/// Outcome of [`Session::request_restart()`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RestartRequest {
    /// A new session started right away
    Restarted,
    /// A session is in progress; waiting on confirmation
    NeedsConfirmation,
}

/// Why a session ended
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Ending {
    Collision(Collision),
    /// No free cell for the food
    BoardFull,
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ending::Collision(Collision::Wall) => write!(f, "hit a wall"),
            Ending::Collision(Collision::Body) => write!(f, "bit itself"),
            Ending::Collision(Collision::Obstacle) => write!(f, "hit an obstacle"),
            Ending::BoardFull => write!(f, "board full"),
        }
    }
}

/// The buff currently occupying the power-up slot and the timer that ends it
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ActiveBuff {
    kind: PowerUpKind,
    expiry: TaskHandle,
}

/// Everything needed to draw one frame
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RenderSample {
    pub(crate) alpha: f64,
    /// Interpolated segment positions, head first, in cell units
    pub(crate) segments: Vec<Point>,
    pub(crate) expression: Expression,
    pub(crate) glow: f64,
    pub(crate) immune: bool,
    /// Both obstacle layouts while a glitch transition is playing
    pub(crate) glitch: Vec<GlitchSprite>,
}

/// A single-player game session.
///
/// Time is passed in by the caller as the offset from an arbitrary origin;
/// the session never reads a clock itself.  All deferred work lives in a
/// [`Scheduler`] that is wiped whenever the session ends or restarts.
#[derive(Debug)]
pub(crate) struct Session<R = ThreadRng> {
    rng: R,
    hooks: Hooks,
    board: Board,
    phase: Phase,
    ending: Option<Ending>,
    score: u32,
    best: u32,
    multiplier: u32,
    tick: Duration,
    /// The tick interval from before SlowDown took effect
    original_tick: Option<Duration>,
    last_tick: Duration,
    active: Option<ActiveBuff>,
    immune: bool,
    /// Pending re-check of an immunity that could not end yet
    immunity_check: Option<TaskHandle>,
    last_power_up: Option<PowerUpKind>,
    repeat_factor: f64,
    scheduler: Scheduler,
    countdown_timer: Option<TaskHandle>,
    spawn_timer: Option<TaskHandle>,
    glitch_timer: Option<TaskHandle>,
    expression: ExpressionState,
    glow: Glow,
}

impl Session<ThreadRng> {
    pub(crate) fn new(hooks: Hooks, bounds: Bounds) -> Self {
        Session::new_with_rng(hooks, bounds, rand::rng())
    }
}

impl<R: Rng> Session<R> {
    pub(crate) fn new_with_rng(hooks: Hooks, bounds: Bounds, rng: R) -> Session<R> {
        let best = match hooks.best.load_best() {
            Ok(best) => best,
            Err(e) => {
                warn!("{}", ErrorChain(&e));
                0
            }
        };
        let mut session = Session {
            rng,
            hooks,
            board: Board::new(bounds),
            phase: Phase::Idle,
            ending: None,
            score: 0,
            best,
            multiplier: 1,
            tick: consts::INITIAL_TICK,
            original_tick: None,
            last_tick: Duration::ZERO,
            active: None,
            immune: false,
            immunity_check: None,
            last_power_up: None,
            repeat_factor: consts::REPEAT_WEIGHT_FACTOR,
            scheduler: Scheduler::new(),
            countdown_timer: None,
            spawn_timer: None,
            glitch_timer: None,
            expression: ExpressionState::new(),
            glow: Glow::new(),
        };
        session.reset(Duration::ZERO);
        session
    }

    /// Set the weight multiplier applied to the most recently spawned
    /// power-up kind
    pub(crate) fn with_repeat_factor(mut self, factor: f64) -> Self {
        self.repeat_factor = factor.max(0.0);
        self
    }

    /// Wipe all session state and timers and lay out a fresh board
    fn reset(&mut self, now: Duration) {
        self.scheduler.cancel_all();
        self.countdown_timer = None;
        self.spawn_timer = None;
        self.glitch_timer = None;
        self.immunity_check = None;
        self.board = Board::new(self.board.bounds);
        if self.hooks.settings.get().obstacles {
            self.board.obstacles = Obstacles::static_pattern(self.board.bounds);
        }
        self.phase = Phase::Idle;
        self.ending = None;
        self.score = 0;
        self.multiplier = 1;
        self.tick = consts::INITIAL_TICK;
        self.original_tick = None;
        self.last_tick = now;
        self.active = None;
        self.immune = false;
        self.last_power_up = None;
        self.expression.reset();
        self.glow.reset();
        if let Err(e) = self.board.place_food(&mut self.rng) {
            warn!("Cannot start session: {e}");
            self.game_over(now, Ending::BoardFull);
        }
    }

    /// Reset everything and begin the countdown
    pub(crate) fn start(&mut self, now: Duration) {
        self.reset(now);
        if self.phase != Phase::Idle {
            return;
        }
        info!(
            "Starting session on a {}x{} board",
            self.board.bounds.cols, self.board.bounds.rows
        );
        self.phase = Phase::Countdown(consts::COUNTDOWN_FROM);
        self.countdown_timer = Some(
            self.scheduler
                .schedule(Task::CountdownStep, now + consts::COUNTDOWN_STEP),
        );
        self.spawn_timer = Some(
            self.scheduler
                .schedule(Task::SpawnPowerUp, now + consts::POWER_UP_SPAWN_INTERVAL),
        );
    }

    /// Restart, asking for confirmation first if a game is in progress
    pub(crate) fn request_restart(&mut self, now: Duration) -> RestartRequest {
        match self.phase {
            Phase::Running | Phase::Paused => {
                let was_paused = self.phase == Phase::Paused;
                if !was_paused {
                    self.hooks.play_sound(Sound::Pause);
                }
                self.phase = Phase::ConfirmRestart { was_paused };
                RestartRequest::NeedsConfirmation
            }
            Phase::ConfirmRestart { .. } => RestartRequest::NeedsConfirmation,
            Phase::Idle | Phase::Countdown(_) | Phase::GameOver => {
                self.start(now);
                RestartRequest::Restarted
            }
        }
    }

    pub(crate) fn confirm_restart(&mut self, now: Duration) {
        if matches!(self.phase, Phase::ConfirmRestart { .. }) {
            info!("Restart confirmed");
            self.start(now);
        }
    }

    /// Back out of a restart request, returning to where the game was
    pub(crate) fn cancel_restart(&mut self) {
        if let Phase::ConfirmRestart { was_paused } = self.phase {
            self.phase = if was_paused {
                Phase::Paused
            } else {
                Phase::Running
            };
        }
    }

    pub(crate) fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                self.hooks.play_sound(Sound::Pause);
                debug!("Paused");
            }
            Phase::Paused => {
                self.phase = Phase::Running;
                debug!("Resumed");
            }
            _ => (),
        }
    }

    /// Ask the snake to turn.  Returns `true` if the turn was accepted.
    pub(crate) fn steer(&mut self, direction: Direction) -> bool {
        self.phase == Phase::Running && self.board.set_direction(direction)
    }

    /// Do everything due by `now`: fire timers, drop stale power-ups, then
    /// advance the snake if a tick interval has passed.  Returns `true` if
    /// the snake moved.
    pub(crate) fn frame(&mut self, now: Duration) -> bool {
        while let Some((handle, task)) = self.scheduler.pop_due(now) {
            self.run_task(handle, task, now);
        }
        let pruned = self.board.prune_power_ups(now);
        if pruned > 0 {
            debug!("{pruned} power-up(s) expired uncollected");
        }
        if self.phase == Phase::Running
            && !self.board.obstacles.is_glitching()
            && now.saturating_sub(self.last_tick) >= self.tick
        {
            self.tick(now);
            true
        } else {
            false
        }
    }

    fn run_task(&mut self, handle: TaskHandle, task: Task, now: Duration) {
        if !self.scheduler.is_current(handle) {
            debug!("Dropping {task:?} from a previous session");
            return;
        }
        match task {
            Task::CountdownStep if self.countdown_timer == Some(handle) => {
                self.countdown_timer = None;
                self.countdown_step(now);
            }
            Task::SpawnPowerUp if self.spawn_timer == Some(handle) => {
                self.spawn_timer = None;
                self.spawn_power_up(now);
            }
            Task::BuffExpiry(kind) if self.active.is_some_and(|a| a.expiry == handle) => {
                debug!("{kind} expired");
                self.deactivate(kind, now);
            }
            Task::ImmunityCheck if self.immunity_check == Some(handle) => {
                self.immunity_check = None;
                self.release_immunity(now);
            }
            Task::GlitchEnd if self.glitch_timer == Some(handle) => {
                self.glitch_timer = None;
                self.board.obstacles.end_glitch();
            }
            _ => debug!("Ignoring superseded {task:?}"),
        }
    }

    fn countdown_step(&mut self, now: Duration) {
        match self.phase {
            Phase::Countdown(n) if n > 1 => {
                self.phase = Phase::Countdown(n - 1);
                self.countdown_timer = Some(
                    self.scheduler
                        .schedule(Task::CountdownStep, now + consts::COUNTDOWN_STEP),
                );
            }
            Phase::Countdown(_) => {
                self.phase = Phase::Running;
                self.last_tick = now;
                info!("Session running");
            }
            _ => (),
        }
    }

    fn spawn_power_up(&mut self, now: Duration) {
        if self.is_running() {
            let weights = powerup::weights(self.score, self.last_power_up, self.repeat_factor);
            match powerup::choose(&weights, &mut self.rng) {
                Some(kind) => {
                    self.last_power_up = Some(kind);
                    match self.board.place_power_up(kind, now, &mut self.rng) {
                        Some(cell) => debug!("Spawned {kind} at ({}, {})", cell.x, cell.y),
                        None => warn!("No free cell for {kind}; skipping this spawn"),
                    }
                }
                None => debug!("No power-up eligible at score {}", self.score),
            }
        }
        self.spawn_timer = Some(
            self.scheduler
                .schedule(Task::SpawnPowerUp, now + consts::POWER_UP_SPAWN_INTERVAL),
        );
    }

    /// Advance the snake by one cell and resolve whatever it runs into
    pub(crate) fn tick(&mut self, now: Duration) {
        if self.phase != Phase::Running {
            return;
        }
        self.last_tick = now;
        let head = match self.board.step_head(self.immune) {
            Ok(head) => head,
            Err(collision) => {
                self.game_over(now, Ending::Collision(collision));
                return;
            }
        };
        if let Some(p) = self.board.take_power_up(head) {
            self.activate(p.kind, now);
            if self.phase == Phase::GameOver {
                return;
            }
        }
        let ate = head == self.board.food;
        if ate {
            self.eat(now);
            if self.phase == Phase::GameOver {
                return;
            }
        }
        self.board.finish_step(ate);
    }

    fn eat(&mut self, now: Duration) {
        let food = self.board.food;
        let before = self.score;
        self.score += self.multiplier;
        self.record_best();
        self.expression.blink(now);
        self.glow.trigger(now);
        self.hooks.spawn_particles(food, consts::FOOD_COLOR);
        let threshold = crossed_threshold(before, self.score);
        if threshold {
            info!("Score reached {}; reshuffling obstacles", self.score);
            self.regenerate_obstacles(now);
        }
        // Food goes down after the new layout so that it never lands under it
        if let Err(e) = self.board.place_food(&mut self.rng) {
            warn!("{e}");
            self.game_over(now, Ending::BoardFull);
            return;
        }
        if threshold {
            self.hooks.play_sound(Sound::Bonus);
            self.activate_buff(PowerUpKind::Immunity, consts::THRESHOLD_IMMUNITY, now);
        } else {
            self.hooks.play_sound(Sound::Eat);
        }
        self.tick = self
            .tick
            .saturating_sub(consts::SPEED_STEP)
            .max(consts::MIN_TICK);
    }

    fn record_best(&mut self) {
        if self.score > self.best {
            self.best = self.score;
            if let Err(e) = self.hooks.best.save_best(self.best) {
                warn!("{}", ErrorChain(&e));
            }
        }
    }

    /// Swap in a fresh obstacle layout behind a glitch transition, which
    /// holds off ticks until it ends
    fn regenerate_obstacles(&mut self, now: Duration) {
        let cells = if self.hooks.settings.get().obstacles {
            Obstacles::random_clusters(self.board.bounds, &self.board.snake, &mut self.rng)
        } else {
            HashSet::new()
        };
        self.board.obstacles.begin_glitch(cells, now);
        let timer = self
            .scheduler
            .schedule(Task::GlitchEnd, now + consts::GLITCH_DURATION);
        if let Some(old) = self.glitch_timer.replace(timer) {
            self.scheduler.cancel(old);
        }
    }

    /// Apply a collected power-up
    pub(crate) fn activate(&mut self, kind: PowerUpKind, now: Duration) {
        self.hooks.play_sound(Sound::PowerUp(kind));
        match kind.spec().effect {
            Effect::Buff(duration) => self.activate_buff(kind, duration, now),
            Effect::Instant => self.apply_instant(kind, now),
        }
    }

    fn activate_buff(&mut self, kind: PowerUpKind, duration: Duration, now: Duration) {
        match self.active {
            Some(active) if active.kind == kind => {
                self.scheduler.cancel(active.expiry);
            }
            Some(active) => self.deactivate(active.kind, now),
            None => (),
        }
        match kind {
            PowerUpKind::SlowDown => {
                if self.original_tick.is_none() {
                    self.original_tick = Some(self.tick);
                    self.tick = self.tick.mul_f64(consts::SLOW_DOWN_FACTOR);
                }
            }
            PowerUpKind::DoublePoints => self.multiplier = 2,
            PowerUpKind::Immunity => {
                self.immune = true;
                if let Some(h) = self.immunity_check.take() {
                    self.scheduler.cancel(h);
                }
            }
            _ => (),
        }
        let expiry = self.scheduler.schedule(Task::BuffExpiry(kind), now + duration);
        self.active = Some(ActiveBuff { kind, expiry });
        self.expression.set_resting(kind.expression());
        debug!("{kind} active for {duration:?}");
    }

    fn apply_instant(&mut self, kind: PowerUpKind, now: Duration) {
        match kind {
            PowerUpKind::Shrink => {
                let len = self.board.snake.len();
                if len > consts::SHRINK_MIN_LENGTH {
                    for cell in self.board.snake.truncate_tail(len / 3) {
                        self.hooks.spawn_particles(cell, consts::SNAKE_COLOR);
                    }
                }
            }
            PowerUpKind::ClearObstacles => {
                for cell in self.board.obstacles.clear() {
                    self.hooks.spawn_particles(cell, consts::OBSTACLE_COLOR);
                }
            }
            PowerUpKind::Bomb => {
                self.score = self.score.saturating_sub(consts::BOMB_PENALTY);
                if let Err(e) = self.board.place_food(&mut self.rng) {
                    warn!("{e}");
                    self.game_over(now, Ending::BoardFull);
                    return;
                }
            }
            _ => (),
        }
        let expression = kind.expression();
        if expression != Expression::Normal {
            self.expression.react(expression, now);
        }
    }

    /// End the buff `kind` if it is the one in the slot.  Calling this again
    /// for a buff that has already ended does nothing.
    pub(crate) fn deactivate(&mut self, kind: PowerUpKind, now: Duration) {
        let Some(active) = self.active.filter(|a| a.kind == kind) else {
            return;
        };
        self.scheduler.cancel(active.expiry);
        self.active = None;
        match kind {
            PowerUpKind::SlowDown => {
                if let Some(tick) = self.original_tick.take() {
                    self.tick = tick;
                }
            }
            PowerUpKind::DoublePoints => self.multiplier = 1,
            PowerUpKind::Immunity => self.release_immunity(now),
            _ => (),
        }
        self.expression.set_resting(Expression::Normal);
    }

    /// Drop immunity unless doing so would kill the snake on the spot, in
    /// which case look again shortly
    fn release_immunity(&mut self, now: Duration) {
        if self.board.overlapping() {
            debug!("Still overlapping; deferring end of immunity");
            self.immunity_check = Some(
                self.scheduler
                    .schedule(Task::ImmunityCheck, now + consts::IMMUNITY_RECHECK),
            );
        } else {
            self.immune = false;
        }
    }

    fn game_over(&mut self, now: Duration, ending: Ending) {
        self.phase = Phase::GameOver;
        self.ending = Some(ending);
        self.scheduler.cancel_all();
        self.countdown_timer = None;
        self.spawn_timer = None;
        self.glitch_timer = None;
        self.immunity_check = None;
        self.active = None;
        self.board.obstacles.end_glitch();
        self.last_tick = now;
        self.hooks.play_sound(Sound::GameOver);
        info!("Game over ({ending}) with score {}", self.score);
        if let Err(e) = self.hooks.scores.submit_score(self.score) {
            warn!("{}", ErrorChain(&e));
        }
    }

    /// Produce everything the renderer needs for a frame at `now`
    pub(crate) fn sample(&mut self, now: Duration) -> RenderSample {
        let alpha = if self.phase == Phase::Running {
            interp::alpha(now, self.last_tick, self.tick)
        } else {
            1.0
        };
        let segments = interp::interpolate(&self.board.prev_snake, &self.board.snake, alpha, 1.0);
        let glitch = self
            .board
            .obstacles
            .glitch()
            .map(|g| g.sample(&self.board.obstacles, now, &mut self.rng))
            .unwrap_or_default();
        RenderSample {
            alpha,
            segments,
            expression: self.expression.current(now),
            glow: self.glow.value(now),
            immune: self.immune,
            glitch,
        }
    }
}

impl<R> Session<R> {
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn best(&self) -> u32 {
        self.best
    }

    pub(crate) fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn tick_interval(&self) -> Duration {
        self.tick
    }

    pub(crate) fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub(crate) fn active_power_up(&self) -> Option<PowerUpKind> {
        self.active.map(|a| a.kind)
    }

    pub(crate) fn is_immune(&self) -> bool {
        self.immune
    }

    /// Has the session started and not yet ended?
    pub(crate) fn is_running(&self) -> bool {
        matches!(
            self.phase,
            Phase::Running | Phase::Paused | Phase::ConfirmRestart { .. }
        )
    }

    pub(crate) fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused | Phase::ConfirmRestart { .. })
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Should the board be redrawn?  A paused board stays frozen except
    /// while an obstacle glitch is playing out.
    pub(crate) fn should_render(&self) -> bool {
        !self.is_paused() || self.board.obstacles.is_glitching()
    }

    pub(crate) fn settings(&self) -> &SharedSettings {
        &self.hooks.settings
    }
}

/// Did going from `before` to `after` pass a multiple of the obstacle score
/// step?
fn crossed_threshold(before: u32, after: u32) -> bool {
    after > 0 && before / consts::OBSTACLE_SCORE_STEP < after / consts::OBSTACLE_SCORE_STEP
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::Cell;
    use crate::game::hooks::{BestScoreStore, EffectSink, ScoreSink, Settings};
    use crate::game::snake::Snake;
    use crate::scores::{LoadError, SaveError};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use ratatui::style::Color;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Debug, Default)]
    struct Log {
        sounds: Vec<Sound>,
        particles: Vec<(Cell, Color)>,
        submitted: Vec<u32>,
        best: Option<u32>,
    }

    #[derive(Clone, Debug, Default)]
    struct Recorder(Rc<RefCell<Log>>);

    impl Recorder {
        fn sounds(&self) -> Vec<Sound> {
            self.0.borrow().sounds.clone()
        }

        fn count(&self, sound: Sound) -> usize {
            self.0.borrow().sounds.iter().filter(|&&s| s == sound).count()
        }
    }

    impl ScoreSink for Recorder {
        fn submit_score(&mut self, score: u32) -> Result<(), SaveError> {
            self.0.borrow_mut().submitted.push(score);
            Ok(())
        }
    }

    impl BestScoreStore for Recorder {
        fn load_best(&self) -> Result<u32, LoadError> {
            Ok(self.0.borrow().best.unwrap_or(7))
        }

        fn save_best(&mut self, best: u32) -> Result<(), SaveError> {
            self.0.borrow_mut().best = Some(best);
            Ok(())
        }
    }

    impl EffectSink for Recorder {
        fn play_sound(&mut self, sound: Sound) {
            self.0.borrow_mut().sounds.push(sound);
        }

        fn spawn_particles(&mut self, cell: Cell, color: Color, _cell_size: u16) {
            self.0.borrow_mut().particles.push((cell, color));
        }
    }

    fn new_session(obstacles: bool, bounds: Bounds) -> (Session<ChaCha12Rng>, Recorder) {
        seeded_session(obstacles, bounds, RNG_SEED)
    }

    fn seeded_session(obstacles: bool, bounds: Bounds, seed: u64) -> (Session<ChaCha12Rng>, Recorder) {
        let rec = Recorder::default();
        let settings = SharedSettings::new(Settings {
            obstacles,
            ..Settings::default()
        });
        let hooks = Hooks::new(settings)
            .with_scores(rec.clone())
            .with_best(rec.clone())
            .with_effects(rec.clone());
        let session = Session::new_with_rng(hooks, bounds, ChaCha12Rng::seed_from_u64(seed));
        (session, rec)
    }

    /// A session that has finished its countdown at t = 3s
    fn running_session() -> (Session<ChaCha12Rng>, Recorder) {
        let (mut session, rec) = new_session(false, Bounds::new(20, 15));
        session.start(Duration::ZERO);
        assert_eq!(session.phase(), Phase::Countdown(3));
        session.frame(ms(1000));
        assert_eq!(session.phase(), Phase::Countdown(2));
        session.frame(ms(2000));
        assert_eq!(session.phase(), Phase::Countdown(1));
        session.frame(ms(3000));
        assert_eq!(session.phase(), Phase::Running);
        (session, rec)
    }

    fn place(session: &mut Session<ChaCha12Rng>, cells: &[(i32, i32)], direction: Direction) {
        let snake = Snake::from_cells(cells.iter().map(|&(x, y)| Cell::new(x, y))).unwrap();
        session.board.prev_snake = snake.clone();
        session.board.snake = snake;
        session.board.direction = direction;
        session.board.next_direction = direction;
    }

    #[test]
    fn new_session_is_idle() {
        let (session, _) = new_session(true, Bounds::new(30, 20));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.best(), 7);
        assert_eq!(session.board().obstacles.len(), 16);
        let food = session.board().food;
        assert!(!session.board().snake.contains(food));
        assert!(!session.board().obstacles.contains(food));
    }

    #[test]
    fn eating_grows_and_scores() {
        let (mut session, rec) = running_session();
        place(&mut session, &[(5, 5)], Direction::East);
        session.board.food = Cell::new(6, 5);
        session.tick(ms(3100));
        assert_eq!(
            session.board().snake.to_vec(),
            vec![Cell::new(6, 5), Cell::new(5, 5)]
        );
        assert_eq!(session.score(), 1);
        assert_ne!(session.board().food, Cell::new(6, 5));
        assert!(!session.board().snake.contains(session.board().food));
        assert_eq!(session.tick_interval(), ms(107));
        assert_eq!(rec.sounds(), [Sound::Eat]);
        assert_eq!(rec.0.borrow().particles, [(Cell::new(6, 5), consts::FOOD_COLOR)]);
        assert_eq!(session.sample(ms(3100)).expression, Expression::Blink);
        assert_eq!(session.sample(ms(3250)).expression, Expression::Normal);
    }

    #[test]
    fn wall_is_fatal() {
        let (mut session, rec) = running_session();
        place(&mut session, &[(0, 5)], Direction::West);
        session.tick(ms(3100));
        assert!(session.is_game_over());
        assert_eq!(session.ending(), Some(Ending::Collision(Collision::Wall)));
        assert_eq!(rec.0.borrow().submitted, [0]);
        assert!(session.scheduler.is_empty());
        assert_eq!(rec.count(Sound::GameOver), 1);
    }

    #[test]
    fn immunity_wraps_walls() {
        let (mut session, _) = running_session();
        place(&mut session, &[(0, 5)], Direction::West);
        session.board.food = Cell::new(0, 14);
        session.activate(PowerUpKind::Immunity, ms(3050));
        session.tick(ms(3100));
        assert!(!session.is_game_over());
        assert_eq!(session.board().snake.head(), Cell::new(19, 5));
        let sample = session.sample(ms(3150));
        assert_eq!(sample.segments, vec![Point::new(19.0, 5.0)]);
        assert!(sample.immune);
        assert_eq!(sample.expression, Expression::Aggressive);
    }

    #[test]
    fn double_points() {
        let (mut session, _) = running_session();
        session.activate(PowerUpKind::DoublePoints, ms(3000));
        assert_eq!(session.multiplier(), 2);
        place(&mut session, &[(5, 5)], Direction::East);
        session.board.food = Cell::new(6, 5);
        session.tick(ms(3100));
        assert_eq!(session.score(), 2);
        session.frame(ms(18_000));
        assert_eq!(session.multiplier(), 1);
        assert_eq!(session.active_power_up(), None);
    }

    #[test]
    fn slow_down_applies_once() {
        let (mut session, _) = running_session();
        session.activate(PowerUpKind::SlowDown, ms(3000));
        assert_eq!(session.tick_interval(), ms(165));
        session.activate(PowerUpKind::SlowDown, ms(4000));
        assert_eq!(session.tick_interval(), ms(165));
        session.deactivate(PowerUpKind::DoublePoints, ms(4000));
        assert_eq!(session.active_power_up(), Some(PowerUpKind::SlowDown));
        session.deactivate(PowerUpKind::SlowDown, ms(5000));
        assert_eq!(session.tick_interval(), ms(110));
        session.deactivate(PowerUpKind::SlowDown, ms(5000));
        assert_eq!(session.tick_interval(), ms(110));
        assert_eq!(session.active_power_up(), None);
    }

    #[test]
    fn slow_down_expires_on_time() {
        let (mut session, _) = running_session();
        session.activate(PowerUpKind::SlowDown, ms(3000));
        session.activate(PowerUpKind::SlowDown, ms(4000));
        session.pause_for_test();
        session.frame(ms(13_500));
        assert_eq!(session.tick_interval(), ms(165));
        session.frame(ms(14_000));
        assert_eq!(session.tick_interval(), ms(110));
    }

    #[test]
    fn deactivate_twice_is_deactivate_once() {
        let (mut session, _) = running_session();
        session.activate(PowerUpKind::DoublePoints, ms(3000));
        session.deactivate(PowerUpKind::DoublePoints, ms(3500));
        let tick = session.tick_interval();
        session.deactivate(PowerUpKind::DoublePoints, ms(3600));
        assert_eq!(session.multiplier(), 1);
        assert_eq!(session.tick_interval(), tick);
        assert_eq!(session.scheduler.len(), 1, "only the spawn timer should remain");
    }

    #[test]
    fn new_buff_replaces_old() {
        let (mut session, _) = running_session();
        session.activate(PowerUpKind::SlowDown, ms(3000));
        session.activate(PowerUpKind::DoublePoints, ms(3100));
        assert_eq!(session.tick_interval(), ms(110));
        assert_eq!(session.multiplier(), 2);
        assert_eq!(session.active_power_up(), Some(PowerUpKind::DoublePoints));
        // The SlowDown expiry was canceled and cannot undo anything later
        session.pause_for_test();
        session.frame(ms(13_100));
        assert_eq!(session.multiplier(), 2);
    }

    #[rstest]
    #[case(9, 1, true)]
    #[case(9, 2, true)]
    #[case(19, 2, true)]
    #[case(5, 1, false)]
    #[case(10, 1, false)]
    fn threshold_crossing(#[case] score: u32, #[case] multiplier: u32, #[case] fires: bool) {
        let (mut session, rec) = running_session();
        if multiplier == 2 {
            session.activate(PowerUpKind::DoublePoints, ms(3000));
        }
        session.score = score;
        place(&mut session, &[(5, 5)], Direction::East);
        session.board.food = Cell::new(6, 5);
        session.tick(ms(3100));
        assert_eq!(session.board().obstacles.is_glitching(), fires);
        assert_eq!(session.is_immune(), fires);
        assert_eq!(rec.count(Sound::Bonus), usize::from(fires));
        // Many frames later nothing has fired again
        for t in (3101..3600).step_by(16) {
            session.frame(ms(t));
        }
        assert_eq!(rec.count(Sound::Bonus), usize::from(fires));
    }

    #[test]
    fn glitch_suspends_ticks_and_keeps_pause() {
        let (mut session, _) = running_session();
        session.score = 9;
        place(&mut session, &[(5, 5)], Direction::East);
        session.board.food = Cell::new(6, 5);
        session.tick(ms(3100));
        assert!(session.board().obstacles.is_glitching());
        assert!(!session.frame(ms(3300)));
        assert_eq!(session.board().snake.head(), Cell::new(6, 5));
        session.toggle_pause();
        assert!(session.should_render());
        session.frame(ms(3600));
        assert!(!session.board().obstacles.is_glitching());
        assert_eq!(session.phase(), Phase::Paused);
        assert!(!session.should_render());
        session.toggle_pause();
        assert!(session.frame(ms(3700)));
        assert_eq!(session.board().snake.head(), Cell::new(7, 5));
    }

    #[test]
    fn threshold_obstacles_respect_settings() {
        let (mut session, _) = new_session(true, Bounds::new(30, 20));
        session.start(Duration::ZERO);
        for t in [1000, 2000, 3000] {
            session.frame(ms(t));
        }
        session.score = 9;
        place(&mut session, &[(15, 15)], Direction::East);
        session.board.food = Cell::new(16, 15);
        session.tick(ms(3100));
        let head = session.board().snake.head();
        assert!(session
            .board()
            .obstacles
            .iter()
            .all(|c| c.distance(head) > consts::HEAD_CLEARANCE));
        assert_eq!(session.board().obstacles.glitch().map(|g| g.old.len()), Some(16));
    }

    #[test]
    fn food_never_lands_under_new_obstacles() {
        let mut buried = 0;
        for seed in 0..400 {
            let (mut session, _) = seeded_session(true, Bounds::new(30, 20), seed);
            session.start(Duration::ZERO);
            for t in [1000, 2000, 3000] {
                session.frame(ms(t));
            }
            session.score = 9;
            place(&mut session, &[(15, 15)], Direction::East);
            session.board.food = Cell::new(16, 15);
            session.tick(ms(3100));
            assert!(session.board().obstacles.is_glitching());
            let food = session.board().food;
            assert!(!session.board().snake.contains(food));
            if session.board().obstacles.contains(food) {
                buried += 1;
            }
        }
        assert_eq!(buried, 0);
    }

    #[test]
    fn immunity_waits_for_clear_cell() {
        let (mut session, _) = running_session();
        session.activate(PowerUpKind::Immunity, ms(3000));
        session.pause_for_test();
        let head = session.board().snake.head();
        session.board.obstacles = Obstacles::from_iter([head]);
        session.frame(ms(13_000));
        assert!(session.is_immune());
        assert_eq!(session.active_power_up(), None);
        session.frame(ms(13_100));
        assert!(session.is_immune());
        session.board.obstacles = Obstacles::default();
        session.frame(ms(13_200));
        assert!(!session.is_immune());
    }

    #[test]
    fn shrink_removes_a_third() {
        let (mut session, rec) = running_session();
        place(
            &mut session,
            &[(9, 5), (8, 5), (7, 5), (6, 5), (5, 5), (4, 5), (3, 5)],
            Direction::East,
        );
        session.activate(PowerUpKind::Shrink, ms(3000));
        assert_eq!(session.board().snake.len(), 5);
        assert_eq!(
            rec.0.borrow().particles,
            [(Cell::new(3, 5), consts::SNAKE_COLOR), (Cell::new(4, 5), consts::SNAKE_COLOR)]
        );
        assert_eq!(session.sample(ms(3100)).expression, Expression::Surprised);
        assert_eq!(session.sample(ms(3800)).expression, Expression::Normal);
        place(&mut session, &[(9, 5), (8, 5), (7, 5)], Direction::East);
        session.activate(PowerUpKind::Shrink, ms(4000));
        assert_eq!(session.board().snake.len(), 3);
    }

    #[test]
    fn bomb_and_clear() {
        let (mut session, rec) = new_session(true, Bounds::new(30, 20));
        session.start(Duration::ZERO);
        for t in [1000, 2000, 3000] {
            session.frame(ms(t));
        }
        session.score = 3;
        session.activate(PowerUpKind::Bomb, ms(3000));
        assert_eq!(session.score(), 0);
        session.activate(PowerUpKind::ClearObstacles, ms(3000));
        assert!(session.board().obstacles.is_empty());
        assert_eq!(rec.0.borrow().particles.len(), 16);
        assert_eq!(
            rec.sounds(),
            [
                Sound::PowerUp(PowerUpKind::Bomb),
                Sound::PowerUp(PowerUpKind::ClearObstacles)
            ]
        );
    }

    #[test]
    fn collecting_power_up_on_tick() {
        let (mut session, rec) = running_session();
        place(&mut session, &[(5, 5)], Direction::East);
        session.board.food = Cell::new(0, 14);
        session.board.power_ups.push(powerup::PowerUp {
            kind: PowerUpKind::DoublePoints,
            cell: Cell::new(6, 5),
            spawned: ms(3000),
        });
        session.tick(ms(3100));
        assert!(session.board().power_ups.is_empty());
        assert_eq!(session.active_power_up(), Some(PowerUpKind::DoublePoints));
        assert_eq!(rec.sounds(), [Sound::PowerUp(PowerUpKind::DoublePoints)]);
    }

    #[test]
    fn power_ups_spawn_and_expire() {
        let (mut session, _) = running_session();
        session.pause_for_test();
        session.frame(ms(20_000));
        assert_eq!(session.board().power_ups.len(), 1);
        let p = session.board().power_ups[0];
        assert!(!matches!(p.kind, PowerUpKind::SlowDown | PowerUpKind::Shrink));
        assert_eq!(session.last_power_up, Some(p.kind));
        session.frame(ms(29_999));
        assert_eq!(session.board().power_ups.len(), 1);
        session.frame(ms(30_000));
        assert!(session.board().power_ups.is_empty());
        session.frame(ms(40_000));
        assert_eq!(session.board().power_ups.len(), 1);
    }

    #[test]
    fn stale_timers_do_nothing_after_restart() {
        let (mut session, rec) = running_session();
        session.activate(PowerUpKind::DoublePoints, ms(3000));
        session.pause_for_test();
        assert_eq!(session.request_restart(ms(4000)), RestartRequest::NeedsConfirmation);
        session.confirm_restart(ms(4000));
        assert_eq!(session.phase(), Phase::Countdown(3));
        assert_eq!(session.multiplier(), 1);
        for t in [5000, 6000, 7000] {
            session.frame(ms(t));
        }
        session.pause_for_test();
        // The old session's spawn was due at 20s and its DoublePoints expiry
        // at 18s; the new session's spawn is due at 24s.
        session.frame(ms(23_000));
        assert!(session.board().power_ups.is_empty());
        assert_eq!(session.active_power_up(), None);
        session.frame(ms(24_000));
        assert_eq!(session.board().power_ups.len(), 1);
        assert!(rec.0.borrow().submitted.is_empty());
    }

    #[test]
    fn restart_confirmation() {
        let (mut session, rec) = running_session();
        assert_eq!(session.request_restart(ms(3500)), RestartRequest::NeedsConfirmation);
        assert_eq!(session.phase(), Phase::ConfirmRestart { was_paused: false });
        assert!(!session.frame(ms(4000)));
        session.cancel_restart();
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(rec.count(Sound::Pause), 1);

        session.toggle_pause();
        session.request_restart(ms(5000));
        assert_eq!(session.phase(), Phase::ConfirmRestart { was_paused: true });
        session.cancel_restart();
        assert_eq!(session.phase(), Phase::Paused);

        session.request_restart(ms(6000));
        session.confirm_restart(ms(6000));
        assert_eq!(session.phase(), Phase::Countdown(3));
    }

    #[test]
    fn restart_after_game_over_is_immediate() {
        let (mut session, _) = running_session();
        place(&mut session, &[(0, 5)], Direction::West);
        session.tick(ms(3100));
        assert_eq!(session.request_restart(ms(4000)), RestartRequest::Restarted);
        assert_eq!(session.phase(), Phase::Countdown(3));
        assert_eq!(session.ending(), None);
    }

    #[test]
    fn steering_only_while_running() {
        let (mut session, _) = new_session(false, Bounds::new(20, 15));
        assert!(!session.steer(Direction::North));
        let (mut session, _) = running_session();
        assert!(session.steer(Direction::North));
        assert!(!session.steer(Direction::West));
        session.frame(ms(3110));
        assert_eq!(session.board().direction, Direction::North);
        assert!(session.steer(Direction::West));
    }

    #[test]
    fn board_full_ends_session() {
        let (mut session, rec) = new_session(false, Bounds::new(2, 1));
        session.start(Duration::ZERO);
        for t in [1000, 2000, 3000] {
            session.frame(ms(t));
        }
        assert_eq!(session.board().food, Cell::new(0, 0));
        place(&mut session, &[(1, 0)], Direction::West);
        session.tick(ms(3100));
        assert!(session.is_game_over());
        assert_eq!(session.ending(), Some(Ending::BoardFull));
        assert_eq!(rec.0.borrow().submitted, [1]);
        assert_eq!(session.best(), 7);
    }

    #[test]
    fn best_score_written_when_beaten() {
        let (mut session, rec) = running_session();
        session.score = 7;
        place(&mut session, &[(5, 5)], Direction::East);
        session.board.food = Cell::new(6, 5);
        session.tick(ms(3100));
        assert_eq!(session.best(), 8);
        assert_eq!(rec.0.borrow().best, Some(8));
    }

    #[test]
    fn sound_setting_mutes_effects() {
        let (mut session, rec) = running_session();
        session.settings().toggle_sound();
        session.toggle_pause();
        assert!(rec.sounds().is_empty());
    }

    #[test]
    fn interpolated_sample() {
        let (mut session, _) = running_session();
        place(&mut session, &[(5, 5), (4, 5)], Direction::East);
        session.board.food = Cell::new(0, 14);
        session.frame(ms(3110));
        let sample = session.sample(ms(3165));
        assert_eq!(sample.alpha, 0.5);
        assert_eq!(
            sample.segments,
            vec![Point::new(5.5, 5.0), Point::new(4.5, 5.0)]
        );
        session.toggle_pause();
        assert_eq!(session.sample(ms(3165)).alpha, 1.0);
    }

    #[test]
    fn random_play_never_duplicates() {
        let (mut session, _) = running_session();
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED ^ 1);
        let dirs = [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ];
        let mut prev_direction = session.board().direction;
        let mut t = 3000;
        while !session.is_game_over() && t < 200_000 {
            t += 16;
            if rng.random_bool(0.1) {
                session.steer(dirs[rng.random_range(0..4)]);
            }
            if session.frame(ms(t)) && !session.is_game_over() {
                let direction = session.board().direction;
                assert!(!direction.is_opposite(prev_direction));
                prev_direction = direction;
            }
            if !session.is_game_over() && !session.is_immune() {
                assert!(!session.board().snake.has_duplicates());
            }
        }
    }

    impl Session<ChaCha12Rng> {
        /// Freeze the snake so that long stretches of time can be skipped
        /// without it running into a wall
        fn pause_for_test(&mut self) {
            if self.phase == Phase::Running {
                self.phase = Phase::Paused;
            }
        }
    }
}
