//! The multiplayer arena: several snakes on one field, simulated by a single
//! authoritative host and mirrored by clients through snapshots
pub(crate) mod messages;
pub(crate) mod relay;
mod screen;
pub(crate) use self::screen::Versus;
use self::messages::{NetMessage, PlayerState, Snapshot};
use crate::consts;
use crate::game::direction::Direction;
use crate::game::grid::{Bounds, Cell};
use crate::game::snake::Snake;
use log::{debug, info, warn};
use rand::{rngs::ThreadRng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub(crate) type PlayerId = u8;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Mode {
    /// Last snake standing; touching another snake is fatal
    Duel,
    /// Highest score when time runs out; snakes pass through each other
    Points,
}

impl Mode {
    fn bounds(self) -> Bounds {
        let size = match self {
            Mode::Duel => consts::DUEL_BOARD_SIZE,
            Mode::Points => consts::POINTS_BOARD_SIZE,
        };
        Bounds::new(size, size)
    }

    fn is_ghost(self) -> bool {
        self == Mode::Points
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Duel => f.pad("duel"),
            Mode::Points => f.pad("points"),
        }
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Mode, ParseModeError> {
        match s {
            "duel" => Ok(Mode::Duel),
            "points" => Ok(Mode::Points),
            _ => Err(ParseModeError),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error(r#"invalid arena mode; expected "duel" or "points""#)]
pub(crate) struct ParseModeError;

/// Whether this arena runs the simulation or mirrors someone else's
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Role {
    Host,
    Client,
}

/// How a round ended
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Outcome {
    Winner(PlayerId),
    Draw,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Player {
    pub(crate) snake: Snake,
    pub(crate) direction: Direction,
    pub(crate) next_direction: Direction,
    pub(crate) score: u32,
    pub(crate) alive: bool,
    pub(crate) round_wins: u32,
}

impl Player {
    fn spawn(head: Cell, direction: Direction) -> Player {
        Player {
            snake: Snake::new(head),
            direction,
            next_direction: direction,
            score: 0,
            alive: true,
            round_wins: 0,
        }
    }

    fn state(&self) -> PlayerState {
        PlayerState {
            snake: self.snake.to_vec(),
            direction: self.direction,
            score: self.score,
            is_alive: self.alive,
            round_wins: self.round_wins,
        }
    }

    fn from_state(state: &PlayerState) -> Option<Player> {
        Some(Player {
            snake: Snake::from_cells(state.snake.iter().copied())?,
            direction: state.direction,
            next_direction: state.direction,
            score: state.score,
            alive: state.is_alive,
            round_wins: state.round_wins,
        })
    }
}

/// The starting cell & heading for the `index`-th player: the four corners,
/// inset, facing inwards
fn spawn_point(bounds: Bounds, index: usize) -> (Cell, Direction) {
    let near = consts::ARENA_SPAWN_INSET;
    let far_x = bounds.cols - 1 - near;
    let far_y = bounds.rows - 1 - near;
    match index % consts::MAX_ARENA_PLAYERS {
        0 => (Cell::new(near, near), Direction::East),
        1 => (Cell::new(far_x, far_y), Direction::West),
        2 => (Cell::new(far_x, near), Direction::West),
        _ => (Cell::new(near, far_y), Direction::East),
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<R = ThreadRng> {
    rng: R,
    mode: Mode,
    role: Role,
    bounds: Bounds,
    players: BTreeMap<PlayerId, Player>,
    food: Cell,
    tick: Duration,
    last_tick: Duration,
    round: u32,
    round_started: Duration,
    remaining: Option<Duration>,
    outcome: Option<Outcome>,
    rematch: BTreeSet<PlayerId>,
}

impl Arena<ThreadRng> {
    pub(crate) fn new(mode: Mode, role: Role, qty: usize) -> Self {
        Arena::new_with_rng(mode, role, qty, rand::rng())
    }
}

impl<R: Rng> Arena<R> {
    /// Create an arena for `qty` players (clamped to the supported range),
    /// numbered from zero, with the first round ready to go
    pub(crate) fn new_with_rng(mode: Mode, role: Role, qty: usize, rng: R) -> Arena<R> {
        let bounds = mode.bounds();
        let qty = qty.clamp(1, consts::MAX_ARENA_PLAYERS);
        let players = (0..qty)
            .zip(0..)
            .map(|(i, id)| {
                let (head, direction) = spawn_point(bounds, i);
                (id, Player::spawn(head, direction))
            })
            .collect();
        let mut arena = Arena {
            rng,
            mode,
            role,
            bounds,
            players,
            food: Cell::default(),
            tick: consts::ARENA_TICK,
            last_tick: Duration::ZERO,
            round: 0,
            round_started: Duration::ZERO,
            remaining: None,
            outcome: None,
            rematch: BTreeSet::new(),
        };
        arena.start_round(Duration::ZERO);
        arena
    }

    /// Put everyone back at their spawn points and begin a new round.
    /// Scores carry over between duel rounds but not between points rounds.
    fn start_round(&mut self, now: Duration) {
        for (i, player) in self.players.values_mut().enumerate() {
            let (head, direction) = spawn_point(self.bounds, i);
            player.snake = Snake::new(head);
            player.direction = direction;
            player.next_direction = direction;
            player.alive = true;
            if self.mode == Mode::Points {
                player.score = 0;
            }
        }
        self.round += 1;
        self.round_started = now;
        self.last_tick = now;
        self.remaining = (self.mode == Mode::Points).then_some(consts::POINTS_ROUND_LENGTH);
        self.outcome = None;
        self.rematch.clear();
        self.place_food();
        info!("Arena round {} ({}) begins", self.round, self.mode);
    }

    /// Advance the host's simulation.  Returns `true` if anything changed
    /// that clients need to hear about.
    pub(crate) fn frame(&mut self, now: Duration) -> bool {
        if self.role != Role::Host || self.outcome.is_some() {
            return false;
        }
        if self.mode == Mode::Points {
            let left = consts::POINTS_ROUND_LENGTH.saturating_sub(now.saturating_sub(self.round_started));
            self.remaining = Some(left);
            if left.is_zero() {
                self.finish_points();
                return true;
            }
        }
        if now.saturating_sub(self.last_tick) >= self.tick {
            self.tick(now);
            true
        } else {
            false
        }
    }

    /// Move every live snake one cell, in player order
    pub(crate) fn tick(&mut self, now: Duration) {
        if self.outcome.is_some() {
            return;
        }
        self.last_tick = now;
        let ids = self.players.keys().copied().collect::<Vec<_>>();
        for id in ids {
            let Some(player) = self.players.get(&id).filter(|p| p.alive) else {
                continue;
            };
            let direction = player.next_direction;
            let head = player.snake.head().step(direction);
            let lethal = !self.bounds.contains(head)
                || player.snake.contains(head)
                || (!self.mode.is_ghost()
                    && self
                        .players
                        .iter()
                        .any(|(&other, p)| other != id && p.alive && p.snake.contains(head)));
            let ate = head == self.food;
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.direction = direction;
            if lethal {
                debug!("Player {id} crashed at ({}, {})", head.x, head.y);
                player.alive = false;
                continue;
            }
            player.snake.push_head(head);
            if ate {
                player.score += 1;
                self.place_food();
            } else {
                player.snake.pop_tail();
            }
        }
        self.check_end();
    }

    fn check_end(&mut self) {
        let alive = self
            .players
            .iter()
            .filter(|(_, p)| p.alive)
            .map(|(&id, _)| id)
            .collect::<Vec<_>>();
        match self.mode {
            Mode::Duel if alive.len() <= 1 => {
                let outcome = match alive.first() {
                    Some(&id) => {
                        if let Some(p) = self.players.get_mut(&id) {
                            p.round_wins += 1;
                        }
                        Outcome::Winner(id)
                    }
                    None => Outcome::Draw,
                };
                self.end_round(outcome);
            }
            Mode::Points if alive.is_empty() => self.finish_points(),
            _ => (),
        }
    }

    /// End a points round: the single highest score wins
    fn finish_points(&mut self) {
        let top = self.players.values().map(|p| p.score).max().unwrap_or(0);
        let mut leaders = self.players.iter().filter(|(_, p)| p.score == top);
        let outcome = match (leaders.next(), leaders.next()) {
            (Some((&id, _)), None) => Outcome::Winner(id),
            _ => Outcome::Draw,
        };
        self.end_round(outcome);
    }

    fn end_round(&mut self, outcome: Outcome) {
        info!("Arena round {} over: {outcome:?}", self.round);
        self.outcome = Some(outcome);
        self.rematch.clear();
    }

    /// Move the food to a random cell that no snake occupies.  If random
    /// probing fails, take the first free cell; if there is none, the food
    /// stays put.
    fn place_food(&mut self) {
        let occupied = |c: Cell, players: &BTreeMap<PlayerId, Player>| {
            players.values().any(|p| p.snake.contains(c))
        };
        for _ in 0..consts::ARENA_FOOD_ATTEMPTS {
            let c = self.bounds.random_cell(&mut self.rng);
            if !occupied(c, &self.players) {
                self.food = c;
                return;
            }
        }
        match self.bounds.cells().find(|&c| !occupied(c, &self.players)) {
            Some(c) => self.food = c,
            None => warn!("No free cell for arena food"),
        }
    }

    /// Record that `player` wants another round.  Once every player has
    /// agreed, the host starts the next round and `true` is returned.
    pub(crate) fn accept_rematch(&mut self, player: PlayerId, now: Duration) -> bool {
        if self.outcome.is_none() || !self.players.contains_key(&player) {
            return false;
        }
        self.rematch.insert(player);
        let unanimous = self.players.keys().all(|id| self.rematch.contains(id));
        if unanimous && self.role == Role::Host {
            self.start_round(now);
            true
        } else {
            false
        }
    }

    /// The message to send when `player` asks for a rematch: a request if
    /// nobody has asked yet, otherwise an acceptance
    pub(crate) fn rematch_message(&self, player: PlayerId) -> NetMessage {
        if self.rematch.is_empty() {
            NetMessage::RematchRequest { player }
        } else {
            NetMessage::RematchAccept { player }
        }
    }
}

impl<R> Arena<R> {
    /// Steer one of the players at this seat.  The change is applied
    /// immediately as a prediction; the returned message should be sent to
    /// the other peers.  Returns `None` if the turn is not allowed.
    pub(crate) fn steer_local(&mut self, player: PlayerId, direction: Direction) -> Option<NetMessage> {
        self.steer(player, direction)
            .then_some(NetMessage::Move { player, direction })
    }

    /// Apply a direction change received from another peer
    pub(crate) fn apply_remote_move(&mut self, player: PlayerId, direction: Direction) {
        if !self.steer(player, direction) {
            debug!("Ignoring move {direction:?} from player {player}");
        }
    }

    fn steer(&mut self, player: PlayerId, direction: Direction) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        match self.players.get_mut(&player) {
            Some(p) if p.alive && !direction.is_opposite(p.direction) => {
                p.next_direction = direction;
                true
            }
            _ => false,
        }
    }

    /// A plain, serializable copy of the authoritative state
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            players: self
                .players
                .iter()
                .map(|(&id, p)| (id, p.state()))
                .collect(),
            food: self.food,
            tick_ms: u64::try_from(self.tick.as_millis()).unwrap_or(u64::MAX),
            round: self.round,
            remaining_ms: self
                .remaining
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            outcome: self.outcome,
        }
    }

    /// Replace this arena's state with a snapshot from the host.  Nothing of
    /// the previous state survives, local predictions included.
    pub(crate) fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let mut players = BTreeMap::new();
        for (&id, state) in &snapshot.players {
            match Player::from_state(state) {
                Some(p) => {
                    players.insert(id, p);
                }
                None => warn!("Snapshot has an empty snake for player {id}"),
            }
        }
        if snapshot.round != self.round {
            self.rematch.clear();
        }
        self.players = players;
        self.mode = snapshot.mode;
        self.bounds = snapshot.mode.bounds();
        self.food = snapshot.food;
        self.tick = Duration::from_millis(snapshot.tick_ms);
        self.round = snapshot.round;
        self.remaining = snapshot.remaining_ms.map(Duration::from_millis);
        self.outcome = snapshot.outcome;
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    /// Time between the host's ticks
    pub(crate) fn tick_length(&self) -> Duration {
        self.tick
    }

    pub(crate) fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    pub(crate) fn food(&self) -> Cell {
        self.food
    }

    pub(crate) fn round(&self) -> u32 {
        self.round
    }

    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub(crate) fn wants_rematch(&self, player: PlayerId) -> bool {
        self.rematch.contains(&player)
    }

    /// Note a rematch vote seen on the wire without acting on it
    pub(crate) fn note_rematch(&mut self, player: PlayerId) {
        if self.outcome.is_some() {
            self.rematch.insert(player);
        }
    }
}
