//! Assorted constants & hard-coded configuration
use ratatui::{
    layout::Size,
    style::{Color, Modifier, Style},
};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Tick interval at the start of a session
pub(crate) const INITIAL_TICK: Duration = Duration::from_millis(110);

/// The tick interval never drops below this by eating food
pub(crate) const MIN_TICK: Duration = Duration::from_millis(60);

/// How much the tick interval shrinks each time food is eaten
pub(crate) const SPEED_STEP: Duration = Duration::from_millis(3);

/// Number of countdown steps shown before a session starts running
pub(crate) const COUNTDOWN_FROM: u8 = 3;

/// Length of each countdown step
pub(crate) const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Give up on placing food after this many random probes and declare the
/// board full
pub(crate) const FOOD_PLACEMENT_ATTEMPTS: usize = 2000;

/// Every time the score crosses a multiple of this, the obstacles are
/// regenerated and the snake is granted a short immunity
pub(crate) const OBSTACLE_SCORE_STEP: u32 = 10;

/// Immunity granted on crossing an [`OBSTACLE_SCORE_STEP`] multiple
pub(crate) const THRESHOLD_IMMUNITY: Duration = Duration::from_secs(5);

/// Length of the obstacle "glitch" transition, during which ticks are
/// suspended
pub(crate) const GLITCH_DURATION: Duration = Duration::from_millis(500);

/// Jitter amplitude (in cells) of the outgoing obstacle layout during a glitch
pub(crate) const GLITCH_OLD_JITTER: f64 = 0.3;

/// Initial jitter amplitude (in cells) of the incoming obstacle layout during
/// a glitch; it shrinks to zero as the transition completes
pub(crate) const GLITCH_NEW_JITTER: f64 = 0.4;

/// Length of each of the two bars in the static obstacle layout
pub(crate) const STATIC_BAR_LENGTH: i32 = 8;

/// Horizontal distance of the static bars from the center of the field
pub(crate) const STATIC_BAR_OFFSET: i32 = 5;

/// Number of clusters in a regenerated obstacle layout
pub(crate) const CLUSTER_QTY: RangeInclusive<u32> = 3..=6;

/// Width & height range of a single obstacle cluster
pub(crate) const CLUSTER_SIDE: RangeInclusive<i32> = 1..=4;

/// Clusters keep at least this many cells away from every edge
pub(crate) const CLUSTER_EDGE_MARGIN: i32 = 2;

/// Regenerated obstacles are never placed within this Chebyshev distance of
/// the snake's head
pub(crate) const HEAD_CLEARANCE: i32 = 3;

/// Time between power-up spawn attempts
pub(crate) const POWER_UP_SPAWN_INTERVAL: Duration = Duration::from_secs(20);

/// Uncollected power-ups disappear after this long
pub(crate) const POWER_UP_TTL: Duration = Duration::from_secs(10);

/// Give up on placing a power-up after this many random probes
pub(crate) const POWER_UP_PLACEMENT_ATTEMPTS: usize = 500;

/// The weight of the most recently spawned power-up kind is multiplied by
/// this when choosing the next one
pub(crate) const REPEAT_WEIGHT_FACTOR: f64 = 0.2;

/// SlowDown and Shrink never spawn before the score reaches this
pub(crate) const GATED_POWER_UP_SCORE: u32 = 25;

/// Tick interval multiplier while SlowDown is active
pub(crate) const SLOW_DOWN_FACTOR: f64 = 1.5;

/// Points lost when collecting a Bomb
pub(crate) const BOMB_PENALTY: u32 = 5;

/// Shrink only takes effect on snakes longer than this
pub(crate) const SHRINK_MIN_LENGTH: usize = 3;

/// While immunity is due to end but the head still overlaps an obstacle or
/// the body, check again after this long
pub(crate) const IMMUNITY_RECHECK: Duration = Duration::from_millis(100);

/// How long the eyes stay shut after eating
pub(crate) const BLINK_DURATION: Duration = Duration::from_millis(150);

/// How long the face reacts to an instant power-up
pub(crate) const REACTION_DURATION: Duration = Duration::from_millis(800);

/// Glow ramps up to full over this long after eating
pub(crate) const GLOW_RISE: Duration = Duration::from_millis(300);

/// Glow starts decaying this long after eating
pub(crate) const GLOW_HOLD: Duration = Duration::from_secs(2);

/// Glow decays back to nothing over this long
pub(crate) const GLOW_FALL: Duration = Duration::from_millis(500);

/// Number of final scores kept in the scores file
pub(crate) const SCORE_HISTORY_LENGTH: usize = 50;

/// Default size of the single-player field
pub(crate) const DEFAULT_BOARD_SIZE: Size = Size {
    width: 30,
    height: 20,
};

/// Field size for duels
pub(crate) const DUEL_BOARD_SIZE: i32 = 25;

/// Field size for points matches
pub(crate) const POINTS_BOARD_SIZE: i32 = 30;

/// Tick interval of the multiplayer arena
pub(crate) const ARENA_TICK: Duration = Duration::from_millis(100);

/// Length of a points-mode round
pub(crate) const POINTS_ROUND_LENGTH: Duration = Duration::from_secs(90);

/// Arena spawn points are inset this far from the corners
pub(crate) const ARENA_SPAWN_INSET: i32 = 3;

/// Maximum number of players in the arena
pub(crate) const MAX_ARENA_PLAYERS: usize = 4;

/// Give up on placing arena food after this many random probes
pub(crate) const ARENA_FOOD_ATTEMPTS: usize = 100;

/// Time between frames of the terminal front end
pub(crate) const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Particles drawn by the terminal front end fade after this long
pub(crate) const PARTICLE_LIFETIME: Duration = Duration::from_millis(300);

/// Draw everything inside a rectangle of this size in the center of the
/// terminal window.
///
/// Cf. [`crate::util::get_display_area()`]
pub(crate) const DISPLAY_SIZE: Size = Size {
    width: 80,
    height: 24,
};

/// Glyph for the snake's head when it is moving north/up
pub(crate) const SNAKE_HEAD_NORTH_SYMBOL: char = 'v';

/// Glyph for the snake's head when it is moving south/down
pub(crate) const SNAKE_HEAD_SOUTH_SYMBOL: char = '^';

/// Glyph for the snake's head when it is moving east/right
pub(crate) const SNAKE_HEAD_EAST_SYMBOL: char = '<';

/// Glyph for the snake's head when it is moving west/left
pub(crate) const SNAKE_HEAD_WEST_SYMBOL: char = '>';

/// Glyph for the snake's head while blinking
pub(crate) const SNAKE_HEAD_BLINK_SYMBOL: char = '-';

/// Glyph for the parts of the snake's body
pub(crate) const SNAKE_BODY_SYMBOL: char = '⚬';

/// Glyph for the food
pub(crate) const FOOD_SYMBOL: char = '●';

/// Glyph for obstacles
pub(crate) const OBSTACLE_SYMBOL: char = '█';

/// Glyph for obstacles that are fading in or out
pub(crate) const GLITCH_SYMBOL: char = '▒';

/// Glyph for particles
pub(crate) const PARTICLE_SYMBOL: char = '*';

/// Glyph for the snake's head when it's collided with an obstacle or wall
pub(crate) const COLLISION_SYMBOL: char = '×';

/// Base color of the snake; also used for the particles of shrunk segments
pub(crate) const SNAKE_COLOR: Color = Color::Green;

/// Color of the food and of the particles it bursts into when eaten
pub(crate) const FOOD_COLOR: Color = Color::LightRed;

/// Color of obstacles and of the particles they disperse into when cleared
pub(crate) const OBSTACLE_COLOR: Color = Color::Gray;

/// Style for the snake's head and body
pub(crate) const SNAKE_STYLE: Style = Style::new().fg(SNAKE_COLOR).add_modifier(Modifier::BOLD);

/// Style for the snake while glowing after a meal
pub(crate) const SNAKE_GLOW_STYLE: Style = Style::new()
    .fg(Color::LightGreen)
    .add_modifier(Modifier::BOLD);

/// Style for the snake while immune
pub(crate) const IMMUNE_STYLE: Style = Style::new()
    .fg(Color::White)
    .add_modifier(Modifier::BOLD)
    .add_modifier(Modifier::DIM);

/// Style for the food
pub(crate) const FOOD_STYLE: Style = Style::new().fg(FOOD_COLOR);

/// Style for obstacles
pub(crate) const OBSTACLE_STYLE: Style = Style::new().fg(OBSTACLE_COLOR);

/// Style for [`COLLISION_SYMBOL`]
pub(crate) const COLLISION_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::REVERSED);

/// Style for key codes shown in the interface
pub(crate) const KEY_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for the score bar at the top of the game screen
pub(crate) const SCORE_BAR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Style for the currently-selected menu item
pub(crate) const MENU_SELECTION_STYLE: Style = Style::new().add_modifier(Modifier::UNDERLINED);

/// Colors for arena players, in join order
pub(crate) const PLAYER_COLORS: [Color; MAX_ARENA_PLAYERS] =
    [Color::Cyan, Color::Magenta, Color::Yellow, Color::LightBlue];
