use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Facing as a unit step per axis; each component is -1, 0 or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Direction {
    pub x: i32,
    pub y: i32,
}

impl Direction {
    pub const ZERO: Self = Self { x: 0, y: 0 };
    pub const RIGHT: Self = Self { x: 1, y: 0 };
    pub const LEFT: Self = Self { x: -1, y: 0 };
    pub const DOWN: Self = Self { x: 0, y: 1 };
    pub const UP: Self = Self { x: 0, y: -1 };

    /// Evaluation order used when breaking pursuit ties.
    pub const CARDINALS: [Self; 4] = [Self::RIGHT, Self::LEFT, Self::DOWN, Self::UP];

    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x: x.signum(),
            y: y.signum(),
        }
    }

    pub fn reversed(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Wall,
    Pellet,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Speed,
    Invincible,
    ScoreBoost,
    SlowAdversaries,
    ExtraLife,
}

impl PowerUpKind {
    /// Whether collecting this kind leaves a timed effect behind.
    pub fn is_stackable(self) -> bool {
        !matches!(self, PowerUpKind::ExtraLife)
    }

    pub fn key(self) -> &'static str {
        match self {
            PowerUpKind::Speed => "speed",
            PowerUpKind::Invincible => "invincible",
            PowerUpKind::ScoreBoost => "score_boost",
            PowerUpKind::SlowAdversaries => "slow_adversaries",
            PowerUpKind::ExtraLife => "extra_life",
        }
    }

    pub fn color(self) -> PowerUpColor {
        match self {
            PowerUpKind::Speed => PowerUpColor::Blue,
            PowerUpKind::Invincible => PowerUpColor::Gold,
            PowerUpKind::ScoreBoost => PowerUpColor::Green,
            PowerUpKind::SlowAdversaries => PowerUpColor::Purple,
            PowerUpKind::ExtraLife => PowerUpColor::Pink,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpColor {
    Blue,
    Gold,
    Green,
    Purple,
    Pink,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdversaryColor {
    Red,
    Pink,
    Cyan,
    Orange,
}

/// Held movement keys for one tick. Opposite keys cancel out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerInput {
    pub right: bool,
    pub left: bool,
    pub down: bool,
    pub up: bool,
}

impl PlayerInput {
    pub fn toward(dir: Direction) -> Self {
        Self {
            right: dir.x > 0,
            left: dir.x < 0,
            down: dir.y > 0,
            up: dir.y < 0,
        }
    }

    pub fn axis(self) -> (f32, f32) {
        let x = self.right as i32 - self.left as i32;
        let y = self.down as i32 - self.up as i32;
        (x as f32, y as f32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    LivesExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetMode {
    Restart,
    Quit,
}

/// `Quit` is terminal: the caller is expected to stop driving the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Restarted,
    Quit,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdversaryView {
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub color: AdversaryColor,
}

#[derive(Clone, Debug, Serialize)]
pub struct PickupView {
    pub slot: usize,
    pub kind: PowerUpKind,
    pub color: PowerUpColor,
    pub row: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "spawnTick")]
    pub spawn_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActiveEffectView {
    pub kind: PowerUpKind,
    pub color: PowerUpColor,
    #[serde(rename = "ticksRemaining")]
    pub ticks_remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        row: usize,
        col: usize,
        points: i32,
    },
    PowerUpSpawned {
        slot: usize,
        kind: PowerUpKind,
        row: usize,
        col: usize,
    },
    PowerUpCollected {
        kind: PowerUpKind,
    },
    EffectExpired {
        kind: PowerUpKind,
    },
    LifeLost {
        #[serde(rename = "adversaryIndex")]
        adversary_index: usize,
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    AdversaryBounced {
        #[serde(rename = "adversaryIndex")]
        adversary_index: usize,
    },
    GameOver {
        reason: GameOverReason,
    },
    RoundReset,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: i32,
    pub lives: i32,
    #[serde(rename = "pelletsLeft")]
    pub pellets_left: usize,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(rename = "gameOverReason")]
    pub game_over_reason: Option<GameOverReason>,
    pub player: PlayerView,
    pub adversaries: Vec<AdversaryView>,
    pub pickups: Vec<PickupView>,
    #[serde(rename = "activeEffects")]
    pub active_effects: Vec<ActiveEffectView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PowerUpTally {
    pub speed: u32,
    pub invincible: u32,
    #[serde(rename = "scoreBoost")]
    pub score_boost: u32,
    #[serde(rename = "slowAdversaries")]
    pub slow_adversaries: u32,
    #[serde(rename = "extraLife")]
    pub extra_life: u32,
}

impl PowerUpTally {
    pub fn record(&mut self, kind: PowerUpKind) {
        let slot = match kind {
            PowerUpKind::Speed => &mut self.speed,
            PowerUpKind::Invincible => &mut self.invincible,
            PowerUpKind::ScoreBoost => &mut self.score_boost,
            PowerUpKind::SlowAdversaries => &mut self.slow_adversaries,
            PowerUpKind::ExtraLife => &mut self.extra_life,
        };
        *slot += 1;
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    pub ticks: u64,
    pub score: i32,
    pub lives: i32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
    #[serde(rename = "powerUpsCollected")]
    pub power_ups_collected: PowerUpTally,
}
