use serde::Deserialize;
use thiserror::Error;

use crate::constants::{
    adversary_color, ADVERSARY_BASE_SPEED, ADVERSARY_COLLISION_RADIUS, MAX_ADVERSARIES,
    MAX_BASE_SPEED, PELLET_SCORE, PLAYER_BASE_SPEED, STARTING_LIVES,
};
use crate::navigation::{self, Adversary, Movement};
use crate::powerups::{PowerUpEngine, SpawnOutcome};
use crate::rng::{RandomSource, SeededRng};
use crate::types::{
    GameOverReason, GameSummary, PlayerInput, PlayerView, PowerUpTally, ResetMode, ResetOutcome,
    RuntimeEvent, Snapshot, Vec2,
};
use crate::world::{Level, TileGrid};

mod adversary_system;
mod player_system;
mod spawn_system;
mod utils;

use self::utils::random_heading;

/// Tunables a caller may override per session; missing keys fall back to defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameOptions {
    pub starting_lives: i32,
    pub player_base_speed: f32,
    pub adversary_base_speed: f32,
    pub max_adversaries: usize,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            player_base_speed: PLAYER_BASE_SPEED,
            adversary_base_speed: ADVERSARY_BASE_SPEED,
            max_adversaries: MAX_ADVERSARIES,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("startingLives must be at least 1, got {0}")]
    StartingLives(i32),
    #[error("{name} must be above 0 and at most {max}, got {value}")]
    Speed {
        name: &'static str,
        value: f32,
        max: f32,
    },
}

impl GameOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.starting_lives < 1 {
            return Err(OptionsError::StartingLives(self.starting_lives));
        }
        check_speed("playerBaseSpeed", self.player_base_speed)?;
        check_speed("adversaryBaseSpeed", self.adversary_base_speed)
    }
}

fn check_speed(name: &'static str, value: f32) -> Result<(), OptionsError> {
    // NaN fails both comparisons.
    if value > 0.0 && value <= MAX_BASE_SPEED {
        return Ok(());
    }
    Err(OptionsError::Speed {
        name,
        value,
        max: MAX_BASE_SPEED,
    })
}

#[derive(Clone, Debug, Default)]
struct SessionStats {
    pellets_eaten: u32,
    lives_lost: u32,
    power_ups: PowerUpTally,
}

/// One round of play: grid, actors, power-ups and the random source that drives them.
#[derive(Clone, Debug)]
pub struct GameSession<R: RandomSource = SeededRng> {
    pub options: GameOptions,

    grid: TileGrid,
    rng: R,
    powerups: PowerUpEngine,
    player: Vec2,
    player_spawn: Vec2,
    adversaries: Vec<Adversary>,

    score: i32,
    lives: i32,
    tick_counter: u64,
    pellets_left: usize,
    game_over: Option<GameOverReason>,
    events: Vec<RuntimeEvent>,
    stats: SessionStats,
}

impl<R: RandomSource> GameSession<R> {
    pub fn new(level: Level, options: GameOptions, mut rng: R) -> Self {
        let adversaries = level
            .adversary_spawns
            .iter()
            .take(options.max_adversaries)
            .enumerate()
            .map(|(index, cell)| Adversary {
                position: cell.center(),
                dir: random_heading(&mut rng),
                spawn: cell.center(),
                color: adversary_color(index),
            })
            .collect();
        let pellets_left = level.grid.pellets_left();
        let lives = options.starting_lives.max(0);

        Self {
            lives,
            options,
            grid: level.grid,
            rng,
            powerups: PowerUpEngine::new(),
            player: level.player_spawn.center(),
            player_spawn: level.player_spawn.center(),
            adversaries,
            score: 0,
            tick_counter: 0,
            pellets_left,
            game_over: (lives == 0).then_some(GameOverReason::LivesExhausted),
            events: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    /// Advances the round by one tick. Does nothing once the game is over.
    ///
    /// Events pile up until `build_snapshot(true)` drains them, so a caller that never
    /// asks for them should still drain periodically.
    pub fn step(&mut self, input: PlayerInput) {
        if self.game_over.is_some() {
            return;
        }
        self.tick_counter += 1;

        for kind in self.powerups.tick() {
            self.events.push(RuntimeEvent::EffectExpired { kind });
        }
        self.spawn_power_up();

        let speed = self
            .powerups
            .modified_speed(self.options.player_base_speed.max(0.0));
        self.move_player(input, speed);
        self.consume_pellet();
        self.collect_power_up();
        if self.pellets_left == 0 {
            self.finish(GameOverReason::Victory);
            return;
        }

        self.update_adversaries();
        self.resolve_collisions();
    }

    /// `Quit` leaves every field as it is and tells the caller to stop.
    pub fn reset(&mut self, mode: ResetMode) -> ResetOutcome {
        match mode {
            ResetMode::Restart => {
                self.restart_round();
                ResetOutcome::Restarted
            }
            ResetMode::Quit => ResetOutcome::Quit,
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            score: self.score,
            lives: self.lives,
            pellets_left: self.pellets_left,
            game_over: self.game_over.is_some(),
            game_over_reason: self.game_over,
            player: PlayerView {
                x: self.player.x,
                y: self.player.y,
            },
            adversaries: self
                .adversaries
                .iter()
                .enumerate()
                .map(|(index, adversary)| adversary.view(index))
                .collect(),
            pickups: self.powerups.pickup_views(),
            active_effects: self.powerups.active_effect_views(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.game_over,
            ticks: self.tick_counter,
            score: self.score,
            lives: self.lives,
            pellets_eaten: self.stats.pellets_eaten,
            lives_lost: self.stats.lives_lost,
            power_ups_collected: self.stats.power_ups.clone(),
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn powerups(&self) -> &PowerUpEngine {
        &self.powerups
    }

    pub fn player_position(&self) -> Vec2 {
        self.player
    }

    pub fn adversaries(&self) -> &[Adversary] {
        &self.adversaries
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn pellets_left(&self) -> usize {
        self.pellets_left
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over
    }

    fn finish(&mut self, reason: GameOverReason) {
        self.game_over = Some(reason);
        self.events.push(RuntimeEvent::GameOver { reason });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rng::ScriptedRng;
    use crate::types::{Direction, PowerUpKind};
    use crate::world::{default_level, parse_layout, tile_coords, Cell};

    const CORRIDOR: [&str; 3] = ["#########", "#P.....G#", "#########"];

    fn corridor_session(options: GameOptions) -> GameSession<ScriptedRng> {
        let level = parse_layout(&CORRIDOR).expect("corridor parses");
        GameSession::new(level, options, ScriptedRng::new(&[]))
    }

    fn right() -> PlayerInput {
        PlayerInput::toward(Direction::RIGHT)
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let options = GameOptions::default();
        let mut a = GameSession::new(
            default_level().expect("default layout parses"),
            options.clone(),
            SeededRng::new(424_242),
        );
        let mut b = GameSession::new(
            default_level().expect("default layout parses"),
            options,
            SeededRng::new(424_242),
        );
        let mut inputs = SeededRng::new(5);

        for _ in 0..2_000 {
            let dir = Direction::CARDINALS[inputs.int(0, 3) as usize];
            a.step(PlayerInput::toward(dir));
            b.step(PlayerInput::toward(dir));
            let sa = serde_json::to_string(&a.build_snapshot(true)).expect("snapshot serializes");
            let sb = serde_json::to_string(&b.build_snapshot(true)).expect("snapshot serializes");
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn new_session_starts_from_spawns() {
        let session = corridor_session(GameOptions::default());
        assert_eq!(session.player_position(), Vec2::new(60.0, 60.0));
        assert_eq!(session.lives(), STARTING_LIVES);
        assert_eq!(session.pellets_left(), 5);
        assert_eq!(session.adversaries().len(), 1);
        assert_eq!(session.adversaries()[0].position, Vec2::new(300.0, 60.0));
        assert_eq!(session.adversaries()[0].dir, Direction::new(1, 1));
    }

    #[test]
    fn adversary_count_is_capped_by_options() {
        let level = default_level().expect("default layout parses");
        let options = GameOptions {
            max_adversaries: 2,
            ..GameOptions::default()
        };
        let session = GameSession::new(level, options, SeededRng::new(1));
        assert_eq!(session.adversaries().len(), 2);
    }

    #[test]
    fn slow_adversaries_collected_this_tick_slows_adversaries_this_tick() {
        let mut session = corridor_session(GameOptions::default());
        assert!(session
            .powerups
            .place(Cell { row: 1, col: 1 }, PowerUpKind::SlowAdversaries, 0));

        session.step(PlayerInput::default());

        assert!(session.powerups().is_active(PowerUpKind::SlowAdversaries));
        assert_eq!(session.adversaries()[0].position, Vec2::new(299.0, 60.0));
        assert_eq!(session.adversaries()[0].dir, Direction::LEFT);
    }

    #[test]
    fn effect_expiring_this_tick_no_longer_boosts_movement() {
        let mut session = corridor_session(GameOptions::default());
        session.powerups.add_active(PowerUpKind::Speed, 1);

        session.step(right());

        assert!(!session.powerups().is_active(PowerUpKind::Speed));
        assert_eq!(session.player_position(), Vec2::new(62.0, 60.0));
        let snapshot = session.build_snapshot(true);
        assert!(snapshot.events.contains(&RuntimeEvent::EffectExpired {
            kind: PowerUpKind::Speed
        }));
    }

    #[test]
    fn speed_boost_scales_player_movement() {
        let mut session = corridor_session(GameOptions::default());
        session.powerups.add_active(PowerUpKind::Speed, 300);
        session.step(right());
        assert_eq!(session.player_position(), Vec2::new(63.0, 60.0));
    }

    #[test]
    fn score_boost_doubles_pellet_value() {
        let mut session = corridor_session(GameOptions::default());
        session.powerups.add_active(PowerUpKind::ScoreBoost, 300);

        for _ in 0..10 {
            session.step(right());
        }

        assert_eq!(session.player_position(), Vec2::new(80.0, 60.0));
        assert_eq!(session.score(), PELLET_SCORE * 2);
        assert_eq!(session.pellets_left(), 4);
    }

    #[test]
    fn player_cannot_walk_into_walls() {
        let mut session = corridor_session(GameOptions::default());
        for _ in 0..30 {
            session.step(PlayerInput::toward(Direction::UP));
        }
        assert_eq!(session.player_position(), Vec2::new(60.0, 40.0));
        for _ in 0..30 {
            session.step(PlayerInput::toward(Direction::LEFT));
        }
        assert_eq!(session.player_position(), Vec2::new(40.0, 40.0));
    }

    #[test]
    fn collision_costs_a_life_and_respawns_actors() {
        let mut session = corridor_session(GameOptions::default());
        session.powerups.add_active(PowerUpKind::ScoreBoost, 300);
        session.player = Vec2::new(280.0, 60.0);

        session.step(PlayerInput::default());

        assert_eq!(session.lives(), STARTING_LIVES - 1);
        assert!(!session.is_game_over());
        assert_eq!(session.player_position(), Vec2::new(60.0, 60.0));
        assert_eq!(session.adversaries()[0].position, Vec2::new(300.0, 60.0));
        assert!(session.powerups().is_active(PowerUpKind::ScoreBoost));
        let snapshot = session.build_snapshot(true);
        assert!(snapshot.events.contains(&RuntimeEvent::LifeLost {
            adversary_index: 0,
            lives_left: STARTING_LIVES - 1,
        }));
        assert_eq!(session.build_summary().lives_lost, 1);
    }

    #[test]
    fn invincible_player_ignores_collisions() {
        let mut session = corridor_session(GameOptions::default());
        session.powerups.add_active(PowerUpKind::Invincible, 300);
        session.player = Vec2::new(280.0, 60.0);

        session.step(PlayerInput::default());

        assert_eq!(session.lives(), STARTING_LIVES);
        assert_eq!(session.player_position(), Vec2::new(280.0, 60.0));
        assert_eq!(session.adversaries()[0].position, Vec2::new(298.0, 60.0));
    }

    #[test]
    fn last_life_ends_the_game_and_freezes_ticks() {
        let mut session = corridor_session(GameOptions {
            starting_lives: 1,
            ..GameOptions::default()
        });
        session.player = Vec2::new(280.0, 60.0);

        session.step(PlayerInput::default());
        assert_eq!(session.lives(), 0);
        assert_eq!(
            session.game_over_reason(),
            Some(GameOverReason::LivesExhausted)
        );

        let tick = session.tick();
        let position = session.player_position();
        session.step(right());
        assert_eq!(session.tick(), tick);
        assert_eq!(session.player_position(), position);
        let snapshot = session.build_snapshot(true);
        assert!(snapshot.game_over);
        assert!(snapshot.events.contains(&RuntimeEvent::GameOver {
            reason: GameOverReason::LivesExhausted
        }));
    }

    #[test]
    fn eating_last_pellet_wins_the_round() {
        let level = parse_layout(&["#######", "#P.   #", "#     #", "#    G#", "#######"])
            .expect("layout parses");
        let mut session = GameSession::new(level, GameOptions::default(), ScriptedRng::new(&[]));

        for _ in 0..10 {
            session.step(right());
        }

        assert_eq!(session.pellets_left(), 0);
        assert_eq!(session.game_over_reason(), Some(GameOverReason::Victory));
        assert_eq!(session.build_summary().pellets_eaten, 1);
    }

    #[test]
    fn restart_restores_the_round() {
        let mut session = corridor_session(GameOptions::default());
        assert!(session
            .powerups
            .place(Cell { row: 1, col: 3 }, PowerUpKind::Speed, 0));
        session.powerups.add_active(PowerUpKind::Invincible, 300);
        for _ in 0..12 {
            session.step(right());
        }
        assert!(session.score() > 0);
        assert!(session.pellets_left() < 5);
        session.lives = 1;

        assert_eq!(session.reset(ResetMode::Restart), ResetOutcome::Restarted);

        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), STARTING_LIVES);
        assert_eq!(session.tick(), 0);
        assert_eq!(session.pellets_left(), 5);
        assert_eq!(session.grid().pellets_left(), 5);
        assert_eq!(session.player_position(), Vec2::new(60.0, 60.0));
        assert_eq!(session.adversaries()[0].position, Vec2::new(300.0, 60.0));
        assert!(!session.adversaries()[0].dir.is_zero());
        assert_eq!(session.powerups().pickups().count(), 0);
        assert!(session.powerups().active_effects().is_empty());
        assert!(!session.is_game_over());
    }

    #[test]
    fn restart_clears_game_over() {
        let mut session = corridor_session(GameOptions {
            starting_lives: 1,
            ..GameOptions::default()
        });
        session.player = Vec2::new(280.0, 60.0);
        session.step(PlayerInput::default());
        assert!(session.is_game_over());

        session.reset(ResetMode::Restart);
        session.step(right());

        assert!(!session.is_game_over());
        assert_eq!(session.tick(), 1);
        assert_eq!(session.player_position(), Vec2::new(62.0, 60.0));
    }

    #[test]
    fn quit_leaves_state_untouched() {
        let mut session = corridor_session(GameOptions::default());
        for _ in 0..10 {
            session.step(right());
        }
        session.build_snapshot(true);
        let before = serde_json::to_string(&session.build_snapshot(true)).expect("serializes");

        assert_eq!(session.reset(ResetMode::Quit), ResetOutcome::Quit);

        let after = serde_json::to_string(&session.build_snapshot(true)).expect("serializes");
        assert_eq!(before, after);
    }

    #[test]
    fn zero_heading_is_rerolled() {
        let level = parse_layout(&CORRIDOR).expect("corridor parses");
        let rng = ScriptedRng::new(&[0, 0, 0, 0, -1, 1]);
        let session = GameSession::new(level, GameOptions::default(), rng);
        assert_eq!(session.adversaries()[0].dir, Direction::new(-1, 1));
    }

    #[test]
    fn snapshot_drains_events_only_when_asked() {
        let mut session = corridor_session(GameOptions::default());
        for _ in 0..10 {
            session.step(right());
        }
        assert!(session.build_snapshot(false).events.is_empty());
        let events = session.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PelletEaten {
            row: 1,
            col: 2,
            points: PELLET_SCORE,
        }));
        assert!(session.build_snapshot(true).events.is_empty());
    }

    #[test]
    fn options_validation_rejects_out_of_range_values() {
        assert_eq!(GameOptions::default().validate(), Ok(()));
        let lives = GameOptions {
            starting_lives: 0,
            ..GameOptions::default()
        };
        assert_eq!(lives.validate(), Err(OptionsError::StartingLives(0)));
        for bad in [-3.0, 0.0, f32::NAN, MAX_BASE_SPEED + 1.0] {
            let options = GameOptions {
                adversary_base_speed: bad,
                ..GameOptions::default()
            };
            assert!(matches!(
                options.validate(),
                Err(OptionsError::Speed {
                    name: "adversaryBaseSpeed",
                    ..
                })
            ));
        }
        let player = GameOptions {
            player_base_speed: -1.0,
            ..GameOptions::default()
        };
        assert!(player.validate().is_err());
    }

    #[test]
    fn unvalidated_options_keep_lives_and_adversaries_sane() {
        let options: GameOptions =
            serde_json::from_str(r#"{"startingLives": -2, "adversaryBaseSpeed": -3.0}"#)
                .expect("options parse");
        let mut session = corridor_session(options);

        assert_eq!(session.lives(), 0);
        assert_eq!(
            session.game_over_reason(),
            Some(GameOverReason::LivesExhausted)
        );

        session.game_over = None;
        for _ in 0..5 {
            session.step(PlayerInput::default());
        }
        assert!(session.lives() >= 0);
        assert_eq!(session.adversaries()[0].position, Vec2::new(300.0, 60.0));
    }

    #[test]
    fn odd_offset_after_slowdown_still_reaches_decision_points() {
        let mut session = corridor_session(GameOptions::default());
        session.powerups.add_active(PowerUpKind::SlowAdversaries, 2);

        session.step(PlayerInput::default());
        assert_eq!(session.adversaries()[0].position, Vec2::new(299.0, 60.0));
        session.step(PlayerInput::default());
        assert!(!session.powerups().is_active(PowerUpKind::SlowAdversaries));
        assert_eq!(session.adversaries()[0].position, Vec2::new(297.0, 60.0));

        for _ in 0..19 {
            session.step(PlayerInput::default());
        }
        let position = session.adversaries()[0].position;
        assert_eq!(position, Vec2::new(260.0, 60.0));
        assert!(navigation::is_at_decision_point(position));
        session.step(PlayerInput::default());
        assert_eq!(session.adversaries()[0].position, Vec2::new(258.0, 60.0));
    }

    #[test]
    fn wall_bounce_is_reported_as_event() {
        let level = parse_layout(&["#######", "#P...G#", "#######"]).expect("layout parses");
        let rng = ScriptedRng::new(&[1, 0]);
        let mut session = GameSession::new(level, GameOptions::default(), rng);
        assert_eq!(session.adversaries()[0].dir, Direction::RIGHT);

        for _ in 0..10 {
            session.step(PlayerInput::default());
        }

        assert_eq!(session.adversaries()[0].dir, Direction::LEFT);
        assert_eq!(session.adversaries()[0].position, Vec2::new(238.0, 60.0));
        let events = session.build_snapshot(true).events;
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, RuntimeEvent::AdversaryBounced { .. }))
                .count(),
            1
        );
        assert!(events.contains(&RuntimeEvent::AdversaryBounced { adversary_index: 0 }));
    }

    #[test]
    fn invariants_hold_over_long_runs() {
        for seed in [1_u32, 7, 99, 2_024] {
            let level = default_level().expect("default layout parses");
            let mut session = GameSession::new(level, GameOptions::default(), SeededRng::new(seed));
            let mut inputs = SeededRng::new(seed ^ 0x5a5a);
            let mut dir = Direction::RIGHT;

            for tick in 0..6_000 {
                if tick % 45 == 0 {
                    dir = Direction::CARDINALS[inputs.int(0, 3) as usize];
                }
                session.step(PlayerInput::toward(dir));

                let kinds: HashSet<PowerUpKind> = session
                    .powerups()
                    .active_effects()
                    .iter()
                    .map(|effect| effect.kind)
                    .collect();
                assert_eq!(kinds.len(), session.powerups().active_effects().len());
                assert!(session.lives() >= 0);
                for adversary in session.adversaries() {
                    assert!(!session.grid().is_blocked_at(adversary.position));
                }
                assert!(!session.grid().is_blocked_at(session.player_position()));
                for (_, pickup) in session.powerups().pickups() {
                    let (row, col) = tile_coords(pickup.position);
                    assert!(!session.grid().is_blocked(row, col));
                }
                if session.is_game_over() {
                    session.reset(ResetMode::Restart);
                }
            }
        }
    }
}
