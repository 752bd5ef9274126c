use crate::types::AdversaryColor;

pub const TICK_RATE: u32 = 60;

pub const TILE_SIZE: f32 = 40.0;
pub const HALF_TILE: f32 = TILE_SIZE / 2.0;

pub const STARTING_LIVES: i32 = 3;
pub const PELLET_SCORE: i32 = 10;

pub const PLAYER_BASE_SPEED: f32 = 2.0;
pub const ADVERSARY_BASE_SPEED: f32 = 2.0;
pub const MAX_BASE_SPEED: f32 = HALF_TILE;
pub const ADVERSARY_COLLISION_RADIUS: f32 = 20.0;
pub const MAX_ADVERSARIES: usize = 4;

pub const MAX_PICKUPS: usize = 3;
pub const POWERUP_SPAWN_CHANCE: i32 = 100;
pub const SPAWN_PLACEMENT_ATTEMPTS: u32 = 100;
pub const PICKUP_RADIUS: f32 = 25.0;
pub const POWERUP_DURATION_TICKS: u32 = 300;
pub const EXTRA_LIFE_SCORE_BONUS: i32 = 100;

pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;
pub const SCORE_BOOST_MULTIPLIER: i32 = 2;
pub const SLOW_ADVERSARY_MULTIPLIER: f32 = 0.5;

pub fn adversary_color(index: usize) -> AdversaryColor {
    match index % 4 {
        0 => AdversaryColor::Red,
        1 => AdversaryColor::Pink,
        2 => AdversaryColor::Cyan,
        _ => AdversaryColor::Orange,
    }
}
