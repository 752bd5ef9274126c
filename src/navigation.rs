use crate::constants::{HALF_TILE, TILE_SIZE};
use crate::types::{AdversaryColor, AdversaryView, Direction, Vec2};
use crate::world::{tile_coords, TileGrid};

#[derive(Clone, Debug)]
pub struct Adversary {
    pub position: Vec2,
    pub dir: Direction,
    pub spawn: Vec2,
    pub color: AdversaryColor,
}

impl Adversary {
    pub fn view(&self, index: usize) -> AdversaryView {
        AdversaryView {
            index,
            x: self.position.x,
            y: self.position.y,
            dir: self.dir,
            color: self.color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Moved,
    Bounced,
}

/// True when `pos` sits exactly on a tile center.
pub fn is_at_decision_point(pos: Vec2) -> bool {
    pos.x.rem_euclid(TILE_SIZE) == HALF_TILE && pos.y.rem_euclid(TILE_SIZE) == HALF_TILE
}

/// Greedy one-step pursuit: the open, non-reversing neighbour whose center is
/// closest to the player. Keeps `current` when nothing qualifies.
pub fn choose_direction(
    position: Vec2,
    current: Direction,
    player_pos: Vec2,
    grid: &TileGrid,
) -> Direction {
    let (row, col) = tile_coords(position);
    let reverse = current.reversed();
    let mut best: Option<(Direction, f32)> = None;

    for candidate in Direction::CARDINALS {
        if candidate == reverse {
            continue;
        }
        let target_row = row + candidate.y;
        let target_col = col + candidate.x;
        if grid.is_blocked(target_row, target_col) {
            continue;
        }
        let center = Vec2::new(
            target_col as f32 * TILE_SIZE + HALF_TILE,
            target_row as f32 * TILE_SIZE + HALF_TILE,
        );
        let dist = center.distance_squared(player_pos);
        match best {
            Some((_, best_dist)) if best_dist <= dist => {}
            _ => best = Some((candidate, dist)),
        }
    }

    best.map_or(current, |(dir, _)| dir)
}

/// Advances one adversary by one tick. `speed` already carries any slowdown;
/// negative or NaN speeds hold the adversary in place.
pub fn step(adversary: &mut Adversary, player_pos: Vec2, grid: &TileGrid, speed: f32) -> Movement {
    let speed = speed.max(0.0);
    if is_at_decision_point(adversary.position) {
        adversary.dir = choose_direction(adversary.position, adversary.dir, player_pos, grid);
    }

    let next = Vec2::new(
        advance_axis(adversary.position.x, adversary.dir.x, speed),
        advance_axis(adversary.position.y, adversary.dir.y, speed),
    );
    if grid.is_blocked_at(next) {
        adversary.dir = adversary.dir.reversed();
        return Movement::Bounced;
    }
    adversary.position = next;
    Movement::Moved
}

// Stops on the next tile center ahead instead of stepping over it.
fn advance_axis(coord: f32, dir: i32, speed: f32) -> f32 {
    if dir == 0 {
        return coord;
    }
    let target = coord + dir as f32 * speed;
    let offset = (coord - HALF_TILE) / TILE_SIZE;
    if dir > 0 {
        let next_center = (offset.floor() + 1.0) * TILE_SIZE + HALF_TILE;
        target.min(next_center)
    } else {
        let next_center = (offset.ceil() - 1.0) * TILE_SIZE + HALF_TILE;
        target.max(next_center)
    }
}
