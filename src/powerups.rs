use crate::constants::{
    EXTRA_LIFE_SCORE_BONUS, MAX_PICKUPS, PICKUP_RADIUS, POWERUP_DURATION_TICKS,
    POWERUP_SPAWN_CHANCE, SCORE_BOOST_MULTIPLIER, SLOW_ADVERSARY_MULTIPLIER,
    SPAWN_PLACEMENT_ATTEMPTS, SPEED_BOOST_MULTIPLIER,
};
use crate::rng::RandomSource;
use crate::types::{ActiveEffectView, PickupView, PowerUpKind, Tile, Vec2};
use crate::world::{Cell, TileGrid};

/// A power-up resting on the grid, waiting to be walked over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pickup {
    pub position: Vec2,
    pub cell: Cell,
    pub kind: PowerUpKind,
    pub spawn_tick: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub ticks_remaining: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    NotRolled,
    NoFreeSlot,
    NoPlacement,
    Spawned {
        slot: usize,
        kind: PowerUpKind,
        cell: Cell,
    },
}

/// Pickup slots on the grid plus the effects currently applied to the player.
#[derive(Clone, Debug)]
pub struct PowerUpEngine {
    slots: [Option<Pickup>; MAX_PICKUPS],
    active: Vec<ActiveEffect>,
}

impl Default for PowerUpEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerUpEngine {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_PICKUPS],
            active: Vec::with_capacity(4),
        }
    }

    pub fn initialize(&mut self) {
        self.slots = [None; MAX_PICKUPS];
        self.active.clear();
    }

    /// One spawn roll. Every outcome other than `Spawned` leaves state untouched.
    pub fn spawn_attempt<R: RandomSource>(
        &mut self,
        grid: &TileGrid,
        rng: &mut R,
        tick: u64,
    ) -> SpawnOutcome {
        if rng.int(1, POWERUP_SPAWN_CHANCE) != 1 {
            return SpawnOutcome::NotRolled;
        }
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return SpawnOutcome::NoFreeSlot;
        };
        let Some(cell) = find_empty_cell(grid, rng) else {
            return SpawnOutcome::NoPlacement;
        };

        let kind = match rng.int(1, 4) {
            1 => PowerUpKind::Speed,
            2 => PowerUpKind::Invincible,
            3 => PowerUpKind::ScoreBoost,
            _ => PowerUpKind::ExtraLife,
        };
        self.slots[slot] = Some(Pickup {
            position: cell.center(),
            cell,
            kind,
            spawn_tick: tick,
        });
        SpawnOutcome::Spawned { slot, kind, cell }
    }

    /// Collects at most one pickup: the first slot within reach of the player.
    pub fn check_collection(
        &mut self,
        player_pos: Vec2,
        score: &mut i32,
        lives: &mut i32,
    ) -> Option<PowerUpKind> {
        let (slot, kind) = self.slots.iter().enumerate().find_map(|(slot, pickup)| {
            pickup
                .filter(|p| p.position.distance(player_pos) < PICKUP_RADIUS)
                .map(|p| (slot, p.kind))
        })?;
        self.apply(kind, score, lives);
        self.slots[slot] = None;
        Some(kind)
    }

    pub fn apply(&mut self, kind: PowerUpKind, score: &mut i32, lives: &mut i32) {
        match kind {
            PowerUpKind::Speed
            | PowerUpKind::Invincible
            | PowerUpKind::ScoreBoost
            | PowerUpKind::SlowAdversaries => self.add_active(kind, POWERUP_DURATION_TICKS),
            PowerUpKind::ExtraLife => {
                *lives += 1;
                *score += EXTRA_LIFE_SCORE_BONUS;
            }
        }
    }

    /// Inserts an effect, or refreshes the existing entry of the same kind.
    pub fn add_active(&mut self, kind: PowerUpKind, duration: u32) {
        if !kind.is_stackable() {
            return;
        }
        if let Some(effect) = self.active.iter_mut().find(|e| e.kind == kind) {
            effect.ticks_remaining = duration;
            return;
        }
        self.active.push(ActiveEffect {
            kind,
            ticks_remaining: duration,
        });
    }

    /// Counts every effect down by one tick and returns the kinds that ran out.
    pub fn tick(&mut self) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        self.active.retain_mut(|effect| {
            effect.ticks_remaining = effect.ticks_remaining.saturating_sub(1);
            if effect.ticks_remaining == 0 {
                expired.push(effect.kind);
                return false;
            }
            true
        });
        expired
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    pub fn speed_multiplier(&self) -> f32 {
        if self.is_active(PowerUpKind::Speed) {
            SPEED_BOOST_MULTIPLIER
        } else {
            1.0
        }
    }

    pub fn score_multiplier(&self) -> i32 {
        if self.is_active(PowerUpKind::ScoreBoost) {
            SCORE_BOOST_MULTIPLIER
        } else {
            1
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.is_active(PowerUpKind::Invincible)
    }

    pub fn adversary_speed_multiplier(&self) -> f32 {
        if self.is_active(PowerUpKind::SlowAdversaries) {
            SLOW_ADVERSARY_MULTIPLIER
        } else {
            1.0
        }
    }

    pub fn modified_speed(&self, base: f32) -> f32 {
        base * self.speed_multiplier()
    }

    pub fn adversary_speed(&self, base: f32) -> f32 {
        base * self.adversary_speed_multiplier()
    }

    pub fn pickups(&self) -> impl Iterator<Item = (usize, &Pickup)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, pickup)| pickup.as_ref().map(|p| (slot, p)))
    }

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active
    }

    pub fn pickup_views(&self) -> Vec<PickupView> {
        self.pickups()
            .map(|(slot, p)| PickupView {
                slot,
                kind: p.kind,
                color: p.kind.color(),
                row: p.cell.row,
                col: p.cell.col,
                x: p.position.x,
                y: p.position.y,
                spawn_tick: p.spawn_tick,
            })
            .collect()
    }

    pub fn active_effect_views(&self) -> Vec<ActiveEffectView> {
        self.active
            .iter()
            .map(|e| ActiveEffectView {
                kind: e.kind,
                color: e.kind.color(),
                ticks_remaining: e.ticks_remaining,
            })
            .collect()
    }

    /// Places a pickup directly, bypassing the spawn roll. Returns false when every slot is taken.
    pub fn place(&mut self, cell: Cell, kind: PowerUpKind, tick: u64) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) else {
            return false;
        };
        *slot = Some(Pickup {
            position: cell.center(),
            cell,
            kind,
            spawn_tick: tick,
        });
        true
    }
}

fn find_empty_cell<R: RandomSource>(grid: &TileGrid, rng: &mut R) -> Option<Cell> {
    let max_row = grid.rows() as i32 - 2;
    let max_col = grid.cols() as i32 - 2;
    for _ in 0..SPAWN_PLACEMENT_ATTEMPTS {
        let row = rng.int(1, max_row);
        let col = rng.int(1, max_col);
        if grid.tile_at(row, col) == Some(Tile::Empty) {
            return Some(Cell {
                row: row as usize,
                col: col as usize,
            });
        }
    }
    None
}
