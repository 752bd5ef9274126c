use super::*;

impl<R: RandomSource> GameSession<R> {
    pub(super) fn move_player(&mut self, input: PlayerInput, speed: f32) {
        let (dx, dy) = input.axis();
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let next = Vec2::new(self.player.x + dx * speed, self.player.y + dy * speed);
        if !self.grid.is_blocked_at(next) {
            self.player = next;
        }
    }

    pub(super) fn consume_pellet(&mut self) {
        let Some(cell) = self.grid.cell_at(self.player) else {
            return;
        };
        if !self.grid.take_pellet(cell.row, cell.col) {
            return;
        }
        let points = PELLET_SCORE * self.powerups.score_multiplier();
        self.score += points;
        self.pellets_left = self.pellets_left.saturating_sub(1);
        self.stats.pellets_eaten += 1;
        self.events.push(RuntimeEvent::PelletEaten {
            row: cell.row,
            col: cell.col,
            points,
        });
    }

    pub(super) fn collect_power_up(&mut self) {
        let Some(kind) =
            self.powerups
                .check_collection(self.player, &mut self.score, &mut self.lives)
        else {
            return;
        };
        self.stats.power_ups.record(kind);
        self.events.push(RuntimeEvent::PowerUpCollected { kind });
    }
}
