use super::*;

impl<R: RandomSource> GameSession<R> {
    pub(super) fn spawn_power_up(&mut self) {
        let outcome = self
            .powerups
            .spawn_attempt(&self.grid, &mut self.rng, self.tick_counter);
        if let SpawnOutcome::Spawned { slot, kind, cell } = outcome {
            self.events.push(RuntimeEvent::PowerUpSpawned {
                slot,
                kind,
                row: cell.row,
                col: cell.col,
            });
        }
    }

    /// Facings are kept; only positions go back to spawn.
    pub(super) fn respawn_actors(&mut self) {
        self.player = self.player_spawn;
        for adversary in &mut self.adversaries {
            adversary.position = adversary.spawn;
        }
    }

    pub(super) fn restart_round(&mut self) {
        self.grid.restore();
        self.pellets_left = self.grid.pellets_left();
        self.lives = self.options.starting_lives.max(0);
        self.score = 0;
        self.tick_counter = 0;
        self.game_over = (self.lives == 0).then_some(GameOverReason::LivesExhausted);
        self.stats = SessionStats::default();
        self.respawn_actors();
        for adversary in &mut self.adversaries {
            adversary.dir = random_heading(&mut self.rng);
        }
        self.powerups.initialize();
        self.events.push(RuntimeEvent::RoundReset);
    }
}
