use super::*;

impl<R: RandomSource> GameSession<R> {
    pub(super) fn update_adversaries(&mut self) {
        let speed = self
            .powerups
            .adversary_speed(self.options.adversary_base_speed);
        for (index, adversary) in self.adversaries.iter_mut().enumerate() {
            if navigation::step(adversary, self.player, &self.grid, speed) == Movement::Bounced {
                self.events.push(RuntimeEvent::AdversaryBounced {
                    adversary_index: index,
                });
            }
        }
    }

    /// First adversary in array order within reach costs a life; the rest are not checked.
    pub(super) fn resolve_collisions(&mut self) {
        if self.powerups.is_invincible() {
            return;
        }
        let Some(index) = self.adversaries.iter().position(|adversary| {
            adversary.position.distance(self.player) < ADVERSARY_COLLISION_RADIUS
        }) else {
            return;
        };

        self.lives = (self.lives - 1).max(0);
        self.stats.lives_lost += 1;
        self.events.push(RuntimeEvent::LifeLost {
            adversary_index: index,
            lives_left: self.lives,
        });
        self.respawn_actors();
        if self.lives == 0 {
            self.finish(GameOverReason::LivesExhausted);
        }
    }
}
