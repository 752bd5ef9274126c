use crate::rng::RandomSource;
use crate::types::Direction;

const HEADING_ATTEMPTS: u32 = 16;

/// Uniform over the eight non-zero headings; the zero vector is rerolled.
pub(super) fn random_heading<R: RandomSource>(rng: &mut R) -> Direction {
    for _ in 0..HEADING_ATTEMPTS {
        let dir = Direction::new(rng.int(-1, 1), rng.int(-1, 1));
        if !dir.is_zero() {
            return dir;
        }
    }
    Direction::new(1, 1)
}
