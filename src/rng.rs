/// Uniform integer source consumed by the simulation core.
pub trait RandomSource {
    /// Returns an integer in `min..=max`; `min` when the range is empty.
    fn int(&mut self, min: i32, max: i32) -> i32;
}

/// Deterministic mulberry32 generator, so identical seeds replay identical rounds.
#[derive(Clone, Debug)]
pub struct SeededRng {
    seed: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }
}

impl RandomSource for SeededRng {
    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (min + (self.next_f32() * span).floor() as i32).min(max)
    }
}

impl RandomSource for rand::rngs::StdRng {
    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        rand::Rng::random_range(self, min..=max)
    }
}

/// Replays a fixed list of rolls, then answers `max` forever.
#[cfg(test)]
pub(crate) struct ScriptedRng {
    rolls: std::collections::VecDeque<i32>,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(rolls: &[i32]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn int(&mut self, min: i32, max: i32) -> i32 {
        let max = max.max(min);
        self.rolls
            .pop_front()
            .map(|roll| roll.clamp(min, max))
            .unwrap_or(max)
    }
}
