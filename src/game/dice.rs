//! Randomness used by combat.
//!
//! Combat never touches an RNG directly: it asks a `Dice` for rolls so tests
//! and replays can script every outcome.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

pub trait Dice {
    /// Uniform integer in `[1, faces]`. A die with no faces rolls 1.
    fn roll(&mut self, faces: u32) -> u32;

    /// Uniform float in `[0, 1)`, used for escape attempts.
    fn draw(&mut self) -> f64;
}

#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Access to the underlying RNG for setup work (seating, teams, random items).
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for RandomDice {
    fn default() -> Self {
        Self::new()
    }
}

impl Dice for RandomDice {
    fn roll(&mut self, faces: u32) -> u32 {
        self.rng.random_range(1..=faces.max(1))
    }

    fn draw(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Dice returning queued values, falling back to fixed ones once empty.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedDice {
    pub rolls: std::collections::VecDeque<u32>,
    pub draws: std::collections::VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedDice {
    pub fn with_rolls(rolls: &[u32]) -> Self {
        Self { rolls: rolls.iter().copied().collect(), draws: Default::default() }
    }

    pub fn with_draws(draws: &[f64]) -> Self {
        Self { rolls: Default::default(), draws: draws.iter().copied().collect() }
    }
}

#[cfg(test)]
impl Dice for ScriptedDice {
    fn roll(&mut self, faces: u32) -> u32 {
        self.rolls.pop_front().unwrap_or(1).clamp(1, faces.max(1))
    }

    fn draw(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(0.99)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolls_stay_in_range() {
        let mut dice = RandomDice::seeded(42);
        for faces in [1, 4, 6] {
            for _ in 0..200 {
                let roll = dice.roll(faces);
                assert!((1..=faces).contains(&roll));
            }
        }
        assert_eq!(dice.roll(0), 1);
    }

    #[test]
    fn test_seeded_dice_are_reproducible() {
        let mut a = RandomDice::seeded(3);
        let mut b = RandomDice::seeded(3);
        let left: Vec<u32> = (0..10).map(|_| a.roll(6)).collect();
        let right: Vec<u32> = (0..10).map(|_| b.roll(6)).collect();
        assert_eq!(left, right);
    }
}
