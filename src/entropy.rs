//! Entropy used to roll dice.

use num_traits::{Num, One};
use std::fmt::Debug;

/// Rules deciding the face every die lands on.
///
/// Keeping entropy behind a trait makes it possible to swap a seeded pseudo random generator
/// for a fixed rule, so that rolls become fully predictable.
pub trait EntropyRules {
    /// See [Seed](type.Seed.html).
    type Seed: Clone + Debug;

    /// See [Model](type.Model.html).
    type Model;

    /// Type of the faces.
    type Face: PartialOrd + Copy + Num + Debug;

    /// Builds the generator state, starting from an optional seed.
    fn model(&self, seed: Option<Self::Seed>) -> Self::Model;

    /// Returns the face shown by a die with `faces` faces, between one and `faces` included.
    ///
    /// `faces` is always at least one.
    fn face(&self, model: &mut Self::Model, faces: Self::Face) -> Self::Face;
}

/// Seed used to bootstrap the generator of some entropy rules.
pub type Seed<E> = <E as EntropyRules>::Seed;

/// State of the generator of some entropy rules.
pub type Model<E> = <E as EntropyRules>::Model;

/// A set of entropy rules together with the state of their generator.
pub struct Entropy<E: EntropyRules> {
    model: E::Model,
    rules: E,
    rolled: u64,
}

impl<E: EntropyRules> Entropy<E> {
    /// Creates a new entropy source.
    pub fn new(seed: Option<E::Seed>, rules: E) -> Self {
        Self {
            model: rules.model(seed),
            rules,
            rolled: 0,
        }
    }

    /// Restarts the generator from a new seed.
    pub fn reseed(&mut self, seed: Option<E::Seed>) {
        self.model = self.rules.model(seed);
    }

    /// Rolls `count` dice of `faces` faces.
    ///
    /// Dice without faces show nothing, so the result is empty.
    pub fn roll(&mut self, count: usize, faces: E::Face) -> Vec<E::Face> {
        if faces < <E::Face as One>::one() {
            return Vec::new();
        }
        self.rolled += count as u64;
        let (rules, model) = (&self.rules, &mut self.model);
        (0..count).map(|_| rules.face(model, faces)).collect()
    }

    /// Number of dice rolled so far.
    pub fn rolled(&self) -> u64 {
        self.rolled
    }

    /// Returns the entropy rules.
    pub fn rules(&self) -> &E {
        &self.rules
    }
}

impl<E: EntropyRules + Default> Default for Entropy<E> {
    fn default() -> Self {
        Self::new(None, E::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::entropy::FixedHigh;

    #[test]
    fn dice_are_counted() {
        let mut entropy = Entropy::<FixedHigh<i64>>::default();
        assert_eq!(entropy.roll(3, 6), vec![6, 6, 6]);
        assert!(entropy.roll(2, 0).is_empty());
        assert_eq!(entropy.rolled(), 3);
    }
}
