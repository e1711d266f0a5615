//! Rolls, roll data and the seam to execute formulas.

use crate::entropy::{Entropy, EntropyRules};
use crate::error::BabonusResult;
use crate::formula::Formula;
use indexmap::IndexMap;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat map of dotted paths to integer values, referenced in formulas as `@path`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct RollData {
    values: IndexMap<String, i64>,
}

impl RollData {
    /// Creates an empty roll data map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value at `path`.
    pub fn set<P: Into<String>>(&mut self, path: P, value: i64) -> &mut Self {
        self.values.insert(path.into(), value);
        self
    }

    /// Builder flavour of `set`.
    pub fn with<P: Into<String>>(mut self, path: P, value: i64) -> Self {
        self.set(path, value);
        self
    }

    /// Returns the value at `path`.
    pub fn get(&self, path: &str) -> Option<i64> {
        self.values.get(path).copied()
    }

    /// Copies every value of `other` into this map, overwriting existing paths.
    pub fn merge(&mut self, other: &RollData) {
        for (path, value) in &other.values {
            self.values.insert(path.clone(), *value);
        }
    }

    /// Copies every value of `other` into this map, under `prefix.`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: &RollData) {
        for (path, value) in &other.values {
            self.values.insert(format!("{}.{}", prefix, path), *value);
        }
    }

    /// Returns an iterator over all paths and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.values.iter()
    }

    /// Returns `true` if no value is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single term of an evaluated roll.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum RollTerm {
    /// A pool of dice with the result of each die.
    Dice {
        /// Number of dice.
        count: i64,
        /// Faces of each die.
        faces: i64,
        /// Result of every die.
        results: Vec<i64>,
    },
    /// A constant, either a literal or a resolved roll data reference.
    Numeric(i64),
}

/// The result of evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Roll {
    formula: String,
    terms: Vec<RollTerm>,
    total: i64,
}

impl Roll {
    /// Creates a new roll.
    pub fn new<S: Into<String>>(formula: S, terms: Vec<RollTerm>, total: i64) -> Self {
        Self {
            formula: formula.into(),
            terms,
            total,
        }
    }

    /// Returns the roll formula.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Returns the evaluated terms.
    pub fn terms(&self) -> &[RollTerm] {
        &self.terms
    }

    /// Returns the roll total.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Returns the results of the first die of the first dice term, if any.
    ///
    /// For a d20 roll this is the natural result.
    pub fn natural(&self) -> Option<i64> {
        self.terms.iter().find_map(|term| match term {
            RollTerm::Dice { results, .. } => results.first().copied(),
            RollTerm::Numeric(_) => None,
        })
    }

    /// Returns the formula with `value` appended as a signed term.
    pub fn amended_formula(&self, value: i64) -> String {
        if value < 0 {
            format!("{} - {}", self.formula, value.unsigned_abs())
        } else {
            format!("{} + {}", self.formula, value)
        }
    }

    /// Replaces formula, terms and total of this roll with those of `other`.
    pub fn splice(&mut self, other: Roll) {
        *self = other;
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.formula, self.total)
    }
}

/// Executes formulas, standing in for the host's roll machinery.
pub trait RollEvaluator {
    /// Evaluates `formula` against `data`.
    fn evaluate(&mut self, formula: &str, data: &RollData) -> BabonusResult<Roll>;
}

/// Evaluates formulas with the built-in parser, drawing dice from an entropy source.
pub struct DiceRoller<E>
where
    E: EntropyRules<Face = i64>,
{
    entropy: Entropy<E>,
}

impl<E> DiceRoller<E>
where
    E: EntropyRules<Face = i64>,
{
    /// Creates a new dice roller.
    pub fn new(seed: Option<E::Seed>, rules: E) -> Self {
        Self {
            entropy: Entropy::new(seed, rules),
        }
    }

    /// Returns the entropy source.
    pub fn entropy(&self) -> &Entropy<E> {
        &self.entropy
    }

    /// Returns a mutable reference to the entropy source.
    pub fn entropy_mut(&mut self) -> &mut Entropy<E> {
        &mut self.entropy
    }
}

impl<E> RollEvaluator for DiceRoller<E>
where
    E: EntropyRules<Face = i64>,
{
    fn evaluate(&mut self, formula: &str, data: &RollData) -> BabonusResult<Roll> {
        let parsed = Formula::parse(formula)?;
        let entropy = &mut self.entropy;
        let mut roller = |count: i64, faces: i64| entropy.roll(count.max(0) as usize, faces);
        let mut terms = Vec::new();
        let total = parsed.evaluate(data, &mut roller, &mut terms)?;
        Ok(Roll::new(parsed.source(), terms, total))
    }
}

impl<E> Default for DiceRoller<E>
where
    E: EntropyRules<Face = i64> + Default,
{
    fn default() -> Self {
        Self {
            entropy: Entropy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::entropy::{FixedHigh, FixedLow, UniformDistribution};

    #[test]
    fn fixed_rolls() {
        let data = RollData::new().with("mod", 2);
        let mut low = DiceRoller::<FixedLow<i64>>::default();
        assert_eq!(low.evaluate("2d6 + @mod", &data).unwrap().total(), 4);
        let mut high = DiceRoller::<FixedHigh<i64>>::default();
        let roll = high.evaluate("1d20 + @mod", &data).unwrap();
        assert_eq!(roll.total(), 22);
        assert_eq!(roll.natural(), Some(20));
        assert_eq!(roll.formula(), "1d20 + @mod");
    }

    #[test]
    fn seeded_rolls_are_in_range() {
        let mut roller = DiceRoller::new(Some(42), UniformDistribution::<i64>::default());
        for _ in 0..32 {
            let total = roller.evaluate("1d8", &RollData::new()).unwrap().total();
            assert!((1..=8).contains(&total));
        }
    }

    #[test]
    fn amended_formula() {
        let roll = Roll::new("1d20 + 3", Vec::new(), 10);
        assert_eq!(roll.amended_formula(3), "1d20 + 3 + 3");
        assert_eq!(roll.amended_formula(-2), "1d20 + 3 - 2");
    }

    #[test]
    fn prefixed_merge() {
        let mut data = RollData::new().with("prof", 2);
        data.merge_prefixed("item", &RollData::new().with("level", 3));
        assert_eq!(data.get("item.level"), Some(3));
        assert_eq!(data.get("prof"), Some(2));
    }
}
