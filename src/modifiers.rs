//! Modifiers post-processing the value of a bonus.

use crate::roll::{RollData, RollEvaluator};
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// What a modifier is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum ModifierTarget {
    /// The bonus contribution, with the actor's data.
    Actor,
    /// The bonus contribution, with the item's data.
    Item,
    /// The running total of all bonuses of the roll.
    Roll,
    /// The bonus contribution, with the target's data.
    Target,
}

/// How the modifier combines with the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum ModifierMode {
    /// `value + modifier`.
    Add,
    /// `value * modifier`.
    Multiply,
    /// `modifier`.
    Override,
    /// The largest of the two.
    Upgrade,
    /// The smallest of the two.
    Downgrade,
}

/// Order in which roll modifiers are applied, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum Priority {
    /// 0.
    Low,
    /// 1.
    Normal,
    /// 2.
    High,
    /// 3.
    Critical,
}

impl Priority {
    /// Returns the numeric value of this priority.
    pub fn value(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Modifier configuration of a bonus.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct Modifiers {
    /// Whether the modifier is active.
    pub enabled: bool,
    /// Formula giving the modifier.
    pub formula: String,
    /// What the modifier is applied to.
    pub target: ModifierTarget,
    /// How the modifier combines with the value.
    pub mode: ModifierMode,
    /// Ordering among roll modifiers.
    pub priority: Priority,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            enabled: false,
            formula: String::new(),
            target: ModifierTarget::Actor,
            mode: ModifierMode::Add,
            priority: Priority::Normal,
        }
    }
}

impl Modifiers {
    /// Creates an enabled modifier.
    pub fn new<S: Into<String>>(formula: S, target: ModifierTarget, mode: ModifierMode) -> Self {
        Self {
            enabled: true,
            formula: formula.into(),
            target,
            mode,
            priority: Priority::Normal,
        }
    }

    /// Returns `true` if the modifier does anything.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.formula.trim().is_empty()
    }

    /// Combines `value` with the modifier evaluated against `data`.
    ///
    /// An inactive modifier, or one whose formula fails, leaves the value unchanged.
    pub fn apply(&self, value: i64, evaluator: &mut dyn RollEvaluator, data: &RollData) -> i64 {
        if !self.is_active() {
            return value;
        }
        let modifier = match evaluator.evaluate(&self.formula, data) {
            Ok(roll) => roll.total(),
            Err(err) => {
                log::error!("cannot apply modifier: {}", err);
                return value;
            }
        };
        match self.mode {
            ModifierMode::Add => value.saturating_add(modifier),
            ModifierMode::Multiply => value.saturating_mul(modifier),
            ModifierMode::Override => modifier,
            ModifierMode::Upgrade => value.max(modifier),
            ModifierMode::Downgrade => value.min(modifier),
        }
    }
}
