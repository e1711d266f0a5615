//! Auras: bonuses that reach the rolls of other tokens around their owner.

use crate::scene::{Scene, Token};
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Movement and sight requirements between the aura's source and its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Requirements {
    /// A wall blocking movement between the two tokens breaks the aura.
    #[cfg_attr(feature = "serialization", serde(rename = "move", default))]
    pub movement: bool,
    /// The source must be able to see the target.
    #[cfg_attr(feature = "serialization", serde(default))]
    pub sight: bool,
}

/// Aura configuration of a bonus.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct Aura {
    /// Whether the bonus is an aura.
    pub enabled: bool,
    /// Whether the aura is bound to a measured template instead of a token.
    pub template: bool,
    /// Radius in scene units. A value that isn't a number means an unlimited radius.
    pub range: String,
    /// Whether the aura also affects the rolls of its owner.
    #[cfg_attr(feature = "serialization", serde(rename = "self"))]
    pub self_: bool,
    /// Required sign of the product of the two dispositions: `1`, `-1`, or `0` for any.
    pub disposition: i8,
    /// Statuses that suppress the aura on the affected token.
    pub blockers: BTreeSet<String>,
    /// Movement and sight requirements.
    pub require: Requirements,
}

impl Default for Aura {
    fn default() -> Self {
        Self {
            enabled: false,
            template: false,
            range: "30".to_string(),
            self_: false,
            disposition: 0,
            blockers: BTreeSet::new(),
            require: Requirements::default(),
        }
    }
}

/// Only allies of the source are affected.
pub const ALLIES: i8 = 1;

/// Only enemies of the source are affected.
pub const ENEMIES: i8 = -1;

/// Every token is affected.
pub const ANY: i8 = 0;

impl Aura {
    /// Creates an enabled aura with the given range.
    pub fn new<S: Into<String>>(range: S) -> Self {
        Self {
            enabled: true,
            range: range.into(),
            ..Self::default()
        }
    }

    /// Returns the radius of the aura, or `None` if it's unlimited.
    ///
    /// Only an optional sign and the leading digits are read, so `"30ft"` is a radius of 30.
    /// A negative radius reaches no token at all.
    pub fn radius(&self) -> Option<f64> {
        let trimmed = self.range.trim_start();
        let (sign, rest) = match trimmed.chars().next() {
            Some('-') => (-1.0, &trimmed[1..]),
            Some('+') => (1.0, &trimmed[1..]),
            _ => (1.0, trimmed),
        };
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<f64>().ok().map(|radius| sign * radius)
    }

    /// Returns `true` if the aura of `source` reaches `target`.
    ///
    /// `target_statuses` are the statuses of the actor represented by `target`, checked
    /// against the blockers.
    pub fn applies<S, I, T>(&self, scene: &S, source: &Token, target: &Token, target_statuses: I) -> bool
    where
        S: Scene + ?Sized,
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        if !self.enabled {
            return false;
        }
        if source.id == target.id && !self.self_ {
            return false;
        }
        if self.disposition != ANY {
            let product = i16::from(source.disposition) * i16::from(target.disposition);
            if (self.disposition == ALLIES && product <= 0)
                || (self.disposition == ENEMIES && product >= 0)
            {
                return false;
            }
        }
        if let Some(radius) = self.radius() {
            if scene.measure_distance(source, target) > radius {
                return false;
            }
        }
        if !self.blockers.is_empty()
            && target_statuses
                .into_iter()
                .any(|status| self.blockers.contains(status.as_ref()))
        {
            return false;
        }
        if self.require.movement && scene.check_collision(source.center, target.center) {
            return false;
        }
        if self.require.sight && scene.sight_contains(source, target.center) != Some(true) {
            return false;
        }
        true
    }
}
