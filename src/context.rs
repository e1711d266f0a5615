//! The context a roll is evaluated in.

use crate::document::{Actor, Item};
use crate::registry::RegistryId;
use crate::roll::Roll;
use std::collections::BTreeSet;

/// Everything the filters can look at while deciding whether a bonus applies.
///
/// A context borrows live documents and only lasts for the evaluation of one roll.
#[derive(Debug, Clone)]
pub struct RollContext<'a> {
    /// The actor making the roll.
    pub actor: &'a Actor,
    /// The item being rolled, if any.
    pub item: Option<&'a Item>,
    /// The targeted actor, if any.
    pub target: Option<&'a Actor>,
    /// Ability used by the roll, e.g. `dex` or `death`.
    pub ability: Option<String>,
    /// Skill used by the roll, e.g. `ste`.
    pub skill: Option<String>,
    /// Whether the roll is a critical hit.
    pub critical: bool,
    /// The roll being modified, once it has been executed.
    pub roll: Option<&'a Roll>,
    /// Correlation id of the roll in the registry.
    pub registry_id: Option<RegistryId>,
    /// Markers placed on the actor.
    pub actor_markers: BTreeSet<String>,
    /// Markers placed on the target.
    pub target_markers: BTreeSet<String>,
    /// Distance between the actor's and the target's tokens, in scene units.
    pub distance: Option<f64>,
}

impl<'a> RollContext<'a> {
    /// Creates a context for a roll made by `actor`, with nothing else known.
    pub fn new(actor: &'a Actor) -> Self {
        Self {
            actor,
            item: None,
            target: None,
            ability: None,
            skill: None,
            critical: false,
            roll: None,
            registry_id: None,
            actor_markers: BTreeSet::new(),
            target_markers: BTreeSet::new(),
            distance: None,
        }
    }

    /// Sets the rolled item.
    pub fn with_item(mut self, item: &'a Item) -> Self {
        self.item = Some(item);
        self
    }

    /// Sets the target.
    pub fn with_target(mut self, target: &'a Actor) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the ability.
    pub fn with_ability<S: Into<String>>(mut self, ability: S) -> Self {
        self.ability = Some(ability.into());
        self
    }

    /// Sets the skill.
    pub fn with_skill<S: Into<String>>(mut self, skill: S) -> Self {
        self.skill = Some(skill.into());
        self
    }

    /// Sets the critical flag.
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Sets the markers of the actor and of the target.
    pub fn with_markers(mut self, actor: BTreeSet<String>, target: BTreeSet<String>) -> Self {
        self.actor_markers = actor;
        self.target_markers = target;
        self
    }

    /// Sets the distance to the target.
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}
