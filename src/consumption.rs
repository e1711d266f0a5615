//! Resources a bonus spends when it's applied.

use crate::document::{Actor, DocumentRef, Item, ItemKind};
use crate::error::{BabonusError, BabonusResult};
use crate::roll::RollData;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path under which the scaling amount is exposed to the scaling formula.
pub const SCALE_PATH: &str = "consumption";

/// The kind of property a bonus consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum ConsumptionType {
    /// An actor attribute with a value, e.g. `hp`.
    Attributes,
    /// Coins of the actor.
    Currency,
    /// Sheet resources of the actor.
    Resources,
    /// Limited uses of the owning item.
    Uses,
    /// Uses of the item the owning item consumes.
    Charges,
    /// Spell slots of the actor owning the spell.
    Slots,
    /// Hit dice of one of the actor's classes.
    HitDice,
}

impl ConsumptionType {
    /// Returns the camel case name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ConsumptionType::Attributes => "attributes",
            ConsumptionType::Currency => "currency",
            ConsumptionType::Resources => "resources",
            ConsumptionType::Uses => "uses",
            ConsumptionType::Charges => "charges",
            ConsumptionType::Slots => "slots",
            ConsumptionType::HitDice => "hitDice",
        }
    }

    /// Returns the consumption types available on a document.
    ///
    /// Actors offer attributes, currency, resources and hit dice. Items offer uses when they
    /// have a maximum, charges when they consume another item, and slots when they are spells.
    pub fn available(item: Option<&Item>) -> Vec<ConsumptionType> {
        match item {
            None => vec![
                ConsumptionType::Attributes,
                ConsumptionType::Currency,
                ConsumptionType::Resources,
                ConsumptionType::HitDice,
            ],
            Some(item) => {
                let mut types = Vec::new();
                if item.uses.map_or(false, |uses| uses.max > 0) {
                    types.push(ConsumptionType::Uses);
                }
                if item.consume_target.is_some() {
                    types.push(ConsumptionType::Charges);
                }
                if item.kind == ItemKind::Spell {
                    types.push(ConsumptionType::Slots);
                }
                types
            }
        }
    }

    /// Returns the properties that can be consumed with this type.
    pub fn properties(self, actor: &Actor, item: Option<&Item>) -> Vec<String> {
        if !Self::available(item).contains(&self) {
            return Vec::new();
        }
        match self {
            ConsumptionType::Attributes => actor.attributes.keys().cloned().collect(),
            ConsumptionType::Currency => actor.currency.keys().cloned().collect(),
            ConsumptionType::Resources => actor.resources.keys().cloned().collect(),
            ConsumptionType::HitDice => actor.classes.keys().cloned().collect(),
            ConsumptionType::Uses => vec!["uses".to_string()],
            ConsumptionType::Charges => vec!["charges".to_string()],
            ConsumptionType::Slots => (1..=9).map(|level| level.to_string()).collect(),
        }
    }
}

impl fmt::Display for ConsumptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounds on the amount consumed at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ConsumptionValue {
    /// Smallest amount.
    pub min: i64,
    /// Largest amount.
    pub max: i64,
    /// Interval between valid amounts.
    pub step: i64,
}

impl Default for ConsumptionValue {
    fn default() -> Self {
        Self {
            min: 1,
            max: 1,
            step: 1,
        }
    }
}

/// Consumption configuration of a bonus.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct Consumption {
    /// Whether the bonus consumes anything.
    pub enabled: bool,
    /// Whether the bonus grows with the amount consumed.
    pub scales: bool,
    /// What is consumed.
    #[cfg_attr(feature = "serialization", serde(rename = "type"))]
    pub consumption_type: Option<ConsumptionType>,
    /// Bounds on the amount.
    pub value: ConsumptionValue,
    /// Added to the bonus when it scales, with `@consumption` bound to the number of steps
    /// above the minimum.
    pub formula: String,
}

impl Default for Consumption {
    fn default() -> Self {
        Self {
            enabled: false,
            scales: false,
            consumption_type: None,
            value: ConsumptionValue::default(),
            formula: format!("@{}", SCALE_PATH),
        }
    }
}

impl Consumption {
    /// Creates an enabled consumption of exactly one unit.
    pub fn new(consumption_type: ConsumptionType) -> Self {
        Self {
            enabled: true,
            consumption_type: Some(consumption_type),
            ..Self::default()
        }
    }

    /// Returns `true` if the bonus actually consumes something.
    pub fn is_active(&self) -> bool {
        self.enabled && self.consumption_type.is_some()
    }

    /// Checks that `amount` is within bounds and lands on a step.
    pub fn validate_amount(&self, amount: i64) -> BabonusResult<()> {
        let ConsumptionValue { min, max, step } = self.value;
        if amount < min || amount > max || step <= 0 || (amount - min) % step != 0 {
            return Err(BabonusError::InvalidConsumption {
                amount,
                min,
                max,
                step,
            });
        }
        Ok(())
    }

    /// Returns the roll data for the scaling formula when `amount` is consumed.
    pub fn scale_data(&self, amount: i64) -> RollData {
        let step = self.value.step.max(1);
        RollData::new().with(SCALE_PATH, (amount - self.value.min) / step)
    }

    /// Returns the current value of `property` on the owner.
    ///
    /// `item` is the owning item when the bonus lives on one.
    pub fn current_value(&self, actor: &Actor, item: Option<&Item>, property: &str) -> i64 {
        match self.consumption_type {
            Some(ConsumptionType::Attributes) if item.is_none() => {
                actor.attributes.get(property).map_or(0, |pool| pool.value)
            }
            Some(ConsumptionType::Currency) if item.is_none() => {
                actor.currency.get(property).copied().unwrap_or(0)
            }
            Some(ConsumptionType::Resources) if item.is_none() => {
                actor.resources.get(property).map_or(0, |pool| pool.value)
            }
            Some(ConsumptionType::HitDice) if item.is_none() => actor
                .classes
                .get(property)
                .map_or(0, |class| class.levels - class.hit_dice_used),
            Some(ConsumptionType::Uses) => item
                .and_then(|item| item.uses)
                .filter(|uses| uses.max > 0)
                .map_or(0, |uses| uses.value),
            Some(ConsumptionType::Charges) => charged_item(actor, item)
                .and_then(|target| target.uses)
                .map_or(0, |uses| uses.value),
            Some(ConsumptionType::Slots) => spell_slot(item, property)
                .and_then(|slot| actor.spell_slots.get(&slot))
                .map_or(0, |pool| pool.value),
            _ => 0,
        }
    }

    /// Returns the maximum value of `property` on the owner, `None` if it's unbounded.
    pub fn max_value(&self, actor: &Actor, item: Option<&Item>, property: &str) -> Option<i64> {
        let max = match self.consumption_type {
            Some(ConsumptionType::Currency) if item.is_none() => return None,
            Some(ConsumptionType::Attributes) if item.is_none() => {
                actor.attributes.get(property).map_or(0, |pool| pool.max)
            }
            Some(ConsumptionType::Resources) if item.is_none() => {
                actor.resources.get(property).map_or(0, |pool| pool.max)
            }
            Some(ConsumptionType::HitDice) if item.is_none() => {
                actor.classes.get(property).map_or(0, |class| class.levels)
            }
            Some(ConsumptionType::Uses) => item.and_then(|item| item.uses).map_or(0, |uses| uses.max),
            Some(ConsumptionType::Charges) => charged_item(actor, item)
                .and_then(|target| target.uses)
                .map_or(0, |uses| uses.max),
            Some(ConsumptionType::Slots) => spell_slot(item, property)
                .and_then(|slot| actor.spell_slots.get(&slot))
                .map_or(0, |pool| pool.max),
            _ => 0,
        };
        Some(max)
    }

    /// Spends `amount` of `property` from the document `owner` of `actor`.
    ///
    /// Values never drop below zero and spent hit dice never exceed the class levels.
    pub fn consume(
        &self,
        actor: &mut Actor,
        owner: &DocumentRef,
        property: &str,
        amount: i64,
    ) -> BabonusResult<()> {
        self.validate_amount(amount)?;
        let consumption_type = match self.consumption_type {
            Some(consumption_type) if self.enabled => consumption_type,
            _ => {
                return Err(BabonusError::ConsumptionUnavailable(
                    "nothing".to_string(),
                    owner.clone(),
                ))
            }
        };
        let unavailable =
            || BabonusError::ConsumptionUnavailable(consumption_type.to_string(), owner.clone());

        let item_id = owner.item().cloned();
        let (available, has_property) = {
            let item = match &item_id {
                Some(id) => Some(actor.items.get(id).ok_or_else(|| {
                    BabonusError::DocumentNotFound(owner.clone())
                })?),
                None => None,
            };
            (
                self.current_value(actor, item, property),
                consumption_type
                    .properties(actor, item)
                    .iter()
                    .any(|candidate| candidate == property),
            )
        };
        if !has_property {
            return Err(unavailable());
        }
        if available < amount {
            return Err(BabonusError::InsufficientResource {
                property: property.to_string(),
                amount,
                available,
            });
        }

        match consumption_type {
            ConsumptionType::Attributes => {
                let pool = actor.attributes.get_mut(property).ok_or_else(unavailable)?;
                pool.value = (pool.value - amount).max(0);
            }
            ConsumptionType::Currency => {
                let coins = actor.currency.get_mut(property).ok_or_else(unavailable)?;
                *coins = (*coins - amount).max(0);
            }
            ConsumptionType::Resources => {
                let pool = actor.resources.get_mut(property).ok_or_else(unavailable)?;
                pool.value = (pool.value - amount).max(0);
            }
            ConsumptionType::HitDice => {
                let class = actor.classes.get_mut(property).ok_or_else(unavailable)?;
                class.hit_dice_used = (class.hit_dice_used + amount).min(class.levels);
            }
            ConsumptionType::Uses => {
                let uses = item_id
                    .as_ref()
                    .and_then(|id| actor.items.get_mut(id))
                    .and_then(|item| item.uses.as_mut())
                    .ok_or_else(unavailable)?;
                uses.value = (uses.value - amount).max(0);
            }
            ConsumptionType::Charges => {
                let target = item_id
                    .as_ref()
                    .and_then(|id| actor.items.get(id))
                    .and_then(|item| item.consume_target.clone())
                    .ok_or_else(unavailable)?;
                let uses = actor
                    .items
                    .get_mut(&target)
                    .and_then(|item| item.uses.as_mut())
                    .ok_or_else(unavailable)?;
                uses.value = (uses.value - amount).max(0);
            }
            ConsumptionType::Slots => {
                let slot = format!("spell{}", property);
                let pool = actor.spell_slots.get_mut(&slot).ok_or_else(unavailable)?;
                pool.value = (pool.value - amount).max(0);
            }
        }
        log::debug!("consumed {} `{}` from {}", amount, property, owner);
        Ok(())
    }
}

fn charged_item<'a>(actor: &'a Actor, item: Option<&Item>) -> Option<&'a Item> {
    item.and_then(|item| item.consume_target.as_ref())
        .and_then(|target| actor.items.get(target))
}

fn spell_slot(item: Option<&Item>, property: &str) -> Option<String> {
    match item {
        Some(item) if item.kind == ItemKind::Spell => property
            .parse::<u8>()
            .ok()
            .filter(|level| (1..=9).contains(level))
            .map(|level| format!("spell{}", level)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts() {
        let mut consumption = Consumption::new(ConsumptionType::Resources);
        consumption.value = ConsumptionValue {
            min: 1,
            max: 5,
            step: 2,
        };
        assert!(consumption.validate_amount(1).is_ok());
        assert!(consumption.validate_amount(5).is_ok());
        assert!(consumption.validate_amount(2).is_err());
        assert!(consumption.validate_amount(7).is_err());
        assert_eq!(consumption.scale_data(5).get(SCALE_PATH), Some(2));
    }

    #[test]
    fn extreme_amounts_are_refused() {
        let consumption = Consumption::new(ConsumptionType::Resources);
        assert!(consumption.validate_amount(i64::MIN).is_err());
        assert!(consumption.validate_amount(i64::MAX).is_err());
    }

    #[test]
    fn available_types() {
        assert_eq!(ConsumptionType::available(None).len(), 4);
        let spell = Item::new("s", "Bless", ItemKind::Spell);
        assert_eq!(
            ConsumptionType::available(Some(&spell)),
            vec![ConsumptionType::Slots]
        );
        let loot = Item::new("l", "Gem", ItemKind::Loot);
        assert!(ConsumptionType::available(Some(&loot)).is_empty());
    }
}
