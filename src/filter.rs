//! Catalog of filters deciding whether a bonus applies to a roll.
//!
//! Every filter is a pure predicate over the bonus, the configured value and the roll context.
//! Filters come in four shapes:
//!
//! - *any of*: passes if at least one configured entry is present in the context.
//! - *all of*: passes if every configured entry is present in the context.
//! - *range*: passes if the value from the context lies within the inclusive bounds.
//! - *toggle*: passes if the configured boolean equals the value from the context.
//!
//! An unset or empty filter always passes. A filter needing data the context doesn't have,
//! such as an item, fails.

use crate::bonus::{Bonus, BonusType};
use crate::context::RollContext;
use crate::document::{Item, ItemKind, SpellData};
use crate::error::{BabonusError, BabonusResult};
use indexmap::IndexMap;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generates the `FilterKind` enum together with its name lookups.
macro_rules! filter_kinds {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal ),* $(,)?) => {
        /// Every filter known to the engine.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FilterKind {
            $($(#[$meta])* $variant,)*
        }

        impl FilterKind {
            /// All filters, in catalog order.
            pub const ALL: &'static [FilterKind] = &[$(FilterKind::$variant,)*];

            /// Returns the name under which the filter is stored.
            pub fn name(self) -> &'static str {
                match self {
                    $(FilterKind::$variant => $name,)*
                }
            }

            /// Finds a filter by its stored name.
            pub fn from_name(name: &str) -> Option<FilterKind> {
                match name {
                    $($name => Some(FilterKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

filter_kinds! {
    /// Type of the rolling item.
    ItemType => "itemType",
    /// Weapon type of the rolling item.
    WeaponType => "weaponType",
    /// Properties of the rolling weapon.
    WeaponProperties => "weaponProperties",
    /// Armor type of the rolling item.
    ArmorType => "armorType",
    /// Level of the rolling spell.
    SpellLevel => "spellLevel",
    /// School of the rolling spell.
    SpellSchool => "spellSchool",
    /// Components of the rolling spell.
    SpellComponents => "spellComponents",
    /// Damage types of the rolling item or of the bonus.
    DamageTypes => "damageTypes",
    /// Ability used by the roll.
    Abilities => "abilities",
    /// Skill used by the roll.
    Skills => "skills",
    /// Proficiency of the actor with the rolling item.
    Proficiency => "proficiency",
    /// Markers on the actor or on the target.
    Markers => "markers",
    /// Statuses of the actor or of the target.
    Conditions => "conditions",
    /// Distance between the actor's and the target's tokens.
    Distance => "distance",
    /// Whether the rolling item is equipped.
    Equipped => "equipped",
    /// Whether the rolling item is attuned.
    Attunement => "attunement",
    /// Whether the rolling spell is prepared.
    Prepared => "prepared",
    /// Whether the rolling spell requires concentration.
    Concentration => "concentration",
    /// Whether the rolling spell is a ritual.
    Ritual => "ritual",
    /// Whether the roll is a critical hit.
    Critical => "critical",
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inclusive bounds, each of them optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Range {
    /// Lower bound.
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub min: Option<f64>,
    /// Upper bound.
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub max: Option<f64>,
}

impl Range {
    /// Creates a new range.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `value` lies within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// The value configured for a filter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(untagged))]
pub enum FilterValue {
    /// The filter is not configured.
    Unset,
    /// A boolean to compare against.
    Toggle(bool),
    /// A list of accepted entries.
    List(Vec<String>),
    /// Inclusive bounds.
    Range(Range),
}

impl FilterValue {
    /// Creates a list value.
    pub fn list<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::List(entries.into_iter().map(Into::into).collect())
    }

    /// Creates a range value.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::Range(Range::new(min, max))
    }

    /// Returns `true` if the value doesn't constrain anything.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Unset => true,
            FilterValue::Toggle(_) => false,
            FilterValue::List(entries) => entries.is_empty(),
            FilterValue::Range(range) => range.min.is_none() && range.max.is_none(),
        }
    }
}

/// The shape of the value a filter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    /// At least one entry must match.
    AnyOf,
    /// Every entry must match.
    AllOf,
    /// The value must lie within bounds.
    Range,
    /// The value must be equal.
    Toggle,
}

impl FilterShape {
    /// Returns `true` if `value` has this shape. Unset values fit every shape.
    pub fn accepts(self, value: &FilterValue) -> bool {
        match (self, value) {
            (_, FilterValue::Unset) => true,
            (FilterShape::AnyOf, FilterValue::List(_))
            | (FilterShape::AllOf, FilterValue::List(_))
            | (FilterShape::Range, FilterValue::Range(_))
            | (FilterShape::Toggle, FilterValue::Toggle(_)) => true,
            _ => false,
        }
    }

    /// Describes the expected value.
    pub fn expected(self) -> &'static str {
        match self {
            FilterShape::AnyOf | FilterShape::AllOf => "a list of strings",
            FilterShape::Range => "a range",
            FilterShape::Toggle => "a boolean",
        }
    }
}

/// Signature of a filter predicate. The value has already been checked against the shape
/// and is never empty.
pub type Predicate = fn(&Bonus, &FilterValue, &RollContext) -> bool;

/// Complete description of a filter.
#[derive(Clone, Copy)]
pub struct FilterRule {
    /// The filter described.
    pub kind: FilterKind,
    /// The shape of the configured value.
    pub shape: FilterShape,
    /// Tells whether the filter can be configured on bonuses of a given type.
    pub applies_to: fn(BonusType) -> bool,
    /// The predicate.
    pub predicate: Predicate,
}

impl fmt::Debug for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRule")
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .finish()
    }
}

fn item_rolls(bonus_type: BonusType) -> bool {
    match bonus_type {
        BonusType::AttackRoll | BonusType::DamageRoll | BonusType::SavingThrowDc => true,
        _ => false,
    }
}

fn attack_or_damage(bonus_type: BonusType) -> bool {
    match bonus_type {
        BonusType::AttackRoll | BonusType::DamageRoll => true,
        _ => false,
    }
}

fn not_hit_die(bonus_type: BonusType) -> bool {
    bonus_type != BonusType::HitDie
}

fn proficient_rolls(bonus_type: BonusType) -> bool {
    item_rolls(bonus_type) || bonus_type == BonusType::AbilityCheck
}

fn ability_checks(bonus_type: BonusType) -> bool {
    bonus_type == BonusType::AbilityCheck
}

fn damage_rolls(bonus_type: BonusType) -> bool {
    bonus_type == BonusType::DamageRoll
}

fn all_types(_: BonusType) -> bool {
    true
}

impl FilterKind {
    /// Returns the full description of this filter.
    pub fn rule(self) -> FilterRule {
        let (shape, applies_to, predicate): (FilterShape, fn(BonusType) -> bool, Predicate) =
            match self {
                FilterKind::ItemType => (FilterShape::AnyOf, item_rolls, item_type),
                FilterKind::WeaponType => (FilterShape::AnyOf, item_rolls, weapon_type),
                FilterKind::WeaponProperties => (FilterShape::AllOf, item_rolls, weapon_properties),
                FilterKind::ArmorType => (FilterShape::AnyOf, item_rolls, armor_type),
                FilterKind::SpellLevel => (FilterShape::Range, item_rolls, spell_level),
                FilterKind::SpellSchool => (FilterShape::AnyOf, item_rolls, spell_school),
                FilterKind::SpellComponents => (FilterShape::AllOf, item_rolls, spell_components),
                FilterKind::DamageTypes => (FilterShape::AnyOf, attack_or_damage, damage_types),
                FilterKind::Abilities => (FilterShape::AnyOf, not_hit_die, abilities),
                FilterKind::Skills => (FilterShape::AnyOf, ability_checks, skills),
                FilterKind::Proficiency => (FilterShape::Toggle, proficient_rolls, proficiency),
                FilterKind::Markers => (FilterShape::AnyOf, all_types, markers),
                FilterKind::Conditions => (FilterShape::AnyOf, all_types, conditions),
                FilterKind::Distance => (FilterShape::Range, not_hit_die, distance),
                FilterKind::Equipped => (FilterShape::Toggle, item_rolls, equipped),
                FilterKind::Attunement => (FilterShape::Toggle, item_rolls, attunement),
                FilterKind::Prepared => (FilterShape::Toggle, item_rolls, prepared),
                FilterKind::Concentration => (FilterShape::Toggle, item_rolls, concentration),
                FilterKind::Ritual => (FilterShape::Toggle, item_rolls, ritual),
                FilterKind::Critical => (FilterShape::Toggle, damage_rolls, critical),
            };
        FilterRule {
            kind: self,
            shape,
            applies_to,
            predicate,
        }
    }

    /// Returns `true` if this filter can be configured on bonuses of type `bonus_type`.
    pub fn applies_to(self, bonus_type: BonusType) -> bool {
        (self.rule().applies_to)(bonus_type)
    }
}

/// Returns every filter available for bonuses of type `bonus_type`.
pub fn available(bonus_type: BonusType) -> impl Iterator<Item = FilterKind> {
    FilterKind::ALL
        .iter()
        .copied()
        .filter(move |kind| kind.applies_to(bonus_type))
}

/// Checks that `value` can be configured for `kind` on a bonus of type `bonus_type`.
pub fn check(kind: FilterKind, value: &FilterValue, bonus_type: BonusType) -> BabonusResult<()> {
    let rule = kind.rule();
    if !(rule.applies_to)(bonus_type) {
        return Err(BabonusError::FilterNotApplicable(kind, bonus_type));
    }
    if !rule.shape.accepts(value) {
        return Err(BabonusError::InvalidFilterValue(kind, rule.shape.expected()));
    }
    Ok(())
}

/// The filters configured on a bonus, keyed by name.
///
/// Names that don't belong to any known filter are kept, so that they survive a round trip
/// through storage, but they are never evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(transparent))]
pub struct Filters(IndexMap<String, FilterValue>);

impl Filters {
    /// Returns the value configured for a filter.
    pub fn get(&self, kind: FilterKind) -> Option<&FilterValue> {
        self.0.get(kind.name())
    }

    /// Sets the value of a filter without any validation.
    pub fn insert(&mut self, kind: FilterKind, value: FilterValue) {
        self.0.insert(kind.name().to_string(), value);
    }

    /// Sets the value under an arbitrary name.
    pub fn insert_raw<S: Into<String>>(&mut self, name: S, value: FilterValue) {
        self.0.insert(name.into(), value);
    }

    /// Removes a filter.
    pub fn remove(&mut self, kind: FilterKind) -> Option<FilterValue> {
        self.0.shift_remove(kind.name())
    }

    /// Iterates over all configured names and values, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over the known filters only.
    pub fn known(&self) -> impl Iterator<Item = (FilterKind, &FilterValue)> {
        self.0
            .iter()
            .filter_map(|(name, value)| FilterKind::from_name(name).map(|kind| (kind, value)))
    }

    /// Returns the number of configured names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no filter is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Evaluates every filter configured on `bonus` against `context`.
///
/// Stops at the first failing filter. Unknown names are skipped and empty values pass.
/// A value with the wrong shape is a configuration error: it's logged and the filter fails.
pub fn applies(bonus: &Bonus, context: &RollContext) -> bool {
    for (kind, value) in bonus.filters().known() {
        if value.is_empty() {
            continue;
        }
        let rule = kind.rule();
        if !rule.shape.accepts(value) {
            log::warn!(
                "bonus `{}` has an invalid `{}` filter: expected {}",
                bonus.name(),
                kind,
                rule.shape.expected()
            );
            return false;
        }
        if !(rule.predicate)(bonus, value, context) {
            log::debug!("bonus `{}` rejected by `{}`", bonus.name(), kind);
            return false;
        }
    }
    true
}

fn entries(value: &FilterValue) -> &[String] {
    match value {
        FilterValue::List(entries) => entries,
        _ => &[],
    }
}

fn any_of<'a, I>(value: &FilterValue, candidates: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let entries = entries(value);
    candidates
        .into_iter()
        .any(|candidate| entries.iter().any(|entry| entry == candidate))
}

fn in_range(value: &FilterValue, rolled: Option<f64>) -> bool {
    match (value, rolled) {
        (FilterValue::Range(range), Some(rolled)) => range.contains(rolled),
        _ => false,
    }
}

fn toggle_equals(value: &FilterValue, actual: bool) -> bool {
    match value {
        FilterValue::Toggle(expected) => *expected == actual,
        _ => false,
    }
}

fn weapon<'a>(context: &RollContext<'a>) -> Option<&'a Item> {
    context.item.filter(|item| item.kind == ItemKind::Weapon)
}

fn spell<'a>(context: &RollContext<'a>) -> Option<&'a SpellData> {
    context
        .item
        .filter(|item| item.kind == ItemKind::Spell)
        .and_then(|item| item.spell.as_ref())
}

fn item_type(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    context
        .item
        .map_or(false, |item| any_of(value, Some(item.kind.as_str())))
}

fn weapon_type(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    weapon(context)
        .and_then(|item| item.weapon_type.as_deref())
        .map_or(false, |kind| any_of(value, Some(kind)))
}

fn weapon_properties(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    weapon(context).map_or(false, |item| {
        entries(value)
            .iter()
            .all(|property| item.properties.contains(property))
    })
}

fn armor_type(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    context
        .item
        .filter(|item| item.kind == ItemKind::Equipment)
        .and_then(|item| item.armor_type.as_deref())
        .map_or(false, |armor| any_of(value, Some(armor)))
}

fn spell_level(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    in_range(value, spell(context).map(|spell| spell.level as f64))
}

fn spell_school(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    spell(context).map_or(false, |spell| any_of(value, Some(spell.school.as_str())))
}

fn spell_components(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    spell(context).map_or(false, |spell| {
        entries(value)
            .iter()
            .all(|component| spell.components.has(component) != Some(false))
    })
}

fn damage_types(bonus: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    match context.item {
        Some(item) => any_of(value, item.damage_types().chain(bonus.damage_type())),
        None => false,
    }
}

fn abilities(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    any_of(value, context.ability.as_deref())
}

fn skills(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    any_of(value, context.skill.as_deref())
}

fn proficiency(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    match context.item {
        Some(item) => toggle_equals(value, context.actor.is_proficient_with(item)),
        None => false,
    }
}

fn markers(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    any_of(value, context.actor_markers.iter().map(String::as_str))
        || any_of(value, context.target_markers.iter().map(String::as_str))
}

fn conditions(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    if any_of(value, context.actor.statuses()) {
        return true;
    }
    context
        .target
        .map_or(false, |target| any_of(value, target.statuses()))
}

fn distance(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    in_range(value, context.distance)
}

fn equipped(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    context
        .item
        .map_or(false, |item| toggle_equals(value, item.equipped))
}

fn attunement(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    context
        .item
        .map_or(false, |item| toggle_equals(value, item.is_attuned()))
}

fn prepared(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    spell(context).map_or(false, |spell| toggle_equals(value, spell.prepared))
}

fn concentration(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    spell(context).map_or(false, |spell| {
        toggle_equals(value, spell.components.concentration)
    })
}

fn ritual(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    spell(context).map_or(false, |spell| toggle_equals(value, spell.components.ritual))
}

fn critical(_: &Bonus, value: &FilterValue, context: &RollContext) -> bool {
    toggle_equals(value, context.critical)
}
