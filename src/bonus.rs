//! Bonus definitions.

use crate::aura::Aura;
use crate::consumption::Consumption;
use crate::context::RollContext;
use crate::error::{BabonusError, BabonusResult};
use crate::filter::{self, FilterKind, FilterValue, Filters};
use crate::modifiers::Modifiers;
use crate::util::Id;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

string_id! {
    /// Identifies a bonus within its parent document.
    BonusId
}

/// Icon given to new bonuses.
pub const DEFAULT_ICON: &str = "icons/svg/upgrade.svg";

/// The kind of roll a bonus modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum BonusType {
    /// Attack rolls.
    AttackRoll,
    /// Damage and healing rolls.
    DamageRoll,
    /// The difficulty class of saving throws an item forces.
    SavingThrowDc,
    /// Saving throws, death saves included.
    SavingThrow,
    /// Ability checks and skill checks.
    AbilityCheck,
    /// Hit die rolls.
    HitDie,
}

impl BonusType {
    /// All bonus types.
    pub const ALL: [BonusType; 6] = [
        BonusType::AttackRoll,
        BonusType::DamageRoll,
        BonusType::SavingThrowDc,
        BonusType::SavingThrow,
        BonusType::AbilityCheck,
        BonusType::HitDie,
    ];

    /// Returns the camel case name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            BonusType::AttackRoll => "attackRoll",
            BonusType::DamageRoll => "damageRoll",
            BonusType::SavingThrowDc => "savingThrowDc",
            BonusType::SavingThrow => "savingThrow",
            BonusType::AbilityCheck => "abilityCheck",
            BonusType::HitDie => "hitDie",
        }
    }
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BonusType {
    type Err = BabonusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BonusType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BabonusError::UnknownBonusType(s.to_string()))
    }
}

/// A conditional modifier added to rolls of one type.
///
/// The type of a bonus is fixed at creation. Filters and type specific fields are validated
/// against it when they are set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub struct Bonus {
    id: BonusId,
    name: String,
    #[cfg_attr(feature = "serialization", serde(default))]
    description: String,
    #[cfg_attr(feature = "serialization", serde(rename = "img", default = "default_icon"))]
    icon: String,
    #[cfg_attr(feature = "serialization", serde(rename = "type"))]
    bonus_type: BonusType,
    #[cfg_attr(feature = "serialization", serde(rename = "bonus"))]
    formula: String,
    #[cfg_attr(feature = "serialization", serde(default = "enabled_by_default"))]
    enabled: bool,
    #[cfg_attr(feature = "serialization", serde(default))]
    optional: bool,
    #[cfg_attr(feature = "serialization", serde(default))]
    filters: Filters,
    #[cfg_attr(feature = "serialization", serde(default))]
    consumption: Consumption,
    #[cfg_attr(feature = "serialization", serde(default))]
    aura: Aura,
    #[cfg_attr(feature = "serialization", serde(default))]
    modifiers: Modifiers,
    #[cfg_attr(feature = "serialization", serde(default))]
    sort: i64,
    #[cfg_attr(
        feature = "serialization",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    damage_type: Option<String>,
    #[cfg_attr(feature = "serialization", serde(default))]
    critical: bool,
    #[cfg_attr(
        feature = "serialization",
        serde(rename = "ability", alias = "abilities", default)
    )]
    abilities: BTreeSet<String>,
    #[cfg_attr(
        feature = "serialization",
        serde(rename = "skill", alias = "skills", default)
    )]
    skills: BTreeSet<String>,
}

#[cfg(feature = "serialization")]
fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

#[cfg(feature = "serialization")]
fn enabled_by_default() -> bool {
    true
}

impl Bonus {
    /// Creates an enabled bonus with a random id and a formula of `1`.
    pub fn create<S: Into<String>>(bonus_type: BonusType, name: S) -> Self {
        Self::with_id(BonusId::random(), bonus_type, name)
    }

    /// Creates an enabled bonus with the given id and a formula of `1`.
    pub fn with_id<I: Into<BonusId>, S: Into<String>>(id: I, bonus_type: BonusType, name: S) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: DEFAULT_ICON.to_string(),
            bonus_type,
            formula: "1".to_string(),
            enabled: true,
            optional: false,
            filters: Filters::default(),
            consumption: Consumption::default(),
            aura: Aura::default(),
            modifiers: Modifiers::default(),
            sort: 0,
            damage_type: None,
            critical: false,
            abilities: BTreeSet::new(),
            skills: BTreeSet::new(),
        }
    }

    /// Returns a copy of this bonus with a fresh id and a name marking it as a copy.
    pub fn duplicate(&self) -> Self {
        Self {
            id: BonusId::random(),
            name: format!("{} (Copy)", self.name),
            ..self.clone()
        }
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the name.
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description<S: Into<String>>(&mut self, description: S) {
        self.description = description.into();
    }

    /// Returns the icon path.
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Sets the icon path.
    pub fn set_icon<S: Into<String>>(&mut self, icon: S) {
        self.icon = icon.into();
    }

    /// Returns the type of this bonus.
    pub fn bonus_type(&self) -> BonusType {
        self.bonus_type
    }

    /// Returns the formula added to matching rolls.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Sets the formula.
    pub fn set_formula<S: Into<String>>(&mut self, formula: S) {
        self.formula = formula.into();
    }

    /// Builder flavour of `set_formula`.
    pub fn with_formula<S: Into<String>>(mut self, formula: S) -> Self {
        self.set_formula(formula);
        self
    }

    /// Returns `true` if this bonus is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables this bonus.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns `true` if this bonus must be picked by the user before it applies.
    pub fn optional(&self) -> bool {
        self.optional
    }

    /// Sets whether this bonus is optional.
    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    /// Returns the filters.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Returns the filters for direct edition.
    ///
    /// Values set this way are not validated until `validate` runs, which happens
    /// whenever the bonus is inserted into a collection.
    pub fn filters_mut(&mut self) -> &mut Filters {
        &mut self.filters
    }

    /// Configures a filter.
    ///
    /// Fails if the filter can't be used on this bonus type
    /// or if the value doesn't have the shape the filter expects.
    pub fn set_filter(&mut self, kind: FilterKind, value: FilterValue) -> BabonusResult<()> {
        filter::check(kind, &value, self.bonus_type)?;
        self.filters.insert(kind, value);
        Ok(())
    }

    /// Builder flavour of `set_filter`.
    pub fn with_filter(mut self, kind: FilterKind, value: FilterValue) -> BabonusResult<Self> {
        self.set_filter(kind, value)?;
        Ok(self)
    }

    /// Removes a filter, leaving the bonus unconstrained by it.
    pub fn remove_filter(&mut self, kind: FilterKind) -> Option<FilterValue> {
        self.filters.remove(kind)
    }

    /// Returns the consumption rules.
    pub fn consumption(&self) -> &Consumption {
        &self.consumption
    }

    /// Sets the consumption rules.
    pub fn set_consumption(&mut self, consumption: Consumption) {
        self.consumption = consumption;
    }

    /// Returns the aura rules.
    pub fn aura(&self) -> &Aura {
        &self.aura
    }

    /// Sets the aura rules.
    pub fn set_aura(&mut self, aura: Aura) {
        self.aura = aura;
    }

    /// Returns the modifiers.
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// Sets the modifiers.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Returns the sort key.
    pub fn sort(&self) -> i64 {
        self.sort
    }

    /// Sets the sort key.
    pub fn set_sort(&mut self, sort: i64) {
        self.sort = sort;
    }

    /// Returns the damage type of a damage bonus.
    pub fn damage_type(&self) -> Option<&str> {
        self.damage_type.as_deref()
    }

    /// Sets the damage type. Only damage bonuses have one.
    pub fn set_damage_type<S: Into<String>>(&mut self, damage_type: S) -> BabonusResult<()> {
        self.require_type("damageType", &[BonusType::DamageRoll])?;
        self.damage_type = Some(damage_type.into());
        Ok(())
    }

    /// Returns `true` if this damage bonus only applies to critical hits.
    pub fn critical(&self) -> bool {
        self.critical
    }

    /// Restricts a damage bonus to critical hits.
    pub fn set_critical(&mut self, critical: bool) -> BabonusResult<()> {
        self.require_type("critical", &[BonusType::DamageRoll])?;
        self.critical = critical;
        Ok(())
    }

    /// Returns the abilities this bonus is restricted to.
    pub fn abilities(&self) -> &BTreeSet<String> {
        &self.abilities
    }

    /// Restricts a saving throw or ability check bonus to the given abilities.
    pub fn set_abilities<I, S>(&mut self, abilities: I) -> BabonusResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_type(
            "abilities",
            &[BonusType::SavingThrow, BonusType::AbilityCheck],
        )?;
        self.abilities = abilities.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// Returns the skills this bonus is restricted to.
    pub fn skills(&self) -> &BTreeSet<String> {
        &self.skills
    }

    /// Restricts an ability check bonus to the given skills.
    pub fn set_skills<I, S>(&mut self, skills: I) -> BabonusResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_type("skills", &[BonusType::AbilityCheck])?;
        self.skills = skills.into_iter().map(Into::into).collect();
        Ok(())
    }

    fn require_type(&self, field: &'static str, allowed: &[BonusType]) -> BabonusResult<()> {
        if allowed.contains(&self.bonus_type) {
            Ok(())
        } else {
            Err(BabonusError::FieldNotApplicable(field, self.bonus_type))
        }
    }

    /// Checks that every known filter and type specific field fits the type of this bonus.
    ///
    /// Unknown filter names are ignored.
    pub fn validate(&self) -> BabonusResult<()> {
        for (kind, value) in self.filters.known() {
            filter::check(kind, value, self.bonus_type)?;
        }
        if self.damage_type.is_some() || self.critical {
            self.require_type(
                if self.critical { "critical" } else { "damageType" },
                &[BonusType::DamageRoll],
            )?;
        }
        if !self.abilities.is_empty() {
            self.require_type(
                "abilities",
                &[BonusType::SavingThrow, BonusType::AbilityCheck],
            )?;
        }
        if !self.skills.is_empty() {
            self.require_type("skills", &[BonusType::AbilityCheck])?;
        }
        Ok(())
    }

    /// Returns `true` if this bonus applies to the roll described by `context`.
    ///
    /// A disabled bonus never applies. Otherwise every configured filter must pass,
    /// followed by the type specific fields.
    pub fn applies(&self, context: &RollContext) -> bool {
        if !self.enabled {
            return false;
        }
        if !filter::applies(self, context) {
            return false;
        }
        if !self.abilities.is_empty()
            && !context
                .ability
                .as_ref()
                .map_or(false, |ability| self.abilities.contains(ability))
        {
            return false;
        }
        if !self.skills.is_empty()
            && !context
                .skill
                .as_ref()
                .map_or(false, |skill| self.skills.contains(skill))
        {
            return false;
        }
        !(self.critical && self.bonus_type == BonusType::DamageRoll && !context.critical)
    }
}

impl Id for Bonus {
    type Id = BonusId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
