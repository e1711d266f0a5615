//! Snapshots of the host documents bonuses live on and are evaluated against.
//!
//! Actors own items and active effects. Every one of them can carry a collection of bonuses,
//! addressed through a [DocumentRef](enum.DocumentRef.html).

use crate::roll::RollData;
use crate::scene::TokenId;
use crate::util::Id;
use indexmap::IndexMap;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

string_id! {
    /// Identifies an actor.
    ActorId
}

string_id! {
    /// Identifies an item within its actor.
    ItemId
}

string_id! {
    /// Identifies an active effect within its actor.
    EffectId
}

/// Address of a document able to own bonuses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum DocumentRef {
    /// An actor.
    Actor(ActorId),
    /// An item owned by an actor.
    Item(ActorId, ItemId),
    /// An active effect owned by an actor.
    Effect(ActorId, EffectId),
    /// A scene region.
    Region(String),
}

impl DocumentRef {
    /// Returns the actor this document belongs to, if any.
    pub fn actor(&self) -> Option<&ActorId> {
        match self {
            DocumentRef::Actor(actor)
            | DocumentRef::Item(actor, _)
            | DocumentRef::Effect(actor, _) => Some(actor),
            DocumentRef::Region(_) => None,
        }
    }

    /// Returns the item id, if this is an item.
    pub fn item(&self) -> Option<&ItemId> {
        match self {
            DocumentRef::Item(_, item) => Some(item),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRef::Actor(actor) => write!(f, "Actor.{}", actor),
            DocumentRef::Item(actor, item) => write!(f, "Actor.{}.Item.{}", actor, item),
            DocumentRef::Effect(actor, effect) => {
                write!(f, "Actor.{}.ActiveEffect.{}", actor, effect)
            }
            DocumentRef::Region(region) => write!(f, "Region.{}", region),
        }
    }
}

/// A value with a maximum, such as hit points or item uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Pool {
    /// Current value.
    pub value: i64,
    /// Maximum value.
    pub max: i64,
}

impl Pool {
    /// Creates a full pool.
    pub fn full(max: i64) -> Self {
        Self { value: max, max }
    }

    /// Creates a pool with the given value.
    pub fn new(value: i64, max: i64) -> Self {
        Self { value, max }
    }
}

/// Proficiencies of one category: a set of type keys plus free-form custom names.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Proficiency {
    /// Known type keys, e.g. `sim`, `mar` or `lgt`.
    pub values: BTreeSet<String>,
    /// Custom proficiencies separated by `;`, matched against item names.
    pub custom: String,
}

impl Proficiency {
    /// Returns `true` if `key` is among the known values.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains(key)
    }

    /// Returns `true` if one of the custom entries is contained in `name`, ignoring case.
    pub fn matches_custom(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.custom
            .to_lowercase()
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .any(|entry| name.contains(entry))
    }
}

/// Weapon, armor and tool proficiencies of an actor.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Traits {
    /// Weapon proficiencies.
    pub weapons: Proficiency,
    /// Armor proficiencies.
    pub armor: Proficiency,
    /// Tool proficiencies.
    pub tools: Proficiency,
}

/// A class of the actor, used for hit dice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ClassData {
    /// Display name.
    pub name: String,
    /// Levels in this class.
    pub levels: i64,
    /// Hit dice already spent.
    pub hit_dice_used: i64,
}

impl ClassData {
    /// Creates a class with no hit dice spent.
    pub fn new<S: Into<String>>(name: S, levels: i64) -> Self {
        Self {
            name: name.into(),
            levels,
            hit_dice_used: 0,
        }
    }
}

/// An actor: a character or a creature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Actor {
    /// Id of this actor.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Owned items.
    pub items: IndexMap<ItemId, Item>,
    /// Owned active effects.
    pub effects: IndexMap<EffectId, Effect>,
    /// Token of this actor on the active scene.
    pub token: Option<TokenId>,
    /// Proficiencies.
    pub traits: Traits,
    /// Values referenced by formulas.
    pub roll_data: RollData,
    /// Attributes with a value and a maximum, e.g. `hp`.
    pub attributes: IndexMap<String, Pool>,
    /// Sheet resources, e.g. `primary`.
    pub resources: IndexMap<String, Pool>,
    /// Coins by denomination.
    pub currency: IndexMap<String, i64>,
    /// Classes by identifier.
    pub classes: IndexMap<String, ClassData>,
    /// Spell slots keyed as `spell1` to `spell9`.
    pub spell_slots: IndexMap<String, Pool>,
}

impl Actor {
    /// Creates an actor with nothing on it.
    pub fn new<I: Into<ActorId>, S: Into<String>>(id: I, name: S) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: IndexMap::new(),
            effects: IndexMap::new(),
            token: None,
            traits: Traits::default(),
            roll_data: RollData::new(),
            attributes: IndexMap::new(),
            resources: IndexMap::new(),
            currency: IndexMap::new(),
            classes: IndexMap::new(),
            spell_slots: IndexMap::new(),
        }
    }

    /// Adds an item.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    /// Adds an active effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.insert(effect.id.clone(), effect);
        self
    }

    /// Links a token.
    pub fn with_token<T: Into<TokenId>>(mut self, token: T) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the roll data.
    pub fn with_roll_data(mut self, roll_data: RollData) -> Self {
        self.roll_data = roll_data;
        self
    }

    /// Sets the proficiencies.
    pub fn with_traits(mut self, traits: Traits) -> Self {
        self.traits = traits;
        self
    }

    /// Returns an item of this actor.
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// Returns the statuses granted by all enabled effects.
    pub fn statuses(&self) -> BTreeSet<&str> {
        self.effects
            .values()
            .filter(|effect| !effect.disabled)
            .flat_map(|effect| effect.statuses.iter().map(String::as_str))
            .collect()
    }

    /// Returns `true` if an enabled effect grants `status`.
    pub fn has_status(&self, status: &str) -> bool {
        self.effects
            .values()
            .any(|effect| !effect.disabled && effect.statuses.contains(status))
    }

    /// Returns `true` if this actor is proficient with the given weapon, armor or tool.
    ///
    /// Other kinds of items are never proficient.
    pub fn is_proficient_with(&self, item: &Item) -> bool {
        match item.kind {
            ItemKind::Weapon => {
                let weapons = &self.traits.weapons;
                if let Some(weapon_type) = &item.weapon_type {
                    if weapons.has(weapon_type) {
                        return true;
                    }
                }
                let category = if item.properties.contains("mar") {
                    "mar"
                } else {
                    "sim"
                };
                weapons.has(category) || weapons.matches_custom(&item.name)
            }
            ItemKind::Equipment => match &item.armor_type {
                Some(armor) if armor == "shield" => false,
                Some(armor) => {
                    self.traits.armor.has(armor) || self.traits.armor.matches_custom(&item.name)
                }
                None => false,
            },
            ItemKind::Tool => {
                let tools = &self.traits.tools;
                item.tool_type.as_ref().map_or(false, |tool| tools.has(tool))
                    || tools.matches_custom(&item.name)
            }
            _ => false,
        }
    }

    /// Returns the roll data of this actor, merged with `item`'s data under `item.`.
    pub fn roll_data_for(&self, item: Option<&Item>) -> RollData {
        let mut data = self.roll_data.clone();
        if let Some(item) = item {
            data.merge_prefixed("item", &item.roll_data);
        }
        data
    }
}

impl Id for Actor {
    type Id = ActorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Kinds of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum ItemKind {
    /// A weapon.
    Weapon,
    /// Armor, shields, trinkets.
    Equipment,
    /// Potions, scrolls, ammunition.
    Consumable,
    /// A tool.
    Tool,
    /// Loot.
    Loot,
    /// A background.
    Background,
    /// A class.
    Class,
    /// A subclass.
    Subclass,
    /// A spell.
    Spell,
    /// A feature.
    Feat,
    /// A container.
    Backpack,
}

impl ItemKind {
    /// All item kinds.
    pub const ALL: [ItemKind; 11] = [
        ItemKind::Weapon,
        ItemKind::Equipment,
        ItemKind::Consumable,
        ItemKind::Tool,
        ItemKind::Loot,
        ItemKind::Background,
        ItemKind::Class,
        ItemKind::Subclass,
        ItemKind::Spell,
        ItemKind::Feat,
        ItemKind::Backpack,
    ];

    /// Returns the key used by filters.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Weapon => "weapon",
            ItemKind::Equipment => "equipment",
            ItemKind::Consumable => "consumable",
            ItemKind::Tool => "tool",
            ItemKind::Loot => "loot",
            ItemKind::Background => "background",
            ItemKind::Class => "class",
            ItemKind::Subclass => "subclass",
            ItemKind::Spell => "spell",
            ItemKind::Feat => "feat",
            ItemKind::Backpack => "backpack",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Components of a spell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SpellComponents {
    /// Verbal.
    pub vocal: bool,
    /// Somatic.
    pub somatic: bool,
    /// Material.
    pub material: bool,
    /// Requires concentration.
    pub concentration: bool,
    /// Can be cast as a ritual.
    pub ritual: bool,
}

impl SpellComponents {
    /// Returns whether the component with the given key (`v`, `s` or `m`) is present.
    pub fn has(&self, key: &str) -> Option<bool> {
        match key {
            "v" | "vocal" => Some(self.vocal),
            "s" | "somatic" => Some(self.somatic),
            "m" | "material" => Some(self.material),
            _ => None,
        }
    }
}

/// Spell specific data.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SpellData {
    /// Spell level, 0 for cantrips.
    pub level: i64,
    /// School key, e.g. `evo`.
    pub school: String,
    /// Components.
    pub components: SpellComponents,
    /// Whether the spell is prepared.
    pub prepared: bool,
}

/// One part of an item's damage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DamagePart {
    /// Damage formula.
    pub formula: String,
    /// Damage type key, e.g. `fire`.
    pub damage_type: String,
}

/// Attunement state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "camelCase"))]
pub enum Attunement {
    /// The item doesn't require attunement.
    None,
    /// The item requires attunement but isn't attuned.
    Required,
    /// The item is attuned.
    Attuned,
}

impl Default for Attunement {
    fn default() -> Self {
        Attunement::None
    }
}

/// An item owned by an actor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Item {
    /// Id of this item.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Kind of the item.
    pub kind: ItemKind,
    /// Weapon type key, e.g. `martialM`.
    pub weapon_type: Option<String>,
    /// Weapon properties, e.g. `fin` or `mar`.
    pub properties: BTreeSet<String>,
    /// Armor type key, e.g. `light` or `shield`.
    pub armor_type: Option<String>,
    /// Tool type key.
    pub tool_type: Option<String>,
    /// Spell data, for spells.
    pub spell: Option<SpellData>,
    /// Damage parts.
    pub damage_parts: Vec<DamagePart>,
    /// Whether the item is equipped.
    pub equipped: bool,
    /// Attunement state.
    pub attunement: Attunement,
    /// Limited uses.
    pub uses: Option<Pool>,
    /// Item whose uses are spent as charges when this item is used.
    pub consume_target: Option<ItemId>,
    /// Values referenced by formulas as `@item.path`.
    pub roll_data: RollData,
}

impl Item {
    /// Creates an item of the given kind.
    pub fn new<I: Into<ItemId>, S: Into<String>>(id: I, name: S, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            weapon_type: None,
            properties: BTreeSet::new(),
            armor_type: None,
            tool_type: None,
            spell: None,
            damage_parts: Vec::new(),
            equipped: false,
            attunement: Attunement::None,
            uses: None,
            consume_target: None,
            roll_data: RollData::new(),
        }
    }

    /// Creates a weapon.
    pub fn weapon<I: Into<ItemId>, S: Into<String>, T: Into<String>>(
        id: I,
        name: S,
        weapon_type: T,
    ) -> Self {
        let mut item = Self::new(id, name, ItemKind::Weapon);
        item.weapon_type = Some(weapon_type.into());
        item
    }

    /// Creates a spell.
    pub fn spell<I: Into<ItemId>, S: Into<String>>(id: I, name: S, data: SpellData) -> Self {
        let mut item = Self::new(id, name, ItemKind::Spell);
        item.spell = Some(data);
        item
    }

    /// Creates a piece of armor.
    pub fn armor<I: Into<ItemId>, S: Into<String>, T: Into<String>>(
        id: I,
        name: S,
        armor_type: T,
    ) -> Self {
        let mut item = Self::new(id, name, ItemKind::Equipment);
        item.armor_type = Some(armor_type.into());
        item
    }

    /// Adds a damage part.
    pub fn with_damage<F: Into<String>, D: Into<String>>(mut self, formula: F, damage_type: D) -> Self {
        self.damage_parts.push(DamagePart {
            formula: formula.into(),
            damage_type: damage_type.into(),
        });
        self
    }

    /// Adds a weapon property.
    pub fn with_property<P: Into<String>>(mut self, property: P) -> Self {
        self.properties.insert(property.into());
        self
    }

    /// Sets whether the item is equipped.
    pub fn equipped(mut self, equipped: bool) -> Self {
        self.equipped = equipped;
        self
    }

    /// Returns `true` if the item is attuned.
    pub fn is_attuned(&self) -> bool {
        self.attunement == Attunement::Attuned
    }

    /// Returns the damage types of all damage parts.
    pub fn damage_types(&self) -> impl Iterator<Item = &str> {
        self.damage_parts.iter().map(|part| part.damage_type.as_str())
    }
}

impl Id for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An active effect applied to an actor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Effect {
    /// Id of this effect.
    pub id: EffectId,
    /// Display name.
    pub name: String,
    /// Statuses granted while the effect is enabled.
    pub statuses: BTreeSet<String>,
    /// Disabled effects grant nothing.
    pub disabled: bool,
}

impl Effect {
    /// Creates an enabled effect granting no status.
    pub fn new<I: Into<EffectId>, S: Into<String>>(id: I, name: S) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            statuses: BTreeSet::new(),
            disabled: false,
        }
    }

    /// Creates an enabled effect granting a single status named after it.
    pub fn status<I: Into<EffectId>>(id: I, status: &str) -> Self {
        Self::new(id, status).with_status(status)
    }

    /// Adds a status.
    pub fn with_status<S: Into<String>>(mut self, status: S) -> Self {
        self.statuses.insert(status.into());
        self
    }
}

impl Id for Effect {
    type Id = EffectId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Actor {
        let mut traits = Traits::default();
        traits.weapons.values.insert("sim".to_string());
        traits.weapons.custom = "Whip; Hand Crossbow".to_string();
        traits.armor.values.insert("light".to_string());
        Actor::new("a1", "Fighter").with_traits(traits)
    }

    #[test]
    fn weapon_proficiency() {
        let actor = fighter();
        assert!(actor.is_proficient_with(&Item::weapon("i1", "Club", "simpleM")));
        let longsword = Item::weapon("i2", "Longsword", "martialM").with_property("mar");
        assert!(!actor.is_proficient_with(&longsword));
        let whip = Item::weapon("i3", "Silver Whip", "martialM").with_property("mar");
        assert!(actor.is_proficient_with(&whip));
    }

    #[test]
    fn armor_proficiency() {
        let actor = fighter();
        assert!(actor.is_proficient_with(&Item::armor("i1", "Leather", "light")));
        assert!(!actor.is_proficient_with(&Item::armor("i2", "Plate", "heavy")));
        assert!(!actor.is_proficient_with(&Item::armor("i3", "Shield", "shield")));
        assert!(!actor.is_proficient_with(&Item::new("i4", "Ring", ItemKind::Equipment)));
    }

    #[test]
    fn statuses_of_enabled_effects() {
        let mut hidden = Effect::status("e2", "invisible");
        hidden.disabled = true;
        let actor = fighter()
            .with_effect(Effect::status("e1", "prone"))
            .with_effect(hidden);
        assert!(actor.has_status("prone"));
        assert!(!actor.has_status("invisible"));
        assert_eq!(actor.statuses().into_iter().collect::<Vec<_>>(), vec!["prone"]);
    }

    #[test]
    fn document_display() {
        let item = DocumentRef::Item("a1".into(), "i1".into());
        assert_eq!(item.to_string(), "Actor.a1.Item.i1");
        assert_eq!(item.actor(), Some(&ActorId::new("a1")));
        assert_eq!(DocumentRef::Region("r".to_string()).actor(), None);
    }
}
