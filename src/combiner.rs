//! Evaluation of the applicable bonuses and their combination into the roll.

use crate::bonus::Bonus;
use crate::collector::CollectedBonus;
use crate::context::RollContext;
use crate::document::DocumentRef;
use crate::error::BabonusResult;
use crate::modifiers::{ModifierTarget, Modifiers};
use crate::roll::{Roll, RollData, RollEvaluator};
use crate::world::World;

/// A bonus selected for a roll, with the amount of its resource spent on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedBonus {
    /// The bonus and its owner.
    pub collected: CollectedBonus,
    /// Amount consumed, if the bonus consumed anything.
    pub consumed: Option<i64>,
}

impl From<CollectedBonus> for SelectedBonus {
    fn from(collected: CollectedBonus) -> Self {
        Self {
            collected,
            consumed: None,
        }
    }
}

/// The value one bonus added to a roll.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    /// Name of the bonus.
    pub name: String,
    /// Owner of the bonus.
    pub owner: DocumentRef,
    /// Value added.
    pub value: i64,
    /// Damage type, for damage bonuses.
    pub damage_type: Option<String>,
}

/// The outcome of combining the bonuses of a roll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Combination {
    /// Every non zero contribution.
    pub contributions: Vec<Contribution>,
    /// Sum of the contributions, after roll modifiers.
    pub total: i64,
}

/// Returns the data formulas of bonuses owned by `owner` are evaluated against:
/// the owning actor's data, merged with the owning item's data under `item.`.
pub fn owner_data(world: &World, owner: &DocumentRef) -> RollData {
    let actor = match owner.actor().and_then(|id| world.actor(id)) {
        Some(actor) => actor,
        None => return RollData::new(),
    };
    let item = owner.item().and_then(|id| actor.item(id));
    actor.roll_data_for(item)
}

/// Evaluates the value of one bonus, scaling and modifiers included.
///
/// Roll targeted modifiers are not applied here.
pub fn evaluate(
    bonus: &Bonus,
    owner: &DocumentRef,
    consumed: Option<i64>,
    world: &World,
    context: &RollContext,
    evaluator: &mut dyn RollEvaluator,
) -> BabonusResult<i64> {
    let data = owner_data(world, owner);
    let mut value = if bonus.formula().trim().is_empty() {
        0
    } else {
        evaluator.evaluate(bonus.formula(), &data)?.total()
    };

    let consumption = bonus.consumption();
    if let Some(amount) = consumed {
        if consumption.is_active() && consumption.scales {
            let mut scaled = data.clone();
            scaled.merge(&consumption.scale_data(amount));
            value += evaluator.evaluate(&consumption.formula, &scaled)?.total();
        }
    }

    let modifiers = bonus.modifiers();
    if modifiers.is_active() {
        value = match modifiers.target {
            ModifierTarget::Roll => value,
            ModifierTarget::Actor => {
                let data = owner
                    .actor()
                    .and_then(|id| world.actor(id))
                    .map(|actor| actor.roll_data.clone())
                    .unwrap_or_default();
                modifiers.apply(value, evaluator, &data)
            }
            ModifierTarget::Item => modifiers.apply(value, evaluator, &data),
            ModifierTarget::Target => {
                let data = context
                    .target
                    .map(|target| target.roll_data.clone())
                    .unwrap_or_default();
                modifiers.apply(value, evaluator, &data)
            }
        };
    }
    Ok(value)
}

/// Evaluates and sums the selected bonuses.
///
/// A bonus whose formula fails is logged and counts as zero. Zero contributions are skipped.
/// Roll targeted modifiers then post-process the sum, lowest priority first, against the
/// data of the roll.
pub fn combine(
    selected: &[SelectedBonus],
    world: &World,
    context: &RollContext,
    evaluator: &mut dyn RollEvaluator,
) -> Combination {
    let mut combination = Combination::default();
    let mut roll_modifiers: Vec<&Modifiers> = Vec::new();

    for SelectedBonus { collected, consumed } in selected {
        let bonus = &collected.bonus;
        let value = match evaluate(bonus, &collected.owner, *consumed, world, context, evaluator) {
            Ok(value) => value,
            Err(err) => {
                log::error!("bonus `{}` counts as zero: {}", bonus.name(), err);
                continue;
            }
        };
        let modifiers = bonus.modifiers();
        if modifiers.is_active() && modifiers.target == ModifierTarget::Roll {
            roll_modifiers.push(modifiers);
        }
        if value == 0 {
            continue;
        }
        combination.total += value;
        combination.contributions.push(Contribution {
            name: bonus.name().to_string(),
            owner: collected.owner.clone(),
            value,
            damage_type: bonus.damage_type().map(str::to_string),
        });
    }

    if !roll_modifiers.is_empty() {
        roll_modifiers.sort_by_key(|modifiers| modifiers.priority);
        let data = context.actor.roll_data_for(context.item);
        for modifiers in roll_modifiers {
            combination.total = modifiers.apply(combination.total, evaluator, &data);
        }
    }
    combination
}

/// Appends `total` to the formula of `roll`, evaluates the result and replaces the roll.
///
/// Returns `false`, leaving the roll untouched, if `total` is zero.
pub fn splice(
    roll: &mut Roll,
    total: i64,
    data: &RollData,
    evaluator: &mut dyn RollEvaluator,
) -> BabonusResult<bool> {
    if total == 0 {
        return Ok(false);
    }
    let formula = roll.amended_formula(total);
    let amended = evaluator.evaluate(&formula, data)?;
    roll.splice(amended);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusType;
    use crate::document::Actor;
    use crate::roll::DiceRoller;
    use crate::rules::entropy::FixedLow;

    #[test]
    fn zero_total_leaves_roll_untouched() {
        let mut roller = DiceRoller::<FixedLow<i64>>::default();
        let mut roll = Roll::new("1d20", Vec::new(), 12);
        let before = roll.clone();
        assert_eq!(splice(&mut roll, 0, &RollData::new(), &mut roller), Ok(false));
        assert_eq!(roll, before);
    }

    #[test]
    fn roll_modifiers_apply_by_priority() {
        use crate::modifiers::{ModifierMode, Priority};
        let actor = Actor::new("a", "A");
        let world = World::with_actors(vec![actor.clone()]);
        let context = RollContext::new(&actor);
        let owner = DocumentRef::Actor(actor.id.clone());
        let mut doubled = Bonus::create(BonusType::AttackRoll, "double").with_formula("0");
        let mut double = Modifiers::new("2", ModifierTarget::Roll, ModifierMode::Multiply);
        double.priority = Priority::High;
        doubled.set_modifiers(double);
        let mut capped = Bonus::create(BonusType::AttackRoll, "cap").with_formula("3");
        capped.set_modifiers(Modifiers::new("4", ModifierTarget::Roll, ModifierMode::Downgrade));
        let selected: Vec<SelectedBonus> = vec![doubled, capped]
            .into_iter()
            .map(|bonus| {
                SelectedBonus::from(CollectedBonus {
                    bonus,
                    owner: owner.clone(),
                    aura: false,
                })
            })
            .collect();
        let mut roller = DiceRoller::<FixedLow<i64>>::default();
        let combination = combine(&selected, &world, &context, &mut roller);
        // min(3, 4) * 2
        assert_eq!(combination.total, 6);
        assert_eq!(combination.contributions.len(), 1);
    }
}
