//! The engine wiring the hooks of the host's roll pipeline to the bonus machinery.

use crate::bonus::{Bonus, BonusId, BonusType};
use crate::collector::{self, CollectedBonus};
use crate::combiner::{self, Contribution, SelectedBonus};
use crate::context::RollContext;
use crate::document::{ActorId, DocumentRef};
use crate::error::{BabonusError, BabonusResult};
use crate::notification::{AppliedSummary, ChatSink};
use crate::registry::{Clock, Registry, RegistryId, RollSetup, SystemClock, DEFAULT_TIMEOUT};
use crate::repository::BonusRepository;
use crate::roll::{Roll, RollEvaluator};
use crate::util::Id;
use crate::world::World;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// User facing settings of the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Post a summary of the applied bonuses after each roll.
    pub show_applied: bool,
    /// Offer optional bonuses to the roller. When disabled, optional bonuses are never applied.
    pub show_optional: bool,
    /// How long a registered roll stays available.
    pub registry_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_applied: true,
            show_optional: true,
            registry_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// An optional bonus offered to the roller.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalOffer {
    /// The bonus.
    pub bonus: Bonus,
    /// The document owning the bonus.
    pub owner: DocumentRef,
    /// Whether the bonus reached the roll as the aura of another token.
    pub aura: bool,
    /// Value of the bonus before any scaling, zero if it can't be evaluated.
    pub value: i64,
    /// Properties the bonus can consume, empty if it consumes nothing.
    pub properties: Vec<String>,
}

/// What to consume to pay for an optional bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionChoice {
    /// The consumed property, e.g. `primary` or `3` for a third level slot.
    pub property: String,
    /// Amount consumed.
    pub amount: i64,
}

/// An optional bonus picked by the roller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalChoice {
    /// Id of the picked bonus.
    pub bonus: BonusId,
    /// Owner of the picked bonus.
    pub owner: DocumentRef,
    /// What to consume, required for bonuses with an active consumption.
    pub consume: Option<ConsumptionChoice>,
}

impl OptionalChoice {
    /// Picks an offered bonus without consuming anything.
    pub fn of(offer: &OptionalOffer) -> Self {
        Self {
            bonus: offer.bonus.id().clone(),
            owner: offer.owner.clone(),
            consume: None,
        }
    }

    /// Sets what to consume.
    pub fn consuming<S: Into<String>>(mut self, property: S, amount: i64) -> Self {
        self.consume = Some(ConsumptionChoice {
            property: property.into(),
            amount,
        });
        self
    }
}

/// Answer of the roller to the offered optional bonuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Abort: the roll must be left untouched.
    Cancel,
    /// Apply the chosen bonuses, possibly none.
    Apply(Vec<OptionalChoice>),
}

/// The step letting the roller pick optional bonuses, such as a dialog.
pub trait OptionalSelector {
    /// Asks the roller which of the `offers` to apply to a roll of type `kind`.
    fn select(&mut self, kind: BonusType, offers: &[OptionalOffer]) -> Selection;
}

/// What happened to a roll after its bonuses were processed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollOutcome {
    /// Every bonus added to the roll.
    pub applied: Vec<Contribution>,
    /// Total added to the roll.
    pub total: i64,
    /// Whether the roll was replaced.
    pub modified: bool,
    /// Whether the roller cancelled the selection of optional bonuses.
    pub cancelled: bool,
}

/// Entry point of the library.
///
/// The host calls `before_roll` when a roll is configured and `after_roll` once it has been
/// executed. Everything in between is read from the live `World` and from the repository.
pub struct Engine {
    repository: Box<dyn BonusRepository>,
    evaluator: Box<dyn RollEvaluator>,
    selector: Option<Box<dyn OptionalSelector>>,
    sink: Option<Box<dyn ChatSink>>,
    registry: Registry,
    settings: Settings,
}

impl Engine {
    /// Returns a builder to create an engine.
    pub fn builder<B, E>(repository: B, evaluator: E) -> EngineBuilder
    where
        B: BonusRepository + 'static,
        E: RollEvaluator + 'static,
    {
        EngineBuilder {
            repository: Box::new(repository),
            evaluator: Box::new(evaluator),
            selector: None,
            sink: None,
            clock: Arc::new(SystemClock::new()),
            settings: Settings::default(),
        }
    }

    /// Returns the repository.
    pub fn repository(&self) -> &dyn BonusRepository {
        &*self.repository
    }

    /// Returns a mutable reference to the repository.
    pub fn repository_mut(&mut self) -> &mut dyn BonusRepository {
        &mut *self.repository
    }

    /// Returns the registry of pending rolls.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns a mutable reference to the settings.
    ///
    /// The registry timeout is fixed once the engine is built.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Registers a roll about to be executed and returns its correlation id.
    pub fn before_roll(&self, setup: RollSetup) -> RegistryId {
        self.registry.register(setup)
    }

    /// Collects the bonuses applicable to the registered roll `id`, lets the roller pick the
    /// optional ones, pays for them and adds the total to `roll`.
    ///
    /// Failures of single bonuses are logged and never abort the roll. Errors are returned
    /// only if the roll isn't registered or its actor doesn't exist.
    pub fn after_roll(
        &mut self,
        world: &mut World,
        id: RegistryId,
        roll: &mut Roll,
    ) -> BabonusResult<RollOutcome> {
        let setup = self
            .registry
            .get(id)
            .ok_or(BabonusError::RollNotRegistered(id))?;

        let (mut selected, offers) = {
            let context = build_context(world, &setup, roll, id, &*self.repository)?;
            let collected = collector::collect(setup.kind, &context, world, &*self.repository);
            let (optional, automatic): (Vec<CollectedBonus>, Vec<CollectedBonus>) =
                collected.into_iter().partition(|found| found.bonus.optional());
            let offers: Vec<OptionalOffer> = if self.settings.show_optional && self.selector.is_some() {
                optional
                    .into_iter()
                    .map(|found| offer(found, world, &context, &mut *self.evaluator))
                    .collect()
            } else {
                Vec::new()
            };
            let selected: Vec<SelectedBonus> =
                automatic.into_iter().map(SelectedBonus::from).collect();
            (selected, offers)
        };

        if !offers.is_empty() {
            let selection = match self.selector.as_mut() {
                Some(selector) => selector.select(setup.kind, &offers),
                None => Selection::Apply(Vec::new()),
            };
            match selection {
                Selection::Cancel => {
                    log::debug!("optional bonuses of roll {} cancelled", id);
                    return Ok(RollOutcome {
                        cancelled: true,
                        ..RollOutcome::default()
                    });
                }
                Selection::Apply(choices) => {
                    selected.extend(pay(world, &offers, choices));
                }
            }
        }

        let (combination, data) = {
            let context = build_context(world, &setup, roll, id, &*self.repository)?;
            let combination = combiner::combine(&selected, world, &context, &mut *self.evaluator);
            (combination, context.actor.roll_data_for(context.item))
        };

        let modified = match combiner::splice(roll, combination.total, &data, &mut *self.evaluator)
        {
            Ok(modified) => modified,
            Err(err) => {
                log::error!("cannot add {} to roll {}: {}", combination.total, id, err);
                false
            }
        };

        if modified && self.settings.show_applied {
            if let Some(sink) = self.sink.as_mut() {
                sink.post(&AppliedSummary {
                    kind: setup.kind,
                    actor: setup.actor.clone(),
                    contributions: combination.contributions.clone(),
                    total: combination.total,
                });
            }
        }

        Ok(RollOutcome {
            applied: combination.contributions,
            total: combination.total,
            modified,
            cancelled: false,
        })
    }
}

/// Builder for `Engine`.
pub struct EngineBuilder {
    repository: Box<dyn BonusRepository>,
    evaluator: Box<dyn RollEvaluator>,
    selector: Option<Box<dyn OptionalSelector>>,
    sink: Option<Box<dyn ChatSink>>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl EngineBuilder {
    /// Sets the step offering optional bonuses. Without one, optional bonuses never apply.
    pub fn selector<S: OptionalSelector + 'static>(mut self, selector: S) -> EngineBuilder {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Sets the destination of roll summaries.
    pub fn sink<S: ChatSink + 'static>(mut self, sink: S) -> EngineBuilder {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Sets the clock used to expire registered rolls.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = clock;
        self
    }

    /// Sets the settings.
    pub fn settings(mut self, settings: Settings) -> EngineBuilder {
        self.settings = settings;
        self
    }

    /// Creates a new engine.
    pub fn build(self) -> Engine {
        Engine {
            repository: self.repository,
            evaluator: self.evaluator,
            selector: self.selector,
            sink: self.sink,
            registry: Registry::new(self.settings.registry_timeout, self.clock),
            settings: self.settings,
        }
    }
}

/// Builds the context of a registered roll from the live state of the world.
fn build_context<'a>(
    world: &'a World,
    setup: &RollSetup,
    roll: &'a Roll,
    id: RegistryId,
    repository: &dyn BonusRepository,
) -> BabonusResult<RollContext<'a>> {
    let actor = world.require_actor(&setup.actor)?;
    let mut context = RollContext::new(actor);
    if let Some(item_id) = &setup.item {
        match actor.item(item_id) {
            Some(item) => context = context.with_item(item),
            None => log::warn!("item `{}` of actor `{}` not found", item_id, actor.id),
        }
    }
    let target = setup.target.as_ref().and_then(|target| world.actor(target));
    context.target = target;
    context.ability = setup.ability.clone();
    context.skill = setup.skill.clone();
    context.critical = setup.critical;
    context.roll = Some(roll);
    context.registry_id = Some(id);
    context.actor_markers = markers(repository, &actor.id);
    if let Some(target) = target {
        context.target_markers = markers(repository, &target.id);
        context.distance = world.distance_between(actor, target);
    }
    Ok(context)
}

fn markers(repository: &dyn BonusRepository, actor: &ActorId) -> BTreeSet<String> {
    repository.load_markers(actor).unwrap_or_else(|err| {
        log::warn!("cannot read the markers of `{}`: {}", actor, err);
        Default::default()
    })
}

fn offer(
    found: CollectedBonus,
    world: &World,
    context: &RollContext,
    evaluator: &mut dyn RollEvaluator,
) -> OptionalOffer {
    let value = combiner::evaluate(&found.bonus, &found.owner, None, world, context, evaluator)
        .unwrap_or_else(|err| {
            log::error!("optional bonus `{}` counts as zero: {}", found.bonus.name(), err);
            0
        });
    let consumption = found.bonus.consumption();
    let properties = match consumption.consumption_type {
        Some(consumption_type) if consumption.is_active() => {
            let actor = found.owner.actor().and_then(|id| world.actor(id));
            match actor {
                Some(actor) => {
                    let item = found.owner.item().and_then(|id| actor.item(id));
                    consumption_type.properties(actor, item)
                }
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    };
    OptionalOffer {
        bonus: found.bonus,
        owner: found.owner,
        aura: found.aura,
        value,
        properties,
    }
}

/// Resolves the choices against the offers and pays for them.
/// Choices that don't match an offer, that repeat an earlier choice, or that can't be paid,
/// are dropped.
fn pay(world: &mut World, offers: &[OptionalOffer], choices: Vec<OptionalChoice>) -> Vec<SelectedBonus> {
    let mut selected = Vec::new();
    let mut resolved: HashSet<(DocumentRef, BonusId)> = HashSet::new();
    for choice in choices {
        if resolved.contains(&(choice.owner.clone(), choice.bonus.clone())) {
            log::warn!("bonus `{}` on {} was chosen twice", choice.bonus, choice.owner);
            continue;
        }
        let offer = match offers
            .iter()
            .find(|offer| offer.owner == choice.owner && *offer.bonus.id() == choice.bonus)
        {
            Some(offer) => offer,
            None => {
                log::warn!("bonus `{}` on {} was not offered", choice.bonus, choice.owner);
                continue;
            }
        };
        let consumption = offer.bonus.consumption();
        let consumed = if consumption.is_active() {
            let ConsumptionChoice { property, amount } = match choice.consume {
                Some(consume) => consume,
                None => {
                    log::warn!("bonus `{}` needs something to consume", offer.bonus.name());
                    continue;
                }
            };
            let paid = match offer.owner.actor().and_then(|id| world.actor_mut(id)) {
                Some(actor) => consumption.consume(actor, &offer.owner, &property, amount),
                None => Err(BabonusError::DocumentNotFound(offer.owner.clone())),
            };
            if let Err(err) = paid {
                log::warn!("bonus `{}` not applied: {}", offer.bonus.name(), err);
                continue;
            }
            Some(amount)
        } else {
            None
        };
        selected.push(SelectedBonus {
            collected: CollectedBonus {
                bonus: offer.bonus.clone(),
                owner: offer.owner.clone(),
                aura: offer.aura,
            },
            consumed,
        });
        resolved.insert((choice.owner, choice.bonus));
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aura_offer() -> OptionalOffer {
        OptionalOffer {
            bonus: Bonus::with_id("song", BonusType::AttackRoll, "Song").with_formula("2"),
            owner: DocumentRef::Actor("bard".into()),
            aura: true,
            value: 2,
            properties: Vec::new(),
        }
    }

    #[test]
    fn paid_choices_keep_their_origin() {
        let mut world = World::new();
        let offers = vec![aura_offer()];
        let choice = OptionalChoice::of(&offers[0]);
        let selected = pay(&mut world, &offers, vec![choice.clone(), choice]);
        assert_eq!(selected.len(), 1);
        assert!(selected[0].collected.aura);
        assert_eq!(selected[0].consumed, None);
    }
}
