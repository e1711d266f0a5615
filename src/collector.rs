//! Gathering of the bonuses applicable to a roll.

use crate::bonus::{Bonus, BonusType};
use crate::context::RollContext;
use crate::document::{Actor, DocumentRef};
use crate::repository::BonusRepository;
use crate::world::World;
use std::collections::HashSet;

/// A bonus found applicable, together with the document owning it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedBonus {
    /// The bonus.
    pub bonus: Bonus,
    /// The document the bonus lives on.
    pub owner: DocumentRef,
    /// Whether the bonus reached the roll as the aura of another token.
    pub aura: bool,
}

/// Returns the actor and every item and enabled effect it owns.
pub fn owned_documents(actor: &Actor) -> Vec<DocumentRef> {
    let mut documents = vec![DocumentRef::Actor(actor.id.clone())];
    documents.extend(
        actor
            .items
            .keys()
            .map(|item| DocumentRef::Item(actor.id.clone(), item.clone())),
    );
    documents.extend(
        actor
            .effects
            .values()
            .filter(|effect| !effect.disabled)
            .map(|effect| DocumentRef::Effect(actor.id.clone(), effect.id.clone())),
    );
    documents
}

/// Collects every bonus of type `bonus_type` applicable to the roll described by `context`.
///
/// The bonuses of the rolling actor, its items and its effects come first. Then every other
/// token of the active scene is visited, picking the aura bonuses that reach the roller's
/// token. Optional bonuses are included; the result has no particular order.
pub fn collect(
    bonus_type: BonusType,
    context: &RollContext,
    world: &World,
    repository: &dyn BonusRepository,
) -> Vec<CollectedBonus> {
    let actor = context.actor;
    let own_token = world.token_of(actor);
    let actor_statuses = actor.statuses();
    let mut collected = Vec::new();

    for owner in owned_documents(actor) {
        for bonus in candidates(bonus_type, &owner, repository) {
            let aura = bonus.aura();
            if aura.enabled && !aura.template {
                let reaches_self = match (world.scene(), own_token) {
                    (Some(scene), Some(token)) => {
                        aura.applies(scene, token, token, actor_statuses.iter())
                    }
                    _ => aura.self_,
                };
                if !reaches_self {
                    log::debug!("aura `{}` doesn't affect its owner", bonus.name());
                    continue;
                }
            }
            if bonus.applies(context) {
                log::debug!("collected `{}` from {}", bonus.name(), owner);
                collected.push(CollectedBonus {
                    bonus,
                    owner: owner.clone(),
                    aura: false,
                });
            }
        }
    }

    if let (Some(scene), Some(target)) = (world.scene(), own_token) {
        // An actor with several tokens radiates its auras from the first one only.
        let mut visited = HashSet::new();
        for token in scene.tokens() {
            if token.id == target.id {
                continue;
            }
            let source = match token.actor.as_ref().and_then(|id| world.actor(id)) {
                Some(source) if source.id != actor.id => source,
                _ => continue,
            };
            if !visited.insert(&source.id) {
                continue;
            }
            for owner in owned_documents(source) {
                for bonus in candidates(bonus_type, &owner, repository) {
                    let aura = bonus.aura();
                    if !aura.enabled || aura.template {
                        continue;
                    }
                    if !aura.applies(scene, token, target, actor_statuses.iter()) {
                        continue;
                    }
                    if bonus.applies(context) {
                        log::debug!("collected aura `{}` from {}", bonus.name(), owner);
                        collected.push(CollectedBonus {
                            bonus,
                            owner: owner.clone(),
                            aura: true,
                        });
                    }
                }
            }
        }
    }

    collected
}

/// Loads the enabled bonuses of one type from a document, skipping unreadable collections.
fn candidates(
    bonus_type: BonusType,
    owner: &DocumentRef,
    repository: &dyn BonusRepository,
) -> Vec<Bonus> {
    match repository.load(owner) {
        Ok(bonuses) => bonuses
            .into_iter()
            .filter(|bonus| bonus.bonus_type() == bonus_type && bonus.enabled())
            .collect(),
        Err(err) => {
            log::warn!("cannot read the bonuses of {}: {}", owner, err);
            Vec::new()
        }
    }
}
