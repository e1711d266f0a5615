//! Storage of bonuses and markers attached to documents.

use crate::bonus::{Bonus, BonusId};
use crate::collection::BonusCollection;
use crate::document::{ActorId, DocumentRef};
use crate::error::{BabonusError, BabonusResult};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Access to the bonuses stored on documents.
///
/// Implementors only provide whole-collection reads and writes; editing operations are
/// derived from them. Concurrent writers of the same document overwrite each other.
pub trait BonusRepository {
    /// Loads the bonuses owned by a document. A document without bonuses yields an
    /// empty collection.
    fn load(&self, owner: &DocumentRef) -> BabonusResult<BonusCollection>;

    /// Replaces the bonuses owned by a document.
    fn save(&mut self, owner: &DocumentRef, bonuses: BonusCollection) -> BabonusResult<()>;

    /// Loads the markers placed on an actor.
    fn load_markers(&self, actor: &ActorId) -> BabonusResult<BTreeSet<String>>;

    /// Replaces the markers placed on an actor.
    fn save_markers(&mut self, actor: &ActorId, markers: BTreeSet<String>) -> BabonusResult<()>;

    /// Adds a bonus to a document, replacing any bonus with the same id.
    fn embed(&mut self, owner: &DocumentRef, bonus: Bonus) -> BabonusResult<BonusId> {
        let mut bonuses = self.load(owner)?;
        let id = bonuses.insert(bonus)?;
        self.save(owner, bonuses)?;
        Ok(id)
    }

    /// Removes a bonus from a document.
    fn remove(&mut self, owner: &DocumentRef, id: &BonusId) -> BabonusResult<Bonus> {
        let mut bonuses = self.load(owner)?;
        let bonus = bonuses
            .remove(id)
            .ok_or_else(|| BabonusError::BonusNotFound(id.clone()))?;
        self.save(owner, bonuses)?;
        Ok(bonus)
    }

    /// Returns a copy of a bonus.
    fn find(&self, owner: &DocumentRef, id: &BonusId) -> BabonusResult<Bonus> {
        self.load(owner)?.require(id).map(Clone::clone)
    }

    /// Flips the enabled state of a bonus and returns the new state.
    fn toggle(&mut self, owner: &DocumentRef, id: &BonusId) -> BabonusResult<bool> {
        let mut bonuses = self.load(owner)?;
        let bonus = bonuses
            .get_mut(id)
            .ok_or_else(|| BabonusError::BonusNotFound(id.clone()))?;
        let enabled = !bonus.enabled();
        bonus.set_enabled(enabled);
        self.save(owner, bonuses)?;
        log::info!(
            "bonus `{}` on {} {}",
            id,
            owner,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(enabled)
    }

    /// Adds markers to an actor.
    fn apply_markers<I, S>(&mut self, actor: &ActorId, markers: I) -> BabonusResult<()>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current = self.load_markers(actor)?;
        current.extend(markers.into_iter().map(Into::into));
        self.save_markers(actor, current)
    }
}

/// Repository keeping everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    bonuses: IndexMap<DocumentRef, BonusCollection>,
    markers: IndexMap<ActorId, BTreeSet<String>>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every document owning at least one bonus.
    pub fn owners(&self) -> impl Iterator<Item = &DocumentRef> {
        self.bonuses
            .iter()
            .filter(|(_, bonuses)| !bonuses.is_empty())
            .map(|(owner, _)| owner)
    }
}

impl BonusRepository for MemoryRepository {
    fn load(&self, owner: &DocumentRef) -> BabonusResult<BonusCollection> {
        Ok(self.bonuses.get(owner).cloned().unwrap_or_default())
    }

    fn save(&mut self, owner: &DocumentRef, bonuses: BonusCollection) -> BabonusResult<()> {
        self.bonuses.insert(owner.clone(), bonuses);
        Ok(())
    }

    fn load_markers(&self, actor: &ActorId) -> BabonusResult<BTreeSet<String>> {
        Ok(self.markers.get(actor).cloned().unwrap_or_default())
    }

    fn save_markers(&mut self, actor: &ActorId, markers: BTreeSet<String>) -> BabonusResult<()> {
        self.markers.insert(actor.clone(), markers);
        Ok(())
    }
}
