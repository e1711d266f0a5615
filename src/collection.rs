//! The bonuses owned by one document.

use crate::bonus::{Bonus, BonusId, BonusType};
use crate::error::{BabonusError, BabonusResult};
use crate::util::Id;
use indexmap::IndexMap;

/// Ordered collection of bonuses keyed by id.
///
/// Every bonus is validated against its type when inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BonusCollection {
    bonuses: IndexMap<BonusId, Bonus>,
}

impl BonusCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a bonus, replacing the one with the same id.
    pub fn insert(&mut self, bonus: Bonus) -> BabonusResult<BonusId> {
        bonus.validate()?;
        let id = bonus.id().clone();
        self.bonuses.insert(id.clone(), bonus);
        Ok(id)
    }

    /// Returns a bonus.
    pub fn get(&self, id: &BonusId) -> Option<&Bonus> {
        self.bonuses.get(id)
    }

    /// Returns a bonus, failing if it doesn't exist.
    pub fn require(&self, id: &BonusId) -> BabonusResult<&Bonus> {
        self.get(id)
            .ok_or_else(|| BabonusError::BonusNotFound(id.clone()))
    }

    /// Returns a mutable reference to a bonus.
    pub fn get_mut(&mut self, id: &BonusId) -> Option<&mut Bonus> {
        self.bonuses.get_mut(id)
    }

    /// Removes a bonus.
    pub fn remove(&mut self, id: &BonusId) -> Option<Bonus> {
        self.bonuses.shift_remove(id)
    }

    /// Returns all bonuses in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Bonus> {
        self.bonuses.values()
    }

    /// Returns the bonuses of one type.
    pub fn of_type(&self, bonus_type: BonusType) -> impl Iterator<Item = &Bonus> {
        self.iter()
            .filter(move |bonus| bonus.bonus_type() == bonus_type)
    }

    /// Returns all bonuses ordered by sort key, then by name.
    pub fn sorted(&self) -> Vec<&Bonus> {
        let mut bonuses: Vec<_> = self.iter().collect();
        bonuses.sort_by(|a, b| a.sort().cmp(&b.sort()).then_with(|| a.name().cmp(b.name())));
        bonuses
    }

    /// Returns the number of bonuses.
    pub fn len(&self) -> usize {
        self.bonuses.len()
    }

    /// Returns `true` if there is no bonus.
    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }
}

impl IntoIterator for BonusCollection {
    type Item = Bonus;
    type IntoIter = std::vec::IntoIter<Bonus>;

    fn into_iter(self) -> Self::IntoIter {
        self.bonuses
            .into_iter()
            .map(|(_, bonus)| bonus)
            .collect::<Vec<_>>()
            .into_iter()
    }
}
