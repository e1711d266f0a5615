//! Repository keeping bonuses in the JSON flags of documents.

use crate::bonus::Bonus;
use crate::collection::BonusCollection;
use crate::document::{ActorId, DocumentRef};
use crate::error::{BabonusError, BabonusResult};
use crate::repository::BonusRepository;
use crate::util::Id;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Namespace of the flags written by this library.
pub const NAMESPACE: &str = "babonus";
/// Key of the bonuses, an object from bonus id to bonus.
pub const BONUSES_KEY: &str = "bonuses";
/// Key of the markers, an array of strings on actors.
pub const MARKERS_KEY: &str = "markers";

/// Repository storing bonuses in the free form flags of each document, the way the host
/// persists them.
///
/// Entries that can't be read back as a valid bonus are skipped with a warning, so that a
/// single corrupted bonus doesn't hide the others.
#[derive(Debug, Clone, Default)]
pub struct FlagRepository {
    flags: IndexMap<DocumentRef, Value>,
}

impl FlagRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the whole flags object of a document.
    pub fn flags(&self, owner: &DocumentRef) -> Option<&Value> {
        self.flags.get(owner)
    }

    /// Replaces the whole flags object of a document, as when the host loads it.
    pub fn set_flags(&mut self, owner: DocumentRef, flags: Value) {
        self.flags.insert(owner, flags);
    }

    fn entry(&self, owner: &DocumentRef, key: &str) -> Option<&Value> {
        self.flags
            .get(owner)
            .and_then(|flags| flags.get(NAMESPACE))
            .and_then(|namespace| namespace.get(key))
    }

    fn write(&mut self, owner: &DocumentRef, key: &str, value: Value) -> BabonusResult<()> {
        let flags = self
            .flags
            .entry(owner.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let namespace = flags
            .as_object_mut()
            .ok_or_else(|| BabonusError::Storage(format!("flags of {} are not an object", owner)))?
            .entry(NAMESPACE)
            .or_insert_with(|| Value::Object(Map::new()));
        namespace
            .as_object_mut()
            .ok_or_else(|| {
                BabonusError::Storage(format!("`{}` flags of {} are not an object", NAMESPACE, owner))
            })?
            .insert(key.to_string(), value);
        Ok(())
    }
}

impl BonusRepository for FlagRepository {
    fn load(&self, owner: &DocumentRef) -> BabonusResult<BonusCollection> {
        let mut bonuses = BonusCollection::new();
        let entries = match self.entry(owner, BONUSES_KEY) {
            Some(Value::Object(entries)) => entries,
            Some(Value::Null) | None => return Ok(bonuses),
            Some(_) => {
                return Err(BabonusError::Storage(format!(
                    "bonuses of {} are not an object",
                    owner
                )))
            }
        };
        for (key, raw) in entries {
            let bonus: Bonus = match serde_json::from_value(raw.clone()) {
                Ok(bonus) => bonus,
                Err(err) => {
                    log::warn!("skipping unreadable bonus `{}` on {}: {}", key, owner, err);
                    continue;
                }
            };
            if let Err(err) = bonuses.insert(bonus) {
                log::warn!("skipping invalid bonus `{}` on {}: {}", key, owner, err);
            }
        }
        Ok(bonuses)
    }

    fn save(&mut self, owner: &DocumentRef, bonuses: BonusCollection) -> BabonusResult<()> {
        let mut entries = Map::new();
        for bonus in bonuses {
            let value = serde_json::to_value(&bonus)
                .map_err(|err| BabonusError::Storage(err.to_string()))?;
            entries.insert(bonus.id().to_string(), value);
        }
        self.write(owner, BONUSES_KEY, Value::Object(entries))
    }

    fn load_markers(&self, actor: &ActorId) -> BabonusResult<BTreeSet<String>> {
        let owner = DocumentRef::Actor(actor.clone());
        match self.entry(&owner, MARKERS_KEY) {
            None | Some(Value::Null) => Ok(BTreeSet::new()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|err| BabonusError::Storage(format!("markers of {}: {}", owner, err))),
        }
    }

    fn save_markers(&mut self, actor: &ActorId, markers: BTreeSet<String>) -> BabonusResult<()> {
        let value = serde_json::to_value(markers).map_err(|err| BabonusError::Storage(err.to_string()))?;
        self.write(&DocumentRef::Actor(actor.clone()), MARKERS_KEY, value)
    }
}
