//! Error and result types.

use crate::bonus::{BonusId, BonusType};
use crate::document::{ActorId, DocumentRef};
use crate::filter::FilterKind;
use crate::registry::RegistryId;
use thiserror::Error;

/// Alias for a `Result` returning a `BabonusError`.
pub type BabonusResult<T> = Result<T, BabonusError>;

/// Errors surfaced by the engine and its collaborators.
///
/// Most problems met while evaluating a roll never reach the caller: they fail closed and
/// are logged. These variants are reserved for misuse of the API and for storage failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BabonusError {
    /// The bonus type string is not one of the six known types.
    #[error("unknown bonus type `{0}`")]
    UnknownBonusType(String),

    /// The filter can't be configured on bonuses of the given type.
    #[error("filter `{0}` is not available for {1} bonuses")]
    FilterNotApplicable(FilterKind, BonusType),

    /// The value given for a filter doesn't have the shape the filter expects.
    #[error("filter `{0}` expects {1}")]
    InvalidFilterValue(FilterKind, &'static str),

    /// A type specific field was set on a bonus of a different type.
    #[error("field `{0}` is not available for {1} bonuses")]
    FieldNotApplicable(&'static str, BonusType),

    /// No bonus with the given id exists in the collection.
    #[error("bonus `{0}` not found")]
    BonusNotFound(BonusId),

    /// The given actor doesn't exist in the world.
    #[error("actor `{0}` not found")]
    ActorNotFound(ActorId),

    /// The given document doesn't exist.
    #[error("document `{0}` not found")]
    DocumentNotFound(DocumentRef),

    /// A formula couldn't be parsed or evaluated.
    #[error("invalid formula `{formula}`: {reason}")]
    Formula {
        /// The faulty formula.
        formula: String,
        /// Human readable cause.
        reason: String,
    },

    /// The roll was never registered or its registry entry has expired.
    #[error("roll `{0}` is not registered")]
    RollNotRegistered(RegistryId),

    /// A consumption amount is outside of the configured range or step.
    #[error("cannot consume {amount}: expected a value in [{min}, {max}] with step {step}")]
    InvalidConsumption {
        /// Requested amount.
        amount: i64,
        /// Minimum amount.
        min: i64,
        /// Maximum amount.
        max: i64,
        /// Interval between amounts.
        step: i64,
    },

    /// The owner doesn't have enough of the consumed property.
    #[error("not enough `{property}` to consume {amount} (available: {available})")]
    InsufficientResource {
        /// Consumed property.
        property: String,
        /// Requested amount.
        amount: i64,
        /// Amount available.
        available: i64,
    },

    /// The consumption type is not available for the owning document.
    #[error("consumption of `{0}` is not available for {1}")]
    ConsumptionUnavailable(String, DocumentRef),

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BabonusError {
    /// Creates a formula error.
    pub(crate) fn formula<F: Into<String>, S: Into<String>>(formula: F, reason: S) -> Self {
        BabonusError::Formula {
            formula: formula.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            BabonusError::UnknownBonusType("foo".to_string()).to_string(),
            "unknown bonus type `foo`"
        );
        assert_eq!(
            BabonusError::formula("1d", "missing die faces").to_string(),
            "invalid formula `1d`: missing die faces"
        );
        assert_eq!(
            BabonusError::FilterNotApplicable(FilterKind::Skills, BonusType::AttackRoll)
                .to_string(),
            "filter `skills` is not available for attackRoll bonuses"
        );
    }
}
