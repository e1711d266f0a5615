//! Summaries of the bonuses applied to a roll.

use crate::bonus::BonusType;
use crate::combiner::Contribution;
use crate::document::ActorId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Describes the bonuses added to one roll.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSummary {
    /// Type of the roll.
    pub kind: BonusType,
    /// The rolling actor.
    pub actor: ActorId,
    /// Every bonus added, with its value.
    pub contributions: Vec<Contribution>,
    /// Total added to the roll.
    pub total: i64,
}

impl fmt::Display for AppliedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bonuses applied to {} of {}:", self.kind, self.actor)?;
        for contribution in &self.contributions {
            write!(f, "  {}: {:+}", contribution.name, contribution.value)?;
            if let Some(damage_type) = &contribution.damage_type {
                write!(f, " ({})", damage_type)?;
            }
            writeln!(f)?;
        }
        write!(f, "  Total: {:+}", self.total)
    }
}

/// Destination of the summaries, such as the host's chat log.
pub trait ChatSink {
    /// Publishes a summary.
    fn post(&mut self, summary: &AppliedSummary);
}

/// Sink writing summaries to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ChatSink for LogSink {
    fn post(&mut self, summary: &AppliedSummary) {
        log::info!("{}", summary);
    }
}

/// Sink keeping every summary in memory.
///
/// Clones share the same storage, so a clone can be handed to the engine
/// while the first handle is used to read the summaries back.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    summaries: Rc<RefCell<Vec<AppliedSummary>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summaries posted so far.
    pub fn summaries(&self) -> Vec<AppliedSummary> {
        self.summaries.borrow().clone()
    }
}

impl ChatSink for MemorySink {
    fn post(&mut self, summary: &AppliedSummary) {
        self.summaries.borrow_mut().push(summary.clone());
    }
}
