#![deny(missing_docs)]
#![doc(test(attr(warn(warnings))))]

//!
//! babonus adds conditional bonuses to the rolls of a tabletop character sheet.
//!
//! * Bonuses live on actors, items and effects and are stored alongside them.
//! * Each bonus carries a set of filters deciding whether it applies to a given roll.
//! * Bonuses can radiate as auras to the tokens around their owner.
//! * Optional bonuses are offered to the roller and can consume a resource when picked.
//!
//! ## Examples
//!
//! ```
//! use babonus::{
//!     rules::entropy::FixedHigh, Actor, Bonus, BonusRepository, BonusType, DiceRoller,
//!     DocumentRef, Engine, Item, MemoryRepository, RollEvaluator, RollSetup, World,
//! };
//!
//! let fighter = Actor::new("fighter", "Fighter")
//!     .with_item(Item::weapon("sword", "Longsword", "martialM"));
//! let mut world = World::with_actors(vec![fighter]);
//!
//! let mut repository = MemoryRepository::new();
//! let bless = Bonus::create(BonusType::AttackRoll, "Bless").with_formula("1d4");
//! repository
//!     .embed(&DocumentRef::Actor("fighter".into()), bless)
//!     .unwrap();
//!
//! let mut engine = Engine::builder(repository, DiceRoller::<FixedHigh<i64>>::default()).build();
//! let id = engine.before_roll(RollSetup::attack("fighter", "sword"));
//!
//! let mut dice = DiceRoller::<FixedHigh<i64>>::default();
//! let mut roll = dice.evaluate("1d20 + 5", &Default::default()).unwrap();
//! let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
//! assert_eq!(outcome.total, 4);
//! assert_eq!(roll.formula(), "1d20 + 5 + 4");
//! assert_eq!(roll.total(), 29);
//! ```
//!
//! ## How does it work?
//!
//! The host game drives an `Engine` through two hooks around each roll.
//!
//! `before_roll` is called while the roll is being configured. It stores what is known about
//! the roll (who rolls, with which item, against which target) in a short lived registry and
//! returns an id the host carries until the roll is executed.
//!
//! `after_roll` is called with the executed roll. The engine then:
//!
//! 1. collects the bonuses of the roller, of its items and effects, and the auras of the
//!    tokens around it, keeping those whose filters pass;
//! 2. offers the optional ones to an `OptionalSelector` and pays for the chosen ones;
//! 3. evaluates and sums every bonus, a failing formula counting as zero;
//! 4. appends the sum to the roll's formula and replaces the roll with the re-evaluated one.
//!
//! Registered rolls expire after five minutes.
//!
//! ## Host facing traits
//!
//! The library never owns the host's data. It reaches it through a few traits:
//!
//! - `BonusRepository` to load and store bonuses and markers.
//! - `RollEvaluator` to execute formulas.
//! - `Scene` to measure distances and test walls and sight.
//! - `OptionalSelector` and `ChatSink` for the user facing steps.
//!
//! Ready to use implementations are available: `MemoryRepository`, `DiceRoller`, and the
//! rules under `::rules`.
//!
//! # Optional Features
//!
//! The following optional features are available:
//!
//! - `serialization`: enables serialization of bonuses and the JSON flag repository.

#[macro_use]
pub mod util;
pub use crate::util::Id;

pub mod aura;
pub use crate::aura::{Aura, Requirements};

pub mod bonus;
pub use crate::bonus::{Bonus, BonusId, BonusType};

pub mod collection;
pub use crate::collection::BonusCollection;

pub mod collector;
pub use crate::collector::CollectedBonus;

pub mod combiner;
pub use crate::combiner::{Combination, Contribution, SelectedBonus};

pub mod consumption;
pub use crate::consumption::{Consumption, ConsumptionType, ConsumptionValue};

pub mod context;
pub use crate::context::RollContext;

pub mod document;
pub use crate::document::{
    Actor, ActorId, DocumentRef, Effect, EffectId, Item, ItemId, ItemKind, Pool, SpellData,
};

pub mod engine;
pub use crate::engine::{
    ConsumptionChoice, Engine, EngineBuilder, OptionalChoice, OptionalOffer, OptionalSelector,
    RollOutcome, Selection, Settings,
};

pub mod entropy;
pub use crate::entropy::{Entropy, EntropyRules};

pub mod error;
pub use crate::error::{BabonusError, BabonusResult};

pub mod filter;
pub use crate::filter::{FilterKind, FilterValue, Filters};

#[cfg(feature = "serialization")]
pub mod flags;
#[cfg(feature = "serialization")]
pub use crate::flags::FlagRepository;

pub mod formula;
pub use crate::formula::Formula;

pub mod modifiers;
pub use crate::modifiers::{ModifierMode, ModifierTarget, Modifiers, Priority};

pub mod notification;
pub use crate::notification::{AppliedSummary, ChatSink, LogSink, MemorySink};

pub mod registry;
pub use crate::registry::{Clock, ManualClock, Registry, RegistryId, RollSetup, SystemClock};

pub mod repository;
pub use crate::repository::{BonusRepository, MemoryRepository};

pub mod roll;
pub use crate::roll::{DiceRoller, Roll, RollData, RollEvaluator};

pub mod rules;

pub mod scene;
pub use crate::scene::{Point, Scene, Token, TokenId};

pub mod world;
pub use crate::world::World;
