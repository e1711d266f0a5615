//! Module for the spatial dimension of the active scene.

use crate::document::ActorId;
use crate::util::Id;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

string_id! {
    /// Identifies a token placed on a scene.
    TokenId
}

/// A point on the scene, in grid squares.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Disposition of a token towards the player characters.
pub mod disposition {
    /// Hostile.
    pub const HOSTILE: i8 = -1;
    /// Neutral.
    pub const NEUTRAL: i8 = 0;
    /// Friendly.
    pub const FRIENDLY: i8 = 1;
}

/// The representation of an actor on the scene.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Token {
    /// Id of this token.
    pub id: TokenId,
    /// The actor represented by this token, if any.
    pub actor: Option<ActorId>,
    /// One of the values in [disposition](disposition/index.html).
    pub disposition: i8,
    /// Center of the token.
    pub center: Point,
}

impl Token {
    /// Creates a token for an actor.
    pub fn new<T: Into<TokenId>, A: Into<ActorId>>(
        id: T,
        actor: A,
        disposition: i8,
        center: Point,
    ) -> Self {
        Self {
            id: id.into(),
            actor: Some(actor.into()),
            disposition,
            center,
        }
    }
}

impl Id for Token {
    type Id = TokenId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Queries on the active scene.
///
/// Only `tokens` and `measure_distance` are mandatory. Scenes without walls or vision can rely
/// on the provided implementations.
pub trait Scene {
    /// Returns all tokens placed on the scene.
    fn tokens(&self) -> Vec<&Token>;

    /// Returns the token with the given id.
    fn token(&self, id: &TokenId) -> Option<&Token> {
        self.tokens().into_iter().find(|token| token.id == *id)
    }

    /// Measures the grid distance between two tokens, in scene units.
    fn measure_distance(&self, from: &Token, to: &Token) -> f64;

    /// Returns `true` if a wall blocks movement along the segment between two points.
    ///
    /// The provided implementation never detects collisions.
    fn check_collision(&self, _from: Point, _to: Point) -> bool {
        false
    }

    /// Returns whether `source` can see `point`.
    ///
    /// `None` means that the token has no vision at all.
    /// The provided implementation sees everything.
    fn sight_contains(&self, _source: &Token, _point: Point) -> Option<bool> {
        Some(true)
    }
}
