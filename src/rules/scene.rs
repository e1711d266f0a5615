//! A square grid scene with walls and token vision.

use crate::scene::{Point, Scene, Token, TokenId};
use crate::util::collect_from_iter;
use indexmap::IndexMap;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A wall segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Wall {
    /// First end.
    pub from: Point,
    /// Second end.
    pub to: Point,
    /// Whether the wall stops movement.
    pub blocks_move: bool,
    /// Whether the wall stops sight.
    pub blocks_sight: bool,
}

impl Wall {
    /// Creates a wall blocking both movement and sight.
    pub fn solid(from: Point, to: Point) -> Self {
        Self {
            from,
            to,
            blocks_move: true,
            blocks_sight: true,
        }
    }

    /// Creates a transparent wall, blocking movement only.
    pub fn window(from: Point, to: Point) -> Self {
        Self {
            blocks_sight: false,
            ..Self::solid(from, to)
        }
    }

    fn intersects(&self, a: Point, b: Point) -> bool {
        segments_intersect(self.from, self.to, a, b)
    }
}

/// How far a token can see.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Vision {
    /// The token has no vision.
    Blind,
    /// The token sees up to the given distance, in scene units.
    Range(f64),
    /// The token sees without limits.
    Unlimited,
}

impl Default for Vision {
    fn default() -> Self {
        Vision::Unlimited
    }
}

/// A scene laid out on a square grid.
///
/// Distances are measured counting diagonals as one square, then scaled by
/// `units_per_square`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct GridScene {
    tokens: IndexMap<TokenId, Token>,
    walls: Vec<Wall>,
    vision: IndexMap<TokenId, Vision>,
    units_per_square: f64,
}

impl GridScene {
    /// Creates an empty scene with 5 units per square.
    pub fn new() -> Self {
        Self::with_units(5.0)
    }

    /// Creates an empty scene with the given scale.
    pub fn with_units(units_per_square: f64) -> Self {
        Self {
            tokens: IndexMap::new(),
            walls: Vec::new(),
            vision: IndexMap::new(),
            units_per_square,
        }
    }

    /// Places tokens on the scene. A token with an already used id is ignored.
    pub fn with_tokens<I: IntoIterator<Item = Token>>(mut self, tokens: I) -> Self {
        for (id, token) in collect_from_iter(tokens.into_iter()) {
            self.tokens.entry(id).or_insert(token);
        }
        self
    }

    /// Places a token, replacing any token with the same id.
    pub fn place(&mut self, token: Token) {
        self.tokens.insert(token.id.clone(), token);
    }

    /// Moves a token.
    pub fn move_token(&mut self, id: &TokenId, center: Point) {
        if let Some(token) = self.tokens.get_mut(id) {
            token.center = center;
        }
    }

    /// Adds a wall.
    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.push(wall);
    }

    /// Sets the vision of a token.
    pub fn set_vision(&mut self, id: TokenId, vision: Vision) {
        self.vision.insert(id, vision);
    }

    /// Returns the scale of the grid.
    pub fn units_per_square(&self) -> f64 {
        self.units_per_square
    }
}

impl Default for GridScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for GridScene {
    fn tokens(&self) -> Vec<&Token> {
        self.tokens.values().collect()
    }

    fn token(&self, id: &TokenId) -> Option<&Token> {
        self.tokens.get(id)
    }

    fn measure_distance(&self, from: &Token, to: &Token) -> f64 {
        let dx = (from.center.x - to.center.x).abs();
        let dy = (from.center.y - to.center.y).abs();
        dx.max(dy).round() * self.units_per_square
    }

    fn check_collision(&self, from: Point, to: Point) -> bool {
        self.walls
            .iter()
            .any(|wall| wall.blocks_move && wall.intersects(from, to))
    }

    fn sight_contains(&self, source: &Token, point: Point) -> Option<bool> {
        let range = match self.vision.get(&source.id).copied().unwrap_or_default() {
            Vision::Blind => return None,
            Vision::Range(range) => Some(range),
            Vision::Unlimited => None,
        };
        if let Some(range) = range {
            let dx = (source.center.x - point.x).abs();
            let dy = (source.center.y - point.y).abs();
            if dx.max(dy).round() * self.units_per_square > range {
                return Some(false);
            }
        }
        Some(
            !self
                .walls
                .iter()
                .any(|wall| wall.blocks_sight && wall.intersects(source.center, point)),
        )
    }
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
