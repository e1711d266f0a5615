//! Live state of the host: actors and the active scene.

use crate::document::{Actor, ActorId, Item, ItemId};
use crate::error::{BabonusError, BabonusResult};
use crate::scene::{Scene, Token};
use crate::util::collect_from_iter;
use indexmap::IndexMap;

/// All actors known to the host, plus the scene currently displayed.
#[derive(Default)]
pub struct World {
    actors: IndexMap<ActorId, Actor>,
    scene: Option<Box<dyn Scene>>,
}

impl World {
    /// Creates an empty world without a scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world from a list of actors. Actors with an already used id are ignored.
    pub fn with_actors<I: IntoIterator<Item = Actor>>(actors: I) -> Self {
        Self {
            actors: collect_from_iter(actors.into_iter()),
            scene: None,
        }
    }

    /// Sets the active scene.
    pub fn with_scene<S: Scene + 'static>(mut self, scene: S) -> Self {
        self.scene = Some(Box::new(scene));
        self
    }

    /// Adds or replaces an actor.
    pub fn insert_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id.clone(), actor);
    }

    /// Replaces the active scene.
    pub fn set_scene(&mut self, scene: Option<Box<dyn Scene>>) {
        self.scene = scene;
    }

    /// Returns the active scene.
    pub fn scene(&self) -> Option<&dyn Scene> {
        self.scene.as_deref()
    }

    /// Returns an actor.
    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Returns a mutable reference to an actor.
    pub fn actor_mut(&mut self, id: &ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    /// Returns an actor, failing if it doesn't exist.
    pub fn require_actor(&self, id: &ActorId) -> BabonusResult<&Actor> {
        self.actor(id)
            .ok_or_else(|| BabonusError::ActorNotFound(id.clone()))
    }

    /// Returns an item of an actor.
    pub fn item(&self, actor: &ActorId, item: &ItemId) -> Option<&Item> {
        self.actor(actor).and_then(|actor| actor.item(item))
    }

    /// Returns all actors.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Returns the token of an actor on the active scene.
    pub fn token_of(&self, actor: &Actor) -> Option<&Token> {
        let scene = self.scene()?;
        actor.token.as_ref().and_then(|id| scene.token(id))
    }

    /// Returns the distance between the tokens of two actors, if both are on the scene.
    pub fn distance_between(&self, a: &Actor, b: &Actor) -> Option<f64> {
        let scene = self.scene()?;
        let from = self.token_of(a)?;
        let to = self.token_of(b)?;
        Some(scene.measure_distance(from, to))
    }
}
