use babonus::document::{ClassData, Pool, SpellComponents, Traits};
use babonus::rules::entropy::FixedHigh;
use babonus::rules::scene::GridScene;
use babonus::scene::disposition;
use babonus::{
    Actor, Bonus, BonusRepository, BonusType, DiceRoller, DocumentRef, Engine, EngineBuilder,
    Item, ManualClock, OptionalOffer, OptionalSelector, Point, Roll, RollData, RollEvaluator,
    Selection, SpellData, Token, World,
};
use std::sync::Arc;

pub const FIGHTER: &str = "fighter";
pub const WIZARD: &str = "wizard";
pub const GOBLIN: &str = "goblin";
pub const SWORD: &str = "longsword";
pub const SCIMITAR: &str = "scimitar";
pub const FIRE_BOLT: &str = "fire-bolt";
pub const FIREBALL: &str = "fireball";

/// Dice roller always rolling the highest face.
pub type HighRoller = DiceRoller<FixedHigh<i64>>;

/// A martial character with a longsword, standing at the origin.
pub fn fighter() -> Actor {
    let mut traits = Traits::default();
    traits.weapons.values.insert("mar".to_string());
    let mut actor = Actor::new(FIGHTER, "Fighter")
        .with_token("t-fighter")
        .with_traits(traits)
        .with_roll_data(RollData::new().with("str", 3).with("prof", 2))
        .with_item(
            Item::weapon(SWORD, "Longsword", "martialM")
                .with_property("mar")
                .with_property("ver")
                .with_damage("1d8", "slashing")
                .equipped(true),
        );
    actor.resources.insert("primary".to_string(), Pool::full(3));
    actor.attributes.insert("hp".to_string(), Pool::full(44));
    actor.classes.insert("fighter".to_string(), ClassData::new("Fighter", 5));
    actor.currency.insert("gp".to_string(), 15);
    actor
}

/// A caster with two evocation spells, standing 10 feet from the fighter.
pub fn wizard() -> Actor {
    let evocation = |level| SpellData {
        level,
        school: "evo".to_string(),
        components: SpellComponents {
            vocal: true,
            somatic: true,
            ..SpellComponents::default()
        },
        prepared: true,
    };
    let mut fireball = evocation(3);
    fireball.components.material = true;
    let mut actor = Actor::new(WIZARD, "Wizard")
        .with_token("t-wizard")
        .with_roll_data(RollData::new().with("int", 4).with("prof", 2))
        .with_item(Item::spell(FIRE_BOLT, "Fire Bolt", evocation(0)).with_damage("1d10", "fire"))
        .with_item(Item::spell(FIREBALL, "Fireball", fireball).with_damage("8d6", "fire"));
    actor.spell_slots.insert("spell3".to_string(), Pool::full(2));
    actor
}

/// A hostile creature standing 20 feet from the fighter.
pub fn goblin() -> Actor {
    Actor::new(GOBLIN, "Goblin")
        .with_token("t-goblin")
        .with_item(Item::weapon(SCIMITAR, "Scimitar", "martialM").with_damage("1d6", "slashing"))
}

/// Scene with the fighter at the origin, the wizard two squares east and the goblin four
/// squares east.
pub fn scene() -> GridScene {
    GridScene::new().with_tokens(vec![
        Token::new("t-fighter", FIGHTER, disposition::FRIENDLY, Point::new(0.0, 0.0)),
        Token::new("t-wizard", WIZARD, disposition::FRIENDLY, Point::new(2.0, 0.0)),
        Token::new("t-goblin", GOBLIN, disposition::HOSTILE, Point::new(4.0, 0.0)),
    ])
}

/// The fighter, the wizard and the goblin on the default scene.
pub fn world() -> World {
    World::with_actors(vec![fighter(), wizard(), goblin()]).with_scene(scene())
}

/// Reference to an actor.
pub fn actor_ref(actor: &str) -> DocumentRef {
    DocumentRef::Actor(actor.into())
}

/// Reference to an item.
pub fn item_ref(actor: &str, item: &str) -> DocumentRef {
    DocumentRef::Item(actor.into(), item.into())
}

/// Creates a bonus with the given formula.
pub fn bonus(bonus_type: BonusType, name: &str, formula: &str) -> Bonus {
    Bonus::create(bonus_type, name).with_formula(formula)
}

/// Embeds a bonus, asserting success.
pub fn embed<R: BonusRepository>(repository: &mut R, owner: &DocumentRef, bonus: Bonus) {
    assert_eq!(repository.embed(owner, bonus).err(), None);
}

/// Creates an engine builder rolling the highest faces and driven by a manual clock.
pub fn engine<R: BonusRepository + 'static>(repository: R) -> (EngineBuilder, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let builder = Engine::builder(repository, HighRoller::default()).clock(clock.clone());
    (builder, clock)
}

/// Executes a roll with the highest faces.
pub fn roll(formula: &str) -> Roll {
    HighRoller::default()
        .evaluate(formula, &RollData::new())
        .unwrap()
}

/// Optional selector answering with a closure.
pub struct FnSelector<F>(pub F);

impl<F> OptionalSelector for FnSelector<F>
where
    F: FnMut(BonusType, &[OptionalOffer]) -> Selection,
{
    fn select(&mut self, kind: BonusType, offers: &[OptionalOffer]) -> Selection {
        (self.0)(kind, offers)
    }
}
