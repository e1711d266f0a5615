use babonus::aura::{ALLIES, ENEMIES};
use babonus::collector::{self, CollectedBonus};
use babonus::rules::scene::{GridScene, Wall};
use babonus::{
    Actor, ActorId, Aura, BonusType, Effect, MemoryRepository, Point, RollContext, World,
};
use util::*;

fn collect(world: &World, repository: &MemoryRepository, actor: &str) -> Vec<CollectedBonus> {
    let actor: ActorId = actor.into();
    let actor = world.actor(&actor).unwrap();
    let context = RollContext::new(actor);
    collector::collect(BonusType::AttackRoll, &context, world, repository)
}

fn names(collected: &[CollectedBonus]) -> Vec<&str> {
    collected.iter().map(|found| found.bonus.name()).collect()
}

fn aura_bonus(name: &str, aura: Aura) -> babonus::Bonus {
    let mut bonus = bonus(BonusType::AttackRoll, name, "1");
    bonus.set_aura(aura);
    bonus
}

fn allies_aura(range: &str) -> Aura {
    let mut aura = Aura::new(range);
    aura.disposition = ALLIES;
    aura
}

#[test]
fn aura_reaches_allies_in_range() {
    let world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Guidance", allies_aura("30")));
    let collected = collect(&world, &repository, FIGHTER);
    assert_eq!(names(&collected), vec!["Guidance"]);
    assert!(collected[0].aura);
    assert_eq!(collected[0].owner, actor_ref(WIZARD));
    // Allies only.
    assert!(collect(&world, &repository, GOBLIN).is_empty());
}

#[test]
fn aura_out_of_range() {
    let world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Short", allies_aura("5")));
    assert!(collect(&world, &repository, FIGHTER).is_empty());
    // A range that isn't a number is unlimited.
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Endless", allies_aura("any")));
    assert_eq!(collect(&world, &repository, FIGHTER).len(), 1);
}

#[test]
fn aura_never_reaches_owner_unless_self() {
    let world = world();
    let mut repository = MemoryRepository::new();
    let mut aura = Aura::new("30");
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Outward", aura.clone()));
    assert!(collect(&world, &repository, WIZARD).is_empty());
    aura.self_ = true;
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Inclusive", aura));
    assert_eq!(names(&collect(&world, &repository, WIZARD)), vec!["Inclusive"]);
}

#[test]
fn enemies_aura() {
    let world = world();
    let mut repository = MemoryRepository::new();
    let mut aura = Aura::new("30");
    aura.disposition = ENEMIES;
    embed(&mut repository, &actor_ref(GOBLIN), aura_bonus("Frightful", aura));
    assert_eq!(names(&collect(&world, &repository, FIGHTER)), vec!["Frightful"]);
    assert_eq!(names(&collect(&world, &repository, WIZARD)), vec!["Frightful"]);
}

#[test]
fn blockers_suppress_the_aura() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    let mut aura = allies_aura("30");
    aura.blockers.insert("unconscious".to_string());
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Guidance", aura));
    assert_eq!(collect(&world, &repository, FIGHTER).len(), 1);
    let fighter = fighter().with_effect(Effect::status("ko", "unconscious"));
    world.insert_actor(fighter);
    assert!(collect(&world, &repository, FIGHTER).is_empty());
}

#[test]
fn walls_block_auras() {
    let mut scene = scene();
    scene.add_wall(Wall::window(Point::new(1.0, -1.0), Point::new(1.0, 1.0)));
    let world = World::with_actors(vec![fighter(), wizard(), goblin()]).with_scene(scene);
    let mut repository = MemoryRepository::new();
    let mut aura = allies_aura("30");
    aura.require.sight = true;
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Seen", aura.clone()));
    assert_eq!(names(&collect(&world, &repository, FIGHTER)), vec!["Seen"]);
    aura.require.movement = true;
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Reached", aura));
    assert_eq!(names(&collect(&world, &repository, FIGHTER)), vec!["Seen"]);
}

#[test]
fn templates_and_plain_bonuses_stay_home() {
    let world = world();
    let mut repository = MemoryRepository::new();
    let mut template = allies_aura("30");
    template.template = true;
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Spirit Guardians", template));
    embed(&mut repository, &actor_ref(WIZARD), bonus(BonusType::AttackRoll, "Own", "1"));
    assert!(collect(&world, &repository, FIGHTER).is_empty());
    // On its owner a template aura is an ordinary bonus.
    assert_eq!(
        names(&collect(&world, &repository, WIZARD)),
        vec!["Spirit Guardians", "Own"]
    );
}

#[test]
fn no_scene_no_auras() {
    let world = World::with_actors(vec![fighter(), wizard()]);
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Guidance", allies_aura("30")));
    assert!(collect(&world, &repository, FIGHTER).is_empty());
}

#[test]
fn aura_on_item_of_another_actor() {
    let world = world();
    let mut repository = MemoryRepository::new();
    embed(
        &mut repository,
        &item_ref(WIZARD, FIRE_BOLT),
        aura_bonus("Kindled", allies_aura("30")),
    );
    let collected = collect(&world, &repository, FIGHTER);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].owner, item_ref(WIZARD, FIRE_BOLT));
}

#[test]
fn tokens_without_actor_are_skipped() {
    let mut scene: GridScene = scene();
    scene.place(babonus::Token {
        id: "t-barrel".into(),
        actor: None,
        disposition: 0,
        center: Point::new(1.0, 1.0),
    });
    let world = World::with_actors(vec![fighter(), Actor::new("lonely", "Lonely")]).with_scene(scene);
    let repository = MemoryRepository::new();
    assert!(collect(&world, &repository, FIGHTER).is_empty());
}

#[test]
fn several_tokens_of_one_actor() {
    let mut scene = scene();
    scene.place(babonus::Token::new(
        "t-wizard-2",
        WIZARD,
        babonus::scene::disposition::FRIENDLY,
        Point::new(1.0, 0.0),
    ));
    let world = World::with_actors(vec![fighter(), wizard(), goblin()]).with_scene(scene);
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(WIZARD), aura_bonus("Guidance", allies_aura("30")));
    assert_eq!(names(&collect(&world, &repository, FIGHTER)), vec!["Guidance"]);
}
