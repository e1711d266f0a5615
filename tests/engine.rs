use babonus::aura::ALLIES;
use babonus::consumption::ConsumptionValue;
use babonus::filter::{FilterKind, FilterValue};
use babonus::{
    Aura, BabonusError, Bonus, BonusRepository, BonusType, Consumption, ConsumptionType,
    MemorySink, MemoryRepository, OptionalChoice, OptionalOffer, RollSetup, Selection, Settings,
    World,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use util::*;

fn optional(bonus_type: BonusType, name: &str, formula: &str) -> Bonus {
    let mut bonus = bonus(bonus_type, name, formula);
    bonus.set_optional(true);
    bonus
}

fn superiority() -> Bonus {
    let mut precision = optional(BonusType::AttackRoll, "Precision Attack", "1d8");
    let mut consumption = Consumption::new(ConsumptionType::Resources);
    consumption.scales = true;
    consumption.value = ConsumptionValue {
        min: 1,
        max: 3,
        step: 1,
    };
    precision.set_consumption(consumption);
    precision
}

fn primary(world: &World) -> i64 {
    world.actor(&FIGHTER.into()).unwrap().resources["primary"].value
}

#[test]
fn bonuses_are_appended_to_the_roll() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::AttackRoll, "One", "1"));
    embed(&mut repository, &item_ref(FIGHTER, SWORD), bonus(BonusType::AttackRoll, "Two", "2"));
    let sink = MemorySink::new();
    let (builder, _clock) = engine(repository);
    let mut engine = builder.sink(sink.clone()).build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD).target(GOBLIN));
    let mut roll = roll("1d20 + 5");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert!(outcome.modified);
    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.applied.len(), 2);
    assert_eq!(roll.formula(), "1d20 + 5 + 3");
    assert_eq!(roll.total(), 28);

    let summaries = sink.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].kind, BonusType::AttackRoll);
    assert_eq!(summaries[0].total, 3);
}

#[test]
fn nothing_applicable_leaves_the_roll_alone() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::DamageRoll, "Dueling", "2"));
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::AttackRoll, "Nothing", "0"));
    let sink = MemorySink::new();
    let (builder, _clock) = engine(repository);
    let mut engine = builder.sink(sink.clone()).build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20 + 5");
    let before = roll.clone();
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert!(!outcome.modified);
    assert_eq!(outcome.total, 0);
    assert_eq!(roll, before);
    assert!(sink.summaries().is_empty());
}

#[test]
fn failing_formula_does_not_abort_the_roll() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::DamageRoll, "Broken", "(1 +"));
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::DamageRoll, "Rage", "2"));
    let (builder, _clock) = engine(repository);
    let mut engine = builder.build();

    let id = engine.before_roll(RollSetup::damage(FIGHTER, SWORD));
    let mut roll = roll("1d8 + 3");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert_eq!(outcome.total, 2);
    assert_eq!(roll.formula(), "1d8 + 3 + 2");
    assert_eq!(roll.total(), 13);
}

#[test]
fn unknown_and_expired_rolls() {
    let mut world = world();
    let (builder, clock) = engine(MemoryRepository::new());
    let mut engine = builder.build();
    let id = engine.before_roll(RollSetup::death_save(FIGHTER));
    clock.advance(Duration::from_secs(1));
    let mut roll = roll("1d20");
    assert!(engine.after_roll(&mut world, id, &mut roll).is_ok());
    // The entry survives its first use until it expires.
    assert!(engine.after_roll(&mut world, id, &mut roll).is_ok());
    clock.advance(Duration::from_secs(300));
    assert_eq!(
        engine.after_roll(&mut world, id, &mut roll),
        Err(BabonusError::RollNotRegistered(id))
    );
}

#[test]
fn missing_actor() {
    let mut world = world();
    let (builder, _clock) = engine(MemoryRepository::new());
    let mut engine = builder.build();
    let id = engine.before_roll(RollSetup::death_save("nobody"));
    let mut roll = roll("1d20");
    assert_eq!(
        engine.after_roll(&mut world, id, &mut roll),
        Err(BabonusError::ActorNotFound("nobody".into()))
    );
}

#[test]
fn death_saves_use_the_death_ability() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    let mut ward = bonus(BonusType::SavingThrow, "Death Ward", "5");
    assert_eq!(ward.set_abilities(vec!["death"]), Ok(()));
    embed(&mut repository, &actor_ref(FIGHTER), ward);
    let (builder, _clock) = engine(repository);
    let mut engine = builder.build();

    let id = engine.before_roll(RollSetup::saving_throw(FIGHTER, "con"));
    let mut roll = roll("1d20");
    assert!(!engine.after_roll(&mut world, id, &mut roll).unwrap().modified);

    let id = engine.before_roll(RollSetup::death_save(FIGHTER));
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert_eq!(outcome.total, 5);
    assert_eq!(roll.formula(), "1d20 + 5");
}

#[test]
fn auras_distance_and_markers() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    let mut guidance = bonus(BonusType::AttackRoll, "Guidance", "1");
    let mut aura = Aura::new("30");
    aura.disposition = ALLIES;
    guidance.set_aura(aura);
    embed(&mut repository, &actor_ref(WIZARD), guidance);
    let close = bonus(BonusType::AttackRoll, "Close Quarters", "2")
        .with_filter(FilterKind::Distance, FilterValue::range(None, Some(20.0)))
        .unwrap();
    embed(&mut repository, &actor_ref(FIGHTER), close);
    let hunter = bonus(BonusType::AttackRoll, "Hunter's Mark", "4")
        .with_filter(FilterKind::Markers, FilterValue::list(vec!["hunted"]))
        .unwrap();
    embed(&mut repository, &actor_ref(FIGHTER), hunter);
    assert_eq!(repository.apply_markers(&GOBLIN.into(), vec!["hunted"]), Ok(()));
    let (builder, _clock) = engine(repository);
    let mut engine = builder.build();

    // Without a target: only the aura.
    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20");
    assert_eq!(engine.after_roll(&mut world, id, &mut roll).unwrap().total, 1);

    // Against the goblin, 20 feet away and marked.
    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD).target(GOBLIN));
    let mut roll = util::roll("1d20");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert_eq!(outcome.total, 7);
    assert!(outcome
        .applied
        .iter()
        .any(|contribution| contribution.owner == actor_ref(WIZARD)));
}

#[test]
fn optional_bonuses_are_paid_for() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), superiority());
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::AttackRoll, "Archery", "2"));
    let offered = Rc::new(RefCell::new(Vec::new()));
    let seen = offered.clone();
    let selector = FnSelector(move |kind: BonusType, offers: &[OptionalOffer]| {
        assert_eq!(kind, BonusType::AttackRoll);
        seen.borrow_mut().extend(offers.iter().cloned());
        Selection::Apply(vec![OptionalChoice::of(&offers[0]).consuming("primary", 2)])
    });
    let (builder, _clock) = engine(repository);
    let mut engine = builder.selector(selector).build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20 + 5");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();

    let offered = offered.borrow();
    assert_eq!(offered.len(), 1);
    assert_eq!(offered[0].value, 8);
    assert_eq!(offered[0].properties, vec!["primary"]);
    // 2 from Archery, 8 from the die and 1 from the extra unit spent.
    assert_eq!(outcome.total, 11);
    assert_eq!(roll.formula(), "1d20 + 5 + 11");
    assert_eq!(primary(&world), 1);
}

#[test]
fn cancelled_selection_changes_nothing() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), superiority());
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::AttackRoll, "Archery", "2"));
    let sink = MemorySink::new();
    let (builder, _clock) = engine(repository);
    let mut engine = builder
        .selector(FnSelector(|_: BonusType, _: &[OptionalOffer]| Selection::Cancel))
        .sink(sink.clone())
        .build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20 + 5");
    let before = roll.clone();
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert!(outcome.cancelled);
    assert!(!outcome.modified);
    assert_eq!(roll, before);
    assert_eq!(primary(&world), 3);
    assert!(sink.summaries().is_empty());
}

#[test]
fn unpayable_optional_bonus_is_dropped() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), superiority());
    let (builder, _clock) = engine(repository);
    let mut engine = builder
        .selector(FnSelector(|_: BonusType, offers: &[OptionalOffer]| {
            Selection::Apply(vec![
                OptionalChoice::of(&offers[0]).consuming("primary", 5),
                OptionalChoice::of(&offers[0]),
            ])
        }))
        .build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert!(!outcome.modified);
    assert_eq!(primary(&world), 3);
}

#[test]
fn optional_bonuses_need_a_selector() {
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), optional(BonusType::AttackRoll, "Luck", "1d4"));

    let mut world = world();
    let (builder, _clock) = engine(repository.clone());
    let mut engine = builder.build();
    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20");
    assert_eq!(engine.after_roll(&mut world, id, &mut roll).unwrap().total, 0);

    let (builder, _clock) = util::engine(repository.clone());
    let mut engine = builder
        .selector(FnSelector(|_: BonusType, offers: &[OptionalOffer]| {
            Selection::Apply(offers.iter().map(OptionalChoice::of).collect())
        }))
        .settings(Settings {
            show_optional: false,
            ..Settings::default()
        })
        .build();
    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    assert_eq!(engine.after_roll(&mut world, id, &mut roll).unwrap().total, 0);

    let (builder, _clock) = util::engine(repository);
    let mut engine = builder
        .selector(FnSelector(|_: BonusType, offers: &[OptionalOffer]| {
            Selection::Apply(offers.iter().map(OptionalChoice::of).collect())
        }))
        .build();
    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    assert_eq!(engine.after_roll(&mut world, id, &mut roll).unwrap().total, 4);
}

#[test]
fn summaries_can_be_silenced() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), bonus(BonusType::HitDie, "Durable", "2"));
    let sink = MemorySink::new();
    let (builder, _clock) = engine(repository);
    let mut engine = builder.sink(sink.clone()).build();
    engine.settings_mut().show_applied = false;

    let id = engine.before_roll(RollSetup::hit_die(FIGHTER, "d10"));
    let mut roll = roll("1d10 + 3");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert_eq!(outcome.total, 2);
    assert_eq!(roll.total(), 15);
    assert!(sink.summaries().is_empty());
}

#[test]
fn repeated_choices_are_paid_once() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    embed(&mut repository, &actor_ref(FIGHTER), superiority());
    let selector = FnSelector(|_: BonusType, offers: &[OptionalOffer]| {
        let choice = OptionalChoice::of(&offers[0]).consuming("primary", 1);
        Selection::Apply(vec![choice.clone(), choice])
    });
    let (builder, _clock) = engine(repository);
    let mut engine = builder.selector(selector).build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    assert_eq!(outcome.applied.len(), 1);
    assert_eq!(outcome.total, 8);
    assert_eq!(roll.formula(), "1d20 + 8");
    assert_eq!(primary(&world), 2);
}

#[test]
fn optional_auras_stay_auras() {
    let mut world = world();
    let mut repository = MemoryRepository::new();
    let mut inspiration = optional(BonusType::AttackRoll, "Inspiration", "1d6");
    let mut aura = Aura::new("30");
    aura.disposition = ALLIES;
    inspiration.set_aura(aura);
    embed(&mut repository, &actor_ref(WIZARD), inspiration);
    let offered = Rc::new(RefCell::new(Vec::new()));
    let seen = offered.clone();
    let selector = FnSelector(move |_: BonusType, offers: &[OptionalOffer]| {
        seen.borrow_mut().extend(offers.iter().cloned());
        Selection::Apply(offers.iter().map(OptionalChoice::of).collect())
    });
    let (builder, _clock) = engine(repository);
    let mut engine = builder.selector(selector).build();

    let id = engine.before_roll(RollSetup::attack(FIGHTER, SWORD));
    let mut roll = roll("1d20");
    let outcome = engine.after_roll(&mut world, id, &mut roll).unwrap();
    let offered = offered.borrow();
    assert_eq!(offered.len(), 1);
    assert!(offered[0].aura);
    assert_eq!(outcome.total, 6);
    assert_eq!(outcome.applied[0].owner, actor_ref(WIZARD));
}
