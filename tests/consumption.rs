use babonus::consumption::ConsumptionValue;
use babonus::{
    BabonusError, Consumption, ConsumptionType, Item, ItemKind, Pool,
};
use util::*;

fn consumption(consumption_type: ConsumptionType, max: i64) -> Consumption {
    let mut consumption = Consumption::new(consumption_type);
    consumption.value = ConsumptionValue {
        min: 1,
        max,
        step: 1,
    };
    consumption
}

#[test]
fn resources() {
    let mut fighter = fighter();
    let owner = actor_ref(FIGHTER);
    let superiority = consumption(ConsumptionType::Resources, 5);
    assert_eq!(superiority.consume(&mut fighter, &owner, "primary", 2), Ok(()));
    assert_eq!(fighter.resources["primary"].value, 1);
    assert_eq!(
        superiority.consume(&mut fighter, &owner, "primary", 2),
        Err(BabonusError::InsufficientResource {
            property: "primary".to_string(),
            amount: 2,
            available: 1,
        })
    );
    assert_eq!(fighter.resources["primary"].value, 1);
    assert!(matches!(
        superiority.consume(&mut fighter, &owner, "secondary", 1),
        Err(BabonusError::ConsumptionUnavailable(_, _))
    ));
}

#[test]
fn amounts_are_validated() {
    let mut fighter = fighter();
    let owner = actor_ref(FIGHTER);
    let mut ki = consumption(ConsumptionType::Resources, 3);
    ki.value.step = 2;
    assert_eq!(
        ki.consume(&mut fighter, &owner, "primary", 2),
        Err(BabonusError::InvalidConsumption {
            amount: 2,
            min: 1,
            max: 3,
            step: 2,
        })
    );
    assert!(ki.consume(&mut fighter, &owner, "primary", 0).is_err());
    assert!(ki.consume(&mut fighter, &owner, "primary", 3).is_ok());
    assert_eq!(fighter.resources["primary"].value, 0);
}

#[test]
fn attributes_and_currency() {
    let mut fighter = fighter();
    let owner = actor_ref(FIGHTER);
    let blood = consumption(ConsumptionType::Attributes, 10);
    assert_eq!(blood.consume(&mut fighter, &owner, "hp", 10), Ok(()));
    assert_eq!(fighter.attributes["hp"], Pool::new(34, 44));
    assert_eq!(blood.max_value(&fighter, None, "hp"), Some(44));

    let coins = consumption(ConsumptionType::Currency, 20);
    assert_eq!(coins.current_value(&fighter, None, "gp"), 15);
    assert_eq!(coins.max_value(&fighter, None, "gp"), None);
    assert_eq!(coins.consume(&mut fighter, &owner, "gp", 15), Ok(()));
    assert_eq!(fighter.currency["gp"], 0);
}

#[test]
fn hit_dice() {
    let mut fighter = fighter();
    let owner = actor_ref(FIGHTER);
    let durable = consumption(ConsumptionType::HitDice, 5);
    assert_eq!(durable.current_value(&fighter, None, "fighter"), 5);
    assert_eq!(durable.consume(&mut fighter, &owner, "fighter", 4), Ok(()));
    assert_eq!(fighter.classes["fighter"].hit_dice_used, 4);
    assert_eq!(durable.current_value(&fighter, None, "fighter"), 1);
    assert!(durable.consume(&mut fighter, &owner, "fighter", 2).is_err());
}

#[test]
fn spell_slots() {
    let mut wizard = wizard();
    let owner = item_ref(WIZARD, FIREBALL);
    let upcast = consumption(ConsumptionType::Slots, 1);
    let fireball = wizard.item(&FIREBALL.into()).unwrap();
    assert_eq!(ConsumptionType::Slots.properties(&wizard, Some(fireball)).len(), 9);
    assert_eq!(upcast.consume(&mut wizard, &owner, "3", 1), Ok(()));
    assert_eq!(wizard.spell_slots["spell3"].value, 1);
    assert_eq!(
        upcast.consume(&mut wizard, &owner, "2", 1),
        Err(BabonusError::InsufficientResource {
            property: "2".to_string(),
            amount: 1,
            available: 0,
        })
    );
    // Slots belong to spells only.
    assert!(upcast
        .consume(&mut wizard, &actor_ref(WIZARD), "3", 1)
        .is_err());
    assert_eq!(wizard.spell_slots["spell3"].value, 1);
}

#[test]
fn uses_and_charges() {
    let mut wand = Item::new("wand", "Wand of Fire", ItemKind::Equipment);
    wand.uses = Some(Pool::new(2, 7));
    let mut ring = Item::new("ring", "Ring of Sparks", ItemKind::Equipment);
    ring.consume_target = Some("wand".into());
    let mut fighter = fighter().with_item(wand).with_item(ring);

    let uses = consumption(ConsumptionType::Uses, 3);
    let wand_ref = item_ref(FIGHTER, "wand");
    assert_eq!(uses.consume(&mut fighter, &wand_ref, "uses", 1), Ok(()));
    assert_eq!(fighter.item(&"wand".into()).unwrap().uses, Some(Pool::new(1, 7)));

    let charges = consumption(ConsumptionType::Charges, 3);
    let ring_ref = item_ref(FIGHTER, "ring");
    assert_eq!(charges.max_value(&fighter, fighter.item(&"ring".into()), "charges"), Some(7));
    assert_eq!(charges.consume(&mut fighter, &ring_ref, "charges", 1), Ok(()));
    assert_eq!(fighter.item(&"wand".into()).unwrap().uses, Some(Pool::new(0, 7)));
    assert!(charges.consume(&mut fighter, &ring_ref, "charges", 1).is_err());

    // The ring has no uses of its own.
    assert!(matches!(
        uses.consume(&mut fighter, &ring_ref, "uses", 1),
        Err(BabonusError::ConsumptionUnavailable(_, _))
    ));
}

#[test]
fn missing_item() {
    let mut fighter = fighter();
    let uses = consumption(ConsumptionType::Uses, 1);
    let owner = item_ref(FIGHTER, "nowhere");
    assert_eq!(
        uses.consume(&mut fighter, &owner, "uses", 1),
        Err(BabonusError::DocumentNotFound(owner.clone()))
    );
}

#[test]
fn disabled_consumption() {
    let mut fighter = fighter();
    let mut off = consumption(ConsumptionType::Resources, 1);
    off.enabled = false;
    assert!(!off.is_active());
    assert!(off
        .consume(&mut fighter, &actor_ref(FIGHTER), "primary", 1)
        .is_err());
    assert_eq!(fighter.resources["primary"].value, 3);
}
