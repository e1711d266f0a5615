use babonus::registry::DEFAULT_TIMEOUT;
use babonus::{BonusType, Clock, ManualClock, Registry, RollSetup, SystemClock};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn registry() -> (Registry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Registry::new(DEFAULT_TIMEOUT, clock.clone()), clock)
}

#[test]
fn entries_expire_after_five_minutes() {
    let (registry, clock) = registry();
    assert_eq!(registry.timeout(), Duration::from_secs(300));
    let id = registry.register(RollSetup::saving_throw("fighter", "con"));
    clock.advance(Duration::from_secs(1));
    let setup = registry.get(id).unwrap();
    assert_eq!(setup.kind, BonusType::SavingThrow);
    assert_eq!(setup.ability.as_deref(), Some("con"));
    // Reading an entry doesn't consume it.
    assert!(registry.get(id).is_some());
    clock.advance(Duration::from_secs(300));
    assert_eq!(registry.get(id), None);
    assert!(registry.is_empty());
}

#[test]
fn purge_drops_expired_entries_only() {
    let (registry, clock) = registry();
    let old = registry.register(RollSetup::death_save("fighter"));
    clock.advance(Duration::from_secs(200));
    let fresh = registry.register(RollSetup::hit_die("fighter", "d10"));
    clock.advance(Duration::from_secs(150));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.purge_expired(), 1);
    assert_eq!(registry.purge_expired(), 0);
    assert_eq!(registry.remove(old), None);
    let setup = registry.remove(fresh).unwrap();
    assert_eq!(setup.kind, BonusType::HitDie);
    assert_eq!(setup.denomination.as_deref(), Some("d10"));
}

#[test]
fn setups() {
    let death = RollSetup::death_save("fighter");
    assert_eq!(death.kind, BonusType::SavingThrow);
    assert_eq!(death.ability.as_deref(), Some("death"));

    let attack = RollSetup::attack("fighter", "sword").target("goblin");
    assert_eq!(attack.kind, BonusType::AttackRoll);
    assert_eq!(attack.item, Some("sword".into()));
    assert_eq!(attack.target, Some("goblin".into()));

    let damage = RollSetup::damage("fighter", "sword").critical(true);
    assert_eq!(damage.kind, BonusType::DamageRoll);
    assert!(damage.critical);

    let check = RollSetup::ability_check("fighter", "str").skill("ath");
    assert_eq!(check.kind, BonusType::AbilityCheck);
    assert_eq!(check.skill.as_deref(), Some("ath"));

    let dc = RollSetup::saving_throw_dc("wizard", "fireball");
    assert_eq!(dc.kind, BonusType::SavingThrowDc);
}

#[test]
fn clones_share_entries() {
    let (registry, _clock) = registry();
    let handle = registry.clone();
    let id = handle.register(RollSetup::death_save("fighter"));
    assert!(registry.get(id).is_some());
    let other = registry.register(RollSetup::death_save("fighter"));
    assert_ne!(id, other);
}

#[test]
fn janitor_purges_in_background() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let registry = Registry::new(Duration::from_millis(10), clock);
    registry.register(RollSetup::death_save("fighter"));
    let janitor = registry.janitor(Duration::from_millis(5)).unwrap();
    let mut purged = false;
    for _ in 0..200 {
        thread::sleep(Duration::from_millis(5));
        // Debug output counts expired entries too.
        if format!("{:?}", registry).contains("entries: 0") {
            purged = true;
            break;
        }
    }
    janitor.shutdown();
    assert!(purged);
}
