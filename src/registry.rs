//! Short lived store correlating the two halves of a roll.
//!
//! The host announces a roll before it's executed and reports the result afterwards.
//! The registry keeps what was announced, under a correlation id, until the entry expires.

use crate::bonus::BonusType;
use crate::document::{ActorId, ItemId};
use indexmap::IndexMap;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long an entry lives by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Correlation id of a registered roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(u64);

impl RegistryId {
    /// Returns the numeric value of this id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything known about a roll before it's executed.
#[derive(Debug, Clone, PartialEq)]
pub struct RollSetup {
    /// Type of bonuses the roll receives.
    pub kind: BonusType,
    /// The rolling actor.
    pub actor: ActorId,
    /// The rolled item.
    pub item: Option<ItemId>,
    /// The targeted actor.
    pub target: Option<ActorId>,
    /// The ability used.
    pub ability: Option<String>,
    /// The skill used.
    pub skill: Option<String>,
    /// Whether the roll is a critical hit.
    pub critical: bool,
    /// Denomination of the rolled hit die, e.g. `d8`.
    pub denomination: Option<String>,
}

impl RollSetup {
    fn new<A: Into<ActorId>>(kind: BonusType, actor: A) -> Self {
        Self {
            kind,
            actor: actor.into(),
            item: None,
            target: None,
            ability: None,
            skill: None,
            critical: false,
            denomination: None,
        }
    }

    /// An attack roll made with an item.
    pub fn attack<A: Into<ActorId>, I: Into<ItemId>>(actor: A, item: I) -> Self {
        Self {
            item: Some(item.into()),
            ..Self::new(BonusType::AttackRoll, actor)
        }
    }

    /// A damage roll made with an item.
    pub fn damage<A: Into<ActorId>, I: Into<ItemId>>(actor: A, item: I) -> Self {
        Self {
            item: Some(item.into()),
            ..Self::new(BonusType::DamageRoll, actor)
        }
    }

    /// The saving throw DC of an item.
    pub fn saving_throw_dc<A: Into<ActorId>, I: Into<ItemId>>(actor: A, item: I) -> Self {
        Self {
            item: Some(item.into()),
            ..Self::new(BonusType::SavingThrowDc, actor)
        }
    }

    /// A saving throw with an ability.
    pub fn saving_throw<A: Into<ActorId>, S: Into<String>>(actor: A, ability: S) -> Self {
        Self::new(BonusType::SavingThrow, actor).ability(ability)
    }

    /// A death saving throw, rolled as a saving throw with the ability `death`.
    pub fn death_save<A: Into<ActorId>>(actor: A) -> Self {
        Self::saving_throw(actor, "death")
    }

    /// An ability check.
    pub fn ability_check<A: Into<ActorId>, S: Into<String>>(actor: A, ability: S) -> Self {
        Self::new(BonusType::AbilityCheck, actor).ability(ability)
    }

    /// A hit die roll.
    pub fn hit_die<A: Into<ActorId>, S: Into<String>>(actor: A, denomination: S) -> Self {
        Self {
            denomination: Some(denomination.into()),
            ..Self::new(BonusType::HitDie, actor)
        }
    }

    /// Sets the target.
    pub fn target<A: Into<ActorId>>(mut self, target: A) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the ability.
    pub fn ability<S: Into<String>>(mut self, ability: S) -> Self {
        self.ability = Some(ability.into());
        self
    }

    /// Sets the skill of an ability check.
    pub fn skill<S: Into<String>>(mut self, skill: S) -> Self {
        self.skill = Some(skill.into());
        self
    }

    /// Marks a damage roll as critical.
    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Source of time for the registry.
pub trait Clock: Send + Sync {
    /// Returns the time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *lock(&self.now)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Entry {
    setup: RollSetup,
    deadline: Duration,
}

#[derive(Default)]
struct State {
    next_id: u64,
    entries: IndexMap<RegistryId, Entry>,
}

/// Store of registered rolls.
///
/// Cloning a registry yields a handle to the same store.
#[derive(Clone)]
pub struct Registry {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl Registry {
    /// Creates a registry whose entries live for `timeout`.
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
            timeout,
        }
    }

    /// Returns the lifetime of new entries.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stores a roll and returns its correlation id.
    pub fn register(&self, setup: RollSetup) -> RegistryId {
        let deadline = self.clock.now() + self.timeout;
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = RegistryId(state.next_id);
        state.entries.insert(id, Entry { setup, deadline });
        log::debug!("registered roll {}", id);
        id
    }

    /// Returns the roll registered under `id`, unless it has expired.
    pub fn get(&self, id: RegistryId) -> Option<RollSetup> {
        let now = self.clock.now();
        let state = lock(&self.state);
        state
            .entries
            .get(&id)
            .filter(|entry| entry.deadline > now)
            .map(|entry| entry.setup.clone())
    }

    /// Removes an entry. Removing an absent entry does nothing.
    pub fn remove(&self, id: RegistryId) -> Option<RollSetup> {
        let mut state = lock(&self.state);
        state.entries.shift_remove(&id).map(|entry| entry.setup)
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = lock(&self.state);
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.deadline > now);
        let purged = before - state.entries.len();
        if purged > 0 {
            log::debug!("purged {} expired rolls", purged);
        }
        purged
    }

    /// Returns the number of entries that haven't expired yet.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        lock(&self.state)
            .entries
            .values()
            .filter(|entry| entry.deadline > now)
            .count()
    }

    /// Returns `true` if no live entry exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a background thread purging expired entries every `interval`.
    pub fn janitor(&self, interval: Duration) -> io::Result<Janitor> {
        let registry = self.clone();
        let (sender, receiver) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("babonus-janitor".to_string())
            .spawn(move || loop {
                match receiver.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        registry.purge_expired();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Janitor {
            sender: Some(sender),
            handle: Some(handle),
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &lock(&self.state).entries.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Handle to the thread purging a registry.
///
/// The thread stops when the handle is shut down or dropped.
pub struct Janitor {
    sender: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Janitor {
    /// Stops the thread and waits for it to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            // The thread may already be gone.
            let _ = sender.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("janitor thread panicked");
            }
        }
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let registry = Registry::new(DEFAULT_TIMEOUT, Arc::new(ManualClock::new()));
        let a = registry.register(RollSetup::death_save("a"));
        let b = registry.register(RollSetup::death_save("a"));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).unwrap().ability.as_deref(), Some("death"));
    }

    #[test]
    fn remove_absent_is_noop() {
        let registry = Registry::new(DEFAULT_TIMEOUT, Arc::new(ManualClock::new()));
        let id = registry.register(RollSetup::hit_die("a", "d8"));
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn janitor_shuts_down() {
        let registry = Registry::new(Duration::from_millis(1), Arc::new(SystemClock::new()));
        registry.register(RollSetup::death_save("a"));
        let janitor = registry.janitor(Duration::from_millis(5)).unwrap();
        thread::sleep(Duration::from_millis(50));
        janitor.shutdown();
        assert!(registry.is_empty());
    }
}
