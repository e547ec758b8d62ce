//! Ambient inputs to a save: who is acting, and what time it is.

/// Identity of whoever is performing the current operation.
pub trait CurrentActor: Sync {
    /// User id of an authenticated actor, `None` for guests and system jobs.
    fn actor_id(&self) -> Option<i32>;
}

impl CurrentActor for Option<i32> {
    fn actor_id(&self) -> Option<i32> {
        *self
    }
}

/// Unauthenticated actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guest;

impl CurrentActor for Guest {
    fn actor_id(&self) -> Option<i32> {
        None
    }
}

/// Source of the creation timestamp.
pub trait Clock: Send + Sync {
    /// Current time as a unix timestamp in seconds.
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}
