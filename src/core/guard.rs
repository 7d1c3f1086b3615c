//! Guard predicates for controlling state transitions.

use crate::runtime::Context;
use std::sync::Arc;

/// Predicate that decides whether a candidate transition is taken.
///
/// Guards see a context reflecting the leaf state *before* the transition.
/// A guard returning `false` is not an error: selection simply moves on to
/// the next candidate.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Guard;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Bike {
///     kickstand_up: AtomicBool,
///     dashboard_ready: AtomicBool,
/// }
///
/// let ready_to_ride: Guard<Bike> = Guard::all(vec![
///     Guard::<Bike>::new(|ctx| ctx.data().kickstand_up.load(Ordering::SeqCst)),
///     Guard::<Bike>::new(|ctx| ctx.data().dashboard_ready.load(Ordering::SeqCst)),
/// ]);
/// # let _ = ready_to_ride;
/// ```
pub struct Guard<D> {
    predicate: Arc<dyn Fn(&Context<'_, D>) -> bool + Send + Sync>,
}

impl<D> Guard<D> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Context<'_, D>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Conjunction of several guards, evaluated in order with
    /// short-circuiting.
    pub fn all(guards: Vec<Guard<D>>) -> Self
    where
        D: 'static,
    {
        Guard::new(move |ctx| guards.iter().all(|guard| guard.check(ctx)))
    }

    pub fn check(&self, ctx: &Context<'_, D>) -> bool {
        (self.predicate)(ctx)
    }
}

impl<D> Clone for Guard<D> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}
