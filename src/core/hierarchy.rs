//! Hierarchy navigation: ancestors, least common ancestor, and the
//! exit/entry paths a transition walks.
//!
//! The root is not a state. Functions that may land on it return `None`,
//! and every pair of states has a well-defined least common ancestor
//! (in the worst case that root).

use super::ids::StateId;
use std::collections::HashMap;

/// Parent lookup over a state graph.
///
/// Implementations must describe a finite, acyclic parent chain; the
/// definition builder validates this before any runtime exists.
pub trait Hierarchy {
    /// Parent of `id`, `None` for top-level (or unknown) states.
    fn parent_of(&self, id: &StateId) -> Option<&StateId>;

    /// Number of proper ancestors of `id`; top-level states have depth 0.
    fn depth_of(&self, id: &StateId) -> usize {
        ancestors(self, id).count().saturating_sub(1)
    }
}

/// Child to parent map; handy for graphs assembled outside a definition.
impl Hierarchy for HashMap<StateId, StateId> {
    fn parent_of(&self, id: &StateId) -> Option<&StateId> {
        self.get(id)
    }
}

/// Iterator over a state and its ancestors, innermost first.
pub struct Ancestors<'a, H: ?Sized> {
    hierarchy: &'a H,
    next: Option<&'a StateId>,
}

impl<'a, H: Hierarchy + ?Sized> Iterator for Ancestors<'a, H> {
    type Item = &'a StateId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.hierarchy.parent_of(current);
        Some(current)
    }
}

/// `id` followed by its parent chain up to the top-level state.
pub fn ancestors<'a, H: Hierarchy + ?Sized>(hierarchy: &'a H, id: &'a StateId) -> Ancestors<'a, H> {
    Ancestors {
        hierarchy,
        next: Some(id),
    }
}

/// Whether `ancestor` is `id` itself or one of its ancestors.
pub fn is_ancestor_or_self<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    id: &StateId,
    ancestor: &StateId,
) -> bool {
    ancestors(hierarchy, id).any(|state| state == ancestor)
}

/// Least common ancestor of `a` and `b`, each counting as its own ancestor.
///
/// Returns `None` when the only shared ancestor is the root.
pub fn lca<'a, H: Hierarchy + ?Sized>(
    hierarchy: &'a H,
    a: &'a StateId,
    b: &'a StateId,
) -> Option<&'a StateId> {
    if a == b {
        return Some(a);
    }

    let mut depth_a = hierarchy.depth_of(a);
    let mut depth_b = hierarchy.depth_of(b);
    let mut a = Some(a);
    let mut b = Some(b);

    while depth_a > depth_b {
        a = a.and_then(|id| hierarchy.parent_of(id));
        depth_a -= 1;
    }
    while depth_b > depth_a {
        b = b.and_then(|id| hierarchy.parent_of(id));
        depth_b -= 1;
    }

    loop {
        match (a, b) {
            (Some(x), Some(y)) if x == y => return Some(x),
            (Some(x), Some(y)) => {
                a = hierarchy.parent_of(x);
                b = hierarchy.parent_of(y);
            }
            _ => return None,
        }
    }
}

/// States exited when leaving `from` for `ancestor`: innermost first, up to
/// but excluding `ancestor`.
pub fn exit_path<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    from: &StateId,
    ancestor: Option<&StateId>,
) -> Vec<StateId> {
    ancestors(hierarchy, from)
        .take_while(|state| Some(*state) != ancestor)
        .cloned()
        .collect()
}

/// States entered when descending from `ancestor` to `target`: outermost
/// first, excluding `ancestor`.
///
/// When `target` is the ancestor itself the path is the single re-entry of
/// `target`, so re-entry side effects still run.
pub fn enter_path<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    target: &StateId,
    ancestor: Option<&StateId>,
) -> Vec<StateId> {
    if ancestor == Some(target) {
        return vec![target.clone()];
    }
    let mut path = exit_path(hierarchy, target, ancestor);
    path.reverse();
    path
}
