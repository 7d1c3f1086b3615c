//! The validated, immutable state graph.

use super::hierarchy::{self, Hierarchy};
use super::ids::{EventId, StateId};
use super::state::State;
use super::transition::{Source, Transition};
use std::collections::HashMap;

/// Immutable state graph shared by every machine built from it.
///
/// A `Definition` only exists after the builder validated it, so its
/// lookups can rely on every referenced id being declared and on parent
/// chains being acyclic.
pub struct Definition<D = ()> {
    states: Vec<State<D>>,
    index: HashMap<StateId, usize>,
    transitions: Vec<Transition<D>>,
    initial: StateId,
    children: HashMap<StateId, Vec<StateId>>,
    depth: HashMap<StateId, usize>,
    by_source: HashMap<StateId, Vec<usize>>,
    wildcard: Vec<usize>,
}

impl<D> Definition<D> {
    /// Assemble the derived indexes. Callers must have validated `states`,
    /// `transitions` and `initial`.
    pub(crate) fn assemble(
        states: Vec<State<D>>,
        transitions: Vec<Transition<D>>,
        initial: StateId,
    ) -> Self {
        let index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.id.clone(), i))
            .collect();

        let mut children: HashMap<StateId, Vec<StateId>> = HashMap::new();
        for state in &states {
            if let Some(parent) = &state.parent {
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(state.id.clone());
            }
        }

        let mut by_source: HashMap<StateId, Vec<usize>> = HashMap::new();
        let mut wildcard = Vec::new();
        for (i, transition) in transitions.iter().enumerate() {
            match &transition.source {
                Source::State(id) => by_source.entry(id.clone()).or_default().push(i),
                Source::Any => wildcard.push(i),
            }
        }

        let mut definition = Self {
            states,
            index,
            transitions,
            initial,
            children,
            depth: HashMap::new(),
            by_source,
            wildcard,
        };
        definition.depth = definition
            .states
            .iter()
            .map(|state| {
                let depth = hierarchy::ancestors(&definition, &state.id).count() - 1;
                (state.id.clone(), depth)
            })
            .collect();
        definition
    }

    pub fn state(&self, id: &str) -> Option<&State<D>> {
        self.index.get(id).map(|&i| &self.states[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// States in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State<D>> {
        self.states.iter()
    }

    /// Transitions in declaration order, including those synthesised for
    /// timeout transitions.
    pub fn transitions(&self) -> &[Transition<D>] {
        &self.transitions
    }

    pub fn initial(&self) -> &StateId {
        &self.initial
    }

    /// Direct children of `id`, in declaration order.
    pub fn children(&self, id: &str) -> &[StateId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ordered candidate transitions for `event` with `leaf` active.
    ///
    /// Candidates declared on the leaf come first, then those declared on
    /// each ancestor outward, then wildcard transitions. Declaration order
    /// is preserved inside each tier.
    pub fn candidates<'a>(
        &'a self,
        leaf: &'a StateId,
        event: &'a EventId,
    ) -> impl Iterator<Item = &'a Transition<D>> + 'a {
        let scoped = hierarchy::ancestors(self, leaf)
            .filter_map(move |state| self.by_source.get(state))
            .flatten();
        scoped
            .chain(self.wildcard.iter())
            .map(move |&i| &self.transitions[i])
            .filter(move |transition| transition.event == *event)
    }
}

impl<D> Hierarchy for Definition<D> {
    fn parent_of(&self, id: &StateId) -> Option<&StateId> {
        self.state(id.as_str())?.parent.as_ref()
    }

    fn depth_of(&self, id: &StateId) -> usize {
        self.depth.get(id).copied().unwrap_or(0)
    }
}
