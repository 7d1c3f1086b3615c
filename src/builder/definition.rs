//! Builder and static validator for state graphs.

use super::error::{BuildError, DefinitionError};
use super::state::StateBuilder;
use super::transition::TransitionBuilder;
use crate::core::{Definition, Source, StateId, StateKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

fn check(ok: bool, error: impl FnOnce() -> DefinitionError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Declares states and transitions, validates them, and produces an
/// immutable [`Definition`].
///
/// Validation accumulates every structural problem instead of stopping at
/// the first one, so a broken graph is reported in full.
///
/// # Example
///
/// ```
/// use hfsm::builder::{DefinitionBuilder, StateBuilder, TransitionBuilder};
///
/// let definition = DefinitionBuilder::<()>::new()
///     .state(StateBuilder::normal("vehicle").default_child("parked"))
///     .state(StateBuilder::normal("parked").parent("vehicle"))
///     .state(StateBuilder::normal("driving").parent("vehicle"))
///     .transition(TransitionBuilder::new("parked", "ride", "driving"))
///     .initial("vehicle")
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.children("vehicle").len(), 2);
/// ```
pub struct DefinitionBuilder<D> {
    states: Vec<StateBuilder<D>>,
    transitions: Vec<TransitionBuilder<D>>,
    initial: Option<StateId>,
}

impl<D: 'static> DefinitionBuilder<D> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
        }
    }

    pub fn state(mut self, state: StateBuilder<D>) -> Self {
        self.states.push(state);
        self
    }

    pub fn transition(mut self, transition: TransitionBuilder<D>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Set the state entered on start (required).
    pub fn initial(mut self, state: impl Into<StateId>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Check the declared graph, accumulating every error.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let mut kinds: HashMap<&StateId, StateKind> = HashMap::new();
        let mut checks: Vec<Check> = Vec::new();

        for state in &self.states {
            let fresh = kinds.insert(state.id(), state.kind()).is_none();
            checks.push(check(fresh, || {
                DefinitionError::DuplicateState(state.id().clone())
            }));
        }

        checks.push(match &self.initial {
            None => Validation::fail(DefinitionError::MissingInitialState),
            Some(initial) => check(kinds.contains_key(initial), || {
                DefinitionError::UndefinedInitialState(initial.clone())
            }),
        });

        for state in &self.states {
            checks.extend(self.check_state(state, &kinds));
        }
        checks.extend(self.check_parent_cycles(&kinds));
        for transition in &self.transitions {
            checks.extend(check_transition(transition, &kinds));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    fn check_state(&self, state: &StateBuilder<D>, kinds: &HashMap<&StateId, StateKind>) -> Vec<Check> {
        let id = state.id();
        let mut checks = Vec::new();

        if let Some(parent) = state.parent_id() {
            checks.push(check(kinds.contains_key(parent), || {
                DefinitionError::UndefinedParent {
                    state: id.clone(),
                    parent: parent.clone(),
                }
            }));
        }

        if let Some(child) = state.default_child_id() {
            let declared = self.states.iter().find(|other| other.id() == child);
            checks.push(match declared {
                None => Validation::fail(DefinitionError::UndefinedDefaultChild {
                    state: id.clone(),
                    child: child.clone(),
                }),
                Some(declared) => check(declared.parent_id() == Some(id), || {
                    DefinitionError::DefaultChildNotChild {
                        state: id.clone(),
                        child: child.clone(),
                    }
                }),
            });
        }

        if let Some(target) = state.timeout_target() {
            checks.push(check(kinds.contains_key(target), || {
                DefinitionError::UndefinedTimeoutTarget {
                    state: id.clone(),
                    target: target.clone(),
                }
            }));
        }

        checks.push(check(!state.has_orphan_timeout_action(), || {
            DefinitionError::TimeoutActionWithoutTimeout(id.clone())
        }));
        checks
    }

    /// Report every state whose parent chain leads back to itself.
    fn check_parent_cycles(&self, kinds: &HashMap<&StateId, StateKind>) -> Vec<Check> {
        let parents: HashMap<&StateId, &StateId> = self
            .states
            .iter()
            .filter_map(|state| state.parent_id().map(|parent| (state.id(), parent)))
            .collect();
        let limit = kinds.len();

        let mut reported = HashSet::new();
        let mut checks = Vec::new();
        for state in &self.states {
            let start = state.id();
            let mut cursor = parents.get(start).copied();
            let mut steps = 0;
            while let Some(current) = cursor {
                if current == start {
                    if reported.insert(start) {
                        checks.push(Validation::fail(DefinitionError::ParentCycle(start.clone())));
                    }
                    break;
                }
                steps += 1;
                if steps > limit {
                    break;
                }
                cursor = parents.get(current).copied();
            }
        }
        checks
    }

    /// Validate, then assemble the immutable definition.
    ///
    /// `timeout_transition` declarations are turned into ordinary
    /// transitions keyed on their generated timeout event, appended after
    /// the declared ones.
    pub fn build(self) -> Result<Arc<Definition<D>>, BuildError> {
        if let Validation::Failure(errors) = self.validate() {
            return Err(BuildError::Invalid {
                errors: errors.iter().cloned().collect(),
            });
        }
        let initial = self.initial.ok_or_else(|| BuildError::Invalid {
            errors: vec![DefinitionError::MissingInitialState],
        })?;

        let mut transitions: Vec<_> = self
            .transitions
            .into_iter()
            .map(TransitionBuilder::into_transition)
            .collect();
        let states: Vec<_> = self.states.into_iter().map(StateBuilder::into_state).collect();

        for state in &states {
            if let Some((timeout, target)) = state
                .timeout()
                .and_then(|timeout| timeout.target().map(|target| (timeout, target)))
            {
                transitions.push(
                    TransitionBuilder::new(state.id().clone(), timeout.event().clone(), target.clone())
                        .into_transition(),
                );
            }
        }

        Ok(Arc::new(Definition::assemble(states, transitions, initial)))
    }
}

impl<D: 'static> Default for DefinitionBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_transition<D: 'static>(
    transition: &TransitionBuilder<D>,
    kinds: &HashMap<&StateId, StateKind>,
) -> Vec<Check> {
    let event = transition.event();
    let mut checks = vec![check(!event.is_reserved(), || {
        DefinitionError::ReservedEvent(event.clone())
    })];

    if let Source::State(source) = transition.source() {
        checks.push(match kinds.get(source) {
            None => Validation::fail(DefinitionError::UndefinedTransitionSource {
                state: source.clone(),
                event: event.clone(),
            }),
            Some(kind) => check(*kind != StateKind::Final, || {
                DefinitionError::TransitionFromFinal {
                    state: source.clone(),
                    event: event.clone(),
                }
            }),
        });
    }

    let target = transition.target();
    checks.push(check(kinds.contains_key(target), || {
        DefinitionError::UndefinedTransitionTarget {
            target: target.clone(),
            event: event.clone(),
        }
    }));
    checks
}
