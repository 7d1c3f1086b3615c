//! Property-based tests for hierarchy navigation and event ordering.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use hfsm::builder::{DefinitionBuilder, StateBuilder, TransitionBuilder};
use hfsm::core::hierarchy::{self, Hierarchy};
use hfsm::{EventId, StateId};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

type Seen = Mutex<Vec<EventId>>;

fn state(i: usize) -> StateId {
    StateId::from(format!("s{i}"))
}

prop_compose! {
    /// A forest of up to 12 states: state `i` has no parent or a parent
    /// with a smaller index, so chains are always acyclic.
    fn arbitrary_forest()(parents in prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..12))
        -> HashMap<StateId, StateId>
    {
        parents
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, parent)| parent.as_ref().map(|index| (state(i), state(index.index(i)))))
            .collect()
    }
}

fn arbitrary_pair() -> impl Strategy<Value = (HashMap<StateId, StateId>, StateId, StateId)> {
    arbitrary_forest().prop_flat_map(|forest| {
        let size = forest
            .keys()
            .chain(forest.values())
            .filter_map(|id| id.as_str()[1..].parse::<usize>().ok())
            .max()
            .map_or(1, |max| max + 1);
        (Just(forest), 0..size, 0..size)
            .prop_map(|(forest, a, b)| (forest, state(a), state(b)))
    })
}

proptest! {
    #[test]
    fn lca_is_an_ancestor_of_both((forest, a, b) in arbitrary_pair()) {
        if let Some(common) = hierarchy::lca(&forest, &a, &b) {
            prop_assert!(hierarchy::is_ancestor_or_self(&forest, &a, common));
            prop_assert!(hierarchy::is_ancestor_or_self(&forest, &b, common));
        } else {
            let roots_a = hierarchy::ancestors(&forest, &a).last().cloned();
            let roots_b = hierarchy::ancestors(&forest, &b).last().cloned();
            prop_assert_ne!(roots_a, roots_b);
        }
    }

    #[test]
    fn lca_is_symmetric((forest, a, b) in arbitrary_pair()) {
        prop_assert_eq!(
            hierarchy::lca(&forest, &a, &b).cloned(),
            hierarchy::lca(&forest, &b, &a).cloned()
        );
    }

    #[test]
    fn exit_path_climbs_to_the_common_ancestor((forest, a, b) in arbitrary_pair()) {
        let common = hierarchy::lca(&forest, &a, &b).cloned();
        let exits = hierarchy::exit_path(&forest, &a, common.as_ref());

        if let Some(first) = exits.first() {
            prop_assert_eq!(first, &a);
        }
        if let Some(last) = exits.last() {
            prop_assert_eq!(forest.parent_of(last), common.as_ref());
        }
        let unique: HashSet<_> = exits.iter().collect();
        prop_assert_eq!(unique.len(), exits.len());
    }

    #[test]
    fn enter_path_descends_to_the_target((forest, a, b) in arbitrary_pair()) {
        let common = hierarchy::lca(&forest, &a, &b).cloned();
        let enters = hierarchy::enter_path(&forest, &b, common.as_ref());

        prop_assert_eq!(enters.last(), Some(&b));
        if common.as_ref() != Some(&b) {
            prop_assert_eq!(forest.parent_of(&enters[0]), common.as_ref());
        }
        for pair in enters.windows(2) {
            prop_assert_eq!(forest.parent_of(&pair[1]), Some(&pair[0]));
        }
    }

    #[test]
    fn exits_and_entries_never_overlap((forest, a, b) in arbitrary_pair()) {
        let common = hierarchy::lca(&forest, &a, &b).cloned();
        let exits: HashSet<_> = hierarchy::exit_path(&forest, &a, common.as_ref()).into_iter().collect();
        let enters = hierarchy::enter_path(&forest, &b, common.as_ref());
        prop_assert!(enters.iter().all(|state| !exits.contains(state)));
    }

    #[test]
    fn depth_counts_ancestors((forest, a, _b) in arbitrary_pair()) {
        prop_assert_eq!(forest.depth_of(&a), hierarchy::ancestors(&forest, &a).count() - 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn events_are_handled_in_send_order(events in prop::collection::vec(0..5u8, 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let mut builder = DefinitionBuilder::<Seen>::new()
            .state(StateBuilder::normal("idle"))
            .initial("idle");
        for i in 0..5u8 {
            builder = builder.transition(TransitionBuilder::<Seen>::any(format!("e{i}"), "idle").action(|ctx| {
                ctx.data().lock().unwrap().push(ctx.event().id().clone());
                Ok(())
            }));
        }
        let definition = builder.build().unwrap();

        let expected: Vec<EventId> = events.iter().map(|i| EventId::from(format!("e{i}"))).collect();
        let seen = runtime.block_on(async {
            let machine = definition.machine(Mutex::new(Vec::new())).build().unwrap();
            machine.start().unwrap();
            let (last, rest) = expected.split_last().unwrap();
            for event in rest {
                machine.send(event.clone());
            }
            machine.send_and_wait(last.clone()).await.unwrap();
            machine.stop();
            let seen = machine.data().lock().unwrap().clone();
            seen
        });

        prop_assert_eq!(seen, expected);
    }
}
