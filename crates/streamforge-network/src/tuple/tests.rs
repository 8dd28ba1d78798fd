//! Tests for the tuple model.

use super::*;
use crate::fact::fact;
use proptest::prelude::*;
use smallvec::smallvec;

mod tuple_list {
    use super::*;

    #[test]
    fn test_add_and_remove_middle() {
        let mut list = TupleList::new();
        let a = list.add('a');
        let b = list.add('b');
        let c = list.add('c');

        assert_eq!(list.first(), Some(&'a'));
        assert_eq!(list.last(), Some(&'c'));
        assert_eq!(list.remove(b), 'b');
        assert_eq!(list.iter().copied().collect::<String>(), "ac");
        assert_eq!(list.get(a), Some(&'a'));
        assert_eq!(list.get(b), None);

        list.remove(a);
        assert_eq!(list.first(), Some(&'c'));
        list.remove(c);
        assert!(list.is_empty());
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
    }

    #[test]
    fn test_drain_and_reuse() {
        let mut list = TupleList::new();
        for i in 0..5 {
            list.add(i);
        }
        assert_eq!(list.drain(), vec![0, 1, 2, 3, 4]);
        assert!(list.is_empty());

        let e = list.add(9);
        assert_eq!(list.entries().map(|(entry, v)| (entry, *v)).collect::<Vec<_>>(), vec![(e, 9)]);
    }

    #[test]
    #[should_panic(expected = "already removed")]
    fn test_double_remove_panics() {
        let mut list = TupleList::new();
        let e = list.add(1);
        list.remove(e);
        list.remove(e);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![any::<u8>().prop_map(Op::Add), any::<usize>().prop_map(Op::Remove)]
    }

    proptest! {
        #[test]
        fn prop_matches_vec_model(ops in prop::collection::vec(op(), 0..64)) {
            let mut list = TupleList::new();
            let mut model: Vec<(ListEntry, u8)> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(v) => model.push((list.add(v), v)),
                    Op::Remove(i) if !model.is_empty() => {
                        let (entry, v) = model.remove(i % model.len());
                        prop_assert_eq!(list.remove(entry), v);
                    }
                    Op::Remove(_) => {}
                }
                prop_assert_eq!(list.len(), model.len());
                prop_assert_eq!(list.first(), model.first().map(|(_, v)| v));
                prop_assert_eq!(list.last(), model.last().map(|(_, v)| v));
                let values: Vec<u8> = list.iter().copied().collect();
                let expected: Vec<u8> = model.iter().map(|(_, v)| *v).collect();
                prop_assert_eq!(values, expected);
            }
        }
    }
}

mod tuple_state {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut state = TupleState::Creating;
        assert!(state.is_dirty());
        assert_eq!(state.settle(), Some(Event::Insert));
        assert_eq!(state, TupleState::Ok);

        assert!(state.mark_updated());
        assert!(!state.mark_updated());
        assert_eq!(state.settle(), Some(Event::Update));

        assert!(state.mark_retracted());
        assert_eq!(state.settle(), Some(Event::Retract));
        assert_eq!(state, TupleState::Dead);
        assert!(!state.is_active());
    }

    #[test]
    fn test_abort_before_propagation() {
        let mut state = TupleState::Creating;
        assert!(!state.mark_updated());
        assert!(!state.mark_retracted());
        assert_eq!(state, TupleState::Aborting);
        assert_eq!(state.settle(), None);
        assert_eq!(state, TupleState::Dead);
    }

    #[test]
    fn test_retract_while_updating() {
        let mut state = TupleState::Ok;
        assert!(state.mark_updated());
        assert!(!state.mark_retracted());
        assert_eq!(state.settle(), Some(Event::Retract));
    }

    #[test]
    #[should_panic(expected = "Impossible state")]
    fn test_update_of_dead_tuple() {
        let mut state = TupleState::Dead;
        state.mark_updated();
    }
}

mod arena {
    use super::*;

    #[test]
    fn test_slots_and_sweep() {
        let mut arena = TupleArena::new();
        let id = arena.create(smallvec![fact(1u32), fact("x")], 2);
        assert_eq!(arena.facts(id).len(), 2);
        assert!(matches!(arena.slot(id, 1), StoreValue::Empty));

        arena.set_slot(id, 1, StoreValue::Passed);
        assert!(matches!(arena.take_slot(id, 1), StoreValue::Passed));
        assert!(matches!(arena.slot(id, 1), StoreValue::Empty));

        arena.state_mut(id).settle();
        arena.state_mut(id).mark_retracted();
        arena.state_mut(id).settle();
        arena.bury(id);
        // Buried tuples stay readable until swept.
        assert_eq!(arena.facts(id).len(), 2);
        assert_eq!(arena.sweep(), 1);
        assert_eq!(arena.len(), 0);
    }
}
