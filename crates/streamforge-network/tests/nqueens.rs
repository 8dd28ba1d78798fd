//! N-Queens through the whole network: unique pairs, filters and the
//! incremental score against brute force.

use proptest::prelude::*;
use streamforge_config::NetworkConfig;
use streamforge_core::{Score, SimpleScore};
use streamforge_network::joiner::equal;
use streamforge_network::{ConstraintDef, ConstraintFactory, FactHandle, ScoreDirector, ScoreDirectorFactory};
use streamforge_test::nqueens::{conflicts, row_conflicts};
use streamforge_test::{init_logging, Queen};

fn constraints() -> Vec<ConstraintDef<SimpleScore>> {
    let factory = ConstraintFactory::new();
    vec![
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.row))
            .filter(|a: &Queen, _: &Queen| a.row.is_some())
            .penalize(SimpleScore::of(1))
            .as_constraint("Row conflict"),
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.ascending_diagonal()))
            .filter(|a: &Queen, _: &Queen| a.row.is_some())
            .penalize(SimpleScore::of(1))
            .as_constraint("Ascending diagonal conflict"),
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.descending_diagonal()))
            .filter(|a: &Queen, _: &Queen| a.row.is_some())
            .penalize(SimpleScore::of(1))
            .as_constraint("Descending diagonal conflict"),
    ]
}

fn director() -> ScoreDirector<SimpleScore> {
    init_logging();
    ScoreDirectorFactory::new(constraints(), &NetworkConfig::default())
        .unwrap()
        .build_director()
}

fn queens(director: &ScoreDirector<SimpleScore>) -> Vec<Queen> {
    director.facts_of::<Queen>().map(|(_, q)| q.clone()).collect()
}

#[test]
fn test_two_queens_on_one_row() {
    let mut director = director();
    director.insert_fact(Queen::assigned(0, 0, 0));
    let q1 = director.insert_fact(Queen::assigned(1, 1, 0));
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));

    let removed = director.retract_fact(q1).unwrap();
    assert_eq!(director.calculate_score(), SimpleScore::zero());

    let queen = streamforge_network::fact::downcast::<Queen>(&removed)
        .unwrap()
        .clone();
    director.insert_fact(queen);
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));
}

#[test]
fn test_four_queens_solution() {
    let mut director = director();
    let handles: Vec<FactHandle> = Queen::with_rows(&[0, 0, 0, 0])
        .into_iter()
        .map(|q| director.insert_fact(q))
        .collect();
    assert_eq!(director.calculate_score(), SimpleScore::of(-6));

    for (&handle, &row) in handles.iter().zip(&[1, 3, 0, 2]) {
        director
            .update_fact(handle, "row", |q: &mut Queen| q.row = Some(row))
            .unwrap();
        assert_eq!(
            director.calculate_score(),
            SimpleScore::of(-conflicts(&queens(&director)))
        );
    }
    assert_eq!(director.calculate_score(), SimpleScore::zero());

    let totals = director.constraint_match_totals();
    assert!(totals.values().all(|t| t.match_count == 0));
}

#[test]
fn test_unassigning_removes_conflicts() {
    let mut director = director();
    let handles: Vec<FactHandle> = Queen::with_rows(&[0, 1, 2])
        .into_iter()
        .map(|q| director.insert_fact(q))
        .collect();
    // All three on one descending diagonal.
    assert_eq!(director.calculate_score(), SimpleScore::of(-3));

    director
        .update_fact(handles[1], "row", |q: &mut Queen| q.row = None)
        .unwrap();
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));
    assert_eq!(row_conflicts(&queens(&director)), 0);
    director.verify_score().unwrap();
}

#[derive(Debug, Clone)]
enum Op {
    Insert(i64),
    Move(usize, Option<i64>),
    Retract(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..5).prop_map(Op::Insert),
        4 => (any::<usize>(), proptest::option::weighted(0.8, 0i64..5)).prop_map(|(i, row)| Op::Move(i, row)),
        2 => any::<usize>().prop_map(Op::Retract),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_incremental_matches_from_scratch(ops in proptest::collection::vec(op(), 1..40)) {
        let mut director = director();
        let mut handles: Vec<FactHandle> = Vec::new();
        let mut next_id = 0i64;
        for op in ops {
            match op {
                Op::Insert(row) => {
                    handles.push(director.insert_fact(Queen::assigned(next_id, next_id, row)));
                    next_id += 1;
                }
                Op::Move(i, row) if !handles.is_empty() => {
                    let handle = handles[i % handles.len()];
                    director.update_fact(handle, "row", |q: &mut Queen| q.row = row).unwrap();
                }
                Op::Retract(i) if !handles.is_empty() => {
                    let handle = handles.swap_remove(i % handles.len());
                    director.retract_fact(handle).unwrap();
                }
                _ => {}
            }
            prop_assert!(director.verify_score().is_ok());
            prop_assert_eq!(
                director.calculate_score(),
                SimpleScore::of(-conflicts(&queens(&director)))
            );
        }

        for handle in handles {
            director.retract_fact(handle).unwrap();
        }
        prop_assert!(director.network_stats().is_empty());
        prop_assert_eq!(director.live_tuple_count(), 0);
    }
}
