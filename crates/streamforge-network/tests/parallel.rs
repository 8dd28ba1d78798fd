//! One network per worker: a shared factory, and forks evaluated in
//! parallel.

use rayon::prelude::*;
use streamforge_config::NetworkConfig;
use streamforge_core::SimpleScore;
use streamforge_network::joiner::equal;
use streamforge_network::{ConstraintDef, ConstraintFactory, ScoreDirector, ScoreDirectorFactory};
use streamforge_test::nqueens::conflicts;
use streamforge_test::Queen;

fn assert_send<T: Send>() {}
fn assert_send_sync<T: Send + Sync>() {}

fn constraints() -> Vec<ConstraintDef<SimpleScore>> {
    let factory = ConstraintFactory::new();
    vec![
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.row))
            .penalize(SimpleScore::of(1))
            .as_constraint("Row conflict"),
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.ascending_diagonal()))
            .penalize(SimpleScore::of(1))
            .as_constraint("Ascending diagonal conflict"),
        factory
            .for_each_unique_pair::<Queen>(equal(|q: &Queen| q.descending_diagonal()))
            .penalize(SimpleScore::of(1))
            .as_constraint("Descending diagonal conflict"),
    ]
}

#[test]
fn test_thread_bounds() {
    assert_send_sync::<ScoreDirectorFactory<SimpleScore>>();
    assert_send::<ScoreDirector<SimpleScore>>();
}

#[test]
fn test_directors_per_worker() {
    let factory = ScoreDirectorFactory::new(constraints(), &NetworkConfig::default()).unwrap();
    let boards: Vec<Vec<i64>> = vec![
        vec![0, 1, 2, 3],
        vec![1, 3, 0, 2],
        vec![0, 0, 0, 0],
        vec![2, 0, 3, 1],
        vec![3, 1, 2, 0],
    ];
    let scores: Vec<SimpleScore> = boards
        .par_iter()
        .map(|rows| {
            let mut director = factory.build_director();
            for queen in Queen::with_rows(rows) {
                director.insert_fact(queen);
            }
            director.calculate_score()
        })
        .collect();
    for (rows, score) in boards.iter().zip(scores) {
        assert_eq!(score, SimpleScore::of(-conflicts(&Queen::with_rows(rows))));
    }
}

#[test]
fn test_forks_evaluate_moves_in_parallel() {
    let factory = ScoreDirectorFactory::new(constraints(), &NetworkConfig::default()).unwrap();
    let mut director = factory.build_director();
    let handles: Vec<_> = Queen::with_rows(&[0, 0, 0, 0, 0])
        .into_iter()
        .map(|q| director.insert_fact(q))
        .collect();

    // Best row for the first queen, one fork per candidate row.
    let moved = handles[0];
    let forks: Vec<(i64, ScoreDirector<SimpleScore>)> =
        (0..5i64).map(|row| (row, director.fork())).collect();
    let results: Vec<(i64, SimpleScore)> = forks
        .into_par_iter()
        .map(|(row, mut fork)| {
            fork.update_fact(moved, "row", |q: &mut Queen| q.row = Some(row))
                .unwrap();
            (row, fork.calculate_score())
        })
        .collect();

    for (row, score) in &results {
        let mut rows = vec![0; 5];
        rows[0] = *row;
        assert_eq!(*score, SimpleScore::of(-conflicts(&Queen::with_rows(&rows))));
    }
    // The original is untouched by its forks.
    assert_eq!(director.calculate_score(), SimpleScore::of(-10));
    director.verify_score().unwrap();
}
