//! Group-by through the network: bucket contents, undo-based updates and
//! independence from insertion order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use streamforge_config::NetworkConfig;
use streamforge_core::{HardSoftScore, Score, SimpleScore};
use streamforge_network::collector::{compose2, conditionally, count, max, sum, Collector};
use streamforge_network::fact::{Fact, FactType};
use streamforge_network::joiner::equal_bi;
use streamforge_network::{
    ConstraintFactory, FactHandle, Grouping, ScoreDirector, ScoreDirectorFactory,
};
use streamforge_test::{init_logging, Employee, RowEntity, Shift};

/// Counts like `count()`, and counts how often a result was finished.
struct CountingCount {
    finished: Arc<AtomicUsize>,
}

impl Collector for CountingCount {
    type State = usize;
    type Undo = ();
    type Result = usize;

    fn check_columns(&self, _columns: &[FactType]) -> Result<(), String> {
        Ok(())
    }

    fn init(&self) -> usize {
        0
    }

    fn accumulate(&self, state: &mut usize, _facts: &[Fact]) {
        *state += 1;
    }

    fn undo(&self, state: &mut usize, _undo: ()) {
        *state -= 1;
    }

    fn finish(&self, state: &usize) -> usize {
        self.finished.fetch_add(1, Ordering::SeqCst);
        *state
    }
}

// (row, count) of every live bucket, read back from the matches.
fn buckets(director: &ScoreDirector<SimpleScore>) -> BTreeMap<i64, usize> {
    director
        .constraint_match_totals()
        .values()
        .flat_map(|total| &total.matches)
        .map(|m| {
            let entities = &m.justification.entities;
            (
                *entities[0].as_entity::<i64>().unwrap(),
                *entities[1].as_entity::<usize>().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_retract_recomputes_only_the_touched_bucket() {
    init_logging();
    let finished = Arc::new(AtomicUsize::new(0));
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<RowEntity>()
        .group_by(
            |e: &RowEntity| e.row,
            CountingCount {
                finished: Arc::clone(&finished),
            },
        )
        .penalize(SimpleScore::of(1))
        .with_match_weight(|_row: &i64, n: &usize| (*n * *n) as i64)
        .as_constraint("Crowded row")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();

    director.insert_fact(RowEntity::new(1, 0));
    let e2 = director.insert_fact(RowEntity::new(2, 0));
    director.insert_fact(RowEntity::new(3, 1));
    assert_eq!(buckets(&director), BTreeMap::from([(0, 2), (1, 1)]));
    assert_eq!(director.calculate_score(), SimpleScore::of(-5));

    finished.store(0, Ordering::SeqCst);
    director.retract_fact(e2).unwrap();
    assert_eq!(buckets(&director), BTreeMap::from([(0, 1), (1, 1)]));
    assert_eq!(director.calculate_score(), SimpleScore::of(-2));
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[test]
fn test_moving_between_buckets() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<RowEntity>()
        .group_by(|e: &RowEntity| e.row, count())
        .penalize(SimpleScore::of(1))
        .with_match_weight(|_row: &i64, n: &usize| *n as i64 - 1)
        .as_constraint("Shared row")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();

    let handles: Vec<FactHandle> = (0..4)
        .map(|id| director.insert_fact(RowEntity::new(id, 0)))
        .collect();
    assert_eq!(buckets(&director), BTreeMap::from([(0, 4)]));
    assert_eq!(director.calculate_score(), SimpleScore::of(-3));

    director
        .update_fact(handles[0], "row", |e: &mut RowEntity| e.row = 2)
        .unwrap();
    director
        .update_fact(handles[1], "row", |e: &mut RowEntity| e.row = 2)
        .unwrap();
    assert_eq!(buckets(&director), BTreeMap::from([(0, 2), (2, 2)]));
    assert_eq!(director.calculate_score(), SimpleScore::of(-2));

    // Same bucket: the contribution is undone and re-added.
    director
        .update_fact(handles[0], "row", |e: &mut RowEntity| e.row = 2)
        .unwrap();
    assert_eq!(buckets(&director), BTreeMap::from([(0, 2), (2, 2)]));

    director
        .update_fact(handles[2], "row", |e: &mut RowEntity| e.row = 2)
        .unwrap();
    director
        .update_fact(handles[3], "row", |e: &mut RowEntity| e.row = 2)
        .unwrap();
    assert_eq!(buckets(&director), BTreeMap::from([(2, 4)]));
    assert_eq!(director.network_stats().groups, 1);
    director.verify_score().unwrap();
}

#[test]
fn test_two_keys_and_two_collectors() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some())
        .group(
            Grouping::by(|s: &Shift| s.employee)
                .and_by(|s: &Shift| s.day)
                .collect(sum(|s: &Shift| s.hours()))
                .collect(max(|s: &Shift| s.end)),
        )
        .filter(|_: &Option<u32>, _: &u32, hours: &i64, _: &Option<i64>| *hours > 8)
        .penalize(HardSoftScore::of_soft(1))
        .with_match_weight(|_: &Option<u32>, _: &u32, hours: &i64, _: &Option<i64>| hours - 8)
        .as_constraint("Overtime")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();

    director.insert_fact(Shift::new(0, 1, 6, 12).assigned_to(7));
    let late = director.insert_fact(Shift::new(1, 1, 14, 20).assigned_to(7));
    director.insert_fact(Shift::new(2, 2, 6, 12).assigned_to(7));
    director.insert_fact(Shift::new(3, 1, 6, 18));
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-4));

    let totals = director.constraint_match_totals();
    let overtime = &totals.values().next().unwrap().matches[0];
    let entities = &overtime.justification.entities;
    assert_eq!(entities[0].as_entity::<Option<u32>>(), Some(&Some(7)));
    assert_eq!(entities[1].as_entity::<u32>(), Some(&1));
    assert_eq!(entities[3].as_entity::<Option<i64>>(), Some(&Some(20)));

    director
        .update_fact(late, "day", |s: &mut Shift| s.day = 3)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    director.verify_score().unwrap();
}

fn employee_hours(order: &[Shift]) -> (HardSoftScore, BTreeMap<u32, i64>) {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some())
        .join(
            factory.for_each::<Employee>(),
            equal_bi(|s: &Shift| s.employee, |e: &Employee| Some(e.id)),
        )
        .group_by(|_: &Shift, e: &Employee| e.id, sum(|s: &Shift, _: &Employee| s.hours()))
        .penalize(HardSoftScore::of_soft(1))
        .with_match_weight(|_: &u32, hours: &i64| hours * hours)
        .as_constraint("Fair hours")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();
    for id in 0..3 {
        director.insert_fact(Employee::new(id, "worker"));
    }
    for shift in order {
        director.insert_fact(shift.clone());
    }
    let hours = director
        .constraint_match_totals()
        .values()
        .flat_map(|total| &total.matches)
        .map(|m| {
            let entities = &m.justification.entities;
            (
                *entities[0].as_entity::<u32>().unwrap(),
                *entities[1].as_entity::<i64>().unwrap(),
            )
        })
        .collect();
    (director.calculate_score(), hours)
}

#[test]
fn test_insertion_order_does_not_matter() {
    let shifts: Vec<Shift> = (0..24)
        .map(|id| {
            let shift = Shift::new(id, id % 5, 8, 12 + (id % 3) as i64);
            if id % 4 == 0 {
                shift
            } else {
                shift.assigned_to(id % 3)
            }
        })
        .collect();
    let (expected_score, expected_hours) = employee_hours(&shifts);
    assert_eq!(expected_hours.len(), 3);

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..8 {
        let mut shuffled = shifts.clone();
        shuffled.shuffle(&mut rng);
        let (score, hours) = employee_hours(&shuffled);
        assert_eq!(score, expected_score);
        assert_eq!(hours, expected_hours);
    }
}

#[test]
fn test_group_all_disappears_when_empty() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<RowEntity>()
        .group_by_all(count())
        .reward(SimpleScore::of(1))
        .as_constraint("Population")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();
    assert_eq!(director.calculate_score(), SimpleScore::zero());

    let a = director.insert_fact(RowEntity::new(0, 0));
    let b = director.insert_fact(RowEntity::new(1, 3));
    assert_eq!(director.calculate_score(), SimpleScore::of(1));
    let totals = director.constraint_match_totals();
    let only = &totals.values().next().unwrap().matches[0];
    assert_eq!(only.justification.entities[0].as_entity::<usize>(), Some(&2));

    director.retract_fact(a).unwrap();
    director.retract_fact(b).unwrap();
    assert_eq!(director.calculate_score(), SimpleScore::zero());
    assert!(director.network_stats().is_empty());
}

#[test]
fn test_group_output_reaches_a_join() {
    // Employees working more days than allowed, joined back to the employee.
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some())
        .group_by(|s: &Shift| s.employee, count())
        .filter(|_: &Option<u32>, n: &usize| *n > 2)
        .join(
            factory.for_each::<Employee>(),
            equal_bi(|e: &Option<u32>, _: &usize| *e, |e: &Employee| Some(e.id)),
        )
        .penalize(SimpleScore::of(1))
        .as_constraint("Too many shifts")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();
    let ann = director.insert_fact(Employee::new(1, "Ann"));
    let shifts: Vec<FactHandle> = (0..3)
        .map(|day| director.insert_fact(Shift::new(day, day, 8, 16).assigned_to(1)))
        .collect();
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));

    director.retract_fact(ann).unwrap();
    assert_eq!(director.calculate_score(), SimpleScore::zero());
    director.insert_fact(Employee::new(1, "Ann"));
    assert_eq!(director.calculate_score(), SimpleScore::of(-1));

    director
        .update_fact(shifts[0], "employee", |s: &mut Shift| s.employee = None)
        .unwrap();
    assert_eq!(director.calculate_score(), SimpleScore::zero());
    director.verify_score().unwrap();
}

#[test]
fn test_composed_collectors_share_one_group() {
    // Hours per day minus four per staffed shift.
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .group_by(
            |s: &Shift| s.day,
            compose2(
                sum(|s: &Shift| s.hours()),
                conditionally(|s: &Shift| s.employee.is_some(), count()),
                |hours: &i64, staffed: &usize| hours - 4 * *staffed as i64,
            ),
        )
        .penalize(HardSoftScore::of_soft(1))
        .with_match_weight(|_: &u32, uncovered: &i64| *uncovered)
        .as_constraint("Uncovered hours")];
    let mut director = ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director();

    let open = director.insert_fact(Shift::new(0, 1, 8, 16));
    director.insert_fact(Shift::new(1, 1, 8, 12).assigned_to(3));
    director.insert_fact(Shift::new(2, 2, 8, 14).assigned_to(3));
    // Day 1: 12 hours, 1 staffed. Day 2: 6 hours, 1 staffed.
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-10));
    assert_eq!(director.network_stats().groups, 2);

    director
        .update_fact(open, "employee", |s: &mut Shift| s.employee = Some(4))
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-6));
    director
        .update_fact(open, "day", |s: &mut Shift| s.day = 2)
        .unwrap();
    // Day 1: 4 hours, 1 staffed. Day 2: 14 hours, 2 staffed.
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-6));
    director.verify_score().unwrap();
}
