//! Node sharing, existence checks, maps and flattening through a director.

use streamforge_config::NetworkConfig;
use streamforge_core::{ConstraintRef, HardSoftScore, Score};
use streamforge_network::joiner::{equal, equal_bi, filtering, less_than_bi};
use streamforge_network::{
    ConstraintDef, ConstraintFactory, NodeKind, ScoreDirector, ScoreDirectorFactory,
};
use streamforge_test::{init_logging, Employee, Shift};

fn director(constraints: Vec<ConstraintDef<HardSoftScore>>) -> ScoreDirector<HardSoftScore> {
    init_logging();
    ScoreDirectorFactory::new(constraints, &NetworkConfig::default())
        .unwrap()
        .build_director()
}

fn match_count(director: &ScoreDirector<HardSoftScore>, name: &str) -> usize {
    director.constraint_match_totals()[&ConstraintRef::new("", name)].match_count
}

#[test]
fn test_shared_pipeline_keeps_constraints_apart() {
    let factory = ConstraintFactory::new();
    let assigned = factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some());
    let constraints = vec![
        assigned
            .clone()
            .filter(|s: &Shift| s.hours() > 8)
            .penalize(HardSoftScore::of_soft(1))
            .as_constraint("Long shift"),
        assigned
            .filter(|s: &Shift| s.day == 0)
            .penalize(HardSoftScore::of_soft(2))
            .as_constraint("Sunday shift"),
    ];
    let mut director = director(constraints);
    let blueprint = director.blueprint();
    assert_eq!(blueprint.node_count_of(NodeKind::Source), 1);
    // The shared filter plus one filter per constraint.
    assert_eq!(blueprint.node_count_of(NodeKind::Filter), 3);
    assert!(blueprint.shared_node_count() >= 2);

    let long = director.insert_fact(Shift::new(0, 2, 6, 18).assigned_to(1));
    let sunday = director.insert_fact(Shift::new(1, 0, 8, 12).assigned_to(1));
    assert_eq!(match_count(&director, "Long shift"), 1);
    assert_eq!(match_count(&director, "Sunday shift"), 1);
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-3));

    director.retract_fact(long).unwrap();
    assert_eq!(match_count(&director, "Long shift"), 0);
    assert_eq!(match_count(&director, "Sunday shift"), 1);
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));

    director
        .update_fact(sunday, "employee", |s: &mut Shift| s.employee = None)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
}

#[test]
fn test_if_not_exists_follows_the_counter() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Employee>()
        .if_not_exists(
            factory.for_each::<Shift>(),
            equal_bi(|e: &Employee| Some(e.id), |s: &Shift| s.employee),
        )
        .penalize(HardSoftScore::of_soft(1))
        .as_constraint("Idle employee")];
    let mut director = director(constraints);
    director.insert_fact(Employee::new(1, "Ann"));
    director.insert_fact(Employee::new(2, "Bob"));
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));

    let first = director.insert_fact(Shift::new(0, 0, 8, 16).assigned_to(1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-1));
    let second = director.insert_fact(Shift::new(1, 1, 8, 16).assigned_to(1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-1));

    director
        .update_fact(first, "employee", |s: &mut Shift| s.employee = Some(2))
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());

    director.retract_fact(second).unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-1));
    director
        .update_fact(first, "employee", |s: &mut Shift| s.employee = None)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));
    director.verify_score().unwrap();
}

#[test]
fn test_if_exists_over_a_pair() {
    // Overlapping shifts on a day some employee cannot work.
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each_unique_pair::<Shift>(equal(|s: &Shift| s.day))
        .filter(|a: &Shift, b: &Shift| a.overlap(b) > 0)
        .if_exists(
            factory.for_each::<Employee>(),
            filtering(|a: &Shift, _: &Shift, e: &Employee| e.unavailable_days.contains(&a.day)),
        )
        .penalize(HardSoftScore::of_hard(1))
        .as_constraint("Overlap on a short-staffed day")];
    let mut director = director(constraints);
    director.insert_fact(Shift::new(0, 1, 8, 16));
    director.insert_fact(Shift::new(1, 1, 12, 20));
    director.insert_fact(Shift::new(2, 2, 8, 16));
    assert_eq!(director.calculate_score(), HardSoftScore::zero());

    let away = director.insert_fact(Employee::new(4, "Max").unavailable_on(2));
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    let spare = director.insert_fact(Employee::new(5, "Eve").unavailable_on(1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-1));
    let other = director.insert_fact(Employee::new(6, "Joe").unavailable_on(1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-1));

    director.retract_fact(spare).unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-1));
    director.retract_fact(other).unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    director.retract_fact(away).unwrap();
    director.verify_score().unwrap();
}

#[test]
fn test_flattened_unavailability() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Employee>()
        .map2(|e: &Employee| e.id, |e: &Employee| e.unavailable_days.clone())
        .flatten_last(|days: &Vec<u32>| days.clone())
        .join(
            factory.for_each::<Shift>(),
            equal_bi(
                |id: &u32, day: &u32| (Some(*id), *day),
                |s: &Shift| (s.employee, s.day),
            ),
        )
        .penalize(HardSoftScore::of_hard(1))
        .as_constraint("Unavailable employee")];
    let mut director = director(constraints);
    let ann = director.insert_fact(Employee::new(1, "Ann").unavailable_on(2).unavailable_on(4));
    director.insert_fact(Shift::new(0, 2, 8, 16).assigned_to(1));
    let later = director.insert_fact(Shift::new(1, 3, 8, 16).assigned_to(1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-1));

    director
        .update_fact(later, "day", |s: &mut Shift| s.day = 4)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-2));

    director
        .update_fact(ann, "unavailable_days", |e: &mut Employee| {
            e.unavailable_days = vec![4]
        })
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-1));

    director
        .update_fact(ann, "unavailable_days", |e: &mut Employee| e.unavailable_days.clear())
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    director.verify_score().unwrap();

    director.retract_fact(ann).unwrap();
    assert_eq!(director.network_stats().indexed_tuples, 2);
}

#[test]
fn test_map_then_compare() {
    // Shifts of the same employee where the first ends after the second starts.
    let factory = ConstraintFactory::new();
    let spans = factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some())
        .map2(|s: &Shift| s.employee, |s: &Shift| (s.day as i64 * 24 + s.start, s.day as i64 * 24 + s.end));
    let constraints = vec![spans
        .clone()
        .join(
            spans,
            vec![
                equal_bi(|e: &Option<u32>, _: &(i64, i64)| *e, |e: &Option<u32>, _: &(i64, i64)| *e),
                less_than_bi(|_: &Option<u32>, s: &(i64, i64)| s.0, |_: &Option<u32>, s: &(i64, i64)| s.1),
                less_than_bi(|_: &Option<u32>, s: &(i64, i64)| s.0, |_: &Option<u32>, s: &(i64, i64)| s.0),
            ],
        )
        .filter(|_: &Option<u32>, a: &(i64, i64), _: &Option<u32>, b: &(i64, i64)| b.0 < a.1)
        .penalize(HardSoftScore::of_hard(1))
        .as_constraint("Double booked")];
    let mut director = director(constraints);
    director.insert_fact(Shift::new(0, 0, 8, 16).assigned_to(1));
    let second = director.insert_fact(Shift::new(1, 0, 12, 20).assigned_to(1));
    director.insert_fact(Shift::new(2, 0, 12, 20).assigned_to(2));
    assert_eq!(director.calculate_score(), HardSoftScore::of_hard(-1));

    director
        .update_fact(second, "start", |s: &mut Shift| s.start = 16)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    director.verify_score().unwrap();
}

#[test]
fn test_concat_counts_both_sides() {
    let factory = ConstraintFactory::new();
    let shifts = factory.for_each::<Shift>();
    let constraints = vec![shifts
        .clone()
        .filter(|s: &Shift| s.employee.is_none())
        .concat(shifts.filter(|s: &Shift| s.day == 0))
        .penalize(HardSoftScore::of_soft(1))
        .as_constraint("Unassigned or Sunday")];
    let mut director = director(constraints);
    assert_eq!(director.blueprint().node_count_of(NodeKind::Concat), 1);

    // Unassigned and on a Sunday: once from each side.
    let open_sunday = director.insert_fact(Shift::new(0, 0, 8, 16));
    let monday = director.insert_fact(Shift::new(1, 1, 8, 16).assigned_to(1));
    assert_eq!(match_count(&director, "Unassigned or Sunday"), 2);
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));

    director
        .update_fact(open_sunday, "employee", |s: &mut Shift| s.employee = Some(2))
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-1));
    director
        .update_fact(monday, "day", |s: &mut Shift| s.day = 0)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));

    director.retract_fact(open_sunday).unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-1));
    director.verify_score().unwrap();
    director.retract_fact(monday).unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    assert!(director.network_stats().is_empty());
}

#[test]
fn test_concat_with_itself() {
    let factory = ConstraintFactory::new();
    let assigned = factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some());
    let constraints = vec![assigned
        .clone()
        .concat(assigned)
        .penalize(HardSoftScore::of_soft(1))
        .as_constraint("Counted twice")];
    let mut director = director(constraints);

    let shift = director.insert_fact(Shift::new(0, 2, 8, 16).assigned_to(1));
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));
    director
        .update_fact(shift, "employee", |s: &mut Shift| s.employee = None)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    director
        .update_fact(shift, "employee", |s: &mut Shift| s.employee = Some(3))
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));

    director.retract_fact(shift).unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::zero());
    assert!(director.network_stats().is_empty());
}

#[test]
fn test_distinct_days_and_employee_days() {
    let factory = ConstraintFactory::new();
    let assigned = factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some());
    let constraints = vec![
        assigned
            .clone()
            .map(|s: &Shift| s.day)
            .distinct::<u32>()
            .penalize(HardSoftScore::of_soft(1))
            .as_constraint("Working day"),
        assigned
            .map2(|s: &Shift| s.employee, |s: &Shift| s.day)
            .distinct2::<Option<u32>, u32>()
            .penalize(HardSoftScore::of_soft(1))
            .as_constraint("Employee day"),
    ];
    let mut director = director(constraints);
    assert_eq!(director.blueprint().node_count_of(NodeKind::Group), 2);

    let a = director.insert_fact(Shift::new(0, 1, 8, 12).assigned_to(1));
    let b = director.insert_fact(Shift::new(1, 1, 12, 16).assigned_to(2));
    let c = director.insert_fact(Shift::new(2, 2, 8, 16).assigned_to(1));
    // Same employee, same day as `c`.
    let d = director.insert_fact(Shift::new(3, 2, 16, 20).assigned_to(1));
    assert_eq!(match_count(&director, "Working day"), 2);
    assert_eq!(match_count(&director, "Employee day"), 3);
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-5));

    director.retract_fact(a).unwrap();
    assert_eq!(match_count(&director, "Working day"), 2);
    assert_eq!(match_count(&director, "Employee day"), 2);

    director
        .update_fact(b, "day", |s: &mut Shift| s.day = 2)
        .unwrap();
    assert_eq!(match_count(&director, "Working day"), 1);
    assert_eq!(match_count(&director, "Employee day"), 2);

    director.retract_fact(c).unwrap();
    assert_eq!(match_count(&director, "Employee day"), 2);
    director.retract_fact(d).unwrap();
    assert_eq!(match_count(&director, "Employee day"), 1);
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));
    director.verify_score().unwrap();
}

#[test]
fn test_expand_keeps_the_fact() {
    let factory = ConstraintFactory::new();
    let constraints = vec![factory
        .for_each::<Shift>()
        .expand(|s: &Shift| s.hours())
        .filter(|_: &Shift, hours: &i64| *hours > 8)
        .penalize(HardSoftScore::of_soft(1))
        .with_match_weight(|_: &Shift, hours: &i64| hours - 8)
        .as_constraint("Overtime")];
    let mut director = director(constraints);

    let long = director.insert_fact(Shift::new(0, 1, 6, 18));
    director.insert_fact(Shift::new(1, 1, 8, 16));
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-4));
    let totals = director.constraint_match_totals();
    let overtime = &totals[&ConstraintRef::new("", "Overtime")].matches[0];
    let entities = &overtime.justification.entities;
    assert_eq!(entities[0].as_entity::<Shift>().map(|s| s.id), Some(0));
    assert_eq!(entities[1].as_entity::<i64>(), Some(&12));

    director
        .update_fact(long, "end", |s: &mut Shift| s.end = 16)
        .unwrap();
    assert_eq!(director.calculate_score(), HardSoftScore::of_soft(-2));
    director.verify_score().unwrap();
}
