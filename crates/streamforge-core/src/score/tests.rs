//! Tests for score types.

use super::*;

mod simple_score {
    use super::*;

    #[test]
    fn test_comparison_and_arithmetic() {
        let s1 = SimpleScore::of(-10);
        let s2 = SimpleScore::of(-5);

        assert!(s2 > s1);
        assert_eq!(s1 + s2, SimpleScore::of(-15));
        assert_eq!(s1 - s2, SimpleScore::of(-5));
        assert_eq!(-s1, SimpleScore::of(10));
    }

    #[test]
    fn test_scale() {
        assert_eq!(SimpleScore::of(3).scale(-4), SimpleScore::of(-12));
        assert_eq!(SimpleScore::of(10).multiply(0.25), SimpleScore::of(3));
        assert_eq!(SimpleScore::of(10).divide(4.0), SimpleScore::of(3));
    }

    #[test]
    fn test_checked_scale_overflow() {
        assert_eq!(SimpleScore::of(2).checked_scale(3), Some(SimpleScore::of(6)));
        assert_eq!(SimpleScore::of(2).checked_scale(i64::MAX), None);
    }

    #[test]
    #[should_panic(expected = "overflows i64")]
    fn test_scale_overflow_panics() {
        let _ = SimpleScore::of(-2).scale(i64::MAX);
    }

    #[test]
    fn test_parse() {
        assert_eq!(SimpleScore::parse("42").unwrap(), SimpleScore::of(42));
        assert_eq!(SimpleScore::parse(" -10 ").unwrap(), SimpleScore::of(-10));
        assert_eq!(SimpleScore::parse("0init").unwrap(), SimpleScore::of(0));
        assert!(SimpleScore::parse("ten").is_err());
    }
}

mod hard_soft_score {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_comparison() {
        let infeasible = HardSoftScore::of(-1, 0);
        let feasible = HardSoftScore::of(0, -1000);
        assert!(feasible > infeasible);
        assert!(feasible.is_better_than(&infeasible));
        assert!(infeasible.is_worse_than(&feasible));
        assert_eq!(
            HardSoftScore::of(0, -50).compare(&HardSoftScore::of(0, -100)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_arithmetic() {
        let s1 = HardSoftScore::of(-1, -100);
        let s2 = HardSoftScore::of(-1, -50);

        assert_eq!(s1 + s2, HardSoftScore::of(-2, -150));
        assert_eq!(s1 - s2, HardSoftScore::of(0, -50));
        assert_eq!(-s1, HardSoftScore::of(1, 100));
        assert_eq!(HardSoftScore::ONE_HARD.scale(-3), HardSoftScore::of(-3, 0));
        assert!(HardSoftScore::ZERO.is_zero());
    }

    #[test]
    fn test_parse_and_display() {
        let score = HardSoftScore::parse("-1hard/-30soft").unwrap();
        assert_eq!(score, HardSoftScore::of(-1, -30));
        assert_eq!(score.to_string(), "-1hard/-30soft");
        assert_eq!(score.to_string_repr(), "-1hard/-30soft");
        assert!(HardSoftScore::parse("-1hard").is_err());
        assert!(HardSoftScore::parse("-1soft/-1hard").is_err());
    }

    #[test]
    fn test_levels() {
        let score = HardSoftScore::of(-2, 7);
        assert_eq!(score.to_level_numbers(), vec![-2, 7]);
        assert_eq!(HardSoftScore::from_level_numbers(&[-2, 7]), score);
        assert_eq!(score.level_label(0), ScoreLevel::Hard);
        assert_eq!(score.level_label(1), ScoreLevel::Soft);
    }
}

mod hard_medium_soft_score {
    use super::*;

    #[test]
    fn test_comparison() {
        let s1 = HardMediumSoftScore::of(0, -10, -100);
        let s2 = HardMediumSoftScore::of(0, -5, -200);
        assert!(s2 > s1);
        assert!(HardMediumSoftScore::of(-1, 0, 0) < s1);
    }

    #[test]
    fn test_parse() {
        let score = HardMediumSoftScore::parse("0hard/-2medium/-3soft").unwrap();
        assert_eq!(score, HardMediumSoftScore::of(0, -2, -3));
        assert_eq!(score.to_string(), "0hard/-2medium/-3soft");
    }

    #[test]
    fn test_scale() {
        assert_eq!(
            HardMediumSoftScore::ONE_MEDIUM.scale(5),
            HardMediumSoftScore::of(0, 5, 0)
        );
        assert_eq!(HardMediumSoftScore::ZERO.level_label(1), ScoreLevel::Medium);
    }
}

mod bendable_score {
    use super::*;

    #[test]
    fn test_comparison() {
        let s1 = BendableScore::of(vec![-1, 0], vec![0]);
        let s2 = BendableScore::of(vec![0, -100], vec![-1000]);
        assert!(s2 > s1);

        let s3 = BendableScore::of(vec![0, -10], vec![0]);
        let s4 = BendableScore::of(vec![0, -5], vec![-100]);
        assert!(s4 > s3);
    }

    #[test]
    fn test_zero_is_shapeless() {
        let score = BendableScore::of(vec![-1], vec![-10, -20]);
        let zero = BendableScore::zero();

        assert_eq!(zero.clone() + score.clone(), score);
        assert_eq!(score.clone() - score.clone(), BendableScore::zero_with_levels(1, 2));
        assert_eq!(BendableScore::zero_with_levels(1, 2), zero);
        assert!(zero > score);
    }

    #[test]
    fn test_hash_matches_eq() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let hash = |score: &BendableScore| {
            let mut hasher = DefaultHasher::new();
            score.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(
            hash(&BendableScore::zero()),
            hash(&BendableScore::zero_with_levels(2, 3))
        );
    }

    #[test]
    fn test_scale_and_labels() {
        let score = BendableScore::of(vec![1], vec![2, 3]).scale(-2);
        assert_eq!(score.hard_scores(), &[-2]);
        assert_eq!(score.soft_scores(), &[-4, -6]);
        assert_eq!(score.level_label(0), ScoreLevel::Hard);
        assert_eq!(score.level_label(2), ScoreLevel::Soft);
    }

    #[test]
    fn test_checked_scale_overflow_in_any_level() {
        let score = BendableScore::of(vec![0], vec![1, i64::MAX]);
        assert_eq!(score.checked_scale(2), None);
        assert_eq!(
            score.checked_scale(1),
            Some(BendableScore::of(vec![0], vec![1, i64::MAX]))
        );
    }

    #[test]
    #[should_panic(expected = "Incompatible BendableScore shapes")]
    fn test_incompatible_shapes() {
        let _ = BendableScore::of(vec![1], vec![1]) + BendableScore::of(vec![1, 2], vec![1]);
    }

    #[test]
    fn test_parse_and_display() {
        let score = BendableScore::parse("[0/-1]hard/[-10/-20/-30]soft").unwrap();
        assert_eq!(score.hard_scores(), &[0, -1]);
        assert_eq!(score.soft_scores(), &[-10, -20, -30]);
        assert_eq!(score.to_string(), "[0/-1]hard/[-10/-20/-30]soft");
        assert!(BendableScore::parse("0hard/0soft").is_err());
    }
}
