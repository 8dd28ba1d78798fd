//! A joiner chain compiled against the column types of both inputs.

use smallvec::SmallVec;
use streamforge_core::{Result, StreamForgeError};

use super::{Comparison, IndexKey, JoinerChain, JoinerKind};
use crate::fact::{Fact, FactType};
use crate::function::Function;
use crate::key::{Key, OrdKey};
use crate::tuple::MAX_ARITY;

#[derive(Debug, Clone)]
struct RangeJoiner {
    op: Comparison,
    left: Function<OrdKey>,
    right: Function<OrdKey>,
}

#[derive(Debug, Clone)]
enum JoinTest {
    Compare(RangeJoiner),
    Filter(Function<bool>),
}

#[derive(Debug, Clone)]
pub(crate) struct JoinPlan {
    equal_left: Vec<Function<Key>>,
    equal_right: Vec<Function<Key>>,
    range: Option<RangeJoiner>,
    tests: Vec<JoinTest>,
}

impl JoinPlan {
    /// Checks every joiner against the column types of both sides and splits
    /// the chain into index keys and residual tests.
    pub fn compile(
        chain: &JoinerChain,
        left_types: &[FactType],
        right_types: &[FactType],
    ) -> Result<Self> {
        let mut plan = JoinPlan {
            equal_left: Vec::new(),
            equal_right: Vec::new(),
            range: None,
            tests: Vec::new(),
        };
        let both: SmallVec<[FactType; 8]> =
            left_types.iter().chain(right_types).copied().collect();

        for (position, joiner) in chain.joiners().iter().enumerate() {
            match &joiner.kind {
                JoinerKind::Equal { left, right } => {
                    check_args(position, "left", left.arg_types(), left_types)?;
                    check_args(position, "right", right.arg_types(), right_types)?;
                    plan.equal_left.push(left.clone());
                    plan.equal_right.push(right.clone());
                }
                JoinerKind::Compare { op, left, right } => {
                    check_args(position, "left", left.arg_types(), left_types)?;
                    check_args(position, "right", right.arg_types(), right_types)?;
                    let range = RangeJoiner {
                        op: *op,
                        left: left.clone(),
                        right: right.clone(),
                    };
                    if plan.range.is_none() {
                        plan.range = Some(range);
                    } else {
                        plan.tests.push(JoinTest::Compare(range));
                    }
                }
                JoinerKind::Filtering { predicate } => {
                    if both.len() > MAX_ARITY {
                        return Err(StreamForgeError::Config(format!(
                            "joiner #{}: a filtering joiner sees {} columns, at most {} are supported",
                            position,
                            both.len(),
                            MAX_ARITY
                        )));
                    }
                    check_args(position, "filtering", predicate.arg_types(), &both)?;
                    plan.tests.push(JoinTest::Filter(predicate.clone()));
                }
            }
        }
        Ok(plan)
    }

    pub fn left_key(&self, facts: &[Fact]) -> IndexKey {
        IndexKey {
            equal: self.equal_left.iter().map(|f| f.call(facts)).collect(),
            range: self.range.as_ref().map(|r| r.left.call(facts)),
        }
    }

    pub fn right_key(&self, facts: &[Fact]) -> IndexKey {
        IndexKey {
            equal: self.equal_right.iter().map(|f| f.call(facts)).collect(),
            range: self.range.as_ref().map(|r| r.right.call(facts)),
        }
    }

    /// The range comparison of the index, if any.
    pub fn range_op(&self) -> Option<Comparison> {
        self.range.as_ref().map(|r| r.op)
    }

    pub fn has_tests(&self) -> bool {
        !self.tests.is_empty()
    }

    /// Evaluates the residual joiners in order, stopping at the first
    /// mismatch.
    pub fn test(&self, left: &[Fact], right: &[Fact]) -> bool {
        self.tests.iter().all(|test| match test {
            JoinTest::Compare(r) => r.op.test(&r.left.call(left), &r.right.call(right)),
            JoinTest::Filter(predicate) => {
                let both: SmallVec<[Fact; MAX_ARITY]> =
                    left.iter().chain(right).cloned().collect();
                predicate.call(&both)
            }
        })
    }
}

pub(crate) fn check_args(
    position: usize,
    side: &str,
    actual: &[FactType],
    expected: &[FactType],
) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(StreamForgeError::Config(format!(
            "joiner #{} ({}): function takes {:?} but the stream has columns {:?}",
            position, side, actual, expected
        )))
    }
}
