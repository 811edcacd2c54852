use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

string_enum!(Comparison {
    Equal => "equal",
    NotEqual => "not_equal",
    Less => "less",
    LessEqual => "less_equal",
    Greater => "greater",
    GreaterEqual => "greater_equal",
});

impl Comparison {
    pub fn compare<T: Ord>(self, lhs: T, rhs: T) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::Less => lhs < rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterEqual => lhs >= rhs,
        }
    }
}

/// Snapshot of the state a condition may read.
#[derive(Debug, Clone, Copy)]
pub struct ConditionState<'a> {
    pub passed_ballots: &'a BTreeSet<Id>,
    pub currencies: &'a BTreeMap<Id, i8>,
    pub active_procedures: &'a BTreeSet<Id>,
    /// Forced outcome of the live ballot, if a declared procedure set one.
    pub forced_result: Option<bool>,
}

/// Boolean predicate over simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    Never,
    And {
        conditions: Vec<Condition>,
    },
    Or {
        conditions: Vec<Condition>,
    },
    /// The live ballot's forced result equals `passed`. Only meaningful while
    /// a ballot is being resolved, never inside a link.
    Vote {
        passed: bool,
    },
    BallotPassed {
        ballot: Id,
        passed: bool,
    },
    PassedCount {
        cmp: Comparison,
        value: u8,
    },
    CurrencyValue {
        currency: Id,
        cmp: Comparison,
        value: i8,
    },
    ProcedureActive {
        procedure: Id,
        active: bool,
    },
}

impl Condition {
    /// # Panics
    /// Panics if a `CurrencyValue` condition names a currency missing from the snapshot.
    pub fn evaluate(&self, state: &ConditionState<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::And { conditions } => conditions.iter().all(|c| c.evaluate(state)),
            Condition::Or { conditions } => conditions.iter().any(|c| c.evaluate(state)),
            Condition::Vote { passed } => state.forced_result == Some(*passed),
            Condition::BallotPassed { ballot, passed } => {
                state.passed_ballots.contains(ballot) == *passed
            }
            Condition::PassedCount { cmp, value } => {
                cmp.compare(state.passed_ballots.len(), usize::from(*value))
            }
            Condition::CurrencyValue {
                currency,
                cmp,
                value,
            } => {
                let current = state.currencies.get(currency).unwrap_or_else(|| {
                    panic!("evaluate: currency {currency} not found")
                });
                cmp.compare(*current, *value)
            }
            Condition::ProcedureActive { procedure, active } => {
                state.active_procedures.contains(procedure) == *active
            }
        }
    }

    /// Outcome this condition forces when it is used to pick a ballot result.
    /// `Vote` is left to [`evaluate`](Self::evaluate), which reads the live
    /// tally's forced result.
    pub fn forced_vote(&self) -> Option<bool> {
        match self {
            Condition::Always => Some(true),
            Condition::Never => Some(false),
            _ => None,
        }
    }

    /// True if this condition or any nested child reads the live vote.
    pub fn reads_live_vote(&self) -> bool {
        match self {
            Condition::Vote { .. } => true,
            Condition::And { conditions } | Condition::Or { conditions } => {
                conditions.iter().any(Condition::reads_live_vote)
            }
            _ => false,
        }
    }

    /// Visit this condition and every nested child, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Condition)) {
        visit(self);
        if let Condition::And { conditions } | Condition::Or { conditions } = self {
            for c in conditions {
                c.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Fixture {
        passed: BTreeSet<Id>,
        currencies: BTreeMap<Id, i8>,
        active: BTreeSet<Id>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                passed: BTreeSet::from([Id(0), Id(2)]),
                currencies: BTreeMap::from([(Id(1), 4)]),
                active: BTreeSet::from([Id(5)]),
            }
        }

        fn state(&self, forced_result: Option<bool>) -> ConditionState<'_> {
            ConditionState {
                passed_ballots: &self.passed,
                currencies: &self.currencies,
                active_procedures: &self.active,
                forced_result,
            }
        }
    }

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        let f = Fixture::new();
        let s = f.state(None);
        assert!(Condition::And { conditions: vec![] }.evaluate(&s));
        assert!(!Condition::Or { conditions: vec![] }.evaluate(&s));
    }

    #[test]
    fn leaf_variants() {
        let f = Fixture::new();
        let s = f.state(None);
        assert!(Condition::Always.evaluate(&s));
        assert!(!Condition::Never.evaluate(&s));
        assert!(Condition::BallotPassed { ballot: Id(2), passed: true }.evaluate(&s));
        assert!(Condition::BallotPassed { ballot: Id(1), passed: false }.evaluate(&s));
        assert!(Condition::PassedCount { cmp: Comparison::Equal, value: 2 }.evaluate(&s));
        assert!(!Condition::PassedCount { cmp: Comparison::Greater, value: 2 }.evaluate(&s));
        assert!(
            Condition::CurrencyValue { currency: Id(1), cmp: Comparison::GreaterEqual, value: 4 }
                .evaluate(&s)
        );
        assert!(
            !Condition::CurrencyValue { currency: Id(1), cmp: Comparison::Less, value: 4 }
                .evaluate(&s)
        );
        assert!(Condition::ProcedureActive { procedure: Id(5), active: true }.evaluate(&s));
        assert!(Condition::ProcedureActive { procedure: Id(6), active: false }.evaluate(&s));
    }

    #[test]
    fn vote_reads_forced_result() {
        let f = Fixture::new();
        let pass = Condition::Vote { passed: true };
        assert!(!pass.evaluate(&f.state(None)));
        assert!(pass.evaluate(&f.state(Some(true))));
        assert!(!pass.evaluate(&f.state(Some(false))));
    }

    #[test]
    fn and_short_circuits_in_order() {
        // A missing currency would panic if evaluated.
        let f = Fixture::new();
        let missing = Condition::CurrencyValue {
            currency: Id(99),
            cmp: Comparison::Equal,
            value: 0,
        };
        let and = Condition::And {
            conditions: vec![Condition::Never, missing.clone()],
        };
        let or = Condition::Or {
            conditions: vec![Condition::Always, missing],
        };
        assert!(!and.evaluate(&f.state(None)));
        assert!(or.evaluate(&f.state(None)));
    }

    #[test]
    #[should_panic(expected = "currency 99 not found")]
    fn missing_currency_is_fatal() {
        let f = Fixture::new();
        Condition::CurrencyValue {
            currency: Id(99),
            cmp: Comparison::Equal,
            value: 0,
        }
        .evaluate(&f.state(None));
    }

    #[test]
    fn forced_vote_classification() {
        assert_eq!(Condition::Always.forced_vote(), Some(true));
        assert_eq!(Condition::Never.forced_vote(), Some(false));
        assert_eq!(Condition::Vote { passed: true }.forced_vote(), None);
        assert_eq!(Condition::And { conditions: vec![] }.forced_vote(), None);
    }

    #[test]
    fn detects_nested_vote() {
        let nested = Condition::Or {
            conditions: vec![
                Condition::Never,
                Condition::And {
                    conditions: vec![Condition::Vote { passed: false }],
                },
            ],
        };
        assert!(nested.reads_live_vote());
        assert!(!Condition::Always.reads_live_vote());

        let visited = Cell::new(0);
        nested.walk(&mut |_| visited.set(visited.get() + 1));
        assert_eq!(visited.get(), 4);
    }

    #[test]
    fn tagged_serde() {
        let c = Condition::CurrencyValue {
            currency: Id(3),
            cmp: Comparison::LessEqual,
            value: -2,
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "currency_value");
        assert_eq!(json["cmp"], "less_equal");
        assert_eq!(json["value"], -2);

        let parsed: Condition =
            serde_json::from_str(r#"{"type":"and","conditions":[{"type":"always"}]}"#).unwrap();
        assert_eq!(
            parsed,
            Condition::And {
                conditions: vec![Condition::Always]
            }
        );
    }
}
