use std::collections::{BTreeMap, BTreeSet};

use super::tally::VoteTally;
use crate::config::SimulationConfig;
use crate::id::Id;
use crate::model::{ConditionState, ElectionSnapshot, Membership, Person, ProcedureKind};

/// Mutable simulation state. Owned by the context and only mutated through
/// its phase methods.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    pub people: BTreeMap<Id, Person>,
    /// Each person's roles; always contains `Id::MEMBER`.
    pub roles: BTreeMap<Id, BTreeSet<Id>>,
    pub factions: BTreeMap<Id, Membership>,
    pub active_parties: BTreeSet<Id>,
    pub active_regions: BTreeSet<Id>,
    pub active_procedures: BTreeSet<Id>,
    /// Append-only.
    pub passed_ballots: BTreeSet<Id>,
    pub currencies: BTreeMap<Id, i8>,
    pub current_ballot: Option<Id>,
}

impl SimulationState {
    /// Initial activation flags and currency values from the configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let active = |defs: &[crate::model::FactionDef]| -> BTreeSet<Id> {
            defs.iter().filter(|d| d.active).map(|d| d.id).collect()
        };
        Self {
            active_parties: active(&config.parties),
            active_regions: active(&config.regions),
            active_procedures: config
                .procedures
                .iter()
                .filter(|p| matches!(p.kind, ProcedureKind::Targeted { active: true, .. }))
                .map(|p| p.id)
                .collect(),
            currencies: config.currencies.iter().map(|c| (c.id, c.initial)).collect(),
            ..Self::default()
        }
    }

    pub fn condition_state(&self, forced_result: Option<bool>) -> ConditionState<'_> {
        ConditionState {
            passed_ballots: &self.passed_ballots,
            currencies: &self.currencies,
            active_procedures: &self.active_procedures,
            forced_result,
        }
    }

    pub fn election_snapshot(&self) -> ElectionSnapshot<'_> {
        ElectionSnapshot {
            people: &self.people,
            roles: &self.roles,
            factions: &self.factions,
            active_parties: &self.active_parties,
            active_regions: &self.active_regions,
        }
    }

    pub fn membership(&self, person: Id) -> Membership {
        self.factions.get(&person).copied().unwrap_or_default()
    }
}

/// Per-ballot scratch state, reset when a ballot starts.
#[derive(Debug, Clone, Default)]
pub struct BallotContext {
    pub ballot: Id,
    pub tally: VoteTally,
    /// Procedures declared successfully this ballot, in order.
    pub declared: Vec<Id>,
}

impl BallotContext {
    pub fn new(ballot: Id) -> Self {
        Self {
            ballot,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurrencyDef, CurrencyOwner, FactionDef, Procedure};

    #[test]
    fn initial_state_reflects_config() {
        let config = SimulationConfig {
            parties: vec![
                FactionDef {
                    id: Id(0),
                    name: "Reds".to_string(),
                    active: true,
                },
                FactionDef {
                    id: Id(1),
                    name: "Blues".to_string(),
                    active: false,
                },
            ],
            currencies: vec![CurrencyDef {
                id: Id(0),
                name: "Treasury".to_string(),
                owner: CurrencyOwner::State,
                initial: -3,
            }],
            procedures: vec![
                Procedure {
                    id: Id(0),
                    name: "Whip".to_string(),
                    kind: ProcedureKind::Targeted {
                        ballots: vec![],
                        active: true,
                    },
                    effects: vec![],
                },
                Procedure {
                    id: Id(1),
                    name: "Recess".to_string(),
                    kind: ProcedureKind::Targeted {
                        ballots: vec![],
                        active: false,
                    },
                    effects: vec![],
                },
            ],
            ..SimulationConfig::default()
        };
        let state = SimulationState::from_config(&config);
        assert_eq!(state.active_parties, BTreeSet::from([Id(0)]));
        assert!(state.active_regions.is_empty());
        assert_eq!(state.active_procedures, BTreeSet::from([Id(0)]));
        assert_eq!(state.currencies[&Id(0)], -3);
        assert_eq!(state.membership(Id(9)), Membership::default());
    }
}
