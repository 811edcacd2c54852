//! Rendering of conditions, effects and procedures into display strings.
//!
//! Purely a presentation concern; nothing here feeds back into the rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::condition::{Comparison, Condition};
use super::effect::{BallotEffect, BallotEffectKind, ProcedureEffect, ProcedureEffectKind};
use super::procedure::{Confirmation, Procedure};
use crate::error::ConfigError;
use crate::id::Id;

/// Built-in English templates. Every key here is required in a loaded table.
const ENGLISH: &[(&str, &str)] = &[
    ("condition.always", "always"),
    ("condition.never", "never"),
    ("condition.and", "all of ({children})"),
    ("condition.or", "any of ({children})"),
    ("condition.vote.pass", "this ballot passes"),
    ("condition.vote.fail", "this ballot fails"),
    ("condition.ballot.passed", "{ballot} passed"),
    ("condition.ballot.failed", "{ballot} failed"),
    ("condition.passed_count", "passed ballots {cmp} {value}"),
    ("condition.currency_value", "{currency} {cmp} {value}"),
    ("condition.procedure.active", "{procedure} is active"),
    ("condition.procedure.inactive", "{procedure} is inactive"),
    ("comparison.equal", "is"),
    ("comparison.not_equal", "is not"),
    ("comparison.less", "is below"),
    ("comparison.less_equal", "is at most"),
    ("comparison.greater", "is above"),
    ("comparison.greater_equal", "is at least"),
    ("effect.elect_party", "party election ({targets})"),
    ("effect.elect_region", "region election ({targets})"),
    ("effect.elect_nominated", "nominate {targets}"),
    ("effect.elect_appointed", "appoint {targets}"),
    ("effect.permission_can_vote", "{targets}: may vote = {value}"),
    ("effect.permission_votes", "{targets}: {value} votes"),
    ("effect.permission_can_speak", "{targets}: may speak = {value}"),
    ("effect.vote_pass_bonus", "+{value} in favour"),
    ("effect.vote_fail_bonus", "+{value} against"),
    ("effect.supermajority", "two-thirds majority required"),
    ("effect.currency_add", "{targets} +{value}"),
    ("effect.currency_subtract", "{targets} -{value}"),
    ("effect.procedure_activate", "enact {targets}"),
    ("effect.procedure_remove", "repeal {targets}"),
    ("effect.ballot_limit", "only {targets} may vote"),
    ("effect.ballot_pass", "the ballot passes"),
    ("effect.ballot_fail", "the ballot fails"),
    ("effect.found_party", "found {targets}"),
    ("effect.dissolve_party", "dissolve {targets}"),
    ("effect.activate_procedure", "enact {targets}"),
    ("effect.remove_procedure", "repeal {targets}"),
    ("effect.replace_procedure", "replace {targets}"),
    ("effect.modify_currency", "{targets} {value}"),
    ("confirmation.always", "free"),
    ("confirmation.division_chamber", "division of the chamber"),
    ("confirmation.currency_value", "costs {value}"),
    ("confirmation.dice_value", "roll {value} or more"),
    ("confirmation.dice_currency", "costs one die roll"),
    ("confirmation.dice_adversarial", "contested roll"),
    ("procedure.governmental", "{name}: {effects}"),
    ("procedure.targeted", "{name}: {effects}"),
    ("procedure.declared", "{name} [{confirmation}]: {effects}"),
    ("target.random", "a random member"),
    ("target.owned", "own currency"),
    ("target.state", "state funds"),
    ("target.party", "every party's funds"),
    ("target.region", "every region's funds"),
];

/// Key → template table. Templates use `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localization {
    strings: BTreeMap<String, String>,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            strings: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Localization {
    pub fn from_strings(strings: BTreeMap<String, String>) -> Self {
        Self { strings }
    }

    pub fn required_keys() -> impl Iterator<Item = &'static str> {
        ENGLISH.iter().map(|(k, _)| *k)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match Self::required_keys().find(|k| !self.strings.contains_key(*k)) {
            Some(key) => Err(ConfigError::MissingLocalization {
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Fill a template's placeholders.
    ///
    /// # Panics
    /// Panics if `key` is missing; tables are validated at load time.
    pub fn render(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = self
            .strings
            .get(key)
            .unwrap_or_else(|| panic!("render: localization key {key:?} not found"));
        args.iter().fold(template.clone(), |out, (name, value)| {
            out.replace(&format!("{{{name}}}"), value)
        })
    }
}

/// Display names for every id space.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    pub roles: BTreeMap<Id, String>,
    pub parties: BTreeMap<Id, String>,
    pub regions: BTreeMap<Id, String>,
    pub currencies: BTreeMap<Id, String>,
    pub procedures: BTreeMap<Id, String>,
    pub ballots: BTreeMap<Id, String>,
    pub people: BTreeMap<Id, String>,
}

fn name_in(table: &BTreeMap<Id, String>, id: Id) -> String {
    table.get(&id).cloned().unwrap_or_else(|| format!("#{id}"))
}

impl NameTable {
    pub fn role(&self, id: Id) -> String {
        name_in(&self.roles, id)
    }

    pub fn currency(&self, id: Id) -> String {
        name_in(&self.currencies, id)
    }

    pub fn procedure(&self, id: Id) -> String {
        name_in(&self.procedures, id)
    }

    pub fn ballot(&self, id: Id) -> String {
        name_in(&self.ballots, id)
    }

    pub fn party(&self, id: Id) -> String {
        name_in(&self.parties, id)
    }

    /// Filters may name people, roles, parties or regions.
    pub fn filter(&self, id: Id) -> String {
        [&self.parties, &self.regions, &self.roles, &self.people]
            .iter()
            .find_map(|t| t.get(&id).cloned())
            .unwrap_or_else(|| format!("#{id}"))
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn currency_targets(targets: &[Id], names: &NameTable, loc: &Localization) -> String {
    join(targets.iter().map(|&id| match id {
        Id::STATE => loc.render("target.state", &[]),
        Id::PARTY => loc.render("target.party", &[]),
        Id::REGION => loc.render("target.region", &[]),
        other => names.currency(other),
    }))
}

fn comparison(cmp: Comparison, loc: &Localization) -> String {
    loc.render(&format!("comparison.{}", cmp.as_str()), &[])
}

impl Condition {
    pub fn describe(&self, names: &NameTable, loc: &Localization) -> String {
        match self {
            Condition::Always => loc.render("condition.always", &[]),
            Condition::Never => loc.render("condition.never", &[]),
            Condition::And { conditions } => loc.render(
                "condition.and",
                &[("children", &join(conditions.iter().map(|c| c.describe(names, loc))))],
            ),
            Condition::Or { conditions } => loc.render(
                "condition.or",
                &[("children", &join(conditions.iter().map(|c| c.describe(names, loc))))],
            ),
            Condition::Vote { passed: true } => loc.render("condition.vote.pass", &[]),
            Condition::Vote { passed: false } => loc.render("condition.vote.fail", &[]),
            Condition::BallotPassed { ballot, passed } => {
                let key = if *passed {
                    "condition.ballot.passed"
                } else {
                    "condition.ballot.failed"
                };
                loc.render(key, &[("ballot", &names.ballot(*ballot))])
            }
            Condition::PassedCount { cmp, value } => loc.render(
                "condition.passed_count",
                &[("cmp", &comparison(*cmp, loc)), ("value", &value.to_string())],
            ),
            Condition::CurrencyValue {
                currency,
                cmp,
                value,
            } => loc.render(
                "condition.currency_value",
                &[
                    ("currency", &names.currency(*currency)),
                    ("cmp", &comparison(*cmp, loc)),
                    ("value", &value.to_string()),
                ],
            ),
            Condition::ProcedureActive { procedure, active } => {
                let key = if *active {
                    "condition.procedure.active"
                } else {
                    "condition.procedure.inactive"
                };
                loc.render(key, &[("procedure", &names.procedure(*procedure))])
            }
        }
    }
}

impl ProcedureEffect {
    pub fn describe(&self, names: &NameTable, loc: &Localization) -> String {
        use ProcedureEffectKind::*;
        let targets = match self.kind() {
            _ if self.targets().is_empty() && self.kind().is_permission() => {
                loc.render("target.random", &[])
            }
            _ if self.targets().is_empty() && self.kind().is_currency() => {
                loc.render("target.owned", &[])
            }
            CurrencyAdd | CurrencySubtract => currency_targets(self.targets(), names, loc),
            PermissionCanVote | PermissionVotes | PermissionCanSpeak => {
                join(self.targets().iter().map(|&id| names.role(id)))
            }
            ElectNominated | ElectAppointed => {
                join(self.targets().first().map(|&id| names.role(id)).into_iter())
            }
            ProcedureActivate | ProcedureRemove => {
                join(self.targets().iter().map(|&id| names.procedure(id)))
            }
            ElectParty | ElectRegion | BallotLimit | VotePassBonus | VoteFailBonus
            | Supermajority | BallotPass | BallotFail => {
                join(self.targets().iter().map(|&id| names.filter(id)))
            }
        };
        let value = match self.kind() {
            CurrencySubtract => self.value().unsigned_abs().to_string(),
            _ => self.value().to_string(),
        };
        loc.render(
            &format!("effect.{}", self.kind().as_str()),
            &[("targets", &targets), ("value", &value)],
        )
    }
}

impl BallotEffect {
    pub fn describe(&self, names: &NameTable, loc: &Localization) -> String {
        let targets = match self.kind() {
            BallotEffectKind::FoundParty | BallotEffectKind::DissolveParty => {
                join(self.targets().iter().map(|&id| names.party(id)))
            }
            BallotEffectKind::ActivateProcedure
            | BallotEffectKind::RemoveProcedure
            | BallotEffectKind::ReplaceProcedure => {
                join(self.targets().iter().map(|&id| names.procedure(id)))
            }
            BallotEffectKind::ModifyCurrency => currency_targets(self.targets(), names, loc),
        };
        let value = format!("{:+}", self.value());
        loc.render(
            &format!("effect.{}", self.kind().as_str()),
            &[("targets", &targets), ("value", &value)],
        )
    }
}

impl Confirmation {
    pub fn describe(&self, loc: &Localization) -> String {
        let value = match self {
            Confirmation::CurrencyValue { value } => value.to_string(),
            Confirmation::DiceValue { value } => value.to_string(),
            _ => String::new(),
        };
        loc.render(&format!("confirmation.{}", self.as_str()), &[("value", &value)])
    }
}

impl Procedure {
    pub fn describe(&self, names: &NameTable, loc: &Localization) -> String {
        let effects = join(self.effects.iter().map(|e| e.describe(names, loc)));
        let confirmation = self
            .confirmation()
            .map(|c| c.describe(loc))
            .unwrap_or_default();
        loc.render(
            &format!("procedure.{}", self.kind.as_str()),
            &[
                ("name", &self.name),
                ("effects", &effects),
                ("confirmation", &confirmation),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::procedure::ProcedureKind;

    fn names() -> NameTable {
        NameTable {
            roles: BTreeMap::from([(Id::MEMBER, "Member".to_string())]),
            currencies: BTreeMap::from([(Id(0), "Treasury".to_string())]),
            procedures: BTreeMap::from([(Id(4), "Closure".to_string())]),
            ballots: BTreeMap::from([(Id(1), "Budget".to_string())]),
            ..NameTable::default()
        }
    }

    #[test]
    fn default_table_is_complete() {
        assert!(Localization::default().validate().is_ok());
    }

    #[test]
    fn missing_key_fails_validation() {
        let mut strings: BTreeMap<String, String> = Localization::default().strings;
        strings.remove("effect.ballot_pass");
        let err = Localization::from_strings(strings).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingLocalization { key } if key == "effect.ballot_pass"));
    }

    #[test]
    fn describes_nested_conditions() {
        let loc = Localization::default();
        let c = Condition::And {
            conditions: vec![
                Condition::BallotPassed {
                    ballot: Id(1),
                    passed: true,
                },
                Condition::CurrencyValue {
                    currency: Id(0),
                    cmp: Comparison::GreaterEqual,
                    value: 3,
                },
            ],
        };
        assert_eq!(
            c.describe(&names(), &loc),
            "all of (Budget passed, Treasury is at least 3)"
        );
    }

    #[test]
    fn describes_effects_and_procedures() {
        let loc = Localization::default();
        let grant = ProcedureEffect::new(ProcedureEffectKind::PermissionCanVote, vec![Id::MEMBER], 1)
            .unwrap();
        assert_eq!(grant.describe(&names(), &loc), "Member: may vote = 1");

        let random = ProcedureEffect::new(ProcedureEffectKind::PermissionVotes, vec![], 2).unwrap();
        assert_eq!(random.describe(&names(), &loc), "a random member: 2 votes");

        let levy = BallotEffect::new(BallotEffectKind::ModifyCurrency, vec![Id::STATE, Id(0)], -2)
            .unwrap();
        assert_eq!(levy.describe(&names(), &loc), "state funds, Treasury -2");

        let p = Procedure {
            id: Id(4),
            name: "Closure".to_string(),
            kind: ProcedureKind::Declared {
                confirmation: Confirmation::DiceValue { value: 5 },
                declarers: vec![],
                ballots: vec![],
            },
            effects: vec![ProcedureEffect::new(ProcedureEffectKind::BallotPass, vec![], 0).unwrap()],
        };
        assert_eq!(
            p.describe(&names(), &loc),
            "Closure [roll 5 or more]: the ballot passes"
        );
    }
}
