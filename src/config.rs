//! Rule configuration: roles, factions, currencies, procedures, ballots and
//! display strings. Loaded once before the engine starts and validated so
//! that every id the engine later looks up is known to exist.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::id::Id;
use crate::model::{
    Ballot, BallotEffectKind, Condition, CurrencyDef, CurrencyOwner, FactionDef, LinkTarget,
    Localization, NameTable, Permissions, Procedure, ProcedureEffectKind, ProcedureKind, RoleDef,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub roles: Vec<RoleDef>,
    #[serde(default)]
    pub parties: Vec<FactionDef>,
    #[serde(default)]
    pub regions: Vec<FactionDef>,
    #[serde(default)]
    pub currencies: Vec<CurrencyDef>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    #[serde(default)]
    pub ballots: Vec<Ballot>,
    #[serde(default)]
    pub localization: Localization,
}

fn check_ids(
    space: &'static str,
    ids: impl Iterator<Item = Id>,
    allow: impl Fn(Id) -> bool,
    seen: &mut BTreeSet<Id>,
) -> Result<(), ConfigError> {
    for id in ids {
        if id.is_reserved() && !allow(id) {
            return Err(ConfigError::ReservedId { space, id });
        }
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId { space, id });
        }
    }
    Ok(())
}

fn require(
    known: &BTreeSet<Id>,
    space: &'static str,
    id: Id,
    context: impl FnOnce() -> String,
) -> Result<(), ConfigError> {
    if known.contains(&id) {
        Ok(())
    } else {
        Err(ConfigError::UnknownReference {
            context: context(),
            space,
            id,
        })
    }
}

/// Known ids per space, collected once for reference checks.
struct Known {
    roles: BTreeSet<Id>,
    parties: BTreeSet<Id>,
    currencies: BTreeSet<Id>,
    procedures: BTreeSet<Id>,
    /// Procedures that can be switched on and off between ballots.
    targeted: BTreeSet<Id>,
    ballots: BTreeSet<Id>,
    /// The state-owned currency, if one is configured.
    state_currency: Option<Id>,
}

impl Known {
    fn currency_target(&self, id: Id, context: impl FnOnce() -> String) -> Result<(), ConfigError> {
        match id {
            Id::STATE => self.state_currency_for(context),
            Id::PARTY | Id::REGION => Ok(()),
            _ => require(&self.currencies, "currency", id, context),
        }
    }

    fn state_currency_for(&self, context: impl FnOnce() -> String) -> Result<(), ConfigError> {
        match self.state_currency {
            Some(_) => Ok(()),
            None => Err(ConfigError::UnknownReference {
                context: context(),
                space: "state currency",
                id: Id::STATE,
            }),
        }
    }

    fn condition(&self, condition: &Condition, context: &str) -> Result<(), ConfigError> {
        let mut result = Ok(());
        condition.walk(&mut |c| {
            if result.is_err() {
                return;
            }
            let ctx = || context.to_string();
            result = match c {
                Condition::BallotPassed { ballot, .. } => require(&self.ballots, "ballot", *ballot, ctx),
                Condition::CurrencyValue { currency, .. } => {
                    require(&self.currencies, "currency", *currency, ctx)
                }
                Condition::ProcedureActive { procedure, .. } => {
                    require(&self.procedures, "procedure", *procedure, ctx)
                }
                _ => Ok(()),
            };
        });
        result
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let named_role = |id: Id| Id::named_roles().contains(&id);
        let never = |_: Id| false;

        let mut roles = BTreeSet::new();
        check_ids("role", self.roles.iter().map(|r| r.id), named_role, &mut roles)?;
        let mut factions = BTreeSet::new();
        check_ids("faction", self.parties.iter().map(|f| f.id), never, &mut factions)?;
        let parties = factions.clone();
        check_ids("faction", self.regions.iter().map(|f| f.id), never, &mut factions)?;
        let regions: BTreeSet<Id> = factions.difference(&parties).copied().collect();
        let mut currencies = BTreeSet::new();
        check_ids("currency", self.currencies.iter().map(|c| c.id), never, &mut currencies)?;
        let mut procedures = BTreeSet::new();
        check_ids("procedure", self.procedures.iter().map(|p| p.id), never, &mut procedures)?;
        let mut ballots = BTreeSet::new();
        check_ids("ballot", self.ballots.iter().map(|b| b.id), never, &mut ballots)?;

        let mut all_roles = roles;
        all_roles.extend(Id::named_roles());
        let known = Known {
            roles: all_roles,
            parties,
            currencies,
            procedures,
            targeted: self
                .procedures
                .iter()
                .filter(|p| matches!(p.kind, ProcedureKind::Targeted { .. }))
                .map(|p| p.id)
                .collect(),
            ballots,
            state_currency: self.state_currency(),
        };

        let mut state_currency: Option<Id> = None;
        for currency in &self.currencies {
            let ctx = || format!("currency {}", currency.id);
            match currency.owner {
                CurrencyOwner::State => {
                    if let Some(existing) = state_currency {
                        return Err(ConfigError::DuplicateStateCurrency {
                            currency: currency.id,
                            existing,
                        });
                    }
                    state_currency = Some(currency.id);
                }
                CurrencyOwner::Party(id) => require(&known.parties, "party", id, ctx)?,
                CurrencyOwner::Region(id) => require(&regions, "region", id, ctx)?,
            }
        }

        for procedure in &self.procedures {
            self.validate_procedure(procedure, &known)?;
        }
        for ballot in &self.ballots {
            self.validate_ballot(ballot, &known)?;
        }

        self.localization.validate()
    }

    fn validate_procedure(&self, procedure: &Procedure, known: &Known) -> Result<(), ConfigError> {
        let ctx = || format!("procedure {}", procedure.id);
        match &procedure.kind {
            ProcedureKind::Governmental => {}
            ProcedureKind::Targeted { ballots, .. } => {
                for b in ballots {
                    require(&known.ballots, "ballot", *b, ctx)?;
                }
            }
            ProcedureKind::Declared {
                declarers, ballots, ..
            } => {
                for r in declarers {
                    require(&known.roles, "role", *r, ctx)?;
                }
                for b in ballots {
                    require(&known.ballots, "ballot", *b, ctx)?;
                }
            }
        }

        let declared = matches!(procedure.kind, ProcedureKind::Declared { .. });
        for effect in &procedure.effects {
            let kind = effect.kind();
            if matches!(procedure.kind, ProcedureKind::Governmental) && kind.is_ballot_scoped() {
                return Err(ConfigError::EffectNotAllowed {
                    procedure: procedure.id,
                    kind: kind.as_str(),
                    procedure_kind: procedure.kind.as_str(),
                });
            }
            // Without a declarer, an untargeted currency change falls to the state.
            if !declared && kind.is_currency() && effect.targets().is_empty() {
                known.state_currency_for(ctx)?;
            }
            for &target in effect.targets() {
                match kind {
                    ProcedureEffectKind::CurrencyAdd | ProcedureEffectKind::CurrencySubtract => {
                        known.currency_target(target, ctx)?
                    }
                    ProcedureEffectKind::PermissionCanVote
                    | ProcedureEffectKind::PermissionVotes
                    | ProcedureEffectKind::PermissionCanSpeak => {
                        require(&known.roles, "role", target, ctx)?
                    }
                    ProcedureEffectKind::ProcedureActivate | ProcedureEffectKind::ProcedureRemove => {
                        require(&known.targeted, "targeted procedure", target, ctx)?
                    }
                    ProcedureEffectKind::ElectParty
                    | ProcedureEffectKind::ElectRegion
                    | ProcedureEffectKind::ElectNominated
                    | ProcedureEffectKind::ElectAppointed
                    | ProcedureEffectKind::VotePassBonus
                    | ProcedureEffectKind::VoteFailBonus
                    | ProcedureEffectKind::Supermajority
                    | ProcedureEffectKind::BallotLimit
                    | ProcedureEffectKind::BallotPass
                    | ProcedureEffectKind::BallotFail => {}
                }
            }
            if matches!(
                kind,
                ProcedureEffectKind::ElectNominated | ProcedureEffectKind::ElectAppointed
            ) {
                require(&known.roles, "role", effect.targets()[0], ctx)?;
            }
        }
        Ok(())
    }

    fn validate_ballot(&self, ballot: &Ballot, known: &Known) -> Result<(), ConfigError> {
        let context = format!("ballot {}", ballot.id);
        let ctx = || context.clone();

        if ballot.incident && ballot.resolution.is_none() {
            return Err(ConfigError::MissingResolution { ballot: ballot.id });
        }
        if let Some(resolution) = &ballot.resolution {
            known.condition(resolution, &context)?;
        }

        for result in [&ballot.pass, &ballot.fail] {
            for link in &result.links {
                if link.condition.reads_live_vote() {
                    return Err(ConfigError::VoteConditionInLink { ballot: ballot.id });
                }
                known.condition(&link.condition, &context)?;
                if let LinkTarget::Ballot(next) = link.target {
                    require(&known.ballots, "ballot", next, ctx)?;
                }
            }
            for effect in &result.effects {
                for &target in effect.targets() {
                    match effect.kind() {
                        BallotEffectKind::FoundParty | BallotEffectKind::DissolveParty => {
                            require(&known.parties, "party", target, ctx)?
                        }
                        BallotEffectKind::ActivateProcedure
                        | BallotEffectKind::RemoveProcedure
                        | BallotEffectKind::ReplaceProcedure => {
                            require(&known.targeted, "targeted procedure", target, ctx)?
                        }
                        BallotEffectKind::ModifyCurrency => known.currency_target(target, ctx)?,
                    }
                }
            }
        }
        Ok(())
    }

    /// Base permissions per role. Named sentinel roles default to
    /// [`Permissions::default`] unless configured.
    pub fn role_table(&self) -> BTreeMap<Id, Permissions> {
        let mut table: BTreeMap<Id, Permissions> = Id::named_roles()
            .into_iter()
            .map(|id| (id, Permissions::default()))
            .collect();
        table.extend(self.roles.iter().map(|r| (r.id, r.permissions)));
        table
    }

    pub fn procedure(&self, id: Id) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.id == id)
    }

    pub fn ballot(&self, id: Id) -> Option<&Ballot> {
        self.ballots.iter().find(|b| b.id == id)
    }

    pub fn state_currency(&self) -> Option<Id> {
        self.currencies
            .iter()
            .find(|c| c.owner == CurrencyOwner::State)
            .map(|c| c.id)
    }

    pub fn party_currency(&self, party: Id) -> Option<Id> {
        self.currencies
            .iter()
            .find(|c| c.owner == CurrencyOwner::Party(party))
            .map(|c| c.id)
    }

    pub fn region_currency(&self, region: Id) -> Option<Id> {
        self.currencies
            .iter()
            .find(|c| c.owner == CurrencyOwner::Region(region))
            .map(|c| c.id)
    }

    pub fn name_table(&self) -> NameTable {
        let names = |defs: &[FactionDef]| -> BTreeMap<Id, String> {
            defs.iter().map(|d| (d.id, d.name.clone())).collect()
        };
        let mut roles: BTreeMap<Id, String> =
            self.roles.iter().map(|r| (r.id, r.name.clone())).collect();
        for (id, name) in [
            (Id::MEMBER, "Member"),
            (Id::HEAD_GOVERNMENT, "Head of Government"),
            (Id::HEAD_STATE, "Head of State"),
            (Id::LEADER_PARTY, "Party Leader"),
            (Id::LEADER_REGION, "Regional Leader"),
        ] {
            roles.entry(id).or_insert_with(|| name.to_string());
        }
        NameTable {
            roles,
            parties: names(&self.parties),
            regions: names(&self.regions),
            currencies: self.currencies.iter().map(|c| (c.id, c.name.clone())).collect(),
            procedures: self.procedures.iter().map(|p| (p.id, p.name.clone())).collect(),
            ballots: self.ballots.iter().map(|b| (b.id, b.name.clone())).collect(),
            people: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base() -> serde_json::Value {
        json!({
            "roles": [{"id": 0, "name": "Speaker", "permissions": {"can_vote": false}}],
            "parties": [{"id": 0, "name": "Reds", "active": true}],
            "regions": [{"id": 1, "name": "North", "active": true}],
            "currencies": [
                {"id": 0, "name": "Treasury", "owner": {"type": "state"}, "initial": 5},
                {"id": 1, "name": "Red funds", "owner": {"type": "party", "id": 0}}
            ],
            "procedures": [
                {
                    "id": 0,
                    "name": "Franchise",
                    "kind": {"type": "governmental"},
                    "effects": [{"kind": "permission_can_vote", "targets": [255], "value": 1}]
                }
            ],
            "ballots": [
                {
                    "id": 0,
                    "name": "Budget",
                    "pass": {"links": [{"condition": {"type": "always"}, "target": {"ballot": 1}}]}
                },
                {"id": 1, "name": "Reform"}
            ]
        })
    }

    fn parse(value: serde_json::Value) -> Result<SimulationConfig, ConfigError> {
        SimulationConfig::from_json_str(&value.to_string())
    }

    #[test]
    fn valid_config_loads() {
        let config = parse(base()).unwrap();
        assert_eq!(config.state_currency(), Some(Id(0)));
        assert_eq!(config.party_currency(Id(0)), Some(Id(1)));
        assert_eq!(config.region_currency(Id(1)), None);
        let table = config.role_table();
        assert!(!table[&Id(0)].can_vote);
        assert_eq!(table[&Id::MEMBER], Permissions::default());
        assert_eq!(config.name_table().role(Id::MEMBER), "Member");
    }

    #[test]
    fn reserved_ids_rejected() {
        let mut v = base();
        v["ballots"][1]["id"] = json!(249);
        assert!(matches!(parse(v), Err(ConfigError::ReservedId { space: "ballot", .. })));

        // Named sentinel roles may be configured.
        let mut v = base();
        v["roles"][0]["id"] = json!(255);
        assert!(parse(v).is_ok());
    }

    #[test]
    fn duplicate_faction_across_parties_and_regions() {
        let mut v = base();
        v["regions"][0]["id"] = json!(0);
        assert!(matches!(parse(v), Err(ConfigError::DuplicateId { space: "faction", .. })));
    }

    #[test]
    fn dangling_link_rejected() {
        let mut v = base();
        v["ballots"][0]["pass"]["links"][0]["target"] = json!({"ballot": 7});
        assert!(matches!(
            parse(v),
            Err(ConfigError::UnknownReference { space: "ballot", .. })
        ));
    }

    #[test]
    fn vote_condition_in_link_rejected() {
        let mut v = base();
        v["ballots"][0]["pass"]["links"][0]["condition"] =
            json!({"type": "or", "conditions": [{"type": "vote", "passed": true}]});
        assert!(matches!(parse(v), Err(ConfigError::VoteConditionInLink { .. })));
    }

    #[test]
    fn ballot_scoped_effect_on_governmental_rejected() {
        let mut v = base();
        v["procedures"][0]["effects"] = json!([{"kind": "vote_pass_bonus", "value": 2}]);
        assert!(matches!(parse(v), Err(ConfigError::EffectNotAllowed { .. })));
    }

    #[test]
    fn invalid_effect_fails_at_parse() {
        let mut v = base();
        v["ballots"][1]["pass"] = json!({"effects": [{"kind": "replace_procedure", "targets": [0]}]});
        assert!(matches!(parse(v), Err(ConfigError::Json(_))));
    }

    #[test]
    fn activation_must_name_targeted_procedure() {
        let mut v = base();
        v["ballots"][1]["pass"] = json!({"effects": [{"kind": "activate_procedure", "targets": [0]}]});
        assert!(matches!(
            parse(v),
            Err(ConfigError::UnknownReference {
                space: "targeted procedure",
                ..
            })
        ));
    }

    #[test]
    fn state_target_needs_a_state_currency() {
        let mut v = base();
        v["currencies"] = json!([{"id": 1, "name": "Red funds", "owner": {"type": "party", "id": 0}}]);
        assert!(parse(v.clone()).is_ok());

        v["ballots"][1]["pass"] =
            json!({"effects": [{"kind": "modify_currency", "targets": [Id::STATE], "value": 1}]});
        assert!(matches!(
            parse(v),
            Err(ConfigError::UnknownReference {
                space: "state currency",
                ..
            })
        ));
    }

    #[test]
    fn untargeted_currency_change_needs_a_state_currency_outside_declarations() {
        let mut v = base();
        v["currencies"] = json!([]);
        v["procedures"][0]["effects"] = json!([{"kind": "currency_add", "value": 1}]);
        assert!(matches!(
            parse(v.clone()),
            Err(ConfigError::UnknownReference {
                space: "state currency",
                ..
            })
        ));

        v["procedures"][0]["kind"] = json!({"type": "declared", "confirmation": {"type": "always"}});
        assert!(parse(v).is_ok(), "a declarer may own a currency");
    }

    #[test]
    fn incident_requires_resolution() {
        let mut v = base();
        v["ballots"][1]["incident"] = json!(true);
        assert!(matches!(parse(v), Err(ConfigError::MissingResolution { .. })));
    }

    #[test]
    fn second_state_currency_rejected() {
        let mut v = base();
        v["currencies"][1]["owner"] = json!({"type": "state"});
        assert!(matches!(parse(v), Err(ConfigError::DuplicateStateCurrency { .. })));
    }

    #[test]
    fn incomplete_localization_rejected() {
        let mut v = base();
        v["localization"] = json!({"condition.always": "always"});
        assert!(matches!(parse(v), Err(ConfigError::MissingLocalization { .. })));
    }

    #[test]
    fn unknown_currency_in_condition_rejected() {
        let mut v = base();
        v["ballots"][0]["pass"]["links"][0]["condition"] =
            json!({"type": "currency_value", "currency": 9, "cmp": "equal", "value": 0});
        assert!(matches!(
            parse(v),
            Err(ConfigError::UnknownReference { space: "currency", .. })
        ));
    }
}
