//! Effect interpreters. Every procedure and ballot effect kind is handled
//! here, whichever phase it fires from.

use super::context::{Changes, Scope, SimulationContext};
use crate::id::Id;
use crate::model::{
    BallotEffect, BallotEffectKind, Composition, ElectionKind, ElectionRequest, OverrideTarget,
    PermissionOverride, ProcedureEffect, ProcedureEffectKind,
};

impl SimulationContext {
    pub(super) fn apply_procedure_effect(
        &mut self,
        procedure: Id,
        effect: &ProcedureEffect,
        scope: Scope,
        changes: &mut Changes,
    ) {
        let targets = effect.targets();
        let value = effect.value();
        match effect.kind() {
            ProcedureEffectKind::ElectParty | ProcedureEffectKind::ElectRegion => {
                let kind = if effect.kind() == ProcedureEffectKind::ElectParty {
                    ElectionKind::Party
                } else {
                    ElectionKind::Region
                };
                self.pending_elections.push(ElectionRequest {
                    kind,
                    procedure: Some(procedure),
                    target: Id::MEMBER,
                    filters: targets.to_vec(),
                    random: value != 0,
                });
            }
            ProcedureEffectKind::ElectNominated | ProcedureEffectKind::ElectAppointed => {
                let kind = if effect.kind() == ProcedureEffectKind::ElectNominated {
                    ElectionKind::Nominated
                } else {
                    ElectionKind::Appointed
                };
                self.pending_elections.push(ElectionRequest {
                    kind,
                    procedure: Some(procedure),
                    target: targets[0],
                    filters: targets[1..].to_vec(),
                    random: value != 0,
                });
            }
            ProcedureEffectKind::PermissionCanVote => {
                self.push_override(targets, Composition::can_vote(value != 0), scope, changes)
            }
            ProcedureEffectKind::PermissionVotes => {
                self.push_override(targets, Composition::votes(value.max(0) as u8), scope, changes)
            }
            ProcedureEffectKind::PermissionCanSpeak => {
                self.push_override(targets, Composition::can_speak(value != 0), scope, changes)
            }
            ProcedureEffectKind::VotePassBonus => {
                self.ballot.tally.pass_bonus += u32::from(value.unsigned_abs());
            }
            ProcedureEffectKind::VoteFailBonus => {
                self.ballot.tally.fail_bonus += u32::from(value.unsigned_abs());
            }
            ProcedureEffectKind::Supermajority => self.ballot.tally.supermajority = true,
            ProcedureEffectKind::CurrencyAdd | ProcedureEffectKind::CurrencySubtract => {
                if scope.suppresses_carryover() {
                    tracing::debug!(procedure = %procedure, "currency change held back on first ballot");
                    return;
                }
                let delta = if effect.kind() == ProcedureEffectKind::CurrencyAdd {
                    value
                } else {
                    value.saturating_neg()
                };
                let currencies = if targets.is_empty() {
                    let owner = match scope.actor() {
                        Some(person) => self.owned_currency(person),
                        None => self.config.state_currency(),
                    };
                    if owner.is_none() {
                        tracing::warn!(procedure = %procedure, "no owned currency to modify; skipped");
                    }
                    owner.into_iter().collect()
                } else {
                    self.expand_currency_targets(targets)
                };
                for currency in currencies {
                    self.modify_currency(currency, delta);
                    changes.currencies = true;
                }
            }
            ProcedureEffectKind::ProcedureActivate | ProcedureEffectKind::ProcedureRemove => {
                if scope.suppresses_carryover() {
                    tracing::debug!(procedure = %procedure, "activation change held back on first ballot");
                    return;
                }
                let activate = effect.kind() == ProcedureEffectKind::ProcedureActivate;
                for &target in targets {
                    if activate {
                        self.state.active_procedures.insert(target);
                    } else {
                        self.state.active_procedures.remove(&target);
                    }
                }
                changes.procedures = true;
            }
            ProcedureEffectKind::BallotLimit => {
                self.limit_ballot(targets);
                changes.permissions = true;
            }
            ProcedureEffectKind::BallotPass => self.ballot.tally.forced = Some(true),
            ProcedureEffectKind::BallotFail => self.ballot.tally.forced = Some(false),
        }
    }

    pub(super) fn apply_ballot_effect(&mut self, effect: &BallotEffect, changes: &mut Changes) {
        let targets = effect.targets();
        match effect.kind() {
            BallotEffectKind::FoundParty => {
                self.state.active_parties.extend(targets.iter().copied());
                self.queue_party_shuffle(targets);
            }
            BallotEffectKind::DissolveParty => {
                for target in targets {
                    self.state.active_parties.remove(target);
                }
                self.queue_party_shuffle(targets);
            }
            BallotEffectKind::ActivateProcedure => {
                self.state.active_procedures.extend(targets.iter().copied());
                changes.procedures = true;
            }
            BallotEffectKind::RemoveProcedure => {
                for target in targets {
                    self.state.active_procedures.remove(target);
                }
                changes.procedures = true;
            }
            BallotEffectKind::ReplaceProcedure => {
                self.state.active_procedures.remove(&targets[0]);
                self.state.active_procedures.insert(targets[1]);
                changes.procedures = true;
            }
            BallotEffectKind::ModifyCurrency => {
                for currency in self.expand_currency_targets(targets) {
                    self.modify_currency(currency, effect.value());
                    changes.currencies = true;
                }
            }
        }
    }

    /// Queue a permission override. An empty target list picks one person at
    /// random now, so later recompositions stay stable.
    fn push_override(
        &mut self,
        targets: &[Id],
        composition: Composition,
        scope: Scope,
        changes: &mut Changes,
    ) {
        let target = if targets.is_empty() {
            let people: Vec<Id> = self.state.people.keys().copied().collect();
            if people.is_empty() {
                tracing::warn!("random permission override with nobody to target; skipped");
                return;
            }
            OverrideTarget::Person(people[self.generator.choose(people.len())])
        } else {
            OverrideTarget::Roles(targets.to_vec())
        };
        let entry = PermissionOverride {
            target,
            composition,
        };
        if scope == Scope::Setup {
            self.standing_overrides.push(entry);
        } else {
            self.ballot_overrides.push(entry);
        }
        changes.permissions = true;
    }

    /// Restrict the live ballot's franchise to people matching any filter by
    /// id, role, party or region. Replaces any earlier limit and clears the
    /// votes cast so far.
    fn limit_ballot(&mut self, filters: &[Id]) {
        self.person_overrides.clear();
        for (&person, roles) in &self.state.roles {
            let membership = self.state.membership(person);
            let eligible = filters
                .iter()
                .any(|&f| f == person || roles.contains(&f) || membership.contains(f));
            let composition = if eligible {
                Composition::default()
            } else {
                Composition::can_vote(false)
            };
            self.person_overrides.push((person, composition));
        }
        self.ballot.tally.clear_votes();
    }

    fn queue_party_shuffle(&mut self, parties: &[Id]) {
        self.pending_elections.push(ElectionRequest {
            kind: ElectionKind::Party,
            procedure: None,
            target: Id::MEMBER,
            filters: parties.to_vec(),
            random: true,
        });
    }

    /// Resolve currency targets. `STATE` is the state currency; `PARTY` and
    /// `REGION` stand for the currency of every active party or region that
    /// has one.
    ///
    /// # Panics
    /// Panics if `STATE` is named and no state currency exists.
    fn expand_currency_targets(&self, targets: &[Id]) -> Vec<Id> {
        let mut out = Vec::new();
        for &target in targets {
            match target {
                Id::STATE => out.push(
                    self.config
                        .state_currency()
                        .unwrap_or_else(|| panic!("currency effect: no state currency")),
                ),
                Id::PARTY => out.extend(
                    self.state
                        .active_parties
                        .iter()
                        .filter_map(|&p| self.config.party_currency(p)),
                ),
                Id::REGION => out.extend(
                    self.state
                        .active_regions
                        .iter()
                        .filter_map(|&r| self.config.region_currency(r)),
                ),
                id => out.push(id),
            }
        }
        out
    }

    /// Saturates at the `i8` bounds.
    fn modify_currency(&mut self, currency: Id, delta: i8) {
        let slot = self
            .state
            .currencies
            .get_mut(&currency)
            .unwrap_or_else(|| panic!("modify_currency: currency {currency} not found"));
        *slot = slot.saturating_add(delta);
    }
}
