#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use legislature_sim::model::*;
use legislature_sim::scenario::{Scenario, procedure_effect};
use legislature_sim::{Id, SimulationContext, Vote};

/// A scenario whose `MEMBER` role cannot vote until a procedure says so.
pub fn silent_scenario() -> Scenario {
    let mut s = Scenario::new();
    s.role_permissions(Id::MEMBER, Permissions::default());
    s
}

/// Governmental procedure giving `MEMBER` the vote.
pub fn franchise(s: &mut Scenario) -> Id {
    s.governmental(
        "Franchise",
        vec![procedure_effect(
            ProcedureEffectKind::PermissionCanVote,
            vec![Id::MEMBER],
            1,
        )],
    )
}

pub fn vote_all(ctx: &mut SimulationContext, people: &[Id], vote: Vote) {
    for &p in people {
        assert!(ctx.cast_vote(p, vote), "vote from {p} refused");
    }
}

/// Election collaborator that keeps the current maps, overlays fixed
/// entries, and records every request batch it receives.
#[derive(Clone, Default)]
pub struct FixedAssigner {
    pub roles: BTreeMap<Id, BTreeSet<Id>>,
    pub factions: BTreeMap<Id, Membership>,
    pub log: Rc<RefCell<Vec<Vec<ElectionRequest>>>>,
}

impl FixedAssigner {
    pub fn with_role(mut self, person: Id, role: Id) -> Self {
        self.roles.entry(person).or_default().insert(role);
        self
    }

    pub fn with_party(mut self, person: Id, party: Id) -> Self {
        self.factions.entry(person).or_default().party = Some(party);
        self
    }

    pub fn with_region(mut self, person: Id, region: Id) -> Self {
        self.factions.entry(person).or_default().region = Some(region);
        self
    }

    pub fn batches(&self) -> Vec<Vec<ElectionRequest>> {
        self.log.borrow().clone()
    }
}

impl ElectionAssigner for FixedAssigner {
    fn assign(&mut self, requests: &[ElectionRequest], snapshot: &ElectionSnapshot<'_>) -> Assignments {
        self.log.borrow_mut().push(requests.to_vec());
        let mut out = Assignments::from_snapshot(snapshot);
        for (person, roles) in &self.roles {
            out.roles.entry(*person).or_default().extend(roles.iter().copied());
        }
        out.factions.extend(self.factions.clone());
        out
    }
}

/// Collaborator that forgets everything it is given.
pub struct ForgetfulAssigner;

impl ElectionAssigner for ForgetfulAssigner {
    fn assign(&mut self, _requests: &[ElectionRequest], _snapshot: &ElectionSnapshot<'_>) -> Assignments {
        Assignments::default()
    }
}

/// Governmental procedure that runs a party election, so a [`FixedAssigner`]
/// gets a chance to place people at setup.
pub fn party_election(s: &mut Scenario) -> Id {
    s.governmental(
        "General election",
        vec![procedure_effect(ProcedureEffectKind::ElectParty, vec![], 0)],
    )
}
