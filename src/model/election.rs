//! Election requests and the boundary to the election-assignment collaborator.
//!
//! The engine never decides who fills a slot. It describes the elections it
//! needs, hands them over with a snapshot, and takes back wholesale
//! replacement role and faction maps.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::person::{Membership, Person};
use crate::id::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ElectionKind {
    /// Distribute people among regions.
    Region,
    /// Distribute people among parties.
    Party,
    /// Fill a role by nomination.
    Nominated,
    /// Fill a role by appointment.
    Appointed,
}

string_enum!(ElectionKind {
    Region => "region",
    Party => "party",
    Nominated => "nominated",
    Appointed => "appointed",
});

impl ElectionKind {
    pub fn targets_role(self) -> bool {
        matches!(self, ElectionKind::Nominated | ElectionKind::Appointed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRequest {
    pub kind: ElectionKind,
    /// Procedure that triggered the election, if any.
    pub procedure: Option<Id>,
    /// Role being filled (`Id::MEMBER` for faction elections).
    pub target: Id,
    pub filters: Vec<Id>,
    pub random: bool,
}

/// Order requests for the collaborator: faction kinds first in issue order,
/// then role-targeted kinds by originating procedure id.
pub fn sort_requests(requests: &mut [ElectionRequest]) {
    requests.sort_by_key(|r| {
        let role = r.kind.targets_role();
        (role, if role { r.procedure } else { None })
    });
}

/// Read-only view handed to the collaborator.
#[derive(Debug, Clone, Copy)]
pub struct ElectionSnapshot<'a> {
    pub people: &'a BTreeMap<Id, Person>,
    pub roles: &'a BTreeMap<Id, BTreeSet<Id>>,
    pub factions: &'a BTreeMap<Id, Membership>,
    pub active_parties: &'a BTreeSet<Id>,
    pub active_regions: &'a BTreeSet<Id>,
}

/// Replacement maps returned by the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignments {
    pub roles: BTreeMap<Id, BTreeSet<Id>>,
    pub factions: BTreeMap<Id, Membership>,
}

impl Assignments {
    pub fn from_snapshot(snapshot: &ElectionSnapshot<'_>) -> Self {
        Self {
            roles: snapshot.roles.clone(),
            factions: snapshot.factions.clone(),
        }
    }
}

/// The election-assignment collaborator.
pub trait ElectionAssigner {
    fn assign(&mut self, requests: &[ElectionRequest], snapshot: &ElectionSnapshot<'_>) -> Assignments;
}

/// Keeps every assignment as it is. Useful for hosts without an election
/// algorithm and for rules that never need one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetainAssignments;

impl ElectionAssigner for RetainAssignments {
    fn assign(&mut self, _requests: &[ElectionRequest], snapshot: &ElectionSnapshot<'_>) -> Assignments {
        Assignments::from_snapshot(snapshot)
    }
}
