//! Running vote counts for the live ballot and the threshold arithmetic that
//! decides it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::model::Permissions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Pass,
    Fail,
    Abstain,
}

/// Pass threshold for a simple majority: `floor(total / 2) + 1`.
pub fn simple_majority(total: u32) -> u32 {
    total / 2 + 1
}

/// Pass threshold for a two-thirds majority: `ceil(total * 2 / 3)`.
pub fn two_thirds(total: u32) -> u32 {
    (total * 2).div_ceil(3)
}

/// Vote state of one ballot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub pass_voters: BTreeSet<Id>,
    pub fail_voters: BTreeSet<Id>,
    pub pass_bonus: u32,
    pub fail_bonus: u32,
    /// Two-thirds instead of a simple majority.
    pub supermajority: bool,
    /// Outcome imposed by a declared procedure, overriding the counts.
    pub forced: Option<bool>,
}

impl VoteTally {
    pub fn record(&mut self, person: Id, vote: Vote) {
        self.pass_voters.remove(&person);
        self.fail_voters.remove(&person);
        match vote {
            Vote::Pass => {
                self.pass_voters.insert(person);
            }
            Vote::Fail => {
                self.fail_voters.insert(person);
            }
            Vote::Abstain => {}
        }
    }

    /// Drop every recorded vote; bonuses, majority mode and any forced result stay.
    pub fn clear_votes(&mut self) {
        self.pass_voters.clear();
        self.fail_voters.clear();
    }

    fn weight_of(voters: &BTreeSet<Id>, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        voters
            .iter()
            .map(|p| permissions.get(p).map_or(0, Permissions::weight))
            .sum()
    }

    pub fn total(&self, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        self.pass_bonus + self.fail_bonus + permissions.values().map(Permissions::weight).sum::<u32>()
    }

    pub fn pass_count(&self, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        self.pass_bonus + Self::weight_of(&self.pass_voters, permissions)
    }

    pub fn fail_count(&self, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        self.fail_bonus + Self::weight_of(&self.fail_voters, permissions)
    }

    pub fn abstain_count(&self, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        self.total(permissions) - self.pass_count(permissions) - self.fail_count(permissions)
    }

    pub fn pass_threshold(&self, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        let total = self.total(permissions);
        if self.supermajority {
            two_thirds(total)
        } else {
            simple_majority(total)
        }
    }

    pub fn fail_threshold(&self, permissions: &BTreeMap<Id, Permissions>) -> u32 {
        let pass = self.pass_threshold(permissions);
        if self.supermajority {
            self.total(permissions) - pass + 1
        } else {
            pass
        }
    }

    /// `Some(true)` if passed, `Some(false)` if failed, `None` while undecided.
    /// A forced result wins; otherwise pass is checked before fail.
    pub fn is_decided(&self, permissions: &BTreeMap<Id, Permissions>) -> Option<bool> {
        if let Some(forced) = self.forced {
            return Some(forced);
        }
        if self.pass_count(permissions) >= self.pass_threshold(permissions) {
            Some(true)
        } else if self.fail_count(permissions) >= self.fail_threshold(permissions) {
            Some(false)
        } else {
            None
        }
    }

    pub fn summary(&self, permissions: &BTreeMap<Id, Permissions>) -> TallySummary {
        TallySummary {
            pass: self.pass_count(permissions),
            fail: self.fail_count(permissions),
            abstain: self.abstain_count(permissions),
            total: self.total(permissions),
        }
    }
}

/// Final counts reported when a ballot ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallySummary {
    pub pass: u32,
    pub fail: u32,
    pub abstain: u32,
    pub total: u32,
}
