use serde::{Deserialize, Serialize};

use super::condition::{Condition, ConditionState};
use super::effect::BallotEffect;
use crate::id::Id;

/// Where a link leads once its condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    Ballot(Id),
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub condition: Condition,
    pub target: LinkTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotResult {
    #[serde(default)]
    pub effects: Vec<BallotEffect>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl BallotResult {
    /// Next ballot after this result, or `None` when the simulation ends.
    ///
    /// The first link whose condition holds wins; no matching link ends the run.
    pub fn next_ballot(&self, state: &ConditionState<'_>) -> Option<Id> {
        match self.links.iter().find(|l| l.condition.evaluate(state))?.target {
            LinkTarget::Ballot(id) => Some(id),
            LinkTarget::End => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub pass: BallotResult,
    #[serde(default)]
    pub fail: BallotResult,
    /// Incidents are resolved by `resolution` instead of a floor vote.
    #[serde(default)]
    pub incident: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Condition>,
}

impl Ballot {
    pub fn result(&self, is_pass: bool) -> &BallotResult {
        if is_pass { &self.pass } else { &self.fail }
    }
}
