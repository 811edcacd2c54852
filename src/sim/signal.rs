use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::tally::TallySummary;
use crate::id::Id;
use crate::model::{ElectionRequest, Membership, Permissions};

/// Outcome of an ended ballot, as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRecord {
    pub ballot: Id,
    pub passed: bool,
    pub tally: TallySummary,
    /// Procedures successfully declared during the ballot, in order.
    pub declared: Vec<Id>,
}

/// A notification emitted after the state mutation it describes is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Full per-person permission map after recomposition.
    PermissionsUpdated {
        permissions: BTreeMap<Id, Permissions>,
    },

    /// Full currency map after a change.
    CurrenciesModified { currencies: BTreeMap<Id, i8> },

    /// Active targeted procedures after a change.
    ProceduresModified { active: BTreeSet<Id> },

    /// A ballot ended.
    BallotVoted { record: BallotRecord },

    /// Elections about to be handed to the collaborator, with the roles and
    /// factions they start from.
    ElectionPreparing {
        requests: Vec<ElectionRequest>,
        roles: BTreeMap<Id, BTreeSet<Id>>,
        factions: BTreeMap<Id, Membership>,
    },

    /// The collaborator's assignments have replaced the old ones.
    ElectionCompleted {
        roles: BTreeMap<Id, BTreeSet<Id>>,
        factions: BTreeMap<Id, Membership>,
    },
}

impl Signal {
    /// The serde tag for this variant.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Signal::PermissionsUpdated { .. } => "permissions_updated",
            Signal::CurrenciesModified { .. } => "currencies_modified",
            Signal::ProceduresModified { .. } => "procedures_modified",
            Signal::BallotVoted { .. } => "ballot_voted",
            Signal::ElectionPreparing { .. } => "election_preparing",
            Signal::ElectionCompleted { .. } => "election_completed",
        }
    }
}

/// Fire-and-forget receiver of simulation signals.
pub trait Observer {
    fn notify(&mut self, signal: &Signal);
}

/// Observer that records every signal. Clones share the same buffer, so a
/// host can keep one handle and give another to the context.
#[derive(Debug, Clone, Default)]
pub struct SignalLog {
    signals: Rc<RefCell<Vec<Signal>>>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.signals.borrow().iter().map(Signal::kind_str).collect()
    }

    pub fn take(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.signals.borrow_mut())
    }
}

impl Observer for SignalLog {
    fn notify(&mut self, signal: &Signal) {
        self.signals.borrow_mut().push(signal.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_buffer() {
        let log = SignalLog::new();
        let mut handle = log.clone();
        handle.notify(&Signal::ProceduresModified {
            active: BTreeSet::from([Id(1)]),
        });
        assert_eq!(log.kinds(), vec!["procedures_modified"]);
        assert_eq!(log.take().len(), 1);
        assert!(log.signals().is_empty());
    }

    #[test]
    fn kind_str_matches_serde_tag() {
        let signal = Signal::BallotVoted {
            record: BallotRecord {
                ballot: Id(0),
                passed: true,
                tally: TallySummary::default(),
                declared: vec![],
            },
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], signal.kind_str());
        assert_eq!(json["record"]["passed"], true);
    }
}
