use std::fmt;

use serde::{Deserialize, Serialize};

/// Single-byte identifier shared by people, roles, factions, currencies,
/// procedures and ballots.
///
/// The top of the byte range is reserved for sentinel roles and currencies;
/// user-defined ids always sit below [`Id::RESERVED_MIN`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub u8);

impl Id {
    /// Base role every person holds.
    pub const MEMBER: Id = Id(255);
    pub const HEAD_GOVERNMENT: Id = Id(254);
    pub const HEAD_STATE: Id = Id(253);
    pub const LEADER_PARTY: Id = Id(252);
    pub const LEADER_REGION: Id = Id(251);

    /// The single state-owned currency.
    pub const STATE: Id = Id(255);
    /// Every active party's currency.
    pub const PARTY: Id = Id(254);
    /// Every active region's currency.
    pub const REGION: Id = Id(253);

    /// Lowest reserved value. 250..=248 are reserved but unnamed.
    pub const RESERVED_MIN: u8 = 248;

    pub fn is_reserved(self) -> bool {
        self.0 >= Self::RESERVED_MIN
    }

    /// Sentinel roles that may carry entries in the role permission table.
    pub fn named_roles() -> [Id; 5] {
        [
            Id::MEMBER,
            Id::HEAD_GOVERNMENT,
            Id::HEAD_STATE,
            Id::LEADER_PARTY,
            Id::LEADER_REGION,
        ]
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Id {
    fn from(v: u8) -> Self {
        Id(v)
    }
}

/// Sequential generator for user-defined ids within one id space.
///
/// # Panics
/// `next_id` panics once the reserved range would be entered.
#[derive(Debug)]
pub struct IdGenerator {
    next: u8,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn starting_from(start: u8) -> Self {
        Self { next: start }
    }

    pub fn next_id(&mut self) -> Id {
        let id = Id(self.next);
        assert!(!id.is_reserved(), "next_id: id space exhausted at {id}");
        self.next += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
