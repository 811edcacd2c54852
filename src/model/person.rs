use serde::{Deserialize, Serialize};

use crate::id::Id;

/// A participant. Immutable once the simulation is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Id,
    pub name: String,
}

impl Person {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A person's faction membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub party: Option<Id>,
    #[serde(default)]
    pub region: Option<Id>,
}

impl Membership {
    pub fn contains(&self, faction: Id) -> bool {
        self.party == Some(faction) || self.region == Some(faction)
    }
}
