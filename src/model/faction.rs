use serde::{Deserialize, Serialize};

use super::permissions::Permissions;
use crate::id::Id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDef {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
}

/// A party or a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionDef {
    pub id: Id,
    pub name: String,
    /// Member of the active set when the simulation starts.
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CurrencyOwner {
    State,
    Party(Id),
    Region(Id),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDef {
    pub id: Id,
    pub name: String,
    pub owner: CurrencyOwner,
    #[serde(default)]
    pub initial: i8,
}
