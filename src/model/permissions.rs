//! Per-person capability records and the algebra used to combine them.
//!
//! Two operators exist:
//! - `Permissions + Composition` overrides field by field (absent fields pass
//!   through), so a chain of additions is "last applied wins".
//! - `Permissions + Permissions` is the role fold: booleans conjoin and the
//!   vote weight takes the maximum.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::id::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub can_vote: bool,
    #[serde(default = "default_votes")]
    pub votes: u8,
    #[serde(default = "default_can_speak")]
    pub can_speak: bool,
}

fn default_votes() -> u8 {
    1
}

fn default_can_speak() -> bool {
    true
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            can_vote: false,
            votes: default_votes(),
            can_speak: default_can_speak(),
        }
    }
}

impl Permissions {
    /// Vote weight this record contributes to a tally.
    pub fn weight(&self) -> u32 {
        if self.can_vote { u32::from(self.votes) } else { 0 }
    }
}

/// Sparse override of a [`Permissions`] record. `None` means "leave as is".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_vote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_speak: Option<bool>,
}

impl Composition {
    pub fn can_vote(v: bool) -> Self {
        Self {
            can_vote: Some(v),
            ..Self::default()
        }
    }

    pub fn votes(v: u8) -> Self {
        Self {
            votes: Some(v),
            ..Self::default()
        }
    }

    pub fn can_speak(v: bool) -> Self {
        Self {
            can_speak: Some(v),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.can_vote.is_none() && self.votes.is_none() && self.can_speak.is_none()
    }
}

impl Add<Composition> for Permissions {
    type Output = Permissions;

    fn add(self, rhs: Composition) -> Permissions {
        Permissions {
            can_vote: rhs.can_vote.unwrap_or(self.can_vote),
            votes: rhs.votes.unwrap_or(self.votes),
            can_speak: rhs.can_speak.unwrap_or(self.can_speak),
        }
    }
}

impl Add for Composition {
    type Output = Composition;

    fn add(self, rhs: Composition) -> Composition {
        Composition {
            can_vote: rhs.can_vote.or(self.can_vote),
            votes: rhs.votes.or(self.votes),
            can_speak: rhs.can_speak.or(self.can_speak),
        }
    }
}

impl Add for Permissions {
    type Output = Permissions;

    fn add(self, rhs: Permissions) -> Permissions {
        Permissions {
            can_vote: self.can_vote && rhs.can_vote,
            votes: self.votes.max(rhs.votes),
            can_speak: self.can_speak && rhs.can_speak,
        }
    }
}

/// Who a procedure-declared override applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "ids", rename_all = "snake_case")]
pub enum OverrideTarget {
    /// Everyone holding any of these roles.
    Roles(Vec<Id>),
    /// A single designated person.
    Person(Id),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub target: OverrideTarget,
    pub composition: Composition,
}

impl PermissionOverride {
    fn applies_to(&self, person: Id, roles: &BTreeSet<Id>) -> bool {
        match &self.target {
            OverrideTarget::Roles(ids) => ids.iter().any(|r| roles.contains(r)),
            OverrideTarget::Person(p) => *p == person,
        }
    }
}

/// Fold one person's roles against the role table.
///
/// Starts from the last role's base record, then folds every role in
/// (the last one included) with the most-restrictive/most-permissive rule.
///
/// # Panics
/// Panics if a held role has no entry in `role_table`, or if `roles` is empty.
pub fn fold_roles(roles: &BTreeSet<Id>, role_table: &BTreeMap<Id, Permissions>) -> Permissions {
    let lookup = |role: &Id| {
        *role_table
            .get(role)
            .unwrap_or_else(|| panic!("fold_roles: role {role} has no permission entry"))
    };
    let last = roles
        .iter()
        .next_back()
        .unwrap_or_else(|| panic!("fold_roles: person holds no roles"));
    roles.iter().fold(lookup(last), |acc, role| acc + lookup(role))
}

/// Compose every person's effective permissions.
///
/// Order: role fold, then pending procedure overrides in queue order, then
/// per-person compositions (ballot limits) in queue order. Later entries win
/// per field.
pub fn compose_permissions(
    roles: &BTreeMap<Id, BTreeSet<Id>>,
    role_table: &BTreeMap<Id, Permissions>,
    overrides: &[PermissionOverride],
    person_overrides: &[(Id, Composition)],
) -> BTreeMap<Id, Permissions> {
    roles
        .iter()
        .map(|(&person, held)| {
            let mut perms = fold_roles(held, role_table);
            for ov in overrides.iter().filter(|ov| ov.applies_to(person, held)) {
                perms = perms + ov.composition;
            }
            for (_, comp) in person_overrides.iter().filter(|(p, _)| *p == person) {
                perms = perms + *comp;
            }
            (person, perms)
        })
        .collect()
}
