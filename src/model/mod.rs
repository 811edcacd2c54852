#[macro_use]
mod macros;

pub mod ballot;
pub mod condition;
pub mod effect;
pub mod election;
pub mod faction;
pub mod localization;
pub mod permissions;
pub mod person;
pub mod procedure;

pub use ballot::{Ballot, BallotResult, Link, LinkTarget};
pub use condition::{Comparison, Condition, ConditionState};
pub use effect::{BallotEffect, BallotEffectKind, ProcedureEffect, ProcedureEffectKind};
pub use election::{
    Assignments, ElectionAssigner, ElectionKind, ElectionRequest, ElectionSnapshot,
    RetainAssignments, sort_requests,
};
pub use faction::{CurrencyDef, CurrencyOwner, FactionDef, RoleDef};
pub use localization::{Localization, NameTable};
pub use permissions::{
    Composition, OverrideTarget, PermissionOverride, Permissions, compose_permissions, fold_roles,
};
pub use person::{Membership, Person};
pub use procedure::{Confirmation, Procedure, ProcedureKind};
