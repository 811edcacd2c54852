//! Effect catalog. Every effect is a kind, a target list and a signed value,
//! validated when constructed (including during deserialization), so an
//! invalid effect never reaches the simulation.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::id::Id;

/// Effects carried by procedures (governmental, targeted, declared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ProcedureEffectKind {
    ElectParty,
    ElectRegion,
    ElectNominated,
    ElectAppointed,
    PermissionCanVote,
    PermissionVotes,
    PermissionCanSpeak,
    VotePassBonus,
    VoteFailBonus,
    Supermajority,
    CurrencyAdd,
    CurrencySubtract,
    ProcedureActivate,
    ProcedureRemove,
    BallotLimit,
    BallotPass,
    BallotFail,
}

string_enum!(ProcedureEffectKind {
    ElectParty => "elect_party",
    ElectRegion => "elect_region",
    ElectNominated => "elect_nominated",
    ElectAppointed => "elect_appointed",
    PermissionCanVote => "permission_can_vote",
    PermissionVotes => "permission_votes",
    PermissionCanSpeak => "permission_can_speak",
    VotePassBonus => "vote_pass_bonus",
    VoteFailBonus => "vote_fail_bonus",
    Supermajority => "supermajority",
    CurrencyAdd => "currency_add",
    CurrencySubtract => "currency_subtract",
    ProcedureActivate => "procedure_activate",
    ProcedureRemove => "procedure_remove",
    BallotLimit => "ballot_limit",
    BallotPass => "ballot_pass",
    BallotFail => "ballot_fail",
});

impl ProcedureEffectKind {
    pub fn is_election(self) -> bool {
        matches!(
            self,
            Self::ElectParty | Self::ElectRegion | Self::ElectNominated | Self::ElectAppointed
        )
    }

    pub fn is_permission(self) -> bool {
        matches!(
            self,
            Self::PermissionCanVote | Self::PermissionVotes | Self::PermissionCanSpeak
        )
    }

    pub fn is_currency(self) -> bool {
        matches!(self, Self::CurrencyAdd | Self::CurrencySubtract)
    }

    /// Kinds that only make sense while a ballot is live.
    pub fn is_ballot_scoped(self) -> bool {
        matches!(
            self,
            Self::VotePassBonus
                | Self::VoteFailBonus
                | Self::Supermajority
                | Self::BallotLimit
                | Self::BallotPass
                | Self::BallotFail
        )
    }
}

/// Effects carried by a ballot's pass or fail result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BallotEffectKind {
    FoundParty,
    DissolveParty,
    ActivateProcedure,
    RemoveProcedure,
    ReplaceProcedure,
    ModifyCurrency,
}

string_enum!(BallotEffectKind {
    FoundParty => "found_party",
    DissolveParty => "dissolve_party",
    ActivateProcedure => "activate_procedure",
    RemoveProcedure => "remove_procedure",
    ReplaceProcedure => "replace_procedure",
    ModifyCurrency => "modify_currency",
});

#[derive(Debug, Clone, Deserialize)]
struct RawEffect<K> {
    kind: K,
    #[serde(default)]
    targets: Vec<Id>,
    #[serde(default)]
    value: i8,
}

/// A procedure effect.
///
/// Targets depend on the kind: currencies for currency effects, roles for
/// permission effects (empty = one randomly designated person), filters for
/// elections and ballot limits, procedures for activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEffect<ProcedureEffectKind>")]
pub struct ProcedureEffect {
    kind: ProcedureEffectKind,
    targets: Vec<Id>,
    value: i8,
}

impl ProcedureEffect {
    pub fn new(kind: ProcedureEffectKind, targets: Vec<Id>, value: i8) -> Result<Self, ConfigError> {
        use ProcedureEffectKind::*;
        let name = kind.as_str();
        match kind {
            CurrencyAdd | CurrencySubtract if value == 0 => {
                return Err(ConfigError::ZeroValue { kind: name });
            }
            ElectNominated | ElectAppointed | BallotLimit | ProcedureActivate | ProcedureRemove
                if targets.is_empty() =>
            {
                return Err(ConfigError::EmptyTargets { kind: name });
            }
            VotePassBonus | VoteFailBonus if value <= 0 => {
                return Err(ConfigError::ValueOutOfRange { kind: name, value });
            }
            PermissionVotes if value < 0 => {
                return Err(ConfigError::ValueOutOfRange { kind: name, value });
            }
            _ => {}
        }
        Ok(Self {
            kind,
            targets,
            value,
        })
    }

    pub fn kind(&self) -> ProcedureEffectKind {
        self.kind
    }

    pub fn targets(&self) -> &[Id] {
        &self.targets
    }

    pub fn value(&self) -> i8 {
        self.value
    }
}

impl TryFrom<RawEffect<ProcedureEffectKind>> for ProcedureEffect {
    type Error = ConfigError;

    fn try_from(raw: RawEffect<ProcedureEffectKind>) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.targets, raw.value)
    }
}

/// A ballot result effect. Always carries at least one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEffect<BallotEffectKind>")]
pub struct BallotEffect {
    kind: BallotEffectKind,
    targets: Vec<Id>,
    value: i8,
}

impl BallotEffect {
    pub fn new(kind: BallotEffectKind, targets: Vec<Id>, value: i8) -> Result<Self, ConfigError> {
        let name = kind.as_str();
        if targets.is_empty() {
            return Err(ConfigError::EmptyTargets { kind: name });
        }
        match kind {
            BallotEffectKind::ReplaceProcedure if targets.len() != 2 => {
                return Err(ConfigError::TargetArity {
                    kind: name,
                    expected: 2,
                    actual: targets.len(),
                });
            }
            BallotEffectKind::ModifyCurrency if value == 0 => {
                return Err(ConfigError::ZeroValue { kind: name });
            }
            _ => {}
        }
        Ok(Self {
            kind,
            targets,
            value,
        })
    }

    pub fn kind(&self) -> BallotEffectKind {
        self.kind
    }

    pub fn targets(&self) -> &[Id] {
        &self.targets
    }

    pub fn value(&self) -> i8 {
        self.value
    }
}

impl TryFrom<RawEffect<BallotEffectKind>> for BallotEffect {
    type Error = ConfigError;

    fn try_from(raw: RawEffect<BallotEffectKind>) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.targets, raw.value)
    }
}
