use std::io;

use thiserror::Error;

use crate::id::Id;

/// Construction-time failures. Any of these prevents a simulation from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{kind} effect must carry at least one target")]
    EmptyTargets { kind: &'static str },

    #[error("{kind} effect needs exactly {expected} targets, got {actual}")]
    TargetArity {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} effect cannot carry a zero value")]
    ZeroValue { kind: &'static str },

    #[error("{kind} effect value {value} is out of range")]
    ValueOutOfRange { kind: &'static str, value: i8 },

    #[error("{space} id {id} falls in the reserved range")]
    ReservedId { space: &'static str, id: Id },

    #[error("duplicate {space} id {id}")]
    DuplicateId { space: &'static str, id: Id },

    #[error("{context} references unknown {space} {id}")]
    UnknownReference {
        context: String,
        space: &'static str,
        id: Id,
    },

    #[error("ballot {ballot} links on a live vote condition")]
    VoteConditionInLink { ballot: Id },

    #[error("procedure {procedure}: {kind} effects are not allowed on {procedure_kind} procedures")]
    EffectNotAllowed {
        procedure: Id,
        kind: &'static str,
        procedure_kind: &'static str,
    },

    #[error("incident ballot {ballot} has no resolution condition")]
    MissingResolution { ballot: Id },

    #[error("currency {currency} is owned by the state but {existing} already is")]
    DuplicateStateCurrency { currency: Id, existing: Id },

    #[error("missing localization string {key:?}")]
    MissingLocalization { key: String },

    #[error("invalid configuration json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = ConfigError::TargetArity {
            kind: "replace_procedure",
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "replace_procedure effect needs exactly 2 targets, got 1"
        );

        let err = ConfigError::ReservedId {
            space: "role",
            id: Id(250),
        };
        assert_eq!(err.to_string(), "role id 250 falls in the reserved range");
    }
}
