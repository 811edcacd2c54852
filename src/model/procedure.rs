use serde::{Deserialize, Serialize};

use super::effect::ProcedureEffect;
use crate::id::Id;

/// Cost or gate a person must clear to declare a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Confirmation {
    /// Free.
    Always,
    /// Decided by the live floor vote.
    DivisionChamber,
    /// Costs a fixed amount of the declarer's currency.
    CurrencyValue { value: i8 },
    /// One die roll must meet the value.
    DiceValue { value: u8 },
    /// Costs one die roll's worth of currency.
    DiceCurrency,
    /// Declarer pays their roll and must match or beat a defender's roll.
    DiceAdversarial,
}

impl Confirmation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confirmation::Always => "always",
            Confirmation::DivisionChamber => "division_chamber",
            Confirmation::CurrencyValue { .. } => "currency_value",
            Confirmation::DiceValue { .. } => "dice_value",
            Confirmation::DiceCurrency => "dice_currency",
            Confirmation::DiceAdversarial => "dice_adversarial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcedureKind {
    /// Fires once during setup.
    Governmental,
    /// Applies at the start of each listed ballot (every ballot if empty)
    /// while the procedure is in the active set.
    Targeted {
        #[serde(default)]
        ballots: Vec<Id>,
        /// Member of the active set when the simulation starts.
        #[serde(default)]
        active: bool,
    },
    /// Invocable by a person during a ballot, behind a confirmation.
    Declared {
        confirmation: Confirmation,
        /// Roles allowed to declare (anyone if empty).
        #[serde(default)]
        declarers: Vec<Id>,
        /// Ballots the procedure may be declared in (every ballot if empty).
        #[serde(default)]
        ballots: Vec<Id>,
    },
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Governmental => "governmental",
            ProcedureKind::Targeted { .. } => "targeted",
            ProcedureKind::Declared { .. } => "declared",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: Id,
    pub name: String,
    pub kind: ProcedureKind,
    #[serde(default)]
    pub effects: Vec<ProcedureEffect>,
}

impl Procedure {
    /// Whether this procedure takes part in the given ballot.
    pub fn applies_to_ballot(&self, ballot: Id) -> bool {
        match &self.kind {
            ProcedureKind::Governmental => false,
            ProcedureKind::Targeted { ballots, .. } | ProcedureKind::Declared { ballots, .. } => {
                ballots.is_empty() || ballots.contains(&ballot)
            }
        }
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        match &self.kind {
            ProcedureKind::Declared { confirmation, .. } => Some(*confirmation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_filter() {
        let p = Procedure {
            id: Id(1),
            name: "Guillotine".to_string(),
            kind: ProcedureKind::Targeted {
                ballots: vec![Id(2)],
                active: true,
            },
            effects: vec![],
        };
        assert!(p.applies_to_ballot(Id(2)));
        assert!(!p.applies_to_ballot(Id(3)));

        let open = Procedure {
            kind: ProcedureKind::Declared {
                confirmation: Confirmation::Always,
                declarers: vec![],
                ballots: vec![],
            },
            ..p
        };
        assert!(open.applies_to_ballot(Id(9)));
        assert_eq!(open.confirmation(), Some(Confirmation::Always));
    }

    #[test]
    fn deserialize_declared() {
        let json = r#"{
            "id": 4,
            "name": "Filibuster",
            "kind": {
                "type": "declared",
                "confirmation": {"type": "dice_value", "value": 4},
                "declarers": [255]
            },
            "effects": [{"kind": "ballot_fail"}]
        }"#;
        let p: Procedure = serde_json::from_str(json).unwrap();
        assert_eq!(p.confirmation(), Some(Confirmation::DiceValue { value: 4 }));
        assert_eq!(p.kind.as_str(), "declared");
        assert_eq!(p.effects.len(), 1);
    }
}
