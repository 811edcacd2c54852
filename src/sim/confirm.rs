//! Cost gate for declaring a procedure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::generator::Generator;
use crate::id::Id;
use crate::model::Confirmation;

/// Why a declaration did not go through. These are expected rule outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rejection {
    /// The floor voted the declaration down.
    DivisionFailed,
    RollTooLow { roll: u8, needed: u8 },
    InsufficientCurrency { cost: u8, available: Option<i8> },
    Outrolled { declarer: u8, defender: u8 },
    /// The declarer holds none of the roles allowed to declare.
    NotPermitted,
    /// The procedure does not apply to the live ballot.
    NotApplicable,
    AlreadyDeclared,
    DeclarationsClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ConfirmationResult {
    Confirmed,
    /// A division of the chamber has not reached either threshold yet.
    Pending,
    Rejected { reason: Rejection },
}

impl ConfirmationResult {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationResult::Confirmed)
    }

    fn rejected(reason: Rejection) -> Self {
        ConfirmationResult::Rejected { reason }
    }
}

fn balance(currencies: &BTreeMap<Id, i8>, id: Id) -> i8 {
    *currencies
        .get(&id)
        .unwrap_or_else(|| panic!("try_confirm: currency {id} not found"))
}

/// Whether the declarer could pay a fixed `CurrencyValue` cost right now.
/// Every other confirmation is always offerable.
pub fn can_afford(confirmation: Confirmation, owned: Option<Id>, currencies: &BTreeMap<Id, i8>) -> bool {
    match confirmation {
        Confirmation::CurrencyValue { value } => {
            owned.is_some_and(|id| balance(currencies, id) >= value)
        }
        _ => true,
    }
}

/// Resolve a confirmation for a declarer whose owned currency is `owned`.
///
/// `live_result` is the current decision of the ballot's tally, consulted by
/// `DivisionChamber`. Dice confirmations draw from `generator`.
///
/// # Panics
/// Panics if a `CurrencyValue` cost is not affordable; callers check
/// [`can_afford`] before offering the declaration.
pub fn try_confirm(
    confirmation: Confirmation,
    owned: Option<Id>,
    currencies: &mut BTreeMap<Id, i8>,
    live_result: Option<bool>,
    generator: &mut dyn Generator,
) -> ConfirmationResult {
    match confirmation {
        Confirmation::Always => ConfirmationResult::Confirmed,
        Confirmation::DivisionChamber => match live_result {
            Some(true) => ConfirmationResult::Confirmed,
            Some(false) => ConfirmationResult::rejected(Rejection::DivisionFailed),
            None => ConfirmationResult::Pending,
        },
        Confirmation::CurrencyValue { value } => {
            assert!(
                can_afford(confirmation, owned, currencies),
                "try_confirm: currency cost {value} not affordable"
            );
            if let Some(id) = owned {
                pay(currencies, id, value);
            }
            ConfirmationResult::Confirmed
        }
        Confirmation::DiceValue { value } => {
            let roll = generator.roll();
            if roll >= value {
                ConfirmationResult::Confirmed
            } else {
                ConfirmationResult::rejected(Rejection::RollTooLow {
                    roll,
                    needed: value,
                })
            }
        }
        Confirmation::DiceCurrency => {
            let roll = generator.roll();
            match owned {
                Some(id) if i16::from(balance(currencies, id)) >= i16::from(roll) => {
                    pay(currencies, id, roll as i8);
                    ConfirmationResult::Confirmed
                }
                _ => ConfirmationResult::rejected(Rejection::InsufficientCurrency {
                    cost: roll,
                    available: owned.map(|id| balance(currencies, id)),
                }),
            }
        }
        Confirmation::DiceAdversarial => {
            let declarer = generator.roll();
            let defender = generator.roll();
            if let Some(id) = owned {
                let available = balance(currencies, id);
                if i16::from(available) < i16::from(declarer) {
                    return ConfirmationResult::rejected(Rejection::InsufficientCurrency {
                        cost: declarer,
                        available: Some(available),
                    });
                }
                pay(currencies, id, declarer as i8);
            }
            if declarer >= defender {
                ConfirmationResult::Confirmed
            } else {
                ConfirmationResult::rejected(Rejection::Outrolled { declarer, defender })
            }
        }
    }
}

fn pay(currencies: &mut BTreeMap<Id, i8>, id: Id, cost: i8) {
    let slot = currencies
        .get_mut(&id)
        .unwrap_or_else(|| panic!("try_confirm: currency {id} not found"));
    *slot = slot.saturating_sub(cost);
}
