mod confirm;
mod context;
mod effects;
mod generator;
mod signal;
mod state;
mod tally;

pub use confirm::{ConfirmationResult, Rejection, can_afford, try_confirm};
pub use context::{BallotStage, Phase, SimulationContext};
pub use generator::{Generator, RandomGenerator, SequenceGenerator};
pub use signal::{BallotRecord, Observer, Signal, SignalLog};
pub use state::{BallotContext, SimulationState};
pub use tally::{TallySummary, Vote, VoteTally, simple_majority, two_thirds};
