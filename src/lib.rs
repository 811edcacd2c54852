pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod scenario;
pub mod sim;

pub use config::SimulationConfig;
pub use error::ConfigError;
pub use id::{Id, IdGenerator};
pub use scenario::Scenario;
pub use sim::{
    ConfirmationResult, Generator, Observer, Phase, RandomGenerator, SequenceGenerator, Signal,
    SignalLog, SimulationContext, Vote,
};
