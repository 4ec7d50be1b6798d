mod context;
mod error;
mod flow_runner;
mod host;
mod outcome;

pub use context::{Action, FlowContext};
pub use error::FlowError;
pub use flow_runner::{FlowRunner, FlowStep};
pub use host::{HostError, PromptHost};
pub use outcome::FlowOutcome;
