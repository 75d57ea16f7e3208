pub mod command;
pub mod error;
pub mod event;
pub mod options;
pub mod router;
pub mod store;

pub use command::{Command, TrainingTarget};
pub use error::AgentError;
pub use event::{Event, NB_CATS, NB_CONTENT};
pub use options::{AgentOptions, ResolvedOptions};
pub use router::{
    parse_threshold, Agent, AgentContext, AgentStatus, BatchReport, EventFailure, EventOutcome,
};
pub use store::SnapshotStore;
