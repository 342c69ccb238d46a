pub mod api;
pub mod candidates;
pub mod errors;
pub mod group;
pub mod model;
pub mod policy;
pub mod ports;
pub mod similarity;

mod answered;
mod runner;
mod strategies;
mod tempo;

pub use api::{FillTool, FillToolBuilder};
pub use candidates::{candidates_for, yes_no};
pub use errors::FillError;
pub use group::{resolve_group, GroupLedger, OptionGroup};
pub use model::{ControlReport, Decision, FillRequest, FillVerdict, SkipReason};
pub use policy::{FillPolicyView, PollSchedule};
pub use ports::{FillEventsPort, NullEvents, Pacer};
pub use tempo::{RecordingPacer, TokioPacer};
