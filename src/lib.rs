//! FormFuse library
//!
//! Fill orchestration, the trigger interface and configuration, exposed for
//! the `formfuse` binary and integration tests.

pub mod config;
pub mod errors;
pub mod fill;
pub mod trigger;

pub use config::{load_config, AppConfig, PROFILE_ENV};
pub use errors::FormFuseError;
pub use fill::{
    CollectingEvents, ControlPlan, FillEngine, FillResponse, PathSource, PROFILE_UNAVAILABLE,
};
pub use trigger::{
    handle, set_trigger_visible, trigger_visible, TriggerRequest, TriggerResponse, TRIGGER_ID,
};
