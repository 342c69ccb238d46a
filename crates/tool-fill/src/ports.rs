use std::time::Duration;

use async_trait::async_trait;

use crate::model::ControlReport;

/// Suspension point between search-and-pick polls.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Observer of per-control decisions during a pass.
pub trait FillEventsPort: Send + Sync {
    fn control_finished(&self, report: &ControlReport);
}

#[derive(Clone, Debug, Default)]
pub struct NullEvents;

impl FillEventsPort for NullEvents {
    fn control_finished(&self, _report: &ControlReport) {}
}
