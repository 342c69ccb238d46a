use std::sync::Arc;

use async_trait::async_trait;
use formfuse_core_types::FuseError;
use perceiver_form::HostDocument;

use crate::group::GroupLedger;
use crate::model::{FillRequest, FillVerdict};
use crate::policy::FillPolicyView;
use crate::ports::Pacer;
use crate::runner::{execute, RuntimeDeps};
use crate::tempo::TokioPacer;

#[async_trait]
pub trait FillTool: Send + Sync {
    async fn fill(
        &self,
        doc: &mut dyn HostDocument,
        request: &FillRequest,
        ledger: &mut GroupLedger,
    ) -> Result<FillVerdict, FuseError>;

    fn policy(&self) -> &FillPolicyView;
}

pub struct FillToolBuilder {
    policy: FillPolicyView,
    pacer: Option<Arc<dyn Pacer>>,
}

impl FillToolBuilder {
    pub fn new(policy: FillPolicyView) -> Self {
        Self {
            policy,
            pacer: None,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    pub fn build(self) -> Arc<dyn FillTool> {
        Arc::new(FillToolImpl {
            policy: self.policy,
            pacer: self.pacer.unwrap_or_else(|| Arc::new(TokioPacer)),
        })
    }
}

pub struct FillToolImpl {
    policy: FillPolicyView,
    pacer: Arc<dyn Pacer>,
}

#[async_trait]
impl FillTool for FillToolImpl {
    async fn fill(
        &self,
        doc: &mut dyn HostDocument,
        request: &FillRequest,
        ledger: &mut GroupLedger,
    ) -> Result<FillVerdict, FuseError> {
        let deps = RuntimeDeps {
            pacer: self.pacer.as_ref(),
            policy: &self.policy,
        };
        execute(doc, request, ledger, deps)
            .await
            .map_err(FuseError::from)
    }

    fn policy(&self) -> &FillPolicyView {
        &self.policy
    }
}
