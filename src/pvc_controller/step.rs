// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;
use crate::pvc_controller::decision::{ClaimAction, DeleteReason, NoOpReason};
use crate::pvc_controller::error::ReconcileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PVCReconcileStep {
    Init,
    AfterListWorkloads,
    AfterGetVolume,
    AfterLookupEvents,
    AfterDeleteClaim,
    AfterPatchClaimSize,
    Done,
    Error(ReconcileError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Deleted(DeleteReason),
    Resized(Gibibytes),
    Unchanged(NoOpReason),
}

/// State of one claim's reconciliation. Nothing in it outlives the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PVCReconcileState {
    pub reconcile_step: PVCReconcileStep,
    pub workload: Option<ScalingWorkload>,
    pub pending_action: Option<ClaimAction>,
    pub outcome: Option<ClaimOutcome>,
}

impl PVCReconcileState {
    /// Consumes a finished state. A state that is neither done nor failed is
    /// reported as an unexpected stop.
    pub fn into_outcome(self) -> Result<ClaimOutcome, ReconcileError> {
        match (self.reconcile_step, self.outcome) {
            (PVCReconcileStep::Error(err), _) => Err(err),
            (PVCReconcileStep::Done, Some(outcome)) => Ok(outcome),
            (step, _) => Err(ReconcileError::UnexpectedResponse(format!("{:?}", step))),
        }
    }
}
