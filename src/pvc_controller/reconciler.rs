// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::external_shim_layer::RECENT_EVENT_WINDOW;
use crate::kubernetes_api_objects::persistent_volume_claim::StorageClaim;
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;
use crate::pvc_controller::annotation::resolve_owner;
use crate::pvc_controller::attachment_history::{mount_verdict, MountVerdict};
use crate::pvc_controller::decision::{decide, delete_candidate, ClaimAction, NoOpReason};
use crate::pvc_controller::error::ReconcileError;
use crate::pvc_controller::step::{ClaimOutcome, PVCReconcileState, PVCReconcileStep};
use crate::reconciler::exec::io::*;
use crate::reconciler::exec::reconciler::Reconciler;
use chrono::{DateTime, Duration, Utc};
use tracing::*;

/// PVCReconciler decides, for one managed claim, whether to delete it, grow it,
/// or leave it alone.
///
/// `now` is captured once per pass; the mount state check compares the detach
/// time against it.
pub struct PVCReconciler {
    pub grace_window: Duration,
    pub now: DateTime<Utc>,
}

impl Reconciler for PVCReconciler {
    type R = StorageClaim;
    type T = PVCReconcileState;

    fn reconcile_init_state(&self) -> PVCReconcileState {
        PVCReconcileState {
            reconcile_step: PVCReconcileStep::Init,
            workload: None,
            pending_action: None,
            outcome: None,
        }
    }

    fn reconcile_core(
        &self,
        claim: &StorageClaim,
        resp_o: Option<Response>,
        state: PVCReconcileState,
    ) -> (PVCReconcileState, Option<Request>) {
        let step = state.reconcile_step.clone();
        match step {
            PVCReconcileStep::Init => match resolve_owner(claim) {
                Ok(pointer) => {
                    let req = KubeAPIRequest::ListWorkloads {
                        namespace: pointer.namespace,
                        name: pointer.name,
                    };
                    let state_prime = PVCReconcileState {
                        reconcile_step: PVCReconcileStep::AfterListWorkloads,
                        ..state
                    };
                    (state_prime, Some(Request::KRequest(req)))
                }
                Err(err) => (error_state(state, err), None),
            },
            PVCReconcileStep::AfterListWorkloads => match resp_o {
                Some(Response::KResponse(KubeAPIResponse::ListWorkloads(Ok(mut workloads)))) => {
                    if workloads.len() > 1 {
                        let err = ReconcileError::DuplicateWorkload {
                            pointer: resolve_owner(claim)
                                .map(|pointer| pointer.to_string())
                                .unwrap_or_default(),
                            count: workloads.len(),
                        };
                        return (error_state(state, err), None);
                    }
                    self.after_workload_resolved(claim, workloads.pop(), state)
                }
                Some(Response::KResponse(KubeAPIResponse::ListWorkloads(Err(error)))) => {
                    let err = ReconcileError::ApiFailed {
                        request: "List StatefulSet".to_string(),
                        error,
                    };
                    (error_state(state, err), None)
                }
                _ => (unexpected_response(state), None),
            },
            PVCReconcileStep::AfterGetVolume => match resp_o {
                Some(Response::KResponse(KubeAPIResponse::GetVolume(Ok(Some(volume))))) => {
                    match volume.source().volume_id() {
                        Some(volume_id) => {
                            let req = ExternalRequest::LookupRecentEvents {
                                volume_id: volume_id.to_string(),
                                max_results: RECENT_EVENT_WINDOW,
                            };
                            let state_prime = PVCReconcileState {
                                reconcile_step: PVCReconcileStep::AfterLookupEvents,
                                ..state
                            };
                            (state_prime, Some(Request::ExternalRequest(req)))
                        }
                        None => {
                            let err = ReconcileError::NoKnownVolumeShape(volume.name().to_string());
                            (error_state(state, err), None)
                        }
                    }
                }
                Some(Response::KResponse(KubeAPIResponse::GetVolume(Ok(None)))) => {
                    let err = ReconcileError::VolumeNotFound(
                        claim.volume_name().unwrap_or_default().to_string(),
                    );
                    (error_state(state, err), None)
                }
                Some(Response::KResponse(KubeAPIResponse::GetVolume(Err(error)))) => {
                    let err = ReconcileError::ApiFailed {
                        request: "Get PersistentVolume".to_string(),
                        error,
                    };
                    (error_state(state, err), None)
                }
                _ => (unexpected_response(state), None),
            },
            PVCReconcileStep::AfterLookupEvents => match resp_o {
                Some(Response::ExternalResponse(ExternalResponse::LookupRecentEvents(Ok(events)))) => {
                    let verdict = mount_verdict(&events, self.grace_window, self.now);
                    log_verdict(claim, &verdict);
                    let decision = decide(claim, state.workload.as_ref(), Some(&verdict));
                    self.act(claim, decision, state)
                }
                Some(Response::ExternalResponse(ExternalResponse::LookupRecentEvents(Err(err)))) => {
                    error!(
                        "Audit lookup for {} failed: {}, treating the volume as mounted",
                        claim.key(),
                        err
                    );
                    let decision = decide(claim, state.workload.as_ref(), None);
                    self.act(claim, decision, state)
                }
                _ => (unexpected_response(state), None),
            },
            PVCReconcileStep::AfterDeleteClaim => match (resp_o, state.pending_action) {
                (
                    Some(Response::KResponse(KubeAPIResponse::DeleteClaim(result))),
                    Some(ClaimAction::Delete(reason)),
                ) => match result {
                    Ok(()) => done_state(state, ClaimOutcome::Deleted(reason)),
                    Err(error) if error.is_object_not_found() => {
                        info!("{} was already deleted", claim.key());
                        done_state(state, ClaimOutcome::Deleted(reason))
                    }
                    Err(error) => {
                        let err = ReconcileError::ExecutorFailed {
                            request: delete_request(claim).key(),
                            error,
                        };
                        (error_state(state, err), None)
                    }
                },
                _ => (unexpected_response(state), None),
            },
            PVCReconcileStep::AfterPatchClaimSize => match (resp_o, state.pending_action) {
                (
                    Some(Response::KResponse(KubeAPIResponse::PatchClaimSize(result))),
                    Some(ClaimAction::Grow(size)),
                ) => match result {
                    Ok(()) => done_state(state, ClaimOutcome::Resized(size)),
                    Err(error) => {
                        let err = ReconcileError::ExecutorFailed {
                            request: patch_request(claim, size).key(),
                            error,
                        };
                        (error_state(state, err), None)
                    }
                },
                _ => (unexpected_response(state), None),
            },
            PVCReconcileStep::Done | PVCReconcileStep::Error(_) => (state, None),
        }
    }

    fn reconcile_done(&self, state: &PVCReconcileState) -> bool {
        matches!(state.reconcile_step, PVCReconcileStep::Done)
    }

    fn reconcile_error(&self, state: &PVCReconcileState) -> bool {
        matches!(state.reconcile_step, PVCReconcileStep::Error(_))
    }
}

impl PVCReconciler {
    pub fn new(grace_window: Duration, now: DateTime<Utc>) -> PVCReconciler {
        PVCReconciler { grace_window, now }
    }

    // A delete candidate needs the mount state of its volume before anything
    // else happens; every other claim goes straight to the resize check.
    fn after_workload_resolved(
        &self,
        claim: &StorageClaim,
        workload: Option<ScalingWorkload>,
        state: PVCReconcileState,
    ) -> (PVCReconcileState, Option<Request>) {
        match delete_candidate(claim, workload.as_ref()) {
            Ok(Some(reason)) => match claim.volume_name() {
                Some(volume_name) => {
                    debug!("{} is a delete candidate: {}", claim.key(), reason);
                    let req = KubeAPIRequest::GetVolume {
                        name: volume_name.to_string(),
                    };
                    let state_prime = PVCReconcileState {
                        reconcile_step: PVCReconcileStep::AfterGetVolume,
                        workload,
                        ..state
                    };
                    (state_prime, Some(Request::KRequest(req)))
                }
                None => (error_state(state, ReconcileError::UnboundClaim), None),
            },
            Ok(None) => {
                let decision = decide(claim, workload.as_ref(), None);
                let state_prime = PVCReconcileState { workload, ..state };
                self.act(claim, decision, state_prime)
            }
            Err(err) => (error_state(state, err), None),
        }
    }

    fn act(
        &self,
        claim: &StorageClaim,
        decision: Result<ClaimAction, ReconcileError>,
        state: PVCReconcileState,
    ) -> (PVCReconcileState, Option<Request>) {
        match decision {
            Ok(action @ ClaimAction::Delete(reason)) => {
                info!("Deleting {} PVC {}", reason, claim.key());
                let state_prime = PVCReconcileState {
                    reconcile_step: PVCReconcileStep::AfterDeleteClaim,
                    pending_action: Some(action),
                    ..state
                };
                (state_prime, Some(Request::KRequest(delete_request(claim))))
            }
            Ok(action @ ClaimAction::Grow(size)) => {
                info!("Resizing PVC {} to {}", claim.key(), size);
                let state_prime = PVCReconcileState {
                    reconcile_step: PVCReconcileStep::AfterPatchClaimSize,
                    pending_action: Some(action),
                    ..state
                };
                (state_prime, Some(Request::KRequest(patch_request(claim, size))))
            }
            Ok(ClaimAction::NoOp(reason)) => {
                match reason {
                    NoOpReason::ShrinkRefused { current, desired } => warn!(
                        "PVC {} is {}, larger than desired size {}; volumes cannot shrink",
                        claim.key(),
                        current,
                        desired
                    ),
                    NoOpReason::AwaitingUnmount(delete_reason) => debug!(
                        "{} is {} but not unmounted long enough, will recheck next pass",
                        claim.key(),
                        delete_reason
                    ),
                    NoOpReason::SizeMatches => debug!("{} size already matches", claim.key()),
                }
                done_state(state, ClaimOutcome::Unchanged(reason))
            }
            Err(err) => (error_state(state, err), None),
        }
    }
}

pub fn delete_request(claim: &StorageClaim) -> KubeAPIRequest {
    KubeAPIRequest::DeleteClaim {
        namespace: claim.namespace().to_string(),
        name: claim.name().to_string(),
    }
}

pub fn patch_request(claim: &StorageClaim, size: Gibibytes) -> KubeAPIRequest {
    KubeAPIRequest::PatchClaimSize {
        namespace: claim.namespace().to_string(),
        name: claim.name().to_string(),
        size,
    }
}

fn log_verdict(claim: &StorageClaim, verdict: &MountVerdict) {
    match verdict {
        MountVerdict::Attached { at } => {
            debug!("{} was attached at {}, still looks attached", claim.key(), at)
        }
        MountVerdict::DetachedWithinGrace { since } => {
            debug!("{} was detached at {}, not long enough", claim.key(), since)
        }
        MountVerdict::DetachedBeyondGrace { since } => {
            debug!("{} was detached at {}, long enough", claim.key(), since)
        }
        // The audit trail lags by a few minutes, but an empty window of
        // recent events still means something unexpected happened.
        MountVerdict::NoEvidence => warn!(
            "Didn't find any attach or detach events for {} in the last {} events",
            claim.key(),
            RECENT_EVENT_WINDOW
        ),
    }
}

fn done_state(
    state: PVCReconcileState,
    outcome: ClaimOutcome,
) -> (PVCReconcileState, Option<Request>) {
    let state_prime = PVCReconcileState {
        reconcile_step: PVCReconcileStep::Done,
        outcome: Some(outcome),
        ..state
    };
    (state_prime, None)
}

fn error_state(state: PVCReconcileState, err: ReconcileError) -> PVCReconcileState {
    PVCReconcileState {
        reconcile_step: PVCReconcileStep::Error(err),
        ..state
    }
}

fn unexpected_response(state: PVCReconcileState) -> PVCReconcileState {
    let step = format!("{:?}", state.reconcile_step);
    error_state(state, ReconcileError::UnexpectedResponse(step))
}
