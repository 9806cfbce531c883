// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::persistent_volume_claim::StorageClaim;
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;
use crate::pvc_controller::annotation::{current_size_of, desired_size_of, ordinal_of};
use crate::pvc_controller::attachment_history::MountVerdict;
use crate::pvc_controller::error::ReconcileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// The StatefulSet named by the owner pointer no longer exists.
    OwnerDeleted,
    /// The claim belongs to a replica slot above the current replica count.
    ScaledDown { ordinal: u32, replicas: i32 },
}

impl std::fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteReason::OwnerDeleted => write!(f, "orphaned"),
            DeleteReason::ScaledDown { ordinal, replicas } => {
                write!(f, "downscaled (ordinal {} >= {} replicas)", ordinal, replicas)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDecision {
    NoChange,
    /// The claim is already larger than desired; volumes cannot shrink.
    RefuseShrink { current: Gibibytes, desired: Gibibytes },
    Grow(Gibibytes),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// A delete candidate whose volume is not proven unmounted long enough.
    AwaitingUnmount(DeleteReason),
    SizeMatches,
    ShrinkRefused { current: Gibibytes, desired: Gibibytes },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Delete(DeleteReason),
    Grow(Gibibytes),
    NoOp(NoOpReason),
}

/// Decides whether the claim should be deleted, before looking at mount state.
/// Valid ordinals for N replicas are `0..N-1`.
pub fn delete_candidate(
    claim: &StorageClaim,
    workload: Option<&ScalingWorkload>,
) -> Result<Option<DeleteReason>, ReconcileError> {
    let workload = match workload {
        None => return Ok(Some(DeleteReason::OwnerDeleted)),
        Some(workload) => workload,
    };
    let ordinal = ordinal_of(claim.name())?;
    let replicas = workload.replicas();
    if i64::from(ordinal) >= i64::from(replicas) {
        Ok(Some(DeleteReason::ScaledDown { ordinal, replicas }))
    } else {
        Ok(None)
    }
}

pub fn resize_decision(current: Gibibytes, desired: Gibibytes) -> ResizeDecision {
    if current == desired {
        ResizeDecision::NoChange
    } else if current > desired {
        ResizeDecision::RefuseShrink { current, desired }
    } else {
        ResizeDecision::Grow(desired)
    }
}

/// Decides what to do with a managed claim.
///
/// The delete check runs first and short-circuits the resize check. A delete
/// candidate is only deleted when `verdict` proves the volume has been unmounted
/// for longer than the grace window; otherwise it falls through to resizing,
/// which needs a workload to read the size directive from.
pub fn decide(
    claim: &StorageClaim,
    workload: Option<&ScalingWorkload>,
    verdict: Option<&MountVerdict>,
) -> Result<ClaimAction, ReconcileError> {
    let awaiting = match delete_candidate(claim, workload)? {
        Some(reason) if verdict.map_or(false, MountVerdict::unmounted_long_enough) => {
            return Ok(ClaimAction::Delete(reason));
        }
        Some(reason) => Some(reason),
        None => None,
    };
    let workload = match workload {
        Some(workload) => workload,
        None => {
            return Ok(ClaimAction::NoOp(NoOpReason::AwaitingUnmount(
                DeleteReason::OwnerDeleted,
            )))
        }
    };

    let desired = desired_size_of(workload)?;
    let current = current_size_of(claim)?;
    match resize_decision(current, desired) {
        ResizeDecision::Grow(size) => Ok(ClaimAction::Grow(size)),
        ResizeDecision::RefuseShrink { current, desired } => {
            Ok(ClaimAction::NoOp(NoOpReason::ShrinkRefused { current, desired }))
        }
        ResizeDecision::NoChange => Ok(ClaimAction::NoOp(
            awaiting.map_or(NoOpReason::SizeMatches, NoOpReason::AwaitingUnmount),
        )),
    }
}
