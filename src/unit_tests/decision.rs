// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::resource::ResourceWrapper;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;
use crate::pvc_controller::attachment_history::MountVerdict;
use crate::pvc_controller::decision::*;
use crate::pvc_controller::error::{ReconcileError, Severity};
use crate::unit_tests::fakes::*;

fn gi(value: u64) -> Gibibytes {
    Gibibytes::new(value)
}

fn beyond_grace() -> MountVerdict {
    MountVerdict::DetachedBeyondGrace {
        since: minutes_ago(90),
    }
}

fn within_grace() -> MountVerdict {
    MountVerdict::DetachedWithinGrace {
        since: minutes_ago(10),
    }
}

#[test]
pub fn test_delete_candidate() {
    let claim = managed_claim("storage-myapp-12", "40Gi", "myapp", "pv-12");
    assert_eq!(
        delete_candidate(&claim, None),
        Ok(Some(DeleteReason::OwnerDeleted))
    );
    assert_eq!(
        delete_candidate(&claim, Some(&workload("myapp", 3, "40Gi"))),
        Ok(Some(DeleteReason::ScaledDown {
            ordinal: 12,
            replicas: 3
        }))
    );
    assert_eq!(
        delete_candidate(&claim, Some(&workload("myapp", 13, "40Gi"))),
        Ok(None)
    );
    // Ordinal equal to the replica count is out of range.
    assert!(matches!(
        delete_candidate(&claim, Some(&workload("myapp", 12, "40Gi"))),
        Ok(Some(DeleteReason::ScaledDown { .. }))
    ));
}

#[test]
pub fn test_delete_candidate_scaled_to_zero() {
    let claim = managed_claim("storage-myapp-0", "40Gi", "myapp", "pv-0");
    assert_eq!(
        delete_candidate(&claim, Some(&workload("myapp", 0, "40Gi"))),
        Ok(Some(DeleteReason::ScaledDown {
            ordinal: 0,
            replicas: 0
        }))
    );
}

#[test]
pub fn test_unset_replicas_default_to_one() {
    let claim = managed_claim("storage-myapp-1", "40Gi", "myapp", "pv-1");
    let unset = ScalingWorkload::from_kube(kube_workload("myapp", None, Some("40Gi")));
    assert_eq!(unset.replicas(), 1);
    assert_eq!(
        delete_candidate(&claim, Some(&unset)),
        Ok(Some(DeleteReason::ScaledDown {
            ordinal: 1,
            replicas: 1
        }))
    );
}

#[test]
pub fn test_bad_ordinal_only_matters_with_a_workload() {
    let claim = managed_claim("storage-myapp", "40Gi", "myapp", "pv-0");
    assert_eq!(
        delete_candidate(&claim, None),
        Ok(Some(DeleteReason::OwnerDeleted))
    );
    assert_eq!(
        delete_candidate(&claim, Some(&workload("myapp", 3, "40Gi"))),
        Err(ReconcileError::BadOrdinal("storage-myapp".to_string()))
    );
}

#[test]
pub fn test_resize_decision() {
    assert_eq!(resize_decision(gi(40), gi(40)), ResizeDecision::NoChange);
    assert_eq!(resize_decision(gi(40), gi(500)), ResizeDecision::Grow(gi(500)));
    assert_eq!(
        resize_decision(gi(500), gi(40)),
        ResizeDecision::RefuseShrink {
            current: gi(500),
            desired: gi(40)
        }
    );
}

#[test]
pub fn test_decide_deletes_only_when_unmounted_long_enough() {
    let claim = managed_claim("storage-myapp-12", "40Gi", "myapp", "pv-12");
    let sts = workload("myapp", 3, "40Gi");
    let scaled_down = DeleteReason::ScaledDown {
        ordinal: 12,
        replicas: 3,
    };

    assert_eq!(
        decide(&claim, Some(&sts), Some(&beyond_grace())),
        Ok(ClaimAction::Delete(scaled_down))
    );
    assert_eq!(
        decide(&claim, Some(&sts), Some(&within_grace())),
        Ok(ClaimAction::NoOp(NoOpReason::AwaitingUnmount(scaled_down)))
    );
    assert_eq!(
        decide(&claim, Some(&sts), Some(&MountVerdict::NoEvidence)),
        Ok(ClaimAction::NoOp(NoOpReason::AwaitingUnmount(scaled_down)))
    );
    assert_eq!(
        decide(&claim, Some(&sts), None),
        Ok(ClaimAction::NoOp(NoOpReason::AwaitingUnmount(scaled_down)))
    );
    assert_eq!(
        decide(&claim, None, Some(&beyond_grace())),
        Ok(ClaimAction::Delete(DeleteReason::OwnerDeleted))
    );
    assert_eq!(
        decide(
            &claim,
            None,
            Some(&MountVerdict::Attached {
                at: minutes_ago(1000)
            })
        ),
        Ok(ClaimAction::NoOp(NoOpReason::AwaitingUnmount(
            DeleteReason::OwnerDeleted
        )))
    );
}

#[test]
pub fn test_decide_grows_a_pending_delete_candidate() {
    let claim = managed_claim("storage-myapp-12", "40Gi", "myapp", "pv-12");
    let sts = workload("myapp", 3, "500Gi");
    assert_eq!(
        decide(&claim, Some(&sts), Some(&within_grace())),
        Ok(ClaimAction::Grow(gi(500)))
    );
}

#[test]
pub fn test_decide_resize_paths() {
    let claim = managed_claim("storage-myapp-0", "40Gi", "myapp", "pv-0");
    assert_eq!(
        decide(&claim, Some(&workload("myapp", 3, "500Gi")), None),
        Ok(ClaimAction::Grow(gi(500)))
    );
    assert_eq!(
        decide(&claim, Some(&workload("myapp", 3, "40Gi")), None),
        Ok(ClaimAction::NoOp(NoOpReason::SizeMatches))
    );
    assert_eq!(
        decide(&claim, Some(&workload("myapp", 3, "10Gi")), None),
        Ok(ClaimAction::NoOp(NoOpReason::ShrinkRefused {
            current: gi(40),
            desired: gi(10)
        }))
    );
}

#[test]
pub fn test_decide_size_errors() {
    let claim = managed_claim("storage-myapp-0", "40Gi", "myapp", "pv-0");
    let missing = ScalingWorkload::from_kube(kube_workload("myapp", Some(3), None));
    assert_eq!(
        decide(&claim, Some(&missing), None),
        Err(ReconcileError::MissingSizeDirective(missing.key()))
    );

    let malformed = workload("myapp", 3, "12345");
    assert_eq!(
        decide(&claim, Some(&malformed), None),
        Err(ReconcileError::MalformedSizeDirective {
            workload: malformed.key(),
            value: "12345".to_string(),
        })
    );

    let decimal_claim = managed_claim("storage-myapp-0", "40G", "myapp", "pv-0");
    assert_eq!(
        decide(&decimal_claim, Some(&workload("myapp", 3, "80Gi")), None),
        Err(ReconcileError::UnsupportedClaimSize(Some("40G".to_string())))
    );
}

#[test]
pub fn test_severity() {
    assert_eq!(
        ReconcileError::UnsupportedClaimSize(None).severity(),
        Severity::Warning
    );
    assert_eq!(ReconcileError::UnboundClaim.severity(), Severity::Warning);
    assert_eq!(
        ReconcileError::BadOrdinal("storage-myapp".to_string()).severity(),
        Severity::Error
    );
    assert_eq!(
        ReconcileError::DuplicateWorkload {
            pointer: "default/myapp".to_string(),
            count: 2
        }
        .severity(),
        Severity::Error
    );
}

#[test]
pub fn test_delete_reason_display() {
    assert_eq!(DeleteReason::OwnerDeleted.to_string(), "orphaned");
    assert_eq!(
        DeleteReason::ScaledDown {
            ordinal: 12,
            replicas: 3
        }
        .to_string(),
        "downscaled (ordinal 12 >= 3 replicas)"
    );
}
