// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::persistent_volume_claim::StorageClaim;
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;
use crate::pvc_controller::error::ReconcileError;

/// Set on a PersistentVolumeClaim; names the StatefulSet that owns it.
pub const OWNER_POINTER_ANNOTATION: &str = "pvc-operator/statefulset";

/// Set on a StatefulSet; the size its claims should grow to, e.g. `500Gi`.
pub const SIZE_DIRECTIVE_ANNOTATION: &str = "pvc-operator/storage-size";

/// Points from a claim to the StatefulSet in the claim's own namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadPointer {
    pub namespace: String,
    pub name: String,
}

impl std::fmt::Display for WorkloadPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

pub fn is_managed(claim: &StorageClaim) -> bool {
    claim
        .annotation(OWNER_POINTER_ANNOTATION)
        .map_or(false, |pointer| !pointer.is_empty())
}

// A missing pointer is reported as NotManaged instead of "no owner": a pointer
// to a deleted StatefulSet makes the claim deletable, a missing pointer never does.
pub fn resolve_owner(claim: &StorageClaim) -> Result<WorkloadPointer, ReconcileError> {
    match claim.annotation(OWNER_POINTER_ANNOTATION) {
        Some(pointer) if !pointer.is_empty() => Ok(WorkloadPointer {
            namespace: claim.namespace().to_string(),
            name: pointer.to_string(),
        }),
        _ => Err(ReconcileError::NotManaged(claim.key())),
    }
}

/// Returns the ordinal of an object generated by a StatefulSet.
///
/// Pods are named `<statefulset>-<ordinal>` and claims from a volumeClaimTemplate
/// are named `<template>-<statefulset>-<ordinal>`, so the ordinal is whatever
/// follows the last hyphen.
/// See https://kubernetes.io/docs/concepts/workloads/controllers/statefulset/#ordinal-index.
pub fn ordinal_of(name: &str) -> Result<u32, ReconcileError> {
    let token = name.rsplit('-').next().unwrap_or_default();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReconcileError::BadOrdinal(name.to_string()));
    }
    token
        .parse()
        .map_err(|_| ReconcileError::BadOrdinal(name.to_string()))
}

pub fn desired_size_of(workload: &ScalingWorkload) -> Result<Gibibytes, ReconcileError> {
    let value = workload
        .annotation(SIZE_DIRECTIVE_ANNOTATION)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReconcileError::MissingSizeDirective(workload.key()))?;
    Gibibytes::parse_strict(value).ok_or_else(|| ReconcileError::MalformedSizeDirective {
        workload: workload.key(),
        value: value.to_string(),
    })
}

pub fn current_size_of(claim: &StorageClaim) -> Result<Gibibytes, ReconcileError> {
    let declared = claim.declared_size();
    declared
        .and_then(Gibibytes::from_quantity)
        .ok_or_else(|| ReconcileError::UnsupportedClaimSize(declared.map(str::to_string)))
}
