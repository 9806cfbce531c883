// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::error::APIError;
use crate::kubernetes_api_objects::resource::ObjectKey;
use thiserror::Error;

/// ReconcileError aborts the reconciliation of a single claim.
/// None of these errors stop the pass; the claim is retried on the next pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("{0} was passed to owner resolution without the pvc-operator/statefulset annotation")]
    NotManaged(ObjectKey),
    #[error("name {0:?} does not end with a numeric ordinal")]
    BadOrdinal(String),
    #[error("{0} is missing the pvc-operator/storage-size annotation")]
    MissingSizeDirective(ObjectKey),
    #[error("{workload} has malformed pvc-operator/storage-size annotation {value:?}")]
    MalformedSizeDirective { workload: ObjectKey, value: String },
    #[error("claim size {0:?} cannot be normalized to gibibytes")]
    UnsupportedClaimSize(Option<String>),
    #[error("found {count} StatefulSets matching pointer {pointer}, this should not be possible")]
    DuplicateWorkload { pointer: String, count: usize },
    #[error("claim is not bound to a PersistentVolume")]
    UnboundClaim,
    #[error("PersistentVolume {0} not found")]
    VolumeNotFound(String),
    #[error("PersistentVolume {0} has no known volume source")]
    NoKnownVolumeShape(String),
    #[error("{request} failed: {error}")]
    ApiFailed { request: String, error: APIError },
    #[error("{request} failed: {error}, will retry next pass")]
    ExecutorFailed { request: String, error: APIError },
    #[error("unexpected response in step {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl ReconcileError {
    /// Contract violations and operator misconfiguration are warnings;
    /// data integrity problems and failed calls are errors.
    pub fn severity(&self) -> Severity {
        match self {
            ReconcileError::NotManaged(_)
            | ReconcileError::MissingSizeDirective(_)
            | ReconcileError::MalformedSizeDirective { .. }
            | ReconcileError::UnsupportedClaimSize(_)
            | ReconcileError::UnboundClaim => Severity::Warning,
            ReconcileError::BadOrdinal(_)
            | ReconcileError::DuplicateWorkload { .. }
            | ReconcileError::VolumeNotFound(_)
            | ReconcileError::NoKnownVolumeShape(_)
            | ReconcileError::ApiFailed { .. }
            | ReconcileError::ExecutorFailed { .. }
            | ReconcileError::UnexpectedResponse(_) => Severity::Error,
        }
    }
}
