// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::external_shim_layer::{AttachmentEvent, AuditError};
use crate::kubernetes_api_objects::error::APIError;
use crate::kubernetes_api_objects::persistent_volume::PersistentVolume;
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    KRequest(KubeAPIRequest),
    // The audit trail is the only third-party API the reconciler talks to.
    ExternalRequest(ExternalRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeAPIRequest {
    ListWorkloads { namespace: String, name: String },
    GetVolume { name: String },
    DeleteClaim { namespace: String, name: String },
    PatchClaimSize { namespace: String, name: String, size: Gibibytes },
}

impl KubeAPIRequest {
    pub fn key(&self) -> String {
        match self {
            KubeAPIRequest::ListWorkloads { namespace, name } => {
                format!("List StatefulSet {}/{}", namespace, name)
            }
            KubeAPIRequest::GetVolume { name } => format!("Get PersistentVolume {}", name),
            KubeAPIRequest::DeleteClaim { namespace, name } => {
                format!("Delete PersistentVolumeClaim {}/{}", namespace, name)
            }
            KubeAPIRequest::PatchClaimSize {
                namespace,
                name,
                size,
            } => format!("Patch PersistentVolumeClaim {}/{} to {}", namespace, name, size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalRequest {
    LookupRecentEvents { volume_id: String, max_results: i32 },
}

impl ExternalRequest {
    pub fn key(&self) -> String {
        match self {
            ExternalRequest::LookupRecentEvents {
                volume_id,
                max_results,
            } => format!("LookupEvents {} (max {})", volume_id, max_results),
        }
    }
}

#[derive(Debug)]
pub enum Response {
    KResponse(KubeAPIResponse),
    ExternalResponse(ExternalResponse),
}

#[derive(Debug)]
pub enum KubeAPIResponse {
    ListWorkloads(Result<Vec<ScalingWorkload>, APIError>),
    GetVolume(Result<Option<PersistentVolume>, APIError>),
    DeleteClaim(Result<(), APIError>),
    PatchClaimSize(Result<(), APIError>),
}

#[derive(Debug)]
pub enum ExternalResponse {
    LookupRecentEvents(Result<Vec<AttachmentEvent>, AuditError>),
}
