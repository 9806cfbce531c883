// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// APIError is the error returned by the cluster-facing operations.
/// It keeps the reason reported by the API server so that the reconciler
/// can tell a missing object apart from a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum APIError {
    #[error("object not found")]
    ObjectNotFound,
    #[error("object already exists")]
    ObjectAlreadyExists,
    #[error("bad request")]
    BadRequest,
    #[error("conflict")]
    Conflict,
    #[error("invalid")]
    Invalid,
    #[error("internal error")]
    InternalError,
    #[error("timeout")]
    Timeout,
    #[error("server timeout")]
    ServerTimeout,
    #[error("{0}")]
    Other(String),
}

impl APIError {
    pub fn is_object_not_found(&self) -> bool {
        matches!(self, APIError::ObjectNotFound)
    }
}

// kube_error_to_api_error translates the error from kube-rs APIs
// to the form that can be processed by reconcile_core.
pub fn kube_error_to_api_error(error: &kube_client::Error) -> APIError {
    match error {
        kube_client::Error::Api(kube_core::ErrorResponse {
            reason, message, ..
        }) => match reason.as_str() {
            "NotFound" => APIError::ObjectNotFound,
            "AlreadyExists" => APIError::ObjectAlreadyExists,
            "BadRequest" => APIError::BadRequest,
            "Conflict" => APIError::Conflict,
            "Invalid" => APIError::Invalid,
            "InternalError" => APIError::InternalError,
            "Timeout" => APIError::Timeout,
            "ServerTimeout" => APIError::ServerTimeout,
            _ => APIError::Other(message.clone()),
        },
        other => APIError::Other(other.to_string()),
    }
}
