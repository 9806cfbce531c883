// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod config;
pub mod external_shim_layer;
pub mod kubernetes_api_objects;
pub mod pvc_controller;
pub mod reconciler;
pub mod shim_layer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ShimLayerError: {0}")]
    ShimLayerError(String),
    #[error("ReadinessCheckFailed: {0}")]
    ReadinessCheckFailed(String),
    #[error("HeartbeatFailed: {0}")]
    HeartbeatFailed(#[from] std::io::Error),
}
