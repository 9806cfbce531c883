// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::resource::{ObjectKey, ResourceWrapper};
use k8s_openapi::api::core::v1 as corev1;

/// StorageClaim wraps a PersistentVolumeClaim observed during one reconcile pass.
///
/// Each PersistentVolumeClaim created by a volumeClaimTemplate is named
/// `<template>-<statefulset>-<ordinal>`, and the ordinal matches the Pod that
/// mounts it. The controller only manages claims that carry the owner pointer
/// annotation, see [`crate::pvc_controller::annotation`].
///
/// More detailed information: https://kubernetes.io/docs/concepts/storage/persistent-volumes/.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageClaim {
    inner: corev1::PersistentVolumeClaim,
}

impl StorageClaim {
    pub const KIND: &'static str = "PersistentVolumeClaim";

    pub fn name(&self) -> &str {
        self.inner.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.inner.metadata.namespace.as_deref().unwrap_or_default()
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            kind: Self::KIND,
            namespace: self.namespace().to_string(),
            name: self.name().to_string(),
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.inner
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }

    /// The quantity requested under `spec.resources.requests.storage`.
    pub fn declared_size(&self) -> Option<&str> {
        self.inner
            .spec
            .as_ref()?
            .resources
            .as_ref()?
            .requests
            .as_ref()?
            .get("storage")
            .map(|quantity| quantity.0.as_str())
    }

    /// The name of the PersistentVolume this claim is bound to, if any.
    pub fn volume_name(&self) -> Option<&str> {
        self.inner
            .spec
            .as_ref()?
            .volume_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

impl ResourceWrapper<corev1::PersistentVolumeClaim> for StorageClaim {
    fn from_kube(inner: corev1::PersistentVolumeClaim) -> StorageClaim {
        StorageClaim { inner }
    }

    fn into_kube(self) -> corev1::PersistentVolumeClaim {
        self.inner
    }
}
