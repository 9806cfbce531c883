// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::resource::{ObjectKey, ResourceWrapper};
use k8s_openapi::api::apps::v1 as appsv1;

/// ScalingWorkload wraps the StatefulSet that owns a set of claims.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingWorkload {
    inner: appsv1::StatefulSet,
}

impl ScalingWorkload {
    pub const KIND: &'static str = "StatefulSet";

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

    /// Desired replica count. The API server defaults an unset value to 1.
    pub fn replicas(&self) -> i32 {
        self.inner
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(1)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.inner
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(key))
            .map(String::as_str)
    }
}

impl ResourceWrapper<appsv1::StatefulSet> for ScalingWorkload {
    fn from_kube(inner: appsv1::StatefulSet) -> ScalingWorkload {
        ScalingWorkload { inner }
    }

    fn into_kube(self) -> appsv1::StatefulSet {
        self.inner
    }
}
