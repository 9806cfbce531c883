// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT

/// ResourceWrapper converts between a wrapper type used by the reconciler
/// and the raw k8s-openapi object it wraps.
pub trait ResourceWrapper<K>: Sized {
    fn from_kube(inner: K) -> Self;

    fn into_kube(self) -> K;
}

/// ObjectKey identifies a namespaced object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}
