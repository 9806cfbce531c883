// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::resource::ResourceWrapper;
use k8s_openapi::api::core::v1 as corev1;

/// VolumeSource is the block device descriptor of a PersistentVolume.
///
/// Volumes provisioned by the in-tree EBS plugin carry
/// `awsElasticBlockStore.volumeID` (formatted like `aws://us-east-1c/vol-0a6d7a39a07212c42`),
/// while volumes provisioned by the EBS CSI driver carry `csi.volumeHandle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    AwsElasticBlockStore { volume_id: String },
    Csi { driver: String, volume_handle: String },
    Unknown,
}

impl VolumeSource {
    /// Returns the provider volume identifier, e.g. `vol-0a6d7a39a07212c42`.
    pub fn volume_id(&self) -> Option<&str> {
        let raw = match self {
            VolumeSource::AwsElasticBlockStore { volume_id } => volume_id,
            VolumeSource::Csi { volume_handle, .. } => volume_handle,
            VolumeSource::Unknown => return None,
        };
        raw.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentVolume {
    inner: corev1::PersistentVolume,
}

impl PersistentVolume {
    pub fn name(&self) -> &str {
        self.inner.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn source(&self) -> VolumeSource {
        let spec = match &self.inner.spec {
            Some(spec) => spec,
            None => return VolumeSource::Unknown,
        };
        if let Some(ebs) = &spec.aws_elastic_block_store {
            VolumeSource::AwsElasticBlockStore {
                volume_id: ebs.volume_id.clone(),
            }
        } else if let Some(csi) = &spec.csi {
            VolumeSource::Csi {
                driver: csi.driver.clone(),
                volume_handle: csi.volume_handle.clone(),
            }
        } else {
            VolumeSource::Unknown
        }
    }
}

impl ResourceWrapper<corev1::PersistentVolume> for PersistentVolume {
    fn from_kube(inner: corev1::PersistentVolume) -> PersistentVolume {
        PersistentVolume { inner }
    }

    fn into_kube(self) -> corev1::PersistentVolume {
        self.inner
    }
}
