// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use crate::kubernetes_api_objects::error::{kube_error_to_api_error, APIError};
use crate::kubernetes_api_objects::persistent_volume::PersistentVolume;
use crate::kubernetes_api_objects::persistent_volume_claim::StorageClaim;
use crate::kubernetes_api_objects::quantity::Gibibytes;
use crate::kubernetes_api_objects::resource::ResourceWrapper;
use crate::kubernetes_api_objects::stateful_set::ScalingWorkload;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::core::v1 as corev1;
use kube::{
    api::{Api, DeleteParams, ListParams, Patch, PatchParams},
    Client,
};
use tracing::*;

// ClusterApi is everything the controller asks of the Kubernetes API.
// Requests are issued one at a time by the reconcile loop.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_claims(&self) -> Result<Vec<StorageClaim>, APIError>;

    /// Lists the StatefulSets in `namespace` whose name is exactly `name`.
    async fn list_workloads(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<ScalingWorkload>, APIError>;

    async fn get_volume(&self, name: &str) -> Result<Option<PersistentVolume>, APIError>;

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), APIError>;

    async fn patch_claim_size(
        &self,
        namespace: &str,
        name: &str,
        size: Gibibytes,
    ) -> Result<(), APIError>;

    /// Makes each list call once to verify network access and RBAC permissions.
    async fn probe(&self) -> Result<(), APIError>;
}

pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> KubeClusterApi {
        KubeClusterApi { client }
    }

    /// Uses the in-cluster service account when running in a Pod, and the
    /// local kubeconfig otherwise.
    pub async fn try_default() -> Result<KubeClusterApi, kube::Error> {
        Ok(KubeClusterApi::new(Client::try_default().await?))
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn list_claims(&self) -> Result<Vec<StorageClaim>, APIError> {
        let pvc_api = Api::<corev1::PersistentVolumeClaim>::all(self.client.clone());
        let pvcs = pvc_api
            .list(&ListParams::default())
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Ok(pvcs.items.into_iter().map(StorageClaim::from_kube).collect())
    }

    async fn list_workloads(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<ScalingWorkload>, APIError> {
        let sts_api = Api::<appsv1::StatefulSet>::namespaced(self.client.clone(), namespace);
        let lp = ListParams::default().fields(&format!("metadata.name={}", name));
        let sts_list = sts_api
            .list(&lp)
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Ok(sts_list
            .items
            .into_iter()
            .map(ScalingWorkload::from_kube)
            .collect())
    }

    async fn get_volume(&self, name: &str) -> Result<Option<PersistentVolume>, APIError> {
        let pv_api = Api::<corev1::PersistentVolume>::all(self.client.clone());
        let pv_o = pv_api
            .get_opt(name)
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Ok(pv_o.map(PersistentVolume::from_kube))
    }

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), APIError> {
        let pvc_api =
            Api::<corev1::PersistentVolumeClaim>::namespaced(self.client.clone(), namespace);
        pvc_api
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Ok(())
    }

    async fn patch_claim_size(
        &self,
        namespace: &str,
        name: &str,
        size: Gibibytes,
    ) -> Result<(), APIError> {
        let pvc_api =
            Api::<corev1::PersistentVolumeClaim>::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({
            "spec": { "resources": { "requests": { "storage": size.to_quantity() } } }
        });
        pvc_api
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Ok(())
    }

    async fn probe(&self) -> Result<(), APIError> {
        let lp = ListParams::default().limit(1);
        Api::<corev1::PersistentVolumeClaim>::all(self.client.clone())
            .list(&lp)
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Api::<appsv1::StatefulSet>::all(self.client.clone())
            .list(&lp)
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        Api::<corev1::PersistentVolume>::all(self.client.clone())
            .list(&lp)
            .await
            .map_err(|e| kube_error_to_api_error(&e))?;
        debug!("Kubernetes API probe succeeded");
        Ok(())
    }
}
